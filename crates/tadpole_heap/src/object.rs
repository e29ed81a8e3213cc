//! The kinds of object that live on the heap.

extern crate alloc;

use crate::chunk::Chunk;
use crate::gc::{Handle, Heap, HeapError, ObjectIndex};
use crate::value::Value;
use alloc::rc::Rc;
use compact_str::CompactString;
use core::fmt;

/// FNV-1a offset basis.
const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
/// FNV-1a prime.
const FNV_PRIME: u32 = 16_777_619;

/// Hash a string with 32-bit FNV-1a.
#[must_use]
pub fn hash_string(text: &str) -> u32 {
    text.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// An immutable interned string. Only the heap can create one, so two live strings
/// never share the same text.
#[derive(Debug, Clone)]
pub struct StringObject {
    /// The text.
    text: CompactString,
    /// The precomputed hash of the text.
    hash: u32,
}

impl StringObject {
    pub(crate) const fn new(text: CompactString, hash: u32) -> Self {
        Self { text, hash }
    }

    /// Return the text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    /// Return the precomputed hash.
    #[must_use]
    pub const fn hash(&self) -> u32 {
        self.hash
    }
}

/// A compiled function.
#[derive(Debug, Clone)]
pub struct Function {
    /// The function's name. The top level script has none.
    pub name: Option<Handle<StringObject>>,
    /// The number of parameters.
    pub arity: u8,
    /// The number of upvalues a closure over this function carries.
    pub upvalue_count: usize,
    /// The function body.
    pub chunk: Chunk,
}

impl Function {
    /// Create a function with an empty chunk.
    #[must_use]
    pub const fn new(name: Option<Handle<StringObject>>) -> Self {
        Self {
            name,
            arity: 0,
            upvalue_count: 0,
            chunk: Chunk::new(),
        }
    }
}

/// A function together with the upvalues it closes over.
#[derive(Debug, Clone)]
pub struct Closure {
    /// The closed over function.
    pub function: Handle<Function>,
    /// The captured upvalue cells, one per upvalue of the function.
    pub upvalues: Vec<Handle<Upvalue>>,
}

/// A cell through which closures share a captured variable.
#[derive(Debug, Clone, Copy)]
pub enum Upvalue {
    /// The variable still lives on the stack.
    Open {
        /// The absolute stack slot.
        slot: usize,
        /// The next open upvalue, which always has a lower slot.
        next: Option<Handle<Upvalue>>,
    },
    /// The variable has left the stack and lives in the cell.
    Closed {
        /// The captured value.
        value: Value,
    },
}

/// The number of arguments a native function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many.
    Fixed(u8),
    /// Anywhere from `min` to `max` inclusive.
    Range {
        /// The fewest arguments.
        min: u8,
        /// The most arguments.
        max: u8,
    },
    /// Any number.
    Variadic,
}

impl Arity {
    /// The fewest and the most arguments accepted.
    #[must_use]
    pub const fn bounds(self) -> (u8, u8) {
        match self {
            Arity::Fixed(arity) => (arity, arity),
            Arity::Range { min, max } => (min, max),
            Arity::Variadic => (0, u8::MAX),
        }
    }

    /// Check whether the given argument count is acceptable.
    #[must_use]
    pub const fn accepts(self, argc: u8) -> bool {
        let (min, max) = self.bounds();
        min <= argc && argc <= max
    }
}

/// What a native function can reach while it runs.
pub struct NativeContext<'ctx> {
    /// The heap, for reading arguments and allocating results.
    pub heap: &'ctx mut Heap,
    /// Where language level output goes.
    pub output: &'ctx mut dyn fmt::Write,
}

/// Errors raised by native functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeError {
    /// Writing output failed.
    Io,
    /// An argument could not be dereferenced.
    Heap(HeapError),
    /// Any other failure.
    Message(CompactString),
}

impl From<HeapError> for NativeError {
    fn from(value: HeapError) -> Self {
        Self::Heap(value)
    }
}

impl From<fmt::Error> for NativeError {
    fn from(_value: fmt::Error) -> Self {
        Self::Io
    }
}

impl fmt::Display for NativeError {
    #[expect(
        clippy::min_ident_chars,
        reason = "keep consistent with trait definition."
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            NativeError::Io => write!(f, "failed to write output"),
            NativeError::Heap(ref error) => write!(f, "{error}"),
            NativeError::Message(ref message) => write!(f, "{message}"),
        }
    }
}

/// The native function interface.
pub trait NativeFunction: fmt::Debug {
    /// Call the native function given its arguments. The argument count has
    /// already been checked against [`NativeFunction::arity`].
    ///
    /// # Errors
    /// Implementations decide what failures they raise.
    fn call(&self, context: &mut NativeContext<'_>, args: &[Value]) -> Result<Value, NativeError>;
    /// The name of the function.
    fn name(&self) -> &'static str;
    /// The arity of the function.
    fn arity(&self) -> Arity;
}

/// A heap allocated native function.
#[derive(Debug, Clone)]
pub struct Native {
    function: Rc<dyn NativeFunction>,
}

impl Native {
    /// Wrap a native function.
    #[must_use]
    pub fn new(function: impl NativeFunction + 'static) -> Self {
        Self {
            function: Rc::new(function),
        }
    }

    /// The name of the function.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.function.name()
    }

    /// The arity of the function.
    #[must_use]
    pub fn arity(&self) -> Arity {
        self.function.arity()
    }

    /// A shared reference to the function, letting it run while the heap is borrowed mutably.
    #[must_use]
    pub fn function(&self) -> Rc<dyn NativeFunction> {
        Rc::clone(&self.function)
    }
}

/// Any heap object.
#[derive(Debug, Clone)]
pub enum Object {
    /// A string.
    String(StringObject),
    /// A function.
    Function(Function),
    /// A closure.
    Closure(Closure),
    /// An upvalue cell.
    Upvalue(Upvalue),
    /// A native function.
    Native(Native),
}

impl Object {
    /// The name of the object's kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match *self {
            Object::String(_) => StringObject::KIND,
            Object::Function(_) => Function::KIND,
            Object::Closure(_) => Closure::KIND,
            Object::Upvalue(_) => Upvalue::KIND,
            Object::Native(_) => Native::KIND,
        }
    }
}

/// A type that can be stored on the heap behind a typed [`Handle`].
pub trait HeapObject: Sized {
    /// The name of the kind.
    const KIND: &'static str;
    /// Wrap into an object.
    fn into_object(self) -> Object;
    /// Borrow out of an object if it is of this kind.
    fn from_object(object: &Object) -> Option<&Self>;
    /// Mutably borrow out of an object if it is of this kind.
    fn from_object_mut(object: &mut Object) -> Option<&mut Self>;
}

macro_rules! impl_heap_object {
    ($ty:ty => $variant:ident, $kind:literal) => {
        impl HeapObject for $ty {
            const KIND: &'static str = $kind;

            fn into_object(self) -> Object {
                Object::$variant(self)
            }

            fn from_object(object: &Object) -> Option<&Self> {
                match *object {
                    Object::$variant(ref inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_object_mut(object: &mut Object) -> Option<&mut Self> {
                match *object {
                    Object::$variant(ref mut inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

impl_heap_object!(StringObject => String, "string");
impl_heap_object!(Function => Function, "function");
impl_heap_object!(Closure => Closure, "closure");
impl_heap_object!(Upvalue => Upvalue, "upvalue");
impl_heap_object!(Native => Native, "native");

/// Enumerates the objects directly referenced by something.
pub trait Trace {
    /// Push every directly referenced object.
    fn trace(&self, references: &mut Vec<ObjectIndex>);
}

impl Trace for Value {
    fn trace(&self, references: &mut Vec<ObjectIndex>) {
        if let Some(index) = self.as_object() {
            references.push(index);
        }
    }
}

impl Trace for Object {
    fn trace(&self, references: &mut Vec<ObjectIndex>) {
        match *self {
            Object::String(_) | Object::Native(_) => {}
            Object::Function(ref function) => {
                references.extend(function.name.map(ObjectIndex::from));
                for constant in &function.chunk.constants {
                    constant.trace(references);
                }
            }
            Object::Closure(ref closure) => {
                references.push(closure.function.into());
                references.extend(closure.upvalues.iter().copied().map(ObjectIndex::from));
            }
            Object::Upvalue(Upvalue::Open { next, .. }) => {
                references.extend(next.map(ObjectIndex::from));
            }
            Object::Upvalue(Upvalue::Closed { ref value }) => value.trace(references),
        }
    }
}
