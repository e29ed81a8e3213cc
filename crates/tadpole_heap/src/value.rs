use crate::gc::{Handle, Heap, HeapError, ObjectIndex};
use crate::object::{Closure, Function, Native, StringObject};
use compact_str::CompactString;
use core::fmt;

/// A value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Nil.
    Nil,
    /// Booleans.
    Bool(bool),
    /// Numbers.
    Number(f64),
    /// Strings.
    String(Handle<StringObject>),
    /// Bare functions, as found in constant pools.
    Function(Handle<Function>),
    /// Closures.
    Closure(Handle<Closure>),
    /// Native functions.
    Native(Handle<Native>),
}

/// Errors raised by arithmetic on values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    /// Attempted to use the add binary operator on values that can't be added together.
    InvalidAddOperands,
    /// Attempted to use an arithmetic binary operator on non-arithmetic values.
    NonArithmeticOperands,
    /// Attempted to use an arithmetic unary operator on a non-arithmetic value.
    NonArithmeticOperand,
    /// An operand could not be dereferenced.
    Heap(HeapError),
}

impl From<HeapError> for ArithmeticError {
    fn from(value: HeapError) -> Self {
        Self::Heap(value)
    }
}

impl Value {
    /// Return the heap object the value refers to, if any.
    #[must_use]
    pub fn as_object(self) -> Option<ObjectIndex> {
        match self {
            Value::Nil | Value::Bool(_) | Value::Number(_) => None,
            Value::String(handle) => Some(handle.into()),
            Value::Function(handle) => Some(handle.into()),
            Value::Closure(handle) => Some(handle.into()),
            Value::Native(handle) => Some(handle.into()),
        }
    }

    /// Whether two values are interchangeable as constant pool entries.
    /// Numbers compare by bit pattern so that `NaN` and `-0` dedupe correctly.
    #[must_use]
    pub fn same_constant(self, other: Self) -> bool {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => lhs.to_bits() == rhs.to_bits(),
            (lhs, rhs) => lhs == rhs,
        }
    }

    /// Execute add. Two strings concatenate into an interned string.
    ///
    /// # Errors
    /// Fails unless both operands are numbers or both are strings.
    pub fn add(heap: &mut Heap, lhs: Self, rhs: Self) -> Result<Value, ArithmeticError> {
        match (lhs, rhs) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Number(lhs + rhs)),
            (Value::String(lhs), Value::String(rhs)) => {
                let mut concat = CompactString::new(heap.string(lhs)?);
                concat.push_str(heap.string(rhs)?);
                Ok(Value::String(heap.intern_owned(concat)))
            }
            _ => Err(ArithmeticError::InvalidAddOperands),
        }
    }

    /// Execute subtraction.
    ///
    /// # Errors
    /// Fails unless both operands are numbers.
    pub fn sub(self, rhs: Self) -> Result<Value, ArithmeticError> {
        match (self, rhs) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Number(lhs - rhs)),
            _ => Err(ArithmeticError::NonArithmeticOperands),
        }
    }

    /// Execute multiplication.
    ///
    /// # Errors
    /// Fails unless both operands are numbers.
    pub fn mul(self, rhs: Self) -> Result<Value, ArithmeticError> {
        match (self, rhs) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Number(lhs * rhs)),
            _ => Err(ArithmeticError::NonArithmeticOperands),
        }
    }

    /// Execute division.
    ///
    /// # Errors
    /// Fails unless both operands are numbers.
    pub fn div(self, rhs: Self) -> Result<Value, ArithmeticError> {
        match (self, rhs) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Number(lhs / rhs)),
            _ => Err(ArithmeticError::NonArithmeticOperands),
        }
    }

    /// Evaluate numeric negation.
    ///
    /// # Errors
    /// Fails unless the operand is a number.
    pub fn neg(self) -> Result<Value, ArithmeticError> {
        match self {
            Value::Number(value) => Ok(Value::Number(-value)),
            _ => Err(ArithmeticError::NonArithmeticOperand),
        }
    }

    /// Pair the value with a heap so that it can be displayed.
    #[must_use]
    pub const fn resolve(self, heap: &Heap) -> ResolvedValue<'_> {
        ResolvedValue { inner: self, heap }
    }
}

/// A value that can be displayed the way the language prints it.
#[derive(Debug)]
pub struct ResolvedValue<'heap> {
    /// The value to print.
    inner: Value,
    /// The heap to use to dereference handles.
    heap: &'heap Heap,
}

impl ResolvedValue<'_> {
    #[expect(
        clippy::min_ident_chars,
        reason = "keep consistent with trait definition."
    )]
    fn write_function(&self, f: &mut fmt::Formatter<'_>, handle: Handle<Function>) -> fmt::Result {
        let function = self.heap.get(handle).map_err(|_err| fmt::Error)?;
        match function.name {
            Some(name) => {
                let name = self.heap.string(name).map_err(|_err| fmt::Error)?;
                write!(f, "<fn {name}>")
            }
            None => write!(f, "<script>"),
        }
    }
}

impl fmt::Display for ResolvedValue<'_> {
    #[expect(
        clippy::min_ident_chars,
        reason = "keep consistent with trait definition."
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner {
            Value::Nil => write!(f, "nil"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Number(value) => write!(f, "{value}"),
            Value::String(handle) => {
                let string = self.heap.string(handle).map_err(|_err| fmt::Error)?;
                write!(f, "{string}")
            }
            Value::Function(handle) => self.write_function(f, handle),
            Value::Closure(handle) => {
                let closure = self.heap.get(handle).map_err(|_err| fmt::Error)?;
                self.write_function(f, closure.function)
            }
            Value::Native(handle) => {
                let native = self.heap.get(handle).map_err(|_err| fmt::Error)?;
                write!(f, "<native fn {}>", native.name())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::{ArithmeticError, Value};
    use crate::gc::Heap;
    use crate::object::{Closure, Function};

    #[test]
    fn add_concatenates_into_interned_strings() {
        let mut heap = Heap::default();
        let lhs = Value::String(heap.intern("tad"));
        let rhs = Value::String(heap.intern("pole"));
        let joined = Value::add(&mut heap, lhs, rhs).unwrap();
        assert_eq!(joined, Value::String(heap.intern("tadpole")));
        assert_eq!(
            Value::add(&mut heap, lhs, Value::Number(1.0)),
            Err(ArithmeticError::InvalidAddOperands)
        );
    }

    #[test]
    fn arithmetic_requires_numbers() {
        assert_eq!(
            Value::Number(7.0).sub(Value::Number(2.0)),
            Ok(Value::Number(5.0))
        );
        assert_eq!(
            Value::Nil.mul(Value::Number(2.0)),
            Err(ArithmeticError::NonArithmeticOperands)
        );
        assert_eq!(
            Value::Bool(true).neg(),
            Err(ArithmeticError::NonArithmeticOperand)
        );
    }

    #[test]
    fn display_matches_language_output() {
        let mut heap = Heap::default();
        let name = heap.intern("counter");
        let function = heap.alloc(Function::new(Some(name)));
        let script = heap.alloc(Function::new(None));
        let closure = heap.alloc(Closure {
            function,
            upvalues: Vec::new(),
        });
        let text = Value::String(heap.intern("hi there"));

        let shown: Vec<String> = [
            Value::Number(1.0),
            Value::Number(2.5),
            Value::Nil,
            Value::Bool(false),
            text,
            Value::Closure(closure),
            Value::Function(script),
        ]
        .into_iter()
        .map(|value| value.resolve(&heap).to_string())
        .collect();
        assert_eq!(
            shown,
            vec!["1", "2.5", "nil", "false", "hi there", "<fn counter>", "<script>"]
        );
    }
}
