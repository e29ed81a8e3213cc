//! Values, heap objects and the garbage collected heap they live in.

pub mod chunk;
mod gc;
pub mod object;
mod value;

pub use chunk::Chunk;
pub use gc::{
    GcConfig, Generation, Handle, Heap, HeapError, HeapStats, ObjectIndex, ObjectIter, Roots,
};
pub use object::{
    Arity, Closure, Function, Native, NativeContext, NativeError, NativeFunction, Object,
    StringObject, Upvalue,
};
pub use value::{ArithmeticError, ResolvedValue, Value};
