use compact_str::CompactString;
use core::fmt;
use tadpole_bytecode::DecodeError;
use tadpole_compiler::CompileError;
use tadpole_heap::{ArithmeticError, HeapError, NativeError};

/// A runtime error.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    /// The type of runtime error.
    pub kind: RuntimeErrorKind,
    /// The source line of the instruction that failed.
    pub line: u32,
    /// The active calls when the error happened, innermost first.
    pub trace: Vec<TraceEntry>,
}

/// One call in a runtime error's trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// The line the call was executing.
    pub line: u32,
    /// The name of the called function.
    pub name: CompactString,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    /// Read or assigned a global that was never defined.
    UndefinedGlobal(CompactString),
    /// Defined a global that already exists.
    RedefinedGlobal(CompactString),
    /// Attempted to use an arithmetic unary operator on a non-arithmetic value.
    NonArithmeticOperand,
    /// Attempted to use an arithmetic binary operator on non-arithmetic values.
    NonArithmeticOperands,
    /// Attempted to use the add binary operator on values that can't be added together.
    InvalidAddOperands,
    /// Attempted to call a value that can't be called.
    InvalidCallee,
    /// Attempted to call a callable with the wrong number of arguments.
    InvalidArgumentCount {
        /// The name of the callee.
        name: CompactString,
        /// The expected number of arguments.
        expected: u8,
        /// The actual number of arguments.
        actual: u8,
    },
    /// A native with optional parameters was called with an argument count outside its range.
    ArgumentCountOutOfRange {
        /// The name of the callee.
        name: CompactString,
        /// The fewest arguments accepted.
        min: u8,
        /// The most arguments accepted.
        max: u8,
        /// The actual number of arguments.
        actual: u8,
    },
    /// A host call passed more arguments than any callable accepts.
    TooManyArguments {
        /// The name of the callee.
        name: CompactString,
        /// The number of arguments passed.
        actual: usize,
    },
    /// Too many nested calls.
    StackOverflow,
    /// A native function failed.
    Native {
        /// The name of the native.
        name: &'static str,
        /// What went wrong.
        error: NativeError,
    },
    // These errors can only occur if the VM or compiler is misimplemented.
    /// Malformed bytecode.
    Decode(DecodeError),
    /// A stale or mistyped handle.
    Heap(HeapError),
    /// A constant of the wrong type or out of range.
    InvalidConstant,
    /// A local slot past the top of the stack.
    InvalidLocal,
    /// An upvalue index past the end of the closure's upvalues.
    InvalidUpvalue,
    /// Open upvalue link list contains closed upvalues.
    InvalidOpenUpvalue,
    /// Popping from an empty stack.
    EmptyStack,
    /// Popping from an empty call stack.
    EmptyCallStack,
}

impl From<HeapError> for RuntimeErrorKind {
    fn from(value: HeapError) -> Self {
        Self::Heap(value)
    }
}

impl From<DecodeError> for RuntimeErrorKind {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value)
    }
}

impl From<ArithmeticError> for RuntimeErrorKind {
    fn from(value: ArithmeticError) -> Self {
        match value {
            ArithmeticError::InvalidAddOperands => Self::InvalidAddOperands,
            ArithmeticError::NonArithmeticOperands => Self::NonArithmeticOperands,
            ArithmeticError::NonArithmeticOperand => Self::NonArithmeticOperand,
            ArithmeticError::Heap(error) => Self::Heap(error),
        }
    }
}

impl fmt::Display for RuntimeErrorKind {
    #[expect(
        clippy::min_ident_chars,
        reason = "keep consistent with trait definition."
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RuntimeErrorKind::UndefinedGlobal(ref name) => {
                write!(f, "name `{name}` is not defined")
            }
            RuntimeErrorKind::RedefinedGlobal(ref name) => write!(f, "name `{name}` is redefined"),
            RuntimeErrorKind::NonArithmeticOperand => write!(f, "operand must be a numeric"),
            RuntimeErrorKind::NonArithmeticOperands => write!(f, "operands must be two numerics"),
            RuntimeErrorKind::InvalidAddOperands => {
                write!(f, "operands must be two strings or two numerics")
            }
            RuntimeErrorKind::InvalidCallee => write!(f, "can only call function"),
            RuntimeErrorKind::InvalidArgumentCount {
                ref name,
                expected,
                actual,
            } => write!(
                f,
                "{name}() takes exactly {expected} arguments ({actual} given)"
            ),
            RuntimeErrorKind::ArgumentCountOutOfRange {
                ref name,
                min,
                max,
                actual,
            } => write!(
                f,
                "{name}() takes from {min} to {max} arguments ({actual} given)"
            ),
            RuntimeErrorKind::TooManyArguments { ref name, actual } => {
                write!(f, "{name}() can not take {actual} arguments")
            }
            RuntimeErrorKind::StackOverflow => write!(f, "stack overflow"),
            RuntimeErrorKind::Native { name, ref error } => write!(f, "{name}(): {error}"),
            RuntimeErrorKind::Decode(ref error) => write!(f, "malformed bytecode: {error}"),
            RuntimeErrorKind::Heap(ref error) => write!(f, "{error}"),
            RuntimeErrorKind::InvalidConstant => write!(f, "invalid constant"),
            RuntimeErrorKind::InvalidLocal => write!(f, "invalid local slot"),
            RuntimeErrorKind::InvalidUpvalue => write!(f, "invalid upvalue"),
            RuntimeErrorKind::InvalidOpenUpvalue => write!(f, "invalid open upvalue"),
            RuntimeErrorKind::EmptyStack => write!(f, "empty stack"),
            RuntimeErrorKind::EmptyCallStack => write!(f, "empty call stack"),
        }
    }
}

impl fmt::Display for RuntimeError {
    #[expect(
        clippy::min_ident_chars,
        reason = "keep consistent with trait definition."
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Traceback (most recent call last):")?;
        for entry in self.trace.iter().rev() {
            writeln!(f, "  [line {}] in {}()", entry.line, entry.name)?;
        }
        write!(f, "{}", self.kind)
    }
}

/// Either stage of running source code failing.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpretError {
    /// The source did not compile.
    Compile(Vec<CompileError>),
    /// Execution failed.
    Runtime(RuntimeError),
}

impl From<RuntimeError> for InterpretError {
    fn from(value: RuntimeError) -> Self {
        Self::Runtime(value)
    }
}

impl From<Vec<CompileError>> for InterpretError {
    fn from(value: Vec<CompileError>) -> Self {
        Self::Compile(value)
    }
}

impl fmt::Display for InterpretError {
    #[expect(
        clippy::min_ident_chars,
        reason = "keep consistent with trait definition."
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            InterpretError::Compile(ref errors) => {
                for (index, error) in errors.iter().enumerate() {
                    if index > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{error}")?;
                }
                Ok(())
            }
            InterpretError::Runtime(ref error) => write!(f, "{error}"),
        }
    }
}
