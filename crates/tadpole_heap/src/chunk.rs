//! Bytecode containers and their disassembly.

use crate::gc::{Heap, HeapError};
use crate::object::Function;
use crate::value::Value;
use core::fmt;
use tadpole_bytecode::{
    Capture, ConstantFormatter, ConstantIndex, DecodeError, Opcode, OpcodeEmitter,
    decode_captures,
};

/// A function's compiled bytecode, its constant pool and its line table.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    /// The instruction stream.
    pub code: Vec<u8>,
    /// The source line of every byte in `code`.
    pub lines: Vec<u32>,
    /// The constant pool.
    pub constants: Vec<Value>,
}

/// A decoded instruction together with the capture pairs that trail a closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The byte offset of the instruction.
    pub offset: usize,
    /// The instruction.
    pub opcode: Opcode,
    /// The captures of a closure instruction. Empty for every other instruction.
    pub captures: Vec<Capture>,
}

impl Instruction {
    /// Encode the instruction and its captures.
    pub fn encode(&self, stream: &mut impl OpcodeEmitter) {
        self.opcode.encode(stream);
        for capture in &self.captures {
            capture.encode(stream);
        }
    }
}

/// Errors when walking a chunk's instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkError {
    /// The stream at the offset is malformed.
    Decode {
        /// The offset of the malformed instruction.
        offset: usize,
        /// The reason.
        error: DecodeError,
    },
    /// A closure instruction names a constant that is not a function.
    NotAFunction {
        /// The offset of the closure instruction.
        offset: usize,
    },
    /// A constant could not be dereferenced.
    Heap(HeapError),
}

impl From<HeapError> for ChunkError {
    fn from(value: HeapError) -> Self {
        Self::Heap(value)
    }
}

impl fmt::Display for ChunkError {
    #[expect(
        clippy::min_ident_chars,
        reason = "keep consistent with trait definition."
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ChunkError::Decode { offset, error } => write!(f, "at {offset:04x}: {error}"),
            ChunkError::NotAFunction { offset } => {
                write!(f, "at {offset:04x}: closure over a non-function constant")
            }
            ChunkError::Heap(error) => write!(f, "{error}"),
        }
    }
}

/// Emits bytes tagged with a source line.
struct LineEmitter<'chunk> {
    chunk: &'chunk mut Chunk,
    line: u32,
}

impl OpcodeEmitter for LineEmitter<'_> {
    fn emit_u8(&mut self, value: u8) {
        self.chunk.code.push(value);
        self.chunk.lines.push(self.line);
    }
}

impl Chunk {
    /// Create an empty chunk.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            code: Vec::new(),
            lines: Vec::new(),
            constants: Vec::new(),
        }
    }

    /// Append an instruction.
    pub fn emit(&mut self, opcode: Opcode, line: u32) {
        opcode.encode(&mut LineEmitter { chunk: self, line });
    }

    /// Append a capture pair after a closure instruction.
    pub fn emit_capture(&mut self, capture: Capture, line: u32) {
        capture.encode(&mut LineEmitter { chunk: self, line });
    }

    /// Add a value to the constant pool, reusing an identical entry if there is one.
    /// Returns `None` once the pool is full.
    pub fn add_constant(&mut self, value: Value) -> Option<ConstantIndex> {
        if let Some(index) = self
            .constants
            .iter()
            .position(|&existing| existing.same_constant(value))
        {
            return ConstantIndex::try_from(index).ok();
        }
        let index = ConstantIndex::try_from(self.constants.len()).ok()?;
        self.constants.push(value);
        Some(index)
    }

    /// Return the constant at the given index.
    #[must_use]
    pub fn constant(&self, index: ConstantIndex) -> Option<Value> {
        self.constants.get(index.to_usize()).copied()
    }

    /// Return the source line of the byte at the given offset.
    #[must_use]
    pub fn line(&self, offset: usize) -> Option<u32> {
        self.lines.get(offset).copied()
    }

    /// Decode every instruction, resolving closure capture counts through the heap.
    ///
    /// # Errors
    /// Fails on malformed bytecode.
    pub fn instructions(&self, heap: &Heap) -> Result<Vec<Instruction>, ChunkError> {
        let mut instructions = Vec::new();
        let mut offset = 0;
        while offset < self.code.len() {
            let stream = &self.code[offset..];
            let (opcode, length) =
                Opcode::decode(stream).map_err(|error| ChunkError::Decode { offset, error })?;
            let captures = match opcode {
                Opcode::Closure(index) => {
                    let Some(Value::Function(function)) = self.constant(index) else {
                        return Err(ChunkError::NotAFunction { offset });
                    };
                    let count = heap.get(function)?.upvalue_count;
                    decode_captures(&stream[length..], count).map_err(|error| {
                        ChunkError::Decode {
                            offset: offset + length,
                            error,
                        }
                    })?
                }
                _ => Vec::new(),
            };
            let next = offset + length + 2 * captures.len();
            instructions.push(Instruction {
                offset,
                opcode,
                captures,
            });
            offset = next;
        }
        Ok(instructions)
    }

    /// Disassemble a chunk's bytecode into the given buffer.
    ///
    /// # Errors
    /// This function will error if it can not write into the buffer or if the chunk bytecode is malformed.
    pub fn disassemble(
        &self,
        buffer: &mut impl fmt::Write,
        heap: &Heap,
        name: &str,
    ) -> Result<(), fmt::Error> {
        const INDENT: &str = "  ";
        let max_line = self.lines.iter().copied().max().unwrap_or(1);
        let num_digits = 4usize.max((max_line.checked_ilog10().unwrap_or(0) + 2) as usize);
        let constants = ResolvedConstants { chunk: self, heap };
        let instructions = self.instructions(heap).map_err(|_err| fmt::Error)?;

        writeln!(buffer, "Chunk <{name}>:")?;
        let mut previous_line_number: Option<u32> = None;
        for instruction in &instructions {
            let line_number = self.line(instruction.offset).ok_or(fmt::Error)?;
            write!(buffer, "{INDENT}{:04x}:", instruction.offset)?;

            if previous_line_number == Some(line_number) {
                write!(buffer, "{:>width$} ", "|", width = num_digits)?;
            } else {
                write!(
                    buffer,
                    "{:>width$} ",
                    format!("L{line_number}"),
                    width = num_digits
                )?;
            }
            instruction.opcode.format(buffer, &constants)?;
            writeln!(buffer)?;

            let mut capture_offset = instruction.offset + instruction.opcode.encoded_len();
            for capture in &instruction.captures {
                let kind = if capture.is_local { "local" } else { "upvalue" };
                writeln!(
                    buffer,
                    "{INDENT}{capture_offset:04x}:{:>width$}   capture {kind} {}",
                    "|",
                    capture.index,
                    width = num_digits
                )?;
                capture_offset += 2;
            }

            previous_line_number = Some(line_number);
        }
        writeln!(buffer)?;

        Ok(())
    }
}

impl Function {
    /// Disassemble the function and every function nested in its constant pool.
    ///
    /// # Errors
    /// This function will error if it can not write into the buffer or if any bytecode is malformed.
    pub fn disassemble(&self, buffer: &mut impl fmt::Write, heap: &Heap) -> fmt::Result {
        let name = match self.name {
            Some(name) => heap.string(name).map_err(|_err| fmt::Error)?,
            None => "script",
        };
        self.chunk.disassemble(buffer, heap, name)?;
        for constant in &self.chunk.constants {
            if let Value::Function(nested) = *constant {
                heap.get(nested)
                    .map_err(|_err| fmt::Error)?
                    .disassemble(buffer, heap)?;
            }
        }
        Ok(())
    }
}

/// Renders a chunk's constants through the heap.
struct ResolvedConstants<'chunk> {
    chunk: &'chunk Chunk,
    heap: &'chunk Heap,
}

impl ConstantFormatter for ResolvedConstants<'_> {
    fn format_constant(&self, buffer: &mut dyn fmt::Write, index: ConstantIndex) -> fmt::Result {
        let value = self.chunk.constant(index).ok_or(fmt::Error)?;
        match value {
            Value::String(_) => write!(buffer, "\"{}\"", value.resolve(self.heap)),
            _ => write!(buffer, "{}", value.resolve(self.heap)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Chunk;
    use crate::gc::Heap;
    use crate::object::Function;
    use crate::value::Value;
    use tadpole_bytecode::{Capture, Opcode};

    #[test]
    fn constants_are_deduplicated_and_limited() {
        let mut heap = Heap::default();
        let mut chunk = Chunk::new();
        let name = Value::String(heap.intern("n"));
        let first = chunk.add_constant(name).unwrap();
        assert_eq!(chunk.add_constant(Value::Number(1.0)).unwrap().to_usize(), 1);
        assert_eq!(chunk.add_constant(Value::String(heap.intern("n"))), Some(first));

        for number in 2..=255 {
            assert!(chunk.add_constant(Value::Number(f64::from(number))).is_some());
        }
        assert_eq!(chunk.constants.len(), 256);
        assert_eq!(chunk.add_constant(Value::Number(1000.0)), None);
        assert!(chunk.add_constant(Value::Number(3.0)).is_some());
    }

    #[test]
    fn lines_track_every_byte() {
        let mut chunk = Chunk::new();
        chunk.emit(Opcode::Nil, 1);
        chunk.emit(Opcode::Call(0), 2);
        chunk.emit_capture(
            Capture {
                is_local: true,
                index: 1,
            },
            3,
        );
        assert_eq!(chunk.code.len(), chunk.lines.len());
        assert_eq!(chunk.lines, vec![1, 2, 2, 3, 3]);
    }

    #[test]
    fn disassembly_shows_captures() {
        let mut heap = Heap::default();
        let name = heap.intern("inner");
        let mut inner = Function::new(Some(name));
        inner.upvalue_count = 1;
        inner.chunk.emit(Opcode::GetUpvalue(0.into()), 1);
        inner.chunk.emit(Opcode::Return, 1);
        let inner = heap.alloc(inner);

        let mut script = Function::new(None);
        let index = script.chunk.add_constant(Value::Function(inner)).unwrap();
        script.chunk.emit(Opcode::Closure(index), 1);
        script.chunk.emit_capture(
            Capture {
                is_local: true,
                index: 1,
            },
            1,
        );
        script.chunk.emit(Opcode::Return, 2);

        let mut buffer = String::new();
        script.disassemble(&mut buffer, &heap).unwrap();
        let expected = "\
Chunk <script>:
  0000:  L1 closure #0 <fn inner>
  0002:   |   capture local 1
  0004:  L2 return

Chunk <inner>:
  0000:  L1 getupval ^0
  0002:   | return

";
        assert_eq!(buffer, expected);
    }
}
