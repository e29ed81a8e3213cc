use crate::index::{ConstantIndex, LocalSlot, UpvalueIndex};
use core::fmt;
use core::ops::RangeInclusive;

const CONSTANT: u8 = 0x00;
const NIL: u8 = 0x01;
const TRUE: u8 = 0x02;
const FALSE: u8 = 0x03;
const POP: u8 = 0x04;
const DEFINE_GLOBAL: u8 = 0x10;
const GET_GLOBAL: u8 = 0x11;
const SET_GLOBAL: u8 = 0x12;
const GET_LOCAL: u8 = 0x13;
const SET_LOCAL: u8 = 0x14;
const GET_UPVALUE: u8 = 0x15;
const SET_UPVALUE: u8 = 0x16;
const ADD: u8 = 0x20;
const SUB: u8 = 0x21;
const MUL: u8 = 0x22;
const DIV: u8 = 0x23;
const NEGATE: u8 = 0x24;
const CALL: u8 = 0x30;
const CLOSURE: u8 = 0x31;
const CLOSE_UPVALUE: u8 = 0x32;
const RETURN: u8 = 0x33;

/// Opcode bytes set aside for branches and loops.
///
/// An opcode in this range is followed by a 2-byte big-endian forward offset
/// measured from the end of the instruction.
pub const RESERVED_CONTROL_FLOW: RangeInclusive<u8> = 0x40..=0x4f;

/// Check whether the given byte lies in the reserved control flow range.
#[must_use]
pub const fn is_reserved_opcode(byte: u8) -> bool {
    *RESERVED_CONTROL_FLOW.start() <= byte && byte <= *RESERVED_CONTROL_FLOW.end()
}

/// A single decoded instruction. `Closure` is followed in the stream by one [`Capture`] pair
/// per upvalue of the referenced function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Push a constant from the pool.
    Constant(ConstantIndex),
    /// Push nil.
    Nil,
    /// Push true.
    True,
    /// Push false.
    False,
    /// Discard the value on top of the stack.
    Pop,
    /// Bind the value on top of the stack to the global named by the constant.
    DefineGlobal(ConstantIndex),
    /// Push the global named by the constant.
    GetGlobal(ConstantIndex),
    /// Assign the value on top of the stack to an existing global, leaving it on the stack.
    SetGlobal(ConstantIndex),
    /// Push a local of the current frame.
    GetLocal(LocalSlot),
    /// Assign the value on top of the stack to a local of the current frame.
    SetLocal(LocalSlot),
    /// Push the value held by one of the running closure's upvalues.
    GetUpvalue(UpvalueIndex),
    /// Assign the value on top of the stack through one of the running closure's upvalues.
    SetUpvalue(UpvalueIndex),

    // Arithmetic.
    /// Add numbers or concatenate strings.
    Add,
    /// Subtract numbers.
    Sub,
    /// Multiply numbers.
    Mul,
    /// Divide numbers.
    Div,
    /// Negate a number.
    Negate,

    /// Call the value sitting below the given number of arguments.
    Call(u8),
    /// Instantiate a closure over the function constant.
    Closure(ConstantIndex),
    /// Close the upvalue aliasing the top stack slot and pop it.
    CloseUpvalue,
    /// Return from the current function.
    Return,
}

/// How a closure obtains one of its upvalues when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capture {
    /// Whether the upvalue captures a local of the enclosing frame
    /// rather than one of the enclosing closure's upvalues.
    pub is_local: bool,
    /// The local slot or upvalue index being captured.
    pub index: u8,
}

impl Capture {
    /// Encode the capture as a byte pair.
    pub fn encode(self, chunk: &mut impl OpcodeEmitter) {
        chunk.emit_u8(u8::from(self.is_local));
        chunk.emit_u8(self.index);
    }
}

pub trait OpcodeEmitter {
    /// Emit a byte into the opcode stream.
    fn emit_u8(&mut self, value: u8);
}

impl OpcodeEmitter for Vec<u8> {
    fn emit_u8(&mut self, value: u8) {
        self.push(value);
    }
}

impl Opcode {
    pub fn encode(self, chunk: &mut impl OpcodeEmitter) {
        match self {
            Opcode::Nil => chunk.emit_u8(NIL),
            Opcode::True => chunk.emit_u8(TRUE),
            Opcode::False => chunk.emit_u8(FALSE),
            Opcode::Pop => chunk.emit_u8(POP),
            Opcode::Add => chunk.emit_u8(ADD),
            Opcode::Sub => chunk.emit_u8(SUB),
            Opcode::Mul => chunk.emit_u8(MUL),
            Opcode::Div => chunk.emit_u8(DIV),
            Opcode::Negate => chunk.emit_u8(NEGATE),
            Opcode::CloseUpvalue => chunk.emit_u8(CLOSE_UPVALUE),
            Opcode::Return => chunk.emit_u8(RETURN),
            Opcode::Call(argc) => {
                chunk.emit_u8(CALL);
                chunk.emit_u8(argc);
            }
            Opcode::Constant(index) => {
                chunk.emit_u8(CONSTANT);
                chunk.emit_u8(index.to_u8());
            }
            Opcode::DefineGlobal(index) => {
                chunk.emit_u8(DEFINE_GLOBAL);
                chunk.emit_u8(index.to_u8());
            }
            Opcode::GetGlobal(index) => {
                chunk.emit_u8(GET_GLOBAL);
                chunk.emit_u8(index.to_u8());
            }
            Opcode::SetGlobal(index) => {
                chunk.emit_u8(SET_GLOBAL);
                chunk.emit_u8(index.to_u8());
            }
            Opcode::GetLocal(slot) => {
                chunk.emit_u8(GET_LOCAL);
                chunk.emit_u8(slot.to_u8());
            }
            Opcode::SetLocal(slot) => {
                chunk.emit_u8(SET_LOCAL);
                chunk.emit_u8(slot.to_u8());
            }
            Opcode::GetUpvalue(index) => {
                chunk.emit_u8(GET_UPVALUE);
                chunk.emit_u8(index.to_u8());
            }
            Opcode::SetUpvalue(index) => {
                chunk.emit_u8(SET_UPVALUE);
                chunk.emit_u8(index.to_u8());
            }
            Opcode::Closure(index) => {
                chunk.emit_u8(CLOSURE);
                chunk.emit_u8(index.to_u8());
            }
        }
    }
}

/// Errors when decoding a byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The stream ended in the middle of an instruction.
    Truncated,
    /// The byte is reserved for control flow instructions.
    Reserved(u8),
    /// The byte is not an opcode.
    Unknown(u8),
    /// A capture pair has an `is_local` flag that is neither 0 nor 1.
    InvalidCapture(u8),
}

impl fmt::Display for DecodeError {
    #[expect(
        clippy::min_ident_chars,
        reason = "keep consistent with trait definition."
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DecodeError::Truncated => write!(f, "instruction stream ended mid instruction"),
            DecodeError::Reserved(byte) => {
                write!(f, "opcode {byte:#04x} is reserved for control flow")
            }
            DecodeError::Unknown(byte) => write!(f, "unknown opcode {byte:#04x}"),
            DecodeError::InvalidCapture(byte) => {
                write!(f, "invalid capture flag {byte:#04x}")
            }
        }
    }
}

struct ByteIterator<'data> {
    data: &'data [u8],
    index: usize,
}

impl<'data> From<&'data [u8]> for ByteIterator<'data> {
    fn from(value: &'data [u8]) -> Self {
        Self {
            data: value,
            index: 0,
        }
    }
}

impl ByteIterator<'_> {
    fn next_u8(&mut self) -> Result<u8, DecodeError> {
        let value = self
            .data
            .get(self.index)
            .copied()
            .ok_or(DecodeError::Truncated)?;
        self.index += 1;
        Ok(value)
    }
}

impl Opcode {
    /// Decode the instruction at the start of the stream, returning it with its encoded length.
    /// The capture pairs trailing a closure are not included in the length.
    ///
    /// # Errors
    /// Fails on an empty or truncated stream and on bytes that are not opcodes.
    pub fn decode(stream: &[u8]) -> Result<(Opcode, usize), DecodeError> {
        let mut stream = ByteIterator::from(stream);
        let opcode = match stream.next_u8()? {
            NIL => Opcode::Nil,
            TRUE => Opcode::True,
            FALSE => Opcode::False,
            POP => Opcode::Pop,
            ADD => Opcode::Add,
            SUB => Opcode::Sub,
            MUL => Opcode::Mul,
            DIV => Opcode::Div,
            NEGATE => Opcode::Negate,
            CLOSE_UPVALUE => Opcode::CloseUpvalue,
            RETURN => Opcode::Return,
            CALL => Opcode::Call(stream.next_u8()?),
            CONSTANT => Opcode::Constant(stream.next_u8()?.into()),
            DEFINE_GLOBAL => Opcode::DefineGlobal(stream.next_u8()?.into()),
            GET_GLOBAL => Opcode::GetGlobal(stream.next_u8()?.into()),
            SET_GLOBAL => Opcode::SetGlobal(stream.next_u8()?.into()),
            GET_LOCAL => Opcode::GetLocal(stream.next_u8()?.into()),
            SET_LOCAL => Opcode::SetLocal(stream.next_u8()?.into()),
            GET_UPVALUE => Opcode::GetUpvalue(stream.next_u8()?.into()),
            SET_UPVALUE => Opcode::SetUpvalue(stream.next_u8()?.into()),
            CLOSURE => Opcode::Closure(stream.next_u8()?.into()),
            byte if is_reserved_opcode(byte) => return Err(DecodeError::Reserved(byte)),
            byte => return Err(DecodeError::Unknown(byte)),
        };
        Ok((opcode, stream.index))
    }

    /// The number of bytes this instruction occupies, excluding closure captures.
    #[must_use]
    pub const fn encoded_len(self) -> usize {
        match self {
            Opcode::Nil
            | Opcode::True
            | Opcode::False
            | Opcode::Pop
            | Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Negate
            | Opcode::CloseUpvalue
            | Opcode::Return => 1,
            Opcode::Call(_)
            | Opcode::Constant(_)
            | Opcode::DefineGlobal(_)
            | Opcode::GetGlobal(_)
            | Opcode::SetGlobal(_)
            | Opcode::GetLocal(_)
            | Opcode::SetLocal(_)
            | Opcode::GetUpvalue(_)
            | Opcode::SetUpvalue(_)
            | Opcode::Closure(_) => 2,
        }
    }
}

/// Decode `count` capture pairs from the start of the stream.
///
/// # Errors
/// Fails if the stream is too short or a flag byte is not a boolean.
pub fn decode_captures(stream: &[u8], count: usize) -> Result<Vec<Capture>, DecodeError> {
    let mut stream = ByteIterator::from(stream);
    let mut captures = Vec::with_capacity(count);
    for _ in 0..count {
        let is_local = match stream.next_u8()? {
            0 => false,
            1 => true,
            flag => return Err(DecodeError::InvalidCapture(flag)),
        };
        let index = stream.next_u8()?;
        captures.push(Capture { is_local, index });
    }
    Ok(captures)
}

/// Renders constant pool entries for the disassembler.
pub trait ConstantFormatter {
    /// Write the constant at the given index.
    ///
    /// # Errors
    /// Fails if the index is invalid or the buffer can not be written to.
    fn format_constant(&self, buffer: &mut dyn fmt::Write, index: ConstantIndex) -> fmt::Result;
}

impl Opcode {
    /// Format an opcode by writing into the given buffer.
    ///
    /// # Errors
    /// This function will error if it can not write into the buffer.
    pub fn format(
        self,
        buffer: &mut impl fmt::Write,
        constants: &impl ConstantFormatter,
    ) -> Result<(), fmt::Error> {
        match self {
            Opcode::Nil => write!(buffer, "nil"),
            Opcode::True => write!(buffer, "true"),
            Opcode::False => write!(buffer, "false"),
            Opcode::Pop => write!(buffer, "pop"),
            Opcode::Add => write!(buffer, "add"),
            Opcode::Sub => write!(buffer, "sub"),
            Opcode::Mul => write!(buffer, "mul"),
            Opcode::Div => write!(buffer, "div"),
            Opcode::Negate => write!(buffer, "neg"),
            Opcode::CloseUpvalue => write!(buffer, "closeupval"),
            Opcode::Return => write!(buffer, "return"),
            Opcode::Call(argc) => write!(buffer, "call {argc}"),
            Opcode::GetLocal(slot) => write!(buffer, "getlocal ${}", slot.to_u8()),
            Opcode::SetLocal(slot) => write!(buffer, "setlocal ${}", slot.to_u8()),
            Opcode::GetUpvalue(index) => write!(buffer, "getupval ^{}", index.to_u8()),
            Opcode::SetUpvalue(index) => write!(buffer, "setupval ^{}", index.to_u8()),
            Opcode::Constant(index)
            | Opcode::DefineGlobal(index)
            | Opcode::GetGlobal(index)
            | Opcode::SetGlobal(index)
            | Opcode::Closure(index) => {
                let mnemonic = match self {
                    Opcode::Constant(_) => "constant",
                    Opcode::DefineGlobal(_) => "defglob",
                    Opcode::GetGlobal(_) => "getglob",
                    Opcode::SetGlobal(_) => "setglob",
                    _ => "closure",
                };
                write!(buffer, "{mnemonic} #{} ", index.to_u8())?;
                constants.format_constant(buffer, index)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Capture, DecodeError, Opcode, decode_captures};

    #[test]
    fn decode_reports_length() {
        let mut stream = Vec::new();
        Opcode::GetUpvalue(3.into()).encode(&mut stream);
        Opcode::Return.encode(&mut stream);
        assert_eq!(stream, vec![0x15, 3, 0x33]);

        let (opcode, length) = Opcode::decode(&stream).unwrap();
        assert_eq!(opcode, Opcode::GetUpvalue(3.into()));
        assert_eq!(length, 2);
        assert_eq!(length, opcode.encoded_len());
        assert_eq!(Opcode::decode(&stream[length..]), Ok((Opcode::Return, 1)));
    }

    #[test]
    fn decode_rejects_bad_bytes() {
        assert_eq!(Opcode::decode(&[]), Err(DecodeError::Truncated));
        assert_eq!(Opcode::decode(&[0x00]), Err(DecodeError::Truncated));
        assert_eq!(Opcode::decode(&[0x42, 0, 4]), Err(DecodeError::Reserved(0x42)));
        assert_eq!(Opcode::decode(&[0xff]), Err(DecodeError::Unknown(0xff)));
    }

    #[test]
    fn captures_follow_closure() {
        let captures = [
            Capture {
                is_local: true,
                index: 1,
            },
            Capture {
                is_local: false,
                index: 0,
            },
        ];
        let mut stream = Vec::new();
        Opcode::Closure(2.into()).encode(&mut stream);
        for capture in captures {
            capture.encode(&mut stream);
        }
        assert_eq!(stream, vec![0x31, 2, 1, 1, 0, 0]);
        assert_eq!(decode_captures(&stream[2..], 2), Ok(captures.to_vec()));
        assert_eq!(
            decode_captures(&[2, 0], 1),
            Err(DecodeError::InvalidCapture(2))
        );
        assert_eq!(decode_captures(&[1], 1), Err(DecodeError::Truncated));
    }
}
