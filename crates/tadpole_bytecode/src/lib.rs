//! The Tadpole instruction set and its byte encoding.

mod index;
mod opcode;

pub use index::{ConstantIndex, LocalSlot, TryFromIndexError, UpvalueIndex};
pub use opcode::{
    Capture, ConstantFormatter, DecodeError, Opcode, OpcodeEmitter, RESERVED_CONTROL_FLOW,
    decode_captures, is_reserved_opcode,
};
