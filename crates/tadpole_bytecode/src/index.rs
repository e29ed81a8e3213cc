use core::convert;
use core::fmt;

/// Error when conversion from usize to a one byte operand fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TryFromIndexError;

impl fmt::Display for TryFromIndexError {
    #[expect(
        clippy::min_ident_chars,
        reason = "keep consistent with trait definition."
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index does not fit into a single byte")
    }
}

/// Generate a one byte operand newtype.
macro_rules! byte_operand {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u8);

        impl $name {
            /// Convert to u8.
            #[must_use]
            pub const fn to_u8(self) -> u8 {
                self.0
            }

            /// Convert to usize.
            #[must_use]
            pub const fn to_usize(self) -> usize {
                self.0 as usize
            }
        }

        impl convert::TryFrom<usize> for $name {
            type Error = TryFromIndexError;

            fn try_from(value: usize) -> Result<Self, Self::Error> {
                let index: u8 = value.try_into().map_err(|_err| TryFromIndexError)?;
                Ok(Self(index))
            }
        }

        impl convert::From<u8> for $name {
            fn from(value: u8) -> Self {
                Self(value)
            }
        }
    };
}

byte_operand!(
    /// An index into a chunk's constant pool.
    ConstantIndex
);
byte_operand!(
    /// A stack slot relative to the current call frame's base.
    LocalSlot
);
byte_operand!(
    /// An index into the running closure's upvalue array.
    UpvalueIndex
);

#[cfg(test)]
mod test {
    use super::{ConstantIndex, LocalSlot};

    #[test]
    fn indices_are_limited_to_one_byte() {
        assert_eq!(ConstantIndex::try_from(255_usize).map(ConstantIndex::to_usize), Ok(255));
        assert!(ConstantIndex::try_from(256_usize).is_err());
        assert!(LocalSlot::try_from(1000_usize).is_err());
    }
}
