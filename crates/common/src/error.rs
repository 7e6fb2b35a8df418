#![allow(clippy::uninlined_format_args)]

//! Error related data structures to be shared and used.
//!
//! This module contains the [`Error`] enum, which is used to represent
//! errors that can occur within the dotmatrix domain.

use std::fmt::{self, Display, Formatter};

/// Top level enum for error handling within dotmatrix.
///
/// Most of the time, you will want to use the `CustomError` variant
/// to provide a more detailed error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The cartridge data does not have a valid size, either
    /// too small or not a multiple of the ROM bank size.
    RomSize,

    /// The cartridge header failed validation, either the boot
    /// logo magic is missing or a size code is out of table.
    InvalidHeader,

    /// The cartridge type byte names a mapper that is not
    /// implemented (eg: HuC1, TAMA5, Pocket Camera).
    UnsupportedMapper(String),

    /// The CPU fetched one of the undefined opcode bytes and
    /// is now locked, refusing further execution.
    IllegalOpcode(u8),

    CustomError(String),
}

impl Error {
    pub fn description(&self) -> String {
        match self {
            Error::RomSize => String::from("Invalid ROM size"),
            Error::InvalidHeader => String::from("Invalid cartridge header"),
            Error::UnsupportedMapper(name) => format!("Unsupported mapper: {}", name),
            Error::IllegalOpcode(opcode) => format!("Illegal opcode: 0x{:02x}", opcode),
            Error::CustomError(message) => String::from(message),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn test_description() {
        assert_eq!(Error::RomSize.description(), "Invalid ROM size");
        assert_eq!(
            Error::UnsupportedMapper(String::from("HuC1")).description(),
            "Unsupported mapper: HuC1"
        );
        assert_eq!(
            Error::IllegalOpcode(0xdd).description(),
            "Illegal opcode: 0xdd"
        );
    }
}
