//! Spreadsheet error codes.
//!
//! - **`ErrorCode`**: the closed set of error values a formula can produce
//! - rendering and parsing of the Excel texts (`#DIV/0!`, `#N/A`, …)
//! - the one-byte codes persisted by the legacy binary format
//!
//! These are *values*, not failures: they travel through evaluation like any
//! other result and are sticky (an operation touching an error yields it).

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// All recognised spreadsheet error codes.
///
/// **Note:** names are CamelCase (idiomatic Rust) while `Display`
/// renders them exactly as Excel shows them (`#DIV/0!`, …).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Null,
    DivZero,
    ValueInvalid,
    Ref,
    Name,
    Num,
    NA,
    GettingData,
    CalcUnsupported,
    CircularRef,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 10] = [
        Self::Null,
        Self::DivZero,
        Self::ValueInvalid,
        Self::Ref,
        Self::Name,
        Self::Num,
        Self::NA,
        Self::GettingData,
        Self::CalcUnsupported,
        Self::CircularRef,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "#NULL!",
            Self::DivZero => "#DIV/0!",
            Self::ValueInvalid => "#VALUE!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Num => "#NUM!",
            Self::NA => "#N/A",
            Self::GettingData => "#GETTING_DATA",
            Self::CalcUnsupported => "#CALC!",
            Self::CircularRef => "~CIRCULAR~REF~",
        }
    }

    /// Parse the Excel text of an error (case-insensitive, surrounding
    /// whitespace ignored).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(s))
    }

    /// The byte persisted for this error in legacy binary records.
    ///
    /// `#CALC!` and the circular-reference marker have no persisted form.
    pub const fn biff_code(self) -> Option<u8> {
        match self {
            Self::Null => Some(0x00),
            Self::DivZero => Some(0x07),
            Self::ValueInvalid => Some(0x0F),
            Self::Ref => Some(0x17),
            Self::Name => Some(0x1D),
            Self::Num => Some(0x24),
            Self::NA => Some(0x2A),
            Self::GettingData => Some(0x2B),
            Self::CalcUnsupported | Self::CircularRef => None,
        }
    }

    pub fn from_biff_code(code: u8) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.biff_code() == Some(code))
    }

    /// Number reported by `ERROR.TYPE`.
    pub const fn error_type_number(self) -> Option<u8> {
        match self {
            Self::Null => Some(1),
            Self::DivZero => Some(2),
            Self::ValueInvalid => Some(3),
            Self::Ref => Some(4),
            Self::Name => Some(5),
            Self::Num => Some(6),
            Self::NA => Some(7),
            Self::GettingData => Some(8),
            Self::CalcUnsupported => Some(14),
            Self::CircularRef => None,
        }
    }
}

impl PartialEq<str> for ErrorCode {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ErrorCode {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl From<ErrorCode> for String {
    fn from(error: ErrorCode) -> Self {
        error.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::parse(&code.to_string()), Some(code));
        }
        assert_eq!(ErrorCode::parse(" #div/0! "), Some(ErrorCode::DivZero));
        assert_eq!(ErrorCode::parse("#BOGUS!"), None);
    }

    #[test]
    fn biff_codes_round_trip() {
        assert_eq!(ErrorCode::DivZero.biff_code(), Some(0x07));
        assert_eq!(ErrorCode::from_biff_code(0x2A), Some(ErrorCode::NA));
        assert_eq!(ErrorCode::from_biff_code(0x01), None);
        assert_eq!(ErrorCode::CircularRef.biff_code(), None);
    }

    #[test]
    fn error_type_numbers() {
        assert_eq!(ErrorCode::Null.error_type_number(), Some(1));
        assert_eq!(ErrorCode::NA.error_type_number(), Some(7));
        assert_eq!(ErrorCode::CircularRef.error_type_number(), None);
    }
}
