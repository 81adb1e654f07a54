//! Per-format ceilings.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row/column counts, argument count and text length a file format allows.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpreadsheetVersion {
    pub max_rows: u32,
    pub max_columns: u32,
    pub max_function_args: usize,
    pub max_text_length: usize,
}

impl SpreadsheetVersion {
    /// Legacy binary workbooks (`.xls`).
    pub const EXCEL97: Self = Self {
        max_rows: 65_536,
        max_columns: 256,
        max_function_args: 30,
        max_text_length: 32_767,
    };

    /// Office Open XML workbooks (`.xlsx`).
    pub const EXCEL2007: Self = Self {
        max_rows: 1_048_576,
        max_columns: 16_384,
        max_function_args: 255,
        max_text_length: 32_767,
    };

    pub fn last_row_index(&self) -> u32 {
        self.max_rows - 1
    }

    pub fn last_column_index(&self) -> u32 {
        self.max_columns - 1
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        row < self.max_rows && col < self.max_columns
    }
}

impl Default for SpreadsheetVersion {
    fn default() -> Self {
        Self::EXCEL2007
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceilings_differ_per_format() {
        assert!(SpreadsheetVersion::EXCEL2007.contains(65_536, 300));
        assert!(!SpreadsheetVersion::EXCEL97.contains(65_536, 0));
        assert!(!SpreadsheetVersion::EXCEL97.contains(0, 256));
        assert_eq!(SpreadsheetVersion::default().last_column_index(), 16_383);
    }
}
