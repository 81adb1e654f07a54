//! Structural evaluation failures.
//!
//! These signal a defect upstream of the evaluator (a corrupt token stream,
//! a reference the document cannot contain) and are never turned into a
//! spreadsheet error value. Ordinary bad data produces `Value::Error` instead.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalFailure {
    #[error("malformed formula: {reason}")]
    MalformedFormula { reason: String },

    #[error("extern sheet index {0} is not in the extern-sheet table")]
    UnknownExternSheet(u32),

    #[error("sheet index {0} is out of range")]
    UnknownSheet(u32),

    #[error("reference R{}C{} lies outside the sheet ceiling", .row + 1, .col + 1)]
    ReferenceOutOfBounds { row: u32, col: u32 },

    #[error("evaluation nested deeper than {depth} levels")]
    EvaluationTooDeep { depth: usize },

    #[error("operand is not a reference")]
    NotAReference,
}

impl EvalFailure {
    pub fn malformed(reason: impl Into<String>) -> Self {
        EvalFailure::MalformedFormula {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        assert_eq!(
            EvalFailure::UnknownExternSheet(7).to_string(),
            "extern sheet index 7 is not in the extern-sheet table"
        );
        assert_eq!(
            EvalFailure::ReferenceOutOfBounds { row: 0, col: 300 }.to_string(),
            "reference R1C301 lies outside the sheet ceiling"
        );
        assert_eq!(
            EvalFailure::malformed("operand stack underflow").to_string(),
            "malformed formula: operand stack underflow"
        );
    }
}
