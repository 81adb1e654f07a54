//! Gridcalc evaluation engine
//!
//! Pull-based evaluation of individual cells against a workbook model.

pub mod evaluator;

pub use evaluator::WorkbookEvaluator;

use gridcalc_common::{DateSystem, SpreadsheetVersion};

use crate::locale::Locale;

/// Configuration for the evaluation engine
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Grid ceiling and per-format limits (argument count, text length).
    pub version: SpreadsheetVersion,
    pub locale: Locale,
    pub date_system: DateSystem,
    /// Cells plus defined names on the evaluation frame at once.
    pub max_depth: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            version: SpreadsheetVersion::EXCEL2007,
            locale: Locale::default(),
            date_system: DateSystem::Excel1900,
            max_depth: 256,
        }
    }
}

impl EvalConfig {
    pub fn with_version(mut self, version: SpreadsheetVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_date_system(mut self, date_system: DateSystem) -> Self {
        self.date_system = date_system;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
