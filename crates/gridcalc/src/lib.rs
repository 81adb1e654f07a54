//! Meta crate that re-exports the gridcalc building blocks. Downstream users
//! can depend on this crate and opt into specific layers via feature flags
//! while keeping access to the underlying crates.

#[cfg(feature = "common")]
pub use gridcalc_common as common;

#[cfg(feature = "eval")]
pub use gridcalc_eval as eval;

#[cfg(feature = "common")]
pub use gridcalc_common::{
    AreaRef, ArrayValue, CellRef, DateSystem, ErrorCode, SheetIndex, SpreadsheetVersion, Value,
};

#[cfg(feature = "eval")]
pub use gridcalc_eval::{
    CellContents, EvalConfig, EvalFailure, EvaluationWorkbook, Token, TokenStream,
    WorkbookEvaluator,
};
