pub mod args;
pub mod array_formula;
pub mod broadcast;
pub mod coercion;
pub mod error;
pub mod function;
pub mod function_registry;
pub mod interpreter;
pub mod locale;
pub mod reference;
pub mod token;
pub mod traits;

pub mod builtins;

mod macros;
pub mod test_workbook;

pub mod engine;
pub mod telemetry;

pub use array_formula::ArrayFormulaGroup;
pub use engine::{EvalConfig, WorkbookEvaluator};
pub use error::EvalFailure;
pub use function::{Arity, FnCaps, Function};
pub use function_registry::FunctionRegistry;
pub use token::{BinaryOp, FunctionId, Token, TokenStream, UnaryOp};
pub use traits::{
    CellContents, CellStorage, EvaluationWorkbook, ExternSheetTable, FunctionContext, NameTable,
    UserFunctionProvider,
};

#[cfg(test)]
mod tests;
