//! Collaborator traits the document model implements, plus the narrow
//! context handed to function implementations.

use std::sync::Arc;

use gridcalc_common::{CellRef, DateSystem, SheetIndex, SpreadsheetVersion, Value};

use crate::array_formula::ArrayFormulaGroup;
use crate::function::Function;
use crate::locale::Locale;
use crate::token::TokenStream;

/// What a cell holds.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContents {
    Literal(Value),
    Formula(TokenStream),
}

impl From<Value> for CellContents {
    fn from(v: Value) -> Self {
        CellContents::Literal(v)
    }
}

/* ─────────────────────────── storage ─────────────────────────── */

pub trait CellStorage {
    /// `None` for a cell that was never written.
    fn cell(&self, cell: CellRef) -> Option<CellContents>;
    fn is_row_hidden(&self, sheet: SheetIndex, row: u32) -> bool;
    /// Index of the last populated row, `None` for an empty sheet.
    fn last_row_num(&self, sheet: SheetIndex) -> Option<u32>;
    fn sheet_count(&self) -> u32;
    fn sheet_name(&self, sheet: SheetIndex) -> Option<&str>;

    /// Group whose footprint covers `cell`.
    fn array_formula_group(&self, _cell: CellRef) -> Option<ArrayFormulaGroup> {
        None
    }
}

pub trait ExternSheetTable {
    /// First and last sheet an extern-sheet index stands for.
    fn resolve_extern_sheet(&self, _index: u32) -> Option<(SheetIndex, SheetIndex)> {
        None
    }
}

pub trait UserFunctionProvider {
    fn find_user_defined_function(&self, _name: &str) -> Option<Arc<dyn Function>> {
        None
    }
}

pub trait NameTable {
    /// Definition of a name visible from `sheet` (sheet-scoped names shadow
    /// workbook-scoped ones).
    fn defined_name(&self, _name: &str, _sheet: SheetIndex) -> Option<TokenStream> {
        None
    }
}

/// Everything the evaluator needs from a document.
pub trait EvaluationWorkbook: CellStorage + ExternSheetTable + UserFunctionProvider + NameTable {}
impl<T> EvaluationWorkbook for T where T: CellStorage + ExternSheetTable + UserFunctionProvider + NameTable
{}

/* ──────────────────── function-facing context ──────────────────── */

pub trait FunctionContext {
    fn locale(&self) -> &Locale;
    fn date_system(&self) -> DateSystem;
    fn version(&self) -> &SpreadsheetVersion;
    /// Cell whose formula is running, if any.
    fn current_cell(&self) -> Option<CellRef>;
    /// True while evaluating an array-formula anchor.
    fn array_context(&self) -> bool;
    /// Value of a cell, evaluating its formula when needed.
    fn cell_value(&self, cell: CellRef) -> Value;
    fn is_row_hidden(&self, sheet: SheetIndex, row: u32) -> bool;
    /// True when the cell's own formula calls `SUBTOTAL`.
    fn is_subtotal_cell(&self, cell: CellRef) -> bool;
    fn last_row_num(&self, sheet: SheetIndex) -> Option<u32>;
}
