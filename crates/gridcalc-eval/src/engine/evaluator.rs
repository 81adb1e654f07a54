use std::sync::Arc;

use gridcalc_common::{AreaRef, ArrayValue, CellRef, Value};

use crate::engine::EvalConfig;
use crate::error::EvalFailure;
use crate::function_registry::{self, FunctionRegistry};
use crate::interpreter::{EvalSite, Interpreter};
use crate::token::Token;
use crate::traits::{CellContents, EvaluationWorkbook};

/// Owns a workbook model and evaluates its cells on demand.
///
/// Each top-level call gets a fresh [`Interpreter`]: its cycle frame and
/// result cache live exactly as long as the call. Evaluation borrows the
/// workbook shared; edits go through [`Self::workbook_mut`], so the borrow
/// checker keeps the two apart.
pub struct WorkbookEvaluator<W> {
    workbook: W,
    registry: Arc<FunctionRegistry>,
    config: EvalConfig,
}

impl<W> WorkbookEvaluator<W>
where
    W: EvaluationWorkbook,
{
    /// Evaluator over the process-wide built-in registry.
    pub fn new(workbook: W, config: EvalConfig) -> Self {
        Self::with_registry(workbook, function_registry::builtins(), config)
    }

    pub fn with_registry(workbook: W, registry: Arc<FunctionRegistry>, config: EvalConfig) -> Self {
        Self {
            workbook,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn workbook(&self) -> &W {
        &self.workbook
    }

    pub fn workbook_mut(&mut self) -> &mut W {
        &mut self.workbook
    }

    pub fn into_workbook(self) -> W {
        self.workbook
    }

    fn interpreter(&self) -> Interpreter<'_> {
        Interpreter::new(&self.workbook, &self.registry, &self.config)
    }

    /// Value of one cell, evaluating whatever it depends on.
    pub fn evaluate_cell(&self, cell: CellRef) -> Result<Value, EvalFailure> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("evaluate_cell", %cell).entered();
        let interp = self.interpreter();
        let result = interp.cell_value(cell).map(|v| (*v).clone());
        #[cfg(feature = "tracing")]
        {
            if let Err(failure) = &result {
                tracing::warn!(%cell, %failure, "cell evaluation failed");
            }
        }
        result
    }

    /// Several cells under one call: shared precedents are evaluated once.
    pub fn evaluate_cells(&self, cells: &[CellRef]) -> Result<Vec<Value>, EvalFailure> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("evaluate_cells", cells = cells.len()).entered();
        let interp = self.interpreter();
        cells
            .iter()
            .map(|c| interp.cell_value(*c).map(|v| (*v).clone()))
            .collect()
    }

    /// Evaluate a token stream as if it sat in `at`, without storing it.
    pub fn evaluate_formula(&self, at: CellRef, tokens: &[Token]) -> Result<Value, EvalFailure> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("evaluate_formula", %at, tokens = tokens.len()).entered();
        let interp = self.interpreter();
        let result = interp.evaluate(tokens, EvalSite::cell(at));
        #[cfg(feature = "tracing")]
        {
            if let Err(failure) = &result {
                tracing::warn!(%at, %failure, "formula evaluation failed");
            }
        }
        result
    }

    /// Footprint-shaped result of the group anchored at `anchor`; `None`
    /// when no group is anchored there.
    pub fn evaluate_array_formula(&self, anchor: CellRef) -> Result<Option<ArrayValue>, EvalFailure> {
        let Some(group) = self
            .workbook
            .array_formula_group(anchor)
            .filter(|g| g.is_anchor(anchor))
        else {
            return Ok(None);
        };
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("evaluate_array_formula", %anchor).entered();
        let interp = self.interpreter();
        let grid = interp.group_value(&group)?;
        Ok(Some((*grid).clone()))
    }

    pub fn is_array_formula_anchor(&self, cell: CellRef) -> bool {
        self.workbook
            .array_formula_group(cell)
            .is_some_and(|g| g.is_anchor(cell))
    }

    pub fn array_formula_footprint(&self, cell: CellRef) -> Option<AreaRef> {
        self.workbook.array_formula_group(cell).map(|g| g.footprint)
    }

    /// True when `cell` holds a formula (array-group members included).
    pub fn is_formula_cell(&self, cell: CellRef) -> bool {
        self.workbook.array_formula_group(cell).is_some()
            || matches!(self.workbook.cell(cell), Some(CellContents::Formula(_)))
    }
}
