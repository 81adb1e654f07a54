//! Lightweight in-memory workbook for unit/prop tests.
use std::sync::Arc;

use gridcalc_common::{AreaRef, CellRef, SheetIndex, Value};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::array_formula::ArrayFormulaGroup;
use crate::engine::{EvalConfig, WorkbookEvaluator};
use crate::function::Function;
use crate::function_registry::{self, FunctionRegistry};
use crate::interpreter::Interpreter;
use crate::token::{Token, TokenStream};
use crate::traits::{CellContents, CellStorage, ExternSheetTable, NameTable, UserFunctionProvider};

type CellKey = (u32, u32); // 0-based (row, col)

#[derive(Default, Clone)]
struct TestSheet {
    name: String,
    cells: FxHashMap<CellKey, CellContents>,
    hidden_rows: FxHashSet<u32>,
}

#[derive(Clone)]
pub struct TestWorkbook {
    sheets: Vec<TestSheet>,
    extern_sheets: Vec<(SheetIndex, SheetIndex)>,
    names: FxHashMap<String, TokenStream>,
    sheet_names: FxHashMap<(SheetIndex, String), TokenStream>,
    groups: Vec<ArrayFormulaGroup>,
    fns: FxHashMap<String, Arc<dyn Function>>,
    config: EvalConfig,
    registry: Arc<FunctionRegistry>,
}

impl Default for TestWorkbook {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkbook {
    /* ─────────────── constructors ─────────────── */
    /// One empty sheet named `Sheet1`.
    pub fn new() -> Self {
        Self {
            sheets: vec![TestSheet {
                name: "Sheet1".into(),
                ..TestSheet::default()
            }],
            extern_sheets: Vec::new(),
            names: FxHashMap::default(),
            sheet_names: FxHashMap::default(),
            groups: Vec::new(),
            fns: FxHashMap::default(),
            config: EvalConfig::default(),
            registry: function_registry::builtins(),
        }
    }

    pub fn with_sheet<S: Into<String>>(mut self, name: S) -> Self {
        self.sheets.push(TestSheet {
            name: name.into(),
            ..TestSheet::default()
        });
        self
    }

    pub fn with_config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_registry(mut self, registry: Arc<FunctionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /* ─────────────── cell helpers ─────────────── */
    pub fn with_value<V: Into<Value>>(mut self, sheet: &str, a1: &str, v: V) -> Self {
        self.set_value(sheet, a1, v);
        self
    }

    pub fn with_formula(mut self, sheet: &str, a1: &str, tokens: Vec<Token>) -> Self {
        self.set_formula(sheet, a1, tokens);
        self
    }

    /// Values laid out from `top_left`, row by row.
    pub fn with_range(mut self, sheet: &str, top_left: &str, data: Vec<Vec<Value>>) -> Self {
        let origin = self.cell_ref(sheet, top_left);
        let sh = &mut self.sheets[origin.sheet as usize];
        for (r_off, row) in data.into_iter().enumerate() {
            for (c_off, v) in row.into_iter().enumerate() {
                sh.cells.insert(
                    (origin.row + r_off as u32, origin.col + c_off as u32),
                    CellContents::Literal(v),
                );
            }
        }
        self
    }

    /// Hide a row by its 1-based number.
    pub fn with_hidden_row(mut self, sheet: &str, row: u32) -> Self {
        let idx = self.sheet_index(sheet);
        self.sheets[idx as usize].hidden_rows.insert(row - 1);
        self
    }

    pub fn set_value<V: Into<Value>>(&mut self, sheet: &str, a1: &str, v: V) {
        let cell = self.cell_ref(sheet, a1);
        self.sheets[cell.sheet as usize]
            .cells
            .insert((cell.row, cell.col), CellContents::Literal(v.into()));
    }

    pub fn set_formula(&mut self, sheet: &str, a1: &str, tokens: Vec<Token>) {
        let cell = self.cell_ref(sheet, a1);
        self.sheets[cell.sheet as usize]
            .cells
            .insert((cell.row, cell.col), CellContents::Formula(tokens.into()));
    }

    pub fn clear(&mut self, sheet: &str, a1: &str) {
        let cell = self.cell_ref(sheet, a1);
        self.sheets[cell.sheet as usize]
            .cells
            .remove(&(cell.row, cell.col));
    }

    /* ─────────────── extern sheets & names ─────── */
    /// Adds an extern-sheet entry; its index is the number of earlier entries.
    pub fn with_extern_sheet(mut self, first: &str, last: &str) -> Self {
        let entry = (self.sheet_index(first), self.sheet_index(last));
        self.extern_sheets.push(entry);
        self
    }

    /// Workbook-scoped defined name.
    pub fn with_name(mut self, name: &str, tokens: Vec<Token>) -> Self {
        self.names.insert(name.to_ascii_uppercase(), tokens.into());
        self
    }

    /// Sheet-scoped defined name; shadows a workbook-scoped one on that sheet.
    pub fn with_sheet_name(mut self, sheet: &str, name: &str, tokens: Vec<Token>) -> Self {
        let idx = self.sheet_index(sheet);
        self.sheet_names
            .insert((idx, name.to_ascii_uppercase()), tokens.into());
        self
    }

    /* ─────────────── array formulas ─────────────── */
    pub fn with_array_formula(mut self, sheet: &str, footprint: &str, tokens: Vec<Token>) -> Self {
        let idx = self.sheet_index(sheet);
        let area = AreaRef::parse_a1(idx, footprint).expect("bad footprint in with_array_formula");
        let group = ArrayFormulaGroup::new(area);
        let anchor = group.anchor;
        self.sheets[idx as usize]
            .cells
            .insert((anchor.row, anchor.col), CellContents::Formula(tokens.into()));
        self.groups.push(group);
        self
    }

    /* ─────────────── function helpers ─────────── */
    /// User-defined function, found through the workbook hook.
    pub fn with_function(mut self, func: Arc<dyn Function>) -> Self {
        self.fns.insert(func.name().to_ascii_uppercase(), func);
        self
    }

    /* ─────────────── lookups ─────────────── */
    pub fn sheet_index(&self, name: &str) -> SheetIndex {
        self.sheets
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name))
            .unwrap_or_else(|| panic!("no sheet named {name}")) as SheetIndex
    }

    pub fn cell_ref(&self, sheet: &str, a1: &str) -> CellRef {
        CellRef::parse_a1(self.sheet_index(sheet), a1)
            .unwrap_or_else(|| panic!("bad A1 ref {a1}"))
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /* ─────────────── interpreter shortcut ─────── */
    pub fn interpreter(&self) -> Interpreter<'_> {
        Interpreter::new(self, &self.registry, &self.config)
    }

    pub fn evaluator(self) -> WorkbookEvaluator<TestWorkbook> {
        let registry = Arc::clone(&self.registry);
        let config = self.config.clone();
        WorkbookEvaluator::with_registry(self, registry, config)
    }
}

/* ─────────────────────── trait impls ─────────────────────── */
impl CellStorage for TestWorkbook {
    fn cell(&self, cell: CellRef) -> Option<CellContents> {
        self.sheets
            .get(cell.sheet as usize)
            .and_then(|sh| sh.cells.get(&(cell.row, cell.col)).cloned())
    }

    fn is_row_hidden(&self, sheet: SheetIndex, row: u32) -> bool {
        self.sheets
            .get(sheet as usize)
            .is_some_and(|sh| sh.hidden_rows.contains(&row))
    }

    fn last_row_num(&self, sheet: SheetIndex) -> Option<u32> {
        let sh = self.sheets.get(sheet as usize)?;
        let cells = sh.cells.keys().map(|(r, _)| *r);
        let groups = self
            .groups
            .iter()
            .filter(|g| g.footprint.first_sheet() == sheet)
            .map(|g| g.footprint.last_row());
        cells.chain(groups).max()
    }

    fn sheet_count(&self) -> u32 {
        self.sheets.len() as u32
    }

    fn sheet_name(&self, sheet: SheetIndex) -> Option<&str> {
        self.sheets.get(sheet as usize).map(|s| s.name.as_str())
    }

    fn array_formula_group(&self, cell: CellRef) -> Option<ArrayFormulaGroup> {
        self.groups.iter().find(|g| g.contains(cell)).copied()
    }
}

impl ExternSheetTable for TestWorkbook {
    fn resolve_extern_sheet(&self, index: u32) -> Option<(SheetIndex, SheetIndex)> {
        self.extern_sheets.get(index as usize).copied()
    }
}

impl UserFunctionProvider for TestWorkbook {
    fn find_user_defined_function(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.fns.get(&name.to_ascii_uppercase()).cloned()
    }
}

impl NameTable for TestWorkbook {
    fn defined_name(&self, name: &str, sheet: SheetIndex) -> Option<TokenStream> {
        let key = name.to_ascii_uppercase();
        self.sheet_names
            .get(&(sheet, key.clone()))
            .or_else(|| self.names.get(&key))
            .cloned()
    }
}
