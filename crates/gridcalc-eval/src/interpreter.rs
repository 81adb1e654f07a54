use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use gridcalc_common::{
    AreaRef, ArrayValue, CellRef, DateSystem, ErrorCode, ParamClass, SheetIndex,
    SpreadsheetVersion, Value,
};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::args::{ArgumentHandle, Operand};
use crate::array_formula::{ArrayFormulaGroup, spread_over_footprint};
use crate::broadcast;
use crate::builtins::utils::checked_pow;
use crate::coercion;
use crate::engine::EvalConfig;
use crate::error::EvalFailure;
use crate::function::{FnCaps, Function, finish};
use crate::function_registry::FunctionRegistry;
use crate::locale::Locale;
use crate::reference::{self, ReferenceResolver, Resolution, ResolvedRef};
use crate::token::{BinaryOp, FunctionId, Token, UnaryOp};
use crate::traits::{CellContents, EvaluationWorkbook, FunctionContext};

/// Where a token stream runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalSite {
    pub sheet: SheetIndex,
    /// Cell owning the formula; `None` for detached formulas.
    pub cell: Option<CellRef>,
    /// Array-formula anchors keep arrays instead of intersecting them.
    pub array_context: bool,
}

impl EvalSite {
    pub fn cell(cell: CellRef) -> Self {
        Self {
            sheet: cell.sheet,
            cell: Some(cell),
            array_context: false,
        }
    }

    pub fn array(anchor: CellRef) -> Self {
        Self {
            array_context: true,
            ..Self::cell(anchor)
        }
    }

    pub fn detached(sheet: SheetIndex) -> Self {
        Self {
            sheet,
            cell: None,
            array_context: false,
        }
    }
}

/// Per-call bookkeeping: result caches, the cycle-detection frame and the
/// first structural failure seen while a function was pulling operands.
#[derive(Default)]
struct EvalState {
    cache: FxHashMap<CellRef, Rc<Value>>,
    groups: FxHashMap<CellRef, Rc<ArrayValue>>,
    frame: Vec<CellRef>,
    in_progress: FxHashSet<CellRef>,
    poisoned: FxHashSet<CellRef>,
    names: Vec<String>,
    failure: Option<EvalFailure>,
}

/// Evaluates token streams against a workbook for the span of one
/// top-level call. Dropping it drops the frame and every cached value.
pub struct Interpreter<'a> {
    workbook: &'a dyn EvaluationWorkbook,
    registry: &'a FunctionRegistry,
    config: &'a EvalConfig,
    state: RefCell<EvalState>,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        workbook: &'a dyn EvaluationWorkbook,
        registry: &'a FunctionRegistry,
        config: &'a EvalConfig,
    ) -> Self {
        Self {
            workbook,
            registry,
            config,
            state: RefCell::new(EvalState::default()),
        }
    }

    pub fn workbook(&self) -> &'a dyn EvaluationWorkbook {
        self.workbook
    }

    pub fn registry(&self) -> &'a FunctionRegistry {
        self.registry
    }

    pub fn config(&self) -> &'a EvalConfig {
        self.config
    }

    pub fn locale(&self) -> &'a Locale {
        &self.config.locale
    }

    pub fn function_context(&self, cell: Option<CellRef>) -> DefaultFunctionContext<'_, 'a> {
        let site = match cell {
            Some(c) => EvalSite::cell(c),
            None => EvalSite::detached(0),
        };
        DefaultFunctionContext::new(self, site)
    }

    fn resolver(&self) -> ReferenceResolver<'a> {
        ReferenceResolver::new(self.workbook, self.config.version)
    }

    /* ===================  cells  =================== */

    /// Value of one cell. Formula results are cached for the life of this
    /// interpreter, so asking twice hands back the same allocation.
    pub fn cell_value(&self, cell: CellRef) -> Result<Rc<Value>, EvalFailure> {
        self.check_cell(cell)?;
        if let Some(v) = self.state.borrow().cache.get(&cell) {
            return Ok(Rc::clone(v));
        }
        if let Some(group) = self.workbook.array_formula_group(cell) {
            let grid = self.group_value(&group)?;
            let v = group
                .offset_of(cell)
                .and_then(|(r, c)| grid.get(r, c).cloned())
                .unwrap_or(Value::Error(ErrorCode::NA));
            return Ok(self.store(cell, v));
        }
        match self.workbook.cell(cell) {
            None => Ok(Rc::new(Value::Blank)),
            Some(CellContents::Literal(v)) => Ok(Rc::new(v.into_scalar())),
            Some(CellContents::Formula(tokens)) => {
                if !self.enter(cell)? {
                    return Ok(Rc::new(Value::Error(ErrorCode::CircularRef)));
                }
                let outcome = nested(|| self.evaluate(&tokens, EvalSite::cell(cell)));
                let poisoned = self.leave(cell);
                let value = outcome?;
                let value = if poisoned {
                    Value::Error(ErrorCode::CircularRef)
                } else {
                    value
                };
                Ok(self.store(cell, value))
            }
        }
    }

    /// Footprint-shaped result of an array-formula group; evaluated once.
    pub fn group_value(&self, group: &ArrayFormulaGroup) -> Result<Rc<ArrayValue>, EvalFailure> {
        let anchor = group.anchor;
        if let Some(g) = self.state.borrow().groups.get(&anchor) {
            return Ok(Rc::clone(g));
        }
        self.check_cell(anchor)?;
        if !self.enter(anchor)? {
            let circ = Value::Error(ErrorCode::CircularRef);
            return Ok(Rc::new(spread_over_footprint(&circ, &group.footprint)));
        }
        let outcome = match self.workbook.cell(anchor) {
            Some(CellContents::Formula(tokens)) => {
                nested(|| self.evaluate(&tokens, EvalSite::array(anchor)))
            }
            Some(CellContents::Literal(v)) => Ok(v),
            None => Ok(Value::Blank),
        };
        let poisoned = self.leave(anchor);
        let result = outcome?;
        let result = if poisoned {
            Value::Error(ErrorCode::CircularRef)
        } else {
            result
        };
        let grid = Rc::new(spread_over_footprint(&result, &group.footprint));
        self.state
            .borrow_mut()
            .groups
            .insert(anchor, Rc::clone(&grid));
        Ok(grid)
    }

    fn store(&self, cell: CellRef, value: Value) -> Rc<Value> {
        let rc = Rc::new(value);
        self.state.borrow_mut().cache.insert(cell, Rc::clone(&rc));
        rc
    }

    fn check_cell(&self, cell: CellRef) -> Result<(), EvalFailure> {
        if cell.sheet >= self.workbook.sheet_count() {
            return Err(EvalFailure::UnknownSheet(cell.sheet));
        }
        if !self.config.version.contains(cell.row, cell.col) {
            return Err(EvalFailure::ReferenceOutOfBounds {
                row: cell.row,
                col: cell.col,
            });
        }
        Ok(())
    }

    /// Mark `cell` in progress. `Ok(false)` means it already was: a cycle,
    /// and every cell of the frame is now poisoned.
    fn enter(&self, cell: CellRef) -> Result<bool, EvalFailure> {
        let mut st = self.state.borrow_mut();
        if st.in_progress.contains(&cell) {
            let frame = st.frame.clone();
            st.poisoned.extend(frame);
            #[cfg(feature = "tracing")]
            tracing::debug!(%cell, depth = st.frame.len(), "circular reference");
            return Ok(false);
        }
        if st.frame.len() + st.names.len() >= self.config.max_depth {
            return Err(EvalFailure::EvaluationTooDeep {
                depth: self.config.max_depth,
            });
        }
        st.frame.push(cell);
        st.in_progress.insert(cell);
        Ok(true)
    }

    /// Pop `cell` off the frame; reports whether it was poisoned.
    fn leave(&self, cell: CellRef) -> bool {
        let mut st = self.state.borrow_mut();
        st.frame.pop();
        st.in_progress.remove(&cell);
        st.poisoned.remove(&cell)
    }

    fn is_poisoned(&self, cell: CellRef) -> bool {
        self.state.borrow().poisoned.contains(&cell)
    }

    fn latch(&self, failure: EvalFailure) {
        let mut st = self.state.borrow_mut();
        if st.failure.is_none() {
            st.failure = Some(failure);
        }
    }

    fn take_failure(&self) -> Option<EvalFailure> {
        self.state.borrow_mut().failure.take()
    }

    /* ===================  formulas  =================== */

    /// Run a token stream and reduce its result for storage: scalar context
    /// intersects, array context keeps arrays, a blank result becomes `0`.
    pub fn evaluate(&self, tokens: &[Token], site: EvalSite) -> Result<Value, EvalFailure> {
        let operand = self.run(tokens, site)?;
        let value = if site.array_context {
            self.operand_grid(&operand)?
        } else {
            self.operand_scalar(&operand)?
        };
        Ok(match value {
            Value::Blank => Value::Number(0.0),
            v => v.sanitized(),
        })
    }

    /// Postfix walk with an explicit operand stack. The result may still be
    /// a reference.
    pub fn run(&self, tokens: &[Token], site: EvalSite) -> Result<Operand, EvalFailure> {
        let mut stack: Vec<Operand> = Vec::with_capacity(8);
        let mut pc = 0usize;
        while pc < tokens.len() {
            let token = &tokens[pc];
            pc += 1;
            match token {
                Token::Number(n) => stack.push(Value::Number(*n).into()),
                Token::Text(s) => stack.push(Value::Text(s.clone()).into()),
                Token::Bool(b) => stack.push(Value::Boolean(*b).into()),
                Token::Error(e) => stack.push(Value::Error(*e).into()),
                Token::MissingArg => stack.push(Operand::Missing),
                Token::Array(a) => stack.push(Value::Array(a.clone()).into()),
                Token::Ref { .. }
                | Token::Area { .. }
                | Token::Ref3d { .. }
                | Token::Area3d { .. }
                | Token::RefErr
                | Token::AreaErr
                | Token::DeletedRef3d { .. }
                | Token::DeletedArea3d { .. } => {
                    let operand = match self.resolver().resolve(token, site.sheet)? {
                        Resolution::Ref(r) => Operand::Ref(r),
                        Resolution::Error(e) => Operand::Value(Value::Error(e)),
                    };
                    stack.push(operand);
                }
                Token::Name(name) => {
                    let operand = self.eval_name(name, site)?;
                    stack.push(operand);
                }
                Token::Unary(op) => {
                    let operand = pop(&mut stack)?;
                    let value = self.unary(*op, &operand, site)?;
                    stack.push(value.into());
                }
                Token::Binary(op) => {
                    let right = pop(&mut stack)?;
                    let left = pop(&mut stack)?;
                    let result = self.binary(*op, left, right, site)?;
                    stack.push(result);
                }
                Token::Paren => {}
                Token::Func(id) => {
                    let f = self.lookup(id).ok_or_else(|| {
                        EvalFailure::malformed(format!("fixed-arity call to unknown function {id}"))
                    })?;
                    let argc = f.arity().fixed_count().ok_or_else(|| {
                        EvalFailure::malformed(format!(
                            "{} needs an explicit argument count",
                            f.name()
                        ))
                    })?;
                    let args = pop_n(&mut stack, argc)?;
                    let value = self.call(Some(f), id, args, site)?;
                    stack.push(value.into());
                }
                Token::FuncVar { id, argc } => {
                    let args = pop_n(&mut stack, *argc)?;
                    let f = self.lookup(id);
                    let value = self.call(f, id, args, site)?;
                    stack.push(value.into());
                }
                Token::AttrIf { skip } => {
                    let condition = pop(&mut stack)?;
                    let condition = self.operand_scalar(&condition)?;
                    match coercion::to_boolean(&condition) {
                        Ok(true) => {}
                        Ok(false) => {
                            pc = jump(pc, *skip, tokens.len())?;
                            // two-argument IF: no false branch, the call follows
                            if tokens.get(pc).is_some_and(|t| self.is_if_call(t)) {
                                stack.push(Value::Boolean(false).into());
                                pc += 1;
                            }
                        }
                        Err(e) => {
                            // land on the true branch's closing skip, which jumps past the call
                            stack.push(Value::Error(e).into());
                            pc = jump(pc, skip.saturating_sub(1), tokens.len())?;
                            if !matches!(tokens.get(pc), Some(Token::AttrSkip { .. })) {
                                return Err(EvalFailure::malformed(
                                    "IF condition jump does not land on a skip",
                                ));
                            }
                        }
                    }
                }
                Token::AttrSkip { skip } => {
                    if let Some(top) = stack.last_mut() {
                        if matches!(top, Operand::Missing) {
                            *top = Value::Blank.into();
                        }
                    }
                    pc = jump(pc, *skip, tokens.len())?;
                }
                Token::AttrSum => {
                    let arg = pop(&mut stack)?;
                    let id = FunctionId::from("SUM");
                    let f = self.lookup(&id);
                    let value = self.call(f, &id, vec![arg], site)?;
                    stack.push(value.into());
                }
            }
            if let Some(failure) = self.take_failure() {
                return Err(failure);
            }
            if let Some(cell) = site.cell {
                if self.is_poisoned(cell) {
                    return Ok(Value::Error(ErrorCode::CircularRef).into());
                }
            }
        }
        match stack.len() {
            1 => pop(&mut stack),
            n => Err(EvalFailure::malformed(format!(
                "{n} operands left on the stack"
            ))),
        }
    }

    fn eval_name(&self, name: &str, site: EvalSite) -> Result<Operand, EvalFailure> {
        let Some(tokens) = self.workbook.defined_name(name, site.sheet) else {
            return Ok(Value::Error(ErrorCode::Name).into());
        };
        let key = name.to_ascii_uppercase();
        {
            let mut st = self.state.borrow_mut();
            if st.names.contains(&key) {
                #[cfg(feature = "tracing")]
                tracing::debug!(name = %key, "defined name refers to itself");
                return Ok(Value::Error(ErrorCode::CircularRef).into());
            }
            if st.frame.len() + st.names.len() >= self.config.max_depth {
                return Err(EvalFailure::EvaluationTooDeep {
                    depth: self.config.max_depth,
                });
            }
            st.names.push(key);
        }
        let outcome = nested(|| self.run(&tokens, site));
        self.state.borrow_mut().names.pop();
        outcome
    }

    /* ===================  operators  =================== */

    fn unary(&self, op: UnaryOp, operand: &Operand, site: EvalSite) -> Result<Value, EvalFailure> {
        let v = if site.array_context {
            self.operand_grid(operand)?
        } else {
            self.operand_scalar(operand)?
        };
        Ok(broadcast::map_unary(&v, |e| self.unary_scalar(op, e)))
    }

    fn unary_scalar(&self, op: UnaryOp, v: &Value) -> Value {
        if let Value::Error(e) = v {
            return Value::Error(*e);
        }
        // unary plus leaves text untouched
        if let (UnaryOp::Plus, Value::Text(_)) = (op, v) {
            return v.clone();
        }
        let n = match coercion::to_number(v, self.locale()) {
            Ok(n) => n,
            Err(e) => return Value::Error(e),
        };
        let out = match op {
            UnaryOp::Plus => n,
            UnaryOp::Minus => -n,
            UnaryOp::Percent => n / 100.0,
        };
        number(out)
    }

    fn binary(
        &self,
        op: BinaryOp,
        left: Operand,
        right: Operand,
        site: EvalSite,
    ) -> Result<Operand, EvalFailure> {
        if op.is_reference_op() {
            return Ok(reference_operator(op, &left, &right));
        }
        let (l, r) = if site.array_context {
            (self.operand_grid(&left)?, self.operand_grid(&right)?)
        } else {
            (self.operand_scalar(&left)?, self.operand_scalar(&right)?)
        };
        Ok(broadcast::combine(&l, &r, |a, b| self.binary_scalar(op, a, b)).into())
    }

    fn binary_scalar(&self, op: BinaryOp, a: &Value, b: &Value) -> Value {
        // errors win before any coercion, left first
        if let Value::Error(e) = a {
            return Value::Error(*e);
        }
        if let Value::Error(e) = b {
            return Value::Error(*e);
        }
        if op.is_comparison() {
            let ord = coercion::compare(a, b, self.locale());
            use std::cmp::Ordering::*;
            let result = match op {
                BinaryOp::Eq => ord == Equal,
                BinaryOp::Ne => ord != Equal,
                BinaryOp::Lt => ord == Less,
                BinaryOp::Le => ord != Greater,
                BinaryOp::Gt => ord == Greater,
                _ => ord != Less,
            };
            return Value::Boolean(result);
        }
        if op == BinaryOp::Concat {
            let joined = coercion::to_text(a) + &coercion::to_text(b);
            return match coercion::check_text_length(joined, &self.config.version) {
                Ok(s) => Value::Text(s),
                Err(e) => Value::Error(e),
            };
        }
        let x = match coercion::to_number(a, self.locale()) {
            Ok(n) => n,
            Err(e) => return Value::Error(e),
        };
        let y = match coercion::to_number(b, self.locale()) {
            Ok(n) => n,
            Err(e) => return Value::Error(e),
        };
        match op {
            BinaryOp::Add => number(x + y),
            BinaryOp::Sub => number(x - y),
            BinaryOp::Mul => number(x * y),
            BinaryOp::Div if y == 0.0 => Value::Error(ErrorCode::DivZero),
            BinaryOp::Div => number(x / y),
            BinaryOp::Pow => power(x, y),
            _ => Value::Error(ErrorCode::ValueInvalid),
        }
    }

    /* ===================  function calls  =================== */

    fn lookup(&self, id: &FunctionId) -> Option<Arc<dyn Function>> {
        self.registry.lookup(id).or_else(|| match id {
            FunctionId::Name(name) => {
                let udf = self.workbook.find_user_defined_function(name);
                #[cfg(feature = "tracing")]
                {
                    if udf.is_some() {
                        tracing::debug!(function = %name, "resolved through user-defined function hook");
                    }
                }
                udf
            }
            FunctionId::Index(_) => None,
        })
    }

    fn is_if_call(&self, token: &Token) -> bool {
        token
            .function_id()
            .and_then(|id| self.registry.lookup(id))
            .is_some_and(|f| f.name() == "IF")
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn call(
        &self,
        f: Option<Arc<dyn Function>>,
        id: &FunctionId,
        args: Vec<Operand>,
        site: EvalSite,
    ) -> Result<Value, EvalFailure> {
        let Some(f) = f else {
            #[cfg(feature = "tracing")]
            tracing::debug!(function = %id, "unknown function");
            return Ok(Value::Error(ErrorCode::Name));
        };
        if !f
            .arity()
            .accepts(args.len(), self.config.version.max_function_args)
        {
            return Ok(Value::Error(ErrorCode::ValueInvalid));
        }
        let ctx = DefaultFunctionContext::new(self, site);
        if site.array_context && f.caps().contains(FnCaps::ELEMENTWISE) {
            let handles: SmallVec<[ArgumentHandle<'_, 'a>; 4]> =
                args.iter().map(|op| ArgumentHandle::new(op, self)).collect();
            if let Some(result) = f.eval_array(&handles, &ctx) {
                return Ok(finish(result));
            }
            return self.broadcast_call(f.as_ref(), &args, site);
        }
        let handles: SmallVec<[ArgumentHandle<'_, 'a>; 4]> =
            args.iter().map(|op| ArgumentHandle::new(op, self)).collect();
        Ok(f.dispatch(&handles, &ctx))
    }

    /// Generic array path for element-wise functions: Value-class arguments
    /// are broadcast and the scalar path runs once per element.
    fn broadcast_call(
        &self,
        f: &dyn Function,
        args: &[Operand],
        site: EvalSite,
    ) -> Result<Value, EvalFailure> {
        let mut grids: Vec<Option<Value>> = Vec::with_capacity(args.len());
        for (idx, op) in args.iter().enumerate() {
            let spread = f.param_class(idx) == ParamClass::Value && !matches!(op, Operand::Missing);
            grids.push(if spread {
                Some(self.operand_grid(op)?)
            } else {
                None
            });
        }
        let ctx = DefaultFunctionContext::new(self, site);
        if !grids.iter().flatten().any(broadcast::is_array) {
            let handles: SmallVec<[ArgumentHandle<'_, 'a>; 4]> =
                args.iter().map(|op| ArgumentHandle::new(op, self)).collect();
            return Ok(finish(f.eval(&handles, &ctx)));
        }
        let (rows, cols) = broadcast::broadcast_shape(grids.iter().flatten());
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                let element_args: SmallVec<[Operand; 4]> = args
                    .iter()
                    .zip(&grids)
                    .map(|(op, grid)| match grid {
                        Some(g) => Operand::Value(broadcast::element_at(g, r, c)),
                        None => op.clone(),
                    })
                    .collect();
                let handles: SmallVec<[ArgumentHandle<'_, 'a>; 4]> = element_args
                    .iter()
                    .map(|op| ArgumentHandle::new(op, self))
                    .collect();
                data.push(finish(f.eval(&handles, &ctx)).into_scalar());
            }
        }
        Ok(ArrayValue::new(rows, cols, data)
            .map(Value::Array)
            .unwrap_or(Value::Error(ErrorCode::ValueInvalid)))
    }

    /* ===================  dereferencing  =================== */

    fn operand_scalar(&self, operand: &Operand) -> Result<Value, EvalFailure> {
        match operand {
            Operand::Value(v) => Ok(v.scalar().clone()),
            Operand::Missing => Ok(Value::Blank),
            Operand::Ref(ResolvedRef::Single(cell)) => Ok((*self.cell_value(*cell)?).clone()),
            Operand::Ref(ResolvedRef::Area(area)) => {
                Ok((*self.cell_value(area.top_left())?).clone())
            }
            Operand::Ref(ResolvedRef::MultiSheetArea(_)) => Ok(Value::Error(ErrorCode::ValueInvalid)),
        }
    }

    fn operand_grid(&self, operand: &Operand) -> Result<Value, EvalFailure> {
        match operand {
            Operand::Ref(ResolvedRef::Area(area)) => {
                let data = self.area_values(area, false)?;
                Ok(ArrayValue::new(area.height() as usize, area.width() as usize, data)
                    .map(Value::Array)
                    .unwrap_or(Value::Error(ErrorCode::ValueInvalid)))
            }
            Operand::Value(v) => Ok(v.clone()),
            other => self.operand_scalar(other),
        }
    }

    fn operand_all(&self, operand: &Operand, populated_only: bool) -> Result<Vec<Value>, EvalFailure> {
        match operand {
            Operand::Ref(ResolvedRef::Area(area)) | Operand::Ref(ResolvedRef::MultiSheetArea(area)) => {
                self.area_values(area, populated_only)
            }
            Operand::Value(Value::Array(a)) => Ok(a.iter().cloned().collect()),
            other => Ok(vec![self.operand_scalar(other)?]),
        }
    }

    /// Cell values of an area, sheet by sheet. With `populated_only`, rows
    /// below a sheet's last populated row are left out.
    fn area_values(&self, area: &AreaRef, populated_only: bool) -> Result<Vec<Value>, EvalFailure> {
        let mut out = Vec::new();
        for slice in area.sheets() {
            let sheet = slice.first_sheet();
            let last_row = if populated_only {
                match self.workbook.last_row_num(sheet) {
                    Some(last) if last >= slice.first_row() => last.min(slice.last_row()),
                    _ => continue,
                }
            } else {
                slice.last_row()
            };
            out.reserve(((last_row - slice.first_row() + 1) * slice.width()) as usize);
            for row in slice.first_row()..=last_row {
                for col in slice.first_col()..=slice.last_col() {
                    out.push((*self.cell_value(CellRef::new(sheet, row, col))?).clone());
                }
            }
        }
        Ok(out)
    }

    /* Handle-facing variants: a structural failure is latched and surfaces
    once the running function returns. */

    pub(crate) fn deref_scalar(&self, operand: &Operand) -> Value {
        self.operand_scalar(operand).unwrap_or_else(|f| self.latched(f))
    }

    pub(crate) fn deref_grid(&self, operand: &Operand) -> Value {
        self.operand_grid(operand).unwrap_or_else(|f| self.latched(f))
    }

    pub(crate) fn deref_all(&self, operand: &Operand, populated_only: bool) -> Vec<Value> {
        self.operand_all(operand, populated_only)
            .unwrap_or_else(|f| vec![self.latched(f)])
    }

    pub(crate) fn deref_cell(&self, cell: CellRef) -> Value {
        match self.cell_value(cell) {
            Ok(v) => (*v).clone(),
            Err(f) => self.latched(f),
        }
    }

    fn latched(&self, failure: EvalFailure) -> Value {
        #[cfg(feature = "tracing")]
        tracing::warn!(%failure, "structural failure while reading an argument");
        self.latch(failure);
        Value::Error(ErrorCode::Ref)
    }

    fn is_subtotal_cell(&self, cell: CellRef) -> bool {
        match self.workbook.cell(cell) {
            Some(CellContents::Formula(tokens)) => tokens
                .iter()
                .filter_map(Token::function_id)
                .filter_map(|id| self.registry.lookup(id))
                .any(|f| f.name() == "SUBTOTAL"),
            _ => false,
        }
    }

    // Test-only introspection
    #[cfg(test)]
    pub(crate) fn debug_frame_len(&self) -> usize {
        self.state.borrow().frame.len()
    }

    #[cfg(test)]
    pub(crate) fn debug_cache_len(&self) -> usize {
        self.state.borrow().cache.len()
    }
}

/* ===================  helpers  =================== */

/// Stack left before a nested evaluation continues on a fresh segment.
const STACK_RED_ZONE: usize = 512 * 1024;
const STACK_GROW_SIZE: usize = 8 * 1024 * 1024;

/// Run one level of cell or name recursion; deep chains are bounded by
/// `max_depth` rather than by the caller's thread stack.
fn nested<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, f)
}

fn pop(stack: &mut Vec<Operand>) -> Result<Operand, EvalFailure> {
    stack
        .pop()
        .ok_or_else(|| EvalFailure::malformed("operand stack underflow"))
}

fn pop_n(stack: &mut Vec<Operand>, n: usize) -> Result<Vec<Operand>, EvalFailure> {
    if stack.len() < n {
        return Err(EvalFailure::malformed(format!(
            "call needs {n} operands, stack holds {}",
            stack.len()
        )));
    }
    Ok(stack.split_off(stack.len() - n))
}

fn jump(pc: usize, skip: usize, len: usize) -> Result<usize, EvalFailure> {
    let target = pc + skip;
    if target > len {
        return Err(EvalFailure::malformed(format!(
            "jump to token {target} past the end ({len})"
        )));
    }
    Ok(target)
}

fn number(n: f64) -> Value {
    match coercion::sanitize_numeric(n) {
        Ok(n) => Value::Number(n),
        Err(e) => Value::Error(e),
    }
}

fn power(base: f64, exp: f64) -> Value {
    match checked_pow(base, exp) {
        Ok(n) => Value::Number(n),
        Err(e) => Value::Error(e),
    }
}

fn reference_operator(op: BinaryOp, left: &Operand, right: &Operand) -> Operand {
    let result = match (left, right) {
        (Operand::Value(Value::Error(e)), _) | (_, Operand::Value(Value::Error(e))) => Err(*e),
        (Operand::Ref(l), Operand::Ref(r)) if op == BinaryOp::Range => reference::range_of(l, r),
        (Operand::Ref(l), Operand::Ref(r)) => reference::intersection_of(l, r),
        _ => Err(ErrorCode::ValueInvalid),
    };
    match result {
        Ok(r) => Operand::Ref(r),
        Err(e) => Operand::Value(Value::Error(e)),
    }
}

/* ===================  function context  =================== */

pub struct DefaultFunctionContext<'i, 'a> {
    interp: &'i Interpreter<'a>,
    site: EvalSite,
}

impl<'i, 'a> DefaultFunctionContext<'i, 'a> {
    pub fn new(interp: &'i Interpreter<'a>, site: EvalSite) -> Self {
        Self { interp, site }
    }

    pub fn in_array_context(mut self) -> Self {
        self.site.array_context = true;
        self
    }
}

impl FunctionContext for DefaultFunctionContext<'_, '_> {
    fn locale(&self) -> &Locale {
        self.interp.locale()
    }

    fn date_system(&self) -> DateSystem {
        self.interp.config.date_system
    }

    fn version(&self) -> &SpreadsheetVersion {
        &self.interp.config.version
    }

    fn current_cell(&self) -> Option<CellRef> {
        self.site.cell
    }

    fn array_context(&self) -> bool {
        self.site.array_context
    }

    fn cell_value(&self, cell: CellRef) -> Value {
        self.interp.deref_cell(cell)
    }

    fn is_row_hidden(&self, sheet: SheetIndex, row: u32) -> bool {
        self.interp.workbook.is_row_hidden(sheet, row)
    }

    fn is_subtotal_cell(&self, cell: CellRef) -> bool {
        self.interp.is_subtotal_cell(cell)
    }

    fn last_row_num(&self, sheet: SheetIndex) -> Option<u32> {
        self.interp.workbook.last_row_num(sheet)
    }
}
