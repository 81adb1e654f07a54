//! Operands on the evaluation stack and the lazy handles functions see.

use gridcalc_common::{CellRef, ErrorCode, Value};

use crate::coercion;
use crate::interpreter::Interpreter;
use crate::reference::ResolvedRef;

/// One entry of the operand stack. References stay unresolved until a
/// consumer asks for values.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    Ref(ResolvedRef),
    /// An omitted argument.
    Missing,
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

impl From<ResolvedRef> for Operand {
    fn from(r: ResolvedRef) -> Self {
        Operand::Ref(r)
    }
}

impl From<CellRef> for Operand {
    fn from(c: CellRef) -> Self {
        Operand::Ref(ResolvedRef::Single(c))
    }
}

impl Operand {
    /// Holds an array or a reference to more than one cell.
    pub fn is_array_like(&self) -> bool {
        match self {
            Operand::Value(Value::Array(a)) => a.len() > 1,
            Operand::Ref(ResolvedRef::Area(a)) => !a.is_single_cell(),
            Operand::Ref(ResolvedRef::MultiSheetArea(_)) => true,
            _ => false,
        }
    }
}

/// Lazy view of one argument. Dereferencing a formula cell evaluates it.
pub struct ArgumentHandle<'a, 'b> {
    operand: &'a Operand,
    interp: &'a Interpreter<'b>,
}

impl<'a, 'b> ArgumentHandle<'a, 'b> {
    pub fn new(operand: &'a Operand, interp: &'a Interpreter<'b>) -> Self {
        Self { operand, interp }
    }

    pub fn operand(&self) -> &'a Operand {
        self.operand
    }

    pub fn is_missing(&self) -> bool {
        matches!(self.operand, Operand::Missing)
    }

    pub fn is_array_like(&self) -> bool {
        self.operand.is_array_like()
    }

    /// A scalar typed directly in the call (not from a reference or array).
    pub fn is_direct_scalar(&self) -> bool {
        match self.operand {
            Operand::Value(Value::Array(_)) | Operand::Ref(_) => false,
            Operand::Value(_) | Operand::Missing => true,
        }
    }

    pub fn reference(&self) -> Option<ResolvedRef> {
        match self.operand {
            Operand::Ref(r) => Some(*r),
            _ => None,
        }
    }

    /// Scalar value by implicit intersection: arrays and areas give their
    /// top-left element, a multi-sheet area gives `#VALUE!`.
    pub fn value(&self) -> Value {
        self.interp.deref_scalar(self.operand)
    }

    /// Array for areas and array constants, scalar otherwise.
    pub fn grid(&self) -> Value {
        self.interp.deref_grid(self.operand)
    }

    /// Every element in order: sheet by sheet, then row-major.
    pub fn flatten(&self) -> Vec<Value> {
        self.interp.deref_all(self.operand, false)
    }

    /// Like [`Self::flatten`] but skips rows past each sheet's last populated
    /// row. For consumers that ignore blanks.
    pub fn flatten_populated(&self) -> Vec<Value> {
        self.interp.deref_all(self.operand, true)
    }

    pub fn number(&self) -> Result<f64, ErrorCode> {
        coercion::to_number(&self.value(), self.interp.locale())
    }

    /// Text of the scalar value; an error value comes back as `Err`.
    pub fn text(&self) -> Result<String, ErrorCode> {
        match self.value() {
            Value::Error(e) => Err(e),
            v => Ok(coercion::to_text(&v)),
        }
    }

    pub fn boolean(&self) -> Result<bool, ErrorCode> {
        coercion::to_boolean(&self.value())
    }

    /// Number truncated toward zero, as spreadsheet integer arguments are.
    pub fn integer(&self) -> Result<i64, ErrorCode> {
        let n = self.number()?.trunc();
        // i64::MAX as f64 is 2^63, one past the largest i64
        if n.abs() >= i64::MAX as f64 {
            return Err(ErrorCode::Num);
        }
        Ok(n as i64)
    }

    /// Like [`Self::number`] but an omitted or missing argument yields `default`.
    pub fn number_or(&self, default: f64) -> Result<f64, ErrorCode> {
        if self.is_missing() {
            Ok(default)
        } else {
            self.number()
        }
    }
}
