//! Reference tokens → cell locations.

use gridcalc_common::{AreaRef, CellRef, ErrorCode, SheetIndex, SpreadsheetVersion};

use crate::error::EvalFailure;
use crate::token::Token;
use crate::traits::EvaluationWorkbook;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolvedRef {
    Single(CellRef),
    Area(AreaRef),
    /// 3-D area; each sheet contributes its own 2-D sub-grid.
    MultiSheetArea(AreaRef),
}

impl ResolvedRef {
    pub fn area(&self) -> AreaRef {
        match *self {
            ResolvedRef::Single(c) => AreaRef::single(c),
            ResolvedRef::Area(a) | ResolvedRef::MultiSheetArea(a) => a,
        }
    }

    /// Classify an area: one cell, one sheet, or several sheets.
    pub fn from_area(area: AreaRef) -> Self {
        if area.is_multi_sheet() {
            ResolvedRef::MultiSheetArea(area)
        } else if area.is_single_cell() {
            ResolvedRef::Single(area.top_left())
        } else {
            ResolvedRef::Area(area)
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, ResolvedRef::Single(_))
    }

    /// `(rows, cols)` of one sheet slice.
    pub fn dimensions(&self) -> (u32, u32) {
        let a = self.area();
        (a.height(), a.width())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Ref(ResolvedRef),
    /// Stale reference; evaluates to the error value.
    Error(ErrorCode),
}

pub struct ReferenceResolver<'a> {
    workbook: &'a dyn EvaluationWorkbook,
    version: SpreadsheetVersion,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(workbook: &'a dyn EvaluationWorkbook, version: SpreadsheetVersion) -> Self {
        Self { workbook, version }
    }

    /// Resolve a reference token relative to the formula's sheet.
    ///
    /// Fails with [`EvalFailure::NotAReference`] for non-reference tokens.
    pub fn resolve(&self, token: &Token, current_sheet: SheetIndex) -> Result<Resolution, EvalFailure> {
        match *token {
            Token::Ref { row, col } => {
                self.check_sheet(current_sheet)?;
                self.check_bounds(row, col)?;
                Ok(Resolution::Ref(ResolvedRef::Single(CellRef::new(
                    current_sheet,
                    row,
                    col,
                ))))
            }
            Token::Area {
                first_row,
                last_row,
                first_col,
                last_col,
            } => {
                self.check_sheet(current_sheet)?;
                self.check_bounds(first_row, first_col)?;
                self.check_bounds(last_row, last_col)?;
                Ok(Resolution::Ref(ResolvedRef::Area(AreaRef::new(
                    (current_sheet, current_sheet),
                    (first_row, last_row),
                    (first_col, last_col),
                ))))
            }
            Token::Ref3d {
                extern_sheet,
                row,
                col,
            } => {
                let (first, last) = self.extern_sheets(extern_sheet)?;
                self.check_bounds(row, col)?;
                let area = AreaRef::new((first, last), (row, row), (col, col));
                Ok(Resolution::Ref(if first == last {
                    ResolvedRef::Single(CellRef::new(first, row, col))
                } else {
                    ResolvedRef::MultiSheetArea(area)
                }))
            }
            Token::Area3d {
                extern_sheet,
                first_row,
                last_row,
                first_col,
                last_col,
            } => {
                let (first, last) = self.extern_sheets(extern_sheet)?;
                self.check_bounds(first_row, first_col)?;
                self.check_bounds(last_row, last_col)?;
                let area = AreaRef::new((first, last), (first_row, last_row), (first_col, last_col));
                Ok(Resolution::Ref(if first == last {
                    ResolvedRef::Area(area)
                } else {
                    ResolvedRef::MultiSheetArea(area)
                }))
            }
            Token::RefErr
            | Token::AreaErr
            | Token::DeletedRef3d { .. }
            | Token::DeletedArea3d { .. } => Ok(Resolution::Error(ErrorCode::Ref)),
            _ => Err(EvalFailure::NotAReference),
        }
    }

    fn extern_sheets(&self, index: u32) -> Result<(SheetIndex, SheetIndex), EvalFailure> {
        let (first, last) = self
            .workbook
            .resolve_extern_sheet(index)
            .ok_or(EvalFailure::UnknownExternSheet(index))?;
        self.check_sheet(first)?;
        self.check_sheet(last)?;
        Ok((first.min(last), first.max(last)))
    }

    fn check_sheet(&self, sheet: SheetIndex) -> Result<(), EvalFailure> {
        if sheet < self.workbook.sheet_count() {
            Ok(())
        } else {
            Err(EvalFailure::UnknownSheet(sheet))
        }
    }

    fn check_bounds(&self, row: u32, col: u32) -> Result<(), EvalFailure> {
        if self.version.contains(row, col) {
            Ok(())
        } else {
            Err(EvalFailure::ReferenceOutOfBounds { row, col })
        }
    }
}

/// `A1:C3` from two reference operands: the bounding area on their sheet.
pub fn range_of(left: &ResolvedRef, right: &ResolvedRef) -> Result<ResolvedRef, ErrorCode> {
    if matches!(left, ResolvedRef::MultiSheetArea(_)) || matches!(right, ResolvedRef::MultiSheetArea(_)) {
        return Err(ErrorCode::ValueInvalid);
    }
    left.area()
        .bounding(&right.area())
        .map(ResolvedRef::from_area)
        .ok_or(ErrorCode::ValueInvalid)
}

/// `A1:C3 B2:D4`: the overlapping area, `#NULL!` when disjoint.
pub fn intersection_of(left: &ResolvedRef, right: &ResolvedRef) -> Result<ResolvedRef, ErrorCode> {
    left.area()
        .intersect(&right.area())
        .map(ResolvedRef::from_area)
        .ok_or(ErrorCode::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(text: &str) -> ResolvedRef {
        ResolvedRef::from_area(AreaRef::parse_a1(0, text).unwrap())
    }

    #[test]
    fn range_operator_bounds_both_operands() {
        let r = range_of(&area("B2"), &area("A4:C5")).unwrap();
        assert_eq!(r, area("A2:C5"));
        let single = range_of(&area("A1"), &area("A1")).unwrap();
        assert!(single.is_single());
    }

    #[test]
    fn range_operator_rejects_cross_sheet() {
        let other = ResolvedRef::Single(CellRef::new(1, 0, 0));
        assert_eq!(
            range_of(&area("A1"), &other),
            Err(ErrorCode::ValueInvalid)
        );
    }

    #[test]
    fn intersection_is_overlap_or_null() {
        assert_eq!(
            intersection_of(&area("A1:C3"), &area("B2:D4")),
            Ok(area("B2:C3"))
        );
        assert_eq!(
            intersection_of(&area("A1:A2"), &area("C1:C2")),
            Err(ErrorCode::Null)
        );
    }
}
