//! Sheet-scoped cell and area coordinates.
//!
//! All indices are 0-based. Ceilings are not enforced here; the evaluator
//! checks them against the configured [`crate::SpreadsheetVersion`].

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position of a sheet within its workbook.
pub type SheetIndex = u32;

/// Render a 0-based column index as spreadsheet letters (`0 -> A`, `26 -> AA`).
pub fn column_to_letters(mut col: u32) -> String {
    let mut buf = Vec::new();
    loop {
        buf.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}

/// Parse spreadsheet column letters (case-insensitive) into a 0-based index.
pub fn letters_to_column(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for b in s.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        let digit = (b.to_ascii_uppercase() - b'A') as u32 + 1;
        col = col.checked_mul(26)?.checked_add(digit)?;
    }
    Some(col - 1)
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub sheet: SheetIndex,
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub const fn new(sheet: SheetIndex, row: u32, col: u32) -> Self {
        Self { sheet, row, col }
    }

    /// Parse `A1`-style text on the given sheet (no `$` anchors, no sheet prefix).
    pub fn parse_a1(sheet: SheetIndex, text: &str) -> Option<Self> {
        let text = text.trim().replace('$', "");
        let split = text.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = text.split_at(split);
        let col = letters_to_column(letters)?;
        let row: u32 = digits.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(Self::new(sheet, row - 1, col))
    }

    pub fn offset(self, rows: u32, cols: u32) -> Self {
        Self::new(self.sheet, self.row + rows, self.col + cols)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]{}{}",
            self.sheet,
            column_to_letters(self.col),
            self.row + 1
        )
    }
}

/// A rectangular block of cells, possibly spanning several sheets (a 3-D
/// reference). Always normalised so every `first_*` is `<=` its `last_*`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AreaRef {
    first_sheet: SheetIndex,
    last_sheet: SheetIndex,
    first_row: u32,
    last_row: u32,
    first_col: u32,
    last_col: u32,
}

impl AreaRef {
    pub fn new(
        sheets: (SheetIndex, SheetIndex),
        rows: (u32, u32),
        cols: (u32, u32),
    ) -> Self {
        Self {
            first_sheet: sheets.0.min(sheets.1),
            last_sheet: sheets.0.max(sheets.1),
            first_row: rows.0.min(rows.1),
            last_row: rows.0.max(rows.1),
            first_col: cols.0.min(cols.1),
            last_col: cols.0.max(cols.1),
        }
    }

    /// Single-sheet area spanned by two corner cells, on the sheet of `a`.
    pub fn from_corners(a: CellRef, b: CellRef) -> Self {
        Self::new((a.sheet, a.sheet), (a.row, b.row), (a.col, b.col))
    }

    pub fn single(cell: CellRef) -> Self {
        Self::from_corners(cell, cell)
    }

    /// Parse `A1:B2` (or a lone `A1`) on the given sheet.
    pub fn parse_a1(sheet: SheetIndex, text: &str) -> Option<Self> {
        match text.split_once(':') {
            Some((a, b)) => Some(Self::from_corners(
                CellRef::parse_a1(sheet, a)?,
                CellRef::parse_a1(sheet, b)?,
            )),
            None => CellRef::parse_a1(sheet, text).map(Self::single),
        }
    }

    pub fn first_sheet(&self) -> SheetIndex {
        self.first_sheet
    }
    pub fn last_sheet(&self) -> SheetIndex {
        self.last_sheet
    }
    pub fn first_row(&self) -> u32 {
        self.first_row
    }
    pub fn last_row(&self) -> u32 {
        self.last_row
    }
    pub fn first_col(&self) -> u32 {
        self.first_col
    }
    pub fn last_col(&self) -> u32 {
        self.last_col
    }

    pub fn height(&self) -> u32 {
        self.last_row - self.first_row + 1
    }

    pub fn width(&self) -> u32 {
        self.last_col - self.first_col + 1
    }

    pub fn is_multi_sheet(&self) -> bool {
        self.first_sheet != self.last_sheet
    }

    pub fn is_single_cell(&self) -> bool {
        !self.is_multi_sheet() && self.height() == 1 && self.width() == 1
    }

    pub fn top_left(&self) -> CellRef {
        CellRef::new(self.first_sheet, self.first_row, self.first_col)
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        (self.first_sheet..=self.last_sheet).contains(&cell.sheet)
            && (self.first_row..=self.last_row).contains(&cell.row)
            && (self.first_col..=self.last_col).contains(&cell.col)
    }

    /// The 2-D slice of this area on one of its sheets.
    pub fn on_sheet(&self, sheet: SheetIndex) -> Option<AreaRef> {
        if !(self.first_sheet..=self.last_sheet).contains(&sheet) {
            return None;
        }
        Some(Self {
            first_sheet: sheet,
            last_sheet: sheet,
            ..*self
        })
    }

    /// Per-sheet slices in sheet order.
    pub fn sheets(&self) -> impl Iterator<Item = AreaRef> + '_ {
        (self.first_sheet..=self.last_sheet).filter_map(move |s| self.on_sheet(s))
    }

    /// Cells of one sheet slice in row-major order.
    pub fn cells_on(&self, sheet: SheetIndex) -> impl Iterator<Item = CellRef> + '_ {
        let rows = self.first_row..=self.last_row;
        rows.flat_map(move |r| {
            (self.first_col..=self.last_col).map(move |c| CellRef::new(sheet, r, c))
        })
    }

    /// Every cell, sheet by sheet, each sheet row-major.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.first_sheet..=self.last_sheet).flat_map(move |s| self.cells_on(s))
    }

    /// Cell at a relative offset from the top-left corner of the first sheet.
    pub fn cell_at(&self, row_offset: u32, col_offset: u32) -> Option<CellRef> {
        if row_offset < self.height() && col_offset < self.width() {
            Some(self.top_left().offset(row_offset, col_offset))
        } else {
            None
        }
    }

    /// Smallest single-sheet area containing both; `None` across sheets.
    pub fn bounding(&self, other: &AreaRef) -> Option<AreaRef> {
        if self.is_multi_sheet() || other.is_multi_sheet() || self.first_sheet != other.first_sheet
        {
            return None;
        }
        Some(Self::new(
            (self.first_sheet, self.first_sheet),
            (
                self.first_row.min(other.first_row),
                self.last_row.max(other.last_row),
            ),
            (
                self.first_col.min(other.first_col),
                self.last_col.max(other.last_col),
            ),
        ))
    }

    /// Overlap of two areas; `None` when disjoint.
    pub fn intersect(&self, other: &AreaRef) -> Option<AreaRef> {
        let sheets = (
            self.first_sheet.max(other.first_sheet),
            self.last_sheet.min(other.last_sheet),
        );
        let rows = (
            self.first_row.max(other.first_row),
            self.last_row.min(other.last_row),
        );
        let cols = (
            self.first_col.max(other.first_col),
            self.last_col.min(other.last_col),
        );
        if sheets.0 > sheets.1 || rows.0 > rows.1 || cols.0 > cols.1 {
            return None;
        }
        Some(Self::new(sheets, rows, cols))
    }
}

impl fmt::Display for AreaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_multi_sheet() {
            write!(f, "[{}:{}]", self.first_sheet, self.last_sheet)?;
        } else {
            write!(f, "[{}]", self.first_sheet)?;
        }
        write!(
            f,
            "{}{}:{}{}",
            column_to_letters(self.first_col),
            self.first_row + 1,
            column_to_letters(self.last_col),
            self.last_row + 1
        )
    }
}
