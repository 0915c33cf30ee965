use error_stack::{report, ResultExt};

use super::{
    a1_notation::{
        generic_a1_notation_split, A1Notation, A1NotationParseError, A1NotationParts,
        FromA1Notation,
    },
    cell_position::CellPosition,
};

/// A bounded rectangle of cells, optionally bound to a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange {
    pub start: CellPosition,
    pub end: CellPosition,
    pub sheet_title: Option<String>,
}

impl CellRange {
    pub fn row_count(&self) -> u32 {
        self.end.row.0 - self.start.row.0 + 1
    }

    pub fn column_count(&self) -> u32 {
        self.end.col.value() - self.start.col.value() + 1
    }
}

/// A lone token that is not a cell reference (`Sheet1`, `Data2024`) names a whole sheet.
fn is_whole_sheet(parts: &A1NotationParts) -> bool {
    parts.sheet_title.is_none()
        && parts.start == parts.end
        && CellPosition::parse_local(&parts.start).is_err()
}

impl FromA1Notation for CellRange {
    type Err = A1NotationParseError;

    /// Only bounded ranges parse: `Sheet1!A:Z`, `Sheet1!A2:Z` and a bare sheet title such as
    /// `Sheet1` yield `Unbounded`.
    fn from_a1_notation(a1_notation: &A1Notation) -> error_stack::Result<Self, Self::Err> {
        let parts = generic_a1_notation_split(a1_notation);
        if is_whole_sheet(&parts) {
            return Err(report!(A1NotationParseError::Unbounded))
                .attach_printable_lazy(|| format!("'{}' names a whole sheet", a1_notation));
        }

        let start = CellPosition::parse_local(&parts.start)?;
        let end = CellPosition::parse_local(&parts.end)?;

        if end.row < start.row || end.col < start.col {
            return Err(report!(A1NotationParseError::Inverted))
                .attach_printable_lazy(|| a1_notation.to_string());
        }

        Ok(CellRange {
            start,
            end,
            sheet_title: parts.sheet_title,
        })
    }
}
