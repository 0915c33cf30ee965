use error_stack::{report, ResultExt};

use super::{
    a1_notation::A1NotationParseError,
    column::{parse_col, Column},
    row::Row,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPosition {
    pub col: Column,
    pub row: Row,
}

impl CellPosition {
    /// Parses a local cell reference such as `B12` (no sheet title, no `$` anchors).
    pub fn parse_local(cell: &str) -> error_stack::Result<Self, A1NotationParseError> {
        let cell = cell.replace('$', "");
        let split_at = cell
            .find(|c: char| c.is_ascii_digit())
            .ok_or(report!(A1NotationParseError::Unbounded))
            .attach_printable_lazy(|| format!("Cell reference '{}' has no row", cell))?;

        let (col_str, row_str) = cell.split_at(split_at);
        let col = parse_col(col_str).map_err(A1NotationParseError::ColumnParseError)?;
        let row = row_str
            .parse::<Row>()
            .change_context(A1NotationParseError::RowParseError)
            .attach_printable_lazy(|| format!("Invalid row in cell reference '{}'", cell))?;

        if row.0 == 0 {
            return Err(report!(A1NotationParseError::RowParseError))
                .attach_printable("Rows are 1-based");
        }

        Ok(CellPosition { col, row })
    }
}
