use sha2::{Digest, Sha256};

/// A single scalar cell. Both stores agree on this shape: the spreadsheet side is
/// schema-less, the table side coerces on insert according to its column types.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Integer(i64),
    Real(f64),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(text) => write!(f, "{}", text),
            CellValue::Integer(value) => write!(f, "{}", value),
            CellValue::Real(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_owned())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Real(value)
    }
}

pub type SnapshotRow = Vec<CellValue>;

/// Full in-memory copy of a tabular store's rows at one instant.
///
/// Rows may be ragged: the spreadsheet omits trailing empty cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    rows: Vec<SnapshotRow>,
}

impl Snapshot {
    pub fn new(rows: Vec<SnapshotRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[SnapshotRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Width of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Pads every row shorter than `width` with empty cells. Longer rows are left alone so
    /// the destination can reject them.
    pub fn pad_rows_to(mut self, width: usize) -> Self {
        for row in &mut self.rows {
            if row.len() < width {
                row.resize(width, CellValue::Empty);
            }
        }
        self
    }

    /// SHA-256 over a canonical encoding of the rows. Trailing empty cells and trailing
    /// empty rows do not contribute, so a ragged read and its padded form hash equal.
    pub fn content_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();

        let last_row = self
            .rows
            .iter()
            .rposition(|row| row.iter().any(|cell| !cell.is_empty()))
            .map_or(0, |index| index + 1);

        for row in &self.rows[..last_row] {
            let last_cell = row
                .iter()
                .rposition(|cell| !cell.is_empty())
                .map_or(0, |index| index + 1);

            for cell in &row[..last_cell] {
                match cell {
                    CellValue::Empty => hasher.update([0u8]),
                    CellValue::Text(text) => {
                        hasher.update([1u8]);
                        hasher.update((text.len() as u64).to_le_bytes());
                        hasher.update(text.as_bytes());
                    }
                    CellValue::Integer(value) => {
                        hasher.update([2u8]);
                        hasher.update(value.to_le_bytes());
                    }
                    CellValue::Real(value) => {
                        hasher.update([3u8]);
                        hasher.update(value.to_bits().to_le_bytes());
                    }
                }
            }
            hasher.update([0xFFu8]);
        }

        hasher.finalize().into()
    }
}

impl From<Vec<SnapshotRow>> for Snapshot {
    fn from(rows: Vec<SnapshotRow>) -> Self {
        Snapshot::new(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_rows(rows: &[&[&str]]) -> Snapshot {
        Snapshot::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| CellValue::from(*cell)).collect())
                .collect(),
        )
    }

    #[test]
    fn test_pad_rows_to_fills_short_rows_only() {
        let snapshot = text_rows(&[&["a"], &["b", "2", "x"]]).pad_rows_to(2);

        assert_eq!(
            snapshot.rows(),
            &[
                vec![CellValue::Text("a".into()), CellValue::Empty],
                vec![
                    CellValue::Text("b".into()),
                    CellValue::Text("2".into()),
                    CellValue::Text("x".into())
                ],
            ]
        );
    }

    #[test]
    fn test_width_is_widest_row() {
        assert_eq!(text_rows(&[&["a"], &["b", "c", "d"], &[]]).width(), 3);
        assert_eq!(Snapshot::default().width(), 0);
    }

    #[test]
    fn test_empty_string_is_empty_cell() {
        assert_eq!(CellValue::from(""), CellValue::Empty);
        assert_eq!(CellValue::from(String::new()), CellValue::Empty);
    }

    #[test]
    fn test_content_hash_ignores_trailing_padding() {
        let ragged = text_rows(&[&["a", "1"], &["b"]]);
        let padded = ragged.clone().pad_rows_to(4);
        let with_blank_row = Snapshot::new(
            padded
                .rows()
                .iter()
                .cloned()
                .chain(std::iter::once(vec![CellValue::Empty; 4]))
                .collect(),
        );

        assert_eq!(ragged.content_hash(), padded.content_hash());
        assert_eq!(ragged.content_hash(), with_blank_row.content_hash());
    }

    #[test]
    fn test_content_hash_distinguishes_types_and_rows() {
        let text = Snapshot::new(vec![vec![CellValue::Text("1".into())]]);
        let integer = Snapshot::new(vec![vec![CellValue::Integer(1)]]);
        assert_ne!(text.content_hash(), integer.content_hash());

        let one_row = text_rows(&[&["ab"]]);
        let two_rows = text_rows(&[&["a"], &["b"]]);
        assert_ne!(one_row.content_hash(), two_rows.content_hash());
    }
}
