use google_sheets4::api::ValueRange;
use serde_json::{Number, Value};

use crate::domain::snapshot::{CellValue, Snapshot};

pub trait ValueRangeFactory {
    /// Rows exactly as given. Cells the snapshot does not cover are left out.
    fn from_snapshot(snapshot: &Snapshot) -> Self;

    /// The snapshot padded with empty strings to a `row_count` x `column_count` rectangle, so
    /// a single update overwrites every cell of the target range.
    fn from_snapshot_padded(snapshot: &Snapshot, row_count: usize, column_count: usize) -> Self;
}

pub trait IntoSnapshot {
    fn into_snapshot(self) -> Snapshot;
}

fn wrap_value(cell: &CellValue) -> Value {
    match cell {
        CellValue::Empty => Value::String(String::new()),
        CellValue::Text(text) => Value::String(text.clone()),
        CellValue::Integer(value) => Value::Number((*value).into()),
        CellValue::Real(value) => Number::from_f64(*value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string())),
    }
}

fn unwrap_value(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::String(text) => CellValue::from(text),
        Value::Number(number) => match number.as_i64() {
            Some(value) => CellValue::Integer(value),
            None => number
                .as_f64()
                .map(CellValue::Real)
                .unwrap_or_else(|| CellValue::Text(number.to_string())),
        },
        Value::Bool(flag) => CellValue::Text(if flag { "TRUE" } else { "FALSE" }.to_owned()),
        other => CellValue::Text(other.to_string()),
    }
}

impl ValueRangeFactory for ValueRange {
    fn from_snapshot(snapshot: &Snapshot) -> Self {
        let values = snapshot
            .rows()
            .iter()
            .map(|row| row.iter().map(wrap_value).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        Self {
            major_dimension: Some("ROWS".to_string()),
            range: None,
            values: Some(values),
        }
    }

    fn from_snapshot_padded(snapshot: &Snapshot, row_count: usize, column_count: usize) -> Self {
        let blank_row = || vec![wrap_value(&CellValue::Empty); column_count];

        let mut values = snapshot
            .rows()
            .iter()
            .take(row_count)
            .map(|row| {
                let mut cells = row
                    .iter()
                    .take(column_count)
                    .map(wrap_value)
                    .collect::<Vec<_>>();
                cells.resize(column_count, wrap_value(&CellValue::Empty));
                cells
            })
            .collect::<Vec<_>>();

        values.extend((values.len()..row_count).map(|_| blank_row()));

        Self {
            major_dimension: Some("ROWS".to_string()),
            range: None,
            values: Some(values),
        }
    }
}

impl IntoSnapshot for ValueRange {
    fn into_snapshot(self) -> Snapshot {
        self.values.unwrap_or_default().into_snapshot()
    }
}

impl IntoSnapshot for Vec<Vec<Value>> {
    fn into_snapshot(self) -> Snapshot {
        Snapshot::new(
            self.into_iter()
                .map(|row| row.into_iter().map(unwrap_value).collect())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrap_value() {
        assert_eq!(wrap_value(&CellValue::Text("1".into())), json!("1"));
        assert_eq!(wrap_value(&CellValue::Integer(7)), json!(7));
        assert_eq!(wrap_value(&CellValue::Real(1.5)), json!(1.5));
        assert_eq!(wrap_value(&CellValue::Empty), json!(""));
        assert_eq!(wrap_value(&CellValue::Real(f64::NAN)), json!("NaN"));
    }

    #[test]
    fn test_unwrap_value() {
        assert_eq!(unwrap_value(json!("a")), CellValue::Text("a".into()));
        assert_eq!(unwrap_value(json!("")), CellValue::Empty);
        assert_eq!(unwrap_value(json!(null)), CellValue::Empty);
        assert_eq!(unwrap_value(json!(3)), CellValue::Integer(3));
        assert_eq!(unwrap_value(json!(2.25)), CellValue::Real(2.25));
        assert_eq!(unwrap_value(json!(true)), CellValue::Text("TRUE".into()));
    }

    #[test]
    fn test_from_snapshot() {
        let snapshot = Snapshot::new(vec![
            vec![CellValue::Text("a".into()), CellValue::Integer(1)],
            vec![CellValue::Text("b".into())],
        ]);

        let value_range = ValueRange::from_snapshot(&snapshot);

        assert_eq!(value_range.major_dimension.as_deref(), Some("ROWS"));
        assert_eq!(value_range.range, None);
        assert_eq!(
            value_range.values,
            Some(vec![vec![json!("a"), json!(1)], vec![json!("b")]])
        );
    }

    #[test]
    fn test_from_snapshot_padded_blanks_rest_of_rectangle() {
        let snapshot = Snapshot::new(vec![vec![CellValue::Text("a".into())]]);

        let value_range = ValueRange::from_snapshot_padded(&snapshot, 3, 2);

        assert_eq!(
            value_range.values,
            Some(vec![
                vec![json!("a"), json!("")],
                vec![json!(""), json!("")],
                vec![json!(""), json!("")],
            ])
        );
    }

    #[test]
    fn test_padded_payload_reads_back_as_same_content() {
        let snapshot = Snapshot::new(vec![
            vec![
                CellValue::Text("a".into()),
                CellValue::Integer(1),
                CellValue::Real(2.5),
            ],
            vec![CellValue::Empty, CellValue::Integer(-4)],
        ]);

        let read_back = ValueRange::from_snapshot_padded(&snapshot, 3, 3).into_snapshot();

        assert_eq!(read_back.content_hash(), snapshot.content_hash());
        assert_eq!(read_back.rows()[0][1], CellValue::Integer(1));
        assert_eq!(read_back.rows()[0][2], CellValue::Real(2.5));
        assert_eq!(read_back.rows()[1][0], CellValue::Empty);
        assert_eq!(read_back.rows()[2], vec![CellValue::Empty; 3]);
    }

    #[test]
    fn test_into_snapshot_handles_missing_values() {
        let value_range = ValueRange {
            major_dimension: Some("ROWS".to_string()),
            range: Some("Sheet1!A1:Z1000".to_string()),
            values: None,
        };
        assert!(value_range.into_snapshot().is_empty());
    }

    #[test]
    fn test_into_snapshot_keeps_ragged_rows() {
        let values = vec![vec![json!("a"), json!("1")], vec![json!("b")]];
        let snapshot = values.into_snapshot();

        assert_eq!(
            snapshot.rows(),
            &[
                vec![CellValue::Text("a".into()), CellValue::Text("1".into())],
                vec![CellValue::Text("b".into())],
            ]
        );
    }
}
