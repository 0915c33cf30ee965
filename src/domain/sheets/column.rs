use std::fmt::Formatter;

use thiserror::Error;

/// Highest column Sheets supports (`ZZZ`).
pub const MAX_COLUMN: u32 = 18_278;

/// 1-based spreadsheet column (`A` = 1).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Column(u32);

impl Column {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", number_to_letters(self.0))
    }
}

impl std::fmt::Debug for Column {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Column(u32: {}, letters: {})", self.0, self)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ColumnParseError {
    #[error("Non-alphabetic character in column")]
    NonAlphabeticCharacter,
    #[error("Empty column")]
    Empty,
    #[error("Column out of range")]
    Overflow,
}

pub fn parse_col<T: AsRef<str>>(col_str: T) -> Result<Column, ColumnParseError> {
    let col_str = col_str.as_ref();
    if col_str.is_empty() {
        return Err(ColumnParseError::Empty);
    }
    if col_str.chars().any(|c| !c.is_ascii_alphabetic()) {
        return Err(ColumnParseError::NonAlphabeticCharacter);
    }

    col_str
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .try_fold(0u32, |acc, c| {
            acc.checked_mul(26)
                .and_then(|acc| acc.checked_add(c as u32 - 'A' as u32 + 1))
                .filter(|&col| col <= MAX_COLUMN)
        })
        .map(Column)
        .ok_or(ColumnParseError::Overflow)
}

fn number_to_letters(number: u32) -> String {
    let mut number = number;
    let mut result = String::new();
    while number > 0 {
        let remainder = (number - 1) % 26;
        let letter = (remainder as u8 + b'A') as char;
        result.push(letter);
        number = (number - remainder) / 26;
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_display_a() {
        assert_eq!(Column(1).to_string(), "A");
    }

    #[test]
    fn test_column_display_z() {
        assert_eq!(Column(26).to_string(), "Z");
    }

    #[test]
    fn test_column_display_aa() {
        assert_eq!(Column(27).to_string(), "AA");
    }

    #[test]
    fn test_column_display_za() {
        assert_eq!(Column(26 * 26 + 1).to_string(), "ZA");
    }

    #[test]
    fn test_column_display_zzy() {
        assert_eq!(Column(26 * 26 * 26 + 26 * 26 + 25).to_string(), "ZZY");
    }

    #[test]
    fn test_parse_col_valid() {
        assert_eq!(parse_col("A").unwrap(), Column(1));
        assert_eq!(parse_col("a").unwrap(), Column(1));
        assert_eq!(parse_col("Z").unwrap(), Column(26));
        assert_eq!(parse_col("AA").unwrap(), Column(27));
        assert_eq!(parse_col("AB").unwrap(), Column(28));
        assert_eq!(
            parse_col("zZz").unwrap(),
            Column(26 * 26 * 26 + 26 * 26 + 26)
        );
    }

    #[test]
    fn test_parse_col_invalid() {
        assert_eq!(parse_col("A1"), Err(ColumnParseError::NonAlphabeticCharacter));
        assert_eq!(parse_col("$"), Err(ColumnParseError::NonAlphabeticCharacter));
        assert_eq!(parse_col(""), Err(ColumnParseError::Empty));
        assert_eq!(parse_col("ZZZZZZZZZZ"), Err(ColumnParseError::Overflow));
    }

    #[test]
    fn test_parse_col_limit() {
        assert_eq!(parse_col("ZZZ").unwrap().value(), MAX_COLUMN);
        assert_eq!(parse_col("AAAA"), Err(ColumnParseError::Overflow));
        assert_eq!(parse_col("SHEET"), Err(ColumnParseError::Overflow));
    }

    #[test]
    fn test_parsed_column_displays_as_letters() {
        let col = parse_col("ab").unwrap();
        assert_eq!(col.value(), 28);
        assert_eq!(col.to_string(), "AB");
    }
}
