use std::fmt::Formatter;
use thiserror::Error;

use super::column::ColumnParseError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct A1Notation(pub String);

impl std::fmt::Display for A1Notation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<A1Notation> for String {
    fn from(a1_notation: A1Notation) -> Self {
        a1_notation.0
    }
}

impl AsRef<str> for A1Notation {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for A1Notation {
    fn from(s: String) -> Self {
        A1Notation(s)
    }
}

impl From<&str> for A1Notation {
    fn from(s: &str) -> Self {
        A1Notation(s.to_owned())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum A1NotationParseError {
    #[error("Error parsing column: {0}")]
    ColumnParseError(ColumnParseError),
    #[error("Error parsing row")]
    RowParseError,
    #[error("Range is not bounded on both axes")]
    Unbounded,
    #[error("Range end precedes range start")]
    Inverted,
}

pub trait FromA1Notation: Sized {
    type Err;

    fn from_a1_notation(a1_notation: &A1Notation) -> error_stack::Result<Self, Self::Err>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1NotationParts {
    pub start: String,
    pub end: String,
    pub sheet_title: Option<String>,
}

/// Splits `'Sheet 1'!A1:B2` into sheet title, start and end. A single cell yields the same
/// start and end. Surrounding quotes on the title are removed and `''` is unescaped.
pub fn generic_a1_notation_split(a1_notation: &A1Notation) -> A1NotationParts {
    let (sheet_title, local_a1_notation) = match a1_notation.0.rfind('!') {
        Some(index) => {
            let (sheet_title, local_a1_notation) = a1_notation.0.split_at(index);
            (
                Some(unquote_sheet_title(sheet_title)),
                local_a1_notation.trim_start_matches('!').to_owned(),
            )
        }
        None => (None, a1_notation.0.clone()),
    };

    let (start, end) = match local_a1_notation.find(':') {
        Some(index) => {
            let (start, end) = local_a1_notation.split_at(index);
            (start.to_owned(), end.trim_start_matches(':').to_owned())
        }
        None => (local_a1_notation.clone(), local_a1_notation),
    };

    A1NotationParts {
        sheet_title,
        start,
        end,
    }
}

fn unquote_sheet_title(title: &str) -> String {
    match title
        .strip_prefix('\'')
        .and_then(|title| title.strip_suffix('\''))
    {
        Some(inner) => inner.replace("''", "'"),
        None => title.to_owned(),
    }
}
