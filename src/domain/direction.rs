use strum::{Display, EnumString};

/// Which store is the source of truth for one copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Direction {
    #[strum(serialize = "sheet-to-store")]
    SheetToStore,
    #[strum(serialize = "store-to-sheet")]
    StoreToSheet,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::SheetToStore => Direction::StoreToSheet,
            Direction::StoreToSheet => Direction::SheetToStore,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_display_and_parse() {
        assert_eq!(Direction::SheetToStore.to_string(), "sheet-to-store");
        assert_eq!(
            "store-to-sheet".parse::<Direction>().unwrap(),
            Direction::StoreToSheet
        );
    }

    #[test]
    fn test_opposite() {
        assert_eq!(Direction::SheetToStore.opposite(), Direction::StoreToSheet);
        assert_eq!(Direction::StoreToSheet.opposite(), Direction::SheetToStore);
    }
}
