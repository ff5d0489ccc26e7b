//! Row status carried by every shadow row.

use std::fmt;

/// Name of the status column appended to every shadow table.
pub const ROW_STATUS_COLUMN: &str = "ROW__STATUS";

/// Relationship of a shadow row to the base row with the same primary key.
///
/// A missing shadow row (NULL status in the read-path join) means the base
/// row is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowStatus {
    /// Row exists only in the shadow table.
    Inserted,
    /// Shadow row replaces the base row.
    Updated,
    /// Row is logically deleted from both relations.
    Deleted,
}

impl RowStatus {
    /// Numeric encoding stored in the status column.
    pub const fn code(self) -> u8 {
        match self {
            Self::Inserted => 1,
            Self::Updated => 2,
            Self::Deleted => 3,
        }
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(RowStatus::Inserted.code(), 1);
        assert_eq!(RowStatus::Updated.code(), 2);
        assert_eq!(RowStatus::Deleted.code(), 3);
        assert_eq!(RowStatus::Deleted.to_string(), "3");
    }
}
