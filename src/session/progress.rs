use serde::{Deserialize, Serialize};
use std::fmt;

/// Human-readable aggregate progress of a session. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressDisplay {
    /// `"{completed} / {total}"`
    Count { completed: usize, total: usize },

    /// `"{percent}% of {ordinal} / {total}"`
    Percent {
        percent: u32,
        ordinal: usize,
        total: usize,
    },
}

impl ProgressDisplay {
    pub fn count(completed: usize, total: usize) -> Self {
        ProgressDisplay::Count { completed, total }
    }

    /// Percentage of the upload at position `completed + 1`.
    pub fn percent(percent: u32, completed: usize, total: usize) -> Self {
        ProgressDisplay::Percent {
            percent,
            ordinal: completed + 1,
            total,
        }
    }
}

impl fmt::Display for ProgressDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressDisplay::Count { completed, total } => write!(f, "{completed} / {total}"),
            ProgressDisplay::Percent {
                percent,
                ordinal,
                total,
            } => write!(f, "{percent}% of {ordinal} / {total}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_text() {
        assert_eq!(ProgressDisplay::count(1, 3).to_string(), "1 / 3");
        assert_eq!(ProgressDisplay::count(0, 0).to_string(), "0 / 0");
    }

    #[test]
    fn test_percent_text_uses_next_ordinal() {
        assert_eq!(ProgressDisplay::percent(50, 1, 4).to_string(), "50% of 2 / 4");
    }
}
