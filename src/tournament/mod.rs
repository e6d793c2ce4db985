use std::fmt;

use serde::{Deserialize, Serialize};

pub mod admin;
pub mod bracket;
pub mod group_matches;
pub mod live;
pub mod playoffs;
pub mod public;
pub mod standings;
pub mod teams;

/// The three age divisions. Every team and every match belongs to exactly
/// one. The upper division plays its group stage in two groups (A and B);
/// the other two play a single round-robin.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Lower,
    Middle,
    Upper,
}

impl Category {
    pub const ALL: [Category; 3] =
        [Category::Lower, Category::Middle, Category::Upper];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Lower => "lower",
            Category::Middle => "middle",
            Category::Upper => "upper",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Lower => "Lower School",
            Category::Middle => "Middle School",
            Category::Upper => "Upper School",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        match s {
            "lower" => Some(Category::Lower),
            "middle" => Some(Category::Middle),
            "upper" => Some(Category::Upper),
            _ => None,
        }
    }

    /// Group labels used by this category's group stage. Empty for the
    /// categories which play a single table.
    pub fn groups(&self) -> &'static [&'static str] {
        match self {
            Category::Upper => &["A", "B"],
            _ => &[],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a match. A match is *decided* only once both scores are
/// non-null; `Completed` is set exactly when an operator commits scores
/// (which may be edited again afterwards, status unchanged).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MatchStatus {
    Pending,
    InProgress,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<MatchStatus> {
        match s {
            "pending" => Some(MatchStatus::Pending),
            "in_progress" => Some(MatchStatus::InProgress),
            "completed" => Some(MatchStatus::Completed),
            _ => None,
        }
    }
}

#[cfg(test)]
#[test]
fn test_category_round_trip() {
    for category in Category::ALL {
        assert_eq!(Category::parse(category.as_str()), Some(category));
    }
    assert_eq!(Category::parse("kindergarten"), None);
}
