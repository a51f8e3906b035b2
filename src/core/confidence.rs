//! Coarse confidence label for closed-option selections.
//!
//! Free-text answers carry a numeric 0-100 score; checkbox and radio
//! decisions use this three-level label instead.

use serde::{Deserialize, Serialize};

/// Confidence level, ordered from highest to lowest.
///
/// Discriminants are inverted (`High = 0`) so that the derived [`Ord`]
/// sorts confident decisions first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    /// Weak guess (first option picked by default).
    Low = 2,
    /// Plausible match.
    Medium = 1,
    /// Strong match.
    High = 0,
}

impl Confidence {
    /// Parses a confidence label (case-insensitive). Unknown labels are `Low`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" => Self::High,
            "medium" | "med" => Self::Medium,
            _ => Self::Low,
        }
    }

    /// Returns the label as written in prompts and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
