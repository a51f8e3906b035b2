//! Question classification types.

use serde::{Deserialize, Serialize};

/// Form control the question was extracted from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Free-text input.
    #[default]
    Text,
    /// Checkbox group.
    Checkbox,
    /// Radio group.
    Radio,
}

impl QuestionType {
    /// Parses a question type (case-insensitive).
    ///
    /// Returns `None` for unrecognised values.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "input" | "textarea" => Some(Self::Text),
            "checkbox" => Some(Self::Checkbox),
            "radio" => Some(Self::Radio),
            _ => None,
        }
    }

    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the question is about, as classified by the reasoning stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionCategory {
    /// Name, contact, date of birth, location.
    Personal,
    /// A specific skill.
    Skill,
    /// Work history or years of experience.
    Experience,
    /// Current or expected CTC.
    Salary,
    /// Notice period, joining date, availability.
    Availability,
    /// Anything else. Also the fallback for unparseable output.
    #[default]
    Complex,
}

impl QuestionCategory {
    /// Parses a category label. Unknown labels map to [`Self::Complex`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let lower = s.trim().to_lowercase();
        let word = lower
            .split(|c: char| !c.is_ascii_alphabetic())
            .find(|w| !w.is_empty())
            .unwrap_or("");
        match word {
            "personal" => Self::Personal,
            "skill" | "skills" => Self::Skill,
            "experience" => Self::Experience,
            "salary" | "ctc" | "compensation" => Self::Salary,
            "availability" | "notice" => Self::Availability,
            _ => Self::Complex,
        }
    }

    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Skill => "skill",
            Self::Experience => "experience",
            Self::Salary => "salary",
            Self::Availability => "availability",
            Self::Complex => "complex",
        }
    }
}

impl std::fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected shape of the answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerFormat {
    /// A number (years, CTC, rating).
    Number,
    /// A date, `DD/MM/YYYY`.
    Date,
    /// `Yes`, `No` or `Maybe`.
    YesNo,
    /// A few words.
    #[default]
    ShortText,
}

impl AnswerFormat {
    /// Parses a format hint. Unknown hints map to [`Self::ShortText`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let lower = s.trim().to_lowercase();
        if lower.contains("yes") || lower.contains("boolean") {
            Self::YesNo
        } else if lower.contains("date") {
            Self::Date
        } else if lower.contains("number") || lower.contains("numeric") || lower.contains("integer")
        {
            Self::Number
        } else {
            Self::ShortText
        }
    }

    /// Returns the name used in prompts.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Date => "date",
            Self::YesNo => "yes/no",
            Self::ShortText => "short text",
        }
    }
}

impl std::fmt::Display for AnswerFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
