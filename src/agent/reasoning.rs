//! Reasoning traces: parsing model output and the keyword fallback planner.
//!
//! The model is asked for four labelled sections:
//!
//! ```text
//! THOUGHT: what is being asked
//! CATEGORY: salary
//! ACTIONS:
//! - get_user_profile(expected_ctc)
//! ANSWER_FORMAT: number
//! ```
//!
//! [`ReasoningTrace::parse`] is a line-oriented state machine. Missing or
//! garbled sections fall back to `complex` / no actions / short text.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::{AnswerFormat, QuestionCategory, UserContext};

#[allow(clippy::expect_used)]
static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*\**(?P<key>thoughts?|category|actions?|answer[_ ]format)\**\s*:\s*\**\s*(?P<rest>.*)$",
    )
    .expect("valid header regex")
});

#[allow(clippy::expect_used)]
static ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:[-*•]|\d+[.)])?\s*(?P<tool>[A-Za-z_]+)\s*(?:\((?P<paren>[^)]*)\)|:\s*(?P<colon>.*))?\s*$",
    )
    .expect("valid action regex")
});

/// One tool invocation planned by the reasoning stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAction {
    /// Tool name as written by the model.
    pub tool: String,
    /// Single string argument (may be empty).
    pub argument: String,
}

impl PlannedAction {
    /// Creates an action.
    #[must_use]
    pub fn new(tool: &str, argument: &str) -> Self {
        Self {
            tool: tool.to_string(),
            argument: argument.to_string(),
        }
    }
}

/// Structured output of the reasoning stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningTrace {
    /// Natural-language thoughts, in order.
    pub thoughts: Vec<String>,
    /// Question classification.
    pub category: QuestionCategory,
    /// Tool calls to make, in order.
    pub actions: Vec<PlannedAction>,
    /// Expected answer shape.
    pub answer_format: AnswerFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    Thought,
    Actions,
}

impl ReasoningTrace {
    /// Parses model output. Never fails.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut trace = Self::default();
        let mut section = Section::Other;

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(caps) = HEADER.captures(line) {
                let key = caps["key"].to_lowercase();
                let rest = caps["rest"].trim();
                section = Section::Other;
                if key.starts_with("thought") {
                    if !rest.is_empty() {
                        trace.thoughts.push(rest.to_string());
                    }
                    section = Section::Thought;
                } else if key == "category" {
                    trace.category = QuestionCategory::parse(rest);
                } else if key.starts_with("action") {
                    if let Some(action) = parse_action(rest) {
                        trace.actions.push(action);
                    }
                    section = Section::Actions;
                } else {
                    trace.answer_format = AnswerFormat::parse(rest);
                }
                continue;
            }

            match section {
                Section::Actions => {
                    if let Some(action) = parse_action(line) {
                        trace.actions.push(action);
                    }
                }
                Section::Thought => {
                    let extra = line.trim();
                    match trace.thoughts.last_mut() {
                        Some(last) => {
                            last.push(' ');
                            last.push_str(extra);
                        }
                        None => trace.thoughts.push(extra.to_string()),
                    }
                }
                Section::Other => {}
            }
        }

        trace
    }

    /// First thought, or an empty string.
    #[must_use]
    pub fn thought(&self) -> &str {
        self.thoughts.first().map_or("", String::as_str)
    }
}

fn parse_action(line: &str) -> Option<PlannedAction> {
    let caps = ACTION.captures(line.trim())?;
    let tool = caps["tool"].to_lowercase();
    if tool == "none" {
        return None;
    }
    let argument = caps
        .name("paren")
        .or_else(|| caps.name("colon"))
        .map_or("", |m| m.as_str())
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    let argument = argument
        .split_once('=')
        .map_or(argument, |(_, v)| v.trim().trim_matches(|c| c == '"' || c == '\''));
    Some(PlannedAction::new(&tool, argument))
}

/// Keyword planner used when no model is configured.
///
/// Picks one category and at most one tool call from fixed rules, checked
/// in order. Skills mentioned by name win over generic experience questions.
#[must_use]
pub fn heuristic_plan(question: &str, context: &UserContext) -> ReasoningTrace {
    use AnswerFormat::{Date, Number, ShortText};
    use QuestionCategory::{Availability, Complex, Experience, Personal, Salary, Skill};

    let q = question.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| starts_word(&q, w));
    let asks_duration = has(&["year", "experience", "how long"]);

    let mentioned_skill = context.skills.iter().find_map(|s| {
        [Some(s.name.as_str()), s.display_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::to_lowercase)
            .find(|n| !n.is_empty() && contains_word(&q, n))
    });

    let profile = |reason, category, field: &str, format| Plan {
        reason,
        category,
        action: Some(PlannedAction::new("get_user_profile", field)),
        format,
    };
    let plan = if has(&["notice"]) {
        profile("notice period", Availability, "notice_period", ShortText)
    } else if has(&["expected"]) && has(&["ctc", "salary", "compensation", "package"]) {
        profile("expected salary", Salary, "expected_ctc", Number)
    } else if has(&["ctc", "salary", "compensation", "package"]) {
        profile("current salary", Salary, "current_ctc", Number)
    } else if has(&["date of birth", "dob", "birth"]) {
        profile("date of birth", Personal, "date_of_birth", Date)
    } else if has(&["join", "availab", "start date", "when can you start"]) {
        profile("availability", Availability, "availability", ShortText)
    } else if let Some(skill) = mentioned_skill {
        Plan {
            reason: "named skill",
            category: Skill,
            action: Some(PlannedAction::new("get_skill_info", &skill)),
            format: if asks_duration { Number } else { ShortText },
        }
    } else if asks_duration {
        profile("total experience", Experience, "experience", Number)
    } else if has(&["location", "city", "where do you live", "based in"]) {
        profile("location", Personal, "location", ShortText)
    } else if has(&["email", "e-mail"]) {
        profile("email", Personal, "email", ShortText)
    } else if has(&["phone", "mobile", "contact number"]) {
        profile("phone", Personal, "phone", ShortText)
    } else if has(&["role", "position", "designation", "job title"]) {
        profile("target role", Personal, "target_role", ShortText)
    } else if has(&["name"]) {
        profile("name", Personal, "name", ShortText)
    } else {
        Plan {
            reason: "resume keyword",
            category: Complex,
            action: longest_keyword(&q).map(|k| PlannedAction::new("search_resume", &k)),
            format: ShortText,
        }
    };

    let is_yes_no = has(&["are you", "do you", "willing"]) && plan.category == Complex;
    ReasoningTrace {
        thoughts: vec![format!("keyword match: {}", plan.reason)],
        category: plan.category,
        actions: plan.action.into_iter().collect(),
        answer_format: if is_yes_no {
            AnswerFormat::YesNo
        } else {
            plan.format
        },
    }
}

struct Plan {
    reason: &'static str,
    category: QuestionCategory,
    action: Option<PlannedAction>,
    format: AnswerFormat,
}

/// True if `needle` appears in `haystack` bounded by non-alphanumerics.
pub(crate) fn contains_word(haystack: &str, needle: &str) -> bool {
    find_bounded(haystack, needle, true)
}

/// True if `needle` appears at the start of a word in `haystack`.
///
/// Stems such as "availab" still match "availability", but "dob" does not
/// match inside "adobe".
pub(crate) fn starts_word(haystack: &str, needle: &str) -> bool {
    find_bounded(haystack, needle, false)
}

fn find_bounded(haystack: &str, needle: &str, whole: bool) -> bool {
    haystack.match_indices(needle).any(|(i, m)| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + m.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric)
            && !(whole && after.is_some_and(char::is_alphanumeric))
    })
}

const STOPWORDS: &[&str] = &[
    "what", "which", "your", "have", "with", "that", "this", "there", "about", "would", "could",
    "should", "please", "describe", "much", "many", "does", "from", "will", "when", "where",
];

fn longest_keyword(question: &str) -> Option<String> {
    question
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3 && !STOPWORDS.contains(w))
        .max_by_key(|w| w.len())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Skill;

    #[test]
    fn test_parse_well_formed() {
        let text = "THOUGHT: The question asks for expected salary.\n\
                    CATEGORY: salary\n\
                    ACTIONS:\n\
                    - get_user_profile(expected_ctc)\n\
                    - search_resume: \"compensation\"\n\
                    ANSWER_FORMAT: number\n";
        let trace = ReasoningTrace::parse(text);
        assert_eq!(trace.thought(), "The question asks for expected salary.");
        assert_eq!(trace.category, QuestionCategory::Salary);
        assert_eq!(
            trace.actions,
            vec![
                PlannedAction::new("get_user_profile", "expected_ctc"),
                PlannedAction::new("search_resume", "compensation"),
            ]
        );
        assert_eq!(trace.answer_format, AnswerFormat::Number);
    }

    #[test]
    fn test_parse_garbage_defaults() {
        let trace = ReasoningTrace::parse("I think the answer is probably 5.");
        assert_eq!(trace.category, QuestionCategory::Complex);
        assert!(trace.actions.is_empty());
        assert!(trace.thoughts.is_empty());
        assert_eq!(trace.answer_format, AnswerFormat::ShortText);
    }

    #[test]
    fn test_parse_none_actions_and_markdown() {
        let text = "**Thought:** simple yes/no\n\
                    more detail here\n\
                    **Category:** complex\n\
                    **Actions:** none\n\
                    **Answer Format:** yes/no";
        let trace = ReasoningTrace::parse(text);
        assert_eq!(trace.thought(), "simple yes/no more detail here");
        assert!(trace.actions.is_empty());
        assert_eq!(trace.answer_format, AnswerFormat::YesNo);
    }

    #[test]
    fn test_parse_keyword_argument_and_numbering() {
        let text = "ACTIONS:\n1. get_skill_info(skill_name=\"React\")\n2) get_checkbox_context()";
        let trace = ReasoningTrace::parse(text);
        assert_eq!(
            trace.actions,
            vec![
                PlannedAction::new("get_skill_info", "React"),
                PlannedAction::new("get_checkbox_context", ""),
            ]
        );
    }

    fn context() -> UserContext {
        UserContext {
            skills: vec![Skill {
                name: "react".to_string(),
                display_name: Some("React.js".to_string()),
                ..Skill::default()
            }],
            ..UserContext::default()
        }
    }

    #[test]
    fn test_heuristic_notice_period() {
        let trace = heuristic_plan("What is your notice period?", &context());
        assert_eq!(trace.category, QuestionCategory::Availability);
        assert_eq!(
            trace.actions,
            vec![PlannedAction::new("get_user_profile", "notice_period")]
        );
    }

    #[test]
    fn test_heuristic_expected_vs_current_ctc() {
        let expected = heuristic_plan("Expected CTC (in LPA)?", &context());
        assert_eq!(expected.actions[0].argument, "expected_ctc");
        let current = heuristic_plan("What is your current CTC?", &context());
        assert_eq!(current.actions[0].argument, "current_ctc");
        assert_eq!(current.answer_format, AnswerFormat::Number);
    }

    #[test]
    fn test_heuristic_skill_beats_experience() {
        let trace = heuristic_plan("How many years of experience do you have in React?", &context());
        assert_eq!(trace.category, QuestionCategory::Skill);
        assert_eq!(trace.actions, vec![PlannedAction::new("get_skill_info", "react")]);
        assert_eq!(trace.answer_format, AnswerFormat::Number);

        let generic = heuristic_plan("Total years of experience?", &context());
        assert_eq!(generic.category, QuestionCategory::Experience);
    }

    #[test]
    fn test_heuristic_skill_needs_word_boundary() {
        let trace = heuristic_plan("Have you worked in a reactive team?", &context());
        assert_ne!(trace.category, QuestionCategory::Skill);
    }

    #[test]
    fn test_heuristic_keywords_match_word_starts() {
        let adobe = heuristic_plan(
            "How many years of Adobe Photoshop experience do you have?",
            &context(),
        );
        assert_eq!(adobe.category, QuestionCategory::Experience);
        assert_eq!(
            adobe.actions,
            vec![PlannedAction::new("get_user_profile", "experience")]
        );

        let controller = heuristic_plan("Have you used a PLC controller?", &context());
        assert_ne!(controller.category, QuestionCategory::Personal);

        let username = heuristic_plan("What is your GitHub username?", &context());
        assert!(
            username
                .actions
                .iter()
                .all(|a| a.argument != "name"),
            "{username:?}"
        );

        let dob = heuristic_plan("What is your DOB?", &context());
        assert_eq!(dob.actions[0].argument, "date_of_birth");
        let availability = heuristic_plan("What is your availability?", &context());
        assert_eq!(availability.actions[0].argument, "availability");
    }

    #[test]
    fn test_word_matching() {
        assert!(contains_word("what is your dob?", "dob"));
        assert!(!contains_word("adobe photoshop", "dob"));
        assert!(!contains_word("birthdays", "birth"));
        assert!(starts_word("your availability", "availab"));
        assert!(!starts_word("a controller", "role"));
    }

    #[test]
    fn test_heuristic_fallback_searches_resume() {
        let trace = heuristic_plan("Are you willing to work with Kubernetes?", &context());
        assert_eq!(trace.category, QuestionCategory::Complex);
        assert_eq!(trace.answer_format, AnswerFormat::YesNo);
        assert_eq!(trace.actions[0].tool, "search_resume");
        assert_eq!(trace.actions[0].argument, "kubernetes");
    }
}
