//! System prompts and user-message builders for each call site.
//!
//! Every prompt can be overridden by a markdown file in the prompt
//! directory; missing files fall back to the compiled-in text.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use super::checkbox::CheckboxOption;
use super::reasoning::ReasoningTrace;
use super::result::ToolObservation;
use crate::core::QuestionType;

/// System prompt for the reasoning stage.
pub const REASONING_SYSTEM_PROMPT: &str = r"You help a job applicant fill in an application form. For each form question, decide what information is needed and which tools can provide it. You do not answer the question yourself.

## Output Format

Reply with exactly these sections, one per line:

THOUGHT: <one sentence on what the question is asking>
CATEGORY: <personal | skill | experience | salary | availability | complex>
ACTIONS:
- <tool_name>(<argument>)
ANSWER_FORMAT: <number | date | yes/no | short text>

## Rules

- Use only the tools listed in the request. Each action takes a single plain-text argument.
- Write `ACTIONS: none` if no data is needed.
- Plan at most three actions.
- Do not add any other text.";

/// System prompt for answer generation.
pub const ANSWER_SYSTEM_PROMPT: &str = r"You write answers for job application form fields on behalf of the applicant.

## Rules

- Answer in 1 to 10 words. No full sentences unless the question needs one.
- Use ONLY facts from the tool results. Never invent numbers, dates, employers or skills.
- Numbers: digits only plus a unit when natural (e.g. `5`, `12 LPA`, `30 days`).
- Dates: DD/MM/YYYY.
- Yes/no questions: answer `Yes` or `No`.
- If the tool results do not contain the answer, give the most reasonable short answer the data supports.
- Reply with the answer only. No quotes, no labels, no explanation.";

/// System prompt for self-correction.
pub const CORRECTION_SYSTEM_PROMPT: &str = r"You fix answers to job application form fields. You receive the question, the previous answer, the problems found with it and the applicant's profile.

## Rules

- Fix every listed problem.
- Keep the answer under 15 words and 150 characters.
- Use only facts from the profile. Do not invent information.
- Reply with the corrected answer only.";

/// System prompt for the relevance judgement.
pub const RELEVANCE_SYSTEM_PROMPT: &str = r"You check whether an answer addresses a job application question. Reply with exactly one word: YES or NO.";

/// System prompt for checkbox and radio selection.
pub const CHECKBOX_SYSTEM_PROMPT: &str = r"You choose the best option for a job application question on behalf of the applicant, based on their profile.

## Instructions

1. Read the question and every option.
2. Compare each option with the profile (role, location, experience, salary, notice period, availability, skills).
3. Think step by step, then pick the single best option.

## Output Format

SELECTED: <option number, starting at 1>
CONFIDENCE: <LOW | MEDIUM | HIGH>
REASONING: <one sentence>

Reply with these three lines only.";

/// Default prompt directory under the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/autoapply/prompts";

/// Filename for the reasoning prompt template.
const REASONING_FILENAME: &str = "reasoning.md";
/// Filename for the answer prompt template.
const ANSWER_FILENAME: &str = "answer.md";
/// Filename for the correction prompt template.
const CORRECTION_FILENAME: &str = "correction.md";
/// Filename for the relevance prompt template.
const RELEVANCE_FILENAME: &str = "relevance.md";
/// Filename for the checkbox prompt template.
const CHECKBOX_FILENAME: &str = "checkbox.md";

/// System prompts for every call site.
#[derive(Debug, Clone)]
pub struct PromptSet {
    /// Reasoning stage.
    pub reasoning: String,
    /// Answer generation.
    pub answer: String,
    /// Self-correction.
    pub correction: String,
    /// Relevance judgement.
    pub relevance: String,
    /// Checkbox/radio selection.
    pub checkbox: String,
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in defaults.
    ///
    /// Resolution order for `prompt_dir`:
    /// 1. Explicit `prompt_dir` argument
    /// 2. `AUTOAPPLY_PROMPT_DIR` environment variable
    /// 3. `~/.config/autoapply/prompts/`
    ///
    /// Each file is loaded independently; a missing file uses its default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir
            .map(PathBuf::from)
            .or_else(|| std::env::var("AUTOAPPLY_PROMPT_DIR").ok().map(PathBuf::from))
            .or_else(Self::default_dir);

        let load_file = |filename: &str, default: &str| -> String {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(&path).ok())
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            reasoning: load_file(REASONING_FILENAME, REASONING_SYSTEM_PROMPT),
            answer: load_file(ANSWER_FILENAME, ANSWER_SYSTEM_PROMPT),
            correction: load_file(CORRECTION_FILENAME, CORRECTION_SYSTEM_PROMPT),
            relevance: load_file(RELEVANCE_FILENAME, RELEVANCE_SYSTEM_PROMPT),
            checkbox: load_file(CHECKBOX_FILENAME, CHECKBOX_SYSTEM_PROMPT),
        }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            reasoning: REASONING_SYSTEM_PROMPT.to_string(),
            answer: ANSWER_SYSTEM_PROMPT.to_string(),
            correction: CORRECTION_SYSTEM_PROMPT.to_string(),
            relevance: RELEVANCE_SYSTEM_PROMPT.to_string(),
            checkbox: CHECKBOX_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Writes the compiled-in default prompts to the given directory.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let templates = [
            (REASONING_FILENAME, REASONING_SYSTEM_PROMPT),
            (ANSWER_FILENAME, ANSWER_SYSTEM_PROMPT),
            (CORRECTION_FILENAME, CORRECTION_SYSTEM_PROMPT),
            (RELEVANCE_FILENAME, RELEVANCE_SYSTEM_PROMPT),
            (CHECKBOX_FILENAME, CHECKBOX_SYSTEM_PROMPT),
        ];

        let mut written = Vec::new();
        for (filename, content) in &templates {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}

/// Builds the user message for the reasoning stage.
#[must_use]
pub fn build_reasoning_prompt(
    question: &str,
    question_type: QuestionType,
    tool_descriptions: &str,
) -> String {
    format!(
        "<question type=\"{question_type}\">{question}</question>\n\n\
         <tools>\n{tool_descriptions}\n</tools>\n\n\
         Plan how to answer this question."
    )
}

/// Builds the user message for answer generation.
#[must_use]
pub fn build_answer_prompt(
    question: &str,
    trace: &ReasoningTrace,
    observations: &[ToolObservation],
) -> String {
    let mut prompt = format!(
        "<question>{question}</question>\n\
         <thought>{}</thought>\n\
         <answer_format>{}</answer_format>\n\n<tool_results>\n",
        trace.thought(),
        trace.answer_format,
    );
    if observations.is_empty() {
        prompt.push_str("(no data retrieved)\n");
    }
    for obs in observations {
        let result = match (&obs.result, &obs.error) {
            (_, Some(err)) => format!("error: {err}"),
            (Some(value), None) => value
                .as_str()
                .map_or_else(|| value.to_string(), str::to_string),
            (None, None) => "no data".to_string(),
        };
        let _ = writeln!(prompt, "- {}({}): {result}", obs.tool, obs.argument);
    }
    prompt.push_str("</tool_results>\n\nWrite the answer.");
    prompt
}

/// Builds the user message for self-correction.
#[must_use]
pub fn build_correction_prompt(
    question: &str,
    answer: &str,
    issues: &[String],
    profile_summary: &str,
) -> String {
    let issues = issues
        .iter()
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "<question>{question}</question>\n\
         <previous_answer>{answer}</previous_answer>\n\
         <issues>\n{issues}\n</issues>\n\
         <profile>\n{profile_summary}\n</profile>\n\n\
         Write the corrected answer."
    )
}

/// Builds the user message for the relevance judgement.
#[must_use]
pub fn build_relevance_prompt(question: &str, answer: &str) -> String {
    format!(
        "Question: {question}\nAnswer: {answer}\n\n\
         Does this answer directly address the question? Reply YES or NO."
    )
}

/// Builds the user message for checkbox/radio selection.
#[must_use]
pub fn build_checkbox_prompt(
    question: &str,
    options: &[CheckboxOption],
    profile_summary: &str,
) -> String {
    let mut prompt = format!(
        "<question>{question}</question>\n\n<profile>\n{profile_summary}\n</profile>\n\n<options>\n"
    );
    for (i, option) in options.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", i + 1, option.label);
    }
    prompt.push_str("</options>\n\nPick the best option.");
    prompt
}
