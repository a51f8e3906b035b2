//! Output rendering for CLI commands.

use std::fmt::Write;

use serde::Serialize;

use crate::agent::{AnswerResult, CheckboxDecision, ServiceStats};
use crate::error::CommandError;

/// How command results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
    /// One compact JSON document per line.
    Ndjson,
}

impl OutputFormat {
    /// Parses a format name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::OutputFormat`] for an unknown name.
    pub fn parse(s: &str) -> Result<Self, CommandError> {
        match s.trim().to_lowercase().as_str() {
            "text" | "" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            other => Err(CommandError::OutputFormat(format!(
                "unknown format '{other}', expected text, json or ndjson"
            ))),
        }
    }

    /// Serializes `value` as pretty JSON or as one NDJSON line.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        let rendered = match self {
            Self::Ndjson => serde_json::to_string(value),
            Self::Text | Self::Json => serde_json::to_string_pretty(value),
        };
        let mut out = rendered.unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"));
        out.push('\n');
        out
    }
}

/// Renders one answer.
#[must_use]
pub fn format_answer(question: &str, result: &AnswerResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            if let Some(error) = &result.error {
                let _ = writeln!(out, "Error: {error}");
                return out;
            }
            let _ = writeln!(out, "{}", result.answer);
            let source = if result.from_cache { ", cached" } else { "" };
            let _ = writeln!(
                out,
                "  confidence {}{} | {} | {}ms{source}",
                result.confidence,
                if result.valid { "" } else { " (flagged)" },
                result.category,
                result.latency_ms,
            );
            if !result.tools_used.is_empty() {
                let _ = writeln!(out, "  tools: {}", result.tools_used.join(", "));
            }
            for issue in &result.issues {
                let _ = writeln!(out, "  issue: {issue}");
            }
            out
        }
        OutputFormat::Json | OutputFormat::Ndjson => format.to_json(&serde_json::json!({
            "question": question,
            "result": result,
        })),
    }
}

/// Renders a checkbox decision.
#[must_use]
pub fn format_decision(
    options: &[String],
    decision: &CheckboxDecision,
    format: OutputFormat,
) -> String {
    let label = options
        .get(decision.selected_index)
        .map_or("", String::as_str);
    match format {
        OutputFormat::Text => {
            let mut out = format!(
                "{}. {label}\n  confidence {}",
                decision.selected_index + 1,
                decision.confidence
            );
            if !decision.reasoning.is_empty() {
                let _ = write!(out, " | {}", decision.reasoning);
            }
            out.push('\n');
            out
        }
        OutputFormat::Json | OutputFormat::Ndjson => format.to_json(&serde_json::json!({
            "selected_index": decision.selected_index,
            "selected_label": label,
            "confidence": decision.confidence,
            "reasoning": decision.reasoning,
        })),
    }
}

/// Renders session statistics.
#[must_use]
pub fn format_stats(stats: &ServiceStats, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!(
            "Cache: {} entries | LLM calls in window: {}/{} ({:.0}%) | Log: {} entries\n",
            stats.cache.size,
            stats.rate_limiter.in_window,
            stats.rate_limiter.max_requests,
            stats.rate_limiter.utilization * 100.0,
            stats.reasoning_log_size,
        ),
        OutputFormat::Json | OutputFormat::Ndjson => {
            format.to_json(&serde_json::json!({ "stats": stats }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Confidence;
    use crate::error::AgentError;

    #[test]
    fn test_parse() {
        assert!(matches!(OutputFormat::parse("JSON"), Ok(OutputFormat::Json)));
        assert!(matches!(OutputFormat::parse("ndjson"), Ok(OutputFormat::Ndjson)));
        assert!(matches!(OutputFormat::parse("Text"), Ok(OutputFormat::Text)));
        assert!(matches!(
            OutputFormat::parse("yaml"),
            Err(CommandError::OutputFormat(msg)) if msg.contains("yaml")
        ));
    }

    #[test]
    fn test_ndjson_is_one_line() {
        let out = OutputFormat::Ndjson.to_json(&serde_json::json!({"a": [1, 2]}));
        assert_eq!(out, "{\"a\":[1,2]}\n");
    }

    #[test]
    fn test_format_error_answer() {
        let result = AnswerResult::from_error(&AgentError::LlmUnavailable, 1);
        let out = format_answer("q", &result, OutputFormat::Text);
        assert!(out.starts_with("Error: no LLM configured"));
    }

    #[test]
    fn test_format_decision_text() {
        let decision = CheckboxDecision {
            selected_index: 1,
            reasoning: "matches location".to_string(),
            confidence: Confidence::Medium,
        };
        let options = vec!["Mumbai".to_string(), "Bangalore".to_string()];
        let out = format_decision(&options, &decision, OutputFormat::Text);
        assert_eq!(out, "2. Bangalore\n  confidence MEDIUM | matches location\n");
    }
}
