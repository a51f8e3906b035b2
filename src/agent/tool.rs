//! Tool registry: the fixed set of functions the reasoning stage may request.
//!
//! Each tool has a JSON-schema declaration (shown to the model) and a typed
//! [`ToolCall`] variant. Arguments are validated when a call is built, so
//! the executor only ever sees well-formed calls.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::AgentError;

/// A tool definition shown to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match a [`ToolCall`] variant).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: Value,
}

/// A validated tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolCall {
    /// Look up one profile attribute.
    GetUserProfile {
        /// Field name, normalized by the executor.
        field: String,
    },
    /// Look up one skill, exact match first then substring.
    GetSkillInfo {
        /// Skill name or alias.
        skill_name: String,
    },
    /// Case-insensitive line search over the résumé.
    SearchResume {
        /// Text to look for.
        query: String,
    },
    /// Flattened preference snapshot for option selection.
    GetCheckboxContext,
}

const GET_USER_PROFILE: &str = "get_user_profile";
const GET_SKILL_INFO: &str = "get_skill_info";
const SEARCH_RESUME: &str = "search_resume";
const GET_CHECKBOX_CONTEXT: &str = "get_checkbox_context";

impl ToolCall {
    /// Registry name of this call.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GetUserProfile { .. } => GET_USER_PROFILE,
            Self::GetSkillInfo { .. } => GET_SKILL_INFO,
            Self::SearchResume { .. } => SEARCH_RESUME,
            Self::GetCheckboxContext => GET_CHECKBOX_CONTEXT,
        }
    }

    /// The single string argument, if the tool takes one.
    #[must_use]
    pub fn argument(&self) -> Option<&str> {
        match self {
            Self::GetUserProfile { field } => Some(field),
            Self::GetSkillInfo { skill_name } => Some(skill_name),
            Self::SearchResume { query } => Some(query),
            Self::GetCheckboxContext => None,
        }
    }

    /// Builds a call from a name and a JSON argument object.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::UnknownTool`] for names outside the registry and
    /// [`AgentError::InvalidToolArguments`] when a required string argument is
    /// missing or not a string.
    pub fn from_json(name: &str, args: &Value) -> Result<Self, AgentError> {
        let required = |key: &str| -> Result<String, AgentError> {
            match args.get(key) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(other) => Err(AgentError::InvalidToolArguments {
                    name: name.to_string(),
                    message: format!("'{key}' must be a string, got {other}"),
                }),
                None => Err(AgentError::InvalidToolArguments {
                    name: name.to_string(),
                    message: format!("missing required argument '{key}'"),
                }),
            }
        };

        match name {
            GET_USER_PROFILE => Ok(Self::GetUserProfile {
                field: required("field")?,
            }),
            GET_SKILL_INFO => Ok(Self::GetSkillInfo {
                skill_name: required("skill_name")?,
            }),
            SEARCH_RESUME => Ok(Self::SearchResume {
                query: required("query")?,
            }),
            GET_CHECKBOX_CONTEXT => Ok(Self::GetCheckboxContext),
            other => Err(AgentError::UnknownTool {
                name: other.to_string(),
            }),
        }
    }

    /// Builds a call from a planned action (`name` + one string argument).
    ///
    /// # Errors
    ///
    /// Same as [`ToolCall::from_json`].
    pub fn from_action(name: &str, argument: &str) -> Result<Self, AgentError> {
        let key = match name {
            GET_USER_PROFILE => "field",
            GET_SKILL_INFO => "skill_name",
            SEARCH_RESUME => "query",
            _ => return Self::from_json(name, &json!({})),
        };
        Self::from_json(name, &json!({ key: argument }))
    }
}

/// The tools available to the answer engine.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    definitions: Vec<ToolDefinition>,
}

impl ToolSet {
    /// All four registry tools.
    #[must_use]
    pub fn all() -> Self {
        Self {
            definitions: vec![
                def_get_user_profile(),
                def_get_skill_info(),
                def_search_resume(),
                def_get_checkbox_context(),
            ],
        }
    }

    /// Returns the tool definitions in this set.
    #[must_use]
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Returns `true` if this set contains no tools.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Returns the number of tools in this set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Renders `- name(param): description` lines for the reasoning prompt.
    #[must_use]
    pub fn describe(&self) -> String {
        self.definitions
            .iter()
            .map(|d| {
                let params = d.parameters["properties"]
                    .as_object()
                    .map(|p| p.keys().cloned().collect::<Vec<_>>().join(", "))
                    .unwrap_or_default();
                format!("- {}({params}): {}", d.name, d.description)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn def_get_user_profile() -> ToolDefinition {
    ToolDefinition {
        name: GET_USER_PROFILE.to_string(),
        description: "Get one field from the applicant's profile: name, email, phone, \
                      target_role, location, current_ctc, expected_ctc, notice_period, \
                      experience, availability, date_of_birth. Returns null if unknown."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "field": {
                    "type": "string",
                    "description": "Profile field name (case and underscores ignored)."
                }
            },
            "required": ["field"],
            "additionalProperties": false
        }),
    }
}

fn def_get_skill_info() -> ToolDefinition {
    ToolDefinition {
        name: GET_SKILL_INFO.to_string(),
        description: "Get rating and years of experience for one skill. Matches the exact \
                      name first, then any skill containing the text."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "skill_name": {
                    "type": "string",
                    "description": "Skill name, e.g. \"React\"."
                }
            },
            "required": ["skill_name"],
            "additionalProperties": false
        }),
    }
}

fn def_search_resume() -> ToolDefinition {
    ToolDefinition {
        name: SEARCH_RESUME.to_string(),
        description: "Search the résumé for lines containing the text. Returns up to 3 lines."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Case-insensitive text to find."
                }
            },
            "required": ["query"],
            "additionalProperties": false
        }),
    }
}

fn def_get_checkbox_context() -> ToolDefinition {
    ToolDefinition {
        name: GET_CHECKBOX_CONTEXT.to_string(),
        description: "Get a snapshot of role, location, experience, availability, notice \
                      period and skills for choosing between options."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
    }
}
