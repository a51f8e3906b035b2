//! Tool executor: runs a validated [`ToolCall`] against a loaded [`UserContext`].
//!
//! Every tool returns `Ok(None)` for "no data". `Err` is reserved for
//! executor faults; callers convert those to `None` as well so one failing
//! tool cannot abort a reasoning pass.

use serde::Serialize;
use serde_json::{Value, json};

use super::tool::ToolCall;
use crate::core::{Profile, Skill, UserContext};
use crate::error::AgentError;

/// Returned instead of the phone number.
pub const PHONE_SENTINEL: &str = "Will share during the interview";

/// Maximum résumé lines returned by `search_resume`.
const MAX_RESUME_MATCHES: usize = 3;

/// Profile attributes addressable by `get_user_profile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProfileField {
    Name,
    Email,
    Phone,
    TargetRole,
    Location,
    CurrentCtc,
    ExpectedCtc,
    NoticePeriod,
    Experience,
    Availability,
    DateOfBirth,
}

impl ProfileField {
    /// Maps a field name, ignoring case, spaces, dashes and underscores.
    fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .chars()
            .filter(|c| !matches!(c, '_' | ' ' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        let field = match key.as_str() {
            "name" | "fullname" => Self::Name,
            "email" | "emailaddress" | "mail" => Self::Email,
            "phone" | "mobile" | "phonenumber" | "mobilenumber" | "contactnumber" => {
                Self::Phone
            }
            "targetrole" | "role" | "desiredrole" | "jobtitle" | "position" => Self::TargetRole,
            "location" | "city" | "currentlocation" => Self::Location,
            "currentctc" | "ctc" | "currentsalary" | "salary" => Self::CurrentCtc,
            "expectedctc" | "expectedsalary" => Self::ExpectedCtc,
            "noticeperiod" | "notice" => Self::NoticePeriod,
            "experience" | "yearsofexperience" | "totalexperience" | "yoe" => Self::Experience,
            "availability" | "available" | "joiningdate" => Self::Availability,
            "dateofbirth" | "dob" | "birthdate" => Self::DateOfBirth,
            _ => return None,
        };
        Some(field)
    }

    fn read(self, profile: &Profile) -> Option<Value> {
        let value = match self {
            Self::Phone => return Some(Value::String(PHONE_SENTINEL.to_string())),
            Self::Name => &profile.name,
            Self::Email => &profile.email,
            Self::TargetRole => &profile.target_role,
            Self::Location => &profile.location,
            Self::CurrentCtc => &profile.current_ctc,
            Self::ExpectedCtc => &profile.expected_ctc,
            Self::NoticePeriod => &profile.notice_period,
            Self::Experience => &profile.years_of_experience,
            Self::Availability => &profile.availability,
            Self::DateOfBirth => &profile.date_of_birth,
        };
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Value::String(v.to_string()))
    }
}

#[derive(Serialize)]
struct SkillView<'a> {
    name: &'a str,
    rating: Option<u32>,
    scale: Option<u32>,
    years_of_experience: Option<f64>,
}

impl<'a> From<&'a Skill> for SkillView<'a> {
    fn from(s: &'a Skill) -> Self {
        Self {
            name: s.label(),
            rating: s.rating,
            scale: s.rating_scale,
            years_of_experience: s.years_of_experience,
        }
    }
}

/// Executes tool calls against one user's context.
#[derive(Debug, Clone, Copy)]
pub struct ToolExecutor<'a> {
    context: &'a UserContext,
}

impl<'a> ToolExecutor<'a> {
    /// Creates an executor over a loaded context.
    #[must_use]
    pub const fn new(context: &'a UserContext) -> Self {
        Self { context }
    }

    /// Dispatches a call.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ToolExecution`] if a result cannot be encoded.
    pub fn execute(&self, call: &ToolCall) -> Result<Option<Value>, AgentError> {
        match call {
            ToolCall::GetUserProfile { field } => Ok(self.get_user_profile(field)),
            ToolCall::GetSkillInfo { skill_name } => self.get_skill_info(skill_name),
            ToolCall::SearchResume { query } => Ok(self.search_resume(query)),
            ToolCall::GetCheckboxContext => Ok(Some(self.get_checkbox_context())),
        }
    }

    fn get_user_profile(&self, field: &str) -> Option<Value> {
        ProfileField::parse(field)?.read(&self.context.profile)
    }

    fn get_skill_info(&self, skill_name: &str) -> Result<Option<Value>, AgentError> {
        let needle = skill_name.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }
        let skills = &self.context.skills;
        let names = |s: &Skill| {
            let mut v = vec![s.name.to_lowercase()];
            if let Some(d) = &s.display_name {
                v.push(d.to_lowercase());
            }
            v
        };

        let found = skills
            .iter()
            .find(|s| names(s).iter().any(|n| *n == needle))
            .or_else(|| {
                skills
                    .iter()
                    .find(|s| names(s).iter().any(|n| n.contains(&needle)))
            });

        found
            .map(|s| {
                serde_json::to_value(SkillView::from(s)).map_err(|e| AgentError::ToolExecution {
                    name: "get_skill_info".to_string(),
                    message: format!("serialization error: {e}"),
                })
            })
            .transpose()
    }

    fn search_resume(&self, query: &str) -> Option<Value> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() || self.context.resume_text.trim().is_empty() {
            return None;
        }
        let matches: Vec<&str> = self
            .context
            .resume_text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && line.to_lowercase().contains(&needle))
            .take(MAX_RESUME_MATCHES)
            .collect();
        if matches.is_empty() {
            None
        } else {
            Some(Value::String(matches.join("\n")))
        }
    }

    fn get_checkbox_context(&self) -> Value {
        let p = &self.context.profile;
        let skills: Vec<&str> = self.context.skills.iter().map(Skill::label).collect();
        json!({
            "target_role": p.target_role,
            "location": p.location,
            "years_of_experience": p.years_of_experience,
            "availability": p.availability,
            "notice_period": p.notice_period,
            "skills": skills,
        })
    }
}
