//! Applicant data: profile, skills and résumé text.
//!
//! These records are loaded once per session and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Applicant profile (one row of `users` joined with `job_settings`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Full name.
    pub name: Option<String>,
    /// Email address. Masked once loaded into a session.
    pub email: Option<String>,
    /// Phone number. Stored but never handed to the model.
    #[serde(skip_serializing)]
    pub phone: Option<String>,
    /// Role the applicant is targeting.
    pub target_role: Option<String>,
    /// Current city.
    pub location: Option<String>,
    /// Current cost to company.
    pub current_ctc: Option<String>,
    /// Expected cost to company.
    pub expected_ctc: Option<String>,
    /// Notice period, e.g. `"30 days"`.
    pub notice_period: Option<String>,
    /// Total years of experience.
    pub years_of_experience: Option<String>,
    /// Availability, e.g. `"Immediate"`.
    pub availability: Option<String>,
    /// Date of birth as `DD/MM/YYYY`.
    pub date_of_birth: Option<String>,
}

impl Profile {
    /// Returns a copy with the email masked and the phone dropped.
    #[must_use]
    pub fn redacted(mut self) -> Self {
        self.email = self.email.as_deref().map(mask_email);
        self.phone = None;
        self
    }
}

/// A rated skill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skill {
    /// Canonical skill name (e.g. `"javascript"`).
    pub name: String,
    /// Display name (e.g. `"JavaScript"`), if different.
    pub display_name: Option<String>,
    /// Self-rating.
    pub rating: Option<u32>,
    /// Upper bound of the rating scale.
    pub rating_scale: Option<u32>,
    /// Years of hands-on experience.
    pub years_of_experience: Option<f64>,
}

impl Skill {
    /// Name shown to the model: display name when present.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// The three sub-records the tools read from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    /// Profile row.
    pub profile: Profile,
    /// Skills in store order.
    pub skills: Vec<Skill>,
    /// Raw résumé body.
    pub resume_text: String,
}

impl UserContext {
    /// One-line-per-field profile summary used in validation and checkbox prompts.
    #[must_use]
    pub fn summary(&self) -> String {
        let p = &self.profile;
        let field = |v: &Option<String>| v.clone().unwrap_or_else(|| "not specified".to_string());
        let skills = if self.skills.is_empty() {
            "not specified".to_string()
        } else {
            self.skills
                .iter()
                .map(Skill::label)
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "- Target role: {}\n\
             - Location: {}\n\
             - Experience: {} years\n\
             - Current CTC: {}\n\
             - Expected CTC: {}\n\
             - Notice period: {}\n\
             - Availability: {}\n\
             - Skills: {skills}",
            field(&p.target_role),
            field(&p.location),
            field(&p.years_of_experience),
            field(&p.current_ctc),
            field(&p.expected_ctc),
            field(&p.notice_period),
            field(&p.availability),
        )
    }
}

/// A complete importable user record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRecord {
    /// User identifier.
    pub user_id: String,
    /// Profile fields.
    #[serde(default)]
    pub profile: ProfileRecord,
    /// Skills.
    #[serde(default)]
    pub skills: Vec<Skill>,
    /// Résumé text.
    #[serde(default)]
    pub resume: String,
}

/// Profile as written to the store, phone included.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileRecord {
    /// Full name.
    pub name: Option<String>,
    /// Raw email.
    pub email: Option<String>,
    /// Raw phone.
    pub phone: Option<String>,
    /// Target role.
    pub target_role: Option<String>,
    /// Current city.
    pub location: Option<String>,
    /// Current CTC.
    pub current_ctc: Option<String>,
    /// Expected CTC.
    pub expected_ctc: Option<String>,
    /// Notice period.
    pub notice_period: Option<String>,
    /// Years of experience.
    pub years_of_experience: Option<String>,
    /// Availability.
    pub availability: Option<String>,
    /// Date of birth.
    pub date_of_birth: Option<String>,
}

impl From<ProfileRecord> for Profile {
    fn from(r: ProfileRecord) -> Self {
        Self {
            name: r.name,
            email: r.email,
            phone: r.phone,
            target_role: r.target_role,
            location: r.location,
            current_ctc: r.current_ctc,
            expected_ctc: r.expected_ctc,
            notice_period: r.notice_period,
            years_of_experience: r.years_of_experience,
            availability: r.availability,
            date_of_birth: r.date_of_birth,
        }
    }
}

/// Masks the local part of an email: `john.doe@x.com` → `jo***@x.com`.
#[must_use]
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let visible: String = local.chars().take(2).collect();
            format!("{visible}***@{domain}")
        }
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("john.doe@example.com"), "jo***@example.com");
        assert_eq!(mask_email("a@b.io"), "a***@b.io");
        assert_eq!(mask_email("not-an-email"), "***");
    }

    #[test]
    fn test_redacted_drops_phone() {
        let profile = Profile {
            email: Some("priya@mail.com".to_string()),
            phone: Some("+91 99999 00000".to_string()),
            ..Profile::default()
        }
        .redacted();
        assert_eq!(profile.email.as_deref(), Some("pr***@mail.com"));
        assert!(profile.phone.is_none());
    }

    #[test]
    fn test_summary_lists_skills() {
        let ctx = UserContext {
            profile: Profile {
                location: Some("Pune".to_string()),
                ..Profile::default()
            },
            skills: vec![
                Skill {
                    name: "js".to_string(),
                    display_name: Some("JavaScript".to_string()),
                    ..Skill::default()
                },
                Skill {
                    name: "rust".to_string(),
                    ..Skill::default()
                },
            ],
            resume_text: String::new(),
        };
        let summary = ctx.summary();
        assert!(summary.contains("Location: Pune"));
        assert!(summary.contains("Skills: JavaScript, rust"));
        assert!(summary.contains("Notice period: not specified"));
    }
}
