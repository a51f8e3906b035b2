//! Domain types shared by the answer engine, the store and the CLI.

pub mod confidence;
pub mod profile;
pub mod question;

pub use confidence::Confidence;
pub use profile::{Profile, ProfileRecord, Skill, UserContext, UserRecord, mask_email};
pub use question::{AnswerFormat, QuestionCategory, QuestionType};
