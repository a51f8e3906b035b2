//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::store::DEFAULT_DB_PATH;

/// User id used when `--user-id` is not given.
pub const DEFAULT_USER_ID: &str = "default";

/// autoapply: agentic answers for job-application forms.
///
/// Reasons about each question, looks up the applicant's data through a
/// fixed set of tools and returns a short, validated answer.
#[derive(Parser, Debug)]
#[command(name = "autoapply")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the applicant database file.
    ///
    /// Defaults to `.autoapply/autoapply.db` in the current directory.
    #[arg(short, long, env = "AUTOAPPLY_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Applicant whose data answers the questions.
    #[arg(short, long, env = "AUTOAPPLY_USER_ID", global = true)]
    pub user_id: Option<String>,

    /// Enable verbose (debug) logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json, ndjson).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the applicant database.
    ///
    /// Creates the database file and schema if they don't exist.
    #[command(after_help = r#"Examples:
  autoapply init                    # Initialize in current directory
  autoapply init --force            # Re-initialize (destroys existing data)
  autoapply --db-path ./me.db init  # Initialize with custom path
"#)]
    Init {
        /// Force re-initialization (destroys existing data).
        #[arg(short, long)]
        force: bool,
    },

    /// Import an applicant record (profile, skills, résumé) from JSON.
    #[command(after_help = r#"Examples:
  autoapply import me.json
  autoapply import -                # Read the record from stdin

The record's user_id is used as-is; --user-id is ignored.
"#)]
    Import {
        /// JSON file containing a user record, or `-` for stdin.
        file: PathBuf,
    },

    /// Answer one form question.
    #[command(after_help = r#"Examples:
  autoapply answer "What is your notice period?"
  autoapply answer "Are you willing to relocate?" --type radio
  autoapply --format json answer "Expected CTC?" | jq .answer
"#)]
    Answer {
        /// Question text as shown on the form.
        question: String,

        /// Form control type: text, checkbox, radio.
        #[arg(short = 't', long = "type", default_value = "text")]
        question_type: String,
    },

    /// Choose one option for a checkbox or radio question.
    #[command(after_help = r#"Examples:
  autoapply choose "Preferred location?" -o Bangalore -o Mumbai -o Delhi
"#)]
    Choose {
        /// Question text as shown on the form.
        question: String,

        /// Option label (repeat for each option, in form order).
        #[arg(short, long = "option", required = true)]
        options: Vec<String>,
    },

    /// Answer one question per line in a single session, then print stats.
    #[command(after_help = r#"Examples:
  autoapply batch questions.txt
  cat questions.txt | autoapply --format ndjson batch

Blank lines and lines starting with '#' are skipped.
"#)]
    Batch {
        /// File with one question per line (stdin if omitted).
        file: Option<PathBuf>,
    },

    /// Write the default prompt templates for customization.
    InitPrompts {
        /// Target directory (defaults to ~/.config/autoapply/prompts).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Returns the database path, using the default if not specified.
    #[must_use]
    pub fn get_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
    }

    /// Returns the user id, using the default if not specified.
    #[must_use]
    pub fn get_user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or(DEFAULT_USER_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli {
            db_path: None,
            user_id: None,
            verbose: false,
            format: "text".to_string(),
            command: Commands::Init { force: false },
        };
        assert_eq!(cli.get_db_path(), PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(cli.get_user_id(), DEFAULT_USER_ID);
    }

    #[test]
    fn test_parse_choose() {
        let cli = Cli::try_parse_from([
            "autoapply",
            "--user-id",
            "u1",
            "choose",
            "City?",
            "-o",
            "Bangalore",
            "--option",
            "Mumbai",
        ])
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(cli.get_user_id(), "u1");
        match cli.command {
            Commands::Choose { question, options } => {
                assert_eq!(question, "City?");
                assert_eq!(options, vec!["Bangalore", "Mumbai"]);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_choose_requires_options() {
        assert!(Cli::try_parse_from(["autoapply", "choose", "City?"]).is_err());
    }

    #[test]
    fn test_parse_answer_type() {
        let cli = Cli::try_parse_from(["autoapply", "answer", "Relocate?", "--type", "radio"])
            .unwrap_or_else(|_| unreachable!());
        assert!(matches!(
            cli.command,
            Commands::Answer { ref question_type, .. } if question_type == "radio"
        ));
    }
}
