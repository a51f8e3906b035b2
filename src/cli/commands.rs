//! CLI command implementations.
//!
//! Each command returns its rendered output; `main` prints it.

use std::fmt::Write as FmtWrite;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use crate::agent::{AgentConfig, AgenticAnswerService, CheckboxOption, PromptSet};
use crate::cli::output::{OutputFormat, format_answer, format_decision, format_stats};
use crate::cli::parser::{Cli, Commands};
use crate::core::{QuestionType, UserRecord};
use crate::error::{CommandError, Result, StoreError};
use crate::store::SqliteUserStore;

/// Executes the CLI command.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format)?;
    let db_path = cli.get_db_path();
    let user_id = cli.get_user_id();

    match &cli.command {
        Commands::Init { force } => cmd_init(&db_path, *force, format),
        Commands::Import { file } => cmd_import(&db_path, file, format),
        Commands::Answer {
            question,
            question_type,
        } => cmd_answer(&db_path, user_id, question, question_type, format),
        Commands::Choose { question, options } => {
            cmd_choose(&db_path, user_id, question, options, format)
        }
        Commands::Batch { file } => cmd_batch(&db_path, user_id, file.as_deref(), format),
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
    }
}

fn cmd_init(db_path: &Path, force: bool, format: OutputFormat) -> Result<String> {
    if db_path.exists() && !force {
        return Err(CommandError::ExecutionFailed(
            "Database already exists. Use --force to reinitialize.".to_string(),
        )
        .into());
    }

    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            CommandError::ExecutionFailed(format!("Failed to create directory: {e}"))
        })?;
    }

    let store = SqliteUserStore::open(db_path)?;
    store.init(force)?;

    match format {
        OutputFormat::Text => Ok(format!(
            "Initialized applicant database at: {}\n",
            db_path.display()
        )),
        OutputFormat::Json | OutputFormat::Ndjson => Ok(format.to_json(&serde_json::json!({
            "success": true,
            "path": db_path.to_string_lossy(),
            "force": force,
        }))),
    }
}

fn cmd_import(db_path: &Path, file: &Path, format: OutputFormat) -> Result<String> {
    let raw = if file.as_os_str() == "-" {
        read_stdin()?
    } else {
        std::fs::read_to_string(file).map_err(|e| {
            CommandError::ExecutionFailed(format!("Failed to read {}: {e}", file.display()))
        })?
    };
    let record: UserRecord = serde_json::from_str(&raw).map_err(StoreError::from)?;
    if record.user_id.trim().is_empty() {
        return Err(CommandError::InvalidArgument("user_id must not be empty".to_string()).into());
    }

    let store = open_store(db_path)?;
    store.import_user(&record)?;

    match format {
        OutputFormat::Text => Ok(format!(
            "Imported user '{}' ({} skills, résumé {} chars)\n",
            record.user_id,
            record.skills.len(),
            record.resume.chars().count()
        )),
        OutputFormat::Json | OutputFormat::Ndjson => Ok(format.to_json(&serde_json::json!({
            "success": true,
            "user_id": record.user_id,
            "skills": record.skills.len(),
        }))),
    }
}

fn cmd_answer(
    db_path: &Path,
    user_id: &str,
    question: &str,
    question_type: &str,
    format: OutputFormat,
) -> Result<String> {
    let question_type = QuestionType::parse(question_type).ok_or_else(|| {
        CommandError::InvalidArgument(format!(
            "unknown question type '{question_type}' (expected text, checkbox or radio)"
        ))
    })?;
    let service = open_service(db_path, user_id)?;

    let result = runtime()?.block_on(service.get_answer(question, question_type));
    Ok(format_answer(question, &result, format))
}

fn cmd_choose(
    db_path: &Path,
    user_id: &str,
    question: &str,
    options: &[String],
    format: OutputFormat,
) -> Result<String> {
    let service = open_service(db_path, user_id)?;
    let choices: Vec<CheckboxOption> = options.iter().map(|o| CheckboxOption::new(o)).collect();

    let decision = runtime()?.block_on(service.analyze_checkbox_options(&choices, question));
    Ok(format_decision(options, &decision, format))
}

fn cmd_batch(
    db_path: &Path,
    user_id: &str,
    file: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            CommandError::ExecutionFailed(format!("Failed to read {}: {e}", path.display()))
        })?,
        None => read_stdin()?,
    };
    let questions: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();

    let service = open_service(db_path, user_id)?;
    let results = runtime()?.block_on(async {
        service.preload_data().await;
        let mut results = Vec::with_capacity(questions.len());
        for question in &questions {
            results.push(service.get_answer(question, QuestionType::Text).await);
        }
        results
    });
    let stats = service.close();

    let mut output = String::new();
    match format {
        OutputFormat::Text => {
            for (question, result) in questions.iter().zip(&results) {
                let _ = writeln!(output, "Q: {question}");
                output.push_str(&format_answer(question, result, format));
                output.push('\n');
            }
            output.push_str(&format_stats(&stats, format));
        }
        OutputFormat::Ndjson => {
            for (question, result) in questions.iter().zip(&results) {
                output.push_str(&format_answer(question, result, format));
            }
            output.push_str(&format_stats(&stats, format));
        }
        OutputFormat::Json => {
            let answers: Vec<_> = questions
                .iter()
                .zip(&results)
                .map(|(question, result)| serde_json::json!({ "question": question, "result": result }))
                .collect();
            output = format.to_json(&serde_json::json!({ "answers": answers, "stats": stats }));
        }
    }
    Ok(output)
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(Path::to_path_buf)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                return Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ));
            }
            let mut output = format!(
                "Wrote {} prompt template(s) to: {}\n",
                written.len(),
                target_dir.display()
            );
            for path in &written {
                let _ = writeln!(output, "  {}", path.display());
            }
            Ok(output)
        }
        OutputFormat::Json | OutputFormat::Ndjson => Ok(format.to_json(&serde_json::json!({
            "success": true,
            "directory": target_dir.to_string_lossy(),
            "written": written.iter().map(|p| p.to_string_lossy()).collect::<Vec<_>>(),
        }))),
    }
}

fn open_store(db_path: &Path) -> Result<SqliteUserStore> {
    if !db_path.exists() {
        return Err(CommandError::ExecutionFailed(format!(
            "Database not found at {}. Run `autoapply init` first.",
            db_path.display()
        ))
        .into());
    }
    Ok(SqliteUserStore::open(db_path)?)
}

fn open_service(db_path: &Path, user_id: &str) -> Result<AgenticAnswerService> {
    let store = open_store(db_path)?;
    let config = AgentConfig::from_env()?;
    Ok(AgenticAnswerService::new(config, Arc::new(store), user_id)?)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
    })
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| CommandError::ExecutionFailed(format!("Failed to read stdin: {e}")))?;
    Ok(buf)
}
