//! The `cbtprep validate` command.

use std::path::PathBuf;

use anyhow::Result;

use cbtprep_core::bank::validate_pool;

pub async fn execute(bank: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = super::config(config_path)?;
    let pool = super::load_pool(&config, bank.as_deref()).await?;

    println!("Question bank: {} questions", pool.len());

    let warnings = validate_pool(&pool, config.exam.question_count);
    for w in &warnings {
        let prefix = w
            .question_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Question bank valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
