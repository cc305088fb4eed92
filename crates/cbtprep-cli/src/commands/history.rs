//! The `cbtprep history` command.

use std::path::PathBuf;

use anyhow::{bail, Result};
use comfy_table::{Cell, Table};

use cbtprep_core::grader::Verdict;
use cbtprep_core::history::{history_key, summarize, HistoryStore, ProfileStore};

pub fn execute(json: bool, config_path: Option<PathBuf>) -> Result<()> {
    let config = super::config(config_path)?;
    let store = super::open_store(&config.data_dir);
    let Some(profile) = store.load_profile()? else {
        bail!("not logged in; run `cbtprep login --name <NAME> --department <DEPT>` first");
    };

    let records = store.read(&history_key(&config.history_prefix, &profile))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    let Some(summary) = summarize(&records) else {
        println!("No results yet for {}.", profile.display_name);
        return Ok(());
    };

    let mut table = Table::new();
    table.set_header(vec!["#", "Date", "Correct", "Wrong", "Score", "Result"]);
    for (i, record) in records.iter().enumerate() {
        let verdict = match Verdict::of(record, config.exam.pass_mark) {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(record.timestamp.format("%Y-%m-%d %H:%M")),
            Cell::new(record.correct_count),
            Cell::new(record.wrong_count),
            Cell::new(format!("{}%", record.percentage)),
            Cell::new(verdict),
        ]);
    }

    println!("Results for {} ({})", profile.display_name, profile.department);
    println!("{table}");
    println!(
        "Attempts: {}  Best: {}%  Latest: {}%  Average: {:.1}%",
        summary.attempts,
        summary.best_percentage,
        summary.latest_percentage,
        summary.average_percentage
    );

    Ok(())
}
