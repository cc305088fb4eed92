//! The `cbtprep init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_if_missing("cbtprep.toml", SAMPLE_CONFIG)?;
    write_if_missing("questions.json", SAMPLE_BANK)?;

    println!("\nNext steps:");
    println!("  1. Run: cbtprep login --name <NAME> --department <DEPT>");
    println!("  2. Run: cbtprep validate");
    println!("  3. Run: cbtprep take");

    Ok(())
}

fn write_if_missing(name: &str, contents: &str) -> Result<()> {
    if Path::new(name).exists() {
        println!("{name} already exists, skipping.");
    } else {
        std::fs::write(name, contents)?;
        println!("Created {name}");
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# cbtprep configuration

# Where the profile and score histories are kept.
data_dir = ".cbtprep"
history_prefix = "phy107"

[source]
type = "file"
path = "questions.json"
collection = "all"

# A bank can also be served over HTTP:
# [source]
# type = "http"
# url = "https://example.org/questions.json"
# timeout_secs = 30

[exam]
question_count = 30
duration_secs = 900
warning_secs = 180
pass_mark = 50
"#;

const SAMPLE_BANK: &str = include_str!("../../../../banks/phy107-sample.json");
