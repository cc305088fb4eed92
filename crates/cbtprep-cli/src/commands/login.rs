//! The `cbtprep login` and `cbtprep whoami` commands.

use std::path::PathBuf;

use anyhow::{Context, Result};

use cbtprep_core::history::ProfileStore;
use cbtprep_core::UserProfile;

pub fn execute(name: &str, department: &str, config_path: Option<PathBuf>) -> Result<()> {
    let config = super::config(config_path)?;
    let profile = UserProfile::new(name, department)?;
    let store = super::open_store(&config.data_dir);
    store
        .save_profile(&profile)
        .with_context(|| format!("failed to save profile in {}", config.data_dir.display()))?;

    println!(
        "Logged in as {} ({})",
        profile.display_name, profile.department
    );
    Ok(())
}

pub fn whoami(config_path: Option<PathBuf>) -> Result<()> {
    let config = super::config(config_path)?;
    let store = super::open_store(&config.data_dir);
    match store.load_profile()? {
        Some(profile) => println!("{} ({})", profile.display_name, profile.department),
        None => println!("Not logged in. Run `cbtprep login --name <NAME> --department <DEPT>`."),
    }
    Ok(())
}
