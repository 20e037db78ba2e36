use anyhow::{Context, Result};
use dsw_core::command::{parse_command_string, validate};
use dsw_core::paths::DswPaths;
use dsw_core::store::{validate_name, ActionFile, ActionStore};
use std::path::Path;

// ---------------------------------------------------------------------------
// create <name> <command>
// ---------------------------------------------------------------------------

pub fn run_single(paths: &DswPaths, name: &str, command: &str) -> Result<()> {
    validate_name(name)?;
    let action = parse_command_string(command).context("invalid command")?;

    let mut store = ActionStore::load(paths.config_path())?;
    store.add_action(name, action.clone())?;
    paths.ensure_home()?;
    store.save().context("failed to save configuration")?;

    println!("Action '{name}' created successfully");
    println!("  Command: {}", action.command);
    println!("  Args: {:?}", action.args);
    Ok(())
}

// ---------------------------------------------------------------------------
// create -f <file>
// ---------------------------------------------------------------------------

/// Import every valid action from `file`; invalid entries are reported and
/// skipped, and the store is written once at the end.
pub fn run_batch(paths: &DswPaths, file: &Path) -> Result<()> {
    let data = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let incoming = ActionFile::parse(file, &data)?;

    let mut store = ActionStore::load(paths.config_path())?;
    let mut added = 0usize;
    for (name, action) in incoming {
        if let Err(e) = validate(&action.command) {
            eprintln!("warning: skipping action '{name}': {e}");
            continue;
        }
        if let Err(e) = store.add_action(&name, action) {
            eprintln!("warning: skipping action '{name}': {e}");
            continue;
        }
        added += 1;
    }

    paths.ensure_home()?;
    store.save().context("failed to save configuration")?;

    println!("Added {added} action(s) from {}", file.display());
    Ok(())
}
