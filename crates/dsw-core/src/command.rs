//! Tokenizing and validating user-supplied command strings.
//!
//! `parse_command_string` is what the CLI calls when an action is created:
//! the raw string is split into tokens with shell-like quoting, the first
//! token must name a runnable executable, and the rest become arguments.
//!
//! # Quoting rules
//! - `'` and `"` open a quoted region; the quote characters themselves are
//!   not part of the token.
//! - Inside a region, a quote of the other kind is an ordinary character.
//! - Regions and bare text concatenate: `a"b"c` is the single token `abc`.
//! - Spaces and tabs outside a region separate tokens; empty tokens are
//!   dropped.
//! - End of input inside a region is an error.

use std::path::{Path, PathBuf};

use crate::error::{DswError, Result};
use crate::types::Action;

/// Split `input` into tokens following the quoting rules above.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut active_quote: Option<char> = None;

    for ch in input.chars() {
        match (active_quote, ch) {
            (None, '"' | '\'') => active_quote = Some(ch),
            (Some(q), c) if c == q => active_quote = None,
            (None, ' ' | '\t') => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            (_, c) => current.push(c),
        }
    }

    if active_quote.is_some() {
        return Err(DswError::UnclosedQuote);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Check that `command` names something that can be run.
///
/// Bare names are looked up on `PATH`; anything containing a path separator
/// is taken as a path. The result must exist, must not be a directory and
/// must carry at least one executable permission bit. Returns the resolved
/// path.
pub fn validate(command: &str) -> Result<PathBuf> {
    if command.is_empty() {
        return Err(DswError::EmptyCommand);
    }

    let resolved = if command.contains(std::path::MAIN_SEPARATOR) {
        let path = PathBuf::from(command);
        if !path.exists() {
            return Err(DswError::CommandNotFound(command.to_string()));
        }
        path
    } else {
        which::which(command).map_err(|_| DswError::CommandNotFound(command.to_string()))?
    };

    let meta = std::fs::metadata(&resolved)?;
    if meta.is_dir() {
        return Err(DswError::IsDirectory(resolved));
    }
    if !is_executable(&resolved, &meta) {
        return Err(DswError::NotExecutable(resolved));
    }
    Ok(resolved)
}

#[cfg(unix)]
fn is_executable(_path: &Path, meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(path: &Path, _meta: &std::fs::Metadata) -> bool {
    which::which(path).is_ok()
}

/// Tokenize `input`, validate the first token as the command and return the
/// resulting action. The command is stored exactly as typed, not as the
/// resolved path.
pub fn parse_command_string(input: &str) -> Result<Action> {
    if input.trim().is_empty() {
        return Err(DswError::EmptyCommand);
    }

    let mut tokens = tokenize(input)?.into_iter();
    let command = tokens.next().ok_or(DswError::EmptyCommand)?;
    validate(&command)?;

    Ok(Action::new(command, tokens.collect()))
}
