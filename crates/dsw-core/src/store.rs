use crate::error::{DswError, Result};
use crate::io::atomic_write;
use crate::types::Action;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// On-disk schema
// ---------------------------------------------------------------------------

/// `configuration.yaml` as stored on disk.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ActionFile {
    #[serde(default)]
    pub actions: Option<BTreeMap<String, Action>>,
}

impl ActionFile {
    /// Parse a file with the `{actions: {name: {command, args}}}` schema.
    /// An empty document yields no actions.
    pub fn parse(path: &Path, data: &str) -> Result<BTreeMap<String, Action>> {
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let file: ActionFile =
            serde_yaml::from_str(data).map_err(|source| DswError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(file.actions.unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap())
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || !name_re().is_match(name) {
        return Err(DswError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ActionStore
// ---------------------------------------------------------------------------

/// Persistent registry of actions keyed by name.
///
/// Names are matched exactly as given (case-sensitive, no normalization).
/// The whole mapping is rewritten on every `save`.
#[derive(Debug, Clone)]
pub struct ActionStore {
    path: PathBuf,
    actions: BTreeMap<String, Action>,
}

impl ActionStore {
    /// An empty store that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            actions: BTreeMap::new(),
        }
    }

    /// Load the store from `path`. A missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let actions = match std::fs::read_to_string(&path) {
            Ok(data) => ActionFile::parse(&path, &data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, actions })
    }

    /// Write the full mapping via tempfile + rename.
    pub fn save(&self) -> Result<()> {
        let file = ActionFile {
            actions: Some(self.actions.clone()),
        };
        let data = serde_yaml::to_string(&file)?;
        atomic_write(&self.path, data.as_bytes())
    }

    /// Insert or replace the action registered under `name`.
    pub fn add_action(&mut self, name: &str, action: Action) -> Result<()> {
        validate_name(name)?;
        if self.actions.insert(name.to_string(), action).is_some() {
            tracing::debug!(name, "overwriting existing action");
        }
        Ok(())
    }

    pub fn get_action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn actions(&self) -> &BTreeMap<String, Action> {
        &self.actions
    }

    pub fn into_actions(self) -> BTreeMap<String, Action> {
        self.actions
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
