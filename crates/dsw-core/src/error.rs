use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DswError {
    // Configuration / persistence
    #[error("home directory not found: set HOME or DSW_HOME")]
    HomeNotFound,

    #[error("failed to parse configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    // Validation
    #[error("invalid action name '{0}': use only letters, numbers, dash and underscore")]
    InvalidName(String),

    #[error("command cannot be empty")]
    EmptyCommand,

    #[error("unclosed quote in command")]
    UnclosedQuote,

    #[error("command not found in PATH: {0}")]
    CommandNotFound(String),

    #[error("command is a directory: {}", .0.display())]
    IsDirectory(PathBuf),

    #[error("command is not executable: {}", .0.display())]
    NotExecutable(PathBuf),

    // Daemon lifecycle
    #[error("daemon already running")]
    AlreadyRunning,

    #[error("daemon is not running")]
    NotRunning,

    #[error("invalid PID in file: {0:?}")]
    InvalidPid(String),

    #[error("process not found: {0}")]
    ProcessLookup(String),

    #[error("failed to start daemon: {0}")]
    Spawn(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Coarse category of a [`DswError`], used by callers that only need to
/// decide how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Validation,
    Daemon,
}

impl DswError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DswError::HomeNotFound
            | DswError::ConfigParse { .. }
            | DswError::Io(_)
            | DswError::Yaml(_) => ErrorKind::Config,
            DswError::InvalidName(_)
            | DswError::EmptyCommand
            | DswError::UnclosedQuote
            | DswError::CommandNotFound(_)
            | DswError::IsDirectory(_)
            | DswError::NotExecutable(_) => ErrorKind::Validation,
            DswError::AlreadyRunning
            | DswError::NotRunning
            | DswError::InvalidPid(_)
            | DswError::ProcessLookup(_)
            | DswError::Spawn(_) => ErrorKind::Daemon,
        }
    }
}

pub type Result<T> = std::result::Result<T, DswError>;
