use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// A registered shell command plus its argument list.
///
/// `command` was resolved and checked for executability when the action was
/// created. That check is not repeated before each run, so an action can go
/// stale if the binary is later removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Action {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// The single line handed to the shell: `command` followed by the
    /// space-joined `args`.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

// ---------------------------------------------------------------------------
// ApiResponse
// ---------------------------------------------------------------------------

/// Outcome of one action execution, as returned by `POST /execute/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub output: String,
    pub message: String,
    pub duration_ms: u64,
}

impl ApiResponse {
    /// Join captured stdout and stderr: stdout first, separated by a newline
    /// only when both are non-empty.
    pub fn combine_output(stdout: &str, stderr: &str) -> String {
        match (stdout.is_empty(), stderr.is_empty()) {
            (_, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{stdout}\n{stderr}"),
        }
    }
}
