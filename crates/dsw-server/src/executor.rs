//! Bounded-time execution of a single action.
//!
//! The action's command line is handed to `sh -c`, so shell metacharacters in
//! the stored command or arguments are interpreted again at run time even
//! though the action was tokenized when it was created.
//!
//! Every run is capped by [`ExecutorConfig::timeout`]. The child gets its own
//! process group; on timeout the whole group is killed and the shell reaped,
//! so nothing the command started outlives the request.

use dsw_core::{Action, ApiResponse};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub const SUCCESS_MESSAGE: &str = "Command executed successfully";

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Wall-clock limit for one run, including output draining.
    pub timeout: Duration,
    /// Interpreter invoked as `<shell> -c <command line>`.
    pub shell: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            shell: "sh".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Executor {
    config: ExecutorConfig,
}

/// Output collected by a pipe reader while the child runs.
type SharedBuf = Arc<Mutex<Vec<u8>>>;

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run `action` and classify the outcome. Never fails: spawn errors,
    /// non-zero exits and timeouts all come back as `success: false`.
    pub async fn execute(&self, action: &Action) -> ApiResponse {
        let start = Instant::now();
        let mut response = self.run(action).await;
        response.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        response
    }

    async fn run(&self, action: &Action) -> ApiResponse {
        let mut cmd = Command::new(&self.config.shell);
        cmd.arg("-c")
            .arg(action.command_line())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) => return failure(String::new(), format!("Command error: {e}")),
        };
        let pgid = child.id();

        let stdout_buf = SharedBuf::default();
        let stderr_buf = SharedBuf::default();
        let stdout_task = tokio::spawn(drain(child.stdout.take(), stdout_buf.clone()));
        let stderr_task = tokio::spawn(drain(child.stderr.take(), stderr_buf.clone()));

        let deadline = tokio::time::Instant::now() + self.config.timeout;
        let waited = tokio::time::timeout_at(deadline, async {
            let status = child.wait().await;
            let _ = tokio::join!(stdout_task, stderr_task);
            status
        })
        .await;

        if waited.is_err() {
            kill_tree(&mut child, pgid).await;
        }

        let output =
            ApiResponse::combine_output(&take_string(&stdout_buf), &take_string(&stderr_buf));

        match waited {
            Err(_) => failure(
                output,
                format!(
                    "Command timed out after {} seconds",
                    self.config.timeout.as_secs()
                ),
            ),
            Ok(Ok(status)) if status.success() => ApiResponse {
                success: true,
                output,
                message: SUCCESS_MESSAGE.to_string(),
                duration_ms: 0,
            },
            Ok(Ok(status)) => failure(
                output,
                format!(
                    "Command failed with exit code {}",
                    status.code().unwrap_or(-1)
                ),
            ),
            Ok(Err(e)) => failure(output, format!("Command error: {e}")),
        }
    }
}

fn failure(output: String, message: String) -> ApiResponse {
    ApiResponse {
        success: false,
        output,
        message,
        duration_ms: 0,
    }
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>, buf: SharedBuf) {
    let Some(mut pipe) = pipe else {
        return;
    };
    let mut chunk = [0u8; 8192];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if let Ok(mut b) = buf.lock() {
                    b.extend_from_slice(&chunk[..n]);
                }
            }
        }
    }
}

fn take_string(buf: &SharedBuf) -> String {
    match buf.lock() {
        Ok(b) => String::from_utf8_lossy(&b).into_owned(),
        Err(_) => String::new(),
    }
}

/// SIGKILL the child's process group, then kill and reap the child itself.
async fn kill_tree(child: &mut Child, pgid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pgid) = pgid.and_then(|p| libc::pid_t::try_from(p).ok()) {
        // SAFETY: kill(2) has no memory-safety preconditions.
        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    }
    #[cfg(not(unix))]
    let _ = pgid;

    if let Err(e) = child.kill().await {
        tracing::debug!(error = %e, "child already exited before kill");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
