//! OS process control used by the daemon manager.
//!
//! The daemon state machine only talks to [`ProcessControl`]; the Unix
//! implementation detaches children with `setsid` and signals them through
//! `libc::kill`. Other platforms get an implementation that refuses every
//! operation.

use std::ffi::OsString;
use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};

/// Spawning and signalling processes by PID.
pub trait ProcessControl: Send + Sync {
    /// Start `program` with `args` in a new session, stdin closed and
    /// stdout/stderr appended to `log`. Returns the child's PID; the child
    /// keeps running after the caller exits.
    fn spawn_detached(&self, program: &Path, args: &[OsString], log: File) -> std::io::Result<u32>;

    /// Check that `pid` refers to something this process could signal.
    fn lookup(&self, pid: u32) -> std::io::Result<()>;

    /// Zero-signal probe: true if a process with `pid` exists and this user
    /// may signal it. Says nothing about what that process is.
    fn probe(&self, pid: u32) -> bool;

    /// Ask the process to shut down (SIGTERM).
    fn terminate(&self, pid: u32) -> std::io::Result<()>;

    /// Force the process to stop (SIGKILL).
    fn kill(&self, pid: u32) -> std::io::Result<()>;
}

// ---------------------------------------------------------------------------
// Unix
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
pub struct UnixProcessControl;

#[cfg(unix)]
fn to_pid_t(pid: u32) -> std::io::Result<libc::pid_t> {
    match libc::pid_t::try_from(pid) {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{pid} is not a valid process id"),
        )),
    }
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: libc::c_int) -> std::io::Result<()> {
    let pid = to_pid_t(pid)?;
    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(pid, signal) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(unix)]
impl ProcessControl for UnixProcessControl {
    fn spawn_detached(&self, program: &Path, args: &[OsString], log: File) -> std::io::Result<u32> {
        use std::os::unix::process::CommandExt;

        let stderr = log.try_clone()?;
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(stderr));

        // SAFETY: setsid is async-signal-safe and touches no parent state.
        unsafe {
            cmd.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let mut child = cmd.spawn()?;
        let pid = child.id();

        // Reap the child if it exits while we are still alive so it does not
        // linger as a zombie that still answers the liveness probe.
        std::thread::spawn(move || {
            let _ = child.wait();
        });

        Ok(pid)
    }

    fn lookup(&self, pid: u32) -> std::io::Result<()> {
        to_pid_t(pid).map(|_| ())
    }

    fn probe(&self, pid: u32) -> bool {
        send_signal(pid, 0).is_ok()
    }

    fn terminate(&self, pid: u32) -> std::io::Result<()> {
        send_signal(pid, libc::SIGTERM)
    }

    fn kill(&self, pid: u32) -> std::io::Result<()> {
        send_signal(pid, libc::SIGKILL)
    }
}

#[cfg(not(unix))]
impl ProcessControl for UnixProcessControl {
    fn spawn_detached(
        &self,
        _program: &Path,
        _args: &[OsString],
        _log: File,
    ) -> std::io::Result<u32> {
        Err(unsupported())
    }

    fn lookup(&self, _pid: u32) -> std::io::Result<()> {
        Err(unsupported())
    }

    fn probe(&self, _pid: u32) -> bool {
        false
    }

    fn terminate(&self, _pid: u32) -> std::io::Result<()> {
        Err(unsupported())
    }

    fn kill(&self, _pid: u32) -> std::io::Result<()> {
        Err(unsupported())
    }
}

#[cfg(not(unix))]
fn unsupported() -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "daemon mode is only supported on Unix",
    )
}
