use crate::error::{DswError, Result};
use crate::io::{atomic_write, open_append, remove_if_exists};
use crate::paths::DswPaths;
use crate::process::{ProcessControl, UnixProcessControl};
use std::ffi::OsString;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// DaemonStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonStatus {
    Stopped,
    Running { pid: u32 },
}

// ---------------------------------------------------------------------------
// DaemonManager
// ---------------------------------------------------------------------------

/// Single-instance background server tracked through a PID file.
///
/// "Running" means the PID file exists and the recorded PID answers a
/// zero-signal probe. A recycled PID belonging to an unrelated process is
/// indistinguishable from the real server. A PID file left behind by a
/// crashed server stops answering the probe and is removed by the next
/// status check, which `start` and `stop` both perform.
///
/// `start` and `stop` are check-then-act without file locking; two
/// concurrent `start` calls can both spawn a server.
pub struct DaemonManager {
    paths: DswPaths,
    program: PathBuf,
    control: Box<dyn ProcessControl>,
}

impl DaemonManager {
    /// Manager that re-invokes the current executable.
    pub fn new(paths: DswPaths) -> Result<Self> {
        let program = std::env::current_exe()?;
        Ok(Self::with_control(paths, program, UnixProcessControl))
    }

    pub fn with_control(
        paths: DswPaths,
        program: impl Into<PathBuf>,
        control: impl ProcessControl + 'static,
    ) -> Self {
        Self {
            paths,
            program: program.into(),
            control: Box::new(control),
        }
    }

    pub fn paths(&self) -> &DswPaths {
        &self.paths
    }

    /// Arguments that put the child into foreground-serve mode.
    fn serve_args(&self, port: u16) -> Vec<OsString> {
        vec![
            OsString::from("--home"),
            self.paths.home().as_os_str().to_os_string(),
            OsString::from("serve"),
            OsString::from("--port"),
            OsString::from(port.to_string()),
        ]
    }

    /// Spawn a detached server on `port` and record its PID.
    ///
    /// If the PID file cannot be written the child is killed before the
    /// error is returned, so no untracked server is left behind.
    pub fn start(&self, port: u16) -> Result<u32> {
        if self.is_running() {
            return Err(DswError::AlreadyRunning);
        }

        self.paths.ensure_home()?;
        let log = open_append(&self.paths.log_path())?;

        let pid = self
            .control
            .spawn_detached(&self.program, &self.serve_args(port), log)
            .map_err(|e| DswError::Spawn(e.to_string()))?;

        if let Err(e) = atomic_write(&self.paths.pid_path(), pid.to_string().as_bytes()) {
            tracing::error!(pid, error = %e, "failed to write PID file, killing daemon");
            if let Err(kill_err) = self.control.kill(pid) {
                tracing::warn!(pid, error = %kill_err, "failed to kill daemon");
            }
            return Err(e);
        }

        tracing::info!(pid, port, "daemon started");
        Ok(pid)
    }

    /// Send SIGTERM to the recorded server and remove the PID file.
    ///
    /// A failed signal is only logged: the PID is treated as already gone
    /// and the file is cleared. A failed process lookup also clears the
    /// file but is reported as an error.
    pub fn stop(&self) -> Result<u32> {
        if !self.is_running() {
            return Err(DswError::NotRunning);
        }

        let pid_path = self.paths.pid_path();
        let pid = self.read_pid()?;

        if let Err(e) = self.control.lookup(pid) {
            remove_if_exists(&pid_path)?;
            return Err(DswError::ProcessLookup(e.to_string()));
        }

        if let Err(e) = self.control.terminate(pid) {
            tracing::warn!(pid, error = %e, "failed to signal daemon, clearing PID file");
        }

        remove_if_exists(&pid_path)?;
        tracing::info!(pid, "daemon stopped");
        Ok(pid)
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status(), DaemonStatus::Running { .. })
    }

    /// Probe the recorded PID. A PID file that is unreadable as a PID or
    /// names a process that no longer answers is removed.
    pub fn status(&self) -> DaemonStatus {
        let pid_path = self.paths.pid_path();
        match self.read_pid() {
            Ok(pid) if self.control.probe(pid) => return DaemonStatus::Running { pid },
            Err(DswError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return DaemonStatus::Stopped
            }
            Ok(pid) => tracing::debug!(pid, "removing stale PID file"),
            Err(e) => tracing::debug!(error = %e, "removing unreadable PID file"),
        }
        if let Err(e) = remove_if_exists(&pid_path) {
            tracing::warn!(
                path = %pid_path.display(),
                error = %e,
                "failed to remove stale PID file"
            );
        }
        DaemonStatus::Stopped
    }

    fn read_pid(&self) -> Result<u32> {
        let data = std::fs::read_to_string(self.paths.pid_path())?;
        match data.trim().parse::<u32>() {
            Ok(pid) if pid > 0 => Ok(pid),
            _ => Err(DswError::InvalidPid(data)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs::File;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// In-memory process table.
    #[derive(Default)]
    struct FakeTable {
        alive: HashSet<u32>,
        next_pid: u32,
        spawned: Vec<(PathBuf, Vec<OsString>)>,
        killed: Vec<u32>,
        fail_terminate: bool,
        fail_lookup: bool,
    }

    #[derive(Clone, Default)]
    struct FakeControl(Arc<Mutex<FakeTable>>);

    impl ProcessControl for FakeControl {
        fn spawn_detached(
            &self,
            program: &Path,
            args: &[OsString],
            _log: File,
        ) -> std::io::Result<u32> {
            let mut t = self.0.lock().unwrap();
            t.next_pid += 1;
            let pid = 1000 + t.next_pid;
            t.alive.insert(pid);
            t.spawned.push((program.to_path_buf(), args.to_vec()));
            Ok(pid)
        }

        fn lookup(&self, _pid: u32) -> std::io::Result<()> {
            if self.0.lock().unwrap().fail_lookup {
                return Err(std::io::Error::other("lookup failed"));
            }
            Ok(())
        }

        fn probe(&self, pid: u32) -> bool {
            self.0.lock().unwrap().alive.contains(&pid)
        }

        fn terminate(&self, pid: u32) -> std::io::Result<()> {
            let mut t = self.0.lock().unwrap();
            if t.fail_terminate {
                return Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
            }
            t.alive.remove(&pid);
            Ok(())
        }

        fn kill(&self, pid: u32) -> std::io::Result<()> {
            let mut t = self.0.lock().unwrap();
            t.alive.remove(&pid);
            t.killed.push(pid);
            Ok(())
        }
    }

    fn manager(dir: &TempDir) -> (DaemonManager, FakeControl) {
        let control = FakeControl::default();
        let paths = DswPaths::new(dir.path().join(".dsw"));
        let mgr = DaemonManager::with_control(paths, "/usr/bin/dsw", control.clone());
        (mgr, control)
    }

    #[test]
    fn start_records_pid_and_reports_running() {
        let dir = TempDir::new().unwrap();
        let (mgr, control) = manager(&dir);

        assert_eq!(mgr.status(), DaemonStatus::Stopped);
        let pid = mgr.start(8080).unwrap();

        let recorded = std::fs::read_to_string(mgr.paths().pid_path()).unwrap();
        assert_eq!(recorded, pid.to_string());
        assert!(mgr.is_running());
        assert_eq!(mgr.status(), DaemonStatus::Running { pid });

        let t = control.0.lock().unwrap();
        let (program, args) = &t.spawned[0];
        assert_eq!(program, Path::new("/usr/bin/dsw"));
        assert_eq!(args[2..], ["serve", "--port", "8080"]);
        assert_eq!(args[0], "--home");
    }

    #[test]
    fn second_start_fails_with_already_running() {
        let dir = TempDir::new().unwrap();
        let (mgr, control) = manager(&dir);
        mgr.start(8080).unwrap();
        let err = mgr.start(8080).unwrap_err();
        assert!(matches!(err, DswError::AlreadyRunning));
        assert_eq!(control.0.lock().unwrap().spawned.len(), 1);
    }

    #[test]
    fn stop_then_not_running() {
        let dir = TempDir::new().unwrap();
        let (mgr, _control) = manager(&dir);
        let pid = mgr.start(9000).unwrap();
        assert_eq!(mgr.stop().unwrap(), pid);
        assert!(!mgr.is_running());
        assert!(!mgr.paths().pid_path().exists());
    }

    #[test]
    fn stop_when_not_running_fails() {
        let dir = TempDir::new().unwrap();
        let (mgr, _control) = manager(&dir);
        assert!(matches!(mgr.stop().unwrap_err(), DswError::NotRunning));
    }

    #[test]
    fn stale_pid_file_self_heals() {
        let dir = TempDir::new().unwrap();
        let (mgr, _control) = manager(&dir);
        mgr.paths().ensure_home().unwrap();
        std::fs::write(mgr.paths().pid_path(), "4242").unwrap();

        assert!(!mgr.is_running());
        assert!(!mgr.paths().pid_path().exists());
        assert!(matches!(mgr.stop().unwrap_err(), DswError::NotRunning));

        let pid = mgr.start(8080).unwrap();
        assert_ne!(pid, 4242);
        assert!(mgr.is_running());
    }

    #[test]
    fn garbage_pid_file_is_not_running() {
        let dir = TempDir::new().unwrap();
        let (mgr, _control) = manager(&dir);
        mgr.paths().ensure_home().unwrap();
        std::fs::write(mgr.paths().pid_path(), "not-a-pid").unwrap();
        assert_eq!(mgr.status(), DaemonStatus::Stopped);
        assert!(!mgr.paths().pid_path().exists());
    }

    #[test]
    fn status_without_pid_file_is_stopped() {
        let dir = TempDir::new().unwrap();
        let (mgr, _control) = manager(&dir);
        assert_eq!(mgr.status(), DaemonStatus::Stopped);
        assert!(!mgr.paths().home().exists());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_home_is_passed_through_unchanged() {
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let home = dir.path().join(std::ffi::OsStr::from_bytes(b"dsw-\xff-home"));
        let control = FakeControl::default();
        let mgr =
            DaemonManager::with_control(DswPaths::new(&home), "/usr/bin/dsw", control.clone());
        mgr.start(8080).unwrap();

        let t = control.0.lock().unwrap();
        let (_, args) = &t.spawned[0];
        assert_eq!(args[1].as_os_str(), home.as_os_str());
    }

    #[test]
    fn pid_write_failure_kills_child() {
        let dir = TempDir::new().unwrap();
        let (mgr, control) = manager(&dir);
        // A non-empty directory where the PID file should go blocks the rename.
        let pid_path = mgr.paths().pid_path();
        std::fs::create_dir_all(&pid_path).unwrap();
        std::fs::write(pid_path.join("occupied"), "x").unwrap();

        assert!(mgr.start(8080).is_err());

        let t = control.0.lock().unwrap();
        assert_eq!(t.killed.len(), 1);
        assert!(t.alive.is_empty(), "spawned child must not survive");
    }

    #[test]
    fn signal_failure_still_clears_pid_file() {
        let dir = TempDir::new().unwrap();
        let (mgr, control) = manager(&dir);
        mgr.start(8080).unwrap();
        control.0.lock().unwrap().fail_terminate = true;

        mgr.stop().unwrap();
        assert!(!mgr.paths().pid_path().exists());
    }

    #[test]
    fn lookup_failure_clears_pid_file_and_errors() {
        let dir = TempDir::new().unwrap();
        let (mgr, control) = manager(&dir);
        mgr.start(8080).unwrap();
        control.0.lock().unwrap().fail_lookup = true;

        assert!(matches!(
            mgr.stop().unwrap_err(),
            DswError::ProcessLookup(_)
        ));
        assert!(!mgr.paths().pid_path().exists());
    }
}
