use anyhow::Result;
use dsw_core::daemon::DaemonManager;
use dsw_core::paths::DswPaths;

pub fn run(paths: &DswPaths) -> Result<()> {
    let pid = DaemonManager::new(paths.clone())?.stop()?;
    println!("Daemon stopped (PID {pid})");
    Ok(())
}
