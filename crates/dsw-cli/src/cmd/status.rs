use anyhow::Result;
use dsw_core::daemon::{DaemonManager, DaemonStatus};
use dsw_core::paths::DswPaths;

pub fn run(paths: &DswPaths) -> Result<()> {
    match DaemonManager::new(paths.clone())?.status() {
        DaemonStatus::Running { pid } => println!("dsw is running (PID {pid})"),
        DaemonStatus::Stopped => println!("dsw is not running"),
    }
    Ok(())
}
