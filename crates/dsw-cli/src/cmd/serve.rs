use anyhow::Result;
use dsw_core::daemon::DaemonManager;
use dsw_core::paths::DswPaths;
use dsw_core::store::ActionStore;
use dsw_server::ServerConfig;

pub fn run(paths: &DswPaths, port: u16, daemon: bool) -> Result<()> {
    if daemon {
        return run_daemon(paths, port);
    }

    let store = ActionStore::load(paths.config_path())?;
    if store.is_empty() {
        tracing::warn!(path = %store.path().display(), "no actions configured");
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(dsw_server::serve(
        store.into_actions(),
        ServerConfig::with_port(port),
    ))
}

fn run_daemon(paths: &DswPaths, port: u16) -> Result<()> {
    let manager = DaemonManager::new(paths.clone())?;
    let pid = manager.start(port)?;

    println!("Daemon started (PID {pid}) on port {port}");
    println!("  Log: {}", paths.log_path().display());
    Ok(())
}
