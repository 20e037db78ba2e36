use anyhow::{anyhow, bail, Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};
use std::process::Command;

const UNIT_NAME: &str = "dsw.service";
const FALLBACK_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

// ---------------------------------------------------------------------------
// Subcommand definition
// ---------------------------------------------------------------------------

#[derive(Subcommand, Debug)]
pub enum BootSubcommand {
    /// Write the systemd user unit and enable it
    Enable {
        /// Port the service listens on
        #[arg(short, long, default_value_t = dsw_server::DEFAULT_PORT)]
        port: u16,
    },
    /// Disable the service and remove its unit file
    Disable,
}

pub fn run(subcommand: BootSubcommand) -> Result<()> {
    let installer = BootInstaller::for_current_user()?;
    match subcommand {
        BootSubcommand::Enable { port } => installer.enable(port),
        BootSubcommand::Disable => installer.disable(),
    }
}

// ---------------------------------------------------------------------------
// Unit file
// ---------------------------------------------------------------------------

/// Render the unit that runs `<exe> serve --port <port>` at login.
fn render_unit(exe: &Path, port: u16, path_env: &str, home: &Path) -> String {
    format!(
        "[Unit]
Description=DSW Service
After=network-online.target
Wants=network-online.target

[Service]
Type=simple
ExecStart={exe} serve --port {port}
Restart=on-failure
RestartSec=10
Environment=\"PATH={path_env}\"
Environment=\"HOME={home}\"
StandardOutput=journal
StandardError=journal

[Install]
WantedBy=default.target
",
        exe = exe.display(),
        home = home.display(),
    )
}

// ---------------------------------------------------------------------------
// BootInstaller
// ---------------------------------------------------------------------------

struct BootInstaller {
    user_home: PathBuf,
    unit_path: PathBuf,
}

impl BootInstaller {
    fn for_current_user() -> Result<Self> {
        let user_home = home::home_dir().ok_or_else(|| anyhow!("home directory not found"))?;
        Ok(Self::new(user_home))
    }

    fn new(user_home: PathBuf) -> Self {
        let unit_path = user_home
            .join(".config")
            .join("systemd")
            .join("user")
            .join(UNIT_NAME);
        Self {
            user_home,
            unit_path,
        }
    }

    fn is_configured(&self) -> bool {
        self.unit_path.exists()
    }

    fn write_unit(&self, exe: &Path, port: u16) -> Result<()> {
        let path_env = std::env::var("PATH")
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| FALLBACK_PATH.to_string());
        let unit = render_unit(exe, port, &path_env, &self.user_home);
        dsw_core::io::atomic_write(&self.unit_path, unit.as_bytes())
            .context("failed to write service file")
    }

    fn enable(&self, port: u16) -> Result<()> {
        let exe = std::env::current_exe()
            .and_then(|p| p.canonicalize())
            .context("failed to get executable path")?;
        self.write_unit(&exe, port)?;

        systemctl(&["daemon-reload"]).context("failed to reload systemd")?;
        systemctl(&["enable", UNIT_NAME]).context("failed to enable service")?;

        println!("Boot enabled successfully");
        Ok(())
    }

    fn disable(&self) -> Result<()> {
        if !self.is_configured() {
            bail!("boot is not configured");
        }

        systemctl(&["disable", UNIT_NAME]).context("failed to disable service")?;
        if let Err(e) = systemctl(&["stop", UNIT_NAME]) {
            tracing::warn!(error = %e, "failed to stop service");
        }

        std::fs::remove_file(&self.unit_path).context("failed to remove service file")?;
        systemctl(&["daemon-reload"]).context("failed to reload systemd")?;

        println!("Boot disabled successfully");
        Ok(())
    }
}

/// Run `systemctl --user <args>`, folding its output into the error.
fn systemctl(args: &[&str]) -> Result<()> {
    let output = Command::new("systemctl")
        .arg("--user")
        .args(args)
        .output()
        .context("failed to run systemctl")?;
    if !output.status.success() {
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        bail!("{}: {}", output.status, combined.trim());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unit_runs_serve_with_port() {
        let unit = render_unit(
            Path::new("/usr/bin/dsw"),
            9090,
            "/usr/bin:/bin",
            Path::new("/home/alice"),
        );
        assert!(unit.contains("ExecStart=/usr/bin/dsw serve --port 9090\n"));
        assert!(unit.contains("Restart=on-failure\n"));
        assert!(unit.contains("Environment=\"PATH=/usr/bin:/bin\"\n"));
        assert!(unit.contains("Environment=\"HOME=/home/alice\"\n"));
        assert!(unit.ends_with("WantedBy=default.target\n"));
    }

    #[test]
    fn unit_path_is_under_user_systemd_dir() {
        let installer = BootInstaller::new(PathBuf::from("/home/alice"));
        assert_eq!(
            installer.unit_path,
            Path::new("/home/alice/.config/systemd/user/dsw.service")
        );
    }

    #[test]
    fn disable_without_unit_reports_not_configured() {
        let dir = TempDir::new().unwrap();
        let installer = BootInstaller::new(dir.path().to_path_buf());
        let err = installer.disable().unwrap_err();
        assert_eq!(err.to_string(), "boot is not configured");
    }

    #[test]
    fn write_unit_creates_systemd_dirs() {
        let dir = TempDir::new().unwrap();
        let installer = BootInstaller::new(dir.path().to_path_buf());
        installer.write_unit(Path::new("/opt/dsw"), 8080).unwrap();

        assert!(installer.is_configured());
        let unit = std::fs::read_to_string(&installer.unit_path).unwrap();
        assert!(unit.contains("ExecStart=/opt/dsw serve --port 8080"));
    }
}
