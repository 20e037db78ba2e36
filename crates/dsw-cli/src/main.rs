mod cmd;

use clap::{Parser, Subcommand};
use cmd::boot::BootSubcommand;
use dsw_core::paths::DswPaths;
use std::io::IsTerminal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "dsw",
    about = "Do Something When: register shell commands and trigger them over HTTP",
    version,
    propagate_version = true
)]
struct Cli {
    /// dsw home directory (default: ~/.dsw)
    #[arg(long, global = true, env = "DSW_HOME")]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an action, or import several from a YAML file
    Create {
        /// Action name (letters, numbers, dash, underscore)
        #[arg(required_unless_present = "file")]
        name: Option<String>,

        /// Command line to run, quoted as one argument
        #[arg(required_unless_present = "file")]
        command: Option<String>,

        /// YAML file with an `actions:` mapping to import
        #[arg(short = 'f', long = "file", conflicts_with_all = ["name", "command"])]
        file: Option<PathBuf>,
    },

    /// Start the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = dsw_server::DEFAULT_PORT)]
        port: u16,

        /// Run in the background and record the PID
        #[arg(short, long)]
        daemon: bool,
    },

    /// Stop the background server
    Stop,

    /// Show whether the background server is running
    Status,

    /// Install or remove the systemd user service
    Boot {
        #[command(subcommand)]
        subcommand: BootSubcommand,
    },

    /// Show version
    Version,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    let result = DswPaths::resolve(cli.home.as_deref())
        .map_err(anyhow::Error::from)
        .and_then(|paths| match cli.command {
            Commands::Create {
                name,
                command,
                file,
            } => match file {
                Some(file) => cmd::create::run_batch(&paths, &file),
                None => cmd::create::run_single(
                    &paths,
                    name.as_deref().unwrap_or_default(),
                    command.as_deref().unwrap_or_default(),
                ),
            },
            Commands::Serve { port, daemon } => cmd::serve::run(&paths, port, daemon),
            Commands::Stop => cmd::stop::run(&paths),
            Commands::Status => cmd::status::run(&paths),
            Commands::Boot { subcommand } => cmd::boot::run(subcommand),
            Commands::Version => {
                println!("v{}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
