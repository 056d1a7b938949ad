mod commands;
mod utils;

use anyhow::Context;
use cdnflow_cloud::StateManager;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cdnflow")]
#[command(about = "Provision CDN distributions without losing track of them", long_about = None)]
struct Cli {
    /// Directory holding `.cdnflow/state.json` (defaults to the current directory)
    #[arg(long, global = true, env = "CDNFLOW_ROOT")]
    root: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a distribution and wait until it is active
    Create {
        /// Resource address in the state file
        name: String,
        /// Project to create the distribution in
        #[arg(short, long, env = "CDN_PROJECT")]
        project: Option<String>,
        /// Desired configuration (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the create timeout from settings
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Refresh a tracked distribution from the API
    Read {
        /// Resource address in the state file
        name: String,
        /// Override the read timeout from settings
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Apply a new configuration and wait until it is active again
    Update {
        /// Resource address in the state file
        name: String,
        /// Desired configuration (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,
        /// Override the update timeout from settings
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Delete a tracked distribution
    Delete {
        /// Resource address in the state file
        name: String,
    },
    /// Start tracking an existing distribution
    Import {
        /// Resource address in the state file
        name: String,
        /// Combined id: `<project>,<distribution>`
        id: String,
        /// Override the read timeout from settings
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Show tracked distributions
    Show {
        /// Resource address (all when omitted)
        name: Option<String>,
    },
    /// Show version information
    Version,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Version needs neither settings nor state
    if matches!(cli.command, Commands::Version) {
        println!("cdnflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };
    let manager = StateManager::new(&root);

    if let Commands::Show { name } = &cli.command {
        return commands::show::handle(&manager, name.as_deref()).await;
    }

    let settings = utils::load_settings()?;
    let controller = utils::build_controller(&settings)?;

    let lock = manager
        .acquire_lock()
        .await
        .context("Failed to lock state")?;

    let result = match cli.command {
        Commands::Create {
            name,
            project,
            config,
            timeout_secs,
        } => {
            commands::create::handle(
                &controller,
                &settings,
                &manager,
                &name,
                project,
                config.as_deref(),
                timeout_secs,
            )
            .await
        }
        Commands::Read { name, timeout_secs } => {
            commands::read::handle(&controller, &settings, &manager, &name, timeout_secs).await
        }
        Commands::Update {
            name,
            config,
            timeout_secs,
        } => {
            commands::update::handle(
                &controller,
                &settings,
                &manager,
                &name,
                &config,
                timeout_secs,
            )
            .await
        }
        Commands::Delete { name } => commands::delete::handle(&controller, &manager, &name).await,
        Commands::Import {
            name,
            id,
            timeout_secs,
        } => {
            commands::import::handle(&controller, &settings, &manager, &name, &id, timeout_secs)
                .await
        }
        Commands::Show { .. } | Commands::Version => Ok(Default::default()),
    };

    let released = lock.release().await;

    let diags = result?;
    utils::print_diagnostics(&diags);
    released.context("Failed to release state lock")?;
    if diags.has_error() {
        std::process::exit(1);
    }

    Ok(())
}
