mod commands;
mod project;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use webflow_cloud::CancellationToken;

#[derive(Parser)]
#[command(name = "webflow")]
#[command(about = "Declarative management of Webflow sites", long_about = None)]
struct Cli {
    /// Webflow API token
    #[arg(long, env = "WEBFLOW_API_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Override the API endpoint (e.g. a staging proxy)
    #[arg(long, env = "WEBFLOW_API_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Desired-state file
    #[arg(short, long, default_value = "webflow.json", global = true)]
    file: PathBuf,

    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the API token
    Auth,
    /// Show what apply would change
    Plan {
        /// Re-read recorded resources from Webflow first
        #[arg(long)]
        refresh: bool,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Bring Webflow in line with the desired-state file
    Apply {
        /// Simulate without calling the API or saving state
        #[arg(long)]
        dry_run: bool,
        /// Re-read recorded resources from Webflow first
        #[arg(long)]
        refresh: bool,
        /// Skip the confirmation gate
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete every resource recorded in state
    Destroy {
        /// Simulate without calling the API or saving state
        #[arg(long)]
        dry_run: bool,
        /// Skip the confirmation gate
        #[arg(short, long)]
        yes: bool,
    },
    /// Re-read recorded resources and drop the ones deleted remotely
    Refresh,
    /// Show version information
    Version,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Cancel `token` on Ctrl-C so in-flight requests and retry waits stop
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Interrupted, stopping after the current request...".yellow());
            token.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if matches!(cli.command, Commands::Version) {
        println!("webflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let project = project::Project::open(
        &cli.file,
        cli.token.as_deref(),
        cli.base_url.as_deref(),
    )?;

    match cli.command {
        Commands::Auth => commands::auth::handle(&project, &cancel).await,
        Commands::Plan { refresh, json } => {
            commands::plan::handle(&project, refresh, json, &cancel).await
        }
        Commands::Apply {
            dry_run,
            refresh,
            yes,
        } => commands::apply::handle(&project, dry_run, refresh, yes, &cancel).await,
        Commands::Destroy { dry_run, yes } => {
            commands::destroy::handle(&project, dry_run, yes, &cancel).await
        }
        Commands::Refresh => commands::refresh::handle(&project, &cancel).await,
        Commands::Version => Ok(()),
    }
}
