use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::eyre;
use commands::{clear, config, serve, status, sync};
use std::path::PathBuf;

mod api;
mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "ratingbridge")]
#[command(about = "ratingbridge - Copy your Trakt movie ratings to Douban")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync pass now
    #[command(long_about = "Fetch the Trakt movie ratings, mark every matched Douban subject as watched with the converted star rating, and record the results so unchanged titles are skipped next time.")]
    Sync,
    /// Run the scheduler and the HTTP trigger
    #[command(long_about = "Run in the foreground: syncs on the configured cron schedule and serves GET|POST /sync (manual trigger), GET /form and GET /state.")]
    Serve {
        /// Crontab expression overriding the configured one (e.g. '0 2 * * *')
        #[arg(long, value_name = "SCHEDULE")]
        cron: Option<String>,

        /// Address to listen on (default from config, 127.0.0.1:3011)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,

        /// Run a sync immediately after startup
        #[arg(long, action = ArgAction::SetTrue)]
        run_on_startup: bool,

        /// Write logs to a daily-rotated file instead of stderr (default: data dir)
        #[arg(long, value_name = "PATH", num_args = 0..=1)]
        log_file: Option<Option<PathBuf>>,
    },
    /// Show synced titles and pending retries
    Status {
        /// List titles waiting for retry instead of synced ones
        #[arg(long, action = ArgAction::SetTrue)]
        pending: bool,
    },
    /// Forget persisted sync state
    #[command(long_about = "Remove persisted sync state. --synced forgets which titles were written (they are re-submitted next pass), --pending drops the retry queue, --all does both.")]
    Clear {
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,

        #[arg(long, action = ArgAction::SetTrue)]
        synced: bool,

        #[arg(long, action = ArgAction::SetTrue)]
        pending: bool,
    },
    /// View or edit configuration
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (masks sensitive data)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Interactive configuration wizard
    Init,
    /// Set the Douban cookie (hidden prompt) or point at a cookie file
    Cookie {
        /// Read the cookie from this file at every sync instead
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// Print the settings form description and defaults
    Form,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Serve { log_file: Some(path), .. } => Some(
            path.clone()
                .unwrap_or_else(|| rating_sync_config::PathManager::default().daemon_log_file()),
        ),
        _ => None,
    };
    match log_file {
        Some(path) => logging::init_logging_with_file(cli.verbose, cli.quiet, Some(path)),
        None => logging::init_logging(cli.verbose, cli.quiet),
    }
    .map_err(|e| eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Sync => sync::run_sync(&output).await,
        Commands::Serve {
            cron,
            bind,
            run_on_startup,
            ..
        } => serve::run_serve(cron, bind, run_on_startup, &output).await,
        Commands::Status { pending } => status::run_status(pending, &output).await,
        Commands::Clear { all, synced, pending } => clear::run_clear(all, synced, pending, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(cmd, &output).await
        }
    }
}
