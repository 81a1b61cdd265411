mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use snapdiff::config::{self, ConfigInput};
use snapdiff::constants::CONFIG_FILENAME;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(long, default_value = CONFIG_FILENAME, global = true)]
    config_file: PathBuf,

    /// Enable verbose output (info level)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress all non-essential output (error level only)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Enable debug output (debug level)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Snapshot the migration starts from
    #[arg(long)]
    prev: PathBuf,

    /// Snapshot the migration should produce
    #[arg(long)]
    cur: PathBuf,

    /// Migration file to write
    #[arg(long)]
    out: Option<String>,

    /// Write the current snapshot, chained after `--prev` and with renames recorded
    #[arg(long)]
    snapshot_out: Option<PathBuf>,

    /// Declare a rename instead of being asked: `column:users.name=users.full_name`
    #[arg(long = "rename", value_name = "CATEGORY:FROM=TO")]
    renames: Vec<String>,

    /// Never prompt; anything not declared with --rename is a create plus a drop
    #[arg(long)]
    no_interactive: bool,

    #[command(flatten)]
    output_args: config::OutputArgs,
}

#[derive(Parser, Debug)]
struct PushArgs {
    /// Snapshot of the database as it is now
    #[arg(long)]
    live: PathBuf,

    /// Snapshot of the schema the database should have
    #[arg(long)]
    schema: PathBuf,

    /// Apply without asking, even when data would be lost
    #[arg(long, group = "mode")]
    force: bool,

    /// Print the statements and warnings without touching the database
    #[arg(long, group = "mode")]
    dry_run: bool,

    /// Ask for approval before every push, not only destructive ones
    #[arg(long)]
    strict: bool,

    #[command(flatten)]
    database_args: config::DatabaseArgs,

    #[command(flatten)]
    filter_args: config::FilterArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Diff two snapshots and write the migration SQL
    Generate(GenerateArgs),

    /// Diff a live snapshot against the declared schema and apply the changes
    Push(PushArgs),

    /// Rewrite a snapshot in its dialect's current format
    Upgrade {
        file: PathBuf,

        /// Overwrite the file instead of printing to stdout
        #[arg(long)]
        in_place: bool,
    },

    /// Check a set of snapshots for id collisions and broken chains
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    initialize_logging(&cli);

    tokio::select! {
        result = run_main(cli) => result,
        _ = wait_for_shutdown_signal() => {
            info!("Received shutdown signal, nothing was applied after this point");
            Ok(())
        }
    }
}

async fn wait_for_shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // no handler available; never resolve
        std::future::pending::<()>().await;
    }
}

fn initialize_logging(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn" // default level
    };

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level)
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_main(cli: Cli) -> Result<()> {
    let file_config = config::load_config(&cli.config_file)?;

    match cli.command {
        Commands::Generate(args) => {
            let cli_config = ConfigInput {
                out: args.out.clone(),
                ..ConfigInput::from(args.output_args.clone())
            };
            let config = config::ConfigBuilder::new()
                .with_file(file_config)
                .with_cli_args(cli_config)
                .resolve()?;

            commands::cmd_generate(
                &config,
                commands::GenerateOptions {
                    prev: args.prev,
                    cur: args.cur,
                    snapshot_out: args.snapshot_out,
                    renames: args.renames,
                    interactive: !args.no_interactive,
                },
            )
            .await
        }
        Commands::Push(args) => {
            let cli_config = ConfigInput {
                strict: args.strict.then_some(true),
                filters: Some(args.filter_args.clone().into()),
                database: Some(args.database_args.clone().into()),
                ..ConfigInput::default()
            };
            let config = config::ConfigBuilder::new()
                .with_file(file_config)
                .with_cli_args(cli_config)
                .resolve()?;

            let mode = if args.dry_run {
                commands::PushMode::DryRun
            } else if args.force {
                commands::PushMode::Force
            } else {
                commands::PushMode::Interactive
            };

            commands::cmd_push(&config, &args.live, &args.schema, mode).await
        }
        Commands::Upgrade { file, in_place } => commands::cmd_upgrade(&file, in_place),
        Commands::Check { files } => commands::cmd_check(&files),
    }
}
