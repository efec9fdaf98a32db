//! Clinic back-office CLI.
//!
//! The `clinic` command logs in against the clinic's identity provider, talks
//! to the assistant, lists records from the REST backend and manages
//! `clinic.json` configuration files.

use anyhow::Result;
use clap::{Parser, Subcommand};
use clinic_async::types::reservation::DEFAULT_BOOKING_DAYS;
use clinic_config::types::LoggingConfig;
use tracing_subscriber::EnvFilter;

mod commands;
mod context;

use context::AppContext;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic back-office CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in; without arguments prints the authorization URL
    Login {
        /// Authorization code from the redirect
        #[arg(long, requires = "state")]
        code: Option<String>,

        /// State from the redirect
        #[arg(long, requires = "code")]
        state: Option<String>,
    },

    /// Log out and print the end-session URL
    Logout,

    /// Show the current session
    Whoami,

    /// Check the chat service
    Health,

    /// Talk to the assistant
    Chat(commands::chat::ChatArgs),

    /// List records
    List {
        /// Collection to list
        #[arg(value_enum)]
        resource: commands::records::Resource,

        /// Keep records matching this text (case-insensitive)
        #[arg(long)]
        search: Option<String>,
    },

    /// Statistics and upcoming appointments
    Dashboard,

    /// Bookable appointment slots
    Slots {
        /// Days ahead, starting tomorrow
        #[arg(long, default_value_t = DEFAULT_BOOKING_DAYS)]
        days: u32,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommands,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Config commands must work even when clinic.json is broken
        Commands::Config { command } => {
            init_tracing(cli.verbose, &LoggingConfig::default());
            commands::config::execute(command)
        }
        command => {
            let loaded = clinic_config::load_merged(&std::env::current_dir()?)?;
            init_tracing(cli.verbose, &loaded.config.logging);
            for warning in &loaded.warnings {
                tracing::warn!("{warning}");
            }
            run(command, &AppContext::new(loaded.config)).await
        }
    }
}

async fn run(command: Commands, ctx: &AppContext) -> Result<()> {
    match command {
        Commands::Login { code, state } => commands::auth::login(ctx, code, state).await,
        Commands::Logout => commands::auth::logout(ctx).await,
        Commands::Whoami => commands::auth::whoami(ctx).await,
        Commands::Health => commands::chat::health(ctx).await,
        Commands::Chat(args) => commands::chat::execute(ctx, args).await,
        Commands::List { resource, search } => {
            commands::records::list(ctx, resource, search.as_deref()).await
        }
        Commands::Dashboard => commands::records::dashboard(ctx).await,
        Commands::Slots { days } => {
            commands::records::slots(days);
            Ok(())
        }
        Commands::Config { command } => commands::config::execute(command),
    }
}

/// Level precedence: `-v` count, then `RUST_LOG`, then `logging.level`.
fn init_tracing(verbose: u8, logging: &LoggingConfig) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level)),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
