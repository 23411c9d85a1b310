//! CLI entry point for the pool keeper.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use poolbook_keeper::config::Config;
use poolbook_keeper::error::Error;
use poolbook_keeper::script::Script;
use poolbook_keeper::session::{self, RunOptions};

#[derive(Parser)]
#[command(name = "keeper")]
#[command(about = "Pool keeper: scripted poolbook operations with an audit trail")]
#[command(version)]
struct Cli {
    /// Path to keeper.toml
    #[arg(long, default_value = "keeper.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show configured holdings and their allocation sum
    Holdings,

    /// Apply a script of operations to a freshly built pool
    Run {
        /// Path to script.json
        script: PathBuf,

        /// Save the pool's event log here after the run
        #[arg(long)]
        events: Option<PathBuf>,

        /// Show outcomes without writing the audit trail or event log
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt (for automation/cron)
        #[arg(long)]
        force: bool,
    },

    /// Rebuild a pool from a saved event log
    Replay {
        /// Path to events.jsonl
        events: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Holdings => session::holdings(&config),
        Command::Run {
            script,
            events,
            dry_run,
            force,
        } => {
            let loaded = match Script::load(&script) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error loading script: {e}");
                    process::exit(1);
                }
            };
            let opts = RunOptions {
                dry_run,
                force,
                script_file: script.display().to_string(),
                events_out: events,
            };
            session::run(&config, &loaded, &opts).map(|_| ())
        }
        Command::Replay { events } => session::replay(&config, &events).map(|_| ()),
    };

    if let Err(e) = result {
        match &e {
            Error::Aborted(msg) => {
                eprintln!("Aborted: {msg}");
                process::exit(0);
            }
            Error::Pool(_) => {
                eprintln!("Error: {e}");
                process::exit(2);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}
