//! CLI frontend for the Folio interactive-fiction engine.

mod commands;
mod console;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "folio",
    about = "Folio: play and inspect interactive-fiction stories",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log engine activity to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a story and report diagnostics
    Check {
        /// Story file
        story: PathBuf,
    },

    /// List the pages of a story with their verbs and default values
    Pages {
        /// Story file
        story: PathBuf,
    },

    /// Run one verb and print its text
    Read {
        /// Story file
        story: PathBuf,

        /// Noun whose verb to run
        noun: String,

        /// Verb to run
        verb: String,

        /// Session file to continue from and write back to
        #[arg(short, long)]
        session: Option<PathBuf>,
    },

    /// Play a story interactively
    Play {
        /// Story file
        story: PathBuf,

        /// Session file to continue from; `save` writes here
        #[arg(short, long)]
        session: Option<PathBuf>,
    },

    /// Dump the parsed story as JSON
    Export {
        /// Story file
        story: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the snapshots and bookmarks of a session file
    History {
        /// Session file
        session: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Check { story } => commands::check::run(&story),
        Commands::Pages { story } => commands::pages::run(&story),
        Commands::Read {
            story,
            noun,
            verb,
            session,
        } => commands::read::run(&story, &noun, &verb, session.as_deref()),
        Commands::Play { story, session } => commands::play::run(&story, session.as_deref()),
        Commands::Export { story, output } => commands::export::run(&story, output.as_deref()),
        Commands::History { session } => commands::history::run(&session),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
