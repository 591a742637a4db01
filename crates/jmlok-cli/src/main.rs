//! JMLOK
//!
//! Command-line interface for classifying JML nonconformances.

mod commands;
mod render;

use clap::{Args, Parser, Subcommand};
use jmlok_source::CompilerKind;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "jmlok")]
#[command(about = "Likely-cause classification of JML nonconformances", long_about = None)]
struct Cli {
    /// Log resolution steps (`RUST_LOG` overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assign a likely cause to every nonconformance of a JSON batch
    Classify {
        /// JSON array of nonconformance records
        batch: PathBuf,
        #[command(flatten)]
        project: ProjectArgs,
        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Emit report entries instead of full records
        #[arg(long)]
        report: bool,
    },
    /// Parse a Java file and summarize its classes and contracts
    Parse {
        /// Source file to parse
        file: PathBuf,
    },
    /// Print the declarations of a method
    Show {
        /// Fully-qualified class name, e.g. `bank.Account`
        class: String,
        /// Method name; the simple class name selects constructors
        method: String,
        #[command(flatten)]
        project: ProjectArgs,
    },
}

/// Location of the analyzed project. Flags override the configuration file.
#[derive(Args, Debug, Default)]
struct ProjectArgs {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Root of the `.java` sources
    #[arg(long)]
    source_root: Option<PathBuf>,
    /// Root of separate specification files
    #[arg(long)]
    spec_root: Option<PathBuf>,
    /// Directory of the generated tests
    #[arg(long)]
    test_dir: Option<PathBuf>,
    /// Contract-aware compiler of the project: jmlc or openjml
    #[arg(long)]
    compiler: Option<CompilerKind>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Classify { batch, project, output, report } => {
            commands::classify(&batch, &project, output.as_deref(), report)
        }
        Commands::Parse { file } => commands::parse_file(&file),
        Commands::Show { class, method, project } => commands::show(&class, &method, &project),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}
