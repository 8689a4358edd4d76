mod aggregate;
mod commands;
mod config;
mod extract;
mod pivot;
mod prompt;
mod report;
mod scan;
mod schema;
mod select;

use clap::{Parser, Subcommand};
use commands::{Outcome, SummaryOptions};
use config::{ReportConfig, DEFAULT_CONFIG_FILE};
use prompt::ConsolePrompter;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Extract performance metrics from simulator logs into summary reports,
/// and re-pivot summaries into per-metric and per-field reports.
#[derive(Parser, Debug)]
#[command(name = "simreport", version, about)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Extra logging (per-file extraction details)
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only warnings and errors on stderr
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract metrics from a directory of logs into a flat summary report
    Summary {
        /// Log family (prompted for when omitted)
        #[arg(short, long)]
        family: Option<String>,

        /// Log directory (overrides the family's)
        #[arg(long)]
        logs: Option<PathBuf>,

        /// Summary file to write (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip unreadable logs instead of aborting
        #[arg(long)]
        keep_going: bool,

        /// Process logs in directory order instead of by name
        #[arg(long)]
        unsorted: bool,
    },

    /// Re-group a summary report by metric
    Detail {
        /// Log family (prompted for when omitted)
        #[arg(short, long)]
        family: Option<String>,

        /// Summary file to read (overrides config)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Detail file to write (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write one field of a summary report across all programs
    Select {
        /// Log family whose summary is read (prompted for when omitted)
        #[arg(short, long)]
        family: Option<String>,

        /// Summary file to read (overrides the family's)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Field to extract (prompted for when omitted)
        #[arg(long)]
        field: Option<String>,

        /// Directory for the field report (default: summary directory)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// List the fields present in a summary report
    Fields {
        /// Log family whose summary is read (prompted for when omitted)
        #[arg(short, long)]
        family: Option<String>,

        /// Summary file to read (overrides the family's)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Write a default config file
    Init,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    tracing::debug!(?cli, "parsed CLI arguments");

    match run(cli) {
        Ok(outcome) => {
            println!("{outcome}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .init();
}

fn run(cli: Cli) -> Result<Outcome, String> {
    if matches!(cli.command, Command::Init) {
        return commands::handle_init(&cli.config);
    }

    let config = ReportConfig::load(&cli.config).map_err(|e| e.to_string())?;
    let mut prompter = ConsolePrompter::stdio();

    match cli.command {
        Command::Summary {
            family,
            logs,
            output,
            keep_going,
            unsorted,
        } => {
            let family = commands::resolve_family(&config, family.as_deref(), &mut prompter)?;
            let opts = SummaryOptions {
                logs,
                output,
                keep_going,
                unsorted,
            };
            commands::handle_summary(&config, family, &opts)
        }
        Command::Detail {
            family,
            input,
            output,
        } => {
            let family = commands::resolve_family(&config, family.as_deref(), &mut prompter)?;
            commands::handle_detail(&config, family, input, output)
        }
        Command::Select {
            family,
            input,
            field,
            output_dir,
        } => {
            let input = match input {
                Some(path) => path,
                None => {
                    let family =
                        commands::resolve_family(&config, family.as_deref(), &mut prompter)?;
                    config.output.summary_path(&family.name)
                }
            };
            let output_dir = output_dir.unwrap_or_else(|| config.output.summary_dir.clone());
            commands::handle_select(&input, field.as_deref(), &output_dir, &mut prompter)
        }
        Command::Fields { family, input } => {
            let input = match input {
                Some(path) => path,
                None => {
                    let family =
                        commands::resolve_family(&config, family.as_deref(), &mut prompter)?;
                    config.output.summary_path(&family.name)
                }
            };
            commands::handle_fields(&input)
        }
        Command::Init => commands::handle_init(&cli.config),
    }
}
