/// Subcommand handlers.
///
/// Each handler resolves paths from the config and CLI overrides, runs one
/// pipeline stage, and returns an [`Outcome`] for `main` to print. Errors are
/// returned as display-ready strings.
use crate::aggregate::{self, BatchOptions};
use crate::config::{FamilyConfig, OnError, ReportConfig};
use crate::pivot;
use crate::prompt::Prompter;
use crate::report;
use crate::scan::{self, ParsedReport};
use crate::select;
use std::path::{Path, PathBuf};

/// What a command did, for the user-facing message.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Summary {
        path: PathBuf,
        records: usize,
        /// Unreadable logs left out under `--keep-going`, with the reason.
        skipped: Vec<(PathBuf, String)>,
    },
    Detail {
        path: PathBuf,
    },
    Field {
        field: String,
        path: PathBuf,
    },
    Fields(Vec<String>),
    /// The report to read does not exist. Not a failure.
    MissingInput(PathBuf),
    /// The report exists but holds no program blocks.
    NoResults(PathBuf),
    Initialized {
        path: PathBuf,
        created: bool,
    },
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Summary {
                path,
                records,
                skipped,
            } => {
                write!(f, "Summary of {records} log(s) written to {}", path.display())?;
                if !skipped.is_empty() {
                    write!(f, "\nSkipped {} unreadable log(s):", skipped.len())?;
                    for (path, reason) in skipped {
                        write!(f, "\n  {}: {reason}", path.display())?;
                    }
                }
                Ok(())
            }
            Outcome::Detail { path } => write!(f, "Detail report written to {}", path.display()),
            Outcome::Field { field, path } => {
                write!(f, "Data for '{field}' has been written to '{}'.", path.display())
            }
            Outcome::Fields(fields) => {
                write!(f, "Available fields:")?;
                for (i, field) in fields.iter().enumerate() {
                    write!(f, "\n{}. {field}", i + 1)?;
                }
                Ok(())
            }
            Outcome::MissingInput(path) => {
                write!(f, "The file '{}' does not exist; nothing to do.", path.display())
            }
            Outcome::NoResults(path) => {
                write!(f, "No results found in the input file '{}'.", path.display())
            }
            Outcome::Initialized { path, created: true } => {
                write!(f, "Wrote default config to {}", path.display())
            }
            Outcome::Initialized {
                path,
                created: false,
            } => write!(f, "Config {} already exists, left unchanged", path.display()),
        }
    }
}

/// CLI overrides for the `summary` command.
#[derive(Debug, Default)]
pub struct SummaryOptions {
    pub logs: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub keep_going: bool,
    pub unsorted: bool,
}

/// Look up the named family, or ask the user to pick one.
pub fn resolve_family<'c>(
    config: &'c ReportConfig,
    name: Option<&str>,
    prompter: &mut dyn Prompter,
) -> Result<&'c FamilyConfig, String> {
    if let Some(name) = name {
        return config.family(name).ok_or_else(|| {
            format!(
                "unknown family '{name}'; configured families: {}",
                config.family_names().join(", ")
            )
        });
    }

    let names = config.family_names();
    let choice = prompter
        .choose("Select the result source:", &names)
        .map_err(|e| format!("no family selected: {e}"))?;
    Ok(&config.families[choice])
}

/// Handle the `summary` subcommand: logs directory -> flat summary report.
pub fn handle_summary(
    config: &ReportConfig,
    family: &FamilyConfig,
    opts: &SummaryOptions,
) -> Result<Outcome, String> {
    let schema = family
        .schema()
        .map_err(|e| format!("invalid schema for family '{}': {e}", family.name))?;
    let logs = opts.logs.clone().unwrap_or_else(|| family.logs.clone());
    let output = opts
        .output
        .clone()
        .unwrap_or_else(|| config.output.summary_path(&family.name));

    let options = BatchOptions {
        sort_by_name: config.batch.sort_by_name && !opts.unsorted,
        on_error: if opts.keep_going {
            OnError::Skip
        } else {
            config.batch.on_error
        },
    };

    tracing::info!(family = %family.name, logs = %logs.display(), "collecting metrics");
    let batch = aggregate::collect(&logs, &schema, options).map_err(|e| e.to_string())?;
    report::write_summary(&output, &batch.records).map_err(|e| e.to_string())?;
    tracing::info!(records = batch.records.len(), path = %output.display(), "summary written");

    Ok(Outcome::Summary {
        path: output,
        records: batch.records.len(),
        skipped: batch
            .failures
            .into_iter()
            .map(|f| (f.path, f.error.to_string()))
            .collect(),
    })
}

/// Handle the `detail` subcommand: flat summary -> per-metric detail report.
pub fn handle_detail(
    config: &ReportConfig,
    family: &FamilyConfig,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<Outcome, String> {
    let schema = family
        .schema()
        .map_err(|e| format!("invalid schema for family '{}': {e}", family.name))?;
    let input = input.unwrap_or_else(|| config.output.summary_path(&family.name));
    let Some(parsed) = read_parsed(&input)? else {
        return Ok(Outcome::MissingInput(input));
    };

    let detail = pivot::pivot(&parsed, &schema);
    let output = output.unwrap_or_else(|| config.output.detail_path(&family.name));
    pivot::write_detail(&output, &detail).map_err(|e| e.to_string())?;
    tracing::info!(programs = parsed.programs().len(), path = %output.display(), "detail written");

    Ok(Outcome::Detail { path: output })
}

/// Handle the `select` subcommand: flat summary -> single-field report.
///
/// With `field` unset the user picks from the discovered fields.
pub fn handle_select(
    input: &Path,
    field: Option<&str>,
    output_dir: &Path,
    prompter: &mut dyn Prompter,
) -> Result<Outcome, String> {
    let Some(parsed) = read_parsed(input)? else {
        return Ok(Outcome::MissingInput(input.to_path_buf()));
    };
    if parsed.is_empty() {
        return Ok(Outcome::NoResults(input.to_path_buf()));
    }

    let fields = select::discover_fields(&parsed);
    let field = match field {
        Some(f) if fields.iter().any(|known| known == f) => f.to_string(),
        Some(f) => {
            return Err(format!(
                "field '{f}' does not appear in {}; available fields: {}",
                input.display(),
                fields.join(", ")
            ))
        }
        None => {
            let choice = prompter
                .choose("Available fields:", &fields)
                .map_err(|e| format!("no field selected: {e}"))?;
            fields[choice].clone()
        }
    };

    let report = select::select_field(&parsed, &field);
    let path = select::write_field(output_dir, &report).map_err(|e| e.to_string())?;
    Ok(Outcome::Field { field, path })
}

/// Handle the `fields` subcommand: list the fields a summary contains.
pub fn handle_fields(input: &Path) -> Result<Outcome, String> {
    let Some(parsed) = read_parsed(input)? else {
        return Ok(Outcome::MissingInput(input.to_path_buf()));
    };
    if parsed.is_empty() {
        return Ok(Outcome::NoResults(input.to_path_buf()));
    }
    Ok(Outcome::Fields(select::discover_fields(&parsed)))
}

/// Handle the `init` subcommand: write a default config if none exists.
pub fn handle_init(path: &Path) -> Result<Outcome, String> {
    if path.exists() {
        return Ok(Outcome::Initialized {
            path: path.to_path_buf(),
            created: false,
        });
    }
    report::write_report(path, ReportConfig::DEFAULT_CONFIG).map_err(|e| e.to_string())?;
    Ok(Outcome::Initialized {
        path: path.to_path_buf(),
        created: true,
    })
}

/// Read and scan a summary report; `None` if the file does not exist.
fn read_parsed(path: &Path) -> Result<Option<ParsedReport>, String> {
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "input report not found");
        return Ok(None);
    }
    let bytes = std::fs::read(path)
        .map_err(|e| format!("failed to read report {}: {e}", path.display()))?;
    Ok(Some(scan::parse_report(&String::from_utf8_lossy(&bytes))))
}
