/// Batch extraction over a directory of simulator logs.
///
/// Every regular file directly inside the directory becomes one [`Record`].
/// Subdirectories are ignored. Files are read whole and decoded lossily, so
/// logs with stray non-UTF-8 bytes still extract.
use crate::config::OnError;
use crate::extract::{extract_record, Record};
use crate::schema::Schema;
use std::path::{Path, PathBuf};

/// How a batch enumerates and reads its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Process files in file-name order instead of directory order.
    pub sort_by_name: bool,
    pub on_error: OnError,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            sort_by_name: true,
            on_error: OnError::Abort,
        }
    }
}

/// A log file that could not be read while running with [`OnError::Skip`].
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: std::io::Error,
}

/// Result of a batch run.
#[derive(Debug, Default)]
pub struct Batch {
    pub records: Vec<Record>,
    pub failures: Vec<FileFailure>,
}

#[derive(Debug)]
pub enum AggregateError {
    /// The log directory itself could not be listed.
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A log file could not be read and the batch was aborted.
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for AggregateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateError::ReadDir { path, source } => {
                write!(f, "failed to list log directory {}: {source}", path.display())
            }
            AggregateError::ReadFile { path, source } => {
                write!(f, "failed to read log file {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AggregateError::ReadDir { source, .. } => Some(source),
            AggregateError::ReadFile { source, .. } => Some(source),
        }
    }
}

/// Extract a record from every regular file in `dir`.
pub fn collect(dir: &Path, schema: &Schema, options: BatchOptions) -> Result<Batch, AggregateError> {
    let files = list_log_files(dir, options.sort_by_name)?;
    let mut batch = Batch::default();

    for path in files {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::info!(file = %file_name, "processing log");

        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) => match options.on_error {
                OnError::Abort => return Err(AggregateError::ReadFile { path, source: e }),
                OnError::Skip => {
                    tracing::warn!(error = %e, file = %path.display(), "skipping unreadable log");
                    batch.failures.push(FileFailure { path, error: e });
                    continue;
                }
            },
        };

        let text = String::from_utf8_lossy(&bytes);
        let record = extract_record(&title_for(&path), &text, schema);
        tracing::debug!(
            title = %record.title,
            found = record.values.iter().filter(|(_, v)| v.is_found()).count(),
            total = schema.len(),
            "extracted metrics"
        );
        batch.records.push(record);
    }

    Ok(batch)
}

/// Record title: the file name with its last extension removed.
pub fn title_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Regular files directly inside `dir`, symlinks to files included.
fn list_log_files(dir: &Path, sort_by_name: bool) -> Result<Vec<PathBuf>, AggregateError> {
    let entries = std::fs::read_dir(dir).map_err(|e| AggregateError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AggregateError::ReadDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }

    if sort_by_name {
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    }
    Ok(files)
}
