/// Flat summary report: one block per log file.
///
/// ```text
/// qsort_small:
/// Instruction Count: 12345
/// Cycle Count: 6789
/// Icache miss rate: N/A
///
/// ```
///
/// This is the interchange format read back by [`crate::scan`].
use crate::extract::Record;
use crate::scan;
use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Render records as a flat summary, blocks in input order.
pub fn render_summary(records: &[Record]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&header_title(&record.title));
        out.push_str(":\n");
        for (name, value) in &record.values {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value.as_str());
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Block header for `title`. Titles the scanner would misread (colons,
/// surrounding whitespace, empty) are rewritten so their fields can never
/// land in another program's block.
fn header_title(title: &str) -> Cow<'_, str> {
    if scan::is_program_name(title) {
        return Cow::Borrowed(title);
    }
    let cleaned = title.replace(':', "_");
    let cleaned = match cleaned.trim() {
        "" => "_".to_string(),
        t => t.to_string(),
    };
    tracing::warn!(title = %title, header = %cleaned, "title rewritten for the summary header");
    Cow::Owned(cleaned)
}

pub fn write_summary(path: &Path, records: &[Record]) -> Result<(), ReportError> {
    write_report(path, &render_summary(records))
}

#[derive(Debug)]
pub enum ReportError {
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::CreateDir { path, source } => {
                write!(f, "failed to create output directory {}: {source}", path.display())
            }
            ReportError::Write { path, source } => {
                write!(f, "failed to write temp report in {}: {source}", path.display())
            }
            ReportError::Persist { path, source } => {
                write!(f, "failed to move report into place at {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::CreateDir { source, .. } => Some(source),
            ReportError::Write { source, .. } => Some(source),
            ReportError::Persist { source, .. } => Some(source),
        }
    }
}

/// Atomically write a report, creating its parent directory if needed.
///
/// The text goes to a temp file in the destination directory which is then
/// renamed over `path`, so readers never see a partial report.
pub fn write_report(path: &Path, contents: &str) -> Result<(), ReportError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    if !dir.exists() {
        tracing::info!(dir = %dir.display(), "output directory does not exist, creating it");
        std::fs::create_dir_all(dir).map_err(|e| ReportError::CreateDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }

    let write_err = |e: std::io::Error| ReportError::Write {
        path: dir.to_path_buf(),
        source: e,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;

    tmp.persist(path).map_err(|e| ReportError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    tracing::debug!(path = %path.display(), bytes = contents.len(), "report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{extract_record, MetricValue};
    use crate::schema::Schema;
    use tempfile::TempDir;

    fn record(title: &str, values: &[(&str, Option<&str>)]) -> Record {
        Record {
            title: title.to_string(),
            values: values
                .iter()
                .map(|(n, v)| {
                    let value = match v {
                        Some(v) => MetricValue::Found(v.to_string()),
                        None => MetricValue::Missing,
                    };
                    (n.to_string(), value)
                })
                .collect(),
        }
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(render_summary(&[]), "");
    }

    #[test]
    fn block_layout() {
        let records = vec![
            record("a", &[("Instruction Count", Some("100")), ("Cycle Count", None)]),
            record("b", &[("Instruction Count", Some("7")), ("Cycle Count", Some("9"))]),
        ];
        assert_eq!(
            render_summary(&records),
            "a:\nInstruction Count: 100\nCycle Count: N/A\n\n\
             b:\nInstruction Count: 7\nCycle Count: 9\n\n"
        );
    }

    #[test]
    fn fields_follow_schema_order() {
        let rec = extract_record("x", "Cycle Count: 3\nInstruction Count: 4\n", &Schema::base());
        let text = render_summary(&[rec]);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "x:");
        assert_eq!(lines[1], "Instruction Count: 4");
        assert_eq!(lines[2], "Cycle Count: 3");
        assert_eq!(lines[3], "Icache miss rate: N/A");
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[6], "");
    }

    #[test]
    fn awkward_titles_keep_blocks_separate() {
        let records = vec![
            record("a", &[("Cycle Count", Some("50"))]),
            record("b c", &[("Cycle Count", Some("888"))]),
            record("x:y", &[("Cycle Count", Some("7"))]),
            record("  ", &[("Cycle Count", Some("3"))]),
        ];
        let text = render_summary(&records);
        assert!(text.contains("b c:\nCycle Count: 888\n"));
        assert!(text.contains("x_y:\nCycle Count: 7\n"));
        assert!(text.contains("_:\nCycle Count: 3\n"));

        let parsed = scan::parse_report(&text);
        let names: Vec<_> = parsed.programs().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b c", "x_y", "_"]);
        assert_eq!(parsed.programs()[0].get("Cycle Count"), Some("50"));
    }

    #[test]
    fn write_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results_summary").join("mibench_summary");
        let records = vec![record("a", &[("Cycle Count", Some("1"))])];
        write_summary(&path, &records).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "a:\nCycle Count: 1\n\n"
        );
    }

    #[test]
    fn write_replaces_existing_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary");
        std::fs::write(&path, "stale contents").unwrap();
        write_report(&path, "fresh\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\n");

        // Only the report itself is left behind.
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn write_into_file_path_parent_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let err = write_report(&blocker.join("report"), "x").unwrap_err();
        assert!(matches!(err, ReportError::CreateDir { .. } | ReportError::Write { .. }));
    }
}
