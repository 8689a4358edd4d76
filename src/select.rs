/// Single-field reports: one chosen field across every program.
use crate::extract::NOT_FOUND;
use crate::report::{write_report, ReportError};
use crate::scan::ParsedReport;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// One field's value for each program, in report order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReport {
    pub field: String,
    pub rows: Vec<(String, String)>,
}

/// Every field name that appears in any block, deduplicated and sorted.
pub fn discover_fields(parsed: &ParsedReport) -> Vec<String> {
    let fields: BTreeSet<&str> = parsed
        .programs()
        .iter()
        .flat_map(|p| p.fields.iter().map(|(name, _)| name.as_str()))
        .collect();
    fields.into_iter().map(str::to_string).collect()
}

/// Pull `field` out of every program; programs without it get `N/A`.
pub fn select_field(parsed: &ParsedReport, field: &str) -> FieldReport {
    let rows = parsed
        .programs()
        .iter()
        .map(|p| {
            let value = p.get(field).unwrap_or(NOT_FOUND);
            (p.name.clone(), value.to_string())
        })
        .collect();
    FieldReport {
        field: field.to_string(),
        rows,
    }
}

pub fn render_field(report: &FieldReport) -> String {
    let mut out = format!("----- {} Result -----\n", report.field);
    for (program, value) in &report.rows {
        out.push_str(&format!("{program}: {value}\n"));
    }
    out
}

/// File name for a field report: spaces and path separators become `_`.
pub fn field_file_name(field: &str) -> String {
    let stem: String = field
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    format!("{stem}.txt")
}

/// Write the report into `dir` and return the path written.
pub fn write_field(dir: &Path, report: &FieldReport) -> Result<PathBuf, ReportError> {
    let path = dir.join(field_file_name(&report.field));
    write_report(&path, &render_field(report))?;
    Ok(path)
}
