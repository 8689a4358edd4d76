/// Detail report: a summary re-grouped by metric, then by program.
///
/// Only metrics in the target schema get a block. Within a block a program is
/// listed only if its value is numeric; `N/A` entries are left out rather
/// than padded, unlike the flat summary.
use crate::report::{write_report, ReportError};
use crate::scan::ParsedReport;
use crate::schema::Schema;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

/// Numeric payload with an optional trailing percent sign.
static NUMERIC_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([\d.]+)%?").unwrap());

/// One block per schema metric, programs sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailReport {
    pub metrics: Vec<(String, BTreeMap<String, String>)>,
}

impl DetailReport {
    #[allow(dead_code)]
    pub fn metric(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.metrics
            .iter()
            .find(|(metric, _)| metric == name)
            .map(|(_, programs)| programs)
    }
}

/// Re-group a parsed summary by the metrics of `schema`.
pub fn pivot(parsed: &ParsedReport, schema: &Schema) -> DetailReport {
    let mut metrics: Vec<(String, BTreeMap<String, String>)> = schema
        .names()
        .map(|name| (name.to_string(), BTreeMap::new()))
        .collect();

    for program in parsed.programs() {
        for (field, value) in &program.fields {
            let Some((_, bucket)) = metrics.iter_mut().find(|(name, _)| name == field) else {
                tracing::debug!(program = %program.name, field = %field, "field not in schema, dropped");
                continue;
            };
            match numeric_payload(value) {
                Some(number) => {
                    bucket.insert(program.name.clone(), number.to_string());
                }
                None => {
                    tracing::trace!(program = %program.name, field = %field, value = %value, "no numeric value");
                }
            }
        }
    }

    DetailReport { metrics }
}

/// The number at the start of a report value, without any `%`.
fn numeric_payload(value: &str) -> Option<&str> {
    NUMERIC_VALUE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn render_detail(detail: &DetailReport) -> String {
    let mut out = String::new();
    for (metric, programs) in &detail.metrics {
        out.push_str(metric);
        out.push('\n');
        for (program, value) in programs {
            out.push_str(&format!("{program}: {value}\n"));
        }
        out.push('\n');
    }
    out
}

pub fn write_detail(path: &Path, detail: &DetailReport) -> Result<(), ReportError> {
    write_report(path, &render_detail(detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_record;
    use crate::report::render_summary;
    use crate::scan::parse_report;
    use crate::schema::{MetricDef, ValueKind};

    #[test]
    fn cpi_block_lists_only_programs_that_have_it() {
        let summary = "x:\nCycle Count: 10\nCPI: 125.0000%\n\ny:\nCycle Count: 20\nCPI: N/A\n\n";
        let detail = pivot(&parse_report(summary), &Schema::extended());

        let cpi = detail.metric("CPI").unwrap();
        assert_eq!(cpi.len(), 1);
        assert_eq!(cpi.get("x").map(String::as_str), Some("125.0000"));

        let cycles = detail.metric("Cycle Count").unwrap();
        assert_eq!(cycles.keys().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn one_block_per_schema_metric_in_order() {
        let schema = Schema::base();
        let detail = pivot(&parse_report(""), &schema);
        let names: Vec<_> = detail.metrics.iter().map(|(n, _)| n.as_str()).collect();
        let expected: Vec<_> = schema.names().collect();
        assert_eq!(names, expected);
        assert!(detail.metrics.iter().all(|(_, p)| p.is_empty()));
    }

    #[test]
    fn metrics_outside_schema_are_dropped() {
        let summary = "x:\nCycle Count: 10\nCPI: 125.0000%\n";
        let detail = pivot(&parse_report(summary), &Schema::base());
        assert!(detail.metric("CPI").is_none());
        assert_eq!(detail.metrics.len(), 5);
    }

    #[test]
    fn programs_sorted_lexicographically() {
        let summary = "zeta:\nCycle Count: 1\nalpha:\nCycle Count: 2\nMid:\nCycle Count: 3\n";
        let detail = pivot(&parse_report(summary), &Schema::base());
        let programs: Vec<_> = detail.metric("Cycle Count").unwrap().keys().cloned().collect();
        assert_eq!(programs, vec!["Mid", "alpha", "zeta"]);
    }

    #[test]
    fn render_layout() {
        let summary = "b:\nInstruction Count: 7\nIcache miss rate: 4.50%\n\na:\nInstruction Count: 3\n\n";
        let schema = Schema::new(vec![
            MetricDef::labeled("Instruction Count", "Instruction Count: ", ValueKind::Count),
            MetricDef::anchored("Icache miss rate", "L1 Icache", "miss rate: ", ValueKind::Percent),
            MetricDef::labeled("CPI", "CPI: ", ValueKind::Percent),
        ])
        .unwrap();
        let text = render_detail(&pivot(&parse_report(summary), &schema));
        assert_eq!(
            text,
            "Instruction Count\na: 3\nb: 7\n\n\
             Icache miss rate\nb: 4.50\n\n\
             CPI\n\n"
        );
    }

    #[test]
    fn numeric_payload_rules() {
        assert_eq!(numeric_payload("12345"), Some("12345"));
        assert_eq!(numeric_payload("3.2100%"), Some("3.2100"));
        assert_eq!(numeric_payload("N/A"), None);
        assert_eq!(numeric_payload(""), None);
        assert_eq!(numeric_payload("12 cycles"), Some("12"));
    }

    #[test]
    fn round_trip_through_summary() {
        let schema = Schema::base();
        let records = vec![
            extract_record("p1", "Instruction Count: 11\nCycle Count: 22\n", &schema),
            extract_record("p2_result", "Instruction Count: 33\n", &schema),
        ];
        let detail = pivot(&parse_report(&render_summary(&records)), &schema);

        let instructions = detail.metric("Instruction Count").unwrap();
        assert_eq!(instructions.get("p1").map(String::as_str), Some("11"));
        assert_eq!(instructions.get("p2").map(String::as_str), Some("33"));
        let cycles = detail.metric("Cycle Count").unwrap();
        assert_eq!(cycles.len(), 1);
        assert!(detail.metric("Icache miss rate").unwrap().is_empty());
    }

    #[test]
    fn write_detail_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results_detail").join("mibench_detail");
        let detail = pivot(&parse_report("a:\nCycle Count: 4\n"), &Schema::base());
        write_detail(&path, &detail).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("Instruction Count\n\nCycle Count\na: 4\n\n"));
    }
}
