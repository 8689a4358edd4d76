/// Metric extraction from the raw text of one simulator log.
///
/// Extraction never fails: a metric whose label is absent, or whose label is
/// not followed by a well-formed value, is recorded as [`MetricValue::Missing`].
use crate::schema::{MetricDef, Schema};

/// Sentinel written for metrics that were not found in a log.
pub const NOT_FOUND: &str = "N/A";

/// A single extracted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricValue {
    Found(String),
    Missing,
}

impl MetricValue {
    pub fn as_str(&self) -> &str {
        match self {
            MetricValue::Found(v) => v,
            MetricValue::Missing => NOT_FOUND,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, MetricValue::Found(_))
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics extracted from one log file, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub title: String,
    pub values: Vec<(String, MetricValue)>,
}

impl Record {
    #[allow(dead_code)]
    pub fn get(&self, metric: &str) -> Option<&MetricValue> {
        self.values
            .iter()
            .find(|(name, _)| name == metric)
            .map(|(_, value)| value)
    }
}

/// Extract every schema metric from `text`.
///
/// The result has exactly one entry per schema metric, in schema order.
pub fn extract(text: &str, schema: &Schema) -> Vec<(String, MetricValue)> {
    schema
        .metrics()
        .iter()
        .map(|def| {
            let value = match find_metric(text, def) {
                Some(captured) => MetricValue::Found(def.display_value(captured)),
                None => MetricValue::Missing,
            };
            (def.name.clone(), value)
        })
        .collect()
}

pub fn extract_record(title: &str, text: &str, schema: &Schema) -> Record {
    Record {
        title: title.to_string(),
        values: extract(text, schema),
    }
}

/// Locate the first occurrence of a metric's value.
///
/// Without an anchor the label is searched across the whole text. With an
/// anchor, each anchor occurrence is tried in order and the label must start
/// within `def.window` bytes after it. First match wins.
fn find_metric<'t>(text: &'t str, def: &MetricDef) -> Option<&'t str> {
    let Some(anchor) = def.anchor.as_deref() else {
        return find_labeled_in(text, 0, text.len(), def);
    };

    for (start, _) in text.match_indices(anchor) {
        let from = start + anchor.len();
        let to = window_end(text, from, def.window);
        if let Some(value) = find_labeled_in(text, from, to, def) {
            return Some(value);
        }
    }
    None
}

/// Scan `text[from..to]` for the label; the value may run past `to`.
fn find_labeled_in<'t>(text: &'t str, from: usize, to: usize, def: &MetricDef) -> Option<&'t str> {
    let region = &text[from..to];
    for (offset, _) in region.match_indices(def.label.as_str()) {
        let value_start = from + offset + def.label.len();
        if let Some(value) = def.match_value(&text[value_start..]) {
            return Some(value);
        }
    }
    None
}

fn window_end(text: &str, from: usize, window: usize) -> usize {
    let mut end = from.saturating_add(window).min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    end
}
