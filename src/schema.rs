/// Metric schema: the ordered list of metrics pulled out of every log.
///
/// Each metric is located in two phases. An optional anchor scopes the
/// search (e.g. `L1 Icache`), then the label (e.g. `miss rate: `) must show
/// up within a bounded window after it, immediately followed by the value.
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// How far past an anchor the label may appear, in bytes.
pub const DEFAULT_WINDOW: usize = 4096;

static COUNT_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\A\d+").unwrap());
static DECIMAL_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\A[\d.]+").unwrap());
static PERCENT_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\A([\d.]+)%").unwrap());

/// Shape of the numeric payload that follows a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Plain digits, e.g. `Cycle Count: 6789`.
    Count,
    /// Digits and dots, e.g. `IPC: 0.82`.
    Decimal,
    /// Digits and dots followed by `%`, e.g. `miss rate: 3.21%`.
    Percent,
}

/// One named metric and the rule that finds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDef {
    pub name: String,
    pub anchor: Option<String>,
    pub label: String,
    pub value: ValueKind,
    /// Whether a percent capture keeps its `%`. When false the `%` is
    /// matched but left out of the capture, and added back on display.
    pub captures_percent: bool,
    pub window: usize,
}

impl MetricDef {
    /// A metric located by its label alone.
    pub fn labeled(name: &str, label: &str, value: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            anchor: None,
            label: label.to_string(),
            value,
            captures_percent: true,
            window: DEFAULT_WINDOW,
        }
    }

    /// A metric whose label must follow `anchor` within the search window.
    pub fn anchored(name: &str, anchor: &str, label: &str, value: ValueKind) -> Self {
        Self {
            anchor: Some(anchor.to_string()),
            ..Self::labeled(name, label, value)
        }
    }

    pub fn without_percent_capture(mut self) -> Self {
        self.captures_percent = false;
        self
    }

    /// Match the value token at the very start of `text`.
    ///
    /// Returns the captured payload, or `None` if `text` does not begin with
    /// a value of this metric's kind.
    pub fn match_value<'t>(&self, text: &'t str) -> Option<&'t str> {
        match self.value {
            ValueKind::Count => COUNT_VALUE.find(text).map(|m| m.as_str()),
            ValueKind::Decimal => DECIMAL_VALUE.find(text).map(|m| m.as_str()),
            ValueKind::Percent => {
                let caps = PERCENT_VALUE.captures(text)?;
                if self.captures_percent {
                    caps.get(0).map(|m| m.as_str())
                } else {
                    caps.get(1).map(|m| m.as_str())
                }
            }
        }
    }

    /// Turn a captured payload into the value written to reports.
    pub fn display_value(&self, captured: &str) -> String {
        if self.value == ValueKind::Percent && !self.captures_percent {
            format!("{captured}%")
        } else {
            captured.to_string()
        }
    }
}

/// Which built-in schema a log family uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    /// Instruction, cycle and cache miss metrics only.
    Base,
    /// Base metrics plus latency breakdown and CPI.
    #[default]
    Extended,
}

/// Ordered metric definitions. Order decides field order in every report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    metrics: Vec<MetricDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    DuplicateMetric(String),
    EmptyLabel(String),
    EmptyAnchor(String),
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::DuplicateMetric(name) => write!(f, "metric '{name}' is defined twice"),
            SchemaError::EmptyLabel(name) => write!(f, "metric '{name}' has an empty label"),
            SchemaError::EmptyAnchor(name) => write!(f, "metric '{name}' has an empty anchor"),
        }
    }
}

impl std::error::Error for SchemaError {}

impl Schema {
    #[allow(dead_code)]
    pub fn new(metrics: Vec<MetricDef>) -> Result<Self, SchemaError> {
        let mut schema = Self {
            metrics: Vec::with_capacity(metrics.len()),
        };
        for def in metrics {
            schema.push(def)?;
        }
        Ok(schema)
    }

    pub fn builtin(kind: SchemaKind) -> Self {
        match kind {
            SchemaKind::Base => Self::base(),
            SchemaKind::Extended => Self::extended(),
        }
    }

    /// Instruction/cycle counts and the three cache miss rates.
    ///
    /// The miss-rate captures stop before the `%`, which is added back on
    /// display, so values read `3.21%` either way.
    pub fn base() -> Self {
        Self {
            metrics: vec![
                MetricDef::labeled("Instruction Count", "Instruction Count: ", ValueKind::Count),
                MetricDef::labeled("Cycle Count", "Cycle Count: ", ValueKind::Count),
                MetricDef::anchored(
                    "Icache miss rate",
                    "L1 Icache",
                    "miss rate: ",
                    ValueKind::Percent,
                )
                .without_percent_capture(),
                MetricDef::anchored(
                    "Dcache miss rate",
                    "L1 Dcache",
                    "miss rate: ",
                    ValueKind::Percent,
                )
                .without_percent_capture(),
                MetricDef::anchored(
                    "L2 cache miss rate",
                    "L2 cache",
                    "miss rate: ",
                    ValueKind::Percent,
                )
                .without_percent_capture(),
            ],
        }
    }

    /// Base metrics plus the pipeline latency breakdown and CPI.
    pub fn extended() -> Self {
        let percent = |name: &str| MetricDef::labeled(name, &format!("{name}: "), ValueKind::Percent);
        let count = |name: &str| MetricDef::labeled(name, &format!("{name}: "), ValueKind::Count);

        Self {
            metrics: vec![
                count("Instruction Count"),
                count("Cycle Count"),
                MetricDef::anchored("Icache miss rate", "L1 Icache", "miss rate: ", ValueKind::Percent),
                MetricDef::anchored("Dcache miss rate", "L1 Dcache", "miss rate: ", ValueKind::Percent),
                MetricDef::anchored("L2 cache miss rate", "L2 cache", "miss rate: ", ValueKind::Percent),
                count("Latency by cache"),
                count("Latency by Multiplier Unit"),
                count("Latency by Divider Unit"),
                percent("CPI"),
                percent("Cache Latency in Total Cycles"),
                percent("Multiplier Unit Latency in Total Cycles"),
                percent("Divider Unit Latency in Total Cycles"),
            ],
        }
    }

    /// Append a metric. Names must be unique; labels and anchors non-empty.
    pub fn push(&mut self, def: MetricDef) -> Result<(), SchemaError> {
        if def.label.is_empty() {
            return Err(SchemaError::EmptyLabel(def.name));
        }
        if def.anchor.as_deref() == Some("") {
            return Err(SchemaError::EmptyAnchor(def.name));
        }
        if self.get(&def.name).is_some() {
            return Err(SchemaError::DuplicateMetric(def.name));
        }
        self.metrics.push(def);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&MetricDef> {
        self.metrics.iter().find(|m| m.name == name)
    }

    pub fn metrics(&self) -> &[MetricDef] {
        &self.metrics
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|m| m.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
