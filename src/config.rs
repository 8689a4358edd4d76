use crate::schema::{MetricDef, Schema, SchemaError, SchemaKind, ValueKind, DEFAULT_WINDOW};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "simreport.toml";

/// Top-level configuration loaded from simreport.toml.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output: OutputConfig,
    pub batch: BatchConfig,
    pub families: Vec<FamilyConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub summary_dir: PathBuf,
    pub detail_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub sort_by_name: bool,
    pub on_error: OnError,
}

/// What the batch does when a log file cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnError {
    /// Stop the whole batch; no report is written.
    #[default]
    Abort,
    /// Log the file, leave it out of the report, and keep going.
    Skip,
}

/// A named collection of logs sharing one schema.
#[derive(Debug, Clone, Deserialize)]
pub struct FamilyConfig {
    pub name: String,
    pub logs: PathBuf,
    #[serde(default)]
    pub schema: SchemaKind,
    #[serde(default)]
    pub metrics: Vec<ExtraMetric>,
}

/// A metric appended to a family's built-in schema.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtraMetric {
    pub name: String,
    #[serde(default)]
    pub anchor: Option<String>,
    pub label: String,
    pub value: ValueKind,
    #[serde(default = "default_captures_percent")]
    pub captures_percent: bool,
    #[serde(default = "default_window")]
    pub window: usize,
}

fn default_captures_percent() -> bool {
    true
}

fn default_window() -> usize {
    DEFAULT_WINDOW
}

// --- Default implementations ---

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            batch: BatchConfig::default(),
            families: vec![
                FamilyConfig::new("mibench", "mibench_results"),
                FamilyConfig::new("polybench", "polybench_results"),
            ],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            summary_dir: PathBuf::from("results_summary"),
            detail_dir: PathBuf::from("results_detail"),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            sort_by_name: true,
            on_error: OnError::Abort,
        }
    }
}

impl FamilyConfig {
    pub fn new(name: &str, logs: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            logs: logs.into(),
            schema: SchemaKind::default(),
            metrics: Vec::new(),
        }
    }

    /// Built-in schema for this family with any extra metrics appended.
    pub fn schema(&self) -> Result<Schema, SchemaError> {
        let mut schema = Schema::builtin(self.schema);
        for extra in &self.metrics {
            schema.push(extra.to_def())?;
        }
        Ok(schema)
    }
}

impl ExtraMetric {
    fn to_def(&self) -> MetricDef {
        MetricDef {
            name: self.name.clone(),
            anchor: self.anchor.clone(),
            label: self.label.clone(),
            value: self.value,
            captures_percent: self.captures_percent,
            window: self.window,
        }
    }
}

impl OutputConfig {
    /// Flat summary report for a family, e.g. `results_summary/mibench_summary`.
    pub fn summary_path(&self, family: &str) -> PathBuf {
        self.summary_dir.join(format!("{family}_summary"))
    }

    /// Detail report for a family, e.g. `results_detail/mibench_detail`.
    pub fn detail_path(&self, family: &str) -> PathBuf {
        self.detail_dir.join(format!("{family}_detail"))
    }
}

/// Errors from loading or validating the config file.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Schema {
        family: String,
        source: SchemaError,
    },
    DuplicateFamily(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {source}", path.display())
            }
            ConfigError::Schema { family, source } => {
                write!(f, "invalid metrics for family '{family}': {source}")
            }
            ConfigError::DuplicateFamily(name) => {
                write!(f, "family '{name}' is defined more than once")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Schema { source, .. } => Some(source),
            ConfigError::DuplicateFamily(_) => None,
        }
    }
}

impl ReportConfig {
    /// Load config from `path`. A missing file yields the built-in defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), families = config.families.len(), "loaded config");
        Ok(config)
    }

    /// Reject duplicate family names and extra metrics that clash with the schema.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, family) in self.families.iter().enumerate() {
            if self.families[..i].iter().any(|f| f.name == family.name) {
                return Err(ConfigError::DuplicateFamily(family.name.clone()));
            }
            family.schema().map_err(|e| ConfigError::Schema {
                family: family.name.clone(),
                source: e,
            })?;
        }
        Ok(())
    }

    pub fn family(&self, name: &str) -> Option<&FamilyConfig> {
        self.families.iter().find(|f| f.name == name)
    }

    pub fn family_names(&self) -> Vec<String> {
        self.families.iter().map(|f| f.name.clone()).collect()
    }

    /// Content written by `simreport init`.
    pub const DEFAULT_CONFIG: &str = "\
# simreport configuration

[output]
summary_dir = \"results_summary\"
detail_dir = \"results_detail\"

[batch]
# Process log files in name order. Set to false to use directory order.
sort_by_name = true
# \"abort\" stops on the first unreadable log, \"skip\" reports it and continues.
on_error = \"abort\"

[[families]]
name = \"mibench\"
logs = \"mibench_results\"
schema = \"extended\"

[[families]]
name = \"polybench\"
logs = \"polybench_results\"
schema = \"extended\"

# Extra metrics are appended after the built-in ones:
# [[families.metrics]]
# name = \"Latency by Load-Use Hazard\"
# label = \"Latency by Load-Use Hazard: \"
# value = \"count\"
";
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_reference_layout() {
        let cfg = ReportConfig::default();
        assert_eq!(cfg.family_names(), vec!["mibench", "polybench"]);
        assert_eq!(
            cfg.output.summary_path("mibench"),
            PathBuf::from("results_summary/mibench_summary")
        );
        assert_eq!(
            cfg.output.detail_path("polybench"),
            PathBuf::from("results_detail/polybench_detail")
        );
        assert!(cfg.batch.sort_by_name);
        assert_eq!(cfg.batch.on_error, OnError::Abort);
        assert_eq!(
            cfg.family("mibench").unwrap().logs,
            PathBuf::from("mibench_results")
        );
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = ReportConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.families.len(), 2);
    }

    #[test]
    fn default_config_text_parses_to_defaults() {
        let cfg: ReportConfig = toml::from_str(ReportConfig::DEFAULT_CONFIG).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.family_names(), vec!["mibench", "polybench"]);
        assert_eq!(cfg.output.summary_dir, PathBuf::from("results_summary"));
        assert_eq!(cfg.batch.on_error, OnError::Abort);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("simreport.toml");
        std::fs::write(&path, "[batch]\non_error = \"skip\"\n").unwrap();
        let cfg = ReportConfig::load(&path).unwrap();
        assert_eq!(cfg.batch.on_error, OnError::Skip);
        assert!(cfg.batch.sort_by_name);
        assert_eq!(cfg.output.detail_dir, PathBuf::from("results_detail"));
        assert_eq!(cfg.families.len(), 2);
    }

    #[test]
    fn family_with_base_schema_and_extra_metric() {
        let toml = r#"
[[families]]
name = "rv64im"
logs = "results"
schema = "base"

[[families.metrics]]
name = "Latency by Load-Use Hazard"
label = "Latency by Load-Use Hazard: "
value = "count"
"#;
        let cfg: ReportConfig = toml::from_str(toml).unwrap();
        cfg.validate().unwrap();
        let family = cfg.family("rv64im").unwrap();
        assert_eq!(family.schema, SchemaKind::Base);
        let schema = family.schema().unwrap();
        assert_eq!(schema.len(), 6);
        let extra = schema.get("Latency by Load-Use Hazard").unwrap();
        assert_eq!(extra.window, DEFAULT_WINDOW);
        assert!(extra.captures_percent);
        assert_eq!(extra.anchor, None);
    }

    #[test]
    fn duplicate_family_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("simreport.toml");
        std::fs::write(
            &path,
            "[[families]]\nname = \"a\"\nlogs = \"x\"\n[[families]]\nname = \"a\"\nlogs = \"y\"\n",
        )
        .unwrap();
        let err = ReportConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateFamily(ref n) if n == "a"));
    }

    #[test]
    fn extra_metric_clashing_with_builtin_is_rejected() {
        let toml = r#"
[[families]]
name = "mibench"
logs = "mibench_results"

[[families.metrics]]
name = "CPI"
label = "CPI: "
value = "decimal"
"#;
        let cfg: ReportConfig = toml::from_str(toml).unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("mibench"));
        assert!(err.to_string().contains("CPI"));
    }

    #[test]
    fn empty_anchor_in_config_is_rejected() {
        let toml = r#"
[[families]]
name = "mibench"
logs = "mibench_results"

[[families.metrics]]
name = "Hazard stalls"
anchor = ""
label = "stalls: "
value = "count"
"#;
        let cfg: ReportConfig = toml::from_str(toml).unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Schema {
                source: SchemaError::EmptyAnchor(_),
                ..
            }
        ));
        assert!(err.to_string().contains("empty anchor"));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("simreport.toml");
        std::fs::write(&path, "[batch\nsort_by_name = ").unwrap();
        let err = ReportConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn unknown_on_error_value_is_parse_error() {
        let result: Result<ReportConfig, _> = toml::from_str("[batch]\non_error = \"retry\"\n");
        assert!(result.is_err());
    }
}
