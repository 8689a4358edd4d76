/// Block scanner for flat summary reports.
///
/// Reads the text written by [`crate::report::render_summary`] back into
/// programs and their fields. The scanner is a two-state machine:
///
/// - `Idle`: no program header seen yet; field lines are ignored.
/// - `InBlock(program)`: field lines are recorded against `program`.
///
/// A header line (`name:` that is not a `field: value` line, so `b c:`
/// counts) always moves to `InBlock`. Blank and unrecognized lines never
/// change state.
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Suffix some simulator runs append to program names; dropped when scanning.
pub const RESULT_SUFFIX: &str = "_result";

static FIELD_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([^:]+):\s*(.+)$").unwrap());

/// One program block: its name and fields in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub name: String,
    pub fields: Vec<(String, String)>,
}

impl Program {
    fn new(name: String) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Set a field; a repeated field keeps its position and takes the new value.
    fn set(&mut self, field: &str, value: &str) {
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.fields.push((field.to_string(), value.to_string())),
        }
    }
}

/// A scanned report: programs in the order their headers first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReport {
    programs: Vec<Program>,
    index: HashMap<String, usize>,
}

impl ParsedReport {
    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    #[allow(dead_code)]
    pub fn program(&self, name: &str) -> Option<&Program> {
        self.index.get(name).map(|&i| &self.programs[i])
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Index of `name`, adding an empty program if it is new.
    fn open(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.programs.len();
        self.programs.push(Program::new(name.to_string()));
        self.index.insert(name.to_string(), i);
        i
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Idle,
    InBlock(usize),
}

/// Whether `name` would be read back as a program header.
pub fn is_program_name(name: &str) -> bool {
    name == name.trim() && header_name(&format!("{name}:")) == Some(name)
}

/// Program name of a header line: a trimmed line ending in `:` that does
/// not read as `field: value`.
fn header_name(line: &str) -> Option<&str> {
    let name = line.strip_suffix(':')?;
    if name.is_empty() || FIELD_LINE.is_match(line) {
        return None;
    }
    Some(name)
}

/// Drop a trailing `_result`, unless nothing would be left.
pub fn strip_result_suffix(name: &str) -> &str {
    match name.strip_suffix(RESULT_SUFFIX) {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => name,
    }
}

/// Scan flat report text into programs and fields.
pub fn parse_report(text: &str) -> ParsedReport {
    let mut report = ParsedReport::default();
    let mut state = ScanState::Idle;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(name) = header_name(line) {
            state = ScanState::InBlock(report.open(strip_result_suffix(name)));
            continue;
        }

        let Some(caps) = FIELD_LINE.captures(line) else {
            tracing::trace!(line, "ignoring unrecognized line");
            continue;
        };

        match state {
            ScanState::Idle => {
                tracing::trace!(line, "field outside any program block");
            }
            ScanState::InBlock(i) => {
                let field = caps[1].trim();
                let value = caps[2].trim();
                report.programs[i].set(field, value);
            }
        }
    }

    report
}
