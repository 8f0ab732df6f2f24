use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Fatal,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warn => write!(f, "WARN"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Whether the process is embedded in the (out-of-scope) desktop GUI or run
/// headless. Only affects the severity of the UI-toolkit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostMode {
    Gui,
    Headless,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub severity: Severity,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl CheckResult {
    pub fn new(name: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            severity,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Aggregates every `CheckResult` from one preflight run. Execution never
/// short-circuits on WARN or FATAL; every check still runs, so the summary
/// is always complete.
#[derive(Debug, Clone, Serialize)]
pub struct PreflightReport {
    pub results: Vec<CheckResult>,
}

impl PreflightReport {
    pub fn new(results: Vec<CheckResult>) -> Self {
        Self { results }
    }

    pub fn has_fatal(&self) -> bool {
        self.results.iter().any(|r| r.severity == Severity::Fatal)
    }

    pub fn has_warnings(&self) -> bool {
        self.results.iter().any(|r| r.severity == Severity::Warn)
    }

    /// `0` all passed, `1` one or more FATAL, `2` only WARNs.
    pub fn exit_code(&self) -> i32 {
        if self.has_fatal() {
            1
        } else if self.has_warnings() {
            2
        } else {
            0
        }
    }

    /// Human-readable summary, FATALs first, then WARN, then INFO.
    pub fn to_summary(&self) -> String {
        let mut ordered: Vec<&CheckResult> = self.results.iter().collect();
        ordered.sort_by(|a, b| b.severity.cmp(&a.severity));

        let mut out = String::new();
        out.push_str("Preflight report:\n");
        for result in ordered {
            out.push_str(&format!("  [{:>5}] {}: {}\n", result.severity, result.name, result.message));
        }
        out.push_str(&format!(
            "{} checks, {} fatal, {} warnings\n",
            self.results.len(),
            self.results.iter().filter(|r| r.severity == Severity::Fatal).count(),
            self.results.iter().filter(|r| r.severity == Severity::Warn).count(),
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_prioritizes_fatal_over_warn() {
        let report = PreflightReport::new(vec![
            CheckResult::new("a", Severity::Warn, "degraded"),
            CheckResult::new("b", Severity::Fatal, "broken"),
        ]);
        assert_eq!(report.exit_code(), 1);
        assert!(report.has_fatal());
        assert!(report.has_warnings());
    }

    #[test]
    fn exit_code_is_two_for_warn_only() {
        let report = PreflightReport::new(vec![CheckResult::new("a", Severity::Warn, "degraded")]);
        assert_eq!(report.exit_code(), 2);
    }

    #[test]
    fn exit_code_is_zero_when_clean() {
        let report = PreflightReport::new(vec![CheckResult::new("a", Severity::Info, "ok")]);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn summary_lists_fatal_checks_before_warnings() {
        let report = PreflightReport::new(vec![
            CheckResult::new("warn_check", Severity::Warn, "degraded"),
            CheckResult::new("fatal_check", Severity::Fatal, "broken"),
        ]);
        let summary = report.to_summary();
        assert!(summary.find("fatal_check").unwrap() < summary.find("warn_check").unwrap());
    }
}
