//! # Content Report
//!
//! Three buckets: errors block, warnings advise, policy skips record
//! content excluded by configuration.

use std::fmt;

/// One code-tagged finding about a content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Machine-readable code.
    pub code: &'static str,
    /// Content id (or file) the finding is about.
    pub subject: String,
    /// Human-readable detail.
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}] {}", self.code, self.subject, self.message)
    }
}

/// Content deliberately excluded from validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySkip {
    /// Content id (or record) that was skipped.
    pub subject: String,
    /// Configured reason.
    pub reason: String,
}

impl fmt::Display for PolicySkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.subject, self.reason)
    }
}

/// Accumulated validation outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentReport {
    /// Hard errors.
    pub errors: Vec<Finding>,
    /// Warnings.
    pub warnings: Vec<Finding>,
    /// Policy skips.
    pub skips: Vec<PolicySkip>,
}

impl ContentReport {
    /// Add a hard error.
    pub fn add_error(&mut self, code: &'static str, subject: impl Into<String>, message: impl Into<String>) {
        self.errors.push(Finding {
            code,
            subject: subject.into(),
            message: message.into(),
        });
    }

    /// Add a warning (does not affect the outcome).
    pub fn add_warning(&mut self, code: &'static str, subject: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(Finding {
            code,
            subject: subject.into(),
            message: message.into(),
        });
    }

    /// Record a policy skip.
    pub fn add_skip(&mut self, subject: impl Into<String>, reason: impl Into<String>) {
        self.skips.push(PolicySkip {
            subject: subject.into(),
            reason: reason.into(),
        });
    }

    /// Whether any hard error was found.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Errors carrying `code`.
    pub fn errors_with(&self, code: &str) -> Vec<&Finding> {
        self.errors.iter().filter(|f| f.code == code).collect()
    }

    /// Warnings carrying `code`.
    pub fn warnings_with(&self, code: &str) -> Vec<&Finding> {
        self.warnings.iter().filter(|f| f.code == code).collect()
    }

    /// `N error(s), M warning(s), K policy skip(s)`.
    pub fn summary(&self) -> String {
        format!(
            "{} error(s), {} warning(s), {} policy skip(s)",
            self.errors.len(),
            self.warnings.len(),
            self.skips.len()
        )
    }

    /// Grouped, code-tagged report ending in the summary line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.errors.is_empty() {
            out.push_str("Errors:\n");
            for finding in &self.errors {
                out.push_str(&format!("  {finding}\n"));
            }
        }
        if !self.warnings.is_empty() {
            out.push_str("Warnings:\n");
            for finding in &self.warnings {
                out.push_str(&format!("  {finding}\n"));
            }
        }
        if !self.skips.is_empty() {
            out.push_str("Policy skips:\n");
            for skip in &self.skips {
                out.push_str(&format!("  {skip}\n"));
            }
        }
        out.push_str(&self.summary());
        out.push('\n');
        out
    }
}
