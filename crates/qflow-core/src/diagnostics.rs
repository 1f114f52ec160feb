//! Findings collected while checking a network and its demand list.
//!
//! [`QuantumNetwork::validate_into`](crate::QuantumNetwork::validate_into) and
//! [`validate_demands_into`](crate::validate_demands_into) both write into one
//! [`Diagnostics`], so `qflow validate` can report every problem in a single
//! pass instead of stopping at the first.
//!
//! # Example
//!
//! ```
//! use qflow_core::diagnostics::{Category, Diagnostics};
//!
//! let mut diag = Diagnostics::new();
//! diag.warning(Category::Capacity, "2 link(s) have zero capacity");
//! diag.error_on(Category::Reference, "demand 3", "Client 9 is not in the network");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert!(diag.has_errors());
//! assert_eq!(diag.summary(), "1 warning, 1 error");
//! ```

use serde::Serialize;
use std::fmt;

/// How bad a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The model can still be built, but part of the input is ignored or
    /// can never succeed (zero-capacity link, threshold below one hop).
    Warning,
    /// Formulation would fail or silently misread the input.
    Error,
}

/// What part of the input a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Tier counts: one generator, at least one client.
    Structure,
    /// Link capacities.
    Capacity,
    /// Ids that must resolve to exactly one node.
    Reference,
    /// Link direction and reachability across the tiers.
    Topology,
    /// Quantity and threshold of a single demand.
    Demand,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Structure => "structure",
            Category::Capacity => "capacity",
            Category::Reference => "reference",
            Category::Topology => "topology",
            Category::Demand => "demand",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    /// The node, link or demand the finding points at, e.g. `"demand 2"`
    /// or `"repeater_0 -> client_1"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "[{severity}:{}] {}", self.category, self.message)?;
        if let Some(subject) = &self.subject {
            write!(f, " ({subject})")?;
        }
        Ok(())
    }
}

/// Ordered list of findings for one validation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub issues: Vec<Issue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(
        &mut self,
        severity: Severity,
        category: Category,
        subject: Option<String>,
        message: impl Into<String>,
    ) {
        self.issues.push(Issue {
            severity,
            category,
            message: message.into(),
            subject,
        });
    }

    pub fn warning(&mut self, category: Category, message: impl Into<String>) {
        self.push(Severity::Warning, category, None, message);
    }

    pub fn error(&mut self, category: Category, message: impl Into<String>) {
        self.push(Severity::Error, category, None, message);
    }

    /// Warning attached to a named node, link or demand.
    pub fn warning_on(
        &mut self,
        category: Category,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.push(Severity::Warning, category, Some(subject.into()), message);
    }

    /// Error attached to a named node, link or demand.
    pub fn error_on(
        &mut self,
        category: Category,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.push(Severity::Error, category, Some(subject.into()), message);
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// One line for the end of `qflow validate`, e.g. "2 warnings, 1 error".
    pub fn summary(&self) -> String {
        fn plural(n: usize, word: &str) -> String {
            format!("{n} {word}{}", if n == 1 { "" } else { "s" })
        }
        format!(
            "{}, {}",
            plural(self.warning_count(), "warning"),
            plural(self.error_count(), "error")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_display_includes_subject() {
        let mut diag = Diagnostics::new();
        diag.error_on(Category::Reference, "client_0", "Client id used by 2 nodes");
        assert_eq!(
            diag.issues[0].to_string(),
            "[error:reference] Client id used by 2 nodes (client_0)"
        );
    }

    #[test]
    fn test_summary_pluralization() {
        let mut diag = Diagnostics::new();
        diag.warning(Category::Topology, "self loop");
        assert_eq!(diag.summary(), "1 warning, 0 errors");
        diag.error(Category::Structure, "no generator");
        diag.error(Category::Structure, "no clients");
        assert_eq!(diag.summary(), "1 warning, 2 errors");
    }

    #[test]
    fn test_errors_filters_warnings() {
        let mut diag = Diagnostics::new();
        diag.warning(Category::Capacity, "zero capacity");
        diag.error_on(Category::Demand, "demand 0", "Quantity must be positive");
        let errors: Vec<&Issue> = diag.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].category, Category::Demand);
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_serialize_uses_lowercase_names() {
        let mut diag = Diagnostics::new();
        diag.warning(Category::Capacity, "zero");
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["issues"][0]["severity"], "warning");
        assert_eq!(json["issues"][0]["category"], "capacity");
        assert!(json["issues"][0].get("subject").is_none());
    }
}
