use serde::{Deserialize, Serialize};
use std::fmt;

/// The graph view a diagnostic originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphView {
    /// Containment graph derived from dotted-name grouping.
    Hierarchy,
    /// Entity-schema cross-references.
    Entity,
    /// Type-directed dependency edges between siblings.
    DataFlow,
}

impl fmt::Display for GraphView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphView::Hierarchy => write!(f, "hierarchy"),
            GraphView::Entity => write!(f, "entity"),
            GraphView::DataFlow => write!(f, "data-flow"),
        }
    }
}

/// Severity of a diagnostic. Errors gate plan emission for their group;
/// warnings never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Machine-readable diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    InvalidName,
    DuplicateOperation,
    UnsatisfiedDependency,
    AmbiguousDependency,
    CyclicDependency,
    MissingEntityReference,
    DeadOutput,
    EmptyGroup,
}

impl DiagnosticCode {
    /// The default severity for this code.
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticCode::InvalidName
            | DiagnosticCode::DuplicateOperation
            | DiagnosticCode::UnsatisfiedDependency
            | DiagnosticCode::CyclicDependency
            | DiagnosticCode::MissingEntityReference => Severity::Error,
            DiagnosticCode::AmbiguousDependency
            | DiagnosticCode::DeadOutput
            | DiagnosticCode::EmptyGroup => Severity::Warning,
        }
    }

    /// The graph view this code belongs to.
    pub fn view(self) -> GraphView {
        match self {
            DiagnosticCode::InvalidName
            | DiagnosticCode::DuplicateOperation
            | DiagnosticCode::EmptyGroup => GraphView::Hierarchy,
            DiagnosticCode::MissingEntityReference => GraphView::Entity,
            DiagnosticCode::UnsatisfiedDependency
            | DiagnosticCode::AmbiguousDependency
            | DiagnosticCode::CyclicDependency
            | DiagnosticCode::DeadOutput => GraphView::DataFlow,
        }
    }
}

/// A single validation finding. Diagnostics are collected, never thrown:
/// a compilation pass always produces the complete set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub view: GraphView,
    pub severity: Severity,
    /// The operation (or group) the finding is about.
    pub subject: String,
    /// Path of the enclosing group, empty for the root.
    pub group: String,
    /// Human-readable message, self-sufficient without the graph at hand.
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        code: DiagnosticCode,
        subject: impl Into<String>,
        group: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            view: code.view(),
            severity: code.severity(),
            subject: subject.into(),
            group: group.into(),
            message: message.into(),
        }
    }

    /// Overrides the graph view for codes that can surface in more than
    /// one view (e.g. a cycle found in the containment graph).
    pub fn in_view(mut self, view: GraphView) -> Self {
        self.view = view;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        let group = if self.group.is_empty() {
            "<root>"
        } else {
            self.group.as_str()
        };
        write!(
            f,
            "{severity}[{:?}] ({} graph, group '{group}') {}: {}",
            self.code, self.view, self.subject, self.message
        )
    }
}

/// Accumulator for a full compilation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticReport {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, other: DiagnosticReport) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn all(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    /// True when no error-severity diagnostic was recorded.
    pub fn is_clean(&self) -> bool {
        self.errors().next().is_none()
    }

    /// True when the given group (by exact path) has at least one error.
    /// Used to gate emission per group without blocking siblings.
    pub fn group_has_errors(&self, group: &str) -> bool {
        self.errors().any(|d| d.group == group)
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}
