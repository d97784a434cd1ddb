// diag.rs — Structured diagnostics
//
// Shared diagnostic types for all analysis passes: a severity, one of the
// seven finding categories, a message, a primary span, and optional related
// spans (e.g. the matching call of a redundancy finding).
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

use serde::Serialize;

use crate::ast::{SourceMap, Span};

// ── Severity level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagLevel {
    Error,
    Warning,
}

// ── Finding category ─────────────────────────────────────────────────────

/// Stable category tag of a finding. The `Display` spellings are part of
/// the output contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagCategory {
    InvalidArgumentType,
    TypeMismatch,
    RedundantCall,
    UnmatchedCall,
    CallInRankBranch,
    DoubleNonblocking,
    DoubleWait,
}

impl DiagCategory {
    pub fn tag(self) -> &'static str {
        match self {
            DiagCategory::InvalidArgumentType => "invalid argument type",
            DiagCategory::TypeMismatch => "type mismatch",
            DiagCategory::RedundantCall => "redundant call",
            DiagCategory::UnmatchedCall => "unmatched call",
            DiagCategory::CallInRankBranch => "call in rank branch",
            DiagCategory::DoubleNonblocking => "double nonblocking",
            DiagCategory::DoubleWait => "double wait",
        }
    }

    /// Severity is fixed per category: redundancy is advisory, everything
    /// else is an error.
    pub fn level(self) -> DiagLevel {
        match self {
            DiagCategory::RedundantCall => DiagLevel::Warning,
            _ => DiagLevel::Error,
        }
    }
}

impl fmt::Display for DiagCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

// ── Related span ─────────────────────────────────────────────────────────

/// A secondary source location providing context for a diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct RelatedSpan {
    pub span: Span,
    pub label: String,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// One analysis finding.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub category: DiagCategory,
    pub level: DiagLevel,
    pub span: Span,
    pub message: String,
    /// Function the finding was observed in, when known.
    pub function: Option<String>,
    pub related_spans: Vec<RelatedSpan>,
}

impl Diagnostic {
    /// Create a diagnostic; severity follows the category.
    pub fn new(category: DiagCategory, span: Span, message: impl Into<String>) -> Self {
        Self {
            category,
            level: category.level(),
            span,
            message: message.into(),
            function: None,
            related_spans: Vec::new(),
        }
    }

    /// Attach the enclosing function name.
    pub fn in_function(mut self, name: impl Into<String>) -> Self {
        self.function = Some(name.into());
        self
    }

    /// Attach a related span.
    pub fn with_related(mut self, span: Span, label: impl Into<String>) -> Self {
        self.related_spans.push(RelatedSpan {
            span,
            label: label.into(),
        });
        self
    }

    /// Full rendering against the unit's source, one finding per block:
    ///
    /// ```text
    /// error[type mismatch]: buffer type does not match ...
    ///   --> case.c:3:5, in main
    ///   note: matching call --> case.c:9:5
    /// ```
    pub fn render(&self, source: &SourceMap) -> String {
        let mut out = format!("{}\n  --> {}", self, source.location(self.span));
        if let Some(function) = &self.function {
            out.push_str(&format!(", in {}", function));
        }
        for related in &self.related_spans {
            out.push_str(&format!(
                "\n  note: {} --> {}",
                related.label,
                source.location(related.span)
            ));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
            DiagLevel::Warning => "warning",
        };
        write!(f, "{}[{}]: {}", level, self.category, self.message)
    }
}

/// True if any diagnostic in `diags` is error-level.
pub fn has_error_diags(diags: &[Diagnostic]) -> bool {
    diags.iter().any(|d| d.level == DiagLevel::Error)
}
