//! Diagnostic records accumulated while building a template.
//!
//! The parser and validator never stop at the first problem: every issue is
//! recorded here and the whole list is returned to the caller, so a broken
//! geometry description can be fixed in one pass.

use serde::Serialize;
use std::fmt;

/// How severe a diagnostic is.
///
/// Only [`Severity::Error`] diagnostics reject the template; warnings are
/// reported through `log` and kept for inspection.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// Which part of the geometry description a diagnostic refers to.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Template,
    Panel(String),
    BadRegion(String),
    RigidGroup(String),
    RigidGroupCollection(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Template => write!(f, "template"),
            Scope::Panel(name) => write!(f, "panel '{name}'"),
            Scope::BadRegion(name) => write!(f, "bad region '{name}'"),
            Scope::RigidGroup(name) => write!(f, "rigid group '{name}'"),
            Scope::RigidGroupCollection(name) => {
                write!(f, "rigid group collection '{name}'")
            }
        }
    }
}

/// Specific problem found in the geometry description.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    #[error("bad line (expected exactly one '='): '{line}'")]
    MalformedLine { line: String },
    #[error("unrecognised field '{key}'")]
    UnknownField { key: String },
    #[error("unrecognised top-level field '{key}'")]
    UnknownTopLevelField { key: String },
    #[error("invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
    #[error("can't mix x/y and fs/ss in a bad region")]
    MixedBadRegionFrame,
    #[error("no coordinate ranges given for bad region")]
    UnassignedBadRegion,
    #[error("no panel descriptions in geometry description")]
    NoPanels,
    #[error("missing {what}")]
    MissingField { what: String },
    #[error("{what} must be non-negative")]
    NegativeCoordinate { what: String },
    #[error("minimum exceeds maximum for the {axis} range")]
    InvertedRange { axis: String },
    #[error("'res' must be positive")]
    NonPositiveResolution,
    #[error("specify exactly one of adu_per_eV and adu_per_photon")]
    AmbiguousGain,
    #[error("clen_for_centering is required when rail_direction is given")]
    RailWithoutCentering,
    #[error("'mask_file' was given without 'mask' and would have no effect")]
    MaskFileWithoutMask,
    #[error("all panels' data and mask entries must have the same number of placeholders")]
    PlaceholderCountMismatch,
    #[error("mask cannot have more placeholders than data")]
    TooManyMaskPlaceholders,
    #[error("dimension {index} is undefined")]
    UndefinedDimension { index: usize },
    #[error("exactly one fast scan dim coordinate is needed (found {found})")]
    BadFastScanDimCount { found: usize },
    #[error("exactly one slow scan dim coordinate is needed (found {found})")]
    BadSlowScanDimCount { found: usize },
    #[error("at most one placeholder dim coordinate is allowed (found {found})")]
    TooManyPlaceholderDims { found: usize },
    #[error("placeholder dim count differs between panels")]
    PlaceholderDimMismatch,
    #[error("panels '{first}' and '{second}' overlap in raw coordinates")]
    OverlappingPanels { first: String, second: String },
    #[error("panel not found: {name}")]
    UnknownPanelReference { name: String },
    #[error("rigid group not found: {name}")]
    UnknownGroupReference { name: String },
}

/// One problem with its location and severity.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// 1-based line in the geometry description, when known.
    pub line: Option<usize>,
    pub scope: Scope,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn error(scope: Scope, kind: DiagnosticKind) -> Self {
        Self {
            severity: Severity::Error,
            line: None,
            scope,
            kind,
        }
    }

    pub fn warning(scope: Scope, kind: DiagnosticKind) -> Self {
        Self {
            severity: Severity::Warning,
            line: None,
            scope,
            kind,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}: {}", self.scope, self.kind),
            None => write!(f, "{}: {}", self.scope, self.kind),
        }
    }
}

/// True if any diagnostic in the list rejects the template.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics
        .iter()
        .any(|d| d.severity == Severity::Error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_scope_and_line() {
        let d = Diagnostic::error(
            Scope::Panel("q3".into()),
            DiagnosticKind::MissingField {
                what: "the data location".into(),
            },
        )
        .at_line(12);
        assert_eq!(d.to_string(), "line 12: panel 'q3': missing the data location");
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let diags = vec![Diagnostic::warning(
            Scope::Template,
            DiagnosticKind::UnknownTopLevelField { key: "frob".into() },
        )];
        assert!(!has_errors(&diags));
    }
}
