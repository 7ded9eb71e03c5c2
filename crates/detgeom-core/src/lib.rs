//! Detector geometry templates for serial crystallography data.
//!
//! This crate parses the line-oriented geometry description format used to
//! describe multi-panel X-ray detectors (panel extents, lab-frame placement,
//! bad regions, rigid groups) into a validated, immutable [`DataTemplate`],
//! and maps between raw-file and panel-local pixel coordinates.
//!
//! The crate is purely in-memory: reading geometry files and image headers
//! is left to callers, which supply headers through [`HeaderValues`].

mod badregion;
mod diagnostics;
mod dirconv;
mod geometry;
mod panel;
mod parse;
mod rigid;
mod template;
mod units;
mod validate;

pub use badregion::{BadRegion, BadRegionField, BadRegionFieldError, BadRegionFrame};
pub use diagnostics::{has_errors, Diagnostic, DiagnosticKind, Scope, Severity};
pub use dirconv::{dir_conv, DirectionError};
pub use geometry::{Geometry, GeometryPanel};
pub use panel::{AduScale, DimAxis, FieldError, PanelField};
pub use rigid::{RigidGroup, RigidGroupCollection, RigidGroupDeltas};
pub use template::{DataTemplate, Panel};
pub use units::{EnergySource, HeaderValues, LengthSource, LengthUnit, ResolveError};
