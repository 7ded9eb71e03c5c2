//! High-level facade crate for the `detgeom` workspace.
//!
//! This crate provides:
//! - stable re-exports of [`detgeom_core`]
//! - file-system helpers that read a geometry description from disk
//! - (feature `cli`) the `detgeom` inspection binary
//!
//! ## Quickstart
//!
//! ```no_run
//! use detgeom::template_from_file;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let template = template_from_file("detector.geom")?;
//! for panel in template.panels() {
//!     println!("{}: {}x{}", panel.name, panel.width(), panel.height());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `detgeom::core`: the full template/geometry API.
//! - [`template_from_file`]: read and validate a geometry file in one call.

pub use detgeom_core as core;

pub use detgeom_core::{
    has_errors, BadRegion, DataTemplate, Diagnostic, DiagnosticKind, Geometry, GeometryPanel,
    HeaderValues, Panel, ResolveError, RigidGroup, RigidGroupCollection, Scope, Severity,
};

use std::path::Path;

/// Failure to obtain a template from a file on disk.
#[derive(thiserror::Error, Debug)]
pub enum GeometryFileError {
    #[error("can't read geometry file: {0}")]
    Io(#[from] std::io::Error),
    /// The file was read but its contents were rejected.
    #[error("geometry description rejected with {} problem(s)", .0.len())]
    Rejected(Vec<Diagnostic>),
}

/// Read a geometry description from `path` and validate it.
pub fn template_from_file(path: impl AsRef<Path>) -> Result<DataTemplate, GeometryFileError> {
    let path = path.as_ref();
    log::debug!("reading geometry description from {}", path.display());
    let text = std::fs::read_to_string(path)?;
    DataTemplate::from_string(&text).map_err(GeometryFileError::Rejected)
}
