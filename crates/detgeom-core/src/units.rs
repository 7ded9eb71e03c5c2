//! Typed length quantities and lazily-resolved metadata sources.
//!
//! Camera lengths and photon energies in a geometry description are either
//! literal numbers or references to per-image file headers. The reference
//! form may carry a unit suffix (`... m` or `... mm`); without one, header
//! values are taken to be millimetres. Literal camera lengths are metres.
//! The unit is decided once, at parse time, and kept with the source.

use serde::{Deserialize, Serialize};

/// Unit attached to a header-resolved length.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    Metres,
    #[default]
    Millimetres,
}

impl LengthUnit {
    pub fn to_metres(self, value: f64) -> f64 {
        match self {
            LengthUnit::Metres => value,
            LengthUnit::Millimetres => value * 1e-3,
        }
    }
}

/// Access to per-image metadata, supplied by the image-loading layer.
///
/// The geometry subsystem never opens files itself; resolving a header
/// reference goes through this trait at image-load time.
pub trait HeaderValues {
    /// Numeric value stored under `path`, if present.
    fn number(&self, path: &str) -> Option<f64>;
}

impl HeaderValues for std::collections::HashMap<String, f64> {
    fn number(&self, path: &str) -> Option<f64> {
        self.get(path).copied()
    }
}

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("header '{path}' not found in image metadata")]
    MissingHeader { path: String },
    #[error("adu_per_eV requires a photon_energy source in the template")]
    MissingPhotonEnergy,
}

/// A camera-length value, fixed in the description or read from a header.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthSource {
    /// Literal length written in the geometry description, in metres.
    Literal { metres: f64 },
    /// Header reference resolved against each image.
    Header { path: String, unit: LengthUnit },
}

impl LengthSource {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(v) = raw.parse::<f64>() {
            return LengthSource::Literal { metres: v };
        }
        if let Some(path) = raw.strip_suffix(" mm") {
            LengthSource::Header {
                path: path.trim_end().to_string(),
                unit: LengthUnit::Millimetres,
            }
        } else if let Some(path) = raw.strip_suffix(" m") {
            LengthSource::Header {
                path: path.trim_end().to_string(),
                unit: LengthUnit::Metres,
            }
        } else {
            LengthSource::Header {
                path: raw.to_string(),
                unit: LengthUnit::default(),
            }
        }
    }

    /// Resolve to metres against the given image metadata.
    pub fn resolve(&self, headers: &impl HeaderValues) -> Result<f64, ResolveError> {
        match self {
            LengthSource::Literal { metres } => Ok(*metres),
            LengthSource::Header { path, unit } => headers
                .number(path)
                .map(|v| unit.to_metres(v))
                .ok_or_else(|| ResolveError::MissingHeader { path: path.clone() }),
        }
    }
}

/// A photon-energy value in eV, fixed or read from a header.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergySource {
    Literal { ev: f64 },
    Header { path: String },
}

impl EnergySource {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<f64>() {
            Ok(ev) => EnergySource::Literal { ev },
            Err(_) => EnergySource::Header {
                path: raw.to_string(),
            },
        }
    }

    /// Resolve to eV against the given image metadata.
    pub fn resolve(&self, headers: &impl HeaderValues) -> Result<f64, ResolveError> {
        match self {
            EnergySource::Literal { ev } => Ok(*ev),
            EnergySource::Header { path } => headers
                .number(path)
                .ok_or_else(|| ResolveError::MissingHeader { path: path.clone() }),
        }
    }
}
