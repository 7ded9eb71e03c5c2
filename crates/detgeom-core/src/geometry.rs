//! Per-image resolved geometry.
//!
//! A template keeps camera lengths and photon energy as lazily-resolved
//! sources; once an image's headers are available they collapse into plain
//! numbers. `cnz` ends up in pixel units so downstream scattering-vector
//! math works in one coordinate system.

use crate::template::DataTemplate;
use crate::units::{HeaderValues, ResolveError};
use nalgebra::Vector3;
use serde::Serialize;

/// One panel with every per-image quantity resolved.
#[derive(Clone, Debug, Serialize)]
pub struct GeometryPanel {
    pub name: String,
    /// Pixel size in metres.
    pub pixel_pitch: f64,
    /// Corner position in pixel units; `cnz` includes the coffset.
    pub cnx: f64,
    pub cny: f64,
    pub cnz: f64,
    pub fs_dir: Vector3<f64>,
    pub ss_dir: Vector3<f64>,
    pub width: usize,
    pub height: usize,
    pub adu_per_photon: f64,
    pub max_adu: f64,
    pub bad: bool,
}

/// Detector geometry for one image.
#[derive(Clone, Debug, Serialize)]
pub struct Geometry {
    pub panels: Vec<GeometryPanel>,
    /// Scaled photon energy in eV, when the template declares a source.
    pub photon_energy_ev: Option<f64>,
}

impl DataTemplate {
    /// Resolve every header reference against one image's metadata.
    pub fn resolve(&self, headers: &impl HeaderValues) -> Result<Geometry, ResolveError> {
        let photon_energy_ev = match &self.wavelength_from {
            Some(source) => {
                let ev = source.resolve(headers)?;
                Some(ev * self.photon_energy_scale.unwrap_or(1.0))
            }
            None => None,
        };

        let mut panels = Vec::with_capacity(self.panels().len());
        for p in self.panels() {
            let cnz_m = p.cnz_from.resolve(headers)? + p.cnz_offset;
            let adu_per_photon = match photon_energy_ev {
                Some(ev) => p.adu_scale.adu_per_photon(ev),
                None => match p.adu_scale {
                    crate::panel::AduScale::PerPhoton(v) => v,
                    crate::panel::AduScale::PerEv(_) => {
                        return Err(ResolveError::MissingPhotonEnergy)
                    }
                },
            };
            panels.push(GeometryPanel {
                name: p.name.clone(),
                pixel_pitch: p.pixel_pitch,
                cnx: p.cnx,
                cny: p.cny,
                cnz: cnz_m / p.pixel_pitch,
                fs_dir: p.fs_dir,
                ss_dir: p.ss_dir,
                width: p.width(),
                height: p.height(),
                adu_per_photon,
                max_adu: p.max_adu,
                bad: p.bad,
            });
        }

        Ok(Geometry {
            panels,
            photon_energy_ev,
        })
    }
}
