//! The validated, immutable detector template and its coordinate mapper.
//!
//! A `DataTemplate` is the single shared description every pipeline stage
//! reads: panels with their raw-file extents and lab-frame placement, bad
//! regions, rigid groups and global settings. Nothing here is mutated after
//! validation, so worker threads can share one template freely.

use crate::badregion::BadRegion;
use crate::diagnostics::Diagnostic;
use crate::panel::{AduScale, DimAxis};
use crate::parse::parse_template;
use crate::rigid::{RigidGroup, RigidGroupCollection};
use crate::units::{EnergySource, LengthSource};
use crate::validate::finalize;
use nalgebra::Vector3;
use serde::Serialize;

/// One rectangular detector sub-region after validation.
#[derive(Clone, Debug, Serialize)]
pub struct Panel {
    pub name: String,
    /// Raw-file pixel bounding box, inclusive on both ends.
    pub orig_min_fs: i32,
    pub orig_max_fs: i32,
    pub orig_min_ss: i32,
    pub orig_max_ss: i32,
    /// Corner position of pixel (0,0) in the lab x/y plane, pixel units.
    pub cnx: f64,
    pub cny: f64,
    /// Camera length source, resolved per image.
    pub cnz_from: LengthSource,
    /// Offset in metres added after resolving `cnz_from`.
    pub cnz_offset: f64,
    /// Pixel size in metres (1/res).
    pub pixel_pitch: f64,
    /// Whole panel excluded from indexing.
    pub bad: bool,
    /// Basis vectors of the fast/slow scan axes in the lab frame. They are
    /// used as-is and need not be orthogonal or normalized.
    pub fs_dir: Vector3<f64>,
    pub ss_dir: Vector3<f64>,
    /// Direction the detector moves along when the camera length changes.
    pub rail: Vector3<f64>,
    pub clen_for_centering: f64,
    pub adu_scale: AduScale,
    pub max_adu: f64,
    /// Dataset path template; may contain `%` placeholders.
    pub data: String,
    pub mask: Option<String>,
    pub mask_file: Option<String>,
    pub satmap: Option<String>,
    pub satmap_file: Option<String>,
    /// Role of each array axis, outermost first.
    pub dims: Vec<DimAxis>,
}

impl Panel {
    pub fn width(&self) -> usize {
        (self.orig_max_fs - self.orig_min_fs + 1) as usize
    }

    pub fn height(&self) -> usize {
        (self.orig_max_ss - self.orig_min_ss + 1) as usize
    }

    /// True if the raw-file pixel address falls inside this panel.
    pub fn contains_raw(&self, fs: f64, ss: f64) -> bool {
        fs >= self.orig_min_fs as f64
            && fs < (self.orig_max_fs + 1) as f64
            && ss >= self.orig_min_ss as f64
            && ss < (self.orig_max_ss + 1) as f64
    }

    /// Lab-frame (x, y) of a panel-local pixel, in pixel units.
    pub fn lab_position(&self, fs: f64, ss: f64) -> (f64, f64) {
        let x = fs * self.fs_dir.x + ss * self.ss_dir.x + self.cnx;
        let y = fs * self.fs_dir.y + ss * self.ss_dir.y + self.cny;
        (x, y)
    }
}

/// A validated detector geometry template.
#[derive(Clone, Debug, Serialize)]
pub struct DataTemplate {
    pub(crate) panels: Vec<Panel>,
    pub(crate) bad: Vec<BadRegion>,
    pub(crate) rigid_groups: Vec<RigidGroup>,
    pub(crate) rigid_group_collections: Vec<RigidGroupCollection>,
    pub mask_good: u32,
    pub mask_bad: u32,
    /// Photon-energy source, resolved per image.
    pub wavelength_from: Option<EnergySource>,
    /// Dataset path of an externally-supplied peak list.
    pub peak_list: Option<String>,
    pub photon_energy_bandwidth: Option<f64>,
    pub photon_energy_scale: Option<f64>,
    /// `%` placeholders in every panel's data path.
    pub path_dim: usize,
    /// Placeholder dim coordinates per panel (0 or 1).
    pub dim_dim: usize,
}

impl DataTemplate {
    /// Build a template from a complete geometry description.
    ///
    /// All problems found anywhere in the text are returned together; a
    /// template is only produced when nothing rejected it.
    pub fn from_string(text: &str) -> Result<Self, Vec<Diagnostic>> {
        finalize(parse_template(text))
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panel(&self, index: usize) -> Option<&Panel> {
        self.panels.get(index)
    }

    pub fn bad_regions(&self) -> &[BadRegion] {
        &self.bad
    }

    pub fn rigid_groups(&self) -> &[RigidGroup] {
        &self.rigid_groups
    }

    pub fn rigid_group_collections(&self) -> &[RigidGroupCollection] {
        &self.rigid_group_collections
    }

    pub fn panel_name(&self, index: usize) -> Option<&str> {
        self.panels.get(index).map(|p| p.name.as_str())
    }

    pub fn panel_index(&self, name: &str) -> Option<usize> {
        self.panels.iter().position(|p| p.name == name)
    }

    /// Panel whose raw bounding box contains the pixel, by declaration
    /// order. Validation guarantees boxes don't overlap, so at most one
    /// panel can match.
    pub fn locate_panel(&self, fs: f64, ss: f64) -> Option<usize> {
        self.panels.iter().position(|p| p.contains_raw(fs, ss))
    }

    /// Raw-file pixel address to (panel index, panel-local fs, ss).
    pub fn file_to_panel_coords(&self, fs: f64, ss: f64) -> Option<(usize, f64, f64)> {
        let pn = self.locate_panel(fs, ss)?;
        let p = &self.panels[pn];
        Some((
            pn,
            fs - p.orig_min_fs as f64,
            ss - p.orig_min_ss as f64,
        ))
    }

    /// Panel-local coordinates back to the raw-file pixel address.
    pub fn panel_to_file_coords(&self, pn: usize, fs: f64, ss: f64) -> Option<(f64, f64)> {
        let p = self.panels.get(pn)?;
        Some((fs + p.orig_min_fs as f64, ss + p.orig_min_ss as f64))
    }

    /// True if the panel-local pixel falls in any bad region.
    ///
    /// fs/ss regions are tested against raw-file coordinates; x/y regions
    /// against the lab-frame position from the panel's basis vectors. Pixel
    /// masks and NaN/inf checks are layered elsewhere.
    pub fn in_bad_region(&self, pn: usize, fs: f64, ss: f64) -> bool {
        let Some(p) = self.panels.get(pn) else {
            return false;
        };
        let (rx, ry) = p.lab_position(fs, ss);

        self.bad.iter().any(|region| {
            if region.panel().is_some_and(|name| name != p.name) {
                return false;
            }
            match region {
                BadRegion::RawFsSs {
                    min_fs,
                    max_fs,
                    min_ss,
                    max_ss,
                    ..
                } => {
                    let nfs = fs + p.orig_min_fs as f64;
                    let nss = ss + p.orig_min_ss as f64;
                    nfs >= *min_fs && nfs <= *max_fs && nss >= *min_ss && nss <= *max_ss
                }
                BadRegion::LabXy {
                    min_x,
                    max_x,
                    min_y,
                    max_y,
                    ..
                } => rx >= *min_x && rx <= *max_x && ry >= *min_y && ry <= *max_y,
            }
        })
    }

    /// Overall (width, height) of the raw array when every panel reads the
    /// same dataset and nothing is placeholder-indexed, exclusive upper
    /// bounds. `None` when the data is not laid out as one slab.
    pub fn slab_extents(&self) -> Option<(usize, usize)> {
        let first = &self.panels.first()?.data;
        let mut w = 0;
        let mut h = 0;
        for p in &self.panels {
            if &p.data != first {
                return None;
            }
            if p.dims.contains(&DimAxis::Placeholder) {
                return None;
            }
            w = w.max(p.orig_max_fs as usize + 1);
            h = h.max(p.orig_max_ss as usize + 1);
        }
        Some((w, h))
    }
}
