//! Build-time panel templates and the typed panel field set.
//!
//! Each `panel/field = value` line lands here. A panel is created on first
//! mention by cloning the current template-wide defaults, then mutated field
//! by field; nothing is checked across fields until validation.

use crate::dirconv::{dir_conv, DirectionError};
use crate::units::LengthSource;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Role of one array axis in the data layout.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimAxis {
    /// Fixed array index along this axis.
    FixedIndex(u32),
    /// Fast-scan pixel coordinate.
    Fs,
    /// Slow-scan pixel coordinate.
    Ss,
    /// Substituted with the per-event frame index at load time.
    Placeholder,
}

impl DimAxis {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "fs" => Some(DimAxis::Fs),
            "ss" => Some(DimAxis::Ss),
            "%" => Some(DimAxis::Placeholder),
            _ => value.parse::<u32>().ok().map(DimAxis::FixedIndex),
        }
    }
}

/// How pixel values scale to photons.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AduScale {
    PerEv(f64),
    PerPhoton(f64),
}

impl AduScale {
    /// Detector units per photon at the given photon energy.
    pub fn adu_per_photon(&self, photon_energy_ev: f64) -> f64 {
        match self {
            AduScale::PerPhoton(v) => *v,
            AduScale::PerEv(v) => v * photon_energy_ev,
        }
    }
}

/// Recognised `panel/...` field keys.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PanelField {
    MinFs,
    MaxFs,
    MinSs,
    MaxSs,
    CornerX,
    CornerY,
    RailDirection,
    ClenForCentering,
    AduPerEv,
    AduPerPhoton,
    RigidGroup,
    Clen,
    Coffset,
    Res,
    MaxAdu,
    NoIndex,
    Data,
    Mask,
    MaskFile,
    SaturationMap,
    SaturationMapFile,
    Fs,
    Ss,
    Dim(usize),
}

impl PanelField {
    pub fn parse(key: &str) -> Option<Self> {
        Some(match key {
            "min_fs" => PanelField::MinFs,
            "max_fs" => PanelField::MaxFs,
            "min_ss" => PanelField::MinSs,
            "max_ss" => PanelField::MaxSs,
            "corner_x" => PanelField::CornerX,
            "corner_y" => PanelField::CornerY,
            "rail_direction" => PanelField::RailDirection,
            "clen_for_centering" => PanelField::ClenForCentering,
            "adu_per_eV" => PanelField::AduPerEv,
            "adu_per_photon" => PanelField::AduPerPhoton,
            "rigid_group" => PanelField::RigidGroup,
            "clen" => PanelField::Clen,
            "coffset" => PanelField::Coffset,
            "res" => PanelField::Res,
            "max_adu" => PanelField::MaxAdu,
            "no_index" => PanelField::NoIndex,
            "data" => PanelField::Data,
            "mask" => PanelField::Mask,
            "mask_file" => PanelField::MaskFile,
            "saturation_map" => PanelField::SaturationMap,
            "saturation_map_file" => PanelField::SaturationMapFile,
            "fs" => PanelField::Fs,
            "ss" => PanelField::Ss,
            _ => {
                let index = key.strip_prefix("dim")?.parse::<usize>().ok()?;
                PanelField::Dim(index)
            }
        })
    }
}

/// A field value that cannot be applied.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum FieldError {
    #[error("expected a number, got '{0}'")]
    InvalidNumber(String),
    #[error("expected an integer, got '{0}'")]
    InvalidInteger(String),
    #[error(transparent)]
    Direction(#[from] DirectionError),
    #[error("dataset path must start with '/'")]
    RelativePath,
    #[error("expected a non-negative integer, 'fs', 'ss' or '%', got '{0}'")]
    InvalidDimValue(String),
    #[error("expected 'true', 'false' or an integer, got '{0}'")]
    InvalidBool(String),
}

fn number(value: &str) -> Result<f64, FieldError> {
    value
        .parse::<f64>()
        .map_err(|_| FieldError::InvalidNumber(value.to_string()))
}

fn integer(value: &str) -> Result<i32, FieldError> {
    value
        .parse::<i32>()
        .map_err(|_| FieldError::InvalidInteger(value.to_string()))
}

fn boolean(value: &str) -> Result<bool, FieldError> {
    if value.eq_ignore_ascii_case("true") {
        return Ok(true);
    }
    if value.eq_ignore_ascii_case("false") {
        return Ok(false);
    }
    value
        .parse::<i64>()
        .map(|v| v != 0)
        .map_err(|_| FieldError::InvalidBool(value.to_string()))
}

/// One panel while the description is still being read.
///
/// Every field that validation may find missing is an `Option`; the
/// template-wide defaults are a `PanelTemplate` with an empty name.
#[derive(Clone, Debug)]
pub struct PanelTemplate {
    pub name: String,
    pub orig_min_fs: Option<i32>,
    pub orig_max_fs: Option<i32>,
    pub orig_min_ss: Option<i32>,
    pub orig_max_ss: Option<i32>,
    pub cnx: Option<f64>,
    pub cny: Option<f64>,
    pub cnz_from: Option<LengthSource>,
    pub cnz_offset: f64,
    pub res: Option<f64>,
    pub bad: bool,
    pub fs_dir: Vector3<f64>,
    pub ss_dir: Vector3<f64>,
    pub rail: Option<Vector3<f64>>,
    pub clen_for_centering: Option<f64>,
    pub adu_per_ev: Option<f64>,
    pub adu_per_photon: Option<f64>,
    pub max_adu: f64,
    pub data: Option<String>,
    pub mask: Option<String>,
    pub mask_file: Option<String>,
    pub satmap: Option<String>,
    pub satmap_file: Option<String>,
    /// `dim<N>` slots; `None` entries are slots never written.
    pub dims: Option<Vec<Option<DimAxis>>>,
}

impl PanelTemplate {
    /// The template-wide starting defaults before any top-level assignment.
    pub fn defaults() -> Self {
        Self {
            name: String::new(),
            orig_min_fs: None,
            orig_max_fs: None,
            orig_min_ss: None,
            orig_max_ss: None,
            cnx: None,
            cny: None,
            cnz_from: None,
            cnz_offset: 0.0,
            res: None,
            bad: false,
            fs_dir: Vector3::x(),
            ss_dir: Vector3::y(),
            rail: None,
            clen_for_centering: None,
            adu_per_ev: None,
            adu_per_photon: None,
            max_adu: f64::INFINITY,
            data: None,
            mask: None,
            mask_file: None,
            satmap: None,
            satmap_file: None,
            dims: None,
        }
    }

    /// Seed a new named panel from the current defaults.
    pub fn from_defaults(name: &str, defaults: &Self) -> Self {
        let mut panel = defaults.clone();
        panel.name = name.to_string();
        panel
    }

    fn set_dim(&mut self, slot: usize, axis: DimAxis) {
        let dims = self.dims.get_or_insert_with(Vec::new);
        if dims.len() <= slot {
            dims.resize(slot + 1, None);
        }
        dims[slot] = Some(axis);
    }

    /// Apply one `key = value` assignment to this panel.
    ///
    /// `PanelField::RigidGroup` is routed by the parser before this point;
    /// it names a group membership, not a panel attribute.
    pub fn apply(&mut self, field: PanelField, value: &str) -> Result<(), FieldError> {
        match field {
            PanelField::MinFs => self.orig_min_fs = Some(integer(value)?),
            PanelField::MaxFs => self.orig_max_fs = Some(integer(value)?),
            PanelField::MinSs => self.orig_min_ss = Some(integer(value)?),
            PanelField::MaxSs => self.orig_max_ss = Some(integer(value)?),
            PanelField::CornerX => self.cnx = Some(number(value)?),
            PanelField::CornerY => self.cny = Some(number(value)?),
            PanelField::RailDirection => self.rail = Some(dir_conv(value)?),
            PanelField::ClenForCentering => {
                self.clen_for_centering = Some(number(value)?)
            }
            PanelField::AduPerEv => self.adu_per_ev = Some(number(value)?),
            PanelField::AduPerPhoton => self.adu_per_photon = Some(number(value)?),
            PanelField::RigidGroup => {}
            PanelField::Clen => self.cnz_from = Some(LengthSource::parse(value)),
            PanelField::Coffset => self.cnz_offset = number(value)?,
            PanelField::Res => self.res = Some(number(value)?),
            PanelField::MaxAdu => self.max_adu = number(value)?,
            PanelField::NoIndex => self.bad = boolean(value)?,
            PanelField::Data => {
                if !value.starts_with('/') {
                    return Err(FieldError::RelativePath);
                }
                self.data = Some(value.to_string());
            }
            PanelField::Mask => {
                if !value.starts_with('/') {
                    return Err(FieldError::RelativePath);
                }
                self.mask = Some(value.to_string());
            }
            PanelField::MaskFile => self.mask_file = Some(value.to_string()),
            PanelField::SaturationMap => self.satmap = Some(value.to_string()),
            PanelField::SaturationMapFile => {
                self.satmap_file = Some(value.to_string())
            }
            PanelField::Fs => self.fs_dir = dir_conv(value)?,
            PanelField::Ss => self.ss_dir = dir_conv(value)?,
            PanelField::Dim(slot) => {
                let axis = DimAxis::parse(value)
                    .ok_or_else(|| FieldError::InvalidDimValue(value.to_string()))?;
                self.set_dim(slot, axis);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_keys_parse() {
        assert_eq!(PanelField::parse("min_fs"), Some(PanelField::MinFs));
        assert_eq!(PanelField::parse("adu_per_eV"), Some(PanelField::AduPerEv));
        assert_eq!(PanelField::parse("dim2"), Some(PanelField::Dim(2)));
        assert_eq!(PanelField::parse("dim"), None);
        assert_eq!(PanelField::parse("badrow_direction"), None);
    }

    #[test]
    fn defaults_seed_new_panels() {
        let mut defaults = PanelTemplate::defaults();
        defaults.apply(PanelField::Res, "5000").unwrap();
        defaults.apply(PanelField::Data, "/data/data").unwrap();
        defaults.set_dim(0, DimAxis::Ss);
        defaults.set_dim(1, DimAxis::Fs);

        let mut p = PanelTemplate::from_defaults("q0a0", &defaults);
        assert_eq!(p.name, "q0a0");
        assert_eq!(p.res, Some(5000.0));
        assert_eq!(p.data.as_deref(), Some("/data/data"));

        // The copy must be deep: overriding the panel leaves defaults alone.
        p.apply(PanelField::Data, "/other/data").unwrap();
        p.set_dim(2, DimAxis::Placeholder);
        assert_eq!(defaults.data.as_deref(), Some("/data/data"));
        assert_eq!(defaults.dims.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn relative_data_path_rejected() {
        let mut p = PanelTemplate::defaults();
        assert_eq!(
            p.apply(PanelField::Data, "data/data"),
            Err(FieldError::RelativePath)
        );
        assert_eq!(
            p.apply(PanelField::Mask, "entry/mask"),
            Err(FieldError::RelativePath)
        );
    }

    #[test]
    fn dim_slots_grow_lazily() {
        let mut p = PanelTemplate::defaults();
        p.apply(PanelField::Dim(2), "fs").unwrap();
        let dims = p.dims.as_ref().unwrap();
        assert_eq!(dims.len(), 3);
        assert_eq!(dims[0], None);
        assert_eq!(dims[2], Some(DimAxis::Fs));
    }

    #[test]
    fn dim_values_parse() {
        assert_eq!(DimAxis::parse("%"), Some(DimAxis::Placeholder));
        assert_eq!(DimAxis::parse("3"), Some(DimAxis::FixedIndex(3)));
        assert_eq!(DimAxis::parse("-1"), None);
        assert_eq!(DimAxis::parse("sideways"), None);
    }

    #[test]
    fn no_index_accepts_bools_and_integers() {
        let mut p = PanelTemplate::defaults();
        p.apply(PanelField::NoIndex, "true").unwrap();
        assert!(p.bad);
        p.apply(PanelField::NoIndex, "0").unwrap();
        assert!(!p.bad);
        assert!(p.apply(PanelField::NoIndex, "maybe").is_err());
    }

    #[test]
    fn res_becomes_pixel_pitch_at_validation_not_here() {
        let mut p = PanelTemplate::defaults();
        p.apply(PanelField::Res, "1000").unwrap();
        assert_eq!(p.res, Some(1000.0));
    }
}
