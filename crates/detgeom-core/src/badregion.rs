//! Rectangular exclusion regions.
//!
//! A bad region is written either in lab-frame x/y or in raw-file fs/ss
//! pixels, never both. The first coordinate field seen fixes the frame and
//! every later field must agree. Bounds never written stay unbounded.

use serde::{Deserialize, Serialize};

/// Coordinate frame of a bad region once the first field fixed it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadRegionFrame {
    LabXy,
    RawFsSs,
}

/// Recognised `bad*/...` field keys.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BadRegionField {
    MinX,
    MaxX,
    MinY,
    MaxY,
    MinFs,
    MaxFs,
    MinSs,
    MaxSs,
    Panel,
}

impl BadRegionField {
    pub fn parse(key: &str) -> Option<Self> {
        Some(match key {
            "min_x" => BadRegionField::MinX,
            "max_x" => BadRegionField::MaxX,
            "min_y" => BadRegionField::MinY,
            "max_y" => BadRegionField::MaxY,
            "min_fs" => BadRegionField::MinFs,
            "max_fs" => BadRegionField::MaxFs,
            "min_ss" => BadRegionField::MinSs,
            "max_ss" => BadRegionField::MaxSs,
            "panel" => BadRegionField::Panel,
            _ => return None,
        })
    }

    fn frame(self) -> Option<BadRegionFrame> {
        match self {
            BadRegionField::MinX
            | BadRegionField::MaxX
            | BadRegionField::MinY
            | BadRegionField::MaxY => Some(BadRegionFrame::LabXy),
            BadRegionField::MinFs
            | BadRegionField::MaxFs
            | BadRegionField::MinSs
            | BadRegionField::MaxSs => Some(BadRegionFrame::RawFsSs),
            BadRegionField::Panel => None,
        }
    }
}

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum BadRegionFieldError {
    #[error("can't mix x/y and fs/ss in a bad region")]
    MixedFrame,
    #[error("expected a number, got '{0}'")]
    InvalidNumber(String),
}

/// One bad region while the description is still being read.
#[derive(Clone, Debug)]
pub struct BadRegionTemplate {
    pub name: String,
    pub frame: Option<BadRegionFrame>,
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_fs: f64,
    pub max_fs: f64,
    pub min_ss: f64,
    pub max_ss: f64,
    pub panel: Option<String>,
}

impl BadRegionTemplate {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            frame: None,
            min_x: f64::NEG_INFINITY,
            max_x: f64::INFINITY,
            min_y: f64::NEG_INFINITY,
            max_y: f64::INFINITY,
            min_fs: f64::NEG_INFINITY,
            max_fs: f64::INFINITY,
            min_ss: f64::NEG_INFINITY,
            max_ss: f64::INFINITY,
            panel: None,
        }
    }

    fn lock_frame(&mut self, frame: BadRegionFrame) -> Result<(), BadRegionFieldError> {
        match self.frame {
            None => {
                self.frame = Some(frame);
                Ok(())
            }
            Some(current) if current == frame => Ok(()),
            Some(_) => Err(BadRegionFieldError::MixedFrame),
        }
    }

    /// Apply one `key = value` assignment to this region.
    pub fn apply(
        &mut self,
        field: BadRegionField,
        value: &str,
    ) -> Result<(), BadRegionFieldError> {
        if let Some(frame) = field.frame() {
            self.lock_frame(frame)?;
        }
        if field == BadRegionField::Panel {
            self.panel = Some(value.to_string());
            return Ok(());
        }
        let v = value
            .parse::<f64>()
            .map_err(|_| BadRegionFieldError::InvalidNumber(value.to_string()))?;
        match field {
            BadRegionField::MinX => self.min_x = v,
            BadRegionField::MaxX => self.max_x = v,
            BadRegionField::MinY => self.min_y = v,
            BadRegionField::MaxY => self.max_y = v,
            BadRegionField::MinFs => self.min_fs = v,
            BadRegionField::MaxFs => self.max_fs = v,
            BadRegionField::MinSs => self.min_ss = v,
            BadRegionField::MaxSs => self.max_ss = v,
            BadRegionField::Panel => unreachable!("handled above"),
        }
        Ok(())
    }

    /// Typed region, or `None` if no coordinate field ever fixed the frame.
    pub(crate) fn finalize(&self) -> Option<BadRegion> {
        match self.frame? {
            BadRegionFrame::LabXy => Some(BadRegion::LabXy {
                name: self.name.clone(),
                panel: self.panel.clone(),
                min_x: self.min_x,
                max_x: self.max_x,
                min_y: self.min_y,
                max_y: self.max_y,
            }),
            BadRegionFrame::RawFsSs => Some(BadRegion::RawFsSs {
                name: self.name.clone(),
                panel: self.panel.clone(),
                min_fs: self.min_fs,
                max_fs: self.max_fs,
                min_ss: self.min_ss,
                max_ss: self.max_ss,
            }),
        }
    }
}

/// A validated exclusion region.
///
/// Lab-frame rectangles are in pixel units of the lab x/y plane; raw-frame
/// rectangles are in raw-file pixel coordinates. Bounds are inclusive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadRegion {
    LabXy {
        name: String,
        /// Restrict to one panel by name; `None` applies everywhere.
        panel: Option<String>,
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
    },
    RawFsSs {
        name: String,
        panel: Option<String>,
        min_fs: f64,
        max_fs: f64,
        min_ss: f64,
        max_ss: f64,
    },
}

impl BadRegion {
    pub fn name(&self) -> &str {
        match self {
            BadRegion::LabXy { name, .. } | BadRegion::RawFsSs { name, .. } => name,
        }
    }

    pub fn panel(&self) -> Option<&str> {
        match self {
            BadRegion::LabXy { panel, .. } | BadRegion::RawFsSs { panel, .. } => {
                panel.as_deref()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_coordinate_field_fixes_the_frame() {
        let mut r = BadRegionTemplate::new("bad0");
        r.apply(BadRegionField::MinX, "-1").unwrap();
        assert_eq!(r.frame, Some(BadRegionFrame::LabXy));
        assert_eq!(
            r.apply(BadRegionField::MinFs, "0"),
            Err(BadRegionFieldError::MixedFrame)
        );
    }

    #[test]
    fn same_frame_fields_keep_applying() {
        let mut r = BadRegionTemplate::new("badspot");
        r.apply(BadRegionField::MinFs, "10").unwrap();
        r.apply(BadRegionField::MaxFs, "20").unwrap();
        r.apply(BadRegionField::Panel, "q1").unwrap();
        assert_eq!(r.frame, Some(BadRegionFrame::RawFsSs));
        assert_eq!(r.panel.as_deref(), Some("q1"));
    }

    #[test]
    fn panel_scoping_does_not_fix_the_frame() {
        let mut r = BadRegionTemplate::new("badv");
        r.apply(BadRegionField::Panel, "q0").unwrap();
        assert_eq!(r.frame, None);
        r.apply(BadRegionField::MinY, "5").unwrap();
        assert_eq!(r.frame, Some(BadRegionFrame::LabXy));
    }

    #[test]
    fn unassigned_region_does_not_finalize() {
        let mut r = BadRegionTemplate::new("badx");
        assert!(r.finalize().is_none());
        r.apply(BadRegionField::MinX, "0").unwrap();
        assert!(r.finalize().is_some());
    }

    #[test]
    fn unwritten_bounds_stay_unbounded() {
        let mut r = BadRegionTemplate::new("bady");
        r.apply(BadRegionField::MinX, "3").unwrap();
        match r.finalize().unwrap() {
            BadRegion::LabXy { min_x, max_x, .. } => {
                assert_eq!(min_x, 3.0);
                assert_eq!(max_x, f64::INFINITY);
            }
            other => panic!("unexpected region {other:?}"),
        }
    }
}
