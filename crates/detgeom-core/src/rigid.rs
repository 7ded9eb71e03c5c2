//! Rigid bodies for geometry refinement.
//!
//! Groups and collections store indices into the template's panel and group
//! vectors rather than references, so they can never dangle and the finished
//! template stays freely shareable across threads.

use serde::{Deserialize, Serialize};

/// Position/axis corrections for one rigid group, filled in by the geometry
/// refinement stage. The template itself never computes these.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RigidGroupDeltas {
    pub d_fsx: f64,
    pub d_ssx: f64,
    pub d_cnx: f64,
    pub d_fsy: f64,
    pub d_ssy: f64,
    pub d_cny: f64,
}

/// A set of panels constrained to move as one body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigidGroup {
    pub name: String,
    /// Indices into the template's panel list, in registration order.
    pub panels: Vec<usize>,
    /// `None` until refinement has produced corrections.
    pub deltas: Option<RigidGroupDeltas>,
}

impl RigidGroup {
    pub(crate) fn new(name: String, panels: Vec<usize>) -> Self {
        Self {
            name,
            panels,
            deltas: None,
        }
    }
}

/// A named set of rigid groups refined jointly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigidGroupCollection {
    pub name: String,
    /// Indices into the template's rigid-group list.
    pub groups: Vec<usize>,
}
