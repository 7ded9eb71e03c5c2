//! End-of-parse validation.
//!
//! Runs once over the accumulated builder state. Every check pushes its own
//! diagnostic and the template is rejected as a whole if any error was
//! recorded, here or during parsing. There is no partial-success result.

use crate::diagnostics::{has_errors, Diagnostic, DiagnosticKind, Scope};
use crate::panel::{AduScale, DimAxis, PanelTemplate};
use crate::parse::TemplateBuilder;
use crate::rigid::{RigidGroup, RigidGroupCollection};
use crate::template::{DataTemplate, Panel};
use log::debug;
use nalgebra::Vector3;

fn missing(diags: &mut Vec<Diagnostic>, panel: &str, what: &str) {
    diags.push(Diagnostic::error(
        Scope::Panel(panel.to_string()),
        DiagnosticKind::MissingField {
            what: what.to_string(),
        },
    ));
}

fn check_bound(
    value: Option<i32>,
    what: &str,
    panel: &str,
    diags: &mut Vec<Diagnostic>,
) -> Option<i32> {
    match value {
        None => {
            missing(diags, panel, what);
            None
        }
        Some(v) if v < 0 => {
            diags.push(Diagnostic::error(
                Scope::Panel(panel.to_string()),
                DiagnosticKind::NegativeCoordinate {
                    what: what.to_string(),
                },
            ));
            None
        }
        Some(v) => Some(v),
    }
}

fn check_dims(pt: &PanelTemplate, diags: &mut Vec<Diagnostic>) -> Option<Vec<DimAxis>> {
    // Data laid out as a plain 2D image unless the panel says otherwise.
    let Some(slots) = &pt.dims else {
        return Some(vec![DimAxis::Ss, DimAxis::Fs]);
    };

    let scope = || Scope::Panel(pt.name.clone());
    let mut dims = Vec::with_capacity(slots.len());
    let mut ok = true;
    for (index, slot) in slots.iter().enumerate() {
        match slot {
            Some(axis) => dims.push(*axis),
            None => {
                diags.push(Diagnostic::error(
                    scope(),
                    DiagnosticKind::UndefinedDimension { index },
                ));
                ok = false;
            }
        }
    }

    let found_fs = dims.iter().filter(|a| **a == DimAxis::Fs).count();
    let found_ss = dims.iter().filter(|a| **a == DimAxis::Ss).count();
    let placeholders = dims
        .iter()
        .filter(|a| **a == DimAxis::Placeholder)
        .count();
    if found_fs != 1 {
        diags.push(Diagnostic::error(
            scope(),
            DiagnosticKind::BadFastScanDimCount { found: found_fs },
        ));
        ok = false;
    }
    if found_ss != 1 {
        diags.push(Diagnostic::error(
            scope(),
            DiagnosticKind::BadSlowScanDimCount { found: found_ss },
        ));
        ok = false;
    }
    if placeholders > 1 {
        diags.push(Diagnostic::error(
            scope(),
            DiagnosticKind::TooManyPlaceholderDims {
                found: placeholders,
            },
        ));
        ok = false;
    }

    ok.then_some(dims)
}

fn check_panel(pt: &PanelTemplate, diags: &mut Vec<Diagnostic>) -> Option<Panel> {
    let name = pt.name.as_str();
    let scope = || Scope::Panel(name.to_string());
    let mut rejected = false;

    let min_fs = check_bound(pt.orig_min_fs, "the minimum FS coordinate", name, diags);
    let max_fs = check_bound(pt.orig_max_fs, "the maximum FS coordinate", name, diags);
    let min_ss = check_bound(pt.orig_min_ss, "the minimum SS coordinate", name, diags);
    let max_ss = check_bound(pt.orig_max_ss, "the maximum SS coordinate", name, diags);
    if let (Some(lo), Some(hi)) = (min_fs, max_fs) {
        if lo > hi {
            diags.push(Diagnostic::error(
                scope(),
                DiagnosticKind::InvertedRange { axis: "FS".into() },
            ));
            rejected = true;
        }
    }
    if let (Some(lo), Some(hi)) = (min_ss, max_ss) {
        if lo > hi {
            diags.push(Diagnostic::error(
                scope(),
                DiagnosticKind::InvertedRange { axis: "SS".into() },
            ));
            rejected = true;
        }
    }

    // A NaN corner (e.g. `corner_x = nan`) counts as unspecified.
    let cnx = match pt.cnx {
        Some(v) if !v.is_nan() => Some(v),
        _ => {
            missing(diags, name, "the corner X coordinate");
            None
        }
    };
    let cny = match pt.cny {
        Some(v) if !v.is_nan() => Some(v),
        _ => {
            missing(diags, name, "the corner Y coordinate");
            None
        }
    };

    let cnz_from = match &pt.cnz_from {
        Some(src) => Some(src.clone()),
        None => {
            missing(diags, name, "the camera length");
            None
        }
    };

    let pixel_pitch = match pt.res {
        None => {
            missing(diags, name, "the resolution");
            None
        }
        Some(res) if !res.is_finite() || res <= 0.0 => {
            diags.push(Diagnostic::error(
                scope(),
                DiagnosticKind::NonPositiveResolution,
            ));
            None
        }
        Some(res) => Some(1.0 / res),
    };

    let data = match &pt.data {
        Some(d) => Some(d.clone()),
        None => {
            missing(diags, name, "the data location");
            None
        }
    };

    let adu_scale = match (pt.adu_per_ev, pt.adu_per_photon) {
        (Some(ev), None) => Some(AduScale::PerEv(ev)),
        (None, Some(ph)) => Some(AduScale::PerPhoton(ph)),
        _ => {
            diags.push(Diagnostic::error(scope(), DiagnosticKind::AmbiguousGain));
            None
        }
    };

    if pt.rail.is_some() && pt.clen_for_centering.is_none() {
        diags.push(Diagnostic::error(
            scope(),
            DiagnosticKind::RailWithoutCentering,
        ));
        rejected = true;
    }
    if pt.mask_file.is_some() && pt.mask.is_none() {
        diags.push(Diagnostic::error(
            scope(),
            DiagnosticKind::MaskFileWithoutMask,
        ));
        rejected = true;
    }

    let rail = pt.rail.unwrap_or_else(Vector3::z);
    let clen_for_centering = pt.clen_for_centering.unwrap_or(0.0);
    let dims = check_dims(pt, diags);

    if rejected {
        return None;
    }
    // Diagnostics for anything still `None` were pushed above.
    (|| {
        Some(Panel {
            name: pt.name.clone(),
            orig_min_fs: min_fs?,
            orig_max_fs: max_fs?,
            orig_min_ss: min_ss?,
            orig_max_ss: max_ss?,
            cnx: cnx?,
            cny: cny?,
            cnz_from: cnz_from?,
            cnz_offset: pt.cnz_offset,
            pixel_pitch: pixel_pitch?,
            bad: pt.bad,
            fs_dir: pt.fs_dir,
            ss_dir: pt.ss_dir,
            rail,
            clen_for_centering,
            adu_scale: adu_scale?,
            max_adu: pt.max_adu,
            data: data?,
            mask: pt.mask.clone(),
            mask_file: pt.mask_file.clone(),
            satmap: pt.satmap.clone(),
            satmap_file: pt.satmap_file.clone(),
            dims: dims?,
        })
    })()
}

fn raw_bbox(pt: &PanelTemplate) -> Option<(i32, i32, i32, i32)> {
    Some((
        pt.orig_min_fs?,
        pt.orig_max_fs?,
        pt.orig_min_ss?,
        pt.orig_max_ss?,
    ))
}

fn boxes_overlap(a: (i32, i32, i32, i32), b: (i32, i32, i32, i32)) -> bool {
    a.0 <= b.1 && b.0 <= a.1 && a.2 <= b.3 && b.2 <= a.3
}

fn group_members<'a>(
    groups: &'a mut Vec<(String, Vec<String>)>,
    name: &str,
) -> &'a mut Vec<String> {
    let index = match groups.iter().position(|(n, _)| n == name) {
        Some(index) => index,
        None => {
            groups.push((name.to_string(), Vec::new()));
            groups.len() - 1
        }
    };
    &mut groups[index].1
}

fn join(groups: &mut Vec<(String, Vec<String>)>, group: &str, member: &str) {
    let members = group_members(groups, group);
    if !members.iter().any(|m| m == member) {
        members.push(member.to_string());
    }
}

/// Turn the accumulated builder state into a validated template, or return
/// every diagnostic collected along the way.
pub(crate) fn finalize(builder: TemplateBuilder) -> Result<DataTemplate, Vec<Diagnostic>> {
    let TemplateBuilder {
        defaults: _,
        panels,
        bad,
        group_defs,
        collection_defs,
        groups,
        mask_good,
        mask_bad,
        wavelength_from,
        peak_list,
        photon_energy_bandwidth,
        photon_energy_scale,
        mut diagnostics,
    } = builder;

    if panels.is_empty() {
        diagnostics.push(Diagnostic::error(Scope::Template, DiagnosticKind::NoPanels));
    }

    let checked: Vec<Option<Panel>> = panels
        .iter()
        .map(|pt| check_panel(pt, &mut diagnostics))
        .collect();

    // Placeholder counts must agree across panels, and the mask path can
    // never need more substitutions than the data path.
    let mut path_dim: Option<usize> = None;
    let mut mask_path_dim: Option<usize> = None;
    let mut mismatch = false;
    for pt in &panels {
        if let Some(data) = &pt.data {
            let n = data.matches('%').count();
            match path_dim {
                None => path_dim = Some(n),
                Some(existing) if existing != n => mismatch = true,
                Some(_) => {}
            }
        }
        if let Some(mask) = &pt.mask {
            let n = mask.matches('%').count();
            match mask_path_dim {
                None => mask_path_dim = Some(n),
                Some(existing) if existing != n => mismatch = true,
                Some(_) => {}
            }
        }
    }
    if mismatch {
        diagnostics.push(Diagnostic::error(
            Scope::Template,
            DiagnosticKind::PlaceholderCountMismatch,
        ));
    }
    if let (Some(mask_dim), Some(data_dim)) = (mask_path_dim, path_dim) {
        if mask_dim > data_dim {
            diagnostics.push(Diagnostic::error(
                Scope::Template,
                DiagnosticKind::TooManyMaskPlaceholders,
            ));
        }
    }

    let mut dim_dim: Option<usize> = None;
    let mut dim_mismatch = false;
    for pt in &panels {
        let n = match &pt.dims {
            None => 0,
            Some(slots) => slots
                .iter()
                .flatten()
                .filter(|a| **a == DimAxis::Placeholder)
                .count(),
        };
        match dim_dim {
            None => dim_dim = Some(n),
            Some(existing) if existing != n => dim_mismatch = true,
            Some(_) => {}
        }
    }
    if dim_mismatch {
        diagnostics.push(Diagnostic::error(
            Scope::Template,
            DiagnosticKind::PlaceholderDimMismatch,
        ));
    }

    // Panel lookup walks boxes in declaration order, so overlapping boxes
    // would silently shadow later panels. Reject them instead.
    for i in 0..panels.len() {
        for j in (i + 1)..panels.len() {
            if let (Some(a), Some(b)) = (raw_bbox(&panels[i]), raw_bbox(&panels[j])) {
                if boxes_overlap(a, b) {
                    diagnostics.push(Diagnostic::error(
                        Scope::Template,
                        DiagnosticKind::OverlappingPanels {
                            first: panels[i].name.clone(),
                            second: panels[j].name.clone(),
                        },
                    ));
                }
            }
        }
    }

    let mut bad_regions = Vec::new();
    for region in &bad {
        match region.finalize() {
            Some(r) => bad_regions.push(r),
            None => diagnostics.push(Diagnostic::error(
                Scope::BadRegion(region.name.clone()),
                DiagnosticKind::UnassignedBadRegion,
            )),
        }
    }

    // Per-panel registrations came first; top-level definitions extend them.
    let mut group_names = groups;
    for (group_name, members) in &group_defs {
        group_members(&mut group_names, group_name);
        for member in members.split(',') {
            let member = member.trim();
            if member.is_empty() {
                continue;
            }
            if panels.iter().any(|p| p.name == member) {
                join(&mut group_names, group_name, member);
            } else {
                diagnostics.push(Diagnostic::error(
                    Scope::RigidGroup(group_name.clone()),
                    DiagnosticKind::UnknownPanelReference {
                        name: member.to_string(),
                    },
                ));
            }
        }
    }
    if group_names.is_empty() {
        debug!("no rigid groups declared; synthesizing one per panel");
        for pt in &panels {
            group_names.push((pt.name.clone(), vec![pt.name.clone()]));
        }
    }

    let mut collection_names: Vec<(String, Vec<String>)> = Vec::new();
    for (collection_name, members) in &collection_defs {
        group_members(&mut collection_names, collection_name);
        for member in members.split(',') {
            let member = member.trim();
            if member.is_empty() {
                continue;
            }
            if group_names.iter().any(|(n, _)| n == member) {
                join(&mut collection_names, collection_name, member);
            } else {
                diagnostics.push(Diagnostic::error(
                    Scope::RigidGroupCollection(collection_name.clone()),
                    DiagnosticKind::UnknownGroupReference {
                        name: member.to_string(),
                    },
                ));
            }
        }
    }
    if collection_names.is_empty() {
        debug!("no rigid group collections declared; synthesizing 'default'");
        collection_names.push((
            "default".to_string(),
            group_names.iter().map(|(n, _)| n.clone()).collect(),
        ));
    }

    if has_errors(&diagnostics) {
        return Err(diagnostics);
    }

    let finalized: Vec<Panel> = checked.into_iter().flatten().collect();
    if finalized.len() != panels.len() {
        // Every missing panel pushed an error above, so this is unreachable,
        // but never hand out a template with panels silently dropped.
        return Err(diagnostics);
    }

    let rigid_groups: Vec<RigidGroup> = group_names
        .into_iter()
        .map(|(name, members)| {
            let indices = members
                .iter()
                .filter_map(|m| finalized.iter().position(|p| &p.name == m))
                .collect();
            RigidGroup::new(name, indices)
        })
        .collect();
    let rigid_group_collections: Vec<RigidGroupCollection> = collection_names
        .into_iter()
        .map(|(name, members)| {
            let indices = members
                .iter()
                .filter_map(|m| rigid_groups.iter().position(|g| &g.name == m))
                .collect();
            RigidGroupCollection {
                name,
                groups: indices,
            }
        })
        .collect();

    Ok(DataTemplate {
        panels: finalized,
        bad: bad_regions,
        rigid_groups,
        rigid_group_collections,
        mask_good,
        mask_bad,
        wavelength_from,
        peak_list,
        photon_energy_bandwidth,
        photon_energy_scale,
        path_dim: path_dim.unwrap_or(0),
        dim_dim: dim_dim.unwrap_or(0),
    })
}
