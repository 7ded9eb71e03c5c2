//! Line-oriented parser for the geometry description text.
//!
//! The whole description is consumed in one pass, accumulating panels, bad
//! regions, rigid-group definitions and top-level settings into a
//! [`TemplateBuilder`]. Problems never abort the pass; they are recorded as
//! diagnostics and judged by the validator afterwards.

use crate::badregion::{BadRegionField, BadRegionFieldError, BadRegionTemplate};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Scope};
use crate::panel::{PanelField, PanelTemplate};
use crate::units::EnergySource;
use log::warn;

/// Everything accumulated from the text before validation.
#[derive(Debug)]
pub(crate) struct TemplateBuilder {
    pub defaults: PanelTemplate,
    pub panels: Vec<PanelTemplate>,
    pub bad: Vec<BadRegionTemplate>,
    /// Top-level `rigid_group_<name> = p0,p1,...` definitions, in order.
    pub group_defs: Vec<(String, String)>,
    /// Top-level `rigid_group_collection_<name> = g0,g1,...` definitions.
    pub collection_defs: Vec<(String, String)>,
    /// Memberships registered via the per-panel `rigid_group` field:
    /// (group name, panel names in registration order).
    pub groups: Vec<(String, Vec<String>)>,
    pub mask_good: u32,
    pub mask_bad: u32,
    pub wavelength_from: Option<EnergySource>,
    pub peak_list: Option<String>,
    pub photon_energy_bandwidth: Option<f64>,
    pub photon_energy_scale: Option<f64>,
    pub diagnostics: Vec<Diagnostic>,
}

impl TemplateBuilder {
    fn new() -> Self {
        Self {
            defaults: PanelTemplate::defaults(),
            panels: Vec::new(),
            bad: Vec::new(),
            group_defs: Vec::new(),
            collection_defs: Vec::new(),
            groups: Vec::new(),
            mask_good: 0,
            mask_bad: 0,
            wavelength_from: None,
            peak_list: None,
            photon_energy_bandwidth: None,
            photon_energy_scale: None,
            diagnostics: Vec::new(),
        }
    }

    fn error(&mut self, line: usize, scope: Scope, kind: DiagnosticKind) {
        warn!("geometry line {line}: {kind}");
        self.diagnostics
            .push(Diagnostic::error(scope, kind).at_line(line));
    }

    fn warning(&mut self, line: usize, scope: Scope, kind: DiagnosticKind) {
        warn!("geometry line {line}: {kind}");
        self.diagnostics
            .push(Diagnostic::warning(scope, kind).at_line(line));
    }

    /// Existing panel with this name, or a new one seeded from the defaults.
    fn panel_mut(&mut self, name: &str) -> &mut PanelTemplate {
        let index = match self.panels.iter().position(|p| p.name == name) {
            Some(index) => index,
            None => {
                self.panels
                    .push(PanelTemplate::from_defaults(name, &self.defaults));
                self.panels.len() - 1
            }
        };
        &mut self.panels[index]
    }

    fn bad_mut(&mut self, name: &str) -> &mut BadRegionTemplate {
        let index = match self.bad.iter().position(|b| b.name == name) {
            Some(index) => index,
            None => {
                self.bad.push(BadRegionTemplate::new(name));
                self.bad.len() - 1
            }
        };
        &mut self.bad[index]
    }

    /// Register `panel` into the named rigid group, creating the group on
    /// first mention. Repeated registrations are kept once.
    fn join_group(&mut self, group: &str, panel: &str) {
        let entry = match self.groups.iter().position(|(name, _)| name == group) {
            Some(index) => &mut self.groups[index],
            None => {
                self.groups.push((group.to_string(), Vec::new()));
                let last = self.groups.len() - 1;
                &mut self.groups[last]
            }
        };
        if !entry.1.iter().any(|p| p == panel) {
            entry.1.push(panel.to_string());
        }
    }
}

/// Mask bit values may be decimal or `0x`-prefixed hex.
fn parse_mask_bits(value: &str) -> Option<u32> {
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        value.parse::<u32>().ok()
    }
}

fn invalid_value(key: &str, value: &str, reason: impl ToString) -> DiagnosticKind {
    DiagnosticKind::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_toplevel(builder: &mut TemplateBuilder, line_no: usize, key: &str, value: &str) {
    if let Some(name) = key.strip_prefix("rigid_group_collection_") {
        builder
            .collection_defs
            .push((name.to_string(), value.to_string()));
        return;
    }
    if let Some(name) = key.strip_prefix("rigid_group_") {
        builder.group_defs.push((name.to_string(), value.to_string()));
        return;
    }

    match key {
        "mask_bad" => match parse_mask_bits(value) {
            Some(bits) => builder.mask_bad = bits,
            None => builder.warning(
                line_no,
                Scope::Template,
                invalid_value(key, value, "expected a decimal or 0x hex integer"),
            ),
        },
        "mask_good" => match parse_mask_bits(value) {
            Some(bits) => builder.mask_good = bits,
            None => builder.warning(
                line_no,
                Scope::Template,
                invalid_value(key, value, "expected a decimal or 0x hex integer"),
            ),
        },
        "photon_energy" => builder.wavelength_from = Some(EnergySource::parse(value)),
        "peak_list" => builder.peak_list = Some(value.to_string()),
        "photon_energy_bandwidth" => match value.parse::<f64>() {
            Ok(v) => builder.photon_energy_bandwidth = Some(v),
            Err(_) => builder.warning(
                line_no,
                Scope::Template,
                invalid_value(key, value, "expected a number"),
            ),
        },
        "photon_energy_scale" => match value.parse::<f64>() {
            Ok(v) => builder.photon_energy_scale = Some(v),
            Err(_) => builder.warning(
                line_no,
                Scope::Template,
                invalid_value(key, value, "expected a number"),
            ),
        },
        _ => match PanelField::parse(key) {
            // A bare `rigid_group` with no panel prefix names nothing.
            Some(PanelField::RigidGroup) | None => builder.warning(
                line_no,
                Scope::Template,
                DiagnosticKind::UnknownTopLevelField {
                    key: key.to_string(),
                },
            ),
            Some(field) => {
                if let Err(e) = builder.defaults.apply(field, value) {
                    builder.error(line_no, Scope::Template, invalid_value(key, value, e));
                }
            }
        },
    }
}

fn parse_panel_field(
    builder: &mut TemplateBuilder,
    line_no: usize,
    panel_name: &str,
    key: &str,
    value: &str,
) {
    // The panel exists from its first mention, whatever the field is.
    builder.panel_mut(panel_name);
    match PanelField::parse(key) {
        None => builder.warning(
            line_no,
            Scope::Panel(panel_name.to_string()),
            DiagnosticKind::UnknownField {
                key: key.to_string(),
            },
        ),
        Some(PanelField::RigidGroup) => builder.join_group(value, panel_name),
        Some(field) => {
            let result = builder.panel_mut(panel_name).apply(field, value);
            if let Err(e) = result {
                builder.error(
                    line_no,
                    Scope::Panel(panel_name.to_string()),
                    invalid_value(key, value, e),
                );
            }
        }
    }
}

fn parse_bad_field(
    builder: &mut TemplateBuilder,
    line_no: usize,
    region_name: &str,
    key: &str,
    value: &str,
) {
    builder.bad_mut(region_name);
    match BadRegionField::parse(key) {
        None => builder.warning(
            line_no,
            Scope::BadRegion(region_name.to_string()),
            DiagnosticKind::UnknownField {
                key: key.to_string(),
            },
        ),
        Some(field) => {
            let result = builder.bad_mut(region_name).apply(field, value);
            match result {
                Ok(()) => {}
                Err(BadRegionFieldError::MixedFrame) => builder.error(
                    line_no,
                    Scope::BadRegion(region_name.to_string()),
                    DiagnosticKind::MixedBadRegionFrame,
                ),
                Err(e) => builder.error(
                    line_no,
                    Scope::BadRegion(region_name.to_string()),
                    invalid_value(key, value, e),
                ),
            }
        }
    }
}

/// Consume the whole description text into an unvalidated builder.
pub(crate) fn parse_template(text: &str) -> TemplateBuilder {
    let text = text.replace('\r', "\n");
    let mut builder = TemplateBuilder::new();

    for (index, raw_line) in text.split('\n').enumerate() {
        let line_no = index + 1;

        // Comments run to the end of the line.
        let line = raw_line.trim_start();
        let line = match line.find(';') {
            Some(pos) => &line[..pos],
            None => line,
        };
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        if line.matches('=').count() != 1 {
            builder.error(
                line_no,
                Scope::Template,
                DiagnosticKind::MalformedLine {
                    line: line.to_string(),
                },
            );
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        // `object/field` addresses a panel or bad region; the object name is
        // everything before the last slash.
        match key.rsplit_once('/') {
            None => parse_toplevel(&mut builder, line_no, key, value),
            Some((object, field_key)) if object.starts_with("bad") => {
                parse_bad_field(&mut builder, line_no, object, field_key, value)
            }
            Some((object, field_key)) => {
                parse_panel_field(&mut builder, line_no, object, field_key, value)
            }
        }
    }

    builder
}
