//! Inspect a detector geometry description.
//!
//! Reads a geometry file, validates it, and prints either a human-readable
//! summary or the full template as JSON. Every problem in a rejected file is
//! reported at once, with line numbers where known.

use clap::Parser;
use detgeom::{template_from_file, DataTemplate, GeometryFileError, Severity};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "detgeom", version, about = "Validate and inspect detector geometry files")]
struct Args {
    /// Geometry description file.
    geometry: PathBuf,

    /// Print the validated template as JSON instead of a summary.
    #[arg(long)]
    json: bool,
}

fn print_summary(template: &DataTemplate) {
    println!("panels: {}", template.panels().len());
    for panel in template.panels() {
        println!(
            "  {}: {}x{} px at raw ({},{})..({},{})",
            panel.name,
            panel.width(),
            panel.height(),
            panel.orig_min_fs,
            panel.orig_min_ss,
            panel.orig_max_fs,
            panel.orig_max_ss,
        );
    }
    println!("bad regions: {}", template.bad_regions().len());
    for region in template.bad_regions() {
        println!("  {}", region.name());
    }
    println!("rigid groups: {}", template.rigid_groups().len());
    for group in template.rigid_groups() {
        let names: Vec<&str> = group
            .panels
            .iter()
            .filter_map(|&i| template.panel_name(i))
            .collect();
        println!("  {}: {}", group.name, names.join(", "));
    }
    if let Some((w, h)) = template.slab_extents() {
        println!("single-slab layout: {w}x{h}");
    }
}

fn run(args: &Args) -> Result<(), GeometryFileError> {
    let template = template_from_file(&args.geometry)?;
    if args.json {
        match serde_json::to_string_pretty(&template) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("can't serialize template: {e}"),
        }
    } else {
        print_summary(&template);
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(GeometryFileError::Io(e)) => {
            eprintln!("{}: {e}", args.geometry.display());
            ExitCode::FAILURE
        }
        Err(GeometryFileError::Rejected(diagnostics)) => {
            for d in &diagnostics {
                match d.severity {
                    Severity::Error => eprintln!("error: {d}"),
                    Severity::Warning => eprintln!("warning: {d}"),
                }
            }
            eprintln!(
                "{}: rejected with {} problem(s)",
                args.geometry.display(),
                diagnostics.len()
            );
            ExitCode::FAILURE
        }
    }
}
