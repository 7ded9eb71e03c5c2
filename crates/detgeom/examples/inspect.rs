//! Load a geometry file and print where each panel's corners sit in the lab
//! frame.
//!
//! Usage: `cargo run --example inspect -- detector.geom`

use detgeom::template_from_file;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("usage: inspect <geometry-file>")?;
    let template = template_from_file(&path)?;

    for panel in template.panels() {
        let (x0, y0) = panel.lab_position(0.0, 0.0);
        let (x1, y1) = panel.lab_position(panel.width() as f64, panel.height() as f64);
        println!(
            "{}: ({x0:.1}, {y0:.1}) .. ({x1:.1}, {y1:.1}) px{}",
            panel.name,
            if panel.bad { "  [not indexed]" } else { "" },
        );
    }
    Ok(())
}
