use detgeom::{template_from_file, GeometryFileError};
use std::io::Write;

const GOOD: &str = "\
; CSPAD-style two-panel excerpt
photon_energy = /LCLS/photon_energy_eV
q0a0/min_fs = 0
q0a0/max_fs = 193
q0a0/min_ss = 0
q0a0/max_ss = 184
q0a0/corner_x = 429.39
q0a0/corner_y = -187.83
q0a0/fs = -y
q0a0/ss = x
q0a0/clen = /LCLS/clen mm
q0a0/res = 9090.91
q0a0/adu_per_eV = 0.00338
q0a0/data = /entry_1/data_1/data
q0a1/min_fs = 194
q0a1/max_fs = 387
q0a1/min_ss = 0
q0a1/max_ss = 184
q0a1/corner_x = 429.29
q0a1/corner_y = 10.52
q0a1/fs = -y
q0a1/ss = x
q0a1/clen = /LCLS/clen mm
q0a1/res = 9090.91
q0a1/adu_per_eV = 0.00338
q0a1/data = /entry_1/data_1/data
rigid_group_q0 = q0a0,q0a1
rigid_group_collection_quadrants = q0
";

fn write_geometry(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(text.as_bytes()).expect("write geometry");
    file
}

#[test]
fn loads_a_geometry_file_from_disk() {
    let file = write_geometry(GOOD);
    let template = template_from_file(file.path()).expect("valid geometry");
    assert_eq!(template.panels().len(), 2);
    assert_eq!(template.rigid_groups().len(), 1);
    assert_eq!(template.slab_extents(), Some((388, 185)));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = template_from_file(dir.path().join("nope.geom")).unwrap_err();
    assert!(matches!(err, GeometryFileError::Io(_)));
}

#[test]
fn rejected_file_carries_its_diagnostics() {
    let file = write_geometry("q0a0/min_fs = 0\n");
    match template_from_file(file.path()).unwrap_err() {
        GeometryFileError::Rejected(diagnostics) => {
            assert!(detgeom::has_errors(&diagnostics));
        }
        other => panic!("unexpected error {other:?}"),
    }
}
