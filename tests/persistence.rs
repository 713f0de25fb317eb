//! Writing reports to disk.

use std::{
    fs,
    path::{Path, PathBuf},
};

use pump_curves::{
    config::AnalysisConfig,
    project::Project,
    report::{PersistenceError, assemble_report, fallback_path, write_report},
};

const PROJECT: &str = r#"
[[rotor]]
name = "A"
rpm = 3500.0
rows = [
    ["0", "50", "0"],
    ["10", "48", "45"],
    ["20", "42", "65"],
    ["30", "32", "72"],
    ["40", "18", "68"],
    ["50", "0", "50"],
]

[[derived]]
kind = "speed"
rotor = "A"
rpm = 2900.0

[[derived]]
kind = "parallel"
rotor = "A"

[system_curve_1]
mode = "manual_points"
rows = [["0", "8"], ["20", "14"], ["40", "26"]]

[system_curve_2]
mode = "equation"
static_head = 12.0
k_factor = 0.004
"#;

/// A fresh scratch directory for one test.
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pump-curves-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn report() -> pump_curves::report::Report {
    let config = AnalysisConfig::default();
    let project: Project = toml::from_str(PROJECT).unwrap();
    let session = project.into_session(&config).unwrap();
    assemble_report(&session, &config).unwrap()
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn writes_to_requested_path() {
    let dir = scratch("write");
    let target = dir.join("pumps.xlsx");

    let report = report();
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert_eq!(report.intersections.len(), 2);

    let written = write_report(&report, &target, |_, _| panic!("no fallback expected")).unwrap();

    assert_eq!(written, target);
    assert!(fs::read(&target).unwrap().starts_with(b"PK"));
    assert_eq!(entries(&dir), ["pumps.xlsx"]);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn confirmed_fallback_is_used_once() {
    let dir = scratch("fallback");
    let target = dir.join("pumps.xlsx");
    fs::create_dir(&target).unwrap();

    let mut asked = 0;
    let written = write_report(&report(), &target, |fallback, err| {
        asked += 1;
        assert_eq!(fallback, fallback_path(&target));
        assert!(matches!(err, PersistenceError::Write { path, .. } if *path == target));
        true
    })
    .unwrap();

    assert_eq!(asked, 1);
    assert_eq!(written, dir.join("pumps_copy.xlsx"));
    assert!(fs::read(&written).unwrap().starts_with(b"PK"));
    assert_eq!(entries(&dir), ["pumps.xlsx", "pumps_copy.xlsx"]);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn declined_fallback_leaves_nothing_behind() {
    let dir = scratch("declined");
    let target = dir.join("pumps.xlsx");
    fs::create_dir(&target).unwrap();

    let err = write_report(&report(), &target, |_, _| false).unwrap_err();

    assert!(matches!(err, PersistenceError::Write { ref path, .. } if *path == target));
    assert_eq!(entries(&dir), ["pumps.xlsx"]);
    assert!(fs::read_dir(&target).unwrap().next().is_none());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn project_file_round_trip() {
    let dir = scratch("project");
    let path = dir.join("project.toml");
    fs::write(&path, PROJECT).unwrap();

    let config = AnalysisConfig::default();
    let mut project = Project::load(&path).unwrap();
    let name = project.add_speed_variant("A", 1750.0, &config).unwrap();
    project.save(&path).unwrap();

    let session = Project::load(&path).unwrap().into_session(&config).unwrap();
    assert!(session.rotors.contains(&name));
    assert_eq!(session.rotors.len(), 4);
    fs::remove_dir_all(&dir).unwrap();
}
