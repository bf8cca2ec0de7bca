use hym_core::domain::{FieldData, FieldKind, MeshDims};
use hym_core::layout::RecordLayout;
use hym_core::metadata::{MeshCoordinates, encode_mesh_file, render_status_source};
use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const DIMS: MeshDims = MeshDims::new(2, 3, 4);

fn stage_run(temp: &TempDir, cycles: usize) -> (PathBuf, PathBuf) {
    let data = temp.path().join("data");
    let output = temp.path().join("out");
    fs::create_dir_all(&data).expect("data dir should be created");
    fs::create_dir_all(&output).expect("output dir should be created");
    fs::write(data.join("hstat.d"), render_status_source(DIMS, cycles))
        .expect("status file should be written");
    fs::write(
        data.join("hgrid.d"),
        encode_mesh_file(&MeshCoordinates::uniform(DIMS, 1.0, 1.0, 2.0 * PI)),
    )
    .expect("mesh file should be written");

    for kind in [FieldKind::Pressure, FieldKind::Velocity] {
        let layout = RecordLayout::new(DIMS, kind.arity());
        let mut bytes = Vec::new();
        for cycle in 1..=cycles {
            let component = vec![cycle as f32; DIMS.cell_count()];
            let field = match kind.component_names() {
                None => FieldData::Scalar(component),
                Some(_) => FieldData::Vector([component.clone(), component.clone(), component]),
            };
            bytes.extend(
                layout
                    .encode_record(cycle as i32, cycle as f64 * 0.5, &field)
                    .expect("record should encode"),
            );
        }
        fs::write(data.join(kind.source_file()), bytes).expect("field file should be written");
    }
    (data, output)
}

fn run_cli_command(args: &[&str]) -> Output {
    Command::new(binary_path())
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("CLI command should run")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp paths should be UTF-8")
}

fn binary_path() -> &'static str {
    env!("CARGO_BIN_EXE_hym2viz")
}

#[test]
fn convert_writes_one_database_per_cycle() {
    let temp = TempDir::new().expect("tempdir should be created");
    let (data, output) = stage_run(&temp, 2);

    let result = run_cli_command(&["convert", path_arg(&data), path_arg(&output), "0", "10010"]);
    assert_eq!(
        result.status.code(),
        Some(0),
        "convert should succeed, stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(
        stdout.contains("Converted 2 cycle(s), ignored 0 of 2 total"),
        "stdout: {}",
        stdout
    );
    assert!(output.join("HYM_001.vdb").is_file());
    assert!(output.join("HYM_002.vdb").is_file());
    assert!(!output.join("SILO_Report.n").exists());
}

#[test]
fn convert_applies_option_file_and_flag_overrides() {
    let temp = TempDir::new().expect("tempdir should be created");
    let (data, output) = stage_run(&temp, 1);
    let options = temp.path().join("options.json");
    fs::write(&options, r#"{"databasePrefix": "FRC", "writeAscii": false}"#)
        .expect("options file should be written");

    let result = run_cli_command(&[
        "convert",
        path_arg(&data),
        path_arg(&output),
        "1",
        "10000",
        "--options",
        path_arg(&options),
        "--half-domain",
        "--ascii",
    ]);
    assert_eq!(
        result.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    assert!(output.join("FRC_001.vdb").is_file());
    assert!(output.join("p3out_001.dat").is_file());

    let document: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(output.join("FRC_001.vdb")).expect("database should be readable"),
    )
    .expect("database should be JSON");
    assert_eq!(document["mesh"]["dims"][2], 5);
    assert_eq!(document["mesh"]["loOffset"], 0);
    assert_eq!(document["mesh"]["hiOffset"], 0);
    assert_eq!(document["mesh"]["seamLayers"], 1);
}

#[test]
fn missing_field_file_fails_with_io_code() {
    let temp = TempDir::new().expect("tempdir should be created");
    let (data, output) = stage_run(&temp, 2);

    let result = run_cli_command(&["convert", path_arg(&data), path_arg(&output), "0", "00001"]);
    assert_eq!(
        result.status.code(),
        Some(3),
        "missing current density file should be an IO failure, stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("ERROR: [IO.SOURCE_MISSING]"), "stderr: {}", stderr);
    assert!(stderr.contains("FATAL EXIT CODE: 3"), "stderr: {}", stderr);
}

#[test]
fn malformed_flags_and_missing_directories_fail_with_input_codes() {
    let temp = TempDir::new().expect("tempdir should be created");
    let (data, output) = stage_run(&temp, 1);

    let flags = run_cli_command(&["convert", path_arg(&data), path_arg(&output), "0", "10x00"]);
    assert_eq!(flags.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&flags.stderr).contains("INPUT.DATA_FLAGS"));

    let absent = temp.path().join("absent");
    let missing = run_cli_command(&["convert", path_arg(&absent), path_arg(&output), "0", "10000"]);
    assert_eq!(missing.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&missing.stderr).contains("IO.PATH_MISSING"));

    let conflict = run_cli_command(&[
        "convert",
        path_arg(&data),
        path_arg(&output),
        "0",
        "10000",
        "--half-domain",
        "--ghost-layers",
        "2",
    ]);
    assert_eq!(conflict.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&conflict.stderr).contains("INPUT.CLI_USAGE"));
}

#[test]
fn extract_prints_time_dims_and_component_ranges() {
    let temp = TempDir::new().expect("tempdir should be created");
    let (data, output) = stage_run(&temp, 2);
    let converted = run_cli_command(&["convert", path_arg(&data), path_arg(&output), "2", "10010"]);
    assert_eq!(converted.status.code(), Some(0));

    let database = output.join("HYM_002.vdb");
    let result = run_cli_command(&["extract", path_arg(&database), "velocity", "--vector"]);
    assert_eq!(
        result.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("time: 1"), "stdout: {}", stdout);
    assert!(stdout.contains("dims: (  2,  3,  4)"), "stdout: {}", stdout);
    assert!(
        stdout.contains("velocity[axial]: min=2.000000e0 max=2.000000e0"),
        "stdout: {}",
        stdout
    );

    let wrong_rank = run_cli_command(&["extract", path_arg(&database), "pressure", "--vector"]);
    assert_eq!(wrong_rank.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&wrong_rank.stderr).contains("INPUT.DB_VARIABLE"));
}

#[test]
fn help_exits_cleanly() {
    let result = run_cli_command(&["--help"]);
    assert_eq!(result.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&result.stdout).contains("convert"));
}
