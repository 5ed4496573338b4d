use std::fs;
use std::process::Command;

use voxgrid_testkit::read_metrics;

fn voxgrid() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_voxgrid"));
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn cli_meshes_imported_world_and_writes_metrics() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("voxgrid.toml");
    fs::write(
        &config,
        r#"
        [world]
        size = [64, 32, 32]
        terrain = "empty"

        [picking]
        max_distance = 100.0
        "#,
    )
    .expect("write config");

    let voxels = dir.path().join("platform.txt");
    let mut list = String::from("// 4x4 platform at z = 0\n");
    for y in 0..4 {
        for x in 0..4 {
            list.push_str(&format!("{x} {y} 0 #80c040\n"));
        }
    }
    fs::write(&voxels, list).expect("write voxel list");

    let metrics = dir.path().join("out").join("mesh-metrics.json");
    let status = voxgrid()
        .arg("--strict-config")
        .arg("--config")
        .arg(&config)
        .arg("--import")
        .arg(&voxels)
        .args(["--eye", "1.5,1.5,10"])
        .args(["--dir", "0,0,-1"])
        .arg("--place=3")
        .arg("--metrics")
        .arg(&metrics)
        .status()
        .expect("run voxgrid");
    assert!(status.success(), "voxgrid exited with {status}");

    let records = read_metrics(&metrics).expect("metrics parse");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].chunk, [0, 0, 0]);
    assert!(records.iter().all(|r| !r.truncated));
    // Platform plus the placed voxel on top of it.
    assert!(records[0].quads > 6);
    assert_eq!(records[1].quads, 0);
}

#[test]
fn cli_rejects_invalid_config_in_strict_mode() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[world]\nsize = [0, 1, 1]\n").expect("write config");

    let output = voxgrid()
        .arg("--strict-config")
        .arg("--config")
        .arg(&config)
        .output()
        .expect("run voxgrid");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("world size"), "unexpected stderr: {stderr}");
}

#[test]
fn cli_prints_resolved_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = voxgrid()
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .arg("--print-config")
        .output()
        .expect("run voxgrid");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("max_faces_per_chunk = 7000"), "unexpected stdout: {stdout}");
}
