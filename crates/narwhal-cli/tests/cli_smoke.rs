use assert_cmd::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn scene() -> PathBuf {
    let fixture = repo_root().join("fixtures").join("scenes").join("edit.json");
    assert!(fixture.exists(), "fixture missing: {}", fixture.display());
    fixture
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn cli_renders_svg_to_stdout() {
    let exe = assert_cmd::cargo_bin!("narwhal-cli");
    let output = Command::new(exe)
        .args(["render", scene().to_string_lossy().as_ref()])
        .output()
        .expect("run cli");
    assert!(output.status.success());

    let svg = String::from_utf8(output.stdout).expect("utf-8 svg");
    assert!(svg.starts_with("<svg"), "output is not SVG");
    assert!(svg.contains("#000080"), "line color missing");
}

#[test]
fn cli_renders_scaled_png() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = tmp.path().join("out.png");

    let exe = assert_cmd::cargo_bin!("narwhal-cli");
    Command::new(exe)
        .args([
            "render",
            "--format",
            "png",
            "--scale",
            "2",
            "--out",
            out.to_string_lossy().as_ref(),
            scene().to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let bytes = fs::read(&out).expect("read png");
    assert!(
        bytes.starts_with(b"\x89PNG\r\n\x1a\n"),
        "output is not a PNG"
    );
    let decoder = png::Decoder::new(bytes.as_slice());
    let reader = decoder.read_info().expect("png header");
    let info = reader.info();
    assert_eq!((info.width, info.height), (200, 200));
}

#[test]
fn cli_renders_png_with_default_out_path_for_file_input() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let tmp_scene = tmp.path().join("edit.json");
    fs::copy(scene(), &tmp_scene).expect("copy fixture");

    let exe = assert_cmd::cargo_bin!("narwhal-cli");
    Command::new(exe)
        .args([
            "render",
            "--format",
            "png",
            tmp_scene.to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let bytes = fs::read(tmp_scene.with_extension("png")).expect("read png");
    assert!(
        bytes.starts_with(b"\x89PNG\r\n\x1a\n"),
        "output is not a PNG"
    );
}

#[test]
fn cli_replays_a_draw_script() {
    let root = repo_root();
    let script = root.join("fixtures").join("scripts").join("draw.json");
    let tmp = tempfile::tempdir().expect("tempdir");
    let svg = tmp.path().join("after.svg");

    let exe = assert_cmd::cargo_bin!("narwhal-cli");
    let output = Command::new(exe)
        .args([
            "replay",
            "--events",
            script.to_string_lossy().as_ref(),
            "--svg",
            svg.to_string_lossy().as_ref(),
            scene().to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run cli");
    assert!(output.status.success());

    let json = stdout_json(&output);
    let lines = &json["sources"]["lines"]["data"];
    assert_eq!(lines["xs"].as_array().map(Vec::len), Some(2));
    assert_eq!(lines["name"][1], "new");
    assert_eq!(lines["xs"][1].as_array().map(Vec::len), Some(3));
    // The active tool keeps showing every vertex of both rows.
    assert_eq!(
        json["sources"]["vertices"]["data"]["x"].as_array().map(Vec::len),
        Some(6)
    );

    let tooltips = json["tooltips"].as_array().expect("tooltips");
    assert_eq!(tooltips.len(), 1);
    assert_eq!(tooltips[0]["rows"][0]["value"], "q");
    assert_eq!(tooltips[0]["rows"][1]["value"], "60.0");

    assert!(fs::read_to_string(&svg).expect("read svg").starts_with("<svg"));
}

#[test]
fn cli_replays_an_edit_script() {
    let script = repo_root().join("fixtures").join("scripts").join("edit.json");

    let exe = assert_cmd::cargo_bin!("narwhal-cli");
    let output = Command::new(exe)
        .args([
            "replay",
            "--pretty",
            "--events",
            script.to_string_lossy().as_ref(),
            scene().to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run cli");
    assert!(output.status.success());

    let json = stdout_json(&output);
    let xs = json["sources"]["lines"]["data"]["xs"][0]
        .as_array()
        .expect("xs")
        .iter()
        .map(|v| v.as_f64().expect("number"))
        .collect::<Vec<_>>();
    assert_eq!(xs.len(), 3);
    assert!((xs[2] - 95.0).abs() < 1e-6, "dragged vertex at {}", xs[2]);
}

#[test]
fn cli_hit_tests_every_renderer() {
    let exe = assert_cmd::cargo_bin!("narwhal-cli");
    let output = Command::new(exe)
        .args([
            "hit",
            "--sx",
            "20",
            "--sy",
            "50",
            scene().to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run cli");
    assert!(output.status.success());

    let json = stdout_json(&output);
    let hits = json.as_array().expect("array");
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0]["name"], "lines");
    assert_eq!(hits[0]["selection"]["indices"], serde_json::json!([]));
    assert_eq!(hits[2]["name"], "points");
    assert_eq!(hits[2]["selection"]["indices"], serde_json::json!([0]));
}

#[test]
fn cli_reads_the_scene_from_stdin() {
    let exe = assert_cmd::cargo_bin!("narwhal-cli");
    let assert = assert_cmd::Command::new(exe)
        .args(["hit", "--sx", "60", "--sy", "50", "--renderer", "2", "-"])
        .write_stdin(fs::read(scene()).expect("read fixture"))
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("stdout is JSON");
    assert_eq!(json[0]["renderer"], 2);
    assert_eq!(json[0]["selection"]["indices"], serde_json::json!([1]));
}

#[test]
fn cli_rejects_bad_arguments() {
    let exe = assert_cmd::cargo_bin!("narwhal-cli");
    Command::new(exe)
        .args(["render", "--format", "gif"])
        .assert()
        .code(2);

    let exe = assert_cmd::cargo_bin!("narwhal-cli");
    Command::new(exe)
        .args(["hit", "--sx", "1", scene().to_string_lossy().as_ref()])
        .assert()
        .code(2);

    let exe = assert_cmd::cargo_bin!("narwhal-cli");
    Command::new(exe)
        .args(["replay", scene().to_string_lossy().as_ref()])
        .assert()
        .code(2);
}
