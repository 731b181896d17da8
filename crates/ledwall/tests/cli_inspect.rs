#![forbid(unsafe_code)]

//! Runs the `ledwall` binary against documents on disk.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const TOPOLOGY: &str = r#"{
    "matrix-specs": { "p": { "width-height": [10, 20] } },
    "matrices": { "m": { "pos": [0, 0], "rot": "right", "spec": "p" } }
}"#;

const CONFIG: &str = r#"{
    "settings": { "gamma": 1.8 },
    "elements": {
        "b": { "id": 2, "location": [4, -2], "type": "text", "content": "hello", "font_path": "f.ttf" },
        "a": { "id": 1, "location": [1, -3], "type": "image", "filepath": "images/a.png" }
    }
}"#;

fn ledwall(dir: &Path, args: &[&str]) -> Output {
    let topology = dir.join("topology.json");
    let config = dir.join("config.json");
    fs::write(&topology, TOPOLOGY).unwrap();
    fs::write(&config, CONFIG).unwrap();
    Command::new(env!("CARGO_BIN_EXE_ledwall"))
        .arg(format!("--topology={}", topology.display()))
        .arg(format!("--config={}", config.display()))
        .arg("--viewport=200x100")
        .args(args)
        .env_remove("LEDWALL_COMMAND_FILE")
        .env_remove("LEDWALL_VIEWPORT")
        .env("LEDWALL_LOG", "warn")
        .output()
        .unwrap()
}

#[test]
fn reports_extent_scale_and_layers() {
    let dir = tempfile::tempdir().unwrap();
    let out = ledwall(dir.path(), &[]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("extent   x 0..20  y -10..0  (20x10)"), "{stdout}");
    assert!(stdout.contains("scale    10.0000"), "{stdout}");
    assert!(stdout.contains("layers   2"), "{stdout}");
    let a = stdout.find(" a ").unwrap();
    let b = stdout.find(" b ").unwrap();
    assert!(a < b, "layers print back to front:\n{stdout}");
}

#[test]
fn place_and_save_write_files() {
    let dir = tempfile::tempdir().unwrap();
    let commands = dir.path().join("led-cmd");
    let saved = dir.path().join("saved.json");
    let out = ledwall(
        dir.path(),
        &[
            &format!("--command-file={}", commands.display()),
            "--place",
            &format!("--save={}", saved.display()),
        ],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let lines = fs::read_to_string(&commands).unwrap();
    assert!(lines.starts_with("add image 1 images/a.png 1 -3\n"), "{lines}");
    assert!(lines.contains("set_text 2 hello\n"), "{lines}");

    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&saved).unwrap()).unwrap();
    assert_eq!(doc["settings"]["gamma"], 1.8);
    assert_eq!(doc["elements"]["b"]["location"], serde_json::json!([4, -2]));
}

#[test]
fn missing_topology_file_fails() {
    let out = Command::new(env!("CARGO_BIN_EXE_ledwall"))
        .arg("--topology=/nonexistent/topology.json")
        .env("LEDWALL_LOG", "off")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("error:"));
}
