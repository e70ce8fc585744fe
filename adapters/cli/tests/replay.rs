use std::{fs, path::PathBuf, process::Command};

const VENT_ROOM: &str = r#"{
    "width": 3,
    "height": 1,
    "layout": [0, 0, 0],
    "mechanics": [
        { "type": "vent", "id": "exit", "position": { "x": 2, "y": 0 }, "open": true }
    ],
    "entities": { "players": [{ "x": 0, "y": 0 }], "capybara": { "x": 1, "y": 0 } }
}"#;

const SCRIPT: &str = r#"{"input":"join","session":"s1"}
{"input":"tick","ms":400}
"#;

fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("capyvent-{}-{name}", std::process::id()));
    fs::write(&path, contents).expect("write scratch file");
    path
}

#[test]
fn replays_a_script_file_and_prints_json_lines() {
    let level = scratch_file("level.json", VENT_ROOM);
    let script = scratch_file("script.jsonl", SCRIPT);

    let output = Command::new(env!("CARGO_BIN_EXE_capyvent"))
        .arg(&level)
        .arg("--script")
        .arg(&script)
        .arg("--final-snapshot")
        .env("RUST_LOG", "off")
        .output()
        .expect("run capyvent");

    let _ = fs::remove_file(level);
    let _ = fs::remove_file(script);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 3);

    let tick_events = lines[1]["events"].as_array().expect("events");
    assert!(tick_events
        .iter()
        .any(|event| event.get("CapybaraEscaped").is_some()));
    assert_eq!(lines[2]["snapshot"]["capybara"]["state"], "escaped");
}

#[test]
fn missing_level_fails_with_context() {
    let output = Command::new(env!("CARGO_BIN_EXE_capyvent"))
        .arg(std::env::temp_dir().join("capyvent-no-such-level.json"))
        .env("RUST_LOG", "off")
        .output()
        .expect("run capyvent");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read level"));
}
