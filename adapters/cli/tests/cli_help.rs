use std::process::Command;

#[test]
fn help_lists_every_room_override() {
    let output = Command::new(env!("CARGO_BIN_EXE_capyvent"))
        .arg("--help")
        .output()
        .expect("run capyvent --help");

    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    for flag in [
        "--script",
        "--max-players",
        "--laser-visibility-ms",
        "--capybara-step-ms",
        "--any-vent",
        "--final-snapshot",
    ] {
        assert!(help.contains(flag), "help should mention {flag}");
    }
    assert!(help.contains("<LEVEL>"));
}
