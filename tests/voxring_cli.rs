use std::io::Write;
use std::process::{Command, Stdio};

fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn voxring_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_voxring").expect("voxring test binary not built")
}

#[test]
fn voxring_help_mentions_name() {
    let output = Command::new(voxring_bin())
        .arg("--help")
        .output()
        .expect("run voxring --help");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("VoxRing"));
}

#[test]
fn voxring_list_input_devices_prints_message() {
    let output = Command::new(voxring_bin())
        .arg("--list-input-devices")
        .output()
        .expect("run voxring --list-input-devices");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(
        combined.contains("audio input devices")
            || combined.contains("Failed to list audio input devices")
    );
}

#[test]
fn voxring_list_input_devices_uses_test_override() {
    let output = Command::new(voxring_bin())
        .arg("--list-input-devices")
        .env("VOXRING_TEST_DEVICES", "Desk Mic,Headset")
        .output()
        .expect("run voxring --list-input-devices");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Available audio input devices:"));
    assert!(stdout.contains("  - Desk Mic"));
    assert!(stdout.contains("  - Headset"));
}

#[test]
fn voxring_rejects_invalid_size() {
    let output = Command::new(voxring_bin())
        .args(["--size", "2"])
        .output()
        .expect("run voxring --size 2");
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--size"));
}

#[test]
fn voxring_host_mode_announces_ready_and_quits() {
    let mut child = Command::new(voxring_bin())
        .args(["--no-sounds", "--no-logs", "--geometry-emit-ms", "0"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn voxring");
    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(b"{\"cmd\":\"quit\"}\n")
            .expect("write quit");
    }
    let output = child.wait_with_output().expect("wait voxring");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let first = stdout.lines().next().expect("ready line");
    let ready: serde_json::Value = serde_json::from_str(first).expect("ready json");
    assert_eq!(ready["event"], "ready");
    assert_eq!(ready["capture_enabled"], false);
}
