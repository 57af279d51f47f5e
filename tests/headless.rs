//! Headless binary tests: NDJSON on stdout, commands on stdin
//!
//! Run with: cargo test --test headless

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc;
use std::time::Duration;

use serde_json::Value;
use serial_test::serial;

const TIMEOUT: Duration = Duration::from_secs(10);

fn spawn_cutelog(config_dir: &Path, extra_args: &[&str]) -> Child {
    Command::new(env!("CARGO_BIN_EXE_cutelog"))
        .args(["--listen-host", "127.0.0.1", "--listen-port", "0"])
        .arg("--config-dir")
        .arg(config_dir)
        .args(extra_args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn cutelog")
}

/// Stream stdout events on a channel so reads can time out
fn event_stream(stdout: ChildStdout) -> mpsc::Receiver<Value> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in BufReader::new(stdout).lines().map_while(Result::ok) {
            let event: Value = serde_json::from_str(&line).expect("stdout must be NDJSON");
            if tx.send(event).is_err() {
                break;
            }
        }
    });
    rx
}

fn wait_for(events: &mpsc::Receiver<Value>, kind: &str) -> Value {
    loop {
        let event = events
            .recv_timeout(TIMEOUT)
            .unwrap_or_else(|_| panic!("no \"{}\" event", kind));
        if event["event"] == kind {
            return event;
        }
    }
}

fn send(child: &mut Child, line: &str) {
    let stdin = child.stdin.as_mut().unwrap();
    writeln!(stdin, "{}", line).unwrap();
    stdin.flush().unwrap();
}

#[test]
#[serial]
fn test_listens_and_quits() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = spawn_cutelog(dir.path(), &[]);
    let events = event_stream(child.stdout.take().unwrap());

    let listening = wait_for(&events, "listening");
    assert!(listening["address"]
        .as_str()
        .unwrap()
        .starts_with("127.0.0.1:"));

    send(&mut child, "quit");
    wait_for(&events, "shutdown");
    assert!(child.wait().unwrap().success());

    // Defaults are written on first run
    assert!(dir.path().join("config.toml").exists());
}

#[test]
#[serial]
fn test_bad_command_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = spawn_cutelog(dir.path(), &[]);
    let events = event_stream(child.stdout.take().unwrap());
    wait_for(&events, "listening");

    send(&mut child, "frobnicate");
    let error = wait_for(&events, "error");
    assert!(error["message"].as_str().unwrap().contains("frobnicate"));

    send(&mut child, "quit");
    wait_for(&events, "shutdown");
    assert!(child.wait().unwrap().success());
}

#[test]
#[serial]
fn test_loads_records_file_from_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let records = dir.path().join("saved.json");
    std::fs::write(
        &records,
        r#"[{"msg": "late", "created": 20.0}, {"msg": "early", "created": 10.0, "name": "app"}]"#,
    )
    .unwrap();

    let mut child = spawn_cutelog(dir.path(), &[records.to_str().unwrap()]);
    let events = event_stream(child.stdout.take().unwrap());

    let created = wait_for(&events, "tab_created");
    assert_eq!(created["tab"], "saved.json");

    send(&mut child, "dump");
    let first = wait_for(&events, "record");
    assert_eq!(first["message"], "early");
    assert_eq!(first["logger"], "app");
    let second = wait_for(&events, "record");
    assert_eq!(second["message"], "late");

    send(&mut child, "quit");
    wait_for(&events, "shutdown");
    assert!(child.wait().unwrap().success());
}
