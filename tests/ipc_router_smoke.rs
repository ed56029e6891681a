use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_achievementd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn achievementd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("achievementd-router-smoke");
    let bundle_out = workspace.join("smoke-backup.zip");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request(&mut stdin, &mut reader, "1", "health", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let issued = request(&mut stdin, &mut reader, "3", "captcha.issue", json!({}));
    let captcha = issued
        .get("result")
        .and_then(|v| v.get("captcha"))
        .and_then(|v| v.as_str())
        .expect("captcha")
        .to_string();
    let _ = request(
        &mut stdin,
        &mut reader,
        "4",
        "auth.login",
        json!({
            "role": "admin",
            "email": "admin@portal.edu",
            "password": "secret",
            "captchaInput": captcha
        }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "5",
        "auth.check",
        json!({ "requiredRole": "admin" }),
    );
    let _ = request(&mut stdin, &mut reader, "6", "students.list", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "7",
        "students.register",
        json!({
            "name": "Smoke Student",
            "email": "smoke@student.com",
            "password": "pw",
            "rollNumber": "SM0001",
            "department": "Testing"
        }),
    );
    let _ = request(&mut stdin, &mut reader, "8", "achievements.list", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "9",
        "achievements.create",
        json!({
            "studentId": "st-1001",
            "title": "Smoke Award",
            "category": "award"
        }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "10",
        "participations.list",
        json!({}),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "11",
        "participations.create",
        json!({
            "studentId": "st-1002",
            "eventName": "Smoke Event"
        }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "12",
        "backup.exportWorkspaceBundle",
        json!({
            "workspacePath": workspace.to_string_lossy(),
            "outPath": bundle_out.to_string_lossy()
        }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "13",
        "backup.importWorkspaceBundle",
        json!({
            "workspacePath": workspace.to_string_lossy(),
            "inPath": bundle_out.to_string_lossy()
        }),
    );
    let _ = request(&mut stdin, &mut reader, "14", "auth.logout", json!({}));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn unknown_methods_report_not_implemented() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let payload = json!({ "id": "x", "method": "no.such.method", "params": {} });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("not_implemented")
    );

    drop(stdin);
    let _ = child.wait();
}
