use assert_cmd::Command;
use predicates::prelude::*;
use std::io::{Read, Write};
use std::net::TcpListener;

/// Minimal canned-response HTTP server for one-shot mode tests. Each
/// connection gets a single JSON response keyed on the request path.
fn spawn_stub_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut buf = [0u8; 2048];
            let n = stream.read(&mut buf).unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]).into_owned();
            let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

            let body = if path.starts_with("/api/waste-types/") {
                r##"[{"id":1,"label":"plastic","display_name":"Plastic","color":"#3B82F6"}]"##
            } else if path.starts_with("/api/waste-stats/") {
                r#"{"totalItems":10,"plasticCount":10}"#
            } else if path.starts_with("/api/waste-distribution/") {
                r##"[{"name":"Plastic","value":10,"color":"#3B82F6","percentage":100}]"##
            } else if path.starts_with("/api/waste-over-time/") {
                r#"[{"date":"Apr 03","plastic":3,"total":3}]"#
            } else if path.starts_with("/api/waste-confidence/") {
                r##"[{"name":"Plastic","confidence":92,"color":"#3B82F6"}]"##
            } else if path.starts_with("/api/recent-detections/") {
                r#"[{"id":7,"type_id":1,"type":"plastic","confidence":92,"timestamp":"2025-04-03T12:00:00Z","image":"/media/7.jpg"}]"#
            } else if path.starts_with("/api/waste-records/") {
                r#"{"results":[{"id":7,"type_id":1,"type":"plastic","confidence":92,"timestamp":"2025-04-03T12:00:00Z","image":"/media/7.jpg"}],"count":1,"next":null,"previous":null,"total_pages":1,"current_page":1}"#
            } else {
                r#"{"detail":"not found"}"#
            };

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{addr}")
}

#[test]
fn test_help_flag() {
    let mut cmd = Command::cargo_bin("wastewatch").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("wastewatch"))
        .stdout(predicate::str::contains("waste-classification monitoring"));
}

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("wastewatch").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("wastewatch"));
}

#[test]
fn test_invalid_argument() {
    let mut cmd = Command::cargo_bin("wastewatch").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_refresh_interval_validation() {
    let mut cmd = Command::cargo_bin("wastewatch").unwrap();
    cmd.args(["-t", "100"]) // Below the 1000ms floor
        .arg("--list-types")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Refresh interval too small"));
}

#[test]
fn test_date_filter_validation() {
    let mut cmd = Command::cargo_bin("wastewatch").unwrap();
    cmd.args(["--start-date", "03/04/2025"])
        .arg("--list-types")
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected YYYY-MM-DD"));
}

#[test]
fn test_page_size_validation() {
    let mut cmd = Command::cargo_bin("wastewatch").unwrap();
    cmd.args(["-p", "0"])
        .arg("--list-types")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Page size"));
}

#[test]
fn test_timeout_validation() {
    let mut cmd = Command::cargo_bin("wastewatch").unwrap();
    cmd.args(["--timeout", "0"])
        .arg("--list-types")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Request timeout"));
}

#[test]
fn test_server_url_validation() {
    let mut cmd = Command::cargo_bin("wastewatch").unwrap();
    cmd.args(["--server", "ftp://host"])
        .arg("--list-types")
        .assert()
        .failure()
        .stderr(predicate::str::contains("http:// or https://"));
}

#[test]
fn test_waste_type_label_validation() {
    let mut cmd = Command::cargo_bin("wastewatch").unwrap();
    cmd.args(["-w", "plastic bottles"])
        .arg("--list-types")
        .assert()
        .failure()
        .stderr(predicate::str::contains("waste type label"));
}

#[test]
fn test_one_shot_summary_covers_every_resource() {
    let server = spawn_stub_server();

    let mut cmd = Command::cargo_bin("wastewatch").unwrap();
    cmd.args(["--server", &server, "--timeout", "5"])
        .arg("--test")
        .assert()
        .success()
        .stdout(predicate::str::contains("All items"))
        .stdout(predicate::str::contains("Distribution (server-side)"))
        .stdout(predicate::str::contains("(100%)"))
        .stdout(predicate::str::contains("Last 7 days"))
        .stdout(predicate::str::contains("Apr 03"))
        .stdout(predicate::str::contains("3 items"))
        .stdout(predicate::str::contains("Avg. confidence"))
        .stdout(predicate::str::contains("Recent detections"))
        .stdout(predicate::str::contains("History: 1 records, page 1/1"));
}

#[test]
fn test_list_types_prints_table() {
    let server = spawn_stub_server();

    let mut cmd = Command::cargo_bin("wastewatch").unwrap();
    cmd.args(["--server", &server, "--timeout", "5"])
        .arg("--list-types")
        .assert()
        .success()
        .stdout(predicate::str::contains("plastic"))
        .stdout(predicate::str::contains("Plastic"))
        .stdout(predicate::str::contains("#3B82F6"));
}

#[test]
fn test_unreachable_server_fails_cleanly() {
    // Port 9 (discard) is not serving the API; --list-types must fail
    // with a network error rather than hang or panic.
    let mut cmd = Command::cargo_bin("wastewatch").unwrap();
    cmd.args(["--server", "http://127.0.0.1:9", "--timeout", "2"])
        .arg("--list-types")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Network failure").or(predicate::str::contains("error")));
}
