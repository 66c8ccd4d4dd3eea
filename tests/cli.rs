//! End-to-end runs of the `fleetline` binary with no intelligence service.

use std::path::Path;
use std::process::{Command, Output};

fn fleetline(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fleetline"))
        .args(args)
        .current_dir(dir)
        .env_remove("GEMINI_API_KEY")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run fleetline")
}

#[test]
fn track_ignores_jitter_and_sums_real_moves() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("fixes.csv"),
        "# equator walk\n0,0\n0,0.00001\n\n0,1\n",
    )
    .unwrap();

    let output = fleetline(dir.path(), &["track", "fixes.csv"]);
    assert!(output.status.success(), "track failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("69.094 mi from 1 moves (1 fixes discarded)"),
        "unexpected output: {stdout}"
    );
}

#[test]
fn track_rejects_garbage_lines() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fixes.csv"), "0,0\nsomewhere\n").unwrap();

    let output = fleetline(dir.path(), &["track", "fixes.csv"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"), "unexpected stderr: {stderr}");
}

#[test]
fn triage_computes_local_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let output = fleetline(
        dir.path(),
        &["triage", "--pay", "20", "--distance", "8", "--minutes", "30"],
    );
    assert!(output.status.success(), "triage failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2.50"), "missing $/mile: {stdout}");
    assert!(stdout.contains("40.00"), "missing $/hour: {stdout}");
    assert!(stdout.contains("High value order"), "missing alert: {stdout}");
}

#[test]
fn triage_rejects_incomplete_offer() {
    let dir = tempfile::tempdir().unwrap();
    let output = fleetline(dir.path(), &["triage", "--pay", "20", "--distance", "8"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("estimated time is required"), "unexpected stderr: {stderr}");
}

#[test]
fn simulate_delivers_and_credits_once() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fast.toml"), "[fleet]\ntick_interval_ms = 1\n").unwrap();
    std::fs::write(
        dir.path().join("scenario.json"),
        r#"{
            "drivers": [
                {"id": "d1", "name": "Ana", "status": "idle", "coordinates": {"x": 10, "y": 10}}
            ],
            "orders": [
                {"id": "o1", "customer": "Bo", "amount": 12, "coordinates": {"x": 10, "y": 13}}
            ]
        }"#,
    )
    .unwrap();

    let output = fleetline(
        dir.path(),
        &["simulate", "--scenario", "scenario.json", "--config", "fast.toml"],
    );
    assert!(output.status.success(), "simulate failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("All dispatched orders delivered"), "{stdout}");
    assert!(stdout.contains("Ana delivered Order #o1"), "{stdout}");
    assert_eq!(stdout.matches("25.00").count(), 1, "{stdout}");
    assert!(stdout.contains("delivered"), "{stdout}");
}

#[test]
fn plan_orders_by_pay_per_mile_without_service() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("jobs.json"),
        r#"[
            {"id": "slow", "platform": "GrubHub", "restaurant": "Slow Pho", "pay": 5, "distance": 5},
            {"id": "fast", "platform": "DoorDash", "restaurant": "Fast Tacos", "pay": 12, "distance": 3}
        ]"#,
    )
    .unwrap();

    let output = fleetline(dir.path(), &["plan", "jobs.json", "--ai"]);
    assert!(output.status.success(), "plan failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let fast = stdout.find("Fast Tacos").expect("fast job listed");
    let slow = stdout.find("Slow Pho").expect("slow job listed");
    assert!(fast < slow, "{stdout}");
    // --ai without a key falls back to local heuristics.
    assert!(String::from_utf8_lossy(&output.stderr).contains("local heuristics"));
}

#[test]
fn simulate_repairs_busy_driver_on_delivered_order() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fast.toml"), "[fleet]\ntick_interval_ms = 1\n").unwrap();
    std::fs::write(
        dir.path().join("scenario.json"),
        r#"{
            "drivers": [
                {"id": "d1", "name": "Ana", "status": "busy", "activeOrderId": "o1",
                 "coordinates": {"x": 10, "y": 10}}
            ],
            "orders": [
                {"id": "o1", "customer": "Bo", "amount": 12, "status": "delivered",
                 "coordinates": {"x": 10, "y": 13}}
            ]
        }"#,
    )
    .unwrap();

    let output = fleetline(
        dir.path(),
        &["simulate", "--scenario", "scenario.json", "--config", "fast.toml"],
    );
    assert!(output.status.success(), "simulate failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("All dispatched orders delivered"), "{stdout}");
    assert!(!stdout.contains("busy"), "{stdout}");
}

#[test]
fn simulate_admin_with_empty_queue_finishes_settled() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fast.toml"), "[fleet]\ntick_interval_ms = 1\n").unwrap();
    std::fs::write(
        dir.path().join("scenario.json"),
        r#"{
            "drivers": [
                {"id": "d1", "name": "Ana", "status": "idle", "coordinates": {"x": 10, "y": 10}}
            ],
            "orders": []
        }"#,
    )
    .unwrap();

    let output = fleetline(
        dir.path(),
        &["simulate", "--scenario", "scenario.json", "--config", "fast.toml", "--admin"],
    );
    assert!(output.status.success(), "simulate failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("All dispatched orders delivered"), "{stdout}");
    assert!(!stdout.contains("Stopped before"), "{stdout}");
}
