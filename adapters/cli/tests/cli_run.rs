use std::process::Command;

const DEMO: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../stages/demo.toml");

#[test]
fn cli_runs_the_demo_stage_to_a_report() {
    let output = Command::new(env!("CARGO_BIN_EXE_action-stage"))
        .args([DEMO, "--fps", "30", "--place", "pea@2,1", "--place", "sun@1,0"])
        .output()
        .expect("failed to invoke the action-stage binary");

    assert!(output.status.success(), "run should succeed: {output:?}");
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout holds a JSON report");
    let state = report["state"].as_str().expect("state is a string");
    assert!(state == "Won" || state == "Lost", "unexpected state {state}");
    assert!(report["result"]["elapsed_seconds"].as_f64().unwrap_or_default() > 0.0);
    assert!(report["steps"].as_u64().unwrap_or_default() > 0);
}

#[test]
fn cli_rejects_unknown_units() {
    let output = Command::new(env!("CARGO_BIN_EXE_action-stage"))
        .args([DEMO, "--place", "dragon@0,0"])
        .output()
        .expect("failed to invoke the action-stage binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("dragon"), "stderr was: {stderr}");
}

#[test]
fn cli_rejects_frame_rates_without_a_usable_step() {
    for fps in ["0", "2000000000"] {
        let output = Command::new(env!("CARGO_BIN_EXE_action-stage"))
            .args([DEMO, "--fps", fps])
            .output()
            .expect("failed to invoke the action-stage binary");

        assert!(!output.status.success(), "--fps {fps} should be rejected");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("--fps"), "stderr was: {stderr}");
    }
}
