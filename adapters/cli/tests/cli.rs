use std::process::{Command, Output};

const MAP: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../maps/warehouse.txt");

fn warehouse(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_warehouse"))
        .args(args)
        .output()
        .expect("failed to launch the warehouse binary")
}

#[test]
fn check_map_summarises_the_layout() {
    let output = warehouse(&["check-map", "--map", MAP, "--columns", "12", "--rows", "8"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    assert!(stdout.contains("shelves:   12 (12 stocked)"), "{stdout}");
    assert!(stdout.contains("exits:     2"), "{stdout}");
    assert!(stdout.contains("chargers:  2"), "{stdout}");
}

#[test]
fn run_prints_a_json_report() {
    let output = warehouse(&[
        "run", "--map", MAP, "--columns", "12", "--rows", "8", "--ticks", "5", "--json",
    ]);

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["metrics"]["ticks"], 5);
    assert_eq!(report["outcome"]["Failure"], "TickBudgetExceeded");
}

#[test]
fn mismatched_dimensions_are_reported() {
    let output = warehouse(&["check-map", "--map", MAP, "--columns", "12", "--rows", "9"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("utf-8 output");
    assert!(stderr.contains("failed to load map"), "{stderr}");
}
