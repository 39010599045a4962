//! CLI regression tests for the `servicedefs` binary.
//!
//! These tests invoke the binary as a subprocess to catch regressions in flag
//! names, exit codes and output formats.
//!
//! Run with: `cargo test -p servicedefs-test`
//! Requires the `servicedefs` binary to be built first (`cargo build -p servicedefs`).

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::str::contains;

use crate::{fixtures_dir, TestApp};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns an assert_cmd Command wrapping the `servicedefs` binary.
fn servicedefs() -> Command {
    // cargo_bin is deprecated for custom build-dir setups; fine for standard workspace use.
    #[allow(deprecated)]
    Command::cargo_bin("servicedefs")
        .expect("servicedefs binary not found, run `cargo build -p servicedefs` first")
}

fn orders_description() -> PathBuf {
    fixtures_dir().join("sample-app/services/orders/designtime/orders_API.json")
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

// ---------------------------------------------------------------------------
// servicedefs generate
// ---------------------------------------------------------------------------

#[test]
fn generate_sample_app_exits_zero() {
    let app = TestApp::from_fixture("sample-app").unwrap();

    servicedefs()
        .args(["generate", "--root"])
        .arg(app.root())
        .assert()
        .success()
        .stdout(contains("Wrote 2 service definition resource(s)"));

    assert_eq!(app.output_operations("orders").unwrap(), vec!["getOrder"]);
    assert_eq!(app.output_operations("inventory").unwrap(), vec!["listItems"]);
}

#[test]
fn generate_reports_variable_warnings() {
    let app = TestApp::from_fixture("sample-app").unwrap();

    servicedefs()
        .args(["generate", "--root"])
        .arg(app.root())
        .assert()
        .success()
        .stderr(contains("service 'feeds' does not exist"));
}

#[test]
fn generate_output_dir_flag() {
    let app = TestApp::from_fixture("sample-app").unwrap();

    servicedefs()
        .args(["generate", "--output-dir", "generated", "--root"])
        .arg(app.root())
        .assert()
        .success();

    assert!(app
        .root()
        .join("generated/servicedefs/orders-service-definitions.json")
        .is_file());
}

#[test]
fn generate_verbose_lists_resources() {
    let app = TestApp::from_fixture("sample-app").unwrap();

    servicedefs()
        .args(["generate", "--verbose", "--log-format", "json", "--root"])
        .arg(app.root())
        .assert()
        .success()
        .stderr(contains("orders-service-definitions.json"))
        .stderr(contains("billing has no API documentation"));
}

#[test]
fn generate_zero_pool_size_exits_one() {
    let app = TestApp::empty().unwrap();

    servicedefs()
        .args(["generate", "--pool-size", "0", "--root"])
        .arg(app.root())
        .assert()
        .failure()
        .code(1)
        .stderr(contains("pool-size"));
}

#[test]
fn generate_missing_root_exits_three() {
    servicedefs()
        .args(["generate", "--root", "this-directory-does-not-exist"])
        .assert()
        .failure()
        .code(3);
}

#[test]
fn generate_missing_config_exits_one() {
    let app = TestApp::empty().unwrap();

    servicedefs()
        .args(["generate", "--config", "no-such-options.yaml", "--root"])
        .arg(app.root())
        .assert()
        .failure()
        .code(1)
        .stderr(contains("configuration error"));
}

#[test]
fn generate_broken_referenced_service_exits_one() {
    let app = TestApp::from_fixture("sample-app").unwrap();
    app.write("services/orders/designtime/orders_API.json", "{ \"swagger\": ")
        .unwrap();

    servicedefs()
        .args(["generate", "--root"])
        .arg(app.root())
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2002"));
}

#[test]
fn generate_broken_unreferenced_service_exits_one() {
    let app = TestApp::from_fixture("sample-app").unwrap();
    app.write("services/legacy/designtime/legacy_API.json", "{ \"swagger\": ")
        .unwrap();

    servicedefs()
        .args(["generate", "--root"])
        .arg(app.root())
        .assert()
        .failure()
        .code(1)
        .stderr(contains("legacy"));
}

// ---------------------------------------------------------------------------
// servicedefs definition
// ---------------------------------------------------------------------------

#[test]
fn definition_prints_single_operation() {
    let output = servicedefs()
        .args(["definition", "--operation", "getOrder", "--spec"])
        .arg(orders_description())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["id"], "getOrder");
    assert_eq!(json["service"], "orders");
    assert_eq!(json["wmServiceOperationInfo"]["name"], "findOrder");
}

#[test]
fn definition_unknown_operation_exits_one() {
    servicedefs()
        .args(["definition", "--operation", "cancelOrder", "--spec"])
        .arg(orders_description())
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2101"))
        .stderr(contains("cancelOrder"))
        .stderr(contains("orders"));
}

#[test]
fn definition_service_override() {
    let output = servicedefs()
        .args(["definition", "--operation", "listOrders", "--service", "sales", "--spec"])
        .arg(orders_description())
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["service"], "sales");
}

// ---------------------------------------------------------------------------
// servicedefs build
// ---------------------------------------------------------------------------

#[test]
fn build_prints_every_operation() {
    let output = servicedefs()
        .args(["build", "--spec"])
        .arg(orders_description())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    let ids: Vec<&String> = json.as_object().unwrap().keys().collect();
    assert_eq!(ids, vec!["createOrder", "getOrder", "listOrders"]);

    let parameters = json["createOrder"]["wmServiceOperationInfo"]["parameters"]
        .as_array()
        .unwrap();
    let names: Vec<&str> = parameters
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["order", "wm_auth_username", "wm_auth_password"]);
    assert_eq!(parameters[1]["parameterType"], "auth");
}

#[test]
fn build_invalid_description_exits_one() {
    servicedefs()
        .args(["build", "--spec"])
        .arg(fixtures_dir().join("invalid-parse-error.json"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2002"));
}

#[test]
fn build_missing_file_exits_three() {
    servicedefs()
        .args(["build", "--spec", "this-file-does-not-exist.json"])
        .assert()
        .failure()
        .code(3);
}

#[test]
fn unknown_log_format_is_usage_error() {
    servicedefs()
        .args(["build", "--log-format", "xml", "--spec"])
        .arg(orders_description())
        .assert()
        .failure()
        .code(2)
        .stderr(contains("unknown log format"));
}
