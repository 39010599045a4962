//! In-process pipeline runs against application fixtures.

use servicedefs_generator::{GeneratorOptions, PipelineError, ScanWarning, TaskFailure};

use crate::{TestApp, TestError};

#[tokio::test]
async fn sample_app_keeps_only_bound_operations() {
    let app = TestApp::from_fixture("sample-app").unwrap();
    let report = app.generate().await.unwrap();

    assert_eq!(report.services, vec!["billing", "inventory", "orders"]);
    assert_eq!(report.missing_documents, vec!["billing"]);
    assert_eq!(report.variable_files, 3);
    assert_eq!(report.matched, 2);
    assert_eq!(
        report.written,
        vec![app.output_path("inventory"), app.output_path("orders")]
    );

    assert_eq!(app.output_operations("orders").unwrap(), vec!["getOrder"]);
    assert_eq!(app.output_operations("inventory").unwrap(), vec!["listItems"]);
    assert!(!app.output_path("billing").exists());
}

#[tokio::test]
async fn sample_app_warnings_are_absorbed() {
    let app = TestApp::from_fixture("sample-app").unwrap();
    let report = app.generate().await.unwrap();

    assert_eq!(report.warnings.len(), 3);
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, ScanWarning::MalformedDescriptor { file, .. } if file.ends_with("Broken.variables.json"))));
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, ScanWarning::UnknownOperation { service, .. } if service == "billing")));
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, ScanWarning::UnknownService { service, .. } if service == "feeds")));
}

#[tokio::test]
async fn written_definition_shape() {
    let app = TestApp::from_fixture("sample-app").unwrap();
    app.generate().await.unwrap();

    let orders = app.read_output("orders").unwrap();
    let get = &orders["getOrder"];
    assert_eq!(get["id"], "getOrder");
    assert_eq!(get["controller"], "OrderController");
    assert_eq!(get["type"], "com.acme.orders.Order");
    assert_eq!(get["operationType"], "com.acme.orders.Order");
    assert_eq!(get["service"], "orders");

    let info = &get["wmServiceOperationInfo"];
    assert_eq!(info["name"], "findOrder");
    assert_eq!(info["httpMethod"], "GET");
    assert_eq!(info["methodType"], "GET");
    assert_eq!(info["relativePath"], "/orders/{id}");
    assert_eq!(info["produces"][0], "application/json");
    assert_eq!(info["parameters"][0]["name"], "id");
    assert_eq!(info["parameters"][0]["parameterType"], "path");
    assert_eq!(info["parameters"][0]["type"], "java.lang.Long");

    let inventory = app.read_output("inventory").unwrap();
    assert_eq!(
        inventory["listItems"]["type"],
        "java.util.Map<java.lang.String,java.lang.Integer>"
    );
}

#[tokio::test]
async fn prefab_references_do_not_count() {
    let app = TestApp::from_fixture("sample-app").unwrap();
    app.generate().await.unwrap();

    // the prefab binds listOrders, which must not survive
    assert!(!app
        .output_operations("orders")
        .unwrap()
        .contains(&"listOrders".to_string()));
}

#[tokio::test]
async fn rerun_replaces_previous_output() {
    let app = TestApp::from_fixture("sample-app").unwrap();
    app.generate().await.unwrap();

    app.write(
        "app/pages/Main/Main.variables.json",
        r#"{"all": {"category": "wm.ServiceVariable", "service": "orders", "operationId": "listOrders"}}"#,
    )
    .unwrap();
    app.generate().await.unwrap();

    assert_eq!(app.output_operations("orders").unwrap(), vec!["listOrders"]);
}

#[tokio::test]
async fn broken_referenced_service_fails_run() {
    let app = TestApp::from_fixture("sample-app").unwrap();
    app.write(
        "services/inventory/designtime/inventory_API_REST_SERVICE.json",
        "{ \"swagger\": ",
    )
    .unwrap();

    let err = app.generate().await.unwrap_err();
    assert!(matches!(
        err,
        TestError::Pipeline(PipelineError::Task(TaskFailure::Build { ref service, .. })) if service == "inventory"
    ));
}

#[tokio::test]
async fn broken_unreferenced_service_fails_run() {
    let app = TestApp::from_fixture("sample-app").unwrap();
    app.write("services/legacy/designtime/legacy_API.json", "{ \"swagger\": ")
        .unwrap();

    let err = app.generate().await.unwrap_err();
    assert!(matches!(
        err,
        TestError::Pipeline(PipelineError::Task(TaskFailure::Build { ref service, .. })) if service == "legacy"
    ));
    assert!(!app.output_path("orders").exists());
    assert!(!app.output_path("inventory").exists());
}

#[tokio::test]
async fn options_file_is_honoured() {
    let app = TestApp::from_fixture("sample-app").unwrap();
    app.write("servicedefs.yaml", "pool-size: 1\noutput-dir: build/out\n")
        .unwrap();

    let report = app.generate().await.unwrap();
    assert_eq!(report.written.len(), 2);
    assert!(app
        .root()
        .join("build/out/servicedefs/orders-service-definitions.json")
        .is_file());
    assert!(!app.output_path("orders").exists());
}

#[tokio::test]
async fn pool_of_one_completes() {
    let app = TestApp::from_fixture("sample-app").unwrap();
    let options = GeneratorOptions {
        pool_size: 1,
        ..Default::default()
    };
    let report = app.generate_with(options).await.unwrap();
    assert_eq!(report.matched, 2);
}

#[tokio::test]
async fn empty_app_writes_nothing() {
    let app = TestApp::empty().unwrap();
    let report = app.generate().await.unwrap();
    assert!(report.services.is_empty());
    assert_eq!(report.variable_files, 0);
    assert!(report.written.is_empty());
}
