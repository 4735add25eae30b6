// PistonClient against a fake execution service on an ephemeral port
use axum::extract::Json;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use testbench_common::types::RuntimeDescriptor;
use testbench_harness::{ExecutionService, HarnessError, PistonClient};
use tokio::net::TcpListener;

async fn runtimes() -> Json<Value> {
    Json(json!([
        { "language": "python", "version": "3.10.0", "aliases": ["py", "python3"] },
        { "language": "c++", "version": "10.2.0", "aliases": ["cpp", "g++"], "runtime": "gcc" }
    ]))
}

/// Echo stdin back; reject unknown languages the way Piston does
async fn execute(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let language = body["language"].as_str().unwrap_or_default();
    if language != "python" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": format!("{}-{} runtime is unknown", language, body["version"].as_str().unwrap_or("*")) })),
        );
    }

    let stdin = body["stdin"].as_str().unwrap_or_default();
    let file_name = body["files"][0]["name"].as_str().unwrap_or_default();
    if stdin == "crash" {
        return (
            StatusCode::OK,
            Json(json!({
                "language": "python",
                "version": "3.10.0",
                "run": { "stdout": "", "stderr": "Traceback", "output": "Traceback", "code": null, "signal": "SIGKILL" }
            })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "language": "python",
            "version": "3.10.0",
            "run": { "stdout": format!("{}:{}", file_name, stdin), "stderr": "", "output": stdin, "code": 0, "signal": null }
        })),
    )
}

async fn spawn_fake_piston() -> String {
    let app = Router::new()
        .route("/runtimes", get(runtimes))
        .route("/execute", post(execute));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_fetches_runtime_catalog() {
    let client = PistonClient::new(spawn_fake_piston().await);

    let catalog = client.runtimes().await.unwrap();

    assert_eq!(
        catalog,
        vec![
            RuntimeDescriptor::new("python", "3.10.0"),
            RuntimeDescriptor::new("c++", "10.2.0"),
        ]
    );
}

#[tokio::test]
async fn test_executes_program() {
    let base_url = spawn_fake_piston().await;
    // trailing slash is tolerated
    let client = PistonClient::new(format!("{}/", base_url));

    let result = client
        .execute(&RuntimeDescriptor::new("python", "3.10.0"), "main.py", "print(input())", "hello")
        .await
        .unwrap();

    let run = result.run.unwrap();
    assert_eq!(run.stdout, "main.py:hello");
    assert_eq!(run.exit_code, Some(0));
    assert!(result.compile.is_none());
}

#[tokio::test]
async fn test_signal_without_exit_code() {
    let client = PistonClient::new(spawn_fake_piston().await);

    let result = client
        .execute(&RuntimeDescriptor::new("python", "3.10.0"), "main.py", "", "crash")
        .await
        .unwrap();

    let run = result.run.unwrap();
    assert_eq!(run.exit_code, None);
    assert_eq!(run.signal.as_deref(), Some("SIGKILL"));
}

#[tokio::test]
async fn test_error_reply_keeps_service_message() {
    let client = PistonClient::new(spawn_fake_piston().await);

    let result = client
        .execute(&RuntimeDescriptor::new("cobol", "1.0.0"), "main.cob", "", "")
        .await;

    match result {
        Err(HarnessError::ExecutionService { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "cobol-1.0.0 runtime is unknown");
        }
        other => panic!("expected ExecutionService error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_service_is_network_error() {
    // bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = PistonClient::new(format!("http://{}", addr));
    let result = client.runtimes().await;

    assert!(matches!(result, Err(HarnessError::Network(_))));
}
