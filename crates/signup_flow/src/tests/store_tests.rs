use super::*;
use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use axum::{extract::State, http::StatusCode, routing::post, Form, Router};
use shared::domain::{JobRolesPerMonth, PainLevel, ResumesPerRole};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Copy)]
enum StoreMode {
    Confirm,
    Reject,
    ServerError,
    Garbled,
}

#[derive(Clone)]
struct StoreState {
    mode: Arc<Mutex<StoreMode>>,
    requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

async fn handle_save(
    State(state): State<StoreState>,
    Form(fields): Form<HashMap<String, String>>,
) -> (StatusCode, String) {
    state.requests.lock().await.push(fields);
    match *state.mode.lock().await {
        StoreMode::Confirm => (
            StatusCode::OK,
            serde_json::json!({
                "success": true,
                "message": "Data saved successfully",
                "timestamp": "2026-08-30T12:00:00Z",
                "row": 2,
            })
            .to_string(),
        ),
        StoreMode::Reject => (
            StatusCode::OK,
            serde_json::json!({
                "success": false,
                "message": "Unable to parse request data",
            })
            .to_string(),
        ),
        StoreMode::ServerError => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal error".to_string(),
        ),
        StoreMode::Garbled => (StatusCode::OK, "<html>Moved Temporarily</html>".to_string()),
    }
}

async fn spawn_store_server() -> Result<(String, StoreState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = StoreState {
        mode: Arc::new(Mutex::new(StoreMode::Confirm)),
        requests: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/", post(handle_save))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/"), state))
}

fn full_record() -> SignupRecord {
    SignupRecord {
        email: "user@example.com".to_string(),
        resumes_per_role: Some(ResumesPerRole::From500To1000),
        job_roles_per_month: Some(JobRolesPerMonth::TwentyOneToFifty),
        pain_level: Some(PainLevel::High),
        frustration: "screening takes entire afternoons".to_string(),
    }
}

#[tokio::test]
async fn posts_every_column_of_a_full_record() {
    let (url, state) = spawn_store_server().await.expect("spawn server");
    let store = HttpSignupStore::from_url(&url).expect("parse url");

    let ack = store.save(&full_record()).await.expect("save");
    assert!(ack.success);
    assert_eq!(ack.row, Some(2));
    assert_eq!(ack.message.as_deref(), Some("Data saved successfully"));
    assert!(ack.timestamp.is_some());

    let requests = state.requests.lock().await;
    assert_eq!(requests.len(), 1);
    let fields = &requests[0];
    assert_eq!(fields["email"], "user@example.com");
    assert_eq!(fields["resumesPerRole"], "500–1,000");
    assert_eq!(fields["jobRolesPerMonth"], "21–50");
    assert_eq!(fields["painLevel"], "4");
    assert_eq!(fields["frustration"], "screening takes entire afternoons");
}

#[tokio::test]
async fn email_only_record_posts_empty_answer_columns() {
    let (url, state) = spawn_store_server().await.expect("spawn server");
    let store = HttpSignupStore::from_url(&url).expect("parse url");

    store
        .save(&SignupRecord::email_only("user@example.com"))
        .await
        .expect("save");

    let requests = state.requests.lock().await;
    let fields = &requests[0];
    assert_eq!(fields.len(), 5);
    assert_eq!(fields["email"], "user@example.com");
    for column in ["resumesPerRole", "jobRolesPerMonth", "painLevel", "frustration"] {
        assert_eq!(fields[column], "", "column {column} should be blank");
    }
}

#[tokio::test]
async fn rejected_write_is_returned_as_an_unconfirmed_ack() {
    let (url, state) = spawn_store_server().await.expect("spawn server");
    *state.mode.lock().await = StoreMode::Reject;
    let store = HttpSignupStore::from_url(&url).expect("parse url");

    // The client reports what the store said; deciding that an unconfirmed
    // write is a failure is the flow controller's job.
    let ack = store.save(&full_record()).await.expect("save");
    assert!(!ack.success);
    assert_eq!(ack.message.as_deref(), Some("Unable to parse request data"));
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let (url, state) = spawn_store_server().await.expect("spawn server");
    *state.mode.lock().await = StoreMode::ServerError;
    let store = HttpSignupStore::from_url(&url).expect("parse url");

    let err = store.save(&full_record()).await.expect_err("save");
    assert!(matches!(err, StoreError::Status { status: 500 }));
}

#[tokio::test]
async fn unparseable_body_is_an_invalid_ack() {
    let (url, state) = spawn_store_server().await.expect("spawn server");
    *state.mode.lock().await = StoreMode::Garbled;
    let store = HttpSignupStore::from_url(&url).expect("parse url");

    let err = store.save(&full_record()).await.expect_err("save");
    assert!(matches!(err, StoreError::InvalidAck(_)));
}

#[test]
fn ack_without_success_field_parses_as_unconfirmed() {
    let ack: StoreAck =
        serde_json::from_str(r#"{"message":"ok","row":7}"#).expect("parse ack");
    assert!(!ack.success);
    assert_eq!(ack.row, Some(7));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind reserved port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let store = HttpSignupStore::from_url(&format!("http://{addr}/")).expect("parse url");
    let err = store.save(&full_record()).await.expect_err("save");
    assert!(matches!(err, StoreError::Transport(_)));
}
