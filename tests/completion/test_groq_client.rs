// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use askdoc::completion::{CompletionClient, CompletionError, CompletionModel, GroqClient};
use askdoc::config::CompletionSettings;
use askdoc::rag::{IngestPipeline, RetrievalPolicy, SYSTEM_INSTRUCTION};
use askdoc::session::Session;
use askdoc::{AnswerOutcome, Assistant};
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::StreamExt;
use serde_json::Value;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use crate::common::{CountingEmbedder, RecordingSink};

const API_KEY: &str = "gsk_test_key";

/// What the fake endpoint answers with
#[derive(Clone)]
enum Reply {
    /// Body chunks written one by one
    Events(Vec<String>),
    Status(StatusCode, String),
}

#[derive(Clone)]
struct FakeGroq {
    reply: Reply,
    requests: Arc<Mutex<Vec<Value>>>,
}

async fn chat_completions(
    State(state): State<FakeGroq>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let expected = format!("Bearer {}", API_KEY);
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(expected.as_str());
    if !authorized {
        return (StatusCode::UNAUTHORIZED, r#"{"error":{"message":"Invalid API Key"}}"#)
            .into_response();
    }
    state.requests.lock().unwrap().push(body);

    match state.reply {
        Reply::Events(parts) => {
            let stream = futures::stream::iter(
                parts
                    .into_iter()
                    .map(|p| Ok::<_, Infallible>(Bytes::from(p))),
            );
            (
                [(header::CONTENT_TYPE, "text/event-stream")],
                Body::from_stream(stream),
            )
                .into_response()
        }
        Reply::Status(status, body) => (status, body).into_response(),
    }
}

async fn spawn_server(reply: Reply) -> (String, Arc<Mutex<Vec<Value>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = FakeGroq {
        reply,
        requests: requests.clone(),
    };
    let app = Router::new()
        .route("/openai/v1/chat/completions", post(chat_completions))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/openai/v1", addr), requests)
}

fn client_for(base_url: &str) -> GroqClient {
    GroqClient::new(&CompletionSettings {
        base_url: base_url.to_string(),
        timeout_secs: 10,
        ..Default::default()
    })
    .unwrap()
}

fn delta(content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({ "choices": [{ "index": 0, "delta": { "content": content } }] })
    )
}

async fn collect(client: &GroqClient, key: &str) -> Result<Vec<Result<String, CompletionError>>, CompletionError> {
    let stream = client
        .complete("prompt text", CompletionModel::Llama33Versatile, key)
        .await?;
    Ok(stream.collect().await)
}

#[tokio::test]
async fn test_streams_fragments_in_order() {
    let (base_url, requests) = spawn_server(Reply::Events(vec![
        ": ping\n\n".to_string(),
        delta("Hel"),
        delta("lo"),
        delta(" world"),
        "data: [DONE]\n\n".to_string(),
    ]))
    .await;

    let items = collect(&client_for(&base_url), API_KEY).await.unwrap();
    let fragments: Vec<String> = items.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(fragments, vec!["Hel", "lo", " world"]);

    let requests = requests.lock().unwrap();
    let body = &requests[0];
    assert_eq!(body["model"], "llama-3.3-70b-versatile");
    assert_eq!(body["stream"], true);
    assert_eq!(body["max_tokens"], 512);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], SYSTEM_INSTRUCTION);
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "prompt text");
}

#[tokio::test]
async fn test_event_split_across_body_chunks() {
    let line = delta("split");
    let (head, tail) = line.split_at(12);
    let (base_url, _) = spawn_server(Reply::Events(vec![
        head.to_string(),
        tail.to_string(),
        "data: [DONE]\n\n".to_string(),
    ]))
    .await;

    let items = collect(&client_for(&base_url), API_KEY).await.unwrap();
    assert_eq!(items, vec![Ok("split".to_string())]);
}

#[tokio::test]
async fn test_bad_key_is_unauthorized() {
    let (base_url, requests) = spawn_server(Reply::Events(vec![])).await;

    let err = collect(&client_for(&base_url), "wrong").await.unwrap_err();
    assert_eq!(err, CompletionError::Unauthorized { status: 401 });
    assert_eq!(err.error_code(), "UNAUTHORIZED");
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_rate_limit_mapped() {
    let (base_url, _) = spawn_server(Reply::Status(
        StatusCode::TOO_MANY_REQUESTS,
        r#"{"error":{"message":"Rate limit reached"}}"#.to_string(),
    ))
    .await;

    let err = collect(&client_for(&base_url), API_KEY).await.unwrap_err();
    assert_eq!(err, CompletionError::RateLimited);
}

#[tokio::test]
async fn test_server_error_message_extracted() {
    let (base_url, _) = spawn_server(Reply::Status(
        StatusCode::BAD_REQUEST,
        r#"{"error":{"message":"The model has been decommissioned","type":"invalid_request_error"}}"#
            .to_string(),
    ))
    .await;

    let err = collect(&client_for(&base_url), API_KEY).await.unwrap_err();
    assert_eq!(
        err,
        CompletionError::Api {
            status: 400,
            message: "The model has been decommissioned".to_string()
        }
    );
}

#[tokio::test]
async fn test_in_band_error_ends_stream() {
    let (base_url, _) = spawn_server(Reply::Events(vec![
        delta("partial"),
        "data: {\"error\":{\"message\":\"model overloaded\"}}\n\n".to_string(),
        delta("never seen"),
    ]))
    .await;

    let items = collect(&client_for(&base_url), API_KEY).await.unwrap();
    assert_eq!(
        items,
        vec![
            Ok("partial".to_string()),
            Err(CompletionError::Stream("model overloaded".to_string()))
        ]
    );
}

#[tokio::test]
async fn test_assistant_against_fake_endpoint() {
    let (base_url, _) = spawn_server(Reply::Events(vec![
        delta("Grounded"),
        delta(" answer"),
        "data: [DONE]\n\n".to_string(),
    ]))
    .await;

    let assistant = Assistant::new(
        Arc::new(CountingEmbedder::new()),
        Arc::new(client_for(&base_url)),
        IngestPipeline::default(),
        RetrievalPolicy::default(),
    );
    let mut session = Session::new(CompletionModel::default());
    session.set_api_key(API_KEY);
    assistant
        .ingest_pages(&mut session, "doc.pdf", &["The sky is blue."])
        .await
        .unwrap();

    let mut sink = RecordingSink::default();
    let answer = assistant
        .ask(&mut session, "What colour is the sky?", &mut sink)
        .await
        .unwrap();
    assert_eq!(answer.outcome, AnswerOutcome::Answered);
    assert_eq!(answer.reply, "Grounded answer");

    session.set_api_key("wrong");
    let answer = assistant
        .ask(&mut session, "Again?", &mut RecordingSink::default())
        .await
        .unwrap();
    assert_eq!(answer.outcome, AnswerOutcome::RequestFailed);
    assert!(answer.reply.starts_with("API request failed: "));
    assert_eq!(session.conversation().len(), 4);
}
