// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use askdoc::completion::{CompletionError, CompletionModel};
use askdoc::rag::{IngestPipeline, RetrievalPolicy};
use askdoc::session::{Role, Session, SessionState};
use askdoc::{AnswerOutcome, Assistant, SessionError};
use std::sync::Arc;

use crate::common::{text_of_len, CountingEmbedder, RecordingSink, Script, ScriptedCompletion};

fn assistant_with(completion: Arc<ScriptedCompletion>) -> (Assistant, Arc<CountingEmbedder>) {
    let embedder = Arc::new(CountingEmbedder::new());
    let assistant = Assistant::new(
        embedder.clone(),
        completion,
        IngestPipeline::default(),
        RetrievalPolicy::default(),
    )
    .with_env_api_key(Some("gsk_env".to_string()));
    (assistant, embedder)
}

#[tokio::test]
async fn test_streamed_answer_scenario() {
    let completion = Arc::new(ScriptedCompletion::fragments(&["Hel", "lo", " world"]));
    let (assistant, _) = assistant_with(completion.clone());
    let mut session = Session::new(CompletionModel::default());

    let text = text_of_len(1200);
    let report = assistant
        .ingest_pages(&mut session, "doc.pdf", &[text.as_str()])
        .await
        .unwrap();
    assert_eq!(report.chunks, 3);
    assert_eq!(session.state(), SessionState::Ready);

    let spans: Vec<(usize, usize)> = session
        .active_index()
        .unwrap()
        .chunks()
        .map(|c| (c.start, c.end()))
        .collect();
    assert_eq!(spans, vec![(0, 500), (450, 950), (900, 1200)]);

    let mut sink = RecordingSink::default();
    let answer = assistant
        .ask(&mut session, "What does it say?", &mut sink)
        .await
        .unwrap();

    assert_eq!(answer.outcome, AnswerOutcome::Answered);
    assert_eq!(answer.sources, 3);
    assert_eq!(answer.reply, "Hello world");
    assert_eq!(sink.fragments, vec!["Hel", "lo", " world"]);
    assert_eq!(sink.partials, vec!["Hel", "Hello", "Hello world"]);
    assert_eq!(sink.completed, vec!["Hello world"]);

    let messages = session.conversation().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "What does it say?");
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "Hello world");

    let prompt = completion.last_prompt().unwrap();
    assert!(prompt.contains("Source 1: "));
    assert!(prompt.contains("Source 3: "));
    assert!(!prompt.contains("Source 4: "));
    assert!(prompt.contains("What does it say?"));
}

#[tokio::test]
async fn test_request_failure_becomes_reply() {
    let completion = Arc::new(ScriptedCompletion::new(Script::FailRequest(
        CompletionError::Request("timeout".to_string()),
    )));
    let (assistant, _) = assistant_with(completion);
    let mut session = Session::new(CompletionModel::default());
    assistant
        .ingest_pages(&mut session, "doc.pdf", &["Some document text"])
        .await
        .unwrap();

    let before = session.conversation().len();
    let answer = assistant
        .ask(&mut session, "Anything?", &mut RecordingSink::default())
        .await
        .unwrap();

    assert_eq!(answer.outcome, AnswerOutcome::RequestFailed);
    assert_eq!(session.conversation().len(), before + 2);
    assert_eq!(
        session.conversation().last().unwrap().content,
        "API request failed: timeout"
    );
    assert_eq!(session.state(), SessionState::Ready);
}

#[tokio::test]
async fn test_mid_stream_failure_replaces_partial_answer() {
    let completion = Arc::new(ScriptedCompletion::new(Script::FailMidStream(
        vec!["The answer".to_string()],
        CompletionError::Stream("connection reset".to_string()),
    )));
    let (assistant, _) = assistant_with(completion);
    let mut session = Session::new(CompletionModel::default());
    assistant
        .ingest_pages(&mut session, "doc.pdf", &["Some document text"])
        .await
        .unwrap();

    let mut sink = RecordingSink::default();
    assistant
        .ask(&mut session, "Anything?", &mut sink)
        .await
        .unwrap();

    assert_eq!(sink.fragments, vec!["The answer"]);
    let expected = "An error occurred while processing your request: connection reset";
    assert_eq!(sink.completed, vec![expected]);
    assert_eq!(session.conversation().last().unwrap().content, expected);
    assert_eq!(session.conversation().len(), 2);
}

#[tokio::test]
async fn test_question_before_upload_is_rejected() {
    let completion = Arc::new(ScriptedCompletion::fragments(&["unused"]));
    let (assistant, _) = assistant_with(completion.clone());
    let mut session = Session::new(CompletionModel::default());

    let err = assistant
        .ask(&mut session, "Hello?", &mut RecordingSink::default())
        .await
        .unwrap_err();

    assert_eq!(err, SessionError::NoActiveIndex);
    assert!(session.conversation().is_empty());
    assert!(completion.last_prompt().is_none());
}

#[tokio::test]
async fn test_session_key_used_without_env_key() {
    let completion = Arc::new(ScriptedCompletion::fragments(&["ok"]));
    let embedder = Arc::new(CountingEmbedder::new());
    let assistant = Assistant::new(
        embedder,
        completion,
        IngestPipeline::default(),
        RetrievalPolicy::default(),
    );
    let mut session = Session::new(CompletionModel::default());
    assistant
        .ingest_pages(&mut session, "doc.pdf", &["text"])
        .await
        .unwrap();

    let err = assistant
        .ask(&mut session, "q", &mut RecordingSink::default())
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::MissingApiKey);
    assert!(session.conversation().is_empty());

    session.set_api_key("gsk_session");
    let answer = assistant
        .ask(&mut session, "q", &mut RecordingSink::default())
        .await
        .unwrap();
    assert_eq!(answer.reply, "ok");
}

#[tokio::test]
async fn test_reset_clears_conversation_and_document() {
    let completion = Arc::new(ScriptedCompletion::fragments(&["fine"]));
    let (assistant, _) = assistant_with(completion);
    let mut session = Session::new(CompletionModel::default());
    assistant
        .ingest_pages(&mut session, "doc.pdf", &["text"])
        .await
        .unwrap();
    assistant
        .ask(&mut session, "q", &mut RecordingSink::default())
        .await
        .unwrap();

    session.reset();

    assert!(session.conversation().is_empty());
    assert!(session.active_index().is_none());
    assert_eq!(session.state(), SessionState::Empty);
    assert_eq!(session.cache().len(), 1);

    let err = assistant
        .ask(&mut session, "q", &mut RecordingSink::default())
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::NoActiveIndex);
}
