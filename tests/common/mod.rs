// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Shared fakes for integration tests
#![allow(dead_code)]

use askdoc::completion::{CompletionClient, CompletionError, CompletionModel, TokenStream};
use askdoc::embeddings::{Embedder, EmbeddingError};
use askdoc::ResponseSink;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Letter-frequency embedder that counts how often it is called
#[derive(Debug, Default)]
pub struct CountingEmbedder {
    calls: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut vector = vec![0.0f32; 26];
        for c in text.chars().filter(|c| c.is_ascii_alphabetic()) {
            vector[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        26
    }

    fn model_name(&self) -> String {
        "letter-counts".to_string()
    }
}

/// What the scripted client does on the next request
#[derive(Debug, Clone)]
pub enum Script {
    Fragments(Vec<String>),
    FailRequest(CompletionError),
    FailMidStream(Vec<String>, CompletionError),
}

/// Completion client that replays a script and records prompts
pub struct ScriptedCompletion {
    script: Script,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn fragments(fragments: &[&str]) -> Self {
        Self::new(Script::Fragments(
            fragments.iter().map(|s| s.to_string()).collect(),
        ))
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(
        &self,
        prompt: &str,
        _model: CompletionModel,
        _api_key: &str,
    ) -> Result<TokenStream, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let items: Vec<Result<String, CompletionError>> = match &self.script {
            Script::Fragments(fragments) => fragments.iter().cloned().map(Ok).collect(),
            Script::FailRequest(error) => return Err(error.clone()),
            Script::FailMidStream(fragments, error) => fragments
                .iter()
                .cloned()
                .map(Ok)
                .chain(std::iter::once(Err(error.clone())))
                .collect(),
        };
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

/// Sink that records every notification
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub fragments: Vec<String>,
    pub partials: Vec<String>,
    pub completed: Vec<String>,
}

impl ResponseSink for RecordingSink {
    fn on_fragment(&mut self, fragment: &str, partial: &str) {
        self.fragments.push(fragment.to_string());
        self.partials.push(partial.to_string());
    }

    fn on_complete(&mut self, reply: &str) {
        self.completed.push(reply.to_string());
    }
}

/// Printable text of exactly `len` characters with no whitespace
pub fn text_of_len(len: usize) -> String {
    (0..len).map(|i| (b'a' + (i % 26) as u8) as char).collect()
}

/// Build a PDF with one Helvetica text line per page
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let media_box: Vec<Object> = vec![0.into(), 0.into(), 595.into(), 842.into()];
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => media_box,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Position of each marker in `text`, ignoring whitespace
pub fn marker_positions(text: &str, markers: &[&str]) -> Vec<Option<usize>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    markers.iter().map(|m| compact.find(m)).collect()
}
