// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod repl;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::assistant::Assistant;
use crate::completion::{CompletionModel, GroqClient};
use crate::config::AppConfig;
use crate::embeddings::load_embedding_model;
use crate::rag::IngestPipeline;
use crate::session::Session;
use crate::version;

/// Ask questions about a PDF
#[derive(Parser, Debug, Default)]
#[command(name = "askdoc")]
#[command(version = version::VERSION_NUMBER)]
#[command(about = "Chat with a PDF using retrieval and Groq-hosted models", long_about = None)]
pub struct Cli {
    /// Completion model (see /models)
    #[arg(long)]
    pub model: Option<String>,

    /// Groq API key for this session (overrides GROQ_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// PDF to process before the first prompt
    #[arg(long, env = "ASKDOC_PDF")]
    pub pdf: Option<PathBuf>,

    /// OpenAI-compatible base URL
    #[arg(long)]
    pub base_url: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of the environment configuration
    pub fn apply(&self, config: &mut AppConfig) -> Result<()> {
        if let Some(name) = &self.model {
            config.completion.model = name
                .parse::<CompletionModel>()
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
        }
        if let Some(base_url) = &self.base_url {
            config.completion.base_url = base_url.clone();
        }
        Ok(())
    }
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let mut config = AppConfig::from_env().map_err(|e| anyhow::anyhow!(e.user_message()))?;
    cli.apply(&mut config)?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    info!("Configuration: {:?}", config);

    println!("{}", version::get_version_string());
    println!("Features: {}", version::FEATURES.join(", "));
    println!();

    println!("Loading embedding model...");
    let embedder = load_embedding_model(&config.embedding)
        .await
        .context("Failed to load embedding model")?;
    let completion =
        GroqClient::new(&config.completion).context("Failed to create completion client")?;
    let pipeline = IngestPipeline::new(config.chunking).context("Invalid chunking configuration")?;

    let assistant = Assistant::new(
        Arc::new(embedder),
        Arc::new(completion),
        pipeline,
        config.retrieval,
    )
    .with_env_api_key(config.completion.api_key.clone());

    let mut session = Session::new(config.completion.model);
    if let Some(key) = &cli.api_key {
        session.set_api_key(key.clone());
    }
    info!("Started session {}", session.id());

    if !session.has_api_key() && config.completion.api_key.is_none() {
        println!(
            "{}",
            crate::assistant::SessionError::MissingApiKey.user_message()
        );
    }
    println!("Using {}...", session.model());

    if let Some(path) = &cli.pdf {
        repl::upload(&assistant, &mut session, path).await;
    }

    println!("Type /help for commands.");
    repl::run(&assistant, &mut session).await
}
