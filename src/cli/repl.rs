// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Interactive loop: one command or question per line

use anyhow::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::assistant::{Assistant, ResponseSink};
use crate::completion::CompletionModel;
use crate::session::Session;

pub const HELP_TEXT: &str = "\
Commands:
  /upload <path>    Process a PDF and make it the active document
  /reset            Clear the conversation and the active document
  /model [name]     Show or change the completion model
  /models           List available models
  /key <api-key>    Set the Groq API key for this session
  /history          Show the conversation
  /help             Show this help
  /quit             Exit
Anything else is asked as a question about the active document.";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Upload(PathBuf),
    Reset,
    Model(Option<String>),
    Models,
    Key(String),
    History,
    Help,
    Quit,
    Ask(String),
    /// Malformed or unknown command, with the message to show
    Invalid(String),
}

impl ReplCommand {
    /// Parse a line; blank lines yield `None`
    pub fn parse(line: &str) -> Option<ReplCommand> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if !line.starts_with('/') {
            return Some(ReplCommand::Ask(line.to_string()));
        }

        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };

        let command = match name {
            "/upload" if arg.is_empty() => {
                ReplCommand::Invalid("Usage: /upload <path-to-pdf>".to_string())
            }
            "/upload" => ReplCommand::Upload(PathBuf::from(arg)),
            "/reset" | "/clear" => ReplCommand::Reset,
            "/model" if arg.is_empty() => ReplCommand::Model(None),
            "/model" => ReplCommand::Model(Some(arg.to_string())),
            "/models" => ReplCommand::Models,
            "/key" if arg.is_empty() => ReplCommand::Invalid("Usage: /key <api-key>".to_string()),
            "/key" => ReplCommand::Key(arg.to_string()),
            "/history" => ReplCommand::History,
            "/help" => ReplCommand::Help,
            "/quit" | "/exit" => ReplCommand::Quit,
            other => ReplCommand::Invalid(format!(
                "Unknown command: {}. Type /help for commands.",
                other
            )),
        };
        Some(command)
    }
}

/// Prints fragments to stdout as they arrive
#[derive(Debug, Default)]
pub struct TerminalSink {
    shown: String,
}

impl ResponseSink for TerminalSink {
    fn on_fragment(&mut self, fragment: &str, partial: &str) {
        print!("{}", fragment);
        let _ = std::io::stdout().flush();
        self.shown = partial.to_string();
    }

    fn on_complete(&mut self, reply: &str) {
        if self.shown.is_empty() {
            println!("{}", reply);
        } else if self.shown == reply {
            println!();
        } else {
            // Stream failed part-way; the stored reply is the error text
            println!();
            println!("{}", reply);
        }
        self.shown.clear();
    }
}

/// Run the loop on stdin until `/quit` or end of input
pub async fn run(assistant: &Assistant, session: &mut Session) -> Result<()> {
    run_with(assistant, session, BufReader::new(tokio::io::stdin())).await
}

/// Run the loop on any line source
pub async fn run_with<R>(assistant: &Assistant, session: &mut Session, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        let command = match ReplCommand::parse(&line) {
            Some(command) => command,
            None => continue,
        };
        debug!("REPL command: {:?}", command_name(&command));

        match command {
            ReplCommand::Quit => break,
            command => handle(assistant, session, command).await,
        }
    }

    Ok(())
}

/// Execute one command; errors are printed, never returned
pub async fn handle(assistant: &Assistant, session: &mut Session, command: ReplCommand) {
    match command {
        ReplCommand::Upload(path) => upload(assistant, session, &path).await,
        ReplCommand::Reset => {
            session.reset();
            println!("Chat cleared.");
        }
        ReplCommand::Model(None) => println!("Using {}...", session.model()),
        ReplCommand::Model(Some(name)) => match name.parse::<CompletionModel>() {
            Ok(model) => {
                session.set_model(model);
                println!("Using {}...", model);
            }
            Err(e) => println!("{}", e.user_message()),
        },
        ReplCommand::Models => {
            for model in CompletionModel::ALL {
                let marker = if model == session.model() { "*" } else { " " };
                println!("{} {}", marker, model);
            }
        }
        ReplCommand::Key(key) => {
            session.set_api_key(key);
            println!("API key set for this session.");
        }
        ReplCommand::History => {
            if session.conversation().is_empty() {
                println!("No messages yet.");
            }
            for message in session.conversation().messages() {
                println!("[{}] {}", message.role, message.content);
            }
        }
        ReplCommand::Help => println!("{}", HELP_TEXT),
        ReplCommand::Quit => {}
        ReplCommand::Ask(question) => {
            let mut sink = TerminalSink::default();
            if let Err(e) = assistant.ask(session, &question, &mut sink).await {
                debug!("Question rejected: {}", e.error_code());
                println!("{}", e.user_message());
            }
        }
        ReplCommand::Invalid(message) => println!("{}", message),
    }
}

/// Read a PDF from disk and ingest it into the session
pub async fn upload(assistant: &Assistant, session: &mut Session, path: &Path) {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            println!("Error processing PDF: {}", e);
            return;
        }
    };

    println!("Processing your document...");
    match assistant.ingest_pdf(session, &filename, &bytes).await {
        Ok(report) => println!("{}", report.message()),
        Err(e) => println!("{}", e.user_message()),
    }
}

fn command_name(command: &ReplCommand) -> &'static str {
    match command {
        ReplCommand::Upload(_) => "upload",
        ReplCommand::Reset => "reset",
        ReplCommand::Model(_) => "model",
        ReplCommand::Models => "models",
        ReplCommand::Key(_) => "key",
        ReplCommand::History => "history",
        ReplCommand::Help => "help",
        ReplCommand::Quit => "quit",
        ReplCommand::Ask(_) => "ask",
        ReplCommand::Invalid(_) => "invalid",
    }
}
