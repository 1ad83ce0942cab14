// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Prompt composition for grounded answers

use super::vector_index::ScoredChunk;

/// System message sent with every completion request
pub const SYSTEM_INSTRUCTION: &str =
    "You are a helpful AI assistant. Answer the user questions based only on the retrieved context.";

/// Reply the model is told to give when the context is insufficient
pub const INSUFFICIENT_CONTEXT_REPLY: &str = "I don't have enough information to answer this.";

/// Render retrieved chunks as numbered sources, one per line
pub fn format_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, scored)| format!("Source {}: {}", i + 1, scored.chunk.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Compose the user prompt from the formatted context and the question
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "\nYou are an AI assistant. Answer the user's question **ONLY** using the retrieved information provided below.\n\
         \n\
         ---\n\
         ### **Retrieved Context:**\n\
         {context}\n\
         ---\n\
         \n\
         ### **User Query:**\n\
         {question}\n\
         \n\
         ### **Instructions:**\n\
         - **Do not** use any external knowledge.\n\
         - If the retrieved context does not contain enough information, politely say:  \n  \"{fallback}\"\n\
         - Keep your response clear, concise, and factual.\n\
         - Maintain a **helpful and professional** tone.\n\
         \n\
         ### **Answer:**\n",
        context = context,
        question = question,
        fallback = INSUFFICIENT_CONTEXT_REPLY,
    )
}
