//! The "ask" flow: selection + instruction in, comment-wrapped reply out.

use crate::comment::wrap_in_comment;
use crate::completion::{CompletionClient, CompletionError};
use crate::config::Settings;
use crate::extensions::ExtensionHost;
use crate::resolver::{resolve_comment_syntax, ResolveError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AskError {
    #[error("No text selected")]
    NoSelection,
    #[error("No prompt provided")]
    NoPrompt,
    #[error("No API key found in settings")]
    NoApiKey,
    #[error("An error occurred while calling the API: {0}")]
    Api(#[source] CompletionError),
    #[error("No response received from the API")]
    NoResponse,
    #[error("Failed to resolve comment syntax: {0}")]
    Resolve(#[from] ResolveError),
}

impl From<CompletionError> for AskError {
    fn from(e: CompletionError) -> Self {
        match e {
            CompletionError::EmptyResponse => AskError::NoResponse,
            other => AskError::Api(other),
        }
    }
}

/// What the editor hands over for one ask.
#[derive(Debug, Clone)]
pub struct AskRequest {
    pub selected_text: String,
    /// Byte offset of the selection start in the document.
    pub selection_start: usize,
    pub prompt: String,
    pub language_id: String,
}

/// Text to insert and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub offset: usize,
    pub text: String,
}

impl Insertion {
    /// Splice the text into `document` at the offset. The offset is clamped to
    /// the document length and moved back to the nearest char boundary.
    pub fn apply(&self, document: &str) -> String {
        let mut offset = self.offset.min(document.len());
        while !document.is_char_boundary(offset) {
            offset -= 1;
        }
        let mut out = String::with_capacity(document.len() + self.text.len());
        out.push_str(&document[..offset]);
        out.push_str(&self.text);
        out.push_str(&document[offset..]);
        out
    }
}

/// Check the parts of a request that don't need the network.
pub fn validate(request: &AskRequest) -> Result<(), AskError> {
    if request.selected_text.is_empty() {
        return Err(AskError::NoSelection);
    }
    if request.prompt.is_empty() {
        return Err(AskError::NoPrompt);
    }
    Ok(())
}

/// Run one ask: validate, call the API, and wrap the trimmed reply in the
/// document language's comment syntax (when `settings.wrap_in_comment`).
/// The insertion goes at the selection start; the selection is kept.
pub async fn ask<H: ExtensionHost + ?Sized>(
    request: &AskRequest,
    api_key: Option<&str>,
    settings: &Settings,
    host: &H,
) -> Result<Insertion, AskError> {
    validate(request)?;

    let api_key = api_key.filter(|k| !k.is_empty()).ok_or(AskError::NoApiKey)?;

    let client = CompletionClient::new(api_key, settings)?;
    // An empty reply surfaces as `NoResponse`; whitespace-only replies are
    // trimmed and inserted.
    let reply = client.complete(&request.prompt, &request.selected_text).await?;
    let reply = reply.trim();

    let text = if settings.wrap_in_comment {
        let descriptor = resolve_comment_syntax(host, &request.language_id)?;
        tracing::debug!(language_id = %request.language_id, ?descriptor, "wrapping reply");
        wrap_in_comment(reply, &descriptor)
    } else {
        reply.to_string()
    };

    Ok(Insertion {
        offset: request.selection_start,
        text,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
