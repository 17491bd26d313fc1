//! Comment syntax discovery for a language id.
//!
//! Finds the first installed extension that contributes the language, then
//! walks its `language-configuration.json` files in path order and returns
//! the first `comments` object found. Nothing found is not an error: the
//! result is the empty descriptor.

use crate::comment::CommentDescriptor;
use crate::extensions::ExtensionHost;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

pub const LANGUAGE_CONFIGURATION_FILE: &str = "language-configuration.json";

#[derive(Debug, Error)]
pub enum ResolveError {
    /// A descriptor file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A descriptor file is not valid JSON.
    #[error("malformed language configuration {}: {source}", path.display())]
    MalformedDescriptorFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Resolve the comment syntax declared for `language_id`.
///
/// The first unreadable or malformed descriptor file aborts the whole
/// resolution, even when a later file would have answered.
pub fn resolve_comment_syntax<H: ExtensionHost + ?Sized>(
    host: &H,
    language_id: &str,
) -> Result<CommentDescriptor, ResolveError> {
    let Some(extension) = host
        .installed_extensions()
        .into_iter()
        .find(|ext| ext.contributes_language(language_id))
    else {
        tracing::debug!(language_id, "no installed extension contributes this language");
        return Ok(CommentDescriptor::default());
    };

    tracing::debug!(
        language_id,
        extension = %extension.id,
        root = %extension.root.display(),
        "found language extension"
    );

    for path in host.find_files(&extension.root, LANGUAGE_CONFIGURATION_FILE) {
        let content = host.read_file(&path).map_err(|source| ResolveError::Io {
            path: path.clone(),
            source,
        })?;

        let config: Value = serde_json::from_str(&content).map_err(|source| {
            ResolveError::MalformedDescriptorFile {
                path: path.clone(),
                source,
            }
        })?;

        let Some(comments) = config.get("comments").filter(|v| is_truthy(v)) else {
            continue;
        };

        // Only an object carries markers; any other truthy value still ends the search.
        let descriptor = match comments {
            Value::Object(_) => CommentDescriptor::deserialize(comments).map_err(|source| {
                ResolveError::MalformedDescriptorFile {
                    path: path.clone(),
                    source,
                }
            })?,
            _ => CommentDescriptor::default(),
        };
        tracing::debug!(path = %path.display(), ?descriptor, "resolved comment syntax");
        return Ok(descriptor);
    }

    tracing::debug!(language_id, extension = %extension.id, "no comments in any language configuration");
    Ok(CommentDescriptor::default())
}

/// `false`, `0`, `""` and `null` read as "no comments here".
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
