//! Comment syntax descriptors and comment wrapping.
//!
//! A `CommentDescriptor` mirrors the `comments` object of a VS Code
//! `language-configuration.json`. Any of its fields may be absent.
//! `wrap_in_comment` embeds arbitrary text using whichever syntax is available.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Line and block comment syntax for a language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawComments")]
pub struct CommentDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_comment_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_comment_end: Option<String>,
}

impl CommentDescriptor {
    pub fn line(prefix: impl Into<String>) -> Self {
        Self {
            line_comment: Some(prefix.into()),
            ..Self::default()
        }
    }

    pub fn block(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            block_comment_start: Some(start.into()),
            block_comment_end: Some(end.into()),
            ..Self::default()
        }
    }

    /// True when no comment syntax is known at all.
    pub fn is_empty(&self) -> bool {
        self.line_comment.is_none()
            && self.block_comment_start.is_none()
            && self.block_comment_end.is_none()
    }

    /// Both block markers, if the descriptor carries a complete pair.
    fn block_pair(&self) -> Option<(&str, &str)> {
        match (&self.block_comment_start, &self.block_comment_end) {
            (Some(start), Some(end)) if !start.is_empty() && !end.is_empty() => {
                Some((start.as_str(), end.as_str()))
            }
            _ => None,
        }
    }

    fn line_prefix(&self) -> Option<&str> {
        self.line_comment.as_deref().filter(|p| !p.is_empty())
    }
}

// ---------------------------------------------------------------------------
// On-disk shape
// ---------------------------------------------------------------------------

/// Loose view of a `comments` object as it appears on disk.
///
/// Only the explicit `blockCommentStart` / `blockCommentEnd` fields feed the
/// block markers; VS Code's `"blockComment": [start, end]` array is ignored.
/// `lineComment` may be a string or `{ "comment": "//", ... }`.
/// Values of an unexpected shape are dropped rather than rejected.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawComments {
    #[serde(default)]
    line_comment: Option<Value>,
    #[serde(default)]
    block_comment_start: Option<Value>,
    #[serde(default)]
    block_comment_end: Option<Value>,
}

impl From<RawComments> for CommentDescriptor {
    fn from(raw: RawComments) -> Self {
        let line_comment = raw.line_comment.as_ref().and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map.get("comment").and_then(Value::as_str).map(str::to_string),
            _ => None,
        });

        let as_string = |v: Option<Value>| match v {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };

        Self {
            line_comment,
            block_comment_start: as_string(raw.block_comment_start),
            block_comment_end: as_string(raw.block_comment_end),
        }
    }
}

// ---------------------------------------------------------------------------
// Wrapping
// ---------------------------------------------------------------------------

/// Embed `text` as a comment using the syntax in `descriptor`.
///
/// Priority: a complete block pair, then a line prefix, then the text alone
/// between bare newlines. The result always ends with a newline. Text that
/// contains the block end marker is not escaped.
pub fn wrap_in_comment(text: &str, descriptor: &CommentDescriptor) -> String {
    if let Some((start, end)) = descriptor.block_pair() {
        return format!("{start}\n{text}\n{end}\n");
    }

    if let Some(prefix) = descriptor.line_prefix() {
        let mut out = text
            .split('\n')
            .map(|line| format!("{prefix} {line}"))
            .collect::<Vec<_>>()
            .join("\n");
        out.push('\n');
        return out;
    }

    format!("\n{text}\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
