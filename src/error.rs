//! Error types for the walker core.
//!
//! Three cases: an exhausted input stream, a recoverable syntax error
//! anchored at a source position, and a developer-facing configuration
//! error. `WalkerError` is the single error type returned by every fallible
//! function in this crate: one flat, non-generic error enum per subsystem
//! rather than a web of `From`-chained error types.

use std::fmt;

/// Unified error type for tokenizing and parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum WalkerError {
    /// The input was exhausted. Informational when a caller can reasonably
    /// stop (e.g. the top-level parse is simply done); carries no position
    /// since there is, by definition, no more input to point at.
    EndOfStream,
    /// A syntax error anchored at a byte offset into the source.
    ParseError {
        message: String,
        source: String,
        pos: usize,
        /// Set only when this error reports an unclosed group/environment
        /// and `pos` is still the end-of-stream position where the gap was
        /// detected rather than the construct's opening delimiter. The
        /// nearest enclosing frame re-anchors it exactly once via
        /// [`WalkerError::reanchor_unclosed`], which also clears this flag
        /// so further ancestor frames leave the now-correct position alone.
        pending_anchor: bool,
    },
    /// An invalid flag or parsing-context field. Raised at spec-development
    /// time, never while walking a document.
    ConfigError { message: String },
}

impl WalkerError {
    pub fn parse_error(message: impl Into<String>, source: &str, pos: usize) -> Self {
        WalkerError::ParseError {
            message: message.into(),
            source: source.to_string(),
            pos,
            pending_anchor: false,
        }
    }

    /// An "unclosed construct" error, raised at the end-of-stream position
    /// where the gap was detected. The enclosing `get_latex_braced_group`/
    /// `get_latex_environment` frame re-anchors it at its own opening
    /// delimiter via [`Self::reanchor_unclosed`].
    pub fn unclosed_construct(message: impl Into<String>, source: &str, pos: usize) -> Self {
        WalkerError::ParseError {
            message: message.into(),
            source: source.to_string(),
            pos,
            pending_anchor: true,
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        WalkerError::ConfigError {
            message: message.into(),
        }
    }

    /// Position the error is anchored at, if any.
    pub fn pos(&self) -> Option<usize> {
        match self {
            WalkerError::ParseError { pos, .. } => Some(*pos),
            _ => None,
        }
    }

    /// Re-anchor a pending unclosed-construct error at `opener_pos`, exactly
    /// once. Any other error, including one already re-anchored by an inner
    /// frame, passes through unchanged.
    pub fn reanchor_unclosed(self, opener_pos: usize) -> Self {
        match self {
            WalkerError::ParseError {
                message,
                source,
                pending_anchor: true,
                ..
            } => WalkerError::ParseError {
                message,
                source,
                pos: opener_pos,
                pending_anchor: false,
            },
            other => other,
        }
    }
}

/// Render a `\xc2\xb1`25-character excerpt of `source` centered on `pos`, for
/// error messages that point at where a parse failed.
fn excerpt(source: &str, pos: usize) -> String {
    let start = pos.saturating_sub(25);
    let before: String = source
        .get(start..pos)
        .map(str::to_string)
        .unwrap_or_default();
    let end = (pos + 25).min(source.len());
    let after: String = source.get(pos..end).map(str::to_string).unwrap_or_default();
    let before = format!("...{}", before);
    format!("\n{}\n{}{}...", before, " ".repeat(before.len()), after)
}

impl fmt::Display for WalkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkerError::EndOfStream => write!(f, "end of stream"),
            WalkerError::ParseError {
                message,
                source,
                pos,
                ..
            } => write!(f, "{} @ {}:{}", message, pos, excerpt(source, *pos)),
            WalkerError::ConfigError { message } => write!(f, "config error: {}", message),
        }
    }
}

impl std::error::Error for WalkerError {}

pub type Result<T> = std::result::Result<T, WalkerError>;
