//! Source context and parsing context.
//!
//! `SourceContext` pairs the source string with the spec database and is
//! shared by reference from every node a parse produces, so nodes can
//! recover their verbatim source slice without a parent pointer.
//! `ParsingContext` is the small, `Copy`-by-value flag bag threaded down
//! recursive calls.

use std::rc::Rc;

use crate::error::{Result, WalkerError};
use crate::spec::SpecDatabase;

/// Immutable `{s, specs}` pair shared by every node produced during one
/// parse. Cheap to clone: it's an `Rc` handle, not the data.
#[derive(Clone)]
pub struct SourceContext {
    inner: Rc<SourceContextInner>,
}

struct SourceContextInner {
    source: String,
    specs: SpecDatabase,
}

impl SourceContext {
    pub fn new(source: impl Into<String>, specs: SpecDatabase) -> Self {
        SourceContext {
            inner: Rc::new(SourceContextInner {
                source: source.into(),
                specs,
            }),
        }
    }

    pub fn source(&self) -> &str {
        &self.inner.source
    }

    pub fn specs(&self) -> &SpecDatabase {
        &self.inner.specs
    }

    /// The verbatim slice `source[pos..pos+len]`, as every node's
    /// `latex_verbatim()` accessor relies on.
    pub fn slice(&self, pos: usize, len: usize) -> &str {
        &self.inner.source[pos..pos + len]
    }
}

/// Per-region mutable flags, copied on descent.
///
/// Currently only `in_math_mode`. Kept as a plain `Copy` struct rather than
/// a builder: the only operation it needs is "derive a sub-context with some
/// fields overridden", which a struct-update expression gives for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParsingContext {
    pub in_math_mode: bool,
}

impl ParsingContext {
    pub fn new() -> Self {
        ParsingContext::default()
    }

    /// Returns a new context identical to this one except for `in_math_mode`.
    ///
    /// Rust's type system makes runtime field-name validation unnecessary
    /// for the single field this context currently carries; `sub_context_checked`
    /// below keeps a fallible form available for callers that build overrides
    /// from field names they only know at runtime (e.g. a spec database entry).
    pub fn sub_context(&self, in_math_mode: bool) -> Self {
        ParsingContext { in_math_mode }
    }

    /// Same as [`sub_context`](Self::sub_context) but validates `field`
    /// against the known field set first, returning a `ConfigError` on a
    /// typo rather than silently ignoring it.
    pub fn sub_context_checked(&self, field: &str, value: bool) -> Result<Self> {
        match field {
            "in_math_mode" => Ok(self.sub_context(value)),
            other => Err(WalkerError::config_error(format!(
                "invalid field for ParsingContext: {other}"
            ))),
        }
    }
}
