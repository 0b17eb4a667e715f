//! Token model: what [`crate::tokenizer::get_token`] returns.
//!
//! A token is not a LaTeX token in the TeX sense — it's whatever chunk of
//! input the tokenizer and parser agree to treat uniformly (a run of plain
//! characters, a macro name, a comment, ...).

use std::rc::Rc;

use crate::spec::SpecialsSpec;

/// A single lexical token with its span and the whitespace immediately
/// around it.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: usize,
    pub len: usize,
    /// Whitespace immediately preceding this token. May contain at most one
    /// `\n`; two consecutive newlines are instead surfaced as their own
    /// paragraph-break `Char` token.
    pub pre_space: String,
    /// Only meaningful for `Macro` (trailing space after an alphabetic
    /// macro name) and `Comment` (the terminating newline plus any
    /// indentation of the following line); empty otherwise.
    pub post_space: String,
}

impl Token {
    pub fn new(kind: TokenKind, pos: usize, len: usize, pre_space: String) -> Self {
        Token {
            kind,
            pos,
            len,
            pre_space,
            post_space: String::new(),
        }
    }

    pub fn with_post_space(mut self, post_space: String) -> Self {
        self.post_space = post_space;
        self
    }
}

/// Token variant tag and payload.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Plain characters with no special LaTeX meaning; usually a single
    /// character, except at a paragraph boundary where `arg == "\n\n"`.
    Char(String),
    /// A macro invocation that is not `\begin`/`\end`. The name excludes the
    /// leading backslash.
    Macro(String),
    /// `\begin{name}` — `name` excludes the braces.
    BeginEnv(String),
    /// `\end{name}` — `name` excludes the braces.
    EndEnv(String),
    /// A `%...` comment body, excluding the leading `%` and trailing newline.
    Comment(String),
    /// An opening delimiter: `{`, or `[` when brackets are not being read as
    /// plain characters.
    BraceOpen(char),
    /// A closing delimiter mirroring [`TokenKind::BraceOpen`].
    BraceClose(char),
    /// `$` or `\(`/`\)`: an inline math delimiter.
    MathInline(String),
    /// `$$` or `\[`/`\]`: a display math delimiter.
    MathDisplay(String),
    /// A registered specials trigger; the spec is the one the database
    /// matched, kept by reference so the parser can dispatch its argument
    /// parser without a second lookup.
    Specials(Rc<SpecialsSpec>),
}

impl TokenKind {
    /// Debug-friendly tag, used in error messages ("unexpected token kind: ...").
    pub fn tag(&self) -> &'static str {
        match self {
            TokenKind::Char(_) => "char",
            TokenKind::Macro(_) => "macro",
            TokenKind::BeginEnv(_) => "begin_environment",
            TokenKind::EndEnv(_) => "end_environment",
            TokenKind::Comment(_) => "comment",
            TokenKind::BraceOpen(_) => "brace_open",
            TokenKind::BraceClose(_) => "brace_close",
            TokenKind::MathInline(_) => "mathmode_inline",
            TokenKind::MathDisplay(_) => "mathmode_display",
            TokenKind::Specials(_) => "specials",
        }
    }
}
