//! Parser: the recursive-descent driver that walks tokens, recurses
//! into groups/environments/math, and dispatches spec-defined argument
//! parsers.
//!
//! `Walker` owns nothing mutable — every method is a pure function of
//! `(self.context(), pos, ctx, self.flags())`. That also means a `Walker`
//! can be shared (`&Walker`) across recursive calls and into argument-parser
//! trait objects without any interior mutability.

use crate::context::{ParsingContext, SourceContext};
use crate::error::{Result, WalkerError};
use crate::node::{Node, NodeKind};
use crate::spec::SpecDatabase;
use crate::token::{Token, TokenKind};
use crate::tokenizer;

/// Flags controlling recovery behavior: `tolerant_parsing` and `strict_braces`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserFlags {
    pub tolerant_parsing: bool,
    pub strict_braces: bool,
}

impl Default for ParserFlags {
    fn default() -> Self {
        ParserFlags {
            tolerant_parsing: true,
            strict_braces: false,
        }
    }
}

/// What a call to [`Walker::get_latex_nodes`] should stop at.
/// At most one of these is active per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopCondition {
    None,
    ClosingBrace(char),
    EndEnvironment(String),
    ClosingMathMode(String),
}

impl StopCondition {
    fn closing_brace(&self) -> Option<char> {
        match self {
            StopCondition::ClosingBrace(c) => Some(*c),
            _ => None,
        }
    }

    fn end_environment(&self) -> Option<&str> {
        match self {
            StopCondition::EndEnvironment(n) => Some(n),
            _ => None,
        }
    }

    fn closing_mathmode(&self) -> Option<&str> {
        match self {
            StopCondition::ClosingMathMode(d) => Some(d),
            _ => None,
        }
    }

    fn is_active(&self) -> bool {
        !matches!(self, StopCondition::None)
    }

    fn expecting_description(&self) -> String {
        match self {
            StopCondition::ClosingBrace(c) => format!("'{c}'"),
            StopCondition::EndEnvironment(n) => format!(r"\end{{{n}}}"),
            StopCondition::ClosingMathMode(d) => format!("'{d}'"),
            StopCondition::None => "end of input".to_string(),
        }
    }
}

fn closing_mathmode_for(opener: &str) -> &'static str {
    match opener {
        "$" => "$",
        "$$" => "$$",
        r"\(" => r"\)",
        r"\[" => r"\]",
        other => unreachable!("not a math opener: {other}"),
    }
}

/// The parser entry point: bound to one source string and one spec database
/// for the lifetime of a parse session.
pub struct Walker {
    ctx: SourceContext,
    flags: ParserFlags,
}

impl Walker {
    pub fn new(source: impl Into<String>, specs: SpecDatabase, flags: ParserFlags) -> Self {
        Walker {
            ctx: SourceContext::new(source, specs),
            flags,
        }
    }

    pub fn context(&self) -> &SourceContext {
        &self.ctx
    }

    pub fn flags(&self) -> ParserFlags {
        self.flags
    }

    fn source(&self) -> &str {
        self.ctx.source()
    }

    fn err(&self, message: impl Into<String>, pos: usize) -> WalkerError {
        WalkerError::parse_error(message, self.source(), pos)
    }

    /// Read a single token at `pos`.
    pub fn get_token(
        &self,
        pos: usize,
        brackets_are_chars: bool,
        environments: bool,
        ctx: ParsingContext,
    ) -> Result<Token> {
        tokenizer::get_token(
            self.source(),
            pos,
            brackets_are_chars,
            environments,
            self.ctx.specs(),
            ctx,
        )
    }

    /// Read exactly one argument expression.
    pub fn get_latex_expression(
        &self,
        pos: usize,
        strict_braces_override: Option<bool>,
        ctx: ParsingContext,
    ) -> Result<(Node, usize, usize)> {
        let tok = self.get_token(pos, true, false, ctx)?;
        match tok.kind {
            TokenKind::Macro(name) if name == "end" => {
                if self.flags.tolerant_parsing {
                    Ok((Node::empty_chars(tok.pos), tok.pos, 0))
                } else {
                    Err(self.err(r"expected expression, got \end", pos))
                }
            }
            TokenKind::Macro(name) => {
                let node = Node::new(
                    tok.pos,
                    tok.len,
                    NodeKind::Macro {
                        macroname: name,
                        parsed_args: None,
                        macro_post_space: tok.post_space,
                    },
                );
                Ok((node, tok.pos, tok.len))
            }
            TokenKind::Specials(spec) => {
                let node = Node::new(
                    tok.pos,
                    tok.len,
                    NodeKind::Specials {
                        specials_chars: spec.chars.clone(),
                        parsed_args: None,
                    },
                );
                Ok((node, tok.pos, tok.len))
            }
            TokenKind::Comment(_) => self.get_latex_expression(tok.pos + tok.len, strict_braces_override, ctx),
            TokenKind::BraceOpen(c) => self.get_latex_braced_group(tok.pos, c, ctx),
            TokenKind::BraceClose(c) => {
                let strict_braces = strict_braces_override.unwrap_or(self.flags.strict_braces);
                if strict_braces && !self.flags.tolerant_parsing {
                    Err(self.err(format!("expected expression, got closing brace '{c}'"), pos))
                } else {
                    Ok((Node::empty_chars(tok.pos), tok.pos, 0))
                }
            }
            TokenKind::Char(chars) => {
                let node = Node::new(tok.pos, tok.len, NodeKind::Chars { chars });
                Ok((node, tok.pos, tok.len))
            }
            TokenKind::MathInline(arg) | TokenKind::MathDisplay(arg) => {
                if let Some(name) = arg.strip_prefix('\\') {
                    let node = Node::new(
                        tok.pos,
                        tok.len,
                        NodeKind::Macro {
                            macroname: name.to_string(),
                            parsed_args: None,
                            macro_post_space: tok.post_space,
                        },
                    );
                    Ok((node, tok.pos, tok.len))
                } else {
                    let node = Node::new(tok.pos, tok.len, NodeKind::Chars { chars: arg });
                    Ok((node, tok.pos, tok.len))
                }
            }
            TokenKind::BeginEnv(_) | TokenKind::EndEnv(_) => {
                // get_token was called with environments=false above, so
                // this cannot actually happen; kept for exhaustiveness.
                Err(self.err("unexpected environment token while reading an expression", pos))
            }
        }
    }

    /// Attempt to read an optional bracketed argument.
    pub fn get_latex_maybe_optional_arg(
        &self,
        pos: usize,
        ctx: ParsingContext,
    ) -> Result<Option<(Node, usize, usize)>> {
        let tok = self.get_token(pos, false, false, ctx)?;
        match tok.kind {
            TokenKind::BraceOpen('[') => Ok(Some(self.get_latex_braced_group(pos, '[', ctx)?)),
            _ => Ok(None),
        }
    }

    /// Read a brace- or bracket-delimited group.
    pub fn get_latex_braced_group(
        &self,
        pos: usize,
        brace_type: char,
        ctx: ParsingContext,
    ) -> Result<(Node, usize, usize)> {
        let closing = match brace_type {
            '{' => '}',
            '[' => ']',
            other => {
                return Err(WalkerError::config_error(format!(
                    "unknown brace type: {other}"
                )))
            }
        };
        let brackets_are_chars = brace_type != '[';

        let first = self.get_token(pos, brackets_are_chars, true, ctx)?;
        match first.kind {
            TokenKind::BraceOpen(c) if c == brace_type => {}
            _ => {
                return Err(self.err(
                    format!("get_latex_braced_group: not an opening brace/bracket: {brace_type}"),
                    pos,
                ))
            }
        }

        let (nodelist, npos, nlen) = self
            .get_latex_nodes(first.pos + first.len, StopCondition::ClosingBrace(closing), ctx, None)
            .map_err(|e| e.reanchor_unclosed(first.pos))?;
        let total_len = npos + nlen - first.pos;
        let node = Node::new(first.pos, total_len, NodeKind::Group { nodelist });
        Ok((node, first.pos, total_len))
    }

    /// Read `\begin{name} ... \end{name}`.
    pub fn get_latex_environment(
        &self,
        pos: usize,
        expected_name: Option<&str>,
        ctx: ParsingContext,
    ) -> Result<(Node, usize, usize)> {
        let start = pos;
        let first = self.get_token(pos, true, true, ctx)?;
        let env_name = match &first.kind {
            TokenKind::BeginEnv(name) => {
                if let Some(expected) = expected_name {
                    if name != expected {
                        return Err(self.err(
                            format!(r"get_latex_environment: expected \begin{{{expected}}}: {name}"),
                            pos,
                        ));
                    }
                }
                name.clone()
            }
            _ => {
                return Err(self.err(
                    format!(
                        r"get_latex_environment: expected \begin{{{}}}",
                        expected_name.unwrap_or("<environment name>")
                    ),
                    pos,
                ))
            }
        };

        let mut p = first.pos + first.len;
        let spec = self.ctx.specs().get_environment_spec(&env_name);
        let (argd, apos, alen) = spec.parse_args(self, p, ctx)?;
        p = apos + alen;

        let inner_ctx = if spec.is_math_mode {
            ctx.sub_context(true)
        } else {
            ctx
        };

        let (nodelist, npos, nlen) = self
            .get_latex_nodes(p, StopCondition::EndEnvironment(env_name.clone()), inner_ctx, None)
            .map_err(|e| e.reanchor_unclosed(start))?;
        let total_len = npos + nlen - start;
        let node = Node::new(
            start,
            total_len,
            NodeKind::Environment {
                envname: env_name,
                nodelist,
                parsed_args: argd,
            },
        );
        Ok((node, start, total_len))
    }

    /// The main parser loop. Returns `(nodelist, pos, len)` where `pos` is
    /// the position parsing started at and `len` is the total span
    /// consumed, including any delimiter that satisfied `stop`.
    pub fn get_latex_nodes(
        &self,
        pos: usize,
        stop: StopCondition,
        ctx: ParsingContext,
        read_max_nodes: Option<usize>,
    ) -> Result<(Vec<Node>, usize, usize)> {
        if stop.closing_mathmode().is_some() && !ctx.in_math_mode {
            log::warn!(
                "get_latex_nodes(stop_upon_closing_mathmode={:?}) called but \
                 parsing context has in_math_mode=false",
                stop.closing_mathmode()
            );
        }

        let brackets_are_chars = stop.closing_brace() != Some(']');
        let origpos = pos;
        let mut p = pos;
        let mut nodelist = Vec::new();
        let mut lastchars = String::new();
        let mut lastchars_pos: Option<usize> = None;

        loop {
            if let Some(max) = read_max_nodes {
                if nodelist.len() >= max {
                    break;
                }
            }

            let tok = match self.get_token(p, brackets_are_chars, true, ctx) {
                Ok(tok) => tok,
                Err(WalkerError::EndOfStream) => {
                    if stop.is_active() && !self.flags.tolerant_parsing {
                        return Err(WalkerError::unclosed_construct(
                            format!(
                                "unexpected end of stream, was looking for {}",
                                stop.expecting_description()
                            ),
                            self.source(),
                            p,
                        ));
                    }
                    break;
                }
                Err(e) => return Err(e),
            };

            if let TokenKind::Char(chars) = &tok.kind {
                if lastchars.is_empty() {
                    lastchars_pos = Some(tok.pos - tok.pre_space.len());
                }
                lastchars.push_str(&tok.pre_space);
                lastchars.push_str(chars);
                p = tok.pos + tok.len;
                continue;
            }

            // Flush accumulated plain characters before handling anything else.
            let mut flushed = false;
            if !lastchars.is_empty() {
                let start = lastchars_pos.take().unwrap();
                lastchars.push_str(&tok.pre_space);
                let chars = std::mem::take(&mut lastchars);
                let len = tok.pos - start;
                nodelist.push(Node::new(start, len, NodeKind::Chars { chars }));
                flushed = true;
            } else if !tok.pre_space.is_empty() {
                let start = tok.pos - tok.pre_space.len();
                nodelist.push(Node::new(
                    start,
                    tok.pre_space.len(),
                    NodeKind::Chars {
                        chars: tok.pre_space.clone(),
                    },
                ));
                flushed = true;
            }

            // A flush can itself hit the cap. When it does, `tok` (the
            // non-`Char` token that triggered the flush) must not be read:
            // back `p` up to `tok.pos` and stop, so the group/macro/etc. it
            // starts is left entirely unconsumed, not merely unrecursed-into.
            if flushed {
                if let Some(max) = read_max_nodes {
                    if nodelist.len() >= max {
                        p = tok.pos;
                        break;
                    }
                }
            }

            match self.dispatch_token(tok, &stop, ctx, &mut p, &mut nodelist)? {
                DispatchOutcome::Continue => continue,
                DispatchOutcome::Stop => break,
            }
        }

        if !lastchars.is_empty() {
            let start = lastchars_pos.unwrap();
            let len = lastchars.len();
            nodelist.push(Node::new(start, len, NodeKind::Chars { chars: lastchars }));
        }

        Ok((nodelist, origpos, p - origpos))
    }

    /// Handles every non-`Char` token kind for [`Self::get_latex_nodes`].
    /// Recovery policy: every recovered `ParseError`, including a
    /// mismatched closing brace/environment, is logged at debug level and
    /// skipped past, continuing in the same frame — never aborting the
    /// surrounding parse. This is what guarantees the top-level call always
    /// consumes the entire source in tolerant mode.
    fn dispatch_token(
        &self,
        tok: Token,
        stop: &StopCondition,
        ctx: ParsingContext,
        p: &mut usize,
        nodelist: &mut Vec<Node>,
    ) -> Result<DispatchOutcome> {
        match tok.kind {
            TokenKind::BraceClose(c) => {
                if stop.closing_brace() == Some(c) {
                    *p = tok.pos + tok.len;
                    Ok(DispatchOutcome::Stop)
                } else {
                    self.mismatch(
                        format!("unexpected mismatching closing brace: '{c}'"),
                        tok.pos,
                        tok.pos + tok.len,
                        p,
                    )
                }
            }
            TokenKind::EndEnv(name) => {
                if stop.end_environment() == Some(name.as_str()) {
                    *p = tok.pos + tok.len;
                    Ok(DispatchOutcome::Stop)
                } else {
                    let expecting = stop.end_environment().unwrap_or("<nothing>");
                    self.mismatch(
                        format!(
                            "unexpected mismatching closing environment: '{name}', was expecting '{expecting}'"
                        ),
                        tok.pos,
                        tok.pos + tok.len,
                        p,
                    )
                }
            }
            TokenKind::MathInline(arg) | TokenKind::MathDisplay(arg) => {
                self.dispatch_math(arg, tok.pos, tok.len, stop, ctx, p, nodelist)
            }
            TokenKind::Comment(comment) => {
                nodelist.push(Node::new(
                    tok.pos,
                    tok.len,
                    NodeKind::Comment {
                        comment,
                        comment_post_space: tok.post_space,
                    },
                ));
                *p = tok.pos + tok.len;
                Ok(DispatchOutcome::Continue)
            }
            TokenKind::BraceOpen(c) => {
                match self.get_latex_braced_group(tok.pos, c, ctx) {
                    Ok((node, bpos, blen)) => {
                        *p = bpos + blen;
                        nodelist.push(node);
                        Ok(DispatchOutcome::Continue)
                    }
                    Err(e) => self.recover(e, tok.pos, tok.len, p),
                }
            }
            TokenKind::BeginEnv(name) => {
                match self.get_latex_environment(tok.pos, Some(&name), ctx) {
                    Ok((node, epos, elen)) => {
                        *p = epos + elen;
                        nodelist.push(node);
                        Ok(DispatchOutcome::Continue)
                    }
                    Err(e) => self.recover(e, tok.pos, tok.len, p),
                }
            }
            TokenKind::Macro(macroname) => {
                let spec = self.ctx.specs().get_macro_spec(&macroname);
                match spec.parse_args(self, tok.pos + tok.len, ctx) {
                    Ok((argd, apos, alen)) => {
                        *p = apos + alen;
                        nodelist.push(Node::new(
                            tok.pos,
                            *p - tok.pos,
                            NodeKind::Macro {
                                macroname,
                                parsed_args: Some(argd),
                                macro_post_space: tok.post_space,
                            },
                        ));
                        Ok(DispatchOutcome::Continue)
                    }
                    Err(e) => self.recover(e, tok.pos, tok.len, p),
                }
            }
            TokenKind::Specials(spec) => {
                let after = tok.pos + tok.len;
                match spec.parse_args(self, after, ctx) {
                    Ok(Some((argd, apos, alen))) => {
                        *p = apos + alen;
                        nodelist.push(Node::new(
                            tok.pos,
                            *p - tok.pos,
                            NodeKind::Specials {
                                specials_chars: spec.chars.clone(),
                                parsed_args: Some(argd),
                            },
                        ));
                        Ok(DispatchOutcome::Continue)
                    }
                    Ok(None) => {
                        *p = after;
                        nodelist.push(Node::new(
                            tok.pos,
                            *p - tok.pos,
                            NodeKind::Specials {
                                specials_chars: spec.chars.clone(),
                                parsed_args: None,
                            },
                        ));
                        Ok(DispatchOutcome::Continue)
                    }
                    Err(e) => self.recover(e, tok.pos, tok.len, p),
                }
            }
            TokenKind::Char(_) => unreachable!("char tokens are handled before dispatch"),
        }
    }

    fn dispatch_math(
        &self,
        arg: String,
        tok_pos: usize,
        tok_len: usize,
        stop: &StopCondition,
        ctx: ParsingContext,
        p: &mut usize,
        nodelist: &mut Vec<Node>,
    ) -> Result<DispatchOutcome> {
        if stop.closing_mathmode() == Some(arg.as_str()) {
            *p = tok_pos + tok_len;
            return Ok(DispatchOutcome::Stop);
        }

        let is_unambiguous_closer = arg == r"\)" || arg == r"\]";
        if is_unambiguous_closer {
            // A mismatched unambiguous closing delimiter is skipped in
            // tolerant mode rather than treated as a frame-terminating mismatch.
            if self.flags.tolerant_parsing {
                log::debug!(
                    "skipping mismatching closing math mode '{}', expected {:?}",
                    arg,
                    stop.closing_mathmode()
                );
                *p = tok_pos + tok_len;
                return Ok(DispatchOutcome::Continue);
            }
            return Err(self.err(
                format!(
                    "mismatching closing math mode: '{}', expected {:?}",
                    arg,
                    stop.closing_mathmode()
                ),
                tok_pos,
            ));
        }

        let closer = closing_mathmode_for(&arg);
        let displaytype = if arg == r"\(" || arg == "$" {
            crate::node::DisplayType::Inline
        } else {
            crate::node::DisplayType::Display
        };
        let inner_ctx = ctx.sub_context(true);
        let after = tok_pos + tok_len;
        match self.get_latex_nodes(
            after,
            StopCondition::ClosingMathMode(closer.to_string()),
            inner_ctx,
            None,
        ) {
            Ok((inner_nodes, mpos, mlen)) => {
                *p = mpos + mlen;
                nodelist.push(Node::new(
                    tok_pos,
                    *p - tok_pos,
                    NodeKind::Math {
                        displaytype,
                        nodelist: inner_nodes,
                        delimiters: (arg, closer.to_string()),
                    },
                ));
                Ok(DispatchOutcome::Continue)
            }
            Err(e) => self.recover(e, tok_pos, tok_len, p),
        }
    }

    /// General `ParseError` recovery: log at debug level and skip
    /// past the offending token, continuing in the same frame.
    fn recover(&self, e: WalkerError, tok_pos: usize, tok_len: usize, p: &mut usize) -> Result<DispatchOutcome> {
        match e {
            WalkerError::ParseError { .. } if self.flags.tolerant_parsing => {
                log::debug!("ignoring parse error (tolerant parsing mode): {e}");
                *p = tok_pos + tok_len;
                Ok(DispatchOutcome::Continue)
            }
            other => Err(other),
        }
    }

    /// A mismatched closing brace/environment delimiter, routed through the
    /// same recovery policy as [`Self::recover`]: logged and skipped past in
    /// tolerant mode, raised in strict mode. Earlier drafts had this
    /// terminate the enclosing frame instead, but that drops everything
    /// after a stray unmatched closer at the top level, where there is no
    /// further frame to resume in — violating the guarantee that a tolerant
    /// top-level parse always consumes the whole source.
    fn mismatch(
        &self,
        message: String,
        tok_pos: usize,
        advance_to: usize,
        p: &mut usize,
    ) -> Result<DispatchOutcome> {
        if self.flags.tolerant_parsing {
            log::debug!("{message}");
            *p = advance_to;
            Ok(DispatchOutcome::Continue)
        } else {
            Err(self.err(message, tok_pos))
        }
    }
}

enum DispatchOutcome {
    Continue,
    Stop,
}

/// Construct a [`Walker`] bound to `source` and `specs`, ready to call
/// [`Walker::get_latex_nodes`].
pub fn parse(source: impl Into<String>, specs: Option<SpecDatabase>, flags: ParserFlags) -> Walker {
    Walker::new(source, specs.unwrap_or_default(), flags)
}

#[cfg(test)]
mod tests;
