//! Tokenizer: disambiguates escape sequences, environment delimiters,
//! math delimiters, comments, braces and specials, and tracks the
//! whitespace attached to each token's neighbors.
//!
//! `get_token` owns no state of its own — the caller always supplies the
//! position to resume from, unlike a cursor-owning lexer that advances
//! across a whole-document pass. This tokenizer is deliberately cursor-free
//! because the parser needs to re-enter it mid-expression with different
//! `brackets_are_chars`/`environments` flags at the same position.

use regex::Regex;
use std::sync::OnceLock;

use crate::context::ParsingContext;
use crate::error::{Result, WalkerError};
use crate::spec::SpecDatabase;
use crate::token::{Token, TokenKind};

fn env_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Optional whitespace then `{name}`, name restricted to [A-Za-z*]+.
    RE.get_or_init(|| Regex::new(r"^\s*\{([A-Za-z*]+)\}").unwrap())
}

/// Parse a single token at `pos`. `brackets_are_chars=false` makes `[`/`]`
/// count as brace delimiters rather than plain characters;
/// `environments=false` makes `\begin`/`\end` count as plain macros.
pub fn get_token(
    s: &str,
    pos: usize,
    brackets_are_chars: bool,
    environments: bool,
    specs: &SpecDatabase,
    ctx: ParsingContext,
) -> Result<Token> {
    let mut p = pos;
    let mut space = String::new();

    // 1. Pre-space accumulation, ending early on a paragraph break.
    while let Some(c) = s[p..].chars().next() {
        if !c.is_whitespace() {
            break;
        }
        space.push(c);
        p += c.len_utf8();
        if space.ends_with("\n\n") {
            return Ok(Token::new(TokenKind::Char("\n\n".to_string()), p - 2, 2, space));
        }
    }

    // 2. EOF.
    if p >= s.len() {
        return Err(WalkerError::EndOfStream);
    }

    let c = s[p..].chars().next().unwrap();

    // 3. Escape sequence.
    if c == '\\' {
        let after_backslash = p + 1;
        let next = match s[after_backslash..].chars().next() {
            Some(c) => c,
            None => return Err(WalkerError::EndOfStream),
        };

        if next == '[' || next == ']' {
            let arg = format!("\\{next}");
            return Ok(Token::new(TokenKind::MathDisplay(arg), p, 1 + next.len_utf8(), space));
        }
        if next == '(' || next == ')' {
            let arg = format!("\\{next}");
            return Ok(Token::new(TokenKind::MathInline(arg), p, 1 + next.len_utf8(), space));
        }

        if next.is_alphabetic() {
            let mut end = after_backslash;
            let mut name = String::new();
            while let Some(ch) = s[end..].chars().next() {
                if !ch.is_alphabetic() {
                    break;
                }
                name.push(ch);
                end += ch.len_utf8();
            }

            if environments && (name == "begin" || name == "end") {
                let caps = env_name_re().captures(&s[end..]).ok_or_else(|| {
                    WalkerError::parse_error(
                        format!(r"bad \{name} macro: expected {{<environment-name>}}"),
                        s,
                        p,
                    )
                })?;
                let whole = caps.get(0).unwrap();
                let env_name = caps.get(1).unwrap().as_str().to_string();
                let len = (end - p) + whole.end();
                let kind = if name == "begin" {
                    TokenKind::BeginEnv(env_name)
                } else {
                    TokenKind::EndEnv(env_name)
                };
                return Ok(Token::new(kind, p, len, space));
            }

            // Alphabetic macros absorb trailing whitespace into post_space;
            // non-alpha macros (handled below) never do.
            let mut post_space = String::new();
            let mut post_end = end;
            while let Some(ch) = s[post_end..].chars().next() {
                if !ch.is_whitespace() {
                    break;
                }
                post_space.push(ch);
                post_end += ch.len_utf8();
            }
            let len = end - p;
            return Ok(Token::new(TokenKind::Macro(name), p, len, space).with_post_space(post_space));
        }

        // Non-alphabetic macro: single-character name, no post_space.
        let len = 1 + next.len_utf8();
        return Ok(Token::new(TokenKind::Macro(next.to_string()), p, len, space));
    }

    // 4. Comment.
    if c == '%' {
        let rest = &s[p + 1..];
        return Ok(match rest.find('\n') {
            Some(nl) => {
                let body = rest[..nl].to_string();
                let mut end = nl + 1;
                while let Some(ch) = rest[end..].chars().next() {
                    if ch == ' ' || ch == '\t' {
                        end += ch.len_utf8();
                    } else {
                        break;
                    }
                }
                let post_space = rest[nl..end].to_string();
                Token::new(TokenKind::Comment(body), p, 1 + end, space).with_post_space(post_space)
            }
            None => Token::new(TokenKind::Comment(rest.to_string()), p, 1 + rest.len(), space),
        });
    }

    // 5. Braces.
    let (open, close): (&[char], &[char]) = if brackets_are_chars {
        (&['{'], &['}'])
    } else {
        (&['{', '['], &['}', ']'])
    };
    if open.contains(&c) {
        return Ok(Token::new(TokenKind::BraceOpen(c), p, c.len_utf8(), space));
    }
    if close.contains(&c) {
        return Ok(Token::new(TokenKind::BraceClose(c), p, c.len_utf8(), space));
    }

    // 6. Math dollars.
    if s[p..].starts_with("$$") {
        return Ok(Token::new(TokenKind::MathDisplay("$$".to_string()), p, 2, space));
    }
    if c == '$' {
        return Ok(Token::new(TokenKind::MathInline("$".to_string()), p, 1, space));
    }

    // 7. Specials.
    if let Some(spec) = specs.test_for_specials(s, p, ctx) {
        let len = spec.chars.len();
        return Ok(Token::new(TokenKind::Specials(spec), p, len, space));
    }

    // 8. Fallback: a single character.
    Ok(Token::new(TokenKind::Char(c.to_string()), p, c.len_utf8(), space))
}
