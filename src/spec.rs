//! Specification database: the registry of macro, environment and
//! specials specs consulted while parsing, and the argument-parser
//! capability each spec exposes.
//!
//! Treating "argument parser" as a trait object rather than an inheritance
//! hierarchy is what lets a host register arbitrary argument-consuming
//! behavior without this crate knowing about it in advance: each spec
//! dispatches to a free function/struct by name rather than through a
//! subclass.

use std::collections::HashMap;
use std::rc::Rc;

use crate::context::ParsingContext;
use crate::error::Result;
use crate::node::{ArgKind, ParsedArgs};
use crate::parser::Walker;

/// The capability a spec exposes to consume its own arguments starting
/// immediately after its name token.
pub trait ArgumentParser {
    fn parse_args(
        &self,
        walker: &Walker,
        pos: usize,
        ctx: ParsingContext,
    ) -> Result<(ParsedArgs, usize, usize)>;
}

/// Reads a fixed sequence of slots, each either an optional bracketed group
/// or a mandatory expression. This is the argument parser every
/// default macro/environment spec is built from; specs needing bespoke
/// argument-reading behavior (e.g. verbatim-like macros that read raw text)
/// implement [`ArgumentParser`] directly instead.
pub struct FixedArgumentParser {
    pub arg_spec: Vec<ArgKind>,
}

impl FixedArgumentParser {
    pub fn new(arg_spec: impl Into<Vec<ArgKind>>) -> Self {
        FixedArgumentParser {
            arg_spec: arg_spec.into(),
        }
    }

    /// Convenience constructor from a terse argument-kind string:
    /// `[`/`*` for optional, anything else for mandatory.
    /// E.g. `"*{"` → one optional slot, one mandatory slot.
    pub fn from_str_spec(spec: &str) -> Self {
        let arg_spec = spec
            .chars()
            .map(|c| {
                if c == '[' || c == '*' {
                    ArgKind::Optional
                } else {
                    ArgKind::Mandatory
                }
            })
            .collect();
        FixedArgumentParser { arg_spec }
    }
}

impl ArgumentParser for FixedArgumentParser {
    fn parse_args(
        &self,
        walker: &Walker,
        pos: usize,
        ctx: ParsingContext,
    ) -> Result<(ParsedArgs, usize, usize)> {
        let start = pos;
        let mut cur = pos;
        let mut args = Vec::with_capacity(self.arg_spec.len());
        for kind in &self.arg_spec {
            match kind {
                ArgKind::Optional => match walker.get_latex_maybe_optional_arg(cur, ctx)? {
                    Some((node, _npos, nlen)) => {
                        cur += nlen;
                        args.push(Some(node));
                    }
                    None => args.push(None),
                },
                ArgKind::Mandatory => {
                    let (node, _npos, nlen) = walker.get_latex_expression(cur, None, ctx)?;
                    cur += nlen;
                    args.push(Some(node));
                }
            }
        }
        let len = cur - start;
        Ok((
            ParsedArgs {
                arg_spec: self.arg_spec.clone(),
                args,
                pos: start,
                len,
            },
            start,
            len,
        ))
    }
}

/// Specification for a macro: its name and how it consumes arguments.
pub struct MacroSpec {
    pub name: String,
    pub args_parser: Option<Box<dyn ArgumentParser>>,
}

impl MacroSpec {
    pub fn new(name: impl Into<String>, args_parser: Option<Box<dyn ArgumentParser>>) -> Self {
        MacroSpec {
            name: name.into(),
            args_parser,
        }
    }

    /// The substitute used for a macro name absent from the database: no
    /// arguments.
    pub fn empty(name: impl Into<String>) -> Self {
        MacroSpec {
            name: name.into(),
            args_parser: None,
        }
    }

    pub fn parse_args(
        &self,
        walker: &Walker,
        pos: usize,
        ctx: ParsingContext,
    ) -> Result<(ParsedArgs, usize, usize)> {
        match &self.args_parser {
            Some(p) => p.parse_args(walker, pos, ctx),
            None => Ok((ParsedArgs::empty(pos), pos, 0)),
        }
    }
}

/// Specification for an environment: its name, argument parser, and whether
/// its body is parsed in math mode.
pub struct EnvironmentSpec {
    pub name: String,
    pub args_parser: Option<Box<dyn ArgumentParser>>,
    pub is_math_mode: bool,
}

impl EnvironmentSpec {
    pub fn new(
        name: impl Into<String>,
        args_parser: Option<Box<dyn ArgumentParser>>,
        is_math_mode: bool,
    ) -> Self {
        EnvironmentSpec {
            name: name.into(),
            args_parser,
            is_math_mode,
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        EnvironmentSpec {
            name: name.into(),
            args_parser: None,
            is_math_mode: false,
        }
    }

    pub fn parse_args(
        &self,
        walker: &Walker,
        pos: usize,
        ctx: ParsingContext,
    ) -> Result<(ParsedArgs, usize, usize)> {
        match &self.args_parser {
            Some(p) => p.parse_args(walker, pos, ctx),
            None => Ok((ParsedArgs::empty(pos), pos, 0)),
        }
    }
}

/// Specification for a registered "specials" trigger sequence, e.g. `~` or
/// `&`. Unlike macros and environments, specials are not delimited
/// unambiguously by LaTeX syntax, so the database must be consulted at
/// tokenize time just to recognize one at all.
pub struct SpecialsSpec {
    pub chars: String,
    pub args_parser: Option<Box<dyn ArgumentParser>>,
    /// Only considered when the current [`ParsingContext::in_math_mode`] is set.
    pub math_mode_only: bool,
}

impl std::fmt::Debug for SpecialsSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecialsSpec")
            .field("chars", &self.chars)
            .field("math_mode_only", &self.math_mode_only)
            .finish()
    }
}

impl PartialEq for SpecialsSpec {
    fn eq(&self, other: &Self) -> bool {
        self.chars == other.chars && self.math_mode_only == other.math_mode_only
    }
}

impl SpecialsSpec {
    pub fn new(
        chars: impl Into<String>,
        args_parser: Option<Box<dyn ArgumentParser>>,
        math_mode_only: bool,
    ) -> Self {
        SpecialsSpec {
            chars: chars.into(),
            args_parser,
            math_mode_only,
        }
    }

    pub fn parse_args(
        &self,
        walker: &Walker,
        pos: usize,
        ctx: ParsingContext,
    ) -> Result<Option<(ParsedArgs, usize, usize)>> {
        match &self.args_parser {
            Some(p) => Ok(Some(p.parse_args(walker, pos, ctx)?)),
            None => Ok(None),
        }
    }
}

/// Registry of macro, environment and specials specs, keyed by name.
/// Populated before parsing and read-only during it; a host wanting
/// hot reloads should snapshot (clone the `Rc`s into a fresh database)
/// rather than mutate one shared across in-flight parses.
#[derive(Default)]
pub struct SpecDatabase {
    macros: HashMap<String, Rc<MacroSpec>>,
    environments: HashMap<String, Rc<EnvironmentSpec>>,
    /// Specials kept in registration order: `test_for_specials` breaks ties
    /// between equal-length matches by preferring whichever was registered
    /// first.
    specials: Vec<Rc<SpecialsSpec>>,
}

impl SpecDatabase {
    pub fn new() -> Self {
        SpecDatabase::default()
    }

    pub fn add_macro(&mut self, spec: MacroSpec) -> &mut Self {
        self.macros.insert(spec.name.clone(), Rc::new(spec));
        self
    }

    pub fn add_environment(&mut self, spec: EnvironmentSpec) -> &mut Self {
        self.environments.insert(spec.name.clone(), Rc::new(spec));
        self
    }

    pub fn add_specials(&mut self, spec: SpecialsSpec) -> &mut Self {
        self.specials.push(Rc::new(spec));
        self
    }

    /// Look up a macro spec by name, falling back to an empty default for
    /// unknown macros rather than failing the parse.
    pub fn get_macro_spec(&self, name: &str) -> Rc<MacroSpec> {
        self.macros
            .get(name)
            .cloned()
            .unwrap_or_else(|| Rc::new(MacroSpec::empty(name)))
    }

    pub fn get_environment_spec(&self, name: &str) -> Rc<EnvironmentSpec> {
        self.environments
            .get(name)
            .cloned()
            .unwrap_or_else(|| Rc::new(EnvironmentSpec::empty(name)))
    }

    /// Longest match at `pos`, honoring math-mode-only specials. Ties
    /// between equal-length matches favor earlier registration.
    pub fn test_for_specials(
        &self,
        s: &str,
        pos: usize,
        ctx: ParsingContext,
    ) -> Option<Rc<SpecialsSpec>> {
        let rest = &s[pos..];
        let mut best: Option<Rc<SpecialsSpec>> = None;
        for spec in &self.specials {
            if spec.math_mode_only && !ctx.in_math_mode {
                continue;
            }
            if rest.starts_with(spec.chars.as_str()) {
                let better = match &best {
                    Some(b) => spec.chars.len() > b.chars.len(),
                    None => true,
                };
                if better {
                    best = Some(spec.clone());
                }
            }
        }
        best
    }
}
