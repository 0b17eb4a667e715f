//! A recoverable tokenizer and recursive-descent parser for LaTeX markup.
//!
//! Parsing is driven by a pluggable [`spec::SpecDatabase`]: this crate knows
//! nothing about any particular macro or environment package. Feed it a
//! database describing the macros/environments/specials you care about and
//! call [`parse`]; anything the database doesn't know about falls back to a
//! conservative empty-argument default rather than failing the parse.
//!
//! ```
//! use latexwalker::{parse, ParserFlags};
//! use latexwalker::spec::{FixedArgumentParser, MacroSpec, SpecDatabase};
//! use latexwalker::context::ParsingContext;
//! use latexwalker::parser::StopCondition;
//!
//! let mut specs = SpecDatabase::new();
//! specs.add_macro(MacroSpec::new(
//!     "textbf",
//!     Some(Box::new(FixedArgumentParser::from_str_spec("{"))),
//! ));
//!
//! let walker = parse(r"hello \textbf{world}", Some(specs), ParserFlags::default());
//! let (nodes, _pos, len) = walker
//!     .get_latex_nodes(0, StopCondition::None, ParsingContext::new(), None)
//!     .unwrap();
//! assert_eq!(len, walker.context().source().len());
//! assert_eq!(nodes.len(), 2);
//! ```

pub mod context;
pub mod error;
pub mod node;
pub mod parser;
pub mod spec;
pub mod token;
pub mod tokenizer;

pub use error::{Result, WalkerError};
pub use node::{ArgKind, DisplayType, Node, NodeKind, ParsedArgs};
pub use parser::{parse, ParserFlags, StopCondition, Walker};
pub use spec::{ArgumentParser, EnvironmentSpec, FixedArgumentParser, MacroSpec, SpecDatabase, SpecialsSpec};
