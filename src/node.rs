//! Node model: the typed sum of parse-tree node variants.
//!
//! Tagged variants replace a runtime-typed class hierarchy: one
//! `NodeKind` enum with a `{pos, len}` header living on the wrapping `Node`
//! struct. A `Node` deliberately does not carry a back pointer to its
//! `SourceContext` — storing an `Rc` clone on every node (and then an owned
//! copy of it in every serialized record) would multiply allocations for no
//! benefit in a single-threaded, single-pass walk. A parse session owns
//! exactly one `SourceContext`; callers that need a node's verbatim text
//! call `SourceContext::slice(node.pos, node.len)` directly.

use serde::Serialize;

/// A parsed node, carrying the common `(pos, len)` span header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub pos: usize,
    pub len: usize,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    pub fn new(pos: usize, len: usize, kind: NodeKind) -> Self {
        Node { pos, len, kind }
    }

    /// Empty `Chars` node of zero length at `pos` — returned when an
    /// expression read consumes nothing.
    pub fn empty_chars(pos: usize) -> Self {
        Node::new(pos, 0, NodeKind::Chars { chars: String::new() })
    }
}

/// Either `inline` (`$...$`, `\(...\)`) or `display` (`$$...$$`, `\[...\]`)
/// math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    Inline,
    Display,
}

/// The parse-tree node variants, externally tagged as `nodetype` so the
/// default `serde_json` encoding already produces a `{nodetype, pos, len,
/// ...}` record at the serialization boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "nodetype")]
pub enum NodeKind {
    /// A run of plain characters.
    Chars { chars: String },
    /// A brace- or bracket-delimited sub-parse; span includes the
    /// delimiters, `nodelist` does not (invariant 3).
    Group { nodelist: Vec<Node> },
    /// A `%...` comment; `comment_post_space` retains the terminating
    /// newline (and any following indentation) separately from the body.
    Comment {
        comment: String,
        comment_post_space: String,
    },
    /// A macro invocation. `parsed_args` is `None` when the macro was read
    /// as a bare expression rather than through the main loop,
    /// which is the only situation in which a macro node carries no
    /// argument information even though its spec may declare some.
    Macro {
        macroname: String,
        parsed_args: Option<ParsedArgs>,
        macro_post_space: String,
    },
    /// A `\begin{name} ... \end{name}` construct; span includes both
    /// delimiters and the arguments (invariant 4).
    Environment {
        envname: String,
        nodelist: Vec<Node>,
        parsed_args: ParsedArgs,
    },
    /// A registered specials sequence (e.g. `~`, `&`). `parsed_args` is
    /// `None` when the specials spec defines no argument parser, or when
    /// (as for macros) the specials was read as a bare expression.
    Specials {
        specials_chars: String,
        parsed_args: Option<ParsedArgs>,
    },
    /// A math region; span includes both delimiters, `nodelist` does not
    /// (invariant 5).
    Math {
        displaytype: DisplayType,
        nodelist: Vec<Node>,
        delimiters: (String, String),
    },
}

/// Whether an argument slot is read with
/// [`get_latex_maybe_optional_arg`](crate::parser::Walker::get_latex_maybe_optional_arg)
/// or [`get_latex_expression`](crate::parser::Walker::get_latex_expression)
///.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArgKind {
    Optional,
    Mandatory,
}

/// The result of a spec's argument parser: the argument-kind
/// sequence it was built from, the nodes it captured (an optional slot with
/// no argument present contributes `None`), and the total span consumed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedArgs {
    pub arg_spec: Vec<ArgKind>,
    pub args: Vec<Option<Node>>,
    pub pos: usize,
    pub len: usize,
}

impl ParsedArgs {
    pub fn empty(pos: usize) -> Self {
        ParsedArgs {
            arg_spec: Vec::new(),
            args: Vec::new(),
            pos,
            len: 0,
        }
    }

    /// Backward-compatible `(optarg?, args[])` view: available only when this parse used at most one
    /// leading optional slot followed solely by mandatory slots, which is
    /// the shape every standard macro/environment spec takes. Parsers with
    /// a different shape (e.g. an optional slot in the middle) have no
    /// sensible legacy view and return `None`.
    pub fn legacy_view(&self) -> Option<(Option<&Node>, Vec<&Node>)> {
        let mut saw_optional = false;
        for (i, kind) in self.arg_spec.iter().enumerate() {
            match kind {
                ArgKind::Optional if i == 0 => saw_optional = true,
                ArgKind::Optional => return None,
                ArgKind::Mandatory => {}
            }
        }
        let (optarg, mandatory) = if saw_optional {
            (self.args[0].as_ref(), &self.args[1..])
        } else {
            (None, &self.args[..])
        };
        // Mandatory slots always have a node; only the leading optional may be absent.
        let mandatory = mandatory.iter().map(|n| n.as_ref().expect("mandatory arg slot is always populated")).collect();
        Some((optarg, mandatory))
    }
}
