use rstest::rstest;

use crate::context::ParsingContext;
use crate::node::{DisplayType, NodeKind};
use crate::parser::{parse, ParserFlags, StopCondition, Walker};
use crate::spec::{FixedArgumentParser, MacroSpec, SpecDatabase};

fn tolerant(source: &str) -> Walker {
    parse(source, None, ParserFlags::default())
}

fn strict(source: &str) -> Walker {
    parse(
        source,
        None,
        ParserFlags {
            tolerant_parsing: false,
            strict_braces: false,
        },
    )
}

fn full_parse(walker: &Walker) -> (Vec<crate::node::Node>, usize, usize) {
    walker
        .get_latex_nodes(0, StopCondition::None, ParsingContext::new(), None)
        .unwrap()
}

#[test]
fn plain_text_is_a_single_chars_node() {
    let w = tolerant("hello world");
    let (nodes, pos, len) = full_parse(&w);
    assert_eq!(pos, 0);
    assert_eq!(len, w.context().source().len());
    assert_eq!(nodes.len(), 1);
    assert!(matches!(&nodes[0].kind, NodeKind::Chars { chars } if chars == "hello world"));
}

#[test]
fn unregistered_macro_takes_no_arguments() {
    let w = tolerant(r"\foo{bar}");
    let (nodes, _pos, len) = full_parse(&w);
    assert_eq!(len, w.context().source().len());
    assert_eq!(nodes.len(), 2);
    match &nodes[0].kind {
        NodeKind::Macro { macroname, parsed_args, .. } => {
            assert_eq!(macroname, "foo");
            assert!(parsed_args.as_ref().unwrap().args.is_empty());
        }
        other => panic!("expected Macro, got {other:?}"),
    }
    assert!(matches!(&nodes[1].kind, NodeKind::Group { .. }));
}

#[test]
fn registered_macro_consumes_its_declared_arguments() {
    let mut specs = SpecDatabase::new();
    specs.add_macro(MacroSpec::new(
        "textbf",
        Some(Box::new(FixedArgumentParser::from_str_spec("{"))),
    ));
    let w = parse(r"\textbf{bold}!", Some(specs), ParserFlags::default());
    let (nodes, _pos, len) = full_parse(&w);
    assert_eq!(len, w.context().source().len());
    assert_eq!(nodes.len(), 2);
    match &nodes[0].kind {
        NodeKind::Macro { macroname, parsed_args, .. } => {
            assert_eq!(macroname, "textbf");
            let args = &parsed_args.as_ref().unwrap().args;
            assert_eq!(args.len(), 1);
            assert!(matches!(args[0].as_ref().unwrap().kind, NodeKind::Group { .. }));
        }
        other => panic!("expected Macro, got {other:?}"),
    }
}

#[test]
fn optional_argument_present() {
    let mut specs = SpecDatabase::new();
    specs.add_macro(MacroSpec::new(
        "cite",
        Some(Box::new(FixedArgumentParser::from_str_spec("[{"))),
    ));
    let w = parse(r"\cite[p.3]{key}", Some(specs), ParserFlags::default());
    let (nodes, ..) = full_parse(&w);
    match &nodes[0].kind {
        NodeKind::Macro { parsed_args, .. } => {
            let pa = parsed_args.as_ref().unwrap();
            assert!(pa.args[0].is_some());
            assert!(pa.args[1].is_some());
            let (optarg, mandatory) = pa.legacy_view().unwrap();
            assert!(optarg.is_some());
            assert_eq!(mandatory.len(), 1);
        }
        other => panic!("expected Macro, got {other:?}"),
    }
}

#[test]
fn optional_argument_absent() {
    let mut specs = SpecDatabase::new();
    specs.add_macro(MacroSpec::new(
        "cite",
        Some(Box::new(FixedArgumentParser::from_str_spec("[{"))),
    ));
    let w = parse(r"\cite{key}", Some(specs), ParserFlags::default());
    let (nodes, ..) = full_parse(&w);
    match &nodes[0].kind {
        NodeKind::Macro { parsed_args, .. } => {
            let pa = parsed_args.as_ref().unwrap();
            assert!(pa.args[0].is_none());
            assert!(pa.args[1].is_some());
        }
        other => panic!("expected Macro, got {other:?}"),
    }
}

#[test]
fn environment_span_includes_both_delimiters() {
    let w = tolerant(r"\begin{itemize}x\end{itemize}");
    let (nodes, _pos, len) = full_parse(&w);
    assert_eq!(len, w.context().source().len());
    assert_eq!(nodes.len(), 1);
    match &nodes[0] {
        node => {
            assert_eq!(node.pos, 0);
            assert_eq!(node.len, w.context().source().len());
            match &node.kind {
                NodeKind::Environment { envname, nodelist, .. } => {
                    assert_eq!(envname, "itemize");
                    assert_eq!(nodelist.len(), 1);
                }
                other => panic!("expected Environment, got {other:?}"),
            }
        }
    }
}

#[test]
fn group_span_includes_braces_but_nodelist_does_not() {
    let w = tolerant("{abc}");
    let (nodes, ..) = full_parse(&w);
    assert_eq!(nodes.len(), 1);
    let group = &nodes[0];
    assert_eq!(group.pos, 0);
    assert_eq!(group.len, 5);
    match &group.kind {
        NodeKind::Group { nodelist } => {
            assert_eq!(nodelist.len(), 1);
            assert_eq!(nodelist[0].pos, 1);
            assert_eq!(nodelist[0].len, 3);
        }
        other => panic!("expected Group, got {other:?}"),
    }
}

#[test]
fn nested_math_mode_delimiters_are_excluded_from_nodelist() {
    let w = tolerant(r"$a \( b \) c$");
    let (nodes, ..) = full_parse(&w);
    assert_eq!(nodes.len(), 1);
    match &nodes[0].kind {
        NodeKind::Math { displaytype, nodelist, delimiters } => {
            assert_eq!(*displaytype, DisplayType::Inline);
            assert_eq!(delimiters, &("$".to_string(), "$".to_string()));
            assert_eq!(nodelist.len(), 3);
            assert!(matches!(&nodelist[1].kind, NodeKind::Math { .. }));
        }
        other => panic!("expected Math, got {other:?}"),
    }
}

#[test]
fn display_math_via_double_dollar() {
    let w = tolerant("$$E=mc^2$$");
    let (nodes, ..) = full_parse(&w);
    match &nodes[0].kind {
        NodeKind::Math { displaytype, .. } => assert_eq!(*displaytype, DisplayType::Display),
        other => panic!("expected Math, got {other:?}"),
    }
}

#[test]
fn comment_node_keeps_terminating_newline_as_post_space() {
    let w = tolerant("a%note\nb");
    let (nodes, ..) = full_parse(&w);
    assert_eq!(nodes.len(), 3);
    match &nodes[1].kind {
        NodeKind::Comment { comment, comment_post_space } => {
            assert_eq!(comment, "note");
            assert_eq!(comment_post_space, "\n");
        }
        other => panic!("expected Comment, got {other:?}"),
    }
}

#[rstest]
#[case("{unclosed")]
#[case(r"\begin{itemize}unclosed")]
#[case(r"x \end{itemize}")]
#[case("}stray closer")]
fn strict_mode_reports_a_parse_error(#[case] source: &str) {
    let w = strict(source);
    let result = w.get_latex_nodes(0, StopCondition::None, ParsingContext::new(), None);
    assert!(result.is_err(), "expected an error for {source:?}");
}

#[rstest]
#[case("{unclosed")]
#[case(r"\begin{itemize}unclosed")]
#[case(r"x \end{itemize}")]
#[case("}stray closer")]
fn tolerant_mode_always_consumes_the_whole_input(#[case] source: &str) {
    let w = tolerant(source);
    let (_nodes, pos, len) = full_parse(&w);
    assert_eq!(pos, 0);
    assert_eq!(len, source.len(), "tolerant parse did not consume all of {source:?}");
}

#[test]
fn mismatched_closing_environment_inside_a_group_is_skipped_not_fatal() {
    let w = tolerant(r"{a \end{x} b}");
    // \end with no active environment stop is a mismatch; tolerant mode logs
    // it and skips past, staying in the same group frame so the closing '}'
    // is still found.
    let (nodes, _pos, len) = full_parse(&w);
    assert_eq!(len, w.context().source().len());
    assert_eq!(nodes.len(), 1);
    match &nodes[0].kind {
        NodeKind::Group { nodelist } => {
            assert_eq!(nodelist.len(), 2);
            assert!(nodelist.iter().all(|n| matches!(n.kind, NodeKind::Chars { .. })));
        }
        other => panic!("expected Group, got {other:?}"),
    }
}

#[test]
fn read_max_nodes_stops_before_consuming_more_input() {
    let w = tolerant("a b c");
    let (nodes, pos, len) = w
        .get_latex_nodes(0, StopCondition::None, ParsingContext::new(), Some(0))
        .unwrap();
    assert!(nodes.is_empty());
    assert_eq!(pos, 0);
    assert_eq!(len, 0);
}

#[test]
fn read_max_nodes_stops_at_the_flush_point_not_past_the_next_node() {
    // The cap is hit by flushing "ab" as a Chars node; the following group
    // "{cd}" must be left entirely unread, not merely un-recursed-into.
    let w = tolerant("ab{cd}ef");
    let (nodes, pos, len) = w
        .get_latex_nodes(0, StopCondition::None, ParsingContext::new(), Some(1))
        .unwrap();
    assert_eq!(pos, 0);
    assert_eq!(len, 2);
    assert_eq!(nodes.len(), 1);
    assert!(matches!(&nodes[0].kind, NodeKind::Chars { chars } if chars == "ab"));
}

#[test]
fn nested_unclosed_group_anchors_at_the_innermost_opener() {
    // Two unclosed groups: the inner "{ abc" is where the gap actually
    // starts, and that's the position a strict-mode caller needs, not the
    // outer brace that merely happens to enclose it.
    let w = strict("{ { abc");
    let err = w
        .get_latex_nodes(0, StopCondition::None, ParsingContext::new(), None)
        .unwrap_err();
    assert_eq!(err.pos(), Some(2));
}

#[test]
fn specials_without_an_argument_parser_consume_nothing_extra() {
    use crate::spec::SpecialsSpec;

    let mut specs = SpecDatabase::new();
    specs.add_specials(SpecialsSpec::new("~", None, false));
    let w = parse("a~b", Some(specs), ParserFlags::default());
    let (nodes, ..) = full_parse(&w);
    assert_eq!(nodes.len(), 3);
    match &nodes[1].kind {
        NodeKind::Specials { specials_chars, parsed_args } => {
            assert_eq!(specials_chars, "~");
            assert!(parsed_args.is_none());
        }
        other => panic!("expected Specials, got {other:?}"),
    }
}
