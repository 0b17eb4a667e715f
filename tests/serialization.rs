//! The serialization boundary: every node serializes to a
//! `{nodetype, pos, len, ...}` record via plain `serde_json`, with no
//! bespoke encoder required.

use latexwalker::context::ParsingContext;
use latexwalker::parser::StopCondition;
use latexwalker::spec::{FixedArgumentParser, MacroSpec, SpecDatabase};
use latexwalker::{parse, ParserFlags};

#[test]
fn macro_node_serializes_with_nodetype_tag_and_span() {
    let mut specs = SpecDatabase::new();
    specs.add_macro(MacroSpec::new(
        "emph",
        Some(Box::new(FixedArgumentParser::from_str_spec("{"))),
    ));
    let w = parse(r"\emph{hi}", Some(specs), ParserFlags::default());
    let (nodes, ..) = w
        .get_latex_nodes(0, StopCondition::None, ParsingContext::new(), None)
        .unwrap();

    let json = serde_json::to_value(&nodes[0]).unwrap();
    assert_eq!(json["nodetype"], "Macro");
    assert_eq!(json["pos"], 0);
    assert_eq!(json["len"], 9);
    assert_eq!(json["macroname"], "emph");
    assert_eq!(json["parsed_args"]["args"][0]["nodetype"], "Group");
}

#[test]
fn node_list_round_trips_through_json_without_loss_of_shape() {
    let w = parse("a $b$ c", None, ParserFlags::default());
    let (nodes, ..) = w
        .get_latex_nodes(0, StopCondition::None, ParsingContext::new(), None)
        .unwrap();

    let encoded = serde_json::to_string(&nodes).unwrap();
    let decoded: serde_json::Value = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded.as_array().unwrap().len(), 3);
    assert_eq!(decoded[1]["nodetype"], "Math");
    assert_eq!(decoded[1]["displaytype"], "inline");
}
