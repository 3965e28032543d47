//! Recovery behavior on malformed input: stray `<`, mis-nesting, premature
//! end of input, and the recursion-depth limit.

mod common;

use common::{fragment_config, parse_doc, parse_fragment, parse_fragment_with};
use dom::NodeKind;
use tagsoup::{ParseErrorCode, ParserConfig};

#[test]
fn overlapping_tags_close_at_the_matching_ancestor() {
    let (doc, root) = parse_fragment("<div><b>bold<i>both</b>italic</i></div>");
    // </b> bubbles past the open <i>, closing both; the trailing italic text
    // lands under the div and the stray </i> is discarded.
    assert_eq!(
        doc.snapshot_of(root),
        "<DIV>\n\
         \x20 <DIV>\n\
         \x20   <B>\n\
         \x20     \"bold\"\n\
         \x20     <I>\n\
         \x20       \"both\"\n\
         \x20   \"italic\"\n"
    );
}

#[test]
fn unmatched_end_tags_are_discarded() {
    let (doc, root) = parse_fragment("a</p>b</div>c");
    let children = doc.children(root);
    assert_eq!(children.len(), 3);
    for (child, expected) in children.iter().zip(["a", "b", "c"]) {
        assert!(matches!(doc.kind(*child), NodeKind::Text(text) if text == expected));
    }
}

#[test]
fn end_tags_for_forbidden_end_elements_never_close_ancestors() {
    // </br> must not close the open <div> even though a BR is on no stack.
    let (doc, root) = parse_fragment("<div>a</br>b</div>");
    let div = doc.children(root)[0];
    assert_eq!(doc.text_content(div), "ab");
}

#[test]
fn doubled_tag_open_is_literal_text() {
    let (doc, root) = parse_fragment("a<<b>c");
    assert_eq!(
        doc.snapshot_of(root),
        "<DIV>\n\
         \x20 \"a\"\n\
         \x20 \"<\"\n\
         \x20 <B>\n\
         \x20   \"c\"\n"
    );
    assert_eq!(doc.errors().len(), 1);
    assert_eq!(doc.errors()[0].code, ParseErrorCode::StrayTagOpen);
}

#[test]
fn tag_open_before_whitespace_is_literal_text() {
    let (doc, root) = parse_fragment("x< 1 and >2<p>done");
    assert_eq!(
        doc.snapshot_of(root),
        "<DIV>\n\
         \x20 \"x\"\n\
         \x20 \"< 1 and >2\"\n\
         \x20 <P>\n\
         \x20   \"done\"\n"
    );
    assert_eq!(doc.errors()[0].code, ParseErrorCode::StrayTagOpen);
}

#[test]
fn empty_tag_is_reported_and_discarded() {
    let (doc, root) = parse_fragment("a<>b");
    let children = doc.children(root);
    assert_eq!(children.len(), 2);
    assert!(matches!(doc.kind(children[0]), NodeKind::Text(text) if text == "a"));
    assert!(matches!(doc.kind(children[1]), NodeKind::Text(text) if text == "b"));
    assert_eq!(doc.errors()[0].code, ParseErrorCode::StrayTagOpen);
}

#[test]
fn lone_tag_open_at_end_of_input_is_reported() {
    let (doc, root) = parse_fragment("a<");
    let children = doc.children(root);
    assert_eq!(children.len(), 1);
    assert!(matches!(doc.kind(children[0]), NodeKind::Text(text) if text == "a"));
    assert_eq!(doc.errors()[0].code, ParseErrorCode::StrayTagOpen);
}

#[test]
fn unterminated_comment_still_yields_a_node() {
    let (doc, root) = parse_fragment("x<!--never closed");
    let children = doc.children(root);
    assert!(matches!(doc.kind(children[1]), NodeKind::Comment(text) if text == "never closed"));
    assert_eq!(doc.errors()[0].code, ParseErrorCode::UnterminatedComment);
}

#[test]
fn malformed_doctype_is_reported_and_discarded() {
    let doc = parse_doc("<!DOCTYPE html><p>a");
    assert!(doc.doctype().is_none());
    assert_eq!(doc.errors()[0].code, ParseErrorCode::MalformedDoctype);
    // Synthesis stays on: the mismatch did not opt out of quirks.
    let root_children = doc.children(doc.root());
    assert!(matches!(doc.kind(root_children[0]), NodeKind::Element(data) if data.name == "HTML"));
}

#[test]
fn open_elements_remain_open_at_end_of_input() {
    let (doc, root) = parse_fragment("<div><ul><li>one");
    assert_eq!(
        doc.snapshot_of(root),
        "<DIV>\n\
         \x20 <DIV>\n\
         \x20   <UL>\n\
         \x20     <LI>\n\
         \x20       \"one\"\n"
    );
    assert!(doc.errors().is_empty());
}

#[test]
fn end_of_input_inside_attributes_keeps_the_element() {
    let (doc, root) = parse_fragment("<a href=\"x");
    let a = doc.children(root)[0];
    assert!(matches!(doc.kind(a), NodeKind::Element(data) if data.name == "A"));
    assert_eq!(doc.attribute(a, "href"), Some(Some("x")));
}

#[test]
fn raw_text_at_end_of_input_is_an_implicit_close() {
    let (doc, root) = parse_fragment("<script>var x = 1;");
    let script = doc.children(root)[0];
    assert_eq!(doc.text_content(script), "var x = 1;");
}

#[test]
fn self_closed_promoted_element_takes_no_children() {
    let (doc, root) = parse_fragment("<p>a<p/>b");
    assert_eq!(
        doc.snapshot_of(root),
        "<DIV>\n\
         \x20 <P>\n\
         \x20   \"a\"\n\
         \x20 <P>\n\
         \x20 \"b\"\n"
    );
}

#[test]
fn depth_limit_flattens_instead_of_recursing() {
    let config = ParserConfig {
        max_depth: 3,
        ..fragment_config()
    };
    let (doc, root) = parse_fragment_with("<d1><d2><d3><d4>x", config);
    assert_eq!(
        doc.snapshot_of(root),
        "<DIV>\n\
         \x20 <D1>\n\
         \x20   <D2>\n\
         \x20     <D3>\n\
         \x20     <D4>\n\
         \x20     \"x\"\n"
    );
    let depth_errors: Vec<_> = doc
        .errors()
        .iter()
        .filter(|e| e.code == ParseErrorCode::DepthLimitExceeded)
        .collect();
    assert_eq!(depth_errors.len(), 1, "reported once per parse");
}

#[test]
fn errors_carry_line_numbers() {
    let (doc, _) = parse_fragment("line1\nline2 <<x");
    assert_eq!(doc.errors()[0].code, ParseErrorCode::StrayTagOpen);
    assert_eq!(doc.errors()[0].line, 2);
}

#[test]
fn fragment_parses_append_incrementally() {
    let mut doc = dom::Document::new();
    let root = doc.root();
    let container = {
        use tagsoup::DomSink;
        let el = doc.create_element("DIV");
        doc.append_child(root, el).expect("attach");
        el
    };
    let config = fragment_config();
    tagsoup::parse_fragment(&mut doc, &config, "<b>one</b>".as_bytes(), container)
        .expect("parse");
    tagsoup::parse_fragment(&mut doc, &config, "<i>two</i>".as_bytes(), container)
        .expect("parse");
    assert_eq!(
        doc.snapshot_of(container),
        "<DIV>\n\
         \x20 <B>\n\
         \x20   \"one\"\n\
         \x20 <I>\n\
         \x20   \"two\"\n"
    );
}

#[test]
fn second_top_level_element_is_dropped_not_fatal() {
    // Without quirks routing there is nowhere to put a second root; the sink
    // rejects it and the parse carries on.
    let doc = common::parse_doc_with(
        "<html>a</html><html>b</html>",
        ParserConfig {
            need_root: false,
            ..ParserConfig::default()
        },
    );
    let root_children = doc.children(doc.root());
    assert_eq!(root_children.len(), 1);
}

#[test]
fn required_end_element_shields_inherited_stop_set() {
    // <B> has a required end tag and no stop set of its own, so its children
    // do not inherit the cell's {TH TD TR}: the second row nests inside it
    // instead of promoting out.
    let (doc, root) = parse_fragment("<table><tr><td><b>1<tr><td>2</table>");
    assert_eq!(
        doc.snapshot_of(root),
        "<DIV>\n\
         \x20 <TABLE>\n\
         \x20   <TR>\n\
         \x20     <TD>\n\
         \x20       <B>\n\
         \x20         \"1\"\n\
         \x20         <TR>\n\
         \x20           <TD>\n\
         \x20             \"2\"\n"
    );
}
