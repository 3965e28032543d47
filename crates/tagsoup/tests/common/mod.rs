//! Shared helpers for parser integration tests.

use dom::{Document, NodeId};
use tagsoup::{DomSink, ParserConfig};

/// Parses a full document with the default (quirks, need-root) configuration.
pub fn parse_doc(input: &str) -> Document {
    parse_doc_with(input, ParserConfig::default())
}

pub fn parse_doc_with(input: &str, config: ParserConfig) -> Document {
    let mut doc = Document::new();
    tagsoup::parse_document(&mut doc, &config, input.as_bytes()).expect("stream never fails");
    doc
}

/// Parses a fragment under a detached-root DIV, with root synthesis off,
/// the way `innerHTML`-style insertion drives the parser.
pub fn parse_fragment(input: &str) -> (Document, NodeId) {
    parse_fragment_with(input, fragment_config())
}

pub fn parse_fragment_with(input: &str, config: ParserConfig) -> (Document, NodeId) {
    let mut doc = Document::new();
    let root = doc.root();
    let container = doc.create_element("DIV");
    doc.append_child(root, container).expect("attach container");
    tagsoup::parse_fragment(&mut doc, &config, input.as_bytes(), container)
        .expect("stream never fails");
    (doc, container)
}

pub fn fragment_config() -> ParserConfig {
    ParserConfig {
        need_root: false,
        ..ParserConfig::default()
    }
}
