#![no_main]

use libfuzzer_sys::fuzz_target;
use tagsoup::{DomSink, ParserConfig};

fuzz_target!(|data: &[u8]| {
    let mut doc = dom::Document::new();
    let root = doc.root();
    let container = doc.create_element("DIV");
    doc.append_child(root, container).expect("attach container");
    let config = ParserConfig {
        need_root: false,
        max_depth: 64,
        ..ParserConfig::default()
    };
    tagsoup::parse_fragment(&mut doc, &config, data, container).expect("in-memory parse");

    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        assert!(!doc.is_suspended(id));
        stack.extend_from_slice(doc.children(id));
    }
});
