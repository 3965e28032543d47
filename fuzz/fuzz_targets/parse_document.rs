#![no_main]

use libfuzzer_sys::fuzz_target;
use tagsoup::{DomSink, ParserConfig};

fuzz_target!(|data: &[u8]| {
    let mut doc = dom::Document::new();
    let config = ParserConfig::default();
    // Reading from a byte slice cannot fail; malformed markup must never
    // panic or error.
    tagsoup::parse_document(&mut doc, &config, data).expect("in-memory parse");

    // A completed parse leaves no node suspended.
    let mut stack = vec![doc.root()];
    while let Some(id) = stack.pop() {
        assert!(!doc.is_suspended(id));
        stack.extend_from_slice(doc.children(id));
    }
    // At most one element ends up under the document.
    let elements = doc
        .children(doc.root())
        .iter()
        .filter(|&&id| doc.is_element(id))
        .count();
    assert!(elements <= 1);
});
