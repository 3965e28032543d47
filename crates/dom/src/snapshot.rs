//! Deterministic tree rendering for tests and debugging.

use crate::{Document, NodeId, NodeKind};

impl Document {
    /// Renders the whole tree, one node per line, two-space indented.
    ///
    /// ```text
    /// #document
    ///   <!DOCTYPE html "X" "Y">
    ///   <HTML>
    ///     <BODY>
    ///       "hello"
    /// ```
    pub fn snapshot(&self) -> String {
        self.snapshot_of(self.root())
    }

    /// Renders the subtree under `id`.
    pub fn snapshot_of(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render(id, 0, &mut out);
        out
    }

    fn render(&self, id: NodeId, depth: usize, out: &mut String) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        match self.kind(id) {
            NodeKind::Document => {
                out.push_str("#document\n");
                if let Some(doctype) = self.doctype() {
                    out.push_str("  <!DOCTYPE ");
                    out.push_str(&doctype.name);
                    out.push_str(&format!(
                        " {:?} {:?}>\n",
                        doctype.public_id, doctype.system_id
                    ));
                }
            }
            NodeKind::Element(data) => {
                out.push('<');
                out.push_str(&data.name);
                for attr in &data.attributes {
                    out.push(' ');
                    out.push_str(&attr.name);
                    if let Some(value) = &attr.value {
                        out.push_str(&format!("={value:?}"));
                    }
                }
                out.push_str(">\n");
            }
            NodeKind::Text(text) => {
                out.push_str(&format!("{text:?}\n"));
            }
            NodeKind::Comment(text) => {
                out.push_str(&format!("<!-- {text} -->\n"));
            }
            NodeKind::ProcessingInstruction { target, data } => {
                out.push_str(&format!("<?{target} {data}?>\n"));
            }
        }
        for &child in self.children(id) {
            self.render(child, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Document;
    use tagsoup::DomSink;

    #[test]
    fn snapshot_renders_kinds_and_indentation() {
        let mut doc = Document::new();
        let root = doc.root();
        let html = doc.create_element("HTML");
        let body = doc.create_element("BODY");
        let a = doc.create_element("A");
        let text = doc.create_text_node("hi\n");
        let comment = doc.create_comment("note");
        doc.set_attribute(a, "href", Some("x"));
        doc.set_attribute(a, "rel", None);
        doc.append_child(root, html).expect("append");
        doc.append_child(html, body).expect("append");
        doc.append_child(body, a).expect("append");
        doc.append_child(a, text).expect("append");
        doc.append_child(body, comment).expect("append");
        assert_eq!(
            doc.snapshot(),
            "#document\n  <HTML>\n    <BODY>\n      <A href=\"x\" rel>\n        \"hi\\n\"\n      <!-- note -->\n"
        );
    }
}
