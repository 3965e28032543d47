//! Arena-backed reference DOM implementing the parser's sink contract.
//!
//! Nodes live in a flat arena addressed by [`NodeId`]; parent/child links are
//! ids, so handles stay `Copy` and cheap. The document enforces the
//! single-root structural rule the parser expects to be able to violate and
//! recover from.

use tagsoup::{DomSink, ParseError, StructureViolation};

mod snapshot;

/// Arena handle. Ids are never reused within a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// `None` when the attribute carried no value token.
    pub value: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementData {
    pub name: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Doctype {
    pub name: String,
    pub public_id: String,
    pub system_id: String,
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    suspended: bool,
}

/// A document tree plus everything the parse reported into it.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    doctype: Option<Doctype>,
    errors: Vec<ParseError>,
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
                suspended: false,
            }],
            doctype: None,
            errors: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).expect("node arena overflow"));
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
            suspended: false,
        });
        id
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn is_suspended(&self, id: NodeId) -> bool {
        self.node(id).suspended
    }

    pub fn doctype(&self) -> Option<&Doctype> {
        self.doctype.as_ref()
    }

    /// Parse anomalies reported into this document, in source order.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Attribute lookup; the outer `Option` is presence, the inner one the
    /// value token.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<Option<&str>> {
        match &self.node(id).kind {
            NodeKind::Element(data) => data
                .attributes
                .iter()
                .find(|attr| attr.name == name)
                .map(|attr| attr.value.as_deref()),
            _ => None,
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text(text) => out.push_str(text),
            _ => {
                for &child in &self.node(id).children {
                    self.collect_text(child, out);
                }
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl DomSink for Document {
    type Handle = NodeId;

    fn document(&self) -> NodeId {
        self.root()
    }

    fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            name: name.to_string(),
            attributes: Vec::new(),
        }))
    }

    fn create_text_node(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Comment(text.to_string()))
    }

    fn create_processing_instruction(&mut self, target: &str, data: &str) -> NodeId {
        self.push(NodeKind::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        })
    }

    fn set_attribute(&mut self, element: NodeId, name: &str, value: Option<&str>) {
        let NodeKind::Element(data) = &mut self.node_mut(element).kind else {
            return;
        };
        let value = value.map(str::to_string);
        match data.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => data.attributes.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), StructureViolation> {
        if self.node(child).parent.is_some() {
            return Err(StructureViolation::InvalidChild);
        }
        match &self.node(parent).kind {
            NodeKind::Document => match &self.node(child).kind {
                NodeKind::Text(_) => return Err(StructureViolation::InvalidChild),
                NodeKind::Element(_) => {
                    let has_root = self
                        .node(parent)
                        .children
                        .iter()
                        .any(|&c| matches!(self.node(c).kind, NodeKind::Element(_)));
                    if has_root {
                        return Err(StructureViolation::DuplicateRoot);
                    }
                }
                _ => {}
            },
            NodeKind::Element(_) => {}
            _ => return Err(StructureViolation::InvalidChild),
        }
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
        Ok(())
    }

    fn set_suspended(&mut self, node: NodeId, suspended: bool) {
        self.node_mut(node).suspended = suspended;
    }

    fn set_doctype(&mut self, name: &str, public_id: &str, system_id: &str) {
        self.doctype = Some(Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
    }

    fn node_name(&self, node: NodeId) -> &str {
        match &self.node(node).kind {
            NodeKind::Document => "#document",
            NodeKind::Element(data) => &data.name,
            NodeKind::Text(_) => "#text",
            NodeKind::Comment(_) => "#comment",
            NodeKind::ProcessingInstruction { target, .. } => target,
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn is_element(&self, node: NodeId) -> bool {
        matches!(self.node(node).kind, NodeKind::Element(_))
    }

    fn is_document(&self, node: NodeId) -> bool {
        matches!(self.node(node).kind, NodeKind::Document)
    }

    fn parse_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }
}
