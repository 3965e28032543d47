//! The DOM-sink seam between the parser and the tree implementation.
//!
//! The parser never owns nodes; it drives a [`DomSink`] through handles. The
//! sink decides node representation, attribute storage, and structural rules,
//! and may reject an append with a [`StructureViolation`] that the parser
//! recovers from.

use std::error::Error;
use std::fmt;

/// Recoverable scan anomaly, reported through [`DomSink::parse_error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorCode {
    /// `<` that does not open a tag: `<<`, `< `, `<>`, or `<` at end of input.
    StrayTagOpen,
    /// `<!DOCTYPE …>` body that does not match `name PUBLIC "publicId" "systemId"`.
    MalformedDoctype,
    /// Comment still open at end of input.
    UnterminatedComment,
    /// Nesting deeper than the configured limit; children flatten into the
    /// nearest in-budget ancestor.
    DepthLimitExceeded,
}

impl fmt::Display for ParseErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ParseErrorCode::StrayTagOpen => "stray tag open",
            ParseErrorCode::MalformedDoctype => "malformed doctype",
            ParseErrorCode::UnterminatedComment => "unterminated comment",
            ParseErrorCode::DepthLimitExceeded => "depth limit exceeded",
        };
        f.write_str(text)
    }
}

/// A recovered parse anomaly with its source line (1-based).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub code: ParseErrorCode,
    pub line: u32,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}", self.code, self.line)
    }
}

/// Structural rule broken by an append, as judged by the sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructureViolation {
    /// A second element appended under a single-root container.
    DuplicateRoot,
    /// A node kind the parent cannot hold (e.g. text directly under the
    /// document).
    InvalidChild,
}

impl fmt::Display for StructureViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StructureViolation::DuplicateRoot => "duplicate root element",
            StructureViolation::InvalidChild => "child not allowed under this parent",
        };
        f.write_str(text)
    }
}

impl Error for StructureViolation {}

/// Tree-construction capability set the parser drives.
///
/// Handles are cheap copyable identifiers whose meaning is private to the
/// sink. Creation does not attach: a created node has no parent until
/// [`DomSink::append_child`] succeeds.
pub trait DomSink {
    type Handle: Copy + Eq + fmt::Debug;

    /// The root container that `parse` targets for whole-document input.
    fn document(&self) -> Self::Handle;

    fn create_element(&mut self, name: &str) -> Self::Handle;
    fn create_text_node(&mut self, text: &str) -> Self::Handle;
    fn create_comment(&mut self, text: &str) -> Self::Handle;
    fn create_processing_instruction(&mut self, target: &str, data: &str) -> Self::Handle;

    /// Sets an attribute; `None` records the attribute name with no value
    /// token (distinct from the empty string).
    fn set_attribute(&mut self, element: Self::Handle, name: &str, value: Option<&str>);

    /// Appends `child` under `parent`, or rejects the structure. The parser
    /// treats a rejection as recoverable.
    fn append_child(
        &mut self,
        parent: Self::Handle,
        child: Self::Handle,
    ) -> Result<(), StructureViolation>;

    /// Marks a node as under construction. While set, mutation observers,
    /// script triggers, and style recomputation must not observe the node.
    fn set_suspended(&mut self, node: Self::Handle, suspended: bool);

    fn set_doctype(&mut self, name: &str, public_id: &str, system_id: &str);

    fn node_name(&self, node: Self::Handle) -> &str;
    fn parent(&self, node: Self::Handle) -> Option<Self::Handle>;
    fn is_element(&self, node: Self::Handle) -> bool;
    fn is_document(&self, node: Self::Handle) -> bool;

    /// Error callback; scanning anomalies are reported here and never abort
    /// the parse.
    fn parse_error(&mut self, error: ParseError) {
        let _ = error;
    }
}
