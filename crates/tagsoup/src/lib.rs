//! Tolerant HTML tree-construction parser.
//!
//! Converts arbitrary, frequently malformed markup into a well-formed tree in
//! a single streaming pass, reproducing legacy tag-soup recovery behavior:
//! implicit HTML/HEAD/BODY insertion, optional end-tag closing, and
//! mis-nesting recovery for overlapping tags. The DOM itself is an injected
//! capability set (the [`DomSink`] trait); this crate only drives it.
//!
//! ```no_run
//! # struct Doc;
//! # impl Doc { fn new() -> Self { Doc } }
//! # impl tagsoup::DomSink for Doc {
//! #     type Handle = u32;
//! #     fn document(&self) -> u32 { 0 }
//! #     fn create_element(&mut self, _: &str) -> u32 { 0 }
//! #     fn create_text_node(&mut self, _: &str) -> u32 { 0 }
//! #     fn create_comment(&mut self, _: &str) -> u32 { 0 }
//! #     fn create_processing_instruction(&mut self, _: &str, _: &str) -> u32 { 0 }
//! #     fn set_attribute(&mut self, _: u32, _: &str, _: Option<&str>) {}
//! #     fn append_child(&mut self, _: u32, _: u32) -> Result<(), tagsoup::StructureViolation> { Ok(()) }
//! #     fn set_suspended(&mut self, _: u32, _: bool) {}
//! #     fn set_doctype(&mut self, _: &str, _: &str, _: &str) {}
//! #     fn node_name(&self, _: u32) -> &str { "" }
//! #     fn parent(&self, _: u32) -> Option<u32> { None }
//! #     fn is_element(&self, _: u32) -> bool { false }
//! #     fn is_document(&self, _: u32) -> bool { true }
//! # }
//! let mut doc = Doc::new();
//! let mut parser = tagsoup::Parser::new(&mut doc);
//! parser.parse("<p>tag <b>soup".as_bytes())?;
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! Malformed input is a recoverable condition, never a failure; only stream
//! I/O errors abort a parse.

use std::io::{self, Read};

mod atom;
mod builder;
pub mod entities;
pub mod policy;
mod scanner;
mod sink;

pub use sink::{DomSink, ParseError, ParseErrorCode, StructureViolation};

use builder::TreeBuilder;

/// Parser configuration. The defaults give the tolerant, quirks-enabled HTML
/// behavior; see [`ParserConfig::xml`] for the strict preset.
#[derive(Clone, Copy, Debug)]
pub struct ParserConfig {
    /// Case-sensitive tag names; entity decoding always on. Usually paired
    /// with `need_root: false`.
    pub is_xml: bool,
    /// Enables HTML/HEAD/BODY synthesis for shallow content. A matched
    /// DOCTYPE disables it for the rest of that parse.
    pub need_root: bool,
    /// Governs NOSCRIPT: enabled means its content is scanned as opaque text
    /// and discarded; disabled means it parses as ordinary markup.
    pub scripting_enabled: bool,
    /// Maximum element nesting depth. Start tags beyond the limit are still
    /// appended, but their children flatten into the nearest in-budget
    /// ancestor.
    pub max_depth: u32,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            is_xml: false,
            need_root: true,
            scripting_enabled: true,
            max_depth: 256,
        }
    }
}

impl ParserConfig {
    /// Strict preset: case-sensitive tags, no quirks synthesis.
    pub fn xml() -> Self {
        Self {
            is_xml: true,
            need_root: false,
            ..Self::default()
        }
    }
}

/// Streaming parser over an injected [`DomSink`].
///
/// A parser instance holds per-parse mutable state; concurrent parses require
/// distinct instances. State resets at every `parse*` call.
pub struct Parser<'s, S: DomSink> {
    sink: &'s mut S,
    config: ParserConfig,
}

impl<'s, S: DomSink> Parser<'s, S> {
    pub fn new(sink: &'s mut S) -> Self {
        Self::with_config(sink, ParserConfig::default())
    }

    pub fn with_config(sink: &'s mut S, config: ParserConfig) -> Self {
        Self { sink, config }
    }

    /// Parses a full document into the sink's root container.
    pub fn parse<R: Read>(&mut self, input: R) -> io::Result<()> {
        let root = self.sink.document();
        self.parse_fragment(input, root)
    }

    /// Parses a fragment under an arbitrary existing node, e.g. for
    /// `innerHTML`-style insertion. The parser does not clear the parent; it
    /// appends, so it can be used incrementally.
    pub fn parse_fragment<R: Read>(&mut self, input: R, parent: S::Handle) -> io::Result<()> {
        TreeBuilder::new(&mut *self.sink, self.config, input).run(parent)
    }
}

/// One-shot document parse with the given configuration.
pub fn parse_document<S: DomSink, R: Read>(
    sink: &mut S,
    config: &ParserConfig,
    input: R,
) -> io::Result<()> {
    Parser::with_config(sink, *config).parse(input)
}

/// One-shot fragment parse under `parent`.
pub fn parse_fragment<S: DomSink, R: Read>(
    sink: &mut S,
    config: &ParserConfig,
    input: R,
    parent: S::Handle,
) -> io::Result<()> {
    Parser::with_config(sink, *config).parse_fragment(input, parent)
}
