//! Tree builder: folds the scanned token stream into sink-append operations.
//!
//! Control is fully synchronous, recursive per open element. Each element
//! frame reads tokens until its own end tag, end of input, or a recovery
//! signal: an end tag for an open ancestor bubbles up unresolved until the
//! matching frame consumes it, and a start tag listed in the enclosing stop
//! set travels up as a suspended element to be re-appended as a sibling
//! ([`Step::Promote`]).

use std::io::{self, Read};

use crate::atom::{AtomId, AtomTable};
use crate::entities::decode_entities;
use crate::policy::{self, ElementPolicy, EndTagRule};
use crate::sink::{DomSink, ParseError, ParseErrorCode};
use crate::scanner::{RawTag, StreamScanner};
use crate::ParserConfig;

/// Tags that never force BODY synthesis when appended at shallow depth.
const NO_BODY_NEEDED: &[&str] = &[
    "HTML", "HEAD", "META", "TITLE", "LINK", "SCRIPT", "STYLE", "FRAMESET",
];

/// Tags that never force HEAD synthesis when appended at shallow depth.
const NO_HEAD_NEEDED: &[&str] = &[
    "HTML", "P", "DIV", "SPAN", "UL", "OL", "LI", "A", "IMG", "IFRAME", "TABLE", "TBODY", "THEAD",
    "TR", "TH", "TD", "MATHML", "FRAMESET",
];

/// Result of one `parse_token` step.
///
/// Promotion travels up the recursion as a value, not an unwind: the carried
/// element is parentless and still suspended, and the frame whose stop set
/// does not claim it appends it as a sibling and keeps scanning.
#[derive(Debug)]
enum Step<H> {
    Text,
    Comment,
    /// Start tag handled without children (self-closing or flattened).
    Begin,
    /// Element opened and fully closed.
    Full,
    /// Directive consumed and discarded.
    Skip,
    /// End tag for the named (normalized) tag; bubbles until the matching
    /// ancestor frame consumes it.
    End(AtomId),
    Promote(H),
    Eof,
}

/// What is being appended, for quirks-mode routing decisions.
#[derive(Clone, Copy, Debug)]
enum ChildKind {
    Element,
    Text { whitespace_only: bool },
    /// Comments and processing instructions; never trigger synthesis.
    Other,
}

/// Per-parse tree construction state. A fresh builder is made for every
/// `parse*` call, so singleton references and the effective need-root flag
/// reset per parse.
pub(crate) struct TreeBuilder<'p, S: DomSink, R: Read> {
    sink: &'p mut S,
    config: ParserConfig,
    scanner: StreamScanner<R>,
    atoms: AtomTable,
    /// Open normalized tag names, innermost last; used solely for the
    /// mis-nesting end-tag search.
    ancestors: Vec<AtomId>,
    last_root: Option<S::Handle>,
    last_head: Option<S::Handle>,
    last_body: Option<S::Handle>,
    /// Effective root-synthesis flag; a matched DOCTYPE clears it for the
    /// remainder of the parse.
    need_root: bool,
    depth_error_reported: bool,
}

impl<'p, S: DomSink, R: Read> TreeBuilder<'p, S, R> {
    pub(crate) fn new(sink: &'p mut S, config: ParserConfig, input: R) -> Self {
        let need_root = config.need_root && !config.is_xml;
        Self {
            sink,
            config,
            scanner: StreamScanner::new(input),
            atoms: AtomTable::new(),
            ancestors: Vec::new(),
            last_root: None,
            last_head: None,
            last_body: None,
            need_root,
            depth_error_reported: false,
        }
    }

    /// Parses the whole stream into `parent`. Still-open elements at end of
    /// input stay open; the finalizer re-runs root synthesis if a root was
    /// required but never materialized.
    pub(crate) fn run(&mut self, parent: S::Handle) -> io::Result<()> {
        self.sink.set_suspended(parent, true);
        let result = loop {
            match self.parse_token(parent, None, 0) {
                Ok(Step::Eof) => break Ok(()),
                Ok(_) => {}
                Err(err) => break Err(err),
            }
        };
        if self.need_root {
            self.ensure_root(parent);
            if let Some(root) = self.last_root {
                self.ensure_head(root);
                self.ensure_body(root);
            }
        }
        self.sink.set_suspended(parent, false);
        result
    }

    /// Parses text followed by at most one tag.
    fn parse_token(
        &mut self,
        parent: S::Handle,
        stop: Option<&[AtomId]>,
        depth: u32,
    ) -> io::Result<Step<S::Handle>> {
        let Some(text) = self.scanner.read_text_run()? else {
            return Ok(Step::Eof);
        };
        if !text.is_empty() {
            let decoded = decode_entities(&text);
            let whitespace_only = decoded.chars().all(char::is_whitespace);
            let node = self.sink.create_text_node(&decoded);
            self.safe_append_child(parent, node, ChildKind::Text { whitespace_only });
        }
        if !self.scanner.just_read_tag_begin {
            return Ok(Step::Text);
        }
        let raw = loop {
            match self.scanner.read_tag_skeleton()? {
                RawTag::Literal(text) => {
                    // Stray `<` recovery: the run is already literal text and
                    // bypasses quirks routing.
                    self.report(ParseErrorCode::StrayTagOpen);
                    let node = self.sink.create_text_node(&text);
                    self.append_or_log(parent, node);
                }
                RawTag::Tag(tag) => break tag,
            }
        };
        if raw.is_empty() {
            self.report(ParseErrorCode::StrayTagOpen);
            return Ok(Step::Skip);
        }
        if let Some(directive) = raw.strip_prefix('!') {
            if directive == "--" {
                let (body, terminated) = self.scanner.read_comment()?;
                if !terminated {
                    self.report(ParseErrorCode::UnterminatedComment);
                }
                let decoded = decode_entities(&body);
                let node = self.sink.create_comment(&decoded);
                self.safe_append_child(parent, node, ChildKind::Other);
                return Ok(Step::Comment);
            }
            if directive == "DOCTYPE" {
                let body = self.scanner.read_to_tag_end()?;
                match parse_doctype(&body) {
                    Some((name, public_id, system_id)) => {
                        self.sink.set_doctype(name, public_id, system_id);
                        self.need_root = false;
                    }
                    None => self.report(ParseErrorCode::MalformedDoctype),
                }
                return Ok(Step::Skip);
            }
            self.scanner.skip_to_tag_end()?;
            return Ok(Step::Skip);
        }
        if let Some(name) = raw.strip_prefix('/') {
            let atom = self.intern_normalized(name);
            self.scanner.skip_to_tag_end()?;
            return Ok(Step::End(atom));
        }
        if let Some(target) = raw.strip_prefix('?') {
            let target = target.to_string();
            let data = self.scanner.read_processing_instruction()?;
            let node = self.sink.create_processing_instruction(&target, &data);
            self.safe_append_child(parent, node, ChildKind::Other);
            return Ok(Step::Full);
        }
        self.parse_start_tag(parent, &raw, stop, depth)
    }

    fn parse_start_tag(
        &mut self,
        parent: S::Handle,
        raw: &str,
        stop: Option<&[AtomId]>,
        depth: u32,
    ) -> io::Result<Step<S::Handle>> {
        let normal = self.normalize(raw);
        // A namespace prefix is stripped from the local name; a leading colon
        // is not a prefix.
        let local = match normal.find(':') {
            Some(idx) if idx > 0 => &normal[idx + 1..],
            _ => normal.as_str(),
        };
        let local = local.to_string();
        let element = self.sink.create_element(&local);
        self.sink.set_suspended(element, true);
        if !self.scanner.just_read_tag_end {
            let sink = &mut *self.sink;
            while self.scanner.read_attribute(|name, value| {
                sink.set_attribute(element, name, value);
            })? {}
        }
        let atom = self.atoms.intern(&normal);
        if stop.is_some_and(|tags| tags.contains(&atom)) {
            // The enclosing frame claims this tag; hand the element up before
            // it is appended anywhere. It stays suspended in transit.
            return Ok(Step::Promote(element));
        }
        // Append before parsing children; incremental consumers see the
        // element as soon as it opens.
        self.safe_append_child(parent, element, ChildKind::Element);
        if self.scanner.just_read_empty_element {
            self.sink.set_suspended(element, false);
            return Ok(Step::Begin);
        }
        let element_policy = policy::get_policy(&local.to_ascii_uppercase());
        let end_tag = element_policy.map_or(EndTagRule::Required, |p| p.end_tag);
        if end_tag == EndTagRule::Forbidden {
            self.sink.set_suspended(element, false);
            return Ok(Step::Begin);
        }
        if depth + 1 >= self.config.max_depth {
            if !self.depth_error_reported {
                self.depth_error_reported = true;
                self.report(ParseErrorCode::DepthLimitExceeded);
            }
            self.sink.set_suspended(element, false);
            return Ok(Step::Begin);
        }
        let own = self.intern_stop_set(element_policy, atom, end_tag);
        let child_stop = child_stop_set(own, stop, end_tag);
        self.ancestors.push(atom);
        let step = self.parse_element_content(
            parent,
            element,
            raw.to_string(),
            atom,
            element_policy,
            child_stop,
            stop,
            depth,
        );
        self.ancestors.pop();
        step
    }

    /// Reads the content of one open element until its close is implied or
    /// explicit. The element handle may be swapped by sibling promotion; the
    /// current element's suspend marker is cleared on every exit path.
    #[allow(clippy::too_many_arguments)]
    fn parse_element_content(
        &mut self,
        parent: S::Handle,
        mut element: S::Handle,
        mut raw: String,
        mut name: AtomId,
        mut element_policy: Option<&'static ElementPolicy>,
        mut child_stop: Option<Vec<AtomId>>,
        inherited_stop: Option<&[AtomId]>,
        depth: u32,
    ) -> io::Result<Step<S::Handle>> {
        let step = loop {
            let token = match self.content_token(
                element,
                &raw,
                name,
                element_policy,
                child_stop.as_deref(),
                depth,
            ) {
                Ok(token) => token,
                Err(err) => {
                    self.sink.set_suspended(element, false);
                    return Err(err);
                }
            };
            match token {
                Step::End(closed) => {
                    if closed == name {
                        break Step::Full;
                    }
                    let closed_policy =
                        policy::get_policy(&self.atoms.resolve(closed).to_ascii_uppercase());
                    let closable =
                        closed_policy.map_or(true, |p| p.end_tag != EndTagRule::Forbidden);
                    if closable {
                        let open = &self.ancestors[..self.ancestors.len().saturating_sub(1)];
                        if open.contains(&closed) {
                            // An open ancestor matches: bubble the end tag up
                            // unresolved, implicitly closing this element.
                            log::trace!(
                                target: "tagsoup.builder",
                                "end tag </{}> closes ancestor past <{}>",
                                self.atoms.resolve(closed),
                                self.atoms.resolve(name),
                            );
                            break Step::End(closed);
                        }
                    }
                    // No matching ancestor: the end tag is discarded.
                }
                Step::Promote(promoted) => {
                    let promoted_raw = self.sink.node_name(promoted).to_string();
                    let promoted_name = {
                        let normal = self.normalize(&promoted_raw);
                        self.atoms.intern(&normal)
                    };
                    if inherited_stop.is_some_and(|tags| tags.contains(&promoted_name)) {
                        // The outer frame claims it too (e.g. <TR><TD>…<TR>):
                        // keep bubbling; the element stays suspended.
                        break Step::Promote(promoted);
                    }
                    log::trace!(
                        target: "tagsoup.builder",
                        "promoting <{promoted_raw}> to sibling of <{raw}>",
                    );
                    element_policy = policy::get_policy(&promoted_raw.to_ascii_uppercase());
                    let end_tag = element_policy.map_or(EndTagRule::Required, |p| p.end_tag);
                    let own = self.intern_stop_set(element_policy, promoted_name, end_tag);
                    child_stop = promoted_stop_set(own, inherited_stop);
                    if let Some(top) = self.ancestors.last_mut() {
                        *top = promoted_name;
                    }
                    // Switch frames: the closed element resumes notifications,
                    // the adopted one stays suspended until its own children
                    // are complete here.
                    self.sink.set_suspended(element, false);
                    element = promoted;
                    raw = promoted_raw;
                    name = promoted_name;
                    self.safe_append_child(parent, element, ChildKind::Element);
                    if self.scanner.just_read_empty_element {
                        break Step::Begin;
                    }
                }
                Step::Eof => break Step::Eof,
                Step::Text | Step::Comment | Step::Begin | Step::Full | Step::Skip => {}
            }
        };
        self.sink.set_suspended(element, false);
        Ok(step)
    }

    /// One read inside an element: opaque scan, raw-text scan, or a nested
    /// token, depending on the element's policy.
    fn content_token(
        &mut self,
        element: S::Handle,
        raw: &str,
        name: AtomId,
        element_policy: Option<&'static ElementPolicy>,
        child_stop: Option<&[AtomId]>,
        depth: u32,
    ) -> io::Result<Step<S::Handle>> {
        let opaque =
            element_policy.is_some_and(|p| p.scripting_opaque) && self.config.scripting_enabled;
        if opaque {
            // Opaque content is scanned to the close tag and discarded; the
            // element itself stays in the tree, empty.
            let (_, matched) = self.scanner.read_raw_text(raw)?;
            return Ok(if matched { Step::End(name) } else { Step::Eof });
        }
        let children_allowed = element_policy.map_or(true, |p| p.children_allowed);
        if !children_allowed {
            let decode =
                self.config.is_xml || element_policy.map_or(true, |p| p.entities_decoded);
            let (text, matched) = self.scanner.read_raw_text(raw)?;
            if !text.is_empty() {
                let content = if decode { decode_entities(&text) } else { text };
                let node = self.sink.create_text_node(&content);
                self.append_or_log(element, node);
            }
            return Ok(if matched { Step::End(name) } else { Step::Eof });
        }
        self.parse_token(element, child_stop, depth + 1)
    }

    fn normalize(&self, name: &str) -> String {
        if self.config.is_xml {
            name.to_string()
        } else {
            name.to_ascii_uppercase()
        }
    }

    fn intern_normalized(&mut self, name: &str) -> AtomId {
        let normal = self.normalize(name);
        self.atoms.intern(&normal)
    }

    /// This element's own contribution to its children's stop set: the
    /// policy's implied closers, or its own name when the end tag is
    /// optional.
    fn intern_stop_set(
        &mut self,
        element_policy: Option<&'static ElementPolicy>,
        own_name: AtomId,
        end_tag: EndTagRule,
    ) -> Option<Vec<AtomId>> {
        match element_policy.and_then(|p| p.implied_closers) {
            Some(names) => Some(names.iter().map(|n| self.atoms.intern(n)).collect()),
            None if end_tag == EndTagRule::Optional => Some(vec![own_name]),
            None => None,
        }
    }

    fn report(&mut self, code: ParseErrorCode) {
        let error = ParseError {
            code,
            line: self.scanner.line(),
        };
        log::trace!(target: "tagsoup.builder", "recovered: {error}");
        self.sink.parse_error(error);
    }

    fn append_or_log(&mut self, parent: S::Handle, child: S::Handle) {
        if let Err(violation) = self.sink.append_child(parent, child) {
            if self.sink.is_document(parent) {
                // Expected for e.g. a second top-level node under a
                // single-root container; the node is dropped.
                log::trace!(target: "tagsoup.builder", "dropped child under document: {violation}");
            } else {
                log::warn!(target: "tagsoup.builder", "unable to append child: {violation}");
            }
        }
    }

    /// Quirks-mode routing: redirects a shallow append under a synthesized
    /// HTML root when no root is present yet.
    fn safe_append_child(&mut self, parent: S::Handle, child: S::Handle, kind: ChildKind) {
        let mut target = parent;
        if self.need_root {
            let is_root_candidate = match kind {
                ChildKind::Element => {
                    if self.sink.node_name(child).eq_ignore_ascii_case("HTML") {
                        self.last_root = Some(child);
                        false
                    } else {
                        true
                    }
                }
                ChildKind::Text { whitespace_only } => !whitespace_only,
                ChildKind::Other => false,
            };
            if is_root_candidate
                && self.depth_at_most(parent, 1)
                && !self.has_ancestor_tag(parent, "HTML")
            {
                self.ensure_root(parent);
                if let Some(root) = self.last_root {
                    target = root;
                }
            }
        }
        self.ensure_body_append(target, child, kind);
    }

    /// Second quirks stage: shallow appends that require a BODY (or belong
    /// in a synthesized HEAD) are redirected there.
    fn ensure_body_append(&mut self, parent: S::Handle, child: S::Handle, kind: ChildKind) {
        let mut target = parent;
        if self.need_root {
            match kind {
                ChildKind::Element => {
                    let name = self.sink.node_name(child).to_ascii_uppercase();
                    if name == "BODY" {
                        self.last_body = Some(child);
                    } else if name == "HEAD" {
                        self.last_head = Some(child);
                    } else if self.depth_at_most(parent, 2) {
                        let needs_body = !NO_BODY_NEEDED.contains(&name.as_str());
                        let needs_head = !NO_HEAD_NEEDED.contains(&name.as_str());
                        if needs_body && !self.has_ancestor_tag(parent, "BODY") {
                            self.ensure_body(parent);
                            if let Some(body) = self.last_body {
                                target = body;
                            }
                        } else if needs_head && !self.has_ancestor_tag(parent, "HEAD") {
                            self.ensure_head(parent);
                            if let Some(head) = self.last_head {
                                target = head;
                            }
                        }
                    }
                }
                ChildKind::Text { whitespace_only: false } => {
                    // Document text belongs in BODY, same as a body-requiring
                    // element; whitespace-only runs never trigger synthesis.
                    if self.depth_at_most(parent, 2) && !self.has_ancestor_tag(parent, "BODY") {
                        self.ensure_body(parent);
                        if let Some(body) = self.last_body {
                            target = body;
                        }
                    }
                }
                _ => {}
            }
        }
        self.append_or_log(target, child);
    }

    fn ensure_root(&mut self, parent: S::Handle) {
        if self.last_root.is_none() {
            let root = self.sink.create_element("HTML");
            self.last_root = Some(root);
            self.append_or_log(parent, root);
        }
    }

    fn ensure_head(&mut self, parent: S::Handle) {
        if self.last_head.is_none() {
            let head = self.sink.create_element("HEAD");
            self.last_head = Some(head);
            self.append_or_log(parent, head);
        }
    }

    fn ensure_body(&mut self, parent: S::Handle) {
        if self.last_body.is_none() {
            let body = self.sink.create_element("BODY");
            self.last_body = Some(body);
            self.append_or_log(parent, body);
        }
    }

    fn depth_at_most(&self, node: S::Handle, max_depth: u32) -> bool {
        if max_depth == 0 {
            return false;
        }
        match self.sink.parent(node) {
            None => true,
            Some(parent) => self.depth_at_most(parent, max_depth - 1),
        }
    }

    fn has_ancestor_tag(&self, node: S::Handle, tag: &str) -> bool {
        if self.sink.node_name(node).eq_ignore_ascii_case(tag) {
            return true;
        }
        match self.sink.parent(node) {
            None => false,
            Some(parent) => self.has_ancestor_tag(parent, tag),
        }
    }
}

/// Stop set for a newly opened element's children: the element's own set
/// unioned with the inherited one. An element with a required end tag and no
/// own set shields its children from the inherited set.
fn child_stop_set(
    own: Option<Vec<AtomId>>,
    inherited: Option<&[AtomId]>,
    end_tag: EndTagRule,
) -> Option<Vec<AtomId>> {
    match (own, inherited) {
        (Some(mut own), Some(inherited)) => {
            own.extend_from_slice(inherited);
            Some(own)
        }
        (Some(own), None) => Some(own),
        (None, Some(inherited)) => {
            if end_tag == EndTagRule::Required {
                None
            } else {
                Some(inherited.to_vec())
            }
        }
        (None, None) => None,
    }
}

/// Stop set recomputed when a promoted element is adopted: union only when
/// both sets exist; no inherited fallback.
fn promoted_stop_set(own: Option<Vec<AtomId>>, inherited: Option<&[AtomId]>) -> Option<Vec<AtomId>> {
    match (own, inherited) {
        (Some(mut own), Some(inherited)) => {
            own.extend_from_slice(inherited);
            Some(own)
        }
        (own, _) => own,
    }
}

/// Matches a doctype body of the form `name PUBLIC "publicId" "systemId" …>`.
fn parse_doctype(body: &str) -> Option<(&str, &str, &str)> {
    let body = body.strip_suffix('>')?;
    let name_end = body.find(char::is_whitespace)?;
    let name = &body[..name_end];
    if name.is_empty() {
        return None;
    }
    let rest = body[name_end..].trim_start();
    let rest = rest.strip_prefix("PUBLIC")?;
    let rest = {
        let trimmed = rest.trim_start();
        if trimmed.len() == rest.len() {
            // At least one space is required between PUBLIC and the id.
            return None;
        }
        trimmed
    };
    let (public_id, rest) = quoted(rest)?;
    let rest = rest.trim_start();
    let (system_id, _) = quoted(rest)?;
    Some((name, public_id, system_id))
}

fn quoted(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some((&rest[..end], &rest[end + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atoms_of(table: &mut AtomTable, names: &[&str]) -> Vec<AtomId> {
        names.iter().map(|n| table.intern(n)).collect()
    }

    #[test]
    fn required_end_without_own_set_shields_children() {
        let mut table = AtomTable::new();
        let inherited = atoms_of(&mut table, &["TR"]);
        assert_eq!(
            child_stop_set(None, Some(&inherited), EndTagRule::Required),
            None
        );
        assert_eq!(
            child_stop_set(None, Some(&inherited), EndTagRule::Optional),
            Some(inherited.clone())
        );
    }

    #[test]
    fn own_and_inherited_sets_union() {
        let mut table = AtomTable::new();
        let own = atoms_of(&mut table, &["TH", "TD"]);
        let inherited = atoms_of(&mut table, &["TR"]);
        let merged =
            child_stop_set(Some(own.clone()), Some(&inherited), EndTagRule::Optional).expect("set");
        for atom in own.iter().chain(inherited.iter()) {
            assert!(merged.contains(atom));
        }
    }

    #[test]
    fn promoted_set_does_not_fall_back_to_inherited() {
        let mut table = AtomTable::new();
        let inherited = atoms_of(&mut table, &["TR"]);
        assert_eq!(promoted_stop_set(None, Some(&inherited)), None);
    }

    #[test]
    fn doctype_pattern_requires_public_ids() {
        assert_eq!(
            parse_doctype("html PUBLIC \"X\" \"Y\">"),
            Some(("html", "X", "Y"))
        );
        assert_eq!(
            parse_doctype("html  PUBLIC  \"-//W3C//DTD HTML 4.01//EN\" \"http://www.w3.org/TR/html4/strict.dtd\">"),
            Some((
                "html",
                "-//W3C//DTD HTML 4.01//EN",
                "http://www.w3.org/TR/html4/strict.dtd"
            ))
        );
        assert_eq!(parse_doctype("html>"), None);
        assert_eq!(parse_doctype("html PUBLIC \"X\">"), None);
        assert_eq!(parse_doctype("html SYSTEM \"Y\">"), None);
        assert_eq!(parse_doctype("html PUBLIC \"X\" \"Y\""), None);
    }
}
