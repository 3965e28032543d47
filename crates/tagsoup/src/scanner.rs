//! Line-tracked character-stream primitives.
//!
//! The scanner reads UTF-8 bytes from any [`Read`] source, decoding
//! incrementally, and exposes the primitives the tree builder folds into
//! tree-append operations: text runs, tag skeletons, attributes, comment and
//! doctype bodies, raw-text element content.
//!
//! Cursor-flag contract: every primitive leaves `just_read_tag_begin`,
//! `just_read_tag_end`, and `just_read_empty_element` consistent with how far
//! it consumed, so no caller ever double-consumes a `>`. Premature end of
//! input is an implicit close, never an error; only stream I/O failure
//! propagates.

use std::io::{self, Read};

use memchr::{memchr, memchr_iter};

use crate::entities::decode_entities;
use tools::utf8::Utf8Decoder;

const CHUNK_SIZE: usize = 8 * 1024;

/// Result of reading one tag skeleton.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RawTag {
    /// Raw tag token, including a leading `!`, `/`, or `?` marker. Empty when
    /// input ended before any name character.
    Tag(String),
    /// A `<` that turned out to be literal text (`<<` run or `<` followed by
    /// whitespace). The caller appends it verbatim and reads the next
    /// skeleton from where scanning stopped.
    Literal(String),
}

pub(crate) struct StreamScanner<R: Read> {
    input: R,
    decoder: Utf8Decoder,
    buf: String,
    pos: usize,
    lookahead: Option<char>,
    at_eof: bool,
    line: u32,

    pub(crate) just_read_tag_begin: bool,
    pub(crate) just_read_tag_end: bool,
    pub(crate) just_read_empty_element: bool,
}

impl<R: Read> StreamScanner<R> {
    pub(crate) fn new(input: R) -> Self {
        Self {
            input,
            decoder: Utf8Decoder::new(),
            buf: String::new(),
            pos: 0,
            lookahead: None,
            at_eof: false,
            line: 1,
            just_read_tag_begin: false,
            just_read_tag_end: false,
            just_read_empty_element: false,
        }
    }

    /// Current 1-based line number.
    pub(crate) fn line(&self) -> u32 {
        self.line
    }

    fn refill(&mut self) -> io::Result<()> {
        self.buf.clear();
        self.pos = 0;
        let mut chunk = [0u8; CHUNK_SIZE];
        while !self.at_eof && self.buf.is_empty() {
            let n = self.input.read(&mut chunk)?;
            if n == 0 {
                self.at_eof = true;
                self.decoder.finish(&mut self.buf);
                break;
            }
            self.decoder.push_chunk(&chunk[..n], &mut self.buf);
        }
        Ok(())
    }

    fn read_char(&mut self) -> io::Result<Option<char>> {
        if let Some(ch) = self.lookahead.take() {
            return Ok(Some(ch));
        }
        if self.pos >= self.buf.len() {
            self.refill()?;
            if self.buf.is_empty() {
                return Ok(None);
            }
        }
        let Some(ch) = self.buf[self.pos..].chars().next() else {
            return Ok(None);
        };
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
        }
        Ok(Some(ch))
    }

    /// Puts one character back; the next `read_char` returns it.
    fn unread(&mut self, ch: char) {
        debug_assert!(self.lookahead.is_none());
        self.lookahead = Some(ch);
    }

    fn read_n(&mut self, n: usize) -> io::Result<String> {
        let mut out = String::with_capacity(n);
        for _ in 0..n {
            match self.read_char()? {
                Some(ch) => out.push(ch),
                None => break,
            }
        }
        Ok(out)
    }

    /// Reads text up to the next `<`, leaving the cursor just past it.
    ///
    /// Returns `None` only when the input was already exhausted. The returned
    /// run is empty when `<` is the immediate next character; check
    /// `just_read_tag_begin` to see whether a tag follows.
    pub(crate) fn read_text_run(&mut self) -> io::Result<Option<String>> {
        let mut out = String::new();
        let mut consumed = false;
        if let Some(ch) = self.lookahead.take() {
            consumed = true;
            if ch == '<' {
                self.just_read_tag_begin = true;
                self.just_read_tag_end = false;
                self.just_read_empty_element = false;
                return Ok(Some(out));
            }
            out.push(ch);
        }
        loop {
            if self.pos >= self.buf.len() {
                self.refill()?;
                if self.buf.is_empty() {
                    self.just_read_tag_begin = false;
                    self.just_read_tag_end = false;
                    self.just_read_empty_element = false;
                    return Ok((consumed || !out.is_empty()).then_some(out));
                }
            }
            let rest = &self.buf[self.pos..];
            consumed = true;
            match memchr(b'<', rest.as_bytes()) {
                Some(idx) => {
                    let run = &rest[..idx];
                    self.line += memchr_iter(b'\n', run.as_bytes()).count() as u32;
                    out.push_str(run);
                    self.pos += idx + 1;
                    self.just_read_tag_begin = true;
                    self.just_read_tag_end = false;
                    self.just_read_empty_element = false;
                    return Ok(Some(out));
                }
                None => {
                    self.line += memchr_iter(b'\n', rest.as_bytes()).count() as u32;
                    out.push_str(rest);
                    self.pos = self.buf.len();
                }
            }
        }
    }

    /// Reads the raw tag token following a `<`.
    ///
    /// Defensive rule: `<` followed by another `<` or by whitespace is
    /// literal text; the run is returned as [`RawTag::Literal`] and the next
    /// call resumes scanning where the run ended.
    pub(crate) fn read_tag_skeleton(&mut self) -> io::Result<RawTag> {
        let mut sb = String::new();
        let Some(first) = self.read_char()? else {
            return Ok(RawTag::Tag(sb));
        };
        let mut ch = first;
        let mut more = true;
        if ch.is_alphabetic() {
            // Fast path: ordinary start tag.
        } else if ch == '!' {
            sb.push('!');
            match self.read_char()? {
                None => more = false,
                Some(next) => {
                    ch = next;
                    if next == '-' {
                        sb.push('-');
                        match self.read_char()? {
                            None => more = false,
                            Some(next2) => {
                                ch = next2;
                                if next2 == '-' {
                                    sb.push('-');
                                    more = false;
                                }
                            }
                        }
                    }
                }
            }
        } else if ch == '/' {
            sb.push('/');
            match self.read_char()? {
                Some(next) => ch = next,
                None => more = false,
            }
        } else if ch == '<' {
            let mut text = String::from("<");
            loop {
                match self.read_char()? {
                    Some('<') => text.push('<'),
                    Some(other) => {
                        self.unread(other);
                        break;
                    }
                    None => break,
                }
            }
            return Ok(RawTag::Literal(text));
        } else if ch.is_whitespace() {
            let mut text = String::from("<");
            text.push(ch);
            loop {
                match self.read_char()? {
                    // The run ends at the next `<`, which is consumed: the
                    // following call reads the tag it opens.
                    Some('<') => break,
                    Some(other) => text.push(other),
                    None => break,
                }
            }
            return Ok(RawTag::Literal(text));
        }
        if more {
            let mut last_slash = false;
            loop {
                if ch.is_whitespace() {
                    break;
                } else if ch == '>' {
                    self.just_read_tag_begin = false;
                    self.just_read_tag_end = true;
                    self.just_read_empty_element = last_slash;
                    return Ok(RawTag::Tag(sb));
                } else if ch == '/' {
                    last_slash = true;
                } else {
                    if last_slash {
                        sb.push('/');
                    }
                    last_slash = false;
                    sb.push(ch);
                }
                match self.read_char()? {
                    Some(next) => ch = next,
                    None => break,
                }
            }
        }
        if !sb.is_empty() {
            self.just_read_tag_begin = false;
            self.just_read_tag_end = false;
            self.just_read_empty_element = false;
        }
        Ok(RawTag::Tag(sb))
    }

    /// Reads one attribute and hands it to `set`; returns whether more may
    /// follow in the same tag.
    ///
    /// A valueless attribute is stored with its own name as the value. A
    /// `name=` with the value omitted stores no value token. Quoted and
    /// unquoted values are entity-decoded; quoted values may span `>` and
    /// newlines. A run of names without values can flush several attributes
    /// in one call.
    pub(crate) fn read_attribute<F: FnMut(&str, Option<&str>)>(
        &mut self,
        mut set: F,
    ) -> io::Result<bool> {
        if self.just_read_tag_end {
            return Ok(false);
        }

        // Attribute name, up to `=`. Several valueless names may be flushed
        // along the way.
        let mut name = String::new();
        let mut blank_found = false;
        let mut last_slash = false;
        loop {
            let Some(ch) = self.read_char()? else {
                if !name.is_empty() {
                    set(&name, Some(&name));
                }
                self.just_read_tag_begin = false;
                self.just_read_tag_end = false;
                self.just_read_empty_element = false;
                return Ok(false);
            };
            if ch == '=' {
                break;
            } else if ch == '>' {
                if !name.is_empty() {
                    set(&name, Some(&name));
                }
                self.just_read_tag_begin = false;
                self.just_read_tag_end = true;
                self.just_read_empty_element = last_slash;
                return Ok(false);
            } else if ch == '/' {
                blank_found = true;
                last_slash = true;
            } else if ch.is_whitespace() {
                last_slash = false;
                blank_found = true;
            } else {
                last_slash = false;
                if blank_found {
                    blank_found = false;
                    if !name.is_empty() {
                        set(&name, Some(&name));
                        name.clear();
                    }
                }
                name.push(ch);
            }
        }

        // Blanks up to an opening quote or the first value character.
        let mut value: Option<String> = None;
        let mut open_quote: Option<char> = None;
        loop {
            let Some(ch) = self.read_char()? else {
                break;
            };
            if ch == '>' {
                // Value omitted entirely: the attribute carries no value token.
                if !name.is_empty() {
                    set(&name, None);
                }
                self.just_read_tag_begin = false;
                self.just_read_tag_end = true;
                self.just_read_empty_element = last_slash;
                return Ok(false);
            } else if ch == '/' {
                last_slash = true;
            } else if ch.is_whitespace() {
                last_slash = false;
            } else {
                if ch == '"' || ch == '\'' {
                    open_quote = Some(ch);
                } else {
                    let mut started = String::new();
                    if last_slash {
                        started.push('/');
                    }
                    started.push(ch);
                    value = Some(started);
                }
                last_slash = false;
                break;
            }
        }

        // Attribute value.
        loop {
            let Some(ch) = self.read_char()? else {
                break;
            };
            if open_quote == Some(ch) {
                if !name.is_empty() {
                    match &value {
                        // Quotes opened and immediately closed: the value is
                        // the empty string, distinct from no value at all.
                        None => set(&name, Some("")),
                        Some(v) => set(&name, Some(&decode_entities(v))),
                    }
                }
                self.just_read_tag_begin = false;
                self.just_read_tag_end = false;
                return Ok(true);
            } else if open_quote.is_none() && ch == '>' {
                if !name.is_empty() {
                    match &value {
                        None => set(&name, None),
                        Some(v) => set(&name, Some(&decode_entities(v))),
                    }
                }
                self.just_read_tag_begin = false;
                self.just_read_tag_end = true;
                self.just_read_empty_element = last_slash;
                return Ok(false);
            } else if open_quote.is_none() && ch.is_whitespace() {
                if !name.is_empty() {
                    match &value {
                        None => set(&name, None),
                        Some(v) => set(&name, Some(&decode_entities(v))),
                    }
                }
                self.just_read_tag_begin = false;
                self.just_read_tag_end = false;
                return Ok(true);
            } else {
                let v = value.get_or_insert_with(String::new);
                if last_slash {
                    v.push('/');
                }
                last_slash = false;
                v.push(ch);
            }
        }
        self.just_read_tag_begin = false;
        self.just_read_tag_end = false;
        if !name.is_empty() {
            match &value {
                None => set(&name, None),
                Some(v) => set(&name, Some(&decode_entities(v))),
            }
        }
        Ok(false)
    }

    /// Consumes a comment body opened by `<!--`, tolerating any number of
    /// dashes and whitespace before the final `>`.
    ///
    /// Returns the body and whether the terminator was found before end of
    /// input.
    pub(crate) fn read_comment(&mut self) -> io::Result<(String, bool)> {
        if self.just_read_tag_end {
            return Ok((String::new(), true));
        }
        let mut sb = String::new();
        'outer: loop {
            let Some(ch) = self.read_char()? else {
                break 'outer;
            };
            if ch != '-' {
                sb.push(ch);
                continue;
            }
            let Some(after_dash) = self.read_char()? else {
                sb.push('-');
                break 'outer;
            };
            if after_dash != '-' {
                sb.push('-');
                sb.push(after_dash);
                continue;
            }
            // Saw `--`; dashes and whitespace may pile up before the `>`.
            let mut extra: Option<String> = None;
            loop {
                let Some(tail) = self.read_char()? else {
                    if let Some(extra) = extra {
                        sb.push_str(&extra);
                    }
                    break 'outer;
                };
                if tail == '>' {
                    self.just_read_tag_begin = false;
                    self.just_read_tag_end = true;
                    return Ok((sb, true));
                } else if tail == '-' {
                    extra.get_or_insert_with(|| String::from("--")).push('-');
                } else if tail.is_whitespace() {
                    extra.get_or_insert_with(|| String::from("--")).push(tail);
                } else {
                    if let Some(extra) = extra {
                        sb.push_str(&extra);
                    }
                    sb.push(tail);
                    break;
                }
            }
        }
        if !sb.is_empty() {
            self.just_read_tag_begin = false;
            self.just_read_tag_end = false;
        }
        Ok((sb, false))
    }

    /// Reads the remainder of the current tag, including the closing `>`.
    pub(crate) fn read_to_tag_end(&mut self) -> io::Result<String> {
        if self.just_read_tag_end {
            return Ok(String::new());
        }
        let mut out = String::new();
        loop {
            let Some(ch) = self.read_char()? else {
                break;
            };
            out.push(ch);
            if ch == '>' {
                self.just_read_tag_begin = false;
                self.just_read_tag_end = true;
                return Ok(out);
            }
        }
        if !out.is_empty() {
            self.just_read_tag_begin = false;
            self.just_read_tag_end = false;
        }
        Ok(out)
    }

    /// Consumes the remainder of the current tag, discarding it.
    pub(crate) fn skip_to_tag_end(&mut self) -> io::Result<()> {
        if self.just_read_tag_end {
            return Ok(());
        }
        let mut read_any = false;
        loop {
            let Some(ch) = self.read_char()? else {
                break;
            };
            read_any = true;
            if ch == '>' {
                self.just_read_tag_begin = false;
                self.just_read_tag_end = true;
                return Ok(());
            }
        }
        if read_any {
            self.just_read_tag_begin = false;
            self.just_read_tag_end = false;
        }
        Ok(())
    }

    /// Reads processing-instruction data up to (and through) the closing `>`.
    pub(crate) fn read_processing_instruction(&mut self) -> io::Result<String> {
        let mut data = String::new();
        if self.just_read_tag_end {
            return Ok(data);
        }
        let mut closed = false;
        loop {
            match self.read_char()? {
                Some('>') => {
                    closed = true;
                    break;
                }
                Some(ch) => data.push(ch),
                None => break,
            }
        }
        self.just_read_tag_begin = false;
        self.just_read_tag_end = closed;
        Ok(data)
    }

    /// Scans raw element content (SCRIPT, STYLE, TEXTAREA, opaque NOSCRIPT)
    /// up to a close tag matching `tag_name` case-insensitively.
    ///
    /// `<![CDATA[ … ]]>` sections pass through raw. A non-matching close tag
    /// is folded into the text as `</name` with its `>` dropped. Returns the
    /// accumulated text and whether the matching close tag was found.
    pub(crate) fn read_raw_text(&mut self, tag_name: &str) -> io::Result<(String, bool)> {
        let mut sb = String::new();
        loop {
            let Some(ch) = self.read_char()? else {
                break;
            };
            if ch != '<' {
                sb.push(ch);
                continue;
            }
            let Some(marker) = self.read_char()? else {
                sb.push('<');
                break;
            };
            if marker == '/' {
                let mut candidate = String::new();
                let mut hit_eof = false;
                let mut matched = false;
                loop {
                    match self.read_char()? {
                        None => {
                            hit_eof = true;
                            break;
                        }
                        Some('>') => {
                            matched = candidate.trim().eq_ignore_ascii_case(tag_name);
                            break;
                        }
                        Some(c) => candidate.push(c),
                    }
                }
                if matched {
                    self.just_read_tag_begin = false;
                    self.just_read_tag_end = true;
                    self.just_read_empty_element = false;
                    return Ok((sb, true));
                }
                sb.push_str("</");
                sb.push_str(&candidate);
                if hit_eof {
                    break;
                }
            } else if marker == '!' {
                let next = self.read_n(7)?;
                if next == "[CDATA[" {
                    self.read_cdata(&mut sb)?;
                } else {
                    sb.push('!');
                    sb.push_str(&next);
                }
            } else {
                sb.push('<');
                sb.push(marker);
            }
        }
        self.just_read_tag_begin = false;
        self.just_read_tag_end = false;
        self.just_read_empty_element = false;
        Ok((sb, false))
    }

    fn read_cdata(&mut self, sb: &mut String) -> io::Result<()> {
        loop {
            let Some(ch) = self.read_char()? else {
                return Ok(());
            };
            if ch != ']' {
                sb.push(ch);
                continue;
            }
            let next = self.read_n(2)?;
            if next == "]>" || next.is_empty() {
                return Ok(());
            }
            sb.push(']');
            sb.push_str(&next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner(input: &str) -> StreamScanner<&[u8]> {
        StreamScanner::new(input.as_bytes())
    }

    fn collect_attrs(sc: &mut StreamScanner<&[u8]>) -> Vec<(String, Option<String>)> {
        let mut attrs = Vec::new();
        loop {
            let more = sc
                .read_attribute(|name, value| {
                    attrs.push((name.to_string(), value.map(str::to_string)));
                })
                .expect("read_attribute");
            if !more {
                break;
            }
        }
        attrs
    }

    #[test]
    fn text_run_stops_at_tag_open() {
        let mut sc = scanner("hello<b>");
        assert_eq!(sc.read_text_run().expect("read"), Some("hello".to_string()));
        assert!(sc.just_read_tag_begin);
        assert_eq!(sc.read_tag_skeleton().expect("read"), RawTag::Tag("b".to_string()));
        assert!(sc.just_read_tag_end);
    }

    #[test]
    fn text_run_at_eof_returns_none_only_when_empty() {
        let mut sc = scanner("tail");
        assert_eq!(sc.read_text_run().expect("read"), Some("tail".to_string()));
        assert!(!sc.just_read_tag_begin);
        assert_eq!(sc.read_text_run().expect("read"), None);
    }

    #[test]
    fn doubled_angle_bracket_is_literal_text() {
        let mut sc = scanner("<<div>");
        sc.read_text_run().expect("read");
        assert_eq!(sc.read_tag_skeleton().expect("read"), RawTag::Literal("<".to_string()));
        assert_eq!(sc.read_tag_skeleton().expect("read"), RawTag::Tag("div".to_string()));
    }

    #[test]
    fn tag_open_before_whitespace_is_literal_text() {
        let mut sc = scanner("< if (a<b) ...<p>");
        sc.read_text_run().expect("read");
        assert_eq!(
            sc.read_tag_skeleton().expect("read"),
            RawTag::Literal("< if (a".to_string())
        );
        // The embedded `<b)` reads as a (bogus) tag; soup in, soup out.
        assert_eq!(sc.read_tag_skeleton().expect("read"), RawTag::Tag("b)".to_string()));
    }

    #[test]
    fn self_close_marker_sets_empty_element_flag() {
        let mut sc = scanner("<br/>");
        sc.read_text_run().expect("read");
        assert_eq!(sc.read_tag_skeleton().expect("read"), RawTag::Tag("br".to_string()));
        assert!(sc.just_read_empty_element);
    }

    #[test]
    fn slash_inside_name_is_kept() {
        let mut sc = scanner("<a/b>");
        sc.read_text_run().expect("read");
        assert_eq!(sc.read_tag_skeleton().expect("read"), RawTag::Tag("a/b".to_string()));
        assert!(!sc.just_read_empty_element);
    }

    #[test]
    fn comment_skeleton_stops_after_two_dashes() {
        let mut sc = scanner("<!-- hi -->");
        sc.read_text_run().expect("read");
        assert_eq!(sc.read_tag_skeleton().expect("read"), RawTag::Tag("!--".to_string()));
        let (body, terminated) = sc.read_comment().expect("read");
        assert_eq!(body, " hi ");
        assert!(terminated);
    }

    #[test]
    fn comment_tolerates_extra_dashes_before_close() {
        let mut sc = scanner("<!--a----->");
        sc.read_text_run().expect("read");
        sc.read_tag_skeleton().expect("read");
        let (body, terminated) = sc.read_comment().expect("read");
        assert_eq!(body, "a");
        assert!(terminated);
    }

    #[test]
    fn interior_dash_pair_is_swallowed_as_candidate_terminator() {
        let mut sc = scanner("<!--a--b-->");
        sc.read_text_run().expect("read");
        sc.read_tag_skeleton().expect("read");
        let (body, terminated) = sc.read_comment().expect("read");
        assert_eq!(body, "ab");
        assert!(terminated);
    }

    #[test]
    fn unterminated_comment_reports_not_terminated() {
        let mut sc = scanner("<!--never closed");
        sc.read_text_run().expect("read");
        sc.read_tag_skeleton().expect("read");
        let (body, terminated) = sc.read_comment().expect("read");
        assert_eq!(body, "never closed");
        assert!(!terminated);
    }

    #[test]
    fn attributes_quoted_unquoted_and_valueless() {
        let mut sc = scanner(r#"<a href="x" id=main checked>"#);
        sc.read_text_run().expect("read");
        sc.read_tag_skeleton().expect("read");
        let attrs = collect_attrs(&mut sc);
        assert_eq!(
            attrs,
            vec![
                ("href".to_string(), Some("x".to_string())),
                ("id".to_string(), Some("main".to_string())),
                ("checked".to_string(), Some("checked".to_string())),
            ]
        );
        assert!(sc.just_read_tag_end);
    }

    #[test]
    fn equals_with_no_value_stores_no_value_token() {
        let mut sc = scanner("<a href=>");
        sc.read_text_run().expect("read");
        sc.read_tag_skeleton().expect("read");
        assert_eq!(collect_attrs(&mut sc), vec![("href".to_string(), None)]);
    }

    #[test]
    fn empty_quotes_store_empty_string() {
        let mut sc = scanner(r#"<a href="">"#);
        sc.read_text_run().expect("read");
        sc.read_tag_skeleton().expect("read");
        assert_eq!(
            collect_attrs(&mut sc),
            vec![("href".to_string(), Some(String::new()))]
        );
    }

    #[test]
    fn quoted_value_spans_closing_angle_and_newline() {
        let mut sc = scanner("<a title=\"a > b\nc\" id=x>");
        sc.read_text_run().expect("read");
        sc.read_tag_skeleton().expect("read");
        assert_eq!(
            collect_attrs(&mut sc),
            vec![
                ("title".to_string(), Some("a > b\nc".to_string())),
                ("id".to_string(), Some("x".to_string())),
            ]
        );
    }

    #[test]
    fn attribute_values_are_entity_decoded() {
        let mut sc = scanner(r#"<a href="a&amp;b" alt=x&lt;y>"#);
        sc.read_text_run().expect("read");
        sc.read_tag_skeleton().expect("read");
        assert_eq!(
            collect_attrs(&mut sc),
            vec![
                ("href".to_string(), Some("a&b".to_string())),
                ("alt".to_string(), Some("x<y".to_string())),
            ]
        );
    }

    #[test]
    fn trailing_slash_after_attributes_marks_empty_element() {
        let mut sc = scanner("<input type=text />");
        sc.read_text_run().expect("read");
        sc.read_tag_skeleton().expect("read");
        let attrs = collect_attrs(&mut sc);
        assert_eq!(attrs, vec![("type".to_string(), Some("text".to_string()))]);
        assert!(sc.just_read_empty_element);
    }

    #[test]
    fn unterminated_quote_consumes_to_eof() {
        let mut sc = scanner("<a href=\"no close");
        sc.read_text_run().expect("read");
        sc.read_tag_skeleton().expect("read");
        assert_eq!(
            collect_attrs(&mut sc),
            vec![("href".to_string(), Some("no close".to_string()))]
        );
    }

    #[test]
    fn raw_text_scans_to_matching_close_tag() {
        let mut sc = scanner("var a = '<b>' < 3;</script>after");
        let (text, matched) = sc.read_raw_text("script").expect("read");
        assert_eq!(text, "var a = '<b>' < 3;");
        assert!(matched);
        assert!(sc.just_read_tag_end);
    }

    #[test]
    fn raw_text_close_tag_match_is_case_insensitive() {
        let mut sc = scanner("x</SCRIPT >");
        let (text, matched) = sc.read_raw_text("script").expect("read");
        assert_eq!(text, "x");
        assert!(matched);
    }

    #[test]
    fn raw_text_folds_non_matching_close_tag() {
        let mut sc = scanner("a</b>c</script>");
        let (text, matched) = sc.read_raw_text("script").expect("read");
        assert_eq!(text, "a</bc");
        assert!(matched);
    }

    #[test]
    fn raw_text_passes_cdata_through() {
        let mut sc = scanner("a<![CDATA[ x < y ]]>b</style>");
        let (text, matched) = sc.read_raw_text("style").expect("read");
        assert_eq!(text, "a x < y b");
        assert!(matched);
    }

    #[test]
    fn raw_text_at_eof_is_implicit_close() {
        let mut sc = scanner("no close tag");
        let (text, matched) = sc.read_raw_text("script").expect("read");
        assert_eq!(text, "no close tag");
        assert!(!matched);
    }

    #[test]
    fn processing_instruction_reads_to_close() {
        let mut sc = scanner("<?xml version=\"1.0\"?>rest");
        sc.read_text_run().expect("read");
        assert_eq!(
            sc.read_tag_skeleton().expect("read"),
            RawTag::Tag("?xml".to_string())
        );
        let data = sc.read_processing_instruction().expect("read");
        assert_eq!(data, "version=\"1.0\"?");
        assert!(sc.just_read_tag_end);
    }

    #[test]
    fn line_numbers_track_newlines() {
        let mut sc = scanner("a\nb\nc<d>\n");
        sc.read_text_run().expect("read");
        assert_eq!(sc.line(), 3);
    }

    #[test]
    fn multibyte_text_survives_chunked_reads() {
        struct OneByte<'a>(&'a [u8], usize);
        impl Read for OneByte<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.1 >= self.0.len() {
                    return Ok(0);
                }
                buf[0] = self.0[self.1];
                self.1 += 1;
                Ok(1)
            }
        }
        let input = "π<\u{00e9}>σ";
        let mut sc = StreamScanner::new(OneByte(input.as_bytes(), 0));
        assert_eq!(sc.read_text_run().expect("read"), Some("π".to_string()));
        assert_eq!(
            sc.read_tag_skeleton().expect("read"),
            RawTag::Tag("\u{00e9}".to_string())
        );
        assert_eq!(sc.read_text_run().expect("read"), Some("σ".to_string()));
    }
}
