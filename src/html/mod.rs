//! Error-tolerant HTML parser.
//!
//! The parser handles the malformed patterns real-world HTML is full of,
//! producing a tree plus diagnostics instead of failing:
//!
//! - Missing closing tags (auto-closed based on HTML content model rules)
//! - Unquoted attribute values (`<div class=main>`)
//! - Void elements that never need closing (`<br>`, `<img>`, `<hr>`, etc.)
//! - Case-insensitive tag names (normalized to lowercase)
//! - Bare `&` characters (not just `&amp;`)
//! - Boolean attributes without values (`<input disabled>`)
//! - Missing `html`/`head`/`body` (implied unless disabled)
//!
//! # Examples
//!
//! ```
//! use domquery::html::parse_html;
//!
//! let doc = parse_html("<p>Hello <b>world</b>").unwrap();
//! let root = doc.root_element().unwrap();
//! assert_eq!(doc.node_name(root), Some("html"));
//! ```

use crate::error::{ParseDiagnostic, ParseError, Severity, SourceLocation};
use crate::tree::{Attribute, Document, NodeId, NodeKind};

/// Nesting depth past which parsing aborts (defends against pathological
/// input like a megabyte of `<div>`).
const MAX_DEPTH: usize = 512;

/// Options controlling HTML parser behavior.
///
/// ```
/// use domquery::html::ParseOptions;
///
/// let opts = ParseOptions::default()
///     .no_blanks(true)
///     .no_implied(true);
/// ```
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct ParseOptions {
    /// If true, recover from errors and produce a partial tree. HTML parsing
    /// is inherently tolerant; disabling this makes a handful of conditions
    /// fatal (e.g. empty input).
    pub recover: bool,
    /// If true, strip whitespace-only text nodes.
    pub no_blanks: bool,
    /// If true, do not add implied `html`, `head`, and `body` elements.
    pub no_implied: bool,
    /// If true, suppress warning diagnostics.
    pub no_warnings: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            recover: true,
            no_blanks: false,
            no_implied: false,
            no_warnings: false,
        }
    }
}

impl ParseOptions {
    /// Enables or disables error recovery.
    #[must_use]
    pub fn recover(mut self, yes: bool) -> Self {
        self.recover = yes;
        self
    }

    /// Enables or disables stripping of blank text nodes.
    #[must_use]
    pub fn no_blanks(mut self, yes: bool) -> Self {
        self.no_blanks = yes;
        self
    }

    /// Enables or disables generation of implied elements.
    #[must_use]
    pub fn no_implied(mut self, yes: bool) -> Self {
        self.no_implied = yes;
        self
    }

    /// Enables or disables warning suppression.
    #[must_use]
    pub fn no_warnings(mut self, yes: bool) -> Self {
        self.no_warnings = yes;
        self
    }
}

/// Parses an HTML string into a [`Document`] with default options.
///
/// Diagnostics for recovered problems land in [`Document::diagnostics`].
///
/// # Errors
///
/// Returns [`ParseError`] only for unrecoverable input: the nesting depth
/// limit, or empty input when recovery is disabled.
pub fn parse_html(input: &str) -> Result<Document, ParseError> {
    parse_html_with_options(input, &ParseOptions::default())
}

/// Parses an HTML string into a [`Document`] with the given options.
///
/// # Errors
///
/// Returns [`ParseError`] for unrecoverable input (see [`parse_html`]).
pub fn parse_html_with_options(
    input: &str,
    options: &ParseOptions,
) -> Result<Document, ParseError> {
    let mut parser = HtmlParser::new(input, options);
    parser.parse()
}

/// Decodes raw bytes to UTF-8 text.
///
/// BOM sniffing first; then the bytes are taken as UTF-8 if valid, with
/// windows-1252 (the de-facto HTML fallback) as the last resort.
#[must_use]
pub fn decode_to_utf8(input: &[u8]) -> String {
    if let Some((encoding, bom_len)) = encoding_rs::Encoding::for_bom(input) {
        let (text, _, _) = encoding.decode(&input[bom_len..]);
        return text.into_owned();
    }
    match std::str::from_utf8(input) {
        Ok(text) => text.to_string(),
        Err(_) => {
            log::debug!("input is not valid UTF-8, decoding as windows-1252");
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(input);
            text.into_owned()
        }
    }
}

// --- Content model tables ---

/// Returns true if `tag` (lowercase) is a void element that must not have
/// content.
pub(crate) fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Returns true if opening `tag` auto-closes a currently open `open_tag`.
/// For example a new `<li>` closes a previous `<li>`.
fn auto_closes(open_tag: &str, tag: &str) -> bool {
    match open_tag {
        "p" => matches!(
            tag,
            "p" | "div"
                | "ul"
                | "ol"
                | "dl"
                | "pre"
                | "table"
                | "blockquote"
                | "address"
                | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
                | "hr"
                | "form"
                | "fieldset"
                | "section"
                | "article"
                | "aside"
                | "header"
                | "footer"
                | "nav"
                | "figure"
                | "main"
        ),
        "li" => tag == "li",
        "dt" => matches!(tag, "dt" | "dd"),
        "dd" => tag == "dt",
        "tr" => tag == "tr",
        "td" | "th" => matches!(tag, "td" | "th" | "tr"),
        "thead" | "tbody" => matches!(tag, "tbody" | "tfoot"),
        "tfoot" => tag == "tbody",
        "option" => matches!(tag, "option" | "optgroup"),
        "optgroup" => tag == "optgroup",
        "head" => tag == "body",
        _ => false,
    }
}

/// Raw text elements whose content is never parsed as markup.
pub(crate) fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

/// Elements that belong in `<head>`.
fn is_head_content_element(tag: &str) -> bool {
    matches!(
        tag,
        "title" | "meta" | "link" | "base" | "style" | "script" | "noscript"
    )
}

/// Resolves a named character reference to its replacement text.
fn lookup_entity(name: &str) -> Option<&'static str> {
    let value = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        "hellip" => "\u{2026}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "times" => "\u{d7}",
        "divide" => "\u{f7}",
        "plusmn" => "\u{b1}",
        "deg" => "\u{b0}",
        "middot" => "\u{b7}",
        "sect" => "\u{a7}",
        "para" => "\u{b6}",
        "euro" => "\u{20ac}",
        "pound" => "\u{a3}",
        "cent" => "\u{a2}",
        "yen" => "\u{a5}",
        "bull" => "\u{2022}",
        _ => return None,
    };
    Some(value)
}

// --- Input cursor ---

/// Byte cursor over the input with line/column tracking.
struct Cursor<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn looking_at(&self, needle: &[u8]) -> bool {
        self.bytes[self.pos..].starts_with(needle)
    }

    fn looking_at_ci(&self, needle: &[u8]) -> bool {
        let end = self.pos + needle.len();
        end <= self.bytes.len() && self.bytes[self.pos..end].eq_ignore_ascii_case(needle)
    }

    fn advance(&mut self, count: usize) {
        for _ in 0..count {
            let Some(&b) = self.bytes.get(self.pos) else {
                return;
            };
            self.pos += 1;
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else if b & 0xC0 != 0x80 {
                // Count characters, not UTF-8 continuation bytes
                self.column += 1;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.advance(1);
        }
    }

    /// Reads the next character, normalizing CR/LF to `\n`. Returns `None`
    /// at end of input.
    fn next_char(&mut self) -> Option<char> {
        let ch = self.text[self.pos..].chars().next()?;
        self.advance(ch.len_utf8());
        if ch == '\r' {
            if self.peek() == Some(b'\n') {
                self.advance(1);
            }
            return Some('\n');
        }
        Some(ch)
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[start..end]
    }

    fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    fn save(&self) -> (usize, u32, u32) {
        (self.pos, self.line, self.column)
    }

    fn restore(&mut self, saved: (usize, u32, u32)) {
        self.pos = saved.0;
        self.line = saved.1;
        self.column = saved.2;
    }
}

// --- The HTML parser ---

/// The core HTML parser state machine.
///
/// Hand-rolled and error-tolerant: tag names are lowercased, void elements
/// never nest, open elements are auto-closed by the content model rules,
/// and missing structural elements are implied.
struct HtmlParser<'a> {
    input: Cursor<'a>,
    doc: Document,
    options: ParseOptions,
    /// Stack of open element node ids and their lowercase tag names.
    open_elements: Vec<(NodeId, String)>,
    fatal_error: Option<ParseError>,
}

impl<'a> HtmlParser<'a> {
    fn new(input: &'a str, options: &ParseOptions) -> Self {
        Self {
            input: Cursor::new(input),
            doc: Document::new(),
            options: options.clone(),
            open_elements: Vec::new(),
            fatal_error: None,
        }
    }

    fn parse(&mut self) -> Result<Document, ParseError> {
        if self.input.text.trim().is_empty() && !self.options.recover {
            return Err(ParseError::new("empty document", self.input.location()));
        }

        self.input.skip_whitespace();

        if self.input.looking_at_ci(b"<!doctype") {
            self.parse_doctype();
            self.input.skip_whitespace();
        }

        self.parse_content();

        if let Some(err) = self.fatal_error.take() {
            return Err(err);
        }

        while let Some((_, tag)) = self.open_elements.pop() {
            self.push_warning(format!("unclosed element <{tag}> at end of document"));
        }

        Ok(std::mem::take(&mut self.doc))
    }

    /// Ensures an `<html>` element exists at the document root.
    fn ensure_html(&mut self) -> NodeId {
        let root = self.doc.root();
        for id in self.doc.children(root) {
            if self.doc.node_name(id) == Some("html") {
                return id;
            }
        }
        let html_id = self.doc.create_element("html");
        self.doc.append_child(root, html_id);
        self.open_elements.push((html_id, "html".to_string()));
        html_id
    }

    /// Ensures a `<body>` element exists under `<html>`.
    fn ensure_body(&mut self) -> NodeId {
        let html_id = self.ensure_html();
        for id in self.doc.children(html_id) {
            if self.doc.node_name(id) == Some("body") {
                return id;
            }
        }
        let body_id = self.doc.create_element("body");
        self.doc.append_child(html_id, body_id);
        self.open_elements.push((body_id, "body".to_string()));
        body_id
    }

    /// Ensures a `<head>` element exists under `<html>`, before `<body>`.
    fn ensure_head(&mut self) -> NodeId {
        let html_id = self.ensure_html();
        for id in self.doc.children(html_id) {
            if self.doc.node_name(id) == Some("head") {
                return id;
            }
        }
        let head_id = self.doc.create_element("head");
        let body_id = self
            .doc
            .children(html_id)
            .find(|&id| self.doc.node_name(id) == Some("body"));
        if let Some(body) = body_id {
            self.doc.insert_before(body, head_id);
        } else {
            self.doc.append_child(html_id, head_id);
        }
        head_id
    }

    /// The current insertion point: innermost open element or the root.
    fn current_parent(&self) -> NodeId {
        self.open_elements
            .last()
            .map_or_else(|| self.doc.root(), |&(id, _)| id)
    }

    fn parse_content(&mut self) {
        while !self.input.at_end() && self.fatal_error.is_none() {
            if self.input.looking_at(b"<!--") {
                self.parse_comment();
            } else if self.input.looking_at_ci(b"<!doctype") {
                // Extra doctypes are ignored
                self.skip_to_gt();
            } else if self.input.looking_at(b"</") {
                self.parse_end_tag();
            } else if self.input.peek() == Some(b'<')
                && self
                    .input
                    .peek_at(1)
                    .is_some_and(|b| b.is_ascii_alphabetic())
            {
                self.parse_start_tag();
            } else if self.input.peek() == Some(b'<')
                && matches!(self.input.peek_at(1), Some(b'!') | Some(b'?'))
            {
                self.push_warning("bogus markup ignored".to_string());
                self.skip_to_gt();
            } else {
                self.parse_text();
            }
        }
    }

    // --- DOCTYPE ---

    fn parse_doctype(&mut self) {
        self.input.advance(9); // "<!doctype"
        self.input.skip_whitespace();
        let name = self.parse_tag_name().to_ascii_lowercase();
        self.skip_to_gt();

        let doctype_id = self.doc.create_node(NodeKind::Doctype { name });
        let root = self.doc.root();
        self.doc.append_child(root, doctype_id);
    }

    // --- Start tag ---

    fn parse_start_tag(&mut self) {
        self.input.advance(1); // '<'

        let tag = self.parse_tag_name();
        if tag.is_empty() {
            self.push_warning("empty tag name".to_string());
            self.skip_to_gt();
            return;
        }
        let tag = tag.to_ascii_lowercase();

        let attributes = self.parse_attributes();

        self.input.skip_whitespace();
        let explicit_self_close = self.input.peek() == Some(b'/');
        if explicit_self_close {
            self.input.advance(1);
        }
        if self.input.peek() == Some(b'>') {
            self.input.advance(1);
        } else if !self.input.at_end() {
            self.push_warning(format!("expected '>' after tag <{tag}>"));
            self.skip_to_gt();
        }

        // Structural elements merge into any implied counterpart instead of
        // nesting a second copy.
        if !self.options.no_implied {
            match tag.as_str() {
                "html" => {
                    let html_id = self.ensure_html();
                    self.merge_attributes(html_id, attributes);
                    if !self.open_elements.iter().any(|(_, t)| t == "html") {
                        self.open_elements.push((html_id, tag));
                    }
                    return;
                }
                "head" => {
                    let head_id = self.ensure_head();
                    self.merge_attributes(head_id, attributes);
                    if !self.open_elements.iter().any(|(_, t)| t == "head") {
                        self.open_elements.push((head_id, tag));
                    }
                    return;
                }
                "body" => {
                    self.close_head_if_open();
                    let body_id = self.ensure_body();
                    self.merge_attributes(body_id, attributes);
                    if !self.open_elements.iter().any(|(_, t)| t == "body") {
                        self.open_elements.push((body_id, tag));
                    }
                    return;
                }
                _ => {}
            }
        }

        self.handle_auto_close(&tag);

        if !self.options.no_implied {
            if is_head_content_element(&tag) && !self.is_in_body() {
                let head_id = self.ensure_head();
                if !self.open_elements.iter().any(|(_, t)| t == "head") {
                    self.open_elements.push((head_id, "head".to_string()));
                }
            } else {
                self.close_head_if_open();
                self.ensure_body();
            }
        }

        if self.open_elements.len() >= MAX_DEPTH {
            self.fatal_error = Some(ParseError::new(
                "maximum element nesting depth exceeded",
                self.input.location(),
            ));
            return;
        }

        let parent = self.current_parent();
        let elem_id = self.doc.create_node(NodeKind::Element {
            name: tag.clone(),
            attributes,
        });
        self.doc.append_child(parent, elem_id);

        if is_void_element(&tag) || explicit_self_close {
            return;
        }

        if is_raw_text_element(&tag) {
            self.open_elements.push((elem_id, tag.clone()));
            self.parse_raw_text(&tag);
            self.open_elements.pop();
            return;
        }

        self.open_elements.push((elem_id, tag));
    }

    /// Merges parsed attributes into an existing element, keeping existing
    /// values on name collisions.
    fn merge_attributes(&mut self, elem_id: NodeId, attrs: Vec<Attribute>) {
        if attrs.is_empty() {
            return;
        }
        if let NodeKind::Element { attributes, .. } = &mut self.doc.node_mut(elem_id).kind {
            for attr in attrs {
                if !attributes.iter().any(|a| a.name == attr.name) {
                    attributes.push(attr);
                }
            }
        }
    }

    fn close_head_if_open(&mut self) {
        if self.open_elements.last().is_some_and(|(_, t)| t == "head") {
            self.open_elements.pop();
        }
    }

    fn is_in_body(&self) -> bool {
        self.open_elements.iter().any(|(_, t)| t == "body")
    }

    /// Pops open elements that the new tag auto-closes.
    fn handle_auto_close(&mut self, new_tag: &str) {
        while self
            .open_elements
            .last()
            .is_some_and(|(_, open_tag)| auto_closes(open_tag, new_tag))
        {
            self.open_elements.pop();
        }
    }

    // --- End tag ---

    fn parse_end_tag(&mut self) {
        self.input.advance(2); // '</'
        let tag = self.parse_tag_name().to_ascii_lowercase();

        self.input.skip_whitespace();
        if self.input.peek() == Some(b'>') {
            self.input.advance(1);
        } else if !self.input.at_end() {
            self.push_warning(format!("expected '>' after end tag </{tag}>"));
            self.skip_to_gt();
        }

        if is_void_element(&tag) {
            self.push_warning(format!("end tag for void element </{tag}> ignored"));
            return;
        }

        let found = self
            .open_elements
            .iter()
            .rposition(|(_, name)| *name == tag);

        if let Some(idx) = found {
            let implicit: Vec<String> = self.open_elements[idx..]
                .iter()
                .filter(|(_, name)| *name != tag)
                .map(|(_, name)| name.clone())
                .collect();
            for closed_tag in implicit {
                self.push_warning(format!(
                    "implicitly closing <{closed_tag}> before </{tag}>"
                ));
            }
            self.open_elements.truncate(idx);
        } else {
            self.push_warning(format!("stray end tag </{tag}>"));
        }
    }

    // --- Attributes ---

    fn parse_attributes(&mut self) -> Vec<Attribute> {
        let mut attributes: Vec<Attribute> = Vec::new();

        loop {
            self.input.skip_whitespace();

            if self.input.at_end()
                || self.input.peek() == Some(b'>')
                || self.input.peek() == Some(b'/')
            {
                break;
            }

            let name = self.parse_attr_name();
            if name.is_empty() {
                self.input.advance(1);
                continue;
            }
            let name = name.to_ascii_lowercase();

            self.input.skip_whitespace();

            let value = if self.input.peek() == Some(b'=') {
                self.input.advance(1);
                self.input.skip_whitespace();
                self.parse_attr_value()
            } else {
                // Boolean attribute: value equals the name
                name.clone()
            };

            if attributes.iter().any(|a| a.name == name) {
                self.push_warning(format!("duplicate attribute {name} ignored"));
                continue;
            }
            attributes.push(Attribute { name, value });
        }

        attributes
    }

    fn parse_attr_name(&mut self) -> String {
        let start = self.input.pos;
        while let Some(b) = self.input.peek() {
            if b.is_ascii_whitespace()
                || matches!(b, b'=' | b'>' | b'/' | b'<' | b'"' | b'\'')
            {
                break;
            }
            self.input.advance(1);
        }
        self.input.slice(start, self.input.pos).to_string()
    }

    fn parse_attr_value(&mut self) -> String {
        let mut value = String::new();
        match self.input.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.input.advance(1);
                while !self.input.at_end() {
                    if self.input.peek() == Some(quote) {
                        self.input.advance(1);
                        break;
                    }
                    if self.input.peek() == Some(b'&') {
                        let resolved = self.parse_reference();
                        value.push_str(&resolved);
                    } else if let Some(ch) = self.input.next_char() {
                        value.push(ch);
                    }
                }
            }
            _ => {
                while let Some(b) = self.input.peek() {
                    if b.is_ascii_whitespace() || matches!(b, b'>' | b'<' | b'"' | b'\'' | b'`') {
                        break;
                    }
                    if b == b'&' {
                        let resolved = self.parse_reference();
                        value.push_str(&resolved);
                    } else if let Some(ch) = self.input.next_char() {
                        value.push(ch);
                    }
                }
            }
        }
        value
    }

    // --- Text ---

    fn parse_text(&mut self) {
        let mut text = String::new();

        while !self.input.at_end() {
            if self.input.peek() == Some(b'<') {
                break;
            }
            if self.input.peek() == Some(b'&') {
                let resolved = self.parse_reference();
                text.push_str(&resolved);
            } else if let Some(ch) = self.input.next_char() {
                text.push(ch);
            }
        }

        if text.is_empty() {
            return;
        }
        let blank = text.chars().all(char::is_whitespace);
        if self.options.no_blanks && blank {
            return;
        }
        if !self.options.no_implied && self.open_elements.is_empty() {
            // Whitespace between structural elements is not content
            if blank {
                return;
            }
            self.ensure_body();
        }
        let parent = self.current_parent();
        let text_id = self.doc.create_text(text);
        self.doc.append_child(parent, text_id);
    }

    // --- Raw text (script/style) ---

    fn parse_raw_text(&mut self, tag: &str) {
        let end_tag: Vec<u8> = format!("</{tag}").into_bytes();
        let mut content = String::new();

        while !self.input.at_end() {
            if self.input.looking_at_ci(&end_tag) {
                break;
            }
            if let Some(ch) = self.input.next_char() {
                content.push(ch);
            }
        }

        if !content.is_empty() {
            let parent = self.current_parent();
            let text_id = self.doc.create_text(content);
            self.doc.append_child(parent, text_id);
        }

        if !self.input.at_end() {
            self.input.advance(end_tag.len());
            self.skip_to_gt();
        } else {
            self.push_warning(format!("unclosed <{tag}> at end of document"));
        }
    }

    // --- Comments ---

    fn parse_comment(&mut self) {
        self.input.advance(4); // '<!--'

        // Abruptly closed comments: <!--> and <!--->
        for close in [&b">"[..], &b"->"[..]] {
            if self.input.looking_at(close) {
                self.input.advance(close.len());
                let parent = self.current_parent();
                let comment_id = self.doc.create_node(NodeKind::Comment {
                    content: String::new(),
                });
                self.doc.append_child(parent, comment_id);
                return;
            }
        }

        let mut content = String::new();
        let mut terminated = false;

        while !self.input.at_end() {
            if self.input.looking_at(b"-->") {
                self.input.advance(3);
                terminated = true;
                break;
            }
            if self.input.looking_at(b"--!>") {
                self.input.advance(4);
                terminated = true;
                break;
            }
            if let Some(ch) = self.input.next_char() {
                content.push(ch);
            }
        }

        // Comments that reach EOF are dropped
        if !terminated {
            self.push_warning("unterminated comment".to_string());
            return;
        }

        let parent = self.current_parent();
        let comment_id = self.doc.create_node(NodeKind::Comment { content });
        self.doc.append_child(parent, comment_id);
    }

    // --- Character references ---

    /// Parses a character or entity reference, degrading to a bare `&` for
    /// anything that doesn't look like one.
    fn parse_reference(&mut self) -> String {
        let saved = self.input.save();
        self.input.advance(1); // '&'

        if self.input.peek() == Some(b'#') {
            self.input.advance(1);
            let hex = matches!(self.input.peek(), Some(b'x' | b'X'));
            if hex {
                self.input.advance(1);
            }
            let digits = if hex {
                self.take_while_ascii(|b| b.is_ascii_hexdigit())
            } else {
                self.take_while_ascii(|b| b.is_ascii_digit())
            };
            if !digits.is_empty() && self.input.peek() == Some(b';') {
                self.input.advance(1);
                let radix = if hex { 16 } else { 10 };
                if let Ok(value) = u32::from_str_radix(&digits, radix) {
                    if let Some(ch) = char::from_u32(value) {
                        return ch.to_string();
                    }
                }
            }
            self.input.restore(saved);
            self.input.advance(1);
            return "&".to_string();
        }

        let name = self.take_while_ascii(|b| b.is_ascii_alphanumeric());
        if !name.is_empty() {
            if self.input.peek() == Some(b';') {
                self.input.advance(1);
                if let Some(value) = lookup_entity(&name) {
                    return value.to_string();
                }
                self.push_warning(format!("unknown entity reference &{name};"));
                return format!("&{name};");
            }
            // Tolerate a missing semicolon on known entities
            if let Some(value) = lookup_entity(&name) {
                self.push_warning(format!("entity reference &{name} missing semicolon"));
                return value.to_string();
            }
        }

        self.input.restore(saved);
        self.input.advance(1);
        "&".to_string()
    }

    // --- Low-level helpers ---

    fn parse_tag_name(&mut self) -> String {
        let start = self.input.pos;
        while let Some(b) = self.input.peek() {
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':') {
                self.input.advance(1);
            } else {
                break;
            }
        }
        self.input.slice(start, self.input.pos).to_string()
    }

    fn skip_to_gt(&mut self) {
        while !self.input.at_end() {
            if self.input.peek() == Some(b'>') {
                self.input.advance(1);
                return;
            }
            self.input.advance(1);
        }
    }

    fn take_while_ascii(&mut self, pred: impl Fn(u8) -> bool) -> String {
        let start = self.input.pos;
        while self.input.peek().is_some_and(&pred) {
            self.input.advance(1);
        }
        self.input.slice(start, self.input.pos).to_string()
    }

    fn push_warning(&mut self, message: String) {
        if self.options.no_warnings {
            return;
        }
        log::debug!("html parser recovered: {message}");
        self.doc.diagnostics.push(ParseDiagnostic {
            severity: Severity::Warning,
            message,
            location: self.input.location(),
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> Document {
        parse_html(input).unwrap_or_else(|e| panic!("parse failed: {e}"))
    }

    fn parse_no_implied(input: &str) -> Document {
        let opts = ParseOptions::default().no_implied(true);
        parse_html_with_options(input, &opts).unwrap_or_else(|e| panic!("parse failed: {e}"))
    }

    #[test]
    fn test_parse_simple_html() {
        let doc = parse("<html><body><p>Hello</p></body></html>");
        let html = doc.root_element().unwrap();
        assert_eq!(doc.node_name(html), Some("html"));
        assert_eq!(doc.select("p").text(&doc), "Hello");
    }

    #[test]
    fn test_implied_structure() {
        let doc = parse("<p>Hello</p>");
        let html = doc.root_element().unwrap();
        assert_eq!(doc.node_name(html), Some("html"));
        let body = doc
            .children(html)
            .find(|&id| doc.node_name(id) == Some("body"))
            .unwrap();
        let p = doc.first_child(body).unwrap();
        assert_eq!(doc.node_name(p), Some("p"));
    }

    #[test]
    fn test_no_implied_option() {
        let doc = parse_no_implied("<p>Hello</p>");
        let first = doc.first_child(doc.root()).unwrap();
        assert_eq!(doc.node_name(first), Some("p"));
        assert_eq!(doc.text_content(first), "Hello");
    }

    #[test]
    fn test_void_elements() {
        let doc = parse_no_implied("<p>line1<br>line2</p>");
        let p = doc.first_child(doc.root()).unwrap();
        let children: Vec<_> = doc.children(p).collect();
        assert_eq!(children.len(), 3);
        assert_eq!(doc.node_name(children[1]), Some("br"));
        assert!(doc.first_child(children[1]).is_none());
    }

    #[test]
    fn test_auto_close_list_items() {
        let doc = parse("<ul><li>one<li>two<li>three</ul>");
        let items = doc.select("li");
        assert_eq!(items.len(), 3);
        assert_eq!(items.eq(1).unwrap().text(&doc), "two");
        // No nesting happened
        assert!(doc.select("li li").is_empty());
    }

    #[test]
    fn test_auto_close_paragraphs() {
        let doc = parse("<p>first<p>second<div>third</div>");
        assert_eq!(doc.select("p").len(), 2);
        assert!(doc.select("p div").is_empty());
    }

    #[test]
    fn test_unquoted_and_boolean_attributes() {
        let doc = parse("<div class=main><input disabled type='text'></div>");
        let div = doc.select("div.main");
        assert_eq!(div.len(), 1);
        let input = doc.select("input");
        assert_eq!(input.attr(&doc, "disabled").as_deref(), Some("disabled"));
        assert_eq!(input.attr(&doc, "type").as_deref(), Some("text"));
    }

    #[test]
    fn test_case_insensitive_tags_and_attrs() {
        let doc = parse("<DIV ID='x'>y</DIV>");
        assert_eq!(doc.select("div#x").len(), 1);
    }

    #[test]
    fn test_entities() {
        let doc = parse("<p>a &amp; b &lt;c&gt; &#65; &#x42; &unknown; &amp</p>");
        assert_eq!(doc.select("p").text(&doc), "a & b <c> A B &unknown; &");
    }

    #[test]
    fn test_bare_ampersand() {
        let doc = parse("<p>fish & chips</p>");
        assert_eq!(doc.select("p").text(&doc), "fish & chips");
    }

    #[test]
    fn test_comments() {
        let doc = parse_no_implied("<div><!-- note -->text</div>");
        let div = doc.first_child(doc.root()).unwrap();
        let children: Vec<_> = doc.children(div).collect();
        assert_eq!(children.len(), 2);
        assert_eq!(doc.node_text(children[0]), Some(" note "));
        // Comments don't contribute to text content
        assert_eq!(doc.text_content(div), "text");
    }

    #[test]
    fn test_script_is_raw_text() {
        let doc = parse("<script>if (a < b) { x(); }</script>");
        let script = doc.select("script");
        assert_eq!(script.len(), 1);
        assert_eq!(script.text(&doc), "if (a < b) { x(); }");
        // The < inside did not open an element
        assert!(doc.select("b").is_empty());
    }

    #[test]
    fn test_head_content_placement() {
        let doc = parse("<title>t</title><p>body text</p>");
        assert_eq!(doc.select("head > title").len(), 1);
        assert_eq!(doc.select("body > p").len(), 1);
    }

    #[test]
    fn test_no_blanks_option() {
        let opts = ParseOptions::default().no_blanks(true).no_implied(true);
        let doc = parse_html_with_options("<div>  \n  <p>x</p>  </div>", &opts).unwrap();
        let div = doc.first_child(doc.root()).unwrap();
        let children: Vec<_> = doc.children(div).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(doc.node_name(children[0]), Some("p"));
    }

    #[test]
    fn test_stray_end_tag_diagnostic() {
        let doc = parse("<div></span></div>");
        assert!(doc
            .diagnostics
            .iter()
            .any(|d| d.message.contains("stray end tag")));
        assert_eq!(doc.select("div").len(), 1);
    }

    #[test]
    fn test_unclosed_elements_recovered() {
        let doc = parse("<div><p>text");
        assert_eq!(doc.select("div p").len(), 1);
        assert!(doc
            .diagnostics
            .iter()
            .any(|d| d.message.contains("unclosed element")));
    }

    #[test]
    fn test_doctype() {
        let doc = parse("<!DOCTYPE html><p>x</p>");
        let has_doctype = doc
            .children(doc.root())
            .any(|id| matches!(&doc.node(id).kind, NodeKind::Doctype { name } if name == "html"));
        assert!(has_doctype);
    }

    #[test]
    fn test_empty_input_strict_fails() {
        let opts = ParseOptions::default().recover(false);
        assert!(parse_html_with_options("", &opts).is_err());
        assert!(parse_html_with_options("   ", &opts).is_err());
        // Recovery mode produces an empty document instead
        assert!(parse_html("").is_ok());
    }

    #[test]
    fn test_decode_utf8_passthrough() {
        assert_eq!(decode_to_utf8("héllo".as_bytes()), "héllo");
    }

    #[test]
    fn test_decode_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("x".as_bytes());
        assert_eq!(decode_to_utf8(&bytes), "x");
    }

    #[test]
    fn test_decode_windows_1252_fallback() {
        // 0xE9 is é in windows-1252 and invalid UTF-8
        assert_eq!(decode_to_utf8(&[0x63, 0x61, 0x66, 0xE9]), "café");
    }

    #[test]
    fn test_parse_bytes_entry_point() {
        let doc = Document::parse_bytes(b"<p>ok</p>").unwrap();
        assert_eq!(doc.select("p").text(&doc), "ok");
    }

    #[test]
    fn test_crlf_normalization() {
        let doc = parse_no_implied("<pre>a\r\nb</pre>");
        let pre = doc.first_child(doc.root()).unwrap();
        assert_eq!(doc.text_content(pre), "a\nb");
    }

    #[test]
    fn test_duplicate_attributes_keep_first() {
        let doc = parse("<div id='a' id='b'></div>");
        assert_eq!(doc.select("div").attr(&doc, "id").as_deref(), Some("a"));
        assert!(doc
            .diagnostics
            .iter()
            .any(|d| d.message.contains("duplicate attribute")));
    }
}
