// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

//! Entry points: `parse`/`parse_fragment` (and their `_bytes` counterparts)
//! wire the encoding sniffer, tokenizer, and tree builder together behind
//! the options in [`ParseOpts`].
//!
//! This driver takes the whole input up front rather than streaming it
//! through a `TendrilSink`, and returns a finished [`ParsedDocument`] —
//! a deliberate simplification; see `DESIGN.md`.

use tendril::StrTendril;

use crate::interface::QualName;
use crate::rcdom::RcDom;
use crate::tokenizer::interface::{ParseErrorCode, Token, TokenSink, TokenSinkResult};
use crate::tokenizer::{Tokenizer, TokenizerOpts};
use crate::tree_builder::{QuirksMode, TreeBuilder, TreeBuilderOpts};

/// One collected parse error: its code, and the line (1-based) it was
/// reported on. Column tracking is not implemented — the tokenizer only
/// threads a line counter through `TokenSink::process_token`, not a
/// per-scalar column — so `column` is always 0; see `DESIGN.md`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub code: ParseErrorCode,
    pub line: u64,
    pub column: u64,
}

/// A terminal parse failure. Only constructed under [`ParseOpts::strict`],
/// wrapping the first error that would otherwise have been collected.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoreError {
    Parse(ParseError),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::Parse(e) => write!(f, "parse error `{}` at line {}", e.code, e.line),
        }
    }
}

impl std::error::Error for CoreError {}

/// Parse configuration: the union of the tokenizer's and tree builder's
/// own option structs, plus the document-level knobs that don't belong to
/// either (`collect_errors`, `strict`, `xml_coercion`).
#[derive(Clone, Default)]
pub struct ParseOpts {
    pub tokenizer: TokenizerOpts,
    pub tree_builder: TreeBuilderOpts,

    /// Accumulate parse errors rather than discarding them.
    pub collect_errors: bool,

    /// Implies `collect_errors`; fail with the first error as a
    /// [`CoreError::Parse`] instead of returning a document.
    pub strict: bool,

    /// Apply XML-compatible post-tokenize coercion: form-feed becomes a
    /// space, noncharacters become U+FFFD, and `--` inside comments
    /// becomes `- -`.
    pub xml_coercion: bool,
}

/// The result of a successful parse: the finished DOM, any errors
/// collected along the way, the resolved quirks mode, and — for a
/// byte-input parse — the encoding that was sniffed and decoded with.
#[derive(Debug)]
pub struct ParsedDocument {
    pub document: RcDom,
    pub errors: Vec<ParseError>,
    pub quirks_mode: QuirksMode,
    pub encoding: Option<&'static encoding_rs::Encoding>,
}

/// Normalize line endings: `\r\n` and lone `\r` both become `\n`, applied
/// once before any tokenizing.
fn normalize_newlines(input: &str) -> std::borrow::Cow<'_, str> {
    if !input.contains('\r') {
        return std::borrow::Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(c);
        }
    }
    std::borrow::Cow::Owned(out)
}

/// A scalar is one of the "noncharacters" the Unicode standard permanently
/// reserves: U+FDD0..=U+FDEF, or the last two code points of any plane
/// (`…FFFE`/`…FFFF`).
fn is_noncharacter(c: char) -> bool {
    let cp = c as u32;
    (0xFDD0..=0xFDEF).contains(&cp) || (cp & 0xFFFE) == 0xFFFE
}

fn coerce_text(contents: &str) -> StrTendril {
    if !contents.chars().any(|c| c == '\u{000C}' || is_noncharacter(c)) {
        return StrTendril::from(contents);
    }
    let mut out = String::with_capacity(contents.len());
    for c in contents.chars() {
        if c == '\u{000C}' {
            out.push(' ');
        } else if is_noncharacter(c) {
            out.push('\u{FFFD}');
        } else {
            out.push(c);
        }
    }
    StrTendril::from(out)
}

fn coerce_comment(contents: &str) -> StrTendril {
    if !contents.contains("--") {
        return StrTendril::from(contents);
    }
    StrTendril::from(contents.replace("--", "- -"))
}

/// A `TokenSink` wrapper applying `xmlCoercion` to character and comment
/// tokens before forwarding everything else to `inner` unchanged.
struct CoercingSink<S> {
    inner: S,
}

impl<S: TokenSink> TokenSink for CoercingSink<S> {
    type Handle = S::Handle;

    fn process_token(&mut self, token: Token, line_number: u64) -> TokenSinkResult<Self::Handle> {
        let token = match token {
            Token::CharacterTokens(s) => Token::CharacterTokens(coerce_text(&s)),
            Token::CommentToken(s) => Token::CommentToken(coerce_comment(&s)),
            other => other,
        };
        self.inner.process_token(token, line_number)
    }

    fn end(&mut self) {
        self.inner.end();
    }

    fn adjusted_current_node_present_but_not_in_html_namespace(&self) -> bool {
        self.inner.adjusted_current_node_present_but_not_in_html_namespace()
    }
}

/// Pick the tokenizer's initial state for a fragment parse from the
/// context element's tag name (RCDATA for `title`/`textarea`, RAWTEXT for
/// `style`/`xmp`/`iframe`/`noembed`/`noframes` and scripting-enabled
/// `noscript`, script-data for `script`, PLAINTEXT for `plaintext`).
fn initial_state_for_context(context: &QualName, scripting_enabled: bool) -> Option<crate::tokenizer::interface::States> {
    use crate::tokenizer::interface::States;
    if context.ns != crate::ns!(html) {
        return None;
    }
    match &*context.local {
        "title" | "textarea" => Some(States::Rcdata),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(States::Rawtext),
        "noscript" if scripting_enabled => Some(States::Rawtext),
        "script" => Some(States::ScriptData),
        "plaintext" => Some(States::Plaintext),
        _ => None,
    }
}

fn drain_errors(dom: &mut RcDom) -> Vec<ParseError> {
    std::mem::take(&mut dom.errors).into_iter().map(|(code, line)| ParseError { code, line, column: 0 }).collect()
}

fn finish(mut dom: RcDom, opts: &ParseOpts) -> Result<ParsedDocument, CoreError> {
    let quirks_mode = dom.quirks_mode;
    let errors = if opts.collect_errors || opts.strict { drain_errors(&mut dom) } else { Vec::new() };

    if opts.strict {
        if let Some(first) = errors.into_iter().next() {
            return Err(CoreError::Parse(first));
        }
        return Ok(ParsedDocument { document: dom, errors: Vec::new(), quirks_mode, encoding: None });
    }

    Ok(ParsedDocument { document: dom, errors, quirks_mode, encoding: None })
}

fn run(input: &str, opts: &ParseOpts, fragment_context: Option<QualName>) -> RcDom {
    let normalized = normalize_newlines(input);

    let mut tree_opts = opts.tree_builder.clone();
    tree_opts.fragment_context = fragment_context.clone();
    let tree_builder = TreeBuilder::new(RcDom::default(), tree_opts);

    if opts.xml_coercion {
        let sink = CoercingSink { inner: tree_builder };
        let mut tokenizer = Tokenizer::new(sink, opts.tokenizer.clone());
        if let Some(ctx) = &fragment_context {
            if let Some(state) = initial_state_for_context(ctx, opts.tree_builder.scripting_enabled) {
                tokenizer.set_state(state);
            }
        }
        tokenizer.feed(StrTendril::from(normalized.as_ref()));
        tokenizer.end();
        tokenizer.unwrap().inner.finish()
    } else {
        let mut tokenizer = Tokenizer::new(tree_builder, opts.tokenizer.clone());
        if let Some(ctx) = &fragment_context {
            if let Some(state) = initial_state_for_context(ctx, opts.tree_builder.scripting_enabled) {
                tokenizer.set_state(state);
            }
        }
        tokenizer.feed(StrTendril::from(normalized.as_ref()));
        tokenizer.end();
        tokenizer.unwrap().finish()
    }
}

/// Parse a full document from already-decoded text.
pub fn parse(input: &str, opts: ParseOpts) -> Result<ParsedDocument, CoreError> {
    let dom = run(input, &opts, None);
    finish(dom, &opts)
}

/// Parse a document fragment rooted at `context` from already-decoded
/// text.
pub fn parse_fragment(input: &str, context: QualName, opts: ParseOpts) -> Result<ParsedDocument, CoreError> {
    let dom = run(input, &opts, Some(context));
    finish(dom, &opts)
}

/// Sniff `bytes`' encoding (honoring `transport_label` if given, ahead of
/// a BOM or a `<meta>` declaration), decode, and parse the result as a
/// full document.
pub fn parse_bytes(bytes: &[u8], transport_label: Option<&str>, opts: ParseOpts) -> Result<ParsedDocument, CoreError> {
    let sniffed = crate::encoding::sniff(bytes, transport_label);
    let text = crate::encoding::decode(&bytes[sniffed.bom_len..], sniffed.encoding);
    let dom = run(&text, &opts, None);
    let mut parsed = finish(dom, &opts)?;
    parsed.encoding = Some(sniffed.encoding);
    Ok(parsed)
}

/// Sniff, decode, and parse `bytes` as a document fragment rooted at
/// `context`.
pub fn parse_fragment_bytes(
    bytes: &[u8],
    transport_label: Option<&str>,
    context: QualName,
    opts: ParseOpts,
) -> Result<ParsedDocument, CoreError> {
    let sniffed = crate::encoding::sniff(bytes, transport_label);
    let text = crate::encoding::decode(&bytes[sniffed.bom_len..], sniffed.encoding);
    let dom = run(&text, &opts, Some(context));
    let mut parsed = finish(dom, &opts)?;
    parsed.encoding = Some(sniffed.encoding);
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ns;

    #[test]
    fn parses_minimal_document() {
        let parsed = parse("<p>Hello</p>", ParseOpts::default()).unwrap();
        let dump = crate::serialize::serialize_document(&parsed.document.document);
        assert!(dump.contains("<html>"));
        assert!(dump.contains("<p>"));
        assert!(dump.contains("\"Hello\""));
    }

    #[test]
    fn strict_mode_surfaces_first_error() {
        let opts = ParseOpts { strict: true, ..ParseOpts::default() };
        let result = parse("<p>a\u{0000}b</p>", opts);
        match result {
            Err(CoreError::Parse(e)) => assert_eq!(e.code, ParseErrorCode::UnexpectedNullCharacter),
            other => panic!("expected a strict-mode parse error, got {other:?}"),
        }
    }

    #[test]
    fn fragment_parse_uses_context_element() {
        let context = QualName::new(None, ns!(html), crate::interface::LocalName::from("div"));
        let parsed = parse_fragment("<span>x</span>", context, ParseOpts::default()).unwrap();
        let dump = crate::serialize::serialize_document(&parsed.document.document);
        assert!(dump.contains("<span>"));
    }

    #[test]
    fn xml_coercion_rewrites_double_hyphen_comments() {
        let opts = ParseOpts { xml_coercion: true, ..ParseOpts::default() };
        let parsed = parse("<!--a--b-->", opts).unwrap();
        let dump = crate::serialize::serialize_document(&parsed.document.document);
        assert!(dump.contains("a- -b"), "dump was: {dump}");
    }

    #[test]
    fn bytes_entry_point_reports_sniffed_encoding() {
        let parsed = parse_bytes(b"<p>hi</p>", Some("utf-8"), ParseOpts::default()).unwrap();
        assert_eq!(parsed.encoding, Some(encoding_rs::UTF_8));
    }
}
