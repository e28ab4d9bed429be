// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

//! Tokenizer-level scenarios that don't need a tree builder: character
//! reference edge cases, RCDATA/RAWTEXT state switching, and CDATA
//! sections in foreign content.

use html5core::tokenizer::interface::{TagKind, Token, TokenSink, TokenSinkResult};
use html5core::tokenizer::{Tokenizer, TokenizerOpts};
use tendril::StrTendril;

struct CollectSink {
    tokens: Vec<Token>,
    foreign: bool,
}

impl TokenSink for CollectSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        self.tokens.push(token);
        TokenSinkResult::Continue
    }

    fn adjusted_current_node_present_but_not_in_html_namespace(&self) -> bool {
        self.foreign
    }
}

fn tokenize(input: &str) -> Vec<Token> {
    let sink = CollectSink { tokens: Vec::new(), foreign: false };
    let mut tok = Tokenizer::new(sink, TokenizerOpts::default());
    tok.feed(StrTendril::from_slice(input));
    tok.end();
    tok.unwrap().tokens
}

fn text_of(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter_map(|t| match t {
            Token::CharacterTokens(s) => Some(s.to_string()),
            _ => None,
        })
        .collect()
}

#[test]
fn named_reference_without_trailing_semicolon_reports_missing_semicolon() {
    let tokens = tokenize("a &amp b");
    assert_eq!(text_of(&tokens), "a & b");
    let saw_error = tokens.iter().any(|t| {
        matches!(
            t,
            Token::ParseError(html5core::tokenizer::interface::ParseErrorCode::MissingSemicolonAfterCharacterReference, _)
        )
    });
    assert!(saw_error, "expected a missing-semicolon parse error, got: {tokens:?}");
}

#[test]
fn numeric_reference_applies_windows_1252_fixup() {
    // &#146; names a C1 control literally, but authors mean the
    // windows-1252 RIGHT SINGLE QUOTATION MARK that byte value actually
    // represents in the wild.
    let tokens = tokenize("&#146;");
    assert_eq!(text_of(&tokens), "\u{2019}");
}

#[test]
fn null_numeric_reference_becomes_replacement_character() {
    let tokens = tokenize("&#0;");
    assert_eq!(text_of(&tokens), "\u{FFFD}");
}

#[test]
fn rawtext_state_suppresses_tag_parsing_until_matching_end_tag() {
    let sink = CollectSink { tokens: Vec::new(), foreign: false };
    let mut tok = Tokenizer::new(sink, TokenizerOpts::default());
    tok.set_state(html5core::tokenizer::State::Rawtext);
    tok.feed(StrTendril::from_slice("<b>not a tag</b><script>also text</script>"));
    tok.end();
    let tokens = tok.unwrap().tokens;
    // Everything up to (but not including) the RAWTEXT's own closing tag
    // name is plain character data, not parsed markup.
    assert!(!tokens.iter().any(|t| matches!(t, Token::TagToken(tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "b")));
}

#[test]
fn plaintext_state_never_exits() {
    let sink = CollectSink { tokens: Vec::new(), foreign: false };
    let mut tok = Tokenizer::new(sink, TokenizerOpts::default());
    tok.set_plaintext_state();
    tok.feed(StrTendril::from_slice("<p>still text</p>"));
    tok.end();
    let tokens = tok.unwrap().tokens;
    assert!(tokens.iter().any(|t| matches!(t, Token::CharacterTokens(s) if s.contains("<p>"))));
    assert!(!tokens.iter().any(|t| matches!(t, Token::TagToken(_))));
}

#[test]
fn cdata_section_in_foreign_content_becomes_character_data() {
    let sink = CollectSink { tokens: Vec::new(), foreign: true };
    let mut tok = Tokenizer::new(sink, TokenizerOpts::default());
    tok.feed(StrTendril::from_slice("<![CDATA[<not-a-tag>]]>"));
    tok.end();
    let tokens = tok.unwrap().tokens;
    assert_eq!(text_of(&tokens), "<not-a-tag>");
}

#[test]
fn cdata_section_outside_foreign_content_is_a_bogus_comment_and_a_parse_error() {
    let tokens = tokenize("<![CDATA[x]]>");
    let saw_error =
        tokens.iter().any(|t| matches!(t, Token::ParseError(html5core::tokenizer::interface::ParseErrorCode::CdataInHtmlContent, _)));
    assert!(saw_error, "expected cdata-in-html-content, got: {tokens:?}");
}

#[test]
fn duplicate_attribute_is_dropped_and_reported() {
    let tokens = tokenize(r#"<p id="a" id="b">"#);
    let tag = tokens
        .iter()
        .find_map(|t| match t {
            Token::TagToken(tag) if tag.kind == TagKind::StartTag => Some(tag),
            _ => None,
        })
        .unwrap();
    assert_eq!(tag.attrs.len(), 1);
    assert_eq!(&*tag.attrs[0].value, "a");
    let saw_error = tokens
        .iter()
        .any(|t| matches!(t, Token::ParseError(html5core::tokenizer::interface::ParseErrorCode::DuplicateAttribute, _)));
    assert!(saw_error);
}
