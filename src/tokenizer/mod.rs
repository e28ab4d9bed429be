// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

//! The HTML5 tokenizer: turns a stream of Unicode scalars into a stream of
//! [`Token`]s via a state machine closely following the WHATWG tokenization
//! algorithm. Driven one `BufferQueue` chunk at a time so it composes with
//! incremental input (network chunks, `write()` calls).

pub mod char_ref;
pub mod interface;
pub mod states;

use log::{debug, trace};
use std::borrow::Cow;
use std::mem;
use tendril::StrTendril;

use crate::interface::{Attribute, LocalName, QualName};
use crate::ns;
use crate::small_char_set;
use crate::util::buffer_queue::{BufferQueue, SetResult};
use crate::util::smallcharset::SmallCharSet;
use crate::util::str::lower_ascii_letter;

pub use self::interface::{Doctype, ParseErrorCode, Tag, TagKind, Token, TokenSink, TokenSinkResult};
pub use self::states::{DoctypeIdKind, RawKind, State};

/// Tokenizer-level configuration (`exact_errors`; everything else is
/// driven by the tree builder through [`TokenSinkResult`]).
#[derive(Clone, Default)]
pub struct TokenizerOpts {
    /// Collect every parse error with exact line/column rather than just
    /// counting them. Exact-position tracking costs a branch per scalar,
    /// so it's opt-in.
    pub exact_errors: bool,
    /// Discard a single leading U+FEFF, since the encoding layer already
    /// consumed any byte-order mark; a BOM that survives decoding (e.g.
    /// appeared mid-stream, or the transport-declared encoding didn't
    /// match the BOM that was present) is a real character per spec.
    pub discard_bom: bool,
}

pub struct Tokenizer<Sink> {
    sink: Sink,
    opts: TokenizerOpts,
    state: State,
    input: BufferQueue,

    current_tag: Option<Tag>,
    current_attr_name: StrTendril,
    current_attr_value: StrTendril,
    current_comment: StrTendril,
    current_doctype: Doctype,
    temp_buffer: StrTendril,
    last_start_tag_name: Option<LocalName>,
    appropriate_end_tag_name: Option<LocalName>,

    at_eof: bool,
    discarded_bom: bool,
    ignore_lf: bool,
    line_number: u64,
}

impl<Sink: TokenSink> Tokenizer<Sink> {
    pub fn new(sink: Sink, opts: TokenizerOpts) -> Self {
        Tokenizer {
            sink,
            opts,
            state: State::Data,
            input: BufferQueue::new(),
            current_tag: None,
            current_attr_name: StrTendril::new(),
            current_attr_value: StrTendril::new(),
            current_comment: StrTendril::new(),
            current_doctype: Doctype::default(),
            temp_buffer: StrTendril::new(),
            last_start_tag_name: None,
            appropriate_end_tag_name: None,
            at_eof: false,
            discarded_bom: false,
            ignore_lf: false,
            line_number: 1,
        }
    }

    pub fn unwrap(self) -> Sink {
        self.sink
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut Sink {
        &mut self.sink
    }

    /// Force the next state transition; used by the tree builder to switch
    /// to RCDATA/RAWTEXT/script-data/plaintext after a start tag like
    /// `<title>` or `<script>`, and to re-enter `Data` after a foreign
    /// `<script>` element completes.
    pub fn set_state(&mut self, state: State) {
        self.state = state;
    }

    pub fn set_plaintext_state(&mut self) {
        self.state = State::Plaintext;
    }

    /// Feed one more chunk of decoded input.
    pub fn feed(&mut self, input: StrTendril) {
        if input.is_empty() {
            return;
        }
        if !self.discarded_bom && self.opts.discard_bom {
            self.discarded_bom = true;
            if input.starts_with('\u{FEFF}') {
                self.input.push_back(input.subtendril(3, input.len32() - 3));
                self.run();
                return;
            }
        }
        self.input.push_back(input);
        self.run();
    }

    /// Signal end of input and flush any pending token.
    pub fn end(&mut self) {
        self.at_eof = true;
        self.run();
        self.sink.end();
    }

    fn run(&mut self) {
        while self.step() {}
    }

    fn emit_error(&mut self, code: ParseErrorCode) {
        trace!("parse error: {:?} at line {}", code, self.line_number);
        let msg: Cow<'static, str> = if self.opts.exact_errors {
            Cow::Owned(format!("{:?} (line {})", code, self.line_number))
        } else {
            Cow::Borrowed("")
        };
        self.process_token(Token::ParseError(code, msg));
    }

    fn process_token(&mut self, token: Token) {
        let line = self.line_number;
        match self.sink.process_token(token, line) {
            TokenSinkResult::Continue => {},
            TokenSinkResult::Script(_) => {},
            TokenSinkResult::Plaintext => self.state = State::Plaintext,
            TokenSinkResult::RawData(new_state) => self.state = new_state,
        }
    }

    fn emit_char(&mut self, c: char) {
        if c == '\n' {
            self.line_number += 1;
        }
        let mut s = StrTendril::new();
        s.push_char(c);
        self.process_token(Token::CharacterTokens(s));
    }

    fn emit_chars(&mut self, s: StrTendril) {
        self.line_number += s.chars().filter(|&c| c == '\n').count() as u64;
        self.process_token(Token::CharacterTokens(s));
    }

    fn emit_current_tag(&mut self) {
        let mut tag = self.current_tag.take().expect("emit_current_tag: no current tag");
        if find_duplicate_attr(&tag) {
            self.emit_error(ParseErrorCode::DuplicateAttribute);
        }
        dedup_attrs_keep_first(&mut tag.attrs);
        if tag.kind == TagKind::StartTag {
            self.last_start_tag_name = Some(tag.name.local.clone());
        }
        debug!("emitting tag {:?}", tag.name.local);
        self.process_token(Token::TagToken(tag));
    }

    fn start_new_tag(&mut self, kind: TagKind, first_char: char) {
        let mut name = String::new();
        name.push(first_char.to_ascii_lowercase());
        self.current_tag = Some(Tag {
            kind,
            name: QualName::new(None, ns!(html), LocalName::from(name.as_str())),
            self_closing: false,
            attrs: Vec::new(),
        });
    }

    fn append_to_tag_name(&mut self, c: char) {
        let tag = self.current_tag.as_mut().expect("append_to_tag_name: no current tag");
        let mut s = tag.name.local.to_string();
        s.push(c);
        tag.name.local = LocalName::from(s.as_str());
    }

    fn is_appropriate_end_tag(&self) -> bool {
        match (&self.current_tag, &self.last_start_tag_name) {
            (Some(tag), Some(name)) => tag.kind == TagKind::EndTag && &tag.name.local == name,
            _ => false,
        }
    }

    fn create_attribute(&mut self, first_char: Option<char>) {
        self.flush_current_attr();
        if let Some(c) = first_char {
            self.current_attr_name.push_char(c);
        }
    }

    fn flush_current_attr(&mut self) {
        if self.current_attr_name.is_empty() {
            self.current_attr_value.clear();
            return;
        }
        let name = mem::take(&mut self.current_attr_name);
        let value = mem::take(&mut self.current_attr_value);
        if let Some(tag) = self.current_tag.as_mut() {
            tag.attrs.push(Attribute {
                name: QualName::new(None, ns!(), LocalName::from(&*name)),
                value,
            });
        }
    }

    fn emit_doctype(&mut self) {
        let doctype = mem::take(&mut self.current_doctype);
        self.process_token(Token::DoctypeToken(doctype));
    }

    fn emit_comment(&mut self) {
        let comment = mem::take(&mut self.current_comment);
        self.process_token(Token::CommentToken(comment));
    }

    /// Consume a character reference starting right after an `&` that was
    /// already seen, emitting the resolved character(s) (or re-emitting a
    /// bare `&` on failure). `in_attribute` selects the ambiguous-ampersand
    /// rule and routes the output into the current attribute value instead
    /// of a character token.
    fn consume_char_ref(&mut self, in_attribute: bool, additional_allowed: Option<char>) {
        if let Some(c) = self.input.peek() {
            if Some(c) == additional_allowed || c.is_ascii_whitespace() || c == '<' || c == '&' {
                self.emit_char_ref_literal('&', in_attribute);
                return;
            }
        }

        let mut lookahead = String::new();
        let mut consumed_chars = Vec::new();
        while lookahead.len() < 34 {
            match self.input.peek() {
                Some(c) => {
                    lookahead.push(c);
                    consumed_chars.push(c);
                    self.input.next();
                },
                None => break,
            }
        }

        let result = char_ref::resolve(&lookahead, in_attribute);
        for &c in consumed_chars[result.consumed..].iter().rev() {
            let mut t = StrTendril::new();
            t.push_char(c);
            self.input.push_front(t);
        }

        for err in &result.errors {
            self.emit_error(*err);
        }

        match result.chars {
            (None, None) => self.emit_char_ref_literal('&', in_attribute),
            (Some(a), b) => {
                self.push_char_ref_output(a, in_attribute);
                if let Some(b) = b {
                    self.push_char_ref_output(b, in_attribute);
                }
            },
            (None, Some(_)) => unreachable!(),
        }
    }

    fn emit_char_ref_literal(&mut self, c: char, in_attribute: bool) {
        self.push_char_ref_output(c, in_attribute);
    }

    fn push_char_ref_output(&mut self, c: char, in_attribute: bool) {
        if in_attribute {
            self.current_attr_value.push_char(c);
        } else {
            self.emit_char(c);
        }
    }

    /// One iteration of the state machine. Returns `false` when input is
    /// exhausted and not yet at EOF (the caller should wait for more
    /// `feed()`s), or when EOF token has just been emitted.
    fn step(&mut self) -> bool {
        let set = self.batch_scan_set();
        if let Some(set) = set {
            if !self.at_eof && self.input.is_empty() {
                return false;
            }
            match self.input.pop_except_from(set) {
                Some(SetResult::NotFromSet(s)) => {
                    self.emit_chars(s);
                    return true;
                },
                Some(SetResult::FromSet(c)) => return self.process_char_in_batch_state(c),
                None => {
                    if self.at_eof {
                        return self.process_eof();
                    }
                    return false;
                },
            }
        }

        match self.input.next() {
            Some(c) => self.process_char(c),
            None => {
                if self.at_eof {
                    self.process_eof()
                } else {
                    false
                }
            },
        }
    }

    /// States that can batch-scan a run of "uninteresting" characters:
    /// Data, RCDATA, RAWTEXT, attribute values. Returns the delimiter set
    /// for the current state, or `None` if this state must be driven
    /// scalar-by-scalar.
    fn batch_scan_set(&self) -> Option<SmallCharSet> {
        match self.state {
            State::Data => Some(small_char_set!(b'\0' b'&' b'<' b'\r')),
            State::Rcdata => Some(small_char_set!(b'\0' b'&' b'<' b'\r')),
            State::Rawtext | State::ScriptData | State::ScriptDataEscaped => {
                Some(small_char_set!(b'\0' b'<' b'\r'))
            },
            State::AttributeValueDoubleQuoted => Some(small_char_set!(b'\0' b'"' b'&' b'\r')),
            State::AttributeValueSingleQuoted => Some(small_char_set!(b'\0' b'\'' b'&' b'\r')),
            State::AttributeValueUnquoted => Some(small_char_set!(b'\0' b'\t' b'\n' b' ' b'&' b'>' b'\r')),
            _ => None,
        }
    }

    fn process_char_in_batch_state(&mut self, c: char) -> bool {
        if c == '\r' {
            self.input.next();
            match self.input.peek() {
                Some('\n') => {
                    self.input.next();
                },
                _ => {},
            }
            self.process_char('\n');
            return true;
        }
        self.process_char(c)
    }

    fn process_eof(&mut self) -> bool {
        match self.state {
            State::Data
            | State::Rcdata
            | State::Rawtext
            | State::ScriptData
            | State::Plaintext
            | State::ScriptDataEscaped
            | State::ScriptDataDoubleEscaped => {
                self.process_token(Token::EOFToken);
                false
            },
            State::TagOpen => {
                self.emit_error(ParseErrorCode::EofBeforeTagName);
                self.emit_char('<');
                self.process_token(Token::EOFToken);
                false
            },
            State::TagName
            | State::BeforeAttributeName
            | State::AttributeName
            | State::AfterAttributeName
            | State::BeforeAttributeValue
            | State::AttributeValueDoubleQuoted
            | State::AttributeValueSingleQuoted
            | State::AttributeValueUnquoted
            | State::AfterAttributeValueQuoted
            | State::SelfClosingStartTag => {
                self.emit_error(ParseErrorCode::EofInTag);
                self.process_token(Token::EOFToken);
                false
            },
            State::Comment
            | State::CommentStart
            | State::CommentStartDash
            | State::CommentEndDash
            | State::CommentEnd
            | State::CommentEndBang => {
                self.emit_error(ParseErrorCode::EofInComment);
                self.emit_comment();
                self.process_token(Token::EOFToken);
                false
            },
            State::Doctype | State::BeforeDoctypeName => {
                self.emit_error(ParseErrorCode::EofInDoctype);
                self.current_doctype.force_quirks = true;
                self.emit_doctype();
                self.process_token(Token::EOFToken);
                false
            },
            State::DoctypeName
            | State::AfterDoctypeName
            | State::AfterDoctypeKeyword(_)
            | State::BeforeDoctypeIdentifier(_)
            | State::DoctypeIdentifierDoubleQuoted(_)
            | State::DoctypeIdentifierSingleQuoted(_)
            | State::AfterDoctypeIdentifier(_)
            | State::BetweenDoctypePublicAndSystemIdentifiers => {
                self.emit_error(ParseErrorCode::EofInDoctype);
                self.current_doctype.force_quirks = true;
                self.emit_doctype();
                self.process_token(Token::EOFToken);
                false
            },
            State::CdataSection | State::CdataSectionBracket | State::CdataSectionEnd => {
                self.emit_error(ParseErrorCode::EofInCdata);
                self.process_token(Token::EOFToken);
                false
            },
            _ => {
                self.process_token(Token::EOFToken);
                false
            },
        }
    }

    fn process_char(&mut self, c: char) -> bool {
        use State::*;
        match self.state {
            Data => match c {
                '&' => {
                    self.consume_char_ref(false, None);
                },
                '<' => self.state = TagOpen,
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    self.emit_char('\u{FFFD}');
                },
                c => self.emit_char(c),
            },

            Rcdata => match c {
                '&' => self.consume_char_ref(false, None),
                '<' => self.state = RcdataLessThanSign,
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    self.emit_char('\u{FFFD}');
                },
                c => self.emit_char(c),
            },

            Rawtext => match c {
                '<' => self.state = RawtextLessThanSign,
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    self.emit_char('\u{FFFD}');
                },
                c => self.emit_char(c),
            },

            ScriptData => match c {
                '<' => self.state = ScriptDataLessThanSign,
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    self.emit_char('\u{FFFD}');
                },
                c => self.emit_char(c),
            },

            ScriptDataEscaped => match c {
                '-' => {
                    self.emit_char('-');
                    self.state = ScriptDataEscapedDash;
                },
                '<' => self.state = ScriptDataEscapedLessThanSign,
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    self.emit_char('\u{FFFD}');
                },
                c => self.emit_char(c),
            },
            ScriptDataEscapedDash => match c {
                '-' => {
                    self.emit_char('-');
                    self.state = ScriptDataEscapedDashDash;
                },
                '<' => self.state = ScriptDataEscapedLessThanSign,
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    self.emit_char('\u{FFFD}');
                    self.state = ScriptDataEscaped;
                },
                c => {
                    self.emit_char(c);
                    self.state = ScriptDataEscaped;
                },
            },
            ScriptDataEscapedDashDash => match c {
                '-' => self.emit_char('-'),
                '<' => self.state = ScriptDataEscapedLessThanSign,
                '>' => {
                    self.emit_char('>');
                    self.state = ScriptData;
                },
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    self.emit_char('\u{FFFD}');
                    self.state = ScriptDataEscaped;
                },
                c => {
                    self.emit_char(c);
                    self.state = ScriptDataEscaped;
                },
            },

            Plaintext => match c {
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    self.emit_char('\u{FFFD}');
                },
                c => self.emit_char(c),
            },

            TagOpen => match c {
                '!' => self.state = MarkupDeclarationOpen,
                '/' => self.state = EndTagOpen,
                '?' => {
                    self.emit_error(ParseErrorCode::UnexpectedQuestionMarkInsteadOfTagName);
                    self.current_comment = StrTendril::new();
                    self.input.push_front(tendril_of(c));
                    self.state = BogusComment;
                },
                c if c.is_ascii_alphabetic() => {
                    self.start_new_tag(TagKind::StartTag, c);
                    self.state = TagName;
                },
                c => {
                    self.emit_error(ParseErrorCode::InvalidFirstCharacterOfTagName);
                    self.emit_char('<');
                    self.input.push_front(tendril_of(c));
                    self.state = Data;
                },
            },

            EndTagOpen => match c {
                c if c.is_ascii_alphabetic() => {
                    self.start_new_tag(TagKind::EndTag, c);
                    self.state = TagName;
                },
                '>' => {
                    self.emit_error(ParseErrorCode::MissingEndTagName);
                    self.state = Data;
                },
                c => {
                    self.emit_error(ParseErrorCode::InvalidFirstCharacterOfTagName);
                    self.current_comment = StrTendril::new();
                    self.input.push_front(tendril_of(c));
                    self.state = BogusComment;
                },
            },

            TagName => match c {
                c if c.is_ascii_whitespace() => self.state = BeforeAttributeName,
                '/' => self.state = SelfClosingStartTag,
                '>' => {
                    self.emit_current_tag();
                    self.state = Data;
                },
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    self.append_to_tag_name('\u{FFFD}');
                },
                c => self.append_to_tag_name(lower_ascii_letter(c).unwrap_or(c)),
            },

            RcdataLessThanSign => match c {
                '/' => {
                    self.temp_buffer.clear();
                    self.state = RcdataEndTagOpen;
                },
                c => {
                    self.emit_char('<');
                    self.input.push_front(tendril_of(c));
                    self.state = Rcdata;
                },
            },
            RcdataEndTagOpen => self.end_tag_open(c, Rcdata, RcdataEndTagName),
            RcdataEndTagName => self.end_tag_name(c, Rcdata),

            RawtextLessThanSign => match c {
                '/' => {
                    self.temp_buffer.clear();
                    self.state = RawtextEndTagOpen;
                },
                c => {
                    self.emit_char('<');
                    self.input.push_front(tendril_of(c));
                    self.state = Rawtext;
                },
            },
            RawtextEndTagOpen => self.end_tag_open(c, Rawtext, RawtextEndTagName),
            RawtextEndTagName => self.end_tag_name(c, Rawtext),

            ScriptDataLessThanSign => match c {
                '/' => {
                    self.temp_buffer.clear();
                    self.state = ScriptDataEndTagOpen;
                },
                '!' => {
                    self.emit_char('<');
                    self.emit_char('!');
                    self.state = ScriptDataEscapeStart;
                },
                c => {
                    self.emit_char('<');
                    self.input.push_front(tendril_of(c));
                    self.state = ScriptData;
                },
            },
            ScriptDataEndTagOpen => self.end_tag_open(c, ScriptData, ScriptDataEndTagName),
            ScriptDataEndTagName => self.end_tag_name(c, ScriptData),

            ScriptDataEscapeStart => match c {
                '-' => {
                    self.emit_char('-');
                    self.state = ScriptDataEscapeStartDash;
                },
                c => {
                    self.input.push_front(tendril_of(c));
                    self.state = ScriptData;
                },
            },
            ScriptDataEscapeStartDash => match c {
                '-' => {
                    self.emit_char('-');
                    self.state = ScriptDataEscapedDashDash;
                },
                c => {
                    self.input.push_front(tendril_of(c));
                    self.state = ScriptData;
                },
            },
            ScriptDataEscapedLessThanSign => match c {
                '/' => {
                    self.temp_buffer.clear();
                    self.state = ScriptDataEscapedEndTagOpen;
                },
                c if c.is_ascii_alphabetic() => {
                    self.temp_buffer.clear();
                    self.emit_char('<');
                    self.input.push_front(tendril_of(c));
                    self.state = ScriptDataDoubleEscapeStart;
                },
                c => {
                    self.emit_char('<');
                    self.input.push_front(tendril_of(c));
                    self.state = ScriptDataEscaped;
                },
            },
            ScriptDataEscapedEndTagOpen => self.end_tag_open(c, ScriptDataEscaped, ScriptDataEscapedEndTagName),
            ScriptDataEscapedEndTagName => self.end_tag_name(c, ScriptDataEscaped),

            ScriptDataDoubleEscapeStart => {
                if c.is_ascii_whitespace() || c == '/' || c == '>' {
                    self.emit_char(c);
                    self.state = if self.temp_buffer.to_string().eq_ignore_ascii_case("script") {
                        ScriptDataDoubleEscaped
                    } else {
                        ScriptDataEscaped
                    };
                } else if c.is_ascii_alphabetic() {
                    self.temp_buffer.push_char(c.to_ascii_lowercase());
                    self.emit_char(c);
                } else {
                    self.input.push_front(tendril_of(c));
                    self.state = ScriptDataEscaped;
                }
            },
            ScriptDataDoubleEscaped => match c {
                '-' => {
                    self.emit_char('-');
                    self.state = ScriptDataDoubleEscapedDash;
                },
                '<' => {
                    self.emit_char('<');
                    self.state = ScriptDataDoubleEscapedLessThanSign;
                },
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    self.emit_char('\u{FFFD}');
                },
                c => self.emit_char(c),
            },
            ScriptDataDoubleEscapedDash => match c {
                '-' => {
                    self.emit_char('-');
                    self.state = ScriptDataDoubleEscapedDashDash;
                },
                '<' => {
                    self.emit_char('<');
                    self.state = ScriptDataDoubleEscapedLessThanSign;
                },
                c => {
                    self.emit_char(c);
                    self.state = ScriptDataDoubleEscaped;
                },
            },
            ScriptDataDoubleEscapedDashDash => match c {
                '-' => self.emit_char('-'),
                '<' => {
                    self.emit_char('<');
                    self.state = ScriptDataDoubleEscapedLessThanSign;
                },
                '>' => {
                    self.emit_char('>');
                    self.state = ScriptData;
                },
                c => {
                    self.emit_char(c);
                    self.state = ScriptDataDoubleEscaped;
                },
            },
            ScriptDataDoubleEscapedLessThanSign => match c {
                '/' => {
                    self.temp_buffer.clear();
                    self.emit_char('/');
                    self.state = ScriptDataDoubleEscapeEnd;
                },
                c => {
                    self.input.push_front(tendril_of(c));
                    self.state = ScriptDataDoubleEscaped;
                },
            },
            ScriptDataDoubleEscapeEnd => {
                if c.is_ascii_whitespace() || c == '/' || c == '>' {
                    self.emit_char(c);
                    self.state = if self.temp_buffer.to_string().eq_ignore_ascii_case("script") {
                        ScriptDataEscaped
                    } else {
                        ScriptDataDoubleEscaped
                    };
                } else if c.is_ascii_alphabetic() {
                    self.temp_buffer.push_char(c.to_ascii_lowercase());
                    self.emit_char(c);
                } else {
                    self.input.push_front(tendril_of(c));
                    self.state = ScriptDataDoubleEscaped;
                }
            },

            BeforeAttributeName => match c {
                c if c.is_ascii_whitespace() => {},
                '/' | '>' => {
                    self.input.push_front(tendril_of(c));
                    self.flush_current_attr();
                    self.state = AfterAttributeName;
                },
                '=' => {
                    self.emit_error(ParseErrorCode::UnexpectedEqualsSignBeforeAttributeName);
                    self.create_attribute(Some('='));
                    self.state = AttributeName;
                },
                c => {
                    self.create_attribute(Some(lower_ascii_letter(c).unwrap_or(c)));
                    self.state = AttributeName;
                },
            },

            AttributeName => match c {
                c if c.is_ascii_whitespace() => {
                    self.state = AfterAttributeName;
                },
                '/' | '>' => {
                    self.input.push_front(tendril_of(c));
                    self.state = AfterAttributeName;
                },
                '=' => self.state = BeforeAttributeValue,
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    self.current_attr_name.push_char('\u{FFFD}');
                },
                '"' | '\'' | '<' => {
                    self.emit_error(ParseErrorCode::UnexpectedCharacterInAttributeName);
                    self.current_attr_name.push_char(c);
                },
                c => self.current_attr_name.push_char(lower_ascii_letter(c).unwrap_or(c)),
            },

            AfterAttributeName => match c {
                c if c.is_ascii_whitespace() => {},
                '/' => {
                    self.flush_current_attr();
                    self.state = SelfClosingStartTag;
                },
                '=' => self.state = BeforeAttributeValue,
                '>' => {
                    self.flush_current_attr();
                    self.emit_current_tag();
                    self.state = Data;
                },
                c => {
                    self.flush_current_attr();
                    self.create_attribute(Some(lower_ascii_letter(c).unwrap_or(c)));
                    self.state = AttributeName;
                },
            },

            BeforeAttributeValue => match c {
                c if c.is_ascii_whitespace() => {},
                '"' => self.state = AttributeValueDoubleQuoted,
                '\'' => self.state = AttributeValueSingleQuoted,
                '>' => {
                    self.emit_error(ParseErrorCode::MissingAttributeValue);
                    self.flush_current_attr();
                    self.emit_current_tag();
                    self.state = Data;
                },
                c => {
                    self.input.push_front(tendril_of(c));
                    self.state = AttributeValueUnquoted;
                },
            },

            AttributeValueDoubleQuoted => match c {
                '"' => {
                    self.flush_current_attr();
                    self.state = AfterAttributeValueQuoted;
                },
                '&' => self.consume_char_ref(true, Some('"')),
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    self.current_attr_value.push_char('\u{FFFD}');
                },
                c => self.current_attr_value.push_char(c),
            },
            AttributeValueSingleQuoted => match c {
                '\'' => {
                    self.flush_current_attr();
                    self.state = AfterAttributeValueQuoted;
                },
                '&' => self.consume_char_ref(true, Some('\'')),
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    self.current_attr_value.push_char('\u{FFFD}');
                },
                c => self.current_attr_value.push_char(c),
            },
            AttributeValueUnquoted => match c {
                c if c.is_ascii_whitespace() => {
                    self.flush_current_attr();
                    self.state = BeforeAttributeName;
                },
                '&' => self.consume_char_ref(true, Some('>')),
                '>' => {
                    self.flush_current_attr();
                    self.emit_current_tag();
                    self.state = Data;
                },
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    self.current_attr_value.push_char('\u{FFFD}');
                },
                '"' | '\'' | '<' | '=' | '`' => {
                    self.emit_error(ParseErrorCode::UnexpectedCharacterInUnquotedAttributeValue);
                    self.current_attr_value.push_char(c);
                },
                c => self.current_attr_value.push_char(c),
            },

            AfterAttributeValueQuoted => match c {
                c if c.is_ascii_whitespace() => self.state = BeforeAttributeName,
                '/' => self.state = SelfClosingStartTag,
                '>' => {
                    self.emit_current_tag();
                    self.state = Data;
                },
                c => {
                    self.emit_error(ParseErrorCode::MissingWhitespaceBetweenAttributes);
                    self.input.push_front(tendril_of(c));
                    self.state = BeforeAttributeName;
                },
            },

            SelfClosingStartTag => match c {
                '>' => {
                    if let Some(tag) = self.current_tag.as_mut() {
                        tag.self_closing = true;
                    }
                    self.emit_current_tag();
                    self.state = Data;
                },
                c => {
                    self.emit_error(ParseErrorCode::UnexpectedSolidusInTag);
                    self.input.push_front(tendril_of(c));
                    self.state = BeforeAttributeName;
                },
            },

            BogusComment => match c {
                '>' => {
                    self.emit_comment();
                    self.state = Data;
                },
                '\0' => self.current_comment.push_char('\u{FFFD}'),
                c => self.current_comment.push_char(c),
            },

            MarkupDeclarationOpen => {
                self.input.push_front(tendril_of(c));
                if self.input.eat("--", eq_exact) == Some(true) {
                    self.current_comment = StrTendril::new();
                    self.state = CommentStart;
                } else if self.input.eat("doctype", eq_ignore_ascii_case) == Some(true) {
                    self.state = Doctype;
                } else if self.input.eat("[CDATA[", eq_exact) == Some(true) {
                    if self.sink.adjusted_current_node_present_but_not_in_html_namespace() {
                        self.state = CdataSection;
                    } else {
                        self.emit_error(ParseErrorCode::CdataInHtmlContent);
                        self.current_comment = "[CDATA[".tendril();
                        self.state = BogusComment;
                    }
                } else {
                    self.emit_error(ParseErrorCode::IncorrectlyOpenedComment);
                    self.current_comment = StrTendril::new();
                    self.state = BogusComment;
                }
            },

            CommentStart => match c {
                '-' => self.state = CommentStartDash,
                '>' => {
                    self.emit_error(ParseErrorCode::AbruptClosingOfEmptyComment);
                    self.emit_comment();
                    self.state = Data;
                },
                c => {
                    self.input.push_front(tendril_of(c));
                    self.state = Comment;
                },
            },
            CommentStartDash => match c {
                '-' => self.state = CommentEnd,
                '>' => {
                    self.emit_error(ParseErrorCode::AbruptClosingOfEmptyComment);
                    self.emit_comment();
                    self.state = Data;
                },
                c => {
                    self.current_comment.push_char('-');
                    self.input.push_front(tendril_of(c));
                    self.state = Comment;
                },
            },
            Comment => match c {
                '<' => {
                    self.current_comment.push_char('<');
                    self.state = CommentLessThanSign;
                },
                '-' => self.state = CommentEndDash,
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    self.current_comment.push_char('\u{FFFD}');
                },
                c => self.current_comment.push_char(c),
            },
            CommentLessThanSign => match c {
                '!' => {
                    self.current_comment.push_char('!');
                    self.state = CommentLessThanSignBang;
                },
                '<' => self.current_comment.push_char('<'),
                c => {
                    self.input.push_front(tendril_of(c));
                    self.state = Comment;
                },
            },
            CommentLessThanSignBang => match c {
                '-' => self.state = CommentLessThanSignBangDash,
                c => {
                    self.input.push_front(tendril_of(c));
                    self.state = Comment;
                },
            },
            CommentLessThanSignBangDash => match c {
                '-' => self.state = CommentLessThanSignBangDashDash,
                c => {
                    self.input.push_front(tendril_of(c));
                    self.state = CommentEndDash;
                },
            },
            CommentLessThanSignBangDashDash => {
                self.emit_error(ParseErrorCode::NestedComment);
                self.input.push_front(tendril_of(c));
                self.state = CommentEnd;
            },
            CommentEndDash => match c {
                '-' => self.state = CommentEnd,
                c => {
                    self.current_comment.push_char('-');
                    self.input.push_front(tendril_of(c));
                    self.state = Comment;
                },
            },
            CommentEnd => match c {
                '>' => {
                    self.emit_comment();
                    self.state = Data;
                },
                '!' => self.state = CommentEndBang,
                '-' => self.current_comment.push_char('-'),
                c => {
                    self.current_comment.push_str("--");
                    self.input.push_front(tendril_of(c));
                    self.state = Comment;
                },
            },
            CommentEndBang => match c {
                '-' => {
                    self.current_comment.push_str("--!");
                    self.state = CommentEndDash;
                },
                '>' => {
                    self.emit_error(ParseErrorCode::IncorrectlyClosedComment);
                    self.emit_comment();
                    self.state = Data;
                },
                c => {
                    self.current_comment.push_str("--!");
                    self.input.push_front(tendril_of(c));
                    self.state = Comment;
                },
            },

            Doctype => match c {
                c if c.is_ascii_whitespace() => self.state = BeforeDoctypeName,
                '>' => {
                    self.input.push_front(tendril_of(c));
                    self.state = BeforeDoctypeName;
                },
                c => {
                    self.emit_error(ParseErrorCode::MissingWhitespaceBeforeDoctypeName);
                    self.input.push_front(tendril_of(c));
                    self.state = BeforeDoctypeName;
                },
            },
            BeforeDoctypeName => match c {
                c if c.is_ascii_whitespace() => {},
                '>' => {
                    self.emit_error(ParseErrorCode::MissingDoctypeName);
                    self.current_doctype.force_quirks = true;
                    self.emit_doctype();
                    self.state = Data;
                },
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    self.current_doctype.name = Some("\u{FFFD}".tendril());
                    self.state = DoctypeName;
                },
                c => {
                    self.current_doctype.name = Some(tendril_of(lower_ascii_letter(c).unwrap_or(c)));
                    self.state = DoctypeName;
                },
            },
            DoctypeName => match c {
                c if c.is_ascii_whitespace() => self.state = AfterDoctypeName,
                '>' => {
                    self.emit_doctype();
                    self.state = Data;
                },
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    push_doctype_field(&mut self.current_doctype.name, '\u{FFFD}');
                },
                c => push_doctype_field(&mut self.current_doctype.name, lower_ascii_letter(c).unwrap_or(c)),
            },
            AfterDoctypeName => match c {
                c if c.is_ascii_whitespace() => {},
                '>' => {
                    self.emit_doctype();
                    self.state = Data;
                },
                c => {
                    self.input.push_front(tendril_of(c));
                    if self.input.eat("public", eq_ignore_ascii_case) == Some(true) {
                        self.state = AfterDoctypeKeyword(DoctypeIdKind::Public);
                    } else if self.input.eat("system", eq_ignore_ascii_case) == Some(true) {
                        self.state = AfterDoctypeKeyword(DoctypeIdKind::System);
                    } else {
                        self.emit_error(ParseErrorCode::InvalidCharacterSequenceAfterDoctypeName);
                        self.current_doctype.force_quirks = true;
                        self.input.next();
                        self.state = BogusDoctype;
                    }
                },
            },
            AfterDoctypeKeyword(kind) => match c {
                c if c.is_ascii_whitespace() => self.state = BeforeDoctypeIdentifier(kind),
                '"' | '\'' => {
                    let err = match kind {
                        DoctypeIdKind::Public => ParseErrorCode::MissingWhitespaceAfterDoctypePublicKeyword,
                        DoctypeIdKind::System => ParseErrorCode::MissingWhitespaceAfterDoctypeSystemKeyword,
                    };
                    self.emit_error(err);
                    self.input.push_front(tendril_of(c));
                    self.state = BeforeDoctypeIdentifier(kind);
                },
                '>' => {
                    let err = match kind {
                        DoctypeIdKind::Public => ParseErrorCode::MissingDoctypePublicIdentifier,
                        DoctypeIdKind::System => ParseErrorCode::MissingDoctypeSystemIdentifier,
                    };
                    self.emit_error(err);
                    self.current_doctype.force_quirks = true;
                    self.emit_doctype();
                    self.state = Data;
                },
                c => {
                    self.emit_error(ParseErrorCode::MissingQuoteBeforeDoctypePublicIdentifier);
                    self.current_doctype.force_quirks = true;
                    self.input.push_front(tendril_of(c));
                    self.state = BogusDoctype;
                },
            },
            BeforeDoctypeIdentifier(kind) => match c {
                c if c.is_ascii_whitespace() => {},
                '"' => {
                    set_doctype_id(&mut self.current_doctype, kind, Some(StrTendril::new()));
                    self.state = DoctypeIdentifierDoubleQuoted(kind);
                },
                '\'' => {
                    set_doctype_id(&mut self.current_doctype, kind, Some(StrTendril::new()));
                    self.state = DoctypeIdentifierSingleQuoted(kind);
                },
                '>' => {
                    let err = match kind {
                        DoctypeIdKind::Public => ParseErrorCode::MissingDoctypePublicIdentifier,
                        DoctypeIdKind::System => ParseErrorCode::MissingDoctypeSystemIdentifier,
                    };
                    self.emit_error(err);
                    self.current_doctype.force_quirks = true;
                    self.emit_doctype();
                    self.state = Data;
                },
                c => {
                    self.emit_error(ParseErrorCode::MissingQuoteBeforeDoctypePublicIdentifier);
                    self.current_doctype.force_quirks = true;
                    self.input.push_front(tendril_of(c));
                    self.state = BogusDoctype;
                },
            },
            DoctypeIdentifierDoubleQuoted(kind) => match c {
                '"' => self.state = AfterDoctypeIdentifier(kind),
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    push_doctype_id(&mut self.current_doctype, kind, '\u{FFFD}');
                },
                '>' => {
                    let err = match kind {
                        DoctypeIdKind::Public => ParseErrorCode::AbruptDoctypePublicIdentifier,
                        DoctypeIdKind::System => ParseErrorCode::AbruptDoctypeSystemIdentifier,
                    };
                    self.emit_error(err);
                    self.current_doctype.force_quirks = true;
                    self.emit_doctype();
                    self.state = Data;
                },
                c => push_doctype_id(&mut self.current_doctype, kind, c),
            },
            DoctypeIdentifierSingleQuoted(kind) => match c {
                '\'' => self.state = AfterDoctypeIdentifier(kind),
                '\0' => {
                    self.emit_error(ParseErrorCode::UnexpectedNullCharacter);
                    push_doctype_id(&mut self.current_doctype, kind, '\u{FFFD}');
                },
                '>' => {
                    let err = match kind {
                        DoctypeIdKind::Public => ParseErrorCode::AbruptDoctypePublicIdentifier,
                        DoctypeIdKind::System => ParseErrorCode::AbruptDoctypeSystemIdentifier,
                    };
                    self.emit_error(err);
                    self.current_doctype.force_quirks = true;
                    self.emit_doctype();
                    self.state = Data;
                },
                c => push_doctype_id(&mut self.current_doctype, kind, c),
            },
            AfterDoctypeIdentifier(kind) => match c {
                c if c.is_ascii_whitespace() => {
                    self.state = if kind == DoctypeIdKind::Public {
                        BetweenDoctypePublicAndSystemIdentifiers
                    } else {
                        AfterDoctypeName
                    };
                },
                '>' => {
                    self.emit_doctype();
                    self.state = Data;
                },
                c => {
                    self.emit_error(ParseErrorCode::UnexpectedCharacterAfterDoctypeSystemIdentifier);
                    self.current_doctype.force_quirks = true;
                    self.input.push_front(tendril_of(c));
                    self.state = BogusDoctype;
                },
            },
            BetweenDoctypePublicAndSystemIdentifiers => match c {
                c if c.is_ascii_whitespace() => {},
                '>' => {
                    self.emit_doctype();
                    self.state = Data;
                },
                '"' => {
                    set_doctype_id(&mut self.current_doctype, DoctypeIdKind::System, Some(StrTendril::new()));
                    self.state = DoctypeIdentifierDoubleQuoted(DoctypeIdKind::System);
                },
                '\'' => {
                    set_doctype_id(&mut self.current_doctype, DoctypeIdKind::System, Some(StrTendril::new()));
                    self.state = DoctypeIdentifierSingleQuoted(DoctypeIdKind::System);
                },
                c => {
                    self.emit_error(ParseErrorCode::MissingQuoteBeforeDoctypeSystemIdentifier);
                    self.current_doctype.force_quirks = true;
                    self.input.push_front(tendril_of(c));
                    self.state = BogusDoctype;
                },
            },
            BogusDoctype => match c {
                '>' => {
                    self.emit_doctype();
                    self.state = Data;
                },
                _ => {},
            },

            CdataSection => match c {
                ']' => self.state = CdataSectionBracket,
                c => self.emit_char(c),
            },
            CdataSectionBracket => match c {
                ']' => self.state = CdataSectionEnd,
                c => {
                    self.emit_char(']');
                    self.input.push_front(tendril_of(c));
                    self.state = CdataSection;
                },
            },
            CdataSectionEnd => match c {
                ']' => self.emit_char(']'),
                '>' => self.state = Data,
                c => {
                    self.emit_char(']');
                    self.emit_char(']');
                    self.input.push_front(tendril_of(c));
                    self.state = CdataSection;
                },
            },

            CharacterReferenceInData | CharacterReferenceInRcdata | CharacterReferenceInAttributeValue => {
                // Character references are resolved eagerly in `consume_char_ref`
                // rather than via dedicated states; these variants exist only
                // so `States` enumerates every named tokenizer state.
                self.input.push_front(tendril_of(c));
                self.state = Data;
            },
        }
        true
    }

    fn end_tag_open(&mut self, c: char, not_appropriate_state: State, name_state: State) {
        if c.is_ascii_alphabetic() {
            self.current_tag = Some(Tag {
                kind: TagKind::EndTag,
                name: QualName::new(None, ns!(html), LocalName::from("")),
                self_closing: false,
                attrs: Vec::new(),
            });
            self.input.push_front(tendril_of(c));
            self.state = name_state;
        } else {
            self.emit_char('<');
            self.emit_char('/');
            self.input.push_front(tendril_of(c));
            self.state = not_appropriate_state;
        }
    }

    fn end_tag_name(&mut self, c: char, not_appropriate_state: State) {
        if c.is_ascii_alphabetic() {
            self.append_to_tag_name(lower_ascii_letter(c).unwrap_or(c));
            self.temp_buffer.push_char(c);
            return;
        }

        if self.is_appropriate_end_tag() {
            match c {
                w if w.is_ascii_whitespace() => {
                    self.state = State::BeforeAttributeName;
                    return;
                },
                '/' => {
                    self.state = State::SelfClosingStartTag;
                    return;
                },
                '>' => {
                    self.emit_current_tag();
                    self.state = State::Data;
                    return;
                },
                _ => {},
            }
        }

        self.current_tag = None;
        self.emit_char('<');
        self.emit_char('/');
        self.emit_chars(self.temp_buffer.clone());
        self.input.push_front(tendril_of(c));
        self.state = not_appropriate_state;
    }
}

fn tendril_of(c: char) -> StrTendril {
    let mut t = StrTendril::new();
    t.push_char(c);
    t
}

fn push_doctype_field(field: &mut Option<StrTendril>, c: char) {
    match field {
        Some(t) => t.push_char(c),
        None => *field = Some(tendril_of(c)),
    }
}

fn set_doctype_id(doctype: &mut Doctype, kind: DoctypeIdKind, value: Option<StrTendril>) {
    match kind {
        DoctypeIdKind::Public => doctype.public_id = value,
        DoctypeIdKind::System => doctype.system_id = value,
    }
}

fn push_doctype_id(doctype: &mut Doctype, kind: DoctypeIdKind, c: char) {
    let field = match kind {
        DoctypeIdKind::Public => &mut doctype.public_id,
        DoctypeIdKind::System => &mut doctype.system_id,
    };
    push_doctype_field(field, c);
}

fn eq_exact(a: &u8, b: &u8) -> bool {
    a == b
}

fn eq_ignore_ascii_case(a: &u8, b: &u8) -> bool {
    a.to_ascii_lowercase() == b.to_ascii_lowercase()
}

fn find_duplicate_attr(tag: &Tag) -> bool {
    let mut seen = std::collections::HashSet::new();
    tag.attrs.iter().any(|a| !seen.insert(a.name.clone()))
}

/// The first occurrence of an attribute wins; later ones with the same
/// name are dropped entirely and reported as a duplicate-attribute
/// parse error.
fn dedup_attrs_keep_first(attrs: &mut Vec<Attribute>) {
    let mut seen = std::collections::HashSet::new();
    attrs.retain(|a| seen.insert(a.name.clone()));
}

trait StrTendrilExt {
    fn tendril(self) -> StrTendril;
}

impl StrTendrilExt for &str {
    fn tendril(self) -> StrTendril {
        StrTendril::from_slice(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::interface::{TokenSink, TokenSinkResult};

    struct CollectSink {
        tokens: Vec<Token>,
    }

    impl TokenSink for CollectSink {
        type Handle = ();

        fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
            self.tokens.push(token);
            TokenSinkResult::Continue
        }
    }

    fn tokenize(input: &str) -> Vec<Token> {
        let sink = CollectSink { tokens: Vec::new() };
        let mut tok = Tokenizer::new(sink, TokenizerOpts::default());
        tok.feed(StrTendril::from_slice(input));
        tok.end();
        tok.unwrap().tokens
    }

    #[test]
    fn tokenizes_simple_element() {
        let tokens = tokenize("<p>Hello</p>");
        let has_p_start = tokens.iter().any(|t| matches!(t, Token::TagToken(tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "p"));
        let has_text = tokens
            .iter()
            .any(|t| matches!(t, Token::CharacterTokens(s) if &**s == "Hello"));
        let has_p_end = tokens.iter().any(|t| matches!(t, Token::TagToken(tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "p"));
        assert!(has_p_start && has_text && has_p_end);
    }

    #[test]
    fn tokenizes_attributes() {
        let tokens = tokenize(r#"<img src="x.png" alt='y'>"#);
        let tag = tokens
            .iter()
            .find_map(|t| match t {
                Token::TagToken(tag) => Some(tag),
                _ => None,
            })
            .unwrap();
        assert_eq!(&*tag.name.local, "img");
        assert_eq!(tag.attrs.len(), 2);
    }

    #[test]
    fn decodes_named_entity() {
        let tokens = tokenize("a &amp; b");
        let text: String = tokens
            .iter()
            .filter_map(|t| match t {
                Token::CharacterTokens(s) => Some(s.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "a & b");
    }

    #[test]
    fn emits_comment() {
        let tokens = tokenize("<!-- hi -->");
        assert!(tokens
            .iter()
            .any(|t| matches!(t, Token::CommentToken(s) if &**s == " hi ")));
    }

    #[test]
    fn emits_doctype() {
        let tokens = tokenize("<!DOCTYPE html>");
        let doctype = tokens.iter().find_map(|t| match t {
            Token::DoctypeToken(d) => Some(d),
            _ => None,
        });
        assert!(matches!(doctype, Some(d) if d.name.as_deref() == Some("html")));
    }

    #[test]
    fn null_character_becomes_replacement_character() {
        let tokens = tokenize("a\0b");
        let text: String = tokens
            .iter()
            .filter_map(|t| match t {
                Token::CharacterTokens(s) => Some(s.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "a\u{FFFD}b");
    }
}
