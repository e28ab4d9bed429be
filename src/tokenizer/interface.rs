// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

//! Token types and the [`TokenSink`] trait the tokenizer emits through.

use std::borrow::Cow;
use tendril::StrTendril;

use crate::interface::{Attribute, QualName};

/// Doctype token contents. Each field is `None` when the corresponding
/// keyword was absent from the source, distinct from `Some("")` meaning
/// the keyword was present with an empty quoted value — quirks-mode
/// classification depends on the distinction.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Doctype {
    pub name: Option<StrTendril>,
    pub public_id: Option<StrTendril>,
    pub system_id: Option<StrTendril>,
    pub force_quirks: bool,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum TagKind {
    StartTag,
    EndTag,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Tag {
    pub kind: TagKind,
    pub name: QualName,
    pub self_closing: bool,
    pub attrs: Vec<Attribute>,
}

impl Tag {
    /// Equality per the "appropriate end tag token" check: same kind and
    /// name, attributes and self-closing-ness irrelevant.
    pub fn equiv_modulo_attr_order(&self, other: &Tag) -> bool {
        if self.kind != other.kind || self.name != other.name || self.self_closing != other.self_closing {
            return false;
        }
        let mut self_attrs = self.attrs.clone();
        let mut other_attrs = other.attrs.clone();
        self_attrs.sort();
        other_attrs.sort();
        self_attrs == other_attrs
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum ParseErrorCode {
    UnexpectedNullCharacter,
    UnexpectedQuestionMarkInsteadOfTagName,
    EofBeforeTagName,
    InvalidFirstCharacterOfTagName,
    MissingEndTagName,
    EofInTag,
    EofInScriptHtmlCommentLikeText,
    UnexpectedEqualsSignBeforeAttributeName,
    UnexpectedCharacterInAttributeName,
    MissingAttributeValue,
    UnexpectedCharacterInUnquotedAttributeValue,
    MissingWhitespaceBetweenAttributes,
    UnexpectedSolidusInTag,
    CdataInHtmlContent,
    IncorrectlyOpenedComment,
    AbruptClosingOfEmptyComment,
    EofInComment,
    NestedComment,
    IncorrectlyClosedComment,
    EofInDoctype,
    MissingWhitespaceBeforeDoctypeName,
    MissingDoctypeName,
    InvalidCharacterSequenceAfterDoctypeName,
    MissingWhitespaceAfterDoctypePublicKeyword,
    MissingDoctypePublicIdentifier,
    MissingQuoteBeforeDoctypePublicIdentifier,
    AbruptDoctypePublicIdentifier,
    MissingWhitespaceBetweenDoctypePublicAndSystemIdentifiers,
    MissingWhitespaceAfterDoctypeSystemKeyword,
    MissingDoctypeSystemIdentifier,
    MissingQuoteBeforeDoctypeSystemIdentifier,
    AbruptDoctypeSystemIdentifier,
    UnexpectedCharacterAfterDoctypeSystemIdentifier,
    EofInCdata,
    AbsenceOfDigitsInNumericCharacterReference,
    UnknownNamedCharacterReference,
    MissingSemicolonAfterCharacterReference,
    NullCharacterReference,
    CharacterReferenceOutsideUnicodeRange,
    SurrogateCharacterReference,
    NoncharacterCharacterReference,
    ControlCharacterReference,
    DuplicateAttribute,
    AdoptionAgencyAlgorithmRunTooManyTimes,
}

impl std::fmt::Display for ParseErrorCode {
    /// Renders the kebab-case code (e.g. `unexpected-null-character`) from
    /// the enum's PascalCase variant name — the wire/test-visible form of
    /// each error code.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = format!("{self:?}");
        let mut first = true;
        for ch in name.chars() {
            if ch.is_uppercase() {
                if !first {
                    f.write_str("-")?;
                }
                write!(f, "{}", ch.to_ascii_lowercase())?;
            } else {
                write!(f, "{ch}")?;
            }
            first = false;
        }
        Ok(())
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum Token {
    DoctypeToken(Doctype),
    TagToken(Tag),
    CommentToken(StrTendril),
    CharacterTokens(StrTendril),
    NullCharacterToken,
    EOFToken,
    ParseError(ParseErrorCode, Cow<'static, str>),
}

/// Sink for tokens produced by the tokenizer. The tree builder implements
/// this trait; `process_token` drives insertion-mode dispatch and returns
/// whether the tokenizer should switch states (e.g. RAWTEXT after a
/// `<script>` start tag) per [`TokenSinkResult`].
pub trait TokenSink {
    type Handle;

    fn process_token(&mut self, token: Token, line_number: u64) -> TokenSinkResult<Self::Handle>;

    /// Called when the tokenizer reaches the end of input and has no more
    /// tokens to deliver. Default: no-op.
    fn end(&mut self) {}

    /// Whether the sink wants `adjusted_current_node` consulted for
    /// whether we're "in foreign content" per the tree construction
    /// dispatch rules. The tokenizer only needs this to decide CDATA
    /// section allowance; default conservatively false.
    fn adjusted_current_node_present_but_not_in_html_namespace(&self) -> bool {
        false
    }
}

pub enum TokenSinkResult<Handle> {
    Continue,
    Script(Handle),
    Plaintext,
    RawData(States),
}

/// Reduced-visibility re-export so `TokenSinkResult` doesn't need to name
/// the full tokenizer state enum at this path; see `tokenizer::states`.
pub use crate::tokenizer::states::State as States;
