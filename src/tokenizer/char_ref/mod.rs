// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

//! Character reference (`&...;`) resolution, shared by the data, RCDATA,
//! and attribute-value tokenizer states.
//!
//! This is deliberately a standalone matcher over a borrowed `&str` rather
//! than something wired directly into [`BufferQueue`](crate::util::buffer_queue::BufferQueue):
//! the tokenizer collects a bounded lookahead window itself (character
//! references are at most a couple dozen bytes) and hands it here, which
//! keeps the longest-match search trivial to test in isolation.

use crate::entities::{self, CharRefExpansion};
use crate::tokenizer::interface::ParseErrorCode;

/// The result of resolving a character reference starting just after the
/// `&`.
#[derive(Debug, PartialEq, Eq)]
pub struct CharRefResult {
    /// The resolved character(s), or empty if resolution failed outright
    /// (bare `&` with no valid reference following — the caller re-emits
    /// the `&` literally in that case).
    pub chars: (Option<char>, Option<char>),
    /// How many bytes of the lookahead (not counting the `&`) were
    /// consumed.
    pub consumed: usize,
    pub errors: Vec<ParseErrorCode>,
}

impl CharRefResult {
    fn none(consumed: usize) -> Self {
        CharRefResult {
            chars: (None, None),
            consumed,
            errors: Vec::new(),
        }
    }
}

/// `in_attribute` governs the "ambiguous ampersand" rule: inside an
/// attribute value, an unresolved named reference followed by `=` or an
/// ASCII alphanumeric is left completely alone (no error, no partial
/// consumption) since `&notanentity=` is extremely common and not an
/// author mistake the way it would be in text content.
pub fn resolve(lookahead: &str, in_attribute: bool) -> CharRefResult {
    if lookahead.is_empty() {
        return CharRefResult::none(0);
    }

    let mut chars = lookahead.chars();
    match chars.next() {
        Some('#') => resolve_numeric(&lookahead[1..]),
        Some(c) if c.is_ascii_alphanumeric() => resolve_named(lookahead, in_attribute),
        _ => CharRefResult::none(0),
    }
}

fn resolve_named(lookahead: &str, in_attribute: bool) -> CharRefResult {
    // Longest-prefix match: try the whole remaining lookahead down to a
    // single character, stopping at the first candidate that's a real
    // registered name (this mirrors the trie walk a codegen'd table would
    // do, just done on a `&phf::Map` with repeated substring lookups since
    // our table is small).
    let boundary = lookahead
        .char_indices()
        .find(|&(_, c)| !c.is_ascii_alphanumeric())
        .map(|(i, _)| i)
        .unwrap_or(lookahead.len());

    let mut best: Option<(usize, CharRefExpansion, bool)> = None;
    for end in (1..=lookahead.len()).rev() {
        if !lookahead.is_char_boundary(end) {
            continue;
        }
        let candidate = &lookahead[..end];
        let has_semi = candidate.ends_with(';');
        if has_semi {
            if let Some(exp) = entities::lookup_named(candidate) {
                best = Some((end, exp, true));
                break;
            }
        } else if end <= boundary {
            if let Some(exp) = entities::lookup_legacy(candidate) {
                if best.is_none() {
                    best = Some((end, exp, false));
                }
            }
        }
    }

    match best {
        None => {
            // Ambiguous ampersand state: nothing matched at all, so the
            // '&' is re-emitted literally and the scanned run is
            // reconsumed as ordinary text. That run is still a parse
            // error if it was headed straight for a ';' — an author
            // plainly meant a reference, just not a real one.
            let mut result = CharRefResult::none(0);
            if lookahead[boundary..].starts_with(';') {
                result.errors.push(ParseErrorCode::UnknownNamedCharacterReference);
            }
            result
        },
        Some((consumed, exp, had_semi)) => {
            if !had_semi {
                let next = lookahead[consumed..].chars().next();
                let ambiguous_stop = matches!(next, Some(c) if c == '=' || c.is_ascii_alphanumeric());
                if in_attribute && ambiguous_stop {
                    return CharRefResult::none(0);
                }
            }
            let mut errors = Vec::new();
            if !had_semi {
                errors.push(ParseErrorCode::MissingSemicolonAfterCharacterReference);
            }
            CharRefResult {
                chars: (Some(exp.0), exp.1),
                consumed,
                errors,
            }
        },
    }
}

fn resolve_numeric(lookahead: &str) -> CharRefResult {
    let is_hex = lookahead.starts_with('x') || lookahead.starts_with('X');
    let digits_start = if is_hex { 1 } else { 0 };
    let digit_str = &lookahead[digits_start..];

    let digit_len = if is_hex {
        digit_str.chars().take_while(|c| c.is_ascii_hexdigit()).count()
    } else {
        digit_str.chars().take_while(|c| c.is_ascii_digit()).count()
    };

    if digit_len == 0 {
        // "#" or "#x" with no digits: consume nothing beyond what we
        // already scanned past the '#', per spec the '&#' is left alone.
        return CharRefResult {
            chars: (None, None),
            consumed: 0,
            errors: vec![ParseErrorCode::AbsenceOfDigitsInNumericCharacterReference],
        };
    }

    let digits = &digit_str[..digit_len];
    let value = if is_hex {
        u32::from_str_radix(digits, 16).unwrap_or(0x110000)
    } else {
        digits.parse::<u32>().unwrap_or(0x110000)
    };

    let mut consumed = digits_start + digit_len;
    let mut errors = Vec::new();

    let rest = &lookahead[consumed..];
    if rest.starts_with(';') {
        consumed += 1;
    } else {
        errors.push(ParseErrorCode::MissingSemicolonAfterCharacterReference);
    }

    let resolved = numeric_value_to_char(value, &mut errors);

    CharRefResult {
        chars: (Some(resolved), None),
        consumed,
        errors,
    }
}

fn numeric_value_to_char(value: u32, errors: &mut Vec<ParseErrorCode>) -> char {
    if value == 0 {
        errors.push(ParseErrorCode::NullCharacterReference);
        return '\u{FFFD}';
    }
    if value > 0x10FFFF {
        errors.push(ParseErrorCode::CharacterReferenceOutsideUnicodeRange);
        return '\u{FFFD}';
    }
    if (0xD800..=0xDFFF).contains(&value) {
        errors.push(ParseErrorCode::SurrogateCharacterReference);
        return '\u{FFFD}';
    }
    if let Some(fixed) = entities::windows_1252_fixup(value) {
        errors.push(ParseErrorCode::ControlCharacterReference);
        return fixed;
    }
    if entities::is_noncharacter(value) {
        errors.push(ParseErrorCode::NoncharacterCharacterReference);
    } else if entities::is_disallowed_control(value) {
        errors.push(ParseErrorCode::ControlCharacterReference);
    }
    char::from_u32(value).unwrap_or('\u{FFFD}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_amp_with_semicolon() {
        let r = resolve("amp;rest", false);
        assert_eq!(r.chars.0, Some('&'));
        assert_eq!(r.consumed, 4);
        assert!(r.errors.is_empty());
    }

    #[test]
    fn resolves_legacy_amp_without_semicolon() {
        let r = resolve("amp rest", false);
        assert_eq!(r.chars.0, Some('&'));
        assert_eq!(r.consumed, 3);
        assert_eq!(r.errors, vec![ParseErrorCode::MissingSemicolonAfterCharacterReference]);
    }

    #[test]
    fn ambiguous_ampersand_in_attribute_is_left_alone() {
        let r = resolve("notareal=value", true);
        assert_eq!(r.chars, (None, None));
        assert_eq!(r.consumed, 0);
    }

    #[test]
    fn decimal_numeric_reference() {
        let r = resolve("#65;", false);
        assert_eq!(r.chars.0, Some('A'));
        assert_eq!(r.consumed, 4);
    }

    #[test]
    fn hex_numeric_reference() {
        let r = resolve("#x41;", false);
        assert_eq!(r.chars.0, Some('A'));
        assert_eq!(r.consumed, 5);
    }

    #[test]
    fn windows_1252_fixup_applies() {
        let r = resolve("#146;", false);
        assert_eq!(r.chars.0, Some('\u{2019}'));
        assert!(r.errors.contains(&ParseErrorCode::ControlCharacterReference));
    }

    #[test]
    fn null_numeric_reference_becomes_replacement_character() {
        let r = resolve("#0;", false);
        assert_eq!(r.chars.0, Some('\u{FFFD}'));
        assert!(r.errors.contains(&ParseErrorCode::NullCharacterReference));
    }

    #[test]
    fn missing_digits_reports_error() {
        let r = resolve("#;", false);
        assert_eq!(r.consumed, 0);
        assert_eq!(r.errors, vec![ParseErrorCode::AbsenceOfDigitsInNumericCharacterReference]);
    }

    #[test]
    fn unknown_named_reference_fails() {
        let r = resolve("notarealentity;", false);
        assert_eq!(r.chars, (None, None));
        assert_eq!(r.consumed, 0);
    }

    #[test]
    fn unknown_named_reference_followed_by_semicolon_reports_error() {
        let r = resolve("notarealentity;rest", false);
        assert_eq!(r.chars, (None, None));
        assert_eq!(r.consumed, 0);
        assert_eq!(r.errors, vec![ParseErrorCode::UnknownNamedCharacterReference]);
    }

    #[test]
    fn unknown_named_reference_without_semicolon_reports_nothing() {
        let r = resolve("notarealentity rest", false);
        assert_eq!(r.chars, (None, None));
        assert!(r.errors.is_empty());
    }
}
