// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

//! Byte-sniffing encoding detection: BOM sniff, bounded `<meta>` prescan,
//! and WHATWG label normalization, feeding [`encoding_rs`] for the actual
//! decode.
//!
//! Precedence (highest to lowest): a transport-declared label, a byte-order
//! mark, a `<meta charset>`/`http-equiv` declaration found in the first
//! 1024 non-comment bytes (65536 bytes scanned total), and finally
//! windows-1252.

const META_PRESCAN_NONCOMMENT_CAP: usize = 1024;
const META_PRESCAN_TOTAL_CAP: usize = 65536;

/// The outcome of sniffing: which encoding to decode with, and how many
/// leading bytes (if any) were a byte-order mark to be stripped before
/// decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SniffResult {
    pub encoding: &'static encoding_rs::Encoding,
    pub bom_len: usize,
}

/// Normalize an encoding label per the WHATWG Encoding Standard's alias
/// table, with security-sensitive overrides applied on top: UTF-7
/// variants and anything `encoding_rs` would resolve to UTF-16 are coerced
/// to windows-1252 (a UTF-16-labelled *document* is vanishingly rare and a
/// common smuggling vector, so sniffing never trusts a declared UTF-16
/// label the way a BOM is trusted).
pub fn normalize_label(label: &str) -> &'static encoding_rs::Encoding {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return encoding_rs::WINDOWS_1252;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("utf-7") || lower.starts_with("utf7") || lower.starts_with("x-utf-7") {
        return encoding_rs::WINDOWS_1252;
    }
    match encoding_rs::Encoding::for_label(trimmed.as_bytes()) {
        Some(enc) if enc == encoding_rs::UTF_16BE || enc == encoding_rs::UTF_16LE => {
            encoding_rs::WINDOWS_1252
        },
        Some(enc) => enc,
        None => encoding_rs::WINDOWS_1252,
    }
}

/// Detect a byte-order mark. Returns the encoding and the BOM's byte length
/// (to be stripped before decoding), or `None` if no recognized BOM is
/// present.
pub fn sniff_bom(bytes: &[u8]) -> Option<(&'static encoding_rs::Encoding, usize)> {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        Some((encoding_rs::UTF_8, 3))
    } else if bytes.starts_with(&[0xFF, 0xFE]) {
        Some((encoding_rs::UTF_16LE, 2))
    } else if bytes.starts_with(&[0xFE, 0xFF]) {
        Some((encoding_rs::UTF_16BE, 2))
    } else {
        None
    }
}

/// Top-level sniff: transport label, then BOM, then meta prescan, then the
/// windows-1252 default.
pub fn sniff(bytes: &[u8], transport_label: Option<&str>) -> SniffResult {
    if let Some(label) = transport_label {
        let enc = normalize_label(label);
        return SniffResult {
            encoding: enc,
            bom_len: 0,
        };
    }

    if let Some((enc, bom_len)) = sniff_bom(bytes) {
        return SniffResult {
            encoding: enc,
            bom_len,
        };
    }

    if let Some(enc) = prescan_meta(bytes) {
        return SniffResult {
            encoding: enc,
            bom_len: 0,
        };
    }

    SniffResult {
        encoding: encoding_rs::WINDOWS_1252,
        bom_len: 0,
    }
}

/// Decode `bytes` (with any BOM already stripped by the caller) as `enc`
/// into a `String`, replacing malformed sequences with U+FFFD, matching
/// the WHATWG decode algorithm's error-recovery behavior.
pub fn decode(bytes: &[u8], enc: &'static encoding_rs::Encoding) -> String {
    let (cow, _actual_encoding, _had_errors) = enc.decode(bytes);
    cow.into_owned()
}

/// Bounded scan for a `<meta charset=...>` or
/// `<meta http-equiv=content-type content="...charset=...">` declaration:
/// skip comments, skip non-meta tags, and give up after 1024 non-comment
/// bytes or 65536 bytes total, whichever comes first.
fn prescan_meta(bytes: &[u8]) -> Option<&'static encoding_rs::Encoding> {
    let mut pos = 0usize;
    let mut noncomment_seen = 0usize;

    while pos < bytes.len() && pos < META_PRESCAN_TOTAL_CAP {
        if bytes[pos..].starts_with(b"<!--") {
            if let Some(end) = find(&bytes[pos + 4..], b"-->") {
                pos += 4 + end + 3;
                continue;
            } else {
                break;
            }
        }

        if bytes[pos] != b'<' {
            pos += 1;
            noncomment_seen += 1;
            if noncomment_seen >= META_PRESCAN_NONCOMMENT_CAP {
                break;
            }
            continue;
        }

        // Candidate tag open.
        let rest = &bytes[pos..];
        let is_meta = rest.len() > 5 && rest[1..5].eq_ignore_ascii_case(b"meta") && is_tag_boundary(rest.get(5));
        let tag_end = find(rest, b">").map(|i| pos + i + 1).unwrap_or(bytes.len());

        if is_meta {
            if let Some(enc) = extract_meta_charset(&bytes[pos..tag_end]) {
                return Some(enc);
            }
        }

        noncomment_seen += tag_end - pos;
        pos = tag_end;
        if noncomment_seen >= META_PRESCAN_NONCOMMENT_CAP {
            break;
        }
    }

    None
}

fn is_tag_boundary(b: Option<&u8>) -> bool {
    matches!(b, Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') | Some(b'/') | Some(b'>'))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Given the bytes of one `<meta ...>` tag (including the angle brackets),
/// extract a declared charset: a bare `charset=` attribute wins outright; otherwise an `http-equiv=content-type` paired with a
/// `content` attribute containing `charset=...` is used. UTF-16/32 declared
/// this way is coerced to utf-8, matching the meta-prescan-specific rule
/// (distinct from the BOM/transport-label UTF-16 distrust above, which
/// exists for a different reason: a `<meta>` author writing "utf-16" inside
/// a document that is *itself* being re-decoded as utf-16 is self-consistent
/// and should resolve to utf-8 text once decoded, not be rejected).
fn extract_meta_charset(tag_bytes: &[u8]) -> Option<&'static encoding_rs::Encoding> {
    let attrs = scan_attributes(tag_bytes);

    if let Some(charset) = attrs.get("charset") {
        return Some(coerce_utf16(normalize_label(charset)));
    }

    let http_equiv_is_content_type = attrs
        .get("http-equiv")
        .map(|v| v.eq_ignore_ascii_case("content-type"))
        .unwrap_or(false);

    if http_equiv_is_content_type {
        if let Some(content) = attrs.get("content") {
            if let Some(charset) = extract_charset_from_content(content) {
                return Some(coerce_utf16(normalize_label(&charset)));
            }
        }
    }

    None
}

fn coerce_utf16(enc: &'static encoding_rs::Encoding) -> &'static encoding_rs::Encoding {
    if enc == encoding_rs::UTF_16BE || enc == encoding_rs::UTF_16LE {
        encoding_rs::UTF_8
    } else {
        enc
    }
}

/// <https://html.spec.whatwg.org/multipage/#algorithm-for-extracting-a-character-encoding-from-a-meta-element>
fn extract_charset_from_content(content: &str) -> Option<String> {
    let lower = content.to_ascii_lowercase();
    let idx = lower.find("charset")?;
    let mut pos = idx + "charset".len();
    let bytes = content.as_bytes();
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    if bytes.get(pos) != Some(&b'=') {
        return None;
    }
    pos += 1;
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    match bytes.get(pos) {
        Some(&q @ (b'"' | b'\'')) => {
            let start = pos + 1;
            let end = bytes[start..].iter().position(|&b| b == q)? + start;
            Some(content[start..end].to_string())
        },
        Some(_) => {
            let end = bytes[pos..]
                .iter()
                .position(|&b| b.is_ascii_whitespace() || b == b';')
                .map(|n| pos + n)
                .unwrap_or(bytes.len());
            Some(content[pos..end].to_string())
        },
        None => None,
    }
}

/// A tiny bounded attribute tokenizer, only used during meta prescan. Not
/// the real attribute-value state machine; this one tolerates malformed
/// input by best-effort skipping rather than erroring,
/// since prescan must never fail the whole parse.
fn scan_attributes(tag_bytes: &[u8]) -> std::collections::HashMap<String, String> {
    let mut attrs = std::collections::HashMap::new();
    let mut i = 1; // skip '<'
    // skip tag name
    while i < tag_bytes.len() && !tag_bytes[i].is_ascii_whitespace() && tag_bytes[i] != b'>' {
        i += 1;
    }

    loop {
        while i < tag_bytes.len() && tag_bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= tag_bytes.len() || tag_bytes[i] == b'>' || tag_bytes[i] == b'/' {
            break;
        }
        let name_start = i;
        while i < tag_bytes.len()
            && !tag_bytes[i].is_ascii_whitespace()
            && tag_bytes[i] != b'='
            && tag_bytes[i] != b'>'
        {
            i += 1;
        }
        let name = String::from_utf8_lossy(&tag_bytes[name_start..i]).to_ascii_lowercase();
        while i < tag_bytes.len() && tag_bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= tag_bytes.len() || tag_bytes[i] != b'=' {
            attrs.entry(name).or_insert_with(String::new);
            continue;
        }
        i += 1;
        while i < tag_bytes.len() && tag_bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let value = match tag_bytes.get(i) {
            Some(&q @ (b'"' | b'\'')) => {
                i += 1;
                let start = i;
                while i < tag_bytes.len() && tag_bytes[i] != q {
                    i += 1;
                }
                let v = String::from_utf8_lossy(&tag_bytes[start..i]).into_owned();
                if i < tag_bytes.len() {
                    i += 1;
                }
                v
            },
            _ => {
                let start = i;
                while i < tag_bytes.len() && !tag_bytes[i].is_ascii_whitespace() && tag_bytes[i] != b'>' {
                    i += 1;
                }
                String::from_utf8_lossy(&tag_bytes[start..i]).into_owned()
            },
        };
        attrs.entry(name).or_insert(value);
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bom_utf8() {
        let (enc, len) = sniff_bom(&[0xEF, 0xBB, 0xBF, b'a']).unwrap();
        assert_eq!(enc, encoding_rs::UTF_8);
        assert_eq!(len, 3);
    }

    #[test]
    fn no_bom() {
        assert_eq!(sniff_bom(b"<html>"), None);
    }

    #[test]
    fn transport_label_wins() {
        let res = sniff(b"<meta charset=utf-8>", Some("windows-1252"));
        assert_eq!(res.encoding, encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn meta_bare_charset() {
        let html = b"<html><head><meta charset=\"iso-8859-2\"></head></html>";
        let res = sniff(html, None);
        assert_eq!(res.encoding, encoding_rs::ISO_8859_2);
    }

    #[test]
    fn meta_http_equiv_content_type() {
        let html = br#"<meta http-equiv="Content-Type" content="text/html; charset=euc-jp">"#;
        let res = sniff(html, None);
        assert_eq!(res.encoding, encoding_rs::EUC_JP);
    }

    #[test]
    fn meta_utf16_is_coerced_to_utf8() {
        let html = b"<meta charset=utf-16>";
        let res = sniff(html, None);
        assert_eq!(res.encoding, encoding_rs::UTF_8);
    }

    #[test]
    fn default_is_windows_1252() {
        let res = sniff(b"<html><body>hi</body></html>", None);
        assert_eq!(res.encoding, encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn utf7_label_is_rejected() {
        assert_eq!(normalize_label("utf-7"), encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn comments_are_skipped_during_prescan() {
        let html = b"<!-- <meta charset=shift_jis> --><meta charset=euc-jp>";
        let res = sniff(html, None);
        assert_eq!(res.encoding, encoding_rs::EUC_JP);
    }
}
