// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

//! DOCTYPE-derived quirks-mode classification.

use crate::tree_builder::interface::QuirksMode;

const QUIRKY_PUBLIC_PREFIXES: &[&str] = &[
    "-//w3o//dtd w3 html strict 3.0//en//",
    "-/w3d/dtd html 4.0 transitional/en",
    "html",
    "+//silmaril//dtd html pro v0r11 19970101//",
    "-//as//dtd html 3.0 aswedit + extensions//",
    "-//advasoft ltd//dtd html 3.0 aswedit + extensions//",
    "-//ietf//dtd html 2.0 level 1//",
    "-//ietf//dtd html 2.0 level 2//",
    "-//ietf//dtd html 2.0 strict level 1//",
    "-//ietf//dtd html 2.0 strict level 2//",
    "-//ietf//dtd html 2.0 strict//",
    "-//ietf//dtd html 2.0//",
    "-//ietf//dtd html 2.1e//",
    "-//ietf//dtd html 3.0//",
    "-//ietf//dtd html 3.2 final//",
    "-//ietf//dtd html 3.2//",
    "-//ietf//dtd html 3//",
    "-//ietf//dtd html level 0//",
    "-//ietf//dtd html level 1//",
    "-//ietf//dtd html level 2//",
    "-//ietf//dtd html level 3//",
    "-//ietf//dtd html strict level 0//",
    "-//ietf//dtd html strict level 1//",
    "-//ietf//dtd html strict level 2//",
    "-//ietf//dtd html strict level 3//",
    "-//ietf//dtd html strict//",
    "-//ietf//dtd html//",
    "-//metrius//dtd metrius presentational//",
    "-//microsoft//dtd internet explorer 2.0 html strict//",
    "-//microsoft//dtd internet explorer 2.0 html//",
    "-//microsoft//dtd internet explorer 2.0 tables//",
    "-//microsoft//dtd internet explorer 3.0 html strict//",
    "-//microsoft//dtd internet explorer 3.0 html//",
    "-//microsoft//dtd internet explorer 3.0 tables//",
    "-//netscape comm. corp.//dtd html//",
    "-//netscape comm. corp.//dtd strict html//",
    "-//o'reilly and associates//dtd html 2.0//",
    "-//o'reilly and associates//dtd html extended 1.0//",
    "-//o'reilly and associates//dtd html extended relaxed 1.0//",
    "-//sq//dtd html 2.0 hotmetal + extensions//",
    "-//softquad software//dtd hotmetal pro 6.0::19990601::extensions to html 4.0//",
    "-//softquad//dtd hotmetal pro 4.0::19971010::extensions to html 4.0//",
    "-//spyglass//dtd html 2.0 extended//",
    "-//sun microsystems corp.//dtd hotjava html//",
    "-//sun microsystems corp.//dtd hotjava strict html//",
    "-//w3c//dtd html 3 1995-03-24//",
    "-//w3c//dtd html 3.2 draft//",
    "-//w3c//dtd html 3.2 final//",
    "-//w3c//dtd html 3.2//",
    "-//w3c//dtd html 3.2s draft//",
    "-//w3c//dtd html 4.0 frameset//",
    "-//w3c//dtd html 4.0 transitional//",
    "-//w3c//dtd html experimental 19960712//",
    "-//w3c//dtd html experimental 970421//",
    "-//w3c//dtd w3 html//",
    "-//w3o//dtd w3 html 3.0//",
    "-//webtechs//dtd mozilla html 2.0//",
    "-//webtechs//dtd mozilla html//",
];

const QUIRKY_PUBLIC_EXACT: &[&str] = &["-//w3o//dtd w3 html strict 3.0//en//", "-/w3d/dtd html 4.0 transitional/en", "html"];

const LIMITED_QUIRKS_PUBLIC_PREFIXES: &[&str] =
    &["-//w3c//dtd xhtml 1.0 frameset//", "-//w3c//dtd xhtml 1.0 transitional//"];

const QUIRKY_SYSTEM_ID: &str = "http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd";

/// Classify a DOCTYPE per the "initial" insertion mode's quirks-mode
/// detection rules.
pub fn quirks_mode_for_doctype(
    name: Option<&str>,
    public_id: Option<&str>,
    system_id: Option<&str>,
    force_quirks: bool,
) -> QuirksMode {
    if force_quirks {
        return QuirksMode::Quirks;
    }
    if name != Some("html") {
        return QuirksMode::Quirks;
    }

    let public_lower = public_id.unwrap_or("").to_ascii_lowercase();
    let system_lower = system_id.map(|s| s.to_ascii_lowercase());

    if QUIRKY_PUBLIC_EXACT.contains(&public_lower.as_str()) {
        return QuirksMode::Quirks;
    }
    if QUIRKY_PUBLIC_PREFIXES.iter().any(|p| public_lower.starts_with(p)) {
        return QuirksMode::Quirks;
    }
    if system_lower.as_deref() == Some(QUIRKY_SYSTEM_ID) {
        return QuirksMode::Quirks;
    }
    if public_lower.starts_with("-//w3c//dtd html 4.01 frameset//") && system_id.is_none() {
        return QuirksMode::Quirks;
    }
    if public_lower.starts_with("-//w3c//dtd html 4.01 transitional//") && system_id.is_none() {
        return QuirksMode::Quirks;
    }

    if LIMITED_QUIRKS_PUBLIC_PREFIXES.iter().any(|p| public_lower.starts_with(p)) {
        return QuirksMode::LimitedQuirks;
    }
    if public_lower.starts_with("-//w3c//dtd xhtml 1.1//") {
        return QuirksMode::NoQuirks;
    }

    QuirksMode::NoQuirks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_doctype_name_is_quirks() {
        assert_eq!(quirks_mode_for_doctype(None, None, None, false), QuirksMode::Quirks);
    }

    #[test]
    fn plain_html5_doctype_is_no_quirks() {
        assert_eq!(quirks_mode_for_doctype(Some("html"), None, None, false), QuirksMode::NoQuirks);
    }

    #[test]
    fn html4_transitional_without_system_id_is_quirks() {
        assert_eq!(
            quirks_mode_for_doctype(
                Some("html"),
                Some("-//W3C//DTD HTML 4.01 Transitional//EN"),
                None,
                false
            ),
            QuirksMode::Quirks
        );
    }

    #[test]
    fn xhtml_transitional_is_limited_quirks() {
        assert_eq!(
            quirks_mode_for_doctype(
                Some("html"),
                Some("-//W3C//DTD XHTML 1.0 Transitional//EN"),
                Some("http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd"),
                false
            ),
            QuirksMode::LimitedQuirks
        );
    }

    #[test]
    fn force_quirks_always_wins() {
        assert_eq!(quirks_mode_for_doctype(Some("html"), None, None, true), QuirksMode::Quirks);
    }
}
