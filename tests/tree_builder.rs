// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

//! End-to-end tree-construction scenarios: minimal document, void
//! elements with attributes, adoption agency, table foster-parenting,
//! and foreign-content fragments.

use html5core::tree_builder::TreeBuilderOpts;
use html5core::{parse, parse_fragment, ns, LocalName, ParseOpts, QualName};

fn dump(input: &str) -> String {
    let parsed = parse(input, ParseOpts::default()).expect("parse should not fail outside strict mode");
    html5core::serialize::serialize_document(&parsed.document.document)
}

fn dump_fragment(input: &str, context: QualName) -> String {
    let parsed = parse_fragment(input, context, ParseOpts::default()).expect("fragment parse should not fail");
    html5core::serialize::serialize_document(&parsed.document.document)
}

#[test]
fn minimal_paragraph_gets_an_implied_html_head_body() {
    let dump = dump("<p>Hello</p>");
    assert_eq!(dump, "| <html>\n|   <head>\n|   <body>\n|     <p>\n|       \"Hello\"");
}

#[test]
fn void_element_with_attributes_has_no_children() {
    let dump = dump(r#"<img src="a.png" alt="x">"#);
    assert!(dump.contains("<img>"));
    assert!(dump.contains("alt=\"x\""));
    assert!(dump.contains("src=\"a.png\""));
    // A void element is never left open: nothing can be indented under it.
    let img_line = dump.lines().find(|l| l.trim_start_matches('|').trim_start().starts_with("<img>")).unwrap();
    let img_indent = img_line.len() - img_line.trim_start_matches('|').len();
    for line in dump.lines().skip_while(|l| *l != img_line).skip(1) {
        let indent = line.len() - line.trim_start_matches('|').len();
        if indent <= img_indent {
            break;
        }
        panic!("img should not have children, found: {line}");
    }
}

#[test]
fn misnested_formatting_elements_trigger_adoption_agency() {
    // <p>1<b>2<i>3</p>4</i>5</b> — the classic adoption-agency fixture:
    // the </p> closes a <p> nested inside <b><i>, leaving <b>/<i> to be
    // relocated rather than simply popped.
    let dump = dump("<p>1<b>2<i>3</p>4</i>5</b>");
    assert!(dump.contains("\"1\""));
    assert!(dump.contains("\"2\""));
    assert!(dump.contains("\"3\""));
    assert!(dump.contains("\"4\""));
    assert!(dump.contains("\"5\""));
    // Both formatting elements must have been reopened outside the <p>.
    assert!(dump.matches("<b>").count() >= 2);
    assert!(dump.matches("<i>").count() >= 2);
}

#[test]
fn foster_parented_text_escapes_the_table() {
    // Character data that's not allowed as a direct child of <table> is
    // foster-parented: relocated to just before the table in its parent,
    // not merged into any cell.
    let dump = dump("<table>foo<tr><td>bar</td></tr></table>");
    let table_idx = dump.find("<table>").unwrap();
    let foo_idx = dump.find("\"foo\"").expect("foster-parented text should survive");
    assert!(foo_idx < table_idx, "foster-parented text must land before the table, got:\n{dump}");
    assert!(dump.contains("\"bar\""));
}

#[test]
fn foreign_svg_fragment_keeps_its_namespace_prefix() {
    let context = QualName::new(None, ns!(svg), LocalName::from("svg"));
    let dump = dump_fragment(r#"<circle r="2"/>"#, context);
    assert!(dump.contains("<svg circle>"), "dump was: {dump}");
}

#[test]
fn mathml_fragment_case_adjusts_attribute_names() {
    let context = QualName::new(None, ns!(mathml), LocalName::from("math"));
    let dump = dump_fragment(r#"<mi definitionURL="x">y</mi>"#, context);
    assert!(dump.contains("<math mi>"));
    assert!(dump.contains("definitionURL=\"x\""));
}

#[test]
fn table_context_fragment_enters_in_table_mode() {
    let context = QualName::new(None, ns!(html), LocalName::from("table"));
    let dump = dump_fragment("<tr><td>x</td></tr>", context);
    assert!(dump.contains("<tr>"));
    assert!(dump.contains("<td>"));
    assert!(dump.contains("\"x\""));
}

#[test]
fn template_contents_are_dumped_under_a_content_marker() {
    let dump = dump("<template><p>hi</p></template>");
    assert!(dump.contains("<template>"));
    assert!(dump.contains("content"));
    assert!(dump.contains("<p>"));
}

#[test]
fn scripting_disabled_treats_noscript_as_rawtext() {
    let mut opts = ParseOpts::default();
    opts.tree_builder = TreeBuilderOpts { scripting_enabled: true, ..TreeBuilderOpts::default() };
    let parsed = parse("<noscript><p>ignored as markup</p></noscript>", opts).unwrap();
    let dump = html5core::serialize::serialize_document(&parsed.document.document);
    // With scripting on, <noscript> is RAWTEXT: its contents are a single
    // text node, not a parsed <p> child.
    assert!(dump.contains("\"<p>ignored as markup</p>\""), "dump was: {dump}");
}

#[test]
fn doctype_without_public_or_system_id_is_no_quirks() {
    let parsed = parse("<!DOCTYPE html><p>x</p>", ParseOpts::default()).unwrap();
    assert_eq!(parsed.quirks_mode, html5core::tree_builder::QuirksMode::NoQuirks);
}

#[test]
fn missing_doctype_triggers_quirks_mode() {
    let parsed = parse("<p>x</p>", ParseOpts::default()).unwrap();
    assert_eq!(parsed.quirks_mode, html5core::tree_builder::QuirksMode::Quirks);
}
