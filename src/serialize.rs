// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

//! The html5lib test-format tree dump, the one serialization this crate
//! owns directly. The pretty-printed HTML serializer, the plain-text
//! extractor, and the Markdown renderer are out of scope — downstream
//! crates build those on top of [`crate::rcdom`]'s public node accessors.
//!
//! Dumps are compared against the html5lib `#document` fixture format
//! field byte for byte.

use std::fmt::Write as _;

use crate::interface::Namespace;
use crate::ns;
use crate::rcdom::{Handle, NodeData};

/// Dump `handle` and its descendants in the html5lib test format: one line
/// per node, `| ` plus two spaces of indent per depth, attributes sorted
/// by name on their own indented lines, and a `content` marker preceding
/// a `template` element's template contents.
///
/// `handle` is typically a child of the document (or, in a fragment dump,
/// a child of the fragment context's root element) — this function itself
/// never special-cases `Document`; callers only ever invoke it on a
/// document or fragment root's children.
pub fn serialize_node(out: &mut String, indent: usize, handle: &Handle) {
    out.push('|');
    for _ in 0..indent {
        out.push(' ');
    }

    match handle.data {
        NodeData::Document => panic!("serialize_node: should not reach the document node itself"),

        NodeData::Doctype { ref name, ref public_id, ref system_id } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            // An absent identifier (`None`) and a present-but-empty one
            // (`Some("")`) serialize differently: only the former omits
            // the quoted pair entirely.
            if public_id.is_some() || system_id.is_some() {
                let public = public_id.as_deref().unwrap_or("");
                let system = system_id.as_deref().unwrap_or("");
                let _ = write!(out, " \"{public}\" \"{system}\"");
            }
            out.push_str(">\n");
        },

        NodeData::Text { ref contents } => {
            out.push('"');
            out.push_str(&contents.borrow());
            out.push_str("\"\n");
        },

        NodeData::Comment { ref contents } => {
            out.push_str("<!-- ");
            out.push_str(contents);
            out.push_str(" -->\n");
        },

        NodeData::Element { ref name, ref attrs, .. } => {
            out.push('<');
            match name.ns {
                ns!(svg) => out.push_str("svg "),
                ns!(mathml) => out.push_str("math "),
                _ => {},
            }
            out.push_str(&name.local);
            out.push_str(">\n");

            let mut attrs = attrs.borrow().clone();
            attrs.sort_by(|a, b| a.name.local.cmp(&b.name.local));
            for attr in &attrs {
                out.push('|');
                for _ in 0..indent + 2 {
                    out.push(' ');
                }
                match attr.name.ns {
                    ns!(xlink) => out.push_str("xlink "),
                    ns!(xml) => out.push_str("xml "),
                    ns!(xmlns) => out.push_str("xmlns "),
                    _ => {},
                }
                let _ = writeln!(out, "{}=\"{}\"", attr.name.local, attr.value);
            }
        },
    }

    for child in handle.children.borrow().iter() {
        serialize_node(out, indent + 2, child);
    }

    if let NodeData::Element { ref template_contents, .. } = handle.data {
        if let Some(content) = template_contents.borrow().as_ref() {
            out.push('|');
            for _ in 0..indent + 2 {
                out.push(' ');
            }
            out.push_str("content\n");
            for child in content.children.borrow().iter() {
                serialize_node(out, indent + 4, child);
            }
        }
    }
}

/// Dump every child of `root` (a document or fragment root) at the
/// top-level indent (`| ` + two spaces), joined together with the
/// trailing newline trimmed.
pub fn serialize_document(root: &Handle) -> String {
    let mut out = String::new();
    for child in root.children.borrow().iter() {
        serialize_node(&mut out, 1, child);
    }
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

/// Namespace abbreviation used by foreign-element qualified names in the
/// test format's element line (`svg foreignObject`, `math mi`, …); exposed
/// so callers building their own dumps (e.g. a fragment-context echo) can
/// reuse the same mapping.
pub fn namespace_prefix(ns: &Namespace) -> Option<&'static str> {
    match *ns {
        ns!(svg) => Some("svg"),
        ns!(mathml) => Some("math"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{Attribute, LocalName, QualName};
    use crate::tree_builder::{ElementFlags, NodeOrText, TreeSink};
    use tendril::StrTendril;

    fn elem(dom: &mut crate::rcdom::RcDom, local: &str, attrs: Vec<Attribute>) -> Handle {
        dom.create_element(QualName::new(None, ns!(html), LocalName::from(local)), attrs, ElementFlags::default())
    }

    #[test]
    fn minimal_paragraph() {
        let mut dom = crate::rcdom::RcDom::default();
        let html = elem(&mut dom, "html", vec![]);
        dom.append(&dom.document.clone(), NodeOrText::AppendNode(html.clone()));
        let body = elem(&mut dom, "body", vec![]);
        dom.append(&html, NodeOrText::AppendNode(body.clone()));
        let p = elem(&mut dom, "p", vec![]);
        dom.append(&body, NodeOrText::AppendNode(p.clone()));
        dom.append(&p, NodeOrText::AppendText(StrTendril::from("Hello")));

        let dump = serialize_document(&dom.document);
        assert_eq!(dump, "| <html>\n|   <body>\n|     <p>\n|       \"Hello\"");
    }

    #[test]
    fn attributes_are_sorted_by_name() {
        let mut dom = crate::rcdom::RcDom::default();
        let img = elem(
            &mut dom,
            "img",
            vec![
                Attribute { name: QualName::new(None, ns!(), LocalName::from("src")), value: StrTendril::from("a.png") },
                Attribute { name: QualName::new(None, ns!(), LocalName::from("alt")), value: StrTendril::from("x") },
            ],
        );
        dom.append(&dom.document.clone(), NodeOrText::AppendNode(img));
        let dump = serialize_document(&dom.document);
        assert_eq!(dump, "| <img>\n|   alt=\"x\"\n|   src=\"a.png\"");
    }

    #[test]
    fn foreign_element_prints_namespace_prefix() {
        let mut dom = crate::rcdom::RcDom::default();
        let svg = dom.create_element(QualName::new(None, ns!(svg), LocalName::from("clipPath")), vec![], Default::default());
        dom.append(&dom.document.clone(), NodeOrText::AppendNode(svg));
        assert_eq!(serialize_document(&dom.document), "| <svg clipPath>");
    }

    #[test]
    fn doctype_with_no_identifiers_is_bare() {
        let mut dom = crate::rcdom::RcDom::default();
        dom.append_doctype_to_document(StrTendril::from("html"), None, None);
        assert_eq!(serialize_document(&dom.document), "| <!DOCTYPE html>");
    }

    #[test]
    fn doctype_with_empty_system_id_still_prints_the_quoted_pair() {
        let mut dom = crate::rcdom::RcDom::default();
        dom.append_doctype_to_document(StrTendril::from("html"), None, Some(StrTendril::from("")));
        assert_eq!(serialize_document(&dom.document), "| <!DOCTYPE html \"\" \"\">");
    }
}
