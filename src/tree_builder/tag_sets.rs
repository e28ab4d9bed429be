// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

//! Named element sets the "has an element in scope" family of algorithms
//! and various insertion-mode rules test membership against. Expressed as
//! plain functions over an [`ExpandedName`] rather than a `tag_set!` macro
//! DSL, since a match arm reads just as clearly here and keeps these sets
//! greppable by name.

use crate::expanded_name;
use crate::interface::ExpandedName;

pub fn is_special(name: ExpandedName<'_>) -> bool {
    matches!(
        name,
        expanded_name!(html "address")
            | expanded_name!(html "applet")
            | expanded_name!(html "area")
            | expanded_name!(html "article")
            | expanded_name!(html "aside")
            | expanded_name!(html "base")
            | expanded_name!(html "basefont")
            | expanded_name!(html "bgsound")
            | expanded_name!(html "blockquote")
            | expanded_name!(html "body")
            | expanded_name!(html "br")
            | expanded_name!(html "button")
            | expanded_name!(html "caption")
            | expanded_name!(html "center")
            | expanded_name!(html "col")
            | expanded_name!(html "colgroup")
            | expanded_name!(html "dd")
            | expanded_name!(html "details")
            | expanded_name!(html "dir")
            | expanded_name!(html "div")
            | expanded_name!(html "dl")
            | expanded_name!(html "dt")
            | expanded_name!(html "embed")
            | expanded_name!(html "fieldset")
            | expanded_name!(html "figcaption")
            | expanded_name!(html "figure")
            | expanded_name!(html "footer")
            | expanded_name!(html "form")
            | expanded_name!(html "frame")
            | expanded_name!(html "frameset")
            | expanded_name!(html "h1")
            | expanded_name!(html "h2")
            | expanded_name!(html "h3")
            | expanded_name!(html "h4")
            | expanded_name!(html "h5")
            | expanded_name!(html "h6")
            | expanded_name!(html "head")
            | expanded_name!(html "header")
            | expanded_name!(html "hgroup")
            | expanded_name!(html "hr")
            | expanded_name!(html "html")
            | expanded_name!(html "iframe")
            | expanded_name!(html "img")
            | expanded_name!(html "input")
            | expanded_name!(html "li")
            | expanded_name!(html "link")
            | expanded_name!(html "listing")
            | expanded_name!(html "main")
            | expanded_name!(html "marquee")
            | expanded_name!(html "menu")
            | expanded_name!(html "meta")
            | expanded_name!(html "nav")
            | expanded_name!(html "noembed")
            | expanded_name!(html "noframes")
            | expanded_name!(html "noscript")
            | expanded_name!(html "object")
            | expanded_name!(html "ol")
            | expanded_name!(html "p")
            | expanded_name!(html "param")
            | expanded_name!(html "plaintext")
            | expanded_name!(html "pre")
            | expanded_name!(html "script")
            | expanded_name!(html "section")
            | expanded_name!(html "select")
            | expanded_name!(html "source")
            | expanded_name!(html "style")
            | expanded_name!(html "summary")
            | expanded_name!(html "table")
            | expanded_name!(html "tbody")
            | expanded_name!(html "td")
            | expanded_name!(html "template")
            | expanded_name!(html "textarea")
            | expanded_name!(html "tfoot")
            | expanded_name!(html "th")
            | expanded_name!(html "thead")
            | expanded_name!(html "title")
            | expanded_name!(html "tr")
            | expanded_name!(html "track")
            | expanded_name!(html "ul")
            | expanded_name!(html "wbr")
            | expanded_name!(html "xmp")
            | expanded_name!(svg "foreignObject")
            | expanded_name!(svg "desc")
            | expanded_name!(svg "title")
    )
}

/// The default scope boundary: everything `has_an_element_in_scope` stops
/// at, before reaching `<html>`.
pub fn is_default_scope_boundary(name: ExpandedName<'_>) -> bool {
    matches!(
        name,
        expanded_name!(html "applet")
            | expanded_name!(html "caption")
            | expanded_name!(html "html")
            | expanded_name!(html "table")
            | expanded_name!(html "td")
            | expanded_name!(html "th")
            | expanded_name!(html "marquee")
            | expanded_name!(html "object")
            | expanded_name!(html "template")
            | expanded_name!(mathml "mi")
            | expanded_name!(mathml "mo")
            | expanded_name!(mathml "mn")
            | expanded_name!(mathml "ms")
            | expanded_name!(mathml "mtext")
            | expanded_name!(mathml "annotation-xml")
            | expanded_name!(svg "foreignObject")
            | expanded_name!(svg "desc")
            | expanded_name!(svg "title")
    )
}

pub fn is_list_item_scope_boundary(name: ExpandedName<'_>) -> bool {
    is_default_scope_boundary(name) || matches!(name, expanded_name!(html "ol") | expanded_name!(html "ul"))
}

pub fn is_button_scope_boundary(name: ExpandedName<'_>) -> bool {
    is_default_scope_boundary(name) || matches!(name, expanded_name!(html "button"))
}

pub fn is_table_scope_boundary(name: ExpandedName<'_>) -> bool {
    matches!(
        name,
        expanded_name!(html "html") | expanded_name!(html "table") | expanded_name!(html "template")
    )
}

pub fn is_select_scope_boundary(name: ExpandedName<'_>) -> bool {
    !matches!(name, expanded_name!(html "optgroup") | expanded_name!(html "option"))
}

/// Elements whose end tag implicitly closes a currently open `<p>`.
pub fn closes_p(name: ExpandedName<'_>) -> bool {
    matches!(
        name,
        expanded_name!(html "address")
            | expanded_name!(html "article")
            | expanded_name!(html "aside")
            | expanded_name!(html "blockquote")
            | expanded_name!(html "center")
            | expanded_name!(html "details")
            | expanded_name!(html "dir")
            | expanded_name!(html "div")
            | expanded_name!(html "dl")
            | expanded_name!(html "fieldset")
            | expanded_name!(html "figcaption")
            | expanded_name!(html "figure")
            | expanded_name!(html "footer")
            | expanded_name!(html "form")
            | expanded_name!(html "h1")
            | expanded_name!(html "h2")
            | expanded_name!(html "h3")
            | expanded_name!(html "h4")
            | expanded_name!(html "h5")
            | expanded_name!(html "h6")
            | expanded_name!(html "header")
            | expanded_name!(html "hgroup")
            | expanded_name!(html "hr")
            | expanded_name!(html "main")
            | expanded_name!(html "menu")
            | expanded_name!(html "nav")
            | expanded_name!(html "ol")
            | expanded_name!(html "p")
            | expanded_name!(html "pre")
            | expanded_name!(html "section")
            | expanded_name!(html "summary")
            | expanded_name!(html "table")
            | expanded_name!(html "ul")
    )
}

pub fn is_heading(name: ExpandedName<'_>) -> bool {
    matches!(
        name,
        expanded_name!(html "h1")
            | expanded_name!(html "h2")
            | expanded_name!(html "h3")
            | expanded_name!(html "h4")
            | expanded_name!(html "h5")
            | expanded_name!(html "h6")
    )
}

/// SVG tag names that case-adjust on insertion.
pub fn svg_tag_name_adjustment(local: &str) -> Option<&'static str> {
    Some(match local {
        "altglyph" => "altGlyph",
        "altglyphdef" => "altGlyphDef",
        "altglyphitem" => "altGlyphItem",
        "animatecolor" => "animateColor",
        "animatemotion" => "animateMotion",
        "animatetransform" => "animateTransform",
        "clippath" => "clipPath",
        "feblend" => "feBlend",
        "fecolormatrix" => "feColorMatrix",
        "fecomponenttransfer" => "feComponentTransfer",
        "fecomposite" => "feComposite",
        "feconvolvematrix" => "feConvolveMatrix",
        "fediffuselighting" => "feDiffuseLighting",
        "fedisplacementmap" => "feDisplacementMap",
        "fedistantlight" => "feDistantLight",
        "feflood" => "feFlood",
        "fefunca" => "feFuncA",
        "fefuncb" => "feFuncB",
        "fefuncg" => "feFuncG",
        "fefuncr" => "feFuncR",
        "fegaussianblur" => "feGaussianBlur",
        "feimage" => "feImage",
        "femerge" => "feMerge",
        "femergenode" => "feMergeNode",
        "femorphology" => "feMorphology",
        "feoffset" => "feOffset",
        "fepointlight" => "fePointLight",
        "fespecularlighting" => "feSpecularLighting",
        "fespotlight" => "feSpotLight",
        "fetile" => "feTile",
        "feturbulence" => "feTurbulence",
        "foreignobject" => "foreignObject",
        "glyphref" => "glyphRef",
        "lineargradient" => "linearGradient",
        "radialgradient" => "radialGradient",
        "textpath" => "textPath",
        _ => return None,
    })
}

/// SVG/MathML elements that, while in scope, exit foreign content because
/// HTML parsing rules apply to their contents ("breakout" elements).
pub fn is_mathml_text_integration_point(name: ExpandedName<'_>) -> bool {
    matches!(
        name,
        expanded_name!(mathml "mi")
            | expanded_name!(mathml "mo")
            | expanded_name!(mathml "mn")
            | expanded_name!(mathml "ms")
            | expanded_name!(mathml "mtext")
    )
}

pub fn is_html_integration_point(name: ExpandedName<'_>) -> bool {
    matches!(name, expanded_name!(svg "foreignObject") | expanded_name!(svg "desc") | expanded_name!(svg "title"))
}
