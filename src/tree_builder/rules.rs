// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

//! Insertion-mode dispatch: one `match` arm per [`InsertionMode`], each
//! implementing that mode's rules from the tree construction algorithm.
//! Written as a direct `match` (see the module-level note in `mod.rs` on
//! why this isn't a `match_token!`-style macro here).

use tendril::StrTendril;

use crate::interface::{LocalName, QualName};
use crate::ns;
use crate::tokenizer::interface::{Doctype, ParseErrorCode, Tag, TagKind, Token};
use crate::tree_builder::data::quirks_mode_for_doctype;
use crate::tree_builder::interface::{NodeOrText, QuirksMode, TreeSink};
use crate::tree_builder::tag_sets;
use crate::tree_builder::types::InsertionMode;
use crate::tree_builder::TreeBuilder;

/// The formatting element names the adoption agency algorithm applies to.
fn is_formatting_element_name(local: &str) -> bool {
    matches!(
        local,
        "a" | "b"
            | "big"
            | "code"
            | "em"
            | "font"
            | "i"
            | "nobr"
            | "s"
            | "small"
            | "strike"
            | "strong"
            | "tt"
            | "u"
    )
}

fn is_all_whitespace(s: &str) -> bool {
    s.chars().all(|c| matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' '))
}

impl<Sink: TreeSink> TreeBuilder<Sink> {
    pub(crate) fn step(&mut self, mode: InsertionMode, token: Token) {
        // A tokenizer-reported error is a side channel, not a construction
        // token: report it and return without letting any insertion mode's
        // rules see it, the same way the algorithm treats a parse error as
        // independent of "the token currently being processed".
        if let Token::ParseError(code, _) = token {
            self.report_error(code);
            return;
        }
        match mode {
            InsertionMode::Initial => self.step_initial(token),
            InsertionMode::BeforeHtml => self.step_before_html(token),
            InsertionMode::BeforeHead => self.step_before_head(token),
            InsertionMode::InHead => self.step_in_head(token),
            InsertionMode::InHeadNoscript => self.step_in_head_noscript(token),
            InsertionMode::AfterHead => self.step_after_head(token),
            InsertionMode::InBody => self.step_in_body(token),
            InsertionMode::Text => self.step_text(token),
            InsertionMode::InTable => self.step_in_table(token),
            InsertionMode::InTableText => self.step_in_table_text(token),
            InsertionMode::InCaption => self.step_in_caption(token),
            InsertionMode::InColumnGroup => self.step_in_column_group(token),
            InsertionMode::InTableBody => self.step_in_table_body(token),
            InsertionMode::InRow => self.step_in_row(token),
            InsertionMode::InCell => self.step_in_cell(token),
            InsertionMode::InSelect => self.step_in_select(token),
            InsertionMode::InSelectInTable => self.step_in_select_in_table(token),
            InsertionMode::InTemplate => self.step_in_template(token),
            InsertionMode::AfterBody => self.step_after_body(token),
            InsertionMode::InFrameset => self.step_in_frameset(token),
            InsertionMode::AfterFrameset => self.step_after_frameset(token),
            InsertionMode::AfterAfterBody => self.step_after_after_body(token),
            InsertionMode::AfterAfterFrameset => self.step_after_after_frameset(token),
        }
    }

    fn step_initial(&mut self, token: Token) {
        match token {
            Token::CharacterTokens(s) if is_all_whitespace(&s) => {},
            Token::CommentToken(text) => self.insert_comment(text),
            Token::DoctypeToken(doctype) => {
                let Doctype {
                    name,
                    public_id,
                    system_id,
                    force_quirks,
                } = doctype;
                let mode = quirks_mode_for_doctype(
                    name.as_deref(),
                    public_id.as_deref(),
                    system_id.as_deref(),
                    force_quirks,
                );
                self.quirks_mode = mode;
                log::debug!("quirks mode resolved to {mode:?} for doctype {name:?}");
                self.sink.set_quirks_mode(mode);
                self.sink.append_doctype_to_document(name.unwrap_or_default(), public_id, system_id);
                self.mode = InsertionMode::BeforeHtml;
            },
            token => {
                self.report_error(ParseErrorCode::EofInDoctype);
                self.quirks_mode = QuirksMode::Quirks;
                log::debug!("quirks mode resolved to Quirks: no doctype before content");
                self.sink.set_quirks_mode(QuirksMode::Quirks);
                self.mode = InsertionMode::BeforeHtml;
                self.step(InsertionMode::BeforeHtml, token);
            },
        }
    }

    fn step_before_html(&mut self, token: Token) {
        match token {
            Token::CharacterTokens(s) if is_all_whitespace(&s) => {},
            Token::CommentToken(text) => self.insert_comment(text),
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "html" => {
                let handle = self.sink.create_element(
                    QualName::new(None, ns!(html), LocalName::from("html")),
                    tag.attrs.clone(),
                    Default::default(),
                );
                self.sink.append(&self.document.clone(), NodeOrText::AppendNode(handle.clone()));
                self.open_elements.push(handle, QualName::new(None, ns!(html), LocalName::from("html")));
                self.mode = InsertionMode::BeforeHead;
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::EndTag
                    && matches!(&*tag.name.local, "head" | "body" | "html" | "br") => {
                self.create_implicit_html();
                self.step(InsertionMode::BeforeHead, token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag => {
                self.report_error(ParseErrorCode::MissingEndTagName);
            },
            token => {
                self.create_implicit_html();
                self.step(InsertionMode::BeforeHead, token);
            },
        }
    }

    fn create_implicit_html(&mut self) {
        let handle = self
            .sink
            .create_element(QualName::new(None, ns!(html), LocalName::from("html")), Vec::new(), Default::default());
        self.sink.append(&self.document.clone(), NodeOrText::AppendNode(handle.clone()));
        self.open_elements.push(handle, QualName::new(None, ns!(html), LocalName::from("html")));
        self.mode = InsertionMode::BeforeHead;
    }

    fn step_before_head(&mut self, token: Token) {
        match token {
            Token::CharacterTokens(s) if is_all_whitespace(&s) => {},
            Token::CommentToken(text) => self.insert_comment(text),
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "html" => {
                self.step_in_body(token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "head" => {
                let handle = self.insert_html_element("head", tag.attrs.clone());
                self.head_elem = Some(handle);
                self.mode = InsertionMode::InHead;
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::EndTag
                    && matches!(&*tag.name.local, "head" | "body" | "html" | "br") =>
            {
                let head = self.insert_html_element("head", Vec::new());
                self.head_elem = Some(head);
                self.mode = InsertionMode::InHead;
                self.step(InsertionMode::InHead, token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag => {
                self.report_error(ParseErrorCode::MissingEndTagName);
            },
            token => {
                let head = self.insert_html_element("head", Vec::new());
                self.head_elem = Some(head);
                self.mode = InsertionMode::InHead;
                self.step(InsertionMode::InHead, token);
            },
        }
    }

    fn step_in_head(&mut self, token: Token) {
        match token {
            Token::CharacterTokens(ref s) if is_all_whitespace(s) => self.insert_text(s.clone()),
            Token::CommentToken(text) => self.insert_comment(text),
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "html" => {
                self.step_in_body(token);
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::StartTag
                    && matches!(&*tag.name.local, "base" | "basefont" | "bgsound" | "link") =>
            {
                self.insert_html_element(&tag.name.local.clone(), tag.attrs.clone());
                self.open_elements.pop();
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "meta" => {
                self.insert_html_element("meta", tag.attrs.clone());
                self.open_elements.pop();
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "title" => {
                self.parse_rawtext_like(tag.clone(), RawTextMode::Rcdata);
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::StartTag && matches!(&*tag.name.local, "noframes" | "style") =>
            {
                self.parse_rawtext_like(tag.clone(), RawTextMode::Rawtext);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "noscript" => {
                if self.opts.scripting_enabled {
                    self.parse_rawtext_like(tag.clone(), RawTextMode::Rawtext);
                } else {
                    self.insert_html_element("noscript", tag.attrs.clone());
                    self.mode = InsertionMode::InHeadNoscript;
                }
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "script" => {
                self.insert_html_element("script", tag.attrs.clone());
                self.pending_raw_text_mode = Some(RawTextMode::ScriptData);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "head" => {
                self.open_elements.pop();
                self.mode = InsertionMode::AfterHead;
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::EndTag && matches!(&*tag.name.local, "body" | "html" | "br") =>
            {
                self.open_elements.pop();
                self.mode = InsertionMode::AfterHead;
                self.step(InsertionMode::AfterHead, token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "template" => {
                self.active_formatting.push_marker();
                self.frameset_ok = false;
                self.mode = InsertionMode::InTemplate;
                self.template_modes.push(InsertionMode::InTemplate);
                self.insert_html_element("template", tag.attrs.clone());
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "template" => {
                if self.open_elements.contains_html_element_named(&LocalName::from("template")) {
                    self.generate_implied_end_tags_thoroughly();
                    self.open_elements.pop_until(|n| n == crate::expanded_name!(html "template"));
                    self.active_formatting.clear_to_last_marker();
                    self.template_modes.pop();
                    self.reset_insertion_mode();
                } else {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                }
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag => {
                self.report_error(ParseErrorCode::MissingEndTagName);
            },
            token => {
                self.open_elements.pop();
                self.mode = InsertionMode::AfterHead;
                self.step(InsertionMode::AfterHead, token);
            },
        }
    }

    fn step_in_head_noscript(&mut self, token: Token) {
        match token {
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "html" => {
                self.step_in_body(token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "noscript" => {
                self.open_elements.pop();
                self.mode = InsertionMode::InHead;
            },
            Token::CharacterTokens(ref s) if is_all_whitespace(s) => self.step_in_head(token),
            Token::CommentToken(_) => self.step_in_head(token),
            Token::TagToken(ref tag)
                if tag.kind == TagKind::StartTag
                    && matches!(&*tag.name.local, "basefont" | "bgsound" | "link" | "meta" | "noframes" | "style") =>
            {
                self.step_in_head(token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "br" => {
                self.open_elements.pop();
                self.mode = InsertionMode::InHead;
                self.step(InsertionMode::InHead, token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && matches!(&*tag.name.local, "head" | "noscript") => {
                self.report_error(ParseErrorCode::MissingEndTagName);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag => {
                self.report_error(ParseErrorCode::MissingEndTagName);
            },
            token => {
                self.report_error(ParseErrorCode::MissingEndTagName);
                self.open_elements.pop();
                self.mode = InsertionMode::InHead;
                self.step(InsertionMode::InHead, token);
            },
        }
    }

    fn step_after_head(&mut self, token: Token) {
        match token {
            Token::CharacterTokens(ref s) if is_all_whitespace(s) => self.insert_text(s.clone()),
            Token::CommentToken(text) => self.insert_comment(text),
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "html" => {
                self.step_in_body(token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "body" => {
                self.insert_html_element("body", tag.attrs.clone());
                self.frameset_ok = false;
                self.mode = InsertionMode::InBody;
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "frameset" => {
                self.insert_html_element("frameset", tag.attrs.clone());
                self.mode = InsertionMode::InFrameset;
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::StartTag
                    && matches!(
                        &*tag.name.local,
                        "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script" | "style" | "template" | "title"
                    ) =>
            {
                self.report_error(ParseErrorCode::MissingEndTagName);
                if let Some(head) = self.head_elem.clone() {
                    self.open_elements.push(head, QualName::new(None, ns!(html), LocalName::from("head")));
                }
                self.step_in_head(token);
                self.open_elements.remove_first_matching(|h| self.sink.elem_name(h) == crate::expanded_name!(html "head"));
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "template" => {
                self.step_in_head(token);
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::EndTag && matches!(&*tag.name.local, "body" | "html" | "br") =>
            {
                self.insert_html_element("body", Vec::new());
                self.mode = InsertionMode::InBody;
                self.step(InsertionMode::InBody, token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "head" => {
                self.report_error(ParseErrorCode::MissingEndTagName);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag => {
                self.report_error(ParseErrorCode::MissingEndTagName);
            },
            token => {
                self.insert_html_element("body", Vec::new());
                self.mode = InsertionMode::InBody;
                self.step(InsertionMode::InBody, token);
            },
        }
    }

    fn step_in_body(&mut self, token: Token) {
        match token {
            Token::NullCharacterToken => self.report_error(ParseErrorCode::UnexpectedNullCharacter),
            Token::CharacterTokens(s) => {
                if !is_all_whitespace(&s) {
                    self.frameset_ok = false;
                }
                self.reconstruct_active_formatting_elements();
                self.insert_text(s);
            },
            Token::CommentToken(text) => self.insert_comment(text),
            Token::DoctypeToken(_) => self.report_error(ParseErrorCode::EofInDoctype),

            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "html" => {
                self.report_error(ParseErrorCode::MissingEndTagName);
                if let Some(top) = self.open_elements.top() {
                    self.sink.add_attrs_if_missing(&top.clone(), tag.attrs.clone());
                }
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::StartTag
                    && matches!(
                        &*tag.name.local,
                        "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script" | "style" | "template" | "title"
                    ) =>
            {
                self.step_in_head(token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "template" => {
                self.step_in_head(token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "body" => {
                self.report_error(ParseErrorCode::MissingEndTagName);
                self.frameset_ok = false;
                if let Some(body) = self.open_elements.nth_from_top(self.open_elements.len().saturating_sub(2)) {
                    self.sink.add_attrs_if_missing(&body.clone(), tag.attrs.clone());
                }
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "frameset" => {
                self.report_error(ParseErrorCode::MissingEndTagName);
            },
            Token::EOFToken => {
                if !self.template_modes.is_empty() {
                    self.step_in_template(token);
                } else {
                    self.stop_parsing();
                }
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::EndTag && matches!(&*tag.name.local, "body" | "html") =>
            {
                if !self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "body"), tag_sets::is_default_scope_boundary)
                {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                    return;
                }
                self.mode = InsertionMode::AfterBody;
                if &*tag.name.local == "html" {
                    self.step(InsertionMode::AfterBody, token);
                }
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::StartTag
                    && matches!(
                        &*tag.name.local,
                        "address" | "article" | "aside" | "blockquote" | "center" | "details" | "dialog" | "dir" | "div" | "dl"
                            | "fieldset" | "figcaption" | "figure" | "footer" | "header" | "hgroup" | "main" | "menu" | "nav"
                            | "ol" | "p" | "section" | "summary" | "ul"
                    ) =>
            {
                if self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "p"), tag_sets::is_button_scope_boundary)
                {
                    self.close_p_element();
                }
                self.insert_html_element(&tag.name.local.clone(), tag.attrs.clone());
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && tag_sets::is_heading(tag.name.expanded()) => {
                if self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "p"), tag_sets::is_button_scope_boundary)
                {
                    self.close_p_element();
                }
                if tag_sets::is_heading(self.open_elements.top_name().unwrap_or(crate::expanded_name!(html "html"))) {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                    self.open_elements.pop();
                }
                self.insert_html_element(&tag.name.local.clone(), tag.attrs.clone());
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::StartTag && matches!(&*tag.name.local, "pre" | "listing") =>
            {
                if self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "p"), tag_sets::is_button_scope_boundary)
                {
                    self.close_p_element();
                }
                self.insert_html_element(&tag.name.local.clone(), tag.attrs.clone());
                self.ignore_lf = true;
                self.frameset_ok = false;
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "form" => {
                if self.form_elem.is_some() && !self.open_elements.contains_html_element_named(&LocalName::from("template")) {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                    return;
                }
                if self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "p"), tag_sets::is_button_scope_boundary)
                {
                    self.close_p_element();
                }
                let handle = self.insert_html_element("form", tag.attrs.clone());
                if !self.open_elements.contains_html_element_named(&LocalName::from("template")) {
                    self.form_elem = Some(handle);
                }
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "li" => {
                self.frameset_ok = false;
                self.close_implied_list_item("li");
                if self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "p"), tag_sets::is_button_scope_boundary)
                {
                    self.close_p_element();
                }
                self.insert_html_element("li", tag.attrs.clone());
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && matches!(&*tag.name.local, "dd" | "dt") => {
                self.frameset_ok = false;
                let name = tag.name.local.clone();
                self.close_implied_list_item(&name);
                if self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "p"), tag_sets::is_button_scope_boundary)
                {
                    self.close_p_element();
                }
                self.insert_html_element(&name.clone(), tag.attrs.clone());
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "plaintext" => {
                if self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "p"), tag_sets::is_button_scope_boundary)
                {
                    self.close_p_element();
                }
                self.insert_html_element("plaintext", tag.attrs.clone());
                self.pending_raw_text_mode = Some(RawTextMode::Plaintext);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "button" => {
                if self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "button"), tag_sets::is_default_scope_boundary)
                {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                    self.generate_implied_end_tags(None);
                    self.open_elements.pop_until(|n| n == crate::expanded_name!(html "button"));
                }
                self.reconstruct_active_formatting_elements();
                self.insert_html_element("button", tag.attrs.clone());
                self.frameset_ok = false;
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::EndTag
                    && matches!(
                        &*tag.name.local,
                        "address" | "article" | "aside" | "blockquote" | "button" | "center" | "details" | "dialog" | "dir"
                            | "div" | "dl" | "fieldset" | "figcaption" | "figure" | "footer" | "header" | "hgroup" | "listing"
                            | "main" | "menu" | "nav" | "ol" | "pre" | "section" | "summary" | "ul"
                    ) =>
            {
                let expanded = tag.name.expanded();
                if !self.open_elements.has_element_in_scope(expanded, tag_sets::is_default_scope_boundary) {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                    return;
                }
                self.generate_implied_end_tags(None);
                if !matches!(self.open_elements.top_name(), Some(n) if n == expanded) {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                }
                self.open_elements.pop_until(|n| n == expanded);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "form" => {
                if !self.open_elements.contains_html_element_named(&LocalName::from("template")) {
                    let node = self.form_elem.take();
                    match node {
                        Some(node)
                            if self
                                .open_elements
                                .has_element_in_scope(crate::expanded_name!(html "form"), tag_sets::is_default_scope_boundary) =>
                        {
                            self.generate_implied_end_tags(None);
                            self.open_elements.remove_handle(&node, |a, b| self.sink.same_node(a, b));
                        },
                        _ => self.report_error(ParseErrorCode::MissingEndTagName),
                    }
                } else {
                    if !self
                        .open_elements
                        .has_element_in_scope(crate::expanded_name!(html "form"), tag_sets::is_default_scope_boundary)
                    {
                        self.report_error(ParseErrorCode::MissingEndTagName);
                        return;
                    }
                    self.generate_implied_end_tags(None);
                    self.open_elements.pop_until(|n| n == crate::expanded_name!(html "form"));
                }
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "p" => {
                if !self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "p"), tag_sets::is_button_scope_boundary)
                {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                    self.insert_html_element("p", Vec::new());
                }
                self.close_p_element();
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "li" => {
                self.end_list_item("li", tag_sets::is_list_item_scope_boundary);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && matches!(&*tag.name.local, "dd" | "dt") => {
                let name = tag.name.local.clone();
                self.end_list_item(&name, tag_sets::is_default_scope_boundary);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && tag_sets::is_heading(tag.name.expanded()) => {
                if !self.open_elements.has_numbered_header_in_scope(tag_sets::is_default_scope_boundary) {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                    return;
                }
                self.generate_implied_end_tags(None);
                if !matches!(self.open_elements.top_name(), Some(n) if tag_sets::is_heading(n)) {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                }
                self.open_elements.pop_until(tag_sets::is_heading);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && is_formatting_element_name(&tag.name.local) => {
                self.reconstruct_active_formatting_elements();
                let handle = self.insert_html_element(&tag.name.local.clone(), tag.attrs.clone());
                self.active_formatting.push_element(handle, tag.clone());
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && is_formatting_element_name(&tag.name.local) => {
                let name = tag.name.local.clone();
                self.adoption_agency(&name);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && matches!(&*tag.name.local, "applet" | "marquee" | "object") => {
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(&tag.name.local.clone(), tag.attrs.clone());
                self.active_formatting.push_marker();
                self.frameset_ok = false;
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && matches!(&*tag.name.local, "applet" | "marquee" | "object") => {
                let expanded = tag.name.expanded();
                if !self.open_elements.has_element_in_scope(expanded, tag_sets::is_default_scope_boundary) {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                    return;
                }
                self.generate_implied_end_tags(None);
                self.open_elements.pop_until(|n| n == expanded);
                self.active_formatting.clear_to_last_marker();
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "table" => {
                if self.quirks_mode != QuirksMode::Quirks
                    && self
                        .open_elements
                        .has_element_in_scope(crate::expanded_name!(html "p"), tag_sets::is_button_scope_boundary)
                {
                    self.close_p_element();
                }
                self.insert_html_element("table", tag.attrs.clone());
                self.frameset_ok = false;
                self.mode = InsertionMode::InTable;
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::StartTag
                    && matches!(&*tag.name.local, "area" | "br" | "embed" | "img" | "keygen" | "wbr") =>
            {
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(&tag.name.local.clone(), tag.attrs.clone());
                self.open_elements.pop();
                self.frameset_ok = false;
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "input" => {
                self.reconstruct_active_formatting_elements();
                self.insert_html_element("input", tag.attrs.clone());
                self.open_elements.pop();
                let is_hidden = tag
                    .attrs
                    .iter()
                    .any(|a| &*a.name.local == "type" && a.value.eq_ignore_ascii_case("hidden"));
                if !is_hidden {
                    self.frameset_ok = false;
                }
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::StartTag && matches!(&*tag.name.local, "param" | "source" | "track") =>
            {
                self.insert_html_element(&tag.name.local.clone(), tag.attrs.clone());
                self.open_elements.pop();
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "hr" => {
                if self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "p"), tag_sets::is_button_scope_boundary)
                {
                    self.close_p_element();
                }
                self.insert_html_element("hr", tag.attrs.clone());
                self.open_elements.pop();
                self.frameset_ok = false;
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "textarea" => {
                self.insert_html_element("textarea", tag.attrs.clone());
                self.ignore_lf = true;
                self.frameset_ok = false;
                self.pending_raw_text_mode = Some(RawTextMode::Rcdata);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "xmp" => {
                if self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "p"), tag_sets::is_button_scope_boundary)
                {
                    self.close_p_element();
                }
                self.reconstruct_active_formatting_elements();
                self.frameset_ok = false;
                self.parse_rawtext_like(tag.clone(), RawTextMode::Rawtext);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "iframe" => {
                self.frameset_ok = false;
                self.parse_rawtext_like(tag.clone(), RawTextMode::Rawtext);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "select" => {
                self.reconstruct_active_formatting_elements();
                self.insert_html_element("select", tag.attrs.clone());
                self.frameset_ok = false;
                self.mode = match self.mode {
                    InsertionMode::InTable | InsertionMode::InCaption | InsertionMode::InTableBody | InsertionMode::InRow | InsertionMode::InCell => {
                        InsertionMode::InSelectInTable
                    },
                    _ => InsertionMode::InSelect,
                };
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && matches!(&*tag.name.local, "optgroup" | "option") => {
                if matches!(self.open_elements.top_name(), Some(n) if n == crate::expanded_name!(html "option")) {
                    self.open_elements.pop();
                }
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(&tag.name.local.clone(), tag.attrs.clone());
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && matches!(&*tag.name.local, "rb" | "rtc") => {
                if self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "ruby"), tag_sets::is_default_scope_boundary)
                {
                    self.generate_implied_end_tags(None);
                }
                self.insert_html_element(&tag.name.local.clone(), tag.attrs.clone());
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && matches!(&*tag.name.local, "rp" | "rt") => {
                if self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "ruby"), tag_sets::is_default_scope_boundary)
                {
                    self.generate_implied_end_tags(Some(&LocalName::from("rtc")));
                }
                self.insert_html_element(&tag.name.local.clone(), tag.attrs.clone());
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "math" => {
                self.reconstruct_active_formatting_elements();
                self.insert_foreign_element(tag.clone(), ns!(mathml));
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "svg" => {
                self.reconstruct_active_formatting_elements();
                self.insert_foreign_element(tag.clone(), ns!(svg));
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::StartTag
                    && matches!(
                        &*tag.name.local,
                        "caption" | "col" | "colgroup" | "frame" | "head" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr"
                    ) =>
            {
                self.report_error(ParseErrorCode::MissingEndTagName);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag => {
                // "Any other start tag": the self-closing flag is only
                // meaningful on void and foreign elements (each handled by
                // its own arm above); on an ordinary HTML element it's a
                // parse error and is otherwise ignored.
                if tag.self_closing {
                    self.report_error(ParseErrorCode::UnexpectedSolidusInTag);
                }
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(&tag.name.local.clone(), tag.attrs.clone());
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag => {
                self.any_other_end_tag(tag.clone());
            },
            _ => {},
        }
    }

    fn any_other_end_tag(&mut self, tag: Tag) {
        let target = tag.name.expanded();
        let idx = self.open_elements.position_from_top(|h| self.sink.elem_name(h) == target);
        match idx {
            None => self.report_error(ParseErrorCode::MissingEndTagName),
            Some(idx) => {
                self.generate_implied_end_tags(Some(&tag.name.local));
                if idx != 0 {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                }
                for _ in 0..=idx {
                    self.open_elements.pop();
                }
            },
        }
    }

    fn close_implied_list_item(&mut self, stopping_at: &str) {
        for (handle, name) in self.open_elements.iter_top_down().cloned().collect::<Vec<_>>() {
            let local = &name.local;
            if &**local == stopping_at {
                self.generate_implied_end_tags(Some(local));
                self.open_elements.pop_until(|n| n == name.expanded());
                break;
            }
            if tag_sets::is_special(name.expanded())
                && !matches!(&**local, "address" | "div" | "p")
            {
                let _ = &handle;
                break;
            }
        }
    }

    fn end_list_item(&mut self, name: &str, boundary: impl Fn(crate::interface::ExpandedName<'_>) -> bool) {
        let target = QualName::new(None, ns!(html), LocalName::from(name));
        if !self.open_elements.has_element_in_scope(target.expanded(), boundary) {
            self.report_error(ParseErrorCode::MissingEndTagName);
            return;
        }
        self.generate_implied_end_tags(Some(&target.local));
        if !matches!(self.open_elements.top_name(), Some(n) if n == target.expanded()) {
            self.report_error(ParseErrorCode::MissingEndTagName);
        }
        self.open_elements.pop_until(|n| n == target.expanded());
    }

    fn insert_foreign_element(&mut self, mut tag: Tag, namespace: crate::interface::Namespace) {
        tag.name.ns = namespace;
        let handle = self.sink.create_element(tag.name.clone(), tag.attrs.clone(), Default::default());
        self.insert_node_foster_aware(&self.current_node(), NodeOrText::AppendNode(handle.clone()));
        if !tag.self_closing {
            self.open_elements.push(handle, tag.name);
        }
    }

    fn step_text(&mut self, token: Token) {
        match token {
            Token::CharacterTokens(s) => self.insert_text(s),
            Token::EOFToken => {
                self.report_error(ParseErrorCode::EofInTag);
                self.open_elements.pop();
                self.mode = self.orig_mode.take().unwrap_or(InsertionMode::InBody);
                self.step(self.mode, Token::EOFToken);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag => {
                self.open_elements.pop();
                self.mode = self.orig_mode.take().unwrap_or(InsertionMode::InBody);
            },
            _ => {},
        }
    }

    fn step_in_table(&mut self, token: Token) {
        match token {
            Token::CharacterTokens(_)
                if matches!(
                    self.open_elements.top_name(),
                    Some(n) if n == crate::expanded_name!(html "table")
                        || n == crate::expanded_name!(html "tbody")
                        || n == crate::expanded_name!(html "tfoot")
                        || n == crate::expanded_name!(html "thead")
                        || n == crate::expanded_name!(html "tr")
                ) =>
            {
                self.pending_table_chars.clear();
                self.pending_table_chars_nonwhitespace = false;
                self.orig_mode = Some(self.mode);
                self.mode = InsertionMode::InTableText;
                self.step(InsertionMode::InTableText, token);
            },
            Token::CommentToken(text) => self.insert_comment(text),
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "caption" => {
                self.open_elements.pop_until(|n| n == crate::expanded_name!(html "table"));
                self.active_formatting.push_marker();
                self.insert_html_element("caption", tag.attrs.clone());
                self.mode = InsertionMode::InCaption;
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "colgroup" => {
                self.insert_html_element("colgroup", tag.attrs.clone());
                self.mode = InsertionMode::InColumnGroup;
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "col" => {
                self.insert_html_element("colgroup", Vec::new());
                self.mode = InsertionMode::InColumnGroup;
                self.step(InsertionMode::InColumnGroup, token);
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::StartTag && matches!(&*tag.name.local, "tbody" | "tfoot" | "thead") =>
            {
                self.insert_html_element(&tag.name.local.clone(), tag.attrs.clone());
                self.mode = InsertionMode::InTableBody;
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::StartTag && matches!(&*tag.name.local, "td" | "th" | "tr") =>
            {
                self.insert_html_element("tbody", Vec::new());
                self.mode = InsertionMode::InTableBody;
                self.step(InsertionMode::InTableBody, token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "table" => {
                self.report_error(ParseErrorCode::MissingEndTagName);
                if self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "table"), tag_sets::is_table_scope_boundary)
                {
                    self.open_elements.pop_until(|n| n == crate::expanded_name!(html "table"));
                    self.reset_insertion_mode();
                    self.step(self.mode, token);
                }
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "table" => {
                if !self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "table"), tag_sets::is_table_scope_boundary)
                {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                    return;
                }
                self.open_elements.pop_until(|n| n == crate::expanded_name!(html "table"));
                self.reset_insertion_mode();
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::EndTag
                    && matches!(
                        &*tag.name.local,
                        "body" | "caption" | "col" | "colgroup" | "html" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr"
                    ) =>
            {
                self.report_error(ParseErrorCode::MissingEndTagName);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && matches!(&*tag.name.local, "style" | "script" | "template") => {
                self.step_in_head(token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "template" => {
                self.step_in_head(token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "input" => {
                let is_hidden = tag
                    .attrs
                    .iter()
                    .any(|a| &*a.name.local == "type" && a.value.eq_ignore_ascii_case("hidden"));
                if is_hidden {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                    self.insert_html_element("input", tag.attrs.clone());
                    self.open_elements.pop();
                } else {
                    self.foster_parented_in_body(token);
                }
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "form" => {
                self.report_error(ParseErrorCode::MissingEndTagName);
                if self.form_elem.is_none() && !self.open_elements.contains_html_element_named(&LocalName::from("template")) {
                    let handle = self.insert_html_element("form", tag.attrs.clone());
                    self.form_elem = Some(handle);
                    self.open_elements.pop();
                }
            },
            Token::EOFToken => self.step_in_body(token),
            _ => self.foster_parented_in_body(token),
        }
    }

    fn foster_parented_in_body(&mut self, token: Token) {
        self.report_error(ParseErrorCode::MissingEndTagName);
        self.step_in_body(token);
    }

    fn step_in_table_text(&mut self, token: Token) {
        match token {
            Token::CharacterTokens(s) => {
                if !is_all_whitespace(&s) {
                    self.pending_table_chars_nonwhitespace = true;
                }
                self.pending_table_chars.push_tendril(&s);
            },
            token => {
                if self.pending_table_chars_nonwhitespace {
                    let text = std::mem::take(&mut self.pending_table_chars);
                    self.foster_parented_in_body(Token::CharacterTokens(text));
                } else {
                    let text = std::mem::take(&mut self.pending_table_chars);
                    self.insert_text(text);
                }
                let orig = self.orig_mode.take().unwrap_or(InsertionMode::InTable);
                self.mode = orig;
                self.step(orig, token);
            },
        }
    }

    fn step_in_caption(&mut self, token: Token) {
        match token {
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "caption" => {
                if !self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "caption"), tag_sets::is_table_scope_boundary)
                {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                    return;
                }
                self.generate_implied_end_tags(None);
                self.open_elements.pop_until(|n| n == crate::expanded_name!(html "caption"));
                self.active_formatting.clear_to_last_marker();
                self.mode = InsertionMode::InTable;
            },
            Token::TagToken(ref tag)
                if (tag.kind == TagKind::StartTag
                    && matches!(
                        &*tag.name.local,
                        "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr"
                    ))
                    || (tag.kind == TagKind::EndTag && &*tag.name.local == "table") =>
            {
                if self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "caption"), tag_sets::is_table_scope_boundary)
                {
                    self.open_elements.pop_until(|n| n == crate::expanded_name!(html "caption"));
                    self.active_formatting.clear_to_last_marker();
                    self.mode = InsertionMode::InTable;
                    self.step(InsertionMode::InTable, token);
                }
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::EndTag
                    && matches!(&*tag.name.local, "body" | "col" | "colgroup" | "html" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr") =>
            {
                self.report_error(ParseErrorCode::MissingEndTagName);
            },
            token => self.step_in_body(token),
        }
    }

    fn step_in_column_group(&mut self, token: Token) {
        match token {
            Token::CharacterTokens(ref s) if is_all_whitespace(s) => self.insert_text(s.clone()),
            Token::CommentToken(text) => self.insert_comment(text),
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "html" => self.step_in_body(token),
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "col" => {
                self.insert_html_element("col", tag.attrs.clone());
                self.open_elements.pop();
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "colgroup" => {
                if matches!(self.open_elements.top_name(), Some(n) if n == crate::expanded_name!(html "colgroup")) {
                    self.open_elements.pop();
                    self.mode = InsertionMode::InTable;
                } else {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                }
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "col" => {
                self.report_error(ParseErrorCode::MissingEndTagName);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "template" => self.step_in_head(token),
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "template" => self.step_in_head(token),
            Token::EOFToken => self.step_in_body(token),
            token => {
                if matches!(self.open_elements.top_name(), Some(n) if n == crate::expanded_name!(html "colgroup")) {
                    self.open_elements.pop();
                    self.mode = InsertionMode::InTable;
                    self.step(InsertionMode::InTable, token);
                } else {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                }
            },
        }
    }

    fn step_in_table_body(&mut self, token: Token) {
        match token {
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "tr" => {
                self.open_elements.pop_until(|n| {
                    n == crate::expanded_name!(html "tbody")
                        || n == crate::expanded_name!(html "thead")
                        || n == crate::expanded_name!(html "tfoot")
                });
                self.insert_html_element("tr", tag.attrs.clone());
                self.mode = InsertionMode::InRow;
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && matches!(&*tag.name.local, "th" | "td") => {
                self.report_error(ParseErrorCode::MissingEndTagName);
                self.insert_html_element("tr", Vec::new());
                self.mode = InsertionMode::InRow;
                self.step(InsertionMode::InRow, token);
            },
            Token::TagToken(ref tag)
                if (tag.kind == TagKind::EndTag && matches!(&*tag.name.local, "tbody" | "tfoot" | "thead"))
                    || (tag.kind == TagKind::StartTag && matches!(&*tag.name.local, "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead"))
                    || (tag.kind == TagKind::EndTag && &*tag.name.local == "table") =>
            {
                let local = tag.name.local.clone();
                let target_name = if tag.kind == TagKind::EndTag && matches!(&*local, "tbody" | "tfoot" | "thead") {
                    tag.name.expanded()
                } else {
                    self.open_elements.top_name().unwrap_or(crate::expanded_name!(html "tbody"))
                };
                if !self.open_elements.has_element_in_scope(target_name, tag_sets::is_table_scope_boundary) {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                    return;
                }
                self.open_elements.pop_until(|n| n == target_name);
                self.mode = InsertionMode::InTable;
                self.step(InsertionMode::InTable, token);
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::EndTag && matches!(&*tag.name.local, "body" | "caption" | "col" | "colgroup" | "html" | "td" | "th" | "tr") =>
            {
                self.report_error(ParseErrorCode::MissingEndTagName);
            },
            token => self.step_in_table(token),
        }
    }

    fn step_in_row(&mut self, token: Token) {
        match token {
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && matches!(&*tag.name.local, "th" | "td") => {
                self.open_elements.pop_until(|n| n == crate::expanded_name!(html "tr"));
                self.active_formatting.push_marker();
                self.insert_html_element(&tag.name.local.clone(), tag.attrs.clone());
                self.mode = InsertionMode::InCell;
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "tr" => {
                if !self.open_elements.has_element_in_scope(crate::expanded_name!(html "tr"), tag_sets::is_table_scope_boundary) {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                    return;
                }
                self.open_elements.pop_until(|n| n == crate::expanded_name!(html "tr"));
                self.mode = InsertionMode::InTableBody;
            },
            Token::TagToken(ref tag)
                if (tag.kind == TagKind::StartTag
                    && matches!(&*tag.name.local, "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead" | "tr"))
                    || (tag.kind == TagKind::EndTag && &*tag.name.local == "table") =>
            {
                if self.open_elements.has_element_in_scope(crate::expanded_name!(html "tr"), tag_sets::is_table_scope_boundary) {
                    self.open_elements.pop_until(|n| n == crate::expanded_name!(html "tr"));
                    self.mode = InsertionMode::InTableBody;
                    self.step(InsertionMode::InTableBody, token);
                } else {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                }
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::EndTag && matches!(&*tag.name.local, "tbody" | "tfoot" | "thead") =>
            {
                let expanded = tag.name.expanded();
                if !self.open_elements.has_element_in_scope(expanded, tag_sets::is_table_scope_boundary) {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                    return;
                }
                self.open_elements.pop_until(|n| n == crate::expanded_name!(html "tr"));
                self.mode = InsertionMode::InTableBody;
                self.step(InsertionMode::InTableBody, token);
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::EndTag && matches!(&*tag.name.local, "body" | "caption" | "col" | "colgroup" | "html" | "td" | "th") =>
            {
                self.report_error(ParseErrorCode::MissingEndTagName);
            },
            token => self.step_in_table(token),
        }
    }

    fn step_in_cell(&mut self, token: Token) {
        match token {
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && matches!(&*tag.name.local, "td" | "th") => {
                let expanded = tag.name.expanded();
                if !self.open_elements.has_element_in_scope(expanded, tag_sets::is_table_scope_boundary) {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                    return;
                }
                self.generate_implied_end_tags(None);
                self.open_elements.pop_until(|n| n == expanded);
                self.active_formatting.clear_to_last_marker();
                self.mode = InsertionMode::InRow;
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::StartTag
                    && matches!(&*tag.name.local, "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr") =>
            {
                let closing = if self.open_elements.has_element_in_scope(crate::expanded_name!(html "td"), tag_sets::is_table_scope_boundary) {
                    Some(crate::expanded_name!(html "td"))
                } else if self.open_elements.has_element_in_scope(crate::expanded_name!(html "th"), tag_sets::is_table_scope_boundary) {
                    Some(crate::expanded_name!(html "th"))
                } else {
                    None
                };
                match closing {
                    Some(name) => {
                        self.generate_implied_end_tags(None);
                        self.open_elements.pop_until(|n| n == name);
                        self.active_formatting.clear_to_last_marker();
                        self.mode = InsertionMode::InRow;
                        self.step(InsertionMode::InRow, token);
                    },
                    None => self.report_error(ParseErrorCode::MissingEndTagName),
                }
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::EndTag && matches!(&*tag.name.local, "body" | "caption" | "col" | "colgroup" | "html") =>
            {
                self.report_error(ParseErrorCode::MissingEndTagName);
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::EndTag && matches!(&*tag.name.local, "table" | "tbody" | "tfoot" | "thead" | "tr") =>
            {
                let expanded = tag.name.expanded();
                if !self.open_elements.has_element_in_scope(expanded, tag_sets::is_table_scope_boundary) {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                    return;
                }
                self.generate_implied_end_tags(None);
                let closing = if self.open_elements.has_element_in_scope(crate::expanded_name!(html "td"), tag_sets::is_table_scope_boundary) {
                    crate::expanded_name!(html "td")
                } else {
                    crate::expanded_name!(html "th")
                };
                self.open_elements.pop_until(|n| n == closing);
                self.active_formatting.clear_to_last_marker();
                self.mode = InsertionMode::InRow;
                self.step(InsertionMode::InRow, token);
            },
            token => self.step_in_body(token),
        }
    }

    fn step_in_select(&mut self, token: Token) {
        match token {
            Token::NullCharacterToken => self.report_error(ParseErrorCode::UnexpectedNullCharacter),
            Token::CharacterTokens(s) => self.insert_text(s),
            Token::CommentToken(text) => self.insert_comment(text),
            Token::DoctypeToken(_) => self.report_error(ParseErrorCode::EofInDoctype),
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "html" => self.step_in_body(token),
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "option" => {
                if matches!(self.open_elements.top_name(), Some(n) if n == crate::expanded_name!(html "option")) {
                    self.open_elements.pop();
                }
                self.insert_html_element("option", tag.attrs.clone());
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "optgroup" => {
                if matches!(self.open_elements.top_name(), Some(n) if n == crate::expanded_name!(html "option")) {
                    self.open_elements.pop();
                }
                if matches!(self.open_elements.top_name(), Some(n) if n == crate::expanded_name!(html "optgroup")) {
                    self.open_elements.pop();
                }
                self.insert_html_element("optgroup", tag.attrs.clone());
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "optgroup" => {
                let top_is_option = matches!(self.open_elements.top_name(), Some(n) if n == crate::expanded_name!(html "option"));
                if top_is_option {
                    if matches!(self.open_elements.nth_from_top(1).map(|h| self.sink.elem_name(h)), Some(n) if n == crate::expanded_name!(html "optgroup")) {
                        self.open_elements.pop();
                    }
                }
                if matches!(self.open_elements.top_name(), Some(n) if n == crate::expanded_name!(html "optgroup")) {
                    self.open_elements.pop();
                } else {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                }
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "option" => {
                if matches!(self.open_elements.top_name(), Some(n) if n == crate::expanded_name!(html "option")) {
                    self.open_elements.pop();
                } else {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                }
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "select" => {
                if self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "select"), tag_sets::is_select_scope_boundary)
                {
                    self.open_elements.pop_until(|n| n == crate::expanded_name!(html "select"));
                    self.reset_insertion_mode();
                } else {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                }
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "select" => {
                self.report_error(ParseErrorCode::MissingEndTagName);
                self.open_elements.pop_until(|n| n == crate::expanded_name!(html "select"));
                self.reset_insertion_mode();
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::StartTag && matches!(&*tag.name.local, "input" | "keygen" | "textarea") =>
            {
                self.report_error(ParseErrorCode::MissingEndTagName);
                if self
                    .open_elements
                    .has_element_in_scope(crate::expanded_name!(html "select"), tag_sets::is_select_scope_boundary)
                {
                    self.open_elements.pop_until(|n| n == crate::expanded_name!(html "select"));
                    self.reset_insertion_mode();
                    self.step(self.mode, token);
                }
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && matches!(&*tag.name.local, "script" | "template") => {
                self.step_in_head(token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "template" => self.step_in_head(token),
            Token::EOFToken => self.step_in_body(token),
            _ => self.report_error(ParseErrorCode::MissingEndTagName),
        }
    }

    fn step_in_select_in_table(&mut self, token: Token) {
        match token {
            Token::TagToken(ref tag)
                if tag.kind == TagKind::StartTag
                    && matches!(&*tag.name.local, "caption" | "table" | "tbody" | "tfoot" | "thead" | "tr" | "td" | "th") =>
            {
                self.report_error(ParseErrorCode::MissingEndTagName);
                self.open_elements.pop_until(|n| n == crate::expanded_name!(html "select"));
                self.reset_insertion_mode();
                self.step(self.mode, token);
            },
            Token::TagToken(ref tag)
                if tag.kind == TagKind::EndTag
                    && matches!(&*tag.name.local, "caption" | "table" | "tbody" | "tfoot" | "thead" | "tr" | "td" | "th") =>
            {
                let expanded = tag.name.expanded();
                if self.open_elements.has_element_in_scope(expanded, tag_sets::is_table_scope_boundary) {
                    self.open_elements.pop_until(|n| n == crate::expanded_name!(html "select"));
                    self.reset_insertion_mode();
                    self.step(self.mode, token);
                } else {
                    self.report_error(ParseErrorCode::MissingEndTagName);
                }
            },
            token => self.step_in_select(token),
        }
    }

    fn step_in_template(&mut self, token: Token) {
        match token {
            Token::CharacterTokens(_) | Token::CommentToken(_) | Token::DoctypeToken(_) => self.step_in_body(token),
            Token::TagToken(ref tag)
                if tag.kind == TagKind::StartTag
                    && matches!(
                        &*tag.name.local,
                        "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script" | "style" | "template" | "title"
                    ) =>
            {
                self.step_in_head(token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "template" => self.step_in_head(token),
            Token::TagToken(ref tag)
                if tag.kind == TagKind::StartTag
                    && matches!(&*tag.name.local, "caption" | "colgroup" | "tbody" | "tfoot" | "thead") =>
            {
                self.template_modes.pop();
                self.template_modes.push(InsertionMode::InTable);
                self.mode = InsertionMode::InTable;
                self.step(InsertionMode::InTable, token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "col" => {
                self.template_modes.pop();
                self.template_modes.push(InsertionMode::InColumnGroup);
                self.mode = InsertionMode::InColumnGroup;
                self.step(InsertionMode::InColumnGroup, token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "tr" => {
                self.template_modes.pop();
                self.template_modes.push(InsertionMode::InTableBody);
                self.mode = InsertionMode::InTableBody;
                self.step(InsertionMode::InTableBody, token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && matches!(&*tag.name.local, "td" | "th") => {
                self.template_modes.pop();
                self.template_modes.push(InsertionMode::InRow);
                self.mode = InsertionMode::InRow;
                self.step(InsertionMode::InRow, token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag => {
                self.template_modes.pop();
                self.template_modes.push(InsertionMode::InBody);
                self.mode = InsertionMode::InBody;
                self.step(InsertionMode::InBody, token);
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag => {
                self.report_error(ParseErrorCode::MissingEndTagName);
            },
            Token::EOFToken => {
                if !self.open_elements.contains_html_element_named(&LocalName::from("template")) {
                    self.stop_parsing();
                } else {
                    self.report_error(ParseErrorCode::EofInTag);
                    self.open_elements.pop_until(|n| n == crate::expanded_name!(html "template"));
                    self.active_formatting.clear_to_last_marker();
                    self.template_modes.pop();
                    self.reset_insertion_mode();
                    self.step(self.mode, Token::EOFToken);
                }
            },
            _ => {},
        }
    }

    fn step_after_body(&mut self, token: Token) {
        match token {
            Token::CharacterTokens(ref s) if is_all_whitespace(s) => self.step_in_body(token),
            Token::CommentToken(text) => {
                let html = self.open_elements.nth_from_top(self.open_elements.len().saturating_sub(1)).cloned();
                if let Some(html) = html {
                    let handle = self.sink.create_comment(text);
                    self.sink.append(&html, NodeOrText::AppendNode(handle));
                }
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "html" => self.step_in_body(token),
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "html" => {
                self.mode = InsertionMode::AfterAfterBody;
            },
            Token::EOFToken => self.stop_parsing(),
            token => {
                self.report_error(ParseErrorCode::MissingEndTagName);
                self.mode = InsertionMode::InBody;
                self.step(InsertionMode::InBody, token);
            },
        }
    }

    fn step_in_frameset(&mut self, token: Token) {
        match token {
            Token::CharacterTokens(ref s) if is_all_whitespace(s) => self.insert_text(s.clone()),
            Token::CommentToken(text) => self.insert_comment(text),
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "html" => self.step_in_body(token),
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "frameset" => {
                self.insert_html_element("frameset", tag.attrs.clone());
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "frameset" => {
                self.open_elements.pop();
                if !matches!(self.open_elements.top_name(), Some(n) if n == crate::expanded_name!(html "frameset")) {
                    self.mode = InsertionMode::AfterFrameset;
                }
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "frame" => {
                self.insert_html_element("frame", tag.attrs.clone());
                self.open_elements.pop();
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "noframes" => self.step_in_head(token),
            Token::EOFToken => self.stop_parsing(),
            _ => self.report_error(ParseErrorCode::MissingEndTagName),
        }
    }

    fn step_after_frameset(&mut self, token: Token) {
        match token {
            Token::CharacterTokens(ref s) if is_all_whitespace(s) => self.insert_text(s.clone()),
            Token::CommentToken(text) => self.insert_comment(text),
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "html" => self.step_in_body(token),
            Token::TagToken(ref tag) if tag.kind == TagKind::EndTag && &*tag.name.local == "html" => {
                self.mode = InsertionMode::AfterAfterFrameset;
            },
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "noframes" => self.step_in_head(token),
            Token::EOFToken => self.stop_parsing(),
            _ => self.report_error(ParseErrorCode::MissingEndTagName),
        }
    }

    fn step_after_after_body(&mut self, token: Token) {
        match token {
            Token::CommentToken(text) => {
                let handle = self.sink.create_comment(text);
                self.sink.append(&self.document.clone(), NodeOrText::AppendNode(handle));
            },
            Token::DoctypeToken(_) => self.step_in_body(token),
            Token::CharacterTokens(ref s) if is_all_whitespace(s) => self.step_in_body(token),
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "html" => self.step_in_body(token),
            Token::EOFToken => self.stop_parsing(),
            token => {
                self.mode = InsertionMode::InBody;
                self.step(InsertionMode::InBody, token);
            },
        }
    }

    fn step_after_after_frameset(&mut self, token: Token) {
        match token {
            Token::CommentToken(text) => {
                let handle = self.sink.create_comment(text);
                self.sink.append(&self.document.clone(), NodeOrText::AppendNode(handle));
            },
            Token::DoctypeToken(_) => self.step_in_body(token),
            Token::CharacterTokens(ref s) if is_all_whitespace(s) => self.step_in_body(token),
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "html" => self.step_in_body(token),
            Token::TagToken(ref tag) if tag.kind == TagKind::StartTag && &*tag.name.local == "noframes" => self.step_in_head(token),
            Token::EOFToken => self.stop_parsing(),
            _ => self.report_error(ParseErrorCode::MissingEndTagName),
        }
    }

    /// Enter RCDATA/RAWTEXT tokenization for an element whose content model
    /// is defined that way (`<title>`, `<textarea>`, `<style>`, …), via the
    /// tokenizer state the sink's `process_token` return value requests;
    /// here we just remember which sub-mode to ask for the next time the
    /// driver asks us (see `crate::driver`).
    fn parse_rawtext_like(&mut self, tag: Tag, mode: RawTextMode) {
        self.insert_html_element(&tag.name.local.clone(), tag.attrs.clone());
        self.pending_raw_text_mode = Some(mode);
        self.orig_mode = Some(self.mode);
        self.mode = InsertionMode::Text;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RawTextMode {
    Rcdata,
    Rawtext,
    ScriptData,
    Plaintext,
}
