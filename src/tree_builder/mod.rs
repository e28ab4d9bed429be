// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

//! Tree construction: consumes tokens from the tokenizer and builds a
//! document via a [`TreeSink`], following the insertion-mode state machine.
//!
//! Dispatch between insertion modes is a plain `match` over
//! [`InsertionMode`] in `rules.rs`, rather than a `match_token!` procedural
//! macro DSL — a macro would buy concision on the many element-name arms,
//! but without one available as a dependency here a direct match reads
//! just as clearly with the generated code made literal.

mod adoption;
pub mod data;
pub mod interface;
mod rules;
pub mod stack;
pub mod tag_sets;
pub mod types;

use tendril::StrTendril;

use crate::interface::{Attribute, LocalName, QualName};
use crate::ns;
use crate::tokenizer::interface::{ParseErrorCode, Tag, TagKind, Token, TokenSink, TokenSinkResult};

pub use self::interface::{ElementFlags, NodeOrText, QuirksMode, Tracer, TreeSink};
pub use self::stack::{ActiveFormattingElements, ElementStack};
pub use self::types::InsertionMode;

#[derive(Clone, Default)]
pub struct TreeBuilderOpts {
    pub scripting_enabled: bool,
    pub iframe_srcdoc: bool,
    pub quirks_mode: Option<QuirksMode>,
    /// Parse a document fragment rooted at this context element instead of
    /// a full document.
    pub fragment_context: Option<QualName>,
}

pub struct TreeBuilder<Sink: TreeSink> {
    sink: Sink,
    opts: TreeBuilderOpts,

    document: Sink::Handle,
    mode: InsertionMode,
    orig_mode: Option<InsertionMode>,
    template_modes: Vec<InsertionMode>,

    open_elements: ElementStack<Sink::Handle>,
    active_formatting: ActiveFormattingElements<Sink::Handle>,

    head_elem: Option<Sink::Handle>,
    form_elem: Option<Sink::Handle>,
    context_elem: Option<Sink::Handle>,

    frameset_ok: bool,
    quirks_mode: QuirksMode,
    ignore_lf: bool,

    pending_table_chars: StrTendril,
    pending_table_chars_nonwhitespace: bool,

    /// Set by a `rules::step_in_head`-family rule that just inserted an
    /// RCDATA/RAWTEXT/script/plaintext element, so the driver knows which
    /// tokenizer state to switch to before the next token is requested.
    pending_raw_text_mode: Option<rules::RawTextMode>,

    current_line: u64,
}

impl<Sink: TreeSink> TreeBuilder<Sink> {
    pub fn new(mut sink: Sink, opts: TreeBuilderOpts) -> Self {
        let document = sink.get_document();
        let mode = if opts.fragment_context.is_some() {
            InsertionMode::BeforeHtml
        } else {
            InsertionMode::Initial
        };
        let mut tb = TreeBuilder {
            sink,
            document,
            mode,
            orig_mode: None,
            template_modes: Vec::new(),
            open_elements: ElementStack::new(),
            active_formatting: ActiveFormattingElements::new(),
            head_elem: None,
            form_elem: None,
            context_elem: None,
            frameset_ok: true,
            quirks_mode: opts.quirks_mode.unwrap_or(QuirksMode::NoQuirks),
            ignore_lf: false,
            pending_table_chars: StrTendril::new(),
            pending_table_chars_nonwhitespace: false,
            pending_raw_text_mode: None,
            current_line: 1,
            opts: opts.clone(),
        };
        if let Some(ctx) = opts.fragment_context.clone() {
            tb.set_up_fragment_parsing(ctx);
        }
        tb
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    pub fn finish(self) -> Sink::Output {
        self.sink.finish()
    }

    /// Take and clear whatever RCDATA/RAWTEXT/script/plaintext tokenizer
    /// state the last processed token requested, translated to the
    /// tokenizer's own state enum so the driver can hand it to
    /// [`crate::tokenizer::Tokenizer::set_state`].
    pub fn take_pending_tokenizer_state(&mut self) -> Option<crate::tokenizer::interface::States> {
        use crate::tokenizer::interface::States;
        use rules::RawTextMode;
        self.pending_raw_text_mode.take().map(|mode| match mode {
            RawTextMode::Rcdata => States::Rcdata,
            RawTextMode::Rawtext => States::Rawtext,
            RawTextMode::ScriptData => States::ScriptData,
            RawTextMode::Plaintext => States::Plaintext,
        })
    }

    fn set_up_fragment_parsing(&mut self, context_name: QualName) {
        log::debug!("fragment parse: context element is {:?}", context_name.local);
        let context = self.sink.create_element(context_name.clone(), Vec::new(), Default::default());
        self.context_elem = Some(context.clone());
        let html = self.sink.create_element(QualName::new(None, ns!(html), LocalName::from("html")), Vec::new(), Default::default());
        self.open_elements.push(html, QualName::new(None, ns!(html), LocalName::from("html")));
        self.reset_insertion_mode();
        if &*context_name.local == "form" {
            self.form_elem = Some(context);
        }
    }

    fn parse_error_now(&mut self) {
        self.sink.parse_error(ParseErrorCode::UnexpectedCharacterInAttributeName, self.current_line);
    }

    fn report_error(&mut self, code: ParseErrorCode) {
        self.sink.parse_error(code, self.current_line);
    }

    // --- insertion helpers -------------------------------------------------

    fn current_node(&self) -> Sink::Handle {
        self.open_elements
            .top()
            .cloned()
            .unwrap_or_else(|| self.document.clone())
    }

    fn adjusted_current_node(&self) -> Sink::Handle {
        if self.open_elements.len() == 1 {
            if let Some(ctx) = &self.context_elem {
                return ctx.clone();
            }
        }
        self.current_node()
    }

    fn insert_element(&mut self, tag: Tag, flags: ElementFlags) -> Sink::Handle {
        let handle = self.sink.create_element(tag.name.clone(), tag.attrs.clone(), flags);
        self.insert_node_foster_aware(&self.current_node(), NodeOrText::AppendNode(handle.clone()));
        self.open_elements.push(handle.clone(), tag.name);
        handle
    }

    fn insert_html_element(&mut self, local: &str, attrs: Vec<Attribute>) -> Sink::Handle {
        let tag = Tag {
            kind: TagKind::StartTag,
            name: QualName::new(None, ns!(html), LocalName::from(local)),
            self_closing: false,
            attrs,
        };
        self.insert_element(tag, Default::default())
    }

    fn insert_node_foster_aware(&mut self, parent: &Sink::Handle, child: NodeOrText<Sink::Handle>) {
        if self.foster_parenting_applies(parent) {
            self.foster_parent(child);
        } else {
            self.sink.append(parent, child);
        }
    }

    fn foster_parenting_applies(&self, parent: &Sink::Handle) -> bool {
        if !self.sink.same_node(parent, &self.current_node()) {
            return false;
        }
        matches!(
            self.open_elements.top_name(),
            Some(n) if n == crate::expanded_name!(html "table")
                || n == crate::expanded_name!(html "tbody")
                || n == crate::expanded_name!(html "tfoot")
                || n == crate::expanded_name!(html "thead")
                || n == crate::expanded_name!(html "tr")
        )
    }

    /// Insert `child` just before the nearest `<table>` ancestor on the
    /// open-elements stack (or as the last child of whatever's below it
    /// if there's no `<table>`, e.g. a fragment parse), per the table
    /// foster-parenting algorithm.
    fn foster_parent(&mut self, child: NodeOrText<Sink::Handle>) {
        let table_pos = self
            .open_elements
            .position_from_top(|h| self.sink.elem_name(h) == crate::expanded_name!(html "table"));

        match table_pos {
            None => {
                let target = self.open_elements.nth_from_top(self.open_elements.len() - 1).cloned().unwrap_or_else(|| self.document.clone());
                self.sink.append(&target, child);
            },
            Some(pos) => {
                let table = self.open_elements.nth_from_top(pos).cloned().unwrap();
                let above_table = self.open_elements.nth_from_top(pos + 1).cloned();
                match above_table {
                    Some(parent) if self.sink.elem_name(&parent) == crate::expanded_name!(html "template") => {
                        let contents = self.sink.get_template_contents(&parent);
                        self.sink.append(&contents, child);
                    },
                    Some(_parent) => {
                        self.sink.append_before_sibling(&table, child);
                    },
                    None => {
                        self.sink.append(&self.document.clone(), child);
                    },
                }
            },
        }
    }

    fn insert_text(&mut self, text: StrTendril) {
        if text.is_empty() {
            return;
        }
        self.insert_node_foster_aware(&self.current_node(), NodeOrText::AppendText(text));
    }

    fn insert_comment(&mut self, text: StrTendril) {
        let handle = self.sink.create_comment(text);
        self.insert_node_foster_aware(&self.current_node(), NodeOrText::AppendNode(handle));
    }

    fn reconstruct_active_formatting_elements(&mut self) {
        if self.active_formatting.is_empty() {
            return;
        }
        let start = self.active_formatting.last_marker_or_start();
        let entries: Vec<_> = self
            .active_formatting
            .entries_from(start)
            .iter()
            .enumerate()
            .filter_map(|(i, e)| match e {
                stack::FormattingEntry::Element(h, tag) => Some((start + i, h.clone(), tag.clone())),
                stack::FormattingEntry::Marker => None,
            })
            .collect();

        for (idx, handle, tag) in entries {
            let already_open = self.open_elements.iter_top_down().any(|(h, _)| self.sink.same_node(h, &handle));
            if already_open {
                continue;
            }
            let new_handle = self.insert_element(tag.clone(), Default::default());
            self.active_formatting.remove_at(idx);
            self.active_formatting.insert_at(idx, new_handle, tag);
        }
    }

    fn generate_implied_end_tags(&mut self, except: Option<&LocalName>) {
        loop {
            let should_pop = match self.open_elements.top_name() {
                Some(n) => {
                    let is_excepted = except.map(|e| e == n.local).unwrap_or(false);
                    is_implied_end_tag_element(n) && !is_excepted
                },
                None => false,
            };
            if !should_pop {
                break;
            }
            self.open_elements.pop();
        }
    }

    fn generate_implied_end_tags_thoroughly(&mut self) {
        loop {
            let should_pop = matches!(self.open_elements.top_name(), Some(n) if is_implied_end_tag_element_thorough(n));
            if !should_pop {
                break;
            }
            self.open_elements.pop();
        }
    }

    fn close_p_element(&mut self) {
        self.generate_implied_end_tags(Some(&LocalName::from("p")));
        if !matches!(self.open_elements.top_name(), Some(n) if n == crate::expanded_name!(html "p")) {
            self.parse_error_now();
        }
        self.open_elements.pop_until(|n| n == crate::expanded_name!(html "p"));
    }

    fn reset_insertion_mode(&mut self) {
        let len = self.open_elements.len();
        for depth in 0..len {
            let last = depth + 1 == len;
            let handle = self.open_elements.nth_from_top(depth).cloned();
            let mut name = handle.as_ref().map(|h| self.sink.elem_name(h).local.clone());
            if last {
                if let Some(ctx) = &self.context_elem {
                    name = Some(self.sink.elem_name(ctx).local.clone());
                }
            }
            let name = match name {
                Some(n) => n,
                None => continue,
            };

            self.mode = match &*name {
                "select" => {
                    if !last {
                        let mut ancestor_depth = depth;
                        let mut found_template_or_table = None;
                        while ancestor_depth + 1 < len {
                            ancestor_depth += 1;
                            if let Some(h) = self.open_elements.nth_from_top(ancestor_depth) {
                                let n = self.sink.elem_name(h).local.clone();
                                if &*n == "template" {
                                    break;
                                }
                                if &*n == "table" {
                                    found_template_or_table = Some(InsertionMode::InSelectInTable);
                                    break;
                                }
                            }
                        }
                        found_template_or_table.unwrap_or(InsertionMode::InSelect)
                    } else {
                        InsertionMode::InSelect
                    }
                },
                "td" | "th" if !last => InsertionMode::InCell,
                "tr" => InsertionMode::InRow,
                "tbody" | "thead" | "tfoot" => InsertionMode::InTableBody,
                "caption" => InsertionMode::InCaption,
                "colgroup" => InsertionMode::InColumnGroup,
                "table" => InsertionMode::InTable,
                "template" => self.template_modes.last().copied().unwrap_or(InsertionMode::InBody),
                "head" if !last => InsertionMode::InHead,
                "body" => InsertionMode::InBody,
                "frameset" => InsertionMode::InFrameset,
                "html" => {
                    if self.head_elem.is_none() {
                        InsertionMode::BeforeHead
                    } else {
                        InsertionMode::AfterHead
                    }
                },
                _ if last => InsertionMode::InBody,
                _ => continue,
            };
            return;
        }
        self.mode = InsertionMode::InBody;
    }

    fn stop_parsing(&mut self) {
        while self.open_elements.pop().is_some() {}
    }
}

fn is_implied_end_tag_element(name: crate::interface::ExpandedName<'_>) -> bool {
    matches!(
        name,
        crate::expanded_name!(html "dd")
            | crate::expanded_name!(html "dt")
            | crate::expanded_name!(html "li")
            | crate::expanded_name!(html "optgroup")
            | crate::expanded_name!(html "option")
            | crate::expanded_name!(html "p")
            | crate::expanded_name!(html "rb")
            | crate::expanded_name!(html "rp")
            | crate::expanded_name!(html "rt")
            | crate::expanded_name!(html "rtc")
    )
}

fn is_implied_end_tag_element_thorough(name: crate::interface::ExpandedName<'_>) -> bool {
    is_implied_end_tag_element(name)
        || matches!(
            name,
            crate::expanded_name!(html "caption")
                | crate::expanded_name!(html "colgroup")
                | crate::expanded_name!(html "tbody")
                | crate::expanded_name!(html "td")
                | crate::expanded_name!(html "tfoot")
                | crate::expanded_name!(html "th")
                | crate::expanded_name!(html "thead")
                | crate::expanded_name!(html "tr")
        )
}

impl<Sink: TreeSink> TokenSink for TreeBuilder<Sink> {
    type Handle = Sink::Handle;

    fn process_token(&mut self, token: Token, line_number: u64) -> TokenSinkResult<Self::Handle> {
        self.current_line = line_number;
        self.step(self.mode, token);
        match self.take_pending_tokenizer_state() {
            Some(crate::tokenizer::interface::States::Plaintext) => TokenSinkResult::Plaintext,
            Some(state) => TokenSinkResult::RawData(state),
            None => TokenSinkResult::Continue,
        }
    }

    fn end(&mut self) {
        self.stop_parsing();
    }

    fn adjusted_current_node_present_but_not_in_html_namespace(&self) -> bool {
        match self.open_elements.top() {
            Some(h) => self.sink.elem_name(h).ns != &ns!(html),
            None => false,
        }
    }
}

