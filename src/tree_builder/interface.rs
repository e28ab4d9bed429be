// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

//! The [`TreeSink`] trait: the tree builder's view of the DOM it is
//! constructing. A concrete document model (see [`crate::rcdom`]) implements
//! this; the tree builder never touches node storage directly.

use tendril::StrTendril;

use crate::interface::{Attribute, ExpandedName, QualName};
use crate::tokenizer::interface::ParseErrorCode;

/// Quirks-mode classification resulting from the DOCTYPE (or its absence).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum QuirksMode {
    Quirks,
    LimitedQuirks,
    NoQuirks,
}

/// Either an existing node handle, or text to be appended/created. The
/// tree builder uses this so that adjacent text insertions can be merged
/// into one text node, matching "insert a character" in the construction
/// algorithm rather than one text node per character token.
pub enum NodeOrText<Handle> {
    AppendNode(Handle),
    AppendText(StrTendril),
}

/// Extra semantics an insertion may carry, beyond producing a plain
/// element: whether it came from a template's contents, and whether a
/// `<script>` element inserted this way should be marked "already started"
/// (parser-inserted, not document.write-inserted).
#[derive(Debug, Copy, Clone, Default)]
pub struct ElementFlags {
    pub template: bool,
    pub mathml_annotation_xml_integration_point: bool,
}

/// Where to insert relative to an existing node, for foster-parenting and
/// insertion-point handling.
pub enum InsertionPoint<Handle> {
    LastChild(Handle),
    BeforeSibling(Handle),
}

/// A callback for `TreeSink::complete_script` and friends to report which
/// nodes exist, for tools that need to observe tree shape without owning
/// it (debug dumps).
pub trait Tracer {
    type Handle;
    fn trace_handle(&self, node: &Self::Handle);
}

/// The interface the tree builder drives to actually build a document.
/// `Handle` is an opaque, cheaply-clonable reference to a node (in
/// [`crate::rcdom`], an `Rc<Node>`).
pub trait TreeSink {
    type Handle: Clone;
    type Output;

    /// Consume `self` and return whatever the caller wants once
    /// construction is done (the finished document, the error list, …).
    fn finish(self) -> Self::Output;

    fn parse_error(&mut self, code: ParseErrorCode, line: u64);

    fn get_document(&mut self) -> Self::Handle;

    /// The element name of `target`, for insertion-mode dispatch rules
    /// that branch on "is the current node a `<select>`" etc.
    fn elem_name(&self, target: &Self::Handle) -> ExpandedName<'_>;

    fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>, flags: ElementFlags) -> Self::Handle;

    fn create_comment(&mut self, text: StrTendril) -> Self::Handle;

    fn create_pi(&mut self, target: StrTendril, data: StrTendril) -> Self::Handle;

    fn append(&mut self, parent: &Self::Handle, child: NodeOrText<Self::Handle>);

    fn append_based_on_parent_node(
        &mut self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    );

    /// `public_id`/`system_id` are `None` when the DOCTYPE token had no such
    /// identifier at all, distinct from `Some("")` when it had one that was
    /// empty (`<!DOCTYPE html SYSTEM "">`) — the two must serialize
    /// differently.
    fn append_doctype_to_document(&mut self, name: StrTendril, public_id: Option<StrTendril>, system_id: Option<StrTendril>);

    fn get_template_contents(&mut self, target: &Self::Handle) -> Self::Handle;

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool;

    fn set_quirks_mode(&mut self, mode: QuirksMode);

    fn append_before_sibling(&mut self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>);

    fn add_attrs_if_missing(&mut self, target: &Self::Handle, attrs: Vec<Attribute>);

    fn remove_from_parent(&mut self, target: &Self::Handle);

    fn reparent_children(&mut self, node: &Self::Handle, new_parent: &Self::Handle);

    /// Mark a `<script>` element as parser-inserted and "already started",
    /// then return it so the driver can decide whether to execute it.
    /// html5core never executes scripts; the default simply returns the
    /// handle.
    fn complete_script(&mut self, _node: &Self::Handle) -> ScriptExecutionMode {
        ScriptExecutionMode::NotExecuted
    }

    fn is_mathml_annotation_xml_integration_point(&self, _handle: &Self::Handle) -> bool {
        false
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScriptExecutionMode {
    NotExecuted,
}
