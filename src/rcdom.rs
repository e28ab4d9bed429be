// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

//! A simple reference-counted DOM: the concrete [`TreeSink`] the driver
//! hands to [`crate::tree_builder::TreeBuilder`].
//!
//! This is sufficient as a static parse tree, but don't build a web
//! browser using it. Nodes are reference-counted (`Rc<Node>`) with a
//! `Weak` back-pointer for the parent to avoid a reference cycle: the
//! tree owns children, the open-elements stack and active-formatting list
//! hold clones of the same `Rc` without owning anything.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};

use tendril::StrTendril;

use crate::interface::{Attribute, ExpandedName, QualName};
use crate::ns;
use crate::tokenizer::interface::ParseErrorCode;
use crate::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};

/// The different kinds of nodes in the DOM: Document, Doctype, Element,
/// Text, Comment. A fragment root is just `Document` reused in
/// fragment-parse mode — html5core doesn't distinguish fragment roots
/// from document roots at the node-kind level.
pub enum NodeData {
    /// The document root (or, in a fragment parse, the fragment root).
    Document,

    /// A `DOCTYPE` with name, public id, and system id. `public_id`/
    /// `system_id` are `None` when the identifier was absent, distinct
    /// from `Some("")` when it was present but empty.
    Doctype {
        name: StrTendril,
        public_id: Option<StrTendril>,
        system_id: Option<StrTendril>,
    },

    /// A text node. Adjacent text nodes are never created; see
    /// [`append_to_existing_text`].
    Text { contents: RefCell<StrTendril> },

    /// A comment.
    Comment { contents: StrTendril },

    /// An element with attributes. `template_contents` is `Some` only for
    /// `template` elements in the HTML namespace: their content model is
    /// a separate Document-Fragment, distinct from `children`.
    Element {
        name: QualName,
        attrs: RefCell<Vec<Attribute>>,
        template_contents: RefCell<Option<Handle>>,
        mathml_annotation_xml_integration_point: bool,
    },
}

impl fmt::Debug for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeData::Document => write!(f, "#document"),
            NodeData::Doctype { name, .. } => write!(f, "<!DOCTYPE {name}>"),
            NodeData::Text { contents } => write!(f, "{:?}", &*contents.borrow()),
            NodeData::Comment { contents } => write!(f, "<!--{contents}-->"),
            NodeData::Element { name, .. } => write!(f, "<{}>", name.local),
        }
    }
}

/// A DOM node.
pub struct Node {
    pub parent: Cell<Option<WeakHandle>>,
    pub children: RefCell<Vec<Handle>>,
    pub data: NodeData,
}

impl Node {
    fn new(data: NodeData) -> Handle {
        Rc::new(Node {
            data,
            parent: Cell::new(None),
            children: RefCell::new(Vec::new()),
        })
    }

    fn parent_weak(&self) -> Option<WeakHandle> {
        let parent = self.parent.take();
        self.parent.set(parent.clone());
        parent
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node").field("data", &self.data).field("children", &self.children).finish()
    }
}

/// A parent drops its children iteratively, rather than via the default
/// recursive `Drop`, so a very deep or wide tree (adversarial input, or a
/// pathologically nested fragment) doesn't blow the stack on teardown.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = mem::take(&mut *self.children.borrow_mut());
        while let Some(node) = pending.pop() {
            let children = mem::take(&mut *node.children.borrow_mut());
            pending.extend(children);
            if let NodeData::Element { ref template_contents, .. } = node.data {
                if let Some(contents) = template_contents.borrow_mut().take() {
                    pending.push(contents);
                }
            }
        }
    }
}

/// Reference to a DOM node. The tree owns these; the open-elements stack
/// and active-formatting list hold clones without owning anything.
pub type Handle = Rc<Node>;

/// Weak reference to a DOM node, used for parent pointers.
pub type WeakHandle = Weak<Node>;

fn append(new_parent: &Handle, child: Handle) {
    let previous = child.parent.replace(Some(Rc::downgrade(new_parent)));
    assert!(previous.is_none(), "child already has a parent");
    new_parent.children.borrow_mut().push(child);
}

fn get_parent_and_index(target: &Handle) -> Option<(Handle, usize)> {
    let weak = target.parent_weak()?;
    let parent = weak.upgrade().expect("dangling parent pointer");
    let index = parent
        .children
        .borrow()
        .iter()
        .position(|child| Rc::ptr_eq(child, target))
        .expect("node not found among its parent's children");
    Some((parent, index))
}

fn append_to_existing_text(prev: &Handle, text: &str) -> bool {
    match prev.data {
        NodeData::Text { ref contents } => {
            contents.borrow_mut().push_slice(text);
            true
        },
        _ => false,
    }
}

fn remove_from_parent(target: &Handle) {
    if let Some((parent, index)) = get_parent_and_index(target) {
        parent.children.borrow_mut().remove(index);
        target.parent.set(None);
    }
}

/// The DOM itself: the result of a parse. Implements [`TreeSink`].
#[derive(Debug)]
pub struct RcDom {
    /// The document (or fragment) root.
    pub document: Handle,

    /// Parse errors collected so far (populated only when `collectErrors`
    /// is requested; see [`crate::driver::ParseOpts`]).
    pub errors: Vec<(ParseErrorCode, u64)>,

    /// The document's quirks mode, set from the DOCTYPE (or its absence).
    pub quirks_mode: QuirksMode,
}

impl Default for RcDom {
    fn default() -> RcDom {
        RcDom {
            document: Node::new(NodeData::Document),
            errors: Vec::new(),
            quirks_mode: QuirksMode::NoQuirks,
        }
    }
}

impl TreeSink for RcDom {
    type Handle = Handle;
    type Output = Self;

    fn finish(self) -> Self {
        self
    }

    fn parse_error(&mut self, code: ParseErrorCode, line: u64) {
        self.errors.push((code, line));
    }

    fn get_document(&mut self) -> Handle {
        self.document.clone()
    }

    fn elem_name(&self, target: &Handle) -> ExpandedName<'_> {
        match target.data {
            NodeData::Element { ref name, .. } => name.expanded(),
            _ => panic!("elem_name called on a non-element node"),
        }
    }

    fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>, flags: ElementFlags) -> Handle {
        let mathml_annotation_xml_integration_point = flags.mathml_annotation_xml_integration_point
            || (name.ns == ns!(mathml)
                && &*name.local == "annotation-xml"
                && attrs.iter().any(|a| {
                    &*a.name.local == "encoding"
                        && (a.value.eq_ignore_ascii_case("text/html")
                            || a.value.eq_ignore_ascii_case("application/xhtml+xml"))
                }));
        Node::new(NodeData::Element {
            name,
            attrs: RefCell::new(attrs),
            template_contents: RefCell::new(if flags.template { Some(Node::new(NodeData::Document)) } else { None }),
            mathml_annotation_xml_integration_point,
        })
    }

    fn create_comment(&mut self, text: StrTendril) -> Handle {
        Node::new(NodeData::Comment { contents: text })
    }

    fn create_pi(&mut self, _target: StrTendril, _data: StrTendril) -> Handle {
        // HTML has no processing instructions; a `<?...>` sequence is
        // tokenized as a bogus comment instead. The tree builder
        // never calls this for an HTML parse; kept only so `TreeSink`
        // has one shape for a future XML-flavoured sink.
        unimplemented!("HTML parsing never constructs a processing instruction")
    }

    fn append(&mut self, parent: &Handle, child: NodeOrText<Handle>) {
        if let NodeOrText::AppendText(ref text) = child {
            if let Some(last) = parent.children.borrow().last() {
                if append_to_existing_text(last, text) {
                    return;
                }
            }
        }
        append(
            parent,
            match child {
                NodeOrText::AppendText(text) => Node::new(NodeData::Text { contents: RefCell::new(text) }),
                NodeOrText::AppendNode(node) => node,
            },
        );
    }

    fn append_based_on_parent_node(&mut self, element: &Handle, prev_element: &Handle, child: NodeOrText<Handle>) {
        if element.parent_weak().is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(&mut self, name: StrTendril, public_id: Option<StrTendril>, system_id: Option<StrTendril>) {
        append(&self.document, Node::new(NodeData::Doctype { name, public_id, system_id }));
    }

    fn get_template_contents(&mut self, target: &Handle) -> Handle {
        match target.data {
            NodeData::Element { ref template_contents, .. } => {
                template_contents.borrow().clone().expect("not a template element")
            },
            _ => panic!("get_template_contents called on a non-element node"),
        }
    }

    fn same_node(&self, x: &Handle, y: &Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&mut self, mode: QuirksMode) {
        self.quirks_mode = mode;
    }

    fn append_before_sibling(&mut self, sibling: &Handle, new_node: NodeOrText<Handle>) {
        let (parent, index) =
            get_parent_and_index(sibling).expect("append_before_sibling called on a node without a parent");

        let child = match (new_node, index) {
            (NodeOrText::AppendText(text), 0) => Node::new(NodeData::Text { contents: RefCell::new(text) }),
            (NodeOrText::AppendText(text), index) => {
                let children = parent.children.borrow();
                let prev = &children[index - 1];
                if append_to_existing_text(prev, &text) {
                    return;
                }
                drop(children);
                Node::new(NodeData::Text { contents: RefCell::new(text) })
            },
            (NodeOrText::AppendNode(node), _) => node,
        };

        remove_from_parent(&child);
        child.parent.set(Some(Rc::downgrade(&parent)));
        parent.children.borrow_mut().insert(index, child);
    }

    fn add_attrs_if_missing(&mut self, target: &Handle, attrs: Vec<Attribute>) {
        let mut existing = match target.data {
            NodeData::Element { ref attrs, .. } => attrs.borrow_mut(),
            _ => panic!("add_attrs_if_missing called on a non-element node"),
        };
        let existing_names: HashSet<_> = existing.iter().map(|a| a.name.clone()).collect();
        existing.extend(attrs.into_iter().filter(|a| !existing_names.contains(&a.name)));
    }

    fn remove_from_parent(&mut self, target: &Handle) {
        remove_from_parent(target);
    }

    fn reparent_children(&mut self, node: &Handle, new_parent: &Handle) {
        let mut children = node.children.borrow_mut();
        for child in children.iter() {
            child.parent.set(Some(Rc::downgrade(new_parent)));
        }
        new_parent.children.borrow_mut().extend(mem::take(&mut *children));
    }

    fn is_mathml_annotation_xml_integration_point(&self, handle: &Handle) -> bool {
        match handle.data {
            NodeData::Element { mathml_annotation_xml_integration_point, .. } => {
                mathml_annotation_xml_integration_point
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_name;

    fn elem(name: &str) -> QualName {
        QualName::new(None, ns!(html), crate::interface::LocalName::from(name))
    }

    #[test]
    fn text_coalesces_on_append() {
        let mut dom = RcDom::default();
        let body = dom.create_element(elem("body"), Vec::new(), Default::default());
        dom.append(&body, NodeOrText::AppendText(StrTendril::from("a")));
        dom.append(&body, NodeOrText::AppendText(StrTendril::from("b")));
        assert_eq!(body.children.borrow().len(), 1);
        match body.children.borrow()[0].data {
            NodeData::Text { ref contents } => assert_eq!(&*contents.borrow(), "ab"),
            _ => panic!("expected a text node"),
        }
    }

    #[test]
    fn template_gets_separate_contents_document() {
        let mut dom = RcDom::default();
        let template = dom.create_element(
            elem("template"),
            Vec::new(),
            ElementFlags { template: true, ..Default::default() },
        );
        let contents = dom.get_template_contents(&template);
        assert!(contents.children.borrow().is_empty());
        assert!(!Rc::ptr_eq(&contents, &template));
        let _ = local_name!(template);
    }

    #[test]
    fn remove_from_parent_clears_parent_pointer() {
        let mut dom = RcDom::default();
        let body = dom.create_element(elem("body"), Vec::new(), Default::default());
        let span = dom.create_element(elem("span"), Vec::new(), Default::default());
        dom.append(&body, NodeOrText::AppendNode(span.clone()));
        assert_eq!(body.children.borrow().len(), 1);
        dom.remove_from_parent(&span);
        assert!(body.children.borrow().is_empty());
        assert!(span.parent.take().is_none());
    }
}
