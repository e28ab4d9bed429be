// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

//! The stack of open elements and the list of active formatting elements.
//!
//! Both are modeled as a `Vec` walked top-down ("the bottommost node" is
//! the current node — here that's `Vec::last`). Scope queries do a linear
//! scan from the top rather than maintaining a side index; real documents
//! rarely nest more than a few dozen elements deep, so the scan is cheap
//! and keeps each "in scope" check easy to verify line by line.

use crate::interface::{ExpandedName, LocalName, QualName};
use crate::tokenizer::interface::Tag;

#[derive(Clone)]
pub struct ElementStack<Handle> {
    items: Vec<(Handle, QualName)>,
}

impl<Handle: Clone> Default for ElementStack<Handle> {
    fn default() -> Self {
        ElementStack { items: Vec::new() }
    }
}

impl<Handle: Clone> ElementStack<Handle> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: Handle, name: QualName) {
        self.items.push((handle, name));
    }

    pub fn pop(&mut self) -> Option<(Handle, QualName)> {
        self.items.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn top(&self) -> Option<&Handle> {
        self.items.last().map(|(h, _)| h)
    }

    pub fn top_name(&self) -> Option<ExpandedName<'_>> {
        self.items.last().map(|(_, q)| q.expanded())
    }

    pub fn nth_from_top(&self, n: usize) -> Option<&Handle> {
        let len = self.items.len();
        if n >= len {
            None
        } else {
            Some(&self.items[len - 1 - n].0)
        }
    }

    pub fn iter_top_down(&self) -> impl Iterator<Item = &(Handle, QualName)> {
        self.items.iter().rev()
    }

    pub fn contains_html_element_named(&self, local: &LocalName) -> bool {
        self.items
            .iter()
            .any(|(_, q)| q.ns == crate::ns!(html) && &q.local == local)
    }

    /// Remove the first (from the top) occurrence of `predicate`, used by
    /// the adoption agency algorithm and "act as described in the generic
    /// end tag parsing" rules.
    pub fn remove_first_matching(&mut self, mut predicate: impl FnMut(&Handle) -> bool) -> Option<(Handle, QualName)> {
        let idx = self.items.iter().rposition(|(h, _)| predicate(h))?;
        Some(self.items.remove(idx))
    }

    pub fn position_from_top(&self, mut predicate: impl FnMut(&Handle) -> bool) -> Option<usize> {
        let len = self.items.len();
        self.items.iter().rposition(|(h, _)| predicate(h)).map(|idx| len - 1 - idx)
    }

    pub fn pop_until(&mut self, mut predicate: impl FnMut(ExpandedName<'_>) -> bool) {
        while let Some((_, name)) = self.items.last() {
            let matched = predicate(name.expanded());
            if matched {
                self.items.pop();
                break;
            }
            self.items.pop();
        }
    }

    /// "Has an element in *scope*" for the scope kind selected by
    /// `is_boundary`: true if, scanning down from the top, we hit an
    /// element named `target` before hitting one for which `is_boundary`
    /// returns true.
    pub fn has_element_in_scope(&self, target: ExpandedName<'_>, is_boundary: impl Fn(ExpandedName<'_>) -> bool) -> bool {
        for (_, name) in self.items.iter().rev() {
            let expanded = name.expanded();
            if expanded == target {
                return true;
            }
            if is_boundary(expanded) {
                return false;
            }
        }
        false
    }

    pub fn has_numbered_header_in_scope(&self, is_boundary: impl Fn(ExpandedName<'_>) -> bool) -> bool {
        for (_, name) in self.items.iter().rev() {
            let expanded = name.expanded();
            if crate::tree_builder::tag_sets::is_heading(expanded) {
                return true;
            }
            if is_boundary(expanded) {
                return false;
            }
        }
        false
    }

    pub fn remove_handle(&mut self, target: &Handle, same: impl Fn(&Handle, &Handle) -> bool) {
        self.items.retain(|(h, _)| !same(h, target));
    }

    pub fn insert_after(&mut self, anchor_idx_from_top: usize, handle: Handle, name: QualName) {
        let insert_at = self.items.len() - anchor_idx_from_top;
        self.items.insert(insert_at, (handle, name));
    }

    pub fn replace_at_top(&mut self, handle: Handle, name: QualName) {
        if let Some(last) = self.items.last_mut() {
            *last = (handle, name);
        }
    }
}

/// A slot in the list of active formatting elements: either a real
/// formatting element, or a "marker" inserted when entering a new formatting
/// context (e.g. `<table>`'s caption, or each `<button>`-scope boundary).
#[derive(Clone)]
pub enum FormattingEntry<Handle> {
    Marker,
    Element(Handle, Tag),
}

/// The list of active formatting elements plus Noah's Ark clause: no more
/// than 3 equivalent entries (same name, namespace, and attributes) may
/// accumulate between markers, since pathological input like
/// `<b><b><b>...` would otherwise let this list grow without bound.
#[derive(Default)]
pub struct ActiveFormattingElements<Handle> {
    entries: Vec<FormattingEntry<Handle>>,
}

impl<Handle: Clone> ActiveFormattingElements<Handle> {
    pub fn new() -> Self {
        ActiveFormattingElements { entries: Vec::new() }
    }

    pub fn push_marker(&mut self) {
        self.entries.push(FormattingEntry::Marker);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Push a new formatting element, applying the Noah's Ark clause:
    /// remove the earliest duplicate if three already exist since the
    /// last marker.
    pub fn push_element(&mut self, handle: Handle, tag: Tag) {
        let mut matches_seen = Vec::new();
        for (idx, entry) in self.entries.iter().enumerate().rev() {
            match entry {
                FormattingEntry::Marker => break,
                FormattingEntry::Element(_, other) if other.equiv_modulo_attr_order(&tag) => {
                    matches_seen.push(idx);
                },
                FormattingEntry::Element(..) => {},
            }
        }
        if matches_seen.len() >= 3 {
            let earliest = *matches_seen.last().unwrap();
            self.entries.remove(earliest);
        }
        self.entries.push(FormattingEntry::Element(handle, tag));
    }

    pub fn clear_to_last_marker(&mut self) {
        while let Some(entry) = self.entries.pop() {
            if matches!(entry, FormattingEntry::Marker) {
                break;
            }
        }
    }

    pub fn find_handle(&self, mut same: impl FnMut(&Handle) -> bool) -> Option<(usize, Handle, Tag)> {
        for (idx, entry) in self.entries.iter().enumerate().rev() {
            if let FormattingEntry::Element(h, tag) = entry {
                if same(h) {
                    return Some((idx, h.clone(), tag.clone()));
                }
            }
        }
        None
    }

    pub fn find_last_with_name(&self, local: &LocalName) -> Option<(usize, Handle, Tag)> {
        for (idx, entry) in self.entries.iter().enumerate().rev() {
            match entry {
                FormattingEntry::Marker => return None,
                FormattingEntry::Element(h, tag) if &tag.name.local == local => {
                    return Some((idx, h.clone(), tag.clone()));
                },
                FormattingEntry::Element(..) => {},
            }
        }
        None
    }

    pub fn remove_at(&mut self, idx: usize) -> Option<FormattingEntry<Handle>> {
        if idx < self.entries.len() {
            Some(self.entries.remove(idx))
        } else {
            None
        }
    }

    pub fn insert_at(&mut self, idx: usize, handle: Handle, tag: Tag) {
        let idx = idx.min(self.entries.len());
        self.entries.insert(idx, FormattingEntry::Element(handle, tag));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get_entry(&self, idx: usize) -> Option<&FormattingEntry<Handle>> {
        self.entries.get(idx)
    }

    /// "Reconstruct the active formatting elements" needs to walk forward
    /// from the first marker/start to the end, cloning tags as it goes.
    pub fn entries_from(&self, start: usize) -> &[FormattingEntry<Handle>] {
        &self.entries[start..]
    }

    pub fn last_marker_or_start(&self) -> usize {
        self.entries
            .iter()
            .rposition(|e| matches!(e, FormattingEntry::Marker))
            .map(|i| i + 1)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{LocalName, QualName};
    use crate::ns;

    fn name(local: &str) -> QualName {
        QualName::new(None, ns!(html), LocalName::from(local))
    }

    #[test]
    fn element_stack_scope_check() {
        let mut stack: ElementStack<u32> = ElementStack::new();
        stack.push(1, name("html"));
        stack.push(2, name("body"));
        stack.push(3, name("div"));
        let target = name("div");
        assert!(stack.has_element_in_scope(target.expanded(), crate::tree_builder::tag_sets::is_default_scope_boundary));
    }

    #[test]
    fn scope_boundary_stops_scan() {
        let mut stack: ElementStack<u32> = ElementStack::new();
        stack.push(1, name("html"));
        stack.push(2, name("table"));
        stack.push(3, name("div"));
        let target = name("body");
        assert!(!stack.has_element_in_scope(target.expanded(), crate::tree_builder::tag_sets::is_default_scope_boundary));
    }

    #[test]
    fn noahs_ark_clause_caps_duplicates() {
        let mut afe: ActiveFormattingElements<u32> = ActiveFormattingElements::new();
        let tag = Tag {
            kind: crate::tokenizer::interface::TagKind::StartTag,
            name: name("b"),
            self_closing: false,
            attrs: Vec::new(),
        };
        for i in 0..4 {
            afe.push_element(i, tag.clone());
        }
        assert_eq!(afe.len(), 3);
    }
}
