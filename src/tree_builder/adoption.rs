// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

//! The adoption agency algorithm: repairs misnested formatting elements
//! like `<b><p></b>Bold</p>` by relocating elements in the open-elements
//! stack and active-formatting list rather than leaving them stuck where
//! the naive "whatever's on top gets the next child" insertion would put
//! them.

use log::debug;

use crate::interface::LocalName;
use crate::tree_builder::interface::{NodeOrText, TreeSink};
use crate::tree_builder::stack::FormattingEntry;
use crate::tree_builder::TreeBuilder;

const OUTER_LOOP_LIMIT: usize = 8;
const INNER_LOOP_LIMIT: usize = 3;

impl<Sink: TreeSink> TreeBuilder<Sink> {
    /// <https://html.spec.whatwg.org/multipage/#adoption-agency-algorithm>,
    /// entered from the "in body" end-tag rule for a formatting element
    /// name (`a`, `b`, `i`, `code`, …).
    pub(crate) fn adoption_agency(&mut self, subject: &LocalName) {
        for _ in 0..OUTER_LOOP_LIMIT {
            let (fmt_idx, formatting_handle, formatting_tag) = match self.active_formatting.find_last_with_name(subject) {
                Some(found) => found,
                None => {
                    // Not in the list at all: handled as "any other end tag" by the caller.
                    return;
                },
            };

            if !self
                .open_elements
                .iter_top_down()
                .any(|(h, _)| self.sink.same_node(h, &formatting_handle))
            {
                debug!("adoption agency: formatting element not in open elements, dropping from active list");
                self.active_formatting.remove_at(fmt_idx);
                return;
            }

            let formatting_expanded_name = formatting_tag.name.expanded();
            if !self
                .open_elements
                .has_element_in_scope(formatting_expanded_name, crate::tree_builder::tag_sets::is_default_scope_boundary)
            {
                self.parse_error_now();
                return;
            }

            if !self.sink.same_node(self.open_elements.top().unwrap(), &formatting_handle) {
                self.parse_error_now();
            }

            let formatting_stack_idx = match self
                .open_elements
                .position_from_top(|h| self.sink.same_node(h, &formatting_handle))
            {
                Some(idx) => idx,
                None => return,
            };

            // Find the furthest block: the topmost (closest to document
            // root but still above the formatting element) special-
            // category element above it on the stack.
            let mut furthest_block: Option<(usize, Sink::Handle)> = None;
            for depth in (0..formatting_stack_idx).rev() {
                if let Some(handle) = self.open_elements.nth_from_top(depth) {
                    let name = self.sink.elem_name(handle);
                    if crate::tree_builder::tag_sets::is_special(name) {
                        furthest_block = Some((depth, handle.clone()));
                    }
                }
            }

            let (furthest_block_depth, furthest_block) = match furthest_block {
                None => {
                    // No furthest block: pop everything down to and
                    // including the formatting element and drop it from
                    // the active list.
                    for _ in 0..=formatting_stack_idx {
                        self.open_elements.pop();
                    }
                    self.active_formatting.remove_at(fmt_idx);
                    return;
                },
                Some(fb) => fb,
            };

            let common_ancestor = self
                .open_elements
                .nth_from_top(formatting_stack_idx + 1)
                .cloned()
                .unwrap_or_else(|| self.open_elements.top().unwrap().clone());

            let mut node = furthest_block.clone();
            let mut node_depth = furthest_block_depth;
            let mut last_node = furthest_block.clone();
            let bookmark_tag = formatting_tag.clone();

            for _ in 0..INNER_LOOP_LIMIT {
                if node_depth + 1 >= self.open_elements.len() {
                    break;
                }
                node_depth += 1;
                node = match self.open_elements.nth_from_top(node_depth) {
                    Some(h) => h.clone(),
                    None => break,
                };
                if self.sink.same_node(&node, &formatting_handle) {
                    break;
                }

                let node_in_active_list = self.active_formatting.find_handle(|h| self.sink.same_node(h, &node));
                match node_in_active_list {
                    None => {
                        self.open_elements.remove_handle(&node, |a, b| self.sink.same_node(a, b));
                        continue;
                    },
                    Some((node_afe_idx, _, node_tag)) => {
                        let new_node = self.sink.create_element(node_tag.name.clone(), node_tag.attrs.clone(), Default::default());
                        self.active_formatting.remove_at(node_afe_idx);
                        self.active_formatting.insert_at(node_afe_idx, new_node.clone(), node_tag.clone());
                        self.replace_on_open_elements(&node, new_node.clone(), node_tag.name.clone());
                        self.sink.remove_from_parent(&last_node);
                        self.sink.append(&new_node, NodeOrText::AppendNode(last_node.clone()));
                        last_node = new_node;
                    },
                }
            }

            self.sink.remove_from_parent(&last_node);
            self.insert_node_foster_aware(&common_ancestor, NodeOrText::AppendNode(last_node.clone()));

            let new_formatting_handle = self.sink.create_element(bookmark_tag.name.clone(), bookmark_tag.attrs.clone(), Default::default());
            self.sink.reparent_children(&furthest_block, &new_formatting_handle);
            self.sink.append(&furthest_block, NodeOrText::AppendNode(new_formatting_handle.clone()));

            self.active_formatting.remove_at(fmt_idx);
            let reinsert_idx = self
                .active_formatting
                .find_handle(|h| self.sink.same_node(h, &last_node))
                .map(|(idx, _, _)| idx + 1)
                .unwrap_or(self.active_formatting.len());
            self.active_formatting.insert_at(reinsert_idx.min(self.active_formatting.len()), new_formatting_handle.clone(), bookmark_tag.clone());

            self.open_elements.remove_handle(&formatting_handle, |a, b| self.sink.same_node(a, b));
            let furthest_block_idx = self
                .open_elements
                .position_from_top(|h| self.sink.same_node(h, &furthest_block))
                .unwrap_or(0);
            self.open_elements.insert_after(furthest_block_idx, new_formatting_handle, bookmark_tag.name);
        }
        // All eight outer iterations ran without one of the early returns
        // above finding a clean terminating condition (formatting element
        // dropped, not in scope, no furthest block, …): the bound exists
        // precisely to cut off this case.
        self.report_error(crate::tokenizer::interface::ParseErrorCode::AdoptionAgencyAlgorithmRunTooManyTimes);
    }

    fn replace_on_open_elements(&mut self, old: &Sink::Handle, new: Sink::Handle, name: crate::interface::QualName) {
        if let Some(idx) = self.open_elements.position_from_top(|h| self.sink.same_node(h, old)) {
            // Rebuild by popping down to idx and pushing back, since
            // `ElementStack` doesn't expose direct indexed mutation by
            // design (it only grows/shrinks from the top).
            let mut popped = Vec::new();
            for _ in 0..idx {
                if let Some(entry) = self.open_elements.pop() {
                    popped.push(entry);
                }
            }
            self.open_elements.pop();
            self.open_elements.push(new, name);
            while let Some((h, n)) = popped.pop() {
                self.open_elements.push(h, n);
            }
        }
    }
}
