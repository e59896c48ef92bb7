//! In-place mutation of the document tree.
//!
//! Every structural operation keeps sibling order intact; moving an attached node
//! detaches it from its old parent first, so ownership always transfers.

use super::{DOM, DOMNode, NodeKind};
use crate::parser::parse_document;
use anyhow::{Error, anyhow};
use indextree::NodeId;
use smallvec::SmallVec;

impl DOM {
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.dom.new_node(DOMNode {
            kind: NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
            },
            attrs: SmallVec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.dom.new_node(DOMNode {
            kind: NodeKind::Text {
                text: text.to_owned(),
            },
            attrs: SmallVec::new(),
        })
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.dom.new_node(DOMNode {
            kind: NodeKind::Comment {
                text: text.to_owned(),
            },
            attrs: SmallVec::new(),
        })
    }

    /// Append `child` as the last child of `parent`, moving it if already attached.
    ///
    /// # Errors
    /// Returns an error if the move would create a cycle or either node was removed.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), Error> {
        child.detach(&mut self.dom);
        parent
            .checked_append(child, &mut self.dom)
            .map_err(|err| anyhow!("cannot append {child:?} to {parent:?}: {err:?}"))
    }

    /// Insert `child` as the first child of `parent`, moving it if already attached.
    ///
    /// # Errors
    /// Returns an error if the move would create a cycle or either node was removed.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), Error> {
        child.detach(&mut self.dom);
        parent
            .checked_prepend(child, &mut self.dom)
            .map_err(|err| anyhow!("cannot prepend {child:?} to {parent:?}: {err:?}"))
    }

    /// Insert `node` immediately before `sibling`.
    ///
    /// # Errors
    /// Returns an error if `sibling` has no parent or the move would create a cycle.
    pub fn insert_before(&mut self, sibling: NodeId, node: NodeId) -> Result<(), Error> {
        if self.parent(sibling).is_none() {
            return Err(anyhow!("cannot insert before detached node {sibling:?}"));
        }
        node.detach(&mut self.dom);
        sibling
            .checked_insert_before(node, &mut self.dom)
            .map_err(|err| anyhow!("cannot insert {node:?} before {sibling:?}: {err:?}"))
    }

    /// Detach a node (and its subtree) from its parent. The subtree stays usable.
    pub fn detach(&mut self, node: NodeId) {
        node.detach(&mut self.dom);
    }

    /// Remove a node and its whole subtree from the arena.
    pub fn remove(&mut self, node: NodeId) {
        node.remove_subtree(&mut self.dom);
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(data) = self.node_mut(node) else {
            return;
        };
        match data.attrs.iter().position(|attr| attr.0 == name) {
            Some(index) => value.clone_into(&mut data.attrs[index].1),
            None => data.attrs.push((name.to_owned(), value.to_owned())),
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(data) = self.node_mut(node) {
            data.attrs.retain(|attr| attr.0 != name);
        }
    }

    /// Add a class token if it is not already present.
    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if class.is_empty() || self.has_class(node, class) {
            return;
        }
        let joined = match self.attr(node, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_owned(),
        };
        self.set_attr(node, "class", &joined);
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        let Some(data) = self.node(node) else {
            return;
        };
        let remaining: Vec<&str> = data.classes().filter(|token| *token != class).collect();
        let joined = remaining.join(" ");
        self.set_attr(node, "class", &joined);
    }

    /// Replace all children with a single text node.
    ///
    /// # Errors
    /// Returns an error if `node` was removed from the arena.
    pub fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<(), Error> {
        for child in self.children(node) {
            self.remove(child);
        }
        let text_node = self.create_text(text);
        self.append_child(node, text_node)
    }

    /// Parse `markup` as body content and append the resulting nodes under `parent`.
    ///
    /// Returns the top-level nodes that were appended, in order.
    ///
    /// # Errors
    /// Returns an error if the markup cannot be parsed or appended.
    pub fn append_html(&mut self, parent: NodeId, markup: &str) -> Result<Vec<NodeId>, Error> {
        let fragment = parse_document(markup)?;
        let Some(body) = fragment.first_by_tag(fragment.root(), "body") else {
            return Ok(Vec::new());
        };
        let mut appended = Vec::new();
        for child in fragment.children(body) {
            let imported = self.import_subtree(&fragment, child)?;
            self.append_child(parent, imported)?;
            appended.push(imported);
        }
        Ok(appended)
    }

    /// Deep-copy a subtree from another document into this arena (unattached).
    fn import_subtree(&mut self, source: &Self, node: NodeId) -> Result<NodeId, Error> {
        let data = source
            .node(node)
            .ok_or_else(|| anyhow!("source node {node:?} was removed"))?
            .clone();
        let copy = self.dom.new_node(data);
        for child in source.children(node) {
            let imported = self.import_subtree(source, child)?;
            self.append_child(copy, imported)?;
        }
        Ok(copy)
    }
}
