mod printing;
mod updating;

use core::cmp::Ordering;
use indextree::{Arena, NodeId};
use smallvec::SmallVec;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeKind {
    #[default]
    Document,
    Element { tag: String },
    Text { text: String },
    Comment { text: String },
}

#[derive(Debug, Clone, Default)]
pub struct DOMNode {
    pub kind: NodeKind,
    pub attrs: SmallVec<(String, String), 4>,
}

impl DOMNode {
    /// Element tag in lowercase, or `None` for non-element nodes.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag } => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate the whitespace-separated tokens of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|token| token == class)
    }
}

/// Arena-backed document tree. Node order among siblings is source order.
pub struct DOM {
    dom: Arena<DOMNode>,
    root: NodeId,
}

impl Default for DOM {
    fn default() -> Self {
        Self::new()
    }
}

impl DOM {
    pub fn new() -> Self {
        let mut dom = Arena::new();
        Self {
            root: dom.new_node(DOMNode::default()),
            dom,
        }
    }

    /// The `#document` node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&DOMNode> {
        self.dom
            .get(id)
            .filter(|node| !node.is_removed())
            .map(indextree::Node::get)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut DOMNode> {
        self.dom
            .get_mut(id)
            .filter(|node| !node.is_removed())
            .map(indextree::Node::get_mut)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(DOMNode::tag)
    }

    pub fn is_element(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).and_then(|node| node.attr(name))
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.node(id).is_some_and(|node| node.has_class(class))
    }

    /// First class token, which the page conventions use as a block name.
    pub fn first_class(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(|node| node.classes().next())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.dom.get(id).and_then(indextree::Node::parent)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        id.children(&self.dom).collect()
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        id.children(&self.dom)
            .filter(|child| self.tag(*child).is_some())
            .collect()
    }

    /// Descendants of `scope` in document order, excluding `scope` itself.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        scope.descendants(&self.dom).skip(1).collect()
    }

    /// Whether the node is still attached beneath the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.node(id).is_some() && id.ancestors(&self.dom).any(|ancestor| ancestor == self.root)
    }

    pub fn first_by_tag(&self, scope: NodeId, tag: &str) -> Option<NodeId> {
        scope
            .descendants(&self.dom)
            .skip(1)
            .find(|id| self.is_element(*id, tag))
    }

    pub fn all_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        scope
            .descendants(&self.dom)
            .skip(1)
            .filter(|id| self.is_element(*id, tag))
            .collect()
    }

    pub fn first_by_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        scope
            .descendants(&self.dom)
            .skip(1)
            .find(|id| self.has_class(*id, class))
    }

    pub fn all_by_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        scope
            .descendants(&self.dom)
            .skip(1)
            .filter(|id| self.has_class(*id, class))
            .collect()
    }

    /// Element with the given `id` attribute anywhere in the document.
    pub fn element_by_id(&self, element_id: &str) -> Option<NodeId> {
        if element_id.is_empty() {
            return None;
        }
        self.root
            .descendants(&self.dom)
            .find(|id| self.attr(*id, "id") == Some(element_id))
    }

    /// First element beneath `scope` with `tag` whose attribute `name` equals `value`.
    pub fn first_with_attr(
        &self,
        scope: NodeId,
        tag: &str,
        name: &str,
        value: &str,
    ) -> Option<NodeId> {
        scope
            .descendants(&self.dom)
            .skip(1)
            .find(|id| self.is_element(*id, tag) && self.attr(*id, name) == Some(value))
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        id.descendants(&self.dom)
            .filter_map(|node| match self.node(node).map(|data| &data.kind) {
                Some(NodeKind::Text { text }) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Relative position of two attached nodes in a pre-order walk of the tree.
    ///
    /// Returns `Ordering::Less` when `first` comes before `second` in document order.
    pub fn compare_document_position(&self, first: NodeId, second: NodeId) -> Ordering {
        if first == second {
            return Ordering::Equal;
        }
        for id in self.root.descendants(&self.dom) {
            if id == first {
                return Ordering::Less;
            }
            if id == second {
                return Ordering::Greater;
            }
        }
        Ordering::Equal
    }

    /// Shorthand for `compare_document_position(first, second) == Less`.
    pub fn precedes(&self, first: NodeId, second: NodeId) -> bool {
        self.compare_document_position(first, second) == Ordering::Less
    }
}
