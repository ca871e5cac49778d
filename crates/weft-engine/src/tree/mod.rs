//! # Document Tree
//!
//! The editable document lives in a single [`indextree::Arena`]. Nodes are
//! addressed by [`NodeId`] handles rather than references, so splitting and
//! merging never leaves a dangling pointer behind: a handle into a slot that
//! has since been freed is reported by [`Tree::is_live`] instead of silently
//! aliasing another node.
//!
//! The root is a synthetic `body` element standing for the editable body.
//! Every other node is either a [`NodeData::Text`] leaf or a
//! [`NodeData::Element`] with ordered children.
//!
//! Offsets inside text nodes count chars, not bytes.

pub mod navigator;
pub mod position;

use std::collections::BTreeMap;

use indextree::Arena;
pub use indextree::NodeId;

pub use position::{Position, Range};

/// Tag of the synthetic root element.
pub const ROOT_TAG: &str = "body";

/// Tag name plus attributes of an element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attributes(tag: impl Into<String>, attributes: BTreeMap<String, String>) -> Self {
        Self {
            attributes,
            ..Self::new(tag)
        }
    }

    /// Two elements are alike when tag and attributes both match.
    pub fn is_alike(&self, other: &Element) -> bool {
        self == other
    }
}

/// What each arena slot holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Text(String),
    Element(Element),
}

/// An editable document: the arena plus its root.
#[derive(Debug, Clone)]
pub struct Tree {
    arena: Arena<NodeData>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree holding only an empty root.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(NodeData::Element(Element::new(ROOT_TAG)));
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // ============ Node creation ============

    pub fn new_text(&mut self, text: impl Into<String>) -> NodeId {
        self.arena.new_node(NodeData::Text(text.into()))
    }

    pub fn new_element(&mut self, element: Element) -> NodeId {
        self.arena.new_node(NodeData::Element(element))
    }

    /// Create a detached element with the same tag and attributes as `id`.
    pub fn shallow_clone(&mut self, id: NodeId) -> NodeId {
        let data = self.data(id).clone();
        let data = match data {
            NodeData::Text(_) => NodeData::Text(String::new()),
            element => element,
        };
        self.arena.new_node(data)
    }

    // ============ Node access ============

    pub fn data(&self, id: NodeId) -> &NodeData {
        self.arena[id].get()
    }

    pub fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.arena[id].get_mut()
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.data(id) {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.tag.as_str())
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Text(text) => Some(text),
            NodeData::Element(_) => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Text(_))
    }

    /// Length used by positions: child count for elements, char count for text.
    pub fn len(&self, id: NodeId) -> usize {
        match self.data(id) {
            NodeData::Text(text) => text.chars().count(),
            NodeData::Element(_) => self.child_count(id),
        }
    }

    /// Concatenated text of every text node under `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        id.descendants(&self.arena)
            .filter_map(|node| self.text(node))
            .collect()
    }

    // ============ Structure ============

    /// False once the slot behind `id` has been freed (or reused).
    pub fn is_live(&self, id: NodeId) -> bool {
        self.arena.get(id).is_some() && !id.is_removed(&self.arena)
    }

    /// Live and reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.is_live(id) && self.ancestors(id).any(|ancestor| ancestor == self.root)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].first_child()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].last_child()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].next_sibling()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].previous_sibling()
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// Pre-order walk of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.descendants(&self.arena)
    }

    /// `id` itself followed by each ancestor up to the arena root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.ancestors(&self.arena)
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        id.children(&self.arena).count()
    }

    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        id.children(&self.arena).nth(index)
    }

    /// Index of `id` among its siblings.
    pub fn index_of(&self, id: NodeId) -> usize {
        id.preceding_siblings(&self.arena).count() - 1
    }

    /// `ancestor` is `node` or one of its ancestors.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|candidate| candidate == ancestor)
    }

    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let chain: Vec<NodeId> = self.ancestors(a).collect();
        self.ancestors(b).find(|candidate| chain.contains(candidate))
    }

    /// Child indices leading from the root down to `id`.
    pub fn path_from_root(&self, id: NodeId) -> Vec<usize> {
        let mut path: Vec<usize> = self
            .ancestors(id)
            .take_while(|&node| node != self.root)
            .map(|node| self.index_of(node))
            .collect();
        path.reverse();
        path
    }

    /// Elements with the given tag, in document order.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .filter(|&node| self.tag(node).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
            .collect()
    }

    /// Text nodes under `id`, in document order.
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .filter(|&node| self.is_text(node))
            .collect()
    }

    // ============ Mutation ============

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        parent.append(child, &mut self.arena);
    }

    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        reference.insert_before(node, &mut self.arena);
    }

    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        reference.insert_after(node, &mut self.arena);
    }

    /// Unlink `id` (with its subtree) from its parent and siblings.
    pub fn detach(&mut self, id: NodeId) {
        id.detach(&mut self.arena);
    }

    /// Free `id` and everything below it.
    pub fn remove_subtree(&mut self, id: NodeId) {
        id.remove_subtree(&mut self.arena);
    }

    /// Detach and return every child of `id`, in order.
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children: Vec<NodeId> = self.children(id).collect();
        for &child in &children {
            self.detach(child);
        }
        children
    }

    /// Move the children of `from` starting at `first` to the end of `to`.
    pub fn move_children_from(&mut self, first: NodeId, to: NodeId) {
        let mut current = Some(first);
        while let Some(node) = current {
            current = self.next_sibling(node);
            self.detach(node);
            self.append(to, node);
        }
    }

    /// Replace `id` by its children, returning them in order.
    pub fn unwrap_node(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = self.take_children(id);
        for &child in &children {
            self.insert_before(id, child);
        }
        self.remove_subtree(id);
        children
    }

    pub fn append_text(&mut self, id: NodeId, extra: &str) {
        if let NodeData::Text(text) = self.data_mut(id) {
            text.push_str(extra);
        }
    }

    /// Split a text node at a char offset; the right part becomes a new
    /// sibling inserted after `id` and is returned.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> NodeId {
        let right = match self.data_mut(id) {
            NodeData::Text(text) => {
                let byte = char_to_byte(text, offset);
                text.split_off(byte)
            }
            NodeData::Element(_) => String::new(),
        };
        let right = self.new_text(right);
        self.insert_after(id, right);
        right
    }
}

/// Byte index of the `offset`-th char, clamped to the end of the string.
pub(crate) fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}
