//! # Tree Navigator
//!
//! Leaf utilities shared by every transformation:
//!
//! - document-order walks ([`next_node`], [`previous_node`])
//! - boundary splitting ([`split_container_at`], [`split_ancestor_chain`]),
//!   which turns "a range edge falls mid-element" into "a range edge falls
//!   exactly between two children of the stop ancestor"
//! - boundary movement ([`move_boundaries_up_tree`],
//!   [`move_boundaries_down_tree`])
//! - leaf-block lookup and [`is_at_block_boundary`]
//!
//! A split never produces an empty sibling: splitting at offset 0 or at the
//! container's length reports the existing node as already divided there.

use crate::classify::Classifier;
use crate::tree::{NodeId, Position, Range, Tree};

/// Which end of a block a boundary test looks towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

/// The two halves of a container split at some offset.
///
/// `left` is `None` when the offset was 0 and `right` is `None` when it
/// was the container's length; in both cases nothing was split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
}

impl Split {
    /// Both halves exist, so a fresh node was created.
    pub fn created(&self) -> Option<(NodeId, NodeId)> {
        self.left.zip(self.right)
    }
}

/// Outcome of splitting a whole ancestor chain up to a stop node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainSplit {
    /// First child of the stop node after the boundary, `None` at its end.
    pub boundary: Option<NodeId>,
    /// Every (original, clone) pair created on the way up.
    pub halves: Vec<(NodeId, NodeId)>,
}

/// Divide `position.container` at `position.offset` into two siblings.
///
/// Returns `None` for a container with no parent (the root cannot be split).
pub fn split_container_at(tree: &mut Tree, position: Position) -> Option<Split> {
    let container = position.container;
    tree.parent(container)?;

    let length = tree.len(container);
    if position.offset == 0 {
        return Some(Split {
            left: None,
            right: Some(container),
        });
    }
    if position.offset >= length {
        return Some(Split {
            left: Some(container),
            right: None,
        });
    }

    let right = if tree.is_text(container) {
        tree.split_text(container, position.offset)
    } else {
        let clone = tree.shallow_clone(container);
        if let Some(first) = tree.child_at(container, position.offset) {
            tree.move_children_from(first, clone);
        }
        tree.insert_after(container, clone);
        clone
    };
    tracing::trace!(?container, offset = position.offset, "split container");

    Some(Split {
        left: Some(container),
        right: Some(right),
    })
}

/// Split every container from `position` up to (not including) `stop`.
///
/// Afterwards the stop node's children are cleanly divided into those
/// before and those after the original position.
pub fn split_ancestor_chain(tree: &mut Tree, position: Position, stop: NodeId) -> ChainSplit {
    let mut chain = ChainSplit::default();
    let mut position = position;

    while position.container != stop {
        let Some(parent) = tree.parent(position.container) else {
            break;
        };
        let Some(split) = split_container_at(tree, position) else {
            break;
        };
        if let Some(pair) = split.created() {
            chain.halves.push(pair);
        }
        let offset = match (split.left, split.right) {
            (_, Some(right)) => tree.index_of(right),
            (Some(left), None) => tree.index_of(left) + 1,
            (None, None) => tree.index_of(position.container),
        };
        position = Position::new(parent, offset);
    }

    chain.boundary = tree.child_at(position.container, position.offset);
    chain
}

/// Lift each boundary while it sits at the very start (or end) of its
/// container, so later splits do not create empty wrappers.
pub fn move_boundaries_up_tree(tree: &Tree, range: Range, stop: NodeId) -> Range {
    let mut start = range.start;
    while start.container != stop && start.offset == 0 {
        let Some(before) = Position::before(tree, start.container) else {
            break;
        };
        start = before;
    }

    let mut end = range.end;
    while end.container != stop && end.offset == tree.len(end.container) {
        let Some(after) = Position::after(tree, end.container) else {
            break;
        };
        end = after;
    }

    Range::new(start, end)
}

/// Push each boundary down into the first/last content it addresses.
pub fn move_boundaries_down_tree(tree: &Tree, classifier: &Classifier, range: Range) -> Range {
    let descendable = |node: NodeId| !classifier.is_opaque(tree, node);

    let mut start = range.start;
    while !tree.is_text(start.container) {
        match tree.child_at(start.container, start.offset) {
            Some(child) if descendable(child) => start = Position::start_of(child),
            _ => break,
        }
    }

    let mut end = range.end;
    if end.offset > 0 {
        while !tree.is_text(end.container) && end.offset > 0 {
            match tree.child_at(end.container, end.offset - 1) {
                Some(child) if descendable(child) => end = Position::end_of(tree, child),
                _ => break,
            }
        }
    } else {
        while !tree.is_text(end.container) {
            match tree.first_child(end.container) {
                Some(child) if descendable(child) => end = Position::start_of(child),
                _ => break,
            }
        }
    }

    // A collapsed range must stay collapsed
    if range.is_collapsed() {
        return Range::caret(start);
    }
    Range::new(start, end)
}

/// Next node in pre-order, staying inside `within`.
pub fn next_node(tree: &Tree, node: NodeId, within: NodeId) -> Option<NodeId> {
    if let Some(child) = tree.first_child(node) {
        return Some(child);
    }
    next_outside(tree, node, within)
}

/// Next node in pre-order that is not a descendant of `node`.
pub fn next_outside(tree: &Tree, node: NodeId, within: NodeId) -> Option<NodeId> {
    let mut current = node;
    loop {
        if current == within {
            return None;
        }
        if let Some(sibling) = tree.next_sibling(current) {
            return Some(sibling);
        }
        current = tree.parent(current)?;
    }
}

/// Previous node in pre-order, staying inside `within`.
pub fn previous_node(tree: &Tree, node: NodeId, within: NodeId) -> Option<NodeId> {
    if node == within {
        return None;
    }
    match tree.previous_sibling(node) {
        Some(sibling) => Some(deepest_last(tree, sibling)),
        None => tree.parent(node),
    }
}

fn deepest_last(tree: &Tree, node: NodeId) -> NodeId {
    let mut current = node;
    while let Some(child) = tree.last_child(current) {
        current = child;
    }
    current
}

/// Nearest leaf block enclosing `node` (inclusive), below the root.
pub fn enclosing_leaf_block(tree: &Tree, classifier: &Classifier, node: NodeId) -> Option<NodeId> {
    tree.ancestors(node)
        .take_while(|&ancestor| ancestor != tree.root())
        .find(|&ancestor| classifier.is_leaf_block(tree, ancestor))
}

/// Nearest block-level node enclosing `node` (inclusive), or the root.
pub fn enclosing_block(tree: &Tree, classifier: &Classifier, node: NodeId) -> NodeId {
    tree.ancestors(node)
        .find(|&ancestor| ancestor == tree.root() || classifier.is_block_level(tree, ancestor))
        .unwrap_or(tree.root())
}

/// Leaf block holding the range start, or the first one after it that
/// still begins inside the range.
pub fn start_block_of_range(tree: &Tree, classifier: &Classifier, range: Range) -> Option<NodeId> {
    if let Some(block) = enclosing_leaf_block(tree, classifier, range.start.container) {
        return Some(block);
    }

    let root = tree.root();
    let container = range.start.container;
    let mut candidate = if tree.is_text(container) {
        next_outside(tree, container, root)
    } else {
        match tree.child_at(container, range.start.offset) {
            Some(child) => Some(child),
            None => next_outside(tree, container, root),
        }
    };

    while let Some(node) = candidate {
        if classifier.is_leaf_block(tree, node) {
            let begins = Position::before(tree, node)?;
            let inside = tree.compare_positions(begins, range.end).is_lt() || range.is_collapsed();
            return inside.then_some(node);
        }
        candidate = next_node(tree, node, root);
    }
    None
}

/// Leaf block holding the range end, or the last one before it that still
/// ends inside the range.
pub fn end_block_of_range(tree: &Tree, classifier: &Classifier, range: Range) -> Option<NodeId> {
    if let Some(block) = enclosing_leaf_block(tree, classifier, range.end.container) {
        return Some(block);
    }
    if range.is_collapsed() {
        return start_block_of_range(tree, classifier, range);
    }

    let root = tree.root();
    let container = range.end.container;
    let mut candidate = if tree.is_text(container) || range.end.offset == 0 {
        previous_node(tree, container, root)
    } else {
        tree.child_at(container, range.end.offset - 1)
            .map(|child| deepest_last(tree, child))
    };

    while let Some(node) = candidate {
        if classifier.is_leaf_block(tree, node) {
            let ends = Position::after(tree, node)?;
            let inside =
                tree.compare_positions(ends, range.start).is_gt() || range.is_collapsed();
            return inside.then_some(node);
        }
        candidate = previous_node(tree, node, root);
    }
    None
}

/// True when nothing but empty markup separates `position` from the start
/// (or end) of its nearest enclosing block.
pub fn is_at_block_boundary(
    tree: &Tree,
    classifier: &Classifier,
    position: Position,
    edge: Edge,
) -> bool {
    let container = position.container;
    let block = enclosing_block(tree, classifier, container);

    if let Some(text) = tree.text(container) {
        let length = text.chars().count();
        let clear = match edge {
            Edge::Start => position.offset == 0,
            Edge::End => position.offset >= length,
        };
        if !clear {
            return false;
        }
    } else {
        let mut inner = tree.children(container).enumerate();
        let has_content = match edge {
            Edge::Start => inner.any(|(i, child)| {
                i < position.offset && classifier.has_content(tree, child)
            }),
            Edge::End => inner.any(|(i, child)| {
                i >= position.offset && classifier.has_content(tree, child)
            }),
        };
        if has_content {
            return false;
        }
    }

    for node in tree.ancestors(container).take_while(|&node| node != block) {
        let mut current = match edge {
            Edge::Start => tree.previous_sibling(node),
            Edge::End => tree.next_sibling(node),
        };
        while let Some(sibling) = current {
            if classifier.has_content(tree, sibling) {
                return false;
            }
            current = match edge {
                Edge::Start => tree.previous_sibling(sibling),
                Edge::End => tree.next_sibling(sibling),
            };
        }
    }
    true
}
