//! # Tree Normalizer
//!
//! Cleanup that runs after every structural transformation:
//!
//! 1. Empty text nodes go away, and so do elements the transformation left
//!    without children (except the placeholder block that keeps the body
//!    from becoming empty).
//! 2. A table-structural wrapper the transformation left without rows is
//!    replaced by the content it still holds.
//! 3. Adjacent text nodes merge, and adjacent alike elements merge when both
//!    are halves of a boundary split.
//!
//! Only nodes recorded in [`Touched`] are ever removed or merged as
//! elements, so markup outside the transformed span serializes exactly as it
//! did before. Every range the caller passes is carried through each step.

use std::collections::HashSet;

use crate::classify::Classifier;
use crate::tree::{NodeId, Position, Range, Tree};

/// Nodes created or split by the transformation in progress.
#[derive(Debug, Clone, Default)]
pub struct Touched {
    halves: HashSet<NodeId>,
    created: HashSet<NodeId>,
}

impl Touched {
    pub fn record_split(&mut self, left: NodeId, right: NodeId) {
        self.halves.insert(left);
        self.halves.insert(right);
    }

    pub fn record_splits(&mut self, pairs: &[(NodeId, NodeId)]) {
        for &(left, right) in pairs {
            self.record_split(left, right);
        }
    }

    pub fn record_created(&mut self, id: NodeId) {
        self.created.insert(id);
    }

    pub fn is_split_half(&self, id: NodeId) -> bool {
        self.halves.contains(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.halves.contains(&id) || self.created.contains(&id)
    }
}

/// Normalize everything below `scope`, keeping each of `ranges` valid.
pub fn normalize(
    tree: &mut Tree,
    classifier: &Classifier,
    scope: NodeId,
    touched: &Touched,
    ranges: &mut [Range],
) {
    normalize_children(tree, classifier, scope, touched, ranges);
    if let Some(block) = insert_placeholder(tree, classifier) {
        for range in ranges.iter_mut() {
            *range = Range::caret(Position::start_of(block));
        }
    }
}

/// Give an empty body its placeholder block.
pub fn ensure_placeholder(tree: &mut Tree, classifier: &Classifier, range: &mut Range) {
    if let Some(block) = insert_placeholder(tree, classifier) {
        *range = Range::caret(Position::start_of(block));
    }
}

fn insert_placeholder(tree: &mut Tree, classifier: &Classifier) -> Option<NodeId> {
    let root = tree.root();
    if tree.first_child(root).is_some() {
        return None;
    }
    let block = tree.new_element(classifier.canonical_element());
    tree.append(root, block);
    tracing::trace!(?block, "inserted placeholder block");
    Some(block)
}

fn map_all(ranges: &mut [Range], mut f: impl FnMut(Position) -> Position) {
    for range in ranges.iter_mut() {
        range.map(&mut f);
    }
}

fn normalize_children(
    tree: &mut Tree,
    classifier: &Classifier,
    parent: NodeId,
    touched: &Touched,
    ranges: &mut [Range],
) {
    let elements: Vec<NodeId> = tree
        .children(parent)
        .filter(|&child| !tree.is_text(child))
        .collect();
    for element in elements {
        normalize_children(tree, classifier, element, touched, ranges);
    }

    let children: Vec<NodeId> = tree.children(parent).collect();
    for child in children {
        if is_removable(tree, classifier, child, touched) {
            remove_tracked(tree, child, ranges);
        } else if touched.contains(child) && is_rowless_table(tree, classifier, child) {
            collapse_table(tree, classifier, child, ranges);
        }
    }

    let mut current = tree.last_child(parent);
    while let Some(child) = current {
        let previous = tree.previous_sibling(child);
        if let Some(prev) = previous {
            if tree.is_text(prev) && tree.is_text(child) {
                merge_text(tree, prev, child, ranges);
            } else if are_mergeable_halves(tree, classifier, prev, child, touched) {
                merge_elements(tree, prev, child, ranges);
                normalize_children(tree, classifier, prev, touched, ranges);
            }
        }
        current = previous;
    }
}

fn is_removable(tree: &Tree, classifier: &Classifier, node: NodeId, touched: &Touched) -> bool {
    if let Some(text) = tree.text(node) {
        return text.is_empty();
    }
    touched.contains(node)
        && !classifier.is_opaque(tree, node)
        && tree.first_child(node).is_none()
        && !is_placeholder(tree, classifier, node)
}

/// The lone canonical block of an otherwise empty body.
fn is_placeholder(tree: &Tree, classifier: &Classifier, node: NodeId) -> bool {
    let root = tree.root();
    tree.parent(node) == Some(root)
        && tree.child_count(root) == 1
        && classifier.is_canonical_block(tree, node)
}

fn is_rowless_table(tree: &Tree, classifier: &Classifier, node: NodeId) -> bool {
    matches!(tree.tag(node), Some("table" | "tbody" | "thead" | "tfoot"))
        && classifier.is_table_structural(tree, node)
        && !tree
            .descendants(node)
            .any(|descendant| tree.tag(descendant) == Some("tr"))
}

fn are_mergeable_halves(
    tree: &Tree,
    classifier: &Classifier,
    prev: NodeId,
    child: NodeId,
    touched: &Touched,
) -> bool {
    if !touched.is_split_half(prev) || !touched.is_split_half(child) {
        return false;
    }
    if classifier.is_opaque(tree, prev) {
        return false;
    }
    match (tree.element(prev), tree.element(child)) {
        (Some(a), Some(b)) => a.is_alike(b),
        _ => false,
    }
}

fn remove_tracked(tree: &mut Tree, node: NodeId, ranges: &mut [Range]) {
    let Some(parent) = tree.parent(node) else {
        return;
    };
    let index = tree.index_of(node);
    map_all(ranges, |p| {
        if tree.contains(node, p.container) {
            Position::new(parent, index)
        } else if p.container == parent && p.offset > index {
            Position::new(parent, p.offset - 1)
        } else {
            p
        }
    });
    tracing::trace!(?node, "removed empty node");
    tree.remove_subtree(node);
}

fn merge_text(tree: &mut Tree, prev: NodeId, child: NodeId, ranges: &mut [Range]) {
    let Some(parent) = tree.parent(child) else {
        return;
    };
    let index = tree.index_of(child);
    let prev_len = tree.len(prev);
    map_all(ranges, |p| shift_into_previous(p, parent, prev, child, index, prev_len));

    let text = tree.text(child).unwrap_or_default().to_string();
    tree.append_text(prev, &text);
    tree.remove_subtree(child);
}

fn merge_elements(tree: &mut Tree, prev: NodeId, child: NodeId, ranges: &mut [Range]) {
    let Some(parent) = tree.parent(child) else {
        return;
    };
    let index = tree.index_of(child);
    let prev_len = tree.child_count(prev);
    map_all(ranges, |p| shift_into_previous(p, parent, prev, child, index, prev_len));

    if let Some(first) = tree.first_child(child) {
        tree.move_children_from(first, prev);
    }
    tracing::trace!(?prev, ?child, "merged split halves");
    tree.remove_subtree(child);
}

/// Where `p` lands once `child` (at `index` under `parent`) is folded into
/// its previous sibling `prev`, whose length is `prev_len`.
fn shift_into_previous(
    p: Position,
    parent: NodeId,
    prev: NodeId,
    child: NodeId,
    index: usize,
    prev_len: usize,
) -> Position {
    if p.container == child {
        Position::new(prev, p.offset + prev_len)
    } else if p.container == parent && p.offset > index {
        Position::new(parent, p.offset - 1)
    } else if p.container == parent && p.offset == index {
        Position::new(prev, prev_len)
    } else {
        p
    }
}

/// Replace a row-less table wrapper by the content it still holds, wrapping
/// loose inline runs so only blocks land in its place.
fn collapse_table(tree: &mut Tree, classifier: &Classifier, table: NodeId, ranges: &mut [Range]) {
    let Some(parent) = tree.parent(table) else {
        return;
    };
    let index = tree.index_of(table);

    let mut survivors = Vec::new();
    collect_survivors(tree, classifier, table, &mut survivors);
    let blocks = wrap_inline_runs(tree, classifier, survivors, |_| {});

    map_all(ranges, |p| {
        let kept = blocks.iter().any(|&block| tree.contains(block, p.container));
        if tree.contains(table, p.container) && !kept {
            Position::new(parent, index)
        } else if p.container == parent && p.offset > index {
            Position::new(parent, p.offset - 1 + blocks.len())
        } else {
            p
        }
    });

    for &block in &blocks {
        tree.insert_before(table, block);
    }
    tracing::trace!(?table, blocks = blocks.len(), "collapsed row-less table");
    tree.remove_subtree(table);
}

fn collect_survivors(tree: &Tree, classifier: &Classifier, node: NodeId, out: &mut Vec<NodeId>) {
    for child in tree.children(node) {
        if classifier.is_table_structural(tree, child) {
            collect_survivors(tree, classifier, child, out);
        } else {
            out.push(child);
        }
    }
}

/// Wrap each maximal run of non-block nodes in a fresh canonical block,
/// leaving block-level nodes as they are. `on_create` sees every new block.
pub(crate) fn wrap_inline_runs(
    tree: &mut Tree,
    classifier: &Classifier,
    nodes: Vec<NodeId>,
    mut on_create: impl FnMut(NodeId),
) -> Vec<NodeId> {
    let mut blocks = Vec::new();
    let mut run: Vec<NodeId> = Vec::new();
    for node in nodes {
        if classifier.is_block_level(tree, node) {
            if let Some(block) = wrap_run(tree, classifier, &mut run) {
                on_create(block);
                blocks.push(block);
            }
            blocks.push(node);
        } else {
            run.push(node);
        }
    }
    if let Some(block) = wrap_run(tree, classifier, &mut run) {
        on_create(block);
        blocks.push(block);
    }
    blocks
}

fn wrap_run(tree: &mut Tree, classifier: &Classifier, run: &mut Vec<NodeId>) -> Option<NodeId> {
    if run.is_empty() {
        return None;
    }
    let block = tree.new_element(classifier.canonical_element());
    for node in run.drain(..) {
        tree.append(block, node);
    }
    Some(block)
}
