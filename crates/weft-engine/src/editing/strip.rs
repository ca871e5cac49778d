//! # Format-Stripper
//!
//! Removes every inline style and block style from the part of the tree a
//! [`Range`] covers. The range edges are first turned into clean child
//! boundaries of a single stop ancestor by splitting whatever element they
//! fall inside; the nodes between those boundaries are then lifted out,
//! cleaned, and put back. The remainders of partially covered elements keep
//! their original wrappers.

use crate::classify::{Category, Classifier};
use crate::editing::normalize::{Touched, normalize, wrap_inline_runs};
use crate::error::EditError;
use crate::tree::navigator::{
    Edge, enclosing_leaf_block, is_at_block_boundary, move_boundaries_down_tree,
    move_boundaries_up_tree, split_ancestor_chain,
};
use crate::tree::{NodeId, Position, Range, Tree};

/// Strip formatting from everything inside `range`, returning the range
/// covering the same content afterwards.
pub fn remove_all_formatting(
    tree: &mut Tree,
    classifier: &Classifier,
    range: Range,
) -> Result<Range, EditError> {
    remove_all_formatting_tracking(tree, classifier, range, &mut [])
}

/// [`remove_all_formatting`], also carrying each of `tracked` through the
/// edit so it keeps addressing the same content.
pub fn remove_all_formatting_tracking(
    tree: &mut Tree,
    classifier: &Classifier,
    range: Range,
    tracked: &mut [Range],
) -> Result<Range, EditError> {
    tree.validate_range(range)?;
    for &other in tracked.iter() {
        tree.validate_range(other)?;
    }
    if range.is_collapsed() {
        return Ok(range);
    }

    let (stop, range) = stop_ancestor(tree, classifier, range);
    let range = Range::new(
        lift_out_of_opaque(tree, classifier, range.start, stop, false),
        lift_out_of_opaque(tree, classifier, range.end, stop, true),
    );
    let range = move_boundaries_up_tree(tree, range, stop);
    tracing::debug!(?stop, ?range, "removing formatting");

    let mut touched = Touched::default();
    let end = split_ancestor_chain(tree, range.end, stop);
    touched.record_splits(&end.halves);
    follow_splits(tree, &end.halves, tracked);
    let start = split_ancestor_chain(tree, range.start, stop);
    touched.record_splits(&start.halves);
    follow_splits(tree, &start.halves, tracked);

    let mut enclosed = Vec::new();
    let mut current = start.boundary;
    while let Some(node) = current {
        if Some(node) == end.boundary {
            break;
        }
        current = tree.next_sibling(node);
        enclosed.push(node);
    }

    let first_index = start
        .boundary
        .map(|node| tree.index_of(node))
        .unwrap_or_else(|| tree.child_count(stop));
    let mut anchors = Vec::with_capacity(tracked.len());
    for other in tracked.iter() {
        let start = anchor_for(tree, classifier, other.start, stop, first_index, &enclosed);
        let end = anchor_for(tree, classifier, other.end, stop, first_index, &enclosed);
        anchors.push((start, end));
    }

    let mut cleaned = Vec::new();
    for &node in &enclosed {
        tree.detach(node);
        cleaned.extend(clean_node(tree, classifier, node, &mut touched));
    }
    if stop == tree.root() {
        cleaned = wrap_inline_runs(tree, classifier, cleaned, |block| {
            touched.record_created(block)
        });
    }

    for &node in &cleaned {
        match end.boundary {
            Some(boundary) => tree.insert_before(boundary, node),
            None => tree.append(stop, node),
        }
    }

    let result = match (cleaned.first(), cleaned.last()) {
        (Some(&first), Some(&last)) => Range::new(
            Position::new(stop, tree.index_of(first)),
            Position::new(stop, tree.index_of(last) + 1),
        ),
        _ => Range::caret(Position::new(stop, first_index)),
    };

    let mut ranges = vec![result];
    for (start, end) in anchors {
        let start = resolve(tree, start, stop, result.start);
        let end = resolve(tree, end, stop, result.end);
        if tree.compare_positions(start, end).is_gt() {
            ranges.push(Range::caret(start));
        } else {
            ranges.push(Range::new(start, end));
        }
    }
    normalize(tree, classifier, stop, &touched, &mut ranges);
    tracked.copy_from_slice(&ranges[1..]);

    let result = move_boundaries_down_tree(tree, classifier, ranges[0]);
    tracing::debug!(?result, nodes = cleaned.len(), "formatting removed");
    Ok(result)
}

/// The nearest leaf block holding both ends of `range`.
///
/// A range crossing leaf blocks is split against the root instead. Each end
/// lying inside a leaf block is widened to cover that block whole; ends
/// sitting in container-level or root-level content stay where they are.
fn stop_ancestor(tree: &Tree, classifier: &Classifier, range: Range) -> (NodeId, Range) {
    let root = tree.root();
    let common = tree
        .common_ancestor(range.start.container, range.end.container)
        .unwrap_or(root);
    let leaf = tree
        .ancestors(common)
        .take_while(|&node| node != root)
        .find(|&node| classifier.is_leaf_block(tree, node));
    if let Some(leaf) = leaf
        && !is_enclosed_sole_cell(tree, classifier, leaf, range)
    {
        return (leaf, range);
    }

    let start = enclosing_leaf_block(tree, classifier, range.start.container)
        .map(Position::start_of)
        .unwrap_or(range.start);
    let end = enclosing_leaf_block(tree, classifier, range.end.container)
        .map(|block| Position::end_of(tree, block))
        .unwrap_or(range.end);
    (root, Range::new(start, end))
}

/// A table cell with no sibling cells whose whole content lies in `range`.
/// Such a cell is converted like any enclosed cell, collapsing its table.
fn is_enclosed_sole_cell(tree: &Tree, classifier: &Classifier, cell: NodeId, range: Range) -> bool {
    let Some(row) = tree.parent(cell) else {
        return false;
    };
    classifier.is_table_structural(tree, cell)
        && !tree
            .children(row)
            .any(|sibling| sibling != cell && classifier.is_table_structural(tree, sibling))
        && is_at_block_boundary(tree, classifier, range.start, Edge::Start)
        && is_at_block_boundary(tree, classifier, range.end, Edge::End)
}

/// Where a tracked boundary lands once the enclosed nodes are replaced.
#[derive(Debug, Clone, Copy)]
enum Anchor {
    At(Position),
    /// A child offset of the stop node, counted from its end.
    FromEnd(usize),
    Before(NodeId),
    After(NodeId),
}

/// Pin `position` to something the cleaning pass keeps: text and opaque
/// nodes survive, the elements around them may not.
fn anchor_for(
    tree: &Tree,
    classifier: &Classifier,
    position: Position,
    stop: NodeId,
    first_index: usize,
    enclosed: &[NodeId],
) -> Anchor {
    if position.container == stop {
        let end_index = first_index + enclosed.len();
        return if position.offset <= first_index {
            Anchor::At(position)
        } else if position.offset >= end_index {
            Anchor::FromEnd(tree.child_count(stop).saturating_sub(position.offset))
        } else {
            settle(tree, classifier, position)
        };
    }
    if enclosed
        .iter()
        .any(|&node| tree.contains(node, position.container))
    {
        return settle(tree, classifier, position);
    }
    Anchor::At(position)
}

/// Descend from `position` to the nearest text or opaque node.
fn settle(tree: &Tree, classifier: &Classifier, position: Position) -> Anchor {
    let mut position = position;
    loop {
        if tree.is_text(position.container) {
            return Anchor::At(position);
        }
        match tree.child_at(position.container, position.offset) {
            Some(child) if classifier.is_opaque(tree, child) => return Anchor::Before(child),
            Some(child) => position = Position::start_of(child),
            None => match tree.last_child(position.container) {
                Some(child) if classifier.is_opaque(tree, child) => return Anchor::After(child),
                Some(child) => position = Position::end_of(tree, child),
                None => return Anchor::At(position),
            },
        }
    }
}

fn resolve(tree: &Tree, anchor: Anchor, stop: NodeId, fallback: Position) -> Position {
    let position = match anchor {
        Anchor::At(position) => Some(position),
        Anchor::FromEnd(distance) => tree
            .child_count(stop)
            .checked_sub(distance)
            .map(|offset| Position::new(stop, offset)),
        Anchor::Before(node) => Position::before(tree, node),
        Anchor::After(node) => Position::after(tree, node),
    };
    position
        .filter(|&position| tree.validate_position(position).is_ok())
        .unwrap_or(fallback)
}

/// Move tracked positions past a chain of `(left, right)` splits, applied
/// in the order they were made.
fn follow_splits(tree: &Tree, halves: &[(NodeId, NodeId)], tracked: &mut [Range]) {
    for &(left, right) in halves {
        let at = tree.len(left);
        let parent = tree.parent(left);
        let index = tree.index_of(left);
        for range in tracked.iter_mut() {
            range.map(|p| {
                if p.container == left && p.offset > at {
                    Position::new(right, p.offset - at)
                } else if Some(p.container) == parent && p.offset > index {
                    Position::new(p.container, p.offset + 1)
                } else {
                    p
                }
            });
        }
    }
}

/// Move a boundary lying inside an opaque node out past that node, so the
/// node is either enclosed whole or left alone.
fn lift_out_of_opaque(
    tree: &Tree,
    classifier: &Classifier,
    position: Position,
    stop: NodeId,
    after: bool,
) -> Position {
    let outermost = tree
        .ancestors(position.container)
        .take_while(|&node| node != stop)
        .filter(|&node| classifier.is_opaque(tree, node))
        .last();
    let lifted = match outermost {
        Some(node) if after => Position::after(tree, node),
        Some(node) => Position::before(tree, node),
        None => None,
    };
    lifted.unwrap_or(position)
}

/// Clean one detached node, returning the detached nodes that replace it.
fn clean_node(
    tree: &mut Tree,
    classifier: &Classifier,
    node: NodeId,
    touched: &mut Touched,
) -> Vec<NodeId> {
    match classifier.category(tree, node) {
        Category::Text | Category::Opaque => vec![node],
        Category::InlineStyle => clean_children(tree, classifier, node, touched),
        Category::Block | Category::TableStructural | Category::Preformatted => {
            let leaf = classifier.is_leaf_block(tree, node);
            let children = clean_children(tree, classifier, node, touched);
            if leaf {
                let block = tree.new_element(classifier.canonical_element());
                for child in children {
                    tree.append(block, child);
                }
                touched.record_created(block);
                vec![block]
            } else {
                wrap_inline_runs(tree, classifier, children, |block| {
                    touched.record_created(block)
                })
            }
        }
    }
}

/// Take the children of `node`, free it, and clean each child in turn.
fn clean_children(
    tree: &mut Tree,
    classifier: &Classifier,
    node: NodeId,
    touched: &mut Touched,
) -> Vec<NodeId> {
    let children = tree.take_children(node);
    tree.remove_subtree(node);
    children
        .into_iter()
        .flat_map(|child| clean_node(tree, classifier, child, touched))
        .collect()
}
