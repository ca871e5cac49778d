//! # Preformatter
//!
//! Turns the run of sibling blocks a range touches into one `pre` block.
//! Preformatted blocks inside the run, or directly before or after it, are
//! absorbed so the result is a single block whose lines are those of every
//! block involved.

use weft_config::Config;

use crate::classify::{Category, Classifier, PREFORMATTED_TAG};
use crate::editing::normalize::{Touched, normalize};
use crate::error::EditError;
use crate::tree::navigator::{
    Edge, end_block_of_range, enclosing_leaf_block, is_at_block_boundary,
    move_boundaries_down_tree, start_block_of_range,
};
use crate::tree::{Element, NodeData, NodeId, Position, Range, Tree};

const NBSP: char = '\u{a0}';

/// Replace the blocks under `range` with a single preformatted block and
/// return a caret at its start.
///
/// Fails with [`EditError::UnsupportedSpan`], leaving the tree as it was,
/// unless the blocks are plain or preformatted leaf blocks sharing a parent.
pub fn make_preformatted(
    tree: &mut Tree,
    classifier: &Classifier,
    config: &Config,
    range: Range,
) -> Result<Range, EditError> {
    tree.validate_range(range)?;
    let span = block_span(tree, classifier, range)?;
    let Some(parent) = span.first().and_then(|&first| tree.parent(first)) else {
        return Err(EditError::UnsupportedSpan("no block in range".to_string()));
    };
    tracing::debug!(blocks = span.len(), "making preformatted block");

    let lines: Vec<String> = span
        .iter()
        .filter(|&&node| !tree.is_text(node))
        .map(|&block| block_text(tree, classifier, block))
        .collect();
    let mut text = lines.join("\n");
    if text.is_empty() || text.ends_with('\n') {
        // the empty-line marker keeps a trailing blank line (or an empty block) visible
        text.push('\n');
    }

    let pre = tree.new_element(Element::with_attributes(
        PREFORMATTED_TAG,
        config.pre_attributes.clone(),
    ));
    let content = tree.new_text(text);
    tree.append(pre, content);
    tree.insert_before(span[0], pre);
    for &node in &span {
        tree.remove_subtree(node);
    }

    let mut touched = Touched::default();
    touched.record_created(pre);
    let mut result = Range::caret(Position::start_of(pre));
    normalize(tree, classifier, parent, &touched, std::slice::from_mut(&mut result));
    Ok(move_boundaries_down_tree(tree, classifier, result))
}

/// Every sibling from the first to the last block of the range, widened
/// over adjacent preformatted blocks.
fn block_span(tree: &Tree, classifier: &Classifier, range: Range) -> Result<Vec<NodeId>, EditError> {
    let first = start_block_of_range(tree, classifier, range);
    let last = end_block_of_range(tree, classifier, range);
    let (Some(mut first), Some(mut last)) = (first, last) else {
        return Err(EditError::UnsupportedSpan("no block in range".to_string()));
    };

    if !range.is_collapsed() && first != last {
        // a range ending right at the start of a block does not select it
        let mut trimmed_last = last;
        if enclosing_leaf_block(tree, classifier, range.end.container) == Some(last)
            && is_at_block_boundary(tree, classifier, range.end, Edge::Start)
            && let Some(previous) = previous_block(tree, last)
        {
            trimmed_last = previous;
        }
        let mut trimmed_first = first;
        if enclosing_leaf_block(tree, classifier, range.start.container) == Some(first)
            && is_at_block_boundary(tree, classifier, range.start, Edge::End)
            && let Some(next) = next_block(tree, first)
        {
            trimmed_first = next;
        }
        if trimmed_first == last && trimmed_last == first {
            // only the gap between two blocks is selected: treat it as a caret
            last = first;
        } else {
            first = trimmed_first;
            last = trimmed_last;
        }
    }

    if tree.parent(first).is_none() || tree.parent(first) != tree.parent(last) {
        return Err(EditError::UnsupportedSpan(
            "blocks do not share a parent".to_string(),
        ));
    }

    while let Some(previous) = previous_block(tree, first)
        && classifier.is_preformatted(tree, previous)
    {
        first = previous;
    }
    while let Some(next) = next_block(tree, last)
        && classifier.is_preformatted(tree, next)
    {
        last = next;
    }

    let mut span = Vec::new();
    let mut current = Some(first);
    while let Some(node) = current {
        if !is_convertible(tree, classifier, node) && !is_blank_text(tree, node) {
            let tag = tree.tag(node).unwrap_or("text").to_string();
            return Err(EditError::UnsupportedSpan(format!(
                "cannot preformat <{tag}>"
            )));
        }
        span.push(node);
        if node == last {
            return Ok(span);
        }
        current = tree.next_sibling(node);
    }
    Err(EditError::UnsupportedSpan(
        "blocks are out of order".to_string(),
    ))
}

/// Plain or preformatted leaf blocks.
fn is_convertible(tree: &Tree, classifier: &Classifier, node: NodeId) -> bool {
    matches!(
        classifier.category(tree, node),
        Category::Block | Category::Preformatted
    ) && classifier.is_leaf_block(tree, node)
}

/// Whitespace-only text, as left between blocks by indented markup.
fn is_blank_text(tree: &Tree, node: NodeId) -> bool {
    tree.text(node)
        .is_some_and(|text| text.chars().all(char::is_whitespace))
}

fn previous_block(tree: &Tree, node: NodeId) -> Option<NodeId> {
    let mut current = tree.previous_sibling(node);
    while let Some(sibling) = current {
        if !is_blank_text(tree, sibling) {
            return Some(sibling);
        }
        current = tree.previous_sibling(sibling);
    }
    None
}

fn next_block(tree: &Tree, node: NodeId) -> Option<NodeId> {
    let mut current = tree.next_sibling(node);
    while let Some(sibling) = current {
        if !is_blank_text(tree, sibling) {
            return Some(sibling);
        }
        current = tree.next_sibling(sibling);
    }
    None
}

/// The text a block contributes to the preformatted result.
fn block_text(tree: &Tree, classifier: &Classifier, block: NodeId) -> String {
    let preformatted = classifier.is_preformatted(tree, block);
    let mut out = String::new();
    collect_text(tree, classifier, block, preformatted, &mut out);
    if preformatted && out.ends_with('\n') {
        out.pop();
    }
    out
}

fn collect_text(
    tree: &Tree,
    classifier: &Classifier,
    node: NodeId,
    preformatted: bool,
    out: &mut String,
) {
    for child in tree.children(node) {
        match tree.data(child) {
            NodeData::Text(text) if preformatted => out.push_str(text),
            NodeData::Text(text) => out.extend(text.chars().map(|c| if c == NBSP { ' ' } else { c })),
            NodeData::Element(element) if element.tag == "br" => out.push('\n'),
            NodeData::Element(_) if classifier.is_opaque(tree, child) => {}
            NodeData::Element(_) => collect_text(tree, classifier, child, preformatted, out),
        }
    }
}
