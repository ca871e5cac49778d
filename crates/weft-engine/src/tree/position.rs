use std::cmp::Ordering;

use crate::error::{EditError, RangeFault};
use crate::tree::{NodeId, Tree};

/// A point inside the tree.
///
/// For an element container `offset` is a child index (the point sits just
/// before that child); for a text container it is a char index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub container: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(container: NodeId, offset: usize) -> Self {
        Self { container, offset }
    }

    /// The point just before `node` in its parent.
    pub fn before(tree: &Tree, node: NodeId) -> Option<Self> {
        let parent = tree.parent(node)?;
        Some(Self::new(parent, tree.index_of(node)))
    }

    /// The point just after `node` in its parent.
    pub fn after(tree: &Tree, node: NodeId) -> Option<Self> {
        let parent = tree.parent(node)?;
        Some(Self::new(parent, tree.index_of(node) + 1))
    }

    pub fn start_of(node: NodeId) -> Self {
        Self::new(node, 0)
    }

    pub fn end_of(tree: &Tree, node: NodeId) -> Self {
        Self::new(node, tree.len(node))
    }
}

/// An ordered pair of positions; `start == end` is a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn caret(at: Position) -> Self {
        Self { start: at, end: at }
    }

    /// Select every child of `node`.
    pub fn contents_of(tree: &Tree, node: NodeId) -> Self {
        Self::new(Position::start_of(node), Position::end_of(tree, node))
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Apply `f` to both boundaries.
    pub fn map(&mut self, mut f: impl FnMut(Position) -> Position) {
        self.start = f(self.start);
        self.end = f(self.end);
    }
}

impl Tree {
    pub fn validate_position(&self, position: Position) -> Result<(), RangeFault> {
        if !self.is_attached(position.container) {
            return Err(RangeFault::Detached);
        }
        let length = self.len(position.container);
        if position.offset > length {
            return Err(RangeFault::OffsetOutOfBounds {
                offset: position.offset,
                length,
            });
        }
        Ok(())
    }

    /// Both boundaries live under the root, in bounds, and in order.
    pub fn validate_range(&self, range: Range) -> Result<(), EditError> {
        self.validate_position(range.start)?;
        self.validate_position(range.end)?;
        if self.compare_positions(range.start, range.end) == Ordering::Greater {
            return Err(RangeFault::Reversed.into());
        }
        Ok(())
    }

    /// Order two attached positions in pre-order document order.
    pub fn compare_positions(&self, a: Position, b: Position) -> Ordering {
        if a.container == b.container {
            return a.offset.cmp(&b.offset);
        }

        let path_a = self.path_from_root(a.container);
        let path_b = self.path_from_root(b.container);
        let common = path_a
            .iter()
            .zip(&path_b)
            .take_while(|(x, y)| x == y)
            .count();

        if common == path_a.len() {
            // a's container encloses b's: compare a's offset to the branch b sits in
            return if a.offset <= path_b[common] {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        if common == path_b.len() {
            return if b.offset <= path_a[common] {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
        path_a[common].cmp(&path_b[common])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Element;

    // body > div > [ "ab", em > "cd" ]
    fn sample() -> (Tree, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let div = tree.new_element(Element::new("div"));
        let ab = tree.new_text("ab");
        let em = tree.new_element(Element::new("em"));
        let cd = tree.new_text("cd");
        tree.append(tree.root(), div);
        tree.append(div, ab);
        tree.append(div, em);
        tree.append(em, cd);
        (tree, div, ab, em, cd)
    }

    #[test]
    fn test_same_container_orders_by_offset() {
        let (tree, _, ab, _, _) = sample();
        assert_eq!(
            tree.compare_positions(Position::new(ab, 0), Position::new(ab, 2)),
            Ordering::Less
        );
    }

    #[test]
    fn test_ancestor_container_against_descendant() {
        let (tree, div, ab, _, cd) = sample();

        // (div, 1) sits between "ab" and <em>
        let between = Position::new(div, 1);
        assert_eq!(
            tree.compare_positions(between, Position::new(ab, 2)),
            Ordering::Greater
        );
        assert_eq!(
            tree.compare_positions(between, Position::new(cd, 0)),
            Ordering::Less
        );
        assert_eq!(
            tree.compare_positions(Position::new(cd, 1), between),
            Ordering::Greater
        );
    }

    #[test]
    fn test_sibling_branches() {
        let (tree, _, ab, _, cd) = sample();
        assert_eq!(
            tree.compare_positions(Position::new(cd, 0), Position::new(ab, 1)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_validate_rejects_reversed_range() {
        let (tree, _, ab, _, cd) = sample();
        let range = Range::new(Position::new(cd, 0), Position::new(ab, 0));

        assert_eq!(
            tree.validate_range(range),
            Err(EditError::InvalidRange(RangeFault::Reversed))
        );
    }

    #[test]
    fn test_validate_rejects_out_of_bounds_offset() {
        let (tree, _, ab, _, _) = sample();
        let range = Range::caret(Position::new(ab, 3));

        assert_eq!(
            tree.validate_range(range),
            Err(EditError::InvalidRange(RangeFault::OffsetOutOfBounds {
                offset: 3,
                length: 2
            }))
        );
    }

    #[test]
    fn test_validate_rejects_removed_container() {
        let (mut tree, _, _, em, cd) = sample();
        tree.remove_subtree(em);

        assert_eq!(
            tree.validate_range(Range::caret(Position::new(cd, 0))),
            Err(EditError::InvalidRange(RangeFault::Detached))
        );
    }
}
