//! Markup reader and writer.
//!
//! These stand in for the host document's parser and serializer: they turn a
//! markup string into a [`Tree`](crate::tree::Tree) and back. Only the subset
//! the editing engine produces and consumes is supported: elements with
//! attributes, void elements, text with entities, and comments (dropped).

pub mod lexer;
pub mod reader;
pub mod writer;

pub use reader::read;
pub use writer::{write, write_children, write_node};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    #[error("end tag </{tag}> at byte {offset} has no matching start tag")]
    UnmatchedClose { tag: String, offset: usize },
    #[error("malformed start tag at byte {offset}")]
    InvalidTag { offset: usize },
}
