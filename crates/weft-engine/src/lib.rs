pub mod classify;
pub mod editing;
pub mod error;
pub mod markup;
pub mod tree;

// Re-export key types for easier usage
pub use classify::{Category, Classifier};
pub use editing::{Editor, Patch, make_preformatted, remove_all_formatting};
pub use error::{EditError, LoadError, RangeFault};
pub use markup::MarkupError;
pub use tree::{Element, NodeData, NodeId, Position, Range, Tree};
