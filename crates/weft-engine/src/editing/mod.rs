/*!
 * # Editing Operations
 *
 * The structural edits the editor exposes, built on the tree navigator and
 * the classifier:
 *
 * - **`strip`**: `remove_all_formatting` over an arbitrary range
 * - **`preformat`**: `make_preformatted` over the blocks a range touches
 * - **`normalize`**: the cleanup pass both run before returning
 * - **`editor`**: the `Editor` facade holding tree, selection and config
 *
 * ## Usage Pattern
 *
 * ```rust
 * use weft_config::Config;
 * use weft_engine::editing::Editor;
 *
 * let mut editor = Editor::from_markup("<div><i>one</i> <b>two</b></div>", Config::default()).unwrap();
 * editor.select_all();
 * editor.remove_all_formatting_at_current_selection().unwrap();
 *
 * assert_eq!(editor.to_markup(), "<div>one two</div>");
 * ```
 *
 * Every operation validates its range before the first mutation, so an
 * `Err` always leaves the document exactly as it was.
 */

pub mod editor;
pub mod normalize;
pub mod preformat;
pub mod strip;

pub use editor::{Editor, Patch};
pub use normalize::{Touched, ensure_placeholder, normalize};
pub use preformat::make_preformatted;
pub use strip::{remove_all_formatting, remove_all_formatting_tracking};
