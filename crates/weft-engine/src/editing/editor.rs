use weft_config::{Config, ConfigError};

use crate::classify::Classifier;
use crate::editing::normalize::ensure_placeholder;
use crate::editing::{preformat, strip};
use crate::error::{EditError, LoadError};
use crate::markup;
use crate::tree::{Position, Range, Tree};

/// Result of a successful editing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Patch {
    pub new_selection: Range,
    pub version: u64,
}

/// An editable document together with its live selection.
///
/// The editor owns the tree, so every operation runs to completion against
/// it before the next can start. Callers that need a transformation away from
/// the selection use [`Editor::remove_all_formatting_at`], which keeps the
/// selection on the content it covered.
#[derive(Debug, Clone)]
pub struct Editor {
    tree: Tree,
    selection: Range,
    config: Config,
    classifier: Classifier,
    /// Incremented on each successful edit (enables change detection)
    version: u64,
}

impl Editor {
    /// An empty document holding just the placeholder block.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_tree(Tree::new(), config))
    }

    /// Load a document from markup.
    pub fn from_markup(markup: &str, config: Config) -> Result<Self, LoadError> {
        config.validate()?;
        Ok(Self::with_tree(markup::read(markup)?, config))
    }

    fn with_tree(mut tree: Tree, config: Config) -> Self {
        let classifier = Classifier::from_config(&config);
        let mut selection = Range::caret(Position::start_of(tree.root()));
        ensure_placeholder(&mut tree, &classifier, &mut selection);
        Self {
            tree,
            selection,
            config,
            classifier,
            version: 0,
        }
    }

    pub fn to_markup(&self) -> String {
        markup::write(&self.tree)
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn selection(&self) -> Range {
        self.selection
    }

    /// Replace the live selection; rejected if it does not fit the tree.
    pub fn set_selection(&mut self, selection: Range) -> Result<(), EditError> {
        self.tree.validate_range(selection)?;
        self.selection = selection;
        Ok(())
    }

    /// Select everything in the document.
    pub fn select_all(&mut self) {
        self.selection = Range::contents_of(&self.tree, self.tree.root());
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Strip formatting from `range`. The live selection is carried through
    /// every split and merge, so it still covers the same content.
    pub fn remove_all_formatting_at(&mut self, range: Range) -> Result<Patch, EditError> {
        let new_selection = strip::remove_all_formatting_tracking(
            &mut self.tree,
            &self.classifier,
            range,
            std::slice::from_mut(&mut self.selection),
        )?;
        Ok(self.commit(new_selection))
    }

    /// Strip formatting from the live selection and select the result.
    pub fn remove_all_formatting_at_current_selection(&mut self) -> Result<Patch, EditError> {
        let patch = self.remove_all_formatting_at(self.selection)?;
        self.selection = patch.new_selection;
        Ok(patch)
    }

    /// Turn the blocks under the live selection into one preformatted block
    /// and put the caret at its start.
    pub fn make_preformatted(&mut self) -> Result<Patch, EditError> {
        let new_selection = preformat::make_preformatted(
            &mut self.tree,
            &self.classifier,
            &self.config,
            self.selection,
        )?;
        self.selection = new_selection;
        Ok(self.commit(new_selection))
    }

    fn commit(&mut self, new_selection: Range) -> Patch {
        self.version += 1;
        Patch {
            new_selection,
            version: self.version,
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::with_tree(Tree::new(), Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RangeFault;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_editor_has_placeholder() {
        let editor = Editor::default();
        let block = editor.tree().first_child(editor.tree().root()).unwrap();

        assert_eq!(editor.to_markup(), "<div></div>");
        assert_eq!(editor.selection(), Range::caret(Position::start_of(block)));
        assert_eq!(editor.version(), 0);
    }

    #[test]
    fn test_current_selection_is_replaced_by_result() {
        let mut editor =
            Editor::from_markup("<div><i>one</i> <b>two</b></div>", Config::default()).unwrap();
        editor.select_all();

        let patch = editor.remove_all_formatting_at_current_selection().unwrap();

        assert_eq!(editor.to_markup(), "<div>one two</div>");
        assert_eq!(editor.selection(), patch.new_selection);
        assert_eq!(patch.version, 1);
        let text = editor.tree().text_nodes(editor.tree().root())[0];
        assert_eq!(
            patch.new_selection,
            Range::new(Position::new(text, 0), Position::new(text, 7))
        );
    }

    #[test]
    fn test_explicit_range_leaves_selection_alone() {
        let mut editor = Editor::from_markup("<div><b>bold</b></div>", Config::default()).unwrap();
        let before = editor.selection();
        let div = editor.tree().elements_by_tag("div")[0];

        editor
            .remove_all_formatting_at(Range::contents_of(editor.tree(), div))
            .unwrap();

        assert_eq!(editor.to_markup(), "<div>bold</div>");
        assert_eq!(editor.selection(), before);
    }

    #[test]
    fn test_selection_follows_merged_text() {
        let mut editor =
            Editor::from_markup("<div>a<b>b</b>c</div>", Config::default()).unwrap();
        let div = editor.tree().elements_by_tag("div")[0];
        let bold = editor.tree().elements_by_tag("b")[0];
        editor
            .set_selection(Range::caret(Position::new(div, 1)))
            .unwrap();

        editor
            .remove_all_formatting_at(Range::contents_of(editor.tree(), bold))
            .unwrap();

        let text = editor.tree().text_nodes(div)[0];
        assert_eq!(editor.to_markup(), "<div>abc</div>");
        assert_eq!(editor.selection(), Range::caret(Position::new(text, 1)));
    }

    #[test]
    fn test_selection_follows_split_text() {
        let mut editor =
            Editor::from_markup("<div><i>one two</i></div>", Config::default()).unwrap();
        let one = editor.tree().text_nodes(editor.tree().root())[0];
        editor
            .set_selection(Range::new(Position::new(one, 5), Position::new(one, 7)))
            .unwrap();

        editor
            .remove_all_formatting_at(Range::new(Position::new(one, 0), Position::new(one, 3)))
            .unwrap();

        assert_eq!(editor.to_markup(), "<div>one<i> two</i></div>");
        let two = editor.tree().text_nodes(editor.tree().elements_by_tag("i")[0])[0];
        assert_eq!(
            editor.selection(),
            Range::new(Position::new(two, 2), Position::new(two, 4))
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = Config {
            block_tag: String::new(),
            ..Config::default()
        };

        let result = Editor::from_markup("<div>a</div>", config.clone());

        assert!(matches!(
            result,
            Err(LoadError::Config(ConfigError::InvalidBlockTag { .. }))
        ));
        assert!(Editor::new(config).is_err());
    }

    #[test]
    fn test_failed_edit_keeps_version() {
        let mut editor =
            Editor::from_markup("<ul><li>a</li></ul><p>b</p>", Config::default()).unwrap();
        editor.select_all();

        let result = editor.make_preformatted();

        assert!(matches!(result, Err(EditError::UnsupportedSpan(_))));
        assert_eq!(editor.version(), 0);
        assert_eq!(editor.to_markup(), "<ul><li>a</li></ul><p>b</p>");
    }

    #[test]
    fn test_make_preformatted_moves_caret_to_block_start() {
        let mut editor = Editor::from_markup("<p>one</p><p>two</p>", Config::default()).unwrap();
        editor.select_all();

        editor.make_preformatted().unwrap();

        let text = editor.tree().text_nodes(editor.tree().root())[0];
        assert_eq!(editor.to_markup(), "<pre>one\ntwo</pre>");
        assert_eq!(editor.selection(), Range::caret(Position::new(text, 0)));
    }

    #[test]
    fn test_set_selection_rejects_out_of_bounds_offsets() {
        let mut editor = Editor::default();
        let root = editor.tree().root();

        let result = editor.set_selection(Range::caret(Position::new(root, 5)));

        assert_eq!(
            result,
            Err(EditError::InvalidRange(RangeFault::OffsetOutOfBounds {
                offset: 5,
                length: 1
            }))
        );
    }
}
