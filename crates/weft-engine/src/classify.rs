//! Tag classification.
//!
//! Every element falls into exactly one [`Category`]; tags missing from the
//! built-in table are [`Category::Opaque`] and pass through every
//! transformation untouched. The table can be adjusted per editor through
//! the `[classification]` section of the config.

use std::collections::BTreeMap;

use weft_config::{Config, TagCategory};

use crate::tree::{Element, NodeData, NodeId, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Text,
    InlineStyle,
    Block,
    TableStructural,
    Preformatted,
    Opaque,
}

impl Category {
    /// Block, table-structural and preformatted nodes all break lines.
    pub fn is_block_level(self) -> bool {
        matches!(
            self,
            Category::Block | Category::TableStructural | Category::Preformatted
        )
    }

    pub fn is_formattable(self) -> bool {
        matches!(
            self,
            Category::InlineStyle | Category::Block | Category::TableStructural
        )
    }
}

impl From<TagCategory> for Category {
    fn from(category: TagCategory) -> Self {
        match category {
            TagCategory::Inline => Category::InlineStyle,
            TagCategory::Block => Category::Block,
            TagCategory::Table => Category::TableStructural,
            TagCategory::Preformatted => Category::Preformatted,
            TagCategory::Opaque => Category::Opaque,
        }
    }
}

const INLINE_STYLE_TAGS: &[&str] = &[
    "a", "abbr", "b", "big", "cite", "code", "del", "dfn", "em", "font", "i", "ins", "kbd",
    "mark", "q", "s", "samp", "small", "span", "strike", "strong", "sub", "sup", "tt", "u",
    "var",
];

const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "dd",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "section",
    "ul",
];

const TABLE_TAGS: &[&str] = &[
    "caption", "col", "colgroup", "table", "tbody", "td", "tfoot", "th", "thead", "tr",
];

pub const PREFORMATTED_TAG: &str = "pre";

/// Built-in category of a lower-case tag name.
pub fn category_of_tag(tag: &str) -> Category {
    if INLINE_STYLE_TAGS.contains(&tag) {
        Category::InlineStyle
    } else if BLOCK_TAGS.contains(&tag) {
        Category::Block
    } else if TABLE_TAGS.contains(&tag) {
        Category::TableStructural
    } else if tag == PREFORMATTED_TAG {
        Category::Preformatted
    } else {
        Category::Opaque
    }
}

/// Read-only predicates over nodes, parameterised by the editor config.
#[derive(Debug, Clone)]
pub struct Classifier {
    overrides: BTreeMap<String, Category>,
    block_tag: String,
    block_attributes: BTreeMap<String, String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Classifier {
    pub fn from_config(config: &Config) -> Self {
        let mut overrides: BTreeMap<String, Category> = config
            .classification
            .iter()
            .map(|(tag, &category)| (tag.to_ascii_lowercase(), category.into()))
            .collect();
        // the canonical block must stay a block whatever the table says
        overrides.insert(config.block_tag.to_ascii_lowercase(), Category::Block);

        Self {
            overrides,
            block_tag: config.block_tag.to_ascii_lowercase(),
            block_attributes: config.block_attributes.clone(),
        }
    }

    pub fn category_of(&self, tag: &str) -> Category {
        let tag = tag.to_ascii_lowercase();
        self.overrides
            .get(&tag)
            .copied()
            .unwrap_or_else(|| category_of_tag(&tag))
    }

    pub fn category(&self, tree: &Tree, id: NodeId) -> Category {
        match tree.data(id) {
            NodeData::Text(_) => Category::Text,
            NodeData::Element(element) => self.category_of(&element.tag),
        }
    }

    pub fn is_inline_style(&self, tree: &Tree, id: NodeId) -> bool {
        self.category(tree, id) == Category::InlineStyle
    }

    pub fn is_block(&self, tree: &Tree, id: NodeId) -> bool {
        self.category(tree, id) == Category::Block
    }

    pub fn is_table_structural(&self, tree: &Tree, id: NodeId) -> bool {
        self.category(tree, id) == Category::TableStructural
    }

    pub fn is_preformatted(&self, tree: &Tree, id: NodeId) -> bool {
        self.category(tree, id) == Category::Preformatted
    }

    pub fn is_formattable(&self, tree: &Tree, id: NodeId) -> bool {
        self.category(tree, id).is_formattable()
    }

    pub fn is_opaque(&self, tree: &Tree, id: NodeId) -> bool {
        self.category(tree, id) == Category::Opaque
    }

    pub fn is_block_level(&self, tree: &Tree, id: NodeId) -> bool {
        self.category(tree, id).is_block_level()
    }

    /// A block-level node none of whose children is block-level.
    pub fn is_leaf_block(&self, tree: &Tree, id: NodeId) -> bool {
        self.is_block_level(tree, id)
            && !tree
                .children(id)
                .any(|child| self.is_block_level(tree, child))
    }

    /// A block-level node holding at least one block-level child.
    pub fn is_container(&self, tree: &Tree, id: NodeId) -> bool {
        self.is_block_level(tree, id) && !self.is_leaf_block(tree, id)
    }

    /// Text, opaque nodes and anything holding them count as content.
    pub fn has_content(&self, tree: &Tree, id: NodeId) -> bool {
        tree.descendants(id).any(|node| match self.category(tree, node) {
            Category::Text => tree.text(node).is_some_and(|text| !text.is_empty()),
            Category::Opaque => true,
            _ => false,
        })
    }

    pub fn block_tag(&self) -> &str {
        &self.block_tag
    }

    /// A fresh canonical plain block element.
    pub fn canonical_element(&self) -> Element {
        Element::with_attributes(self.block_tag.clone(), self.block_attributes.clone())
    }

    /// Already the canonical plain block, attributes included.
    pub fn is_canonical_block(&self, tree: &Tree, id: NodeId) -> bool {
        tree.element(id).is_some_and(|element| {
            element.tag == self.block_tag && element.attributes == self.block_attributes
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("i", Category::InlineStyle)]
    #[case("STRONG", Category::InlineStyle)]
    #[case("sup", Category::InlineStyle)]
    #[case("blockquote", Category::Block)]
    #[case("li", Category::Block)]
    #[case("td", Category::TableStructural)]
    #[case("tbody", Category::TableStructural)]
    #[case("pre", Category::Preformatted)]
    #[case("img", Category::Opaque)]
    #[case("iframe", Category::Opaque)]
    #[case("x-widget", Category::Opaque)]
    fn test_builtin_table(#[case] tag: &str, #[case] expected: Category) {
        let classifier = Classifier::default();
        assert_eq!(classifier.category_of(tag), expected);
    }

    #[test]
    fn test_text_is_none_of_the_formatting_kinds() {
        let mut tree = Tree::new();
        let text = tree.new_text("plain");
        let classifier = Classifier::default();

        assert_eq!(classifier.category(&tree, text), Category::Text);
        assert!(!classifier.is_inline_style(&tree, text));
        assert!(!classifier.is_block(&tree, text));
        assert!(!classifier.is_table_structural(&tree, text));
        assert!(!classifier.is_preformatted(&tree, text));
        assert!(!classifier.is_formattable(&tree, text));
    }

    #[test]
    fn test_config_overrides_reclassify_tags() {
        let mut config = Config::default();
        config
            .classification
            .insert("x-note".to_string(), TagCategory::Block);
        config
            .classification
            .insert("span".to_string(), TagCategory::Opaque);
        let classifier = Classifier::from_config(&config);

        assert_eq!(classifier.category_of("x-note"), Category::Block);
        assert_eq!(classifier.category_of("span"), Category::Opaque);
    }

    #[test]
    fn test_leaf_blocks_and_containers() {
        let mut tree = Tree::new();
        let ul = tree.new_element(Element::new("ul"));
        let li = tree.new_element(Element::new("li"));
        let text = tree.new_text("item");
        tree.append(tree.root(), ul);
        tree.append(ul, li);
        tree.append(li, text);
        let classifier = Classifier::default();

        assert!(classifier.is_container(&tree, ul));
        assert!(classifier.is_leaf_block(&tree, li));
        assert!(!classifier.is_leaf_block(&tree, text));
    }

    #[test]
    fn test_canonical_block_requires_matching_attributes() {
        let mut tree = Tree::new();
        let plain = tree.new_element(Element::new("div"));
        let mut attributes = BTreeMap::new();
        attributes.insert("class".to_string(), "quote".to_string());
        let styled = tree.new_element(Element::with_attributes("div", attributes));
        let classifier = Classifier::default();

        assert!(classifier.is_canonical_block(&tree, plain));
        assert!(!classifier.is_canonical_block(&tree, styled));
    }
}
