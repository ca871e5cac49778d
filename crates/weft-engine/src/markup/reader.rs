use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::markup::MarkupError;
use crate::markup::lexer::{TokenKind, lex_with_spans};
use crate::tree::{Element, NodeId, Tree};

/// Elements that never take children.
pub const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

pub fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// Build a tree whose root holds the top-level nodes of `markup`.
///
/// Unclosed elements are closed at end of input; an end tag with no
/// matching open element is an error.
pub fn read(markup: &str) -> Result<Tree, MarkupError> {
    let mut tree = Tree::new();
    let mut open: Vec<NodeId> = vec![tree.root()];
    let mut after_pre_start = false;

    for (token, span) in lex_with_spans(markup) {
        let Some(&parent) = open.last() else {
            break;
        };
        match token.kind {
            TokenKind::Text => {
                let mut text = html_escape::decode_html_entities(token.text).into_owned();
                // A newline right after <pre> belongs to the markup, not the content
                if after_pre_start {
                    if let Some(rest) = text.strip_prefix("\r\n").or(text.strip_prefix('\n')) {
                        text = rest.to_string();
                    }
                }
                after_pre_start = false;
                push_text(&mut tree, parent, &text);
            }
            TokenKind::StartTag => {
                after_pre_start = false;
                let element =
                    parse_start_tag(token.text).ok_or(MarkupError::InvalidTag { offset: span.start })?;
                let self_closing = token.text.ends_with("/>");
                let opens = !self_closing && !is_void(&element.tag);
                let is_pre = element.tag == "pre";

                let node = tree.new_element(element);
                tree.append(parent, node);
                if opens {
                    open.push(node);
                    after_pre_start = is_pre;
                }
            }
            TokenKind::EndTag => {
                after_pre_start = false;
                let tag = end_tag_name(token.text);
                if is_void(&tag) {
                    continue;
                }
                let depth = open
                    .iter()
                    .skip(1)
                    .rposition(|&node| tree.tag(node) == Some(tag.as_str()))
                    .ok_or_else(|| MarkupError::UnmatchedClose {
                        tag: tag.clone(),
                        offset: span.start,
                    })?;
                open.truncate(depth + 1);
            }
            TokenKind::Comment => {}
        }
    }

    Ok(tree)
}

fn push_text(tree: &mut Tree, parent: NodeId, text: &str) {
    if text.is_empty() {
        return;
    }
    match tree.last_child(parent) {
        Some(last) if tree.is_text(last) => tree.append_text(last, text),
        _ => {
            let node = tree.new_text(text);
            tree.append(parent, node);
        }
    }
}

fn tag_name_regex() -> &'static Regex {
    static TAG_NAME: OnceLock<Regex> = OnceLock::new();
    TAG_NAME.get_or_init(|| Regex::new(r"^</?([A-Za-z][A-Za-z0-9-]*)").expect("Invalid tag regex"))
}

fn attribute_regex() -> &'static Regex {
    static ATTRIBUTE: OnceLock<Regex> = OnceLock::new();
    ATTRIBUTE.get_or_init(|| {
        Regex::new(r#"([^\s<>"'/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s<>"'=`]+)))?"#)
            .expect("Invalid attribute regex")
    })
}

fn parse_start_tag(text: &str) -> Option<Element> {
    let name = tag_name_regex().captures(text)?.get(1)?;
    let rest = text[name.end()..].trim_end_matches('>');

    let mut attributes = BTreeMap::new();
    for captures in attribute_regex().captures_iter(rest) {
        let Some(key) = captures.get(1) else {
            continue;
        };
        let value = captures
            .get(2)
            .or_else(|| captures.get(3))
            .or_else(|| captures.get(4))
            .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned())
            .unwrap_or_default();
        attributes.insert(key.as_str().to_ascii_lowercase(), value);
    }

    Some(Element::with_attributes(name.as_str(), attributes))
}

fn end_tag_name(text: &str) -> String {
    tag_name_regex()
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::write;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reads_nested_elements() {
        let tree = read("<div>one <i>two</i></div>").unwrap();
        let div = tree.elements_by_tag("div")[0];

        assert_eq!(tree.parent(div), Some(tree.root()));
        assert_eq!(tree.child_count(div), 2);
        assert_eq!(tree.text_content(div), "one two");
    }

    #[test]
    fn test_reads_attributes() {
        let tree = read(r#"<td colspan=2 class="a &amp; b" title='t' hidden>x</td>"#).unwrap();
        let td = tree.element(tree.elements_by_tag("td")[0]).unwrap();

        assert_eq!(td.attributes.get("colspan").map(String::as_str), Some("2"));
        assert_eq!(td.attributes.get("class").map(String::as_str), Some("a & b"));
        assert_eq!(td.attributes.get("title").map(String::as_str), Some("t"));
        assert_eq!(td.attributes.get("hidden").map(String::as_str), Some(""));
    }

    #[test]
    fn test_void_elements_take_no_children() {
        let tree = read("<div>a<br>b<img src=\"x\"/></div>").unwrap();
        let div = tree.elements_by_tag("div")[0];

        assert_eq!(tree.child_count(div), 4);
        assert_eq!(tree.child_count(tree.elements_by_tag("br")[0]), 0);
    }

    #[test]
    fn test_decodes_entities() {
        let tree = read("<p>a &lt; b &amp;&nbsp;c</p>").unwrap();

        assert_eq!(tree.text_content(tree.root()), "a < b &\u{a0}c");
    }

    #[test]
    fn test_drops_newline_after_pre_start() {
        let tree = read("<pre>\n\nx</pre>").unwrap();

        assert_eq!(tree.text_content(tree.root()), "\nx");
    }

    #[test]
    fn test_unclosed_elements_close_at_end() {
        let tree = read("<div><b>bold").unwrap();

        assert_eq!(write(&tree), "<div><b>bold</b></div>");
    }

    #[test]
    fn test_end_tag_closes_intervening_elements() {
        let tree = read("<div><b>bold</div>after").unwrap();

        assert_eq!(write(&tree), "<div><b>bold</b></div>after");
    }

    #[test]
    fn test_stray_end_tag_is_an_error() {
        let result = read("<div>x</span></div>");

        assert_eq!(
            result.err(),
            Some(MarkupError::UnmatchedClose {
                tag: "span".to_string(),
                offset: 6
            })
        );
    }

    #[test]
    fn test_comments_are_dropped() {
        let tree = read("<div>a<!-- hidden -->b</div>").unwrap();
        let div = tree.elements_by_tag("div")[0];

        assert_eq!(tree.child_count(div), 1);
        assert_eq!(tree.text_content(div), "ab");
    }
}
