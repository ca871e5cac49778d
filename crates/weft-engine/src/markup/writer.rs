use crate::markup::reader::is_void;
use crate::tree::{NodeData, NodeId, Tree};

/// Serialize the children of the root.
pub fn write(tree: &Tree) -> String {
    write_children(tree, tree.root())
}

/// Serialize the children of `id`.
pub fn write_children(tree: &Tree, id: NodeId) -> String {
    let mut out = String::new();
    for child in tree.children(id) {
        write_into(tree, child, &mut out);
    }
    out
}

/// Serialize `id` itself, including its own tags.
pub fn write_node(tree: &Tree, id: NodeId) -> String {
    let mut out = String::new();
    write_into(tree, id, &mut out);
    out
}

fn write_into(tree: &Tree, id: NodeId, out: &mut String) {
    match tree.data(id) {
        NodeData::Text(text) => out.push_str(&html_escape::encode_text(text)),
        NodeData::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (key, value) in &element.attributes {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(value));
                out.push('"');
            }
            out.push('>');
            if is_void(&element.tag) {
                return;
            }

            // Readers drop one newline after <pre>, so a leading one needs a twin
            if element.tag == "pre"
                && tree
                    .first_child(id)
                    .and_then(|child| tree.text(child))
                    .is_some_and(|text| text.starts_with('\n'))
            {
                out.push('\n');
            }

            for child in tree.children(id) {
                write_into(tree, child, out);
            }
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
    }
}
