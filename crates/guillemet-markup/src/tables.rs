// File: src/tables.rs
// Purpose: Substitute table tag renaming

use crate::node::Node;

/// Substitute tags accepted in template source, paired with the real
/// table tags they stand in for.
const TABLE_TAGS: &[(&str, &str)] = &[
    ("t", "table"),
    ("th", "thead"),
    ("tb", "tbody"),
    ("trow", "tr"),
    ("tcell", "td"),
];

/// Rename substitute table tags to their real HTML names, recursively.
///
/// Strict HTML parsers relocate or drop table elements that appear
/// outside a `<table>`, so template sources write `<t>`, `<th>`, `<tb>`,
/// `<trow>` and `<tcell>` instead and run this pass after expansion.
/// Attributes and children are untouched. The expander never calls this;
/// it is applied manually by the host.
pub fn update_table_tags(node: &mut Node) {
    match node {
        Node::Element(el) => {
            if let Some((_, real)) = TABLE_TAGS.iter().find(|(sub, _)| *sub == el.tag) {
                el.tag = (*real).to_string();
            }
            for child in &mut el.children {
                update_table_tags(child);
            }
        }
        Node::Fragment(kids) => {
            for child in kids {
                update_table_tags(child);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{HtmlParser, MarkupProvider};
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Node {
        match HtmlParser::new().parse(text) {
            Ok(tree) => tree,
            Err(e) => panic!("parse failed: {e}"),
        }
    }

    #[test]
    fn test_renames_all_substitute_tags() {
        let mut tree = parse(
            "<t><th><trow><tcell>h</tcell></trow></th>\
             <tb><trow><tcell>c</tcell></trow></tb></t>",
        );
        update_table_tags(&mut tree);
        assert_eq!(
            tree.serialize(),
            "<table><thead><tr><td>h</td></tr></thead>\
             <tbody><tr><td>c</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_preserves_attributes() {
        let mut tree = parse(r#"<t class="grid" id="prices"></t>"#);
        update_table_tags(&mut tree);
        assert_eq!(tree.serialize(), r#"<table class="grid" id="prices"></table>"#);
    }

    #[test]
    fn test_leaves_real_tags_alone() {
        let mut tree = parse("<table><tr><td>x</td></tr></table><div>y</div>");
        update_table_tags(&mut tree);
        assert_eq!(
            tree.serialize(),
            "<table><tr><td>x</td></tr></table><div>y</div>"
        );
    }

    #[test]
    fn test_recurses_through_unrelated_elements() {
        let mut tree = parse("<section><div><trow>deep</trow></div></section>");
        update_table_tags(&mut tree);
        assert_eq!(
            tree.serialize(),
            "<section><div><tr>deep</tr></div></section>"
        );
    }
}
