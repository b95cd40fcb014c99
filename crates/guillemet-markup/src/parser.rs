// src/parser.rs

use crate::node::{is_void_element, Element, Node};
use thiserror::Error;

/// Error surfaced by a fallible markup provider.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct MarkupError(pub String);

/// Parses markup text into a node tree.
///
/// The expansion engine is written against this trait, not against a
/// concrete parser, so hosts with their own document machinery can plug
/// it in.
pub trait MarkupProvider {
    fn parse(&self, text: &str) -> Result<Node, MarkupError>;
}

/// Lenient HTML-ish parser.
///
/// Recovers the way browsers do: unmatched closing tags are ignored,
/// open elements are implicitly closed by an enclosing close tag or end
/// of input, `<!doctype>` and processing instructions are skipped, and a
/// stray `<` is literal text. Tag and attribute names are lowercased.
/// `/>` self-closes any element, which the directive tags rely on.
#[derive(Debug, Clone, Default)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn new() -> Self {
        Self
    }
}

impl MarkupProvider for HtmlParser {
    fn parse(&self, text: &str) -> Result<Node, MarkupError> {
        Ok(parse_document(text))
    }
}

fn parse_document(input: &str) -> Node {
    // Index 0 is a synthetic root that collects top-level siblings.
    let mut stack: Vec<Element> = vec![Element::new("")];
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];

        if !rest.starts_with('<') {
            let end = rest.find('<').unwrap_or(rest.len());
            append_text(&mut stack, &unescape(&rest[..end]));
            pos += end;
            continue;
        }

        if let Some(body) = rest.strip_prefix("<!--") {
            match body.find("-->") {
                Some(end) => {
                    append_child(&mut stack, Node::Comment(body[..end].to_string()));
                    pos += 4 + end + 3;
                }
                None => {
                    append_child(&mut stack, Node::Comment(body.to_string()));
                    pos = input.len();
                }
            }
            continue;
        }

        if rest.starts_with("</") {
            match rest.find('>') {
                Some(end) => {
                    let name = rest[2..end].trim().to_ascii_lowercase();
                    close_element(&mut stack, &name);
                    pos += end + 1;
                }
                None => {
                    append_text(&mut stack, &unescape(rest));
                    pos = input.len();
                }
            }
            continue;
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            match rest.find('>') {
                Some(end) => pos += end + 1,
                None => pos = input.len(),
            }
            continue;
        }

        if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            match parse_open_tag(rest) {
                Some((el, consumed, closed)) => {
                    pos += consumed;
                    if closed || is_void_element(&el.tag) {
                        append_child(&mut stack, Node::Element(el));
                    } else {
                        stack.push(el);
                    }
                }
                // Unterminated tag at end of input, dropped.
                None => pos = input.len(),
            }
            continue;
        }

        append_text(&mut stack, "<");
        pos += 1;
    }

    while stack.len() > 1 {
        if let Some(el) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.children.push(Node::Element(el));
            }
        }
    }
    let root = stack.pop().unwrap_or_else(|| Element::new(""));
    Node::Fragment(root.children)
}

/// Parse `<name attr=... >` at the start of `rest`.
/// Returns the element, bytes consumed, and whether it self-closed.
fn parse_open_tag(rest: &str) -> Option<(Element, usize, bool)> {
    let name_end = 1 + scan_while(&rest[1..], |c| {
        c.is_ascii_alphanumeric() || c == '-' || c == ':'
    });
    let mut el = Element::new(rest[1..name_end].to_ascii_lowercase());
    let mut i = name_end;

    loop {
        i += scan_while(&rest[i..], |c| c.is_whitespace());
        let tail = &rest[i..];
        if tail.is_empty() {
            return None;
        }
        if tail.starts_with("/>") {
            return Some((el, i + 2, true));
        }
        if tail.starts_with('>') {
            return Some((el, i + 1, false));
        }
        if tail.starts_with('/') {
            i += 1;
            continue;
        }

        let name_len = scan_while(tail, |c| !c.is_whitespace() && c != '=' && c != '>' && c != '/');
        if name_len == 0 {
            i += 1;
            continue;
        }
        let name = tail[..name_len].to_ascii_lowercase();
        i += name_len;
        i += scan_while(&rest[i..], |c| c.is_whitespace());

        let mut value = String::new();
        if rest[i..].starts_with('=') {
            i += 1;
            i += scan_while(&rest[i..], |c| c.is_whitespace());
            let vtail = &rest[i..];
            match vtail.chars().next() {
                Some(quote @ ('"' | '\'')) => match vtail[1..].find(quote) {
                    Some(end) => {
                        value = unescape(&vtail[1..1 + end]);
                        i += end + 2;
                    }
                    None => {
                        value = unescape(&vtail[1..]);
                        i = rest.len();
                    }
                },
                _ => {
                    let end = scan_while(vtail, |c| !c.is_whitespace() && c != '>');
                    value = unescape(&vtail[..end]);
                    i += end;
                }
            }
        }
        // First occurrence wins on duplicate attributes.
        if !el.attrs.contains_key(&name) {
            el.attrs.insert(name, value);
        }
    }
}

/// Byte length of the leading run of characters satisfying `pred`.
fn scan_while(s: &str, pred: impl Fn(char) -> bool) -> usize {
    s.char_indices()
        .find(|(_, c)| !pred(*c))
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn append_text(stack: &mut Vec<Element>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(top) = stack.last_mut() {
        if let Some(Node::Text(prev)) = top.children.last_mut() {
            prev.push_str(text);
            return;
        }
        top.children.push(Node::Text(text.to_string()));
    }
}

fn append_child(stack: &mut Vec<Element>, node: Node) {
    if let Some(top) = stack.last_mut() {
        top.children.push(node);
    }
}

/// Close the innermost open element named `name`, implicitly closing
/// anything still open inside it. Unmatched names are ignored.
fn close_element(stack: &mut Vec<Element>, name: &str) {
    if name.is_empty() {
        return;
    }
    let Some(idx) = stack.iter().rposition(|el| el.tag == name) else {
        return;
    };
    if idx == 0 {
        return;
    }
    while stack.len() > idx {
        if let Some(el) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.children.push(Node::Element(el));
            }
        }
    }
}

fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        // Entity names are short; stop looking for the ';' past 10 bytes.
        let semi = tail
            .char_indices()
            .take_while(|(i, _)| *i < 10)
            .find(|(_, c)| *c == ';')
            .map(|(i, _)| i);
        if let Some(semi) = semi {
            if let Some(decoded) = decode_entity(&tail[1..semi]) {
                out.push_str(&decoded);
                rest = &tail[semi + 1..];
                continue;
            }
        }
        out.push('&');
        rest = &tail[1..];
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<String> {
    match entity {
        "amp" => return Some("&".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "quot" => return Some("\"".to_string()),
        "apos" => return Some("'".to_string()),
        "nbsp" => return Some("\u{a0}".to_string()),
        _ => {}
    }
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    char::from_u32(code).map(|c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Node {
        match HtmlParser::new().parse(text) {
            Ok(tree) => tree,
            Err(e) => panic!("parse failed: {e}"),
        }
    }

    #[test]
    fn test_round_trip_simple_element() {
        let tree = parse(r#"<div class="card">hello</div>"#);
        assert_eq!(tree.serialize(), r#"<div class="card">hello</div>"#);
    }

    #[test]
    fn test_nested_elements_and_text() {
        let tree = parse("<ul><li>one</li><li>two</li></ul>");
        let mut found = Vec::new();
        tree.find_all("li", &mut found);
        assert_eq!(found.len(), 2);
        assert_eq!(tree.serialize(), "<ul><li>one</li><li>two</li></ul>");
    }

    #[test]
    fn test_self_closing_tag_takes_no_children() {
        let tree = parse(r#"<insert template="header"/><p>after</p>"#);
        match tree.children() {
            [Node::Element(insert), Node::Element(p)] => {
                assert_eq!(insert.tag, "insert");
                assert!(insert.children.is_empty());
                assert_eq!(p.tag, "p");
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_void_element_without_slash() {
        let tree = parse(r#"<img src="x.png"><span>s</span>"#);
        match tree.children() {
            [Node::Element(img), Node::Element(span)] => {
                assert_eq!(img.tag, "img");
                assert_eq!(span.tag, "span");
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_comment_node() {
        let tree = parse("a<!-- note -->b");
        assert_eq!(
            tree.children(),
            &[
                Node::text("a"),
                Node::comment(" note "),
                Node::text("b"),
            ]
        );
    }

    #[test]
    fn test_unterminated_comment_runs_to_end() {
        let tree = parse("a<!-- dangling");
        assert_eq!(
            tree.children(),
            &[Node::text("a"), Node::comment(" dangling")]
        );
    }

    #[test]
    fn test_entities_decode_and_reencode() {
        let tree = parse("&lt;b&gt; &amp; &#65;&#x42;");
        assert_eq!(tree.children(), &[Node::text("<b> & AB")]);
        assert_eq!(tree.serialize(), "&lt;b&gt; &amp; AB");
    }

    #[test]
    fn test_unknown_entity_kept_literal() {
        let tree = parse("fish &chips; &");
        assert_eq!(tree.children(), &[Node::text("fish &chips; &")]);
    }

    #[test]
    fn test_ampersand_before_multibyte_text() {
        let tree = parse("&ab日本語; x");
        assert_eq!(tree.children(), &[Node::text("&ab日本語; x")]);
    }

    #[test]
    fn test_attribute_forms() {
        let tree = parse(r#"<input type='text' disabled value=abc>"#);
        match tree.children() {
            [Node::Element(el)] => {
                assert_eq!(el.attr("type"), Some("text"));
                assert_eq!(el.attr("disabled"), Some(""));
                assert_eq!(el.attr("value"), Some("abc"));
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_attribute_first_wins() {
        let tree = parse(r#"<div id="a" id="b"></div>"#);
        match tree.children() {
            [Node::Element(el)] => assert_eq!(el.attr("id"), Some("a")),
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_tag_and_attr_names_lowercased() {
        let tree = parse(r#"<DIV CLASS="x">T</DIV>"#);
        match tree.children() {
            [Node::Element(el)] => {
                assert_eq!(el.tag, "div");
                assert_eq!(el.attr("class"), Some("x"));
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_close_tag_implicitly_closes_inner() {
        let tree = parse("<div><span>x</div>y");
        assert_eq!(tree.serialize(), "<div><span>x</span></div>y");
    }

    #[test]
    fn test_unmatched_close_ignored() {
        let tree = parse("</nope>x");
        assert_eq!(tree.children(), &[Node::text("x")]);
    }

    #[test]
    fn test_unclosed_elements_closed_at_eof() {
        let tree = parse("<div><p>x");
        assert_eq!(tree.serialize(), "<div><p>x</p></div>");
    }

    #[test]
    fn test_doctype_skipped() {
        let tree = parse("<!DOCTYPE html><p>x</p>");
        assert_eq!(tree.serialize(), "<p>x</p>");
    }

    #[test]
    fn test_stray_angle_bracket_is_text() {
        let tree = parse("1 < 2");
        assert_eq!(tree.children(), &[Node::text("1 < 2")]);
        assert_eq!(tree.serialize(), "1 &lt; 2");
    }

    #[test]
    fn test_interpolation_braces_pass_through() {
        let tree = parse("<p>{{ user.name }}</p>");
        assert_eq!(tree.serialize(), "<p>{{ user.name }}</p>");
    }
}
