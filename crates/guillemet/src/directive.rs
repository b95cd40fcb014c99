// File: src/directive.rs
// Purpose: Directive classification and attribute parsing

use crate::error::ExpandError;
use guillemet_markup::Element;
use once_cell::sync::Lazy;
use regex::Regex;

/// The directive vocabulary. Every element classifies as exactly one of
/// these; `Plain` is everything the expander leaves alone.
///
/// `<template>` elements are Plain: the walks treat their content as
/// inert separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Repeat,
    If,
    Else,
    Insert,
    Plain,
}

impl DirectiveKind {
    pub fn of(el: &Element) -> DirectiveKind {
        match el.tag.as_str() {
            "repeat" => DirectiveKind::Repeat,
            "if" => DirectiveKind::If,
            "else" => DirectiveKind::Else,
            "insert" => DirectiveKind::Insert,
            _ => DirectiveKind::Plain,
        }
    }
}

// One binding token, the `of` keyword, a non-empty source path.
static FOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\S+)\s+of\s+(\S.*?)\s*$").unwrap());

/// Parsed `for="item of source"` attribute of a `<repeat>`.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatSpec {
    pub binding: String,
    pub source: String,
}

impl RepeatSpec {
    /// A missing or empty `for` attribute is `MissingAttribute`; a
    /// present one that does not match `item of source` is the
    /// dedicated `MalformedRepeat` error.
    pub fn parse(el: &Element) -> Result<RepeatSpec, ExpandError> {
        let attr = match el.attr("for") {
            Some(a) if !a.is_empty() => a,
            _ => {
                return Err(ExpandError::MissingAttribute {
                    tag: "repeat",
                    attr: "for",
                })
            }
        };
        match FOR_RE.captures(attr) {
            Some(caps) => Ok(RepeatSpec {
                binding: caps[1].to_string(),
                source: caps[2].to_string(),
            }),
            None => Err(ExpandError::MalformedRepeat(attr.to_string())),
        }
    }
}

/// Parsed `cond="..."` attribute of an `<if>`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfSpec {
    pub cond: String,
}

impl IfSpec {
    pub fn parse(el: &Element) -> Result<IfSpec, ExpandError> {
        match el.attr("cond") {
            Some(c) if !c.is_empty() => Ok(IfSpec {
                cond: c.to_string(),
            }),
            _ => Err(ExpandError::MissingAttribute {
                tag: "if",
                attr: "cond",
            }),
        }
    }
}

/// Parsed `template="..."` attribute of an `<insert>`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertSpec {
    pub id: String,
}

impl InsertSpec {
    pub fn parse(el: &Element) -> Result<InsertSpec, ExpandError> {
        match el.attr("template") {
            Some(id) if !id.is_empty() => Ok(InsertSpec { id: id.to_string() }),
            _ => Err(ExpandError::MissingAttribute {
                tag: "insert",
                attr: "template",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(DirectiveKind::of(&Element::new("repeat")), DirectiveKind::Repeat);
        assert_eq!(DirectiveKind::of(&Element::new("if")), DirectiveKind::If);
        assert_eq!(DirectiveKind::of(&Element::new("else")), DirectiveKind::Else);
        assert_eq!(DirectiveKind::of(&Element::new("insert")), DirectiveKind::Insert);
        assert_eq!(DirectiveKind::of(&Element::new("div")), DirectiveKind::Plain);
        assert_eq!(DirectiveKind::of(&Element::new("template")), DirectiveKind::Plain);
    }

    #[test]
    fn test_repeat_spec_parses() {
        let el = Element::new("repeat").with_attr("for", "i of items");
        let spec = RepeatSpec::parse(&el).unwrap();
        assert_eq!(spec.binding, "i");
        assert_eq!(spec.source, "items");
    }

    #[test]
    fn test_repeat_spec_tolerates_extra_whitespace() {
        let el = Element::new("repeat").with_attr("for", "  row   of   data.rows  ");
        let spec = RepeatSpec::parse(&el).unwrap();
        assert_eq!(spec.binding, "row");
        assert_eq!(spec.source, "data.rows");
    }

    #[test]
    fn test_repeat_spec_source_may_contain_spaces() {
        let el = Element::new("repeat").with_attr("for", "i of of items");
        let spec = RepeatSpec::parse(&el).unwrap();
        assert_eq!(spec.binding, "i");
        assert_eq!(spec.source, "of items");
    }

    #[test]
    fn test_repeat_spec_malformed() {
        for attr in ["i in items", "items", "i of", " of items"] {
            let el = Element::new("repeat").with_attr("for", attr);
            assert!(
                matches!(RepeatSpec::parse(&el), Err(ExpandError::MalformedRepeat(_))),
                "accepted {attr:?}"
            );
        }
    }

    #[test]
    fn test_repeat_spec_missing_or_empty_attr() {
        let bare = Element::new("repeat");
        assert!(matches!(
            RepeatSpec::parse(&bare),
            Err(ExpandError::MissingAttribute { tag: "repeat", attr: "for" })
        ));
        let empty = Element::new("repeat").with_attr("for", "");
        assert!(matches!(
            RepeatSpec::parse(&empty),
            Err(ExpandError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_if_and_insert_specs() {
        let ift = Element::new("if").with_attr("cond", "{{a}} > 3");
        assert_eq!(IfSpec::parse(&ift).unwrap().cond, "{{a}} > 3");
        assert!(matches!(
            IfSpec::parse(&Element::new("if")),
            Err(ExpandError::MissingAttribute { tag: "if", attr: "cond" })
        ));

        let ins = Element::new("insert").with_attr("template", "header");
        assert_eq!(InsertSpec::parse(&ins).unwrap().id, "header");
        assert!(matches!(
            InsertSpec::parse(&Element::new("insert").with_attr("template", "")),
            Err(ExpandError::MissingAttribute { tag: "insert", attr: "template" })
        ));
    }
}
