// File: src/commands/check.rs
// Purpose: Lint a template's directives without rendering it

use anyhow::{Context as _, Result};
use guillemet::cond;
use guillemet::directive::{DirectiveKind, IfSpec, InsertSpec, RepeatSpec};
use guillemet::{HtmlParser, MarkupProvider, Node};
use std::fs;
use std::path::Path;

pub fn run(template: &Path) -> Result<()> {
    let source = fs::read_to_string(template)
        .with_context(|| format!("Failed to read template: {:?}", template))?;
    let document = HtmlParser::new().parse(&source)?;

    let problems = check_tree(&document);
    if problems.is_empty() {
        println!("{:?}: no directive problems found", template);
        return Ok(());
    }
    for problem in &problems {
        eprintln!("{:?}: {}", template, problem);
    }
    anyhow::bail!("{} directive problem(s) found", problems.len())
}

/// Collect every static directive problem in the tree. Checked without
/// a data context, so only attribute shape and condition syntax are
/// covered; unresolvable paths surface at render time instead.
fn check_tree(document: &Node) -> Vec<String> {
    let mut problems = Vec::new();
    match document {
        Node::Element(_) => check_children(std::slice::from_ref(document), &mut problems),
        Node::Fragment(kids) => check_children(kids, &mut problems),
        _ => {}
    }
    problems
}

fn check_children(nodes: &[Node], problems: &mut Vec<String>) {
    // Tracks whether the previous non-blank node was an <if>, so a
    // stray <else> can be reported.
    let mut prev_if = false;
    for node in nodes {
        if let Node::Text(text) = node {
            if text.trim().is_empty() {
                continue;
            }
        }
        let el = match node {
            Node::Element(el) => el,
            _ => {
                prev_if = false;
                continue;
            }
        };
        match DirectiveKind::of(el) {
            DirectiveKind::Repeat => {
                if let Err(e) = RepeatSpec::parse(el) {
                    problems.push(e.to_string());
                }
            }
            DirectiveKind::If => {
                match IfSpec::parse(el) {
                    Ok(spec) => {
                        if let Err(e) = cond::check_syntax(&spec.cond) {
                            problems.push(e.to_string());
                        }
                    }
                    Err(e) => problems.push(e.to_string()),
                }
            }
            DirectiveKind::Else => {
                if !prev_if {
                    problems.push("<else> tag without an adjacent preceding <if>".to_string());
                }
            }
            DirectiveKind::Insert => {
                if let Err(e) = InsertSpec::parse(el) {
                    problems.push(e.to_string());
                }
            }
            DirectiveKind::Plain => {}
        }
        check_children(&el.children, problems);
        prev_if = DirectiveKind::of(el) == DirectiveKind::If;
    }
}
