// File: src/expand.rs
// Purpose: The four-pass template expansion pipeline

use crate::cond;
use crate::directive::{DirectiveKind, IfSpec, InsertSpec, RepeatSpec};
use crate::error::ExpandError;
use crate::path;
use crate::registry::TemplateRegistry;
use crate::value::{Context, Value};
use guillemet_markup::{serialize_all, Element, MarkupProvider, Node};
use tracing::{debug, trace};

/// Expands a template tree against a data context.
///
/// Expansion runs four passes over every level of the tree, in a fixed
/// order: `<repeat>` resolution, `<if>`/`<else>` resolution, `<insert>`
/// resolution, then textual `{{ }}` interpolation on the serialized
/// result (which is re-parsed before return). Each directive's body is
/// expanded by the same four-pass pipeline, so directives nest freely.
///
/// The caller's template and context are never mutated; the context is
/// deep-copied once per `expand` call.
pub struct Expander<'a> {
    provider: &'a dyn MarkupProvider,
    registry: Option<&'a dyn TemplateRegistry>,
}

impl<'a> Expander<'a> {
    pub fn new(provider: &'a dyn MarkupProvider) -> Self {
        Self {
            provider,
            registry: None,
        }
    }

    /// Attach a template registry for `<insert>` resolution. Without
    /// one, every `<insert>` fails with `TemplateNotFound`.
    pub fn with_registry(mut self, registry: &'a dyn TemplateRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Expand `template` against `context`. The template must be an
    /// element or fragment; it acts as a container, and the result is a
    /// fragment holding its expanded children.
    pub fn expand(&self, template: &Node, context: &Context) -> Result<Node, ExpandError> {
        let children = match template {
            Node::Element(el) => el.children.clone(),
            Node::Fragment(kids) => kids.clone(),
            other => {
                return Err(ExpandError::InvalidInputType(format!(
                    "template must be an element or fragment, got {}",
                    node_kind(other)
                )))
            }
        };

        let mut scope = context.clone();
        debug!(nodes = children.len(), "expanding template");
        Ok(Node::Fragment(self.expand_children(children, &mut scope)?))
    }

    /// Parse, expand, and serialize in one step.
    pub fn expand_text(&self, text: &str, context: &Context) -> Result<String, ExpandError> {
        let tree = self.provider.parse(text)?;
        Ok(self.expand(&tree, context)?.serialize())
    }

    // The pipeline for one level of the tree. Recursion on directive
    // bodies re-enters here, so every body sees all four passes.
    fn expand_children(
        &self,
        nodes: Vec<Node>,
        scope: &mut Context,
    ) -> Result<Vec<Node>, ExpandError> {
        let nodes = self.resolve_repeats(nodes, scope)?;
        let nodes = self.resolve_conditionals(nodes, scope)?;
        let nodes = self.resolve_inserts(nodes, scope)?;

        let text = serialize_all(&nodes);
        let text = strip_comments(&text);
        let text = interpolate(&text, scope)?;

        let reparsed = self.provider.parse(&text)?;
        Ok(match reparsed {
            Node::Fragment(kids) => kids,
            other => vec![other],
        })
    }

    // Walks descend through every element in document order except
    // `<template>` elements, whose content is inert for directive
    // resolution. A directive's expansion output is spliced in place
    // and not re-scanned by the pass that produced it.

    fn resolve_repeats(
        &self,
        nodes: Vec<Node>,
        scope: &mut Context,
    ) -> Result<Vec<Node>, ExpandError> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Element(mut el) => match DirectiveKind::of(&el) {
                    DirectiveKind::Repeat => out.extend(self.expand_repeat(&el, scope)?),
                    _ if el.tag == "template" => out.push(Node::Element(el)),
                    _ => {
                        let children = std::mem::take(&mut el.children);
                        el.children = self.resolve_repeats(children, scope)?;
                        out.push(Node::Element(el));
                    }
                },
                other => out.push(other),
            }
        }
        Ok(out)
    }

    fn expand_repeat(&self, el: &Element, scope: &mut Context) -> Result<Vec<Node>, ExpandError> {
        let spec = RepeatSpec::parse(el)?;
        let source = path::resolve(&spec.source, scope)?;
        let items: Vec<Value> = match source {
            Value::List(items) => items,
            Value::Set(set) => set.into_iter().collect(),
            _ => {
                return Err(ExpandError::TypeMismatch {
                    name: spec.source.clone(),
                    expected: "a sequence or set",
                })
            }
        };

        // The binding may shadow an existing Null entry but nothing
        // else; it is restored when the repeat finishes.
        let had_null = match scope.get(&spec.binding) {
            None => false,
            Some(Value::Null) => true,
            Some(_) => return Err(ExpandError::DuplicateVariable(spec.binding.clone())),
        };

        trace!(binding = %spec.binding, items = items.len(), "expanding repeat");
        let mut output = Vec::new();
        for item in items {
            scope.set(spec.binding.clone(), item);
            output.extend(self.expand_children(el.children.clone(), scope)?);
        }

        if had_null {
            scope.set(spec.binding.clone(), Value::Null);
        } else {
            scope.remove(&spec.binding);
        }
        Ok(output)
    }

    fn resolve_conditionals(
        &self,
        nodes: Vec<Node>,
        scope: &mut Context,
    ) -> Result<Vec<Node>, ExpandError> {
        let mut out = Vec::with_capacity(nodes.len());
        // After an <if>, Some(truth) until its adjacency is settled:
        // blank text is skipped, an <else> right after belongs to it.
        let mut pending: Option<bool> = None;

        for node in nodes {
            if let Some(branch_taken) = pending.take() {
                if node.is_blank_text() {
                    pending = Some(branch_taken);
                    out.push(node);
                    continue;
                }
                if directive_of(&node) == DirectiveKind::Else {
                    if let Node::Element(else_el) = node {
                        if !branch_taken {
                            out.extend(self.expand_children(else_el.children, scope)?);
                        }
                    }
                    continue;
                }
                // Not adjacent to an <else>; process the node normally.
            }

            match node {
                Node::Element(mut el) => match DirectiveKind::of(&el) {
                    DirectiveKind::If => {
                        let spec = IfSpec::parse(&el)?;
                        let truth = cond::evaluate(&spec.cond, scope)?;
                        trace!(cond = %spec.cond, truth, "resolved conditional");
                        if truth {
                            out.extend(self.expand_children(el.children, scope)?);
                        }
                        pending = Some(truth);
                    }
                    _ if el.tag == "template" => out.push(Node::Element(el)),
                    // A dangling <else> stays put, but its children are
                    // still walked like any other element's.
                    _ => {
                        let children = std::mem::take(&mut el.children);
                        el.children = self.resolve_conditionals(children, scope)?;
                        out.push(Node::Element(el));
                    }
                },
                other => out.push(other),
            }
        }
        Ok(out)
    }

    fn resolve_inserts(
        &self,
        nodes: Vec<Node>,
        scope: &mut Context,
    ) -> Result<Vec<Node>, ExpandError> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Element(mut el) => match DirectiveKind::of(&el) {
                    DirectiveKind::Insert => {
                        let spec = InsertSpec::parse(&el)?;
                        let template = self
                            .registry
                            .and_then(|r| r.lookup(&spec.id))
                            .ok_or_else(|| ExpandError::TemplateNotFound(spec.id.clone()))?;
                        trace!(id = %spec.id, "inserting template");
                        let body = match template {
                            Node::Fragment(kids) => kids.clone(),
                            other => vec![other.clone()],
                        };
                        out.extend(self.expand_children(body, scope)?);
                    }
                    _ if el.tag == "template" => out.push(Node::Element(el)),
                    _ => {
                        let children = std::mem::take(&mut el.children);
                        el.children = self.resolve_inserts(children, scope)?;
                        out.push(Node::Element(el));
                    }
                },
                other => out.push(other),
            }
        }
        Ok(out)
    }
}

fn directive_of(node: &Node) -> DirectiveKind {
    match node {
        Node::Element(el) => DirectiveKind::of(el),
        _ => DirectiveKind::Plain,
    }
}

fn node_kind(node: &Node) -> &'static str {
    match node {
        Node::Element(_) => "an element",
        Node::Text(_) => "a text node",
        Node::Comment(_) => "a comment",
        Node::Fragment(_) => "a fragment",
    }
}

// Removes `<!-- ... -->` spans, pairing each first opener with the
// first closer after it. An unterminated comment is left alone.
fn strip_comments(text: &str) -> String {
    let mut text = text.to_string();
    loop {
        let start = match text.find("<!--") {
            Some(s) => s,
            None => break,
        };
        let end = match text[start + 4..].find("-->") {
            Some(e) => start + 4 + e,
            None => break,
        };
        text.replace_range(start..end + 3, "");
    }
    text
}

// Resolves every `{{ path }}` span against the scope. The scan restarts
// from the top of the text after each splice, so spliced-in values are
// themselves scanned again. Not nesting-aware: the first `}}` after an
// opener closes it.
fn interpolate(text: &str, scope: &Context) -> Result<String, ExpandError> {
    let mut text = text.to_string();
    loop {
        let start = match text.find("{{") {
            Some(s) => s,
            None => break,
        };
        let end = match text[start + 2..].find("}}") {
            Some(e) => start + 2 + e,
            None => break,
        };

        let expr = text[start + 2..end].trim();
        let value = path::resolve(expr, scope)?;
        trace!(expr = %expr, "interpolated variable");
        let rendered = value.to_string();
        text.replace_range(start..end + 2, &rendered);
    }
    Ok(text)
}
