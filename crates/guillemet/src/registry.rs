// File: src/registry.rs
// Purpose: Named template lookup for <insert> resolution

use anyhow::{Context, Result};
use guillemet_markup::{MarkupProvider, Node};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Source of named templates for `<insert template="...">` resolution.
pub trait TemplateRegistry {
    fn lookup(&self, id: &str) -> Option<&Node>;
}

/// In-memory registry. Templates come from programmatic registration,
/// from harvesting `<template id="...">` elements out of a parsed
/// document, or from a directory of `.html` files keyed by file stem.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    templates: HashMap<String, Node>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template tree under an explicit id. Replaces any
    /// previous entry with the same id.
    pub fn register(&mut self, id: impl Into<String>, template: Node) {
        self.templates.insert(id.into(), template);
    }

    /// Collect every `<template id="...">` element in the document and
    /// register its content under that id. The first template seen with
    /// a given id wins, matching document-order id lookup. Returns the
    /// number of templates registered.
    pub fn harvest(&mut self, document: &Node) -> usize {
        let mut found = Vec::new();
        document.find_all("template", &mut found);

        let mut count = 0;
        for el in found {
            let id = match el.attr("id") {
                Some(id) if !id.is_empty() => id,
                _ => continue,
            };
            if self.templates.contains_key(id) {
                continue;
            }
            debug!(id = %id, "harvested template");
            self.templates
                .insert(id.to_string(), Node::Fragment(el.children.clone()));
            count += 1;
        }
        count
    }

    /// Recursively load every `.html` file under `dir`, registering each
    /// file's content under its file stem.
    pub fn load_dir(&mut self, dir: &Path, provider: &dyn MarkupProvider) -> Result<usize> {
        let mut count = 0;
        self.load_directory(dir, provider, &mut count)?;
        Ok(count)
    }

    fn load_directory(
        &mut self,
        dir: &Path,
        provider: &dyn MarkupProvider,
        count: &mut usize,
    ) -> Result<()> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read template directory: {:?}", dir))?;

        for entry in entries {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir() {
                self.load_directory(&path, provider, count)?;
            } else if path.extension().and_then(|s| s.to_str()) == Some("html") {
                self.load_file(&path, provider)?;
                *count += 1;
            }
        }

        Ok(())
    }

    fn load_file(&mut self, path: &Path, provider: &dyn MarkupProvider) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read template: {:?}", path))?;
        let doc = provider
            .parse(&content)
            .with_context(|| format!("Failed to parse template: {:?}", path))?;

        // Template name is the file name without extension
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();

        let children = match doc {
            Node::Fragment(children) => children,
            other => vec![other],
        };

        debug!(name = %name, path = ?path, "loaded template file");
        self.templates.insert(name, Node::Fragment(children));
        Ok(())
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.templates.keys().map(|k| k.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateRegistry for StaticRegistry {
    fn lookup(&self, id: &str) -> Option<&Node> {
        self.templates.get(id)
    }
}
