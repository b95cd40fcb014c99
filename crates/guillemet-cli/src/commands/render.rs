// File: src/commands/render.rs
// Purpose: Render a template file against a JSON data context

use anyhow::{Context as _, Result};
use guillemet::{update_table_tags, Context, Expander, HtmlParser, MarkupProvider, StaticRegistry};
use std::fs;
use std::path::Path;

pub fn run(
    template: &Path,
    data: Option<&Path>,
    templates: Option<&Path>,
    tables: bool,
    out: Option<&Path>,
) -> Result<()> {
    let source = fs::read_to_string(template)
        .with_context(|| format!("Failed to read template: {:?}", template))?;

    let context = match data {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read data file: {:?}", path))?;
            let json: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse JSON in {:?}", path))?;
            Context::from_json(json)?
        }
        None => Context::new(),
    };

    let parser = HtmlParser::new();
    let document = parser.parse(&source)?;

    // <template id> elements defined in the document itself resolve
    // through <insert>, alongside any partials directory.
    let mut registry = StaticRegistry::new();
    registry.harvest(&document);
    if let Some(dir) = templates {
        registry.load_dir(dir, &parser)?;
    }

    let expander = Expander::new(&parser).with_registry(&registry);
    let mut expanded = expander.expand(&document, &context)?;
    if tables {
        update_table_tags(&mut expanded);
    }
    let rendered = expanded.serialize();

    match out {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("Failed to write output: {:?}", path))?;
            println!("Rendered {:?} -> {:?}", template, path);
        }
        None => print!("{rendered}"),
    }

    Ok(())
}
