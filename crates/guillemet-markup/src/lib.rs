// Guillemet markup - tree model and lenient HTML parsing
// Collaborator crate the template expansion engine is written against

pub mod node;
pub mod parser;
pub mod tables;

// Re-export the tree and provider surface
pub use node::{serialize_all, Element, Node};
pub use parser::{HtmlParser, MarkupError, MarkupProvider};
pub use tables::update_table_tags;
