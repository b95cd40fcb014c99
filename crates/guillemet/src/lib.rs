// Guillemet - Markup template expansion engine
// Repeat / if-else / insert directives with {{ }} interpolation over a data context

pub mod error;
pub mod value;

// Engine modules
pub mod coerce;
pub mod cond;
pub mod directive;
pub mod expand;
pub mod path;
pub mod registry;

// Re-export the expansion surface
pub use error::ExpandError;
pub use expand::Expander;
pub use registry::{StaticRegistry, TemplateRegistry};
pub use value::{Callable, Context, Value, ValueSet};

// Re-export commonly used types from the markup collaborator
pub use guillemet_markup::{
    serialize_all, update_table_tags, Element, HtmlParser, MarkupError, MarkupProvider, Node,
};
