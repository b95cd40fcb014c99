// File: src/error.rs
// Purpose: Expansion error taxonomy

use thiserror::Error;

/// Everything that can go wrong while expanding a template.
///
/// All of these are authoring-time errors in the template or the data
/// it is rendered against, never transient: expansion aborts on the
/// first one and no partial output is returned.
#[derive(Debug, Error)]
pub enum ExpandError {
    /// Wrong argument shape at the public boundary.
    #[error("invalid input: {0}")]
    InvalidInputType(String),

    /// A directive tag is missing its required attribute.
    #[error("<{tag}> tag expects a \"{attr}\" attribute")]
    MissingAttribute {
        tag: &'static str,
        attr: &'static str,
    },

    /// A `for` attribute that does not match `for="item of source"`.
    #[error("<repeat> \"for\" attribute must have the form for=\"item of source\", got {0:?}")]
    MalformedRepeat(String),

    /// Unbalanced brackets or parens, or a forbidden character in a
    /// condition.
    #[error("malformed accessor: {0}")]
    MalformedAccessor(String),

    /// A path segment names nothing in the data context.
    #[error("variable {0:?} is not defined")]
    UndefinedVariable(String),

    /// An operation applied to a value of the wrong kind.
    #[error("{name:?} is not {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },

    /// A repeat binding collides with existing data.
    #[error("variable {0:?} already exists in the data context")]
    DuplicateVariable(String),

    /// Call syntax applied to a non-callable value.
    #[error("{0:?} is not a function")]
    NotAFunction(String),

    /// A bracket index beyond the bounds of a sequence or string.
    #[error("index {index} is out of range for {name:?} (length {len})")]
    IndexOutOfRange {
        name: String,
        index: i64,
        len: usize,
    },

    /// A literal token that is neither a boolean, a quoted string, nor
    /// a number.
    #[error("cannot convert {0:?} to a primitive value")]
    InvalidPrimitiveLiteral(String),

    /// An insert references an id absent from the template registry.
    #[error("template {0:?} is not registered")]
    TemplateNotFound(String),

    #[error(transparent)]
    Markup(#[from] guillemet_markup::MarkupError),
}
