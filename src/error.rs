use thiserror::Error;

/// Errors surfaced by diffing, mapping, and patch application.
///
/// Event dispatch does *not* use these: a dispatch that finds no handler
/// or no registered callback is a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A structural invariant was violated: a dangling node handle, a child
    /// index past the end of an element, an operation aimed at the wrong
    /// node kind, or a navigation past the bottom of the cursor stack.
    #[error("malformed tree: {0}")]
    MalformedTree(String),

    /// A name outside a closed variant set, e.g. an event kind that is not
    /// one of the delegated kinds.
    #[error("unknown variant `{found}`, expected one of {expected}")]
    UnknownVariant {
        found: String,
        expected: &'static str,
    },
}

impl TreeError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        TreeError::MalformedTree(reason.into())
    }
}
