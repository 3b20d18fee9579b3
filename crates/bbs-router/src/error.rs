//! Route table errors.

/// Error building a [`RouteTable`](crate::RouteTable).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouteError {
    /// Pattern is malformed.
    #[error("Invalid route pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two routes share the same pattern.
    #[error("Duplicate route path: {0}")]
    DuplicatePath(String),
}
