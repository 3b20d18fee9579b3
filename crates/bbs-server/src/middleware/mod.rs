//! Request and response middleware.

pub(crate) mod host;
pub(crate) mod security;
