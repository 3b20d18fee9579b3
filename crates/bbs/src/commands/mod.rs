//! CLI command implementations.

pub(crate) mod check;
pub(crate) mod routes;
pub(crate) mod serve;

pub(crate) use check::CheckArgs;
pub(crate) use routes::RoutesArgs;
pub(crate) use serve::ServeArgs;

use bbs_config::Revision;

/// Map the `--legacy` flag to a revision override.
fn revision_override(legacy: bool) -> Option<Revision> {
    legacy.then_some(Revision::Legacy)
}
