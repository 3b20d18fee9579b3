//! Development reverse proxy.
//!
//! Requests under a configured prefix (`/api`, `/client` by default) are sent
//! to the remote backend so a locally served front end can reach it.

mod forward;
mod rules;

pub(crate) use forward::Forwarder;
pub(crate) use rules::ProxyRules;
