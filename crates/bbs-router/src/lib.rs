//! Client-side routing for the BBS front end.
//!
//! This crate holds the two pieces of navigation logic the gateway needs,
//! with no I/O of its own:
//!
//! - [`RouteTable`]: ordered `pattern -> page` lookup with a single positional
//!   parameter (`/post/:id`)
//! - [`NavigationGate`]: decides whether a navigation proceeds or is redirected
//!   to the UI selection page, given the visitor's stored preference
//!
//! # Quick Start
//!
//! ```
//! use bbs_router::{GateDecision, NavigationGate, Page, Revision, RouteTable};
//!
//! let table = RouteTable::for_revision(Revision::Current);
//! let matched = table.resolve("/post/42").unwrap();
//! assert_eq!(matched.page, Page::PostDetail);
//! assert_eq!(matched.param("id"), Some("42"));
//!
//! let gate = NavigationGate::default();
//! assert_eq!(
//!     gate.check(None, "/post/42"),
//!     GateDecision::Redirect("/ui-select".to_owned())
//! );
//! assert_eq!(gate.check(Some("v2"), "/post/42"), GateDecision::Proceed);
//! ```

mod error;
mod gate;
mod path;
mod routes;

pub use error::RouteError;
pub use gate::{
    DEFAULT_PREFERENCE_KEY, DEFAULT_SELECTION_PATH, GateDecision, NavigationGate, has_preference,
};
pub use path::normalize_path;
pub use routes::{Page, Revision, Route, RouteMatch, RouteTable};
