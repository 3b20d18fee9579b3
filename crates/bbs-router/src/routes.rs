//! Route table.
//!
//! An ordered list of `(pattern, page)` pairs. Patterns are `/`-separated
//! static segments with at most one `:name` parameter segment. Resolution is
//! first match in table order.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::path::{normalize_path, segments};

/// Page mounted by a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Page {
    /// Post listing.
    Home,
    /// Single post, takes the `id` input.
    PostDetail,
    /// Login form (delegates to the backend).
    Login,
    /// New post editor.
    CreatePost,
    /// First-visit UI version selection.
    UiSelect,
}

impl Page {
    /// Route name as the SPA knows it.
    pub fn name(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::PostDetail => "PostDetail",
            Self::Login => "Login",
            Self::CreatePost => "CreatePost",
            Self::UiSelect => "UiSelect",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Route table revision.
///
/// `Legacy` is the first release of the front end, before login, post
/// creation and UI selection existed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Revision {
    #[default]
    Current,
    Legacy,
}

const LEGACY_ROUTES: &[(&str, Page)] = &[("/", Page::Home), ("/post/:id", Page::PostDetail)];

const CURRENT_ROUTES: &[(&str, Page)] = &[
    ("/", Page::Home),
    ("/post/:id", Page::PostDetail),
    ("/login", Page::Login),
    ("/create-post", Page::CreatePost),
    ("/ui-select", Page::UiSelect),
];

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
}

/// A single compiled route.
#[derive(Clone, Debug)]
pub struct Route {
    pattern: String,
    page: Page,
    segments: Vec<Segment>,
}

impl Route {
    /// Compile a route pattern.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] if the pattern does not start with
    /// `/`, has an empty segment, an unnamed parameter, or more than one
    /// parameter.
    pub fn new(pattern: &str, page: Page) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: pattern.to_owned(),
            reason: reason.to_owned(),
        };

        if !pattern.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }
        if pattern.len() > 1 && pattern.ends_with('/') {
            return Err(invalid("must not end with '/'"));
        }

        let route = Self::compile(pattern, page);
        let mut params = 0;
        for segment in &route.segments {
            match segment {
                Segment::Static(s) if s.is_empty() => return Err(invalid("empty segment")),
                Segment::Param(name) if name.is_empty() => {
                    return Err(invalid("parameter needs a name"));
                }
                Segment::Param(_) => params += 1,
                Segment::Static(_) => {}
            }
        }
        if params > 1 {
            return Err(invalid("at most one parameter is supported"));
        }

        Ok(route)
    }

    fn compile(pattern: &str, page: Page) -> Self {
        let segments = segments(pattern)
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_owned()),
                None => Segment::Static(s.to_owned()),
            })
            .collect();
        Self {
            pattern: pattern.to_owned(),
            page,
            segments,
        }
    }

    /// Route pattern, e.g. `/post/:id`.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Page mounted by this route.
    pub fn page(&self) -> Page {
        self.page
    }

    /// Name of the positional parameter, if any.
    pub fn param_name(&self) -> Option<&str> {
        self.segments.iter().find_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Static(_) => None,
        })
    }

    fn matches(&self, normalized: &str) -> Option<BTreeMap<String, String>> {
        let mut params = BTreeMap::new();
        let mut path_segments = segments(normalized);

        for expected in &self.segments {
            let actual = path_segments.next()?;
            match expected {
                Segment::Static(s) if s.eq_ignore_ascii_case(actual) => {}
                Segment::Static(_) => return None,
                Segment::Param(_) if actual.is_empty() => return None,
                Segment::Param(name) => {
                    let value = percent_decode_str(actual).decode_utf8_lossy();
                    params.insert(name.clone(), value.into_owned());
                }
            }
        }

        if path_segments.next().is_some() {
            return None;
        }
        Some(params)
    }
}

/// Result of resolving a path against the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    /// Normalized path that was resolved.
    pub path: String,
    /// Page the router mounts.
    pub page: Page,
    /// Route parameters passed to the page as inputs.
    pub params: BTreeMap<String, String>,
}

impl RouteMatch {
    /// Get a parameter value by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Ordered route table.
#[derive(Clone, Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Build a table from `(pattern, page)` pairs, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is malformed or appears twice.
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, Page)>) -> Result<Self, RouteError> {
        let mut seen = HashSet::new();
        let mut routes = Vec::new();
        for (pattern, page) in entries {
            if !seen.insert(pattern.to_ascii_lowercase()) {
                return Err(RouteError::DuplicatePath(pattern.to_owned()));
            }
            routes.push(Route::new(pattern, page)?);
        }
        Ok(Self { routes })
    }

    /// Built-in table for the given front end revision.
    pub fn for_revision(revision: Revision) -> Self {
        let entries = match revision {
            Revision::Current => CURRENT_ROUTES,
            Revision::Legacy => LEGACY_ROUTES,
        };
        Self {
            routes: entries
                .iter()
                .map(|&(pattern, page)| Route::compile(pattern, page))
                .collect(),
        }
    }

    /// Resolve a navigation path to the first matching route.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        let normalized = normalize_path(path);
        self.routes.iter().find_map(|route| {
            route.matches(&normalized).map(|params| RouteMatch {
                path: normalized.to_string(),
                page: route.page,
                params,
            })
        })
    }

    /// Pattern of the first route that mounts `page`.
    pub fn path_for(&self, page: Page) -> Option<&str> {
        self.routes
            .iter()
            .find(|r| r.page == page)
            .map(Route::pattern)
    }

    /// Iterate routes in table order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table has no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::for_revision(Revision::Current)
    }
}
