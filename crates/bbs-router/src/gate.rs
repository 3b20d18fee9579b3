//! Navigation gate.
//!
//! Runs before every page navigation. Visitors who have not chosen a UI
//! version yet are sent to the selection page; everyone else proceeds.

use crate::path::normalize_path;

/// Path of the UI selection page.
pub const DEFAULT_SELECTION_PATH: &str = "/ui-select";

/// Storage key of the UI preference flag.
pub const DEFAULT_PREFERENCE_KEY: &str = "uiVersion";

/// Outcome of a gate check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// Let the navigation complete unmodified.
    Proceed,
    /// Cancel the navigation and go to this path instead.
    Redirect(String),
}

/// Whether a stored preference value counts as set.
///
/// An empty value is treated like a missing one, as is any read failure on
/// the caller's side.
pub fn has_preference(preference: Option<&str>) -> bool {
    preference.is_some_and(|value| !value.is_empty())
}

/// Pre-navigation guard.
#[derive(Clone, Debug)]
pub struct NavigationGate {
    selection_path: String,
}

impl NavigationGate {
    /// Create a gate redirecting to `selection_path`.
    ///
    /// The path is normalized once here, so the redirect target always passes
    /// the exemption check on the next navigation.
    pub fn new(selection_path: &str) -> Self {
        Self {
            selection_path: normalize_path(selection_path).into_owned(),
        }
    }

    /// Normalized selection page path.
    pub fn selection_path(&self) -> &str {
        &self.selection_path
    }

    /// Whether `destination` is the selection page.
    ///
    /// ASCII case is ignored, matching how the route table compares static
    /// segments.
    pub fn is_selection_page(&self, destination: &str) -> bool {
        normalize_path(destination).eq_ignore_ascii_case(&self.selection_path)
    }

    /// Decide whether a navigation to `destination` may proceed.
    pub fn check(&self, preference: Option<&str>, destination: &str) -> GateDecision {
        if has_preference(preference) || self.is_selection_page(destination) {
            GateDecision::Proceed
        } else {
            GateDecision::Redirect(self.selection_path.clone())
        }
    }
}

impl Default for NavigationGate {
    fn default() -> Self {
        Self::new(DEFAULT_SELECTION_PATH)
    }
}
