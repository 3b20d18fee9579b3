//! Compiled front-end bundle access.
//!
//! The SPA build output (`index.html` plus hashed JS/CSS assets) is read from a
//! directory at runtime, so a rebuild of the front end is picked up without
//! restarting the gateway.

use std::path::{Component, Path, PathBuf};

/// Entry document of the SPA.
pub const INDEX_HTML: &str = "index.html";

/// Directory holding the compiled SPA bundle.
#[derive(Clone, Debug)]
pub struct AssetDir {
    root: PathBuf,
}

impl AssetDir {
    /// Serve assets from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Bundle root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get an asset by path relative to the bundle root.
    ///
    /// Returns `None` if the file is missing or the path tries to leave the
    /// bundle directory.
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        let relative = Path::new(path);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        std::fs::read(self.root.join(relative)).ok()
    }

    /// Get the SPA entry document.
    pub fn index(&self) -> Option<Vec<u8>> {
        self.get(INDEX_HTML)
    }

    /// Whether the bundle has been built.
    pub fn has_index(&self) -> bool {
        self.root.join(INDEX_HTML).is_file()
    }
}

/// Return the MIME type string for the given file path.
pub fn mime_for(path: &str) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}
