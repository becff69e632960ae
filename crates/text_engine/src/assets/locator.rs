//! Resource locator
//!
//! Resolves relative asset paths (fonts, compiled shaders) against a list of
//! search roots, so binaries work when launched from the workspace root or
//! from inside `target/`.

use std::path::{Path, PathBuf};

/// Resolves relative asset paths against ordered search roots
#[derive(Debug, Clone)]
pub struct ResourceLocator {
    roots: Vec<PathBuf>,
}

impl ResourceLocator {
    /// Roots searched by [`ResourceLocator::default`]
    pub const DEFAULT_ROOTS: [&'static str; 4] = [
        "resources",
        "../resources",
        "../../resources",
        ".",
    ];

    /// Create a locator with explicit search roots, searched in order
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Search roots, in resolution order
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Resolve `relative` to the first existing file under a search root
    ///
    /// Absolute paths are returned as-is when they exist. Empty paths never
    /// resolve.
    pub fn resolve<P: AsRef<Path>>(&self, relative: P) -> Option<PathBuf> {
        let relative = relative.as_ref();
        if relative.as_os_str().is_empty() {
            return None;
        }

        if relative.is_absolute() {
            return relative.is_file().then(|| relative.to_path_buf());
        }

        let found = self
            .roots
            .iter()
            .map(|root| root.join(relative))
            .find(|candidate| candidate.is_file());

        match &found {
            Some(path) => log::debug!("Resolved {} -> {}", relative.display(), path.display()),
            None => log::debug!("Could not resolve {} under {:?}", relative.display(), self.roots),
        }
        found
    }
}

impl Default for ResourceLocator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ROOTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("text_engine_locator_{}_{}", std::process::id(), name));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_resolves_first_matching_root() {
        let first = scratch_dir("first");
        let second = scratch_dir("second");
        std::fs::create_dir_all(second.join("fonts")).unwrap();
        std::fs::write(second.join("fonts/test.ttf"), b"font").unwrap();

        let locator = ResourceLocator::new([first.clone(), second.clone()]);
        let resolved = locator.resolve("fonts/test.ttf");

        assert_eq!(resolved, Some(second.join("fonts/test.ttf")));
        std::fs::remove_dir_all(first).ok();
        std::fs::remove_dir_all(second).ok();
    }

    #[test]
    fn test_missing_file_does_not_resolve() {
        let root = scratch_dir("missing");
        let locator = ResourceLocator::new([root.clone()]);

        assert_eq!(locator.resolve("fonts/absent.ttf"), None);
        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn test_empty_path_does_not_resolve() {
        let locator = ResourceLocator::new(["."]);
        assert_eq!(locator.resolve(""), None);
    }

    #[test]
    fn test_default_roots() {
        let locator = ResourceLocator::default();
        assert_eq!(locator.roots().len(), ResourceLocator::DEFAULT_ROOTS.len());
        assert_eq!(locator.roots()[0], PathBuf::from("resources"));
    }
}
