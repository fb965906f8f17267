//! The two managed roots under the watched directory.

use crate::config::WatchConfig;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct LibraryLayout {
    pub watch_root: PathBuf,
    pub library_name: String,
    pub manual_name: String,
    pub library_root: PathBuf,
    pub manual_root: PathBuf,
}

impl LibraryLayout {
    pub fn new(watch_root: &Path, cfg: &WatchConfig) -> Self {
        let watch_root = fs::canonicalize(watch_root).unwrap_or_else(|_| watch_root.to_path_buf());
        Self {
            library_root: watch_root.join(&cfg.library_name),
            manual_root: watch_root.join(&cfg.manual_library_name),
            library_name: cfg.library_name.clone(),
            manual_name: cfg.manual_library_name.clone(),
            watch_root,
        }
    }

    /// Creates both roots if missing.
    pub fn ensure_exists(&self) -> anyhow::Result<()> {
        for (root, name) in [
            (&self.library_root, &self.library_name),
            (&self.manual_root, &self.manual_name),
        ] {
            if !root.exists() {
                fs::create_dir_all(root)
                    .with_context(|| format!("creating {}", root.display()))?;
                info!(path = %root.display(), "created {}", name);
            }
        }
        Ok(())
    }

    /// True for paths inside (or equal to) either managed root.
    pub fn is_managed(&self, path: &Path) -> bool {
        let under = |p: &Path| p.starts_with(&self.library_root) || p.starts_with(&self.manual_root);
        if under(path) {
            return true;
        }
        fs::canonicalize(path).map(|p| under(&p)).unwrap_or(false)
    }

    pub fn is_root_name(&self, name: &str) -> bool {
        name == self.library_name || name == self.manual_name
    }
}

pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roots_are_created_and_recognized() {
        let dir = tempfile::tempdir().unwrap();
        let layout = LibraryLayout::new(dir.path(), &WatchConfig::default());
        layout.ensure_exists().unwrap();
        assert!(layout.library_root.is_dir());
        assert!(layout.manual_root.is_dir());

        let inside = layout.library_root.join("Images").join("cat.png");
        assert!(layout.is_managed(&inside));
        assert!(!layout.is_managed(&layout.watch_root.join("cat.png")));
        assert!(layout.is_root_name("Manual Library"));
    }

    #[test]
    fn dotfiles_are_hidden() {
        assert!(is_hidden(Path::new("/tmp/.DS_Store")));
        assert!(!is_hidden(Path::new("/tmp/report.pdf")));
    }
}
