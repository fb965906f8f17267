//! Lists the top level of the watched directory.

use crate::library::{is_hidden, LibraryLayout};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone)]
pub struct Scanner {
    layout: LibraryLayout,
    excludes: GlobSet,
}

impl Scanner {
    pub fn new(layout: LibraryLayout, excludes: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            layout,
            excludes: build_globset(excludes)?,
        })
    }

    pub fn layout(&self) -> &LibraryLayout {
        &self.layout
    }

    /// Regular, visible, non-excluded files directly under the watched
    /// directory, ordered by file name.
    pub fn eligible_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        Ok(self
            .top_level()?
            .into_iter()
            .filter(|e| e.path().is_file())
            .map(DirEntry::into_path)
            .filter(|p| !self.layout.is_managed(p))
            .collect())
    }

    /// Subdirectories other than the managed roots, ordered by name.
    pub fn stray_directories(&self) -> anyhow::Result<Vec<PathBuf>> {
        Ok(self
            .top_level()?
            .into_iter()
            .filter(|e| e.path().is_dir())
            .filter(|e| {
                let name = e.file_name().to_string_lossy();
                !self.layout.is_root_name(&name)
            })
            .map(DirEntry::into_path)
            .collect())
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        path.file_name()
            .map(|n| self.excludes.is_match(Path::new(n)))
            .unwrap_or(false)
    }

    fn top_level(&self) -> anyhow::Result<Vec<DirEntry>> {
        if !self.layout.watch_root.is_dir() {
            anyhow::bail!(
                "watched directory not found: {}",
                self.layout.watch_root.display()
            );
        }
        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.layout.watch_root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(e) => e,
                // The root itself being unreadable is fatal for this listing.
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(_) => continue,
            };
            if is_hidden(entry.path()) || self.is_excluded(entry.path()) {
                continue;
            }
            entries.push(entry);
        }
        Ok(entries)
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WatchConfig;
    use std::fs;

    fn setup(excludes: &[&str]) -> (tempfile::TempDir, Scanner) {
        let dir = tempfile::tempdir().unwrap();
        let layout = LibraryLayout::new(dir.path(), &WatchConfig::default());
        layout.ensure_exists().unwrap();
        let excludes: Vec<String> = excludes.iter().map(|s| s.to_string()).collect();
        let scanner = Scanner::new(layout, &excludes).unwrap();
        (dir, scanner)
    }

    #[test]
    fn lists_only_visible_top_level_files_in_name_order() {
        let (_dir, scanner) = setup(&[]);
        let root = scanner.layout().watch_root.clone();
        fs::write(root.join("b.txt"), "b").unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::write(root.join(".hidden"), "h").unwrap();
        fs::create_dir(root.join("Projects")).unwrap();
        fs::write(root.join("Projects").join("nested.txt"), "n").unwrap();
        fs::write(scanner.layout().library_root.join("managed.txt"), "m").unwrap();

        let files = scanner.eligible_files().unwrap();
        assert_eq!(files, vec![root.join("a.txt"), root.join("b.txt")]);
    }

    #[test]
    fn stray_directories_skip_roots_and_hidden() {
        let (_dir, scanner) = setup(&[]);
        let root = scanner.layout().watch_root.clone();
        fs::create_dir(root.join("Projects")).unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        assert_eq!(
            scanner.stray_directories().unwrap(),
            vec![root.join("Projects")]
        );
    }

    #[test]
    fn exclude_globs_apply_to_names() {
        let (_dir, scanner) = setup(&["*.crdownload", "*.part"]);
        let root = scanner.layout().watch_root.clone();
        fs::write(root.join("movie.mp4.part"), "x").unwrap();
        fs::write(root.join("setup.crdownload"), "x").unwrap();
        fs::write(root.join("keep.pdf"), "x").unwrap();
        assert_eq!(scanner.eligible_files().unwrap(), vec![root.join("keep.pdf")]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let layout = LibraryLayout::new(&dir.path().join("nope"), &WatchConfig::default());
        let scanner = Scanner::new(layout, &[]).unwrap();
        assert!(scanner.eligible_files().is_err());
    }
}
