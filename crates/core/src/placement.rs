//! Destination directories and collision-free target paths.

use crate::library::LibraryLayout;
use crate::models::CategoryLabel;
use crate::state::ProcessState;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub fn category_dir(layout: &LibraryLayout, category: CategoryLabel) -> PathBuf {
    layout.library_root.join(category.as_str())
}

/// Directory for `category`, created on first use and recorded in
/// `state.created_categories`.
pub fn resolve(
    layout: &LibraryLayout,
    category: CategoryLabel,
    state: &mut ProcessState,
) -> io::Result<PathBuf> {
    let dir = category_dir(layout, category);
    if !dir.is_dir() {
        fs::create_dir_all(&dir)?;
        state.created_categories.insert(category.as_str().to_string());
        info!("created category folder: {}/{}", layout.library_name, category);
    }
    Ok(dir)
}

/// `dir/file_name`, or the first free `stem_N.ext` for N = 1, 2, ...
pub fn unique_destination(dir: &Path, file_name: &str) -> PathBuf {
    unique_destination_avoiding(dir, file_name, &HashSet::new())
}

/// [`unique_destination`] that also treats every path in `reserved` as taken.
/// Dry runs reserve their planned targets here since nothing reaches the disk.
pub fn unique_destination_avoiding(
    dir: &Path,
    file_name: &str,
    reserved: &HashSet<PathBuf>,
) -> PathBuf {
    let is_free = |p: &Path| !p.exists() && !reserved.contains(p);
    let candidate = dir.join(file_name);
    if is_free(&candidate) {
        return candidate;
    }
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut counter = 1u32;
    loop {
        let name = if ext.is_empty() {
            format!("{}_{}", stem, counter)
        } else {
            format!("{}_{}.{}", stem, counter, ext)
        };
        let candidate = dir.join(name);
        if is_free(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Like [`unique_destination`] but suffixes the whole name, for directories.
pub fn unique_dir_destination(parent: &Path, name: &str) -> PathBuf {
    let candidate = parent.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let mut counter = 1u32;
    loop {
        let candidate = parent.join(format!("{}_{}", name, counter));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Moves a file to a destination known to be free. Falls back to copy and
/// delete when a plain rename is refused (e.g. across filesystems). On any
/// error the source is left where it was.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    if let Err(e) = fs::copy(from, to) {
        let _ = fs::remove_file(to);
        return Err(e);
    }
    if let Err(e) = fs::remove_file(from) {
        warn!(path = %from.display(), "could not remove source after copy, rolling back");
        let _ = fs::remove_file(to);
        return Err(e);
    }
    Ok(())
}

/// Directory counterpart of [`move_file`]; no copy fallback.
pub fn move_dir(from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WatchConfig;

    #[test]
    fn collisions_get_increasing_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let first = unique_destination(dir.path(), "Invoice_2024.pdf");
        assert_eq!(first, dir.path().join("Invoice_2024.pdf"));
        fs::write(&first, "a").unwrap();

        let second = unique_destination(dir.path(), "Invoice_2024.pdf");
        assert_eq!(second, dir.path().join("Invoice_2024_1.pdf"));
        fs::write(&second, "b").unwrap();

        let third = unique_destination(dir.path(), "Invoice_2024.pdf");
        assert_eq!(third, dir.path().join("Invoice_2024_2.pdf"));
        assert!(!third.exists());
    }

    #[test]
    fn suffix_goes_before_last_extension_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("backup.tar.gz"), "x").unwrap();
        fs::write(dir.path().join("README"), "x").unwrap();
        assert_eq!(
            unique_destination(dir.path(), "backup.tar.gz"),
            dir.path().join("backup.tar_1.gz")
        );
        assert_eq!(
            unique_destination(dir.path(), "README"),
            dir.path().join("README_1")
        );
    }

    #[test]
    fn reserved_paths_count_as_taken() {
        let dir = tempfile::tempdir().unwrap();
        let mut reserved = HashSet::new();
        reserved.insert(dir.path().join("Invoice_2024.pdf"));
        assert_eq!(
            unique_destination_avoiding(dir.path(), "Invoice_2024.pdf", &reserved),
            dir.path().join("Invoice_2024_1.pdf")
        );
    }

    #[test]
    fn directories_are_suffixed_whole() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("my.project")).unwrap();
        assert_eq!(
            unique_dir_destination(dir.path(), "my.project"),
            dir.path().join("my.project_1")
        );
    }

    #[test]
    fn resolve_creates_once_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let layout = LibraryLayout::new(dir.path(), &WatchConfig::default());
        let mut state = ProcessState::new(10);

        let first = resolve(&layout, CategoryLabel::AudioMusic, &mut state).unwrap();
        assert!(first.is_dir());
        assert!(first.ends_with("Audio/Music"));
        let again = resolve(&layout, CategoryLabel::AudioMusic, &mut state).unwrap();
        assert_eq!(first, again);
        assert_eq!(state.created_categories.len(), 1);
    }

    #[test]
    fn move_file_keeps_source_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        fs::write(&src, "data").unwrap();
        let bad = dir.path().join("missing_dir").join("a.txt");
        assert!(move_file(&src, &bad).is_err());
        assert!(src.exists());
        assert!(!bad.exists());

        let good = dir.path().join("b.txt");
        move_file(&src, &good).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(good).unwrap(), "data");
    }
}
