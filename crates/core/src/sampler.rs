//! Bounded, typed previews of file content for use as prompt context.

use crate::config::SamplerConfig;
use crate::models::FileRecord;
use std::fs;
use std::io::Read;
use std::path::Path;

pub const UNREADABLE: &str = "[Could not read file]";
pub const TRUNCATION_MARKER: &str = "... [truncated]";

const SNIFF_BYTES: usize = 8 * 1024;
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "py", "js", "html", "css", "json", "xml", "csv",
];

/// Builds the record for one processing attempt. Never fails: unreadable
/// files get size 0 and the [`UNREADABLE`] preview.
pub fn sample(path: &Path, cfg: &SamplerConfig) -> FileRecord {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = extension_of(path);
    let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let mime = guess_mime(path);
    let preview = preview(path, size, mime.as_deref(), cfg);

    FileRecord {
        path: path.to_path_buf(),
        file_name,
        extension,
        size,
        mime,
        preview,
    }
}

/// Lower-cased extension with its leading dot, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

pub fn guess_mime(path: &Path) -> Option<String> {
    if let Some(mime) = mime_guess::from_path(path).first_raw() {
        return Some(mime.to_string());
    }
    sniff_mime(path)
}

fn sniff_mime(path: &Path) -> Option<String> {
    let mut file = fs::File::open(path).ok()?;
    let mut buf = vec![0u8; SNIFF_BYTES];
    let n = file.read(&mut buf).ok()?;
    infer::get(&buf[..n]).map(|t| t.mime_type().to_string())
}

fn is_texty(path: &Path, mime: Option<&str>) -> bool {
    if mime.map(|m| m.starts_with("text/")).unwrap_or(false) {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TEXT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn preview(path: &Path, size: u64, mime: Option<&str>, cfg: &SamplerConfig) -> String {
    let mime_label = mime.unwrap_or("unknown");
    if size > cfg.large_file_bytes {
        return format!("[Large file - {}, {} bytes]", mime_label, size);
    }
    if !is_texty(path, mime) {
        return format!("[Binary file - {}, {} bytes]", mime_label, size);
    }
    match read_text(path, cfg.max_content_chars) {
        Ok(text) => text,
        Err(_) => UNREADABLE.to_string(),
    }
}

fn read_text(path: &Path, max_chars: usize) -> std::io::Result<String> {
    // A char is at most 4 bytes in UTF-8.
    let max_bytes = (max_chars.saturating_mul(4)) as u64;
    let mut buf = Vec::new();
    fs::File::open(path)?.take(max_bytes).read_to_end(&mut buf)?;
    let text = String::from_utf8_lossy(&buf);
    let mut content: String = text.chars().take(max_chars).collect();
    if content.chars().count() == max_chars {
        content.push_str(TRUNCATION_MARKER);
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SamplerConfig {
        SamplerConfig {
            max_content_chars: 20,
            large_file_bytes: 1024,
        }
    }

    #[test]
    fn short_text_is_returned_whole() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("notes.txt");
        fs::write(&p, "milk, eggs").unwrap();
        let rec = sample(&p, &cfg());
        assert_eq!(rec.preview, "milk, eggs");
        assert_eq!(rec.extension, ".txt");
        assert_eq!(rec.mime.as_deref(), Some("text/plain"));
        assert_eq!(rec.size, 10);
    }

    #[test]
    fn long_text_is_truncated_with_marker() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("log.md");
        fs::write(&p, "a".repeat(100)).unwrap();
        let rec = sample(&p, &cfg());
        assert_eq!(rec.preview, format!("{}{}", "a".repeat(20), TRUNCATION_MARKER));
    }

    #[test]
    fn large_file_gets_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("big.txt");
        fs::write(&p, vec![b'x'; 2048]).unwrap();
        let rec = sample(&p, &cfg());
        assert_eq!(rec.preview, "[Large file - text/plain, 2048 bytes]");
    }

    #[test]
    fn binary_file_gets_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("photo.PNG");
        fs::write(&p, [0x89, b'P', b'N', b'G']).unwrap();
        let rec = sample(&p, &cfg());
        assert_eq!(rec.extension, ".png");
        assert_eq!(rec.preview, "[Binary file - image/png, 4 bytes]");
    }

    #[test]
    fn extensionless_file_is_sniffed() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("blob");
        fs::write(&p, b"%PDF-1.7\n").unwrap();
        assert_eq!(guess_mime(&p).as_deref(), Some("application/pdf"));
    }

    #[test]
    fn missing_file_degrades_instead_of_failing() {
        let dir = tempfile::tempdir().unwrap();
        let rec = sample(&dir.path().join("gone.txt"), &cfg());
        assert_eq!(rec.size, 0);
        assert_eq!(rec.preview, UNREADABLE);
    }
}
