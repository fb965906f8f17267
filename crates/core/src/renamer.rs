use crate::cache::fingerprint;
use crate::inference::InferenceClient;
use crate::models::{CategoryLabel, FileRecord};
use crate::state::ProcessState;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::debug;

const MAX_TOKENS: u32 = 50;
const PREVIEW_CHARS: usize = 600;
const MAX_NAME_CHARS: usize = 80;
const MIN_NAME_CHARS: usize = 3;

static NAME_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(filename:\s*|name:\s*)").expect("valid regex"));
static ILLEGAL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("valid regex"));
static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\-.]").expect("valid regex"));
static UNDERSCORE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").expect("valid regex"));
static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid regex"));
static WORD_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_\-\s]+").expect("valid regex"));
static GENERIC_NAMES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^(img|image)_?\d+$",
        r"^screenshot_?\d*$",
        r"^document_?\d*$",
        r"^file_?\d*$",
        r"^untitled",
        r"^new_?",
        r"^temp",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Proposes a descriptive file name for `record`, extension included.
///
/// Well-named files keep their name. Inference failures are recorded in
/// `state.errors` and keep the original name.
pub async fn rename(
    record: &FileRecord,
    category: CategoryLabel,
    client: &InferenceClient,
    state: &mut ProcessState,
) -> String {
    let original = record.file_name.as_str();
    let key = fingerprint(&[original, category.as_str(), record.extension.as_str()]);
    if let Some(hit) = state.rename_cache.get(&key) {
        return hit.to_string();
    }

    if is_well_named(original) {
        debug!(file = %original, "already well named");
        return original.to_string();
    }

    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    let prompt = build_prompt(record, category, &today);
    match client
        .query(&mut state.prompt_cache, &prompt, MAX_TOKENS)
        .await
    {
        Ok(response) => {
            let final_name = finalize_name(&response, original, &record.extension);
            state.rename_cache.put(key, final_name.clone());
            final_name
        }
        Err(e) => {
            state.record_error(format!("Rename failed for {}: {}", original, e));
            original.to_string()
        }
    }
}

pub fn build_prompt(record: &FileRecord, category: CategoryLabel, today: &str) -> String {
    let preview: String = record.preview.chars().take(PREVIEW_CHARS).collect();
    format!(
        "Generate a clear, descriptive filename for this file.\n\n\
         Original: {original}\n\
         Category: {category}\n\
         Extension: {ext}\n\
         Content: {preview}\n\
         Today: {today}\n\n\
         Rules:\n\
         1. Use descriptive, professional names\n\
         2. Include relevant dates if applicable (format: YYYY-MM-DD)\n\
         3. Use underscores instead of spaces\n\
         4. Keep under 100 characters\n\
         5. Be specific about content/purpose\n\
         6. Don't include the file extension\n\n\
         Examples:\n\
         - \"IMG_1234.jpg\" -> \"Screenshot_Login_Page_2024-01-15\"\n\
         - \"document.pdf\" -> \"Contract_Employment_Agreement_2024\"\n\
         - \"untitled.py\" -> \"Data_Processing_Script\"\n\n\
         Generate filename (without extension):",
        original = record.file_name,
        ext = record.extension,
    )
}

/// Sanitized stem from model output plus `extension`, falling back to the
/// original stem when too little survives.
pub fn finalize_name(response: &str, original: &str, extension: &str) -> String {
    let mut stem = sanitize(response);
    if let Some(cut) = stem.len().checked_sub(extension.len()) {
        if !extension.is_empty()
            && stem.is_char_boundary(cut)
            && stem[cut..].to_lowercase() == extension
        {
            stem.truncate(cut);
            stem = stem.trim_end_matches('_').to_string();
        }
    }
    if stem.chars().count() < MIN_NAME_CHARS {
        stem = Path::new(original)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| original.to_string());
    }
    format!("{}{}", stem, extension)
}

pub fn sanitize(response: &str) -> String {
    let first_line = response.trim().lines().next().unwrap_or("");
    let name = NAME_PREFIX.replace(first_line.trim(), "");
    let name = ILLEGAL_CHARS.replace_all(&name, "_");
    let name = UNSAFE_CHARS.replace_all(&name, "_");
    let name = UNDERSCORE_RUNS.replace_all(&name, "_");
    name.trim_matches('_')
        .chars()
        .take(MAX_NAME_CHARS)
        .collect()
}

/// True when `file_name` already looks deliberately named: it carries an ISO
/// date, or it is not a generic camera/editor default and has at least two
/// words of three or more characters.
pub fn is_well_named(file_name: &str) -> bool {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if ISO_DATE.is_match(&stem) {
        return true;
    }
    if GENERIC_NAMES.iter().any(|re| re.is_match(&stem)) {
        return false;
    }
    WORD_SPLIT
        .split(&stem)
        .filter(|w| w.chars().count() >= 3)
        .count()
        >= 2
}
