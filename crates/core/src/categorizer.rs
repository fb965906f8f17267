use crate::inference::InferenceClient;
use crate::models::{CategoryLabel, FileRecord};
use crate::state::ProcessState;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

const MAX_TOKENS: u32 = 30;
const PREVIEW_CHARS: usize = 800;

static ANSWER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(category:\s*|answer:\s*)").expect("valid regex"));

/// Picks a category for `record`. Inference failures are recorded in
/// `state.errors` and resolve to [`CategoryLabel::Other`].
pub async fn classify(
    record: &FileRecord,
    client: &InferenceClient,
    state: &mut ProcessState,
) -> CategoryLabel {
    let prompt = build_prompt(record);
    match client
        .query(&mut state.prompt_cache, &prompt, MAX_TOKENS)
        .await
    {
        Ok(response) => {
            let label = parse_category(&response);
            debug!(file = %record.file_name, %label, "categorized");
            label
        }
        Err(e) => {
            state.record_error(format!(
                "Category analysis failed for {}: {}",
                record.file_name, e
            ));
            CategoryLabel::Other
        }
    }
}

pub fn build_prompt(record: &FileRecord) -> String {
    let preview: String = record.preview.chars().take(PREVIEW_CHARS).collect();
    let categories = CategoryLabel::ALL
        .iter()
        .map(|c| format!("- {}", c))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Analyze this file and choose the BEST category:\n\n\
         File: {}\n\
         Extension: {}\n\
         MIME: {}\n\
         Content: {}\n\n\
         Categories:\n{}\n\n\
         Respond with ONLY the category name.",
        record.file_name,
        record.extension,
        record.mime_or_unknown(),
        preview,
        categories
    )
}

/// Maps raw model output onto the closed label set.
///
/// Exact match first, then case-insensitive containment in either direction,
/// walking [`CategoryLabel::ALL`] in declaration order.
pub fn parse_category(response: &str) -> CategoryLabel {
    let first_line = response.trim().lines().next().unwrap_or("");
    let cleaned = ANSWER_PREFIX.replace(first_line, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return CategoryLabel::Other;
    }

    if let Some(label) = CategoryLabel::from_exact(cleaned) {
        return label;
    }

    let lower = cleaned.to_lowercase();
    CategoryLabel::ALL
        .into_iter()
        .find(|c| {
            let candidate = c.as_str().to_lowercase();
            lower.contains(&candidate) || candidate.contains(&lower)
        })
        .unwrap_or(CategoryLabel::Other)
}
