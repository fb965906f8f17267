use anyhow::Result;
use library_core::models::{BatchReport, Summary};

pub fn render_batch(report: &BatchReport, errors: usize) -> String {
    let mut out = String::new();
    if report.found == 0 {
        out.push_str("No files to organize!\n");
        return out;
    }
    if !report.moved_folders.is_empty() {
        let verb = if report.dry_run { "Would move" } else { "Moved" };
        out.push_str(&format!(
            "{} {} folder(s) to the manual library\n",
            verb,
            report.moved_folders.len()
        ));
    }
    if report.dry_run {
        out.push_str(&format!("Preview complete: {} files analyzed\n", report.found));
        for (category, files) in &report.by_category {
            out.push_str(&format!("  {}: {} files\n", category, files.len()));
            for f in files {
                out.push_str(&format!(
                    "    {} -> {}\n",
                    f.source
                        .file_name()
                        .map(|n| n.to_string_lossy())
                        .unwrap_or_default(),
                    f.file_name
                ));
            }
        }
    } else {
        out.push_str(&format!(
            "Processed {}/{} files successfully\n",
            report.processed, report.found
        ));
        if errors > 0 {
            out.push_str(&format!("{} errors occurred\n", errors));
        }
    }
    out
}

pub fn render_summary(summary: &Summary) -> String {
    let mut out = String::new();
    out.push_str("Detailed summary\n");
    out.push_str(&format!("  Model:      {}\n", summary.model));
    out.push_str(&format!("  Library:    {}\n", summary.library.display()));
    out.push_str(&format!("  Processed:  {}\n", summary.processed));
    out.push_str(&format!("  Categories: {}\n", summary.categories));
    out.push_str(&format!("  Errors:     {}\n", summary.errors.len()));
    out.push_str(&format!(
        "  Cache size: {} prompts, {} names\n",
        summary.prompt_cache_size, summary.rename_cache_size
    ));
    for e in &summary.errors {
        out.push_str(&format!("    - {}\n", e));
    }
    out
}

pub fn to_json(report: Option<&BatchReport>, summary: &Summary) -> Result<String> {
    let value = serde_json::json!({
        "status": "ok",
        "report": report,
        "summary": summary,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}
