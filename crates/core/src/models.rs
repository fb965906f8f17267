use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub file_name: String,
    /// Lower-cased, including the leading dot; empty when the name has none.
    pub extension: String,
    pub size: u64,
    pub mime: Option<String>,
    pub preview: String,
}

impl FileRecord {
    pub fn mime_or_unknown(&self) -> &str {
        self.mime.as_deref().unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CategoryLabel {
    WorkDocuments,
    PersonalDocuments,
    Images,
    Screenshots,
    Videos,
    AudioMusic,
    CodeDevelopment,
    ArchivesDownloads,
    FinancialDocuments,
    EducationalMaterials,
    CreativeProjects,
    SystemFiles,
    Entertainment,
    HealthMedical,
    Travel,
    RecipesFood,
    ShoppingReceipts,
    LegalDocuments,
    ReferenceMaterials,
    Other,
}

impl CategoryLabel {
    /// Declaration order; also the order fuzzy matching walks.
    pub const ALL: [CategoryLabel; 20] = [
        CategoryLabel::WorkDocuments,
        CategoryLabel::PersonalDocuments,
        CategoryLabel::Images,
        CategoryLabel::Screenshots,
        CategoryLabel::Videos,
        CategoryLabel::AudioMusic,
        CategoryLabel::CodeDevelopment,
        CategoryLabel::ArchivesDownloads,
        CategoryLabel::FinancialDocuments,
        CategoryLabel::EducationalMaterials,
        CategoryLabel::CreativeProjects,
        CategoryLabel::SystemFiles,
        CategoryLabel::Entertainment,
        CategoryLabel::HealthMedical,
        CategoryLabel::Travel,
        CategoryLabel::RecipesFood,
        CategoryLabel::ShoppingReceipts,
        CategoryLabel::LegalDocuments,
        CategoryLabel::ReferenceMaterials,
        CategoryLabel::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryLabel::WorkDocuments => "Work Documents",
            CategoryLabel::PersonalDocuments => "Personal Documents",
            CategoryLabel::Images => "Images",
            CategoryLabel::Screenshots => "Screenshots",
            CategoryLabel::Videos => "Videos",
            CategoryLabel::AudioMusic => "Audio/Music",
            CategoryLabel::CodeDevelopment => "Code/Development",
            CategoryLabel::ArchivesDownloads => "Archives/Downloads",
            CategoryLabel::FinancialDocuments => "Financial Documents",
            CategoryLabel::EducationalMaterials => "Educational Materials",
            CategoryLabel::CreativeProjects => "Creative Projects",
            CategoryLabel::SystemFiles => "System Files",
            CategoryLabel::Entertainment => "Entertainment",
            CategoryLabel::HealthMedical => "Health/Medical",
            CategoryLabel::Travel => "Travel",
            CategoryLabel::RecipesFood => "Recipes/Food",
            CategoryLabel::ShoppingReceipts => "Shopping/Receipts",
            CategoryLabel::LegalDocuments => "Legal Documents",
            CategoryLabel::ReferenceMaterials => "Reference Materials",
            CategoryLabel::Other => "Other",
        }
    }

    /// Case-sensitive exact lookup.
    pub fn from_exact(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl From<CategoryLabel> for String {
    fn from(c: CategoryLabel) -> Self {
        c.as_str().to_string()
    }
}

impl TryFrom<String> for CategoryLabel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_exact(&s).ok_or_else(|| format!("unknown category: {}", s))
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of pushing one file through the pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Moved {
        source: PathBuf,
        destination: PathBuf,
        category: CategoryLabel,
        renamed: bool,
    },
    Planned {
        source: PathBuf,
        destination: PathBuf,
        category: CategoryLabel,
        renamed: bool,
    },
    Skipped {
        path: PathBuf,
        reason: String,
    },
    Failed {
        path: PathBuf,
        error: String,
    },
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Moved { .. } | FileOutcome::Planned { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProposedPlacement {
    pub source: PathBuf,
    pub file_name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub found: usize,
    pub processed: usize,
    pub dry_run: bool,
    pub moved_folders: Vec<String>,
    pub by_category: BTreeMap<String, Vec<ProposedPlacement>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub model: String,
    pub library: PathBuf,
    pub processed: usize,
    pub categories: usize,
    pub errors: Vec<String>,
    pub prompt_cache_size: usize,
    pub rename_cache_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_with_status_tag_and_label() {
        let outcome = FileOutcome::Moved {
            source: PathBuf::from("/dl/song.mp3"),
            destination: PathBuf::from("/dl/AI Library/Audio/Music/song.mp3"),
            category: CategoryLabel::AudioMusic,
            renamed: false,
        };
        let v = serde_json::to_value(&outcome).unwrap();
        assert_eq!(v["status"], "moved");
        assert_eq!(v["category"], "Audio/Music");
        assert!(outcome.is_success());
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = serde_json::from_str::<CategoryLabel>("\"Misc\"").unwrap_err();
        assert!(err.to_string().contains("unknown category"));
        let ok: CategoryLabel = serde_json::from_str("\"Legal Documents\"").unwrap();
        assert_eq!(ok, CategoryLabel::LegalDocuments);
    }

    #[test]
    fn skipped_is_not_success() {
        let outcome = FileOutcome::Skipped {
            path: PathBuf::from("/dl/.DS_Store"),
            reason: "hidden".into(),
        };
        assert!(!outcome.is_success());
    }
}
