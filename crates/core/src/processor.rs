//! Per-file pipeline: sample, categorize, rename, place, move.

use crate::categorizer;
use crate::config::AppConfig;
use crate::inference::InferenceClient;
use crate::library::{is_hidden, LibraryLayout};
use crate::models::{BatchReport, CategoryLabel, FileOutcome, ProposedPlacement, Summary};
use crate::notifier::Notifier;
use crate::placement;
use crate::renamer;
use crate::sampler;
use crate::scanner::Scanner;
use crate::state::ProcessState;
use anyhow::Context;
use providers::LlmProvider;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

const NOTIFY_TITLE: &str = "AI Library";

/// One pipeline instance bound to one watched directory. Owns all mutable
/// run state; callers share it behind a mutex when more than one task needs it.
pub struct Organizer {
    config: AppConfig,
    scanner: Scanner,
    client: InferenceClient,
    notifier: Arc<dyn Notifier>,
    state: ProcessState,
}

impl Organizer {
    pub fn new(
        config: AppConfig,
        provider: Arc<dyn LlmProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        let watch_root = config
            .watch
            .path
            .clone()
            .context("no watched directory configured")?;
        if !watch_root.is_dir() {
            anyhow::bail!("watched directory not found: {}", watch_root.display());
        }
        let layout = LibraryLayout::new(&watch_root, &config.watch);
        layout.ensure_exists()?;
        let scanner = Scanner::new(layout, &config.watch.exclude).context("invalid exclude pattern")?;
        let client = InferenceClient::new(provider, &config.inference);
        let state = ProcessState::new(config.cache.max_size);
        Ok(Self {
            config,
            scanner,
            client,
            notifier,
            state,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn layout(&self) -> &LibraryLayout {
        self.scanner.layout()
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    pub fn state(&self) -> &ProcessState {
        &self.state
    }

    pub fn dry_run(&self) -> bool {
        self.config.safety.dry_run
    }

    /// Runs one file through the pipeline. Classification and naming never
    /// fail the file; only guards and filesystem errors do.
    pub async fn process_file(&mut self, path: &Path) -> FileOutcome {
        if let Some(reason) = self.reject_reason(path) {
            debug!(path = %path.display(), reason, "skipped");
            return FileOutcome::Skipped {
                path: path.to_path_buf(),
                reason: reason.to_string(),
            };
        }

        let record = sampler::sample(path, &self.config.sampler);
        let category = categorizer::classify(&record, &self.client, &mut self.state).await;
        let new_name = renamer::rename(&record, category, &self.client, &mut self.state).await;
        let renamed = new_name != record.file_name;

        if self.dry_run() {
            let dir = placement::category_dir(self.layout(), category);
            let destination =
                placement::unique_destination_avoiding(&dir, &new_name, &self.state.planned);
            self.state.planned.insert(destination.clone());
            info!(file = %record.file_name, %category, name = %new_name, "planned");
            return FileOutcome::Planned {
                source: record.path,
                destination,
                category,
                renamed,
            };
        }

        let dir = match placement::resolve(self.scanner.layout(), category, &mut self.state) {
            Ok(dir) => dir,
            Err(e) => return self.fail(path, &record.file_name, e.to_string()),
        };
        let destination = placement::unique_destination(&dir, &new_name);
        if let Err(e) = placement::move_file(path, &destination) {
            return self.fail(path, &record.file_name, e.to_string());
        }

        if renamed {
            info!("renamed {} -> {}", record.file_name, new_name);
        }
        info!("moved {} -> {}/{}", record.file_name, self.layout().library_name, category);
        self.notify_moved(category, &record.file_name, &destination, renamed);
        self.state.processed.push(destination.clone());

        FileOutcome::Moved {
            source: record.path,
            destination,
            category,
            renamed,
        }
    }

    fn reject_reason(&self, path: &Path) -> Option<&'static str> {
        if !path.is_file() {
            Some("not a regular file")
        } else if is_hidden(path) {
            Some("hidden file")
        } else if self.layout().is_managed(path) {
            Some("already inside a library root")
        } else {
            None
        }
    }

    fn fail(&mut self, path: &Path, file_name: &str, error: String) -> FileOutcome {
        self.state
            .record_error(format!("Failed to process {}: {}", file_name, error));
        FileOutcome::Failed {
            path: path.to_path_buf(),
            error,
        }
    }

    fn notify_moved(
        &self,
        category: CategoryLabel,
        original: &str,
        destination: &Path,
        renamed: bool,
    ) {
        if !self.config.notifications.enabled {
            return;
        }
        let message = format!("Moved to: {}/{}", self.layout().library_name, category);
        let final_name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let subtitle = if renamed {
            format!("Renamed: {}", final_name)
        } else {
            format!("Name kept: {}", original)
        };
        self.notifier.notify(NOTIFY_TITLE, &message, &subtitle);
    }

    /// Moves every stray top-level folder into the manual holding area.
    /// Returns the names of folders moved (or that would be, in dry-run).
    pub fn sweep_stray_folders(&mut self) -> Vec<String> {
        let dirs = match self.scanner.stray_directories() {
            Ok(dirs) => dirs,
            Err(e) => {
                self.state
                    .record_error(format!("Error organizing folders: {}", e));
                return Vec::new();
            }
        };

        let mut moved = Vec::new();
        for dir in dirs {
            let name = match dir.file_name() {
                Some(n) => n.to_string_lossy().into_owned(),
                None => continue,
            };
            if self.dry_run() {
                info!("would move folder {} -> {}/{}", name, self.layout().manual_name, name);
                moved.push(name);
                continue;
            }
            let destination =
                placement::unique_dir_destination(&self.layout().manual_root, &name);
            match placement::move_dir(&dir, &destination) {
                Ok(()) => {
                    let final_name = destination
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    info!("moved folder {} -> {}/{}", name, self.layout().manual_name, final_name);
                    if self.config.notifications.enabled {
                        self.notifier.notify(
                            NOTIFY_TITLE,
                            &format!("Moved to: {}/{}", self.layout().manual_name, final_name),
                            &format!("Folder: {}", name),
                        );
                    }
                    moved.push(name);
                }
                Err(e) => {
                    self.state
                        .record_error(format!("Failed to move folder {}: {}", name, e));
                }
            }
        }
        moved
    }

    /// One-shot pass over the watched directory.
    pub async fn organize(&mut self, max_files: Option<usize>) -> anyhow::Result<BatchReport> {
        let mut files = self.scanner.eligible_files()?;
        if let Some(limit) = max_files {
            files.truncate(limit);
        }

        let mut report = BatchReport {
            found: files.len(),
            dry_run: self.dry_run(),
            ..BatchReport::default()
        };
        if files.is_empty() {
            info!("no files to organize");
            return Ok(report);
        }
        info!(count = files.len(), dry_run = report.dry_run, "organizing files");

        report.moved_folders = self.sweep_stray_folders();

        let total = files.len();
        for (i, file) in files.iter().enumerate() {
            debug!("[{}/{}] {}", i + 1, total, file.display());
            match self.process_file(file).await {
                FileOutcome::Moved {
                    source,
                    destination,
                    category,
                    ..
                }
                | FileOutcome::Planned {
                    source,
                    destination,
                    category,
                    ..
                } => {
                    report.processed += 1;
                    report
                        .by_category
                        .entry(category.to_string())
                        .or_default()
                        .push(ProposedPlacement {
                            source,
                            file_name: file_name_of(&destination),
                        });
                }
                FileOutcome::Skipped { path, reason } => {
                    debug!(path = %path.display(), %reason, "not processed");
                }
                FileOutcome::Failed { path, error } => {
                    warn!(path = %path.display(), %error, "not processed");
                }
            }
        }
        Ok(report)
    }

    pub fn summary(&self) -> Summary {
        Summary {
            model: self.client.model().to_string(),
            library: self.layout().library_root.clone(),
            processed: self.state.processed.len(),
            categories: self.state.created_categories.len(),
            errors: self.state.errors.clone(),
            prompt_cache_size: self.state.prompt_cache.len(),
            rename_cache_size: self.state.rename_cache.len(),
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
