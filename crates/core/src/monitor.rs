//! Polling monitor over the watched directory.
//!
//! Each tick lists the directory, diffs it against the files seen on the
//! previous tick, waits for every new file's size to settle and hands settled
//! files to the [`Organizer`]. Files still growing are left out of the known
//! set so the next tick looks at them again.

use crate::config::MonitorConfig;
use crate::models::FileOutcome;
use crate::processor::Organizer;
use crate::scanner::Scanner;
use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    Stable,
    Growing,
    Vanished,
}

/// Size check, sleep, size check.
pub async fn settle(path: &Path, interval: Duration) -> Settle {
    let before = match std::fs::metadata(path) {
        Ok(m) => m.len(),
        Err(_) => return Settle::Vanished,
    };
    tokio::time::sleep(interval).await;
    match std::fs::metadata(path) {
        Ok(m) if m.len() == before => Settle::Stable,
        Ok(_) => Settle::Growing,
        Err(_) => Settle::Vanished,
    }
}

#[derive(Debug, Default)]
pub struct TickReport {
    pub new_files: usize,
    pub dispatched: Vec<FileOutcome>,
    pub unstable: Vec<PathBuf>,
    pub swept_folders: Vec<String>,
}

pub struct Monitor {
    organizer: Arc<Mutex<Organizer>>,
    scanner: Scanner,
    settings: MonitorConfig,
    known: HashSet<PathBuf>,
    running: Arc<AtomicBool>,
    ticks: u32,
}

impl Monitor {
    /// Seeds the known set from the current listing, so files already present
    /// at startup are left alone.
    pub async fn new(organizer: Arc<Mutex<Organizer>>, running: Arc<AtomicBool>) -> Self {
        let (scanner, settings) = {
            let org = organizer.lock().await;
            (org.scanner().clone(), org.config().monitor.clone())
        };
        let known = match scanner.eligible_files() {
            Ok(files) => files.into_iter().collect(),
            Err(e) => {
                warn!("initial scan failed: {:#}", e);
                HashSet::new()
            }
        };
        Self {
            organizer,
            scanner,
            settings,
            known,
            running,
            ticks: 0,
        }
    }

    pub fn known_files(&self) -> &HashSet<PathBuf> {
        &self.known
    }

    pub async fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        let current = match self.scanner.eligible_files() {
            Ok(files) => files,
            Err(e) => {
                error!("error scanning directory: {:#}", e);
                return report;
            }
        };

        let new_files: Vec<PathBuf> = current
            .iter()
            .filter(|p| !self.known.contains(*p))
            .cloned()
            .collect();
        report.new_files = new_files.len();

        let mut unstable = HashSet::new();
        for file in new_files {
            match settle(&file, self.settings.debounce()).await {
                Settle::Stable => {
                    let mut org = self.organizer.lock().await;
                    info!(path = %file.display(), "new file detected");
                    let outcome = org.process_file(&file).await;
                    if !outcome.is_success() {
                        warn!(path = %file.display(), "file processing failed or skipped");
                    }
                    report.dispatched.push(outcome);
                }
                Settle::Growing => {
                    debug!(path = %file.display(), "still being written");
                    unstable.insert(file.clone());
                    report.unstable.push(file);
                }
                Settle::Vanished => {
                    debug!(path = %file.display(), "vanished before dispatch");
                }
            }
        }

        self.known = current
            .into_iter()
            .filter(|p| !unstable.contains(p))
            .collect();

        self.ticks = self.ticks.wrapping_add(1);
        let every = self.settings.folder_sweep_every;
        if every > 0 && self.ticks % every == 0 {
            report.swept_folders = self.organizer.lock().await.sweep_stray_folders();
            if !report.swept_folders.is_empty() {
                info!(count = report.swept_folders.len(), "organized new folders");
            }
        }
        report
    }

    /// Ticks until `shutdown` resolves or the running flag is cleared. Each
    /// tick completes before either is observed. `wake` lets an external
    /// change feed cut the idle wait short. The flag is owned by the caller;
    /// a monitor whose flag is already cleared returns without doing work.
    pub async fn run<F>(&mut self, mut wake: Option<mpsc::Receiver<()>>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        if !self.running.load(Ordering::SeqCst) {
            info!("monitor stopped before start");
            return;
        }
        let swept = self.organizer.lock().await.sweep_stray_folders();
        if !swept.is_empty() {
            info!(count = swept.len(), "organized existing folders");
        }

        tokio::pin!(shutdown);
        while self.running.load(Ordering::SeqCst) {
            self.tick().await;
            tokio::select! {
                _ = &mut shutdown => {
                    info!("stopping monitor");
                    break;
                }
                _ = tokio::time::sleep(self.settings.poll_interval()) => {}
                _ = next_wake(&mut wake) => {
                    debug!("woken by change notification");
                }
            }
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Resolves on the next wake signal, coalescing any queued behind it. Never
/// resolves without a feed or once the feed has closed.
async fn next_wake(wake: &mut Option<mpsc::Receiver<()>>) {
    match wake {
        Some(rx) => {
            if rx.recv().await.is_none() {
                std::future::pending::<()>().await;
            }
            while rx.try_recv().is_ok() {}
        }
        None => std::future::pending::<()>().await,
    }
}
