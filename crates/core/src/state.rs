use crate::cache::DecisionCache;
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use tracing::warn;

/// Everything a pipeline accumulates over one run or monitor session.
#[derive(Debug, Clone)]
pub struct ProcessState {
    pub processed: Vec<PathBuf>,
    pub created_categories: BTreeSet<String>,
    pub errors: Vec<String>,
    /// Destinations handed out by dry runs, which never touch the disk.
    pub planned: HashSet<PathBuf>,
    pub prompt_cache: DecisionCache,
    pub rename_cache: DecisionCache,
}

impl ProcessState {
    pub fn new(cache_max_size: usize) -> Self {
        Self {
            processed: Vec::new(),
            created_categories: BTreeSet::new(),
            errors: Vec::new(),
            planned: HashSet::new(),
            prompt_cache: DecisionCache::new(cache_max_size),
            rename_cache: DecisionCache::new(cache_max_size),
        }
    }

    pub fn record_error(&mut self, message: String) {
        warn!("{}", message);
        self.errors.push(message);
    }
}
