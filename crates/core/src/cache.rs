//! Bounded decision caches.
//!
//! Eviction is insertion-ordered and batched: once the map grows past
//! `max_size`, the oldest `len - max_size + 100` entries go at once. Lookups do
//! not refresh an entry's position, so this is FIFO rather than LRU.

use std::collections::{HashMap, VecDeque};

const EVICTION_SLACK: usize = 100;
const FIELD_SEPARATOR: u8 = 0x1f;

/// BLAKE3 digest over `fields`, separator-delimited so `("ab", "c")` and
/// `("a", "bc")` differ.
pub fn fingerprint(fields: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            hasher.update(&[FIELD_SEPARATOR]);
        }
        hasher.update(field.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

#[derive(Debug, Clone)]
pub struct DecisionCache {
    max_size: usize,
    entries: HashMap<String, String>,
    order: VecDeque<String>,
}

impl DecisionCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn put(&mut self, key: String, value: String) {
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = value;
            return;
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
        self.trim();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn trim(&mut self) {
        let len = self.entries.len();
        if len <= self.max_size {
            return;
        }
        let to_remove = (len - self.max_size + EVICTION_SLACK).min(len);
        for _ in 0..to_remove {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }
}
