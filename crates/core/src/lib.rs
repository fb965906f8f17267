//! Core library: sampling, classification, renaming, placement, monitoring.

pub mod cache;
pub mod categorizer;
pub mod config;
pub mod inference;
pub mod library;
pub mod models;
pub mod monitor;
pub mod notifier;
pub mod placement;
pub mod processor;
pub mod renamer;
pub mod sampler;
pub mod scanner;
pub mod state;

pub use processor::Organizer;
