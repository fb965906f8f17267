//! Public library modules for the CLI crate
pub mod notifications;
pub mod report;
pub mod watch;
