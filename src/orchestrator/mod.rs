//! Orchestrator module for the sync, query and ask flows

pub mod runner;

pub use runner::{Orchestrator, SyncReport};
