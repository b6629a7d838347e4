//! # Sync
//!
//! The mapping-driven fetch-and-apply pipeline.
//!
//! - [`resolve_run`] picks the effective namespace and mapping set for one run
//! - [`SyncEngine::run`] executes it and returns a [`SyncReport`]

mod engine;
mod report;
mod resolve;

pub use engine::SyncEngine;
pub use report::{MappingOutcome, MappingResult, ResultEntry, SyncReport};
pub use resolve::{resolve_run, RunPlan};
