//! Persistence for harvest progress and output.
//!
//! - `checkpoint`: per-project resume offsets (`checkpoint.json`)
//! - `output`: append-only line-delimited record files

pub mod checkpoint;
pub mod output;

pub use checkpoint::CheckpointStore;
pub use output::JsonlWriter;
