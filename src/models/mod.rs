// src/models/mod.rs

//! Domain models for the harvester application.

pub mod config;
pub mod issue;

pub use config::{CheckpointConfig, ClientConfig, Config, OutputConfig, TransformConfig};
pub use issue::{Comment, IssueRecord, TrainingTask};
