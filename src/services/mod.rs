//! Service layer for the harvester application.
//!
//! This module contains:
//! - `client`: rate-limited, retrying API access
//! - `comments`: bounded-concurrency comment fetching
//! - `transform`: pure record normalization and classification

pub mod client;
pub mod comments;
pub mod transform;

pub use client::{JiraClient, SearchPage, PAGE_SIZE};
pub use comments::{fetch_comments, CommentBatch};
pub use transform::{classify, transform_issue};
