// src/services/comments.rs

//! Bounded-concurrency comment fetching.
//!
//! Fans one fetch task per issue key through a fixed-size pool, joins them
//! all, and returns a key-indexed map. A per-key failure never aborts the
//! batch; the key is mapped to an empty list and counted.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};

use crate::models::Comment;
use crate::services::JiraClient;

/// Result of fetching comments for one page of issues.
#[derive(Debug, Default)]
pub struct CommentBatch {
    /// Comments per issue key; every requested key is present
    pub map: HashMap<String, Vec<Comment>>,
    /// Total comments fetched across the batch
    pub comments_fetched: u64,
    /// Per-key fetch failures substituted with empty lists
    pub errors: u64,
}

/// Fetch comments for all keys with at most `workers` concurrent requests.
///
/// Returns only after every task has finished.
pub async fn fetch_comments(
    client: &JiraClient,
    keys: &[String],
    workers: usize,
) -> CommentBatch {
    let mut batch = CommentBatch::default();

    let mut results = stream::iter(keys.iter().cloned())
        .map(|key| async move {
            let result = client.comments(&key).await;
            (key, result)
        })
        .buffer_unordered(workers.max(1));

    while let Some((key, result)) = results.next().await {
        match result {
            Ok(comments) => {
                batch.comments_fetched += comments.len() as u64;
                batch.map.insert(key, comments);
            }
            Err(error) => {
                log::error!("Failed to fetch comments for {key}: {error}");
                batch.errors += 1;
                batch.map.insert(key, Vec::new());
            }
        }
    }

    batch
}
