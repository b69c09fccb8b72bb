// src/pipeline/scrape.rs

//! Harvest orchestration.
//!
//! Processes configured projects strictly in sequence. Each project runs a
//! pagination loop that fetches a page of issues, enriches it with comments
//! through the bounded pool, writes each normalized record immediately, and
//! only then advances the checkpoint. Interrupting the process leaves
//! output and checkpoint consistent up to the last persisted page; a
//! partially processed page may be re-appended on the next run.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;

use crate::error::Result;
use crate::models::Config;
use crate::services::{fetch_comments, transform_issue, JiraClient};
use crate::storage::{CheckpointStore, JsonlWriter};

/// Run-wide counters reported at the end of a harvest.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScrapeStats {
    /// Records written to output files
    pub issues_written: u64,
    /// Comments fetched across all issues
    pub comments_fetched: u64,
    /// Errors of any kind encountered and recovered from
    pub errors: u64,
}

/// Output file path for a project.
pub fn output_path(output_dir: &str, project: &str) -> PathBuf {
    Path::new(output_dir).join(format!("{}_issues.jsonl", project.to_lowercase()))
}

/// Harvest every configured project and report aggregate statistics.
pub async fn run_scraper(config: &Config) -> Result<ScrapeStats> {
    let start_time = Utc::now();
    log::info!("Starting harvest for projects: {:?}", config.projects);

    let client = JiraClient::new(&config.client)?;
    let mut checkpoint = CheckpointStore::load(&config.checkpoint.path);
    let mut stats = ScrapeStats::default();

    for project in &config.projects {
        if let Err(e) = scrape_project(&client, &mut checkpoint, config, project, &mut stats).await
        {
            log::error!("Fatal error harvesting {project}: {e}");
            stats.errors += 1;
        }
    }

    let elapsed = Utc::now() - start_time;
    log::info!("Harvest complete");
    log::info!("Total issues: {}", stats.issues_written);
    log::info!("Total comments: {}", stats.comments_fetched);
    log::info!("Errors: {}", stats.errors);
    log::info!("Time elapsed: {}s", elapsed.num_seconds());

    Ok(stats)
}

/// Harvest a single project, resuming from its checkpoint offset.
async fn scrape_project(
    client: &JiraClient,
    checkpoint: &mut CheckpointStore,
    config: &Config,
    project: &str,
    stats: &mut ScrapeStats,
) -> Result<()> {
    log::info!("Starting harvest for project: {project}");

    let path = output_path(&config.output.dir, project);
    let mut writer = JsonlWriter::open(&path, config.output.append)?;
    let mut start_at = checkpoint.progress(project);

    loop {
        if let Some(limit) = config.issue_limit {
            if start_at >= limit {
                log::info!("Issue limit {limit} reached for {project}");
                break;
            }
        }

        log::info!("Fetching {project} issues starting at {start_at}");
        let page = match client.search(project, start_at).await {
            Ok(page) => page,
            Err(e) => {
                log::error!("Failed to fetch issues for {project} at {start_at}: {e}");
                stats.errors += 1;
                break;
            }
        };

        if page.issues.is_empty() {
            log::info!("No more issues for {project}");
            break;
        }

        let mut issues = page.issues;
        if let Some(limit) = config.issue_limit {
            let remaining = (limit - start_at) as usize;
            issues.truncate(remaining);
        }

        let keys: Vec<String> = issues.iter().map(issue_key).collect();
        log::info!("Fetching comments for {} issues", keys.len());
        let batch = fetch_comments(client, &keys, config.client.max_concurrent).await;
        stats.comments_fetched += batch.comments_fetched;
        stats.errors += batch.errors;

        // Output order follows the page order, not fetch completion order.
        for (issue, key) in issues.iter().zip(&keys) {
            let comments = batch.map.get(key).cloned().unwrap_or_default();
            let record = transform_issue(issue, comments, &config.transform);
            match writer.write_record(&record) {
                Ok(()) => stats.issues_written += 1,
                Err(e) => {
                    log::error!("Error writing issue {key}: {e}");
                    stats.errors += 1;
                }
            }
        }

        start_at += issues.len() as u64;
        checkpoint.advance(project, start_at)?;
        log::info!("Progress: {start_at}/{} issues for {project}", page.total);

        if start_at >= page.total {
            break;
        }
    }

    log::info!("Completed harvest for {project}");
    Ok(())
}

/// Issue key used for comment lookup, "UNKNOWN" when missing.
fn issue_key(issue: &Value) -> String {
    issue
        .get("key")
        .and_then(Value::as_str)
        .unwrap_or("UNKNOWN")
        .to_string()
}
