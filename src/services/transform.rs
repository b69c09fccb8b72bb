// src/services/transform.rs

//! Pure transformation of raw API issues into normalized records.
//!
//! Every extractor tolerates absent or malformed nested structure by
//! falling back to its own named default; the worst case is a record made
//! entirely of defaults. Nothing in this module performs I/O.

use serde_json::Value;

use crate::models::{Comment, IssueRecord, TrainingTask, TransformConfig};

/// Transform one raw issue plus its fetched comments into a record.
pub fn transform_issue(raw: &Value, comments: Vec<Comment>, config: &TransformConfig) -> IssueRecord {
    let fields = raw.get("fields").cloned().unwrap_or(Value::Null);

    let issue_id = raw
        .get("key")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let project = project_of(&issue_id);

    let title = text_field(&fields, "summary", "No Title");
    let description = text_field(&fields, "description", "No Description");
    let status = name_field(&fields, "status");
    let priority = name_field(&fields, "priority");
    let issue_type = name_field(&fields, "issuetype");
    let reporter = display_name_field(&fields, "reporter").unwrap_or_else(|| "Unknown".to_string());
    let assignee = display_name_field(&fields, "assignee");

    let created_date = raw_date(&fields, "created").unwrap_or_default();
    let updated_date = raw_date(&fields, "updated").unwrap_or_default();
    let resolved_date = raw_date(&fields, "resolutiondate");

    let labels = string_array(&fields, "labels");
    let components = named_array(&fields, "components");

    let training_task = classify(&issue_type, &description, comments.len(), config);

    IssueRecord {
        issue_id,
        project,
        title,
        description,
        status,
        priority,
        issue_type,
        reporter,
        assignee,
        created_date,
        updated_date,
        resolved_date,
        labels,
        components,
        comments,
        training_task,
    }
}

/// Assign a training task, first match wins.
pub fn classify(
    issue_type: &str,
    description: &str,
    comment_count: usize,
    config: &TransformConfig,
) -> TrainingTask {
    let kind = issue_type.to_lowercase();

    // Bugs with discussion make question/answer pairs.
    if kind == "bug" && comment_count > config.qa_min_comments {
        return TrainingTask::QuestionAnswering;
    }

    // Long descriptions suit summarization. Length is in characters, not
    // bytes, so multibyte text does not inflate the measure.
    if description.chars().count() > config.summarization_min_description {
        return TrainingTask::Summarization;
    }

    // Well-known types suit classification.
    if matches!(kind.as_str(), "bug" | "improvement" | "new feature" | "task") {
        return TrainingTask::Classification;
    }

    TrainingTask::General
}

/// Project name is the issue key prefix before the first dash.
fn project_of(issue_id: &str) -> String {
    issue_id.split('-').next().unwrap_or("").to_string()
}

/// Plain string field; empty counts as absent.
fn text_field(fields: &Value, key: &str, default: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Object field carrying a `name`, defaulting to "Unknown".
fn name_field(fields: &Value, key: &str) -> String {
    fields
        .get(key)
        .and_then(|v| v.get("name"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}

/// Person field carrying a `displayName`; None when absent or blank.
fn display_name_field(fields: &Value, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(|v| v.get("displayName"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Timestamp field preserved verbatim; None when absent or null.
fn raw_date(fields: &Value, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(String::from)
}

/// Array of plain strings; non-strings are skipped.
fn string_array(fields: &Value, key: &str) -> Vec<String> {
    fields
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Array of objects carrying a `name`, name defaulting to empty.
fn named_array(fields: &Value, key: &str) -> Vec<String> {
    fields
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    item.get("name")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string()
                })
                .collect()
        })
        .unwrap_or_default()
}
