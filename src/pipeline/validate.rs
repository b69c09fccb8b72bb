// src/pipeline/validate.rs

//! Output validation.
//!
//! Reads the line-delimited output files and reports per-file and
//! aggregate statistics. Depends only on the output format, not on the
//! harvest internals.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{AppError, Result};

/// Fields every output record must carry.
pub const REQUIRED_FIELDS: &[&str] = &[
    "issue_id",
    "project",
    "title",
    "description",
    "status",
    "priority",
    "issue_type",
    "reporter",
    "created_date",
    "training_task",
];

/// How many per-line error messages to keep per file.
const MAX_REPORTED_ERRORS: usize = 10;

/// Validation statistics for one output file.
#[derive(Debug, Default)]
pub struct FileReport {
    pub path: PathBuf,
    pub total_lines: u64,
    pub valid_lines: u64,
    pub invalid_lines: u64,
    /// Count of records missing each required field
    pub missing_fields: HashMap<String, u64>,
    /// Distribution of training tasks across valid records
    pub training_tasks: HashMap<String, u64>,
    /// Valid records per project
    pub projects: HashMap<String, u64>,
    /// First few per-line error messages
    pub errors: Vec<String>,
}

impl FileReport {
    fn record_error(&mut self, message: String) {
        self.invalid_lines += 1;
        if self.errors.len() < MAX_REPORTED_ERRORS {
            self.errors.push(message);
        }
    }
}

/// Aggregate validation statistics across all output files.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub files: Vec<FileReport>,
    pub total_lines: u64,
    pub valid_lines: u64,
    pub invalid_lines: u64,
}

impl ValidationReport {
    /// True when every line in every file validated.
    pub fn all_valid(&self) -> bool {
        self.invalid_lines == 0
    }
}

/// Validate a single JSONL file.
pub fn validate_file(path: impl AsRef<Path>) -> Result<FileReport> {
    let path = path.as_ref();
    let mut report = FileReport {
        path: path.to_path_buf(),
        ..FileReport::default()
    };

    let reader = BufReader::new(File::open(path)?);
    for (index, line) in reader.lines().enumerate() {
        let line_num = index + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        report.total_lines += 1;

        let record: Value = match serde_json::from_str(line.trim()) {
            Ok(value) => value,
            Err(e) => {
                report.record_error(format!("Line {line_num}: invalid JSON - {e}"));
                continue;
            }
        };

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| record.get(field).is_none())
            .collect();

        if missing.is_empty() {
            report.valid_lines += 1;
            let task = record
                .get("training_task")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            *report.training_tasks.entry(task.to_string()).or_default() += 1;
            let project = record
                .get("project")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            *report.projects.entry(project.to_string()).or_default() += 1;
        } else {
            for field in &missing {
                *report.missing_fields.entry(field.to_string()).or_default() += 1;
            }
            report.record_error(format!("Line {line_num}: missing fields {missing:?}"));
        }
    }

    Ok(report)
}

/// Validate every `*.jsonl` file in the output directory.
pub fn run_validate(output_dir: impl AsRef<Path>) -> Result<ValidationReport> {
    let output_dir = output_dir.as_ref();
    if !output_dir.is_dir() {
        return Err(AppError::validation(format!(
            "Output directory not found: {}",
            output_dir.display()
        )));
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(output_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "jsonl"))
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(AppError::validation(format!(
            "No JSONL files found in {}",
            output_dir.display()
        )));
    }

    log::info!("Found {} JSONL file(s)", paths.len());

    let mut report = ValidationReport::default();
    for path in paths {
        let file_report = validate_file(&path)?;
        log_file_report(&file_report);

        report.total_lines += file_report.total_lines;
        report.valid_lines += file_report.valid_lines;
        report.invalid_lines += file_report.invalid_lines;
        report.files.push(file_report);
    }

    log::info!("Overall summary");
    log::info!("Total records: {}", report.total_lines);
    log::info!("Valid: {}", report.valid_lines);
    log::info!("Invalid: {}", report.invalid_lines);
    if report.all_valid() {
        log::info!("All files are valid");
    } else {
        log::warn!("Some files have validation errors");
    }

    Ok(report)
}

fn log_file_report(report: &FileReport) {
    log::info!("Validating: {}", report.path.display());
    log::info!(
        "  lines: {} valid: {} invalid: {}",
        report.total_lines,
        report.valid_lines,
        report.invalid_lines
    );

    let mut tasks: Vec<_> = report.training_tasks.iter().collect();
    tasks.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (task, count) in tasks {
        log::info!("  task {task}: {count}");
    }

    let mut projects: Vec<_> = report.projects.iter().collect();
    projects.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (project, count) in projects {
        log::info!("  project {project}: {count}");
    }

    for error in &report.errors {
        log::warn!("  {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const VALID_LINE: &str = r#"{"issue_id":"KAFKA-1","project":"KAFKA","title":"t","description":"d","status":"Open","priority":"Major","issue_type":"Bug","reporter":"r","assignee":null,"created_date":"2020","updated_date":"2020","resolved_date":null,"labels":[],"components":[],"comments":[],"training_task":"classification"}"#;

    #[test]
    fn valid_file_counts_tasks_and_projects() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("kafka_issues.jsonl");
        fs::write(&path, format!("{VALID_LINE}\n{VALID_LINE}\n")).unwrap();

        let report = validate_file(&path).unwrap();

        assert_eq!(report.total_lines, 2);
        assert_eq!(report.valid_lines, 2);
        assert_eq!(report.invalid_lines, 0);
        assert_eq!(report.training_tasks["classification"], 2);
        assert_eq!(report.projects["KAFKA"], 2);
    }

    #[test]
    fn missing_fields_are_counted() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.jsonl");
        fs::write(&path, "{\"issue_id\":\"X-1\"}\n").unwrap();

        let report = validate_file(&path).unwrap();

        assert_eq!(report.valid_lines, 0);
        assert_eq!(report.invalid_lines, 1);
        assert_eq!(report.missing_fields["project"], 1);
        assert_eq!(report.missing_fields["training_task"], 1);
        assert!(!report.missing_fields.contains_key("issue_id"));
    }

    #[test]
    fn malformed_json_is_invalid() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.jsonl");
        fs::write(&path, format!("{VALID_LINE}\nnot json\n")).unwrap();

        let report = validate_file(&path).unwrap();

        assert_eq!(report.valid_lines, 1);
        assert_eq!(report.invalid_lines, 1);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn run_validate_aggregates_directory() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a_issues.jsonl"), format!("{VALID_LINE}\n")).unwrap();
        fs::write(tmp.path().join("b_issues.jsonl"), "garbage\n").unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let report = run_validate(tmp.path()).unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.total_lines, 2);
        assert_eq!(report.valid_lines, 1);
        assert_eq!(report.invalid_lines, 1);
        assert!(!report.all_valid());
    }

    #[test]
    fn run_validate_rejects_missing_directory() {
        assert!(run_validate("/nonexistent/output").is_err());
    }

    #[test]
    fn run_validate_rejects_empty_directory() {
        let tmp = TempDir::new().unwrap();
        assert!(run_validate(tmp.path()).is_err());
    }
}
