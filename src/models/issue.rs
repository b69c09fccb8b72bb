//! Normalized issue record structures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single comment attached to an issue.
///
/// Field names match the remote API's comment shape so that output stays
/// byte-compatible with downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    /// Comment author display name
    pub author: String,

    /// Creation timestamp, verbatim from the API
    pub created: String,

    /// Comment body text
    pub body: String,
}

/// Downstream training task assigned to a record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrainingTask {
    QuestionAnswering,
    Summarization,
    Classification,
    General,
}

impl TrainingTask {
    /// Stable string form, identical to the serialized value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuestionAnswering => "question_answering",
            Self::Summarization => "summarization",
            Self::Classification => "classification",
            Self::General => "general",
        }
    }
}

impl fmt::Display for TrainingTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized issue, one JSONL line of output.
///
/// Every field except `assignee` and `resolved_date` always carries a
/// value; extraction defaults are applied during transformation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueRecord {
    /// Globally unique issue key, e.g. "KAFKA-123"
    pub issue_id: String,

    /// Project name, the prefix of the issue key
    pub project: String,

    /// Issue summary ("No Title" when absent)
    pub title: String,

    /// Issue description ("No Description" when absent)
    pub description: String,

    /// Workflow status name ("Unknown" when absent)
    pub status: String,

    /// Priority name ("Unknown" when absent)
    pub priority: String,

    /// Issue type name ("Unknown" when absent)
    pub issue_type: String,

    /// Reporter display name ("Unknown" when absent)
    pub reporter: String,

    /// Assignee display name, absent when unassigned
    pub assignee: Option<String>,

    /// Creation timestamp, verbatim from the API
    pub created_date: String,

    /// Last-update timestamp, verbatim from the API
    pub updated_date: String,

    /// Resolution timestamp, absent when unresolved
    pub resolved_date: Option<String>,

    /// Issue labels, order as returned by the API
    pub labels: Vec<String>,

    /// Component names, order as returned by the API
    pub components: Vec<String>,

    /// Comments, order as returned by the API
    pub comments: Vec<Comment>,

    /// Assigned downstream training task
    pub training_task: TrainingTask,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_task_serializes_snake_case() {
        let json = serde_json::to_string(&TrainingTask::QuestionAnswering).unwrap();
        assert_eq!(json, "\"question_answering\"");
        assert_eq!(TrainingTask::General.to_string(), "general");
    }

    #[test]
    fn record_serializes_expected_field_names() {
        let record = IssueRecord {
            issue_id: "KAFKA-1".to_string(),
            project: "KAFKA".to_string(),
            title: "Broker crash".to_string(),
            description: "No Description".to_string(),
            status: "Open".to_string(),
            priority: "Major".to_string(),
            issue_type: "Bug".to_string(),
            reporter: "Unknown".to_string(),
            assignee: None,
            created_date: "2020-01-01T00:00:00.000+0000".to_string(),
            updated_date: "".to_string(),
            resolved_date: None,
            labels: vec![],
            components: vec![],
            comments: vec![],
            training_task: TrainingTask::Classification,
        };

        let value: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["issue_id"], "KAFKA-1");
        assert_eq!(value["training_task"], "classification");
        // Optional fields serialize as explicit nulls, not omitted keys.
        assert!(value["assignee"].is_null());
        assert!(value.get("resolved_date").is_some());
    }

    #[test]
    fn non_ascii_survives_round_trip() {
        let comment = Comment {
            author: "김연아".to_string(),
            created: "2020-01-01".to_string(),
            body: "문제 재현됨 ✔".to_string(),
        };
        let line = serde_json::to_string(&comment).unwrap();
        assert!(line.contains("김연아"));
        let back: Comment = serde_json::from_str(&line).unwrap();
        assert_eq!(back, comment);
    }
}
