use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task priority levels as used by the remote API (0 = unset, 5 = highest).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum Priority {
    #[default]
    Unset,
    Low,
    Medium,
    High,
    Urgent,
    DoNow,
}

impl Priority {
    pub fn level(&self) -> u8 {
        match self {
            Priority::Unset => 0,
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Urgent => 4,
            Priority::DoNow => 5,
        }
    }

    /// Clamping conversion from a raw level; anything above 5 maps to [`Priority::DoNow`].
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Priority::Unset,
            1 => Priority::Low,
            2 => Priority::Medium,
            3 => Priority::High,
            4 => Priority::Urgent,
            _ => Priority::DoNow,
        }
    }
}

impl From<u8> for Priority {
    fn from(level: u8) -> Self {
        Priority::from_level(level)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.level()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatUnit {
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl FromStr for RepeatUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().trim_end_matches('s') {
            "hour" => Ok(RepeatUnit::Hours),
            "day" => Ok(RepeatUnit::Days),
            "week" => Ok(RepeatUnit::Weeks),
            "month" => Ok(RepeatUnit::Months),
            "year" => Ok(RepeatUnit::Years),
            other => Err(anyhow!(
                "Unknown repeat unit '{}': expected hours|days|weeks|months|years",
                other
            )),
        }
    }
}

/// Repeat interval for recurring tasks, e.g. "every 2 weeks".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repeat {
    pub amount: u32,
    pub unit: RepeatUnit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: i64,
    pub title: String,
}

impl Label {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub task_id: i64,
    #[serde(default)]
    pub file_name: String,
}

/// Link record attaching a user to a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAssignee {
    pub task_id: i64,
    pub user_id: i64,
}

/// Link record attaching a label to a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelTask {
    pub task_id: i64,
    pub label_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_after: Option<Repeat>,
    pub project_id: i64,
    #[serde(default)]
    pub bucket_id: i64,
    #[serde(default)]
    pub position: f64,
    #[serde(default)]
    pub assignees: Vec<User>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Attachment id used as the kanban card cover, 0 when unset.
    #[serde(default)]
    pub cover_image_attachment_id: i64,
}

/// Normalized quick-add input from any client surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTaskInput {
    pub title: String,
    pub bucket_id: i64,
    pub project_id: i64,
    pub position: f64,
}

impl NewTaskInput {
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Query parameters for the task collection endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskQueryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}
