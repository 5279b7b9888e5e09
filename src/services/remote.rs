//! Narrow contracts for the remote endpoints the stores talk to. Transport
//! (HTTP, auth, pagination headers) lives behind these traits and is out of
//! scope here; tests plug in in-memory fakes.

use anyhow::Result;
use async_trait::async_trait;

use crate::model::{Label, LabelTask, Task, TaskAssignee, TaskQueryParams, User};

/// Task CRUD endpoints.
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Create a task and return the server-side record (with assigned id).
    async fn create(&self, task: Task) -> Result<Task>;
    async fn update(&self, task: Task) -> Result<Task>;
    async fn delete(&self, task: &Task) -> Result<()>;
    async fn get_all(&self, params: TaskQueryParams) -> Result<Vec<Task>>;
}

/// User search endpoint. `search` is a substring/fuzzy query; exact
/// validation happens client-side against the returned candidates.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_all(&self, search: &str) -> Result<Vec<User>>;
}

/// Label creation endpoint.
#[async_trait]
pub trait LabelService: Send + Sync {
    async fn create(&self, label: Label) -> Result<Label>;
}

/// Label-to-task link endpoints.
#[async_trait]
pub trait LabelTaskService: Send + Sync {
    async fn create(&self, link: LabelTask) -> Result<LabelTask>;
    async fn delete(&self, link: LabelTask) -> Result<()>;
}

/// Assignee-to-task link endpoints.
#[async_trait]
pub trait TaskAssigneeService: Send + Sync {
    async fn create(&self, link: TaskAssignee) -> Result<TaskAssignee>;
    async fn delete(&self, link: TaskAssignee) -> Result<()>;
}
