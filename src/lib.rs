//! Client-side core of a task-management web client: quick-add text parsing,
//! project/label/assignee resolution, task creation against a remote API,
//! and best-effort reconciliation of the kanban board view.

pub mod config;
pub mod error;
pub mod filters;
pub mod matcher;
pub mod model;
pub mod parser;
pub mod services;
pub mod stores;

pub use config::ApiConfig;
pub use error::StoreError;
pub use filters::{
    filter_id_from_project_id, is_saved_filter, project_id_from_filter_id, SavedFilter,
};
pub use model::*;
pub use parser::{cleanup_item_text, parse_task_text, ParsedTask, Prefixes, QuickAddMode};
pub use services::{
    suggest_mentions, LabelService, LabelTaskService, TaskAssigneeService, TaskService, UserService,
};
pub use stores::{
    BoardView, Bucket, LabelStore, ProjectStore, RemoteServices, RouteContext, TaskBucketEntry,
    TaskStore,
};
