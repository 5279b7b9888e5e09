pub mod board;
pub mod labels;
pub mod projects;
pub mod tasks;

pub use board::{BoardView, Bucket, TaskBucketEntry};
pub use labels::LabelStore;
pub use projects::ProjectStore;
pub use tasks::{RemoteServices, RouteContext, TaskStore};
