pub mod mention;
pub mod remote;

pub use mention::suggest_mentions;
pub use remote::{LabelService, LabelTaskService, TaskAssigneeService, TaskService, UserService};
