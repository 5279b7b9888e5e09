use tracing::debug;

use crate::model::Task;

/// A grouping column in the board view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bucket {
    pub id: i64,
    pub title: String,
    pub tasks: Vec<Task>,
}

/// A task located in the board view. Holds a copy of the task so a patched
/// entry can be written back wholesale, with no partial update visible to
/// readers.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskBucketEntry {
    pub bucket_index: usize,
    pub task_index: usize,
    pub task: Task,
}

/// Secondary, possibly stale, bucket-grouped view of tasks. Kept loosely in
/// sync with the primary task collection; a task missing here is a valid
/// state, not an error.
#[derive(Debug, Default)]
pub struct BoardView {
    buckets: Vec<Bucket>,
}

impl BoardView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_buckets(&mut self, buckets: Vec<Bucket>) {
        self.buckets = buckets;
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Locate a task by id. `None` means the board does not (or not yet)
    /// contain the task.
    pub fn get_task_by_id(&self, task_id: i64) -> Option<TaskBucketEntry> {
        for (bucket_index, bucket) in self.buckets.iter().enumerate() {
            if let Some(task_index) = bucket.tasks.iter().position(|t| t.id == task_id) {
                return Some(TaskBucketEntry {
                    bucket_index,
                    task_index,
                    task: bucket.tasks[task_index].clone(),
                });
            }
        }
        None
    }

    /// Write an entry back at its recorded position. Stale indices (bucket
    /// reshuffled since the lookup) are dropped with a trace instead of
    /// clobbering an unrelated task.
    pub fn set_task_in_bucket_by_index(&mut self, entry: TaskBucketEntry) {
        let slot = self
            .buckets
            .get_mut(entry.bucket_index)
            .and_then(|bucket| bucket.tasks.get_mut(entry.task_index));
        match slot {
            Some(task) if task.id == entry.task.id => *task = entry.task,
            _ => debug!(
                task_id = entry.task.id,
                bucket_index = entry.bucket_index,
                task_index = entry.task_index,
                "stale board entry, skipping write-back"
            ),
        }
    }

    /// Replace a task wherever it currently sits on the board.
    pub fn set_task_in_bucket(&mut self, task: Task) {
        if let Some(entry) = self.get_task_by_id(task.id) {
            self.set_task_in_bucket_by_index(TaskBucketEntry { task, ..entry });
        }
    }

    /// Drop a task from the board, preserving the order of the rest.
    pub fn remove_task_in_bucket(&mut self, task: &Task) {
        for bucket in &mut self.buckets {
            bucket.tasks.retain(|t| t.id != task.id);
        }
    }
}
