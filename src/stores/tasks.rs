use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::debug;

use crate::error::StoreError;
use crate::matcher::find_by_field;
use crate::model::{
    Attachment, Label, LabelTask, NewTaskInput, Task, TaskAssignee, TaskQueryParams, User,
};
use crate::parser::{cleanup_item_text, parse_task_text, QuickAddMode};
use crate::services::{
    LabelService, LabelTaskService, TaskAssigneeService, TaskService, UserService,
};
use crate::stores::{BoardView, LabelStore, ProjectStore};

/// Read-only navigation context: the project id embedded in the current
/// route, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteContext {
    pub project_id: Option<i64>,
}

/// Remote endpoints the task store talks to.
#[derive(Clone)]
pub struct RemoteServices {
    pub tasks: Arc<dyn TaskService>,
    pub users: Arc<dyn UserService>,
    pub labels: Arc<dyn LabelService>,
    pub label_links: Arc<dyn LabelTaskService>,
    pub assignee_links: Arc<dyn TaskAssigneeService>,
}

/// Scoped busy token: set on acquisition, guaranteed cleared on every exit
/// path (success, early return, failure) via `Drop`.
struct LoadingGuard(Arc<AtomicBool>);

impl LoadingGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(Arc::clone(flag))
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// In-memory task collection synchronized with the remote API, plus the
/// quick-add pipeline and the best-effort board reconciliation that follows
/// every assignee/label/attachment mutation.
pub struct TaskStore {
    services: RemoteServices,
    mode: QuickAddMode,
    tasks: HashMap<i64, Task>,
    is_loading: Arc<AtomicBool>,
    pub labels: LabelStore,
    pub projects: ProjectStore,
    pub board: BoardView,
    pub route: RouteContext,
}

impl TaskStore {
    pub fn new(services: RemoteServices, mode: QuickAddMode) -> Self {
        let labels = LabelStore::new(Arc::clone(&services.labels));
        Self {
            services,
            mode,
            tasks: HashMap::new(),
            is_loading: Arc::new(AtomicBool::new(false)),
            labels,
            projects: ProjectStore::new(),
            board: BoardView::new(),
            route: RouteContext::default(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading.load(Ordering::SeqCst)
    }

    pub fn has_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &HashMap<i64, Task> {
        &self.tasks
    }

    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        for task in tasks {
            self.tasks.insert(task.id, task);
        }
    }

    /// Fetch the task collection and replace the local one.
    pub async fn load_tasks(&mut self, params: TaskQueryParams) -> Result<Vec<Task>, StoreError> {
        let _busy = LoadingGuard::acquire(&self.is_loading);
        let fetched = self.services.tasks.get_all(params).await?;
        self.tasks = fetched.iter().map(|t| (t.id, t.clone())).collect();
        Ok(fetched)
    }

    /// Push a task update to the server and reconcile the local collection
    /// and the board view with the authoritative result.
    pub async fn update(&mut self, task: Task) -> Result<Task, StoreError> {
        let _busy = LoadingGuard::acquire(&self.is_loading);
        let updated = self.services.tasks.update(task).await?;
        self.tasks.insert(updated.id, updated.clone());
        self.board.set_task_in_bucket(updated.clone());
        Ok(updated)
    }

    pub async fn delete_task(&mut self, task: &Task) -> Result<(), StoreError> {
        self.services.tasks.delete(task).await?;
        self.tasks.remove(&task.id);
        self.board.remove_task_in_bucket(task);
        Ok(())
    }

    /// Set (or with `None` clear) the kanban card cover image.
    pub async fn set_cover_image(
        &mut self,
        task: &Task,
        attachment: Option<&Attachment>,
    ) -> Result<Task, StoreError> {
        let mut task = task.clone();
        task.cover_image_attachment_id = attachment.map(|a| a.id).unwrap_or(0);
        self.update(task).await
    }

    pub async fn add_assignee(
        &mut self,
        user: User,
        task_id: i64,
    ) -> Result<TaskAssignee, StoreError> {
        let _busy = LoadingGuard::acquire(&self.is_loading);
        let link = self
            .services
            .assignee_links
            .create(TaskAssignee {
                task_id,
                user_id: user.id,
            })
            .await?;
        self.reconcile_board(task_id, "add assignee", |task| task.assignees.push(user));
        Ok(link)
    }

    pub async fn remove_assignee(&mut self, user: &User, task_id: i64) -> Result<(), StoreError> {
        self.services
            .assignee_links
            .delete(TaskAssignee {
                task_id,
                user_id: user.id,
            })
            .await?;
        let user_id = user.id;
        self.reconcile_board(task_id, "remove assignee", |task| {
            task.assignees.retain(|u| u.id != user_id);
        });
        Ok(())
    }

    pub async fn add_label(&mut self, label: Label, task_id: i64) -> Result<LabelTask, StoreError> {
        let link = self
            .services
            .label_links
            .create(LabelTask {
                task_id,
                label_id: label.id,
            })
            .await?;
        self.reconcile_board(task_id, "add label", |task| task.labels.push(label));
        Ok(link)
    }

    pub async fn remove_label(&mut self, label: &Label, task_id: i64) -> Result<(), StoreError> {
        self.services
            .label_links
            .delete(LabelTask {
                task_id,
                label_id: label.id,
            })
            .await?;
        let label_id = label.id;
        self.reconcile_board(task_id, "remove label", |task| {
            task.labels.retain(|l| l.id != label_id);
        });
        Ok(())
    }

    /// Record an uploaded attachment on the board copy of the task. The
    /// upload itself happens in the transport layer.
    pub fn add_task_attachment(&mut self, task_id: i64, attachment: Attachment) {
        self.reconcile_board(task_id, "add attachment", |task| {
            task.attachments.push(attachment);
        });
    }

    /// Patch the board copy of a task after an authoritative remote call.
    /// Strictly best-effort: the board may be stale or not yet populated,
    /// so a miss is traced and tolerated.
    fn reconcile_board<F>(&mut self, task_id: i64, operation: &str, patch: F)
    where
        F: FnOnce(&mut Task),
    {
        let Some(mut entry) = self.board.get_task_by_id(task_id) else {
            debug!(task_id, operation, "task not on the board, skipping reconciliation");
            return;
        };
        patch(&mut entry.task);
        self.board.set_task_in_bucket_by_index(entry);
    }

    /// Resolve the project id for a new task. Precedence: a parsed project
    /// name matching a loaded project with a non-zero id, then a non-zero
    /// explicit parameter, then the route context. No usable id means
    /// [`StoreError::NoProject`].
    pub fn find_project_id(
        &self,
        parsed_project: Option<&str>,
        project_id: i64,
    ) -> Result<i64, StoreError> {
        if let Some(name) = parsed_project {
            match self.projects.find_project_by_exact_name(name) {
                Some(project) if project.id != 0 => return Ok(project.id),
                _ => {}
            }
        }

        if project_id != 0 {
            return Ok(project_id);
        }

        match self.route.project_id {
            Some(id) if id != 0 => Ok(id),
            _ => Err(StoreError::NoProject),
        }
    }

    /// Resolve raw label tokens to labels, creating the missing ones.
    ///
    /// Tokens are deduplicated on the exact raw spelling first; misses are
    /// then keyed by lowercased title so case variants of one new label
    /// (`"bug"`, `"Bug"`) collapse into a single creation, with the first
    /// spelling winning. The creation batch runs concurrently and is fully
    /// awaited before the results enter the collection.
    pub async fn ensure_labels_exist(&mut self, tokens: &[String]) -> Result<Vec<Label>, StoreError> {
        let mut seen = HashSet::new();
        let unique: Vec<&String> = tokens.iter().filter(|t| seen.insert(t.as_str())).collect();

        let mut resolved = Vec::new();
        let mut to_create = Vec::new();
        let mut pending = HashSet::new();
        for token in unique {
            if let Some(label) = self.labels.find_label_by_exact_title(token) {
                resolved.push(label.clone());
            } else if pending.insert(token.to_lowercase()) {
                to_create.push(token.clone());
            }
        }

        let created = self.labels.create_all(to_create).await?;
        resolved.extend(created);
        Ok(resolved)
    }

    /// Resolve raw assignee tokens to users. Each token triggers a remote
    /// search (the whole batch concurrently); a candidate counts when its
    /// username, display name or email equals the token case-insensitively.
    /// Tokens with no match are dropped without error.
    pub async fn find_assignees(&self, tokens: &[String]) -> Result<Vec<User>, StoreError> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let searches = tokens.iter().map(|token| {
            let users = Arc::clone(&self.services.users);
            let query = token.clone();
            async move {
                let candidates = users.get_all(&query).await?;
                Ok::<_, anyhow::Error>(validate_user(&candidates, &query).cloned())
            }
        });

        let mut assignees = Vec::new();
        for result in join_all(searches).await {
            if let Some(user) = result? {
                assignees.push(user);
            }
        }
        Ok(assignees)
    }

    /// Resolve the parsed label tokens and link each resulting label to the
    /// task. Link creations run as one concurrent batch; labels missing
    /// server-side are provisioned as a byproduct.
    pub async fn add_labels_to_task(
        &mut self,
        task: &mut Task,
        parsed_labels: &[String],
    ) -> Result<(), StoreError> {
        if parsed_labels.is_empty() {
            return Ok(());
        }

        let labels = self.ensure_labels_exist(parsed_labels).await?;
        let links = labels.iter().map(|label| {
            let service = Arc::clone(&self.services.label_links);
            let link = LabelTask {
                task_id: task.id,
                label_id: label.id,
            };
            async move { service.create(link).await }
        });
        for result in join_all(links).await {
            result?;
        }

        task.labels.extend(labels);
        Ok(())
    }

    /// The quick-add pipeline: parse the title, resolve project and
    /// assignees, strip the assignee tokens that actually matched, submit
    /// the creation, then resolve and attach labels.
    pub async fn create_new_task(&mut self, input: NewTaskInput) -> Result<Task, StoreError> {
        let _busy = LoadingGuard::acquire(&self.is_loading);
        let parsed = parse_task_text(&input.title, self.mode, Utc::now());

        let project_id = self.find_project_id(parsed.project.as_deref(), input.project_id)?;
        let assignees = self.find_assignees(&parsed.assignees).await?;

        let mut title = parsed.text;
        if !assignees.is_empty() {
            if let Some(prefixes) = self.mode.prefixes() {
                let usernames: Vec<&str> = assignees.iter().map(|u| u.username.as_str()).collect();
                title = cleanup_item_text(&title, &usernames, prefixes.assignee);
            }
        }

        let draft = Task {
            title,
            due_date: parsed.due_date,
            priority: parsed.priority.unwrap_or_default(),
            repeat_after: parsed.repeats,
            project_id,
            bucket_id: input.bucket_id,
            position: input.position,
            assignees,
            ..Task::default()
        };

        let mut created = self.services.tasks.create(draft).await?;
        self.add_labels_to_task(&mut created, &parsed.labels).await?;
        self.tasks.insert(created.id, created.clone());
        Ok(created)
    }
}

/// Exact-match validation of a search candidate set, in priority order:
/// username, then display name, then email.
fn validate_user<'a>(users: &'a [User], query: &str) -> Option<&'a User> {
    find_by_field(users, |u| u.username.as_str(), query)
        .or_else(|| find_by_field(users, |u| u.name.as_str(), query))
        .or_else(|| find_by_field(users, |u| u.email.as_str(), query))
}
