use thiserror::Error;

/// Errors surfaced by store operations. Unmatched assignee tokens and
/// board-view misses are deliberately not represented here: the former are
/// silently dropped, the latter only logged.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Project resolution produced no usable id for a new task.
    #[error("no project could be resolved for the new task")]
    NoProject,

    /// A remote call failed; propagated as-is for the caller to present.
    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}
