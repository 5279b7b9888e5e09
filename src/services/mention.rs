use anyhow::Result;

use crate::model::User;
use crate::services::UserService;

/// Candidate users for an `@mention` being typed. An empty query yields no
/// suggestions; otherwise the remote search result is narrowed to usernames
/// starting with the query, case-insensitive.
pub async fn suggest_mentions(users: &dyn UserService, query: &str) -> Result<Vec<User>> {
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let candidates = users.get_all(query).await?;
    let query = query.to_lowercase();
    Ok(candidates
        .into_iter()
        .filter(|user| user.username.to_lowercase().starts_with(&query))
        .collect())
}
