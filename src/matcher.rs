/// Case-insensitive exact match over a collection field. The first match in
/// insertion order wins; that tie-break is relied on by label and user
/// resolution.
pub fn find_by_field<'a, T, I, F>(items: I, field: F, query: &str) -> Option<&'a T>
where
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> &str,
{
    items
        .into_iter()
        .find(|item| field(item).eq_ignore_ascii_case(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::User;
    use pretty_assertions::assert_eq;

    fn user(id: i64, username: &str) -> User {
        User {
            id,
            username: username.into(),
            ..User::default()
        }
    }

    #[test]
    fn matches_case_insensitively() {
        let users = vec![user(1, "Alice"), user(2, "bob")];
        let found = find_by_field(&users, |u| u.username.as_str(), "alice");
        assert_eq!(found.map(|u| u.id), Some(1));
    }

    #[test]
    fn first_match_in_insertion_order_wins() {
        let users = vec![user(1, "sam"), user(2, "SAM")];
        let found = find_by_field(&users, |u| u.username.as_str(), "Sam");
        assert_eq!(found.map(|u| u.id), Some(1));
    }

    #[test]
    fn no_match_yields_none() {
        let users = vec![user(1, "alice")];
        assert!(find_by_field(&users, |u| u.username.as_str(), "carol").is_none());
    }
}
