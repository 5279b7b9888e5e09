use serde::{Deserialize, Serialize};

use crate::model::Project;

/// A saved filter is a virtual project backed by a query definition instead
/// of stored tasks. The server addresses it through a pseudo-project with a
/// negative id; both mappings below mirror the server-side scheme.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedFilter {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub filters: FilterQuery,
}

/// Query definition of a saved filter. The server requires every filter
/// value to arrive as a string, see [`FilterQuery::normalize_values`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterQuery {
    #[serde(default)]
    pub filter_by: Vec<String>,
    #[serde(default)]
    pub filter_value: Vec<serde_json::Value>,
    #[serde(default)]
    pub filter_comparator: Vec<String>,
}

impl FilterQuery {
    /// Coerce all filter values to strings before create/update calls.
    pub fn normalize_values(&mut self) {
        for value in &mut self.filter_value {
            if !value.is_string() {
                *value = serde_json::Value::String(stringify(value));
            }
        }
    }
}

fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Pseudo-project id for a saved filter id. Clamps to 0 when the computed
/// value would be positive, i.e. for invalid (negative) filter ids.
pub fn project_id_from_filter_id(filter_id: i64) -> i64 {
    let project_id = -filter_id - 1;
    if project_id > 0 {
        return 0;
    }
    project_id
}

/// Saved filter id for a pseudo-project id. Clamps to 0 when the computed
/// value would be negative, i.e. for regular (non-negative) project ids.
pub fn filter_id_from_project_id(project_id: i64) -> i64 {
    let filter_id = -project_id - 1;
    if filter_id < 0 {
        return 0;
    }
    filter_id
}

/// Whether a project is actually a saved-filter pseudo-project.
pub fn is_saved_filter(project: &Project) -> bool {
    filter_id_from_project_id(project.id) > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0, -1)]
    #[case(1, -2)]
    #[case(41, -42)]
    fn filter_ids_map_to_negative_project_ids(#[case] filter_id: i64, #[case] project_id: i64) {
        assert_eq!(project_id_from_filter_id(filter_id), project_id);
        assert_eq!(filter_id_from_project_id(project_id), filter_id);
    }

    #[test]
    fn round_trips_over_the_valid_domain() {
        for filter_id in 0..1000 {
            assert_eq!(
                filter_id_from_project_id(project_id_from_filter_id(filter_id)),
                filter_id
            );
        }
    }

    #[test]
    fn clamps_outside_the_valid_domain() {
        // A negative filter id would produce a positive pseudo-project id.
        assert_eq!(project_id_from_filter_id(-5), 0);
        // A regular project id never maps to a filter.
        assert_eq!(filter_id_from_project_id(17), 0);
        assert_eq!(filter_id_from_project_id(0), 0);
    }

    #[test]
    fn regular_projects_are_not_saved_filters() {
        let regular = Project {
            id: 3,
            title: "Inbox".into(),
        };
        let pseudo = Project {
            id: -2,
            title: "Overdue".into(),
        };
        assert!(!is_saved_filter(&regular));
        assert!(is_saved_filter(&pseudo));
    }

    #[test]
    fn normalize_values_stringifies_everything() {
        let mut query = FilterQuery {
            filter_by: vec!["due_date".into(), "done".into()],
            filter_value: vec![serde_json::json!(7), serde_json::json!(false)],
            filter_comparator: vec!["less".into(), "equals".into()],
        };
        query.normalize_values();
        assert_eq!(
            query.filter_value,
            vec![serde_json::json!("7"), serde_json::json!("false")]
        );
    }
}
