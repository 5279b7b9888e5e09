use crate::matcher::find_by_field;
use crate::model::Project;

/// Already-loaded project collection, read-only from the task store's
/// perspective.
#[derive(Debug, Default)]
pub struct ProjectStore {
    projects: Vec<Project>,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_projects(&mut self, projects: Vec<Project>) {
        self.projects = projects;
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn find_project_by_exact_name(&self, name: &str) -> Option<&Project> {
        find_by_field(&self.projects, |p| p.title.as_str(), name)
    }

    pub fn find_project_by_id(&self, id: i64) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }
}
