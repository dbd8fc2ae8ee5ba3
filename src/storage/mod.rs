//! Project persistence: the JSON project file and a managed store with
//! timestamped backups.

pub mod json_backend;
pub mod project_file;

use std::path::Path;

use crate::errors::Result;

/// Persistence backends that keep named projects and their backups.
pub trait StorageBackend {
    fn save(&self, project: &ProjectFile, name: &str) -> Result<()>;
    fn load(&self, name: &str) -> Result<ProjectFile>;
    fn list_backups(&self, name: &str) -> Result<Vec<String>>;
    fn backup(&self, project: &ProjectFile, name: &str, note: Option<&str>) -> Result<()>;
    fn restore(&self, name: &str, backup_name: &str) -> Result<ProjectFile>;

    fn save_to_path(&self, project: &ProjectFile, path: &Path) -> Result<()> {
        json_backend::save_project_to_path(project, path)
    }

    fn load_from_path(&self, path: &Path) -> Result<ProjectFile> {
        json_backend::load_project_from_path(path)
    }
}

pub use json_backend::{load_project_from_path, save_project_to_path, JsonProjectStorage};
pub use project_file::{ProjectFile, PROJECT_SCHEMA_VERSION};
