use chrono::{Duration, NaiveDateTime, Utc};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::errors::{FinanceError, Result};
use crate::utils::{app_data_dir, ensure_dir, write_atomic};

use super::{ProjectFile, StorageBackend};

const PROJECT_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";
const DEFAULT_RETENTION: usize = 5;

/// Projects under `<root>/projects`, backups under `<root>/backups/<project>`.
#[derive(Clone)]
pub struct JsonProjectStorage {
    root: PathBuf,
    projects_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonProjectStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let root = root.unwrap_or_else(app_data_dir);
        let projects_dir = root.join("projects");
        let backups_dir = root.join("backups");
        ensure_dir(&projects_dir)?;
        ensure_dir(&backups_dir)?;
        Ok(Self {
            root,
            projects_dir,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None, None)
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn project_path(&self, name: &str) -> PathBuf {
        self.projects_dir
            .join(format!("{}.{PROJECT_EXTENSION}", canonical_name(name)))
    }

    pub fn backup_path(&self, name: &str, backup_name: &str) -> PathBuf {
        self.backup_dir(name).join(backup_name)
    }

    /// Names of the stored projects, sorted.
    pub fn list_projects(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.projects_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(PROJECT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.backups_dir.join(canonical_name(name))
    }

    /// A path in `dir` named after the current time, one millisecond later for
    /// every name already taken.
    fn fresh_backup_path(&self, name: &str, note: Option<&str>) -> Result<PathBuf> {
        let dir = self.backup_dir(name);
        ensure_dir(&dir)?;
        let label = sanitize_backup_note(note);
        let mut stamp = Utc::now().naive_utc();
        loop {
            let mut stem = format!(
                "{}_{}",
                canonical_name(name),
                stamp.format(BACKUP_TIMESTAMP_FORMAT)
            );
            if let Some(label) = &label {
                stem.push('_');
                stem.push_str(label);
            }
            let path = dir.join(format!("{stem}.{PROJECT_EXTENSION}"));
            if !path.exists() {
                return Ok(path);
            }
            stamp += Duration::milliseconds(1);
        }
    }

    fn backup_existing_file(&self, name: &str, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let backup = self.fresh_backup_path(name, None)?;
        fs::copy(path, &backup)?;
        tracing::debug!(project = name, backup = %backup.display(), "previous project file backed up");
        self.prune_backups(name)
    }

    fn prune_backups(&self, name: &str) -> Result<()> {
        let backups = self.list_backups(name)?;
        for entry in backups.iter().skip(self.retention) {
            let _ = fs::remove_file(self.backup_path(name, entry));
        }
        Ok(())
    }
}

impl StorageBackend for JsonProjectStorage {
    fn save(&self, project: &ProjectFile, name: &str) -> Result<()> {
        let path = self.project_path(name);
        self.backup_existing_file(name, &path)?;
        save_project_to_path(project, &path)
    }

    fn load(&self, name: &str) -> Result<ProjectFile> {
        let path = self.project_path(name);
        if !path.exists() {
            return Err(FinanceError::Storage(format!("project `{name}` not found")));
        }
        load_project_from_path(&path)
    }

    /// Backup file names, newest first.
    fn list_backups(&self, name: &str) -> Result<Vec<String>> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(PROJECT_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
                entries.push(file_name.to_string());
            }
        }
        entries.sort_by(|a, b| {
            parse_backup_timestamp(b)
                .cmp(&parse_backup_timestamp(a))
                .then_with(|| b.cmp(a))
        });
        Ok(entries)
    }

    fn backup(&self, project: &ProjectFile, name: &str, note: Option<&str>) -> Result<()> {
        let path = self.fresh_backup_path(name, note)?;
        write_atomic(&path, &serde_json::to_string_pretty(project)?)?;
        self.prune_backups(name)
    }

    fn restore(&self, name: &str, backup_name: &str) -> Result<ProjectFile> {
        let backup_path = self.backup_path(name, backup_name);
        if !backup_path.exists() {
            return Err(FinanceError::Storage(format!(
                "backup `{backup_name}` not found"
            )));
        }
        let target = self.project_path(name);
        fs::copy(&backup_path, &target)?;
        load_project_from_path(&target)
    }
}

pub fn save_project_to_path(project: &ProjectFile, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(project)?;
    write_atomic(path, &json)
}

pub fn load_project_from_path(path: &Path) -> Result<ProjectFile> {
    let data = fs::read_to_string(path)?;
    let project: ProjectFile = serde_json::from_str(&data)?;
    Ok(project)
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "project".into()
    } else {
        sanitized
    }
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.')) && !sanitized.is_empty() && !last_dash {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Timestamp of a backup name `<project>_<yyyymmdd>_<hhmmssmmm>[_<note>].json`.
fn parse_backup_timestamp(name: &str) -> Option<NaiveDateTime> {
    let stem = name.strip_suffix(&format!(".{PROJECT_EXTENSION}"))?;
    let parts: Vec<&str> = stem.split('_').collect();
    parts.windows(2).find_map(|pair| {
        let (date, time) = (pair[0], pair[1]);
        if !is_digits(date, 8) || !is_digits(time, 9) {
            return None;
        }
        NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M%S%3f").ok()
    })
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::CapitalProject;
    use tempfile::TempDir;

    fn storage_with_temp_dir() -> (JsonProjectStorage, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let storage = JsonProjectStorage::new(Some(temp.path().to_path_buf()), Some(3))
            .expect("json storage");
        (storage, temp)
    }

    fn sample() -> ProjectFile {
        ProjectFile::from_project(&CapitalProject::new("Sample Plant"))
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (storage, _guard) = storage_with_temp_dir();
        let file = sample();
        storage.save(&file, "Sample Plant").expect("save project");
        let loaded = storage.load("Sample Plant").expect("load project");
        assert_eq!(loaded, file);
        assert_eq!(storage.list_projects().unwrap(), vec!["sample_plant".to_string()]);
    }

    #[test]
    fn overwrites_are_backed_up_within_retention() {
        let (storage, _guard) = storage_with_temp_dir();
        let file = sample();
        for _ in 0..6 {
            storage.save(&file, "plant").expect("save project");
        }
        let backups = storage.list_backups("plant").expect("list backups");
        assert_eq!(backups.len(), 3);
    }

    #[test]
    fn noted_backup_restores() {
        let (storage, _guard) = storage_with_temp_dir();
        let file = sample();
        storage.save(&file, "plant").unwrap();
        storage.backup(&file, "plant", Some("Before tax change")).unwrap();
        let backups = storage.list_backups("plant").unwrap();
        assert!(backups[0].ends_with("_before-tax-change.json"));
        let restored = storage.restore("plant", &backups[0]).unwrap();
        assert_eq!(restored.id, file.id);
    }

    #[test]
    fn backup_timestamps_parse_with_and_without_notes() {
        let plain = parse_backup_timestamp("plant_20240102_030405678.json").unwrap();
        let noted = parse_backup_timestamp("plant_20240102_030405678_note.json").unwrap();
        assert_eq!(plain, noted);
        assert!(parse_backup_timestamp("plant.json").is_none());
    }
}
