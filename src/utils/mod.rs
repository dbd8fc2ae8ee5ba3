pub mod build_info;

use std::{
    env,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::Once,
};

use crate::errors::Result;

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVE: &str = "project_finance=info";
const APP_DIR: &str = "project_finance";
const TMP_SUFFIX: &str = "tmp";

/// Initializes the global tracing subscriber. `RUST_LOG` is honoured; `directive`
/// replaces the default `project_finance=info`.
pub fn init_tracing(directive: Option<&str>) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let directive = directive.unwrap_or(DEFAULT_DIRECTIVE);
        let filter = match directive.parse() {
            Ok(parsed) => EnvFilter::from_default_env().add_directive(parsed),
            Err(_) => EnvFilter::from_default_env(),
        };

        let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
    });
}

/// Application directory: `PROJECT_FINANCE_HOME`, else the platform config
/// directory.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("PROJECT_FINANCE_HOME") {
        return PathBuf::from(custom);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Sibling staging path: `file.json` -> `file.json.tmp`.
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// Writes `data` to the staging path from [`tmp_path`], then renames it over
/// `path`. Readers see either the old file or the complete new one.
pub fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = tmp_path(path);
    let mut file = File::create(&tmp)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    drop(file);
    fs::rename(&tmp, path)?;
    Ok(())
}
