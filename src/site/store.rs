//! File-backed storage for templates, data documents and static files.
//!
//! Everything is read from disk on each request and written back whole.
//! There is no locking around the data document: concurrent admin saves race
//! and the last writer wins.

use std::path::{Component, Path, PathBuf};

use serde_json::{Map, Value};

use crate::errors::SiteError;
use crate::site_config::SiteConfig;

/// A slug page template found in one of the configured sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugTemplate {
    pub section: String,
    pub path: PathBuf,
}

/// Read/write access to the files of one site root.
#[derive(Debug, Clone)]
pub struct DataStore {
    templates_dir: PathBuf,
    data_dir: PathBuf,
    public_dir: PathBuf,
    data_file: PathBuf,
    main_template: PathBuf,
    sections: Vec<String>,
}

impl DataStore {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            templates_dir: config.templates_dir(),
            data_dir: config.data_dir(),
            public_dir: config.public_dir(),
            data_file: config.data_file(),
            main_template: config.main_template(),
            sections: config.sections().to_vec(),
        }
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Load the main data document.
    pub async fn load_data(&self) -> Result<Value, SiteError> {
        read_json(&self.data_file).await
    }

    /// Overwrite the main data document with `value`, pretty-printed.
    pub async fn save_data(&self, value: &Value) -> Result<(), SiteError> {
        write_json(&self.data_file, value).await
    }

    /// Load a data file relative to the data directory.
    pub async fn load_data_file(&self, relative: &str) -> Result<Value, SiteError> {
        let path = safe_join(&self.data_dir, relative).ok_or_else(|| SiteError::NotFound {
            path: PathBuf::from(relative),
        })?;
        read_json(&path).await
    }

    /// Read a template relative to the templates directory.
    pub async fn read_template(&self, relative: &str) -> Result<String, SiteError> {
        let path = safe_join(&self.templates_dir, relative).ok_or_else(|| SiteError::NotFound {
            path: PathBuf::from(relative),
        })?;
        read_text(&path).await
    }

    pub async fn read_main_template(&self) -> Result<String, SiteError> {
        read_text(&self.main_template).await
    }

    /// Replace the home page template.
    pub async fn save_main_template(&self, source: &str) -> Result<(), SiteError> {
        tokio::fs::write(&self.main_template, source)
            .await
            .map_err(|e| SiteError::io(&self.main_template, e))
    }

    /// Read a file from the public directory. Paths leaving the directory are
    /// reported as missing.
    pub async fn read_public(&self, relative: &str) -> Result<Vec<u8>, SiteError> {
        let path = safe_join(&self.public_dir, relative).ok_or_else(|| SiteError::NotFound {
            path: PathBuf::from(relative),
        })?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| SiteError::io(&path, e))
    }

    /// Find the template for `slug`, searching sections in configured order.
    pub async fn find_template_for_slug(&self, slug: &str) -> Option<SlugTemplate> {
        let file_name = format!("{slug}.hbs");
        for section in &self.sections {
            let Some(path) = safe_join(&self.templates_dir.join(section), &file_name) else {
                continue;
            };
            if is_file(&path).await {
                return Some(SlugTemplate {
                    section: section.clone(),
                    path,
                });
            }
        }
        None
    }

    /// Base data merged with the optional `data/<section>/<slug>.json`, which
    /// is exposed under both `page` and `item`.
    pub async fn load_page_data(&self, section: &str, slug: &str) -> Result<Value, SiteError> {
        let base = self.load_data().await?;
        let mut extra = Value::Object(Map::new());
        if let Some(path) = safe_join(&self.data_dir.join(section), &format!("{slug}.json")) {
            if is_file(&path).await {
                match read_json(&path).await {
                    Ok(value) => extra = value,
                    Err(e) => tracing::warn!(error = %e, "ignoring unreadable page data"),
                }
            }
        }
        Ok(merge_page_data(base, extra))
    }
}

/// Copy the top-level fields of `base` and set `page` and `item` to `extra`.
pub fn merge_page_data(base: Value, extra: Value) -> Value {
    let mut merged = match base {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    merged.insert("page".to_string(), extra.clone());
    merged.insert("item".to_string(), extra);
    Value::Object(merged)
}

/// Join `relative` onto `base`, refusing anything but plain path components.
fn safe_join(base: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then(|| base.join(relative))
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

pub async fn read_text(path: &Path) -> Result<String, SiteError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SiteError::io(path, e))
}

pub async fn read_json(path: &Path) -> Result<Value, SiteError> {
    let text = read_text(path).await?;
    serde_json::from_str(&text).map_err(|source| SiteError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `value` as 2-space indented JSON, replacing the file.
pub async fn write_json(path: &Path, value: &Value) -> Result<(), SiteError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| SiteError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    tokio::fs::write(path, text)
        .await
        .map_err(|e| SiteError::io(path, e))
}
