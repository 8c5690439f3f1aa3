//! Listing of labelled pairs already present in a clothes directory
//!
//! Mirrors how the prediction backend reads the folder: every
//! `labels/<base>.json` is one item, and its image is looked up as
//! `<base>.webp`, `<base>.png`, `<base>.jpg` or `<base>.jpeg` at the root.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::consts::{IMAGE_EXTS, LABELS_DIR};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CatalogEntry {
    pub(crate) base_name: String,
    pub(crate) label: PathBuf,
    /// Image file names found for this label
    pub(crate) images: Vec<String>,
    /// Label keys whose value is truthy, sorted
    pub(crate) tags: Vec<String>,
    /// Set when the label could not be read or parsed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) label_error: Option<String>,
}

impl CatalogEntry {
    pub(crate) fn has_image(&self) -> bool {
        !self.images.is_empty()
    }
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct Catalog {
    pub(crate) entries: Vec<CatalogEntry>,
    /// Images at the root with no label next to them
    pub(crate) unlabelled: Vec<String>,
}

const CASE_INSENSITIVE: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

pub(crate) fn scan(dir: &Path) -> Result<Catalog, AppError> {
    fs::metadata(dir).map_err(|source| AppError::ReadInput {
        path: dir.to_path_buf(),
        source,
    })?;

    let labels_dir = dir.join(LABELS_DIR);
    if !labels_dir.is_dir() {
        warn!(dir = %labels_dir.display(), "labels directory missing");
    }

    let mut entries = Vec::new();
    let mut labelled = BTreeSet::new();
    for label in glob_files(&labels_dir, "*.json") {
        let Some(base_name) = label.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };

        let images: Vec<String> = IMAGE_EXTS
            .iter()
            .map(|ext| format!("{base_name}{ext}"))
            .filter(|name| dir.join(name).is_file())
            .collect();

        let (tags, label_error) = match read_label(&label) {
            Ok(value) => (true_flags(&value), None),
            Err(e) => {
                debug!(path = %label.display(), error = %e, "unreadable label");
                (Vec::new(), Some(e))
            }
        };

        labelled.insert(base_name.to_lowercase());
        entries.push(CatalogEntry {
            base_name,
            label,
            images,
            tags,
            label_error,
        });
    }
    entries.sort_by(|a, b| a.base_name.cmp(&b.base_name));

    let mut unlabelled: Vec<String> = glob_files(dir, "*")
        .into_iter()
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .filter(|name| {
            let lower = name.to_lowercase();
            IMAGE_EXTS.iter().any(|ext| {
                lower
                    .strip_suffix(ext)
                    .is_some_and(|stem| !labelled.contains(stem))
            })
        })
        .collect();
    unlabelled.sort();

    Ok(Catalog {
        entries,
        unlabelled,
    })
}

fn glob_files(dir: &Path, file_pattern: &str) -> Vec<PathBuf> {
    let pattern = format!(
        "{}/{}",
        Pattern::escape(&dir.to_string_lossy()),
        file_pattern
    );
    match glob::glob_with(&pattern, CASE_INSENSITIVE) {
        Ok(paths) => paths.flatten().filter(|p| p.is_file()).collect(),
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "invalid glob pattern");
            Vec::new()
        }
    }
}

fn read_label(path: &Path) -> Result<Value, String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

/// Keys of a label object whose values read as "yes"
fn true_flags(label: &Value) -> Vec<String> {
    let Some(obj) = label.as_object() else {
        return Vec::new();
    };
    let mut flags: Vec<String> = obj
        .iter()
        .filter(|(_, v)| truthy(v))
        .map(|(k, _)| k.clone())
        .collect();
    flags.sort();
    flags
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "1" | "yes" | "y" | "t"
        ),
        _ => false,
    }
}
