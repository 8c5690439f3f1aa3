//! Asset pair composition
//!
//! Turns the current form inputs (base name, image, label text) into the two
//! files a sink persists.

use std::fs;
use std::path::Path;

use crate::consts::{DEFAULT_IMAGE_EXT, EMPTY_LABEL};
use crate::error::{AppError, ValidationError};

/// An image selected by the user: its original file name and raw bytes
#[derive(Debug, Clone)]
pub(crate) struct ImageSource {
    pub(crate) file_name: String,
    pub(crate) bytes: Vec<u8>,
}

impl ImageSource {
    pub(crate) fn read(path: &Path) -> Result<Self, AppError> {
        let bytes = fs::read(path).map_err(|source| AppError::ReadInput {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }

    /// File name without its extension, used to pre-fill the base name.
    pub(crate) fn stem(&self) -> &str {
        match extension_of(&self.file_name) {
            Some(ext) => &self.file_name[..self.file_name.len() - ext.len()],
            None => &self.file_name,
        }
    }
}

/// Image bytes plus label text, ready to be written under derived file names
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AssetPair {
    base_name: String,
    image_bytes: Vec<u8>,
    image_extension: String,
    label_json: String,
}

impl AssetPair {
    pub(crate) fn base_name(&self) -> &str {
        &self.base_name
    }

    pub(crate) fn image_bytes(&self) -> &[u8] {
        &self.image_bytes
    }

    pub(crate) fn image_extension(&self) -> &str {
        &self.image_extension
    }

    pub(crate) fn label_json(&self) -> &str {
        &self.label_json
    }

    pub(crate) fn image_filename(&self) -> String {
        format!("{}{}", self.base_name, self.image_extension)
    }

    pub(crate) fn label_filename(&self) -> String {
        format!("{}.json", self.base_name)
    }
}

/// Validate the inputs and build an [`AssetPair`].
///
/// The name is checked before the image. A name that would resolve outside the
/// target folder is rejected. A blank label becomes `{}`; any other label text
/// is kept verbatim.
pub(crate) fn compose(
    base_name: &str,
    image: Option<ImageSource>,
    json_text: &str,
) -> Result<AssetPair, ValidationError> {
    let base_name = sanitize_base_name(base_name).ok_or(ValidationError::MissingName)?;
    if !is_plain_file_name(&base_name) {
        return Err(ValidationError::InvalidName(base_name));
    }
    let image = image.ok_or(ValidationError::MissingImage)?;

    let image_extension = extension_of(&image.file_name)
        .unwrap_or(DEFAULT_IMAGE_EXT)
        .to_string();

    let label_json = if json_text.trim().is_empty() {
        EMPTY_LABEL.to_string()
    } else {
        if let Err(e) = serde_json::from_str::<serde_json::Value>(json_text) {
            tracing::warn!(error = %e, "label text is not valid JSON, saving it verbatim");
        }
        json_text.to_string()
    };

    Ok(AssetPair {
        base_name,
        image_bytes: image.bytes,
        image_extension,
        label_json,
    })
}

/// Trim, then collapse each run of whitespace into a single `_`.
/// Returns `None` when nothing is left.
pub(crate) fn sanitize_base_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(trimmed.len());
    let mut in_space = false;
    for c in trimmed.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    Some(out)
}

/// True when `name` names a single entry inside a directory: no separators,
/// no NUL, and not `.` or `..`.
fn is_plain_file_name(name: &str) -> bool {
    !name.contains(['/', '\\', '\0']) && name != "." && name != ".."
}

/// Trailing `.xyz` of a file name, case preserved. A trailing bare dot does not count.
pub(crate) fn extension_of(file_name: &str) -> Option<&str> {
    let idx = file_name.rfind('.')?;
    let ext = &file_name[idx..];
    (ext.len() > 1).then_some(ext)
}
