//! Persistence sinks for asset pairs
//!
//! A [`Sink`] delivers the composed image + label to the user's file system.
//! The directory variant writes `<base><ext>` at the chosen root and
//! `labels/<base>.json` beneath it. The download variant drops both files into
//! the downloads folder and leaves the move to the user.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::compose::{AssetPair, extension_of};
use crate::consts::LABELS_DIR;
use crate::error::SinkError;

/// Highest ` (n)` suffix tried before giving up on a download name
const MAX_DOWNLOAD_SUFFIX: u32 = 999;

/// Where a saved pair ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SaveOutcome {
    /// Written into the chosen clothes directory
    Written { image: PathBuf, label: PathBuf },
    /// Delivered as downloads; the user must move them into place
    Downloaded { image: PathBuf, label: PathBuf },
}

impl SaveOutcome {
    pub(crate) fn message(&self) -> &'static str {
        match self {
            SaveOutcome::Written { .. } => "Saved successfully",
            SaveOutcome::Downloaded { .. } => {
                "Files downloaded. Move them to the Clothes folder manually."
            }
        }
    }

    pub(crate) fn needs_manual_move(&self) -> bool {
        matches!(self, SaveOutcome::Downloaded { .. })
    }

    pub(crate) fn paths(&self) -> (&Path, &Path) {
        match self {
            SaveOutcome::Written { image, label } | SaveOutcome::Downloaded { image, label } => {
                (image.as_path(), label.as_path())
            }
        }
    }
}

/// Persistence strategy for an asset pair
pub(crate) trait Sink {
    /// Short name for logs and `--json` output
    fn name(&self) -> &'static str;

    fn save(&self, pair: &AssetPair) -> Result<SaveOutcome, SinkError>;
}

/// Grants access to the directory a [`DirectorySink`] writes into.
///
/// Asked once per save.
pub(crate) trait DirectoryAccess {
    fn request_access(&self) -> Result<PathBuf, SinkError>;
}

/// A directory fixed by flag, environment or config file
#[derive(Debug, Clone)]
pub(crate) struct ConfiguredDirectory {
    path: PathBuf,
    create: bool,
}

impl ConfiguredDirectory {
    pub(crate) fn new(path: PathBuf, create: bool) -> Self {
        Self { path, create }
    }
}

impl DirectoryAccess for ConfiguredDirectory {
    fn request_access(&self) -> Result<PathBuf, SinkError> {
        if self.create && !self.path.exists() {
            fs::create_dir_all(&self.path).map_err(|source| SinkError::CreateDir {
                path: self.path.clone(),
                source,
            })?;
        }

        let meta = fs::metadata(&self.path).map_err(|source| SinkError::Access {
            path: self.path.clone(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(SinkError::NotADirectory {
                path: self.path.clone(),
            });
        }
        if meta.permissions().readonly() {
            return Err(SinkError::ReadOnly {
                path: self.path.clone(),
            });
        }
        Ok(self.path.clone())
    }
}

pub(crate) struct DirectorySink<A> {
    access: A,
}

impl<A: DirectoryAccess> DirectorySink<A> {
    pub(crate) fn new(access: A) -> Self {
        Self { access }
    }
}

impl<A: DirectoryAccess> Sink for DirectorySink<A> {
    fn name(&self) -> &'static str {
        "directory"
    }

    fn save(&self, pair: &AssetPair) -> Result<SaveOutcome, SinkError> {
        let root = self.access.request_access()?;

        let image = root.join(pair.image_filename());
        let image_existed = image.exists();
        create_and_write(&image, pair.image_bytes(), !image_existed)?;
        debug!(path = %image.display(), bytes = pair.image_bytes().len(), "image written");

        let labels_dir = root.join(LABELS_DIR);
        let label = labels_dir.join(pair.label_filename());
        let label_result = fs::create_dir_all(&labels_dir)
            .map_err(|source| SinkError::CreateDir {
                path: labels_dir.clone(),
                source,
            })
            .and_then(|()| {
                let label_existed = label.exists();
                create_and_write(&label, pair.label_json().as_bytes(), !label_existed)
            });

        if let Err(e) = label_result {
            // A new image without its label would be picked up as unlabelled.
            if !image_existed {
                remove_partial(&image);
            }
            return Err(e);
        }
        debug!(path = %label.display(), "label written");

        Ok(SaveOutcome::Written { image, label })
    }
}

/// Create or truncate `path`, then write `bytes` into it.
fn create_and_write(path: &Path, bytes: &[u8], discard_on_error: bool) -> Result<(), SinkError> {
    let file = File::create(path).map_err(|source| SinkError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    write_or_discard(path, file, bytes, discard_on_error)
}

/// Write `bytes` through `out`. On failure the partial file at `path` is
/// removed when `discard_on_error` is set.
fn write_or_discard(
    path: &Path,
    mut out: impl Write,
    bytes: &[u8],
    discard_on_error: bool,
) -> Result<(), SinkError> {
    if let Err(source) = out.write_all(bytes).and_then(|()| out.flush()) {
        drop(out);
        if discard_on_error {
            remove_partial(path);
        }
        return Err(SinkError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

fn remove_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "could not remove partial file");
    }
}

/// Delivers one file to the user outside of any chosen directory.
pub(crate) trait Downloader {
    /// Returns where the file landed, which may differ from `file_name`.
    fn download(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, SinkError>;
}

/// Drops downloads into a folder, never overwriting: `a.png`, `a (1).png`, ...
#[derive(Debug, Clone)]
pub(crate) struct FolderDownloader {
    dir: PathBuf,
}

impl FolderDownloader {
    pub(crate) fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl Downloader for FolderDownloader {
    fn download(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, SinkError> {
        fs::create_dir_all(&self.dir).map_err(|source| SinkError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        for n in 0..=MAX_DOWNLOAD_SUFFIX {
            let path = self.dir.join(numbered_name(file_name, n));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    // The name was free, so a failed write leaves nothing behind.
                    write_or_discard(&path, file, bytes, true)?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(SinkError::Write { path, source }),
            }
        }

        Err(SinkError::NameExhausted {
            name: file_name.to_string(),
            dir: self.dir.clone(),
        })
    }
}

/// `name.ext` for 0, `name (n).ext` otherwise
fn numbered_name(file_name: &str, n: u32) -> String {
    if n == 0 {
        return file_name.to_string();
    }
    match extension_of(file_name) {
        Some(ext) => {
            let stem = &file_name[..file_name.len() - ext.len()];
            format!("{stem} ({n}){ext}")
        }
        None => format!("{file_name} ({n})"),
    }
}

pub(crate) struct DownloadSink<D> {
    downloader: D,
}

impl<D: Downloader> DownloadSink<D> {
    pub(crate) fn new(downloader: D) -> Self {
        Self { downloader }
    }
}

impl<D: Downloader> Sink for DownloadSink<D> {
    fn name(&self) -> &'static str {
        "download"
    }

    fn save(&self, pair: &AssetPair) -> Result<SaveOutcome, SinkError> {
        let image = self
            .downloader
            .download(&pair.image_filename(), pair.image_bytes())?;
        let label = self
            .downloader
            .download(&pair.label_filename(), pair.label_json().as_bytes())?;
        Ok(SaveOutcome::Downloaded { image, label })
    }
}

/// What the host offers for saving, resolved once at startup
#[derive(Debug, Clone)]
pub(crate) struct HostEnv {
    /// Target clothes directory, when one is configured
    pub(crate) clothes_dir: Option<PathBuf>,
    /// Create the clothes directory if missing instead of failing
    pub(crate) create_dir: bool,
    pub(crate) downloads_dir: PathBuf,
}

/// Prefer writing into the clothes directory; fall back to downloads.
pub(crate) fn select_sink(env: &HostEnv) -> Box<dyn Sink> {
    match &env.clothes_dir {
        Some(dir) => {
            debug!(dir = %dir.display(), "directory capability available");
            Box::new(DirectorySink::new(ConfiguredDirectory::new(
                dir.clone(),
                env.create_dir,
            )))
        }
        None => {
            debug!(dir = %env.downloads_dir.display(), "no directory capability, using downloads");
            Box::new(DownloadSink::new(FolderDownloader::new(
                env.downloads_dir.clone(),
            )))
        }
    }
}
