//! Media discovery and the in-memory model of a discovered item.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Extensions recognised as video when classifying a file.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi"];

/// Extensions recognised as image when classifying a file.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Broad classification of a media file, inferred from its extension.
///
/// `Other` covers everything unrecognised. Such items still flow through the
/// pipeline so the compliance gate can reject them with a recorded reason
/// instead of them silently lingering in the input directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    pub fn from_extension(extension: &str) -> MediaKind {
        let ext = extension.to_lowercase();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Video
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Image
        } else {
            MediaKind::Other
        }
    }
}

/// One discovered input file plus its optional sidecar caption.
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub path: PathBuf,
    pub kind: MediaKind,
    /// Raw sidecar text, untrimmed, if a sidecar file was found and readable.
    pub caption: Option<String>,
    pub sidecar_path: Option<PathBuf>,
}

impl MediaItem {
    /// Builds an item for `path`, classifying it and loading the sidecar
    /// caption (`<stem>.txt` next to the media file) when present.
    ///
    /// An unreadable sidecar is logged and treated as absent text; the item
    /// itself is still returned.
    pub fn from_path(path: &Path) -> MediaItem {
        let kind = MediaKind::from_extension(&extension_of(path));
        let sidecar = path.with_extension("txt");
        let (sidecar_path, caption) = if sidecar.is_file() {
            match fs::read_to_string(&sidecar) {
                Ok(text) => (Some(sidecar), Some(text)),
                Err(e) => {
                    warn!(
                        error = ?e,
                        sidecar = %sidecar.display(),
                        "Sidecar caption exists but could not be read; continuing without text"
                    );
                    (Some(sidecar), None)
                }
            }
        } else {
            (None, None)
        };

        MediaItem {
            path: path.to_path_buf(),
            kind,
            caption,
            sidecar_path,
        }
    }

    /// File name including extension, for reports and logs.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without the final extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Lower-cased extension, or an empty string when the file has none.
    pub fn extension(&self) -> String {
        extension_of(&self.path)
    }

    /// Caption used for publishing: the trimmed sidecar text when non-empty,
    /// otherwise a synthesised default naming the file.
    pub fn effective_caption(&self) -> String {
        match self.caption.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => format!("New post: {}", self.stem()),
        }
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Lists the media items in `input_dir`, name-sorted for a deterministic run
/// order.
///
/// Skips subdirectories and bookkeeping files: sidecar `.txt` captions,
/// `readme` files of any extension and hidden files. A missing or unreadable
/// input directory is an error; per-file sidecar problems are not.
pub fn discover_media(input_dir: &Path) -> Result<Vec<MediaItem>, io::Error> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(input_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if is_bookkeeping(&path) {
            debug!(path = %path.display(), "Skipping bookkeeping file during discovery");
            continue;
        }
        paths.push(path);
    }
    paths.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));

    Ok(paths.iter().map(|p| MediaItem::from_path(p)).collect())
}

fn is_bookkeeping(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if name.starts_with('.') {
        return true;
    }
    if extension_of(path) == "txt" {
        return true;
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    stem == "readme"
}
