//! Filesystem-backed media descriptors.
//!
//! A [`Media`] is a value object for one file on disk. Cheap properties
//! (name, extension, kind, MIME type) are derived from the filename; the
//! expensive ones (pixel dimensions, embedded metadata) are read on first
//! access and remembered for the lifetime of the object.

pub mod embedded;

use embedded::EmbeddedMeta;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Broad media category derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Image,
    Video,
    Audio,
    Document,
    Archive,
    Code,
    Other,
}

impl Kind {
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "gif" | "png" | "svg" | "ico" | "tif" | "tiff" | "bmp" | "psd"
            | "ai" | "webp" | "avif" => Kind::Image,
            "mov" | "avi" | "ogv" | "webm" | "flv" | "swf" | "mp4" | "m4v" | "mpg" | "mpeg"
            | "mkv" => Kind::Video,
            "mp3" | "m4a" | "wav" | "aif" | "aiff" | "flac" | "ogg" => Kind::Audio,
            "md" | "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "csv" | "rtf"
            | "txt" | "odt" | "ods" | "odp" => Kind::Document,
            "gz" | "gzip" | "tar" | "tgz" | "zip" | "rar" | "7z" => Kind::Archive,
            "css" | "js" | "json" | "java" | "htm" | "html" | "php" | "rb" | "py" | "scss"
            | "xml" | "yaml" | "yml" | "rs" => Kind::Code,
            _ => Kind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Image => "image",
            Kind::Video => "video",
            Kind::Audio => "audio",
            Kind::Document => "document",
            Kind::Archive => "archive",
            Kind::Code => "code",
            Kind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Width divided by height; 0 for a degenerate image.
    pub fn ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }

    pub fn orientation(&self) -> &'static str {
        match self.width.cmp(&self.height) {
            std::cmp::Ordering::Greater => "landscape",
            std::cmp::Ordering::Less => "portrait",
            std::cmp::Ordering::Equal => "square",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Media {
    root: PathBuf,
    filename: String,
    dimensions: OnceCell<Option<Dimensions>>,
    embedded: OnceCell<EmbeddedMeta>,
}

impl Media {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let filename = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            root,
            filename,
            dimensions: OnceCell::new(),
            embedded: OnceCell::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Filename without its extension.
    pub fn name(&self) -> &str {
        match self.filename.rfind('.') {
            Some(pos) if pos > 0 => &self.filename[..pos],
            _ => &self.filename,
        }
    }

    /// Lowercased extension, empty if there is none.
    pub fn extension(&self) -> String {
        self.root
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    pub fn kind(&self) -> Kind {
        Kind::from_extension(&self.extension())
    }

    pub fn mime(&self) -> String {
        mime_guess::from_path(&self.root)
            .first_or_octet_stream()
            .to_string()
    }

    pub fn exists(&self) -> bool {
        self.root.is_file()
    }

    /// Size in bytes; 0 when the file can't be read.
    pub fn size(&self) -> u64 {
        std::fs::metadata(&self.root).map(|m| m.len()).unwrap_or(0)
    }

    pub fn nice_size(&self) -> String {
        nice_size(self.size())
    }

    pub fn modified(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.root).and_then(|m| m.modified()).ok()
    }

    /// Modification time as seconds since the Unix epoch.
    pub fn modified_timestamp(&self) -> Option<u64> {
        self.modified()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
    }

    /// Stable identifier derived from the file's path.
    pub fn hash(&self) -> String {
        let digest = Sha256::digest(self.root.to_string_lossy().as_bytes());
        format!("{digest:x}")
    }

    /// Pixel dimensions for images the decoder understands, read once.
    pub fn dimensions(&self) -> Option<Dimensions> {
        *self.dimensions.get_or_init(|| {
            if self.kind() != Kind::Image {
                return None;
            }
            match image::image_dimensions(&self.root) {
                Ok((width, height)) => Some(Dimensions { width, height }),
                Err(err) => {
                    tracing::debug!(path = %self.root.display(), error = %err, "no dimensions");
                    None
                }
            }
        })
    }

    pub fn width(&self) -> u32 {
        self.dimensions().map(|d| d.width).unwrap_or(0)
    }

    pub fn height(&self) -> u32 {
        self.dimensions().map(|d| d.height).unwrap_or(0)
    }

    /// Title, caption and keywords written into the file by an editor.
    pub fn embedded(&self) -> &EmbeddedMeta {
        self.embedded.get_or_init(|| embedded::read(&self.root))
    }
}

/// Human-readable byte count: `1536` → `"1.5 kb"`.
pub fn nice_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["b", "kb", "mb", "gb", "tb", "pb"];
    if bytes == 0 {
        return "0 b".to_string();
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    let rounded = (size * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}
