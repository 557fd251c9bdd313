//! Content-addressed staging of pasted or dropped images.
//!
//! Images are named by the SHA-256 of their bytes, so pasting the same
//! image twice stages a single file.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

use crate::config::EditorConfig;

const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/svg+xml", "svg"),
    ("image/bmp", "bmp"),
    ("image/x-icon", "ico"),
    ("image/vnd.microsoft.icon", "ico"),
    ("image/heic", "heic"),
    ("image/heif", "heif"),
    ("image/avif", "avif"),
];

/// File extension for an image, from its MIME type or else its file name
///
/// `None` for anything that is not a supported image.
pub fn extension_for(mime: &str, file_name: Option<&str>) -> Option<&'static str> {
    let mime = mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    if let Some((_, ext)) = MIME_EXTENSIONS.iter().find(|(m, _)| *m == mime) {
        return Some(*ext);
    }

    let (_, ext) = file_name?.rsplit_once('.')?;
    let ext = match ext.to_ascii_lowercase().as_str() {
        "jpeg" => "jpg",
        other => return MIME_EXTENSIONS.iter().map(|(_, e)| *e).find(|e| *e == other),
    };
    Some(ext)
}

/// An image ready to be staged as a binary `addFile`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Where the file is committed in the repository
    pub repo_path: String,
    /// Where the site serves it, for use in Markdown
    pub public_path: String,
    pub base64: String,
}

impl ImageUpload {
    pub fn prepare(
        bytes: &[u8],
        mime: &str,
        file_name: Option<&str>,
        config: &EditorConfig,
    ) -> Option<Self> {
        let ext = extension_for(mime, file_name)?;
        let name = format!("{:x}.{ext}", Sha256::digest(bytes));
        Some(Self {
            repo_path: format!("{}/{name}", config.upload_dir.trim_end_matches('/')),
            public_path: format!("{}/{name}", config.upload_public_prefix.trim_end_matches('/')),
            base64: STANDARD.encode(bytes),
        })
    }

    pub fn markdown(&self) -> String {
        format!("![]({})", self.public_path)
    }
}
