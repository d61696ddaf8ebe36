// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Screenshot loading.
//!
//! Uploaded files are kept as `data:` URLs inside the project so a guide
//! is self-contained. Files that are not images are skipped without
//! complaint. Each upload is read on its own background thread and reports
//! back over a channel; results arrive in completion order, not selection
//! order.

use crate::error::{GuideError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::Arc;

/// Decoded RGBA pixels, ready for a texture.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// A screenshot accepted for a new step.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub name: String,
    pub data_url: String,
}

/// Result of one background upload; `Ok(None)` means the file was skipped.
pub type UploadOutcome = std::result::Result<Option<UploadedImage>, String>;

/// Where an upload's bytes come from: a picked or dropped file on disk, or
/// the contents of a drop that carries no path.
#[derive(Debug, Clone)]
pub enum UploadSource {
    Path(PathBuf),
    Bytes { name: String, bytes: Arc<[u8]> },
}

impl UploadSource {
    fn describe(&self) -> String {
        match self {
            UploadSource::Path(path) => path.display().to_string(),
            UploadSource::Bytes { name, .. } => name.clone(),
        }
    }
}

impl From<PathBuf> for UploadSource {
    fn from(path: PathBuf) -> Self {
        UploadSource::Path(path)
    }
}

/// Encode raw file bytes as a data URL, or `None` if they don't decode as
/// an image.
pub fn encode_data_url(bytes: &[u8]) -> Option<String> {
    let format = image::guess_format(bytes).ok()?;
    if let Err(e) = image::load_from_memory_with_format(bytes, format) {
        log::debug!("Rejecting unreadable {:?} image: {}", format, e);
        return None;
    }
    Some(format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        STANDARD.encode(bytes)
    ))
}

/// Read an image file from disk into an [`UploadedImage`].
pub fn read_image_file(path: &Path) -> anyhow::Result<Option<UploadedImage>> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(encode_data_url(&bytes).map(|data_url| UploadedImage { name, data_url }))
}

/// Read an upload from wherever it lives.
pub fn read_upload(source: &UploadSource) -> anyhow::Result<Option<UploadedImage>> {
    match source {
        UploadSource::Path(path) => read_image_file(path),
        UploadSource::Bytes { name, bytes } => Ok(encode_data_url(bytes).map(|data_url| UploadedImage {
            name: name.clone(),
            data_url,
        })),
    }
}

/// Turn files dropped on the window into uploads. Drops with neither a
/// path nor contents are ignored.
pub fn dropped_sources(files: &[egui::DroppedFile]) -> Vec<UploadSource> {
    files
        .iter()
        .filter_map(|file| match (&file.path, &file.bytes) {
            (Some(path), _) => Some(UploadSource::Path(path.clone())),
            (None, Some(bytes)) => Some(UploadSource::Bytes {
                name: file.name.clone(),
                bytes: bytes.clone(),
            }),
            (None, None) => None,
        })
        .collect()
}

/// Extract the encoded bytes from a base64 `data:` URL.
pub fn data_url_bytes(url: &str) -> Result<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| GuideError::ImageDecode("not a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| GuideError::ImageDecode("data URL has no payload".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(GuideError::ImageDecode(format!(
            "unsupported data URL encoding: {}",
            header
        )));
    }

    STANDARD
        .decode(payload.trim())
        .map_err(|e| GuideError::ImageDecode(e.to_string()))
}

/// Decode a data URL into an RGBA image.
pub fn decode_data_url(url: &str) -> Result<RgbaImage> {
    let bytes = data_url_bytes(url)?;
    let img = image::load_from_memory(&bytes).map_err(|e| GuideError::ImageDecode(e.to_string()))?;
    Ok(img.to_rgba8())
}

/// Decode a data URL into raw pixels for display.
pub fn load_data_url(url: &str) -> Result<LoadedImage> {
    let img = decode_data_url(url)?;
    Ok(LoadedImage {
        width: img.width(),
        height: img.height(),
        pixels: img.into_raw(),
    })
}

/// Read each upload on its own thread and send the outcome to `sender`.
pub fn spawn_uploads(sources: Vec<UploadSource>, sender: &Sender<UploadOutcome>) {
    for source in sources {
        let sender = sender.clone();
        std::thread::spawn(move || {
            let outcome = match read_upload(&source) {
                Ok(Some(image)) => {
                    log::info!("Read screenshot {}", source.describe());
                    Ok(Some(image))
                }
                Ok(None) => {
                    log::debug!("Skipping non-image file {}", source.describe());
                    Ok(None)
                }
                Err(e) => Err(format!("Failed to read {}: {}", source.describe(), e)),
            };
            let _ = sender.send(outcome);
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;
    use std::sync::mpsc::channel;

    /// Encode a solid `width` x `height` PNG.
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 220, 240, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    pub(crate) fn png_data_url(width: u32, height: u32) -> String {
        encode_data_url(&png_bytes(width, height)).unwrap()
    }

    #[test]
    fn test_png_becomes_data_url_and_decodes_back() {
        let url = png_data_url(4, 3);
        assert!(url.starts_with("data:image/png;base64,"));
        let loaded = load_data_url(&url).unwrap();
        assert_eq!((loaded.width, loaded.height), (4, 3));
        assert_eq!(loaded.pixels.len(), 4 * 3 * 4);
    }

    #[test]
    fn test_non_image_bytes_are_skipped() {
        assert_eq!(encode_data_url(b"just some text"), None);
    }

    #[test]
    fn test_bad_data_urls_are_errors() {
        assert!(matches!(decode_data_url("http://x/y.png"), Err(GuideError::ImageDecode(_))));
        assert!(matches!(decode_data_url("data:image/png,raw"), Err(GuideError::ImageDecode(_))));
        assert!(matches!(decode_data_url("data:image/png;base64,AAAA"), Err(GuideError::ImageDecode(_))));
    }

    #[test]
    fn test_spawn_uploads_reports_each_file() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("shot.png");
        let txt = dir.path().join("notes.txt");
        std::fs::write(&png, png_bytes(2, 2)).unwrap();
        std::fs::write(&txt, b"hello").unwrap();

        let (sender, receiver) = channel();
        spawn_uploads(vec![png.into(), txt.into()], &sender);
        drop(sender);

        let outcomes: Vec<UploadOutcome> = receiver.iter().collect();
        assert_eq!(outcomes.len(), 2);
        let accepted: Vec<_> = outcomes.into_iter().filter_map(|o| o.unwrap()).collect();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].name, "shot.png");
    }

    #[test]
    fn test_truncated_png_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.png");
        let mut bytes = png_bytes(64, 64);
        bytes.truncate(40);
        std::fs::write(&path, &bytes).unwrap();

        // The header still sniffs as PNG, but the pixels are gone.
        assert!(image::guess_format(&bytes).is_ok());
        assert_eq!(read_image_file(&path).unwrap(), None);
    }

    #[test]
    fn test_dropped_files_upload_by_path_or_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let on_disk = dir.path().join("dropped.png");
        std::fs::write(&on_disk, png_bytes(3, 3)).unwrap();

        let dropped = vec![
            egui::DroppedFile {
                path: Some(on_disk),
                ..Default::default()
            },
            egui::DroppedFile {
                name: "pasted.png".to_string(),
                bytes: Some(png_bytes(2, 2).into()),
                ..Default::default()
            },
            egui::DroppedFile {
                name: "readme.md".to_string(),
                bytes: Some(b"# notes".to_vec().into()),
                ..Default::default()
            },
            egui::DroppedFile::default(),
        ];
        let sources = dropped_sources(&dropped);
        assert_eq!(sources.len(), 3);

        let (sender, receiver) = channel();
        spawn_uploads(sources, &sender);
        drop(sender);

        let mut names: Vec<String> = receiver
            .iter()
            .filter_map(|o| o.unwrap())
            .map(|image| image.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["dropped.png", "pasted.png"]);
    }
}
