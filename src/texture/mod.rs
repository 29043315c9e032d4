mod loader;

pub use loader::{LoadPurpose, Route, TextureLoader};

use std::fmt;
use std::path::{Path, PathBuf};

use base64::Engine as _;

use crate::error::TextureError;

/// Where an image comes from: a file on disk or an inline `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSource {
    File(PathBuf),
    DataUrl(String),
}

impl TextureSource {
    pub fn parse(src: &str) -> Self {
        if src.starts_with("data:") {
            Self::DataUrl(src.to_string())
        } else {
            Self::File(PathBuf::from(src))
        }
    }
}

impl fmt::Display for TextureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::DataUrl(url) => {
                let header = url.split(',').next().unwrap_or("data:");
                write!(f, "{header},… ({} bytes)", url.len())
            }
        }
    }
}

/// Decoded RGBA8 pixels ready for upload.
#[derive(Clone)]
pub struct TextureImage {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl fmt::Debug for TextureImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureImage")
            .field("label", &self.label)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Result of a load that may have substituted the fallback image.
#[derive(Debug, Clone)]
pub struct LoadedTexture {
    pub image: TextureImage,
    pub fell_back: bool,
}

/// Identifies an uploaded GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// What materials hold: the GPU texture id plus the source pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureHandle {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

impl TextureHandle {
    pub fn new(id: TextureId, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    /// Pixel width over pixel height.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Read and decode an image into RGBA8.
pub fn load_image(source: &TextureSource) -> Result<TextureImage, TextureError> {
    let (label, bytes) = match source {
        TextureSource::File(path) => {
            let bytes = std::fs::read(path).map_err(|source| TextureError::Read {
                path: path.clone(),
                source,
            })?;
            let label = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            (label, bytes)
        }
        TextureSource::DataUrl(url) => ("data-url".to_string(), decode_data_url(url)?),
    };

    let img = image::load_from_memory(&bytes)
        .map_err(|source| TextureError::Decode { label: label.clone(), source })?
        .to_rgba8();

    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(TextureError::Empty { label });
    }

    Ok(TextureImage {
        label,
        width,
        height,
        rgba: img.into_raw(),
    })
}

/// Load `source`, substituting `fallback` when it cannot be read or decoded.
/// Errors only when the fallback fails too.
pub fn load_with_fallback(source: &TextureSource, fallback: &Path) -> Result<LoadedTexture, TextureError> {
    match load_image(source) {
        Ok(image) => Ok(LoadedTexture { image, fell_back: false }),
        Err(e) => {
            log::error!("Failed to load texture {source}: {e}");
            let image = load_image(&TextureSource::File(fallback.to_path_buf())).map_err(|fallback_err| {
                TextureError::FallbackFailed {
                    requested: source.to_string(),
                    fallback: fallback.to_path_buf(),
                    source: Box::new(fallback_err),
                }
            })?;
            log::warn!("Substituted fallback texture {} for {source}", fallback.display());
            Ok(LoadedTexture { image, fell_back: true })
        }
    }
}

/// Decode the payload of a base64 `data:` URL.
fn decode_data_url(url: &str) -> Result<Vec<u8>, TextureError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| TextureError::DataUrl("missing data: scheme".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| TextureError::DataUrl("missing ',' separator".to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(TextureError::DataUrl(format!("unsupported encoding '{meta}'")));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| TextureError::DataUrl(e.to_string()))
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn parse_distinguishes_data_urls() {
        assert_eq!(
            TextureSource::parse("images/floor.jpg"),
            TextureSource::File(PathBuf::from("images/floor.jpg"))
        );
        assert!(matches!(
            TextureSource::parse("data:image/png;base64,AAAA"),
            TextureSource::DataUrl(_)
        ));
    }

    #[test]
    fn loads_png_file_dimensions() {
        let dir = scratch_dir("load-file");
        let path = write_png(&dir, "painting1.png", 4, 2);
        let image = load_image(&TextureSource::File(path)).unwrap();
        assert_eq!((image.width, image.height), (4, 2));
        assert_eq!(image.rgba.len(), 4 * 2 * 4);
        assert_eq!(image.label, "painting1");
    }

    #[test]
    fn loads_base64_data_url() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(3, 5));
        let url = format!("data:image/png;base64,{encoded}");
        let image = load_image(&TextureSource::parse(&url)).unwrap();
        assert_eq!((image.width, image.height), (3, 5));
    }

    #[test]
    fn rejects_non_base64_data_url() {
        let err = load_image(&TextureSource::DataUrl("data:text/plain,hello".into())).unwrap_err();
        assert!(matches!(err, TextureError::DataUrl(_)));
    }

    #[test]
    fn missing_file_falls_back() {
        let dir = scratch_dir("fallback");
        let fallback = write_png(&dir, "fallback.png", 8, 8);
        let loaded = load_with_fallback(&TextureSource::File(dir.join("nope.png")), &fallback).unwrap();
        assert!(loaded.fell_back);
        assert_eq!((loaded.image.width, loaded.image.height), (8, 8));
    }

    #[test]
    fn corrupt_image_falls_back() {
        let dir = scratch_dir("corrupt");
        let fallback = write_png(&dir, "fallback.png", 2, 2);
        let broken = dir.join("broken.png");
        std::fs::write(&broken, b"not an image").unwrap();
        let loaded = load_with_fallback(&TextureSource::File(broken), &fallback).unwrap();
        assert!(loaded.fell_back);
    }

    #[test]
    fn successful_load_does_not_fall_back() {
        let dir = scratch_dir("no-fallback");
        let fallback = write_png(&dir, "fallback.png", 2, 2);
        let wanted = write_png(&dir, "wanted.png", 6, 3);
        let loaded = load_with_fallback(&TextureSource::File(wanted), &fallback).unwrap();
        assert!(!loaded.fell_back);
        assert_eq!(loaded.image.width, 6);
    }

    #[test]
    fn failing_fallback_is_reported() {
        let dir = scratch_dir("both-missing");
        let err = load_with_fallback(&TextureSource::File(dir.join("a.png")), &dir.join("b.png")).unwrap_err();
        assert!(matches!(err, TextureError::FallbackFailed { .. }));
    }

    #[test]
    fn handle_aspect_is_width_over_height() {
        let handle = TextureHandle::new(TextureId(1), 800, 400);
        assert_eq!(handle.aspect(), 2.0);
    }
}
