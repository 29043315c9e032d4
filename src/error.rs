use std::path::PathBuf;

/// Failures while turning an image source into a texture.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to read image {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {label}: {source}")]
    Decode {
        label: String,
        #[source]
        source: image::ImageError,
    },
    #[error("malformed data URL: {0}")]
    DataUrl(String),
    #[error("image {label} has zero size")]
    Empty { label: String },
    #[error("failed to load {requested} and fallback {fallback}: {source}")]
    FallbackFailed {
        requested: String,
        fallback: PathBuf,
        #[source]
        source: Box<TextureError>,
    },
}
