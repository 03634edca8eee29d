mod catalog;
mod keys;
mod manifest;
mod placeholder;
mod registry;

use std::path::PathBuf;

use thiserror::Error;

pub use catalog::{keys as texture_keys, BuildingType, PropKind, TileId};
pub use keys::{validate_texture_key, TextureKeyError};
pub use manifest::{AssetManifest, TextureEntry, MANIFEST_FILE_NAME};
pub use placeholder::{
    PlaceholderTextureLoader, AVATAR_FRAME_SIZE, AVATAR_SHEET_COLUMNS, AVATAR_SHEET_ROWS,
};
pub use registry::{PngTextureLoader, Texture, TextureHandle, TextureLoader, TextureRegistry};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read asset manifest {path}: {source}")]
    ReadManifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse asset manifest {path}: {message}")]
    ParseManifest { path: PathBuf, message: String },
    #[error("invalid texture key '{key}': {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: TextureKeyError,
    },
    #[error("texture key '{key}' is listed more than once")]
    DuplicateKey { key: String },
    #[error("texture path '{path}' for '{key}' must be relative and stay inside the asset root")]
    PathOutsideRoot { key: String, path: String },
    #[error("failed to open texture '{key}' at {path}: {source}")]
    OpenTexture {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode texture '{key}' at {path}: {source}")]
    DecodeTexture {
        key: String,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("texture '{key}' has invalid pixel data ({width}x{height}, {len} bytes)")]
    InvalidPixels {
        key: String,
        width: u32,
        height: u32,
        len: usize,
    },
    #[error("texture '{key}' ({width}x{height}) is too small for its frame layout")]
    FrameOutOfBounds { key: String, width: u32, height: u32 },
    #[error("missing texture '{key}'")]
    MissingTexture { key: String },
}
