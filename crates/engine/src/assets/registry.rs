use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use image::ImageReader;
use tracing::{debug, info};

use super::{AssetError, AssetManifest, TextureEntry};

/// Decoded RGBA8 image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    key: String,
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

pub type TextureHandle = Rc<Texture>;

impl Texture {
    pub fn from_rgba(
        key: impl Into<String>,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    ) -> Result<Self, AssetError> {
        let key = key.into();
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(AssetError::InvalidPixels {
                key,
                width,
                height,
                len: rgba.len(),
            });
        }
        Ok(Self {
            key,
            width,
            height,
            rgba,
        })
    }

    pub fn solid(key: impl Into<String>, width: u32, height: u32, color: [u8; 4]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            key: key.into(),
            width,
            height,
            rgba: color.repeat(width as usize * height as usize),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.rgba.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Turns one manifest entry into pixels.
pub trait TextureLoader {
    fn load(&self, entry: &TextureEntry) -> Result<Texture, AssetError>;
}

/// Reads PNG files relative to an asset directory.
#[derive(Debug, Clone)]
pub struct PngTextureLoader {
    root: PathBuf,
}

impl PngTextureLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TextureLoader for PngTextureLoader {
    fn load(&self, entry: &TextureEntry) -> Result<Texture, AssetError> {
        let path = self.root.join(&entry.path);
        let reader = ImageReader::open(&path).map_err(|source| AssetError::OpenTexture {
            key: entry.key.clone(),
            path: path.clone(),
            source,
        })?;
        let decoded = reader.decode().map_err(|source| AssetError::DecodeTexture {
            key: entry.key.clone(),
            path: path.clone(),
            source,
        })?;
        let image = decoded.to_rgba8();
        Texture::from_rgba(
            entry.key.clone(),
            image.width(),
            image.height(),
            image.into_raw(),
        )
    }
}

/// Loaded textures indexed by key. Lookups of unknown keys are errors.
#[derive(Debug, Default)]
pub struct TextureRegistry {
    textures: HashMap<String, TextureHandle>,
    loaded: bool,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every manifest entry. All-or-nothing; a second call after a
    /// successful load does nothing and returns `Ok(0)`.
    pub fn load_all(
        &mut self,
        manifest: &AssetManifest,
        loader: &dyn TextureLoader,
    ) -> Result<usize, AssetError> {
        if self.loaded {
            debug!("assets_already_loaded");
            return Ok(0);
        }
        manifest.validate()?;

        let mut staged = HashMap::with_capacity(manifest.len());
        for entry in &manifest.textures {
            let texture = loader.load(entry)?;
            debug!(
                key = entry.key.as_str(),
                width = texture.width(),
                height = texture.height(),
                "texture_loaded"
            );
            staged.insert(entry.key.clone(), Rc::new(texture));
        }

        let count = staged.len();
        self.textures.extend(staged);
        self.loaded = true;
        info!(texture_count = count, "assets_loaded");
        Ok(count)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn insert(&mut self, texture: Texture) {
        self.textures
            .insert(texture.key().to_string(), Rc::new(texture));
    }

    pub fn get(&self, key: &str) -> Option<TextureHandle> {
        self.textures.get(key).cloned()
    }

    pub fn resolve(&self, key: &str) -> Result<TextureHandle, AssetError> {
        self.get(key).ok_or_else(|| AssetError::MissingTexture {
            key: key.to_string(),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.textures.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    use super::*;
    use crate::assets::PlaceholderTextureLoader;

    struct CountingLoader {
        calls: Cell<u32>,
    }

    impl TextureLoader for CountingLoader {
        fn load(&self, entry: &TextureEntry) -> Result<Texture, AssetError> {
            self.calls.set(self.calls.get() + 1);
            Ok(Texture::solid(entry.key.clone(), 2, 2, [1, 2, 3, 255]))
        }
    }

    struct FailingLoader;

    impl TextureLoader for FailingLoader {
        fn load(&self, entry: &TextureEntry) -> Result<Texture, AssetError> {
            if entry.key == "avatar2" {
                return Err(AssetError::MissingTexture {
                    key: entry.key.clone(),
                });
            }
            Ok(Texture::solid(entry.key.clone(), 1, 1, [0, 0, 0, 255]))
        }
    }

    #[test]
    fn load_all_is_idempotent() {
        let manifest = AssetManifest::builtin();
        let loader = CountingLoader {
            calls: Cell::new(0),
        };
        let mut registry = TextureRegistry::new();

        let first = registry.load_all(&manifest, &loader).expect("first load");
        let second = registry.load_all(&manifest, &loader).expect("second load");

        assert_eq!(first, manifest.len());
        assert_eq!(second, 0);
        assert_eq!(loader.calls.get() as usize, manifest.len());
    }

    #[test]
    fn failed_load_leaves_registry_empty() {
        let mut registry = TextureRegistry::new();
        let result = registry.load_all(&AssetManifest::builtin(), &FailingLoader);

        assert!(result.is_err());
        assert!(!registry.is_loaded());
        assert!(registry.is_empty());
    }

    #[test]
    fn resolve_unknown_key_is_missing_texture() {
        let registry = TextureRegistry::new();
        assert!(matches!(
            registry.resolve("prop_throne"),
            Err(AssetError::MissingTexture { key }) if key == "prop_throne"
        ));
    }

    #[test]
    fn png_loader_decodes_rgba_from_disk() {
        let temp = TempDir::new().expect("temp dir");
        let tiles = temp.path().join("tiles");
        std::fs::create_dir_all(&tiles).expect("tiles dir");
        let mut image = RgbaImage::new(3, 2);
        image.put_pixel(2, 1, Rgba([10, 20, 30, 255]));
        image.save(tiles.join("grass_1.png")).expect("save png");

        let loader = PngTextureLoader::new(temp.path());
        let texture = loader
            .load(&TextureEntry {
                key: "tile_grass_1".to_string(),
                path: "tiles/grass_1.png".to_string(),
            })
            .expect("decode");

        assert_eq!((texture.width(), texture.height()), (3, 2));
        assert_eq!(texture.pixel(2, 1), Some([10, 20, 30, 255]));
        assert_eq!(texture.pixel(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn png_loader_reports_missing_file() {
        let temp = TempDir::new().expect("temp dir");
        let loader = PngTextureLoader::new(temp.path());
        let result = loader.load(&TextureEntry {
            key: "prop_desk".to_string(),
            path: "props/desk.png".to_string(),
        });
        assert!(matches!(result, Err(AssetError::OpenTexture { .. })));
    }

    #[test]
    fn placeholder_loader_covers_builtin_manifest() {
        let mut registry = TextureRegistry::new();
        registry
            .load_all(&AssetManifest::builtin(), &PlaceholderTextureLoader)
            .expect("placeholder load");
        let desk = registry.resolve("prop_desk").expect("desk");
        assert_eq!((desk.width(), desk.height()), (48, 32));
    }
}
