use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use super::catalog::DEFAULT_TEXTURE_PATHS;
use super::{validate_texture_key, AssetError};

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureEntry {
    pub key: String,
    /// Relative to the directory holding the manifest.
    pub path: String,
}

/// Table of every texture the scenes may reference, keyed by string id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetManifest {
    pub textures: Vec<TextureEntry>,
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AssetManifest {
    /// The full key set with the conventional file layout.
    pub fn builtin() -> Self {
        Self {
            textures: DEFAULT_TEXTURE_PATHS
                .iter()
                .map(|(key, path)| TextureEntry {
                    key: (*key).to_string(),
                    path: (*path).to_string(),
                })
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let raw = fs::read_to_string(path).map_err(|source| AssetError::ReadManifest {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|message| AssetError::ParseManifest {
            path: path.to_path_buf(),
            message,
        })
    }

    fn parse(raw: &str) -> Result<Self, String> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        match serde_path_to_error::deserialize::<_, AssetManifest>(&mut deserializer) {
            Ok(manifest) => Ok(manifest),
            Err(error) => {
                let path = error.path().to_string();
                let source = error.into_inner();
                if path.is_empty() || path == "." {
                    Err(format!("parse manifest json: {source}"))
                } else {
                    Err(format!("parse manifest json at {path}: {source}"))
                }
            }
        }
    }

    /// Checks key syntax, key uniqueness and that every path is a plain
    /// relative path.
    pub fn validate(&self) -> Result<(), AssetError> {
        let mut seen = HashSet::with_capacity(self.textures.len());
        for entry in &self.textures {
            validate_texture_key(&entry.key).map_err(|source| AssetError::InvalidKey {
                key: entry.key.clone(),
                source,
            })?;
            if !seen.insert(entry.key.as_str()) {
                return Err(AssetError::DuplicateKey {
                    key: entry.key.clone(),
                });
            }
            if !is_contained_relative_path(&entry.path) {
                return Err(AssetError::PathOutsideRoot {
                    key: entry.key.clone(),
                    path: entry.path.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.textures.iter().map(|entry| entry.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

fn is_contained_relative_path(raw: &str) -> bool {
    if raw.is_empty() || raw.contains('\\') {
        return false;
    }
    Path::new(raw)
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
}
