use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureKeyError {
    #[error("texture key must not be empty")]
    Empty,
    #[error("texture key must not start with '/'")]
    LeadingSlash,
    #[error("texture key must not contain '\\\\'")]
    Backslash,
    #[error("texture key must not contain '..'")]
    ParentTraversal,
    #[error("texture key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Keys are lowercase ASCII identifiers; `/` and `-` are allowed so keys can
/// mirror nested asset folders.
pub fn validate_texture_key(key: &str) -> Result<(), TextureKeyError> {
    if key.is_empty() {
        return Err(TextureKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(TextureKeyError::LeadingSlash);
    }
    if key.contains('\\') {
        return Err(TextureKeyError::Backslash);
    }
    if key.contains("..") {
        return Err(TextureKeyError::ParentTraversal);
    }
    match key
        .chars()
        .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-')))
    {
        Some(character) => Err(TextureKeyError::InvalidCharacter { character }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_manifest_style_keys() {
        for key in ["tile_grass_1", "avatar3", "ui/icon-home"] {
            assert!(validate_texture_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_malformed_keys() {
        assert_eq!(validate_texture_key(""), Err(TextureKeyError::Empty));
        assert_eq!(validate_texture_key("/tile"), Err(TextureKeyError::LeadingSlash));
        assert_eq!(validate_texture_key(r"a\b"), Err(TextureKeyError::Backslash));
        assert_eq!(validate_texture_key("a/../b"), Err(TextureKeyError::ParentTraversal));
        assert_eq!(
            validate_texture_key("Tile"),
            Err(TextureKeyError::InvalidCharacter { character: 'T' })
        );
    }
}
