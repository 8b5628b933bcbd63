//! Texture handles and name resolution
//!
//! The engine never touches image data. It only carries opaque handles that
//! a renderer hands back, plus the id of the image source each one samples
//! from, since a render batch can only draw from a single source.

use flare_core::{FlareError, Result};
use std::collections::HashMap;

/// A pre-resolved texture: a frame `id` within image `source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle {
    pub id: u32,
    pub source: u32,
}

/// Resolves texture names into handles.
pub trait TextureResolver {
    fn resolve(&self, name: &str) -> Result<TextureHandle>;
}

/// Name-to-handle map standing in for a host's asset cache.
#[derive(Debug, Default, Clone)]
pub struct TextureAtlas {
    textures: HashMap<String, TextureHandle>,
    next_id: u32,
}

impl TextureAtlas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` as a frame of image `source`. Re-inserting a name
    /// replaces its handle.
    pub fn insert(&mut self, name: impl Into<String>, source: u32) -> TextureHandle {
        let handle = TextureHandle {
            id: self.next_id,
            source,
        };
        self.next_id += 1;
        self.textures.insert(name.into(), handle);
        handle
    }

    pub fn get(&self, name: &str) -> Option<TextureHandle> {
        self.textures.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.textures.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl TextureResolver for TextureAtlas {
    fn resolve(&self, name: &str) -> Result<TextureHandle> {
        self.get(name)
            .ok_or_else(|| FlareError::TextureNotFound(name.to_string()))
    }
}

/// Resolves every name, then checks they share one image source.
pub fn parse_textures<S: AsRef<str>>(
    resolver: &dyn TextureResolver,
    names: &[S],
) -> Result<Vec<TextureHandle>> {
    let handles = names
        .iter()
        .map(|name| resolver.resolve(name.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    validate_single_source(&handles)?;
    Ok(handles)
}

/// Fails when the handles do not all sample the same image source.
pub fn validate_single_source(handles: &[TextureHandle]) -> Result<()> {
    let Some(first) = handles.first() else {
        return Ok(());
    };
    match handles.iter().find(|h| h.source != first.source) {
        Some(other) => Err(FlareError::TextureSourceMismatch {
            expected: first.source,
            found: other.source,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atlas_resolves_names() {
        let mut atlas = TextureAtlas::new();
        let spark = atlas.insert("spark", 7);
        assert_eq!(atlas.resolve("spark").unwrap(), spark);
        assert!(matches!(
            atlas.resolve("smoke"),
            Err(FlareError::TextureNotFound(name)) if name == "smoke"
        ));
    }

    #[test]
    fn parse_textures_requires_single_source() {
        let mut atlas = TextureAtlas::new();
        atlas.insert("a", 1);
        atlas.insert("b", 1);
        atlas.insert("c", 2);

        let handles = parse_textures(&atlas, &["a", "b"]).unwrap();
        assert_eq!(handles.len(), 2);
        assert_ne!(handles[0].id, handles[1].id);

        let err = parse_textures(&atlas, &["a", "c"]).unwrap_err();
        assert!(matches!(
            err,
            FlareError::TextureSourceMismatch {
                expected: 1,
                found: 2
            }
        ));
    }

    #[test]
    fn empty_set_is_valid() {
        assert!(validate_single_source(&[]).is_ok());
    }
}
