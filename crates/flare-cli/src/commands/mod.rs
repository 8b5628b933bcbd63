//! CLI command implementations

pub mod behaviors;
pub mod simulate;
pub mod validate;

use anyhow::{Context, Result};
use flare_particles::{EmitterConfig, TextureAtlas};

/// Loads a config file, naming the path on failure.
pub fn load_config(path: &str) -> Result<EmitterConfig> {
    EmitterConfig::load(path).with_context(|| format!("Failed to load emitter config '{}'", path))
}

/// An atlas with every texture the config names, all on one source.
pub fn atlas_for(config: &EmitterConfig) -> TextureAtlas {
    let mut atlas = TextureAtlas::new();
    for name in config.texture_names() {
        if atlas.get(&name).is_none() {
            atlas.insert(name, 0);
        }
    }
    atlas
}
