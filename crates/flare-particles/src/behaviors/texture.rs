use super::{parse_config, Behavior, BehaviorContext};
use crate::particle::Wave;
use crate::rand::ParticleRng;
use crate::texture::{parse_textures, TextureHandle};
use flare_core::{FlareError, Result};
use serde::Deserialize;
use std::any::Any;

/// A texture list that may also be written as a single name.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextureNames {
    One(String),
    Many(Vec<String>),
}

impl TextureNames {
    fn into_vec(self) -> Vec<String> {
        match self {
            TextureNames::One(name) => vec![name],
            TextureNames::Many(names) => names,
        }
    }
}

#[derive(Deserialize)]
struct TexturesConfig {
    textures: TextureNames,
}

fn resolve_list(
    behavior: &str,
    config: &serde_json::Value,
    ctx: &BehaviorContext<'_>,
) -> Result<Vec<TextureHandle>> {
    let config: TexturesConfig = parse_config(behavior, config)?;
    let textures = parse_textures(ctx.textures, &config.textures.into_vec())?;
    if textures.is_empty() {
        return Err(FlareError::EmptyTextureList);
    }
    Ok(textures)
}

#[derive(Deserialize)]
struct SingleConfig {
    texture: String,
}

/// Every particle gets the same texture.
#[derive(Debug)]
pub struct SingleTextureBehavior {
    texture: TextureHandle,
}

impl SingleTextureBehavior {
    pub const TYPE: &'static str = "textureSingle";

    pub fn from_config(config: &serde_json::Value, ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: SingleConfig = parse_config(Self::TYPE, config)?;
        Ok(Self {
            texture: ctx.textures.resolve(&config.texture)?,
        })
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }
}

impl Behavior for SingleTextureBehavior {
    fn init_particles(&mut self, wave: &mut Wave<'_>, _rng: &mut ParticleRng) {
        while let Some(p) = wave.next_particle() {
            p.texture = Some(self.texture);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Independent uniform pick per particle.
#[derive(Debug)]
pub struct RandomTextureBehavior {
    textures: Vec<TextureHandle>,
}

impl RandomTextureBehavior {
    pub const TYPE: &'static str = "textureRandom";

    pub fn from_config(config: &serde_json::Value, ctx: &BehaviorContext<'_>) -> Result<Self> {
        Ok(Self {
            textures: resolve_list(Self::TYPE, config, ctx)?,
        })
    }

    pub fn textures(&self) -> &[TextureHandle] {
        &self.textures
    }
}

impl Behavior for RandomTextureBehavior {
    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        while let Some(p) = wave.next_particle() {
            p.texture = Some(self.textures[rng.index(self.textures.len())]);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Round-robin through the list; the position is shared by every particle
/// this behavior initializes.
#[derive(Debug)]
pub struct OrderedTextureBehavior {
    textures: Vec<TextureHandle>,
    index: usize,
}

impl OrderedTextureBehavior {
    pub const TYPE: &'static str = "textureOrdered";

    pub fn from_config(config: &serde_json::Value, ctx: &BehaviorContext<'_>) -> Result<Self> {
        Ok(Self {
            textures: resolve_list(Self::TYPE, config, ctx)?,
            index: 0,
        })
    }
}

impl Behavior for OrderedTextureBehavior {
    fn init_particles(&mut self, wave: &mut Wave<'_>, _rng: &mut ParticleRng) {
        while let Some(p) = wave.next_particle() {
            p.texture = Some(self.textures[self.index]);
            self.index += 1;
            if self.index >= self.textures.len() {
                self.index = 0;
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::test_support::{arena, atlas, init_all, with_context};
    use crate::texture::TextureResolver;
    use serde_json::json;

    #[test]
    fn single_texture_applies_to_all() {
        let mut behavior =
            with_context(|ctx| SingleTextureBehavior::from_config(&json!({"texture": "b"}), ctx))
                .unwrap();
        let (mut arena, head) = arena(3);
        init_all(&mut behavior, &mut arena, head);
        let b = atlas().resolve("b").unwrap();
        assert!(arena.iter().all(|p| p.texture == Some(b)));
    }

    #[test]
    fn ordered_texture_wraps_across_waves() {
        let mut behavior = with_context(|ctx| {
            OrderedTextureBehavior::from_config(&json!({"textures": ["a", "b", "c"]}), ctx)
        })
        .unwrap();
        let atlas = atlas();
        let ids: Vec<u32> = ["a", "b", "c"]
            .iter()
            .map(|n| atlas.resolve(n).unwrap().id)
            .collect();

        let (mut first, head) = arena(2);
        init_all(&mut behavior, &mut first, head);
        let (mut second, head) = arena(3);
        init_all(&mut behavior, &mut second, head);

        let seen: Vec<u32> = first
            .iter()
            .chain(second.iter())
            .filter_map(|p| p.texture.map(|t| t.id))
            .collect();
        assert_eq!(seen, vec![ids[0], ids[1], ids[2], ids[0], ids[1]]);
    }

    #[test]
    fn random_texture_uses_every_entry() {
        let mut behavior = with_context(|ctx| {
            RandomTextureBehavior::from_config(&json!({"textures": ["a", "b"]}), ctx)
        })
        .unwrap();
        let (mut arena, head) = arena(64);
        init_all(&mut behavior, &mut arena, head);
        let distinct: std::collections::HashSet<_> = arena.iter().map(|p| p.texture).collect();
        assert_eq!(distinct.len(), 2);
    }

    #[test]
    fn mixed_sources_are_rejected() {
        let err = with_context(|ctx| {
            RandomTextureBehavior::from_config(&json!({"textures": ["a", "other"]}), ctx)
        })
        .unwrap_err();
        assert!(matches!(err, FlareError::TextureSourceMismatch { .. }));
    }

    #[test]
    fn single_name_is_accepted() {
        let behavior =
            with_context(|ctx| RandomTextureBehavior::from_config(&json!({"textures": "c"}), ctx))
                .unwrap();
        assert_eq!(behavior.textures().len(), 1);
    }
}
