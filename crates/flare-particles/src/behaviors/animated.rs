//! Frame-by-frame texture playback

use super::{parse_config, Behavior, BehaviorContext};
use crate::particle::{AnimationState, Particle, Wave};
use crate::rand::ParticleRng;
use crate::texture::{parse_textures, TextureHandle};
use flare_core::{FlareError, Result};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Pushes the frame index over float error right at frame boundaries.
const FRAME_EPSILON: f32 = 0.000_000_1;

/// A frame name, or a name repeated `count` times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnimatedTexture {
    Name(String),
    Repeated {
        texture: String,
        #[serde(default)]
        count: u32,
    },
}

impl AnimatedTexture {
    fn name(&self) -> &str {
        match self {
            AnimatedTexture::Name(name) => name,
            AnimatedTexture::Repeated { texture, .. } => texture,
        }
    }

    fn count(&self) -> usize {
        match self {
            AnimatedTexture::Name(_) => 1,
            AnimatedTexture::Repeated { count, .. } => (*count).max(1) as usize,
        }
    }
}

/// Animation as written in config. A negative framerate stretches the
/// animation over each particle's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimatedArt {
    pub framerate: f32,
    #[serde(default, rename = "loop")]
    pub looping: bool,
    pub textures: Vec<AnimatedTexture>,
}

/// Resolved animation, frames expanded.
#[derive(Debug, Clone)]
pub struct ParsedAnimation {
    pub textures: Vec<TextureHandle>,
    /// Seconds for one pass; 0 when stretched to the particle's life
    pub duration: f32,
    /// Frames per second, or -1 to match the particle's life
    pub framerate: f32,
    pub looping: bool,
}

impl ParsedAnimation {
    pub fn new(art: &AnimatedArt, ctx: &BehaviorContext<'_>) -> Result<Self> {
        let names: Vec<&str> = art.textures.iter().map(AnimatedTexture::name).collect();
        let handles = parse_textures(ctx.textures, &names)?;
        let textures: Vec<TextureHandle> = art
            .textures
            .iter()
            .zip(handles)
            .flat_map(|(entry, handle)| std::iter::repeat(handle).take(entry.count()))
            .collect();
        if textures.is_empty() {
            return Err(FlareError::EmptyTextureList);
        }

        let framerate = if art.framerate < 0.0 {
            -1.0
        } else if art.framerate > 0.0 {
            art.framerate
        } else {
            60.0
        };
        Ok(Self {
            duration: if framerate > 0.0 {
                textures.len() as f32 / framerate
            } else {
                0.0
            },
            looping: framerate > 0.0 && art.looping,
            framerate,
            textures,
        })
    }

    fn start(&self, art: usize, particle: &mut Particle) {
        particle.texture = Some(self.textures[0]);
        let (duration, framerate) = if self.framerate == -1.0 {
            (
                particle.max_life,
                self.textures.len() as f32 / particle.max_life,
            )
        } else {
            (self.duration, self.framerate)
        };
        particle.data.animation = AnimationState {
            art,
            elapsed: 0.0,
            framerate,
            duration,
        };
    }

    fn advance(&self, particle: &mut Particle, delta: f32) {
        let state = &mut particle.data.animation;
        state.elapsed += delta;
        if state.elapsed >= state.duration {
            if self.looping {
                state.elapsed %= state.duration;
            } else {
                state.elapsed = state.duration - 0.000_001;
            }
        }
        let frame = (state.elapsed * state.framerate + FRAME_EPSILON) as usize;
        particle.texture = self
            .textures
            .get(frame)
            .or_else(|| self.textures.last())
            .copied();
    }
}

#[derive(Deserialize)]
struct SingleConfig {
    anim: AnimatedArt,
}

/// Every particle plays the same animation.
#[derive(Debug)]
pub struct SingleAnimatedTextureBehavior {
    anim: ParsedAnimation,
}

impl SingleAnimatedTextureBehavior {
    pub const TYPE: &'static str = "animatedSingle";

    pub fn from_config(config: &serde_json::Value, ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: SingleConfig = parse_config(Self::TYPE, config)?;
        Ok(Self {
            anim: ParsedAnimation::new(&config.anim, ctx)?,
        })
    }

    pub fn animation(&self) -> &ParsedAnimation {
        &self.anim
    }
}

impl Behavior for SingleAnimatedTextureBehavior {
    fn init_particles(&mut self, wave: &mut Wave<'_>, _rng: &mut ParticleRng) {
        while let Some(p) = wave.next_particle() {
            self.anim.start(0, p);
        }
    }

    fn update_particle(&mut self, particle: &mut Particle, delta: f32) -> bool {
        self.anim.advance(particle, delta);
        false
    }

    fn has_update(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Deserialize)]
struct RandomConfig {
    anims: Vec<AnimatedArt>,
}

/// Each particle plays one animation picked at random.
#[derive(Debug)]
pub struct RandomAnimatedTextureBehavior {
    anims: Vec<ParsedAnimation>,
}

impl RandomAnimatedTextureBehavior {
    pub const TYPE: &'static str = "animatedRandom";

    pub fn from_config(config: &serde_json::Value, ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: RandomConfig = parse_config(Self::TYPE, config)?;
        let anims = config
            .anims
            .iter()
            .map(|art| ParsedAnimation::new(art, ctx))
            .collect::<Result<Vec<_>>>()?;
        if anims.is_empty() {
            return Err(FlareError::BehaviorConfig {
                behavior: Self::TYPE.to_string(),
                message: "at least one animation is required".into(),
            });
        }
        Ok(Self { anims })
    }
}

impl Behavior for RandomAnimatedTextureBehavior {
    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        while let Some(p) = wave.next_particle() {
            let art = rng.index(self.anims.len());
            self.anims[art].start(art, p);
        }
    }

    fn update_particle(&mut self, particle: &mut Particle, delta: f32) -> bool {
        let art = particle.data.animation.art;
        if let Some(anim) = self.anims.get(art) {
            anim.advance(particle, delta);
        }
        false
    }

    fn has_update(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
