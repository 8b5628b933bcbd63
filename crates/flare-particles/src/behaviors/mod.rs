//! Pluggable per-particle behaviors
//!
//! A behavior is built from one `{type, config}` entry of an emitter config.
//! It may initialize each spawned wave, update particles every tick, and
//! observe recycling. The emitter reads `has_update`/`has_recycle` once when
//! it builds its pipeline, so hooks a behavior does not declare are never
//! called.

mod alpha;
mod anchor;
mod animated;
mod color;
mod movement;
mod path_expr;
mod rotation;
mod scale;
mod spawn;
mod texture;

pub use alpha::{AlphaBehavior, StaticAlphaBehavior};
pub use anchor::AnchorStaticBehavior;
pub use animated::{
    AnimatedArt, AnimatedTexture, ParsedAnimation, RandomAnimatedTextureBehavior,
    SingleAnimatedTextureBehavior,
};
pub use color::{ColorBehavior, StaticColorBehavior};
pub use movement::{AccelerationBehavior, PathBehavior, SpeedBehavior, StaticSpeedBehavior};
pub use path_expr::PathExpression;
pub use rotation::{NoRotationBehavior, RotationBehavior, StaticRotationBehavior};
pub use scale::{ScaleBehavior, StaticScaleBehavior};
pub use spawn::{BurstSpawnBehavior, PointSpawnBehavior, ShapeSpawnBehavior};
pub use texture::{OrderedTextureBehavior, RandomTextureBehavior, SingleTextureBehavior};

use crate::particle::{Particle, Wave};
use crate::rand::ParticleRng;
use crate::shapes::ShapeRegistry;
use crate::texture::TextureResolver;
use flare_core::{FlareError, Result};
use serde::de::DeserializeOwned;
use std::any::Any;

/// Priority class deciding where a behavior sits in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BehaviorOrder {
    /// Places particles; runs before the emitter transform is applied
    Spawn = 0,
    Normal = 2,
    /// Runs after every normal behavior
    Late = 5,
}

impl BehaviorOrder {
    pub fn value(self) -> u32 {
        self as u32
    }
}

/// Services available to behavior factories.
#[derive(Clone, Copy)]
pub struct BehaviorContext<'a> {
    pub textures: &'a dyn TextureResolver,
    pub shapes: &'a ShapeRegistry,
}

/// A per-particle behavior.
pub trait Behavior: Any {
    fn order(&self) -> BehaviorOrder {
        BehaviorOrder::Normal
    }

    /// Called once per spawned wave, after spawn placement.
    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng);

    /// Called every tick for every live particle when `has_update` is true.
    /// Returning true recycles the particle and skips later behaviors.
    fn update_particle(&mut self, _particle: &mut Particle, _delta: f32) -> bool {
        false
    }

    /// Called when a particle leaves the active list. `natural` is false
    /// when the emitter is being cleaned up.
    fn recycle_particle(&mut self, _particle: &mut Particle, _natural: bool) {}

    fn has_update(&self) -> bool {
        false
    }

    fn has_recycle(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;
}

/// Builds a behavior from its `config` value.
pub type BehaviorFactory = fn(&serde_json::Value, &BehaviorContext<'_>) -> Result<Box<dyn Behavior>>;

/// Deserializes a behavior's typed config, tagging failures with the
/// behavior name.
pub(crate) fn parse_config<T: DeserializeOwned>(
    behavior: &str,
    config: &serde_json::Value,
) -> Result<T> {
    serde_json::from_value(config.clone()).map_err(|e| FlareError::BehaviorConfig {
        behavior: behavior.to_string(),
        message: e.to_string(),
    })
}

/// Lifts a construction error into `BehaviorConfig`, keeping texture
/// errors distinct.
pub(crate) fn config_error(behavior: &str) -> impl Fn(FlareError) -> FlareError + '_ {
    move |err| match err {
        FlareError::TextureNotFound(_)
        | FlareError::TextureSourceMismatch { .. }
        | FlareError::EmptyTextureList
        | FlareError::BehaviorConfig { .. } => err,
        other => FlareError::BehaviorConfig {
            behavior: behavior.to_string(),
            message: other.to_string(),
        },
    }
}
