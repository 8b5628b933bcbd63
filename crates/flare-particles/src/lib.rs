//! Flare Particles - configurable 2D particle emitters
//!
//! Provides data-driven particle emission with:
//! - Pooled, arena-backed particle storage with O(1) recycle
//! - A pluggable behavior pipeline built from JSON or TOML config
//! - Interpolated value lists, custom easing and spawn shapes
//! - Instance packing for batched sprite draws

pub mod behaviors;
pub mod config;
pub mod container;
pub mod ease;
pub mod emitter;
pub mod particle;
pub mod property;
pub mod rand;
pub mod registry;
pub mod shapes;
pub mod texture;
pub mod ticker;

pub use behaviors::{Behavior, BehaviorContext, BehaviorFactory, BehaviorOrder};
pub use config::{BehaviorEntry, EmitterConfig, LifetimeRange};
pub use container::{ContainerRef, InstanceKey, ParticleBatch, ParticleContainer};
pub use ease::{Ease, EaseConfig};
pub use emitter::{Emitter, EmitterState, POSITION_PARTICLE};
pub use particle::{Particle, ParticleId, ParticleInstance};
pub use property::{ListConfig, PropertyList, ValueList, ValueStep};
pub use rand::ParticleRng;
pub use registry::BehaviorRegistry;
pub use shapes::{ShapeRegistry, SpawnShape};
pub use texture::{TextureAtlas, TextureHandle, TextureResolver};
pub use ticker::Ticker;
