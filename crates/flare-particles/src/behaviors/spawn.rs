//! Spawn placement behaviors. These run before the emitter's own transform
//! is applied, so positions here are local to the spawn point.

use super::{parse_config, Behavior, BehaviorContext, BehaviorOrder};
use crate::particle::Wave;
use crate::rand::ParticleRng;
use crate::shapes::SpawnShape;
use flare_core::{FlareError, Point, Result, DEG_TO_RADS};
use serde::Deserialize;
use std::any::Any;
use std::f32::consts::TAU;

/// Particles spawn exactly at the emitter position.
#[derive(Debug, Default)]
pub struct PointSpawnBehavior;

impl PointSpawnBehavior {
    pub const TYPE: &'static str = "spawnPoint";

    pub fn from_config(_config: &serde_json::Value, _ctx: &BehaviorContext<'_>) -> Result<Self> {
        Ok(Self)
    }
}

impl Behavior for PointSpawnBehavior {
    fn order(&self) -> BehaviorOrder {
        BehaviorOrder::Spawn
    }

    fn init_particles(&mut self, _wave: &mut Wave<'_>, _rng: &mut ParticleRng) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Deserialize)]
struct ShapeConfig {
    #[serde(rename = "type")]
    shape: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Places particles with a registered spawn shape.
pub struct ShapeSpawnBehavior {
    shape_type: String,
    shape: Box<dyn SpawnShape>,
}

impl ShapeSpawnBehavior {
    pub const TYPE: &'static str = "spawnShape";

    pub fn from_config(config: &serde_json::Value, ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: ShapeConfig = parse_config(Self::TYPE, config)?;
        let shape = ctx
            .shapes
            .create(&config.shape, &config.data)
            .map_err(|err| FlareError::BehaviorConfig {
                behavior: Self::TYPE.to_string(),
                message: err.to_string(),
            })?;
        Ok(Self {
            shape_type: config.shape,
            shape,
        })
    }

    pub fn shape_type(&self) -> &str {
        &self.shape_type
    }
}

impl std::fmt::Debug for ShapeSpawnBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeSpawnBehavior")
            .field("shape_type", &self.shape_type)
            .finish()
    }
}

impl Behavior for ShapeSpawnBehavior {
    fn order(&self) -> BehaviorOrder {
        BehaviorOrder::Spawn
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        while let Some(p) = wave.next_particle() {
            self.shape.get_rand_pos(p, rng);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Deserialize)]
struct BurstConfig {
    #[serde(default)]
    spacing: f32,
    #[serde(default)]
    start: f32,
    #[serde(default)]
    distance: f32,
}

/// Fans each wave out at evenly spaced angles, facing outward. With no
/// spacing every particle gets a random angle.
#[derive(Debug)]
pub struct BurstSpawnBehavior {
    spacing: f32,
    start: f32,
    distance: f32,
}

impl BurstSpawnBehavior {
    pub const TYPE: &'static str = "spawnBurst";

    pub fn from_config(config: &serde_json::Value, _ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: BurstConfig = parse_config(Self::TYPE, config)?;
        Ok(Self {
            spacing: config.spacing * DEG_TO_RADS,
            start: config.start * DEG_TO_RADS,
            distance: config.distance,
        })
    }
}

impl Behavior for BurstSpawnBehavior {
    fn order(&self) -> BehaviorOrder {
        BehaviorOrder::Spawn
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        let mut count = 0;
        while let Some(p) = wave.next_particle() {
            let angle = if self.spacing != 0.0 {
                self.start + self.spacing * count as f32
            } else {
                rng.next_f32() * TAU
            };
            p.rotation = angle;
            if self.distance != 0.0 {
                p.set_position(Point::new(self.distance, p.y).rotated(angle));
            }
            count += 1;
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::test_support::{arena, init_all, with_context};
    use serde_json::json;

    #[test]
    fn burst_spaces_angles_evenly() {
        let mut behavior = with_context(|ctx| {
            BurstSpawnBehavior::from_config(&json!({"spacing": 90, "start": 0, "distance": 10}), ctx)
        })
        .unwrap();
        assert_eq!(behavior.order(), BehaviorOrder::Spawn);
        let (mut arena, head) = arena(4);
        init_all(&mut behavior, &mut arena, head);

        for (i, p) in arena.iter().enumerate() {
            let angle = i as f32 * 90.0 * DEG_TO_RADS;
            assert!((p.rotation - angle).abs() < 1e-6);
            assert!((p.position().length() - 10.0).abs() < 1e-4);
            assert!((p.x - 10.0 * angle.cos()).abs() < 1e-4);
            assert!((p.y - 10.0 * angle.sin()).abs() < 1e-4);
        }
    }

    #[test]
    fn burst_at_zero_distance_stays_on_origin() {
        let mut behavior = with_context(|ctx| {
            BurstSpawnBehavior::from_config(&json!({"spacing": 45, "start": 10, "distance": 0}), ctx)
        })
        .unwrap();
        let (mut arena, head) = arena(3);
        init_all(&mut behavior, &mut arena, head);
        for (i, p) in arena.iter().enumerate() {
            assert_eq!(p.position(), Point::ZERO);
            assert!((p.rotation - (10.0 + 45.0 * i as f32) * DEG_TO_RADS).abs() < 1e-6);
        }
    }

    #[test]
    fn shape_spawn_uses_registry() {
        let mut behavior = with_context(|ctx| {
            ShapeSpawnBehavior::from_config(
                &json!({"type": "rect", "data": {"x": 0, "y": 0, "w": 10, "h": 10}}),
                ctx,
            )
        })
        .unwrap();
        assert_eq!(behavior.shape_type(), "rect");
        let (mut arena, head) = arena(20);
        init_all(&mut behavior, &mut arena, head);
        assert!(arena
            .iter()
            .all(|p| (0.0..10.0).contains(&p.x) && (0.0..10.0).contains(&p.y)));
    }

    #[test]
    fn unknown_shape_is_config_error() {
        let err = with_context(|ctx| {
            ShapeSpawnBehavior::from_config(&json!({"type": "star", "data": {}}), ctx)
        })
        .unwrap_err();
        assert!(matches!(err, FlareError::BehaviorConfig { behavior, .. } if behavior == "spawnShape"));
    }
}
