use super::{parse_config, Behavior, BehaviorContext, BehaviorOrder};
use crate::particle::{Particle, Wave};
use crate::rand::ParticleRng;
use flare_core::{Result, DEG_TO_RADS};
use serde::Deserialize;
use std::any::Any;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RotationConfig {
    min_start: f32,
    max_start: f32,
    min_speed: f32,
    max_speed: f32,
    #[serde(default)]
    accel: f32,
}

/// Spins particles from a random start angle at a random speed, with
/// optional angular acceleration. Angles are configured in degrees.
#[derive(Debug)]
pub struct RotationBehavior {
    min_start: f32,
    max_start: f32,
    min_speed: f32,
    max_speed: f32,
    accel: f32,
}

impl RotationBehavior {
    pub const TYPE: &'static str = "rotation";

    pub fn from_config(config: &serde_json::Value, _ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: RotationConfig = parse_config(Self::TYPE, config)?;
        Ok(Self {
            min_start: config.min_start * DEG_TO_RADS,
            max_start: config.max_start * DEG_TO_RADS,
            min_speed: config.min_speed * DEG_TO_RADS,
            max_speed: config.max_speed * DEG_TO_RADS,
            accel: config.accel * DEG_TO_RADS,
        })
    }
}

impl Behavior for RotationBehavior {
    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        while let Some(p) = wave.next_particle() {
            p.rotation += if self.min_start == self.max_start {
                self.max_start
            } else {
                rng.range(self.min_start, self.max_start)
            };
            let speed = if self.min_speed == self.max_speed {
                self.max_speed
            } else {
                rng.range(self.min_speed, self.max_speed)
            };
            p.data.rotation_speed = speed;
            p.data.rotation_direction = speed.signum();
        }
    }

    fn update_particle(&mut self, particle: &mut Particle, delta: f32) -> bool {
        let data = &mut particle.data;
        if self.accel != 0.0 {
            data.rotation_speed += self.accel * delta;
            // deceleration stops the spin rather than reversing it
            if data.rotation_speed.signum() != data.rotation_direction {
                data.rotation_speed = 0.0;
            }
        }
        particle.rotation += data.rotation_speed * delta;
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
struct StaticRotationConfig {
    min: f32,
    max: f32,
}

/// Random start angle in `[min, max]` degrees, no spin.
#[derive(Debug)]
pub struct StaticRotationBehavior {
    min: f32,
    max: f32,
}

impl StaticRotationBehavior {
    pub const TYPE: &'static str = "rotationStatic";

    pub fn from_config(config: &serde_json::Value, _ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: StaticRotationConfig = parse_config(Self::TYPE, config)?;
        Ok(Self {
            min: config.min * DEG_TO_RADS,
            max: config.max * DEG_TO_RADS,
        })
    }
}

impl Behavior for StaticRotationBehavior {
    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        while let Some(p) = wave.next_particle() {
            p.rotation += if self.min == self.max {
                self.max
            } else {
                rng.range(self.min, self.max)
            };
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Deserialize, Default)]
struct NoRotationConfig {
    #[serde(default)]
    rotation: f32,
}

/// Forces a fixed rotation after every other behavior has run on a wave.
#[derive(Debug)]
pub struct NoRotationBehavior {
    rotation: f32,
}

impl NoRotationBehavior {
    pub const TYPE: &'static str = "noRotation";

    pub fn from_config(config: &serde_json::Value, _ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: NoRotationConfig = if config.is_null() {
            NoRotationConfig::default()
        } else {
            parse_config(Self::TYPE, config)?
        };
        Ok(Self {
            rotation: config.rotation * DEG_TO_RADS,
        })
    }
}

impl Behavior for NoRotationBehavior {
    fn order(&self) -> BehaviorOrder {
        BehaviorOrder::Late
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, _rng: &mut ParticleRng) {
        while let Some(p) = wave.next_particle() {
            p.rotation = self.rotation;
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

    fn rotation(config: serde_json::Value) -> RotationBehavior {
        with_context(|ctx| RotationBehavior::from_config(&config, ctx)).unwrap()
    }

    #[test]
    fn start_and_speed_in_radians() {
        let mut behavior = rotation(json!({
            "minStart": 90, "maxStart": 90, "minSpeed": 180, "maxSpeed": 180
        }));
        let (mut arena, head) = arena(1);
        init_all(&mut behavior, &mut arena, head);
        let p = arena.get_mut(head).unwrap();
        assert!((p.rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-6);

        behavior.update_particle(p, 0.5);
        assert!((p.rotation - std::f32::consts::PI).abs() < 1e-5);
    }

    #[test]
    fn deceleration_clamps_at_zero() {
        let mut behavior = rotation(json!({
            "minStart": 0, "maxStart": 0, "minSpeed": 90, "maxSpeed": 90, "accel": -90
        }));
        let (mut arena, head) = arena(1);
        init_all(&mut behavior, &mut arena, head);
        let p = arena.get_mut(head).unwrap();

        behavior.update_particle(p, 0.5);
        assert!((p.data.rotation_speed - 45.0 * DEG_TO_RADS).abs() < 1e-5);

        behavior.update_particle(p, 1.0);
        assert_eq!(p.data.rotation_speed, 0.0);
        let settled = p.rotation;

        behavior.update_particle(p, 1.0);
        assert_eq!(p.data.rotation_speed, 0.0);
        assert_eq!(p.rotation, settled);
    }

    #[test]
    fn negative_spin_also_clamps() {
        let mut behavior = rotation(json!({
            "minStart": 0, "maxStart": 0, "minSpeed": -10, "maxSpeed": -10, "accel": 100
        }));
        let (mut arena, head) = arena(1);
        init_all(&mut behavior, &mut arena, head);
        let p = arena.get_mut(head).unwrap();
        behavior.update_particle(p, 1.0);
        assert_eq!(p.data.rotation_speed, 0.0);
    }

    #[test]
    fn no_rotation_is_late_and_resets() {
        let mut behavior =
            with_context(|ctx| NoRotationBehavior::from_config(&json!({}), ctx)).unwrap();
        assert_eq!(behavior.order(), BehaviorOrder::Late);
        let (mut arena, head) = arena(2);
        arena.get_mut(head).unwrap().rotation = 3.0;
        init_all(&mut behavior, &mut arena, head);
        assert!(arena.iter().all(|p| p.rotation == 0.0));
    }

    #[test]
    fn static_rotation_adds_to_existing() {
        let mut behavior = with_context(|ctx| {
            StaticRotationBehavior::from_config(&json!({"min": 45, "max": 45}), ctx)
        })
        .unwrap();
        let (mut arena, head) = arena(1);
        arena.get_mut(head).unwrap().rotation = 1.0;
        init_all(&mut behavior, &mut arena, head);
        let p = arena.get(head).unwrap();
        assert!((p.rotation - (1.0 + 45.0 * DEG_TO_RADS)).abs() < 1e-6);
    }
}
