//! Movement behaviors: speed curves, acceleration and path following

use super::path_expr::PathExpression;
use super::{config_error, parse_config, Behavior, BehaviorContext};
use crate::particle::{Particle, Wave};
use crate::property::{ListConfig, PropertyList};
use crate::rand::ParticleRng;
use flare_core::{Point, Result};
use serde::Deserialize;
use std::any::Any;

fn one() -> f32 {
    1.0
}

fn random_multiplier(rng: &mut ParticleRng, min_mult: f32) -> f32 {
    rng.next_f32() * (1.0 - min_mult) + min_mult
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpeedConfig {
    speed: ListConfig<f32>,
    #[serde(default = "one")]
    min_mult: f32,
}

/// Moves particles along their spawn rotation at a speed that follows a
/// value list.
#[derive(Debug)]
pub struct SpeedBehavior {
    list: PropertyList<f32>,
    min_mult: f32,
}

impl SpeedBehavior {
    pub const TYPE: &'static str = "moveSpeed";

    pub fn from_config(config: &serde_json::Value, _ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: SpeedConfig = parse_config(Self::TYPE, config)?;
        let list = PropertyList::from_config(&config.speed).map_err(config_error(Self::TYPE))?;
        Ok(Self {
            list,
            min_mult: config.min_mult,
        })
    }
}

impl Behavior for SpeedBehavior {
    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        let first = self.list.first();
        while let Some(p) = wave.next_particle() {
            let mult = random_multiplier(rng, self.min_mult);
            p.data.speed_multiplier = mult;
            p.data.velocity = Point::new(first * mult, 0.0).rotated(p.rotation);
        }
    }

    fn update_particle(&mut self, particle: &mut Particle, delta: f32) -> bool {
        let speed = self.list.interpolate(particle.age_percent) * particle.data.speed_multiplier;
        let vel = &mut particle.data.velocity;
        if vel.length() == 0.0 {
            // a stopped particle keeps heading along its rotation
            *vel = Point::new(1.0, 0.0).rotated(particle.rotation);
        } else {
            vel.normalize();
        }
        vel.scale_by(speed);
        particle.x += vel.x * delta;
        particle.y += vel.y * delta;
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
struct StaticSpeedConfig {
    min: f32,
    max: f32,
}

/// Constant random speed along the spawn rotation.
#[derive(Debug)]
pub struct StaticSpeedBehavior {
    min: f32,
    max: f32,
}

impl StaticSpeedBehavior {
    pub const TYPE: &'static str = "moveSpeedStatic";

    pub fn from_config(config: &serde_json::Value, _ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: StaticSpeedConfig = parse_config(Self::TYPE, config)?;
        Ok(Self {
            min: config.min,
            max: config.max,
        })
    }
}

impl Behavior for StaticSpeedBehavior {
    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        while let Some(p) = wave.next_particle() {
            let speed = rng.range(self.min, self.max);
            p.data.velocity = Point::new(speed, 0.0).rotated(p.rotation);
        }
    }

    fn update_particle(&mut self, particle: &mut Particle, delta: f32) -> bool {
        let vel = particle.data.velocity;
        particle.x += vel.x * delta;
        particle.y += vel.y * delta;
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
#[serde(rename_all = "camelCase")]
struct AccelerationConfig {
    accel: Point,
    min_start: f32,
    max_start: f32,
    #[serde(default)]
    rotate: bool,
    #[serde(default)]
    max_speed: f32,
}

/// Constant acceleration from a random start speed, optionally capped and
/// optionally turning particles to face their velocity.
#[derive(Debug)]
pub struct AccelerationBehavior {
    accel: Point,
    min_start: f32,
    max_start: f32,
    rotate: bool,
    max_speed: f32,
}

impl AccelerationBehavior {
    pub const TYPE: &'static str = "moveAcceleration";

    pub fn from_config(config: &serde_json::Value, _ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: AccelerationConfig = parse_config(Self::TYPE, config)?;
        Ok(Self {
            accel: config.accel,
            min_start: config.min_start,
            max_start: config.max_start,
            rotate: config.rotate,
            max_speed: config.max_speed,
        })
    }
}

impl Behavior for AccelerationBehavior {
    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        while let Some(p) = wave.next_particle() {
            let speed = rng.range(self.min_start, self.max_start);
            p.data.velocity = Point::new(speed, 0.0).rotated(p.rotation);
        }
    }

    fn update_particle(&mut self, particle: &mut Particle, delta: f32) -> bool {
        let old = particle.data.velocity;
        let mut vel = old + self.accel * delta;
        if self.max_speed > 0.0 {
            let speed = vel.length();
            if speed > self.max_speed {
                vel.scale_by(self.max_speed / speed);
            }
        }
        particle.data.velocity = vel;
        particle.x += (old.x + vel.x) / 2.0 * delta;
        particle.y += (old.y + vel.y) / 2.0 * delta;
        if self.rotate {
            particle.rotation = vel.y.atan2(vel.x);
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

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PathConfig {
    path: String,
    speed: ListConfig<f32>,
    #[serde(default = "one")]
    min_mult: f32,
}

/// Moves particles along `y = f(x)`, where `x` is the distance travelled,
/// rotated by the spawn rotation and anchored at the spawn point.
#[derive(Debug)]
pub struct PathBehavior {
    path: PathExpression,
    list: PropertyList<f32>,
    min_mult: f32,
}

impl PathBehavior {
    pub const TYPE: &'static str = "movePath";

    pub fn from_config(config: &serde_json::Value, _ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: PathConfig = parse_config(Self::TYPE, config)?;
        Ok(Self {
            path: PathExpression::parse(&config.path)?,
            list: PropertyList::from_config(&config.speed).map_err(config_error(Self::TYPE))?,
            min_mult: config.min_mult,
        })
    }

    pub fn path(&self) -> &PathExpression {
        &self.path
    }
}

impl Behavior for PathBehavior {
    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        while let Some(p) = wave.next_particle() {
            p.data.path_rotation = p.rotation;
            p.data.path_origin = p.position();
            p.data.path_movement = 0.0;
            p.data.speed_multiplier = random_multiplier(rng, self.min_mult);
        }
    }

    fn update_particle(&mut self, particle: &mut Particle, delta: f32) -> bool {
        let speed = self.list.interpolate(particle.age_percent) * particle.data.speed_multiplier;
        let data = &mut particle.data;
        data.path_movement += speed * delta;
        let local = Point::new(data.path_movement, self.path.eval(data.path_movement));
        let world = local.rotated(data.path_rotation) + data.path_origin;
        particle.set_position(world);
        false
    }

    fn has_update(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::test_support::{arena, init_all, with_context};
    use flare_core::{FlareError, DEG_TO_RADS};
    use serde_json::json;

    #[test]
    fn speed_moves_along_rotation() {
        let mut behavior = with_context(|ctx| {
            SpeedBehavior::from_config(
                &json!({"speed": {"list": [{"value": 100, "time": 0}, {"value": 0, "time": 1}]}}),
                ctx,
            )
        })
        .unwrap();
        let (mut arena, head) = arena(1);
        arena.get_mut(head).unwrap().rotation = 90.0 * DEG_TO_RADS;
        init_all(&mut behavior, &mut arena, head);
        let p = arena.get_mut(head).unwrap();
        assert!(p.data.velocity.x.abs() < 1e-4);
        assert!((p.data.velocity.y - 100.0).abs() < 1e-4);

        p.age_percent = 0.5;
        behavior.update_particle(p, 0.1);
        assert!((p.y - 5.0).abs() < 1e-4);
        assert!(p.x.abs() < 1e-4);
    }

    #[test]
    fn speed_from_zero_keeps_heading() {
        let mut behavior = with_context(|ctx| {
            SpeedBehavior::from_config(&json!({"speed": {"start": 0, "end": 10}}), ctx)
        })
        .unwrap();
        let (mut arena, head) = arena(1);
        init_all(&mut behavior, &mut arena, head);
        let p = arena.get_mut(head).unwrap();
        p.age_percent = 1.0;
        behavior.update_particle(p, 1.0);
        assert!((p.x - 10.0).abs() < 1e-5);
        assert!(p.y.is_finite());
    }

    #[test]
    fn static_speed_is_linear() {
        let mut behavior = with_context(|ctx| {
            StaticSpeedBehavior::from_config(&json!({"min": 20, "max": 20}), ctx)
        })
        .unwrap();
        let (mut arena, head) = arena(1);
        init_all(&mut behavior, &mut arena, head);
        let p = arena.get_mut(head).unwrap();
        for _ in 0..4 {
            behavior.update_particle(p, 0.25);
        }
        assert!((p.x - 20.0).abs() < 1e-4);
    }

    #[test]
    fn acceleration_caps_speed_and_faces_velocity() {
        let mut behavior = with_context(|ctx| {
            AccelerationBehavior::from_config(
                &json!({
                    "accel": {"x": 0, "y": 100},
                    "minStart": 0, "maxStart": 0,
                    "rotate": true, "maxSpeed": 50
                }),
                ctx,
            )
        })
        .unwrap();
        let (mut arena, head) = arena(1);
        init_all(&mut behavior, &mut arena, head);
        let p = arena.get_mut(head).unwrap();

        behavior.update_particle(p, 0.25);
        // average of 0 and 25 over a quarter second
        assert!((p.y - 3.125).abs() < 1e-4);
        assert!((p.rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-5);

        behavior.update_particle(p, 1.0);
        assert!((p.data.velocity.length() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn path_follows_expression() {
        let mut behavior = with_context(|ctx| {
            PathBehavior::from_config(
                &json!({"path": "x * 2", "speed": {"start": 10, "end": 10}}),
                ctx,
            )
        })
        .unwrap();
        let (mut arena, head) = arena(1);
        {
            let p = arena.get_mut(head).unwrap();
            p.x = 5.0;
            p.y = 5.0;
        }
        init_all(&mut behavior, &mut arena, head);
        let p = arena.get_mut(head).unwrap();
        behavior.update_particle(p, 1.0);
        assert!((p.x - 15.0).abs() < 1e-4);
        assert!((p.y - 25.0).abs() < 1e-4);
    }

    #[test]
    fn bad_path_is_error() {
        let err = with_context(|ctx| {
            PathBehavior::from_config(&json!({"path": "x +", "speed": {"start": 1, "end": 1}}), ctx)
        })
        .unwrap_err();
        assert!(matches!(err, FlareError::PathExpression(_)));
    }
}
