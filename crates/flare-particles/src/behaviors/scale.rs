use super::{config_error, parse_config, Behavior, BehaviorContext};
use crate::particle::{Particle, Wave};
use crate::property::{ListConfig, PropertyList};
use crate::rand::ParticleRng;
use flare_core::Result;
use serde::Deserialize;
use std::any::Any;

fn one() -> f32 {
    1.0
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScaleConfig {
    scale: ListConfig<f32>,
    #[serde(default = "one")]
    min_mult: f32,
}

/// Uniform scale over the lifetime, times a per-particle multiplier drawn
/// from `[min_mult, 1]`.
#[derive(Debug)]
pub struct ScaleBehavior {
    list: PropertyList<f32>,
    min_mult: f32,
}

impl ScaleBehavior {
    pub const TYPE: &'static str = "scale";

    pub fn from_config(config: &serde_json::Value, _ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: ScaleConfig = parse_config(Self::TYPE, config)?;
        let list = PropertyList::from_config(&config.scale).map_err(config_error(Self::TYPE))?;
        Ok(Self {
            list,
            min_mult: config.min_mult,
        })
    }
}

impl Behavior for ScaleBehavior {
    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        let first = self.list.first();
        while let Some(p) = wave.next_particle() {
            let mult = rng.next_f32() * (1.0 - self.min_mult) + self.min_mult;
            p.data.scale_multiplier = mult;
            p.scale_x = first * mult;
            p.scale_y = p.scale_x;
        }
    }

    fn update_particle(&mut self, particle: &mut Particle, _delta: f32) -> bool {
        let scale = self.list.interpolate(particle.age_percent) * particle.data.scale_multiplier;
        particle.scale_x = scale;
        particle.scale_y = scale;
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
struct StaticScaleConfig {
    min: f32,
    max: f32,
}

/// One random scale in `[min, max]` per particle.
#[derive(Debug)]
pub struct StaticScaleBehavior {
    min: f32,
    max: f32,
}

impl StaticScaleBehavior {
    pub const TYPE: &'static str = "scaleStatic";

    pub fn from_config(config: &serde_json::Value, _ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: StaticScaleConfig = parse_config(Self::TYPE, config)?;
        Ok(Self {
            min: config.min,
            max: config.max,
        })
    }
}

impl Behavior for StaticScaleBehavior {
    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        while let Some(p) = wave.next_particle() {
            let scale = rng.range(self.min, self.max);
            p.scale_x = scale;
            p.scale_y = scale;
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
    fn multiplier_scales_curve() {
        let mut behavior = with_context(|ctx| {
            ScaleBehavior::from_config(
                &json!({"scale": {"list": [{"value": 2, "time": 0}, {"value": 4, "time": 1}]}, "minMult": 0.5}),
                ctx,
            )
        })
        .unwrap();
        let (mut arena, head) = arena(20);
        init_all(&mut behavior, &mut arena, head);
        for p in arena.iter() {
            let mult = p.data.scale_multiplier;
            assert!((0.5..=1.0).contains(&mult));
            assert!((p.scale_x - 2.0 * mult).abs() < 1e-6);
            assert_eq!(p.scale_x, p.scale_y);
        }

        let p = arena.get_mut(head).unwrap();
        p.age_percent = 1.0;
        behavior.update_particle(p, 0.0);
        assert!((p.scale_y - 4.0 * p.data.scale_multiplier).abs() < 1e-5);
    }

    #[test]
    fn default_multiplier_is_one() {
        let mut behavior = with_context(|ctx| {
            ScaleBehavior::from_config(&json!({"scale": {"start": 1, "end": 3}}), ctx)
        })
        .unwrap();
        let (mut arena, head) = arena(3);
        init_all(&mut behavior, &mut arena, head);
        assert!(arena.iter().all(|p| p.data.scale_multiplier == 1.0));
    }

    #[test]
    fn static_scale_in_range() {
        let mut behavior = with_context(|ctx| {
            StaticScaleBehavior::from_config(&json!({"min": 0.2, "max": 0.6}), ctx)
        })
        .unwrap();
        let (mut arena, head) = arena(50);
        init_all(&mut behavior, &mut arena, head);
        assert!(arena.iter().all(|p| (0.2..0.6).contains(&p.scale_x)));
    }
}
