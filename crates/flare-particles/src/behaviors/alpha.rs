use super::{config_error, parse_config, Behavior, BehaviorContext};
use crate::particle::{Particle, Wave};
use crate::property::{ListConfig, PropertyList};
use crate::rand::ParticleRng;
use flare_core::Result;
use serde::Deserialize;
use std::any::Any;

#[derive(Deserialize)]
struct AlphaConfig {
    alpha: ListConfig<f32>,
}

/// Alpha over the particle's lifetime.
#[derive(Debug)]
pub struct AlphaBehavior {
    list: PropertyList<f32>,
}

impl AlphaBehavior {
    pub const TYPE: &'static str = "alpha";

    pub fn from_config(config: &serde_json::Value, _ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: AlphaConfig = parse_config(Self::TYPE, config)?;
        let list = PropertyList::from_config(&config.alpha).map_err(config_error(Self::TYPE))?;
        Ok(Self { list })
    }

    pub fn list(&self) -> &PropertyList<f32> {
        &self.list
    }
}

impl Behavior for AlphaBehavior {
    fn init_particles(&mut self, wave: &mut Wave<'_>, _rng: &mut ParticleRng) {
        let first = self.list.first();
        while let Some(p) = wave.next_particle() {
            p.alpha = first;
        }
    }

    fn update_particle(&mut self, particle: &mut Particle, _delta: f32) -> bool {
        particle.alpha = self.list.interpolate(particle.age_percent);
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
struct StaticAlphaConfig {
    alpha: f32,
}

/// Fixed alpha set at spawn.
#[derive(Debug)]
pub struct StaticAlphaBehavior {
    value: f32,
}

impl StaticAlphaBehavior {
    pub const TYPE: &'static str = "alphaStatic";

    pub fn from_config(config: &serde_json::Value, _ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: StaticAlphaConfig = parse_config(Self::TYPE, config)?;
        Ok(Self {
            value: config.alpha,
        })
    }
}

impl Behavior for StaticAlphaBehavior {
    fn init_particles(&mut self, wave: &mut Wave<'_>, _rng: &mut ParticleRng) {
        while let Some(p) = wave.next_particle() {
            p.alpha = self.value;
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
    fn alpha_follows_list() {
        let mut behavior = with_context(|ctx| {
            AlphaBehavior::from_config(
                &json!({"alpha": {"list": [{"value": 1, "time": 0}, {"value": 0, "time": 1}]}}),
                ctx,
            )
        })
        .unwrap();
        let (mut arena, head) = arena(2);
        init_all(&mut behavior, &mut arena, head);
        assert!(arena.iter().all(|p| p.alpha == 1.0));

        let p = arena.get_mut(head).unwrap();
        p.age_percent = 0.25;
        assert!(!behavior.update_particle(p, 0.1));
        assert!((p.alpha - 0.75).abs() < 1e-6);
    }

    #[test]
    fn static_alpha() {
        let mut behavior =
            with_context(|ctx| StaticAlphaBehavior::from_config(&json!({"alpha": 0.4}), ctx))
                .unwrap();
        assert!(!behavior.has_update());
        let (mut arena, head) = arena(3);
        init_all(&mut behavior, &mut arena, head);
        assert!(arena.iter().all(|p| p.alpha == 0.4));
    }

    #[test]
    fn missing_field_is_config_error() {
        let err = with_context(|ctx| AlphaBehavior::from_config(&json!({}), ctx)).unwrap_err();
        assert!(matches!(err, flare_core::FlareError::BehaviorConfig { behavior, .. } if behavior == "alpha"));
    }
}
