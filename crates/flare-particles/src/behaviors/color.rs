use super::{config_error, parse_config, Behavior, BehaviorContext};
use crate::particle::{Particle, Wave};
use crate::property::{ListConfig, PropertyList};
use crate::rand::ParticleRng;
use flare_core::{Result, Rgb};
use serde::Deserialize;
use std::any::Any;

#[derive(Deserialize)]
struct ColorConfig {
    color: ListConfig<String>,
}

/// Tint over the particle's lifetime, from hex color stops.
#[derive(Debug)]
pub struct ColorBehavior {
    list: PropertyList<Rgb>,
}

impl ColorBehavior {
    pub const TYPE: &'static str = "color";

    pub fn from_config(config: &serde_json::Value, _ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: ColorConfig = parse_config(Self::TYPE, config)?;
        let list = PropertyList::from_config(&config.color).map_err(config_error(Self::TYPE))?;
        Ok(Self { list })
    }

    pub fn list(&self) -> &PropertyList<Rgb> {
        &self.list
    }
}

impl Behavior for ColorBehavior {
    fn init_particles(&mut self, wave: &mut Wave<'_>, _rng: &mut ParticleRng) {
        let tint = self.list.first().pack();
        while let Some(p) = wave.next_particle() {
            p.tint = tint;
        }
    }

    fn update_particle(&mut self, particle: &mut Particle, _delta: f32) -> bool {
        particle.tint = self.list.interpolate(particle.age_percent).pack();
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
struct StaticColorConfig {
    color: String,
}

/// Fixed tint set at spawn.
#[derive(Debug)]
pub struct StaticColorBehavior {
    value: u32,
}

impl StaticColorBehavior {
    pub const TYPE: &'static str = "colorStatic";

    pub fn from_config(config: &serde_json::Value, _ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: StaticColorConfig = parse_config(Self::TYPE, config)?;
        let color = Rgb::from_hex_str(&config.color).map_err(config_error(Self::TYPE))?;
        Ok(Self {
            value: color.pack(),
        })
    }
}

impl Behavior for StaticColorBehavior {
    fn init_particles(&mut self, wave: &mut Wave<'_>, _rng: &mut ParticleRng) {
        while let Some(p) = wave.next_particle() {
            p.tint = self.value;
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
    fn color_blends_channels() {
        let mut behavior = with_context(|ctx| {
            ColorBehavior::from_config(
                &json!({"color": {"list": [
                    {"value": "#ff0000", "time": 0},
                    {"value": "#0000ff", "time": 1}
                ]}}),
                ctx,
            )
        })
        .unwrap();
        let (mut arena, head) = arena(1);
        init_all(&mut behavior, &mut arena, head);
        let p = arena.get_mut(head).unwrap();
        assert_eq!(p.tint, 0xFF0000);

        p.age_percent = 0.5;
        behavior.update_particle(p, 0.0);
        assert_eq!(p.tint, 0x7F007F);
    }

    #[test]
    fn static_color_packs_once() {
        let mut behavior =
            with_context(|ctx| StaticColorBehavior::from_config(&json!({"color": "#40c0ff"}), ctx))
                .unwrap();
        let (mut arena, head) = arena(2);
        init_all(&mut behavior, &mut arena, head);
        assert!(arena.iter().all(|p| p.tint == 0x40C0FF));
    }

    #[test]
    fn bad_hex_is_config_error() {
        let err = with_context(|ctx| StaticColorBehavior::from_config(&json!({"color": "nope"}), ctx))
            .unwrap_err();
        assert!(matches!(err, flare_core::FlareError::BehaviorConfig { .. }));
    }
}
