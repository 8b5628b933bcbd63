use super::{parse_config, Behavior, BehaviorContext};
use crate::particle::Wave;
use crate::rand::ParticleRng;
use flare_core::Result;
use serde::Deserialize;
use std::any::Any;

#[derive(Deserialize)]
struct AnchorConfig {
    x: f32,
    y: f32,
}

/// Sets a fixed sprite anchor at spawn.
#[derive(Debug)]
pub struct AnchorStaticBehavior {
    x: f32,
    y: f32,
}

impl AnchorStaticBehavior {
    pub const TYPE: &'static str = "anchorStatic";

    pub fn from_config(config: &serde_json::Value, _ctx: &BehaviorContext<'_>) -> Result<Self> {
        let config: AnchorConfig = parse_config(Self::TYPE, config)?;
        Ok(Self {
            x: config.x,
            y: config.y,
        })
    }
}

impl Behavior for AnchorStaticBehavior {
    fn init_particles(&mut self, wave: &mut Wave<'_>, _rng: &mut ParticleRng) {
        while let Some(p) = wave.next_particle() {
            p.anchor_x = self.x;
            p.anchor_y = self.y;
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
    fn anchor_is_applied() {
        let mut behavior = with_context(|ctx| {
            AnchorStaticBehavior::from_config(&json!({"x": 0.0, "y": 1.0}), ctx)
        })
        .unwrap();
        let (mut arena, head) = arena(2);
        init_all(&mut behavior, &mut arena, head);
        assert!(arena.iter().all(|p| p.anchor_x == 0.0 && p.anchor_y == 1.0));
    }
}
