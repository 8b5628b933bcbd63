use super::{parse_shape_config, SpawnShape};
use crate::particle::Particle;
use crate::rand::ParticleRng;
use flare_core::Result;
use serde::{Deserialize, Serialize};

/// Axis-aligned spawn area. Width and height are floored to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rectangle {
    pub const TYPE: &'static str = "rect";

    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            x,
            y,
            w: w.max(1.0),
            h: h.max(1.0),
        }
    }

    pub fn from_config(data: &serde_json::Value) -> Result<Self> {
        let raw: Rectangle = parse_shape_config(Self::TYPE, data)?;
        Ok(Self::new(raw.x, raw.y, raw.w, raw.h))
    }
}

impl SpawnShape for Rectangle {
    fn get_rand_pos(&self, particle: &mut Particle, rng: &mut ParticleRng) {
        particle.x = rng.next_f32() * self.w + self.x;
        particle.y = rng.next_f32() * self.h + self.y;
    }
}
