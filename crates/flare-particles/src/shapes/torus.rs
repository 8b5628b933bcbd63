use super::{parse_shape_config, SpawnShape};
use crate::particle::Particle;
use crate::rand::ParticleRng;
use flare_core::{Point, Result};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Ring between `inner_radius` and `radius` around `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Torus {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    pub radius: f32,
    #[serde(default)]
    pub inner_radius: f32,
    /// Adds the spawn angle to the particle's rotation
    #[serde(default)]
    pub affect_rotation: bool,
}

impl Torus {
    pub const TYPE: &'static str = "torus";

    pub fn from_config(data: &serde_json::Value) -> Result<Self> {
        parse_shape_config(Self::TYPE, data)
    }
}

impl SpawnShape for Torus {
    fn get_rand_pos(&self, particle: &mut Particle, rng: &mut ParticleRng) {
        let radius = if self.inner_radius != self.radius {
            rng.range(self.inner_radius, self.radius)
        } else {
            self.radius
        };
        let angle = rng.next_f32() * TAU;
        if self.affect_rotation {
            particle.rotation += angle;
        }
        let p = Point::new(radius, 0.0).rotated(angle);
        particle.x = p.x + self.x;
        particle.y = p.y + self.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticleArena;
    use serde_json::json;

    #[test]
    fn equal_radii_give_exact_distance() {
        let torus = Torus::from_config(&json!({"x": 10, "y": 20, "radius": 50, "innerRadius": 50}))
            .unwrap();
        let mut arena = ParticleArena::new();
        arena.fill_pool(1, None);
        let id = arena.take(None);
        let p = arena.get_mut(id).unwrap();
        let mut rng = ParticleRng::new(5);
        for _ in 0..200 {
            torus.get_rand_pos(p, &mut rng);
            let d = Point::new(p.x - 10.0, p.y - 20.0).length();
            assert!((d - 50.0).abs() < 1e-3, "distance {d}");
        }
        assert_eq!(p.rotation, 0.0);
    }

    #[test]
    fn ring_bounds_and_rotation() {
        let torus =
            Torus::from_config(&json!({"radius": 30, "innerRadius": 10, "affectRotation": true}))
                .unwrap();
        let mut arena = ParticleArena::new();
        arena.fill_pool(1, None);
        let id = arena.take(None);
        let p = arena.get_mut(id).unwrap();
        let mut rng = ParticleRng::new(9);
        for _ in 0..200 {
            p.rotation = 0.0;
            torus.get_rand_pos(p, &mut rng);
            let d = p.position().length();
            assert!((10.0 - 1e-3..=30.0 + 1e-3).contains(&d));
            let facing = Point::new(p.rotation.cos(), p.rotation.sin()) * d;
            assert!((facing - p.position()).length() < 1e-2);
        }
    }
}
