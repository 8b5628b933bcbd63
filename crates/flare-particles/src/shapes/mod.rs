//! Spawn shapes: geometry that places a particle at a random position
//!
//! Built-in shapes:
//! - `rect` - uniform point inside a rectangle
//! - `torus` - uniform radius and angle inside a ring
//! - `polygonalChain` - uniform point along connected line segments
//!
//! Hosts can add more through `ShapeRegistry::register`.

mod polygonal_chain;
mod rect;
mod torus;

pub use polygonal_chain::{ChainData, PolygonalChain, Segment};
pub use rect::Rectangle;
pub use torus::Torus;

use crate::particle::Particle;
use crate::rand::ParticleRng;
use flare_core::{FlareError, Result};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Geometry that writes a random position (and possibly rotation) into a
/// particle.
pub trait SpawnShape {
    fn get_rand_pos(&self, particle: &mut Particle, rng: &mut ParticleRng);
}

/// Builds a shape from its `data` config.
pub type ShapeFactory = fn(&serde_json::Value) -> Result<Box<dyn SpawnShape>>;

/// Name to constructor map for spawn shapes. Later registrations replace
/// earlier ones with the same name.
#[derive(Clone, Default)]
pub struct ShapeRegistry {
    factories: HashMap<String, ShapeFactory>,
}

impl ShapeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `rect`, `torus` and `polygonalChain`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Rectangle::TYPE, |data| Ok(Box::new(Rectangle::from_config(data)?)));
        registry.register(Torus::TYPE, |data| Ok(Box::new(Torus::from_config(data)?)));
        registry.register(PolygonalChain::TYPE, |data| {
            Ok(Box::new(PolygonalChain::from_config(data)?))
        });
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, factory: ShapeFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered shape names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn create(&self, name: &str, data: &serde_json::Value) -> Result<Box<dyn SpawnShape>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| FlareError::UnknownShape(name.to_string()))?;
        factory(data)
    }
}

impl std::fmt::Debug for ShapeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeRegistry")
            .field("shapes", &self.names())
            .finish()
    }
}

/// Deserializes a shape's typed config, tagging failures with the shape name.
pub(crate) fn parse_shape_config<T: DeserializeOwned>(
    shape: &str,
    data: &serde_json::Value,
) -> Result<T> {
    serde_json::from_value(data.clone()).map_err(|e| FlareError::ShapeConfig {
        shape: shape.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_registered() {
        let registry = ShapeRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["polygonalChain", "rect", "torus"]);
    }

    #[test]
    fn unknown_shape_is_error() {
        let registry = ShapeRegistry::with_defaults();
        assert!(matches!(
            registry.create("hexagon", &json!({})),
            Err(FlareError::UnknownShape(name)) if name == "hexagon"
        ));
    }

    #[test]
    fn bad_shape_data_is_error() {
        let registry = ShapeRegistry::with_defaults();
        assert!(matches!(
            registry.create("torus", &json!({"radius": "big"})),
            Err(FlareError::ShapeConfig { .. })
        ));
    }
}
