//! Behavior registry: the extension point for custom behavior types

use crate::behaviors::{
    AccelerationBehavior, AlphaBehavior, AnchorStaticBehavior, Behavior, BehaviorContext,
    BehaviorFactory, BurstSpawnBehavior, ColorBehavior, NoRotationBehavior, OrderedTextureBehavior,
    PathBehavior, PointSpawnBehavior, RandomAnimatedTextureBehavior, RandomTextureBehavior,
    RotationBehavior, ScaleBehavior, ShapeSpawnBehavior, SingleAnimatedTextureBehavior,
    SingleTextureBehavior, SpeedBehavior, StaticAlphaBehavior, StaticColorBehavior,
    StaticRotationBehavior, StaticScaleBehavior, StaticSpeedBehavior,
};
use crate::shapes::{ShapeFactory, ShapeRegistry};
use crate::texture::TextureResolver;
use flare_core::Result;
use std::collections::HashMap;

/// Maps behavior type names to factories, plus the spawn shapes those
/// behaviors can use. Emitters hold a shared reference, so hosts register
/// custom types before building emitters.
#[derive(Clone, Default)]
pub struct BehaviorRegistry {
    factories: HashMap<String, BehaviorFactory>,
    shapes: ShapeRegistry,
}

macro_rules! register_builtin {
    ($registry:expr, $($behavior:ty),+ $(,)?) => {
        $(
            $registry.register(<$behavior>::TYPE, |config, ctx| {
                Ok(Box::new(<$behavior>::from_config(config, ctx)?))
            });
        )+
    };
}

impl BehaviorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in behavior and shape.
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
            shapes: ShapeRegistry::with_defaults(),
        };
        register_builtin!(
            registry,
            AlphaBehavior,
            StaticAlphaBehavior,
            ColorBehavior,
            StaticColorBehavior,
            ScaleBehavior,
            StaticScaleBehavior,
            RotationBehavior,
            StaticRotationBehavior,
            NoRotationBehavior,
            SpeedBehavior,
            StaticSpeedBehavior,
            AccelerationBehavior,
            PathBehavior,
            SingleTextureBehavior,
            RandomTextureBehavior,
            OrderedTextureBehavior,
            SingleAnimatedTextureBehavior,
            RandomAnimatedTextureBehavior,
            PointSpawnBehavior,
            ShapeSpawnBehavior,
            BurstSpawnBehavior,
            AnchorStaticBehavior,
        );
        registry
    }

    /// Registers a behavior type. A later registration under the same
    /// name replaces the earlier one.
    pub fn register(&mut self, name: impl Into<String>, factory: BehaviorFactory) {
        let name = name.into();
        if self.factories.insert(name.clone(), factory).is_some() {
            log::debug!("Behavior '{}' re-registered", name);
        }
    }

    pub fn register_shape(&mut self, name: impl Into<String>, factory: ShapeFactory) {
        self.shapes.register(name, factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered behavior names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn shapes(&self) -> &ShapeRegistry {
        &self.shapes
    }

    /// Builds a behavior. Returns `Ok(None)` for an unregistered name.
    pub fn create(
        &self,
        name: &str,
        config: &serde_json::Value,
        textures: &dyn TextureResolver,
    ) -> Result<Option<Box<dyn Behavior>>> {
        let Some(factory) = self.factories.get(name) else {
            return Ok(None);
        };
        let ctx = BehaviorContext {
            textures,
            shapes: &self.shapes,
        };
        factory(config, &ctx).map(Some)
    }
}

impl std::fmt::Debug for BehaviorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorRegistry")
            .field("behaviors", &self.names())
            .field("shapes", &self.shapes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Wave;
    use crate::rand::ParticleRng;
    use crate::texture::TextureAtlas;
    use serde_json::json;
    use std::any::Any;

    struct Marker;

    impl Behavior for Marker {
        fn init_particles(&mut self, _wave: &mut Wave<'_>, _rng: &mut ParticleRng) {}

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn defaults_cover_builtins() {
        let registry = BehaviorRegistry::with_defaults();
        for name in [
            "alpha",
            "alphaStatic",
            "color",
            "colorStatic",
            "scale",
            "scaleStatic",
            "rotation",
            "rotationStatic",
            "noRotation",
            "moveSpeed",
            "moveSpeedStatic",
            "moveAcceleration",
            "movePath",
            "textureSingle",
            "textureRandom",
            "textureOrdered",
            "animatedSingle",
            "animatedRandom",
            "spawnPoint",
            "spawnShape",
            "spawnBurst",
            "anchorStatic",
        ] {
            assert!(registry.contains(name), "missing {name}");
        }
        assert_eq!(registry.names().len(), 22);
        assert!(registry.shapes().contains("torus"));
    }

    #[test]
    fn new_registry_is_empty() {
        let registry = BehaviorRegistry::new();
        assert!(registry.names().is_empty());
        assert!(registry.shapes().names().is_empty());
    }

    #[test]
    fn later_registration_wins() {
        let mut registry = BehaviorRegistry::with_defaults();
        registry.register("alpha", |_, _| Ok(Box::new(Marker)));
        let atlas = TextureAtlas::new();
        let built = registry.create("alpha", &json!(null), &atlas).unwrap().unwrap();
        assert!(built.as_any().is::<Marker>());
    }

    #[test]
    fn unknown_name_is_none() {
        let registry = BehaviorRegistry::with_defaults();
        let atlas = TextureAtlas::new();
        assert!(registry.create("sparkle", &json!({}), &atlas).unwrap().is_none());
    }
}
