//! Emitter configuration (JSON or TOML)

use crate::ease::EaseConfig;
use flare_core::{FlareError, Point, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Per-particle lifetime range, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifetimeRange {
    pub min: f32,
    pub max: f32,
}

/// One `{type, config}` behavior entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorEntry {
    #[serde(rename = "type")]
    pub behavior_type: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

impl BehaviorEntry {
    pub fn new(behavior_type: impl Into<String>, config: serde_json::Value) -> Self {
        Self {
            behavior_type: behavior_type.into(),
            config,
        }
    }
}

/// Declarative emitter setup. Optional fields left unset fall back to the
/// emitter defaults when applied by `Emitter::init`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitterConfig {
    pub lifetime: LifetimeRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ease: Option<EaseConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub particles_per_wave: Option<u32>,
    pub frequency: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn_chance: Option<f32>,
    /// Seconds to keep emitting; unset, zero or negative means forever
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emitter_lifetime: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_particles: Option<usize>,
    #[serde(default)]
    pub add_at_back: bool,
    #[serde(default)]
    pub pos: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emit: Option<bool>,
    #[serde(default)]
    pub auto_update: bool,
    #[serde(default)]
    pub behaviors: Vec<BehaviorEntry>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            lifetime: LifetimeRange { min: 1.0, max: 1.0 },
            ease: None,
            particles_per_wave: None,
            frequency: 1.0,
            spawn_chance: None,
            emitter_lifetime: None,
            max_particles: None,
            add_at_back: false,
            pos: Point::ZERO,
            emit: None,
            auto_update: false,
            behaviors: Vec::new(),
        }
    }
}

impl EmitterConfig {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config file, picking the format from its extension
    /// (`.json` or `.toml`).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        let content = fs::read_to_string(path)?;
        match extension.as_str() {
            "json" => Self::from_json_str(&content),
            "toml" => Self::from_toml_str(&content),
            _ => Err(FlareError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Behavior type names in config order.
    pub fn behavior_types(&self) -> Vec<&str> {
        self.behaviors
            .iter()
            .map(|b| b.behavior_type.as_str())
            .collect()
    }

    /// Every texture name referenced by a built-in texture behavior.
    pub fn texture_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for entry in &self.behaviors {
            collect_texture_names(&entry.behavior_type, &entry.config, &mut names);
        }
        names.dedup();
        names
    }
}

fn collect_texture_names(behavior: &str, config: &serde_json::Value, out: &mut Vec<String>) {
    let push_str = |value: &serde_json::Value, out: &mut Vec<String>| match value {
        serde_json::Value::String(name) => out.push(name.clone()),
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(name)) = map.get("texture") {
                out.push(name.clone());
            }
        }
        _ => {}
    };
    let push_list = |value: Option<&serde_json::Value>, out: &mut Vec<String>| match value {
        Some(serde_json::Value::Array(items)) => items.iter().for_each(|v| push_str(v, out)),
        Some(other) => push_str(other, out),
        None => {}
    };
    match behavior {
        "textureSingle" => push_list(config.get("texture"), out),
        "textureRandom" | "textureOrdered" => push_list(config.get("textures"), out),
        "animatedSingle" => {
            push_list(config.get("anim").and_then(|a| a.get("textures")), out);
        }
        "animatedRandom" => {
            if let Some(serde_json::Value::Array(anims)) = config.get("anims") {
                for anim in anims {
                    push_list(anim.get("textures"), out);
                }
            }
        }
        _ => {}
    }
}
