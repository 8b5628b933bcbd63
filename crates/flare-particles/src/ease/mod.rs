//! Easing functions mapping progress in [0, 1] to eased progress
//!
//! Two configurable generators are provided:
//! - `SegmentEase` - evenly spaced quadratic segments
//! - `PathEase` - sampled from an SVG path or cubic bezier coordinates
//!
//! Hosts can also supply any closure through `Ease::custom`.

mod path;
mod segment;
mod svg;

pub use path::PathEase;
pub use segment::{EaseSegment, SegmentEase};

use flare_core::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Serialized form of an ease: path data or a segment list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EaseConfig {
    Path(String),
    Segments(Vec<EaseSegment>),
}

/// A built easing function.
#[derive(Clone)]
pub enum Ease {
    Segments(SegmentEase),
    Path(Rc<PathEase>),
    Custom(Rc<dyn Fn(f32) -> f32>),
}

impl Ease {
    pub fn from_config(config: &EaseConfig) -> Result<Self> {
        Ok(match config {
            EaseConfig::Path(data) => Ease::Path(Rc::new(PathEase::new(data)?)),
            EaseConfig::Segments(segments) => Ease::Segments(SegmentEase::new(segments.clone())),
        })
    }

    pub fn custom(f: impl Fn(f32) -> f32 + 'static) -> Self {
        Ease::Custom(Rc::new(f))
    }

    pub fn apply(&self, t: f32) -> f32 {
        match self {
            Ease::Segments(ease) => ease.sample(t),
            Ease::Path(ease) => ease.sample(t),
            Ease::Custom(f) => f(t),
        }
    }
}

impl fmt::Debug for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ease::Segments(ease) => f.debug_tuple("Segments").field(ease).finish(),
            Ease::Path(_) => f.write_str("Path(..)"),
            Ease::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
