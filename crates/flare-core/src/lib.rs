//! Flare Core - Foundational types for the Flare particle engine
//!
//! This crate provides the core types that all other Flare crates depend on:
//! - `EmitterId` - Unique emitter identifiers
//! - `Point`, `Rgb` - 2D spatial and color types
//! - Error types and Result alias

mod error;
mod id;
mod types;

pub use error::{FlareError, Result};
pub use id::EmitterId;
pub use types::{Point, Rgb, DEG_TO_RADS};
