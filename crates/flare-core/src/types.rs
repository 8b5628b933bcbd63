//! Core 2D types used throughout Flare

use crate::error::{FlareError, Result};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Multiply degrees by this to get radians
pub const DEG_TO_RADS: f32 = std::f32::consts::PI / 180.0;

/// A 2D point or vector
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Scales the point to unit length. A zero vector yields NaN components.
    pub fn normalize(&mut self) {
        let one_over_len = 1.0 / self.length();
        self.x *= one_over_len;
        self.y *= one_over_len;
    }

    pub fn scale_by(&mut self, value: f32) {
        self.x *= value;
        self.y *= value;
    }

    /// Rotates the point around the origin by `angle` radians.
    pub fn rotate(&mut self, angle: f32) {
        if angle == 0.0 {
            return;
        }
        let (s, c) = angle.sin_cos();
        let x = self.x * c - self.y * s;
        let y = self.x * s + self.y * c;
        self.x = x;
        self.y = y;
    }

    pub fn rotated(mut self, angle: f32) -> Self {
        self.rotate(angle);
        self
    }
}

impl Add for Point {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Point {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<f32> for Point {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

/// RGB color with channels in the 0-255 range
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Self = Self {
        r: 255.0,
        g: 255.0,
        b: 255.0,
    };

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parses `#RRGGBB`, `RRGGBB`, `0xRRGGBB`, `#AARRGGBB` or `#RGB`.
    /// An alpha byte is accepted and dropped.
    pub fn from_hex_str(color: &str) -> Result<Self> {
        let trimmed = color.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if !digits.is_ascii() {
            return Err(FlareError::InvalidColor(color.to_string()));
        }

        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            8 => digits[2..].to_string(),
            _ => return Err(FlareError::InvalidColor(color.to_string())),
        };

        let value = u32::from_str_radix(&expanded, 16)
            .map_err(|_| FlareError::InvalidColor(color.to_string()))?;
        Ok(Self::from_packed(value))
    }

    pub fn from_packed(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as f32,
            g: ((hex >> 8) & 0xFF) as f32,
            b: (hex & 0xFF) as f32,
        }
    }

    /// Packs the channels into `0xRRGGBB`, truncating each to an integer.
    pub fn pack(&self) -> u32 {
        let channel = |v: f32| (v as i32).clamp(0, 255) as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    pub fn lerp(a: Self, b: Self, t: f32) -> Self {
        Self {
            r: (b.r - a.r) * t + a.r,
            g: (b.g - a.g) * t + a.g,
            b: (b.b - a.b) * t + a.b,
        }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_operations() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(3.0, 5.0);
        assert_eq!(a + b, Point::new(4.0, 7.0));
        assert_eq!(b - a, Point::new(2.0, 3.0));
        assert_eq!(a * 2.0, Point::new(2.0, 4.0));
    }

    #[test]
    fn test_point_rotate_quarter_turn() {
        let p = Point::new(10.0, 0.0).rotated(90.0 * DEG_TO_RADS);
        assert!(p.x.abs() < 1e-4);
        assert!((p.y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_point_normalize() {
        let mut p = Point::new(3.0, 4.0);
        p.normalize();
        assert!((p.length() - 1.0).abs() < 1e-6);
        assert!((p.x - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_hex_formats() {
        let expected = Rgb::new(255.0, 136.0, 68.0);
        assert_eq!(Rgb::from_hex_str("#ff8844").unwrap(), expected);
        assert_eq!(Rgb::from_hex_str("FF8844").unwrap(), expected);
        assert_eq!(Rgb::from_hex_str("0xff8844").unwrap(), expected);
        assert_eq!(Rgb::from_hex_str("#80ff8844").unwrap(), expected);
        assert_eq!(
            Rgb::from_hex_str("#f84").unwrap(),
            Rgb::new(255.0, 136.0, 68.0)
        );
        assert!(Rgb::from_hex_str("#ff88").is_err());
        assert!(Rgb::from_hex_str("zzzzzz").is_err());
    }

    #[test]
    fn test_pack_truncates() {
        assert_eq!(Rgb::new(255.0, 136.9, 68.2).pack(), 0xFF8844);
        assert_eq!(Rgb::WHITE.pack(), 0xFFFFFF);
    }

    #[test]
    fn test_lerp_midpoint() {
        let mid = Rgb::lerp(Rgb::new(0.0, 0.0, 0.0), Rgb::new(200.0, 100.0, 50.0), 0.5);
        assert_eq!(mid, Rgb::new(100.0, 50.0, 25.0));
    }
}
