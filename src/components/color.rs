//! RGBA colour used by shape and particle components.

use fastrand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// 8-bit-per-channel RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);
    pub const RED: Color = Color::new(255, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim_start_matches('#');
        let bad = || EngineError::InvalidColor(hex.to_string());
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| bad());
        if !digits.is_ascii() {
            return Err(bad());
        }
        match digits.len() {
            3 => {
                let mut out = [0u8; 3];
                for (i, c) in digits.chars().enumerate() {
                    let v = c.to_digit(16).ok_or_else(bad)? as u8;
                    out[i] = v * 17;
                }
                Ok(Self::new(out[0], out[1], out[2], 255))
            }
            6 => Ok(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
                255,
            )),
            8 => Ok(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
                channel(&digits[6..8])?,
            )),
            _ => Err(bad()),
        }
    }

    /// Per-channel linear interpolation; `t` is clamped to `[0, 1]`.
    pub fn lerp(a: Color, b: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
        Color::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b), mix(a.a, b.a))
    }

    /// Random opaque colour.
    pub fn random(rng: &mut Rng) -> Color {
        Color::new(rng.u8(..), rng.u8(..), rng.u8(..), 255)
    }

    /// Alpha as a `[0, 1]` fraction.
    pub fn alpha(&self) -> f32 {
        self.a as f32 / 255.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_short() {
        assert_eq!(Color::from_hex("#FFF").unwrap(), Color::WHITE);
        assert_eq!(Color::from_hex("#F00").unwrap(), Color::RED);
    }

    #[test]
    fn test_from_hex_long() {
        assert_eq!(
            Color::from_hex("102030").unwrap(),
            Color::new(0x10, 0x20, 0x30, 255)
        );
        assert_eq!(
            Color::from_hex("#10203040").unwrap(),
            Color::new(0x10, 0x20, 0x30, 0x40)
        );
    }

    #[test]
    fn test_from_hex_invalid() {
        assert!(Color::from_hex("#GG0000").is_err());
        assert!(Color::from_hex("#12").is_err());
    }

    #[test]
    fn test_lerp_endpoints_and_midpoint() {
        let a = Color::new(0, 0, 0, 0);
        let b = Color::new(200, 100, 50, 255);
        assert_eq!(Color::lerp(a, b, 0.0), a);
        assert_eq!(Color::lerp(a, b, 1.0), b);
        assert_eq!(Color::lerp(a, b, 0.5), Color::new(100, 50, 25, 128));
        assert_eq!(Color::lerp(a, b, 2.0), b);
    }

    #[test]
    fn test_alpha_fraction() {
        assert!((Color::WHITE.alpha() - 1.0).abs() < 1e-6);
        assert!(Color::TRANSPARENT.alpha().abs() < 1e-6);
    }
}
