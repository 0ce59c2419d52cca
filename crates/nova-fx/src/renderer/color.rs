use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::core::math::unit;

/// Straight-alpha RGBA color (components nominally in [0, 1]).
///
/// Deserializes from `{"r":..,"g":..,"b":..}` with `a` defaulting to 1.0,
/// so trigger payloads may omit alpha.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct FxColor {
    #[serde(default)]
    pub r: f32,
    #[serde(default)]
    pub g: f32,
    #[serde(default)]
    pub b: f32,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl FxColor {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Opaque color from a 0xRRGGBB literal.
    pub fn hex(rgb: u32) -> Self {
        Self::rgb(
            ((rgb >> 16) & 0xFF) as f32 / 255.0,
            ((rgb >> 8) & 0xFF) as f32 / 255.0,
            (rgb & 0xFF) as f32 / 255.0,
        )
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Multiply alpha by `factor`, clamping the result to [0, 1].
    /// A non-finite factor yields a fully transparent color.
    pub fn fade(self, factor: f32) -> Self {
        Self { a: unit(self.a * factor), ..self }
    }

    /// Component-wise blend towards `other`.
    pub fn mix(self, other: Self, t: f32) -> Self {
        let t = unit(t);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// True when this color would paint nothing.
    pub fn is_invisible(&self) -> bool {
        !(self.a.is_finite() && self.a > 0.0)
    }

    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    // Palette shared by the effect families
    pub const EMBER: Self = Self::rgb(1.0, 0.55, 0.1);
    pub const FLAME_CORE: Self = Self::rgb(1.0, 0.92, 0.55);
    pub const SMOKE: Self = Self::rgb(0.35, 0.33, 0.32);
    pub const VOID_PURPLE: Self = Self::rgb(0.55, 0.2, 0.95);
    pub const VOID_CORE: Self = Self::rgb(0.08, 0.0, 0.14);
    pub const ACID_GREEN: Self = Self::rgb(0.45, 0.95, 0.2);
    pub const PLASMA_BLUE: Self = Self::rgb(0.35, 0.7, 1.0);
    pub const SHIELD_CYAN: Self = Self::rgb(0.5, 0.9, 1.0);
    pub const RUST: Self = Self::rgb(0.6, 0.4, 0.25);
}

impl Default for FxColor {
    fn default() -> Self {
        Self::WHITE
    }
}
