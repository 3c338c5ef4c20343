//! Color pipeline: sRGB encoding and the linear premultiplied space.
//!
//! The pixel buffer, gradients, patterns, and the compositor all work in
//! linear-light premultiplied RGBA. sRGB enters and leaves the library
//! only at the API boundary (color setters, image data, shadow color).

use std::sync::OnceLock;

/// Forward table: 8-bit sRGB value to linear light.
static SRGB_TO_LINEAR: OnceLock<[f32; 256]> = OnceLock::new();

fn forward_table() -> &'static [f32; 256] {
    SRGB_TO_LINEAR.get_or_init(|| {
        let mut table = [0.0f32; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = srgb_to_linear(i as f32 / 255.0);
        }
        table
    })
}

/// Decode one 8-bit sRGB component to linear light via the forward table.
pub(crate) fn srgb_byte_to_linear(value: u8) -> f32 {
    forward_table()[value as usize]
}

/// Decode an sRGB component (nominally in [0, 1]) to linear light.
pub(crate) fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

/// Encode a linear-light component (in [0, 1]) back to sRGB.
pub(crate) fn linear_to_srgb(value: f32) -> f32 {
    if value <= 0.003_130_8 {
        value * 12.92
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

/// Encode a linear-light component to an 8-bit sRGB value with rounding.
pub(crate) fn linear_to_srgb_byte(value: f32) -> u8 {
    (linear_to_srgb(value.clamp(0.0, 1.0)) * 255.0 + 0.5) as u8
}

/// A linear-light premultiplied RGBA color, the compositor's native space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct PremulColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl PremulColor {
    pub const TRANSPARENT: PremulColor = PremulColor {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    /// Build from non-premultiplied sRGB float components.
    ///
    /// Components are accepted outside [0, 1] and clamped per channel
    /// after premultiplication.
    pub fn from_srgb(r: f32, g: f32, b: f32, a: f32) -> Self {
        PremulColor {
            r: (srgb_to_linear(r) * a).clamp(0.0, 1.0),
            g: (srgb_to_linear(g) * a).clamp(0.0, 1.0),
            b: (srgb_to_linear(b) * a).clamp(0.0, 1.0),
            a: a.clamp(0.0, 1.0),
        }
    }

    /// Build from an 8-bit non-premultiplied sRGB pixel via the forward table.
    pub fn from_srgb_bytes(r: u8, g: u8, b: u8, a: u8) -> Self {
        let alpha = a as f32 / 255.0;
        PremulColor {
            r: srgb_byte_to_linear(r) * alpha,
            g: srgb_byte_to_linear(g) * alpha,
            b: srgb_byte_to_linear(b) * alpha,
            a: alpha,
        }
    }

    /// Unpremultiply and encode back to 8-bit sRGB.
    pub fn to_srgb_bytes(self) -> [u8; 4] {
        if self.a <= 0.0 {
            return [0, 0, 0, 0];
        }
        let inv = 1.0 / self.a;
        [
            linear_to_srgb_byte(self.r * inv),
            linear_to_srgb_byte(self.g * inv),
            linear_to_srgb_byte(self.b * inv),
            (self.a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        ]
    }

    pub fn scale(self, s: f32) -> Self {
        PremulColor {
            r: self.r * s,
            g: self.g * s,
            b: self.b * s,
            a: self.a * s,
        }
    }

    pub fn add(self, other: Self) -> Self {
        PremulColor {
            r: self.r + other.r,
            g: self.g + other.g,
            b: self.b + other.b,
            a: self.a + other.a,
        }
    }

    pub fn clamp(self) -> Self {
        PremulColor {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
            a: self.a.clamp(0.0, 1.0),
        }
    }

    /// Linear interpolation: self at t=0, `other` at t=1.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self.scale(1.0 - t).add(other.scale(t))
    }
}
