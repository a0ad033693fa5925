//! Transforms applied to display nodes.

use serde::{Deserialize, Serialize};

/// 2D affine matrix `[a, b, c, d, tx, ty]` with translation in twips.
pub type Matrix = kurbo::Affine;

/// Per-channel color multipliers and offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorTransform {
    /// Red multiplier.
    pub red_multiplier: f32,
    /// Green multiplier.
    pub green_multiplier: f32,
    /// Blue multiplier.
    pub blue_multiplier: f32,
    /// Alpha multiplier.
    pub alpha_multiplier: f32,
    /// Red offset, -255..=255.
    pub red_offset: i32,
    /// Green offset, -255..=255.
    pub green_offset: i32,
    /// Blue offset, -255..=255.
    pub blue_offset: i32,
    /// Alpha offset, -255..=255.
    pub alpha_offset: i32,
}

impl ColorTransform {
    /// The transform that leaves colors unchanged.
    pub const IDENTITY: Self = Self {
        red_multiplier: 1.0,
        green_multiplier: 1.0,
        blue_multiplier: 1.0,
        alpha_multiplier: 1.0,
        red_offset: 0,
        green_offset: 0,
        blue_offset: 0,
        alpha_offset: 0,
    };

    /// Identity except for the alpha multiplier.
    #[must_use]
    pub const fn from_alpha(alpha_multiplier: f32) -> Self {
        Self {
            alpha_multiplier,
            ..Self::IDENTITY
        }
    }

    /// Whether all offsets are zero.
    #[must_use]
    pub const fn has_identity_offsets(&self) -> bool {
        self.red_offset == 0 && self.green_offset == 0 && self.blue_offset == 0 && self.alpha_offset == 0
    }

    /// Whether the red, green and blue multipliers are all one.
    #[must_use]
    #[allow(clippy::float_cmp)] // Exact identity is what the encoding distinguishes
    pub fn has_identity_color_multipliers(&self) -> bool {
        self.red_multiplier == 1.0 && self.green_multiplier == 1.0 && self.blue_multiplier == 1.0
    }

    /// Whether the transform leaves colors unchanged.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_identity(&self) -> bool {
        self.has_identity_offsets() && self.has_identity_color_multipliers() && self.alpha_multiplier == 1.0
    }

    /// Apply the transform to a packed `0xRRGGBBAA` color.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Channels are clamped to 0..=255
    pub fn apply(&self, rgba: u32) -> u32 {
        let channel = |shift: u32, multiplier: f32, offset: i32| -> u32 {
            let value = ((rgba >> shift) & 0xff) as f32;
            let value = (value * multiplier) as i32 + offset;
            (value.clamp(0, 255) as u32) << shift
        };
        channel(24, self.red_multiplier, self.red_offset)
            | channel(16, self.green_multiplier, self.green_offset)
            | channel(8, self.blue_multiplier, self.blue_offset)
            | channel(0, self.alpha_multiplier, self.alpha_offset)
    }
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_checks() {
        assert!(ColorTransform::IDENTITY.is_identity());
        assert!(ColorTransform::default().is_identity());

        let faded = ColorTransform::from_alpha(0.5);
        assert!(!faded.is_identity());
        assert!(faded.has_identity_offsets());
        assert!(faded.has_identity_color_multipliers());

        let tinted = ColorTransform {
            red_offset: 10,
            ..ColorTransform::IDENTITY
        };
        assert!(!tinted.has_identity_offsets());
    }

    #[test]
    fn test_apply_clamps_channels() {
        let transform = ColorTransform {
            red_multiplier: 2.0,
            blue_offset: -300,
            ..ColorTransform::from_alpha(0.5)
        };
        assert_eq!(transform.apply(0xc080_40ff), 0xff80_007f);
        assert_eq!(ColorTransform::IDENTITY.apply(0x1234_5678), 0x1234_5678);
    }
}
