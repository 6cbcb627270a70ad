//! Color types and the chart palettes.
//!
//! Chart colours are given as hex strings in the usual `#rrggbb[aa]` form;
//! the constants below are the decoded values.

use crate::error::{Error, Result};

/// RGBA color with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct Rgba {
    /// Red component (0-255).
    pub r: u8,
    /// Green component (0-255).
    pub g: u8,
    /// Blue component (0-255).
    pub b: u8,
    /// Alpha component (0-255, 255 = fully opaque).
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    /// Opaque blue.
    pub const BLUE: Self = Self::new(0, 0, 255, 255);

    /// Factual class colour (`#ff0055D2`).
    pub const FACTUAL: Self = Self::new(0xff, 0x00, 0x55, 0xd2);
    /// Opaque factual colour (`#ff0055`).
    pub const FACTUAL_SOLID: Self = Self::rgb(0xff, 0x00, 0x55);
    /// Counterfactual class colour (`#008ae7D2`).
    pub const COUNTERFACTUAL: Self = Self::new(0x00, 0x8a, 0xe7, 0xd2);
    /// Opaque counterfactual colour (`#008ae7`).
    pub const COUNTERFACTUAL_SOLID: Self = Self::rgb(0x00, 0x8a, 0xe7);
    /// Decision threshold (`#c20000`).
    pub const THRESHOLD: Self = Self::rgb(0xc2, 0x00, 0x00);
    /// Feature names and value changes (`#545454`).
    pub const LABEL_GREY: Self = Self::rgb(0x54, 0x54, 0x54);
    /// Factual row and applied-change tags (`#8f8f8f`).
    pub const MUTED_GREY: Self = Self::rgb(0x8f, 0x8f, 0x8f);
    /// Greedy path connector (`#c4c4c4`).
    pub const CONNECTOR_GREY: Self = Self::rgb(0xc4, 0xc4, 0xc4);
    /// Intermediate cumulative scores (`#999999`).
    pub const SCORE_GREY: Self = Self::rgb(0x99, 0x99, 0x99);
    /// Label track behind the bars (`#ebebeb`).
    pub const TRACK_GREY: Self = Self::rgb(0xeb, 0xeb, 0xeb);
    /// Segment separators (`#cccccc`).
    pub const SEPARATOR_GREY: Self = Self::rgb(0xcc, 0xcc, 0xcc);
    /// Combination links (`#e0e0e0`).
    pub const COMBINATION_GREY: Self = Self::rgb(0xe0, 0xe0, 0xe0);
    /// Counterfactual point in the constellation (`#FFB449`).
    pub const COUNTERFACTUAL_POINT: Self = Self::rgb(0xff, 0xb4, 0x49);

    /// Create a new RGBA color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque RGB color (alpha = 255).
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Create a color with modified alpha.
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Scale the existing alpha by `opacity` (0.0 - 1.0).
    #[must_use]
    pub fn fade(self, opacity: f32) -> Self {
        let a = f32::from(self.a) * opacity.clamp(0.0, 1.0);
        self.with_alpha(a.round() as u8)
    }

    /// Convert to array representation.
    #[must_use]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Create from array representation.
    #[must_use]
    pub const fn from_array(arr: [u8; 4]) -> Self {
        Self::new(arr[0], arr[1], arr[2], arr[3])
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (the `#` is optional).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidColor`] for any other shape.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !(digits.len() == 6 || digits.len() == 8) || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(hex.to_string()));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| Error::InvalidColor(hex.to_string()))
        };

        let a = if digits.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Linear interpolation between two colors.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let inv_t = 1.0 - t;

        Self::new(
            (f32::from(self.r) * inv_t + f32::from(other.r) * t) as u8,
            (f32::from(self.g) * inv_t + f32::from(other.g) * t) as u8,
            (f32::from(self.b) * inv_t + f32::from(other.b) * t) as u8,
            (f32::from(self.a) * inv_t + f32::from(other.a) * t) as u8,
        )
    }
}

/// Row colours of the greedy chart. Index 0 is the factual row.
pub const GREEDY_PALETTE: [Rgba; 10] = [
    Rgba::rgb(0x8f, 0x8f, 0x8f),
    Rgba::rgb(0xd1, 0x27, 0x71),
    Rgba::rgb(0x45, 0x89, 0xff),
    Rgba::rgb(0x00, 0x7d, 0x79),
    Rgba::rgb(0x8a, 0x3f, 0xfc),
    Rgba::rgb(0xff, 0xb5, 0x5a),
    Rgba::rgb(0xff, 0xee, 0x65),
    Rgba::rgb(0xbe, 0xb9, 0xdb),
    Rgba::rgb(0xfd, 0xcc, 0xe5),
    Rgba::rgb(0x8b, 0xd3, 0xc7),
];

/// Point colours of the constellation chart.
pub const CONSTELLATION_PALETTE: [Rgba; 9] = [
    Rgba::rgb(0xd1, 0x27, 0x71),
    Rgba::rgb(0x45, 0x89, 0xff),
    Rgba::rgb(0x00, 0x7d, 0x79),
    Rgba::rgb(0x8a, 0x3f, 0xfc),
    Rgba::rgb(0xff, 0xb5, 0x5a),
    Rgba::rgb(0xff, 0xee, 0x65),
    Rgba::rgb(0xbe, 0xb9, 0xdb),
    Rgba::rgb(0xfd, 0xcc, 0xe5),
    Rgba::rgb(0x8b, 0xd3, 0xc7),
];

/// Palette lookup that wraps around instead of running off the end.
#[must_use]
pub fn palette_color(palette: &[Rgba], index: usize) -> Rgba {
    if palette.is_empty() {
        return Rgba::BLACK;
    }
    palette[index % palette.len()]
}
