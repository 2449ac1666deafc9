use crate::foundation::error::{ArtError, ArtResult};

pub use kurbo::{Affine, Point, Rect};

/// Target viewport for a render. Selects one fixed [`CanvasGeometry`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Viewport {
    #[default]
    Desktop,
    Mobile,
}

impl Viewport {
    pub fn from_is_mobile(is_mobile: bool) -> Self {
        if is_mobile { Self::Mobile } else { Self::Desktop }
    }

    pub fn geometry(self) -> CanvasGeometry {
        match self {
            Self::Desktop => CanvasGeometry::DESKTOP,
            Self::Mobile => CanvasGeometry::MOBILE,
        }
    }
}

/// Base fill behind the art region.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    #[default]
    Paper,
    White,
}

impl Background {
    pub fn from_white_flag(white: bool) -> Self {
        if white { Self::White } else { Self::Paper }
    }
}

/// Fixed per-viewport canvas constants shared by every backend.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CanvasGeometry {
    pub width: u32,
    pub height: u32,
    pub art_width: u32,
    pub art_height: u32,
    pub bottom_margin: u32,
    /// Multiplier applied to caption font sizes and caption offsets.
    pub scale: f64,
}

impl CanvasGeometry {
    pub const DESKTOP: Self = Self {
        width: 1700,
        height: 2200,
        art_width: 1428,
        art_height: 1785,
        bottom_margin: 279,
        scale: 1.0,
    };

    pub const MOBILE: Self = Self {
        width: 850,
        height: 1100,
        art_width: 714,
        art_height: 892,
        bottom_margin: 139,
        scale: 0.5,
    };

    /// `height - art_height - bottom_margin`.
    pub fn top(self) -> f64 {
        f64::from(self.height) - f64::from(self.art_height) - f64::from(self.bottom_margin)
    }

    /// Art region centered horizontally.
    pub fn left(self) -> f64 {
        ((f64::from(self.width) - f64::from(self.art_width)) / 2.0).floor()
    }

    /// Art region in canvas coordinates.
    pub fn art_rect(self) -> Rect {
        let x0 = self.left();
        let y0 = self.top();
        Rect::new(
            x0,
            y0,
            x0 + f64::from(self.art_width),
            y0 + f64::from(self.art_height),
        )
    }

    pub fn canvas_rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    pub fn validate(self) -> ArtResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ArtError::validation("canvas width/height must be > 0"));
        }
        if self.art_width > self.width || self.art_height + self.bottom_margin > self.height {
            return Err(ArtError::validation("art region must fit inside the canvas"));
        }
        if self.art_width == 0 || self.art_height == 0 {
            return Err(ArtError::validation("art region must be non-empty"));
        }
        Ok(())
    }
}

/// Straight-alpha RGBA8 color as authored in the layer table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn gray(v: u8) -> Self {
        Self::new(v, v, v, 255)
    }

    /// Premultiplied copy (r,g,b scaled by a).
    pub fn premultiplied(self) -> Self {
        use crate::foundation::math::mul_div255_u8;
        Self {
            r: mul_div255_u8(self.r, self.a),
            g: mul_div255_u8(self.g, self.a),
            b: mul_div255_u8(self.b, self.a),
            a: self.a,
        }
    }
}

/// Compositing mode for a draw call.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Darken,
}

/// Horizontal text anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Center,
    Left,
    Right,
}

/// Caption font faces bundled with the assets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFace {
    Regular,
    Light,
    Italic,
    Display,
}

impl FontFace {
    pub const ALL: [Self; 4] = [Self::Regular, Self::Light, Self::Italic, Self::Display];

    pub fn index(self) -> usize {
        match self {
            Self::Regular => 0,
            Self::Light => 1,
            Self::Italic => 2,
            Self::Display => 3,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
