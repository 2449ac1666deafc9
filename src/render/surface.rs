//! Typed drawing capability set shared by every backend.
//!
//! The composition pipeline only ever talks to a [`DrawingSurface`]; raster,
//! recording and presenter-backed surfaces implement it.

use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Affine, BlendMode, FontFace, Point, Rect, Rgba8, TextAlign};
use crate::foundation::error::ArtResult;

/// One filled circle of a density field, in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Dot {
    pub center: Point,
    pub diameter: f64,
}

/// Image stretched into `dest`, then mapped through `transform`.
#[derive(Clone, Copy, Debug)]
pub struct ImageDraw<'a> {
    pub image: &'a PreparedImage,
    pub dest: Rect,
    pub transform: Affine,
    pub opacity: f32,
}

/// Single line of text. `anchor.y` is the baseline; `anchor.x` is interpreted per `align`.
#[derive(Clone, Copy, Debug)]
pub struct TextDraw<'a> {
    pub text: &'a str,
    pub face: FontFace,
    pub size_px: f64,
    pub color: Rgba8,
    pub anchor: Point,
    pub align: TextAlign,
}

pub trait DrawingSurface {
    /// `(width, height)` in pixels.
    fn size(&self) -> (u32, u32);

    fn fill_rect(&mut self, rect: Rect, color: Rgba8) -> ArtResult<()>;

    fn draw_image(&mut self, draw: &ImageDraw<'_>) -> ArtResult<()>;

    fn draw_circle(&mut self, center: Point, diameter: f64, color: Rgba8) -> ArtResult<()>;

    /// Batch form of [`DrawingSurface::draw_circle`]; all dots share one color.
    fn draw_dots(&mut self, dots: &[Dot], color: Rgba8) -> ArtResult<()> {
        for dot in dots {
            self.draw_circle(dot.center, dot.diameter, color)?;
        }
        Ok(())
    }

    fn draw_text(&mut self, draw: &TextDraw<'_>) -> ArtResult<()>;

    /// Restrict subsequent drawing to `rect` until the matching [`DrawingSurface::pop_clip`].
    fn push_clip_rect(&mut self, rect: Rect) -> ArtResult<()>;

    fn pop_clip(&mut self) -> ArtResult<()>;

    /// Blend mode for subsequent fills. Sticky until changed.
    fn set_blend_mode(&mut self, mode: BlendMode);
}
