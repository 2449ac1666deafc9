use rayon::prelude::*;

use crate::foundation::core::{BlendMode, Point, Rect, Rgba8};
use crate::foundation::error::ArtResult;
use crate::foundation::math::map_range;
use crate::render::surface::{Dot, DrawingSurface};
use crate::seed::derive::SignatureSeed;
use crate::seed::noise::NoiseSource;

/// Lattice step applied to grid column/row indices before sampling noise.
pub const NOISE_STEP: f64 = 0.09;
/// Scale applied to the seed for the noise z coordinate.
pub const SEED_Z_SCALE: f64 = 0.01;

pub const DENSITY_MIN: u32 = 80;
pub const DENSITY_MAX: u32 = 120;
pub const SIGNER_CLAMP_MAX: u32 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerName {
    Base,
    Tier1,
    Tier2,
    Tier3,
    Tier4,
    Tier5,
    Tier6,
    Overlay,
}

impl LayerName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Tier1 => "tier1",
            Self::Tier2 => "tier2",
            Self::Tier3 => "tier3",
            Self::Tier4 => "tier4",
            Self::Tier5 => "tier5",
            Self::Tier6 => "tier6",
            Self::Overlay => "overlay",
        }
    }
}

impl std::fmt::Display for LayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a layer takes part in a render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerGate {
    Always,
    /// Included when `signer_ordinal > n`.
    Above(u32),
}

impl LayerGate {
    pub fn admits(self, signer_ordinal: u32) -> bool {
        match self {
            Self::Always => true,
            Self::Above(n) => signer_ordinal > n,
        }
    }
}

/// Stateless descriptor of one dot-field layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DensityFieldLayer {
    pub name: LayerName,
    pub gate: LayerGate,
    /// Straight-alpha fill color.
    pub color: Rgba8,
    pub noise_offset: f64,
    pub min_dot: f64,
    pub max_dot: f64,
    pub contrast: f64,
    pub blend: BlendMode,
}

const fn tier(
    name: LayerName,
    above: u32,
    color: Rgba8,
    noise_offset: f64,
    min_dot: f64,
    max_dot: f64,
) -> DensityFieldLayer {
    DensityFieldLayer {
        name,
        gate: LayerGate::Above(above),
        color,
        noise_offset,
        min_dot,
        max_dot,
        contrast: 2.0,
        blend: BlendMode::Multiply,
    }
}

/// Ordered, append-only layer table. Draw order is table order; the overlay is always last.
pub const LAYER_TABLE: [DensityFieldLayer; 8] = [
    DensityFieldLayer {
        name: LayerName::Base,
        gate: LayerGate::Always,
        color: Rgba8::new(255, 232, 0, 255),
        noise_offset: 0.0,
        min_dot: 2.0,
        max_dot: 24.0,
        contrast: 2.2,
        blend: BlendMode::Normal,
    },
    tier(LayerName::Tier1, 25, Rgba8::new(136, 137, 138, 120), 1000.0, 0.0, 18.0),
    tier(LayerName::Tier2, 50, Rgba8::new(94, 200, 229, 180), 2000.0, 1.0, 16.0),
    tier(LayerName::Tier3, 100, Rgba8::new(255, 75, 128, 180), 3000.0, 1.0, 16.0),
    tier(LayerName::Tier4, 250, Rgba8::new(68, 214, 44, 180), 4000.0, 1.0, 16.0),
    tier(LayerName::Tier5, 500, Rgba8::new(255, 116, 119, 180), 5000.0, 1.0, 16.0),
    tier(LayerName::Tier6, 1000, Rgba8::new(130, 216, 213, 180), 6000.0, 1.0, 16.0),
    DensityFieldLayer {
        name: LayerName::Overlay,
        gate: LayerGate::Always,
        color: Rgba8::new(0, 0, 0, 40),
        noise_offset: 3000.0,
        min_dot: 0.0,
        max_dot: 10.0,
        contrast: 3.0,
        blend: BlendMode::Darken,
    },
];

/// Layers admitted for `signer_ordinal`, in draw order.
pub fn select_layers(signer_ordinal: u32) -> Vec<&'static DensityFieldLayer> {
    LAYER_TABLE
        .iter()
        .filter(|l| l.gate.admits(signer_ordinal))
        .collect()
}

/// Grid columns shared by every layer of a render: `floor(map(clamp(n, 1, 1000), 1..1000 -> 80..120))`.
pub fn base_density(signer_ordinal: u32) -> u32 {
    let n = signer_ordinal.clamp(1, SIGNER_CLAMP_MAX);
    let mapped = map_range(
        f64::from(n),
        1.0,
        f64::from(SIGNER_CLAMP_MAX),
        f64::from(DENSITY_MIN),
        f64::from(DENSITY_MAX),
    );
    (mapped.floor() as u32).clamp(DENSITY_MIN, DENSITY_MAX)
}

/// Cell partition of the art region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DotGrid {
    pub cols: u32,
    pub rows: u32,
    pub cell_w: f64,
    pub cell_h: f64,
}

impl DotGrid {
    pub fn new(density: u32, art_w: f64, art_h: f64) -> Self {
        let cols = density;
        let rows = if art_w > 0.0 {
            (f64::from(cols) * art_h / art_w).floor().max(0.0) as u32
        } else {
            0
        };
        let cell_w = if cols > 0 { art_w / f64::from(cols) } else { 0.0 };
        let cell_h = if rows > 0 { art_h / f64::from(rows) } else { 0.0 };
        Self {
            cols,
            rows,
            cell_w,
            cell_h,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

/// Dot geometry for one layer, column-major (all rows of column 0 first).
///
/// Noise is sampled at `(col*0.09+off, row*0.09+off, seed*0.01+off)`, raised to
/// `contrast` and mapped to `[min_dot, max_dot]` as the dot diameter.
pub fn dot_field(
    layer: &DensityFieldLayer,
    grid: DotGrid,
    origin: Point,
    seed: SignatureSeed,
    noise: &dyn NoiseSource,
) -> Vec<Dot> {
    let rows = grid.rows as usize;
    if rows == 0 {
        return Vec::new();
    }
    let off = layer.noise_offset;
    let z = seed.as_f64() * SEED_Z_SCALE + off;

    (0..grid.cell_count())
        .into_par_iter()
        .map(|k| {
            let i = (k / rows) as f64;
            let j = (k % rows) as f64;
            let n = noise.noise(i * NOISE_STEP + off, j * NOISE_STEP + off, z);
            let n = n.powf(layer.contrast);
            Dot {
                center: Point::new(
                    origin.x + i * grid.cell_w + grid.cell_w / 2.0,
                    origin.y + j * grid.cell_h + grid.cell_h / 2.0,
                ),
                diameter: map_range(n, 0.0, 1.0, layer.min_dot, layer.max_dot),
            }
        })
        .collect()
}

/// Composite one layer onto `surface` inside `art`. Restores normal blending afterwards.
pub fn render_layer(
    surface: &mut dyn DrawingSurface,
    layer: &DensityFieldLayer,
    density: u32,
    art: Rect,
    seed: SignatureSeed,
    noise: &dyn NoiseSource,
) -> ArtResult<usize> {
    let grid = DotGrid::new(density, art.width(), art.height());
    let dots = dot_field(layer, grid, Point::new(art.x0, art.y0), seed, noise);

    surface.set_blend_mode(layer.blend);
    let res = surface.draw_dots(&dots, layer.color);
    surface.set_blend_mode(BlendMode::Normal);
    res?;

    tracing::trace!(layer = %layer.name, dots = dots.len(), "density layer drawn");
    Ok(dots.len())
}

#[cfg(test)]
#[path = "../../tests/unit/field/density.rs"]
mod tests;
