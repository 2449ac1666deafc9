use std::f64::consts::PI;

use crate::seed::random::RandomSource;

/// Minimum gap between the circumcircles of two accepted icons.
pub const SPACING_BUFFER: f64 = 10.0;
/// Upper bound on placement draws, accepted or not.
pub const MAX_TRIES: usize = 400;
pub const MIN_ICON_SIZE: f64 = 600.0;
pub const MAX_ICON_SIZE: f64 = 900.0;
/// Vertical band kept free of icon centers at the bottom of the art region.
pub const BOTTOM_RESERVE: f64 = 80.0;

/// One decorative icon in art-region-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IconPlacement {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    /// Radians.
    pub rotation: f64,
    pub icon_index: usize,
}

impl IconPlacement {
    pub fn spacing_ok(&self, other: &IconPlacement) -> bool {
        let dist = (self.x - other.x).hypot(self.y - other.y);
        dist >= (self.size + other.size) / 2.0 + SPACING_BUFFER
    }

    /// True when the square footprint overlaps the art region at least partially.
    pub fn is_visible_in(&self, art_w: f64, art_h: f64) -> bool {
        let half = self.size / 2.0;
        self.x + half > 0.0
            && self.x - half < art_w
            && self.y + half > 0.0
            && self.y - half < art_h
    }
}

/// Ordered placements for one render. Computed once per seed and reused across
/// redraws and background changes.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IconLayout {
    pub placements: Vec<IconPlacement>,
    /// Icon count drawn before packing; `placements.len()` may fall short of it.
    pub requested: usize,
}

impl IconLayout {
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IconPlacement> {
        self.placements.iter()
    }
}

/// Rejection-sampling packer.
///
/// Draw order is fixed: icon count, then the index permutation, then up to
/// [`MAX_TRIES`] `(size, x, y, rotation)` quadruples. Reordering these draws
/// changes every downstream layout for the same seed.
pub fn layout_icons<R: RandomSource>(
    rng: &mut R,
    art_w: f64,
    art_h: f64,
    available_icons: usize,
) -> IconLayout {
    let requested = (rng.range(7.0, 12.0).floor() as usize).min(available_icons);

    let mut order: Vec<usize> = (0..available_icons).collect();
    rng.shuffle(&mut order);
    order.truncate(requested);

    let mut placements = Vec::<IconPlacement>::with_capacity(requested);
    let mut tries = 0usize;
    while placements.len() < requested && tries < MAX_TRIES {
        let size = rng.range(MIN_ICON_SIZE, MAX_ICON_SIZE);
        let x = rng.range(-size / 3.0, art_w + size / 3.0);
        let y = rng.range(-size / 3.0, art_h - BOTTOM_RESERVE + size / 3.0);
        let rotation = rng.range(-PI / 16.0, PI / 16.0);

        let candidate = IconPlacement {
            x,
            y,
            size,
            rotation,
            icon_index: order[placements.len()],
        };
        let spaced = placements.iter().all(|p| candidate.spacing_ok(p));
        if spaced && candidate.is_visible_in(art_w, art_h) {
            placements.push(candidate);
        }
        tries += 1;
    }

    tracing::trace!(
        requested,
        placed = placements.len(),
        tries,
        "icon layout resolved"
    );
    IconLayout {
        placements,
        requested,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/icons.rs"]
mod tests;
