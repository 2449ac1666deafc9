use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::assets::bundle::AssetBundle;
use crate::compose::context::RenderContext;
use crate::field::density::{LayerName, render_layer};
use crate::foundation::core::{
    Affine, Background, BlendMode, FontFace, Point, Rect, Rgba8, TextAlign,
};
use crate::foundation::error::{ArtError, ArtResult};
use crate::render::surface::{DrawingSurface, ImageDraw, TextDraw};

pub const TITLE: &str = "THE DIGITAL MAVERICK MANIFESTO";
pub const ICON_OPACITY: f32 = 70.0 / 255.0;
pub const MANIFESTO_OPACITY: f32 = 140.0 / 255.0;
pub const SIGNATURE_GRAY: u8 = 180;

/// Structural summary of one completed pass. Idempotence checks compare these.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PipelineReport {
    pub layers: Vec<LayerName>,
    pub icons: usize,
    pub width: u32,
    pub height: u32,
}

/// Run every stage once against `surface`.
///
/// Stages run in a fixed linear order: background, clip, density layers, icons,
/// manifesto overlay, unclip, captions.
pub fn compose(
    ctx: &RenderContext,
    assets: &AssetBundle,
    surface: &mut dyn DrawingSurface,
) -> ArtResult<PipelineReport> {
    let g = ctx.geometry;
    let (w, h) = surface.size();
    if (w, h) != (g.width, g.height) {
        return Err(ArtError::render(format!(
            "surface is {w}x{h} but the {:?} canvas is {}x{}",
            ctx.request.viewport, g.width, g.height
        )));
    }
    if let Some(p) = ctx.layout.iter().find(|p| p.icon_index >= assets.icons.len()) {
        return Err(ArtError::asset(format!(
            "icon index {} out of range for {} loaded icons",
            p.icon_index,
            assets.icons.len()
        )));
    }

    draw_background(ctx, assets, surface)?;

    let art = g.art_rect();
    surface.push_clip_rect(art)?;
    let clipped = draw_art(ctx, assets, surface, art);
    // Always unwind the clip, even when a stage failed.
    let unclip = surface.pop_clip();
    clipped?;
    unclip?;

    draw_captions(ctx, surface)?;

    Ok(PipelineReport {
        layers: ctx.layers.iter().map(|l| l.name).collect(),
        icons: ctx.layout.len(),
        width: g.width,
        height: g.height,
    })
}

fn draw_background(
    ctx: &RenderContext,
    assets: &AssetBundle,
    surface: &mut dyn DrawingSurface,
) -> ArtResult<()> {
    surface.set_blend_mode(BlendMode::Normal);
    let canvas = ctx.geometry.canvas_rect();
    match ctx.request.background {
        Background::White => surface.fill_rect(canvas, Rgba8::WHITE),
        Background::Paper => surface.draw_image(&ImageDraw {
            image: &assets.paper,
            dest: canvas,
            transform: Affine::IDENTITY,
            opacity: 1.0,
        }),
    }
}

fn draw_art(
    ctx: &RenderContext,
    assets: &AssetBundle,
    surface: &mut dyn DrawingSurface,
    art: Rect,
) -> ArtResult<()> {
    for layer in &ctx.layers {
        render_layer(
            surface,
            layer,
            ctx.density,
            art,
            ctx.seed,
            ctx.noise.as_ref(),
        )?;
    }

    for p in ctx.layout.iter() {
        let half = p.size / 2.0;
        let transform =
            Affine::translate((art.x0 + p.x, art.y0 + p.y)) * Affine::rotate(p.rotation);
        surface.draw_image(&ImageDraw {
            image: &assets.icons[p.icon_index],
            dest: Rect::new(-half, -half, half, half),
            transform,
            opacity: ICON_OPACITY,
        })?;
    }

    surface.draw_image(&ImageDraw {
        image: &assets.manifesto,
        dest: art,
        transform: Affine::IDENTITY,
        opacity: MANIFESTO_OPACITY,
    })
}

fn draw_captions(ctx: &RenderContext, surface: &mut dyn DrawingSurface) -> ArtResult<()> {
    let g = ctx.geometry;
    let s = g.scale;
    let cx = f64::from(g.width) / 2.0;
    let bottom = f64::from(g.height);
    let req = &ctx.request;
    let signed = format!("Signed by {} on {}", req.display_name, req.date_label);
    let number = format!("#{}", req.signer_ordinal);

    let lines = [
        TextDraw {
            text: TITLE,
            face: FontFace::Regular,
            size_px: 48.0 * s,
            color: Rgba8::BLACK,
            anchor: Point::new(cx, bottom - 200.0 * s),
            align: TextAlign::Center,
        },
        TextDraw {
            text: &signed,
            face: FontFace::Italic,
            size_px: 32.0 * s,
            color: Rgba8::BLACK,
            anchor: Point::new(cx, bottom - 150.0 * s),
            align: TextAlign::Center,
        },
        TextDraw {
            text: &req.signature_text,
            face: FontFace::Light,
            size_px: 28.0 * s,
            color: Rgba8::gray(SIGNATURE_GRAY),
            anchor: Point::new(cx, bottom - 100.0 * s),
            align: TextAlign::Center,
        },
        TextDraw {
            text: &number,
            face: FontFace::Display,
            size_px: 40.0 * s,
            color: Rgba8::BLACK,
            anchor: Point::new(
                g.left() + f64::from(g.art_width) - 10.0,
                g.top() + f64::from(g.art_height) + 40.0 * s,
            ),
            align: TextAlign::Right,
        },
    ];

    for line in &lines {
        surface.draw_text(line)?;
    }
    Ok(())
}

/// One-shot "first pass composited" notification.
///
/// The first [`ReadySignal::fire`] stores the report and wakes waiters; later
/// calls are ignored.
#[derive(Debug, Default)]
pub struct ReadySignal {
    state: Mutex<Option<PipelineReport>>,
    cv: Condvar,
}

impl ReadySignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` only for the call that flipped the signal.
    pub fn fire(&self, report: &PipelineReport) -> bool {
        let Ok(mut state) = self.state.lock() else {
            return false;
        };
        if state.is_some() {
            return false;
        }
        *state = Some(report.clone());
        self.cv.notify_all();
        true
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().map(|s| s.is_some()).unwrap_or(false)
    }

    pub fn report(&self) -> Option<PipelineReport> {
        self.state.lock().ok().and_then(|s| s.clone())
    }

    /// Block until fired or `timeout` elapses.
    pub fn wait(&self, timeout: Duration) -> ArtResult<PipelineReport> {
        let guard = self
            .state
            .lock()
            .map_err(|_| ArtError::render("ready signal poisoned"))?;
        let (guard, _) = self
            .cv
            .wait_timeout_while(guard, timeout, |s| s.is_none())
            .map_err(|_| ArtError::render("ready signal poisoned"))?;
        guard.clone().ok_or_else(|| {
            ArtError::timeout(format!(
                "artwork not ready within {} ms",
                timeout.as_millis()
            ))
        })
    }
}

/// A render context bound to its assets, with a ready signal that fires after
/// the first pass has been rasterized.
#[derive(Debug, Clone)]
pub struct Pipeline {
    ctx: Arc<RenderContext>,
    assets: Arc<AssetBundle>,
    ready: Arc<ReadySignal>,
}

impl Pipeline {
    pub fn new(ctx: RenderContext, assets: Arc<AssetBundle>) -> Self {
        Self {
            ctx: Arc::new(ctx),
            assets,
            ready: Arc::new(ReadySignal::new()),
        }
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    pub fn assets(&self) -> &Arc<AssetBundle> {
        &self.assets
    }

    pub fn ready(&self) -> &Arc<ReadySignal> {
        &self.ready
    }

    /// Swap the base fill. Layout, noise and the ready state carry over.
    pub fn set_background(&mut self, background: Background) {
        if self.ctx.request.background != background {
            self.ctx = Arc::new(self.ctx.with_background(background));
        }
    }

    /// Compose one full pass. Does not touch the ready signal.
    pub fn run_pass(&self, surface: &mut dyn DrawingSurface) -> ArtResult<PipelineReport> {
        compose(&self.ctx, &self.assets, surface)
    }

    /// Mark the artwork ready once the pass for `report` has been rasterized.
    ///
    /// Returns `true` only the first time.
    pub fn mark_ready(&self, report: &PipelineReport) -> bool {
        let fired = self.ready.fire(report);
        if fired {
            tracing::debug!(
                layers = report.layers.len(),
                icons = report.icons,
                "artwork ready"
            );
        }
        fired
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/pipeline.rs"]
mod tests;
