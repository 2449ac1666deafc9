use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::assets::bundle::AssetBundle;
use crate::compose::context::RenderContext;
use crate::compose::pipeline::{Pipeline, PipelineReport, ReadySignal};
use crate::compose::request::RenderRequest;
use crate::foundation::core::Background;
use crate::foundation::error::{ArtError, ArtResult};
use crate::render::backend::rasterize;
use crate::render::cpu::CpuSurface;
use crate::render::frame::{FrameRGBA, encode_png};
use crate::seed::noise::NoiseFidelity;

/// Destination for frames produced by the draw loop.
pub trait Presenter {
    fn present(&mut self, frame: &FrameRGBA) -> ArtResult<()>;
}

/// Keeps the latest frame in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryPresenter {
    pub presented: u64,
    pub last: Option<FrameRGBA>,
}

impl Presenter for MemoryPresenter {
    fn present(&mut self, frame: &FrameRGBA) -> ArtResult<()> {
        self.presented += 1;
        self.last = Some(frame.clone());
        Ok(())
    }
}

type ReadyCallback = Box<dyn FnOnce(&PipelineReport) + Send>;

/// Continuous draw loop over one visible surface.
///
/// Every frame re-runs the whole pipeline. `on_ready` callbacks fire once,
/// after the first completed frame.
pub struct InteractiveRenderer<P: Presenter> {
    pipeline: Pipeline,
    surface: CpuSurface,
    presenter: P,
    frame_interval: Duration,
    frames: u64,
    last_frame: Option<FrameRGBA>,
    on_ready: Vec<ReadyCallback>,
}

impl<P: Presenter> InteractiveRenderer<P> {
    pub fn new(
        request: RenderRequest,
        assets: Arc<AssetBundle>,
        fidelity: NoiseFidelity,
        presenter: P,
        fps: u32,
    ) -> ArtResult<Self> {
        if fps == 0 {
            return Err(ArtError::validation("fps must be > 0"));
        }
        let ctx = RenderContext::new(request, fidelity, assets.icon_count())?;
        let g = ctx.geometry;
        let surface = CpuSurface::new(g.width, g.height, assets.fonts.clone())?;
        Ok(Self {
            pipeline: Pipeline::new(ctx, assets),
            surface,
            presenter,
            frame_interval: Duration::from_secs_f64(1.0 / f64::from(fps)),
            frames: 0,
            last_frame: None,
            on_ready: Vec::new(),
        })
    }

    /// Register a one-shot callback. Runs immediately if the first frame is already out.
    pub fn on_ready(&mut self, callback: impl FnOnce(&PipelineReport) + Send + 'static) {
        match self.pipeline.ready().report() {
            Some(report) => callback(&report),
            None => self.on_ready.push(Box::new(callback)),
        }
    }

    pub fn ready(&self) -> &Arc<ReadySignal> {
        self.pipeline.ready()
    }

    pub fn context(&self) -> &RenderContext {
        self.pipeline.context()
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Draw, present and remember one frame.
    pub fn render_frame(&mut self) -> ArtResult<PipelineReport> {
        let (frame, report) = rasterize(&self.pipeline, &mut self.surface)?;
        self.presenter.present(&frame)?;
        self.last_frame = Some(frame);
        self.frames += 1;

        if !self.on_ready.is_empty() {
            tracing::debug!(frame = self.frames, "first frame presented");
            for callback in self.on_ready.drain(..) {
                callback(&report);
            }
        }
        Ok(report)
    }

    /// Draw `frames` frames paced at the configured rate.
    pub fn run_for(&mut self, frames: u64) -> ArtResult<Option<PipelineReport>> {
        let mut last = None;
        for _ in 0..frames {
            let started = Instant::now();
            last = Some(self.render_frame()?);
            self.pace(started);
        }
        Ok(last)
    }

    /// Draw until `stop` is set. Returns the number of frames drawn.
    pub fn run_until(&mut self, stop: &AtomicBool) -> ArtResult<u64> {
        let mut drawn = 0;
        while !stop.load(Ordering::Acquire) {
            let started = Instant::now();
            self.render_frame()?;
            drawn += 1;
            self.pace(started);
        }
        Ok(drawn)
    }

    fn pace(&self, started: Instant) {
        if let Some(rest) = self.frame_interval.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    /// Swap the base fill. The icon layout is kept and the next frame picks it up.
    pub fn set_background(&mut self, background: Background) {
        self.pipeline.set_background(background);
    }

    /// PNG of the most recently presented frame.
    pub fn snapshot_png(&self) -> ArtResult<Vec<u8>> {
        let frame = self
            .last_frame
            .as_ref()
            .ok_or_else(|| ArtError::render("no frame has been rendered yet"))?;
        encode_png(frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/interactive.rs"]
mod tests;
