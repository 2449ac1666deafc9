use std::sync::Arc;

use crate::assets::bundle::AssetBundle;
use crate::compose::context::RenderContext;
use crate::compose::pipeline::{Pipeline, PipelineReport};
use crate::compose::request::RenderRequest;
use crate::foundation::error::ArtResult;
use crate::render::backend::{BackendKind, RenderBackend, RenderedArtwork, rasterize};
use crate::render::cpu::CpuSurface;
use crate::render::frame::FrameRGBA;
use crate::seed::noise::NoiseFidelity;

/// In-process raster backend. Each call owns a fresh surface and context.
#[derive(Clone, Debug)]
pub struct NativeBackend {
    assets: Arc<AssetBundle>,
    fidelity: NoiseFidelity,
}

impl NativeBackend {
    pub fn new(assets: Arc<AssetBundle>, fidelity: NoiseFidelity) -> Self {
        Self { assets, fidelity }
    }

    pub fn fidelity(&self) -> NoiseFidelity {
        self.fidelity
    }

    /// Render without PNG encoding.
    pub fn render_frame(&self, request: &RenderRequest) -> ArtResult<(FrameRGBA, PipelineReport)> {
        let ctx = RenderContext::new(request.clone(), self.fidelity, self.assets.icon_count())?;
        let g = ctx.geometry;
        let pipeline = Pipeline::new(ctx, self.assets.clone());
        let mut surface = CpuSurface::new(g.width, g.height, self.assets.fonts.clone())?;
        rasterize(&pipeline, &mut surface)
    }
}

impl RenderBackend for NativeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    #[tracing::instrument(
        skip_all,
        fields(signer = request.signer_ordinal, viewport = ?request.viewport, background = ?request.background)
    )]
    fn render(&self, request: &RenderRequest) -> ArtResult<RenderedArtwork> {
        tracing::debug!("native render started");
        let out = self
            .render_frame(request)
            .and_then(|(frame, report)| RenderedArtwork::from_frame(&frame, report));
        match &out {
            Ok(art) => tracing::debug!(
                bytes = art.png.len(),
                layers = art.report.layers.len(),
                icons = art.report.icons,
                "native render finished"
            ),
            Err(e) => tracing::error!(error = %e, "native render failed"),
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/native.rs"]
mod tests;
