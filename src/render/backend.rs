use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::assets::bundle::{AssetBundle, AssetManifest};
use crate::compose::pipeline::{Pipeline, PipelineReport};
use crate::compose::request::RenderRequest;
use crate::foundation::error::{ArtError, ArtResult};
use crate::render::cpu::CpuSurface;
use crate::render::frame::{FrameRGBA, encode_png};
use crate::render::headless::HeadlessBackend;
use crate::render::native::NativeBackend;
use crate::seed::noise::NoiseFidelity;

/// Encoded output of one render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedArtwork {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub report: PipelineReport,
}

impl RenderedArtwork {
    pub fn from_frame(frame: &FrameRGBA, report: PipelineReport) -> ArtResult<Self> {
        Ok(Self {
            png: encode_png(frame)?,
            width: frame.width,
            height: frame.height,
            report,
        })
    }
}

/// One-shot `RenderRequest -> PNG` contract shared by the server-side backends.
pub trait RenderBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn render(&self, request: &RenderRequest) -> ArtResult<RenderedArtwork>;
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Native,
    Headless,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Headless => "headless",
        }
    }
}

impl FromStr for BackendKind {
    type Err = ArtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "headless" => Ok(Self::Headless),
            other => Err(ArtError::validation(format!(
                "unknown backend '{other}' (expected native|headless)"
            ))),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Custom asset loader, called once per headless page.
pub type AssetLoader = Arc<dyn Fn() -> ArtResult<Arc<AssetBundle>> + Send + Sync>;

/// Where a backend gets its assets from.
#[derive(Clone)]
pub enum AssetSource {
    /// Already loaded; every consumer shares it.
    Shared(Arc<AssetBundle>),
    /// Loaded from disk by each consumer.
    Directory {
        root: PathBuf,
        manifest: AssetManifest,
    },
    Loader(AssetLoader),
}

impl AssetSource {
    pub fn load(&self) -> ArtResult<Arc<AssetBundle>> {
        match self {
            Self::Shared(bundle) => Ok(bundle.clone()),
            Self::Directory { root, manifest } => AssetBundle::load(root, manifest).map(Arc::new),
            Self::Loader(load) => load(),
        }
    }
}

impl std::fmt::Debug for AssetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shared(b) => f
                .debug_tuple("Shared")
                .field(&format_args!("{} icons", b.icon_count()))
                .finish(),
            Self::Directory { root, .. } => {
                f.debug_struct("Directory").field("root", root).finish()
            }
            Self::Loader(_) => f.write_str("Loader(..)"),
        }
    }
}

/// Knobs shared by [`create_backend`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendSettings {
    pub fidelity: NoiseFidelity,
    pub headless_pages: usize,
    pub headless_timeout: Duration,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            fidelity: NoiseFidelity::Coherent,
            headless_pages: 2,
            headless_timeout: Duration::from_secs(30),
        }
    }
}

pub fn create_backend(
    kind: BackendKind,
    source: AssetSource,
    settings: &BackendSettings,
) -> ArtResult<Box<dyn RenderBackend>> {
    match kind {
        BackendKind::Native => Ok(Box::new(NativeBackend::new(
            source.load()?,
            settings.fidelity,
        ))),
        BackendKind::Headless => Ok(Box::new(HeadlessBackend::new(
            source,
            settings.fidelity,
            settings.headless_pages,
            settings.headless_timeout,
        )?)),
    }
}

/// Compose one pass of `pipeline` on a cleared `surface` and read the pixels back.
pub(crate) fn rasterize(
    pipeline: &Pipeline,
    surface: &mut CpuSurface,
) -> ArtResult<(FrameRGBA, PipelineReport)> {
    surface.reset();
    let report = pipeline.run_pass(surface)?;
    let frame = surface.finish()?;
    pipeline.mark_ready(&report);
    Ok((frame, report))
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
