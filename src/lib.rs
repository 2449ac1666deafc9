#![forbid(unsafe_code)]

pub mod assets;
pub mod compose;
pub mod config;
pub mod field;
pub mod foundation;
pub mod layout;
pub mod publish;
pub mod render;
pub mod seed;
pub mod server;

pub use assets::bundle::{AssetBundle, AssetManifest, PendingBundle};
pub use compose::context::RenderContext;
pub use compose::pipeline::{Pipeline, PipelineReport, ReadySignal, compose};
pub use compose::request::{RenderRequest, RenderRequestBody};
pub use config::Settings;
pub use field::density::{LayerName, base_density, select_layers};
pub use foundation::core::{Background, CanvasGeometry, Viewport};
pub use foundation::error::{ArtError, ArtResult};
pub use layout::icons::{IconLayout, IconPlacement, layout_icons};
pub use render::backend::{
    AssetSource, BackendKind, BackendSettings, RenderBackend, RenderedArtwork, create_backend,
};
pub use render::frame::{FrameRGBA, encode_png};
pub use render::headless::HeadlessBackend;
pub use render::interactive::{InteractiveRenderer, MemoryPresenter, Presenter};
pub use render::native::NativeBackend;
pub use seed::derive::{SignatureSeed, derive_seed};
pub use seed::noise::NoiseFidelity;
