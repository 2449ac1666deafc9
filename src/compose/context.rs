use std::sync::Arc;

use crate::compose::request::RenderRequest;
use crate::field::density::{DensityFieldLayer, base_density, select_layers};
use crate::foundation::core::{Background, CanvasGeometry};
use crate::foundation::error::ArtResult;
use crate::layout::icons::{IconLayout, layout_icons};
use crate::seed::derive::SignatureSeed;
use crate::seed::noise::{NoiseFidelity, SeededNoise};

/// Everything one render derives from its request, built once and passed read-only
/// through every pipeline stage.
#[derive(Clone, Debug)]
pub struct RenderContext {
    pub request: RenderRequest,
    pub geometry: CanvasGeometry,
    pub seed: SignatureSeed,
    pub fidelity: NoiseFidelity,
    /// Shared so a background change can reuse it without re-sampling.
    pub layout: Arc<IconLayout>,
    pub density: u32,
    pub layers: Vec<&'static DensityFieldLayer>,
    pub noise: Arc<SeededNoise>,
}

impl RenderContext {
    /// Validate `request`, derive the seed and compute the icon layout.
    ///
    /// Layout and noise draw from separate generator instances.
    pub fn new(
        request: RenderRequest,
        fidelity: NoiseFidelity,
        available_icons: usize,
    ) -> ArtResult<Self> {
        request.validate()?;
        let geometry = request.viewport.geometry();
        geometry.validate()?;

        let seed = SignatureSeed::derive(&request.signature_text);
        let mut rng = fidelity.random(seed);
        let layout = layout_icons(
            &mut rng,
            f64::from(geometry.art_width),
            f64::from(geometry.art_height),
            available_icons,
        );

        Ok(Self {
            density: base_density(request.signer_ordinal),
            layers: select_layers(request.signer_ordinal),
            noise: Arc::new(fidelity.noise(seed)),
            request,
            geometry,
            seed,
            fidelity,
            layout: Arc::new(layout),
        })
    }

    /// Same context with another base fill. Icon layout and noise are shared, not recomputed.
    pub fn with_background(&self, background: Background) -> Self {
        Self {
            request: self.request.with_background(background),
            ..self.clone()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/context.rs"]
mod tests;
