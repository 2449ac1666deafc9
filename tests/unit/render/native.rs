use super::*;
use crate::assets::decode::PreparedImage;
use crate::assets::text::{FontSet, PreparedFont};
use crate::field::density::LayerName;
use crate::foundation::core::{Background, Viewport};
use crate::foundation::error::ArtError;

fn bundle(fonts: FontSet) -> Arc<AssetBundle> {
    let paper = PreparedImage::solid(8, 8, [240, 235, 220, 255]).unwrap();
    let manifesto = PreparedImage::solid(8, 8, [0, 0, 0, 0]).unwrap();
    let icon = PreparedImage::solid(8, 8, [20, 20, 20, 255]).unwrap();
    Arc::new(AssetBundle::from_parts(manifesto, paper, vec![icon; 71], fonts).unwrap())
}

fn request(signer: u32) -> RenderRequest {
    RenderRequest {
        display_name: "Test User".to_string(),
        date_label: "January 1, 2025".to_string(),
        signature_text: "0xabc123".to_string(),
        signer_ordinal: signer,
        background: Background::Paper,
        viewport: Viewport::Mobile,
    }
}

#[test]
fn missing_signature_fails_before_drawing() {
    let backend = NativeBackend::new(bundle(FontSet::empty()), NoiseFidelity::Coherent);
    let mut req = request(42);
    req.signature_text.clear();
    assert!(matches!(
        backend.render(&req),
        Err(ArtError::Validation(_))
    ));
}

#[test]
fn missing_fonts_abort_the_render() {
    let backend = NativeBackend::new(bundle(FontSet::empty()), NoiseFidelity::Coherent);
    assert!(matches!(backend.render(&request(42)), Err(ArtError::Asset(_))));
}

#[test]
fn renders_png_with_viewport_size() {
    let Some(font) = PreparedFont::system_fallback() else {
        return;
    };
    let backend = NativeBackend::new(bundle(FontSet::uniform(font)), NoiseFidelity::Coherent);
    let art = backend.render(&request(42)).unwrap();
    assert_eq!((art.width, art.height), (850, 1100));
    assert_eq!(&art.png[..4], b"\x89PNG");
    assert_eq!(
        art.report.layers,
        vec![LayerName::Base, LayerName::Tier1, LayerName::Overlay]
    );
    assert_eq!(backend.kind(), BackendKind::Native);
}

#[test]
fn repeated_renders_are_pixel_identical() {
    let Some(font) = PreparedFont::system_fallback() else {
        return;
    };
    let backend = NativeBackend::new(bundle(FontSet::uniform(font)), NoiseFidelity::Fast);
    let (a, ra) = backend.render_frame(&request(300)).unwrap();
    let (b, rb) = backend.render_frame(&request(300)).unwrap();
    assert_eq!(ra, rb);
    assert!(a == b);
}
