use std::sync::Arc;

use crate::foundation::core::FontFace;
use crate::foundation::error::{ArtError, ArtResult};

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Raw font file bytes for one caption face.
#[derive(Clone, PartialEq, Eq)]
pub struct PreparedFont {
    pub bytes: Arc<Vec<u8>>,
}

impl PreparedFont {
    pub fn new(bytes: Vec<u8>) -> ArtResult<Self> {
        if bytes.is_empty() {
            return Err(ArtError::asset("font data is empty"));
        }
        Ok(Self {
            bytes: Arc::new(bytes),
        })
    }

    /// First single-face font installed on this machine, if any.
    pub fn system_fallback() -> Option<Self> {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        let id = db.faces().find(|f| f.index == 0)?.id;
        let bytes = db.with_face_data(id, |data, _| data.to_vec())?;
        Self::new(bytes).ok()
    }

    /// Two installed faces of one family that differ in weight or style.
    pub fn system_family_pair() -> Option<(Self, Self)> {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        let faces: Vec<_> = db.faces().filter(|f| f.index == 0).collect();
        let (a, b) = faces.iter().enumerate().find_map(|(i, a)| {
            let family = &a.families.first()?.0;
            faces[i + 1..]
                .iter()
                .find(|b| {
                    b.families.first().is_some_and(|(f, _)| f == family)
                        && (b.weight != a.weight || b.style != a.style)
                })
                .map(|b| (a.id, b.id))
        })?;
        let load = |id| {
            db.with_face_data(id, |data, _| data.to_vec())
                .and_then(|bytes| Self::new(bytes).ok())
        };
        Some((load(a)?, load(b)?))
    }
}

impl std::fmt::Debug for PreparedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedFont")
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// The four caption faces, indexed by [`FontFace`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FontSet {
    faces: [Option<PreparedFont>; 4],
}

impl FontSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Same font for every face.
    pub fn uniform(font: PreparedFont) -> Self {
        Self {
            faces: std::array::from_fn(|_| Some(font.clone())),
        }
    }

    pub fn with_face(mut self, face: FontFace, font: PreparedFont) -> Self {
        self.faces[face.index()] = Some(font);
        self
    }

    pub fn get(&self, face: FontFace) -> ArtResult<&PreparedFont> {
        self.faces[face.index()]
            .as_ref()
            .ok_or_else(|| ArtError::asset(format!("font face {face:?} is not loaded")))
    }

    pub fn is_complete(&self) -> bool {
        self.faces.iter().all(Option::is_some)
    }
}

/// Family name plus the attributes of one registered face.
///
/// Faces that share a family (Regular and Light cuts) only resolve to the right
/// file when the query carries weight, style and width as well.
#[derive(Clone, Debug)]
struct RegisteredFace {
    family: String,
    weight: parley::fontique::FontWeight,
    style: parley::fontique::FontStyle,
    width: parley::fontique::FontWidth,
}

/// Stateful helper for building single-line Parley layouts from the caption faces.
///
/// Fonts are registered with the Parley collection lazily, once per face.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    faces: [Option<RegisteredFace>; 4],
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            faces: Default::default(),
        }
    }

    /// Family name registered for `face`, registering `font` on first use.
    pub fn family_for(&mut self, face: FontFace, font: &PreparedFont) -> ArtResult<String> {
        self.register(face, font).map(|r| r.family)
    }

    fn register(&mut self, face: FontFace, font: &PreparedFont) -> ArtResult<RegisteredFace> {
        if let Some(registered) = &self.faces[face.index()] {
            return Ok(registered.clone());
        }
        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(font.bytes.as_ref().clone()),
            None,
        );
        let (family_id, infos) = families
            .first()
            .ok_or_else(|| ArtError::asset("no font families registered from font bytes"))?;
        let info = infos
            .first()
            .ok_or_else(|| ArtError::asset("registered font family has no faces"))?;
        let family = self
            .font_ctx
            .collection
            .family_name(*family_id)
            .ok_or_else(|| ArtError::asset("registered font family has no name"))?
            .to_string();
        let registered = RegisteredFace {
            family,
            weight: info.weight(),
            style: info.style(),
            width: info.width(),
        };
        self.faces[face.index()] = Some(registered.clone());
        Ok(registered)
    }

    /// Shape `text` as one unwrapped line.
    pub fn layout_line(
        &mut self,
        text: &str,
        face: FontFace,
        font: &PreparedFont,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> ArtResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ArtError::validation("text size_px must be finite and > 0"));
        }
        let registered = self.register(face, font)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(registered.family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontWeight(registered.weight));
        builder.push_default(parley::style::StyleProperty::FontStyle(registered.style));
        builder.push_default(parley::style::StyleProperty::FontWidth(registered.width));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text.rs"]
mod tests;
