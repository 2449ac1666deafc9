use crate::foundation::core::{Affine, BlendMode, FontFace, Point, Rect, Rgba8, TextAlign};
use crate::foundation::error::{ArtError, ArtResult};
use crate::render::surface::{Dot, DrawingSurface, ImageDraw, TextDraw};

/// One captured surface call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    SetBlend(BlendMode),
    FillRect {
        rect: Rect,
        color: Rgba8,
        blend: BlendMode,
    },
    Image {
        /// Source image dimensions.
        source: (u32, u32),
        dest: Rect,
        transform: Affine,
        opacity: f32,
        blend: BlendMode,
    },
    Circle {
        center: Point,
        diameter: f64,
        color: Rgba8,
        blend: BlendMode,
    },
    Dots {
        color: Rgba8,
        blend: BlendMode,
        dots: Vec<Dot>,
    },
    Text {
        text: String,
        face: FontFace,
        size_px: f64,
        color: Rgba8,
        anchor: Point,
        align: TextAlign,
    },
    PushClip(Rect),
    PopClip,
}

/// Surface that records calls instead of rasterizing.
///
/// Used to inspect pipeline structure without fonts or pixels.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    blend: BlendMode,
    clip_depth: usize,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    pub fn clip_depth(&self) -> usize {
        self.clip_depth
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.blend = BlendMode::Normal;
        self.clip_depth = 0;
    }

    /// Dot batches in draw order, with their color and blend mode.
    pub fn dot_layers(&self) -> Vec<(Rgba8, BlendMode, &[Dot])> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Dots { color, blend, dots } => Some((*color, *blend, dots.as_slice())),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl DrawingSurface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba8) -> ArtResult<()> {
        self.commands.push(DrawCommand::FillRect {
            rect,
            color,
            blend: self.blend,
        });
        Ok(())
    }

    fn draw_image(&mut self, draw: &ImageDraw<'_>) -> ArtResult<()> {
        self.commands.push(DrawCommand::Image {
            source: (draw.image.width, draw.image.height),
            dest: draw.dest,
            transform: draw.transform,
            opacity: draw.opacity,
            blend: self.blend,
        });
        Ok(())
    }

    fn draw_circle(&mut self, center: Point, diameter: f64, color: Rgba8) -> ArtResult<()> {
        self.commands.push(DrawCommand::Circle {
            center,
            diameter,
            color,
            blend: self.blend,
        });
        Ok(())
    }

    fn draw_dots(&mut self, dots: &[Dot], color: Rgba8) -> ArtResult<()> {
        self.commands.push(DrawCommand::Dots {
            color,
            blend: self.blend,
            dots: dots.to_vec(),
        });
        Ok(())
    }

    fn draw_text(&mut self, draw: &TextDraw<'_>) -> ArtResult<()> {
        self.commands.push(DrawCommand::Text {
            text: draw.text.to_string(),
            face: draw.face,
            size_px: draw.size_px,
            color: draw.color,
            anchor: draw.anchor,
            align: draw.align,
        });
        Ok(())
    }

    fn push_clip_rect(&mut self, rect: Rect) -> ArtResult<()> {
        self.clip_depth += 1;
        self.commands.push(DrawCommand::PushClip(rect));
        Ok(())
    }

    fn pop_clip(&mut self) -> ArtResult<()> {
        if self.clip_depth == 0 {
            return Err(ArtError::render("pop_clip without matching push_clip_rect"));
        }
        self.clip_depth -= 1;
        self.commands.push(DrawCommand::PopClip);
        Ok(())
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
        self.commands.push(DrawCommand::SetBlend(mode));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/recording.rs"]
mod tests;
