use std::collections::HashMap;
use std::sync::Arc;

use vello_cpu::kurbo::Shape;

use crate::assets::decode::PreparedImage;
use crate::assets::text::{FontSet, TextBrushRgba8, TextLayoutEngine};
use crate::foundation::core::{Affine, BlendMode, Point, Rect, Rgba8, TextAlign};
use crate::foundation::error::{ArtError, ArtResult};
use crate::render::frame::FrameRGBA;
use crate::render::surface::{Dot, DrawingSurface, ImageDraw, TextDraw};

const PATH_TOLERANCE: f64 = 0.1;

/// Raster [`DrawingSurface`] backed by `vello_cpu`.
///
/// Commands for a pass are recorded into one render context and rasterized by
/// [`CpuSurface::finish`]. Call [`CpuSurface::reset`] before drawing the next frame.
pub struct CpuSurface {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    blend: BlendMode,
    clip_depth: usize,
    fonts: FontSet,
    text: TextLayoutEngine,
    // Keyed by the shaped font's blob id and face index.
    font_cache: HashMap<(u64, u32), vello_cpu::peniko::FontData>,
    // Keyed by pixel buffer address; the Arc keeps the address alive.
    image_cache: HashMap<usize, (Arc<Vec<u8>>, vello_cpu::Image)>,
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("blend", &self.blend)
            .field("clip_depth", &self.clip_depth)
            .finish_non_exhaustive()
    }
}

impl CpuSurface {
    pub fn new(width: u32, height: u32, fonts: FontSet) -> ArtResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| ArtError::render("surface width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| ArtError::render("surface height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(ArtError::render("surface width/height must be > 0"));
        }
        Ok(Self {
            width: w,
            height: h,
            ctx: vello_cpu::RenderContext::new(w, h),
            blend: BlendMode::Normal,
            clip_depth: 0,
            fonts,
            text: TextLayoutEngine::new(),
            font_cache: HashMap::new(),
            image_cache: HashMap::new(),
        })
    }

    /// Drop recorded commands. Font and image caches survive.
    pub fn reset(&mut self) {
        self.ctx = vello_cpu::RenderContext::new(self.width, self.height);
        self.blend = BlendMode::Normal;
        self.clip_depth = 0;
    }

    /// Rasterize everything recorded since the last reset.
    pub fn finish(&mut self) -> ArtResult<FrameRGBA> {
        if self.clip_depth != 0 {
            return Err(ArtError::render(format!(
                "{} clip layer(s) still open at finish",
                self.clip_depth
            )));
        }
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        Ok(FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn begin_draw(&mut self, transform: Affine) {
        self.ctx.set_blend_mode(blend_to_cpu(self.blend));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(affine_to_cpu(transform));
    }

    fn image_paint_for(&mut self, image: &PreparedImage) -> ArtResult<vello_cpu::Image> {
        let key = Arc::as_ptr(&image.rgba8_premul) as usize;
        if let Some((_, paint)) = self.image_cache.get(&key) {
            return Ok(paint.clone());
        }
        let pixmap = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.image_cache
            .insert(key, (image.rgba8_premul.clone(), paint.clone()));
        Ok(paint)
    }

    /// Paint font for a glyph run: the exact face Parley shaped it with.
    fn font_for_run(&mut self, blob_id: u64, bytes: &[u8], index: u32) -> vello_cpu::peniko::FontData {
        self.font_cache
            .entry((blob_id, index))
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes.to_vec()), index)
            })
            .clone()
    }
}

impl DrawingSurface for CpuSurface {
    fn size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba8) -> ArtResult<()> {
        self.begin_draw(Affine::IDENTITY);
        self.ctx.set_paint(color_to_cpu(color));
        self.ctx.fill_rect(&rect_to_cpu(rect));
        Ok(())
    }

    fn draw_image(&mut self, draw: &ImageDraw<'_>) -> ArtResult<()> {
        let img = draw.image;
        if img.width == 0 || img.height == 0 {
            return Err(ArtError::render("cannot draw an empty image"));
        }
        let iw = f64::from(img.width);
        let ih = f64::from(img.height);
        let paint = self.image_paint_for(img)?;

        let tr = draw.transform
            * Affine::translate((draw.dest.x0, draw.dest.y0))
            * Affine::scale_non_uniform(draw.dest.width() / iw, draw.dest.height() / ih);
        self.begin_draw(tr);
        self.ctx.set_paint(paint);

        let opacity = draw.opacity.clamp(0.0, 1.0);
        if opacity < 1.0 {
            self.ctx.push_opacity_layer(opacity);
        }
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
        if opacity < 1.0 {
            self.ctx.pop_layer();
        }
        Ok(())
    }

    fn draw_circle(&mut self, center: Point, diameter: f64, color: Rgba8) -> ArtResult<()> {
        self.draw_dots(&[Dot { center, diameter }], color)
    }

    fn draw_dots(&mut self, dots: &[Dot], color: Rgba8) -> ArtResult<()> {
        self.begin_draw(Affine::IDENTITY);
        self.ctx.set_paint(color_to_cpu(color));
        for dot in dots {
            // Zero-size dots leave no mark.
            if dot.diameter <= 0.0 || !dot.diameter.is_finite() {
                continue;
            }
            let circle = vello_cpu::kurbo::Circle::new(
                vello_cpu::kurbo::Point::new(dot.center.x, dot.center.y),
                dot.diameter / 2.0,
            );
            self.ctx.fill_path(&circle.to_path(PATH_TOLERANCE));
        }
        Ok(())
    }

    fn draw_text(&mut self, draw: &TextDraw<'_>) -> ArtResult<()> {
        if draw.text.is_empty() {
            return Ok(());
        }
        let font_bytes = self.fonts.get(draw.face)?.clone();
        let brush = TextBrushRgba8 {
            r: draw.color.r,
            g: draw.color.g,
            b: draw.color.b,
            a: draw.color.a,
        };
        let layout =
            self.text
                .layout_line(draw.text, draw.face, &font_bytes, draw.size_px as f32, brush)?;

        let width = f64::from(layout.width());
        let baseline = layout
            .lines()
            .next()
            .map(|l| f64::from(l.metrics().baseline))
            .unwrap_or(0.0);
        let x0 = match draw.align {
            TextAlign::Left => draw.anchor.x,
            TextAlign::Center => draw.anchor.x - width / 2.0,
            TextAlign::Right => draw.anchor.x - width,
        };
        self.begin_draw(Affine::translate((x0, draw.anchor.y - baseline)));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let shaped = run.run().font();
                let font = self.font_for_run(shaped.data.id(), shaped.data.data(), shaped.index);
                let brush = run.style().brush;
                self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        Ok(())
    }

    fn push_clip_rect(&mut self, rect: Rect) -> ArtResult<()> {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .push_clip_layer(&rect_to_cpu(rect).to_path(PATH_TOLERANCE));
        self.clip_depth += 1;
        Ok(())
    }

    fn pop_clip(&mut self) -> ArtResult<()> {
        if self.clip_depth == 0 {
            return Err(ArtError::render("pop_clip without matching push_clip_rect"));
        }
        self.ctx.pop_layer();
        self.clip_depth -= 1;
        Ok(())
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
    }
}

fn blend_to_cpu(mode: BlendMode) -> vello_cpu::peniko::BlendMode {
    use vello_cpu::peniko::{Compose, Mix};
    let mix = match mode {
        BlendMode::Normal => Mix::Normal,
        BlendMode::Multiply => Mix::Multiply,
        BlendMode::Darken => Mix::Darken,
    };
    vello_cpu::peniko::BlendMode::new(mix, Compose::SrcOver)
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

pub(crate) fn pixmap_from_premul_bytes(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> ArtResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ArtError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ArtError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(ArtError::render("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
