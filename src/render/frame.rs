use std::io::Cursor;

use anyhow::Context;

use crate::foundation::error::{ArtError, ArtResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;

/// One rendered frame.
///
/// `data` is row-major RGBA8. Surfaces produce premultiplied pixels; PNG encoding
/// converts back to straight alpha.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Premultiplied RGBA8 at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Straight-alpha copy of the pixel data.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut out);
        }
        out
    }
}

/// Encode `frame` as an RGBA PNG.
pub fn encode_png(frame: &FrameRGBA) -> ArtResult<Vec<u8>> {
    let expected = (frame.width as usize)
        .saturating_mul(frame.height as usize)
        .saturating_mul(4);
    if frame.data.len() != expected {
        return Err(ArtError::render(format!(
            "frame byte len {} does not match {}x{}",
            frame.data.len(),
            frame.width,
            frame.height
        )));
    }

    let straight = frame.to_straight_rgba8();
    let mut out = Cursor::new(Vec::new());
    image::write_buffer_with_format(
        &mut out,
        &straight,
        frame.width,
        frame.height,
        image::ExtendedColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .context("encode png")?;
    Ok(out.into_inner())
}

/// Decode PNG bytes back into a straight-alpha frame.
pub fn decode_png(bytes: &[u8]) -> ArtResult<FrameRGBA> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .context("decode png")?
        .to_rgba8();
    let (width, height) = img.dimensions();
    Ok(FrameRGBA {
        width,
        height,
        data: img.into_raw(),
        premultiplied: false,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
