use super::*;
use crate::assets::text::PreparedFont;
use crate::foundation::core::FontFace;

fn surface(w: u32, h: u32) -> CpuSurface {
    CpuSurface::new(w, h, FontSet::empty()).unwrap()
}

#[test]
fn fill_rect_covers_pixels() {
    let mut s = surface(16, 16);
    s.fill_rect(Rect::new(0.0, 0.0, 16.0, 16.0), Rgba8::WHITE)
        .unwrap();
    s.fill_rect(Rect::new(4.0, 4.0, 12.0, 12.0), Rgba8::new(255, 0, 0, 255))
        .unwrap();
    let frame = s.finish().unwrap();
    assert_eq!((frame.width, frame.height), (16, 16));
    assert!(frame.premultiplied);
    assert_eq!(frame.pixel(0, 0), Some([255, 255, 255, 255]));
    assert_eq!(frame.pixel(8, 8), Some([255, 0, 0, 255]));
}

#[test]
fn dots_are_drawn_at_their_centers() {
    let mut s = surface(32, 32);
    s.draw_dots(
        &[
            Dot {
                center: Point::new(8.0, 8.0),
                diameter: 8.0,
            },
            Dot {
                center: Point::new(24.0, 24.0),
                diameter: 0.0,
            },
        ],
        Rgba8::BLACK,
    )
    .unwrap();
    let frame = s.finish().unwrap();
    assert_eq!(frame.pixel(8, 8).unwrap()[3], 255);
    assert_eq!(frame.pixel(24, 24).unwrap()[3], 0);
    assert_eq!(frame.pixel(0, 31).unwrap()[3], 0);
}

#[test]
fn images_are_stretched_into_dest() {
    let img = PreparedImage::solid(2, 2, [0, 0, 255, 255]).unwrap();
    let mut s = surface(20, 20);
    s.draw_image(&ImageDraw {
        image: &img,
        dest: Rect::new(5.0, 5.0, 15.0, 15.0),
        transform: Affine::IDENTITY,
        opacity: 1.0,
    })
    .unwrap();
    let frame = s.finish().unwrap();
    assert_eq!(frame.pixel(10, 10), Some([0, 0, 255, 255]));
    assert_eq!(frame.pixel(2, 2).unwrap()[3], 0);
    assert_eq!(frame.pixel(17, 17).unwrap()[3], 0);
}

#[test]
fn image_opacity_reduces_alpha() {
    let img = PreparedImage::solid(1, 1, [0, 0, 0, 255]).unwrap();
    let mut s = surface(8, 8);
    s.draw_image(&ImageDraw {
        image: &img,
        dest: Rect::new(0.0, 0.0, 8.0, 8.0),
        transform: Affine::IDENTITY,
        opacity: 0.5,
    })
    .unwrap();
    let a = s.finish().unwrap().pixel(4, 4).unwrap()[3];
    assert!((120..=136).contains(&a), "alpha {a}");
}

#[test]
fn clip_limits_drawing() {
    let mut s = surface(20, 20);
    s.push_clip_rect(Rect::new(0.0, 0.0, 10.0, 20.0)).unwrap();
    s.fill_rect(Rect::new(0.0, 0.0, 20.0, 20.0), Rgba8::BLACK)
        .unwrap();
    s.pop_clip().unwrap();
    let frame = s.finish().unwrap();
    assert_eq!(frame.pixel(5, 5).unwrap()[3], 255);
    assert_eq!(frame.pixel(15, 5).unwrap()[3], 0);
}

#[test]
fn unbalanced_clips_are_render_errors() {
    let mut s = surface(4, 4);
    assert!(matches!(s.pop_clip(), Err(ArtError::Render(_))));
    s.push_clip_rect(Rect::new(0.0, 0.0, 2.0, 2.0)).unwrap();
    assert!(matches!(s.finish(), Err(ArtError::Render(_))));
}

#[test]
fn reset_starts_a_blank_frame() {
    let mut s = surface(4, 4);
    s.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Rgba8::BLACK)
        .unwrap();
    let _ = s.finish().unwrap();
    s.reset();
    let frame = s.finish().unwrap();
    assert!(frame.data.iter().all(|b| *b == 0));
}

#[test]
fn text_without_font_is_an_asset_error() {
    let mut s = surface(64, 64);
    let err = s
        .draw_text(&TextDraw {
            text: "#42",
            face: FontFace::Display,
            size_px: 20.0,
            color: Rgba8::BLACK,
            anchor: Point::new(32.0, 32.0),
            align: TextAlign::Center,
        })
        .unwrap_err();
    assert!(matches!(err, ArtError::Asset(_)));
}

#[test]
fn oversized_surfaces_are_rejected() {
    assert!(CpuSurface::new(70_000, 10, FontSet::empty()).is_err());
    assert!(CpuSurface::new(0, 10, FontSet::empty()).is_err());
}

#[test]
fn text_renders_with_a_system_font() {
    let Some(font) = PreparedFont::system_fallback() else {
        return;
    };
    let mut s = CpuSurface::new(200, 60, FontSet::uniform(font)).unwrap();
    s.draw_text(&TextDraw {
        text: "Maverick",
        face: FontFace::Regular,
        size_px: 32.0,
        color: Rgba8::BLACK,
        anchor: Point::new(100.0, 40.0),
        align: TextAlign::Center,
    })
    .unwrap();
    let frame = s.finish().unwrap();
    let inked = frame.data.chunks_exact(4).filter(|p| p[3] > 0).count();
    assert!(inked > 0);
}

#[test]
fn same_family_faces_paint_differently() {
    let Some((regular, light)) = PreparedFont::system_family_pair() else {
        return;
    };
    let fonts = FontSet::empty()
        .with_face(FontFace::Regular, regular)
        .with_face(FontFace::Light, light);
    let paint = |face| {
        let mut s = CpuSurface::new(240, 60, fonts.clone()).unwrap();
        s.draw_text(&TextDraw {
            text: "Maverick",
            face,
            size_px: 32.0,
            color: Rgba8::BLACK,
            anchor: Point::new(120.0, 40.0),
            align: TextAlign::Center,
        })
        .unwrap();
        s.finish().unwrap()
    };
    assert_ne!(paint(FontFace::Regular).data, paint(FontFace::Light).data);
}
