//! Cosmetic image generation: placeholder logos and social preview cards.
//!
//! The raster implementation needs the `raster-images` feature; without it
//! every build falls back to [`MinimalComposer`], which writes a 1x1 PNG.

use anyhow::Result;

/// A 1x1 transparent PNG.
pub const BLANK_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x01, 0x63, 0x60, 0x60, 0x60, 0xF8,
    0x0F, 0x00, 0x01, 0x04, 0x01, 0x00, 0x02, 0x54, 0x82, 0x0D, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45,
    0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

pub const PLACEHOLDER_SIZE: u32 = 256;
pub const PREVIEW_WIDTH: u32 = 1200;
pub const PREVIEW_HEIGHT: u32 = 630;

pub trait ImageComposer {
    /// Square PNG standing in for a logo that could not be fetched.
    fn placeholder_logo(&self, label: &str) -> Result<Vec<u8>>;

    /// Social preview PNG; `background` is the raw bytes of a screenshot, if any.
    fn preview_card(&self, title: &str, background: Option<&[u8]>) -> Result<Vec<u8>>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MinimalComposer;

impl ImageComposer for MinimalComposer {
    fn placeholder_logo(&self, _label: &str) -> Result<Vec<u8>> {
        Ok(BLANK_PNG.to_vec())
    }

    fn preview_card(&self, _title: &str, background: Option<&[u8]>) -> Result<Vec<u8>> {
        Ok(background.unwrap_or(BLANK_PNG).to_vec())
    }

    fn name(&self) -> &'static str {
        "minimal"
    }
}

/// Up to two uppercase initials from `name`, or the start of `id` when the
/// name has no words.
pub fn initials(name: &str, id: &str) -> String {
    let from_name = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .collect::<String>()
        .to_uppercase();
    if !from_name.is_empty() {
        return from_name;
    }
    id.chars().take(2).collect::<String>().to_uppercase()
}

/// Best composer compiled into this build.
pub fn default_composer() -> Box<dyn ImageComposer> {
    #[cfg(feature = "raster-images")]
    {
        Box::new(RasterComposer)
    }
    #[cfg(not(feature = "raster-images"))]
    {
        Box::new(MinimalComposer)
    }
}

#[cfg(feature = "raster-images")]
pub use raster::RasterComposer;

#[cfg(feature = "raster-images")]
mod raster {
    use std::io::Cursor;

    use anyhow::{Context, Result};
    use image::imageops::{self, FilterType};
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut};
    use imageproc::rect::Rect;

    use super::{ImageComposer, PLACEHOLDER_SIZE, PREVIEW_HEIGHT, PREVIEW_WIDTH};

    const CANVAS: Rgba<u8> = Rgba([5, 9, 20, 255]);
    const DISC: Rgba<u8> = Rgba([17, 24, 53, 255]);
    const OVERLAY: Rgba<u8> = Rgba([5, 9, 25, 200]);
    const ACCENT: Rgba<u8> = Rgba([51, 255, 87, 255]);
    const TINTS: &[Rgba<u8>] = &[
        Rgba([51, 255, 87, 255]),
        Rgba([140, 255, 210, 255]),
        Rgba([236, 244, 255, 255]),
        Rgba([255, 196, 61, 255]),
        Rgba([120, 170, 255, 255]),
    ];
    const BACKGROUND_BLUR_SIGMA: f32 = 18.0;

    /// Draws with `image` + `imageproc`. No text is rendered.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct RasterComposer;

    impl ImageComposer for RasterComposer {
        fn placeholder_logo(&self, label: &str) -> Result<Vec<u8>> {
            let size = PLACEHOLDER_SIZE;
            let mut canvas = RgbaImage::from_pixel(size, size, CANVAS);
            let half = (size / 2) as i32;
            let center = (half, half);
            let tint = label_tint(label);

            draw_filled_circle_mut(&mut canvas, center, half, DISC);
            for inset in 24..30 {
                draw_hollow_circle_mut(&mut canvas, center, half - inset, tint);
            }
            draw_filled_circle_mut(&mut canvas, center, half / 4, tint);
            encode_png(canvas)
        }

        fn preview_card(&self, title: &str, background: Option<&[u8]>) -> Result<Vec<u8>> {
            let mut canvas = background
                .and_then(decode_background)
                .unwrap_or_else(|| RgbaImage::from_pixel(PREVIEW_WIDTH, PREVIEW_HEIGHT, CANVAS));
            let overlay = RgbaImage::from_pixel(PREVIEW_WIDTH, PREVIEW_HEIGHT, OVERLAY);
            imageops::overlay(&mut canvas, &overlay, 0, 0);

            let band_y = (PREVIEW_HEIGHT / 2) as i32 - 4;
            draw_filled_rect_mut(
                &mut canvas,
                Rect::at(80, band_y).of_size(PREVIEW_WIDTH - 160, 8),
                label_tint(title),
            );
            draw_filled_rect_mut(
                &mut canvas,
                Rect::at(0, (PREVIEW_HEIGHT - 12) as i32).of_size(PREVIEW_WIDTH, 12),
                ACCENT,
            );
            encode_png(canvas)
        }

        fn name(&self) -> &'static str {
            "raster"
        }
    }

    fn decode_background(bytes: &[u8]) -> Option<RgbaImage> {
        let decoded = match image::load_from_memory(bytes) {
            Ok(decoded) => decoded,
            Err(error) => {
                log::debug!("preview background is not a decodable image: {error}");
                return None;
            }
        };
        let filled = decoded.resize_to_fill(PREVIEW_WIDTH, PREVIEW_HEIGHT, FilterType::Lanczos3);
        Some(imageops::blur(&filled.to_rgba8(), BACKGROUND_BLUR_SIGMA))
    }

    fn label_tint(label: &str) -> Rgba<u8> {
        let sum = label.bytes().map(usize::from).sum::<usize>();
        TINTS[sum % TINTS.len()]
    }

    fn encode_png(canvas: RgbaImage) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .context("failed to encode PNG")?;
        Ok(bytes)
    }

    #[cfg(test)]
    mod tests {
        use super::{RasterComposer, label_tint};
        use crate::imaging::{ImageComposer, PLACEHOLDER_SIZE, PREVIEW_HEIGHT, PREVIEW_WIDTH};

        #[test]
        fn placeholder_logo_is_square_png() {
            let bytes = RasterComposer.placeholder_logo("AR").expect("placeholder");
            let decoded = image::load_from_memory(&bytes).expect("decode");
            assert_eq!(decoded.width(), PLACEHOLDER_SIZE);
            assert_eq!(decoded.height(), PLACEHOLDER_SIZE);
        }

        #[test]
        fn preview_card_survives_undecodable_background() {
            let bytes = RasterComposer
                .preview_card("Arch", Some(&b"not an image"[..]))
                .expect("preview");
            let decoded = image::load_from_memory(&bytes).expect("decode");
            assert_eq!(decoded.width(), PREVIEW_WIDTH);
            assert_eq!(decoded.height(), PREVIEW_HEIGHT);
        }

        #[test]
        fn preview_card_uses_small_background() {
            let background = RasterComposer.placeholder_logo("BG").expect("background");
            let bytes = RasterComposer
                .preview_card("Debian", Some(background.as_slice()))
                .expect("preview");
            let decoded = image::load_from_memory(&bytes).expect("decode");
            assert_eq!(decoded.width(), PREVIEW_WIDTH);
        }

        #[test]
        fn label_tint_is_stable() {
            assert_eq!(label_tint("UB"), label_tint("UB"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BLANK_PNG, ImageComposer, MinimalComposer, initials};

    #[test]
    fn initials_prefer_name_words() {
        assert_eq!(initials("Linux Mint", "mint"), "LM");
        assert_eq!(initials("elementary OS Next", "elementary"), "EO");
        assert_eq!(initials("Arch", "arch"), "A");
        assert_eq!(initials("   ", "void"), "VO");
    }

    #[test]
    fn minimal_composer_returns_blank_or_background() {
        let composer = MinimalComposer;
        assert_eq!(composer.placeholder_logo("XX").expect("logo"), BLANK_PNG);
        assert_eq!(composer.preview_card("X", None).expect("preview"), BLANK_PNG);
        assert_eq!(
            composer.preview_card("X", Some(&b"raw"[..])).expect("preview"),
            b"raw".to_vec()
        );
    }
}
