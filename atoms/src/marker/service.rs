use crate::sessions::model::InputFieldRegion;
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{DynamicImage, Rgba, RgbaImage};
use mirage_shared::{ApiError, EncodedImage};
use std::io::Cursor;

// Same saturated red the click overlay uses, so history thumbnails and live
// markers agree.
const MARKER_FILL: Rgba<u8> = Rgba([239, 68, 68, 255]);
const MARKER_OUTLINE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const MARKER_SHADOW: Rgba<u8> = Rgba([0, 0, 0, 80]);

const TEXT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const TEXT_BACKING: Rgba<u8> = Rgba([255, 255, 255, 230]);

/// Burns a click marker into a copy of `image` at the given percentage
/// coordinates (0-100 of the image's own decoded dimensions, so the marker
/// lands where the user clicked regardless of how the client scaled the
/// image). Pure and deterministic; the input is never mutated.
pub fn annotate(
    image: &EncodedImage,
    x_percent: f64,
    y_percent: f64,
) -> Result<EncodedImage, ApiError> {
    let decoded = image::load_from_memory(&image.bytes)
        .map_err(|e| ApiError::InvalidImage(format!("failed to decode image: {}", e)))?;
    let mut canvas = decoded.to_rgba8();
    let (width, height) = canvas.dimensions();

    let cx = x_percent.clamp(0.0, 100.0) / 100.0 * f64::from(width);
    let cy = y_percent.clamp(0.0, 100.0) / 100.0 * f64::from(height);

    let radius = marker_radius(width, height);
    let outline = (radius * 0.3).round().max(2.0);
    let shadow_offset = (radius * 0.25).max(1.5);

    // Shadow first, then the white ring, then the fill.
    draw_disc(
        &mut canvas,
        cx + shadow_offset,
        cy + shadow_offset,
        radius + outline,
        MARKER_SHADOW,
    );
    draw_disc(&mut canvas, cx, cy, radius + outline, MARKER_OUTLINE);
    draw_disc(&mut canvas, cx, cy, radius, MARKER_FILL);

    encode_png(canvas)
}

/// Overlays user-typed text onto a detected input region so the submitted
/// image shows the field as filled in: a translucent white backing box with
/// black bitmap text scaled to the region height.
pub fn overlay_input_text(
    image: &EncodedImage,
    region: &InputFieldRegion,
    text: &str,
) -> Result<EncodedImage, ApiError> {
    if text.trim().is_empty() {
        return Ok(image.clone());
    }

    let decoded = image::load_from_memory(&image.bytes)
        .map_err(|e| ApiError::InvalidImage(format!("failed to decode image: {}", e)))?;
    let mut canvas = decoded.to_rgba8();
    let (width, height) = canvas.dimensions();

    let region_h = (region.height * f64::from(height)).max(8.0);
    let glyph_scale = ((region_h * 0.6 / 8.0).round() as u32).max(1);
    let text_h = 8 * glyph_scale;
    let text_w = 8 * glyph_scale * text.chars().count() as u32;

    // Left-aligned with a small inset, vertically centered in the region.
    let x = (region.x * f64::from(width)).round() as i32 + glyph_scale as i32;
    let y = (region.y * f64::from(height) + (region_h - f64::from(text_h)) / 2.0).round() as i32;

    let pad = glyph_scale as i32;
    fill_rect(
        &mut canvas,
        x - pad,
        y - pad,
        x + text_w as i32 + pad,
        y + text_h as i32 + pad,
        TEXT_BACKING,
    );
    draw_bitmap_text(&mut canvas, x, y, text, TEXT_COLOR, glyph_scale);

    encode_png(canvas)
}

/// Marker radius: a fraction of the smaller dimension, floored so the dot
/// stays visible on small images.
fn marker_radius(width: u32, height: u32) -> f64 {
    (f64::from(width.min(height)) / 100.0).max(6.0)
}

fn encode_png(canvas: RgbaImage) -> Result<EncodedImage, ApiError> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
        .map_err(|e| ApiError::InvalidImage(format!("failed to encode image: {}", e)))?;
    Ok(EncodedImage::png(buf))
}

fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = f64::from(src[3]) / 255.0;
    if a <= 0.0 {
        return dst;
    }
    let inv = 1.0 - a;
    let channel = |d: u8, s: u8| {
        (f64::from(d) * inv + f64::from(s) * a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(dst[0], src[0]),
        channel(dst[1], src[1]),
        channel(dst[2], src[2]),
        255,
    ])
}

fn draw_disc(img: &mut RgbaImage, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
    let min_x = ((cx - radius).floor() as i64).max(0) as u32;
    let max_x = ((cx + radius).ceil() as i64).min(i64::from(img.width()) - 1).max(0) as u32;
    let min_y = ((cy - radius).floor() as i64).max(0) as u32;
    let max_y = ((cy + radius).ceil() as i64).min(i64::from(img.height()) - 1).max(0) as u32;
    let r2 = radius * radius;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = f64::from(x) - cx;
            let dy = f64::from(y) - cy;
            if dx * dx + dy * dy <= r2 {
                let dst = *img.get_pixel(x, y);
                img.put_pixel(x, y, blend_pixel(dst, color));
            }
        }
    }
}

fn fill_rect(img: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba<u8>) {
    let min_x = x0.max(0) as u32;
    let min_y = y0.max(0) as u32;
    let max_x = (x1.min(img.width() as i32)).max(0) as u32;
    let max_y = (y1.min(img.height() as i32)).max(0) as u32;
    for y in min_y..max_y {
        for x in min_x..max_x {
            let dst = *img.get_pixel(x, y);
            img.put_pixel(x, y, blend_pixel(dst, color));
        }
    }
}

fn draw_bitmap_text(img: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>, scale: u32) {
    let scale = scale.max(1) as i32;
    let mut cursor_x = x;
    for ch in text.chars() {
        let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            cursor_x += 8 * scale;
            continue;
        };
        for (row_idx, row) in glyph.iter().enumerate() {
            for col_idx in 0..8 {
                if (row >> col_idx) & 1 == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        let px = cursor_x + col_idx * scale + sx;
                        let py = y + row_idx as i32 * scale + sy;
                        if px >= 0
                            && py >= 0
                            && px < img.width() as i32
                            && py < img.height() as i32
                        {
                            let dst = *img.get_pixel(px as u32, py as u32);
                            img.put_pixel(px as u32, py as u32, blend_pixel(dst, color));
                        }
                    }
                }
            }
        }
        cursor_x += 8 * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_image(width: u32, height: u32) -> EncodedImage {
        let canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        encode_png(canvas).unwrap()
    }

    fn pixel_at(image: &EncodedImage, x: u32, y: u32) -> Rgba<u8> {
        let decoded = image::load_from_memory(&image.bytes).unwrap().to_rgba8();
        *decoded.get_pixel(x, y)
    }

    fn is_marker_red(p: Rgba<u8>) -> bool {
        p[0] > 200 && p[1] < 120 && p[2] < 120
    }

    #[test]
    fn annotate_preserves_dimensions_and_marks_the_click() {
        let input = white_image(200, 100);
        let out = annotate(&input, 50.0, 50.0).unwrap();
        let decoded = image::load_from_memory(&out.bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (200, 100));
        // Center of the marker at (100, 50)
        assert!(is_marker_red(*decoded.get_pixel(100, 50)));
        // Far corner untouched
        assert_eq!(*decoded.get_pixel(5, 5), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn annotate_uses_decoded_dimensions_not_an_assumed_canvas() {
        // A non-square image: 25% horizontally is pixel 100 of 400, not 25 of 100.
        let input = white_image(400, 100);
        let out = annotate(&input, 25.0, 50.0).unwrap();
        assert!(is_marker_red(pixel_at(&out, 100, 50)));
        assert!(!is_marker_red(pixel_at(&out, 25, 50)));
    }

    #[test]
    fn annotate_is_deterministic_and_leaves_the_input_alone() {
        let input = white_image(64, 64);
        let before = input.bytes.clone();
        let a = annotate(&input, 30.0, 70.0).unwrap();
        let b = annotate(&input, 30.0, 70.0).unwrap();
        assert_eq!(a.bytes, b.bytes);
        assert_eq!(input.bytes, before);
        assert_ne!(a.bytes, input.bytes);
    }

    #[test]
    fn corner_clicks_clamp_without_panicking() {
        let input = white_image(64, 64);
        for (x, y) in [(0.0, 0.0), (100.0, 100.0), (-5.0, 120.0)] {
            let out = annotate(&input, x, y).unwrap();
            let decoded = image::load_from_memory(&out.bytes).unwrap().to_rgba8();
            assert_eq!(decoded.dimensions(), (64, 64));
        }
        // Marker visible at the clamped corner
        let out = annotate(&input, 0.0, 0.0).unwrap();
        assert!(is_marker_red(pixel_at(&out, 0, 0)));
    }

    #[test]
    fn small_images_still_get_a_visible_marker() {
        let input = white_image(32, 32);
        let out = annotate(&input, 50.0, 50.0).unwrap();
        // Floor radius keeps the dot at least a few pixels wide
        assert!(is_marker_red(pixel_at(&out, 16, 16)));
        assert!(is_marker_red(pixel_at(&out, 13, 16)));
    }

    #[test]
    fn overlay_input_text_paints_inside_the_region() {
        let input = white_image(200, 100);
        let region = InputFieldRegion {
            x: 0.25,
            y: 0.2,
            width: 0.5,
            height: 0.2,
            label: "Search box".to_string(),
            field_type: "search".to_string(),
        };
        let out = overlay_input_text(&input, &region, "cats").unwrap();
        let decoded = image::load_from_memory(&out.bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (200, 100));
        // Some black glyph pixel must exist inside the region box
        let found_text = (50..150).any(|x| {
            (20..40).any(|y| {
                let p = *decoded.get_pixel(x, y);
                p[0] < 60 && p[1] < 60 && p[2] < 60
            })
        });
        assert!(found_text);
    }

    #[test]
    fn overlay_with_blank_text_is_a_no_op() {
        let input = white_image(64, 64);
        let region = InputFieldRegion {
            x: 0.1,
            y: 0.1,
            width: 0.5,
            height: 0.1,
            label: "Email".to_string(),
            field_type: "email".to_string(),
        };
        let out = overlay_input_text(&input, &region, "   ").unwrap();
        assert_eq!(out.bytes, input.bytes);
    }
}
