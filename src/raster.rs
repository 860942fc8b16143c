//! CPU painting primitives for the strip canvas.
//!
//! Coordinates are canvas pixels as `f32`; a pixel is painted when its centre
//! falls inside the shape. Everything clips against the image bounds.

use image::{imageops, imageops::FilterType, Rgba, RgbaImage};

pub type Color = Rgba<u8>;

pub const WHITE: Color = Rgba([255, 255, 255, 255]);

pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Rgba([r, g, b, 255])
}

/// Colour with a fractional alpha, the way canvas `rgba()` strings read.
pub fn rgba(r: u8, g: u8, b: u8, alpha: f32) -> Color {
    Rgba([r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8])
}

fn lerp(a: f32, b: f32, u: f32) -> f32 {
    a + (b - a) * u
}

/// Source-over blend of `src` onto `dst`.
pub fn blend(dst: &mut Color, src: Color) {
    let sa = src[3] as f32 / 255.0;
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    for c in 0..3 {
        let s = src[c] as f32 * sa;
        let d = dst[c] as f32 * da * (1.0 - sa);
        dst[c] = ((s + d) / out_a).round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

/// Blends `color` at a pixel, scaling its alpha by `coverage` (0..1).
pub fn blend_at(img: &mut RgbaImage, x: i64, y: i64, color: Color, coverage: f32) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 {
        return;
    }
    let alpha = (color[3] as f32 * coverage.clamp(0.0, 1.0)).round() as u8;
    let src = Rgba([color[0], color[1], color[2], alpha]);
    blend(img.get_pixel_mut(x as u32, y as u32), src);
}

pub fn fill(img: &mut RgbaImage, color: Color) {
    for px in img.pixels_mut() {
        *px = color;
    }
}

/// Pixel span `[start, end)` whose centres lie inside `[from, to)`, clipped.
fn span(from: f32, to: f32, limit: u32) -> (u32, u32) {
    let start = (from - 0.5).ceil().max(0.0) as u32;
    let end = ((to - 0.5).ceil().max(0.0) as u32).min(limit);
    (start.min(limit), end)
}

pub fn fill_rect(img: &mut RgbaImage, x: f32, y: f32, w: f32, h: f32, color: Color) {
    let (x0, x1) = span(x, x + w, img.width());
    let (y0, y1) = span(y, y + h, img.height());
    for py in y0..y1 {
        for px in x0..x1 {
            blend(img.get_pixel_mut(px, py), color);
        }
    }
}

/// Outline centred on the rectangle's edges.
pub fn stroke_rect(img: &mut RgbaImage, x: f32, y: f32, w: f32, h: f32, line: f32, color: Color) {
    let half = line / 2.0;
    fill_rect(img, x - half, y - half, w + line, line, color);
    fill_rect(img, x - half, y + h - half, w + line, line, color);
    fill_rect(img, x - half, y + half, line, h - line, color);
    fill_rect(img, x + w - half, y + half, line, h - line, color);
}

pub fn fill_circle(img: &mut RgbaImage, cx: f32, cy: f32, r: f32, color: Color) {
    if r <= 0.0 {
        return;
    }
    let r2 = r * r;
    let (x0, x1) = span(cx - r, cx + r, img.width());
    let (y0, y1) = span(cy - r, cy + r, img.height());
    for py in y0..y1 {
        for px in x0..x1 {
            let dx = px as f32 + 0.5 - cx;
            let dy = py as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 {
                blend(img.get_pixel_mut(px, py), color);
            }
        }
    }
}

/// Filled heart centred on `(cx, cy)`, `size` pixels wide.
pub fn fill_heart(img: &mut RgbaImage, cx: f32, cy: f32, size: f32, color: Color) {
    let half = size / 2.0;
    let (x0, x1) = span(cx - half, cx + half, img.width());
    let (y0, y1) = span(cy - half, cy + half, img.height());
    for py in y0..y1 {
        for px in x0..x1 {
            // Implicit heart curve in a [-1.3, 1.3] box, y pointing up.
            let u = (px as f32 + 0.5 - cx) / half * 1.3;
            let v = -(py as f32 + 0.5 - cy) / half * 1.3 + 0.2;
            let a = u * u + v * v - 1.0;
            if a * a * a - u * u * v * v * v <= 0.0 {
                blend(img.get_pixel_mut(px, py), color);
            }
        }
    }
}

/// Axis-aligned filled triangle pointing up, used by pattern themes.
pub fn fill_triangle(img: &mut RgbaImage, cx: f32, cy: f32, size: f32, color: Color) {
    let half = size / 2.0;
    let (x0, x1) = span(cx - half, cx + half, img.width());
    let (y0, y1) = span(cy - half, cy + half, img.height());
    for py in y0..y1 {
        let t = (py as f32 + 0.5 - (cy - half)) / size;
        let reach = half * t;
        for px in x0..x1 {
            if (px as f32 + 0.5 - cx).abs() <= reach {
                blend(img.get_pixel_mut(px, py), color);
            }
        }
    }
}

/// Gradient stop list sampled at `t`, stops sorted by position.
fn sample_stops(stops: &[(f32, Color)], t: f32) -> Color {
    let Some(&(_, first)) = stops.first() else {
        return WHITE;
    };
    let mut prev = (stops[0].0, first);
    if t <= prev.0 {
        return first;
    }
    for &(pos, color) in &stops[1..] {
        if t <= pos {
            let span = (pos - prev.0).max(1e-4);
            let u = ((t - prev.0) / span).clamp(0.0, 1.0);
            return Rgba([
                lerp(prev.1[0] as f32, color[0] as f32, u).round() as u8,
                lerp(prev.1[1] as f32, color[1] as f32, u).round() as u8,
                lerp(prev.1[2] as f32, color[2] as f32, u).round() as u8,
                lerp(prev.1[3] as f32, color[3] as f32, u).round() as u8,
            ]);
        }
        prev = (pos, color);
    }
    prev.1
}

/// Paints a linear gradient running from `from` to `to` over the whole canvas.
pub fn linear_gradient(img: &mut RgbaImage, from: (f32, f32), to: (f32, f32), stops: &[(f32, Color)]) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len2 = (dx * dx + dy * dy).max(1e-6);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let (ox, oy) = (x as f32 + 0.5 - from.0, y as f32 + 0.5 - from.1);
        let t = ((ox * dx + oy * dy) / len2).clamp(0.0, 1.0);
        *px = WHITE;
        blend(px, sample_stops(stops, t));
    }
}

/// Paints a radial gradient centred on `center` reaching `radius`.
pub fn radial_gradient(img: &mut RgbaImage, center: (f32, f32), radius: f32, stops: &[(f32, Color)]) {
    let radius = radius.max(1e-3);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let d = (x as f32 + 0.5 - center.0).hypot(y as f32 + 0.5 - center.1);
        *px = WHITE;
        blend(px, sample_stops(stops, (d / radius).clamp(0.0, 1.0)));
    }
}

/// Draws `src` scaled into the `w`×`h` box at `(x, y)`.
pub fn draw_image(img: &mut RgbaImage, src: &RgbaImage, x: f32, y: f32, w: f32, h: f32) {
    let (w, h) = (w.round().max(1.0) as u32, h.round().max(1.0) as u32);
    if src.width() == w && src.height() == h {
        imageops::overlay(img, src, x.round() as i64, y.round() as i64);
    } else {
        let scaled = imageops::resize(src, w, h, FilterType::Triangle);
        imageops::overlay(img, &scaled, x.round() as i64, y.round() as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rect_clips_to_canvas() {
        let mut img = RgbaImage::from_pixel(10, 10, WHITE);
        fill_rect(&mut img, -5.0, -5.0, 8.0, 8.0, rgb(0, 0, 0));
        assert_eq!(*img.get_pixel(2, 2), rgb(0, 0, 0));
        assert_eq!(*img.get_pixel(3, 3), WHITE);
    }

    #[test]
    fn translucent_fill_blends() {
        let mut img = RgbaImage::from_pixel(1, 1, rgb(0, 0, 0));
        fill_rect(&mut img, 0.0, 0.0, 1.0, 1.0, rgba(255, 255, 255, 0.5));
        let px = img.get_pixel(0, 0);
        assert!((126..=129).contains(&px[0]));
        assert_eq!(px[3], 255);
    }

    #[test]
    fn gradient_hits_its_end_stops() {
        let mut img = RgbaImage::new(100, 1);
        linear_gradient(
            &mut img,
            (0.0, 0.0),
            (100.0, 0.0),
            &[(0.0, rgb(0, 0, 0)), (1.0, rgb(200, 100, 0))],
        );
        assert!(img.get_pixel(0, 0)[0] < 5);
        assert!(img.get_pixel(99, 0)[0] > 195);
    }

    #[test]
    fn stroke_leaves_interior_untouched() {
        let mut img = RgbaImage::from_pixel(20, 20, WHITE);
        stroke_rect(&mut img, 5.0, 5.0, 10.0, 10.0, 1.0, rgb(0, 0, 0));
        assert_eq!(*img.get_pixel(4, 10), rgb(0, 0, 0));
        assert_eq!(*img.get_pixel(10, 10), WHITE);
    }

    #[test]
    fn draw_image_scales_into_box() {
        let mut img = RgbaImage::from_pixel(40, 40, WHITE);
        let src = RgbaImage::from_pixel(4, 4, rgb(10, 20, 30));
        draw_image(&mut img, &src, 10.0, 10.0, 20.0, 10.0);
        assert_eq!(*img.get_pixel(15, 15), rgb(10, 20, 30));
        assert_eq!(*img.get_pixel(15, 25), WHITE);
    }
}
