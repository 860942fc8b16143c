//! VHS look: chromatic shift, green boost, luminance noise, scanlines and a
//! burned-in timestamp.

use image::{Rgba, RgbaImage};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::filter::ColorFilter;
use crate::{
    raster::{fill_rect, rgba, WHITE},
    text::{Align, FontSpec, TextPainter},
};

/// Colour grade applied before the pixel effect while VHS is active.
pub const VHS_GRADE: &str = "contrast(1.3) brightness(1.1) saturate(1.4) hue-rotate(2deg)";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VhsParams {
    /// Horizontal red/blue offset in pixels.
    pub offset: u32,
    pub green_gain: f32,
    /// Chance per pixel of receiving noise.
    pub noise_probability: f32,
    /// Noise spans `[-amplitude/2, amplitude/2)`.
    pub noise_amplitude: f32,
    pub scanlines: bool,
    pub timestamp: bool,
}

impl Default for VhsParams {
    fn default() -> Self {
        Self {
            offset: 3,
            green_gain: 1.1,
            noise_probability: 0.1,
            noise_amplitude: 20.0,
            scanlines: true,
            timestamp: true,
        }
    }
}

/// Produces the transformed copy of `frame`. Red is read `offset` pixels to
/// the left and blue `offset` pixels to the right (clamped at the edges),
/// always from the untouched input.
pub fn chromatic_shift<R: Rng + ?Sized>(frame: &RgbaImage, params: &VhsParams, rng: &mut R) -> RgbaImage {
    let (w, h) = frame.dimensions();
    let mut out = RgbaImage::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }
    let offset = params.offset;
    for y in 0..h {
        for x in 0..w {
            let src = frame.get_pixel(x, y);
            let red = frame.get_pixel(x.saturating_sub(offset), y)[0];
            let blue = frame.get_pixel((x + offset).min(w - 1), y)[2];
            let green = (src[1] as f32 * params.green_gain).round().min(255.0) as u8;
            let mut px = [red, green, blue];
            if params.noise_probability > 0.0 && rng.gen::<f32>() < params.noise_probability {
                let noise = (rng.gen::<f32>() - 0.5) * params.noise_amplitude;
                px = px.map(|c| (c as f32 + noise).round().clamp(0.0, 255.0) as u8);
            }
            out.put_pixel(x, y, Rgba([px[0], px[1], px[2], src[3]]));
        }
    }
    out
}

/// Darkens every other row, starting with the first.
fn paint_scanlines(img: &mut RgbaImage) {
    let shade = rgba(0, 0, 0, 0.2);
    let w = img.width() as f32;
    for y in (0..img.height()).step_by(2) {
        fill_rect(img, 0.0, y as f32, w, 1.0, shade);
    }
}

fn paint_timestamp(img: &mut RgbaImage, label: &str, text: &TextPainter) {
    if !text.is_available() {
        return;
    }
    let spec = FontSpec::bold(14.0);
    let width = text.measure(label, spec);
    let x = img.width() as f32 - width - 24.0;
    fill_rect(img, x - 8.0, 15.0, width + 16.0, 22.0, rgba(0, 0, 0, 0.7));
    text.draw(img, label, x, 31.0, spec, WHITE, Align::Left);
}

/// Overlays created when the effect starts; dropped as a unit on stop.
#[derive(Debug)]
struct Overlays {
    scanlines: bool,
    timestamp: Option<String>,
}

/// Per-frame VHS effect. Idle until [`EffectLoop::start`]; after
/// [`EffectLoop::stop`] frames pass through untouched.
#[derive(Debug)]
pub struct EffectLoop {
    params: VhsParams,
    grade: ColorFilter,
    overlays: Option<Overlays>,
    frames: u64,
}

impl EffectLoop {
    pub fn new(params: VhsParams) -> Self {
        Self {
            params,
            grade: ColorFilter::identity(),
            overlays: None,
            frames: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.overlays.is_some()
    }

    pub fn start(&mut self) {
        if self.is_active() {
            return;
        }
        self.grade = VHS_GRADE.parse().unwrap_or_default();
        let timestamp = self
            .params
            .timestamp
            .then(|| chrono::Local::now().format("%b %d %Y %H:%M").to_string());
        self.overlays = Some(Overlays {
            scanlines: self.params.scanlines,
            timestamp,
        });
        self.frames = 0;
        log::info!("VHS effect started");
    }

    pub fn stop(&mut self) {
        if self.overlays.take().is_some() {
            self.grade = ColorFilter::identity();
            log::info!("VHS effect stopped after {} frames", self.frames);
        }
    }

    /// Transforms the most recent frame. Each call draws fresh noise.
    pub fn tick<R: Rng + ?Sized>(&mut self, frame: &RgbaImage, text: &TextPainter, rng: &mut R) -> RgbaImage {
        let Some(overlays) = &self.overlays else {
            return frame.clone();
        };
        let mut graded = frame.clone();
        self.grade.apply(&mut graded);
        let mut out = chromatic_shift(&graded, &self.params, rng);
        if overlays.scanlines {
            paint_scanlines(&mut out);
        }
        if let Some(label) = &overlays.timestamp {
            paint_timestamp(&mut out, label, text);
        }
        self.frames += 1;
        out
    }
}
