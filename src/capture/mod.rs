//! Capture pipeline: live frame → colour filter or VHS effect → still image.

mod filter;
mod source;
mod vhs;

pub use filter::{filter_presets, ColorFilter};
pub use source::{DirectorySource, FrameSource, TestPattern};
pub use vhs::{EffectLoop, VhsParams};

use image::{imageops, imageops::FilterType, RgbaImage};
use rand::Rng;

use crate::{
    error::{CaptureError, FilterError},
    session::StillImage,
    text::TextPainter,
};

/// Used when the source reports zero dimensions.
pub const FALLBACK_SIZE: (u32, u32) = (640, 480);

#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    None,
    /// CSS-style chain, e.g. `contrast(1.3) brightness(1.1)`.
    Css(String),
    /// Animated VHS pixel effect with its colour grade and overlays.
    Vhs,
}

pub struct CapturePipeline {
    filter: ColorFilter,
    active: FilterSpec,
    effect: EffectLoop,
    text: TextPainter,
}

impl CapturePipeline {
    pub fn new(vhs: VhsParams, text: TextPainter) -> Self {
        Self {
            filter: ColorFilter::identity(),
            active: FilterSpec::None,
            effect: EffectLoop::new(vhs),
            text,
        }
    }

    pub fn active_filter(&self) -> &FilterSpec {
        &self.active
    }

    pub fn effect_active(&self) -> bool {
        self.effect.is_active()
    }

    /// Selects what subsequent previews and captures look like. Switching
    /// away from VHS cancels the effect loop and drops its overlays.
    pub fn apply_filter(&mut self, spec: FilterSpec) -> Result<(), FilterError> {
        match &spec {
            FilterSpec::None => {
                self.effect.stop();
                self.filter = ColorFilter::identity();
            }
            FilterSpec::Css(css) => {
                let parsed: ColorFilter = css.parse()?;
                self.effect.stop();
                self.filter = parsed;
            }
            FilterSpec::Vhs => {
                self.filter = ColorFilter::identity();
                self.effect.start();
            }
        }
        log::debug!("Filter set to {spec:?}");
        self.active = spec;
        Ok(())
    }

    /// Renders one frame the way the preview shows it.
    pub fn render<R: Rng + ?Sized>(&mut self, frame: &RgbaImage, rng: &mut R) -> RgbaImage {
        if self.effect.is_active() {
            return self.effect.tick(frame, &self.text, rng);
        }
        let mut out = frame.clone();
        self.filter.apply(&mut out);
        out
    }

    /// Snapshots the source with the active look baked in. `Ok(None)` when
    /// the source is not ready yet.
    pub fn capture_frame(&mut self, source: &mut dyn FrameSource) -> Result<Option<StillImage>, CaptureError> {
        self.capture_frame_with(source, &mut rand::thread_rng())
    }

    pub fn capture_frame_with<R: Rng + ?Sized>(
        &mut self,
        source: &mut dyn FrameSource,
        rng: &mut R,
    ) -> Result<Option<StillImage>, CaptureError> {
        if !source.is_ready() {
            log::debug!("Capture ignored: {} not ready", source.name());
            return Ok(None);
        }
        let Some(frame) = source.frame() else {
            return Ok(None);
        };
        let (w, h) = match source.dimensions() {
            (0, _) | (_, 0) => FALLBACK_SIZE,
            dims => dims,
        };
        let frame = if frame.dimensions() == (w, h) {
            frame
        } else {
            imageops::resize(&frame, w, h, FilterType::Triangle)
        };
        let rendered = self.render(&frame, rng);
        let still = StillImage::encode(&rendered)?;
        log::info!("Captured {w}x{h} frame ({} bytes)", still.len());
        Ok(Some(still))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use rand::{rngs::StdRng, SeedableRng};

    struct Unsized;

    impl FrameSource for Unsized {
        fn name(&self) -> &str {
            "unsized"
        }
        fn dimensions(&self) -> (u32, u32) {
            (0, 0)
        }
        fn is_ready(&self) -> bool {
            true
        }
        fn frame(&mut self) -> Option<RgbaImage> {
            Some(RgbaImage::from_pixel(32, 24, Rgba([9, 9, 9, 255])))
        }
    }

    struct Warming;

    impl FrameSource for Warming {
        fn name(&self) -> &str {
            "warming"
        }
        fn dimensions(&self) -> (u32, u32) {
            (0, 0)
        }
        fn is_ready(&self) -> bool {
            false
        }
        fn frame(&mut self) -> Option<RgbaImage> {
            panic!("frame requested before ready")
        }
    }

    fn pipeline() -> CapturePipeline {
        CapturePipeline::new(VhsParams::default(), TextPainter::none())
    }

    #[test]
    fn zero_dimensions_fall_back_to_640x480() {
        let still = pipeline().capture_frame(&mut Unsized).unwrap().unwrap();
        assert_eq!(still.decode().unwrap().dimensions(), FALLBACK_SIZE);
    }

    #[test]
    fn not_ready_source_is_a_noop() {
        assert!(pipeline().capture_frame(&mut Warming).unwrap().is_none());
    }

    #[test]
    fn css_filter_is_baked_into_capture() {
        let mut p = pipeline();
        p.apply_filter(FilterSpec::Css("brightness(2)".into())).unwrap();
        let mut source = TestPattern::new(70, 10);
        let still = p.capture_frame(&mut source).unwrap().unwrap();
        let img = still.decode().unwrap();
        // First bar is 192 gray; doubled and clamped.
        assert_eq!(img.get_pixel(0, 9)[0], 255);
    }

    #[test]
    fn bad_css_keeps_previous_filter() {
        let mut p = pipeline();
        p.apply_filter(FilterSpec::Css("contrast(2)".into())).unwrap();
        assert!(p.apply_filter(FilterSpec::Css("glow(1)".into())).is_err());
        assert_eq!(p.active_filter(), &FilterSpec::Css("contrast(2)".into()));
    }

    #[test]
    fn switching_away_from_vhs_cancels_effect() {
        let mut p = pipeline();
        p.apply_filter(FilterSpec::Vhs).unwrap();
        assert!(p.effect_active());
        let frame = RgbaImage::from_pixel(8, 8, Rgba([50, 50, 50, 255]));
        let mut rng = StdRng::seed_from_u64(5);
        assert_ne!(p.render(&frame, &mut rng), frame);

        p.apply_filter(FilterSpec::None).unwrap();
        assert!(!p.effect_active());
        assert_eq!(p.render(&frame, &mut rng), frame);
    }
}
