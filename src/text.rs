//! Text rasterization for titles, date stamps and text/sticker decorations.

use std::{
    fs,
    path::{Path, PathBuf},
};

use ab_glyph::{point, Font, FontArc, Glyph, GlyphId, PxScale, ScaleFont};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    raster::{blend_at, Color},
};

/// Well-known locations tried when no font is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FontSpec {
    pub size_px: f32,
    pub bold: bool,
}

impl FontSpec {
    pub const fn bold(size_px: f32) -> Self {
        Self {
            size_px,
            bold: true,
        }
    }

    pub const fn regular(size_px: f32) -> Self {
        Self {
            size_px,
            bold: false,
        }
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        FontSpec::bold(24.0)
    }
}

/// Fonts bundled with egui, appended after the primary font so emoji and
/// symbols resolve even when the system text font lacks them.
const BUNDLED_FALLBACKS: &[&str] = &["NotoEmoji-Regular", "emoji-icon-font"];

/// Used as the primary font when neither the configured nor a system font loads.
const BUNDLED_TEXT: &str = "Ubuntu-Light";

/// Draws text through an ordered font chain. Each character uses the first
/// font that has a glyph for it; characters no font covers are skipped.
/// With an empty chain every call is a no-op.
#[derive(Clone, Default)]
pub struct TextPainter {
    fonts: Vec<FontArc>,
}

impl std::fmt::Debug for TextPainter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextPainter")
            .field("fonts", &self.fonts.len())
            .finish()
    }
}

fn bundled_font(name: &str) -> Option<FontArc> {
    let defs = egui::FontDefinitions::default();
    let data = defs.font_data.get(name)?;
    match FontArc::try_from_vec(data.font.to_vec()) {
        Ok(font) => Some(font),
        Err(err) => {
            log::warn!("Bundled font {name} unusable: {err}");
            None
        }
    }
}

impl TextPainter {
    pub fn none() -> Self {
        Self { fonts: Vec::new() }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read(path)?;
        let font = FontArc::try_from_vec(data).map_err(|e| ConfigError::Font {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self { fonts: vec![font] })
    }

    /// Only the fonts shipped with egui: a text face followed by the emoji faces.
    pub fn bundled() -> Self {
        Self::none().with_bundled_fallbacks(Some(BUNDLED_TEXT))
    }

    fn with_bundled_fallbacks(mut self, text_face: Option<&str>) -> Self {
        let names = text_face.into_iter().chain(BUNDLED_FALLBACKS.iter().copied());
        self.fonts.extend(names.filter_map(bundled_font));
        self
    }

    /// Loads the configured font, falling back to common system fonts and then
    /// to egui's bundled text face. egui's emoji faces always follow.
    pub fn discover(configured: Option<&Path>) -> Self {
        if let Some(path) = configured {
            match Self::from_file(path) {
                Ok(painter) => return painter.with_bundled_fallbacks(None),
                Err(err) => log::warn!("Configured font unusable: {err}"),
            }
        }
        for candidate in SYSTEM_FONTS.iter().map(PathBuf::from) {
            if candidate.exists() {
                if let Ok(painter) = Self::from_file(&candidate) {
                    log::debug!("Using system font {}", candidate.display());
                    return painter.with_bundled_fallbacks(None);
                }
            }
        }
        log::debug!("No system font found; using bundled {BUNDLED_TEXT}");
        let painter = Self::bundled();
        if !painter.is_available() {
            log::warn!("No usable font found; titles and text decorations will be skipped");
        }
        painter
    }

    pub fn is_available(&self) -> bool {
        !self.fonts.is_empty()
    }

    /// Index of the first font in the chain with a real glyph for `c`.
    fn font_for(&self, c: char) -> Option<usize> {
        self.fonts.iter().position(|f| f.glyph_id(c).0 != 0)
    }

    fn layout(&self, text: &str, spec: FontSpec, x: f32, baseline: f32) -> (Vec<(usize, Glyph)>, f32) {
        let scale = PxScale::from(spec.size_px);
        let mut caret = x;
        let mut last: Option<(usize, GlyphId)> = None;
        let mut glyphs = Vec::with_capacity(text.len());
        for c in text.chars().filter(|c| !c.is_control()) {
            let Some(index) = self.font_for(c) else {
                continue;
            };
            let scaled = self.fonts[index].as_scaled(scale);
            let mut glyph = scaled.scaled_glyph(c);
            if let Some((prev_font, prev)) = last {
                if prev_font == index {
                    caret += scaled.kern(prev, glyph.id);
                }
            }
            glyph.position = point(caret, baseline);
            caret += scaled.h_advance(glyph.id);
            last = Some((index, glyph.id));
            glyphs.push((index, glyph));
        }
        (glyphs, caret - x)
    }

    pub fn measure(&self, text: &str, spec: FontSpec) -> f32 {
        self.layout(text, spec, 0.0, 0.0).1
    }

    pub fn draw(
        &self,
        img: &mut RgbaImage,
        text: &str,
        x: f32,
        baseline: f32,
        spec: FontSpec,
        color: Color,
        align: Align,
    ) {
        if !self.is_available() {
            return;
        }
        let start = match align {
            Align::Left => x,
            Align::Center => x - self.measure(text, spec) / 2.0,
        };
        let (glyphs, _) = self.layout(text, spec, start, baseline);
        // Faux bold: a second pass nudged right.
        let passes: &[f32] = if spec.bold {
            &[0.0, (spec.size_px / 24.0).max(0.5)]
        } else {
            &[0.0]
        };
        for &dx in passes {
            for (index, glyph) in &glyphs {
                let mut glyph = glyph.clone();
                glyph.position.x += dx;
                if let Some(outlined) = self.fonts[*index].outline_glyph(glyph) {
                    let bounds = outlined.px_bounds();
                    outlined.draw(|gx, gy, coverage| {
                        blend_at(
                            img,
                            bounds.min.x as i64 + gx as i64,
                            bounds.min.y as i64 + gy as i64,
                            color,
                            coverage,
                        );
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compositor::STICKER_GLYPHS,
        raster::{rgb, WHITE},
    };

    #[test]
    fn painter_without_font_is_a_noop() {
        let painter = TextPainter::none();
        let mut img = RgbaImage::from_pixel(8, 8, WHITE);
        painter.draw(&mut img, "hi", 0.0, 6.0, FontSpec::bold(16.0), rgb(0, 0, 0), Align::Left);
        assert!(img.pixels().all(|p| *p == WHITE));
        assert_eq!(painter.measure("hi", FontSpec::default()), 0.0);
        assert!(!painter.is_available());
    }

    #[test]
    fn rejects_non_font_files() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), b"definitely not a font").unwrap();
        let err = TextPainter::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Font { .. }));
    }

    #[test]
    fn discover_falls_back_when_configured_font_missing() {
        let painter = TextPainter::discover(Some(Path::new("/nonexistent/font.ttf")));
        assert!(painter.is_available());
    }

    #[test]
    fn every_sticker_glyph_resolves_in_the_chain() {
        for painter in [TextPainter::bundled(), TextPainter::discover(None)] {
            let missing: Vec<_> = STICKER_GLYPHS
                .iter()
                .filter(|g| g.chars().any(|c| painter.font_for(c).is_none()))
                .collect();
            assert!(missing.is_empty(), "missing glyphs: {missing:?}");
        }
    }

    #[test]
    fn uncovered_characters_are_skipped() {
        let painter = TextPainter::bundled();
        let spec = FontSpec::regular(20.0);
        assert_eq!(painter.measure("\u{10FFFD}", spec), 0.0);
        assert_eq!(painter.measure("a\u{10FFFD}b", spec), painter.measure("ab", spec));

        let mut img = RgbaImage::from_pixel(16, 16, WHITE);
        painter.draw(&mut img, "\u{10FFFD}", 8.0, 12.0, spec, rgb(0, 0, 0), Align::Center);
        assert!(img.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn emoji_sticker_paints_pixels() {
        let painter = TextPainter::bundled();
        let mut img = RgbaImage::from_pixel(48, 48, WHITE);
        painter.draw(&mut img, "🎉", 24.0, 36.0, FontSpec::regular(30.0), rgb(0, 0, 0), Align::Center);
        assert!(img.pixels().any(|p| *p != WHITE));
    }
}
