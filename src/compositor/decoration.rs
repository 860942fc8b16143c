use std::{fmt, sync::Arc};

use image::RgbaImage;

use super::layout::Point;
use crate::{raster::Color, text::FontSpec};

/// Anything drawn on top of the photos. Kept in insertion order; the list is
/// append-only apart from clearing it wholesale.
#[derive(Clone, PartialEq)]
pub enum Decoration {
    /// An emoji or symbol, centred on `position`.
    Sticker { glyph: String, position: Point },
    /// Text centred horizontally on `position.x` with its baseline at `position.y`.
    Text {
        content: String,
        position: Point,
        color: Color,
        font: FontSpec,
    },
    /// A decoded picture with its top-left corner at `position`.
    Image {
        pixels: Arc<RgbaImage>,
        position: Point,
        size: (f32, f32),
    },
}

/// Glyph size for emoji stickers.
pub const STICKER_SIZE: f32 = 30.0;

/// Sticker palette shown on the edit screen.
pub const STICKER_GLYPHS: &[&str] = &[
    "😀", "😎", "🎊", "😍", "😜", "👑", "🎉", "🌟", "💖", "🌈", "🔥", "✨", "🐱", "🍕", "🎈", "🌸",
];

impl Decoration {
    pub fn kind(&self) -> &'static str {
        match self {
            Decoration::Sticker { .. } => "sticker",
            Decoration::Text { .. } => "text",
            Decoration::Image { .. } => "image",
        }
    }
}

impl fmt::Debug for Decoration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decoration::Sticker { glyph, position } => f
                .debug_struct("Sticker")
                .field("glyph", glyph)
                .field("position", position)
                .finish(),
            Decoration::Text {
                content, position, ..
            } => f
                .debug_struct("Text")
                .field("content", content)
                .field("position", position)
                .finish(),
            Decoration::Image {
                pixels,
                position,
                size,
            } => f
                .debug_struct("Image")
                .field("pixels", &pixels.dimensions())
                .field("position", position)
                .field("size", size)
                .finish(),
        }
    }
}
