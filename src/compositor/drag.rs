//! Screen-space image stickers and their mapping onto the strip.

use std::sync::Arc;

use image::RgbaImage;

use super::{decoration::Decoration, layout::Point};

/// Where the strip preview sits on screen and how large it is shown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub origin: Point,
    pub display_size: (f32, f32),
    pub pixel_size: (u32, u32),
}

impl Viewport {
    pub fn new(origin: Point, display_size: (f32, f32), pixel_size: (u32, u32)) -> Self {
        Self {
            origin,
            display_size,
            pixel_size,
        }
    }

    /// Strip pixels per screen point on each axis.
    pub fn scale(&self) -> (f32, f32) {
        let (dw, dh) = self.display_size;
        let (pw, ph) = self.pixel_size;
        (
            if dw > 0.0 { pw as f32 / dw } else { 1.0 },
            if dh > 0.0 { ph as f32 / dh } else { 1.0 },
        )
    }

    pub fn to_strip(&self, screen: Point) -> Point {
        let (sx, sy) = self.scale();
        Point::new((screen.x - self.origin.x) * sx, (screen.y - self.origin.y) * sy)
    }

    pub fn to_screen(&self, strip: Point) -> Point {
        let (sx, sy) = self.scale();
        Point::new(self.origin.x + strip.x / sx, self.origin.y + strip.y / sy)
    }
}

/// An uploaded picture being moved around over the preview.
#[derive(Debug, Clone)]
pub struct FloatingSticker {
    pub image: Arc<RgbaImage>,
    /// Top-left corner in screen points.
    pub screen_pos: Point,
    pub display_size: (f32, f32),
}

impl FloatingSticker {
    pub fn new(image: Arc<RgbaImage>, screen_pos: Point, display_width: f32) -> Self {
        let (w, h) = image.dimensions();
        let aspect = if w > 0 { h as f32 / w as f32 } else { 1.0 };
        Self {
            image,
            screen_pos,
            display_size: (display_width, display_width * aspect),
        }
    }

    pub fn hit(&self, p: Point) -> bool {
        p.x >= self.screen_pos.x
            && p.y >= self.screen_pos.y
            && p.x < self.screen_pos.x + self.display_size.0
            && p.y < self.screen_pos.y + self.display_size.1
    }

    /// Converts into a strip decoration, scaling position and size alike.
    pub fn bake(&self, viewport: &Viewport) -> Decoration {
        let (sx, sy) = viewport.scale();
        Decoration::Image {
            pixels: Arc::clone(&self.image),
            position: viewport.to_strip(self.screen_pos),
            size: (self.display_size.0 * sx, self.display_size.1 * sy),
        }
    }
}

/// Pointer grab on one floating sticker.
#[derive(Debug, Default, Clone, Copy)]
pub struct DragState {
    grabbed: Option<(usize, Point)>,
}

impl DragState {
    /// Grabs the topmost sticker under the pointer.
    pub fn begin(&mut self, stickers: &[FloatingSticker], pointer: Point) -> Option<usize> {
        let index = stickers.iter().rposition(|s| s.hit(pointer))?;
        let pos = stickers[index].screen_pos;
        self.grabbed = Some((index, Point::new(pointer.x - pos.x, pointer.y - pos.y)));
        Some(index)
    }

    pub fn update(&self, stickers: &mut [FloatingSticker], pointer: Point) {
        if let Some((index, grab)) = self.grabbed {
            if let Some(sticker) = stickers.get_mut(index) {
                sticker.screen_pos = Point::new(pointer.x - grab.x, pointer.y - grab.y);
            }
        }
    }

    pub fn end(&mut self) {
        self.grabbed = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.grabbed.is_some()
    }
}
