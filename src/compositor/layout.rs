use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn inflate(&self, by: f32) -> Self {
        Self::new(self.x - by, self.y - by, self.w + 2.0 * by, self.h + 2.0 * by)
    }
}

/// Geometry of the strip. All values are in strip pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConstants {
    pub canvas_width: u32,
    pub photo_width: u32,
    pub photo_height: u32,
    pub spacing: u32,
    pub padding: u32,
    /// White frame margin drawn around every photo.
    pub frame_inset: u32,
    pub title: String,
    pub title_baseline: f32,
    pub title_size: f32,
}

impl Default for LayoutConstants {
    fn default() -> Self {
        Self {
            canvas_width: 400,
            photo_width: 320,
            photo_height: 120,
            spacing: 20,
            padding: 40,
            frame_inset: 5,
            title: "photobooth".into(),
            title_baseline: 25.0,
            title_size: 16.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StripLayout {
    pub width: u32,
    pub height: u32,
    /// One slot per photo, top to bottom.
    pub slots: Vec<Rect>,
}

impl StripLayout {
    pub fn compute(n: usize, c: &LayoutConstants) -> Self {
        let n32 = n as u32;
        let height = c.padding * 2 + c.photo_height * n32 + c.spacing * n32.saturating_sub(1);
        let x = c.canvas_width.saturating_sub(c.photo_width) as f32 / 2.0;
        let slots = (0..n32)
            .map(|i| {
                Rect::new(
                    x,
                    (c.padding + i * (c.photo_height + c.spacing)) as f32,
                    c.photo_width as f32,
                    c.photo_height as f32,
                )
            })
            .collect();
        Self {
            width: c.canvas_width,
            height,
            slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_photo_strip_is_400x480() {
        let layout = StripLayout::compute(3, &LayoutConstants::default());
        assert_eq!((layout.width, layout.height), (400, 480));
        assert_eq!(layout.slots[0], Rect::new(40.0, 40.0, 320.0, 120.0));
        assert_eq!(layout.slots[1].y, 180.0);
        assert_eq!(layout.slots[2].y, 320.0);
    }

    #[test]
    fn height_follows_photo_count() {
        let c = LayoutConstants::default();
        for n in 1..=3usize {
            let expected = 80 + 120 * n as u32 + 20 * (n as u32 - 1);
            let layout = StripLayout::compute(n, &c);
            assert_eq!(layout.height, expected);
            assert_eq!(layout, StripLayout::compute(n, &c));
        }
        assert_eq!(StripLayout::compute(0, &c).height, 80);
    }

    #[test]
    fn frame_rect_inflates_slot() {
        let r = Rect::new(40.0, 40.0, 320.0, 120.0).inflate(5.0);
        assert_eq!(r, Rect::new(35.0, 35.0, 330.0, 130.0));
    }
}
