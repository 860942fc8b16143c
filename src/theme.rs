//! Strip themes: one background procedure plus a text colour per theme.

use std::{fmt, str::FromStr};

use image::RgbaImage;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::raster::{
    fill, fill_circle, fill_heart, fill_rect, fill_triangle, linear_gradient, radial_gradient, rgb,
    rgba, Color, WHITE,
};

const DARK_TEXT: Color = rgb(0x33, 0x33, 0x33);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Classic,
    Vintage,
    Party,
    Summer,
    Hearts,
    Space,
    Neon,
    Confetti,
}

impl Theme {
    pub const ALL: [Theme; 8] = [
        Theme::Classic,
        Theme::Vintage,
        Theme::Party,
        Theme::Summer,
        Theme::Hearts,
        Theme::Space,
        Theme::Neon,
        Theme::Confetti,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Theme::Classic => "classic",
            Theme::Vintage => "vintage",
            Theme::Party => "party",
            Theme::Summer => "summer",
            Theme::Hearts => "hearts",
            Theme::Space => "space",
            Theme::Neon => "neon",
            Theme::Confetti => "confetti",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Theme::Classic => "Classic",
            Theme::Vintage => "Vintage",
            Theme::Party => "Party",
            Theme::Summer => "Summer",
            Theme::Hearts => "Hearts",
            Theme::Space => "Space",
            Theme::Neon => "Neon",
            Theme::Confetti => "Confetti",
        }
    }

    /// Companion colour for titles and text decorations on this background.
    pub fn text_color(&self) -> Color {
        match self {
            Theme::Space | Theme::Party | Theme::Neon => WHITE,
            _ => DARK_TEXT,
        }
    }

    /// Whether the background scatters randomly placed elements.
    pub fn is_randomized(&self) -> bool {
        matches!(
            self,
            Theme::Vintage | Theme::Hearts | Theme::Space | Theme::Confetti
        )
    }

    /// Paints the full background. Random elements draw from `rng`, so two
    /// renders only match for themes where [`Theme::is_randomized`] is false.
    pub fn render_background<R: Rng + ?Sized>(&self, img: &mut RgbaImage, rng: &mut R) {
        let (w, h) = (img.width() as f32, img.height() as f32);
        match self {
            Theme::Classic => fill(img, rgb(0xf8, 0xf9, 0xfa)),
            Theme::Vintage => {
                fill(img, rgb(0xf4, 0xf1, 0xe8));
                let speck = rgba(139, 69, 19, 0.1);
                for _ in 0..50 {
                    let (x, y) = (rng.gen::<f32>() * w, rng.gen::<f32>() * h);
                    fill_rect(img, x, y, 2.0, 2.0, speck);
                }
            }
            Theme::Party => linear_gradient(
                img,
                (0.0, 0.0),
                (w, h),
                &[
                    (0.0, rgb(0xff, 0x6b, 0x9d)),
                    (0.5, rgb(0xc4, 0x45, 0x69)),
                    (1.0, rgb(0xf8, 0xb5, 0x00)),
                ],
            ),
            Theme::Summer => linear_gradient(
                img,
                (0.0, 0.0),
                (0.0, h),
                &[(0.0, rgb(0x87, 0xce, 0xeb)), (1.0, rgb(0xf0, 0xe6, 0x8c))],
            ),
            Theme::Hearts => {
                fill(img, rgb(0xff, 0xe0, 0xe6));
                let heart = rgba(255, 182, 193, 0.3);
                for _ in 0..20 {
                    let (x, y) = (rng.gen::<f32>() * w, rng.gen::<f32>() * h);
                    fill_heart(img, x + 10.0, y - 7.0, 20.0, heart);
                }
            }
            Theme::Space => {
                fill(img, rgb(0x0f, 0x0f, 0x23));
                for _ in 0..100 {
                    let (x, y) = (rng.gen::<f32>() * w, rng.gen::<f32>() * h);
                    fill_circle(img, x, y, rng.gen::<f32>() * 2.0, WHITE);
                }
            }
            Theme::Neon => radial_gradient(
                img,
                (w / 2.0, h / 2.0),
                w.max(h) * 0.75,
                &[
                    (0.0, rgb(0xff, 0x00, 0xcc)),
                    (0.5, rgb(0x3a, 0x0c, 0xa3)),
                    (1.0, rgb(0x10, 0x00, 0x2b)),
                ],
            ),
            Theme::Confetti => {
                fill(img, rgb(0xff, 0xfd, 0xf7));
                const PALETTE: [Color; 5] = [
                    rgb(0xff, 0x59, 0x5e),
                    rgb(0xff, 0xca, 0x3a),
                    rgb(0x8a, 0xc9, 0x26),
                    rgb(0x19, 0x82, 0xc4),
                    rgb(0x6a, 0x4c, 0x93),
                ];
                for _ in 0..40 {
                    let (x, y) = (rng.gen::<f32>() * w, rng.gen::<f32>() * h);
                    let size = rng.gen_range(6.0..14.0);
                    let color = PALETTE[rng.gen_range(0..PALETTE.len())];
                    match rng.gen_range(0..3) {
                        0 => fill_circle(img, x, y, size / 2.0, color),
                        1 => fill_triangle(img, x, y, size, color),
                        _ => fill_rect(img, x - size / 2.0, y - size / 2.0, size, size, color),
                    }
                }
            }
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|t| t.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let known: Vec<_> = Theme::ALL.iter().map(Theme::id).collect();
                format!("unknown theme '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn render(theme: Theme, seed: u64) -> RgbaImage {
        let mut img = RgbaImage::new(400, 520);
        theme.render_background(&mut img, &mut StdRng::seed_from_u64(seed));
        img
    }

    #[test]
    fn deterministic_themes_render_identically() {
        for theme in Theme::ALL.into_iter().filter(|t| !t.is_randomized()) {
            assert_eq!(render(theme, 1), render(theme, 2), "{theme}");
        }
    }

    #[test]
    fn randomized_themes_vary_between_renders() {
        for theme in Theme::ALL.into_iter().filter(Theme::is_randomized) {
            assert_ne!(render(theme, 1), render(theme, 2), "{theme}");
        }
    }

    #[test]
    fn classic_is_a_solid_fill() {
        let img = render(Theme::Classic, 0);
        assert!(img.pixels().all(|p| *p == rgb(0xf8, 0xf9, 0xfa)));
    }

    #[test]
    fn summer_runs_top_to_bottom() {
        let img = render(Theme::Summer, 0);
        assert_eq!(img.get_pixel(0, 0), img.get_pixel(399, 0));
        assert_ne!(img.get_pixel(0, 0), img.get_pixel(0, 519));
    }

    #[test]
    fn text_color_policy() {
        assert_eq!(Theme::Space.text_color(), WHITE);
        assert_eq!(Theme::Party.text_color(), WHITE);
        assert_eq!(Theme::Classic.text_color(), DARK_TEXT);
        assert_eq!(Theme::Hearts.text_color(), DARK_TEXT);
    }

    #[test]
    fn parses_theme_ids() {
        assert_eq!("SPACE".parse::<Theme>(), Ok(Theme::Space));
        assert_eq!(" classic ".parse::<Theme>(), Ok(Theme::Classic));
        assert!("disco".parse::<Theme>().unwrap_err().contains("classic"));
    }
}
