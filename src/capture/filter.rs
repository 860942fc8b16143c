//! Declarative colour filters in CSS `filter:` syntax.
//!
//! `contrast(1.3) brightness(110%) saturate(1.4) hue-rotate(2deg)` parses into
//! an ordered list of [`Adjustment`]s applied left to right, each clamped to
//! the displayable range like the browser's filter primitives.

use std::{fmt, str::FromStr};

use image::RgbaImage;

use crate::error::FilterError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    Brightness(f32),
    Contrast(f32),
    Saturate(f32),
    /// Degrees.
    HueRotate(f32),
    Grayscale(f32),
    Sepia(f32),
}

impl Adjustment {
    fn function(&self) -> &'static str {
        match self {
            Adjustment::Brightness(_) => "brightness",
            Adjustment::Contrast(_) => "contrast",
            Adjustment::Saturate(_) => "saturate",
            Adjustment::HueRotate(_) => "hue-rotate",
            Adjustment::Grayscale(_) => "grayscale",
            Adjustment::Sepia(_) => "sepia",
        }
    }

    fn apply(&self, [r, g, b]: [f32; 3]) -> [f32; 3] {
        let out = match *self {
            Adjustment::Brightness(v) => [r * v, g * v, b * v],
            Adjustment::Contrast(v) => {
                let c = |x: f32| (x - 0.5) * v + 0.5;
                [c(r), c(g), c(b)]
            }
            Adjustment::Saturate(s) => mul(saturate_matrix(s), [r, g, b]),
            Adjustment::HueRotate(deg) => mul(hue_matrix(deg), [r, g, b]),
            Adjustment::Grayscale(amount) => mul(saturate_matrix(1.0 - amount.min(1.0)), [r, g, b]),
            Adjustment::Sepia(amount) => {
                let a = 1.0 - amount.min(1.0);
                let m = [
                    [0.393 + 0.607 * a, 0.769 - 0.769 * a, 0.189 - 0.189 * a],
                    [0.349 - 0.349 * a, 0.686 + 0.314 * a, 0.168 - 0.168 * a],
                    [0.272 - 0.272 * a, 0.534 - 0.534 * a, 0.131 + 0.869 * a],
                ];
                mul(m, [r, g, b])
            }
        };
        out.map(|v| v.clamp(0.0, 1.0))
    }
}

fn mul(m: [[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

fn saturate_matrix(s: f32) -> [[f32; 3]; 3] {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn hue_matrix(deg: f32) -> [[f32; 3]; 3] {
    let (sin, cos) = deg.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

/// Ordered chain of adjustments. The empty chain is the identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorFilter {
    adjustments: Vec<Adjustment>,
}

impl ColorFilter {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn is_identity(&self) -> bool {
        self.adjustments.is_empty()
    }

    pub fn apply_pixel(&self, rgb: [u8; 3]) -> [u8; 3] {
        let mut v = rgb.map(|c| c as f32 / 255.0);
        for adj in &self.adjustments {
            v = adj.apply(v);
        }
        v.map(|c| (c * 255.0).round() as u8)
    }

    /// Applies the chain in place; alpha is untouched.
    pub fn apply(&self, img: &mut RgbaImage) {
        if self.is_identity() {
            return;
        }
        for px in img.pixels_mut() {
            let [r, g, b] = self.apply_pixel([px[0], px[1], px[2]]);
            px[0] = r;
            px[1] = g;
            px[2] = b;
        }
    }
}

fn parse_amount(function: &str, raw: &str) -> Result<f32, FilterError> {
    let invalid = || FilterError::InvalidValue {
        function: function.to_string(),
        value: raw.to_string(),
    };
    let value = match raw.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f32>().map_err(|_| invalid())? / 100.0,
        None => raw.parse::<f32>().map_err(|_| invalid())?,
    };
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }
    Ok(value)
}

fn parse_angle(raw: &str) -> Result<f32, FilterError> {
    let invalid = || FilterError::InvalidValue {
        function: "hue-rotate".to_string(),
        value: raw.to_string(),
    };
    let (number, to_deg) = if let Some(v) = raw.strip_suffix("deg") {
        (v, 1.0)
    } else if let Some(v) = raw.strip_suffix("grad") {
        (v, 0.9)
    } else if let Some(v) = raw.strip_suffix("rad") {
        (v, 180.0 / std::f32::consts::PI)
    } else if let Some(v) = raw.strip_suffix("turn") {
        (v, 360.0)
    } else {
        (raw, 1.0)
    };
    let value: f32 = number.trim().parse().map_err(|_| invalid())?;
    // Unitless angles are only valid as zero.
    if number.len() == raw.len() && value != 0.0 {
        return Err(invalid());
    }
    Ok(value * to_deg)
}

impl FromStr for ColorFilter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rest = s.trim();
        if rest.is_empty() || rest.eq_ignore_ascii_case("none") {
            return Ok(Self::identity());
        }
        let mut adjustments = Vec::new();
        while !rest.is_empty() {
            let open = rest
                .find('(')
                .ok_or_else(|| FilterError::Malformed(rest.to_string()))?;
            let close = rest[open..]
                .find(')')
                .map(|i| open + i)
                .ok_or_else(|| FilterError::Malformed(rest.to_string()))?;
            let name = rest[..open].trim().to_ascii_lowercase();
            let arg = rest[open + 1..close].trim();
            let adj = match name.as_str() {
                "brightness" => Adjustment::Brightness(parse_amount(&name, arg)?),
                "contrast" => Adjustment::Contrast(parse_amount(&name, arg)?),
                "saturate" => Adjustment::Saturate(parse_amount(&name, arg)?),
                "grayscale" => Adjustment::Grayscale(parse_amount(&name, arg)?),
                "sepia" => Adjustment::Sepia(parse_amount(&name, arg)?),
                "hue-rotate" => Adjustment::HueRotate(parse_angle(arg)?),
                "" => return Err(FilterError::Malformed(rest.to_string())),
                _ => return Err(FilterError::UnknownFunction(name)),
            };
            adjustments.push(adj);
            rest = rest[close + 1..].trim_start();
        }
        Ok(Self { adjustments })
    }
}

impl fmt::Display for ColorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.adjustments.is_empty() {
            return f.write_str("none");
        }
        for (i, adj) in self.adjustments.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match adj {
                Adjustment::HueRotate(deg) => write!(f, "hue-rotate({deg}deg)")?,
                Adjustment::Brightness(v)
                | Adjustment::Contrast(v)
                | Adjustment::Saturate(v)
                | Adjustment::Grayscale(v)
                | Adjustment::Sepia(v) => write!(f, "{}({v})", adj.function())?,
            }
        }
        Ok(())
    }
}

/// Named filters offered by the capture screen.
pub struct FilterPreset {
    pub name: &'static str,
    pub css: &'static str,
}

pub fn filter_presets() -> &'static [FilterPreset] {
    &[
        FilterPreset {
            name: "None",
            css: "none",
        },
        FilterPreset {
            name: "Black & White",
            css: "grayscale(1) contrast(1.2)",
        },
        FilterPreset {
            name: "Sepia",
            css: "sepia(0.8) contrast(1.1)",
        },
        FilterPreset {
            name: "Vivid",
            css: "saturate(1.8) contrast(1.1)",
        },
        FilterPreset {
            name: "Warm",
            css: "sepia(0.3) saturate(1.3) brightness(1.05)",
        },
        FilterPreset {
            name: "Cool",
            css: "hue-rotate(-15deg) saturate(1.2) brightness(1.05)",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vhs_grade() {
        let f: ColorFilter = "contrast(1.3) brightness(1.1) saturate(1.4) hue-rotate(2deg)"
            .parse()
            .unwrap();
        assert_eq!(
            f.adjustments.as_slice(),
            &[
                Adjustment::Contrast(1.3),
                Adjustment::Brightness(1.1),
                Adjustment::Saturate(1.4),
                Adjustment::HueRotate(2.0),
            ]
        );
    }

    #[test]
    fn parses_percentages_and_angle_units() {
        let f: ColorFilter = "brightness(150%) hue-rotate(0.5turn) hue-rotate(0)".parse().unwrap();
        assert_eq!(
            f.adjustments.as_slice(),
            &[
                Adjustment::Brightness(1.5),
                Adjustment::HueRotate(180.0),
                Adjustment::HueRotate(0.0),
            ]
        );
    }

    #[test]
    fn none_and_empty_are_identity() {
        assert!("none".parse::<ColorFilter>().unwrap().is_identity());
        assert!("   ".parse::<ColorFilter>().unwrap().is_identity());
        assert_eq!(ColorFilter::identity().apply_pixel([12, 34, 56]), [12, 34, 56]);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            "blur(2px)".parse::<ColorFilter>(),
            Err(FilterError::UnknownFunction("blur".into()))
        );
        assert!(matches!(
            "contrast(abc)".parse::<ColorFilter>(),
            Err(FilterError::InvalidValue { .. })
        ));
        assert!(matches!(
            "hue-rotate(20)".parse::<ColorFilter>(),
            Err(FilterError::InvalidValue { .. })
        ));
        assert!(matches!(
            "contrast(1.2".parse::<ColorFilter>(),
            Err(FilterError::Malformed(_))
        ));
    }

    #[test]
    fn brightness_and_contrast_math() {
        let bright: ColorFilter = "brightness(2)".parse().unwrap();
        assert_eq!(bright.apply_pixel([100, 200, 0]), [200, 255, 0]);
        let flat: ColorFilter = "contrast(0)".parse().unwrap();
        assert_eq!(flat.apply_pixel([0, 255, 30]), [128, 128, 128]);
    }

    #[test]
    fn grayscale_equalizes_channels() {
        let gray: ColorFilter = "grayscale(1)".parse().unwrap();
        let [r, g, b] = gray.apply_pixel([200, 40, 90]);
        assert!(r.abs_diff(g) <= 1 && g.abs_diff(b) <= 1);
    }

    #[test]
    fn hue_rotate_keeps_gray_gray() {
        let f: ColorFilter = "hue-rotate(90deg)".parse().unwrap();
        let [r, g, b] = f.apply_pixel([128, 128, 128]);
        assert!(r.abs_diff(128) <= 1 && g.abs_diff(128) <= 1 && b.abs_diff(128) <= 1);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for preset in filter_presets() {
            let f: ColorFilter = preset.css.parse().unwrap();
            assert_eq!(f.to_string().parse::<ColorFilter>().unwrap(), f, "{}", preset.name);
        }
    }
}
