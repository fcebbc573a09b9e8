// Colors, palettes and the perceptual darkness test used for label contrast

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ChartError;

/// Renderer-independent 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const BLACK: Rgb = Rgb(0, 0, 0);
pub const WHITE: Rgb = Rgb(255, 255, 255);

/// Bar color when no category column is used
pub const SINGLE_BAR_COLOR: Rgb = Rgb(0x1f, 0x3a, 0x5f);
/// Count line, its markers and labels
pub const LINE_COLOR: Rgb = Rgb(0xe0, 0x7a, 0x1f);

impl Rgb {
    /// Channels scaled to [0, 1]
    pub fn unit(&self) -> (f64, f64, f64) {
        (
            self.0 as f64 / 255.0,
            self.1 as f64 / 255.0,
            self.2 as f64 / 255.0,
        )
    }

    /// Blend toward white; `amount` 0 keeps the color, 1 yields white
    pub fn lighten(&self, amount: f64) -> Rgb {
        let t = amount.clamp(0.0, 1.0);
        let mix = |c: u8| (c as f64 + (255.0 - c as f64) * t).round() as u8;
        Rgb(mix(self.0), mix(self.1), mix(self.2))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from(t: (u8, u8, u8)) -> Self {
        Rgb(t.0, t.1, t.2)
    }
}

impl FromStr for Rgb {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| invalid(s));
        }
        named_color(&s.to_ascii_lowercase()).ok_or_else(|| invalid(s))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ChartError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

fn invalid(s: &str) -> ChartError {
    ChartError::InvalidConfig(format!("Unrecognized color '{}'", s))
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(Rgb(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        3 => {
            let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
            Some(Rgb(expand(0)?, expand(1)?, expand(2)?))
        }
        _ => None,
    }
}

fn named_color(name: &str) -> Option<Rgb> {
    let rgb = match name {
        "black" => BLACK,
        "white" => WHITE,
        "red" => Rgb(255, 0, 0),
        "green" => Rgb(0, 128, 0),
        "blue" => Rgb(0, 0, 255),
        "yellow" => Rgb(255, 255, 0),
        "cyan" => Rgb(0, 255, 255),
        "magenta" => Rgb(255, 0, 255),
        "orange" => Rgb(255, 165, 0),
        "purple" => Rgb(128, 0, 128),
        "navy" => Rgb(0, 0, 128),
        "teal" => Rgb(0, 128, 128),
        "gray" | "grey" => Rgb(128, 128, 128),
        "lightgray" | "lightgrey" => Rgb(211, 211, 211),
        _ => return None,
    };
    Some(rgb)
}

/// Relative luminance over unit-scaled channels
pub fn luminance(color: impl Into<Rgb>) -> f64 {
    let (r, g, b) = color.into().unit();
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Dark colors get white label text
pub fn is_dark(color: impl Into<Rgb>) -> bool {
    luminance(color) < 0.5
}

/// Text color that contrasts with a fill
pub fn contrast_text(fill: Rgb) -> Rgb {
    if is_dark(fill) {
        WHITE
    } else {
        BLACK
    }
}

#[derive(Debug, Clone)]
pub struct ColorPalette {
    colors: Vec<Rgb>,
}

impl ColorPalette {
    /// The ten-color categorical palette
    pub fn category10() -> Self {
        Self {
            colors: vec![
                Rgb(0x1f, 0x77, 0xb4),
                Rgb(0xff, 0x7f, 0x0e),
                Rgb(0x2c, 0xa0, 0x2c),
                Rgb(0xd6, 0x27, 0x28),
                Rgb(0x94, 0x67, 0xbd),
                Rgb(0x8c, 0x56, 0x4b),
                Rgb(0xe3, 0x77, 0xc2),
                Rgb(0x7f, 0x7f, 0x7f),
                Rgb(0xbc, 0xbd, 0x22),
                Rgb(0x17, 0xbe, 0xcf),
            ],
        }
    }

    /// Color for the n-th key, cycling when keys outnumber colors
    pub fn color_at(&self, index: usize) -> Rgb {
        self.colors[index % self.colors.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_darkness_extremes() {
        assert!(is_dark(BLACK));
        assert!(!is_dark(WHITE));
        assert_eq!(contrast_text(BLACK), WHITE);
        assert_eq!(contrast_text(WHITE), BLACK);
    }

    #[test]
    fn test_darkness_boundary() {
        // 128/255 = 0.502 sits just above the threshold, 127/255 just below
        assert!(!is_dark(Rgb(0x80, 0x80, 0x80)));
        assert!(is_dark(Rgb(0x7f, 0x7f, 0x7f)));
    }

    #[test]
    fn test_darkness_weights_green_heavily() {
        assert!(!is_dark(Rgb(0, 255, 0)));
        assert!(is_dark(Rgb(0, 0, 255)));
        assert!(is_dark(Rgb(255, 0, 0)));
    }

    #[test]
    fn test_is_dark_accepts_tuples() {
        assert!(is_dark((10u8, 20u8, 30u8)));
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!("#FFFFFF".parse::<Rgb>().unwrap(), WHITE);
        assert_eq!("#1f77b4".parse::<Rgb>().unwrap(), Rgb(0x1f, 0x77, 0xb4));
        assert_eq!("#fff".parse::<Rgb>().unwrap(), WHITE);
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#gggggg".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_parse_named() {
        assert_eq!(" Navy ".parse::<Rgb>().unwrap(), Rgb(0, 0, 128));
        assert!("chartreuse-ish".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_deserialize_from_string() {
        let c: Rgb = serde_json::from_str("\"#000000\"").unwrap();
        assert_eq!(c, BLACK);
        assert!(serde_json::from_str::<Rgb>("\"nope\"").is_err());
    }

    #[test]
    fn test_lighten() {
        assert_eq!(BLACK.lighten(0.0), BLACK);
        assert_eq!(BLACK.lighten(1.0), WHITE);
        assert_eq!(Rgb(0, 100, 200).lighten(0.5), Rgb(128, 178, 228));
    }

    #[test]
    fn test_palette_cycles() {
        let palette = ColorPalette::category10();
        assert_eq!(palette.color_at(0), palette.color_at(10));
        assert_ne!(palette.color_at(0), palette.color_at(1));
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(Rgb(0x1f, 0x77, 0xb4).to_hex(), "#1f77b4");
    }
}
