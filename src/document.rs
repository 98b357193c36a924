//! Page-level data model produced by extraction and consumed by slide assembly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default font face when a run carries no usable font name.
pub const DEFAULT_FONT_FACE: &str = "Arial";

/// One raw glyph run as reported by the document backend, before
/// normalisation. Every field may be missing or garbage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTextItem {
    /// Text content as reported by the backend.
    pub text: Option<String>,
    /// Text-space to user-space transform `[a, b, c, d, e, f]`.
    pub transform: Option<Vec<f64>>,
    /// Advance width in user space.
    pub width: f64,
    /// Glyph height in user space (the scaled font size).
    pub height: f64,
    /// Font name, possibly carrying a subset prefix (`ABCDEF+Helvetica`).
    pub font_name: Option<String>,
}

/// A positioned, normalised fragment of text in page coordinates.
///
/// `y` is the baseline measured from the bottom of the page, so larger `y`
/// means higher on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub font_size: f64,
    pub font_face: String,
}

/// An RGB colour, serialised as a six-digit upper-case hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    /// Dark grey used for re-created text boxes.
    pub const TEXT: Color = Color::rgb(0x36, 0x36, 0x36);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Parse `RRGGBB` (an optional leading `#` is accepted).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value).ok_or_else(|| format!("invalid hex colour '{value}'"))
    }
}

/// A page bitmap, already PNG-encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct PageRaster {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl fmt::Debug for PageRaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageRaster")
            .field("png", &format_args!("<{} bytes>", self.png.len()))
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Everything the slide assembler needs to know about one page.
///
/// Immutable once extraction has finished with it.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDocument {
    /// 1-indexed page number.
    pub page_number: usize,
    /// Page width in points at scale 1.
    pub width: f64,
    /// Page height in points at scale 1.
    pub height: f64,
    /// Merged runs in reading order.
    pub text_runs: Vec<TextRun>,
    pub raster: Option<PageRaster>,
    pub background: Color,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_hex_round_trip() {
        assert_eq!(Color::WHITE.to_string(), "FFFFFF");
        assert_eq!(Color::TEXT.to_string(), "363636");
        assert_eq!(Color::from_hex("#363636"), Some(Color::TEXT));
        assert_eq!(Color::from_hex("36363"), None);
        assert_eq!(Color::from_hex("zzzzzz"), None);
    }

    #[test]
    fn color_serialises_as_string() {
        let json = serde_json::to_string(&Color::WHITE).unwrap();
        assert_eq!(json, "\"FFFFFF\"");
        let back: Color = serde_json::from_str("\"0A0b0C\"").unwrap();
        assert_eq!(back, Color::rgb(10, 11, 12));
    }

    #[test]
    fn raster_debug_hides_bytes() {
        let r = PageRaster {
            png: vec![0; 1024],
            width: 10,
            height: 20,
        };
        assert!(format!("{r:?}").contains("<1024 bytes>"));
    }
}
