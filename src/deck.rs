//! Slide description and deck serialisation.
//!
//! [`SlideDeck`] is a format-neutral description of the output: one
//! [`Slide`] per converted page, each with a background colour, optional
//! images and editable text boxes, all positioned in inches. Turning that
//! description into a file is the job of a [`DeckWriter`]. The crate ships
//! [`JsonDeckWriter`]; a PPTX writer plugs in through the same trait.

use crate::config::SlideLayout;
use crate::document::{Color, DEFAULT_FONT_FACE};
use crate::error::Pdf2DeckError;
use crate::geometry::{SlideRect, SlideSize};
use serde::{Deserialize, Serialize};

/// A whole deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideDeck {
    pub layout: SlideLayout,
    pub size: SlideSize,
    pub slides: Vec<Slide>,
}

impl SlideDeck {
    pub fn new(layout: SlideLayout) -> Self {
        Self {
            layout,
            size: layout.size(),
            slides: Vec::new(),
        }
    }

    /// Append an empty white slide for `page_number` and return it.
    pub fn add_slide(&mut self, page_number: usize) -> &mut Slide {
        self.slides.push(Slide::new(page_number));
        let last = self.slides.len() - 1;
        &mut self.slides[last]
    }

    /// Append an already assembled slide.
    pub fn push_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    pub fn text_box_count(&self) -> usize {
        self.slides.iter().map(|s| s.texts.len()).sum()
    }

    pub fn image_count(&self) -> usize {
        self.slides.iter().map(|s| s.images.len()).sum()
    }
}

/// One slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    /// Source page, 1-indexed.
    pub page_number: usize,
    pub background: Color,
    pub images: Vec<SlideImage>,
    pub texts: Vec<SlideText>,
}

impl Slide {
    pub fn new(page_number: usize) -> Self {
        Self {
            page_number,
            background: Color::WHITE,
            images: Vec::new(),
            texts: Vec::new(),
        }
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    pub fn add_image(&mut self, image: SlideImage) {
        self.images.push(image);
    }

    pub fn add_text(&mut self, text: impl Into<String>, style: TextStyle) {
        self.texts.push(SlideText {
            text: text.into(),
            rect: style.rect,
            font_size: style.font_size,
            font_face: style.font_face,
            color: style.color,
        });
    }
}

/// A positioned image, stored as base64 so the description stays textual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideImage {
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
    pub rect: SlideRect,
}

impl SlideImage {
    /// `data:` URL form, as accepted by most slide libraries.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// An editable text box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideText {
    pub text: String,
    pub rect: SlideRect,
    pub font_size: f64,
    pub font_face: String,
    pub color: Color,
}

/// Placement and look of a text box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub rect: SlideRect,
    pub font_size: f64,
    pub font_face: String,
    pub color: Color,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            rect: SlideRect::default(),
            font_size: 12.0,
            font_face: DEFAULT_FONT_FACE.to_string(),
            color: Color::TEXT,
        }
    }
}

// ── Writers ──────────────────────────────────────────────────────────────

/// Serialises a [`SlideDeck`] into downloadable bytes.
///
/// Only local conversions go through a writer, so a local deck is named
/// after [`DeckWriter::file_extension`] (`.json` with the bundled
/// [`JsonDeckWriter`]). Remote conversions return the worker's bytes as is
/// and are always named `.pptx`. Plug in a presentation encoder here to get
/// the same format from both paths.
pub trait DeckWriter: Send + Sync {
    /// Encode the deck.
    fn write(&self, deck: &SlideDeck) -> Result<Vec<u8>, Pdf2DeckError>;

    /// File extension (without the dot) for the encoded bytes.
    fn file_extension(&self) -> &'static str;
}

/// Writes the slide description as JSON.
#[derive(Debug, Clone, Copy)]
pub struct JsonDeckWriter {
    pub pretty: bool,
}

impl Default for JsonDeckWriter {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl DeckWriter for JsonDeckWriter {
    fn write(&self, deck: &SlideDeck) -> Result<Vec<u8>, Pdf2DeckError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(deck)
        } else {
            serde_json::to_vec(deck)
        };
        bytes.map_err(|e| Pdf2DeckError::SerializationFailure(e.to_string()))
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_methods_fill_slide() {
        let mut deck = SlideDeck::new(SlideLayout::Standard);
        let slide = deck.add_slide(1);
        slide.set_background(Color::rgb(1, 2, 3));
        slide.add_image(SlideImage {
            mime_type: "image/png".into(),
            data: "AAAA".into(),
            rect: SlideRect::full(SlideLayout::Standard.size()),
        });
        slide.add_text(
            "Hello",
            TextStyle {
                font_size: 9.0,
                ..TextStyle::default()
            },
        );

        assert_eq!(deck.slides.len(), 1);
        assert_eq!(deck.text_box_count(), 1);
        assert_eq!(deck.image_count(), 1);
        assert_eq!(deck.slides[0].texts[0].color, Color::TEXT);
        assert_eq!(deck.slides[0].images[0].data_url(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn json_writer_emits_parseable_manifest() {
        let mut deck = SlideDeck::new(SlideLayout::Wide);
        deck.add_slide(3).add_text("x", TextStyle::default());
        let bytes = JsonDeckWriter { pretty: false }.write(&deck).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["layout"], "wide");
        assert_eq!(value["size"]["width"], 13.333);
        assert_eq!(value["slides"][0]["page_number"], 3);
        assert_eq!(value["slides"][0]["background"], "FFFFFF");
        assert_eq!(value["slides"][0]["texts"][0]["font_face"], "Arial");

        let back: SlideDeck = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, deck);
    }
}
