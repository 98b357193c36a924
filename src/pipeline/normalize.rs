//! Stage 1: turn raw backend text items into [`TextRun`]s.
//!
//! Backends hand over glyph runs with a text-space matrix, an advance width
//! and a height. This stage maps each one into page coordinates through the
//! page viewport, collapses whitespace, clamps the font size and strips font
//! subset prefixes. Anything that cannot produce a sensible run is dropped
//! and reported as an [`ExtractionSkipped`] reason for the caller to tally.

use crate::document::{RawTextItem, TextRun, DEFAULT_FONT_FACE};
use crate::error::ExtractionSkipped;
use crate::geometry::{clamp, Transform};

/// Smallest font size a run may carry, in points.
pub const FONT_SIZE_MIN: f64 = 8.0;
/// Largest font size a run may carry, in points.
pub const FONT_SIZE_MAX: f64 = 72.0;
/// Font size assumed when the backend reports no usable height.
pub const FALLBACK_FONT_SIZE: f64 = 12.0;

/// Runs that survived normalisation plus how many items were dropped.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NormalizedRuns {
    pub runs: Vec<TextRun>,
    pub skipped: usize,
}

/// Normalise every item of a page, keeping backend order.
pub fn normalize_items(items: &[RawTextItem], viewport: &Transform, page_height: f64) -> NormalizedRuns {
    let mut out = NormalizedRuns {
        runs: Vec::with_capacity(items.len()),
        skipped: 0,
    };
    for item in items {
        match normalize_item(item, viewport, page_height) {
            Ok(run) => out.runs.push(run),
            Err(reason) => {
                tracing::trace!(?reason, "skipping text item");
                out.skipped += 1;
            }
        }
    }
    out
}

/// Normalise a single raw item.
pub fn normalize_item(
    item: &RawTextItem,
    viewport: &Transform,
    page_height: f64,
) -> Result<TextRun, ExtractionSkipped> {
    let raw = item.text.as_deref().ok_or(ExtractionSkipped::MissingText)?;
    let text = collapse_whitespace(raw);
    if text.is_empty() {
        return Err(ExtractionSkipped::EmptyText);
    }

    let matrix = item
        .transform
        .as_deref()
        .and_then(Transform::from_slice)
        .ok_or(ExtractionSkipped::MalformedTransform)?;
    let placed = viewport.multiply(&matrix);
    let x = placed.e();
    let y = page_height - placed.f();
    if !x.is_finite() || !y.is_finite() {
        return Err(ExtractionSkipped::NonFinitePosition);
    }

    let font_size = normalize_font_size(item.height);
    let w = if item.width.is_finite() { item.width.max(0.0) } else { 0.0 };

    Ok(TextRun {
        text,
        x,
        y,
        w,
        h: font_size,
        font_size,
        font_face: normalize_font_name(item.font_name.as_deref().unwrap_or_default()),
    })
}

/// Clamp a reported glyph height into `[8, 72]`, treating zero or garbage as 12.
pub fn normalize_font_size(height: f64) -> f64 {
    let size = if height.is_finite() && height != 0.0 {
        height
    } else {
        FALLBACK_FONT_SIZE
    };
    clamp(size, FONT_SIZE_MIN, FONT_SIZE_MAX)
}

/// Replace every whitespace run with one space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip a subset tag (`ABCDEF+Helvetica` → `Helvetica`) and default empty
/// names to Arial.
pub fn normalize_font_name(name: &str) -> String {
    let name = name.trim();
    let family = match name.split_once('+') {
        Some((tag, rest)) if !tag.is_empty() && tag.bytes().all(|b| b.is_ascii_uppercase()) => rest,
        _ => name,
    };
    if family.is_empty() {
        DEFAULT_FONT_FACE.to_string()
    } else {
        family.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str, e: f64, f: f64, width: f64, height: f64) -> RawTextItem {
        RawTextItem {
            text: Some(text.into()),
            transform: Some(vec![height, 0.0, 0.0, height, e, f]),
            width,
            height,
            font_name: Some("ABCDEF+Helvetica".into()),
        }
    }

    #[test]
    fn maps_into_page_coordinates() {
        let vp = Transform::page_viewport(792.0);
        let run = normalize_item(&item("Hello", 72.0, 700.0, 30.0, 12.0), &vp, 792.0).unwrap();
        assert_eq!(run.text, "Hello");
        assert_eq!(run.x, 72.0);
        assert_eq!(run.y, 700.0);
        assert_eq!(run.w, 30.0);
        assert_eq!(run.h, 12.0);
        assert_eq!(run.font_size, 12.0);
        assert_eq!(run.font_face, "Helvetica");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(collapse_whitespace("  a \t b\n\nc  "), "a b c");
        assert_eq!(collapse_whitespace(" \u{a0} "), "");
    }

    #[test]
    fn whitespace_only_items_are_skipped() {
        let vp = Transform::page_viewport(792.0);
        let items = vec![
            item("   ", 0.0, 0.0, 1.0, 12.0),
            item("\t\n", 0.0, 0.0, 1.0, 12.0),
            item("kept", 0.0, 0.0, 1.0, 12.0),
        ];
        let out = normalize_items(&items, &vp, 792.0);
        assert_eq!(out.runs.len(), 1);
        assert_eq!(out.skipped, 2);
    }

    #[test]
    fn malformed_and_missing_inputs() {
        let vp = Transform::page_viewport(100.0);
        let mut short = item("x", 0.0, 0.0, 1.0, 12.0);
        short.transform = Some(vec![1.0, 0.0, 0.0]);
        assert_eq!(
            normalize_item(&short, &vp, 100.0),
            Err(ExtractionSkipped::MalformedTransform)
        );

        let mut missing = item("x", 0.0, 0.0, 1.0, 12.0);
        missing.transform = None;
        assert_eq!(
            normalize_item(&missing, &vp, 100.0),
            Err(ExtractionSkipped::MalformedTransform)
        );

        let no_text = RawTextItem::default();
        assert_eq!(normalize_item(&no_text, &vp, 100.0), Err(ExtractionSkipped::MissingText));

        let nan = item("x", f64::NAN, 0.0, 1.0, 12.0);
        assert_eq!(
            normalize_item(&nan, &vp, 100.0),
            Err(ExtractionSkipped::NonFinitePosition)
        );
    }

    #[test]
    fn font_size_is_clamped_and_defaulted() {
        assert_eq!(normalize_font_size(0.0), 12.0);
        assert_eq!(normalize_font_size(f64::NAN), 12.0);
        assert_eq!(normalize_font_size(3.0), 8.0);
        assert_eq!(normalize_font_size(200.0), 72.0);
        assert_eq!(normalize_font_size(-4.0), 8.0);
        assert_eq!(normalize_font_size(10.5), 10.5);
    }

    #[test]
    fn negative_width_becomes_zero() {
        let vp = Transform::page_viewport(100.0);
        let run = normalize_item(&item("x", 1.0, 1.0, -5.0, 10.0), &vp, 100.0).unwrap();
        assert_eq!(run.w, 0.0);
    }

    #[test]
    fn font_name_prefix_rules() {
        assert_eq!(normalize_font_name("ABCDEF+Helvetica"), "Helvetica");
        assert_eq!(normalize_font_name("Times-Roman"), "Times-Roman");
        assert_eq!(normalize_font_name("abc+Mono"), "abc+Mono");
        assert_eq!(normalize_font_name("+Mono"), "+Mono");
        assert_eq!(normalize_font_name(""), "Arial");
        assert_eq!(normalize_font_name("ABCDEF+"), "Arial");
    }
}
