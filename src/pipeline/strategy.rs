//! Stage 4: decide how each page is rebuilt.

use crate::config::{ConversionMode, ConversionOptions};
use crate::document::PageDocument;
use serde::{Deserialize, Serialize};

/// Balanced mode keeps the page image only below this many merged runs.
pub const BALANCED_TEXT_THRESHOLD: usize = 12;

/// What goes onto a slide besides the background colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStrategy {
    /// Editable text boxes only.
    VectorOnly,
    /// Full-page raster behind the editable text boxes.
    RasterWithText,
}

impl RenderStrategy {
    pub fn uses_raster(self) -> bool {
        self == RenderStrategy::RasterWithText
    }
}

/// Pick the strategy for one page.
///
/// Pure: depends only on the page (raster presence and run count) and the
/// options.
pub fn select_strategy(page: &PageDocument, options: &ConversionOptions) -> RenderStrategy {
    if page.raster.is_none() {
        return RenderStrategy::VectorOnly;
    }
    match options.mode {
        ConversionMode::Fidelity => RenderStrategy::RasterWithText,
        ConversionMode::Editable => RenderStrategy::VectorOnly,
        ConversionMode::Balanced | ConversionMode::RemoteHighPrecision => {
            if page.text_runs.len() < BALANCED_TEXT_THRESHOLD {
                RenderStrategy::RasterWithText
            } else {
                RenderStrategy::VectorOnly
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Color, PageRaster, TextRun};

    fn page(runs: usize, raster: bool) -> PageDocument {
        let run = TextRun {
            text: "x".into(),
            x: 0.0,
            y: 0.0,
            w: 1.0,
            h: 12.0,
            font_size: 12.0,
            font_face: "Arial".into(),
        };
        PageDocument {
            page_number: 1,
            width: 612.0,
            height: 792.0,
            text_runs: vec![run; runs],
            raster: raster.then(|| PageRaster {
                png: vec![1, 2, 3],
                width: 1,
                height: 1,
            }),
            background: Color::WHITE,
        }
    }

    fn options(mode: ConversionMode) -> ConversionOptions {
        ConversionOptions {
            mode,
            ..ConversionOptions::default()
        }
    }

    #[test]
    fn balanced_threshold_is_twelve_runs() {
        let balanced = options(ConversionMode::Balanced);
        assert_eq!(select_strategy(&page(11, true), &balanced), RenderStrategy::RasterWithText);
        assert_eq!(select_strategy(&page(12, true), &balanced), RenderStrategy::VectorOnly);
    }

    #[test]
    fn no_raster_means_vector_only() {
        for mode in [ConversionMode::Fidelity, ConversionMode::Balanced] {
            assert_eq!(select_strategy(&page(0, false), &options(mode)), RenderStrategy::VectorOnly);
        }
    }

    #[test]
    fn fidelity_and_editable() {
        assert_eq!(
            select_strategy(&page(500, true), &options(ConversionMode::Fidelity)),
            RenderStrategy::RasterWithText
        );
        assert_eq!(
            select_strategy(&page(0, true), &options(ConversionMode::Editable)),
            RenderStrategy::VectorOnly
        );
    }
}
