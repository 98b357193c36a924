//! Stage 5: turn a reflowed page into a slide.

use crate::config::ConversionOptions;
use crate::deck::{Slide, TextStyle};
use crate::document::{Color, PageDocument};
use crate::geometry::SlideRect;
use crate::pipeline::encode::raster_to_slide_image;
use crate::pipeline::layout::{project_font_size, project_run};
use crate::pipeline::strategy::{select_strategy, RenderStrategy};

/// A slide plus what happened while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledSlide {
    pub slide: Slide,
    pub strategy: RenderStrategy,
    /// Text boxes that had to be clamped into the slide.
    pub clamped_boxes: usize,
}

/// Build the slide for `page`.
///
/// The raster (when the strategy keeps it) covers the whole slide and sits
/// below every text box. Runs whose text is blank after trimming are left
/// out.
pub fn build_slide(page: &PageDocument, options: &ConversionOptions) -> AssembledSlide {
    let size = options.slide_size();
    let strategy = select_strategy(page, options);

    let mut slide = Slide::new(page.page_number);
    slide.set_background(page.background);

    if strategy.uses_raster() {
        if let Some(raster) = &page.raster {
            slide.add_image(raster_to_slide_image(raster, SlideRect::full(size)));
        }
    }

    let mut clamped_boxes = 0;
    for run in &page.text_runs {
        let text = run.text.trim();
        if text.is_empty() {
            continue;
        }
        let projection = project_run(run, page.width, page.height, size);
        clamped_boxes += usize::from(projection.clamped);
        slide.add_text(
            text,
            TextStyle {
                rect: projection.rect,
                font_size: project_font_size(run.font_size),
                font_face: run.font_face.clone(),
                color: Color::TEXT,
            },
        );
    }

    AssembledSlide {
        slide,
        strategy,
        clamped_boxes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConversionMode, SlideLayout};
    use crate::document::{PageRaster, TextRun};

    fn page(raster: bool, runs: Vec<TextRun>) -> PageDocument {
        PageDocument {
            page_number: 4,
            width: 612.0,
            height: 792.0,
            text_runs: runs,
            raster: raster.then(|| PageRaster {
                png: vec![0x89, b'P', b'N', b'G'],
                width: 2,
                height: 2,
            }),
            background: Color::WHITE,
        }
    }

    fn run(text: &str) -> TextRun {
        TextRun {
            text: text.into(),
            x: 72.0,
            y: 700.0,
            w: 100.0,
            h: 16.0,
            font_size: 16.0,
            font_face: "Georgia".into(),
        }
    }

    #[test]
    fn fidelity_puts_raster_under_text() {
        let options = ConversionOptions {
            mode: ConversionMode::Fidelity,
            slide_layout: SlideLayout::Standard,
            ..ConversionOptions::default()
        };
        let built = build_slide(&page(true, vec![run("Title")]), &options);
        assert_eq!(built.strategy, RenderStrategy::RasterWithText);
        assert_eq!(built.slide.page_number, 4);
        assert_eq!(built.slide.images.len(), 1);
        assert_eq!(built.slide.images[0].rect, SlideRect::full(SlideLayout::Standard.size()));
        let text = &built.slide.texts[0];
        assert_eq!(text.text, "Title");
        assert_eq!(text.font_size, 12.0);
        assert_eq!(text.font_face, "Georgia");
        assert_eq!(text.color, Color::TEXT);
        assert_eq!(built.clamped_boxes, 0);
    }

    #[test]
    fn editable_never_adds_images() {
        let options = ConversionOptions {
            mode: ConversionMode::Editable,
            ..ConversionOptions::default()
        };
        let built = build_slide(&page(true, vec![run("a")]), &options);
        assert!(built.slide.images.is_empty());
        assert_eq!(built.slide.texts.len(), 1);
    }

    #[test]
    fn every_box_fits_the_slide() {
        let mut far = run("far away");
        far.x = 10_000.0;
        far.y = -50.0;
        let options = ConversionOptions::default();
        let built = build_slide(&page(false, vec![run("near"), far]), &options);
        assert_eq!(built.clamped_boxes, 1);
        for text in &built.slide.texts {
            assert!(text.rect.fits_within(options.slide_size()));
        }
    }
}
