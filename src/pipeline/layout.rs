//! Stage 3: project page-space runs into slide space.
//!
//! Page coordinates are points with `y` measured up from the bottom edge;
//! slide coordinates are inches from the top-left corner. Projection scales
//! both axes independently, inflates the box height by 20 % so descenders
//! are not clipped, and then clamps every edge so the box stays inside the
//! slide with a small margin. Clamping is silent: callers get a `clamped`
//! flag for their statistics, never an error.

use crate::document::TextRun;
use crate::geometry::{clamp, SlideRect, SlideSize};

/// Points → slide font points.
pub const FONT_SCALE: f64 = 0.75;
/// Smallest projected font size.
pub const SLIDE_FONT_MIN: f64 = 8.0;
/// Largest projected font size.
pub const SLIDE_FONT_MAX: f64 = 72.0;
/// Extra height given to every text box.
pub const HEIGHT_INFLATION: f64 = 1.2;
/// Minimum box height, in inches.
pub const MIN_BOX_HEIGHT: f64 = 0.08;
/// Minimum box width, in inches.
pub const MIN_BOX_WIDTH: f64 = 0.1;
/// Margin kept between a box and the slide's left/top edge.
pub const EDGE_MARGIN: f64 = 0.05;

/// A projected text box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub rect: SlideRect,
    /// `true` when clamping moved or resized the raw box.
    pub clamped: bool,
}

/// Project a run's box from a `page_width × page_height` page onto `slide`.
pub fn project_run(run: &TextRun, page_width: f64, page_height: f64, slide: SlideSize) -> Projection {
    let (sw, sh) = (slide.width, slide.height);
    let pw = page_width.max(1.0);
    let ph = page_height.max(1.0);

    let raw_x = run.x / pw * sw;
    let raw_y = sh - run.y / ph * sh;
    let raw_w = run.w.max(0.0) / pw * sw;
    let raw_h = (run.h.max(1.0) / ph * sh * HEIGHT_INFLATION).max(MIN_BOX_HEIGHT);

    let x = clamp(raw_x, EDGE_MARGIN, sw - 0.15);
    let y = clamp(raw_y - raw_h, EDGE_MARGIN, sh - 0.1);
    let max_w = (sw - x - EDGE_MARGIN).max(MIN_BOX_WIDTH);
    let w = clamp(if raw_w > 0.0 { raw_w } else { 1.0 }, MIN_BOX_WIDTH, max_w);
    let h = clamp(raw_h, MIN_BOX_HEIGHT, sh - y - EDGE_MARGIN);

    let rect = SlideRect { x, y, w, h };
    let clamped = x != raw_x || y != raw_y - raw_h || w != raw_w || h != raw_h;
    if clamped {
        tracing::trace!(text = %run.text, ?rect, "text box clamped to slide bounds");
    }
    Projection { rect, clamped }
}

/// Convert a page font size to the slide font size.
pub fn project_font_size(font_size: f64) -> f64 {
    clamp(font_size * FONT_SCALE, SLIDE_FONT_MIN, SLIDE_FONT_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlideLayout;

    fn run(x: f64, y: f64, w: f64, h: f64) -> TextRun {
        TextRun {
            text: "t".into(),
            x,
            y,
            w,
            h,
            font_size: h,
            font_face: "Arial".into(),
        }
    }

    #[test]
    fn letter_page_onto_standard_slide() {
        let slide = SlideLayout::Standard.size();
        // 612 × 792 pt page, run at 1 inch from the left, 1 inch from the top.
        let p = project_run(&run(72.0, 720.0, 144.0, 12.0), 612.0, 792.0, slide);
        assert!(!p.clamped);
        let r = p.rect;
        assert!((r.x - 72.0 / 612.0 * 10.0).abs() < 1e-9);
        assert!((r.w - 144.0 / 612.0 * 10.0).abs() < 1e-9);
        let raw_h = 12.0 / 792.0 * 7.5 * 1.2;
        assert!((r.h - raw_h).abs() < 1e-9);
        let raw_y = 7.5 - 720.0 / 792.0 * 7.5;
        assert!((r.y - (raw_y - raw_h)).abs() < 1e-9);
    }

    #[test]
    fn off_page_runs_stay_on_slide() {
        let slide = SlideLayout::Wide.size();
        for r in [
            run(-500.0, 10_000.0, 50.0, 12.0),
            run(5_000.0, -300.0, 9_000.0, 400.0),
            run(611.0, 1.0, 0.0, 0.0),
        ] {
            let p = project_run(&r, 612.0, 792.0, slide);
            assert!(p.clamped);
            assert!(p.rect.fits_within(slide), "{:?}", p.rect);
        }
    }

    #[test]
    fn zero_width_gets_default_width() {
        let slide = SlideLayout::Standard.size();
        let p = project_run(&run(72.0, 400.0, 0.0, 12.0), 612.0, 792.0, slide);
        assert_eq!(p.rect.w, 1.0);
        assert!(p.clamped);
    }

    #[test]
    fn degenerate_page_size_does_not_divide_by_zero() {
        let slide = SlideLayout::Standard.size();
        let p = project_run(&run(0.5, 0.5, 0.5, 0.5), 0.0, 0.0, slide);
        assert!(p.rect.x.is_finite() && p.rect.y.is_finite());
        assert!(p.rect.fits_within(slide));
    }

    #[test]
    fn font_projection() {
        assert_eq!(project_font_size(12.0), 9.0);
        assert_eq!(project_font_size(8.0), 8.0);
        assert_eq!(project_font_size(200.0), 72.0);
        assert_eq!(project_font_size(f64::NAN), 8.0);
    }
}
