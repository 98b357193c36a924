//! Small geometry toolkit shared by the normaliser and the layout projector.
//!
//! PDF positions live in *page space* (points, origin bottom-left); slides
//! live in *slide space* (inches, origin top-left). Only two primitives are
//! needed to move between them: a 2×3 affine [`Transform`] and a NaN-safe
//! [`clamp`].

use serde::{Deserialize, Serialize};

/// Clamp `value` into `[min, max]`.
///
/// Unlike [`f64::clamp`] this never panics: a non-finite value maps to
/// `min`, and when `min > max` the upper bound wins.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return min;
    }
    value.max(min).min(max)
}

/// A 2D affine transform `[a, b, c, d, e, f]` in PDF matrix order.
///
/// A point `(x, y)` maps to `(a·x + c·y + e, b·x + d·y + f)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform(pub [f64; 6]);

impl Transform {
    pub const IDENTITY: Transform = Transform([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    /// The viewport of a page at scale 1: flips the y axis so that text
    /// positions come out measured from the top edge.
    pub fn page_viewport(page_height: f64) -> Self {
        Transform([1.0, 0.0, 0.0, -1.0, 0.0, page_height])
    }

    /// Build a transform from the first six entries of a slice.
    ///
    /// Returns `None` when fewer than six values are present.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        let head: [f64; 6] = values.get(..6)?.try_into().ok()?;
        Some(Transform(head))
    }

    /// `self × other`: apply `other` first, then `self`.
    pub fn multiply(&self, other: &Transform) -> Transform {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Transform([
            a1 * a2 + c1 * b2,
            b1 * a2 + d1 * b2,
            a1 * c2 + c1 * d2,
            b1 * c2 + d1 * d2,
            a1 * e2 + c1 * f2 + e1,
            b1 * e2 + d1 * f2 + f1,
        ])
    }

    /// Horizontal translation component.
    pub fn e(&self) -> f64 {
        self.0[4]
    }

    /// Vertical translation component.
    pub fn f(&self) -> f64 {
        self.0[5]
    }
}

/// Slide dimensions in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlideSize {
    pub width: f64,
    pub height: f64,
}

/// A rectangle in slide space (inches, origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SlideRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl SlideRect {
    /// The rectangle covering the whole slide.
    pub fn full(size: SlideSize) -> Self {
        SlideRect {
            x: 0.0,
            y: 0.0,
            w: size.width,
            h: size.height,
        }
    }

    /// `true` when the rectangle lies fully inside the slide.
    pub fn fits_within(&self, size: SlideSize) -> bool {
        const EPS: f64 = 1e-9;
        self.x >= -EPS
            && self.y >= -EPS
            && self.w >= 0.0
            && self.h >= 0.0
            && self.x + self.w <= size.width + EPS
            && self.y + self.h <= size.height + EPS
    }
}
