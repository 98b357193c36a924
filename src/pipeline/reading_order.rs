//! Stage 2: reading order and run merging.
//!
//! PDF content streams emit text in drawing order, which is frequently not
//! reading order, and a single visual word is often split across several
//! glyph runs. This stage sorts runs top-to-bottom, left-to-right and fuses
//! neighbours on the same line into logical blocks.
//!
//! ## Ordering
//!
//! Two runs share a line when their baselines are within
//! [`LINE_TOLERANCE`]. That relation is not transitive (a → b and b → c
//! within tolerance does not imply a → c), so it cannot be fed to a sort
//! comparator directly. Instead runs are visited from the top of the page
//! down; each *band* is anchored at its highest run and takes every run
//! within tolerance of that anchor. Bands are then ordered left to right
//! with content tie-breakers, giving a strict total order that only depends
//! on the set of runs.
//!
//! ## Merging
//!
//! [`merge_runs`] only accepts [`OrderedRuns`], so it cannot be called on
//! runs that skipped the sorter.

use crate::document::TextRun;
use std::cmp::Ordering;

/// Maximum baseline difference for two runs to share a line.
pub const LINE_TOLERANCE: f64 = 2.0;
/// Maximum font-size difference for two runs to merge.
pub const FONT_TOLERANCE: f64 = 1.5;
/// Largest horizontal gap bridged by a merge.
pub const MERGE_GAP: f64 = 8.0;
/// Largest overlap tolerated by a merge.
pub const MERGE_OVERLAP: f64 = 1.0;
/// Gaps wider than this insert a space between merged texts.
pub const SPACE_GAP: f64 = 0.2;

const NO_SPACE_BEFORE: &[char] = &[',', '.', ';', ':', '!', '?', ')'];

/// Runs in reading order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedRuns(Vec<TextRun>);

impl OrderedRuns {
    pub fn as_slice(&self) -> &[TextRun] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<TextRun> {
        self.0
    }
}

/// `true` when two baselines are within [`LINE_TOLERANCE`].
pub fn same_line(a: &TextRun, b: &TextRun) -> bool {
    (a.y - b.y).abs() <= LINE_TOLERANCE
}

/// Sort runs into reading order.
pub fn sort_runs(mut runs: Vec<TextRun>) -> OrderedRuns {
    runs.sort_by(|a, b| b.y.total_cmp(&a.y).then_with(|| tie_break(a, b)));

    let mut ordered = Vec::with_capacity(runs.len());
    let mut band: Vec<TextRun> = Vec::new();
    for run in runs {
        if band.first().is_some_and(|anchor| !same_line(anchor, &run)) {
            flush_band(&mut band, &mut ordered);
        }
        band.push(run);
    }
    flush_band(&mut band, &mut ordered);
    OrderedRuns(ordered)
}

fn flush_band(band: &mut Vec<TextRun>, out: &mut Vec<TextRun>) {
    band.sort_by(|a, b| a.x.total_cmp(&b.x).then_with(|| b.y.total_cmp(&a.y)).then_with(|| tie_break(a, b)));
    out.append(band);
}

fn tie_break(a: &TextRun, b: &TextRun) -> Ordering {
    a.x.total_cmp(&b.x)
        .then_with(|| a.text.cmp(&b.text))
        .then_with(|| a.w.total_cmp(&b.w))
        .then_with(|| a.font_size.total_cmp(&b.font_size))
        .then_with(|| a.h.total_cmp(&b.h))
        .then_with(|| a.font_face.cmp(&b.font_face))
}

/// Fuse adjacent same-line runs into logical text blocks.
///
/// A run joins the block before it when it sits on the same line, its font
/// size is within [`FONT_TOLERANCE`], and the gap from the block's right
/// edge lies in `[-MERGE_OVERLAP, MERGE_GAP]`. The block keeps its origin;
/// width grows to cover the new run and height/font size take the maximum.
pub fn merge_runs(ordered: &OrderedRuns) -> OrderedRuns {
    let mut merged: Vec<TextRun> = Vec::with_capacity(ordered.len());
    let mut runs = ordered.as_slice().iter();
    let Some(first) = runs.next() else {
        return OrderedRuns::default();
    };

    let mut current = first.clone();
    for next in runs {
        let gap = next.x - (current.x + current.w.max(0.0));
        let fuses = same_line(&current, next)
            && (current.font_size - next.font_size).abs() <= FONT_TOLERANCE
            && (-MERGE_OVERLAP..=MERGE_GAP).contains(&gap);

        if !fuses {
            merged.push(std::mem::replace(&mut current, next.clone()));
            continue;
        }

        if needs_space(&current.text, &next.text, gap) {
            current.text.push(' ');
        }
        current.text.push_str(&next.text);
        current.w = current.w.max(next.x + next.w - current.x);
        current.h = current.h.max(next.h);
        current.font_size = current.font_size.max(next.font_size);
    }
    merged.push(current);
    OrderedRuns(merged)
}

fn needs_space(left: &str, right: &str, gap: f64) -> bool {
    let (Some(last), Some(first)) = (left.chars().last(), right.chars().next()) else {
        return false;
    };
    gap > SPACE_GAP && !last.is_whitespace() && !first.is_whitespace() && !NO_SPACE_BEFORE.contains(&first)
}
