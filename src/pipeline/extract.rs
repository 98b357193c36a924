//! Per-page reflow: raw capture → normalised, ordered, merged runs.
//!
//! Each captured page is reflowed by its own blocking task. Tasks are
//! driven through `buffered`, so results come back in page order no matter
//! which task finishes first, and every counter lives in an atomic so tasks
//! never contend on a lock.

use crate::document::{Color, PageDocument, PageRaster};
use crate::error::Pdf2DeckError;
use crate::pipeline::normalize::normalize_items;
use crate::pipeline::reading_order::{merge_runs, sort_runs};
use crate::pipeline::source::RawPage;
use futures::stream::{Stream, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Counters shared by all page tasks of one conversion.
#[derive(Debug, Default)]
pub struct ExtractionStats {
    skipped_text_runs: AtomicUsize,
    merged_text_runs: AtomicUsize,
    raster_pages: AtomicUsize,
    text_runs: AtomicUsize,
}

/// Plain snapshot of [`ExtractionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionCounts {
    pub skipped_text_runs: usize,
    pub merged_text_runs: usize,
    pub raster_pages: usize,
    pub text_runs: usize,
}

impl ExtractionStats {
    pub fn snapshot(&self) -> ExtractionCounts {
        ExtractionCounts {
            skipped_text_runs: self.skipped_text_runs.load(Ordering::Relaxed),
            merged_text_runs: self.merged_text_runs.load(Ordering::Relaxed),
            raster_pages: self.raster_pages.load(Ordering::Relaxed),
            text_runs: self.text_runs.load(Ordering::Relaxed),
        }
    }
}

/// Background colour for a page.
///
/// Always white for now; the raster is not sampled.
pub fn estimate_background(_raster: Option<&PageRaster>) -> Color {
    Color::WHITE
}

/// Reflow one captured page.
pub fn reflow_page(raw: RawPage, stats: &ExtractionStats) -> PageDocument {
    let normalized = normalize_items(&raw.items, &raw.viewport, raw.size.height);
    let ordered = sort_runs(normalized.runs);
    let merged = merge_runs(&ordered);

    stats.skipped_text_runs.fetch_add(normalized.skipped, Ordering::Relaxed);
    stats.merged_text_runs.fetch_add(ordered.len() - merged.len(), Ordering::Relaxed);
    stats.text_runs.fetch_add(merged.len(), Ordering::Relaxed);
    if raw.raster.is_some() {
        stats.raster_pages.fetch_add(1, Ordering::Relaxed);
    }
    debug!(
        page = raw.page_number,
        items = raw.items.len(),
        skipped = normalized.skipped,
        runs = merged.len(),
        "reflowed page"
    );

    PageDocument {
        page_number: raw.page_number,
        width: raw.size.width,
        height: raw.size.height,
        background: estimate_background(raw.raster.as_ref()),
        text_runs: merged.into_vec(),
        raster: raw.raster,
    }
}

/// Reflow a stream of captured pages with up to `concurrency` pages in
/// flight, yielding documents in input order.
pub fn reflow_pages<S>(
    pages: S,
    stats: Arc<ExtractionStats>,
    concurrency: usize,
) -> impl Stream<Item = Result<PageDocument, Pdf2DeckError>>
where
    S: Stream<Item = RawPage>,
{
    pages
        .map(move |raw| {
            let stats = Arc::clone(&stats);
            async move {
                let page = raw.page_number;
                tokio::task::spawn_blocking(move || reflow_page(raw, &stats))
                    .await
                    .map_err(|e| Pdf2DeckError::Internal(format!("Reflow task for page {page} panicked: {e}")))
            }
        })
        .buffered(concurrency.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RawTextItem;
    use crate::geometry::Transform;
    use crate::pipeline::source::PageSize;

    fn item(text: &str, x: f64, y: f64, w: f64) -> RawTextItem {
        RawTextItem {
            text: Some(text.into()),
            transform: Some(vec![12.0, 0.0, 0.0, 12.0, x, y]),
            width: w,
            height: 12.0,
            font_name: Some("Helvetica".into()),
        }
    }

    fn raw_page(number: usize, items: Vec<RawTextItem>) -> RawPage {
        RawPage {
            page_number: number,
            size: PageSize {
                width: 612.0,
                height: 792.0,
            },
            viewport: Transform::page_viewport(792.0),
            items,
            raster: None,
        }
    }

    #[test]
    fn reflow_counts_skips_and_merges() {
        let stats = ExtractionStats::default();
        let doc = reflow_page(
            raw_page(
                1,
                vec![
                    item("World", 42.0, 700.0, 30.0),
                    item("  ", 0.0, 0.0, 0.0),
                    item("Hello", 10.0, 700.0, 30.0),
                ],
            ),
            &stats,
        );
        assert_eq!(doc.text_runs.len(), 1);
        assert_eq!(doc.text_runs[0].text, "Hello World");
        assert_eq!(doc.background, Color::WHITE);
        assert_eq!(
            stats.snapshot(),
            ExtractionCounts {
                skipped_text_runs: 1,
                merged_text_runs: 1,
                raster_pages: 0,
                text_runs: 1,
            }
        );
    }

    #[tokio::test]
    async fn stream_preserves_page_order() {
        let stats = Arc::new(ExtractionStats::default());
        // Heavier early pages would finish last if order were not preserved.
        let pages: Vec<RawPage> = (1..=8)
            .map(|n| {
                let items = (0..(9 - n) * 50)
                    .map(|i| item("w", (i % 40) as f64 * 14.0, 700.0 - (i / 40) as f64 * 20.0, 5.0))
                    .collect();
                raw_page(n, items)
            })
            .collect();

        let docs: Vec<PageDocument> = reflow_pages(futures::stream::iter(pages), stats.clone(), 4)
            .map(|r| r.unwrap())
            .collect()
            .await;

        let numbers: Vec<usize> = docs.iter().map(|d| d.page_number).collect();
        assert_eq!(numbers, (1..=8).collect::<Vec<_>>());
        assert_eq!(stats.snapshot().skipped_text_runs, 0);
    }
}
