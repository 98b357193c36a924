//! Pipeline stages for PDF-to-deck conversion.
//!
//! Each submodule implements one transformation step and is testable on its
//! own. The document backend sits behind the capability traits in
//! [`source`], so every stage after capture runs on plain data.
//!
//! ## Data Flow
//!
//! ```text
//! input ─▶ source ─▶ normalize ─▶ reading_order ─▶ strategy + layout ─▶ assemble
//! (path)   (pdfium)   (runs)       (sort, merge)    (per page)          (slide)
//! ```
//!
//! 1. [`input`]: validate the local PDF and name the output deck
//! 2. [`source`]: capture text items and rasters page by page; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]: PNG-encode rasters, base64 them for the slide description
//! 4. [`normalize`]: raw items → [`crate::document::TextRun`]s
//! 5. [`reading_order`]: reading order and run merging
//! 6. [`extract`]: task-per-page reflow with atomic counters
//! 7. [`strategy`] / [`layout`]: raster policy and slide-space projection
//! 8. [`assemble`]: one [`crate::deck::Slide`] per page

pub mod assemble;
pub mod encode;
pub mod extract;
pub mod input;
pub mod layout;
pub mod normalize;
pub mod reading_order;
pub mod source;
pub mod strategy;
