//! # edgequake-pdf2deck
//!
//! Reflow PDF documents into editable slide decks.
//!
//! ## Why this crate?
//!
//! A PDF page is a bag of positioned glyph runs. Dropping a page image onto a
//! slide looks right but nothing can be edited; dumping the text loses the
//! layout. This crate rebuilds each page as a slide: text runs are
//! normalised, put back into reading order, merged into words and phrases,
//! and projected into slide coordinates as editable text boxes, optionally
//! on top of a rasterised copy of the page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      validate the local file (%PDF magic, permissions)
//!  ├─ 2. Capture    text items + optional raster via pdfium (spawn_blocking)
//!  ├─ 3. Normalise  raw items → text runs in page space
//!  ├─ 4. Order      line bands, left-to-right, then merge adjacent runs
//!  ├─ 5. Strategy   keep or drop the page raster, per mode
//!  ├─ 6. Layout     page space → slide inches, clamped into the slide
//!  └─ 7. Deck       one slide per page, encoded by a DeckWriter
//! ```
//!
//! `remote_high_precision` skips steps 2–7 and hands the file to an external
//! worker: submit, poll until done, download the deck and its report.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2deck::{convert, ConversionConfig, ConversionMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .mode(ConversionMode::Balanced)
//!         .build()?;
//!     let output = convert("document.pdf", &config).await?;
//!     std::fs::write(&output.file_name, &output.deck)?;
//!     eprintln!("{}", output.message);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2deck` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf2deck = { version = "0.1", default-features = false }
//! ```
//!
//! ## Choosing a Mode
//!
//! | Mode | Page image | Editable text | Best for |
//! |------|-----------|---------------|----------|
//! | `fidelity` | every page | yes | Default: looks like the PDF |
//! | `balanced` | sparse pages only | yes | Mixed text and figures |
//! | `editable` | never | yes | Text-heavy documents, small decks |
//! | `remote_high_precision` | worker decides | yes | Vector icons, complex layouts |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod deck;
pub mod document;
pub mod error;
pub mod geometry;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod remote;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, ConversionMode, ConversionOptions, PageSelection,
    RemoteParams, RemoteSettings, SlideLayout,
};
pub use convert::{
    convert, convert_from_bytes, convert_sync, convert_to_file, inspect, inspect_with_password, write_deck,
};
pub use deck::{DeckWriter, JsonDeckWriter, Slide, SlideDeck};
pub use document::{Color, PageDocument, TextRun};
pub use error::{ExtractionSkipped, Pdf2DeckError};
pub use output::{ConversionOutput, ConversionStats, DocumentMetadata, PageSummary};
pub use pipeline::strategy::RenderStrategy;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, ProgressUpdate};
pub use remote::{DiagnosticReport, HttpJobClient, JobBackend, JobSnapshot, JobStatus, RemoteJob};
pub use session::{CancelToken, ConversionSession, SessionTotals};
