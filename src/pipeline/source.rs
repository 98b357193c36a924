//! Document backends and page capture.
//!
//! The reflow engine never talks to a PDF library directly. It sees two
//! capabilities:
//!
//! * [`DocumentSource`]: page count and page lookup.
//! * [`PageHandle`]: page size, positioned text items, and a bitmap render
//!   at a given scale.
//!
//! [`capture_document`] walks the selected pages of any source in page order
//! and hands each [`RawPage`] to a [`PageSink`]. The pdfium implementation
//! lives at the bottom of this file.
//!
//! ## Why spawn_blocking?
//!
//! pdfium keeps thread-local state and is not safe to call from async
//! contexts, so every pdfium call happens inside
//! `tokio::task::spawn_blocking` and pages flow out over a channel.

use crate::config::{ConversionOptions, PageSelection};
use crate::document::{PageRaster, RawTextItem};
use crate::error::Pdf2DeckError;
use crate::geometry::Transform;
use crate::output::DocumentMetadata;
use crate::pipeline::encode::encode_raster;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

// ── Capabilities ─────────────────────────────────────────────────────────

/// Page dimensions in points at scale 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// One page of a document backend.
pub trait PageHandle {
    fn size(&self) -> PageSize;

    /// Maps user space to top-down viewport space at scale 1.
    fn viewport_transform(&self) -> Transform {
        Transform::page_viewport(self.size().height)
    }

    /// Positioned text items, in content-stream order.
    fn text_items(&self) -> Result<Vec<RawTextItem>, Pdf2DeckError>;

    /// Render the page at `scale` × its natural size.
    fn render_to_bitmap(&self, scale: f64) -> Result<DynamicImage, Pdf2DeckError>;
}

/// A paginated document.
pub trait DocumentSource {
    type Page<'p>: PageHandle
    where
        Self: 'p;

    fn page_count(&self) -> usize;

    /// Look up a page by 0-based index.
    fn page(&self, index: usize) -> Result<Self::Page<'_>, Pdf2DeckError>;
}

// ── Capture ──────────────────────────────────────────────────────────────

/// Everything read from one page before reflow.
#[derive(Debug, Clone)]
pub struct RawPage {
    /// 1-indexed.
    pub page_number: usize,
    pub size: PageSize,
    pub viewport: Transform,
    pub items: Vec<RawTextItem>,
    pub raster: Option<PageRaster>,
}

/// Messages emitted while a document is captured.
#[derive(Debug)]
pub enum CaptureEvent {
    /// The document is open; `selected` pages will follow.
    Opened { total_pages: usize, selected: usize },
    Page(RawPage),
}

/// Sending half of the capture channel, used from blocking threads.
pub struct PageSink {
    tx: mpsc::Sender<CaptureEvent>,
}

impl PageSink {
    pub fn channel(buffer: usize) -> (PageSink, mpsc::Receiver<CaptureEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (PageSink { tx }, rx)
    }

    fn send(&self, event: CaptureEvent) -> Result<(), Pdf2DeckError> {
        self.tx
            .blocking_send(event)
            .map_err(|_| Pdf2DeckError::Internal("page consumer stopped before capture finished".into()))
    }
}

/// Read one page: text items always, a raster only when the mode keeps
/// page images.
pub fn capture_page<P: PageHandle>(
    page: &P,
    page_number: usize,
    options: &ConversionOptions,
) -> Result<RawPage, Pdf2DeckError> {
    let size = page.size();
    let items = page.text_items()?;
    let raster = if options.mode.captures_raster() {
        let bitmap = page.render_to_bitmap(options.image_scale)?;
        Some(encode_raster(&bitmap, page_number)?)
    } else {
        None
    };
    debug!(page = page_number, items = items.len(), raster = raster.is_some(), "captured page");
    Ok(RawPage {
        page_number,
        size,
        viewport: page.viewport_transform(),
        items,
        raster,
    })
}

/// Capture the selected pages of `source` in page order.
pub fn capture_document<S: DocumentSource>(
    source: &S,
    selection: &PageSelection,
    options: &ConversionOptions,
    sink: &PageSink,
) -> Result<(), Pdf2DeckError> {
    let total_pages = source.page_count();
    let indices = selection.to_indices(total_pages);
    if indices.is_empty() && total_pages > 0 {
        return Err(Pdf2DeckError::InvalidConfig(format!(
            "page selection {selection:?} matches none of the {total_pages} pages"
        )));
    }
    info!("Document opened: {} pages, {} selected", total_pages, indices.len());
    sink.send(CaptureEvent::Opened {
        total_pages,
        selected: indices.len(),
    })?;

    for idx in indices {
        let page = source.page(idx)?;
        sink.send(CaptureEvent::Page(capture_page(&page, idx + 1, options)?))?;
    }
    Ok(())
}

// ── pdfium backend ───────────────────────────────────────────────────────

/// Bind to the pdfium shared library.
///
/// Lookup order: `PDFIUM_LIB_PATH` (a file, or a directory holding the
/// platform library), the current directory, then the system library path.
pub fn bind_pdfium() -> Result<Pdfium, Pdf2DeckError> {
    let bindings = match std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from) {
        Some(path) if path.is_dir() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&path))
        }
        Some(path) => Pdfium::bind_to_library(&path),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| Pdf2DeckError::PdfiumBindingFailed(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}

/// Open a PDF, classifying pdfium's failure into a useful error.
pub fn open_pdf<'a>(
    pdfium: &'a Pdfium,
    path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Pdf2DeckError> {
    pdfium.load_pdf_from_file(path, password).map_err(|e| {
        let detail = format!("{e:?}");
        if detail.to_ascii_lowercase().contains("password") {
            if password.is_some() {
                Pdf2DeckError::WrongPassword { path: path.to_path_buf() }
            } else {
                Pdf2DeckError::PasswordRequired { path: path.to_path_buf() }
            }
        } else {
            Pdf2DeckError::CorruptPdf {
                path: path.to_path_buf(),
                detail,
            }
        }
    })
}

/// A pdfium document seen through [`DocumentSource`].
pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumDocument<'a> {
    pub fn new(document: PdfDocument<'a>) -> Self {
        Self { document }
    }
}

impl<'a> DocumentSource for PdfiumDocument<'a> {
    type Page<'p>
        = PdfiumPage<'a>
    where
        Self: 'p;

    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page(&self, index: usize) -> Result<PdfiumPage<'a>, Pdf2DeckError> {
        let total = self.page_count();
        if index >= total {
            return Err(Pdf2DeckError::PageOutOfRange {
                page: index + 1,
                total,
            });
        }
        let page = self
            .document
            .pages()
            .get(index as u16)
            .map_err(|e| Pdf2DeckError::RasterisationFailed {
                page: index + 1,
                detail: format!("{e:?}"),
            })?;
        Ok(PdfiumPage {
            page,
            number: index + 1,
        })
    }
}

/// One pdfium page.
pub struct PdfiumPage<'a> {
    page: PdfPage<'a>,
    number: usize,
}

impl PageHandle for PdfiumPage<'_> {
    fn size(&self) -> PageSize {
        PageSize {
            width: f64::from(self.page.width().value),
            height: f64::from(self.page.height().value),
        }
    }

    fn text_items(&self) -> Result<Vec<RawTextItem>, Pdf2DeckError> {
        let mut items = Vec::new();
        for object in self.page.objects().iter() {
            let Some(text) = object.as_text_object() else {
                continue;
            };
            let transform = match text.matrix() {
                Ok(m) => Some(
                    [m.a(), m.b(), m.c(), m.d(), m.e(), m.f()]
                        .into_iter()
                        .map(f64::from)
                        .collect(),
                ),
                Err(e) => {
                    warn!(page = self.number, "text object without matrix: {e:?}");
                    None
                }
            };
            items.push(RawTextItem {
                text: Some(text.text()),
                transform,
                width: object.width().map(|w| f64::from(w.value)).unwrap_or(0.0),
                height: f64::from(text.scaled_font_size().value),
                font_name: Some(text.font().family()),
            });
        }
        Ok(items)
    }

    fn render_to_bitmap(&self, scale: f64) -> Result<DynamicImage, Pdf2DeckError> {
        let config = PdfRenderConfig::new().scale_page_by_factor(scale as f32);
        let bitmap = self
            .page
            .render_with_config(&config)
            .map_err(|e| Pdf2DeckError::RasterisationFailed {
                page: self.number,
                detail: format!("{e:?}"),
            })?;
        Ok(bitmap.as_image())
    }
}

/// Capture the selected pages of a PDF file. Blocking; run it inside
/// `spawn_blocking`.
pub fn capture_pdf_blocking(
    path: &Path,
    password: Option<&str>,
    selection: &PageSelection,
    options: &ConversionOptions,
    sink: &PageSink,
) -> Result<(), Pdf2DeckError> {
    let pdfium = bind_pdfium()?;
    let document = PdfiumDocument::new(open_pdf(&pdfium, path, password)?);
    capture_document(&document, selection, options, sink)
}

/// Extract document metadata from a PDF without capturing pages.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2DeckError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(str::to_string);

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| Pdf2DeckError::Internal(format!("Metadata task panicked: {e}")))?
}

fn extract_metadata_blocking(pdf_path: &Path, password: Option<&str>) -> Result<DocumentMetadata, Pdf2DeckError> {
    let pdfium = bind_pdfium()?;
    let document = open_pdf(&pdfium, pdf_path, password)?;
    let metadata = document.metadata();
    let tag = |kind: PdfDocumentMetadataTagType| -> Option<String> {
        metadata
            .get(kind)
            .map(|t| t.value().to_string())
            .filter(|v| !v.is_empty())
    };

    let pages = document.pages();
    let (width, height) = match pages.get(0) {
        Ok(first) => (Some(f64::from(first.width().value)), Some(f64::from(first.height().value))),
        Err(_) => (None, None),
    };

    Ok(DocumentMetadata {
        title: tag(PdfDocumentMetadataTagType::Title),
        author: tag(PdfDocumentMetadataTagType::Author),
        subject: tag(PdfDocumentMetadataTagType::Subject),
        creator: tag(PdfDocumentMetadataTagType::Creator),
        producer: tag(PdfDocumentMetadataTagType::Producer),
        page_count: pages.len() as usize,
        pdf_version: format!("{:?}", document.version()),
        first_page_width: width,
        first_page_height: height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConversionMode;
    use image::{Rgba, RgbaImage};
    use std::cell::Cell;

    struct FakePage {
        renders: Cell<usize>,
    }

    impl PageHandle for FakePage {
        fn size(&self) -> PageSize {
            PageSize {
                width: 200.0,
                height: 100.0,
            }
        }

        fn text_items(&self) -> Result<Vec<RawTextItem>, Pdf2DeckError> {
            Ok(vec![RawTextItem {
                text: Some("hi".into()),
                transform: Some(vec![10.0, 0.0, 0.0, 10.0, 5.0, 50.0]),
                width: 10.0,
                height: 10.0,
                font_name: None,
            }])
        }

        fn render_to_bitmap(&self, scale: f64) -> Result<DynamicImage, Pdf2DeckError> {
            self.renders.set(self.renders.get() + 1);
            let (w, h) = ((200.0 * scale) as u32, (100.0 * scale) as u32);
            Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255; 4]))))
        }
    }

    fn options(mode: ConversionMode) -> ConversionOptions {
        ConversionOptions {
            mode,
            image_scale: 1.5,
            ..ConversionOptions::default()
        }
    }

    #[test]
    fn default_viewport_flips_page() {
        let page = FakePage { renders: Cell::new(0) };
        assert_eq!(page.viewport_transform(), Transform([1.0, 0.0, 0.0, -1.0, 0.0, 100.0]));
    }

    #[test]
    fn editable_mode_skips_rendering() {
        let page = FakePage { renders: Cell::new(0) };
        let raw = capture_page(&page, 1, &options(ConversionMode::Editable)).unwrap();
        assert!(raw.raster.is_none());
        assert_eq!(page.renders.get(), 0);
        assert_eq!(raw.items.len(), 1);
    }

    #[test]
    fn raster_uses_image_scale() {
        let page = FakePage { renders: Cell::new(0) };
        let raw = capture_page(&page, 2, &options(ConversionMode::Balanced)).unwrap();
        let raster = raw.raster.unwrap();
        assert_eq!((raster.width, raster.height), (300, 150));
        assert_eq!(raw.page_number, 2);
    }

    #[test]
    fn open_pdf_borrows_password_for_document_lifetime() {
        let Ok(pdfium) = bind_pdfium() else {
            println!("SKIP: pdfium library not available");
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.7\nnot really a pdf").unwrap();

        let password = String::from("secret");
        let result = open_pdf(&pdfium, &path, Some(password.as_str()));
        assert!(
            matches!(
                result,
                Err(Pdf2DeckError::CorruptPdf { .. }) | Err(Pdf2DeckError::WrongPassword { .. })
            ),
            "expected an open failure, got {:?}",
            result.as_ref().err()
        );
    }
}
