//! Configuration types for PDF-to-deck conversion.
//!
//! Two layers:
//!
//! * [`ConversionOptions`]: the closed set of four options that change what
//!   the deck looks like (`mode`, `slide_layout`, `image_scale`, `debug`).
//!   Supplied once per conversion and never mutated mid-run.
//! * [`ConversionConfig`]: everything else a run needs (page selection,
//!   password, concurrency, remote worker settings, the deck writer and an
//!   optional progress callback), built via [`ConversionConfigBuilder`].
//!
//! Values that arrive as strings (CLI flags, JSON, environment) are
//! normalised at the boundary: unknown modes fall back to
//! [`ConversionMode::Fidelity`], unknown layouts to [`SlideLayout::Wide`],
//! and the image scale is clamped to `[1, 3]`.

use crate::deck::{DeckWriter, JsonDeckWriter};
use crate::error::Pdf2DeckError;
use crate::geometry::{clamp, SlideSize};
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Lowest accepted raster scale.
pub const IMAGE_SCALE_MIN: f64 = 1.0;
/// Highest accepted raster scale.
pub const IMAGE_SCALE_MAX: f64 = 3.0;

// ── Enums ────────────────────────────────────────────────────────────────

/// How a page is rebuilt on its slide.
///
/// | Mode | Page raster | Vector text |
/// |------|-------------|-------------|
/// | `fidelity` | always (background) | always |
/// | `balanced` | only for sparse pages (< 12 runs) | always |
/// | `editable` | never | always |
/// | `remote_high_precision` | decided by the external worker | |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionMode {
    /// Pixel-faithful background with editable text on top. (default)
    #[default]
    Fidelity,
    /// Text only; the page image is never rendered.
    Editable,
    /// Raster background only where text is sparse.
    Balanced,
    /// Hand the whole document to the external high-precision worker.
    #[serde(alias = "local_high_precision")]
    RemoteHighPrecision,
}

impl ConversionMode {
    /// The raster scale used when none is given explicitly.
    pub fn default_image_scale(self) -> f64 {
        match self {
            ConversionMode::Fidelity => 2.0,
            ConversionMode::Balanced => 1.75,
            ConversionMode::Editable => 1.25,
            ConversionMode::RemoteHighPrecision => 2.0,
        }
    }

    /// `false` only for modes that never put a page image on a slide.
    pub fn captures_raster(self) -> bool {
        self != ConversionMode::Editable
    }

    pub fn is_remote(self) -> bool {
        self == ConversionMode::RemoteHighPrecision
    }

    /// Lenient parse: anything unrecognised becomes the default mode.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConversionMode::Fidelity => "fidelity",
            ConversionMode::Editable => "editable",
            ConversionMode::Balanced => "balanced",
            ConversionMode::RemoteHighPrecision => "remote_high_precision",
        }
    }
}

impl FromStr for ConversionMode {
    type Err = Pdf2DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fidelity" => Ok(ConversionMode::Fidelity),
            "editable" => Ok(ConversionMode::Editable),
            "balanced" => Ok(ConversionMode::Balanced),
            "remote_high_precision" | "local_high_precision" | "remote" => {
                Ok(ConversionMode::RemoteHighPrecision)
            }
            other => Err(Pdf2DeckError::InvalidConfig(format!(
                "unknown mode '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target slide geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideLayout {
    /// 4:3, 10 × 7.5 in.
    #[serde(alias = "LAYOUT_STANDARD")]
    Standard,
    /// 16:9, 13.333 × 7.5 in. (default)
    #[default]
    #[serde(alias = "LAYOUT_WIDE")]
    Wide,
}

impl SlideLayout {
    pub fn size(self) -> SlideSize {
        match self {
            SlideLayout::Standard => SlideSize {
                width: 10.0,
                height: 7.5,
            },
            SlideLayout::Wide => SlideSize {
                width: 13.333,
                height: 7.5,
            },
        }
    }

    /// Lenient parse: anything unrecognised becomes the wide layout.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SlideLayout::Standard => "standard",
            SlideLayout::Wide => "wide",
        }
    }
}

impl FromStr for SlideLayout {
    type Err = Pdf2DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "layout_standard" | "4:3" => Ok(SlideLayout::Standard),
            "wide" | "layout_wide" | "16:9" => Ok(SlideLayout::Wide),
            other => Err(Pdf2DeckError::InvalidConfig(format!(
                "unknown slide layout '{other}'"
            ))),
        }
    }
}

impl fmt::Display for SlideLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ConversionOptions ────────────────────────────────────────────────────

/// The four options that shape the generated deck.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionOptions {
    pub mode: ConversionMode,
    pub slide_layout: SlideLayout,
    /// Raster scale factor, always within `[1, 3]`.
    pub image_scale: f64,
    /// Emit a conversion summary to the log.
    pub debug: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        let mode = ConversionMode::default();
        Self {
            mode,
            slide_layout: SlideLayout::default(),
            image_scale: mode.default_image_scale(),
            debug: false,
        }
    }
}

impl ConversionOptions {
    /// Normalise loosely-typed option values.
    ///
    /// `image_scale = None` (or a non-finite value) selects the mode's
    /// default scale.
    pub fn from_raw(mode: &str, slide_layout: &str, image_scale: Option<f64>, debug: bool) -> Self {
        let mode = ConversionMode::parse_lenient(mode);
        Self {
            mode,
            slide_layout: SlideLayout::parse_lenient(slide_layout),
            image_scale: resolve_image_scale(mode, image_scale),
            debug,
        }
    }

    pub fn slide_size(&self) -> SlideSize {
        self.slide_layout.size()
    }
}

fn resolve_image_scale(mode: ConversionMode, requested: Option<f64>) -> f64 {
    match requested {
        Some(scale) if scale.is_finite() => clamp(scale, IMAGE_SCALE_MIN, IMAGE_SCALE_MAX),
        _ => mode.default_image_scale(),
    }
}

// ── Remote worker settings ───────────────────────────────────────────────

/// Tuning parameters forwarded verbatim to the external worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteParams {
    /// Pipeline identifier understood by the worker.
    pub mode: String,
    pub vector_tolerance_pt: f64,
    pub cluster_gap_pt: f64,
    pub background_filter_ratio: f64,
    pub min_icon_size_pt: f64,
    pub max_icon_size_pt: f64,
    pub debug: bool,
}

impl Default for RemoteParams {
    fn default() -> Self {
        Self {
            mode: "local_high_precision".into(),
            vector_tolerance_pt: 0.6,
            cluster_gap_pt: 6.0,
            background_filter_ratio: 0.35,
            min_icon_size_pt: 8.0,
            max_icon_size_pt: 220.0,
            debug: false,
        }
    }
}

/// Where the external worker lives and how patiently it is polled.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSettings {
    /// API root, e.g. `http://127.0.0.1:8000/api/v1`.
    pub base_url: String,
    /// Delay between two status polls. Default: 1 s.
    pub poll_interval: Duration,
    /// Ceiling on total polling time. Default: 20 min.
    pub timeout: Duration,
    /// Per-request HTTP timeout. Default: 120 s.
    pub request_timeout: Duration,
    pub params: RemoteParams,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/v1".into(),
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(20 * 60),
            request_timeout: Duration::from_secs(120),
            params: RemoteParams::default(),
        }
    }
}

// ── ConversionConfig ─────────────────────────────────────────────────────

/// Configuration for a PDF-to-deck conversion.
///
/// # Example
/// ```rust
/// use edgequake_pdf2deck::{ConversionConfig, ConversionMode, SlideLayout};
///
/// let config = ConversionConfig::builder()
///     .mode(ConversionMode::Balanced)
///     .slide_layout(SlideLayout::Standard)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.options.image_scale, 1.75);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    pub options: ConversionOptions,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Number of pages reflowed concurrently. Default: 4.
    pub concurrency: usize,

    /// External worker used by [`ConversionMode::RemoteHighPrecision`].
    pub remote: RemoteSettings,

    /// Serialiser for locally built decks. Default: [`JsonDeckWriter`].
    pub deck_writer: Arc<dyn DeckWriter>,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            options: ConversionOptions::default(),
            pages: PageSelection::default(),
            password: None,
            concurrency: 4,
            remote: RemoteSettings::default(),
            deck_writer: Arc::new(JsonDeckWriter::default()),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("options", &self.options)
            .field("pages", &self.pages)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("concurrency", &self.concurrency)
            .field("remote", &self.remote)
            .field("deck_writer", &self.deck_writer.file_extension())
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
            image_scale: None,
        }
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
    image_scale: Option<f64>,
}

impl ConversionConfigBuilder {
    pub fn options(mut self, options: ConversionOptions) -> Self {
        self.image_scale = Some(options.image_scale);
        self.config.options = options;
        self
    }

    pub fn mode(mut self, mode: ConversionMode) -> Self {
        self.config.options.mode = mode;
        self
    }

    pub fn slide_layout(mut self, layout: SlideLayout) -> Self {
        self.config.options.slide_layout = layout;
        self
    }

    /// Explicit raster scale; clamped to `[1, 3]` at build time.
    pub fn image_scale(mut self, scale: f64) -> Self {
        self.image_scale = Some(scale);
        self
    }

    pub fn debug(mut self, v: bool) -> Self {
        self.config.options.debug = v;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn remote_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.remote.base_url = url.into();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.remote.poll_interval = interval;
        self
    }

    pub fn remote_timeout(mut self, timeout: Duration) -> Self {
        self.config.remote.timeout = timeout;
        self
    }

    pub fn remote_params(mut self, params: RemoteParams) -> Self {
        self.config.remote.params = params;
        self
    }

    pub fn deck_writer(mut self, writer: Arc<dyn DeckWriter>) -> Self {
        self.config.deck_writer = writer;
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<ConversionConfig, Pdf2DeckError> {
        let mode = self.config.options.mode;
        self.config.options.image_scale = resolve_image_scale(mode, self.image_scale);

        let c = &mut self.config;
        if c.concurrency == 0 {
            return Err(Pdf2DeckError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.remote.poll_interval.is_zero() {
            return Err(Pdf2DeckError::InvalidConfig(
                "Poll interval must be greater than zero".into(),
            ));
        }
        if c.remote.timeout < c.remote.poll_interval {
            return Err(Pdf2DeckError::InvalidConfig(format!(
                "Remote timeout ({:?}) is shorter than the poll interval ({:?})",
                c.remote.timeout, c.remote.poll_interval
            )));
        }
        let base = c.remote.base_url.trim().trim_end_matches('/');
        if reqwest::Url::parse(base).is_err() {
            return Err(Pdf2DeckError::InvalidConfig(format!(
                "Remote base URL '{}' is not a valid URL",
                c.remote.base_url
            )));
        }
        c.remote.base_url = base.to_string();
        // The worker's own debug flag follows the conversion's.
        c.remote.params.debug = c.remote.params.debug || c.options.debug;
        Ok(self.config)
    }
}

// ── Page selection ───────────────────────────────────────────────────────

/// Specifies which pages of the PDF become slides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Every page (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let in_range = |p: usize| p >= 1 && p <= total_pages;
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => in_range(*p).then(|| p - 1).into_iter().collect(),
            PageSelection::Range(start, end) => ((*start).max(1) - 1..(*end).min(total_pages)).collect(),
            PageSelection::Set(pages) => pages.iter().copied().filter(|&p| in_range(p)).map(|p| p - 1).collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

impl FromStr for PageSelection {
    type Err = Pdf2DeckError;

    /// Accepts `all`, `5`, `3-15` or `1,3,5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bad = || Pdf2DeckError::InvalidConfig(format!("invalid page selection '{s}'"));
        let page = |v: &str| v.trim().parse::<usize>().ok().filter(|&p| p >= 1);

        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }
        if s.contains(',') {
            let pages = s.split(',').map(page).collect::<Option<Vec<_>>>().ok_or_else(bad)?;
            return Ok(PageSelection::Set(pages));
        }
        if let Some((start, end)) = s.split_once('-') {
            let (start, end) = (page(start).ok_or_else(bad)?, page(end).ok_or_else(bad)?);
            if start > end {
                return Err(bad());
            }
            return Ok(PageSelection::Range(start, end));
        }
        page(s).map(PageSelection::Single).ok_or_else(bad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_mode_falls_back_to_fidelity() {
        assert_eq!(ConversionMode::parse_lenient("turbo"), ConversionMode::Fidelity);
        assert_eq!(ConversionMode::parse_lenient("Balanced"), ConversionMode::Balanced);
        assert_eq!(
            ConversionMode::parse_lenient("local_high_precision"),
            ConversionMode::RemoteHighPrecision
        );
    }

    #[test]
    fn layout_sizes_and_fallback() {
        assert_eq!(SlideLayout::parse_lenient("LAYOUT_STANDARD"), SlideLayout::Standard);
        assert_eq!(SlideLayout::parse_lenient("???"), SlideLayout::Wide);
        assert_eq!(SlideLayout::Standard.size().width, 10.0);
        assert_eq!(SlideLayout::Wide.size().width, 13.333);
        assert_eq!(SlideLayout::Wide.size().height, 7.5);
    }

    #[test]
    fn options_from_raw_clamps_scale() {
        let o = ConversionOptions::from_raw("editable", "wide", Some(9.0), false);
        assert_eq!(o.image_scale, 3.0);
        let o = ConversionOptions::from_raw("editable", "wide", Some(0.1), false);
        assert_eq!(o.image_scale, 1.0);
        let o = ConversionOptions::from_raw("editable", "wide", None, false);
        assert_eq!(o.image_scale, 1.25);
        let o = ConversionOptions::from_raw("nope", "wide", Some(f64::NAN), true);
        assert_eq!(o.mode, ConversionMode::Fidelity);
        assert_eq!(o.image_scale, 2.0);
        assert!(o.debug);
    }

    #[test]
    fn options_deserialise_with_aliases() {
        let o: ConversionOptions = serde_json::from_str(
            r#"{"mode":"local_high_precision","slide_layout":"LAYOUT_STANDARD","image_scale":2.0,"debug":false}"#,
        )
        .unwrap();
        assert_eq!(o.mode, ConversionMode::RemoteHighPrecision);
        assert_eq!(o.slide_layout, SlideLayout::Standard);
    }

    #[test]
    fn builder_uses_mode_default_scale() {
        let c = ConversionConfig::builder()
            .mode(ConversionMode::Balanced)
            .build()
            .unwrap();
        assert_eq!(c.options.image_scale, 1.75);

        let c = ConversionConfig::builder()
            .mode(ConversionMode::Balanced)
            .image_scale(2.5)
            .build()
            .unwrap();
        assert_eq!(c.options.image_scale, 2.5);
    }

    #[test]
    fn builder_rejects_bad_remote_settings() {
        let err = ConversionConfig::builder()
            .poll_interval(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, Pdf2DeckError::InvalidConfig(_)));

        let err = ConversionConfig::builder()
            .remote_base_url("not a url")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn builder_trims_trailing_slash_and_propagates_debug() {
        let c = ConversionConfig::builder()
            .remote_base_url("http://worker:9000/api/v1/")
            .debug(true)
            .build()
            .unwrap();
        assert_eq!(c.remote.base_url, "http://worker:9000/api/v1");
        assert!(c.remote.params.debug);
    }

    #[test]
    fn remote_defaults() {
        let r = RemoteSettings::default();
        assert_eq!(r.poll_interval, Duration::from_secs(1));
        assert_eq!(r.timeout, Duration::from_secs(1200));
        assert_eq!(r.params.mode, "local_high_precision");
        assert_eq!(r.params.max_icon_size_pt, 220.0);
    }

    #[test]
    fn page_selection_parsing() {
        assert_eq!("all".parse::<PageSelection>().unwrap(), PageSelection::All);
        assert_eq!("5".parse::<PageSelection>().unwrap(), PageSelection::Single(5));
        assert_eq!("3-15".parse::<PageSelection>().unwrap(), PageSelection::Range(3, 15));
        assert_eq!(
            "1, 3,5".parse::<PageSelection>().unwrap(),
            PageSelection::Set(vec![1, 3, 5])
        );
        assert!("0".parse::<PageSelection>().is_err());
        assert!("9-2".parse::<PageSelection>().is_err());
        assert!("a,b".parse::<PageSelection>().is_err());
    }

    #[test]
    fn page_selection_indices() {
        assert_eq!(PageSelection::All.to_indices(3), vec![0, 1, 2]);
        assert_eq!(PageSelection::Single(4).to_indices(3), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 10).to_indices(4), vec![1, 2, 3]);
        assert_eq!(PageSelection::Set(vec![3, 1, 3, 9]).to_indices(4), vec![0, 2]);
    }
}
