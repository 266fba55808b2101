//! # Report Model
//!
//! The input representation for the table engine. A sensor table is a
//! header plus an ordered list of rows; every row is a list of cells, and
//! every cell carries its display value together with an alert
//! classification and a header flag.
//!
//! Page geometry (sizes, margins, orientation) and document metadata live
//! here too, since both the layout engine and the PDF surface consume them.

use serde::{Deserialize, Serialize};

/// Value of a cell that marks "no data" for a whole block in tables with
/// per-block headers.
pub const NO_DATA: &str = "-";

/// How a cell's value relates to the configured thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertState {
    #[default]
    None,
    /// Above the high threshold.
    High,
    /// Below the low threshold.
    Low,
}

impl AlertState {
    /// Classify a reading. Threshold values themselves are not alerts.
    pub fn classify(value: f64, thresholds: &Thresholds) -> Self {
        if thresholds.high.is_some_and(|high| value > high) {
            AlertState::High
        } else if thresholds.low.is_some_and(|low| value < low) {
            AlertState::Low
        } else {
            AlertState::None
        }
    }

    pub fn is_alert(self) -> bool {
        self != AlertState::None
    }
}

/// Alert thresholds for one sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

/// One table cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub value: String,
    #[serde(default)]
    pub alert: AlertState,
    #[serde(default)]
    pub is_header: bool,
}

impl Cell {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            alert: AlertState::None,
            is_header: false,
        }
    }

    pub fn high(value: impl Into<String>) -> Self {
        Self {
            alert: AlertState::High,
            ..Self::new(value)
        }
    }

    pub fn low(value: impl Into<String>) -> Self {
        Self {
            alert: AlertState::Low,
            ..Self::new(value)
        }
    }

    pub fn header(value: impl Into<String>) -> Self {
        Self {
            is_header: true,
            ..Self::new(value)
        }
    }

    /// The "no data" placeholder cell.
    pub fn no_data() -> Self {
        Self::new(NO_DATA)
    }

    /// A numeric reading formatted to two decimals and classified
    /// against `thresholds`.
    pub fn reading(value: f64, thresholds: &Thresholds) -> Self {
        Self {
            value: format!("{:.2}", value),
            alert: AlertState::classify(value, thresholds),
            is_header: false,
        }
    }

    pub fn is_no_data(&self) -> bool {
        self.value == NO_DATA
    }
}

pub type Row = Vec<Cell>;

/// Where a table's header labels come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "labels")]
pub enum HeaderSource {
    /// One header shared by every row.
    Flat(Vec<String>),
    /// One header per block (row group), indexed by block number.
    PerBlock(Vec<Vec<String>>),
}

impl HeaderSource {
    /// The header labels for a 0-based block index.
    pub fn header_for(&self, block: usize) -> Option<&[String]> {
        match self {
            HeaderSource::Flat(labels) => Some(labels),
            HeaderSource::PerBlock(blocks) => blocks.get(block).map(Vec::as_slice),
        }
    }

    pub fn is_per_block(&self) -> bool {
        matches!(self, HeaderSource::PerBlock(_))
    }
}

/// A sensor table: header definition plus rows of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorTable {
    pub header: HeaderSource,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl SensorTable {
    /// A table with one header shared by all rows.
    pub fn new<S: Into<String>>(header: impl IntoIterator<Item = S>) -> Self {
        Self {
            header: HeaderSource::Flat(header.into_iter().map(Into::into).collect()),
            rows: Vec::new(),
        }
    }

    /// A table whose header varies per block.
    pub fn with_block_headers(headers: Vec<Vec<String>>) -> Self {
        Self {
            header: HeaderSource::PerBlock(headers),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// The flat header labels, or an empty slice for per-block tables.
    pub fn flat_header(&self) -> &[String] {
        match &self.header {
            HeaderSource::Flat(labels) => labels,
            HeaderSource::PerBlock(_) => &[],
        }
    }
}

impl<'a> IntoIterator for &'a SensorTable {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

// ── Time/value series ───────────────────────────────────────────

/// One timestamp and the readings taken at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeValueRow {
    pub time: String,
    #[serde(default)]
    pub values: Vec<f64>,
}

impl TimeValueRow {
    pub fn new(time: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            time: time.into(),
            values,
        }
    }

    /// The time, then every value to two decimal places.
    pub fn texts(&self) -> Vec<String> {
        std::iter::once(self.time.clone())
            .chain(self.values.iter().map(|v| format!("{:.2}", v)))
            .collect()
    }
}

/// A titled run of rows. Time/value tables draw one series per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeValueSeries {
    pub header: String,
    #[serde(default)]
    pub rows: Vec<TimeValueRow>,
}

impl TimeValueSeries {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: TimeValueRow) {
        self.rows.push(row);
    }
}

/// A table of plain strings: one header row, then data rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlainTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

// ── Page geometry ───────────────────────────────────────────────

/// Standard page sizes in points (portrait).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points, portrait.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }

    /// Dimensions for the given orientation. Landscape swaps the sides.
    pub fn oriented(&self, orientation: Orientation) -> (f64, f64) {
        let (w, h) = self.dimensions();
        match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Edge values (top, right, bottom, left), used for page margins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Page size and margins for a document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSetup {
    #[serde(default)]
    pub size: PageSize,
    #[serde(default = "default_margin")]
    pub margin: Edges,
}

fn default_margin() -> Edges {
    Edges::uniform(36.0)
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margin: default_margin(),
        }
    }
}

/// Document metadata embedded in the PDF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}
