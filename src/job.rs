//! # Report Jobs
//!
//! A report described as JSON: page setup, fonts, style overrides, an
//! optional running header and footer, and a list of sections drawn top
//! to bottom. [`render_job_json`] is the whole pipeline in one call.
//!
//! ```text
//! JSON ─→ ReportJob ─→ Report (layout) ─→ PdfSurface ─→ PDF bytes
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::font::FontContext;
use crate::image_loader::load_image_file;
use crate::layout::{LayoutWarning, MergeOptions, PagePipe, PageState, Report, TableOutcome};
use crate::model::{Metadata, Orientation, PageSetup, PlainTable, SensorTable, TimeValueSeries};
use crate::pdf::PdfSurface;
use crate::style::{Align, Color, ReportStyle, Valign};
use crate::surface::Surface;

/// Placeholder replaced by the page number in footer text.
pub const PAGE_PLACEHOLDER: &str = "{page}";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportJob {
    pub metadata: Metadata,
    pub page: PageSetup,
    /// Orientation of the first page.
    pub orientation: Orientation,
    /// Font id to TrueType file path.
    pub fonts: BTreeMap<String, PathBuf>,
    pub style: ReportStyle,
    pub decoration: Option<PageDecoration>,
    pub sections: Vec<Section>,
}

/// Running header and footer, drawn on every page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageDecoration {
    /// Text at the top of each page, above a rule.
    pub header: Option<String>,
    /// Text at the bottom of each page. `{page}` becomes the page number.
    pub footer: Option<String>,
    pub footer_align: Align,
}

/// One piece of report content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Section {
    Header {
        text: String,
    },
    Title {
        text: String,
    },
    Subtitle {
        text: String,
    },
    /// A full-width colored bar with a heading.
    Section {
        text: String,
    },
    /// A sensor name over a colored rule.
    SensorHeading {
        text: String,
    },
    Paragraph {
        text: String,
        #[serde(default)]
        align: Align,
    },
    TwoColumn {
        left: String,
        right: String,
    },
    /// Table legend: a caption followed by max/min/avg labels in their
    /// own colors.
    Legend {
        #[serde(default)]
        text: String,
        #[serde(default)]
        max: Option<String>,
        #[serde(default)]
        min: Option<String>,
        #[serde(default)]
        avg: Option<String>,
    },
    Line {
        #[serde(default = "default_line_width")]
        width: f64,
        #[serde(default)]
        color: Option<Color>,
    },
    Break {
        height: f64,
    },
    PageBreak {
        #[serde(default)]
        orientation: Orientation,
    },
    Image {
        path: PathBuf,
    },
    SensorTable {
        table: SensorTable,
    },
    #[serde(rename_all = "camelCase")]
    MergeTable {
        table: SensorTable,
        #[serde(default)]
        page_rows: Option<usize>,
        #[serde(default)]
        merge_rows: Option<usize>,
    },
    StateTable {
        table: SensorTable,
    },
    #[serde(rename_all = "camelCase")]
    StateChartTable {
        table: SensorTable,
        #[serde(default = "default_end_label")]
        end_label: String,
    },
    /// Time/value series, continued on new pages until every series is
    /// drawn.
    TimeValueTable {
        series: Vec<TimeValueSeries>,
        #[serde(default)]
        layout: ValueLayout,
    },
    PlainTable {
        table: PlainTable,
    },
}

/// How a time/value table arranges its series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueLayout {
    /// One bordered column per series under a header band.
    #[default]
    Grid,
    /// Series stacked inside shared columns.
    Columns,
}

fn default_line_width() -> f64 {
    1.0
}

fn default_end_label() -> String {
    "60".to_string()
}

/// The rendered PDF and every layout warning raised on the way.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub pdf: Vec<u8>,
    pub pages: usize,
    pub warnings: Vec<LayoutWarning>,
}

/// Draws a [`PageDecoration`]: the header after each new page, the footer
/// before leaving each page.
pub struct DecorationPipe<'a> {
    decoration: &'a PageDecoration,
    style: &'a ReportStyle,
}

impl<'a> DecorationPipe<'a> {
    pub fn new(decoration: &'a PageDecoration, style: &'a ReportStyle) -> Self {
        Self { decoration, style }
    }
}

impl<S: Surface> PagePipe<S> for DecorationPipe<'_> {
    fn before(&mut self, report: &mut Report<S>) {
        if report.page_state() == PageState::NoPage {
            return;
        }
        let Some(footer) = &self.decoration.footer else {
            return;
        };
        let text = footer.replace(PAGE_PLACEHOLDER, &report.page().to_string());
        let style = &self.style.page;
        let cursor = report.cursor();
        let y = cursor.height - cursor.margin.bottom - style.font_size;
        let x = match self.decoration.footer_align {
            Align::Left => cursor.margin.left,
            Align::Center => {
                let tw = report.surface().measure_text(&text, &style.font, style.font_size);
                cursor.width / 2.0 - tw / 2.0
            }
            Align::Right => cursor.width,
        };
        report.text_at(&text, style, x, y);
    }

    fn after(&mut self, report: &mut Report<S>) {
        if let Some(header) = &self.decoration.header {
            let style = &self.style.page;
            report.text(header, style, Align::Left);
            report.br(style.font_size + 2.0);
            report.line_with_color(0.5, self.style.sen_column_line);
        }
    }
}

/// Parse a job from JSON and render it.
pub fn render_job_json(json: &str) -> Result<RenderedReport> {
    let job: ReportJob = serde_json::from_str(json)?;
    render_job(&job)
}

/// Render a job to PDF bytes.
pub fn render_job(job: &ReportJob) -> Result<RenderedReport> {
    let fonts = FontContext::from_font_map(job.fonts.iter())?;
    let mut report = Report::new(fonts, job.page, job.metadata.clone())?;
    let mut decoration = job
        .decoration
        .as_ref()
        .map(|d| DecorationPipe::new(d, &job.style));
    let mut pipes: Vec<&mut dyn PagePipe<PdfSurface>> = Vec::new();
    if let Some(pipe) = decoration.as_mut() {
        pipes.push(pipe);
    }

    match job.orientation {
        Orientation::Portrait => report.add_direct_page(&mut pipes),
        Orientation::Landscape => report.add_horizontal_page(&mut pipes),
    }

    let mut warnings = Vec::new();
    for section in &job.sections {
        if let Some(outcome) = draw_section(&mut report, section, &job.style, &mut pipes)? {
            warnings.extend(outcome.warnings);
        }
    }

    // footer for the last page
    for pipe in pipes.iter_mut() {
        pipe.before(&mut report);
    }

    let pages = report.page();
    let pdf = report.finish()?;
    Ok(RenderedReport {
        pdf,
        pages,
        warnings,
    })
}

fn draw_section<S: Surface>(
    report: &mut Report<S>,
    section: &Section,
    style: &ReportStyle,
    pipes: &mut [&mut dyn PagePipe<S>],
) -> Result<Option<TableOutcome>> {
    match section {
        Section::Header { text } => {
            report.text(text, &style.header, Align::Left);
            report.br(style.header.font_size + 8.0);
        }
        Section::Title { text } => {
            report.text(text, &style.title, Align::Center);
            report.br(style.title.font_size + 8.0);
        }
        Section::Subtitle { text } => {
            report.text(text, &style.sub_title, Align::Center);
            report.br(style.sub_title.font_size + 6.0);
        }
        Section::Section { text } => {
            let block = &style.section_block;
            let width = if block.width > 0.0 {
                block.width
            } else {
                report.width()
            };
            let height = if block.height > 0.0 {
                block.height
            } else {
                block.text.font_size + 10.0
            };
            report.rect_fill_color(text, block, width, height, block.align, Valign::Middle);
            report.br(height + 6.0);
        }
        Section::SensorHeading { text } => {
            report.text(text, &style.sen_column, Align::Left);
            report.br(style.sen_column.font_size + 4.0);
            report.line_with_color(1.0, style.sen_column_line);
            report.br(6.0);
        }
        Section::Paragraph { text, align } => {
            for line in text.lines() {
                report.text(line, &style.content, *align);
                report.br(style.content.font_size + 4.0);
            }
        }
        Section::TwoColumn { left, right } => {
            report.two_column_text(left, right, &style.content);
            report.br(style.content.font_size + 4.0);
        }
        Section::Legend {
            text,
            max,
            min,
            avg,
        } => {
            report.text(text, &style.table_desc, Align::Left);
            let parts = [
                (max, &style.table_desc_max),
                (min, &style.table_desc_min),
                (avg, &style.table_desc_avg),
            ];
            for (label, part_style) in parts {
                if let Some(label) = label {
                    let x = report.x() + 6.0;
                    report.set_x(x);
                    report.text(label, part_style, Align::Left);
                }
            }
            report.br(style.table_desc.font_size + 6.0);
        }
        Section::Line { width, color } => {
            report.line_with_color(*width, color.unwrap_or(Color::BLACK));
            report.br(width + 4.0);
        }
        Section::Break { height } => report.br(*height),
        Section::PageBreak { orientation } => match orientation {
            Orientation::Portrait => report.add_direct_page(pipes),
            Orientation::Landscape => report.add_horizontal_page(pipes),
        },
        Section::Image { path } => {
            let image = load_image_file(path)?;
            let height = report.image(image);
            report.br(height + 6.0);
        }
        Section::SensorTable { table } => {
            return Ok(Some(report.draw_sensor_table(table, &style.table)));
        }
        Section::MergeTable {
            table,
            page_rows,
            merge_rows,
        } => {
            let defaults = MergeOptions::default();
            let options = MergeOptions {
                page_rows: page_rows.unwrap_or(defaults.page_rows),
                merge_rows: merge_rows.unwrap_or(defaults.merge_rows),
            };
            return report
                .draw_merge_table(table, options, &style.table, pipes)
                .map(Some);
        }
        Section::StateTable { table } => {
            return report
                .draw_state_table(table, &style.state_table, pipes)
                .map(Some);
        }
        Section::StateChartTable { table, end_label } => {
            return Ok(Some(report.draw_state_chart_table(table, &style.table, end_label)));
        }
        Section::TimeValueTable { series, layout } => {
            let mut rest = series.as_slice();
            loop {
                rest = match layout {
                    ValueLayout::Grid => report.draw_time_value_table(rest, &style.value_table)?,
                    ValueLayout::Columns => {
                        report.draw_time_value_columns(rest, &style.value_table)?
                    }
                };
                if rest.is_empty() {
                    break;
                }
                report.add_direct_page(pipes);
            }
        }
        Section::PlainTable { table } => {
            return Ok(Some(report.draw_plain_table(table, &style.value_table)));
        }
    }
    Ok(None)
}

/// A small job touching every section kind, for the CLI's `example`.
pub fn example_job_json() -> &'static str {
    r##"{
  "metadata": { "title": "Cold Room Weekly Report", "author": "Facilities" },
  "page": { "size": "A4", "margin": { "top": 36, "right": 36, "bottom": 36, "left": 36 } },
  "decoration": { "header": "Cold Room 3", "footer": "Page {page}", "footerAlign": "center" },
  "sections": [
    { "type": "header", "text": "Sensor Report" },
    { "type": "title", "text": "Weekly Temperature Summary" },
    { "type": "subtitle", "text": "2024-03-04 to 2024-03-10" },
    { "type": "section", "text": "Overview" },
    { "type": "twoColumn", "left": "Site: Warehouse B", "right": "Sensors: 2" },
    { "type": "paragraph", "text": "Readings above 8.00 or below 2.00 are highlighted." },
    { "type": "line", "width": 0.5 },
    { "type": "sensorHeading", "text": "T1 Cold Room" },
    {
      "type": "sensorTable",
      "table": {
        "header": { "type": "Flat", "labels": ["Sensor", "Max", "Min", "Avg"] },
        "rows": [
          [ { "value": "T1" }, { "value": "9.10", "alert": "High" }, { "value": "1.80", "alert": "Low" }, { "value": "4.20" } ],
          [ { "value": "T2" }, { "value": "6.30" }, { "value": "2.10" }, { "value": "4.00" } ]
        ]
      }
    },
    { "type": "legend", "text": "Legend:", "max": "Max", "min": "Min", "avg": "Avg" },
    { "type": "break", "height": 10 },
    {
      "type": "mergeTable",
      "pageRows": 6,
      "mergeRows": 2,
      "table": {
        "header": { "type": "Flat", "labels": ["00", "02", "04", "06", "08", "10", "12", "14", "16", "18", "20", "22"] },
        "rows": [
          [ { "value": "03-04" }, { "value": "4.1" }, { "value": "4.0" }, { "value": "3.9" }, { "value": "4.2" }, { "value": "5.0" }, { "value": "6.1" }, { "value": "8.4", "alert": "High" }, { "value": "7.2" }, { "value": "6.0" }, { "value": "5.1" }, { "value": "4.4" }, { "value": "4.2" } ]
        ]
      }
    },
    { "type": "pageBreak" },
    { "type": "section", "text": "Door State" },
    {
      "type": "stateTable",
      "table": {
        "header": { "type": "Flat", "labels": ["Time", "State"] },
        "rows": [
          [ { "value": "08:00" }, { "value": "open" } ],
          [ { "value": "08:05" }, { "value": "closed" } ]
        ]
      }
    },
    {
      "type": "stateChartTable",
      "endLabel": "24",
      "table": {
        "header": { "type": "Flat", "labels": ["Day", "00", "06", "12", "18"] },
        "rows": [
          [ { "value": "03-04" }, { "value": "0" }, { "value": "1", "alert": "High" }, { "value": "-" }, { "value": "0" } ]
        ]
      }
    },
    { "type": "break", "height": 10 },
    {
      "type": "timeValueTable",
      "series": [
        { "header": "T1 Cold Room", "rows": [ { "time": "03-04", "values": [9.1, 4.2, 1.8] }, { "time": "03-05", "values": [6.3, 4.0, 2.1] } ] },
        { "header": "T2 Ante Room", "rows": [ { "time": "03-04", "values": [12.0, 10.4, 8.9] } ] }
      ]
    },
    { "type": "break", "height": 10 },
    {
      "type": "plainTable",
      "table": { "header": ["Door", "Opened"], "rows": [ ["North", "14"], ["South", "3"] ] }
    }
  ]
}
"##
}
