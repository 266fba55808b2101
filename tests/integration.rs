//! Integration tests for the sensor report pipeline.
//!
//! These tests exercise the public API end to end. They verify:
//! - Table layouts draw the expected bands and break pages at the right rows
//! - Page hooks run in order around every new page
//! - PDF output is structurally valid and carries its metadata
//! - CSV and Excel exports round-trip their data
//! - JSON report jobs render and surface layout warnings

use pretty_assertions::assert_eq;

use sensor_export::export::{write_csv, write_xlsx, RecordsSource, RecordsWorkbook, TableSource};
use sensor_export::font::FontContext;
use sensor_export::layout::{MergeOptions, PagePipe, Report};
use sensor_export::model::*;
use sensor_export::pdf::PdfSurface;
use sensor_export::style::*;
use sensor_export::{render_job_json, ExportError, LayoutWarning};

// ─── Helpers ────────────────────────────────────────────────────

fn make_report() -> Report {
    Report::new(
        FontContext::new(),
        PageSetup {
            size: PageSize::A4,
            margin: Edges::uniform(20.0),
        },
        Metadata::default(),
    )
    .unwrap()
}

fn hours(n: usize) -> Vec<String> {
    (0..n).map(|h| format!("{:02}", h)).collect()
}

fn make_block(label: &str, n: usize) -> Row {
    let mut row = vec![Cell::new(label)];
    row.extend((0..n).map(|i| Cell::new(format!("{}.5", i))));
    row
}

fn make_grid(header: &[&str], rows: usize) -> SensorTable {
    let mut table = SensorTable::new(header.iter().copied());
    for r in 0..rows {
        let mut row = vec![Cell::new(format!("S{}", r))];
        row.extend((1..header.len()).map(|c| Cell::new(format!("{}", r * 10 + c))));
        table.add_row(row);
    }
    table
}

fn distinct_rows(report: &Report) -> Vec<f64> {
    let mut ys: Vec<f64> = report.pages()[0].rects().map(|r| r.1).collect();
    ys.dedup();
    ys
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 50, "PDF too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "Missing PDF header");
    assert!(
        bytes.windows(5).any(|w| w == b"%%EOF"),
        "Missing %%EOF marker"
    );
    assert!(bytes.windows(4).any(|w| w == b"xref"), "Missing xref table");
    assert!(bytes.windows(7).any(|w| w == b"trailer"), "Missing trailer");
}

/// Records what each hook saw.
#[derive(Default)]
struct RecordingPipe {
    before: Vec<(usize, f64)>,
    after: Vec<(usize, f64)>,
}

impl PagePipe<PdfSurface> for RecordingPipe {
    fn before(&mut self, report: &mut Report) {
        self.before.push((report.page(), report.y()));
    }

    fn after(&mut self, report: &mut Report) {
        self.after.push((report.page(), report.y()));
    }
}

// ─── Fixed Grid Tests ───────────────────────────────────────────

#[test]
fn test_grid_draws_one_band_per_row_plus_header() {
    let mut report = make_report();
    let table = make_grid(&["Sensor", "Max", "Min", "Avg"], 5);
    let outcome = report.draw_sensor_table(&table, &FixRowColumnTableStyle::default());

    assert_eq!(outcome.blocks_drawn, 5);
    assert_eq!(distinct_rows(&report).len(), 6);
    assert_eq!(report.y(), 20.0 + 6.0 * 20.0);
}

#[test]
fn test_grid_never_paginates() {
    let mut report = make_report();
    let table = make_grid(&["Sensor", "Value"], 60);
    report.draw_sensor_table(&table, &FixRowColumnTableStyle::default());
    assert_eq!(report.page(), 1);
}

// ─── Merge Table Tests ──────────────────────────────────────────

#[test]
fn test_merge_breaks_at_multiples_of_page_rows_plus_one() {
    let mut report = make_report();
    let mut table = SensorTable::new(hours(12));
    for d in 1..=10 {
        table.add_row(make_block(&format!("day {}", d), 12));
    }
    let options = MergeOptions {
        page_rows: 2,
        merge_rows: 1,
    };
    let outcome = report
        .draw_sensor_merge_table(&table, options, &FixRowColumnTableStyle::default(), &mut [])
        .unwrap();

    assert_eq!(outcome.page_breaks, vec![3, 6, 9]);
    assert_eq!(report.page(), 4);
}

#[test]
fn test_merge_band_count_is_ceil_of_header_over_twelve() {
    for (header_len, bands) in [(1, 1), (12, 1), (13, 2), (24, 2), (30, 3)] {
        let mut report = make_report();
        let mut table = SensorTable::new(hours(header_len));
        table.add_row(make_block("day", header_len));
        let outcome = report
            .draw_sensor_merge_table(
                &table,
                MergeOptions::default(),
                &FixRowColumnTableStyle::default(),
                &mut [],
            )
            .unwrap();
        assert_eq!(outcome.header_bands, bands, "header of {}", header_len);
    }
}

#[test]
fn test_merge_header_labels_follow_bands() {
    let mut report = make_report();
    let mut table = SensorTable::new(hours(14));
    table.add_row(make_block("day", 14));
    report
        .draw_sensor_merge_table(
            &table,
            MergeOptions::default(),
            &FixRowColumnTableStyle::default(),
            &mut [],
        )
        .unwrap();

    let texts: Vec<(&str, f64)> = report.pages()[0].texts().map(|t| (t.0, t.2)).collect();
    let y_of = |label: &str| texts.iter().find(|t| t.0 == label).map(|t| t.1).unwrap();
    // "12" opens the second band, two lines below "00"
    assert_eq!(y_of("12") - y_of("00"), 40.0);
}

#[test]
fn test_merge_no_data_block_skips_page_break() {
    let mut report = make_report();
    let mut table = SensorTable::with_block_headers(vec![hours(2); 4]);
    table.add_row(make_block("d1", 2));
    table.add_row(vec![Cell::new("d2"), Cell::no_data(), Cell::no_data()]);
    table.add_row(make_block("d3", 2));
    table.add_row(make_block("d4", 2));
    let options = MergeOptions {
        page_rows: 1,
        merge_rows: 1,
    };
    let outcome = report
        .draw_sensor_dynamic_header_merge_table(
            &table,
            options,
            &FixRowColumnTableStyle::default(),
            &mut [],
        )
        .unwrap();

    // block 2 would have broken (2 % 2 == 0) but was skipped
    assert_eq!(outcome.page_breaks, vec![4]);
    assert_eq!(outcome.blocks_skipped, 1);
    assert_eq!(outcome.warnings, vec![LayoutWarning::NoDataBlock { block: 2 }]);
}

#[test]
fn test_merge_zero_page_rows_is_config_error() {
    let mut report = make_report();
    let table = SensorTable::new(hours(2));
    let options = MergeOptions {
        page_rows: 0,
        merge_rows: 1,
    };
    let result = report.draw_sensor_merge_table(
        &table,
        options,
        &FixRowColumnTableStyle::default(),
        &mut [],
    );
    assert!(matches!(result, Err(ExportError::Config(_))));
}

// ─── Alert Precedence Tests ─────────────────────────────────────

fn high_header_cell() -> Cell {
    Cell {
        value: "45.00".to_string(),
        alert: AlertState::High,
        is_header: true,
    }
}

#[test]
fn test_merge_alert_beats_header_flag() {
    let mut report = make_report();
    let mut table = SensorTable::new(hours(1));
    table.add_row(vec![Cell::new("day"), high_header_cell()]);
    report
        .draw_sensor_merge_table(
            &table,
            MergeOptions::default(),
            &FixRowColumnTableStyle::default(),
            &mut [],
        )
        .unwrap();
    let last = report.pages()[0].rects().last().unwrap();
    assert_eq!(last.4, Color::HEAT_ALERT);
}

#[test]
fn test_grid_header_flag_beats_alert() {
    let mut report = make_report();
    let mut table = SensorTable::new(["Sensor", "Max"]);
    table.add_row(vec![Cell::new("T1"), high_header_cell()]);
    report.draw_sensor_table(&table, &FixRowColumnTableStyle::default());
    let last = report.pages()[0].rects().last().unwrap();
    assert_eq!(last.4, Color::GRAY);
}

#[test]
fn test_readings_classified_against_thresholds() {
    let t = Thresholds {
        low: Some(2.0),
        high: Some(8.0),
    };
    assert_eq!(Cell::reading(8.5, &t).alert, AlertState::High);
    assert_eq!(Cell::reading(8.0, &t).alert, AlertState::None);
    assert_eq!(Cell::reading(1.99, &t).value, "1.99");
}

// ─── State Table Tests ──────────────────────────────────────────

#[test]
fn test_state_table_repeats_header_once_per_page() {
    let mut report = make_report();
    let mut table = SensorTable::new(["Time", "State"]);
    for i in 0..70 {
        table.add_row(vec![Cell::new(format!("t{}", i)), Cell::new("open")]);
    }
    let mut pipe = RecordingPipe::default();
    let outcome = report
        .draw_state_table(&table, &StateTableStyle::default(), &mut [&mut pipe])
        .unwrap();

    assert_eq!(outcome.page_breaks, vec![35]);
    assert_eq!(outcome.header_bands, 2);
    assert_eq!(report.page(), 2);
    let header_count = report
        .pages()
        .iter()
        .flat_map(|p| p.texts())
        .filter(|t| t.0 == "Time")
        .count();
    assert_eq!(header_count, 2);
    assert_eq!(pipe.before.len(), 1);
}

#[test]
fn test_state_table_parity_styles() {
    let mut report = make_report();
    let mut table = SensorTable::new(["Time", "State", "Time", "State"]);
    table.add_row(vec![
        Cell::new("08:00"),
        Cell::new("on"),
        Cell::new("09:00"),
        Cell::new("off"),
    ]);
    report
        .draw_state_table(&table, &StateTableStyle::default(), &mut [])
        .unwrap();
    let widths: Vec<f64> = report.pages()[0].rects().map(|r| r.2).collect();
    assert_eq!(widths, vec![100.0, 85.0, 100.0, 85.0, 100.0, 85.0, 100.0, 85.0]);
}

// ─── Time/Value Table Tests ─────────────────────────────────────

fn make_series(count: usize) -> Vec<TimeValueSeries> {
    (0..count)
        .map(|i| {
            let mut s = TimeValueSeries::new(format!("Sensor {}", i + 1));
            s.add_row(TimeValueRow::new("03-04", vec![9.1, 4.25, 1.8]));
            s.add_row(TimeValueRow::new("03-05", vec![6.3, 4.0, 2.1]));
            s
        })
        .collect()
}

#[test]
fn test_time_value_table_hands_back_rest_for_next_page() {
    let mut report = make_report();
    let series = make_series(14);
    let style = TableStyle::default();

    let mut rest = report.draw_time_value_table(&series, &style).unwrap();
    let mut per_page = vec![series.len() - rest.len()];
    while !rest.is_empty() {
        report.add_direct_page(&mut []);
        let before = rest.len();
        rest = report.draw_time_value_table(rest, &style).unwrap();
        per_page.push(before - rest.len());
    }

    // 4 series per column-row, 3 column-rows per page
    assert_eq!(per_page, vec![12, 2]);
    assert_eq!(report.page(), 2);
    let second: Vec<&str> = report.pages()[1].texts().map(|t| t.0).collect();
    assert_eq!(&second[..2], ["Sensor 13", "Sensor 14"]);
    assert!(second.contains(&"4.25"));
}

#[test]
fn test_plain_table_uses_header_style_throughout() {
    let mut report = make_report();
    let table = PlainTable {
        header: vec!["Door".into(), "Opened".into()],
        rows: vec![vec!["North".into(), "14".into()]],
    };
    let outcome = report.draw_plain_table(&table, &TableStyle::default());

    assert!(outcome.warnings.is_empty());
    assert_eq!(distinct_rows(&report), vec![20.0, 40.0]);
    assert!(report.pages()[0].rects().all(|r| r.4 == Color::WHITE));
}

// ─── Page Hook Tests ────────────────────────────────────────────

#[test]
fn test_hooks_bracket_page_creation() {
    let mut report = make_report();
    report.add_direct_page(&mut []);
    report.br(200.0);

    let mut first = RecordingPipe::default();
    let mut second = RecordingPipe::default();
    report.add_direct_page(&mut [&mut first, &mut second]);

    assert_eq!(first.before, vec![(1, 220.0)]);
    assert_eq!(second.before, vec![(1, 220.0)]);
    assert_eq!(first.after, vec![(2, 20.0)]);
    assert_eq!(second.after, vec![(2, 30.0)]);
}

#[test]
fn test_horizontal_page_is_landscape() {
    let mut report = make_report();
    report.add_horizontal_page(&mut []);
    report.add_direct_page(&mut []);
    let pages = report.pages();
    assert!(pages[0].width > pages[0].height);
    assert!(pages[1].width < pages[1].height);
}

// ─── PDF Output Tests ───────────────────────────────────────────

#[test]
fn test_report_produces_valid_pdf_with_metadata() {
    let mut report = Report::new(
        FontContext::new(),
        PageSetup::default(),
        Metadata {
            title: Some("Freezer Log".to_string()),
            author: Some("QA".to_string()),
            subject: None,
        },
    )
    .unwrap();
    report.add_direct_page(&mut []);
    report.draw_sensor_table(
        &make_grid(&["Sensor", "Max"], 3),
        &FixRowColumnTableStyle::default(),
    );
    let bytes = report.finish().unwrap();

    assert_valid_pdf(&bytes);
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Title (Freezer Log)"));
    assert!(text.contains("/Author (QA)"));
}

#[test]
fn test_write_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.pdf");
    let mut report = make_report();
    report.text("hello", &TextStyle::default(), Align::Left);
    report.write_to_file(&path).unwrap();
    assert_valid_pdf(&std::fs::read(&path).unwrap());
}

#[test]
fn test_invalid_page_size_rejected() {
    let setup = PageSetup {
        size: PageSize::Custom {
            width: f64::NAN,
            height: 800.0,
        },
        margin: Edges::uniform(10.0),
    };
    let result = Report::new(FontContext::new(), setup, Metadata::default());
    assert!(matches!(result, Err(ExportError::Config(_))));
}

/// Load a system TTF font for testing. Returns None if not available.
fn load_test_font() -> Option<Vec<u8>> {
    let paths = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
        "/System/Library/Fonts/Supplemental/Verdana.ttf",
    ];
    for path in &paths {
        if let Ok(data) = std::fs::read(path) {
            if ttf_parser::Face::parse(&data, 0).is_ok() {
                return Some(data);
            }
        }
    }
    None
}

#[test]
fn test_custom_font_is_embedded() {
    let font_data = match load_test_font() {
        Some(data) => data,
        None => {
            eprintln!("Skipping: no test TTF font found");
            return;
        }
    };
    let mut fonts = FontContext::new();
    fonts.register_bytes("tw-r", font_data).unwrap();
    let mut report = Report::new(fonts, PageSetup::default(), Metadata::default()).unwrap();
    report.text("溫度 Temperature", &TextStyle::new("tw-r", 12.0, Color::BLACK), Align::Left);
    report.text("Standard", &TextStyle::default(), Align::Left);
    let bytes = report.finish().unwrap();

    assert_valid_pdf(&bytes);
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("CIDFontType2"));
    assert!(text.contains("/Identity-H"));
    assert!(text.contains("/ToUnicode"));
    assert!(text.contains("/Type1"));
}

// ─── Export Tests ───────────────────────────────────────────────

#[test]
fn test_csv_round_trip() {
    let header = vec!["A".to_string(), "B".to_string()];
    let rows = vec![
        vec!["1".to_string(), "2".to_string()],
        vec!["3".to_string(), "4".to_string()],
    ];
    let mut source = RecordsSource::new(Some(header.clone()), rows.clone());
    let mut out = Vec::new();
    write_csv(&mut source, &mut out).unwrap();

    assert!(out.starts_with(b"\xEF\xBB\xBF"));
    let body = &out[3..];
    assert_eq!(body.iter().filter(|&&b| b == b'\n').count(), 3);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(body);
    let decoded: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    assert_eq!(decoded[0], header);
    assert_eq!(&decoded[1..], &rows[..]);
}

#[test]
fn test_csv_from_sensor_table() {
    let table = make_grid(&["Sensor", "Max"], 2);
    let mut out = Vec::new();
    let rows = write_csv(&mut TableSource::new(&table), &mut out).unwrap();
    assert_eq!(rows, 2);
    assert_eq!(std::str::from_utf8(&out[3..]).unwrap(), "Sensor,Max\nS0,1\nS1,11\n");
}

#[test]
fn test_xlsx_from_json_workbook() {
    let mut workbook: RecordsWorkbook = serde_json::from_str(
        r#"{ "sheets": [
            { "name": "T1", "rows": [["time", "value"], ["08:00", "4.2"]] },
            { "name": "T2", "rows": [] }
        ] }"#,
    )
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");
    let file = std::fs::File::create(&path).unwrap();
    assert_eq!(write_xlsx(&mut workbook, file).unwrap(), 2);
    assert!(std::fs::read(&path).unwrap().starts_with(b"PK"));
}

// ─── Report Job Tests ───────────────────────────────────────────

#[test]
fn test_job_renders_tables_and_decoration() {
    let json = r#"{
        "metadata": { "title": "Job" },
        "decoration": { "header": "Plant A", "footer": "{page}" },
        "sections": [
            { "type": "title", "text": "Daily" },
            { "type": "mergeTable", "pageRows": 1, "mergeRows": 1,
              "table": { "header": { "type": "Flat", "labels": ["00", "01"] },
                         "rows": [
                           [ { "value": "d1" }, { "value": "1" }, { "value": "2" } ],
                           [ { "value": "d2" }, { "value": "3" }, { "value": "4", "alert": "Low" } ],
                           [ { "value": "" }, { "value": "5" }, { "value": "6" } ]
                         ] } }
        ]
    }"#;
    let rendered = render_job_json(json).unwrap();
    assert_valid_pdf(&rendered.pdf);
    assert_eq!(rendered.pages, 2);
    assert_eq!(
        rendered.warnings,
        vec![LayoutWarning::EmptyRowLabel { block: 3 }]
    );
}

#[test]
fn test_job_with_bad_json_has_hint() {
    let err = render_job_json("{ \"sections\": [ }").unwrap_err();
    match err {
        ExportError::Parse { hint, .. } => assert!(!hint.is_empty()),
        other => panic!("expected parse error, got {:?}", other),
    }
}
