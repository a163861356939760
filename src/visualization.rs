//! Visualization module: export bubble animation and import line chart.
//!
//! Produces self-contained HTML fragments with inline JS:
//! - Scatter: one animation frame per year, x = value, y = ln(value),
//!   bubble area proportional to value, fixed y range across frames
//! - Line: one series per (economy, sector), colour per economy,
//!   dash pattern per sector, markers and legend
//! - Dashboard: both charts with their headings in one HTML document
//!
//! All SVG rendering is done client-side by trade_chart.js. This module
//! groups records into chart series, serializes them to JSON and emits
//! the HTML shell.
use serde::Serialize;

use crate::error::TradeError;
use crate::transform::TradeRecord;

const CHART_JS: &str = include_str!("trade_chart.js");

/// Per-economy line colours, assigned in order of first appearance.
const ECONOMY_PALETTE: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

/// SVG dash arrays per sector label: solid, dash, dot, dash-dot.
const DASH_PATTERNS: [&str; 4] = ["", "8 4", "2 3", "8 3 2 3"];

const SOURCE_URL: &str = "https://stats.wto.org/";

// ── Config ──────────────────────────────────────────────────────────────────

/// Configuration for a single chart.
#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// DOM id prefix; must be unique within a page
    pub element_id: String,
    pub title: String,
    /// Label of the raw value (scatter x-axis, line tooltip)
    pub value_label: String,
    /// Label of the log value (y-axis)
    pub log_label: String,
    pub height_px: u32,
    /// Diameter of the largest bubble
    pub size_max_px: f64,
    /// Delay between animation frames
    pub frame_ms: u32,
}

impl ChartConfig {
    pub fn exports() -> Self {
        Self {
            element_id: "trade-exports".into(),
            title: "World Exports by Sector Over Time for Five Major Economies".into(),
            value_label: "Export Value".into(),
            log_label: "Log of Export Value".into(),
            height_px: 650,
            size_max_px: 100.0,
            frame_ms: 800,
        }
    }

    pub fn imports() -> Self {
        Self {
            element_id: "trade-imports".into(),
            title: "Log of World Imports by Sector Over Time for Five Major Economies".into(),
            value_label: "Import Value".into(),
            log_label: "Log of Import Value".into(),
            height_px: 700,
            size_max_px: 100.0,
            frame_ms: 800,
        }
    }
}

/// Heading block shown above a chart on the dashboard page.
#[derive(Debug, Clone)]
pub struct SectionConfig {
    pub heading: String,
    pub subtitle: String,
    pub chart: ChartConfig,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub page_title: String,
    pub tip: String,
    pub exports: SectionConfig,
    pub imports: SectionConfig,
    pub source: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page_title: "Five major economies: trade by sector".into(),
            tip: "Tip for Users: You can zoom in on any part of the chart by clicking and \
                  dragging your mouse to select a specific area. To reset the view, \
                  double-click on the chart."
                .into(),
            exports: SectionConfig {
                heading: "Five major economies exports by sector over time".into(),
                subtitle: "During recent decades, the share of industrial output in national \
                           GDP has been declining year by year in many developed countries. \
                           The value are in Million USD"
                    .into(),
                chart: ChartConfig::exports(),
            },
            imports: SectionConfig {
                heading: "Five major economies Imports by sector over time".into(),
                subtitle: "Importation is useful to understand if a country has the related \
                           sector goods inside their countries or not. The value are in \
                           Million USD"
                    .into(),
                chart: ChartConfig::imports(),
            },
            source: SOURCE_URL.into(),
        }
    }
}

// ── Chart series ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterPoint<'a> {
    pub economy: &'a str,
    pub sector_label: &'a str,
    pub display_color: &'a str,
    pub value: f64,
    pub log_value: f64,
}

#[derive(Debug, Serialize)]
pub struct ScatterFrame<'a> {
    pub year: i32,
    pub points: Vec<ScatterPoint<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinePoint {
    pub year: i32,
    pub value: f64,
    pub log_value: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSeries<'a> {
    pub economy: &'a str,
    pub sector_label: &'a str,
    pub color: &'static str,
    pub dash: &'static str,
    pub points: Vec<LinePoint>,
}

#[derive(Serialize)]
struct AxisLabels<'a> {
    x: &'a str,
    y: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScatterPayload<'a> {
    frames: Vec<ScatterFrame<'a>>,
    y_range: [f64; 2],
    x_max: f64,
    size_max: f64,
    height: u32,
    frame_ms: u32,
    labels: AxisLabels<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LinePayload<'a> {
    series: Vec<LineSeries<'a>>,
    y_range: [f64; 2],
    x_range: [i32; 2],
    height: u32,
    labels: AxisLabels<'a>,
}

/// One frame per year, ascending; points keep record order within a frame.
pub fn scatter_frames(records: &[TradeRecord]) -> Vec<ScatterFrame<'_>> {
    let mut years: Vec<i32> = records.iter().map(|r| r.year).collect();
    years.sort_unstable();
    years.dedup();

    years
        .into_iter()
        .map(|year| ScatterFrame {
            year,
            points: records
                .iter()
                .filter(|r| r.year == year)
                .map(|r| ScatterPoint {
                    economy: &r.reporting_economy,
                    sector_label: &r.sector_label,
                    display_color: &r.display_color,
                    value: r.value,
                    log_value: r.log_value,
                })
                .collect(),
        })
        .collect()
}

/// One series per (economy, sector label) in order of first appearance,
/// points sorted by year.
pub fn line_series(records: &[TradeRecord]) -> Vec<LineSeries<'_>> {
    let mut economies: Vec<&str> = Vec::new();
    let mut sectors: Vec<&str> = Vec::new();
    let mut series: Vec<LineSeries<'_>> = Vec::new();

    for r in records {
        let economy_idx = position_or_push(&mut economies, &r.reporting_economy);
        let sector_idx = position_or_push(&mut sectors, &r.sector_label);

        let point = LinePoint {
            year: r.year,
            value: r.value,
            log_value: r.log_value,
        };
        match series
            .iter_mut()
            .find(|s| s.economy == r.reporting_economy && s.sector_label == r.sector_label)
        {
            Some(existing) => existing.points.push(point),
            None => series.push(LineSeries {
                economy: &r.reporting_economy,
                sector_label: &r.sector_label,
                color: ECONOMY_PALETTE[economy_idx % ECONOMY_PALETTE.len()],
                dash: DASH_PATTERNS[sector_idx % DASH_PATTERNS.len()],
                points: vec![point],
            }),
        }
    }

    for s in &mut series {
        s.points.sort_by_key(|p| p.year);
    }
    series
}

/// (min, max) over finite log values, `None` when there are none.
pub fn log_range(records: &[TradeRecord]) -> Option<(f64, f64)> {
    records
        .iter()
        .map(|r| r.log_value)
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn position_or_push<'a>(items: &mut Vec<&'a str>, item: &'a str) -> usize {
    match items.iter().position(|i| *i == item) {
        Some(idx) => idx,
        None => {
            items.push(item);
            items.len() - 1
        }
    }
}

// ── HTML generation ─────────────────────────────────────────────────────────

/// Animated bubble chart of values over time.
pub fn generate_scatter_html(
    records: &[TradeRecord],
    config: &ChartConfig,
) -> Result<String, TradeError> {
    let Some((y_min, y_max)) = log_range(records) else {
        return Ok(empty_chart(&config.title));
    };
    let frames = scatter_frames(records);
    let x_max = records
        .iter()
        .map(|r| r.value)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max)
        .max(1.0);

    let last = frames.len().saturating_sub(1);
    let payload = ScatterPayload {
        frames,
        y_range: [y_min, y_max],
        x_max,
        size_max: config.size_max_px,
        height: config.height_px,
        frame_ms: config.frame_ms,
        labels: AxisLabels {
            x: &config.value_label,
            y: &config.log_label,
            value: &config.value_label,
        },
    };

    let id = escape_html(&config.element_id);
    let mut html = chart_shell(config);
    html.push_str(&format!(
        r##"
  <div style="padding:4px 8px; border-top:1px solid #dee2e6; font-family:sans-serif; font-size:12px; display:flex; align-items:center; gap:8px;">
    <button id="{id}-play" style="cursor:pointer; padding:2px 8px;">▶ Play</button>
    <input id="{id}-slider" type="range" min="0" max="{last}" step="1" value="0" style="flex:1;">
    <span style="color:#495057;">Year <span id="{id}-year" style="font-weight:600;"></span></span>
  </div>
</div>
<script>
{chart_js}
TradeChart.scatter({script_id}, {payload});
</script>"##,
        chart_js = CHART_JS,
        script_id = script_json(&config.element_id)?,
        payload = script_json(&payload)?,
    ));

    Ok(html)
}

/// Multi-series line chart of log values over time.
pub fn generate_line_html(
    records: &[TradeRecord],
    config: &ChartConfig,
) -> Result<String, TradeError> {
    let Some((y_min, y_max)) = log_range(records) else {
        return Ok(empty_chart(&config.title));
    };
    let first_year = records.iter().map(|r| r.year).min().unwrap_or_default();
    let last_year = records.iter().map(|r| r.year).max().unwrap_or_default();

    let payload = LinePayload {
        series: line_series(records),
        y_range: [y_min, y_max],
        x_range: [first_year, last_year],
        height: config.height_px,
        labels: AxisLabels {
            x: "Year",
            y: &config.log_label,
            value: &config.value_label,
        },
    };

    let id = escape_html(&config.element_id);
    let mut html = chart_shell(config);
    html.push_str(&format!(
        r##"
  <div id="{id}-legend" style="padding:4px 8px; border-top:1px solid #dee2e6; font-family:sans-serif; font-size:11px; color:#495057;"></div>
</div>
<script>
{chart_js}
TradeChart.line({script_id}, {payload});
</script>"##,
        chart_js = CHART_JS,
        script_id = script_json(&config.element_id)?,
        payload = script_json(&payload)?,
    ));

    Ok(html)
}

/// Full HTML document: usage tip, then the export and import sections.
pub fn generate_dashboard_html(
    exports: &[TradeRecord],
    imports: &[TradeRecord],
    config: &DashboardConfig,
) -> Result<String, TradeError> {
    let exports_html = generate_scatter_html(exports, &config.exports.chart)?;
    let imports_html = generate_line_html(imports, &config.imports.chart)?;

    Ok(format!(
        r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{page_title}</title>
</head>
<body style="margin:0 auto; padding:16px 24px; font-family:Arial, sans-serif; color:#000;">
<p style="font-size:14px;"><strong>{tip}</strong></p>
{exports_section}
{imports_section}
</body>
</html>
"##,
        page_title = escape_html(&config.page_title),
        tip = escape_html(&config.tip),
        exports_section = section_html(&config.exports, &config.source, &exports_html),
        imports_section = section_html(&config.imports, &config.source, &imports_html),
    ))
}

fn section_html(section: &SectionConfig, source: &str, chart: &str) -> String {
    format!(
        r##"<section>
<p style="font-weight:bold; font-size:30px; margin:24px 0 8px;">{heading}</p>
<p style="font-weight:bold; font-style:italic; font-size:20px; margin:0 0 4px;">{subtitle}</p>
<p style="font-weight:bold; font-style:italic; font-size:15px; margin:0 0 12px;">Source: {source}</p>
{chart}
</section>"##,
        heading = escape_html(&section.heading),
        subtitle = escape_html(&section.subtitle),
        source = escape_html(source),
    )
}

fn chart_shell(config: &ChartConfig) -> String {
    format!(
        r##"<div style="position:relative; width:100%; border:1px solid #dee2e6; border-radius:4px; background:#fff;">
  <div style="padding:4px 8px; border-bottom:1px solid #dee2e6; font-family:sans-serif; font-size:13px; font-weight:600; color:#495057;">{title}</div>
  <svg id="{id}-svg" xmlns="http://www.w3.org/2000/svg" width="100" height="{height}">
    <style>
      .tick-label {{ font-family: sans-serif; font-size: 10px; fill: #868e96; }}
      .axis-label {{ font-family: sans-serif; font-size: 12px; fill: #495057; }}
    </style>
  </svg>
  <div id="{id}-tooltip" style="position:absolute; display:none; pointer-events:none; white-space:pre; background:#212529; color:#fff; font-family:sans-serif; font-size:11px; padding:4px 6px; border-radius:3px;"></div>"##,
        title = escape_html(&config.title),
        id = escape_html(&config.element_id),
        height = config.height_px,
    )
}

fn empty_chart(title: &str) -> String {
    format!("<div>No data to visualize for {}.</div>", escape_html(title))
}

/// JSON safe to inline inside a `<script>` element.
fn script_json<T: Serialize>(value: &T) -> Result<String, TradeError> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
