use std::fmt::Write;
use std::fs;
use std::path::Path;

use anyhow::Context;

use ridership_core::{MonthlyRidership, NearbyStation, RidershipComparison, YearlyRidership};

use crate::text::format_count;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 500.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;
const Y_TICKS: usize = 4;
const MAX_X_TICKS: usize = 12;
const SERIES_COLORS: [&str; 4] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728"];

/// Longitude/latitude window covered by the city map image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapExtent {
    pub min_longitude: f64,
    pub max_longitude: f64,
    pub min_latitude: f64,
    pub max_latitude: f64,
}

pub const CHICAGO_EXTENT: MapExtent = MapExtent {
    min_longitude: -87.9277,
    max_longitude: -87.5569,
    min_latitude: 41.7012,
    max_latitude: 42.0868,
};

impl MapExtent {
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        longitude >= self.min_longitude
            && longitude <= self.max_longitude
            && latitude >= self.min_latitude
            && latitude <= self.max_latitude
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub values: Vec<f64>,
}

/// Values of every series are placed on shared x slots by position.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl LineChart {
    pub fn yearly(yearly: &YearlyRidership) -> Self {
        Self {
            title: format!("Yearly Ridership at {} Station", yearly.station_name),
            x_label: "Year".to_string(),
            y_label: "Number of Riders".to_string(),
            x_labels: yearly.years.iter().map(|y| y.year.to_string()).collect(),
            series: vec![ChartSeries {
                label: yearly.station_name.clone(),
                values: yearly.years.iter().map(|y| y.total as f64).collect(),
            }],
        }
    }

    pub fn monthly(monthly: &MonthlyRidership, requested: &str) -> Self {
        let name = monthly.station_name.as_deref().unwrap_or(requested);
        Self {
            title: format!("Monthly Ridership at {} Station ({})", name, monthly.year),
            x_label: "Month".to_string(),
            y_label: "Number of Riders".to_string(),
            x_labels: monthly
                .months
                .iter()
                .map(|m| format!("{:02}", m.month))
                .collect(),
            series: vec![ChartSeries {
                label: name.to_string(),
                values: monthly.months.iter().map(|m| m.total as f64).collect(),
            }],
        }
    }

    /// Days are numbered from 1 within each series.
    pub fn daily_comparison(comparison: &RidershipComparison) -> Self {
        let series: Vec<ChartSeries> = [&comparison.first, &comparison.second]
            .into_iter()
            .enumerate()
            .map(|(index, daily)| ChartSeries {
                label: daily
                    .station
                    .as_ref()
                    .map(|station| station.name.clone())
                    .unwrap_or_else(|| format!("Station {}", index + 1)),
                values: daily.days.iter().map(|day| day.total as f64).collect(),
            })
            .collect();
        let days = series.iter().map(|s| s.values.len()).max().unwrap_or(0);
        Self {
            title: format!("Ridership Each Day of {}", comparison.year),
            x_label: "Day".to_string(),
            y_label: "Number of Riders".to_string(),
            x_labels: (1..=days).map(|day| day.to_string()).collect(),
            series,
        }
    }

    fn slots(&self) -> usize {
        self.series
            .iter()
            .map(|s| s.values.len())
            .chain(std::iter::once(self.x_labels.len()))
            .max()
            .unwrap_or(0)
    }

    fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub label: String,
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterMap {
    pub title: String,
    pub extent: MapExtent,
    pub background_image: Option<String>,
    pub points: Vec<MapPoint>,
}

impl ScatterMap {
    pub fn nearby(stations: &[NearbyStation], background_image: Option<String>) -> Self {
        Self {
            title: "Stations Near You".to_string(),
            extent: CHICAGO_EXTENT,
            background_image,
            points: stations
                .iter()
                .map(|station| MapPoint {
                    label: station.station_name.clone(),
                    longitude: station.coordinate.longitude,
                    latitude: station.coordinate.latitude,
                })
                .collect(),
        }
    }
}

pub fn write_line_chart<P: AsRef<Path>>(path: P, chart: &LineChart) -> anyhow::Result<()> {
    let html = render_line_chart(chart);
    fs::write(&path, html)
        .with_context(|| format!("write chart to {}", path.as_ref().display()))?;
    Ok(())
}

pub fn write_scatter_map<P: AsRef<Path>>(path: P, map: &ScatterMap) -> anyhow::Result<()> {
    let html = render_scatter_map(map);
    fs::write(&path, html)
        .with_context(|| format!("write map to {}", path.as_ref().display()))?;
    Ok(())
}

pub fn render_line_chart(chart: &LineChart) -> String {
    let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let slots = chart.slots();
    let max_value = chart.max_value().max(1.0);
    let x_at = |slot: usize| {
        if slots <= 1 {
            MARGIN_LEFT + plot_width / 2.0
        } else {
            MARGIN_LEFT + slot as f64 * plot_width / (slots - 1) as f64
        }
    };
    let y_at = |value: f64| MARGIN_TOP + plot_height - value / max_value * plot_height;

    let mut svg = String::new();
    open_svg(&mut svg, &chart.title);
    push_axes(&mut svg, &chart.x_label, &chart.y_label);

    for tick in 0..=Y_TICKS {
        let value = max_value * tick as f64 / Y_TICKS as f64;
        let y = y_at(value);
        write!(
            svg,
            "  <line class=\"grid\" x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\"/>\n  <text class=\"tick\" x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\">{}</text>\n",
            MARGIN_LEFT,
            y,
            WIDTH - MARGIN_RIGHT,
            y,
            MARGIN_LEFT - 8.0,
            y + 4.0,
            format_count(value.round() as i64)
        )
        .ok();
    }

    let step = slots.div_ceil(MAX_X_TICKS).max(1);
    for (slot, label) in chart.x_labels.iter().enumerate().step_by(step) {
        write!(
            svg,
            "  <text class=\"tick\" x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">",
            x_at(slot),
            HEIGHT - MARGIN_BOTTOM + 18.0
        )
        .ok();
        push_escaped(&mut svg, label);
        svg.push_str("</text>\n");
    }

    for (index, series) in chart.series.iter().enumerate() {
        if series.values.is_empty() {
            continue;
        }
        let mut data = String::new();
        for (slot, value) in series.values.iter().enumerate() {
            let command = if slot == 0 { 'M' } else { 'L' };
            write!(data, "{}{:.1} {:.1} ", command, x_at(slot), y_at(*value)).ok();
        }
        write!(
            svg,
            "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
            data.trim_end(),
            series_color(index)
        )
        .ok();
    }

    if chart.series.len() > 1 {
        for (index, series) in chart.series.iter().enumerate() {
            let y = MARGIN_TOP + 10.0 + index as f64 * 18.0;
            write!(
                svg,
                "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"12\" height=\"12\" fill=\"{}\"/>\n  <text class=\"legend\" x=\"{:.1}\" y=\"{:.1}\">",
                WIDTH - MARGIN_RIGHT - 180.0,
                y - 10.0,
                series_color(index),
                WIDTH - MARGIN_RIGHT - 162.0,
                y
            )
            .ok();
            push_escaped(&mut svg, &series.label);
            svg.push_str("</text>\n");
        }
    }

    svg.push_str("</svg>\n");
    wrap_html(&chart.title, &svg)
}

pub fn render_scatter_map(map: &ScatterMap) -> String {
    let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let extent = map.extent;
    let x_at = |longitude: f64| {
        MARGIN_LEFT
            + (longitude - extent.min_longitude) / (extent.max_longitude - extent.min_longitude)
                * plot_width
    };
    let y_at = |latitude: f64| {
        MARGIN_TOP
            + (extent.max_latitude - latitude) / (extent.max_latitude - extent.min_latitude)
                * plot_height
    };

    let mut svg = String::new();
    open_svg(&mut svg, &map.title);
    if let Some(image) = map.background_image.as_deref() {
        write!(
            svg,
            "  <image href=\"{}\" x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" preserveAspectRatio=\"none\"/>\n",
            escape_html(image),
            MARGIN_LEFT,
            MARGIN_TOP,
            plot_width,
            plot_height
        )
        .ok();
    }
    push_axes(&mut svg, "Longitude", "Latitude");

    for point in &map.points {
        if !extent.contains(point.longitude, point.latitude) {
            continue;
        }
        let x = x_at(point.longitude);
        let y = y_at(point.latitude);
        write!(
            svg,
            "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"4\" fill=\"{}\"/>\n  <text class=\"label\" x=\"{:.1}\" y=\"{:.1}\">",
            x,
            y,
            SERIES_COLORS[0],
            x + 6.0,
            y - 6.0
        )
        .ok();
        push_escaped(&mut svg, &point.label);
        svg.push_str("</text>\n");
    }

    svg.push_str("</svg>\n");
    wrap_html(&map.title, &svg)
}

fn open_svg(svg: &mut String, title: &str) {
    write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" viewBox=\"0 0 {WIDTH} {HEIGHT}\">\n  <text class=\"title\" x=\"{:.1}\" y=\"30\" text-anchor=\"middle\">",
        WIDTH / 2.0
    )
    .ok();
    push_escaped(svg, title);
    svg.push_str("</text>\n");
}

fn push_axes(svg: &mut String, x_label: &str, y_label: &str) {
    let bottom = HEIGHT - MARGIN_BOTTOM;
    write!(
        svg,
        "  <line class=\"axis\" x1=\"{MARGIN_LEFT}\" y1=\"{bottom}\" x2=\"{:.1}\" y2=\"{bottom}\"/>\n  <line class=\"axis\" x1=\"{MARGIN_LEFT}\" y1=\"{MARGIN_TOP}\" x2=\"{MARGIN_LEFT}\" y2=\"{bottom}\"/>\n",
        WIDTH - MARGIN_RIGHT
    )
    .ok();
    write!(
        svg,
        "  <text class=\"axis-label\" x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">",
        MARGIN_LEFT + (WIDTH - MARGIN_LEFT - MARGIN_RIGHT) / 2.0,
        HEIGHT - 15.0
    )
    .ok();
    push_escaped(svg, x_label);
    write!(
        svg,
        "</text>\n  <text class=\"axis-label\" transform=\"translate(20 {:.1}) rotate(-90)\" text-anchor=\"middle\">",
        MARGIN_TOP + (HEIGHT - MARGIN_TOP - MARGIN_BOTTOM) / 2.0
    )
    .ok();
    push_escaped(svg, y_label);
    svg.push_str("</text>\n");
}

fn wrap_html(title: &str, svg: &str) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n    <meta charset=\"UTF-8\">\n    <title>");
    push_escaped(&mut out, title);
    out.push_str(
        r#"</title>
    <style>
    body {
        font-family: Helvetica, Arial, sans-serif;
        font-size: 14px;
        padding: 1em 2em;
    }

    .title {
        font-size: 18px;
        font-weight: bold;
    }

    .axis {
        stroke: #333;
    }

    .grid {
        stroke: #ddd;
    }

    .tick, .legend, .label {
        font-size: 12px;
    }
    </style>
</head>
<body>
"#,
    );
    out.push_str(svg);
    out.push_str("</body>\n</html>\n");
    out
}

fn series_color(index: usize) -> &'static str {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

fn push_escaped(out: &mut String, value: &str) {
    out.push_str(&escape_html(value));
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::new();
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
