pub mod chart;
pub mod json;
pub mod text;

pub use chart::{
    render_line_chart, render_scatter_map, write_line_chart, write_scatter_map, ChartSeries,
    LineChart, MapExtent, MapPoint, ScatterMap, CHICAGO_EXTENT,
};
pub use json::{to_json_string, write_json, JsonExport};
pub use text::{
    format_count, format_percent, render_breakdown, render_comparison, render_line_stops,
    render_monthly, render_nearby, render_stations, render_stop_counts, render_summary,
    render_weekday_ridership, render_yearly,
};
