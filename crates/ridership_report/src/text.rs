use std::fmt::Write;

use ridership_core::{
    LineDirectionCount, LineStop, MonthlyRidership, NearbyStation, Outcome, RidershipBreakdown,
    RidershipComparison, StationRef, SummaryStatistics, WeekdayRidership, YearlyRidership,
};
use ridership_model::{DayType, Direction};

pub const NO_DATA: &str = "**No data found...";
pub const NO_STATIONS: &str = "**No stations found...";
pub const NO_DIRECTION: &str = "**That line does not run in the direction chosen...";

/// `1234567` -> `1,234,567`
pub fn format_count(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

pub fn render_summary(summary: &SummaryStatistics) -> String {
    let mut out = String::new();
    writeln!(out, "   # of stations: {}", summary.stations).ok();
    writeln!(out, "   # of stops: {}", summary.stops).ok();
    writeln!(
        out,
        "   # of ride entries: {}",
        format_count(summary.ride_entries)
    )
    .ok();
    match (summary.earliest_date, summary.latest_date) {
        (Some(earliest), Some(latest)) => {
            writeln!(out, "   date range: {} - {}", earliest, latest).ok();
        }
        _ => out.push_str("   date range: N/A\n"),
    }
    writeln!(
        out,
        "   Total ridership: {}",
        format_count(summary.total_riders)
    )
    .ok();
    out
}

pub fn render_stations(stations: &[StationRef]) -> String {
    if stations.is_empty() {
        return format!("{NO_STATIONS}\n");
    }
    let mut out = String::new();
    for station in stations {
        writeln!(out, "{} : {}", station.id, station.name).ok();
    }
    out
}

pub fn render_breakdown(outcome: &Outcome<RidershipBreakdown>) -> String {
    let Outcome::Found(breakdown) = outcome else {
        return format!("{NO_DATA}\n");
    };
    let mut out = String::new();
    writeln!(
        out,
        "Percentage of ridership for the {} station: ",
        breakdown.station_name
    )
    .ok();
    for (day_type, share) in [
        (DayType::Weekday, &breakdown.weekday),
        (DayType::Saturday, &breakdown.saturday),
        (DayType::SundayHoliday, &breakdown.sunday_holiday),
    ] {
        writeln!(
            out,
            "  {} ridership: {} ({})",
            day_type.label(),
            format_count(share.count),
            format_percent(share.percent)
        )
        .ok();
    }
    writeln!(out, "  Total ridership: {}", format_count(breakdown.total)).ok();
    out
}

pub fn render_weekday_ridership(outcome: &Outcome<WeekdayRidership>) -> String {
    let Outcome::Found(weekday) = outcome else {
        return format!("{NO_DATA}\n");
    };
    let mut out = String::from("Ridership on Weekdays for Each Station\n");
    for row in &weekday.stations {
        writeln!(
            out,
            "{} : {} ({})",
            row.station_name,
            format_count(row.count),
            format_percent(row.percent)
        )
        .ok();
    }
    out
}

pub fn render_line_stops(stops: &[LineStop], direction: Direction) -> String {
    if stops.is_empty() {
        return format!("{NO_DIRECTION}\n");
    }
    let mut out = String::new();
    for stop in stops {
        let access = if stop.accessible {
            "handicap accessible"
        } else {
            "not handicap accessible"
        };
        writeln!(
            out,
            "{} : direction = {} ({})",
            stop.stop_name, direction, access
        )
        .ok();
    }
    out
}

pub fn render_stop_counts(outcome: &Outcome<Vec<LineDirectionCount>>) -> String {
    let Outcome::Found(counts) = outcome else {
        return format!("{NO_DATA}\n");
    };
    let mut out = String::from("Number of Stops For Each Color By Direction\n");
    for row in counts {
        writeln!(
            out,
            "{} going {} : {} ({})",
            row.color,
            row.direction,
            row.stops,
            format_percent(row.percent)
        )
        .ok();
    }
    out
}

pub fn render_yearly(outcome: &Outcome<YearlyRidership>) -> String {
    let Outcome::Found(yearly) = outcome else {
        return format!("{NO_DATA}\n");
    };
    let mut out = String::new();
    writeln!(out, "Yearly Ridership at {}", yearly.station_name).ok();
    for entry in &yearly.years {
        writeln!(out, "{} : {}", entry.year, format_count(entry.total)).ok();
    }
    out
}

/// `requested` names the station in the header when no rows matched.
pub fn render_monthly(monthly: &MonthlyRidership, requested: &str) -> String {
    let name = monthly.station_name.as_deref().unwrap_or(requested);
    let mut out = String::new();
    writeln!(out, "Monthly Ridership at {} for {}", name, monthly.year).ok();
    for month in &monthly.months {
        writeln!(out, "{} : {}", month.label(), format_count(month.total)).ok();
    }
    out
}

pub fn render_comparison(comparison: &RidershipComparison) -> String {
    let mut out = String::new();
    for (index, series) in [&comparison.first, &comparison.second].iter().enumerate() {
        let Some(station) = series.station.as_ref() else {
            writeln!(
                out,
                "Station {}: no ridership in {}",
                index + 1,
                comparison.year
            )
            .ok();
            continue;
        };
        writeln!(out, "Station {}: {} {}", index + 1, station.id, station.name).ok();
        for day in series.head().iter().chain(series.tail()) {
            writeln!(out, "{} {}", day.date.format("%Y-%m-%d"), day.total).ok();
        }
    }
    out
}

pub fn render_nearby(stations: &[NearbyStation]) -> String {
    if stations.is_empty() {
        return format!("{NO_STATIONS}\n");
    }
    let mut out = String::from("\nList of Stations Within a Mile\n");
    for station in stations {
        writeln!(out, "{} : {}", station.station_name, station.coordinate).ok();
    }
    out
}
