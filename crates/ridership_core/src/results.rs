use chrono::NaiveDate;
use serde::Serialize;

use ridership_model::{Coordinate, Direction};

use crate::percent::Share;

/// Entries shown at each end of a daily series.
pub const HIGHLIGHT_DAYS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryStatistics {
    pub stations: i64,
    pub stops: i64,
    pub ride_entries: i64,
    pub earliest_date: Option<NaiveDate>,
    pub latest_date: Option<NaiveDate>,
    pub total_riders: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RidershipBreakdown {
    pub station_name: String,
    pub weekday: Share,
    pub saturday: Share,
    pub sunday_holiday: Share,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationShare {
    pub station_name: String,
    pub count: i64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayRidership {
    pub total: i64,
    pub stations: Vec<StationShare>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineStop {
    pub stop_name: String,
    pub accessible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineDirectionCount {
    pub color: String,
    pub direction: Direction,
    pub stops: i64,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearTotal {
    pub year: i32,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearlyRidership {
    pub station_name: String,
    pub years: Vec<YearTotal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthTotal {
    pub year: i32,
    pub month: u32,
    pub total: i64,
}

impl MonthTotal {
    /// `MM/YYYY`
    pub fn label(&self) -> String {
        format!("{:02}/{:04}", self.month, self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyRidership {
    pub station_name: Option<String>,
    pub year: i32,
    pub months: Vec<MonthTotal>,
}

impl MonthlyRidership {
    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn total(&self) -> i64 {
        self.months.iter().map(|month| month.total).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySeries {
    pub station: Option<StationRef>,
    pub days: Vec<DayTotal>,
}

impl DailySeries {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn head(&self) -> &[DayTotal] {
        &self.days[..self.days.len().min(HIGHLIGHT_DAYS)]
    }

    pub fn tail(&self) -> &[DayTotal] {
        &self.days[self.days.len().saturating_sub(HIGHLIGHT_DAYS)..]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RidershipComparison {
    pub year: i32,
    pub first: DailySeries,
    pub second: DailySeries,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyStation {
    pub station_name: String,
    pub coordinate: Coordinate,
}
