use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// One degree of latitude is roughly 69 miles.
pub const MILES_PER_DEGREE_LATITUDE: f64 = 69.0;
/// One degree of longitude is roughly 51 miles at the dataset's latitude.
pub const MILES_PER_DEGREE_LONGITUDE: f64 = 51.0;

#[derive(Debug, thiserror::Error)]
pub enum ModelParseError {
    #[error("invalid day type: {0}")]
    InvalidDayType(String),
    #[error("invalid direction: {0}")]
    InvalidDirection(String),
    #[error("invalid ride date: {0}")]
    InvalidRideDate(String),
}

/// Classification of a ridership record, stored as `W`, `A` or `U`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DayType {
    Weekday,
    Saturday,
    SundayHoliday,
}

impl DayType {
    pub fn parse(value: &str) -> Result<Self, ModelParseError> {
        match value.trim().to_ascii_uppercase().as_str() {
            "W" => Ok(DayType::Weekday),
            "A" => Ok(DayType::Saturday),
            "U" => Ok(DayType::SundayHoliday),
            _ => Err(ModelParseError::InvalidDayType(value.to_string())),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DayType::Weekday => "W",
            DayType::Saturday => "A",
            DayType::SundayHoliday => "U",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DayType::Weekday => "Weekday",
            DayType::Saturday => "Saturday",
            DayType::SundayHoliday => "Sunday/holiday",
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for DayType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Travel direction of a stop, stored as a one-letter compass code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn parse(value: &str) -> Result<Self, ModelParseError> {
        match value.trim().to_ascii_uppercase().as_str() {
            "N" => Ok(Direction::North),
            "S" => Ok(Direction::South),
            "E" => Ok(Direction::East),
            "W" => Ok(Direction::West),
            _ => Err(ModelParseError::InvalidDirection(value.to_string())),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Direction::North => "N",
            Direction::South => "S",
            Direction::East => "E",
            Direction::West => "W",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Parses the date part of a `Ride_Date` value. The dataset stores either a
/// bare `YYYY-MM-DD` or a datetime such as `2021-01-04 00:00:00.000`.
pub fn parse_ride_date(value: &str) -> Result<NaiveDate, ModelParseError> {
    let trimmed = value.trim();
    let date_part = trimmed
        .split(|ch: char| ch == ' ' || ch == 'T')
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| ModelParseError::InvalidRideDate(value.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Inclusive latitude/longitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    /// Flat-earth box of roughly one mile in every direction. Only meaningful
    /// near the dataset's own latitude.
    pub fn one_mile_around(center: Coordinate) -> Self {
        let lat_delta = 1.0 / MILES_PER_DEGREE_LATITUDE;
        let lon_delta = 1.0 / MILES_PER_DEGREE_LONGITUDE;
        Self {
            min_latitude: center.latitude - lat_delta,
            max_latitude: center.latitude + lat_delta,
            min_longitude: center.longitude - lon_delta,
            max_longitude: center.longitude + lon_delta,
        }
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&point.latitude)
            && (self.min_longitude..=self.max_longitude).contains(&point.longitude)
    }
}
