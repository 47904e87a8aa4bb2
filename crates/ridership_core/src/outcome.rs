use serde::Serialize;

/// Result of a lookup that can legitimately come back empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Outcome<T> {
    Found(T),
    /// Nothing matched the filter.
    NotFound,
    /// The entity exists but has no rows to aggregate, or the denominator of
    /// a percentage is zero.
    NoData,
}

impl<T> Outcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Outcome::Found(value) => Some(value),
            Outcome::NotFound | Outcome::NoData => None,
        }
    }
}

/// How a station name pattern resolves against distinct station names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "names", rename_all = "snake_case")]
pub enum StationMatch {
    Unique(String),
    Ambiguous(Vec<String>),
    Absent,
}

impl StationMatch {
    pub fn from_names(mut names: Vec<String>) -> Self {
        match names.len() {
            0 => StationMatch::Absent,
            1 => StationMatch::Unique(names.remove(0)),
            _ => StationMatch::Ambiguous(names),
        }
    }

    pub fn is_unique(&self) -> bool {
        matches!(self, StationMatch::Unique(_))
    }

    pub fn unique_name(&self) -> Option<&str> {
        match self {
            StationMatch::Unique(name) => Some(name),
            StationMatch::Ambiguous(_) | StationMatch::Absent => None,
        }
    }
}
