use serde::Serialize;

/// `part / total * 100`, rounded to two decimals. `None` when `total` is not
/// positive.
pub fn percent_of(part: i64, total: i64) -> Option<f64> {
    if total <= 0 {
        return None;
    }
    Some(round_hundredths(part as f64 / total as f64 * 100.0))
}

pub fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// An absolute count together with its share of some total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Share {
    pub count: i64,
    pub percent: f64,
}

impl Share {
    pub fn of(count: i64, total: i64) -> Option<Self> {
        percent_of(count, total).map(|percent| Self { count, percent })
    }
}
