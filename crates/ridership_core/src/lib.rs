pub mod dataset;
pub mod outcome;
pub mod percent;
pub mod results;
pub mod schema;
pub mod service;

#[cfg(any(test, feature = "test-fixture"))]
pub mod fixture;

pub use dataset::{open_read_only, DatasetError, QueryError};
pub use outcome::{Outcome, StationMatch};
pub use percent::{percent_of, Share};
pub use results::{
    DailySeries, DayTotal, LineDirectionCount, LineStop, MonthTotal, MonthlyRidership,
    NearbyStation, RidershipBreakdown, RidershipComparison, StationRef, StationShare,
    SummaryStatistics, WeekdayRidership, YearTotal, YearlyRidership, HIGHLIGHT_DAYS,
};
pub use schema::{missing_tables, REQUIRED_TABLES};
pub use service::RidershipQueryService;
