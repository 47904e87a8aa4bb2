use std::path::Path;

use rusqlite::{params, Connection};
use tracing::debug;

use ridership_model::{parse_ride_date, BoundingBox, Coordinate, DayType, Direction};

use crate::dataset::{open_read_only, DatasetError, QueryError};
use crate::outcome::{Outcome, StationMatch};
use crate::percent::{percent_of, Share};
use crate::results::{
    DailySeries, DayTotal, LineDirectionCount, LineStop, MonthTotal, MonthlyRidership,
    NearbyStation, RidershipBreakdown, RidershipComparison, StationRef, StationShare,
    SummaryStatistics, WeekdayRidership, YearTotal, YearlyRidership,
};
use crate::schema::missing_tables;

const FIND_STATIONS_SQL: &str = "
    SELECT Station_ID, Station_Name FROM Stations
    WHERE Station_Name LIKE ?1
    GROUP BY Station_ID
    ORDER BY Station_Name ASC, Station_ID ASC";

const BREAKDOWN_SQL: &str = "
    SELECT
        COALESCE(SUM(CASE WHEN Type_of_Day = ?2 THEN Num_Riders END), 0),
        COALESCE(SUM(CASE WHEN Type_of_Day = ?3 THEN Num_Riders END), 0),
        COALESCE(SUM(CASE WHEN Type_of_Day = ?4 THEN Num_Riders END), 0),
        COALESCE(SUM(Num_Riders), 0)
    FROM Stations JOIN Ridership
    ON Stations.Station_ID = Ridership.Station_ID
    WHERE Station_Name = ?1";

const WEEKDAY_TOTAL_SQL: &str = "
    SELECT COALESCE(SUM(Num_Riders), 0) FROM Stations
    JOIN Ridership ON Stations.Station_ID = Ridership.Station_ID
    WHERE Type_of_Day = ?1";

const WEEKDAY_BY_STATION_SQL: &str = "
    SELECT Station_Name, SUM(Num_Riders) AS Total
    FROM Stations JOIN Ridership
    ON Stations.Station_ID = Ridership.Station_ID
    WHERE Type_of_Day = ?1
    GROUP BY Station_Name
    ORDER BY Total DESC, Station_Name ASC";

const LINE_STOPS_SQL: &str = "
    SELECT Stop_Name, MAX(ADA) FROM Stops
    JOIN StopDetails ON Stops.Stop_ID = StopDetails.Stop_ID
    JOIN Lines ON StopDetails.Line_ID = Lines.Line_ID
    WHERE Color LIKE ?1
    AND Direction LIKE ?2
    GROUP BY Stop_Name
    ORDER BY Stop_Name ASC";

const STOP_COUNTS_SQL: &str = "
    SELECT Color, Direction, COUNT(DISTINCT Stops.Stop_ID) AS NumStops
    FROM Stops
    JOIN StopDetails ON Stops.Stop_ID = StopDetails.Stop_ID
    JOIN Lines ON StopDetails.Line_ID = Lines.Line_ID
    GROUP BY Color, Direction
    ORDER BY Color ASC, Direction ASC";

const YEARLY_SQL: &str = "
    SELECT strftime('%Y', Ride_Date) AS Year, SUM(Num_Riders) AS Total, MIN(Station_Name)
    FROM Stations JOIN Ridership
    ON Stations.Station_ID = Ridership.Station_ID
    WHERE Station_Name LIKE ?1
    GROUP BY Year
    ORDER BY Year ASC";

const MONTHLY_SQL: &str = "
    SELECT strftime('%m', Ride_Date) AS Month, SUM(Num_Riders) AS Total, MIN(Station_Name)
    FROM Stations JOIN Ridership
    ON Stations.Station_ID = Ridership.Station_ID
    WHERE Station_Name LIKE ?1
    AND strftime('%Y', Ride_Date) = ?2
    GROUP BY Month
    ORDER BY Month ASC";

const DAILY_SQL: &str = "
    SELECT date(Ride_Date) AS Day, SUM(Num_Riders) AS Total,
           MIN(Stations.Station_ID), MIN(Station_Name)
    FROM Stations JOIN Ridership
    ON Stations.Station_ID = Ridership.Station_ID
    WHERE Station_Name LIKE ?1
    AND strftime('%Y', Ride_Date) = ?2
    GROUP BY Day
    ORDER BY Day ASC";

const STATION_NAMES_SQL: &str = "
    SELECT Station_Name FROM Stations
    WHERE Station_Name LIKE ?1
    GROUP BY Station_Name
    ORDER BY Station_Name ASC";

const NEARBY_SQL: &str = "
    SELECT Station_Name, Latitude, Longitude
    FROM Stations JOIN Stops
    ON Stations.Station_ID = Stops.Station_ID
    WHERE Latitude >= ?1 AND Latitude <= ?2
    AND Longitude >= ?3 AND Longitude <= ?4
    GROUP BY Station_Name, Latitude, Longitude
    ORDER BY Station_Name ASC, Latitude DESC";

/// Read-only analytical queries over the ridership dataset. Owns the single
/// connection for its whole lifetime; dropping the service closes it.
pub struct RidershipQueryService {
    conn: Connection,
}

impl RidershipQueryService {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let conn = open_read_only(path.as_ref())?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, DatasetError> {
        if let Some(table) = missing_tables(&conn)?.first() {
            return Err(DatasetError::MissingTable(table.to_string()));
        }
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn summary_statistics(&self) -> Result<SummaryStatistics, QueryError> {
        debug!("summary statistics");
        let stations = self.count("SELECT COUNT(*) FROM Stations")?;
        let stops = self.count("SELECT COUNT(*) FROM Stops")?;
        let ride_entries = self.count("SELECT COUNT(*) FROM Ridership")?;
        let total_riders = self.count("SELECT COALESCE(SUM(Num_Riders), 0) FROM Ridership")?;
        let (earliest, latest): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(date(Ride_Date)), MAX(date(Ride_Date)) FROM Ridership",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(SummaryStatistics {
            stations,
            stops,
            ride_entries,
            earliest_date: earliest.as_deref().map(parse_ride_date).transpose()?,
            latest_date: latest.as_deref().map(parse_ride_date).transpose()?,
            total_riders,
        })
    }

    /// Stations whose name matches `pattern`, ascending by name. An empty
    /// vector means nothing matched.
    pub fn find_stations(&self, pattern: &str) -> Result<Vec<StationRef>, QueryError> {
        debug!(pattern, "find stations");
        let mut stmt = self.conn.prepare(FIND_STATIONS_SQL)?;
        let rows = stmt.query_map([pattern], |row| {
            Ok(StationRef {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Day-type split of the total ridership for the station named exactly
    /// `station_name`.
    pub fn ridership_breakdown(
        &self,
        station_name: &str,
    ) -> Result<Outcome<RidershipBreakdown>, QueryError> {
        debug!(station_name, "ridership breakdown");
        let stations = self.conn.query_row(
            "SELECT COUNT(*) FROM Stations WHERE Station_Name = ?1",
            [station_name],
            |row| row.get::<_, i64>(0),
        )?;
        if stations == 0 {
            return Ok(Outcome::NotFound);
        }

        let (weekday, saturday, sunday_holiday, total): (i64, i64, i64, i64) =
            self.conn.query_row(
                BREAKDOWN_SQL,
                params![
                    station_name,
                    DayType::Weekday.code(),
                    DayType::Saturday.code(),
                    DayType::SundayHoliday.code()
                ],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        let shares = (
            Share::of(weekday, total),
            Share::of(saturday, total),
            Share::of(sunday_holiday, total),
        );
        let (Some(weekday), Some(saturday), Some(sunday_holiday)) = shares else {
            return Ok(Outcome::NoData);
        };
        Ok(Outcome::Found(RidershipBreakdown {
            station_name: station_name.to_string(),
            weekday,
            saturday,
            sunday_holiday,
            total,
        }))
    }

    /// Weekday ridership of every station and its share of the system-wide
    /// weekday total, busiest first.
    pub fn weekday_ridership_by_station(&self) -> Result<Outcome<WeekdayRidership>, QueryError> {
        debug!("weekday ridership by station");
        let code = DayType::Weekday.code();
        let total: i64 = self
            .conn
            .query_row(WEEKDAY_TOTAL_SQL, [code], |row| row.get(0))?;
        if total <= 0 {
            return Ok(Outcome::NoData);
        }

        let mut stmt = self.conn.prepare(WEEKDAY_BY_STATION_SQL)?;
        let rows = stmt
            .query_map([code], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let stations = rows
            .into_iter()
            .map(|(station_name, count)| StationShare {
                station_name,
                count,
                percent: percent_of(count, total).unwrap_or_default(),
            })
            .collect();
        Ok(Outcome::Found(WeekdayRidership { total, stations }))
    }

    pub fn line_exists(&self, color_pattern: &str) -> Result<bool, QueryError> {
        debug!(color_pattern, "line exists");
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM Lines WHERE Color LIKE ?1)",
            [color_pattern],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(exists)
    }

    /// Distinct stop names served by the matching line in `direction`. An
    /// empty vector means the line does not run that way.
    pub fn line_stops(
        &self,
        color_pattern: &str,
        direction: Direction,
    ) -> Result<Vec<LineStop>, QueryError> {
        debug!(color_pattern, %direction, "line stops");
        let mut stmt = self.conn.prepare(LINE_STOPS_SQL)?;
        let rows = stmt.query_map(params![color_pattern, direction.code()], |row| {
            Ok(LineStop {
                stop_name: row.get(0)?,
                accessible: row.get::<_, Option<i64>>(1)?.unwrap_or(0) != 0,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Percentages are relative to every row of `Stops`, so a stop served
    /// by several lines counts toward each of them.
    pub fn stop_counts_by_line_and_direction(
        &self,
    ) -> Result<Outcome<Vec<LineDirectionCount>>, QueryError> {
        debug!("stop counts by line and direction");
        let total_stops = self.count("SELECT COUNT(*) FROM Stops")?;
        if total_stops <= 0 {
            return Ok(Outcome::NoData);
        }

        let mut stmt = self.conn.prepare(STOP_COUNTS_SQL)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut counts = Vec::with_capacity(rows.len());
        for (color, direction, stops) in rows {
            counts.push(LineDirectionCount {
                color,
                direction: Direction::parse(&direction)?,
                stops,
                percent: percent_of(stops, total_stops).unwrap_or_default(),
            });
        }
        Ok(Outcome::Found(counts))
    }

    pub fn yearly_ridership(
        &self,
        station_pattern: &str,
    ) -> Result<Outcome<YearlyRidership>, QueryError> {
        debug!(station_pattern, "yearly ridership");
        let mut stmt = self.conn.prepare(YEARLY_SQL)?;
        let rows = stmt
            .query_map([station_pattern], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let Some(station_name) = rows.first().map(|(_, _, name)| name.clone()) else {
            return Ok(Outcome::NotFound);
        };
        let years = rows
            .into_iter()
            .map(|(year, total, _)| {
                Ok(YearTotal {
                    year: parse_component("Year", &year)?,
                    total,
                })
            })
            .collect::<Result<Vec<_>, QueryError>>()?;
        Ok(Outcome::Found(YearlyRidership {
            station_name,
            years,
        }))
    }

    /// Monthly totals for `year`. A station/year without rows yields an
    /// empty result rather than an error.
    pub fn monthly_ridership(
        &self,
        station_pattern: &str,
        year: i32,
    ) -> Result<MonthlyRidership, QueryError> {
        debug!(station_pattern, year, "monthly ridership");
        let mut stmt = self.conn.prepare(MONTHLY_SQL)?;
        let rows = stmt
            .query_map(params![station_pattern, year_key(year)], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let station_name = rows.first().map(|(_, _, name)| name.clone());
        let months = rows
            .into_iter()
            .map(|(month, total, _)| {
                Ok(MonthTotal {
                    year,
                    month: parse_component("Month", &month)?,
                    total,
                })
            })
            .collect::<Result<Vec<_>, QueryError>>()?;
        Ok(MonthlyRidership {
            station_name,
            year,
            months,
        })
    }

    pub fn daily_ridership(
        &self,
        station_pattern: &str,
        year: i32,
    ) -> Result<DailySeries, QueryError> {
        debug!(station_pattern, year, "daily ridership");
        let mut stmt = self.conn.prepare(DAILY_SQL)?;
        let rows = stmt
            .query_map(params![station_pattern, year_key(year)], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let station = rows.first().map(|(_, _, id, name)| StationRef {
            id: *id,
            name: name.clone(),
        });
        let days = rows
            .into_iter()
            .map(|(date, total, _, _)| {
                Ok(DayTotal {
                    date: parse_ride_date(&date)?,
                    total,
                })
            })
            .collect::<Result<Vec<_>, QueryError>>()?;
        Ok(DailySeries { station, days })
    }

    pub fn compare_daily_ridership(
        &self,
        first_pattern: &str,
        second_pattern: &str,
        year: i32,
    ) -> Result<RidershipComparison, QueryError> {
        Ok(RidershipComparison {
            year,
            first: self.daily_ridership(first_pattern, year)?,
            second: self.daily_ridership(second_pattern, year)?,
        })
    }

    /// Resolves `pattern` against distinct station names.
    pub fn station_match(&self, pattern: &str) -> Result<StationMatch, QueryError> {
        debug!(pattern, "station match");
        let mut stmt = self.conn.prepare(STATION_NAMES_SQL)?;
        let names = stmt
            .query_map([pattern], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StationMatch::from_names(names))
    }

    pub fn station_exists_uniquely(&self, pattern: &str) -> Result<bool, QueryError> {
        Ok(self.station_match(pattern)?.is_unique())
    }

    /// Stations with a stop inside the one-mile box around `center`.
    pub fn nearby_stations(&self, center: Coordinate) -> Result<Vec<NearbyStation>, QueryError> {
        let bbox = BoundingBox::one_mile_around(center);
        debug!(?bbox, "nearby stations");
        let mut stmt = self.conn.prepare(NEARBY_SQL)?;
        let rows = stmt.query_map(
            params![
                bbox.min_latitude,
                bbox.max_latitude,
                bbox.min_longitude,
                bbox.max_longitude
            ],
            |row| {
                Ok(NearbyStation {
                    station_name: row.get(0)?,
                    coordinate: Coordinate::new(row.get(1)?, row.get(2)?),
                })
            },
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn count(&self, sql: &str) -> Result<i64, QueryError> {
        Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
    }
}

fn year_key(year: i32) -> String {
    format!("{:04}", year)
}

fn parse_component<T: std::str::FromStr>(
    column: &'static str,
    value: &str,
) -> Result<T, QueryError> {
    value.parse().map_err(|_| QueryError::InvalidColumn {
        column,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{empty_service, sample_service};
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("date")
    }

    #[test]
    fn summary_statistics_cover_whole_dataset() {
        let service = sample_service();
        let summary = service.summary_statistics().expect("summary");
        assert_eq!(summary.stations, 6);
        assert_eq!(summary.stops, 9);
        assert_eq!(summary.ride_entries, 13);
        assert_eq!(summary.earliest_date, Some(date(2020, 12, 31)));
        assert_eq!(summary.latest_date, Some(date(2022, 3, 1)));
        assert_eq!(summary.total_riders, 12_700);
    }

    #[test]
    fn summary_statistics_of_empty_dataset_are_zero() {
        let service = empty_service();
        let summary = service.summary_statistics().expect("summary");
        assert_eq!(summary.stations, 0);
        assert_eq!(summary.ride_entries, 0);
        assert_eq!(summary.earliest_date, None);
        assert_eq!(summary.latest_date, None);
        assert_eq!(summary.total_riders, 0);
    }

    #[test]
    fn find_stations_orders_by_name() {
        let service = sample_service();
        let stations = service.find_stations("State%").expect("query");
        assert_eq!(
            stations,
            vec![
                StationRef {
                    id: 2,
                    name: "State/Lake".to_string()
                },
                StationRef {
                    id: 3,
                    name: "Statesville".to_string()
                },
            ]
        );
        let names: Vec<_> = service
            .find_stations("%Lake")
            .expect("query")
            .into_iter()
            .map(|station| station.name)
            .collect();
        assert_eq!(names, vec!["Clark/Lake", "State/Lake"]);
    }

    #[test]
    fn find_stations_keeps_duplicate_names_in_id_order() {
        let conn = crate::fixture::sample_connection();
        conn.execute_batch("INSERT INTO Stations VALUES (8, 'Clark/Lake'), (7, 'Clark/Lake');")
            .expect("duplicate names");
        let service = RidershipQueryService::from_connection(conn).expect("service");
        let ids: Vec<(i64, String)> = service
            .find_stations("Clark%")
            .expect("query")
            .into_iter()
            .map(|station| (station.id, station.name))
            .collect();
        assert_eq!(
            ids,
            vec![
                (1, "Clark/Lake".to_string()),
                (7, "Clark/Lake".to_string()),
                (8, "Clark/Lake".to_string()),
            ]
        );
    }

    #[test]
    fn find_stations_without_match_is_empty() {
        let service = sample_service();
        assert!(service.find_stations("NoSuchStation").expect("query").is_empty());
    }

    #[test]
    fn find_stations_supports_single_character_wildcard() {
        let service = sample_service();
        let names: Vec<_> = service
            .find_stations("Stat_/Lake")
            .expect("query")
            .into_iter()
            .map(|station| station.name)
            .collect();
        assert_eq!(names, vec!["State/Lake"]);
    }

    #[test]
    fn breakdown_splits_by_day_type() {
        let service = sample_service();
        let breakdown = service
            .ridership_breakdown("Clark/Lake")
            .expect("query")
            .found()
            .expect("found");
        assert_eq!(breakdown.total, 6_900);
        assert_eq!(breakdown.weekday, Share { count: 5_700, percent: 82.61 });
        assert_eq!(breakdown.saturday, Share { count: 900, percent: 13.04 });
        assert_eq!(breakdown.sunday_holiday, Share { count: 300, percent: 4.35 });
        let sum = breakdown.weekday.percent
            + breakdown.saturday.percent
            + breakdown.sunday_holiday.percent;
        assert!((sum - 100.0).abs() < 0.02, "sum was {}", sum);
    }

    #[test]
    fn breakdown_distinguishes_absent_station_from_no_data() {
        let service = sample_service();
        assert_eq!(
            service.ridership_breakdown("Nowhere").expect("query"),
            Outcome::NotFound
        );
        assert_eq!(
            service.ridership_breakdown("Washington").expect("query"),
            Outcome::NoData
        );
    }

    #[test]
    fn breakdown_requires_exact_name() {
        let service = sample_service();
        assert_eq!(
            service.ridership_breakdown("Clark%").expect("query"),
            Outcome::NotFound
        );
    }

    #[test]
    fn weekday_ridership_sorted_descending() {
        let service = sample_service();
        let weekday = service
            .weekday_ridership_by_station()
            .expect("query")
            .found()
            .expect("found");
        assert_eq!(weekday.total, 10_300);
        let rows: Vec<(&str, i64, f64)> = weekday
            .stations
            .iter()
            .map(|row| (row.station_name.as_str(), row.count, row.percent))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Clark/Lake", 5_700, 55.34),
                ("O'Hare Airport", 3_000, 29.13),
                ("State/Lake", 1_500, 14.56),
                ("Statesville", 100, 0.97),
            ]
        );
        let sum: f64 = weekday.stations.iter().map(|row| row.percent).sum();
        assert!(sum <= 100.0 + 0.02);
        assert!((sum - 100.0).abs() < 0.02);
        assert!(weekday
            .stations
            .iter()
            .all(|row| (0.0..=100.0).contains(&row.percent)));
    }

    #[test]
    fn weekday_ridership_of_empty_dataset_is_no_data() {
        let service = empty_service();
        assert_eq!(
            service.weekday_ridership_by_station().expect("query"),
            Outcome::NoData
        );
    }

    #[test]
    fn line_exists_matches_patterns() {
        let service = sample_service();
        assert!(service.line_exists("Red").expect("query"));
        assert!(service.line_exists("red").expect("query"));
        assert!(service.line_exists("Br%").expect("query"));
        assert!(!service.line_exists("Purple").expect("query"));
    }

    #[test]
    fn line_stops_are_distinct_and_annotated() {
        let service = sample_service();
        let stops = service
            .line_stops("Red", Direction::North)
            .expect("query");
        assert_eq!(
            stops,
            vec![
                LineStop {
                    stop_name: "Statesville (Northbound)".to_string(),
                    accessible: false
                },
                LineStop {
                    stop_name: "Washington (Red)".to_string(),
                    accessible: true
                },
            ]
        );
    }

    #[test]
    fn line_stops_in_unserved_direction_are_empty() {
        let service = sample_service();
        assert!(service
            .line_stops("Blue", Direction::West)
            .expect("query")
            .is_empty());
    }

    #[test]
    fn stop_counts_ordered_by_color_then_direction() {
        let service = sample_service();
        let counts = service
            .stop_counts_by_line_and_direction()
            .expect("query")
            .found()
            .expect("found");
        let rows: Vec<(&str, Direction, i64)> = counts
            .iter()
            .map(|row| (row.color.as_str(), row.direction, row.stops))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Blue", Direction::North, 1),
                ("Blue", Direction::South, 2),
                ("Brown", Direction::East, 2),
                ("Brown", Direction::South, 1),
                ("Red", Direction::North, 2),
                ("Red", Direction::South, 1),
            ]
        );
        assert_eq!(counts[1].percent, 22.22);
        // Every sample stop serves a single line.
        let sum: f64 = counts.iter().map(|row| row.percent).sum();
        assert!((sum - 100.0).abs() < 0.05, "sum was {}", sum);
    }

    #[test]
    fn stop_counts_count_shared_stops_once_per_line() {
        let conn = crate::fixture::sample_connection();
        conn.execute_batch("INSERT INTO StopDetails VALUES (109, 1);")
            .expect("share stop");
        let service = RidershipQueryService::from_connection(conn).expect("service");
        let counts = service
            .stop_counts_by_line_and_direction()
            .expect("query")
            .found()
            .expect("found");
        let rows: Vec<(&str, Direction, i64, f64)> = counts
            .iter()
            .map(|row| (row.color.as_str(), row.direction, row.stops, row.percent))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Blue", Direction::North, 1, 11.11),
                ("Blue", Direction::South, 2, 22.22),
                ("Brown", Direction::East, 2, 22.22),
                ("Brown", Direction::South, 1, 11.11),
                ("Red", Direction::East, 1, 11.11),
                ("Red", Direction::North, 2, 22.22),
                ("Red", Direction::South, 1, 11.11),
            ]
        );
        // The denominator stays the nine rows of Stops.
        let sum: f64 = counts.iter().map(|row| row.percent).sum();
        assert!((sum - 111.1).abs() < 0.05, "sum was {}", sum);
    }

    #[test]
    fn yearly_ridership_grouped_by_year() {
        let service = sample_service();
        let yearly = service
            .yearly_ridership("Clark%")
            .expect("query")
            .found()
            .expect("found");
        assert_eq!(yearly.station_name, "Clark/Lake");
        assert_eq!(
            yearly.years,
            vec![
                YearTotal { year: 2020, total: 1_000 },
                YearTotal { year: 2021, total: 4_700 },
                YearTotal { year: 2022, total: 1_200 },
            ]
        );
    }

    #[test]
    fn yearly_ridership_without_match_is_not_found() {
        let service = sample_service();
        assert_eq!(
            service.yearly_ridership("Nowhere").expect("query"),
            Outcome::NotFound
        );
    }

    #[test]
    fn monthly_ridership_for_year() {
        let service = sample_service();
        let monthly = service.monthly_ridership("Clark/Lake", 2021).expect("query");
        assert_eq!(monthly.station_name.as_deref(), Some("Clark/Lake"));
        let rows: Vec<(String, i64)> = monthly
            .months
            .iter()
            .map(|month| (month.label(), month.total))
            .collect();
        assert_eq!(
            rows,
            vec![("01/2021".to_string(), 2_700), ("02/2021".to_string(), 2_000)]
        );
    }

    #[test]
    fn monthly_ridership_without_rows_is_empty() {
        let service = sample_service();
        let monthly = service.monthly_ridership("Clark/Lake", 2019).expect("query");
        assert!(monthly.is_empty());
        assert_eq!(monthly.station_name, None);
        assert_eq!(monthly.year, 2019);
    }

    #[test]
    fn monthly_totals_add_up_to_yearly_total() {
        let service = sample_service();
        let yearly = service
            .yearly_ridership("Clark/Lake")
            .expect("query")
            .found()
            .expect("found");
        for entry in &yearly.years {
            let monthly = service
                .monthly_ridership("Clark/Lake", entry.year)
                .expect("query");
            assert_eq!(monthly.total(), entry.total, "year {}", entry.year);
        }
    }

    #[test]
    fn daily_comparison_returns_both_series() {
        let service = sample_service();
        let comparison = service
            .compare_daily_ridership("Clark/Lake", "State/Lake", 2021)
            .expect("query");
        assert_eq!(comparison.year, 2021);
        assert_eq!(
            comparison.first.station,
            Some(StationRef {
                id: 1,
                name: "Clark/Lake".to_string()
            })
        );
        let first: Vec<(NaiveDate, i64)> = comparison
            .first
            .days
            .iter()
            .map(|day| (day.date, day.total))
            .collect();
        assert_eq!(
            first,
            vec![
                (date(2021, 1, 2), 400),
                (date(2021, 1, 3), 300),
                (date(2021, 1, 4), 2_000),
                (date(2021, 2, 1), 1_500),
                (date(2021, 2, 6), 500),
            ]
        );
        assert_eq!(comparison.second.days.len(), 3);
        assert_eq!(comparison.second.head()[0].date, date(2021, 1, 4));
        assert_eq!(comparison.second.tail()[2].total, 200);
    }

    #[test]
    fn daily_series_for_year_without_rows_is_empty() {
        let service = sample_service();
        let series = service.daily_ridership("State/Lake", 2020).expect("query");
        assert!(series.is_empty());
        assert_eq!(series.station, None);
    }

    #[test]
    fn station_match_is_tri_state() {
        let service = sample_service();
        assert_eq!(
            service.station_match("Clark/Lake").expect("query"),
            StationMatch::Unique("Clark/Lake".to_string())
        );
        assert_eq!(
            service.station_match("Washington%").expect("query"),
            StationMatch::Ambiguous(vec![
                "Washington".to_string(),
                "Washington/Wells".to_string()
            ])
        );
        assert_eq!(
            service.station_match("Nowhere").expect("query"),
            StationMatch::Absent
        );
        assert!(service.station_exists_uniquely("Clark%").expect("query"));
        assert!(!service.station_exists_uniquely("State%").expect("query"));
    }

    #[test]
    fn nearby_stations_inside_box_deduplicated_and_ordered() {
        let service = sample_service();
        let center = Coordinate::new(41.88, -87.63);
        let nearby = service.nearby_stations(center).expect("query");
        let expected = [
            ("Clark/Lake", 41.8858),
            ("Clark/Lake", 41.885737),
            ("State/Lake", 41.88574),
            ("Washington", 41.8837),
            ("Washington/Wells", 41.882695),
        ];
        assert_eq!(nearby.len(), expected.len());
        for (row, (name, latitude)) in nearby.iter().zip(expected) {
            assert_eq!(row.station_name, name);
            assert!((row.coordinate.latitude - latitude).abs() < 1e-9);
        }
        let bbox = BoundingBox::one_mile_around(center);
        assert!(nearby.iter().all(|row| bbox.contains(row.coordinate)));
    }

    #[test]
    fn nearby_stations_far_from_network_is_empty() {
        let service = sample_service();
        let nearby = service
            .nearby_stations(Coordinate::new(40.5, -87.5))
            .expect("query");
        assert!(nearby.is_empty());
    }

    #[test]
    fn opens_dataset_file_read_only() {
        use crate::fixture::{SAMPLE_ROWS_SQL, SCHEMA_SQL};
        use std::time::{SystemTime, UNIX_EPOCH};

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "ridership_sample_{}_{}.db",
            std::process::id(),
            nanos
        ));
        {
            let conn = Connection::open(&path).expect("create db");
            conn.execute_batch(SCHEMA_SQL).expect("schema");
            conn.execute_batch(SAMPLE_ROWS_SQL).expect("rows");
        }

        let service = RidershipQueryService::open(&path).expect("open");
        assert_eq!(service.summary_statistics().expect("summary").stations, 6);
        assert!(service
            .connection()
            .execute("DELETE FROM Ridership", [])
            .is_err());
        drop(service);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_connection_missing_tables() {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute_batch("CREATE TABLE Stations (Station_ID INTEGER, Station_Name TEXT);")
            .expect("create");
        let err = RidershipQueryService::from_connection(conn)
            .err()
            .expect("missing tables");
        assert!(matches!(err, DatasetError::MissingTable(ref table) if table == "Stops"));
    }
}
