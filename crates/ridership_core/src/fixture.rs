//! Small in-memory copy of the dataset layout, used by the test suites of
//! this crate and its dependents (`test-fixture` feature).

use rusqlite::Connection;

use crate::RidershipQueryService;

pub const SCHEMA_SQL: &str = "
CREATE TABLE Stations (
    Station_ID INTEGER PRIMARY KEY,
    Station_Name TEXT NOT NULL
);
CREATE TABLE Stops (
    Stop_ID INTEGER PRIMARY KEY,
    Station_ID INTEGER NOT NULL REFERENCES Stations(Station_ID),
    Stop_Name TEXT NOT NULL,
    Direction TEXT NOT NULL,
    ADA INTEGER NOT NULL,
    Latitude REAL NOT NULL,
    Longitude REAL NOT NULL
);
CREATE TABLE Lines (
    Line_ID INTEGER PRIMARY KEY,
    Color TEXT NOT NULL
);
CREATE TABLE StopDetails (
    Stop_ID INTEGER NOT NULL REFERENCES Stops(Stop_ID),
    Line_ID INTEGER NOT NULL REFERENCES Lines(Line_ID)
);
CREATE TABLE Ridership (
    Station_ID INTEGER NOT NULL REFERENCES Stations(Station_ID),
    Ride_Date TEXT NOT NULL,
    Type_of_Day TEXT NOT NULL,
    Num_Riders INTEGER NOT NULL
);
";

pub const SAMPLE_ROWS_SQL: &str = "
INSERT INTO Stations VALUES
    (1, 'Clark/Lake'),
    (2, 'State/Lake'),
    (3, 'Statesville'),
    (4, 'O''Hare Airport'),
    (5, 'Washington'),
    (6, 'Washington/Wells');

INSERT INTO Lines VALUES (1, 'Red'), (2, 'Blue'), (3, 'Brown');

INSERT INTO Stops VALUES
    (101, 1, 'Clark/Lake (Blue-O''Hare)', 'N', 1, 41.885737, -87.630886),
    (102, 1, 'Clark/Lake (Blue-Forest Park)', 'S', 1, 41.8858, -87.630886),
    (103, 2, 'State/Lake (Loop)', 'E', 0, 41.88574, -87.627835),
    (104, 3, 'Statesville (Southbound)', 'S', 1, 41.95, -87.65),
    (105, 3, 'Statesville (Northbound)', 'N', 0, 41.95, -87.65),
    (106, 4, 'O''Hare (Forest Park-bound)', 'S', 1, 41.97766, -87.904223),
    (107, 5, 'Washington (Red)', 'N', 1, 41.8837, -87.6278),
    (108, 6, 'Washington/Wells (Loop)', 'S', 1, 41.882695, -87.63378),
    (109, 1, 'Clark/Lake (Loop)', 'E', 1, 41.885737, -87.630886);

INSERT INTO StopDetails VALUES
    (101, 2), (102, 2), (103, 3), (104, 1), (105, 1),
    (106, 2), (107, 1), (108, 3), (109, 3);

INSERT INTO Ridership VALUES
    (1, '2020-12-31 00:00:00.000', 'W', 1000),
    (1, '2021-01-02 00:00:00.000', 'A', 400),
    (1, '2021-01-03 00:00:00.000', 'U', 300),
    (1, '2021-01-04 00:00:00.000', 'W', 2000),
    (1, '2021-02-01 00:00:00.000', 'W', 1500),
    (1, '2021-02-06 00:00:00.000', 'A', 500),
    (1, '2022-03-01 00:00:00.000', 'W', 1200),
    (2, '2021-01-04 00:00:00.000', 'W', 800),
    (2, '2021-01-05 00:00:00.000', 'W', 700),
    (2, '2021-01-09 00:00:00.000', 'A', 200),
    (3, '2021-01-04 00:00:00.000', 'W', 100),
    (4, '2021-01-04 00:00:00.000', 'W', 3000),
    (4, '2021-01-10 00:00:00.000', 'U', 1000);
";

pub fn sample_connection() -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory dataset");
    conn.execute_batch(SCHEMA_SQL).expect("create schema");
    conn.execute_batch(SAMPLE_ROWS_SQL).expect("insert sample rows");
    conn
}

pub fn sample_service() -> RidershipQueryService {
    RidershipQueryService::from_connection(sample_connection()).expect("sample service")
}

/// Same tables, no rows.
pub fn empty_service() -> RidershipQueryService {
    let conn = Connection::open_in_memory().expect("open in-memory dataset");
    conn.execute_batch(SCHEMA_SQL).expect("create schema");
    RidershipQueryService::from_connection(conn).expect("empty service")
}
