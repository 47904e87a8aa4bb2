use rusqlite::Connection;

pub const STATIONS_TABLE: &str = "Stations";
pub const STOPS_TABLE: &str = "Stops";
pub const LINES_TABLE: &str = "Lines";
pub const STOP_DETAILS_TABLE: &str = "StopDetails";
pub const RIDERSHIP_TABLE: &str = "Ridership";

pub const REQUIRED_TABLES: &[&str] = &[
    STATIONS_TABLE,
    STOPS_TABLE,
    LINES_TABLE,
    STOP_DETAILS_TABLE,
    RIDERSHIP_TABLE,
];

/// Returns the required tables that are absent from `conn`, in
/// `REQUIRED_TABLES` order.
pub fn missing_tables(conn: &Connection) -> rusqlite::Result<Vec<&'static str>> {
    let mut stmt = conn.prepare(
        "SELECT COUNT(*) FROM sqlite_master
         WHERE type IN ('table', 'view') AND name = ?1 COLLATE NOCASE",
    )?;
    let mut missing = Vec::new();
    for table in REQUIRED_TABLES {
        let count: i64 = stmt.query_row([*table], |row| row.get(0))?;
        if count == 0 {
            missing.push(*table);
        }
    }
    Ok(missing)
}
