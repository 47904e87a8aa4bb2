use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use tracing::info;

use ridership_model::ModelParseError;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("dataset path does not exist: {}", .0.display())]
    MissingPath(PathBuf),
    #[error("dataset path is not a file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("open dataset {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("dataset is missing table {0}")]
    MissingTable(String),
    #[error("inspect dataset schema: {0}")]
    Schema(#[from] rusqlite::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("sqlite query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("unexpected value in column {column}: {value}")]
    InvalidColumn { column: &'static str, value: String },
    #[error(transparent)]
    Model(#[from] ModelParseError),
}

/// Opens an existing dataset file without write access.
pub fn open_read_only(path: &Path) -> Result<Connection, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::MissingPath(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(DatasetError::NotAFile(path.to_path_buf()));
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|source| DatasetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    info!("opened dataset {} read-only", path.display());
    Ok(conn)
}
