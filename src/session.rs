//! The database session both passes run against.
//!
//! A [`Session`] executes parameterized statements, reads single-column
//! catalog results and commits. Backends own the driver connection for the
//! whole run; nothing else touches it.

use anyhow::{Context, Result};
use log::{error, info};
use thiserror::Error;

use crate::config::{Backend, ConnectionConfig};
use crate::sql::{self, Dialect};

pub mod duck;
#[cfg(feature = "mssql")]
pub mod odbc;

/// A failure reported by the database driver.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    DuckDb(#[from] duckdb::Error),
    #[cfg(feature = "mssql")]
    #[error(transparent)]
    Odbc(#[from] odbc_api::Error),
    /// Failures a backend detects itself, such as undecodable catalog text.
    #[error("{0}")]
    Driver(String),
}

pub trait Session {
    fn dialect(&self) -> Dialect;

    fn execute(&mut self, sql: &str, params: &[String]) -> Result<(), SessionError>;

    /// Runs a query and returns the first column of every row as text.
    fn query_strings(&mut self, sql: &str, params: &[String]) -> Result<Vec<String>, SessionError>;

    fn commit(&mut self) -> Result<(), SessionError>;
}

pub fn connect(config: &ConnectionConfig) -> Result<Box<dyn Session>> {
    let session = open_backend(config).inspect_err(|err| {
        error!("Error connecting to the database: {err:#}");
    })?;
    info!(
        "Connected to {} database {}",
        session.dialect(),
        config.describe()
    );
    Ok(session)
}

fn open_backend(config: &ConnectionConfig) -> Result<Box<dyn Session>> {
    match config.backend {
        Backend::DuckDb => {
            let session = duck::DuckDbSession::open(&config.database)
                .with_context(|| format!("Opening DuckDB database '{}'", config.database))?;
            Ok(Box::new(session))
        }
        #[cfg(feature = "mssql")]
        Backend::Mssql => {
            let connection_string = config.odbc_connection_string()?;
            let session = odbc::OdbcSession::connect(&connection_string)
                .with_context(|| format!("Connecting to SQL Server {}", config.describe()))?;
            Ok(Box::new(session))
        }
        #[cfg(not(feature = "mssql"))]
        Backend::Mssql => Err(anyhow::anyhow!(
            "SQL Server support is not compiled in; rebuild with `--features mssql`"
        )),
    }
}

/// Names of every base table visible to the session.
pub fn table_names(session: &mut dyn Session) -> Result<Vec<String>> {
    session
        .query_strings(sql::TABLES_QUERY, &[])
        .context("Reading table names from the schema catalog")
}

/// Column names of `table` in physical order.
pub fn table_columns(session: &mut dyn Session, table: &str) -> Result<Vec<String>> {
    session
        .query_strings(sql::COLUMNS_QUERY, &[table.to_string()])
        .with_context(|| format!("Reading columns of table '{table}' from the schema catalog"))
}
