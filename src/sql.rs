//! Statement text for each supported database dialect.
//!
//! Table and column names come from file names and CSV headers, so every
//! identifier goes through [`quote_identifier`] before it reaches SQL text.
//! Values are always bound as parameters.

use std::fmt;

use itertools::Itertools;
use thiserror::Error;

use crate::columns::TableDescriptor;

pub const TABLES_QUERY: &str =
    "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_TYPE = 'BASE TABLE'";
pub const COLUMNS_QUERY: &str = "SELECT COLUMN_NAME FROM INFORMATION_SCHEMA.COLUMNS \
     WHERE TABLE_NAME = ? ORDER BY ORDINAL_POSITION";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("Identifier cannot be empty")]
    Empty,
    #[error("Identifier '{0}' contains a NUL character")]
    Nul(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    DuckDb,
    SqlServer,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::DuckDb => write!(f, "duckdb"),
            Dialect::SqlServer => write!(f, "sql-server"),
        }
    }
}

impl Dialect {
    /// The widest text type the dialect offers; every column uses it.
    pub fn text_type(self) -> &'static str {
        match self {
            Dialect::DuckDb => "VARCHAR",
            Dialect::SqlServer => "NVARCHAR(MAX)",
        }
    }

    pub fn drop_table(self, table: &str) -> Result<String, IdentifierError> {
        let quoted = quote_identifier(table)?;
        Ok(match self {
            Dialect::DuckDb => format!("DROP TABLE IF EXISTS {quoted}"),
            // OBJECT_ID keeps this working on servers older than 2016.
            Dialect::SqlServer => format!(
                "IF OBJECT_ID(N'{}', N'U') IS NOT NULL DROP TABLE {quoted}",
                quoted.replace('\'', "''")
            ),
        })
    }

    pub fn create_table(self, descriptor: &TableDescriptor) -> Result<String, IdentifierError> {
        let definitions = descriptor
            .columns
            .iter()
            .map(|column| Ok(format!("{} {}", quote_identifier(column)?, self.text_type())))
            .collect::<Result<Vec<_>, IdentifierError>>()?;
        Ok(format!(
            "CREATE TABLE {} ({})",
            quote_identifier(&descriptor.name)?,
            definitions.join(", ")
        ))
    }

    pub fn truncate_table(self, table: &str) -> Result<String, IdentifierError> {
        let quoted = quote_identifier(table)?;
        Ok(match self {
            Dialect::DuckDb => format!("DELETE FROM {quoted}"),
            Dialect::SqlServer => format!("TRUNCATE TABLE {quoted}"),
        })
    }

    pub fn insert_row(self, table: &str, columns: &[String]) -> Result<String, IdentifierError> {
        let quoted = columns
            .iter()
            .map(|column| quote_identifier(column))
            .collect::<Result<Vec<_>, _>>()?;
        let placeholders = std::iter::repeat_n("?", columns.len()).join(", ");
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            quote_identifier(table)?,
            quoted.join(", ")
        ))
    }
}

pub fn quote_identifier(name: &str) -> Result<String, IdentifierError> {
    if name.is_empty() {
        return Err(IdentifierError::Empty);
    }
    if name.contains('\0') {
        return Err(IdentifierError::Nul(name.replace('\0', "\\0")));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}
