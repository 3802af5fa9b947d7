//! Bulk loading of CSV rows into existing tables.
//!
//! A file is loaded only when a base table named after it already exists.
//! Per file the sequence is: truncate and commit, check the CSV width
//! against the table, insert every row as text, commit. Fields bind to the
//! table's columns by position; header names only decide the column count.
//!
//! A row the driver rejects is logged and skipped. Any other failure
//! (I/O, width mismatch, catalog or DDL errors) ends the pass.

use std::collections::HashSet;

use anyhow::{Context, Result};
use log::{info, warn};
use thiserror::Error;

use crate::{
    config::SourceOptions,
    session::{self, Session},
    source::{self, CsvSource, SourceFile},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Column count mismatch: CSV has {csv_columns} columns, but SQL table '{table}' has {table_columns} columns."
)]
pub struct ColumnCountMismatch {
    pub table: String,
    pub csv_columns: usize,
    pub table_columns: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRow {
    pub index: usize,
    pub line: u64,
    pub error: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileLoad {
    pub table: String,
    pub inserted: usize,
    pub failed: Vec<FailedRow>,
}

impl FileLoad {
    pub fn attempted(&self) -> usize {
        self.inserted + self.failed.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub files: Vec<FileLoad>,
    pub skipped: Vec<String>,
}

impl LoadReport {
    pub fn inserted(&self) -> usize {
        self.files.iter().map(|file| file.inserted).sum()
    }

    pub fn failed(&self) -> usize {
        self.files.iter().map(|file| file.failed.len()).sum()
    }
}

pub fn load_folder(session: &mut dyn Session, options: &SourceOptions) -> Result<LoadReport> {
    let tables = session::table_names(session)?
        .into_iter()
        .collect::<HashSet<_>>();
    let mut report = LoadReport::default();
    for file in source::discover(&options.folder)? {
        if !tables.contains(&file.table_name) {
            report.skipped.push(file.file_name.clone());
            continue;
        }
        info!("Processing file: {}", file.path.display());
        let loaded = load_file(session, &file, options)
            .with_context(|| format!("Loading {:?} into '{}'", file.path, file.table_name))?;
        report.files.push(loaded);
    }
    info!(
        "Loaded {} row(s) into {} table(s); {} row(s) rejected",
        report.inserted(),
        report.files.len(),
        report.failed()
    );
    Ok(report)
}

pub fn load_file(
    session: &mut dyn Session,
    file: &SourceFile,
    options: &SourceOptions,
) -> Result<FileLoad> {
    let dialect = session.dialect();
    let table = file.table_name.as_str();

    let truncate = dialect.truncate_table(table)?;
    session
        .execute(&truncate, &[])
        .with_context(|| format!("Truncating table '{table}'"))?;
    session.commit()?;

    let mut source = CsvSource::open(&file.path, options)?;
    let columns = session::table_columns(session, table)?;
    if source.column_count() != columns.len() {
        return Err(ColumnCountMismatch {
            table: table.to_string(),
            csv_columns: source.column_count(),
            table_columns: columns.len(),
        }
        .into());
    }

    let insert = dialect.insert_row(table, &columns)?;
    let mut loaded = FileLoad {
        table: table.to_string(),
        ..FileLoad::default()
    };
    while let Some(row) = source.next_row()? {
        match session.execute(&insert, &row.values) {
            Ok(()) => loaded.inserted += 1,
            Err(err) => {
                warn!("Error inserting row {} (line {}): {err}", row.index, row.line);
                warn!("Row data: {:?}", row.values);
                loaded.failed.push(FailedRow {
                    index: row.index,
                    line: row.line,
                    error: err.to_string(),
                    values: row.values,
                });
            }
        }
    }
    session
        .commit()
        .with_context(|| format!("Committing rows for table '{table}'"))?;
    info!(
        "Inserted {} of {} row(s) into '{table}'",
        loaded.inserted,
        loaded.attempted()
    );
    Ok(loaded)
}
