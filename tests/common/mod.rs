#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv_sql_loader::config::SourceOptions;
use csv_sql_loader::session::duck::DuckDbSession;
use csv_sql_loader::session::{Session, SessionError};
use csv_sql_loader::sql::{self, Dialect};
use tempfile::{TempDir, tempdir};

/// Scratch CSV folder that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    pub fn options(&self) -> SourceOptions {
        SourceOptions::new(self.path())
    }
}

pub fn memory_session() -> DuckDbSession {
    DuckDbSession::open_in_memory().expect("in-memory duckdb")
}

/// Every row of `sql`, reading `width` nullable text columns.
pub fn fetch_rows(session: &DuckDbSession, sql: &str, width: usize) -> Vec<Vec<Option<String>>> {
    let mut stmt = session.connection().prepare(sql).expect("prepare query");
    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|idx| row.get::<_, Option<String>>(idx))
                .collect::<duckdb::Result<Vec<_>>>()
        })
        .expect("run query");
    rows.collect::<duckdb::Result<Vec<_>>>().expect("read rows")
}

pub fn row_count(session: &DuckDbSession, table: &str) -> i64 {
    session
        .connection()
        .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
            row.get(0)
        })
        .expect("count rows")
}

pub fn text(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// In-process session that records statements instead of running them.
/// Inserts whose bound values contain `reject` fail like a driver error.
pub struct RecordingSession {
    pub tables: Vec<String>,
    pub columns: Vec<String>,
    pub reject: Option<String>,
    pub executed: Vec<(String, Vec<String>)>,
    pub commits: usize,
}

impl RecordingSession {
    pub fn new(tables: &[&str], columns: &[&str]) -> Self {
        Self {
            tables: text(tables),
            columns: text(columns),
            reject: None,
            executed: Vec::new(),
            commits: 0,
        }
    }

    pub fn inserts(&self) -> Vec<&Vec<String>> {
        self.executed
            .iter()
            .filter(|(sql, _)| sql.starts_with("INSERT"))
            .map(|(_, params)| params)
            .collect()
    }
}

impl Session for RecordingSession {
    fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    fn execute(&mut self, sql: &str, params: &[String]) -> Result<(), SessionError> {
        if sql.starts_with("INSERT") {
            if params.len() != self.columns.len() {
                return Err(SessionError::Driver(format!(
                    "expected {} parameters, got {}",
                    self.columns.len(),
                    params.len()
                )));
            }
            if let Some(reject) = &self.reject {
                if params.iter().any(|value| value == reject) {
                    return Err(SessionError::Driver(format!("value '{reject}' rejected")));
                }
            }
        }
        self.executed.push((sql.to_string(), params.to_vec()));
        Ok(())
    }

    fn query_strings(&mut self, sql: &str, _params: &[String]) -> Result<Vec<String>, SessionError> {
        if sql == sql::TABLES_QUERY {
            Ok(self.tables.clone())
        } else if sql == sql::COLUMNS_QUERY {
            Ok(self.columns.clone())
        } else {
            Err(SessionError::Driver(format!("unexpected query: {sql}")))
        }
    }

    fn commit(&mut self) -> Result<(), SessionError> {
        self.commits += 1;
        Ok(())
    }
}
