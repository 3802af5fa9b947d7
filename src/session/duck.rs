use duckdb::{Connection, params_from_iter};
use log::debug;

use super::{Session, SessionError};
use crate::sql::Dialect;

pub const IN_MEMORY: &str = ":memory:";

/// DuckDB session running in autocommit mode: each statement is its own
/// transaction, so a rejected row never poisons the rows around it.
pub struct DuckDbSession {
    conn: Connection,
}

impl DuckDbSession {
    pub fn open(database: &str) -> Result<Self, SessionError> {
        let conn = if database == IN_MEMORY {
            Connection::open_in_memory()?
        } else {
            Connection::open(database)?
        };
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, SessionError> {
        Self::open(IN_MEMORY)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Session for DuckDbSession {
    fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    fn execute(&mut self, sql: &str, params: &[String]) -> Result<(), SessionError> {
        debug!("{sql}");
        self.conn.execute(sql, params_from_iter(params.iter()))?;
        Ok(())
    }

    fn query_strings(&mut self, sql: &str, params: &[String]) -> Result<Vec<String>, SessionError> {
        debug!("{sql}");
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| row.get::<_, String>(0))?;
        let values = rows.collect::<duckdb::Result<Vec<String>>>()?;
        Ok(values)
    }

    fn commit(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}
