use std::sync::OnceLock;

use log::debug;
use odbc_api::{Connection, ConnectionOptions, Cursor, Environment, IntoParameter, U16String};

use super::{Session, SessionError};
use crate::sql::Dialect;

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

fn environment() -> Result<&'static Environment, SessionError> {
    if let Some(env) = ENVIRONMENT.get() {
        return Ok(env);
    }
    let env = Environment::new()?;
    Ok(ENVIRONMENT.get_or_init(|| env))
}

/// Parameters go to the driver as UTF-16 so `NVARCHAR` columns keep
/// non-ASCII text regardless of the client code page.
fn to_wide(value: &str) -> U16String {
    U16String::from_str(value)
}

fn from_wide(buffer: &[u16]) -> Result<String, SessionError> {
    String::from_utf16(buffer)
        .map_err(|err| SessionError::Driver(format!("Invalid UTF-16 text from driver: {err}")))
}

/// SQL Server over ODBC. Autocommit is switched off so each table's rows
/// land in one transaction that [`Session::commit`] closes.
pub struct OdbcSession {
    conn: Connection<'static>,
}

impl OdbcSession {
    pub fn connect(connection_string: &str) -> Result<Self, SessionError> {
        let conn = environment()?
            .connect_with_connection_string(connection_string, ConnectionOptions::default())?;
        conn.set_autocommit(false)?;
        Ok(Self { conn })
    }
}

impl Session for OdbcSession {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn execute(&mut self, sql: &str, params: &[String]) -> Result<(), SessionError> {
        debug!("{sql}");
        let bound = params
            .iter()
            .map(|value| to_wide(value).into_parameter())
            .collect::<Vec<_>>();
        self.conn.execute(sql, bound.as_slice(), None)?;
        Ok(())
    }

    fn query_strings(&mut self, sql: &str, params: &[String]) -> Result<Vec<String>, SessionError> {
        debug!("{sql}");
        let bound = params
            .iter()
            .map(|value| to_wide(value).into_parameter())
            .collect::<Vec<_>>();
        let mut values = Vec::new();
        if let Some(mut cursor) = self.conn.execute(sql, bound.as_slice(), None)? {
            let mut buffer = Vec::new();
            while let Some(mut row) = cursor.next_row()? {
                buffer.clear();
                row.get_wide_text(1, &mut buffer)?;
                values.push(from_wide(&buffer)?);
            }
        }
        Ok(values)
    }

    fn commit(&mut self) -> Result<(), SessionError> {
        self.conn.commit()?;
        Ok(())
    }
}
