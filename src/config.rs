//! Run configuration: where the CSV files live and which database to use.
//!
//! Values come from command-line arguments, optionally layered over a YAML
//! profile so repeated imports do not have to restate the connection. An
//! argument given on the command line always wins over the profile.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use encoding_rs::Encoding;
use serde::Deserialize;

use crate::{
    cli::{ConnectionArgs, SourceArgs, parse_delimiter},
    io_utils,
};

pub const DEFAULT_ODBC_DRIVER: &str = "ODBC Driver 17 for SQL Server";
pub const DEFAULT_OUTPUT_PREFIX: &str = "Out_";
pub const DEFAULT_MARKER: &str = "utf-8";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[value(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    #[default]
    #[value(name = "duckdb")]
    #[serde(rename = "duckdb")]
    DuckDb,
    Mssql,
}

/// Optional YAML profile. Every field may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportProfile {
    pub backend: Option<Backend>,
    pub server: Option<String>,
    pub database: Option<String>,
    pub driver: Option<String>,
    pub folder: Option<PathBuf>,
    pub output_prefix: Option<String>,
    pub marker: Option<String>,
    pub delimiter: Option<String>,
    pub input_encoding: Option<String>,
}

impl ImportProfile {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening profile {path:?}"))?;
        let profile: ImportProfile = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing profile {path:?}"))?;
        Ok(profile)
    }

    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub backend: Backend,
    pub server: Option<String>,
    pub database: String,
    pub driver: String,
}

impl ConnectionConfig {
    pub fn resolve(args: &ConnectionArgs, profile: &ImportProfile) -> Result<Self> {
        let backend = args.backend.or(profile.backend).unwrap_or_default();
        let database = args
            .database
            .clone()
            .or_else(|| profile.database.clone())
            .ok_or_else(|| anyhow!("A database must be provided with --database or a profile"))?;
        let server = args.server.clone().or_else(|| profile.server.clone());
        if backend == Backend::Mssql && server.is_none() {
            return Err(anyhow!("The mssql backend requires --server"));
        }
        let driver = args
            .driver
            .clone()
            .or_else(|| profile.driver.clone())
            .unwrap_or_else(|| DEFAULT_ODBC_DRIVER.to_string());
        Ok(Self {
            backend,
            server,
            database,
            driver,
        })
    }

    /// Trusted-connection ODBC string for SQL Server.
    pub fn odbc_connection_string(&self) -> Result<String> {
        let server = self
            .server
            .as_deref()
            .ok_or_else(|| anyhow!("No server configured for an ODBC connection"))?;
        Ok(format!(
            "DRIVER={{{}}};SERVER={};DATABASE={};Trusted_Connection=yes;",
            self.driver, server, self.database
        ))
    }

    pub fn describe(&self) -> String {
        match &self.server {
            Some(server) if self.backend == Backend::Mssql => {
                format!("'{}' on '{}'", self.database, server)
            }
            _ => format!("'{}'", self.database),
        }
    }
}

/// Everything the two passes need to know about the input folder.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    pub folder: PathBuf,
    pub output_prefix: String,
    pub marker: String,
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

impl SourceOptions {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            marker: DEFAULT_MARKER.to_string(),
            delimiter: io_utils::DEFAULT_CSV_DELIMITER,
            encoding: encoding_rs::UTF_8,
        }
    }

    pub fn resolve(args: &SourceArgs, profile: &ImportProfile) -> Result<Self> {
        let folder = args
            .folder
            .clone()
            .or_else(|| profile.folder.clone())
            .ok_or_else(|| anyhow!("A CSV folder must be provided with --folder or a profile"))?;
        if !folder.is_dir() {
            return Err(anyhow!("CSV folder {folder:?} is not a directory"));
        }
        let mut options = Self::new(folder);
        if let Some(prefix) = args.output_prefix.clone().or_else(|| profile.output_prefix.clone()) {
            options.output_prefix = prefix;
        }
        if let Some(marker) = args.marker.clone().or_else(|| profile.marker.clone()) {
            if marker.trim().is_empty() {
                return Err(anyhow!("The encoding marker cannot be empty"));
            }
            options.marker = marker;
        }
        if let Some(delimiter) = args.delimiter {
            options.delimiter = delimiter;
        } else if let Some(raw) = &profile.delimiter {
            options.delimiter = parse_delimiter(raw).map_err(|err| anyhow!(err))?;
        }
        let encoding = args
            .input_encoding
            .as_deref()
            .or(profile.input_encoding.as_deref());
        options.encoding = io_utils::resolve_encoding(encoding)?;
        Ok(options)
    }
}
