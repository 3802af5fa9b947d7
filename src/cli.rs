use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Backend;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Rebuild SQL tables from a folder of CSV files and load their rows",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Recreate a table per CSV file, then load every file into its table
    Import(RunArgs),
    /// Drop and recreate a text-only table for each CSV file
    Sync(RunArgs),
    /// Truncate and reload tables that match a CSV file name
    Load(RunArgs),
    /// Show the table each CSV file would produce, without a database
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// YAML profile supplying defaults for any option below
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub connection: ConnectionArgs,
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// YAML profile supplying defaults for any option below
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// Database backend (duckdb or mssql)
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,
    /// SQL Server instance name (mssql backend)
    #[arg(short = 's', long)]
    pub server: Option<String>,
    /// Database name, or the database file for duckdb (`:memory:` allowed)
    #[arg(short = 'd', long)]
    pub database: Option<String>,
    /// ODBC driver name (defaults to "ODBC Driver 17 for SQL Server")
    #[arg(long)]
    pub driver: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Folder containing the CSV files
    #[arg(short = 'f', long)]
    pub folder: Option<PathBuf>,
    /// File name prefix of generated outputs that never get a table (defaults to Out_)
    #[arg(long = "output-prefix")]
    pub output_prefix: Option<String>,
    /// Token marking an encoding line above the header (defaults to utf-8)
    #[arg(long)]
    pub marker: Option<String>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
