//! CSV source discovery and header location.
//!
//! Some exports put an encoding marker line (for example `UTF-8`) above the
//! real header. The first physical line decides the layout:
//!
//! ```text
//! ExpectMarkerOrHeader --marker--> ExpectHeader --header--> ExpectData
//! ExpectMarkerOrHeader --header----------------------------> ExpectData
//! ```
//!
//! A line is a marker when it contains the marker token, compared
//! case-insensitively. Everything after the header is data.

use std::{
    fs::{self, File},
    io::{BufRead, BufReader, Cursor, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::Encoding;
use log::{debug, warn};

use crate::{config::SourceOptions, io_utils};

pub const CSV_SUFFIX: &str = ".csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: String,
    pub table_name: String,
}

impl SourceFile {
    /// Returns `None` unless `file_name` ends with the (case-sensitive) CSV suffix.
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        let table_name = file_name.strip_suffix(CSV_SUFFIX)?.to_string();
        Some(Self {
            path,
            file_name,
            table_name,
        })
    }

    pub fn is_output(&self, prefix: &str) -> bool {
        !prefix.is_empty() && self.file_name.starts_with(prefix)
    }
}

/// Lists the CSV files directly inside `folder`, ordered by file name.
pub fn discover(folder: &Path) -> Result<Vec<SourceFile>> {
    let entries =
        fs::read_dir(folder).with_context(|| format!("Listing CSV folder {folder:?}"))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Reading entry in {folder:?}"))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if entry.file_name().to_str().is_none() {
            warn!("Skipping {path:?}: file name is not valid UTF-8");
            continue;
        }
        if let Some(source) = SourceFile::from_path(path) {
            files.push(source);
        }
    }
    files.sort_by(|left, right| left.file_name.cmp(&right.file_name));
    debug!("Discovered {} CSV file(s) in {folder:?}", files.len());
    Ok(files)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderScan {
    ExpectMarkerOrHeader,
    ExpectHeader,
    ExpectData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    Marker,
    Header,
    Data,
}

impl HeaderScan {
    pub fn advance(self, line: &str, marker: &str) -> (HeaderScan, LineRole) {
        match self {
            HeaderScan::ExpectMarkerOrHeader if is_marker_line(line, marker) => {
                (HeaderScan::ExpectHeader, LineRole::Marker)
            }
            HeaderScan::ExpectMarkerOrHeader | HeaderScan::ExpectHeader => {
                (HeaderScan::ExpectData, LineRole::Header)
            }
            HeaderScan::ExpectData => (HeaderScan::ExpectData, LineRole::Data),
        }
    }
}

pub fn is_marker_line(line: &str, marker: &str) -> bool {
    line.to_lowercase().contains(&marker.to_lowercase())
}

/// One data row. `index` counts data rows from zero; `line` is the physical
/// line in the file (1-based, counting any marker line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    pub index: usize,
    pub line: u64,
    pub values: Vec<String>,
}

/// An open CSV file positioned after its header.
pub struct CsvSource {
    pub marker: Option<String>,
    pub headers: Vec<String>,
    reader: csv::Reader<Box<dyn Read>>,
    encoding: &'static Encoding,
    record: csv::ByteRecord,
    line_offset: u64,
    next_index: usize,
}

impl CsvSource {
    pub fn open(path: &Path, options: &SourceOptions) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening CSV file {path:?}"))?;
        let mut buffered = BufReader::new(file);
        let mut first = Vec::new();
        buffered
            .read_until(b'\n', &mut first)
            .with_context(|| format!("Reading first line of {path:?}"))?;
        if first.is_empty() {
            return Err(anyhow!("CSV file {path:?} is empty; expected a header row"));
        }
        let first = io_utils::strip_bom(&first).to_vec();
        let first_text = io_utils::decode_bytes(&first, options.encoding)
            .with_context(|| format!("Decoding first line of {path:?}"))?;

        let (_, role) = HeaderScan::ExpectMarkerOrHeader.advance(&first_text, &options.marker);
        let (marker, stream, line_offset): (Option<String>, Box<dyn Read>, u64) = match role {
            LineRole::Marker => {
                let marker = first_text.trim_end_matches(['\r', '\n']).to_string();
                debug!("{path:?} starts with marker line '{marker}'");
                (Some(marker), Box::new(buffered), 1)
            }
            LineRole::Header | LineRole::Data => {
                (None, Box::new(Cursor::new(first).chain(buffered)), 0)
            }
        };

        let mut reader = io_utils::open_csv_reader(stream, options.delimiter);
        let header_record = reader
            .byte_headers()
            .with_context(|| format!("Reading header row of {path:?}"))?
            .clone();
        if header_record.is_empty() {
            return Err(anyhow!("CSV file {path:?} has no header row after its marker line"));
        }
        let headers = io_utils::decode_record(&header_record, options.encoding)
            .with_context(|| format!("Decoding header row of {path:?}"))?;

        Ok(Self {
            marker,
            headers,
            reader,
            encoding: options.encoding,
            record: csv::ByteRecord::new(),
            line_offset,
            next_index: 0,
        })
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Reads the next data row. Missing trailing fields are filled with empty
    /// strings; surplus fields are kept so the database can reject the row.
    pub fn next_row(&mut self) -> Result<Option<SourceRow>> {
        let more = self
            .reader
            .read_byte_record(&mut self.record)
            .with_context(|| format!("Reading data row {}", self.next_index))?;
        if !more {
            return Ok(None);
        }
        let mut values = io_utils::decode_record(&self.record, self.encoding)
            .with_context(|| format!("Decoding data row {}", self.next_index))?;
        if values.len() < self.headers.len() {
            values.resize(self.headers.len(), String::new());
        }
        let line = self
            .record
            .position()
            .map(|pos| pos.line() + self.line_offset)
            .unwrap_or_default();
        let row = SourceRow {
            index: self.next_index,
            line,
            values,
        };
        self.next_index += 1;
        Ok(Some(row))
    }
}
