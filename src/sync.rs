//! Schema synchronisation: one text-only table per CSV file.
//!
//! Every CSV file in the folder, except those carrying the output prefix,
//! is turned into a [`TableDescriptor`]. Any table of the same name is
//! dropped and a fresh one is created. Each statement is committed on its
//! own, so a failure part-way leaves earlier tables in place.

use anyhow::{Context, Result};
use log::info;

use crate::{
    columns::TableDescriptor,
    config::SourceOptions,
    session::Session,
    source::{self, CsvSource, SourceFile},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: Vec<TableDescriptor>,
    pub skipped_outputs: Vec<String>,
}

/// Reads the marker and header of `file` and derives its table layout.
pub fn describe(file: &SourceFile, options: &SourceOptions) -> Result<TableDescriptor> {
    let source = CsvSource::open(&file.path, options)?;
    Ok(TableDescriptor::from_headers(
        file.table_name.clone(),
        &source.headers,
        source.marker,
    ))
}

/// Descriptors for every schema-eligible file, without touching a database.
pub fn plan(options: &SourceOptions) -> Result<Vec<TableDescriptor>> {
    source::discover(&options.folder)?
        .iter()
        .filter(|file| !file.is_output(&options.output_prefix))
        .map(|file| {
            describe(file, options).with_context(|| format!("Deriving table for {:?}", file.path))
        })
        .collect()
}

pub fn synchronize(session: &mut dyn Session, options: &SourceOptions) -> Result<SyncReport> {
    let mut report = SyncReport::default();
    for file in source::discover(&options.folder)? {
        if file.is_output(&options.output_prefix) {
            report.skipped_outputs.push(file.file_name.clone());
            continue;
        }
        info!("Processing file: {}", file.path.display());
        let descriptor = describe(&file, options)
            .with_context(|| format!("Deriving table for {:?}", file.path))?;
        rebuild_table(session, &descriptor)?;
        info!(
            "Created table '{}' with {} column(s)",
            descriptor.name,
            descriptor.column_count()
        );
        report.created.push(descriptor);
    }
    if !report.skipped_outputs.is_empty() {
        info!(
            "Skipped {} output file(s) with prefix '{}'",
            report.skipped_outputs.len(),
            options.output_prefix
        );
    }
    Ok(report)
}

/// Drops `descriptor.name` if present and creates it anew.
pub fn rebuild_table(session: &mut dyn Session, descriptor: &TableDescriptor) -> Result<()> {
    let dialect = session.dialect();
    let drop = dialect.drop_table(&descriptor.name)?;
    session
        .execute(&drop, &[])
        .with_context(|| format!("Dropping table '{}'", descriptor.name))?;
    session.commit()?;

    let create = dialect.create_table(descriptor)?;
    session
        .execute(&create, &[])
        .with_context(|| format!("Creating table '{}'", descriptor.name))?;
    session.commit()?;
    Ok(())
}
