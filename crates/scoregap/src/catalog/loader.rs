use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::error::SourceFormatError;

use super::item::WorkItem;

/// Every column of a catalog row. Extra columns are ignored.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "beatmap_id",
    "title",
    "diffname",
    "stars",
    "approved_date",
    "bpm",
    "ar",
    "od",
    "cs",
    "hp",
    "length",
    "circles",
    "sliders",
    "spinners",
];

/// Enough to identify a beatmap in a report line.
pub const IDENTITY_COLUMNS: &[&str] = &["beatmap_id", "title", "diffname", "approved_date"];

/// Which columns a run needs from the catalog header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogColumns {
    /// Filtering and report lines read every attribute.
    Full,
    /// Missing attribute columns read as zero.
    Identity,
}

impl CatalogColumns {
    pub fn required(self) -> &'static [&'static str] {
        match self {
            CatalogColumns::Full => REQUIRED_COLUMNS,
            CatalogColumns::Identity => IDENTITY_COLUMNS,
        }
    }
}

/// Loads the whole catalog in source row order.
///
/// Row order is the basis of checkpoint indices, so it is never altered.
pub fn load_catalog<P: AsRef<Path>>(
    path: P,
    columns: CatalogColumns,
) -> Result<Vec<WorkItem>, SourceFormatError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| SourceFormatError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;

    let items = load_catalog_from_reader(file, columns)?;
    info!(path = %path.display(), items = items.len(), "Catalog loaded");
    Ok(items)
}

pub fn load_catalog_from_reader<R: Read>(
    reader: R,
    columns: CatalogColumns,
) -> Result<Vec<WorkItem>, SourceFormatError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().map_err(SourceFormatError::Header)?.clone();
    for column in columns.required() {
        if !headers.iter().any(|h| h == *column) {
            return Err(SourceFormatError::MissingColumn(column));
        }
    }

    let mut items = Vec::new();
    for result in reader.deserialize::<WorkItem>() {
        let item = result.map_err(|e| SourceFormatError::InvalidRow {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        items.push(item);
    }

    debug!("Parsed {} catalog rows", items.len());
    Ok(items)
}
