//! Catalogs built from the scoring service's beatmap search.
//!
//! Every page is fetched before the run starts and frozen into a CSV
//! snapshot next to the reports. A resumed run reads the snapshot back, so
//! checkpoint indices keep pointing at the same beatmaps even if the search
//! results have moved since.

use std::collections::HashSet;
use std::path::Path;

use tracing::{info, warn};

use crate::error::SearchError;
use crate::fetcher::BeatmapSearch;
use crate::pipeline::RateLimiter;
use crate::storage;

use super::item::WorkItem;
use super::loader::{load_catalog, CatalogColumns};

/// Ranked standard beatmaps of moderate difficulty and length.
pub const DEFAULT_SEARCH_QUERY: &str = "star>3 star<8 length>100 ranked<2025";

/// Follows the search cursor until the last page or `max_pages`.
///
/// A beatmap seen on an earlier page is not added again.
pub fn collect_search<S: BeatmapSearch>(
    search: &mut S,
    query: &str,
    max_pages: Option<usize>,
    limiter: &mut RateLimiter,
) -> Result<Vec<WorkItem>, SearchError> {
    let mut items = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0;

    loop {
        limiter.wait();
        let page = search.search(query, cursor.as_deref())?;
        pages += 1;

        for item in page.items {
            if seen.insert(item.id) {
                items.push(item);
            }
        }

        match page.cursor {
            Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                warn!(pages, "Search cursor did not advance, stopping");
                break;
            }
            Some(next) => cursor = Some(next),
            None => break,
        }
        if max_pages.is_some_and(|max| pages >= max) {
            info!(pages, "Search page limit reached");
            break;
        }
    }

    info!(query, pages, items = items.len(), "Beatmap search walked");
    Ok(items)
}

/// Writes `items` with the same header the CSV loader expects.
pub fn write_snapshot(path: &Path, items: &[WorkItem]) -> Result<(), SearchError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for item in items {
        writer.serialize(item)?;
    }
    let data = writer
        .into_inner()
        .map_err(|e| SearchError::Encode(csv::Error::from(e.into_error())))?;
    storage::write_atomic(path, &data)?;
    Ok(())
}

/// Reuses the snapshot when `reuse` is set and it exists, otherwise searches
/// again and replaces it.
pub fn search_catalog<S: BeatmapSearch>(
    search: &mut S,
    query: &str,
    max_pages: Option<usize>,
    snapshot: &Path,
    reuse: bool,
    limiter: &mut RateLimiter,
) -> Result<Vec<WorkItem>, SearchError> {
    if reuse && snapshot.exists() {
        info!(path = %snapshot.display(), "Reusing search snapshot");
        return Ok(load_catalog(snapshot, CatalogColumns::Full)?);
    }

    let items = collect_search(search, query, max_pages, limiter)?;
    write_snapshot(snapshot, &items)?;
    Ok(items)
}
