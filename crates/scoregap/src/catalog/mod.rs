pub mod item;
pub mod loader;
pub mod search;

pub use item::WorkItem;
pub use loader::{
    load_catalog, load_catalog_from_reader, CatalogColumns, IDENTITY_COLUMNS, REQUIRED_COLUMNS,
};
pub use search::{collect_search, search_catalog, write_snapshot, DEFAULT_SEARCH_QUERY};
