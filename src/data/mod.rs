pub mod catalog;
pub mod source;

pub use catalog::{parse_catalog, sort_by_distance, Catalog, CatalogRecord};
pub use source::{CatalogSource, HttpCatalogSource, StaticCatalogSource};
