pub mod catalog;
pub mod dispatch;
pub mod recipes;

pub use catalog::{CatalogError, CatalogSource, ToolCatalog, CATALOG_FILES};
pub use dispatch::{ConsistencyReport, DispatchTable};
pub use recipes::RECIPES;
