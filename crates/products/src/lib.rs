//! Products domain module.
//!
//! A tenant's catalogue of offerings (insurance lines, consortia, pension
//! plans). Every new tenant is seeded with [`DEFAULT_CATALOG`].

pub mod catalog;
pub mod product;

pub use catalog::{CatalogEntry, DEFAULT_CATALOG, default_catalog};
pub use product::{NewProduct, Product, ProductFilter, ProductPatch, ProductSummary};
