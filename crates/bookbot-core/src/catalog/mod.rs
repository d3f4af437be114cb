//! Catalog data model and the gateway trait the HTTP client implements.

pub mod port;
pub mod types;
