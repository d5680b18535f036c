//! SOQL Query Builder Module
//!
//! Provides a fluent API for building the SOQL queries the exporter issues.
//! Queries are assembled with [`QueryBuilder`] and passed around as [`Query`] values.

pub mod builder;
pub mod query;
pub mod result;

pub use builder::QueryBuilder;
pub use query::Query;
pub use result::QueryResult;
