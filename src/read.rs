//! Read operations for retrieving data from the table.
//!
//! Query and Scan share their configuration methods and page decoding through [`common`];
//! Get covers single and batch lookups by primary key.

/// Common utilities and types for read operations.
pub mod common;

/// Lookup of one item or a batch of items by primary key.
pub mod get;

/// Query operation for retrieving items with key conditions.
pub mod query;

/// Scan operation for reading a whole table or index.
pub mod scan;
