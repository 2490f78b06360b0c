#![deny(missing_docs)]

//! # DynamoDB Table
//!
//! Fluent request builders and pagination for a single-table DynamoDB design.
//!
//! ## Overview
//!
//! Every entity lives in one table keyed by `pk`/`sk`, with secondary indexes for the
//! alternative access patterns. This library:
//! - Converts between native values and the store's typed attributes
//! - Accumulates expression placeholders so callers never collide with generated ones
//! - Builds Query, Scan, Get, Update and Delete requests step by step
//! - Groups puts and deletes into batches and transactions
//! - Turns continuation keys into opaque pagination tokens
//!
//! ## Quick Example
//!
//! ```no_run
//! use dynamodb_table::{Table, common::key::Keys, config::TableConfig, write::common::Expression};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let table = Table::from_config(&TableConfig::from_env()?).await;
//!
//! // createdAt and updatedAt are maintained alongside the caller's actions
//! table
//!     .update(Keys::new("ACC#1", "PROJ#1"))
//!     .set(
//!         Expression::new("#name = :name")
//!             .names([("#name", "name")])
//!             .values([(":name", "Renamed")]),
//!     )
//!     .condition("attribute_exists(pk)")?
//!     .execute()
//!     .await?;
//!
//! // the newest projects first, twenty at a time
//! let listing = table
//!     .query()
//!     .index("getResourceByCreatedAt")
//!     .key("resourceType", "project")
//!     .limit(20)
//!     .forward(false);
//! let page = table.get_paginated_items(listing, None).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@common`] - Attribute codec, keys, conditions and projections
//! - [`mod@read`] - Query, Scan and Get
//! - [`mod@write`] - Update, Delete, batch edits and transactions
//! - [`mod@pagination`] - Continuation key tokens
//! - [`mod@table`] - The facade tying the builders to one table

/// The store client seam.
pub mod client;

/// Common utilities for keys, conditions, and attribute selection.
pub mod common;

/// Table and client configuration.
pub mod config;

/// Errors raised by builders and requests.
pub mod error;

/// Opaque pagination tokens.
pub mod pagination;

/// Read operations for retrieving data from the table.
///
/// This module provides operations for:
/// - Getting items by primary key, one or a batch at a time
/// - Querying items with key conditions
/// - Scanning the table or an index
pub mod read;

/// The table facade.
pub mod table;

/// Write operations for modifying data in the table.
///
/// This module provides operations for:
/// - Updating items with set, add, remove and delete actions
/// - Deleting items by key
/// - Batch editing and transactions
pub mod write;

pub use error::{Error, Result};
pub use table::Table;
