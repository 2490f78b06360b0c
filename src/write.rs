//! Write operations for modifying data in the table.
//!
//! Put items are stamped with `createdAt`/`updatedAt` unless timestamps are disabled; updates
//! maintain the same two attributes through their update expression.

/// Non-atomic batches of puts and deletes.
pub mod batch_edit;

/// Common utilities and types for write operations.
pub mod common;

/// Delete item operation for removing items from tables.
pub mod delete;

/// All-or-nothing transactions.
pub mod transaction;

/// Update item operation for modifying existing items.
pub mod update;
