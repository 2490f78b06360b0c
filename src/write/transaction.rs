use crate::{
    client::StoreClient,
    common::{
        self,
        attribute::{self, Item},
    },
    error::{Result, UsageError},
    write::common::{Expression, stamp, timestamp},
};

use aws_sdk_dynamodb::{operation, types};

/// Maximum number of entries a single transaction may carry.
pub const MAX_TRANSACTION_ITEMS: usize = 100;

#[derive(Clone, Debug, PartialEq)]
enum Entry {
    Put {
        item: Item,
        condition: Option<Expression>,
    },
    Delete {
        key: Item,
        condition: Option<Expression>,
    },
}

/// Condition expression and placeholders of one transaction entry.
fn entry_condition(condition: Option<Expression>) -> (Option<String>, common::AccumulatedInput) {
    let mut expressions = common::Accumulator::default();
    let expression = condition.map(|condition| condition.absorb_into(&mut expressions));
    (expression, expressions.finish())
}

/// Puts and deletes applied all-or-nothing.
///
/// If any entry's condition fails, the store rejects the whole transaction and no item is
/// changed; the failure surfaces as a store error.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_table::{
///     common::{attribute::Item, key::Keys},
///     write::{common::Expression, transaction::Transaction},
/// };
///
/// # async fn example(client: Client) -> Result<(), Box<dyn std::error::Error>> {
/// let project: Item = Keys::new("ACC#1", "PROJ#1").into();
/// Transaction::new(client, "resources")
///     .put_if(project, "attribute_not_exists(pk)")?
///     .delete_if(
///         Keys::entity("DRAFT#1"),
///         Expression::new("#owner = :owner")
///             .names([("#owner", "owner")])
///             .values([(":owner", "ACC#1")]),
///     )?
///     .client_request_token("create-PROJ#1")
///     .execute()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Transaction<C> {
    client: C,
    client_request_token: Option<String>,
    entries: Vec<Entry>,
    return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    table_name: String,
    timestamps: bool,
}

impl<C> Transaction<C> {
    /// Start an empty transaction against `table_name`.
    pub fn new(client: C, table_name: impl Into<String>) -> Self {
        Self {
            client,
            client_request_token: None,
            entries: Vec::new(),
            return_consumed_capacity: None,
            table_name: table_name.into(),
            timestamps: true,
        }
    }

    /// Put `item`, stamped with `createdAt`/`updatedAt` where absent.
    pub fn put(self, item: impl Into<Item>) -> Result<Self> {
        self.push(Entry::Put {
            item: item.into(),
            condition: None,
        })
    }

    /// Put `item` only if `condition` holds for the item it replaces.
    pub fn put_if(self, item: impl Into<Item>, condition: impl Into<Expression>) -> Result<Self> {
        self.push(Entry::Put {
            item: item.into(),
            condition: Some(condition.into()),
        })
    }

    /// Delete the item identified by `key`.
    pub fn delete(self, key: impl Into<Item>) -> Result<Self> {
        self.push(Entry::Delete {
            key: key.into(),
            condition: None,
        })
    }

    /// Delete the item identified by `key` only if `condition` holds for it.
    pub fn delete_if(self, key: impl Into<Item>, condition: impl Into<Expression>) -> Result<Self> {
        self.push(Entry::Delete {
            key: key.into(),
            condition: Some(condition.into()),
        })
    }

    /// Idempotency token; retries carrying the same token are applied once.
    pub fn client_request_token(mut self, token: impl Into<String>) -> Self {
        self.client_request_token = Some(token.into());
        self
    }

    /// Do not stamp put items.
    pub fn disable_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    /// Level of consumed capacity reported back.
    pub fn capacity(mut self, capacity: types::ReturnConsumedCapacity) -> Self {
        self.return_consumed_capacity = Some(capacity);
        self
    }

    /// Number of entries in the transaction.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the transaction has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(mut self, entry: Entry) -> Result<Self> {
        if self.entries.len() >= MAX_TRANSACTION_ITEMS {
            return Err(UsageError::BatchSizeExceeded {
                max: MAX_TRANSACTION_ITEMS,
                actual: self.entries.len() + 1,
            }
            .into());
        }
        self.entries.push(entry);
        Ok(self)
    }

    fn transact_item(&self, entry: Entry, now: &str) -> Result<types::TransactWriteItem> {
        let builder = match entry {
            Entry::Put {
                mut item,
                condition,
            } => {
                if self.timestamps {
                    stamp(&mut item, now);
                }
                let (condition_expression, accumulated) = entry_condition(condition);
                let put = types::Put::builder()
                    .table_name(&self.table_name)
                    .set_item(Some(attribute::encode_item(item)))
                    .set_condition_expression(condition_expression)
                    .set_expression_attribute_names(accumulated.expression_attribute_names)
                    .set_expression_attribute_values(accumulated.expression_attribute_values)
                    .build()?;
                types::TransactWriteItem::builder().put(put)
            }
            Entry::Delete { key, condition } => {
                let (condition_expression, accumulated) = entry_condition(condition);
                let delete = types::Delete::builder()
                    .table_name(&self.table_name)
                    .set_key(Some(attribute::encode_item(key)))
                    .set_condition_expression(condition_expression)
                    .set_expression_attribute_names(accumulated.expression_attribute_names)
                    .set_expression_attribute_values(accumulated.expression_attribute_values)
                    .build()?;
                types::TransactWriteItem::builder().delete(delete)
            }
        };
        Ok(builder.build())
    }

    pub(crate) fn build(
        mut self,
        now: &str,
    ) -> Result<(C, operation::transact_write_items::TransactWriteItemsInput)> {
        if self.entries.is_empty() {
            return Err(UsageError::EmptyBatch {
                operation: "transaction",
            }
            .into());
        }
        let entries = std::mem::take(&mut self.entries);
        let transact_items = entries
            .into_iter()
            .map(|entry| self.transact_item(entry, now))
            .collect::<Result<Vec<_>>>()?;
        let input = operation::transact_write_items::TransactWriteItemsInput::builder()
            .set_transact_items(Some(transact_items))
            .set_client_request_token(self.client_request_token)
            .set_return_consumed_capacity(self.return_consumed_capacity)
            .build()?;
        Ok((self.client, input))
    }
}

impl<C: StoreClient> Transaction<C> {
    /// Commit the transaction.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_table.transaction",
            skip_all,
            fields(table = %self.table_name, entries = self.entries.len()),
            err
        )
    )]
    pub async fn execute(self) -> Result<Vec<types::ConsumedCapacity>> {
        let (client, input) = self.build(&timestamp())?;
        let output = client.send_transact_write_items(input).await?;
        Ok(output.consumed_capacity.unwrap_or_default())
    }
}
