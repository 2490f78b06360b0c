use crate::{
    client::StoreClient,
    common::attribute::{self, Item},
    error::{Error, Result, UsageError},
    read::common::aggregate_capacity,
    write::common::{stamp, timestamp},
};

use aws_sdk_dynamodb::{operation, types};

/// Maximum number of entries a single batch edit may carry.
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

/// A single entry within a batch edit.
#[derive(Clone, Debug, PartialEq)]
pub enum BatchEntry {
    /// Create or replace an item.
    Put(Item),
    /// Remove the item with this primary key.
    Delete(Item),
}

impl TryFrom<BatchEntry> for types::WriteRequest {
    type Error = Error;

    fn try_from(entry: BatchEntry) -> Result<Self> {
        let builder = match entry {
            BatchEntry::Put(item) => {
                let put_request = types::PutRequest::builder()
                    .set_item(Some(attribute::encode_item(item)))
                    .build()?;
                Self::builder().set_put_request(Some(put_request))
            }
            BatchEntry::Delete(key) => {
                let delete_request = types::DeleteRequest::builder()
                    .set_key(Some(attribute::encode_item(key)))
                    .build()?;
                Self::builder().set_delete_request(Some(delete_request))
            }
        };
        Ok(builder.build())
    }
}

impl TryFrom<types::WriteRequest> for BatchEntry {
    type Error = Error;

    fn try_from(request: types::WriteRequest) -> Result<Self> {
        match (request.put_request, request.delete_request) {
            (Some(put), _) => Ok(Self::Put(attribute::decode_item(put.item)?)),
            (None, Some(delete)) => Ok(Self::Delete(attribute::decode_item(delete.key)?)),
            (None, None) => Err(Error::Attribute(
                "write request holds neither a put nor a delete".to_string(),
            )),
        }
    }
}

/// Outcome of a batch edit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchEditOutput {
    /// Entries the store did not apply; resubmit them in a new batch.
    pub unprocessed: Vec<BatchEntry>,
    /// Capacity consumed, when requested.
    pub consumed_capacity: Option<types::ConsumedCapacity>,
}

/// Unordered puts and deletes against one table, sent as a single non-atomic batch.
///
/// Partial failure is not an error: whatever the store did not apply is returned in
/// [`BatchEditOutput::unprocessed`] and is not retried here.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_table::{common::{attribute::Item, key::Keys}, write::batch_edit::BatchEdit};
///
/// # async fn example(client: Client) -> Result<(), Box<dyn std::error::Error>> {
/// let mut item: Item = Keys::entity("PROJ#2").into();
/// item.insert("name".to_string(), "B".into());
/// let output = BatchEdit::new(client, "resources")
///     .put(item)?
///     .delete(Keys::entity("PROJ#1"))?
///     .execute()
///     .await?;
/// if !output.unprocessed.is_empty() {
///     // resubmit later
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct BatchEdit<C> {
    client: C,
    entries: Vec<BatchEntry>,
    return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    return_item_collection_metrics: Option<types::ReturnItemCollectionMetrics>,
    table_name: String,
    timestamps: bool,
}

impl<C> BatchEdit<C> {
    /// Start an empty batch against `table_name`.
    pub fn new(client: C, table_name: impl Into<String>) -> Self {
        Self {
            client,
            entries: Vec::new(),
            return_consumed_capacity: None,
            return_item_collection_metrics: None,
            table_name: table_name.into(),
            timestamps: true,
        }
    }

    /// Put `item`, stamped with `createdAt`/`updatedAt` where absent.
    pub fn put(self, item: impl Into<Item>) -> Result<Self> {
        self.entries([BatchEntry::Put(item.into())])
    }

    /// Delete the item identified by `key`.
    pub fn delete(self, key: impl Into<Item>) -> Result<Self> {
        self.entries([BatchEntry::Delete(key.into())])
    }

    /// Add entries, e.g. the unprocessed entries of an earlier batch.
    pub fn entries(mut self, entries: impl IntoIterator<Item = BatchEntry>) -> Result<Self> {
        self.entries.extend(entries);
        if self.entries.len() > MAX_BATCH_WRITE_ITEMS {
            return Err(UsageError::BatchSizeExceeded {
                max: MAX_BATCH_WRITE_ITEMS,
                actual: self.entries.len(),
            }
            .into());
        }
        Ok(self)
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

    /// Whether item collection metrics are reported back.
    pub fn metrics(mut self, metrics: types::ReturnItemCollectionMetrics) -> Self {
        self.return_item_collection_metrics = Some(metrics);
        self
    }

    /// Number of entries in the batch.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn build(
        self,
        now: &str,
    ) -> Result<(C, operation::batch_write_item::BatchWriteItemInput)> {
        if self.entries.is_empty() {
            return Err(UsageError::EmptyBatch {
                operation: "batch edit",
            }
            .into());
        }
        let timestamps = self.timestamps;
        let requests = self
            .entries
            .into_iter()
            .map(|entry| match entry {
                BatchEntry::Put(mut item) if timestamps => {
                    stamp(&mut item, now);
                    BatchEntry::Put(item)
                }
                entry => entry,
            })
            .map(types::WriteRequest::try_from)
            .collect::<Result<Vec<_>>>()?;
        let input = operation::batch_write_item::BatchWriteItemInput::builder()
            .request_items(self.table_name, requests)
            .set_return_consumed_capacity(self.return_consumed_capacity)
            .set_return_item_collection_metrics(self.return_item_collection_metrics)
            .build()?;
        Ok((self.client, input))
    }
}

impl<C: StoreClient> BatchEdit<C> {
    /// Send the batch.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_table.batch_edit",
            skip_all,
            fields(table = %self.table_name, entries = self.entries.len()),
            err
        )
    )]
    pub async fn execute(self) -> Result<BatchEditOutput> {
        let (client, input) = self.build(&timestamp())?;
        let output = client.send_batch_write_item(input).await?;
        let unprocessed = output
            .unprocessed_items
            .unwrap_or_default()
            .into_values()
            .flatten()
            .map(BatchEntry::try_from)
            .collect::<Result<Vec<_>>>()?;
        #[cfg(feature = "tracing")]
        if !unprocessed.is_empty() {
            tracing::warn!(
                unprocessed = unprocessed.len(),
                "batch edit left entries unprocessed"
            );
        }
        let consumed_capacity = output
            .consumed_capacity
            .filter(|capacities| !capacities.is_empty())
            .map(aggregate_capacity);
        Ok(BatchEditOutput {
            unprocessed,
            consumed_capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::mock::{MockStore, Request},
        common::{attribute::Attribute, key::Keys},
        write::common::{CREATED_AT, UPDATED_AT},
    };

    use std::collections;

    const NOW: &str = "2022-01-01T00:00:00.000Z";

    fn project(id: &str) -> Item {
        let mut item: Item = Keys::entity(format!("PROJ#{id}")).into();
        item.insert("name".to_string(), Attribute::from(id));
        item
    }

    fn put_request(item: Item) -> types::WriteRequest {
        BatchEntry::Put(item).try_into().unwrap()
    }

    fn delete_request(key: Keys) -> types::WriteRequest {
        BatchEntry::Delete(key.into()).try_into().unwrap()
    }

    #[test]
    fn test_build() {
        let (_, actual) = BatchEdit::new((), "t")
            .put(project("1"))
            .unwrap()
            .delete(Keys::entity("PROJ#2"))
            .unwrap()
            .build(NOW)
            .unwrap();
        let mut stamped = project("1");
        stamped.insert(CREATED_AT.to_string(), Attribute::from(NOW));
        stamped.insert(UPDATED_AT.to_string(), Attribute::from(NOW));
        let expected = operation::batch_write_item::BatchWriteItemInput::builder()
            .request_items(
                "t",
                vec![
                    put_request(stamped),
                    delete_request(Keys::entity("PROJ#2")),
                ],
            )
            .build()
            .unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_existing_timestamps_are_kept() {
        let mut item = project("1");
        item.insert(CREATED_AT.to_string(), Attribute::from("then"));
        let (_, input) = BatchEdit::new((), "t")
            .put(item.clone())
            .unwrap()
            .build(NOW)
            .unwrap();
        item.insert(UPDATED_AT.to_string(), Attribute::from(NOW));
        assert_eq!(input.request_items.unwrap()["t"], vec![put_request(item)]);
    }

    #[test]
    fn test_disabled_timestamps() {
        let (_, input) = BatchEdit::new((), "t")
            .disable_timestamps()
            .put(project("1"))
            .unwrap()
            .build(NOW)
            .unwrap();
        assert_eq!(
            input.request_items.unwrap()["t"],
            vec![put_request(project("1"))]
        );
    }

    #[test]
    fn test_batch_size() {
        let full = (0..MAX_BATCH_WRITE_ITEMS)
            .map(|index| BatchEntry::Delete(Keys::entity(format!("PROJ#{index}")).into()));
        let batch = BatchEdit::new((), "t").entries(full).unwrap();
        assert_eq!(batch.len(), MAX_BATCH_WRITE_ITEMS);
        let error = batch.put(project("x")).unwrap_err();
        assert!(matches!(
            error,
            Error::Usage(UsageError::BatchSizeExceeded { max: 25, actual: 26 })
        ));
    }

    #[test]
    fn test_empty_batch() {
        let error = BatchEdit::new((), "t").build(NOW).unwrap_err();
        assert!(matches!(error, Error::Usage(UsageError::EmptyBatch { .. })));
    }

    #[tokio::test]
    async fn test_unprocessed_entries_are_returned() {
        let store = MockStore::default().unprocessed(collections::HashMap::from([(
            "t".to_string(),
            vec![delete_request(Keys::entity("PROJ#2"))],
        )]));
        let output = BatchEdit::new(store.clone(), "t")
            .put(project("1"))
            .unwrap()
            .delete(Keys::entity("PROJ#2"))
            .unwrap()
            .execute()
            .await
            .unwrap();
        assert_eq!(
            output.unprocessed,
            vec![BatchEntry::Delete(Keys::entity("PROJ#2").into())]
        );
        assert!(matches!(&store.requests()[0], Request::BatchWriteItem(_)));

        // resubmitting the unprocessed entries is left to the caller
        let output = BatchEdit::new(store.clone(), "t")
            .entries(output.unprocessed)
            .unwrap()
            .execute()
            .await
            .unwrap();
        assert!(output.unprocessed.is_empty());
        assert_eq!(store.requests().len(), 2);
    }
}
