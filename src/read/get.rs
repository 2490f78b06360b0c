use crate::{
    client::StoreClient,
    common::{
        self,
        attribute::{self, Item},
    },
    error::{Result, UsageError},
};

use aws_sdk_dynamodb::{operation, types};

/// Maximum number of keys a single batch lookup may carry.
pub const MAX_BATCH_GET_KEYS: usize = 100;

#[derive(Clone, Debug, PartialEq)]
enum Mode {
    Single { table_name: String, key: Item },
    Batch { table_name: String, keys: Vec<Item> },
}

impl Mode {
    fn name(&self) -> &'static str {
        match self {
            Self::Single { .. } => "single",
            Self::Batch { .. } => "batch",
        }
    }
}

/// Result of a lookup, shaped by the mode the lookup was built in.
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup {
    /// The item found by a single key lookup, if any.
    Item(Option<Item>),
    /// The items found by a batch lookup.
    Items {
        /// Items found, in no particular order.
        items: Vec<Item>,
        /// Keys the store did not get to; resubmit them in a new lookup.
        unprocessed_keys: Vec<Item>,
    },
}

impl Lookup {
    /// The single item, or `None` for a miss or a batch result.
    pub fn into_item(self) -> Option<Item> {
        match self {
            Self::Item(item) => item,
            Self::Items { .. } => None,
        }
    }

    /// The found items; a single lookup yields zero or one item.
    pub fn into_items(self) -> Vec<Item> {
        match self {
            Self::Item(item) => item.into_iter().collect(),
            Self::Items { items, .. } => items,
        }
    }
}

/// Lookup by primary key, of one item or of a batch of items.
///
/// The mode is fixed by the constructor; mode specific methods called in the other mode fail
/// with [`UsageError::LookupMode`].
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_table::{common::key::Keys, read::get::Get};
///
/// # async fn example(client: Client) -> Result<(), Box<dyn std::error::Error>> {
/// let item = Get::single(client, "resources", Keys::entity("PROJ#1"))
///     .strong()
///     .projection(["name"])
///     .execute()
///     .await?
///     .into_item();
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Get<C> {
    client: C,
    consistent_read: Option<bool>,
    expressions: common::Accumulator,
    mode: Mode,
    return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
}

impl<C> Get<C> {
    /// Look up the item identified by `key`.
    pub fn single(client: C, table_name: impl Into<String>, key: impl Into<Item>) -> Self {
        Self::with_mode(
            client,
            Mode::Single {
                table_name: table_name.into(),
                key: key.into(),
            },
        )
    }

    /// Look up every item identified by `keys`.
    pub fn batch<I, K>(client: C, table_name: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Item>,
    {
        Self::with_mode(
            client,
            Mode::Batch {
                table_name: table_name.into(),
                keys: keys.into_iter().map(Into::into).collect(),
            },
        )
    }

    fn with_mode(client: C, mode: Mode) -> Self {
        Self {
            client,
            consistent_read: None,
            expressions: common::Accumulator::default(),
            mode,
            return_consumed_capacity: None,
        }
    }

    crate::expression_methods!(names, projection);

    /// Read from `table_name` instead; single mode only.
    pub fn table(mut self, name: impl Into<String>) -> Result<Self> {
        match &mut self.mode {
            Mode::Single { table_name, .. } => *table_name = name.into(),
            mode => return Err(Self::wrong_mode("table", mode)),
        }
        Ok(self)
    }

    /// Replace the key to look up; single mode only.
    pub fn key(mut self, new_key: impl Into<Item>) -> Result<Self> {
        match &mut self.mode {
            Mode::Single { key, .. } => *key = new_key.into(),
            mode => return Err(Self::wrong_mode("key", mode)),
        }
        Ok(self)
    }

    /// Add keys to look up; batch mode only.
    pub fn keys<I, K>(mut self, new_keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
        K: Into<Item>,
    {
        match &mut self.mode {
            Mode::Batch { keys, .. } => keys.extend(new_keys.into_iter().map(Into::into)),
            mode => return Err(Self::wrong_mode("keys", mode)),
        }
        Ok(self)
    }

    /// Request strongly consistent reads.
    pub fn strong(mut self) -> Self {
        self.consistent_read = Some(true);
        self
    }

    /// Level of consumed capacity reported back.
    pub fn capacity(mut self, capacity: types::ReturnConsumedCapacity) -> Self {
        self.return_consumed_capacity = Some(capacity);
        self
    }

    /// Number of keys the lookup carries.
    pub fn len(&self) -> usize {
        match &self.mode {
            Mode::Single { .. } => 1,
            Mode::Batch { keys, .. } => keys.len(),
        }
    }

    /// Whether a batch lookup carries no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn wrong_mode(method: &'static str, mode: &Mode) -> crate::error::Error {
        UsageError::LookupMode {
            method,
            mode: mode.name(),
        }
        .into()
    }

    fn build_single(
        table_name: String,
        key: Item,
        consistent_read: Option<bool>,
        expressions: common::Accumulator,
        return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    ) -> Result<operation::get_item::GetItemInput> {
        let accumulated = expressions.finish();
        let input = operation::get_item::GetItemInput::builder()
            .table_name(table_name)
            .set_key(Some(attribute::encode_item(key)))
            .set_consistent_read(consistent_read)
            .set_projection_expression(accumulated.projection_expression)
            .set_expression_attribute_names(accumulated.expression_attribute_names)
            .set_return_consumed_capacity(return_consumed_capacity)
            .build()?;
        Ok(input)
    }

    fn build_batch(
        table_name: String,
        keys: Vec<Item>,
        consistent_read: Option<bool>,
        expressions: common::Accumulator,
        return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    ) -> Result<operation::batch_get_item::BatchGetItemInput> {
        let accumulated = expressions.finish();
        let keys_and_attributes = types::KeysAndAttributes::builder()
            .set_keys(Some(keys.into_iter().map(attribute::encode_item).collect()))
            .set_consistent_read(consistent_read)
            .set_projection_expression(accumulated.projection_expression)
            .set_expression_attribute_names(accumulated.expression_attribute_names)
            .build()?;
        let input = operation::batch_get_item::BatchGetItemInput::builder()
            .request_items(table_name, keys_and_attributes)
            .set_return_consumed_capacity(return_consumed_capacity)
            .build()?;
        Ok(input)
    }
}

impl<C: StoreClient> Get<C> {
    /// Execute the lookup.
    ///
    /// A batch lookup without keys returns an empty result without contacting the store.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_table.get",
            skip_all,
            fields(mode = self.mode.name(), keys = self.len()),
            err
        )
    )]
    pub async fn execute(self) -> Result<Lookup> {
        match self.mode {
            Mode::Single { table_name, key } => {
                let input = Self::build_single(
                    table_name,
                    key,
                    self.consistent_read,
                    self.expressions,
                    self.return_consumed_capacity,
                )?;
                let output = self.client.send_get_item(input).await?;
                let item = output.item.map(attribute::decode_item).transpose()?;
                Ok(Lookup::Item(item))
            }
            Mode::Batch { keys, .. } if keys.is_empty() => Ok(Lookup::Items {
                items: Vec::new(),
                unprocessed_keys: Vec::new(),
            }),
            Mode::Batch { table_name, keys } => {
                let input = Self::build_batch(
                    table_name.clone(),
                    keys,
                    self.consistent_read,
                    self.expressions,
                    self.return_consumed_capacity,
                )?;
                let mut output = self.client.send_batch_get_item(input).await?;
                let items = output
                    .responses
                    .as_mut()
                    .and_then(|responses| responses.remove(&table_name))
                    .unwrap_or_default()
                    .into_iter()
                    .map(attribute::decode_item)
                    .collect::<Result<Vec<_>>>()?;
                let unprocessed_keys = output
                    .unprocessed_keys
                    .as_mut()
                    .and_then(|unprocessed| unprocessed.remove(&table_name))
                    .map(|keys_and_attributes| keys_and_attributes.keys)
                    .unwrap_or_default()
                    .into_iter()
                    .map(attribute::decode_item)
                    .collect::<Result<Vec<_>>>()?;
                #[cfg(feature = "tracing")]
                if !unprocessed_keys.is_empty() {
                    tracing::warn!(
                        table = %table_name,
                        unprocessed = unprocessed_keys.len(),
                        "batch lookup left keys unprocessed"
                    );
                }
                Ok(Lookup::Items {
                    items,
                    unprocessed_keys,
                })
            }
        }
    }
}
