//! The facade domain services use to reach the single table.
//!
//! Every builder kind has a plain constructor (`get`, `query`, …) and an `*_with` variant
//! taking an options struct whose fields mirror the builder methods. The convenience methods
//! build, execute and decode in one call.

use crate::{
    client::StoreClient,
    common::{
        attribute::{self, Attribute, Item},
        condition::KeyCondition,
        selection::Projection,
    },
    config::TableConfig,
    error::{Result, UsageError},
    pagination,
    read::{
        common::Paginate,
        get::{Get, MAX_BATCH_GET_KEYS},
        query::Query,
        scan::Scan,
    },
    write::{
        batch_edit::BatchEdit, common::Expression, delete::Delete, transaction::Transaction,
        update::Update,
    },
};

use aws_sdk_dynamodb::{Client, types};
use serde::de::DeserializeOwned;
use std::collections;

/// Options recognized by [`Table::get_with`] and [`Table::get_many_with`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetOptions {
    /// Strongly consistent read.
    pub strong: bool,
    /// Attributes to return.
    pub projection: Option<Projection>,
    /// Name placeholders referenced by a raw projection.
    pub names: collections::HashMap<String, String>,
    /// Consumed capacity reporting.
    pub capacity: Option<types::ReturnConsumedCapacity>,
}

/// Options recognized by [`Table::query_with`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryOptions {
    /// Secondary index to query.
    pub index: Option<String>,
    /// Partition key name and value.
    pub key: Option<(String, Attribute)>,
    /// Range condition on the sort key.
    pub sort_key: Option<KeyCondition>,
    /// Raw filter expression.
    pub filter: Option<String>,
    /// Typed filter conditions, AND-joined.
    pub filter_conditions: Vec<KeyCondition>,
    /// Attributes to return.
    pub projection: Option<Projection>,
    /// Name placeholders.
    pub names: collections::HashMap<String, String>,
    /// Value placeholders.
    pub values: collections::HashMap<String, Attribute>,
    /// Decoded continuation key to resume from.
    pub start: Option<Item>,
    /// Select mode.
    pub select: Option<types::Select>,
    /// Maximum number of items evaluated.
    pub limit: Option<i32>,
    /// Ascending traversal when `true`.
    pub forward: Option<bool>,
    /// Strongly consistent read.
    pub strong: bool,
    /// Consumed capacity reporting.
    pub capacity: Option<types::ReturnConsumedCapacity>,
}

/// Options recognized by [`Table::scan_with`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanOptions {
    /// Secondary index to scan.
    pub index: Option<String>,
    /// Raw filter expression.
    pub filter: Option<String>,
    /// Typed filter conditions, AND-joined.
    pub filter_conditions: Vec<KeyCondition>,
    /// Attributes to return.
    pub projection: Option<Projection>,
    /// Name placeholders.
    pub names: collections::HashMap<String, String>,
    /// Value placeholders.
    pub values: collections::HashMap<String, Attribute>,
    /// Decoded continuation key to resume from.
    pub start: Option<Item>,
    /// Select mode.
    pub select: Option<types::Select>,
    /// Maximum number of items evaluated.
    pub limit: Option<i32>,
    /// Segment scanned by this worker.
    pub segment: Option<i32>,
    /// Number of segments the keyspace is divided into.
    pub total_segments: Option<i32>,
    /// Strongly consistent read.
    pub strong: bool,
    /// Consumed capacity reporting.
    pub capacity: Option<types::ReturnConsumedCapacity>,
}

/// Options recognized by [`Table::update_with`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateOptions {
    /// Attributes to set, one action per attribute.
    pub item: Option<Item>,
    /// `SET` actions.
    pub set: Vec<Expression>,
    /// `ADD` actions.
    pub add: Vec<Expression>,
    /// `REMOVE` actions.
    pub remove: Vec<Expression>,
    /// `DELETE` actions.
    pub delete: Vec<Expression>,
    /// Name placeholders.
    pub names: collections::HashMap<String, String>,
    /// Value placeholders.
    pub values: collections::HashMap<String, Attribute>,
    /// Condition the current item must satisfy.
    pub condition: Option<Expression>,
    /// Image of the item returned.
    pub return_values: Option<types::ReturnValue>,
    /// Skip `createdAt`/`updatedAt` stamping.
    pub disable_timestamps: bool,
    /// Consumed capacity reporting.
    pub capacity: Option<types::ReturnConsumedCapacity>,
    /// Item collection metrics reporting.
    pub metrics: Option<types::ReturnItemCollectionMetrics>,
}

/// Options recognized by [`Table::delete_with`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteOptions {
    /// Condition the current item must satisfy.
    pub condition: Option<Expression>,
    /// Name placeholders.
    pub names: collections::HashMap<String, String>,
    /// Value placeholders.
    pub values: collections::HashMap<String, Attribute>,
    /// `None` or `AllOld`.
    pub return_values: Option<types::ReturnValue>,
    /// Consumed capacity reporting.
    pub capacity: Option<types::ReturnConsumedCapacity>,
    /// Item collection metrics reporting.
    pub metrics: Option<types::ReturnItemCollectionMetrics>,
}

/// Options recognized by [`Table::batch_edit_with`] and [`Table::transaction_with`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteOptions {
    /// Skip `createdAt`/`updatedAt` stamping of put items.
    pub disable_timestamps: bool,
    /// Consumed capacity reporting.
    pub capacity: Option<types::ReturnConsumedCapacity>,
}

/// One page of items with the token resuming after it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaginatedItems {
    /// The page's items.
    pub items: Vec<Item>,
    /// Opaque token for the next page; `None` on the last page.
    pub pagination_token: Option<String>,
}

/// Handle on the single table.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_table::{Table, common::key::Keys};
///
/// # async fn example(
/// #     client: Client,
/// #     token: Option<String>,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let table = Table::new(client, "resources");
/// let project = table.get_item(Keys::entity("PROJ#1")).await?;
/// let query = table
///     .query()
///     .index("getResourceByCreatedAt")
///     .key("resourceType", "project")
///     .limit(20);
/// let page = table.get_paginated_items(query, token.as_deref()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Table<C = Client> {
    client: C,
    table_name: String,
}

impl Table<Client> {
    /// Connect to the table described by `config`.
    pub async fn from_config(config: &TableConfig) -> Self {
        Self::new(config.client().await, config.table_name.clone())
    }
}

impl<C: Clone> Table<C> {
    /// Wrap `client` for the table `table_name`.
    pub fn new(client: C, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Name of the table.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The wrapped client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Look up one item.
    pub fn get(&self, key: impl Into<Item>) -> Get<C> {
        Get::single(self.client.clone(), &self.table_name, key)
    }

    /// Look up one item with `options`.
    pub fn get_with(&self, key: impl Into<Item>, options: GetOptions) -> Get<C> {
        Self::apply_get_options(self.get(key), options)
    }

    /// Look up a batch of at most [`MAX_BATCH_GET_KEYS`] items.
    pub fn get_many<I, K>(&self, keys: I) -> Result<Get<C>>
    where
        I: IntoIterator<Item = K>,
        K: Into<Item>,
    {
        let keys: Vec<Item> = keys.into_iter().map(Into::into).collect();
        if keys.len() > MAX_BATCH_GET_KEYS {
            return Err(UsageError::BatchSizeExceeded {
                max: MAX_BATCH_GET_KEYS,
                actual: keys.len(),
            }
            .into());
        }
        Ok(Get::batch(self.client.clone(), &self.table_name, keys))
    }

    /// Look up a batch of items with `options`.
    pub fn get_many_with<I, K>(&self, keys: I, options: GetOptions) -> Result<Get<C>>
    where
        I: IntoIterator<Item = K>,
        K: Into<Item>,
    {
        Ok(Self::apply_get_options(self.get_many(keys)?, options))
    }

    fn apply_get_options(mut get: Get<C>, options: GetOptions) -> Get<C> {
        if options.strong {
            get = get.strong();
        }
        if let Some(projection) = options.projection {
            get = get.projection(projection);
        }
        if let Some(capacity) = options.capacity {
            get = get.capacity(capacity);
        }
        get.names(options.names)
    }

    /// Query the table or one of its indexes.
    pub fn query(&self) -> Query<C> {
        Query::new(self.client.clone(), &self.table_name)
    }

    /// Query with `options`; usage errors surface as the builder methods would raise them.
    pub fn query_with(&self, options: QueryOptions) -> Result<Query<C>> {
        let mut query = self.query().names(options.names).values(options.values);
        if let Some(index) = options.index {
            query = query.index(index);
        }
        if let Some((name, value)) = options.key {
            query = query.key(name, value);
        }
        if let Some(sort_key) = options.sort_key {
            query = query.sort_key_condition(sort_key)?;
        }
        if let Some(filter) = options.filter {
            query = query.filter(filter);
        }
        for condition in options.filter_conditions {
            query = query.filter_on(condition.name, condition.condition);
        }
        if let Some(projection) = options.projection {
            query = query.projection(projection);
        }
        if let Some(select) = options.select {
            query = query.select(select)?;
        }
        if let Some(limit) = options.limit {
            query = query.limit(limit);
        }
        if let Some(forward) = options.forward {
            query = query.forward(forward);
        }
        if options.strong {
            query = query.strong();
        }
        if let Some(capacity) = options.capacity {
            query = query.capacity(capacity);
        }
        Ok(query.start(options.start))
    }

    /// Scan the table or one of its indexes.
    pub fn scan(&self) -> Scan<C> {
        Scan::new(self.client.clone(), &self.table_name)
    }

    /// Scan with `options`.
    pub fn scan_with(&self, options: ScanOptions) -> Result<Scan<C>> {
        let mut scan = self.scan().names(options.names).values(options.values);
        if let Some(index) = options.index {
            scan = scan.index(index);
        }
        if let Some(filter) = options.filter {
            scan = scan.filter(filter);
        }
        for condition in options.filter_conditions {
            scan = scan.filter_on(condition.name, condition.condition);
        }
        if let Some(projection) = options.projection {
            scan = scan.projection(projection);
        }
        if let Some(select) = options.select {
            scan = scan.select(select)?;
        }
        if let Some(limit) = options.limit {
            scan = scan.limit(limit);
        }
        if let Some(total_segments) = options.total_segments {
            scan = scan.total_segments(total_segments);
        }
        if let Some(segment) = options.segment {
            scan = scan.segment(segment)?;
        }
        if options.strong {
            scan = scan.strong();
        }
        if let Some(capacity) = options.capacity {
            scan = scan.capacity(capacity);
        }
        Ok(scan.start(options.start))
    }

    /// Update one item.
    pub fn update(&self, key: impl Into<Item>) -> Update<C> {
        Update::new(self.client.clone(), &self.table_name, key)
    }

    /// Update one item with `options`.
    pub fn update_with(&self, key: impl Into<Item>, options: UpdateOptions) -> Result<Update<C>> {
        let mut update = self.update(key).names(options.names).values(options.values);
        if let Some(item) = options.item {
            update = update.item(item);
        }
        update = options.set.into_iter().fold(update, Update::set);
        update = options.add.into_iter().fold(update, Update::add);
        update = options.remove.into_iter().fold(update, Update::remove);
        update = options.delete.into_iter().fold(update, Update::delete);
        if let Some(condition) = options.condition {
            update = update.condition(condition)?;
        }
        if let Some(return_values) = options.return_values {
            update = update.return_values(return_values);
        }
        if options.disable_timestamps {
            update = update.disable_timestamps();
        }
        if let Some(capacity) = options.capacity {
            update = update.capacity(capacity);
        }
        if let Some(metrics) = options.metrics {
            update = update.metrics(metrics);
        }
        Ok(update)
    }

    /// Delete one item.
    pub fn delete(&self, key: impl Into<Item>) -> Delete<C> {
        Delete::new(self.client.clone(), &self.table_name, key)
    }

    /// Delete one item with `options`.
    pub fn delete_with(&self, key: impl Into<Item>, options: DeleteOptions) -> Result<Delete<C>> {
        let mut delete = self.delete(key).names(options.names).values(options.values);
        if let Some(condition) = options.condition {
            delete = delete.condition(condition)?;
        }
        if let Some(return_values) = options.return_values {
            delete = delete.return_values(return_values)?;
        }
        if let Some(capacity) = options.capacity {
            delete = delete.capacity(capacity);
        }
        if let Some(metrics) = options.metrics {
            delete = delete.metrics(metrics);
        }
        Ok(delete)
    }

    /// Start a non-atomic batch of puts and deletes.
    pub fn batch_edit(&self) -> BatchEdit<C> {
        BatchEdit::new(self.client.clone(), &self.table_name)
    }

    /// Start a batch edit with `options`.
    pub fn batch_edit_with(&self, options: WriteOptions) -> BatchEdit<C> {
        let mut batch_edit = self.batch_edit();
        if options.disable_timestamps {
            batch_edit = batch_edit.disable_timestamps();
        }
        if let Some(capacity) = options.capacity {
            batch_edit = batch_edit.capacity(capacity);
        }
        batch_edit
    }

    /// Start an all-or-nothing transaction.
    pub fn transaction(&self) -> Transaction<C> {
        Transaction::new(self.client.clone(), &self.table_name)
    }

    /// Start a transaction with `options`.
    pub fn transaction_with(&self, options: WriteOptions) -> Transaction<C> {
        let mut transaction = self.transaction();
        if options.disable_timestamps {
            transaction = transaction.disable_timestamps();
        }
        if let Some(capacity) = options.capacity {
            transaction = transaction.capacity(capacity);
        }
        transaction
    }
}

impl<C: StoreClient + Clone> Table<C> {
    /// Fetch one item, `None` when it does not exist.
    pub async fn get_item(&self, key: impl Into<Item>) -> Result<Option<Item>> {
        Ok(self.get(key).execute().await?.into_item())
    }

    /// Fetch one item and deserialize it into `T`.
    pub async fn get_item_as<T: DeserializeOwned>(
        &self,
        key: impl Into<Item>,
    ) -> Result<Option<T>> {
        self.get_item(key)
            .await?
            .map(attribute::from_item)
            .transpose()
    }

    /// Fetch up to [`MAX_BATCH_GET_KEYS`] items in one call.
    ///
    /// Keys the store leaves unprocessed are dropped; use [`Table::get_many`] to see them.
    pub async fn get_items<I, K>(&self, keys: I) -> Result<Vec<Item>>
    where
        I: IntoIterator<Item = K>,
        K: Into<Item>,
    {
        Ok(self.get_many(keys)?.execute().await?.into_items())
    }

    /// Fetch the page after `pagination_token`, or the first page without one.
    ///
    /// The token must be one returned by an earlier call for the same listing; a token that
    /// does not decode fails with [`crate::Error::InvalidPaginationToken`].
    pub async fn get_paginated_items<P: Paginate>(
        &self,
        listing: P,
        pagination_token: Option<&str>,
    ) -> Result<PaginatedItems> {
        let start = pagination::decode_optional(pagination_token)?;
        let page = listing.resume_from(start).fetch_page().await?;
        let pagination_token = page.pagination_token()?;
        Ok(PaginatedItems {
            items: page.items,
            pagination_token,
        })
    }

    /// Execute `update` returning the whole updated item, deserialized into `T`.
    pub async fn update_execute_and_format<T: DeserializeOwned>(
        &self,
        update: Update<C>,
    ) -> Result<T> {
        let item = update
            .return_values(types::ReturnValue::AllNew)
            .execute()
            .await?
            .unwrap_or_default();
        attribute::from_item(item)
    }

    /// Delete one item, returning it as it was; `None` when it did not exist.
    pub async fn delete_item(&self, key: impl Into<Item>) -> Result<Option<Item>> {
        self.delete(key)
            .return_values(types::ReturnValue::AllOld)?
            .execute()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::mock::{MockStore, Request},
        common::{condition::Condition, key::Keys},
        error::Error,
    };

    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Project {
        pk: String,
        name: String,
    }

    fn project(id: &str, name: &str, created_at: &str) -> Item {
        let mut item: Item = Keys::entity(format!("PROJ#{id}")).into();
        item.insert("resourceType".to_string(), Attribute::from("project"));
        item.insert("name".to_string(), Attribute::from(name));
        item.insert("createdAt".to_string(), Attribute::from(created_at));
        item
    }

    fn table() -> Table<MockStore> {
        let store = MockStore::with_items(vec![
            attribute::encode_item(project("1", "A", "2022-01-01")),
            attribute::encode_item(project("2", "B", "2022-01-02")),
        ])
        .index("getResourceByCreatedAt", "resourceType", "createdAt");
        Table::new(store, "resources")
    }

    #[test]
    fn test_builders_target_the_table() {
        let table = Table::new((), "resources");
        let (_, query) = table.query().key("pk", "A").build().unwrap();
        assert_eq!(query.table_name.as_deref(), Some("resources"));
        let (_, scan) = table.scan().build().unwrap();
        assert_eq!(scan.table_name.as_deref(), Some("resources"));
        let (_, delete) = table.delete(Keys::entity("A")).build().unwrap();
        assert_eq!(delete.table_name.as_deref(), Some("resources"));
    }

    #[test]
    fn test_get_many_limit() {
        let table = Table::new((), "resources");
        let keys = (0..=MAX_BATCH_GET_KEYS).map(|index| Keys::entity(format!("PROJ#{index}")));
        let error = table.get_many(keys).unwrap_err();
        assert!(matches!(
            error,
            Error::Usage(UsageError::BatchSizeExceeded { max: 100, actual: 101 })
        ));
    }

    #[test]
    fn test_query_with_matches_builder() {
        let table = Table::new((), "resources");
        let options = QueryOptions {
            index: Some("getResourceByCreatedAt".to_string()),
            key: Some(("resourceType".to_string(), Attribute::from("project"))),
            sort_key: Some(KeyCondition::new(
                "createdAt",
                Condition::GreaterThanOrEqual("2022-01-01".into()),
            )),
            filter_conditions: vec![KeyCondition::new("status", Condition::Exists)],
            projection: Some(["name"].into()),
            limit: Some(10),
            forward: Some(false),
            ..Default::default()
        };
        let (_, actual) = table.query_with(options).unwrap().build().unwrap();
        let (_, expected) = table
            .query()
            .index("getResourceByCreatedAt")
            .key("resourceType", "project")
            .sort_key("createdAt")
            .gte("2022-01-01")
            .unwrap()
            .filter_on("status", Condition::Exists)
            .projection(["name"])
            .limit(10)
            .forward(false)
            .build()
            .unwrap();
        assert_eq!(actual, expected);
    }

    #[rstest::rstest]
    #[case::contains(Condition::Contains("2022".into()))]
    #[case::not_equal(Condition::NotEqual("2022-01-01".into()))]
    #[case::exists(Condition::Exists)]
    fn test_query_with_rejects_non_key_sort_condition(#[case] condition: Condition) {
        let table = Table::new((), "resources");
        let options = QueryOptions {
            key: Some(("pk".to_string(), Attribute::from("PROJ#1"))),
            sort_key: Some(KeyCondition::new("createdAt", condition)),
            ..Default::default()
        };
        let error = table.query_with(options).unwrap_err();
        assert!(matches!(
            error,
            Error::Usage(UsageError::InvalidSortKeyCondition { name }) if name == "createdAt"
        ));
    }

    #[rstest::rstest]
    #[case::segment_first(
        ScanOptions { segment: Some(1), ..Default::default() },
        UsageError::SegmentBeforeTotalSegments
    )]
    #[case::select_with_projection(
        ScanOptions {
            projection: Some("a".into()),
            select: Some(types::Select::AllAttributes),
            ..Default::default()
        },
        UsageError::SelectWithProjection { select: "ALL_ATTRIBUTES".to_string() }
    )]
    fn test_scan_with_usage_errors(#[case] options: ScanOptions, #[case] expected: UsageError) {
        let table = Table::new((), "resources");
        let error = table.scan_with(options).unwrap_err();
        assert!(matches!(error, Error::Usage(actual) if actual == expected));
    }

    #[test]
    fn test_delete_with_rejects_updated_new() {
        let table = Table::new((), "resources");
        let options = DeleteOptions {
            return_values: Some(types::ReturnValue::UpdatedNew),
            ..Default::default()
        };
        assert!(matches!(
            table.delete_with(Keys::entity("A"), options).unwrap_err(),
            Error::Usage(UsageError::InvalidReturnValues { .. })
        ));
    }

    #[test]
    fn test_update_with_matches_builder() {
        let table = Table::new((), "resources");
        let options = UpdateOptions {
            set: vec![Expression::new("#name = :name")],
            remove: vec!["#draft".into()],
            names: collections::HashMap::from([
                ("#name".to_string(), "name".to_string()),
                ("#draft".to_string(), "draft".to_string()),
            ]),
            values: collections::HashMap::from([(":name".to_string(), Attribute::from("A"))]),
            condition: Some("attribute_exists(pk)".into()),
            ..Default::default()
        };
        let now = "2022-01-01T00:00:00.000Z";
        let (_, actual) = table
            .update_with(Keys::entity("A"), options)
            .unwrap()
            .build(now)
            .unwrap();
        let (_, expected) = table
            .update(Keys::entity("A"))
            .set("#name = :name")
            .remove("#draft")
            .names([("#name", "name"), ("#draft", "draft")])
            .values([(":name", "A")])
            .condition("attribute_exists(pk)")
            .unwrap()
            .build(now)
            .unwrap();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_get_item() {
        let table = table();
        let item = table.get_item(Keys::entity("PROJ#1")).await.unwrap().unwrap();
        assert_eq!(item.get("name"), Some(&Attribute::from("A")));
        let missing = table.get_item(Keys::entity("PROJ#9")).await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_get_item_as() {
        let project: Option<Project> = table().get_item_as(Keys::entity("PROJ#2")).await.unwrap();
        assert_eq!(
            project,
            Some(Project {
                pk: "PROJ#2".to_string(),
                name: "B".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_get_items() {
        let items = table()
            .get_items([Keys::entity("PROJ#1"), Keys::entity("PROJ#2")])
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_get_items_limit_fails_before_sending() {
        let table = table();
        let keys: Vec<_> = (0..=MAX_BATCH_GET_KEYS)
            .map(|index| Keys::entity(format!("PROJ#{index}")))
            .collect();
        assert!(table.get_items(keys).await.is_err());
        assert!(table.client().requests().is_empty());
    }

    #[tokio::test]
    async fn test_paginated_listing() {
        let table = table();
        let listing = || {
            table
                .query()
                .index("getResourceByCreatedAt")
                .key("resourceType", "project")
                .limit(1)
                .forward(true)
        };

        let first = table.get_paginated_items(listing(), None).await.unwrap();
        assert_eq!(first.items, vec![project("1", "A", "2022-01-01")]);
        let token = first.pagination_token.unwrap();

        let second = table
            .get_paginated_items(listing(), Some(&token))
            .await
            .unwrap();
        assert_eq!(second.items, vec![project("2", "B", "2022-01-02")]);
        assert_eq!(second.pagination_token, None);
    }

    #[tokio::test]
    async fn test_paginated_scan() {
        let table = table();
        let page = table.get_paginated_items(table.scan(), None).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.pagination_token, None);
    }

    #[tokio::test]
    async fn test_invalid_token_is_a_client_error() {
        let table = table();
        let error = table
            .get_paginated_items(table.query().key("resourceType", "project"), Some("%%%"))
            .await
            .unwrap_err();
        assert!(error.is_client_error());
        assert!(table.client().requests().is_empty());
    }

    #[tokio::test]
    async fn test_update_execute_and_format() {
        let store = MockStore::default()
            .attributes(attribute::encode_item(project("1", "A", "2022-01-01")));
        let table = Table::new(store, "resources");
        let update = table.update(Keys::entity("PROJ#1")).set(
            Expression::new("#name = :name")
                .names([("#name", "name")])
                .values([(":name", "A")]),
        );
        let project: Project = table.update_execute_and_format(update).await.unwrap();
        assert_eq!(project.name, "A");
        let Request::UpdateItem(input) = &table.client().requests()[0] else {
            panic!("expected an update request");
        };
        assert_eq!(input.return_values, Some(types::ReturnValue::AllNew));
    }

    #[tokio::test]
    async fn test_delete_item() {
        let store = MockStore::default();
        let table = Table::new(store.clone(), "resources");
        assert_eq!(table.delete_item(Keys::entity("PROJ#1")).await.unwrap(), None);
        let Request::DeleteItem(input) = &store.requests()[0] else {
            panic!("expected a delete request");
        };
        assert_eq!(input.return_values, Some(types::ReturnValue::AllOld));
    }

    #[tokio::test]
    async fn test_batch_edit_and_transaction() {
        let store = MockStore::default();
        let table = Table::new(store.clone(), "resources");
        table
            .batch_edit_with(WriteOptions {
                disable_timestamps: true,
                ..Default::default()
            })
            .put(project("3", "C", "2022-01-03"))
            .unwrap()
            .execute()
            .await
            .unwrap();
        table
            .transaction()
            .delete(Keys::entity("PROJ#3"))
            .unwrap()
            .execute()
            .await
            .unwrap();
        let requests = store.requests();
        assert!(matches!(&requests[0], Request::BatchWriteItem(_)));
        assert!(matches!(&requests[1], Request::TransactWriteItems(_)));
    }
}
