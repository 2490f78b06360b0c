use crate::{
    client::StoreClient,
    common::{
        self,
        attribute::{Attribute, Item},
        condition::{Condition, KeyCondition, LogicalOperator},
    },
    error::{Result, UsageError},
    read::common::{MultipleReadArgs, Page, Paginate},
};

use async_trait::async_trait;
use aws_sdk_dynamodb::operation;

/// Query operation.
///
/// A partition key equality is mandatory; at most one range condition may be placed on the
/// sort key declared with [`Query::sort_key`].
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_table::read::query::Query;
///
/// # async fn example(client: Client) -> Result<(), Box<dyn std::error::Error>> {
/// let page = Query::new(client, "resources")
///     .key("pk", "ACC#1")
///     .sort_key("sk")
///     .begins("PROJ#")?
///     .projection(["name", "status"])
///     .limit(20)
///     .execute()
///     .await?;
/// let token = page.pagination_token()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Query<C> {
    client: C,
    expressions: common::Accumulator,
    partition_key: Option<(String, Attribute)>,
    read: MultipleReadArgs,
    scan_index_forward: Option<bool>,
    sort_key: Option<String>,
    sort_key_condition: Option<KeyCondition>,
}

impl<C> Query<C> {
    /// Start a query against `table_name`.
    pub fn new(client: C, table_name: impl Into<String>) -> Self {
        Self {
            client,
            expressions: common::Accumulator::default(),
            partition_key: None,
            read: MultipleReadArgs::new(table_name),
            scan_index_forward: None,
            sort_key: None,
            sort_key_condition: None,
        }
    }

    crate::expression_methods!(names, values, projection);
    crate::multiple_read_methods!();

    /// Set the partition key equality condition, rendered as `#name = :name`.
    ///
    /// Characters other than ASCII letters and digits become `_` in the placeholders, which
    /// are suffixed with `_<n>` when the body is already bound in this request.
    pub fn key(mut self, name: impl Into<String>, value: impl Into<Attribute>) -> Self {
        self.partition_key = Some((name.into(), value.into()));
        self
    }

    /// Declare the sort key the range condition applies to.
    pub fn sort_key(mut self, name: impl Into<String>) -> Self {
        self.sort_key = Some(name.into());
        self
    }

    /// Sort key equals `value`.
    pub fn eq(self, value: impl Into<Attribute>) -> Result<Self> {
        self.range("eq", Condition::Equals(value.into()))
    }

    /// Sort key is less than `value`.
    pub fn lt(self, value: impl Into<Attribute>) -> Result<Self> {
        self.range("lt", Condition::LessThan(value.into()))
    }

    /// Sort key is less than or equal to `value`.
    pub fn lte(self, value: impl Into<Attribute>) -> Result<Self> {
        self.range("lte", Condition::LessThanOrEqual(value.into()))
    }

    /// Sort key is greater than `value`.
    pub fn gt(self, value: impl Into<Attribute>) -> Result<Self> {
        self.range("gt", Condition::GreaterThan(value.into()))
    }

    /// Sort key is greater than or equal to `value`.
    pub fn gte(self, value: impl Into<Attribute>) -> Result<Self> {
        self.range("gte", Condition::GreaterThanOrEqual(value.into()))
    }

    /// Sort key is between `start` and `end`, inclusive.
    pub fn between(self, start: impl Into<Attribute>, end: impl Into<Attribute>) -> Result<Self> {
        self.range("between", Condition::Between(start.into(), end.into()))
    }

    /// Sort key begins with `prefix`.
    pub fn begins(self, prefix: impl Into<String>) -> Result<Self> {
        self.range("begins", Condition::BeginsWith(prefix.into()))
    }

    /// Apply a typed sort key condition.
    ///
    /// Conditions the store rejects in a key condition (`contains`, `IN`, `<>`, existence
    /// checks) fail with [`UsageError::InvalidSortKeyCondition`].
    pub fn sort_key_condition(self, key_condition: KeyCondition) -> Result<Self> {
        self.sort_key(key_condition.name)
            .range("sort_key_condition", key_condition.condition)
    }

    /// Traverse the index ascending (`true`) or descending (`false`).
    pub fn forward(mut self, forward: bool) -> Self {
        self.scan_index_forward = Some(forward);
        self
    }

    fn range(mut self, method: &'static str, condition: Condition) -> Result<Self> {
        let Some(name) = self.sort_key.clone() else {
            return Err(UsageError::SortKeyNotDeclared { method }.into());
        };
        if self.sort_key_condition.is_some() {
            return Err(UsageError::MultipleSortKeyConditions.into());
        }
        if !condition.is_key_condition() {
            return Err(UsageError::InvalidSortKeyCondition { name }.into());
        }
        self.sort_key_condition = Some(KeyCondition::new(name, condition));
        Ok(self)
    }

    pub(crate) fn build(self) -> Result<(C, operation::query::QueryInput)> {
        let mut expressions = self.expressions;
        let (name, value) = self.partition_key.ok_or(UsageError::MissingPartitionKey)?;
        let partition_key = KeyCondition::new(name, Condition::Equals(value));
        let mut key_condition_expression = Some(partition_key.render_in(&mut expressions, ""));
        if let Some(sort_key_condition) = self.sort_key_condition {
            let expression = sort_key_condition.render_in(&mut expressions, "");
            common::join_expression(
                &mut key_condition_expression,
                &LogicalOperator::And,
                expression,
            );
        }
        let multiple_read_operation = self.read.finish(expressions)?;
        let builder = operation::query::QueryInput::builder()
            .set_key_condition_expression(key_condition_expression)
            .set_scan_index_forward(self.scan_index_forward);
        let input =
            crate::apply_multiple_read_operation!(builder, multiple_read_operation).build()?;
        Ok((self.client, input))
    }
}

impl<C: StoreClient> Query<C> {
    /// Execute the query and decode one page of results.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_table.query",
            skip_all,
            fields(table = %self.read.table_name, index = ?self.read.index_name),
            err
        )
    )]
    pub async fn execute(self) -> Result<Page> {
        let (client, input) = self.build()?;
        let output = client.send_query(input).await?;
        Page::decode(
            output.items,
            output.last_evaluated_key,
            output.count,
            output.scanned_count,
            output.consumed_capacity,
        )
    }

    /// Execute the query, following continuation keys until every page is read.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_table.query_all",
            skip_all,
            fields(table = %self.read.table_name, index = ?self.read.index_name),
            err
        )
    )]
    pub async fn execute_all(self) -> Result<Page> {
        let (client, mut input) = self.build()?;
        let mut pages = Vec::new();
        loop {
            let output = client.send_query(input.clone()).await?;
            let page = Page::decode(
                output.items,
                output.last_evaluated_key,
                output.count,
                output.scanned_count,
                output.consumed_capacity,
            )?;
            let next = page.raw_last_evaluated_key.clone();
            pages.push(page);
            match next {
                Some(key) => input.exclusive_start_key = Some(key),
                None => break,
            }
        }
        Ok(Page::concat(pages))
    }
}

#[async_trait]
impl<C: StoreClient> Paginate for Query<C> {
    fn resume_from(self, key: Option<Item>) -> Self {
        self.start(key)
    }

    async fn fetch_page(self) -> Result<Page> {
        self.execute().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::mock::{MockStore, Request},
        common::attribute,
        error::Error,
        pagination,
    };

    use aws_sdk_dynamodb::types;
    use rstest::rstest;
    use std::collections;

    fn wire(value: &str) -> types::AttributeValue {
        types::AttributeValue::S(value.to_string())
    }

    fn project(
        id: &str,
        name: &str,
        created_at: &str,
    ) -> collections::HashMap<String, types::AttributeValue> {
        attribute::encode_item(Item::from([
            ("pk".to_string(), Attribute::from(format!("PROJ#{id}"))),
            ("sk".to_string(), Attribute::from(format!("PROJ#{id}"))),
            ("resourceType".to_string(), Attribute::from("project")),
            ("name".to_string(), Attribute::from(name)),
            ("createdAt".to_string(), Attribute::from(created_at)),
        ]))
    }

    fn store() -> MockStore {
        MockStore::with_items(vec![
            project("2", "B", "2022-01-02"),
            project("1", "A", "2022-01-01"),
        ])
        .index("getResourceByCreatedAt", "resourceType", "createdAt")
    }

    #[rstest]
    #[case::key_only(
        Query::new((), "t").key("k", "v"),
        operation::query::QueryInput::builder()
            .table_name("t")
            .key_condition_expression("#k = :k")
            .expression_attribute_names("#k", "k")
            .expression_attribute_values(":k", wire("v"))
            .build()
            .unwrap()
    )]
    #[case::begins(
        Query::new((), "t").key("pk", "ACC#1").sort_key("sk").begins("PROJ#").unwrap(),
        operation::query::QueryInput::builder()
            .table_name("t")
            .key_condition_expression("#pk = :pk AND begins_with(#sk, :sk)")
            .expression_attribute_names("#pk", "pk")
            .expression_attribute_names("#sk", "sk")
            .expression_attribute_values(":pk", wire("ACC#1"))
            .expression_attribute_values(":sk", wire("PROJ#"))
            .build()
            .unwrap()
    )]
    #[case::between(
        Query::new((), "t")
            .index("getResourceByCreatedAt")
            .key("resourceType", "project")
            .sort_key("createdAt")
            .between("2022-01-01", "2022-12-31")
            .unwrap()
            .forward(false),
        operation::query::QueryInput::builder()
            .table_name("t")
            .index_name("getResourceByCreatedAt")
            .key_condition_expression(concat!(
                "#resourceType = :resourceType AND ",
                "#createdAt BETWEEN :createdAt_start AND :createdAt_end"
            ))
            .expression_attribute_names("#resourceType", "resourceType")
            .expression_attribute_names("#createdAt", "createdAt")
            .expression_attribute_values(":resourceType", wire("project"))
            .expression_attribute_values(":createdAt_start", wire("2022-01-01"))
            .expression_attribute_values(":createdAt_end", wire("2022-12-31"))
            .scan_index_forward(false)
            .build()
            .unwrap()
    )]
    #[case::full(
        Query::new((), "t")
            .key("pk", "ACC#1")
            .filter("#status = :status")
            .names([("#status", "status")])
            .values([(":status", "active")])
            .projection(["name"])
            .select(types::Select::SpecificAttributes)
            .unwrap()
            .limit(10)
            .strong()
            .capacity(types::ReturnConsumedCapacity::Total)
            .start(Some(Item::from([("pk".to_string(), Attribute::from("ACC#1"))]))),
        operation::query::QueryInput::builder()
            .table_name("t")
            .key_condition_expression("#pk = :pk")
            .filter_expression("#status = :status")
            .projection_expression("#name")
            .expression_attribute_names("#pk", "pk")
            .expression_attribute_names("#status", "status")
            .expression_attribute_names("#name", "name")
            .expression_attribute_values(":pk", wire("ACC#1"))
            .expression_attribute_values(":status", wire("active"))
            .select(types::Select::SpecificAttributes)
            .limit(10)
            .consistent_read(true)
            .return_consumed_capacity(types::ReturnConsumedCapacity::Total)
            .exclusive_start_key("pk", wire("ACC#1"))
            .build()
            .unwrap()
    )]
    #[case::filter_on(
        Query::new((), "t")
            .key("pk", "ACC#1")
            .filter_on("status", Condition::NotEqual("archived".into()))
            .filter_on("name", Condition::Exists),
        operation::query::QueryInput::builder()
            .table_name("t")
            .key_condition_expression("#pk = :pk")
            .filter_expression("#status <> :filter0_status AND attribute_exists(#name)")
            .expression_attribute_names("#pk", "pk")
            .expression_attribute_names("#status", "status")
            .expression_attribute_names("#name", "name")
            .expression_attribute_values(":pk", wire("ACC#1"))
            .expression_attribute_values(":filter0_status", wire("archived"))
            .build()
            .unwrap()
    )]
    #[case::sanitized_names(
        Query::new((), "t")
            .key("cost-center", "CC#1")
            .sort_key("cost_center")
            .eq("x")
            .unwrap(),
        operation::query::QueryInput::builder()
            .table_name("t")
            .key_condition_expression(concat!(
                "#cost_center = :cost_center AND ",
                "#cost_center_1 = :cost_center_1"
            ))
            .expression_attribute_names("#cost_center", "cost-center")
            .expression_attribute_names("#cost_center_1", "cost_center")
            .expression_attribute_values(":cost_center", wire("CC#1"))
            .expression_attribute_values(":cost_center_1", wire("x"))
            .build()
            .unwrap()
    )]
    #[case::caller_value_kept(
        Query::new((), "t")
            .key("pk", "ACC#1")
            .filter("#owner = :pk")
            .names([("#owner", "owner")])
            .values([(":pk", "ACC#2")]),
        operation::query::QueryInput::builder()
            .table_name("t")
            .key_condition_expression("#pk_1 = :pk_1")
            .filter_expression("#owner = :pk")
            .expression_attribute_names("#pk_1", "pk")
            .expression_attribute_names("#owner", "owner")
            .expression_attribute_values(":pk_1", wire("ACC#1"))
            .expression_attribute_values(":pk", wire("ACC#2"))
            .build()
            .unwrap()
    )]
    fn test_query(#[case] query: Query<()>, #[case] expected: operation::query::QueryInput) {
        let (_, actual) = query.build().unwrap();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::eq(Query::new((), "t").eq("x"), "eq")]
    #[case::lt(Query::new((), "t").lt("x"), "lt")]
    #[case::lte(Query::new((), "t").lte("x"), "lte")]
    #[case::gt(Query::new((), "t").gt("x"), "gt")]
    #[case::gte(Query::new((), "t").gte("x"), "gte")]
    #[case::between(Query::new((), "t").between("x", "y"), "between")]
    #[case::begins(Query::new((), "t").begins("x"), "begins")]
    fn test_range_without_sort_key(#[case] result: Result<Query<()>>, #[case] method: &str) {
        let error = result.unwrap_err();
        assert!(matches!(
            error,
            Error::Usage(UsageError::SortKeyNotDeclared { method: actual }) if actual == method
        ));
    }

    #[rstest]
    #[case::eq_then_lt(Query::new((), "t").sort_key("sk").eq("a").unwrap().lt("b"))]
    #[case::begins_then_between(
        Query::new((), "t").sort_key("sk").begins("a").unwrap().between("a", "b")
    )]
    #[case::redeclared(
        Query::new((), "t").sort_key("sk").gte("a").unwrap().sort_key("sk").lte("b")
    )]
    fn test_two_range_conditions(#[case] result: Result<Query<()>>) {
        assert!(matches!(
            result.unwrap_err(),
            Error::Usage(UsageError::MultipleSortKeyConditions)
        ));
    }

    #[rstest]
    #[case::contains(Condition::Contains("x".into()))]
    #[case::not_equal(Condition::NotEqual("x".into()))]
    #[case::in_list(Condition::In(vec!["x".into(), "y".into()]))]
    #[case::exists(Condition::Exists)]
    fn test_non_key_sort_key_condition(#[case] condition: Condition) {
        let error = Query::new((), "t")
            .key("pk", "a")
            .sort_key_condition(KeyCondition::new("sk", condition))
            .unwrap_err();
        assert!(matches!(
            error,
            Error::Usage(UsageError::InvalidSortKeyCondition { name }) if name == "sk"
        ));
    }

    #[test]
    fn test_typed_sort_key_condition() {
        let (_, expected) = Query::new((), "t")
            .key("pk", "a")
            .sort_key("sk")
            .lt("b")
            .unwrap()
            .build()
            .unwrap();
        let (_, actual) = Query::new((), "t")
            .key("pk", "a")
            .sort_key_condition(KeyCondition::new("sk", Condition::LessThan("b".into())))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_select_rejected_with_projection() {
        let error = Query::new((), "t")
            .projection("a")
            .select(types::Select::Count)
            .unwrap_err();
        assert!(matches!(
            error,
            Error::Usage(UsageError::SelectWithProjection { .. })
        ));
    }

    #[test]
    fn test_projection_after_select_rejected_at_build() {
        let error = Query::new((), "t")
            .key("pk", "a")
            .select(types::Select::AllAttributes)
            .unwrap()
            .projection(["a"])
            .build()
            .unwrap_err();
        assert!(matches!(
            error,
            Error::Usage(UsageError::SelectWithProjection { .. })
        ));
    }

    #[test]
    fn test_missing_partition_key() {
        let error = Query::new((), "t").build().unwrap_err();
        assert!(matches!(error, Error::Usage(UsageError::MissingPartitionKey)));
    }

    #[test]
    fn test_start_none_clears_start_key() {
        let (_, input) = Query::new((), "t")
            .key("pk", "a")
            .start(Some(Item::from([("pk".to_string(), Attribute::from("a"))])))
            .start(None)
            .build()
            .unwrap();
        assert_eq!(input.exclusive_start_key, None);
    }

    #[test]
    fn test_empty_names_and_values_are_idempotent() {
        let (_, expected) = Query::new((), "t").key("pk", "a").build().unwrap();
        let (_, actual) = Query::new((), "t")
            .key("pk", "a")
            .names(collections::HashMap::<String, String>::new())
            .values(collections::HashMap::<String, Attribute>::new())
            .build()
            .unwrap();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_paginates_by_created_at() {
        let store = store();
        let query = || {
            Query::new(store.clone(), "resources")
                .index("getResourceByCreatedAt")
                .key("resourceType", "project")
                .limit(1)
                .forward(true)
        };

        let first = query().execute().await.unwrap();
        assert_eq!(first.items.len(), 1);
        assert_eq!(first.items[0].get("name"), Some(&Attribute::from("A")));
        let token = first.pagination_token().unwrap().unwrap();
        assert!(!token.is_empty());

        let start = pagination::decode(&token).unwrap();
        assert_eq!(Some(&start), first.last_evaluated_key.as_ref());
        let second = query().start(Some(start)).execute().await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].get("name"), Some(&Attribute::from("B")));
        assert_eq!(second.pagination_token().unwrap(), None);

        // the resumed request carries the store's key exactly as it was returned
        let requests = store.requests();
        let Request::Query(resumed) = &requests[1] else {
            panic!("expected a query request");
        };
        assert_eq!(resumed.exclusive_start_key, first.raw_last_evaluated_key);
    }

    #[tokio::test]
    async fn test_execute_all() {
        let store = store();
        let page = Query::new(store.clone(), "resources")
            .index("getResourceByCreatedAt")
            .key("resourceType", "project")
            .limit(1)
            .execute_all()
            .await
            .unwrap();
        let names: Vec<_> = page
            .items
            .iter()
            .filter_map(|item| item.get("name").and_then(Attribute::as_str))
            .collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(page.last_evaluated_key, None);
        assert_eq!(store.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_descending() {
        let page = Query::new(store(), "resources")
            .index("getResourceByCreatedAt")
            .key("resourceType", "project")
            .forward(false)
            .execute()
            .await
            .unwrap();
        assert_eq!(page.items[0].get("name"), Some(&Attribute::from("B")));
        assert_eq!(page.last_evaluated_key, None);
    }

    #[tokio::test]
    async fn test_store_error_is_propagated() {
        let store = store().fail_with(aws_sdk_dynamodb::Error::ResourceNotFoundException(
            types::error::ResourceNotFoundException::builder()
                .message("Requested resource not found")
                .build(),
        ));
        let error = Query::new(store, "missing")
            .key("pk", "a")
            .execute()
            .await
            .unwrap_err();
        assert!(error.is_not_found());
    }
}
