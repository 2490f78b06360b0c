use crate::{
    common::{
        self,
        attribute::{self, Item},
        condition,
    },
    error::{Result, UsageError},
    pagination,
};

use async_trait::async_trait;
use aws_sdk_dynamodb::types;
use std::collections;

/// Wire form of a continuation key.
pub type RawKey = collections::HashMap<String, types::AttributeValue>;

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct MultipleReadInput {
    pub(crate) consistent_read: Option<bool>,
    pub(crate) exclusive_start_key: Option<RawKey>,
    pub(crate) expression_attribute_names: Option<collections::HashMap<String, String>>,
    pub(crate) expression_attribute_values:
        Option<collections::HashMap<String, types::AttributeValue>>,
    pub(crate) filter_expression: Option<String>,
    pub(crate) index_name: Option<String>,
    pub(crate) limit: Option<i32>,
    pub(crate) projection_expression: Option<String>,
    pub(crate) return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    pub(crate) select: Option<types::Select>,
    pub(crate) table_name: String,
}

/// Request state shared by Query and Scan.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct MultipleReadArgs {
    pub(crate) consistent_read: Option<bool>,
    pub(crate) exclusive_start_key: Option<Item>,
    pub(crate) filter: Option<String>,
    pub(crate) filter_conditions: usize,
    pub(crate) index_name: Option<String>,
    pub(crate) limit: Option<i32>,
    pub(crate) return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    pub(crate) select: Option<types::Select>,
    pub(crate) table_name: String,
}

impl MultipleReadArgs {
    pub(crate) fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    /// Render a typed filter condition with placeholders unique to this request.
    pub(crate) fn filter_condition(
        &mut self,
        expressions: &mut common::Accumulator,
        key_condition: condition::KeyCondition,
    ) {
        let value_prefix = format!("filter{}_", self.filter_conditions);
        self.filter_conditions += 1;
        let expression = key_condition.render_in(expressions, &value_prefix);
        common::join_expression(&mut self.filter, &condition::LogicalOperator::And, expression);
    }

    pub(crate) fn check_select(
        select: &types::Select,
        expressions: &common::Accumulator,
    ) -> Result<(), UsageError> {
        if expressions.has_projection() && *select != types::Select::SpecificAttributes {
            return Err(UsageError::SelectWithProjection {
                select: select.as_str().to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn finish(self, expressions: common::Accumulator) -> Result<MultipleReadInput> {
        if let Some(select) = self.select.as_ref() {
            Self::check_select(select, &expressions)?;
        }
        let accumulated = expressions.finish();
        Ok(MultipleReadInput {
            consistent_read: self.consistent_read,
            exclusive_start_key: self.exclusive_start_key.map(attribute::encode_item),
            expression_attribute_names: accumulated.expression_attribute_names,
            expression_attribute_values: accumulated.expression_attribute_values,
            filter_expression: self.filter,
            index_name: self.index_name,
            limit: self.limit,
            projection_expression: accumulated.projection_expression,
            return_consumed_capacity: self.return_consumed_capacity,
            select: self.select,
            table_name: self.table_name,
        })
    }
}

/// One page of Query or Scan results, decoded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    /// The decoded items.
    pub items: Vec<Item>,
    /// The decoded continuation key, `None` when there are no more pages.
    pub last_evaluated_key: Option<Item>,
    /// The continuation key exactly as the store returned it.
    pub raw_last_evaluated_key: Option<RawKey>,
    /// Number of items returned.
    pub count: i32,
    /// Number of items evaluated before filtering.
    pub scanned_count: i32,
    /// Capacity consumed, when requested.
    pub consumed_capacity: Option<types::ConsumedCapacity>,
}

impl Page {
    pub(crate) fn decode(
        items: Option<Vec<RawKey>>,
        last_evaluated_key: Option<RawKey>,
        count: i32,
        scanned_count: i32,
        consumed_capacity: Option<types::ConsumedCapacity>,
    ) -> Result<Self> {
        let items = items
            .unwrap_or_default()
            .into_iter()
            .map(attribute::decode_item)
            .collect::<Result<_>>()?;
        // the store may answer with an empty map instead of omitting the key
        let raw_last_evaluated_key = last_evaluated_key.filter(|key| !key.is_empty());
        let last_evaluated_key = raw_last_evaluated_key
            .clone()
            .map(attribute::decode_item)
            .transpose()?;
        Ok(Self {
            items,
            last_evaluated_key,
            raw_last_evaluated_key,
            count,
            scanned_count,
            consumed_capacity,
        })
    }

    /// The opaque token that resumes the listing after this page, if there is a next page.
    pub fn pagination_token(&self) -> Result<Option<String>> {
        pagination::encode(self.last_evaluated_key.as_ref())
    }

    /// Concatenate sequential pages into one, keeping the last continuation key.
    pub(crate) fn concat(pages: Vec<Self>) -> Self {
        let mut capacities = Vec::new();
        let mut page = pages
            .into_iter()
            .fold(Self::default(), |mut page, next| {
                page.items.extend(next.items);
                page.count += next.count;
                page.scanned_count += next.scanned_count;
                page.last_evaluated_key = next.last_evaluated_key;
                page.raw_last_evaluated_key = next.raw_last_evaluated_key;
                capacities.extend(next.consumed_capacity);
                page
            });
        if !capacities.is_empty() {
            page.consumed_capacity = Some(aggregate_capacity(capacities));
        }
        page
    }
}

pub(crate) fn aggregate_capacity(
    capacities: Vec<types::ConsumedCapacity>,
) -> types::ConsumedCapacity {
    let (cap, read, write, table) = capacities.into_iter().fold(
        (0.0, 0.0, 0.0, None),
        |(cap, read, write, table), capacity| {
            (
                cap + capacity.capacity_units.unwrap_or(0.0),
                read + capacity.read_capacity_units.unwrap_or(0.0),
                write + capacity.write_capacity_units.unwrap_or(0.0),
                table.or(capacity.table_name),
            )
        },
    );
    types::ConsumedCapacity::builder()
        .set_table_name(table)
        .set_capacity_units(Some(cap))
        .set_read_capacity_units(Some(read))
        .set_write_capacity_units(Some(write))
        .build()
}

/// A read that can be resumed from a continuation key one page at a time.
#[async_trait]
pub trait Paginate: Sized + Send {
    /// Resume after `key`, or start from the beginning when `None`.
    fn resume_from(self, key: Option<Item>) -> Self;

    /// Fetch a single page.
    async fn fetch_page(self) -> Result<Page>;
}

/// apply common multiple read operation settings to a builder
#[macro_export]
macro_rules! apply_multiple_read_operation {
    ($builder:expr, $multiple_read_operation:expr) => {
        $builder
            .set_consistent_read($multiple_read_operation.consistent_read)
            .set_exclusive_start_key($multiple_read_operation.exclusive_start_key)
            .set_expression_attribute_names($multiple_read_operation.expression_attribute_names)
            .set_expression_attribute_values($multiple_read_operation.expression_attribute_values)
            .set_filter_expression($multiple_read_operation.filter_expression)
            .set_index_name($multiple_read_operation.index_name)
            .set_limit($multiple_read_operation.limit)
            .set_projection_expression($multiple_read_operation.projection_expression)
            .set_return_consumed_capacity($multiple_read_operation.return_consumed_capacity)
            .set_select($multiple_read_operation.select)
            .table_name($multiple_read_operation.table_name)
    };
}

/// expand the configuration methods shared by Query and Scan
#[macro_export]
macro_rules! multiple_read_methods {
    () => {
        /// Read from a secondary index instead of the base table.
        pub fn index(mut self, index_name: impl Into<String>) -> Self {
            self.read.index_name = Some(index_name.into());
            self
        }

        /// Append a raw filter expression, space-joined with any previous filter.
        ///
        /// The filter is applied by the store after items are read, so it never needs key
        /// attributes. Placeholders it references must be registered with `names`/`values`.
        pub fn filter(mut self, expression: impl Into<String>) -> Self {
            $crate::common::join_expression(&mut self.read.filter, " ", expression.into());
            self
        }

        /// AND a typed condition on `name` into the filter expression.
        pub fn filter_on(
            mut self,
            name: impl Into<String>,
            condition: $crate::common::condition::Condition,
        ) -> Self {
            let key_condition = $crate::common::condition::KeyCondition::new(name, condition);
            self.read.filter_condition(&mut self.expressions, key_condition);
            self
        }

        /// Set the decoded start key, or clear it with `None`.
        pub fn start(mut self, key: Option<$crate::common::attribute::Item>) -> Self {
            self.read.exclusive_start_key = key;
            self
        }

        /// Choose which attributes are returned.
        ///
        /// With a projection set, only `Select::SpecificAttributes` is accepted.
        pub fn select(
            mut self,
            select: aws_sdk_dynamodb::types::Select,
        ) -> $crate::error::Result<Self> {
            $crate::read::common::MultipleReadArgs::check_select(&select, &self.expressions)?;
            self.read.select = Some(select);
            Ok(self)
        }

        /// Maximum number of items to evaluate.
        pub fn limit(mut self, limit: i32) -> Self {
            self.read.limit = Some(limit);
            self
        }

        /// Request strongly consistent reads.
        pub fn strong(mut self) -> Self {
            self.read.consistent_read = Some(true);
            self
        }

        /// Level of consumed capacity reported back.
        pub fn capacity(
            mut self,
            capacity: aws_sdk_dynamodb::types::ReturnConsumedCapacity,
        ) -> Self {
            self.read.return_consumed_capacity = Some(capacity);
            self
        }
    };
}
