use crate::{
    common::{
        self,
        attribute::{Attribute, Item},
        condition,
    },
    error::UsageError,
};

use aws_sdk_dynamodb::types;
use chrono::{SecondsFormat, Utc};
use std::collections;

/// Attribute stamped with the time of an item's first write.
pub const CREATED_AT: &str = "createdAt";

/// Attribute stamped with the time of an item's latest write.
pub const UPDATED_AT: &str = "updatedAt";

/// Current time as RFC 3339 with milliseconds in UTC, e.g. `2022-01-01T00:00:00.000Z`.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Stamp `createdAt` and `updatedAt` onto a put item where they are absent.
pub(crate) fn stamp(item: &mut Item, now: &str) {
    for name in [CREATED_AT, UPDATED_AT] {
        item.entry(name.to_string())
            .or_insert_with(|| Attribute::from(now));
    }
}

/// An expression fragment with the placeholders it references.
///
/// Used for update clauses and for condition expressions. Plain strings convert into an
/// expression without placeholders; register them on the builder instead, or attach them here.
///
/// ```rust
/// use dynamodb_table::write::common::Expression;
///
/// let condition = Expression::new("#status = :status")
///     .names([("#status", "status")])
///     .values([(":status", "active")]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Expression {
    condition: Option<condition::KeyCondition>,
    input: common::ExpressionInput,
}

impl Expression {
    /// Create an expression from its text.
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            condition: None,
            input: common::ExpressionInput {
                expression: expression.into(),
                ..Default::default()
            },
        }
    }

    /// Attach attribute name placeholders.
    pub fn names<I, K, V>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.input
            .expression_attribute_names
            .extend(names.into_iter().map(|(key, value)| (key.into(), value.into())));
        self
    }

    /// Attach attribute value placeholders.
    pub fn values<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Attribute>,
    {
        self.input
            .expression_attribute_values
            .extend(values.into_iter().map(|(key, value)| (key.into(), value.into())));
        self
    }

    /// Register the placeholders with `expressions` and hand back the expression text.
    pub(crate) fn absorb_into(self, expressions: &mut common::Accumulator) -> String {
        let expression = expressions.absorb(self.input);
        match self.condition {
            Some(key_condition) => key_condition.render_in(expressions, "condition_"),
            None => expression,
        }
    }
}

impl From<&str> for Expression {
    fn from(expression: &str) -> Self {
        Self::new(expression)
    }
}

impl From<String> for Expression {
    fn from(expression: String) -> Self {
        Self::new(expression)
    }
}

/// A typed condition renders with `:condition_<name>` value placeholders once it reaches a
/// request builder.
impl From<condition::KeyCondition> for Expression {
    fn from(key_condition: condition::KeyCondition) -> Self {
        Self {
            condition: Some(key_condition),
            input: common::ExpressionInput::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct WriteInput {
    pub(crate) condition_expression: Option<String>,
    pub(crate) expression_attribute_names: Option<collections::HashMap<String, String>>,
    pub(crate) expression_attribute_values:
        Option<collections::HashMap<String, types::AttributeValue>>,
    pub(crate) return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    pub(crate) return_item_collection_metrics: Option<types::ReturnItemCollectionMetrics>,
    pub(crate) return_values: Option<types::ReturnValue>,
    pub(crate) table_name: String,
}

/// Request state shared by Update and Delete.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct WriteArgs {
    pub(crate) condition: Option<String>,
    pub(crate) return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    pub(crate) return_item_collection_metrics: Option<types::ReturnItemCollectionMetrics>,
    pub(crate) return_values: Option<types::ReturnValue>,
    pub(crate) table_name: String,
}

impl WriteArgs {
    pub(crate) fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    /// Set the condition expression; a write carries at most one.
    pub(crate) fn set_condition(
        &mut self,
        expressions: &mut common::Accumulator,
        condition: Expression,
    ) -> Result<(), UsageError> {
        if self.condition.is_some() {
            return Err(UsageError::MultipleConditions);
        }
        self.condition = Some(condition.absorb_into(expressions));
        Ok(())
    }

    pub(crate) fn finish(self, expressions: common::Accumulator) -> WriteInput {
        let accumulated = expressions.finish();
        WriteInput {
            condition_expression: self.condition,
            expression_attribute_names: accumulated.expression_attribute_names,
            expression_attribute_values: accumulated.expression_attribute_values,
            return_consumed_capacity: self.return_consumed_capacity,
            return_item_collection_metrics: self.return_item_collection_metrics,
            return_values: self.return_values,
            table_name: self.table_name,
        }
    }
}

/// apply common write operation settings to a builder
#[macro_export]
macro_rules! apply_write_operation {
    ($builder:expr, $write_operation:expr) => {
        $builder
            .set_condition_expression($write_operation.condition_expression)
            .set_expression_attribute_names($write_operation.expression_attribute_names)
            .set_expression_attribute_values($write_operation.expression_attribute_values)
            .set_return_consumed_capacity($write_operation.return_consumed_capacity)
            .set_return_item_collection_metrics($write_operation.return_item_collection_metrics)
            .set_return_values($write_operation.return_values)
            .table_name($write_operation.table_name)
    };
}

/// expand the configuration methods shared by Update and Delete
#[macro_export]
macro_rules! write_methods {
    () => {
        /// Only write if `condition` holds for the current item; may be set once.
        ///
        /// A failed condition surfaces as a store error for which
        /// `Error::is_conditional_check_failed` is true.
        pub fn condition(
            mut self,
            condition: impl Into<$crate::write::common::Expression>,
        ) -> $crate::error::Result<Self> {
            self.write
                .set_condition(&mut self.expressions, condition.into())?;
            Ok(self)
        }

        /// Level of consumed capacity reported back.
        pub fn capacity(
            mut self,
            capacity: aws_sdk_dynamodb::types::ReturnConsumedCapacity,
        ) -> Self {
            self.write.return_consumed_capacity = Some(capacity);
            self
        }

        /// Whether item collection metrics are reported back.
        pub fn metrics(
            mut self,
            metrics: aws_sdk_dynamodb::types::ReturnItemCollectionMetrics,
        ) -> Self {
            self.write.return_item_collection_metrics = Some(metrics);
            self
        }
    };
}
