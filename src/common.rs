//! Common utilities for DynamoDB operations.
//!
//! This module provides shared types and utilities used across read and write operations:
//! the attribute codec, key handling, condition rendering, projections, and the placeholder
//! accumulator every builder is built on.

/// Conversion between native values and the store's typed attributes.
pub mod attribute;

/// Condition expression building for key conditions and filters.
pub mod condition;

/// Key types for identifying items in the table.
pub mod key;

/// Attribute selection for projection expressions.
pub mod selection;

use aws_sdk_dynamodb::types;
use std::collections;

pub(crate) fn extend_path(path: &[String], placeholder: String) -> Vec<String> {
    let mut new_path = Vec::with_capacity(path.len() + 1);
    new_path.extend_from_slice(path);
    new_path.push(placeholder);
    new_path
}

fn get_expression(left: String, operator: &str, right: String) -> String {
    if left.is_empty() {
        right
    } else if right.is_empty() {
        left
    } else {
        format!("{left}{operator}{right}")
    }
}

/// An expression fragment together with the placeholders it references.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ExpressionInput {
    pub(crate) expression: String,
    pub(crate) expression_attribute_names: collections::HashMap<String, String>,
    pub(crate) expression_attribute_values: collections::HashMap<String, attribute::Attribute>,
}

/// Join `fragment` onto `expression` with `separator`, skipping empty sides.
pub(crate) fn join_expression(expression: &mut Option<String>, separator: &str, fragment: String) {
    *expression = match expression.take() {
        Some(existing) => Some(get_expression(existing, separator, fragment)),
        None if fragment.is_empty() => None,
        None => Some(fragment),
    };
}

/// Placeholder maps and projection shared by every request builder.
///
/// Names and values are merged in, never replaced wholesale; merging an empty map changes
/// nothing.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Accumulator {
    pub(crate) names: collections::HashMap<String, String>,
    pub(crate) values: collections::HashMap<String, attribute::Attribute>,
    projection: Option<String>,
}

/// The accumulated state, encoded and ready for an SDK request.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct AccumulatedInput {
    pub(crate) expression_attribute_names: Option<collections::HashMap<String, String>>,
    pub(crate) expression_attribute_values:
        Option<collections::HashMap<String, types::AttributeValue>>,
    pub(crate) projection_expression: Option<String>,
}

impl Accumulator {
    pub(crate) fn add_names<I, K, V>(&mut self, names: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.names
            .extend(names.into_iter().map(|(key, value)| (key.into(), value.into())));
    }

    pub(crate) fn add_values<I, K, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<attribute::Attribute>,
    {
        self.values
            .extend(values.into_iter().map(|(key, value)| (key.into(), value.into())));
    }

    pub(crate) fn add_projection(&mut self, projection: selection::Projection) {
        let expression = projection.render(self);
        join_expression(&mut self.projection, ", ", expression);
    }

    /// Bind a name placeholder for the attribute `name` and return it.
    pub(crate) fn name_placeholder(&mut self, name: &str) -> String {
        format!("#{}", self.bind(name, None))
    }

    /// Bind `#<body>` to the attribute `name` and return a body under which no value
    /// placeholder `:<value_prefix><body>` (or one suffixed from it) is bound yet.
    pub(crate) fn placeholder_body(&mut self, name: &str, value_prefix: &str) -> String {
        self.bind(name, Some(value_prefix))
    }

    /// Bodies are the sanitized attribute name, suffixed with `_<n>` until `#<body>` is free
    /// or already bound to `name`.
    fn bind(&mut self, name: &str, value_prefix: Option<&str>) -> String {
        let sanitized = condition::placeholder_body(name);
        let mut body = sanitized.clone();
        let mut suffix = 0;
        while self.is_taken(name, &body, value_prefix) {
            suffix += 1;
            body = format!("{sanitized}_{suffix}");
        }
        self.names.insert(format!("#{body}"), name.to_string());
        body
    }

    fn is_taken(&self, name: &str, body: &str, value_prefix: Option<&str>) -> bool {
        let name_taken = self
            .names
            .get(&format!("#{body}"))
            .is_some_and(|bound| bound != name);
        let value_taken = value_prefix.is_some_and(|prefix| {
            let value = format!(":{prefix}{body}");
            let derived = format!("{value}_");
            self.values
                .keys()
                .any(|placeholder| *placeholder == value || placeholder.starts_with(&derived))
        });
        name_taken || value_taken
    }

    pub(crate) fn finish(self) -> AccumulatedInput {
        let expression_attribute_names = (!self.names.is_empty()).then_some(self.names);
        let expression_attribute_values =
            (!self.values.is_empty()).then(|| attribute::encode_item(self.values));
        AccumulatedInput {
            expression_attribute_names,
            expression_attribute_values,
            projection_expression: self.projection,
        }
    }
}

/// Expand the placeholder methods shared by request builders.
///
/// The builder must hold an `expressions` field of the crate's accumulator type; pass the
/// methods to generate (`names`, `values`, `projection`).
#[macro_export]
macro_rules! expression_methods {
    ($($method:ident),+) => {
        $($crate::expression_methods!(@$method);)+
    };
    (@names) => {
        /// Merge attribute name placeholders (`#placeholder` to attribute name) into the request.
        pub fn names<I, K, V>(mut self, names: I) -> Self
        where
            I: IntoIterator<Item = (K, V)>,
            K: Into<String>,
            V: Into<String>,
        {
            self.expressions.add_names(names);
            self
        }
    };
    (@values) => {
        /// Merge attribute value placeholders (`:placeholder` to value) into the request.
        pub fn values<I, K, V>(mut self, values: I) -> Self
        where
            I: IntoIterator<Item = (K, V)>,
            K: Into<String>,
            V: Into<$crate::common::attribute::Attribute>,
        {
            self.expressions.add_values(values);
            self
        }
    };
    (@projection) => {
        /// Append to the projection expression.
        ///
        /// A string is appended verbatim; a list of names is turned into `#<name>` placeholders.
        /// Successive calls are comma-joined.
        pub fn projection(
            mut self,
            projection: impl Into<$crate::common::selection::Projection>,
        ) -> Self {
            self.expressions.add_projection(projection.into());
            self
        }
    };
}
