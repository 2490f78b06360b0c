use crate::common::{self, attribute::Attribute};

use std::{collections, ops};

/// Logical operator for combining conditions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogicalOperator {
    /// Logical AND - all conditions must be true.
    And,
    /// Logical OR - at least one condition must be true.
    Or,
}

impl ops::Deref for LogicalOperator {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Condition on a single attribute.
///
/// ```rust
/// use dynamodb_table::common::condition::Condition;
///
/// let eq = Condition::Equals("active".into());
/// let range = Condition::Between("2022-01-01".into(), "2022-12-31".into());
/// let missing = Condition::NotExists;
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// Checks if an attribute begins with a specified prefix (string types only).
    BeginsWith(String),
    /// Checks if an attribute value is between two values (inclusive).
    Between(Attribute, Attribute),
    /// Checks if an attribute contains a specified value.
    Contains(Attribute),
    /// Checks if an attribute value equals a specified value.
    Equals(Attribute),
    /// Checks if an attribute exists.
    Exists,
    /// Checks if an attribute value is greater than a specified value.
    GreaterThan(Attribute),
    /// Checks if an attribute value is greater than or equal to a specified value.
    GreaterThanOrEqual(Attribute),
    /// Checks if an attribute value is in a list of specified values.
    In(Vec<Attribute>),
    /// Checks if an attribute value is less than a specified value.
    LessThan(Attribute),
    /// Checks if an attribute value is less than or equal to a specified value.
    LessThanOrEqual(Attribute),
    /// Checks if an attribute does not contain a specified value.
    NotContains(Attribute),
    /// Checks if an attribute value does not equal a specified value.
    NotEqual(Attribute),
    /// Checks if an attribute does not exist.
    NotExists,
}

impl Condition {
    /// Whether the store accepts the condition in a key condition expression.
    pub fn is_key_condition(&self) -> bool {
        matches!(
            self,
            Self::BeginsWith(_)
                | Self::Between(_, _)
                | Self::Equals(_)
                | Self::GreaterThan(_)
                | Self::GreaterThanOrEqual(_)
                | Self::LessThan(_)
                | Self::LessThanOrEqual(_)
        )
    }

    /// Render against `path`, deriving value placeholders from `value_placeholder`.
    fn render(
        self,
        path: &str,
        value_placeholder: &str,
    ) -> (String, collections::HashMap<String, Attribute>) {
        let mut values = collections::HashMap::new();
        let mut bind = |suffix: &str, value: Attribute| {
            let placeholder = format!("{value_placeholder}{suffix}");
            values.insert(placeholder.clone(), value);
            placeholder
        };
        let expression = match self {
            Self::BeginsWith(prefix) => {
                let value = bind("", Attribute::S(prefix));
                format!("begins_with({path}, {value})")
            }
            Self::Between(start, end) => {
                let start = bind("_start", start);
                let end = bind("_end", end);
                format!("{path} BETWEEN {start} AND {end}")
            }
            Self::Contains(value) => format!("contains({path}, {})", bind("", value)),
            Self::Equals(value) => format!("{path} = {}", bind("", value)),
            Self::Exists => format!("attribute_exists({path})"),
            Self::GreaterThan(value) => format!("{path} > {}", bind("", value)),
            Self::GreaterThanOrEqual(value) => format!("{path} >= {}", bind("", value)),
            Self::In(candidates) => {
                let placeholders: Vec<_> = candidates
                    .into_iter()
                    .enumerate()
                    .map(|(index, value)| bind(&format!("_{index}"), value))
                    .collect();
                format!("{path} IN ({})", placeholders.join(", "))
            }
            Self::LessThan(value) => format!("{path} < {}", bind("", value)),
            Self::LessThanOrEqual(value) => format!("{path} <= {}", bind("", value)),
            Self::NotContains(value) => format!("NOT contains({path}, {})", bind("", value)),
            Self::NotEqual(value) => format!("{path} <> {}", bind("", value)),
            Self::NotExists => format!("attribute_not_exists({path})"),
        };
        (expression, values)
    }
}

/// Condition applied to a named attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyCondition {
    /// The condition to apply to the attribute.
    pub condition: Condition,
    /// The name of the attribute to apply the condition to.
    pub name: String,
}

impl KeyCondition {
    /// Create a condition on the attribute `name`.
    pub fn new(name: impl Into<String>, condition: Condition) -> Self {
        Self {
            condition,
            name: name.into(),
        }
    }

    /// Render against `name_placeholder`, deriving value placeholders from
    /// `value_placeholder`.
    pub(crate) fn render(
        self,
        name_placeholder: &str,
        value_placeholder: &str,
    ) -> common::ExpressionInput {
        let (expression, expression_attribute_values) =
            self.condition.render(name_placeholder, value_placeholder);
        common::ExpressionInput {
            expression,
            expression_attribute_names: collections::HashMap::from([(
                name_placeholder.to_string(),
                self.name,
            )]),
            expression_attribute_values,
        }
    }

    /// Render through `expressions`, taking both placeholders from one body unique to it.
    pub(crate) fn render_in(
        self,
        expressions: &mut common::Accumulator,
        value_prefix: &str,
    ) -> String {
        let body = expressions.placeholder_body(&self.name, value_prefix);
        let input = self.render(&format!("#{body}"), &format!(":{value_prefix}{body}"));
        expressions.absorb(input)
    }
}

/// Sanitize an attribute name into a placeholder body.
pub(crate) fn placeholder_body(name: &str) -> String {
    name.chars()
        .map(|char| if char.is_ascii_alphanumeric() { char } else { '_' })
        .collect()
}
