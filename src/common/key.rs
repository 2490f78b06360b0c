use crate::common::attribute::{Attribute, Item};

/// Attribute name of the table's partition key.
pub const PARTITION_KEY: &str = "pk";

/// Attribute name of the table's sort key.
pub const SORT_KEY: &str = "sk";

/// Separator between the resource type prefix and the id in key values.
pub const PREFIX_SEPARATOR: char = '#';

/// Key component.
///
/// ```rust
/// use dynamodb_table::common::key;
///
/// let key = key::Key::new("resourceType", "project");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Key {
    /// The attribute name of the key.
    pub name: String,
    /// The value of the key.
    pub value: Attribute,
}

impl Key {
    /// Create a key component.
    pub fn new(name: impl Into<String>, value: impl Into<Attribute>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Primary key (partition key and optional sort key).
///
/// ```rust
/// use dynamodb_table::common::key;
///
/// let keys = key::Keys::new("PROJ#1", "PROJ#1");
/// assert_eq!(keys.partition_key.name, "pk");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Keys {
    /// The partition key (required).
    pub partition_key: Key,
    /// The sort key (optional, only for tables with composite primary keys).
    pub sort_key: Option<Key>,
}

impl Keys {
    /// Primary key of the single table: `pk` and `sk`.
    pub fn new(partition_key: impl Into<String>, sort_key: impl Into<String>) -> Self {
        Self {
            partition_key: Key::new(PARTITION_KEY, partition_key.into()),
            sort_key: Some(Key::new(SORT_KEY, sort_key.into())),
        }
    }

    /// Primary key whose partition and sort key are the same value, as used by root entities.
    pub fn entity(value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(value.clone(), value)
    }
}

impl From<Keys> for Item {
    fn from(keys: Keys) -> Self {
        let mut item = Self::from([(keys.partition_key.name, keys.partition_key.value)]);
        if let Some(sort_key) = keys.sort_key {
            item.insert(sort_key.name, sort_key.value);
        }
        item
    }
}

/// Build a key value of the form `<prefix>#<id>`.
///
/// ```rust
/// use dynamodb_table::common::key;
///
/// assert_eq!(key::prefixed("PROJ", "1"), "PROJ#1");
/// ```
pub fn prefixed(prefix: &str, id: &str) -> String {
    format!("{prefix}{PREFIX_SEPARATOR}{id}")
}

/// The resource type prefix of a key value, if it has one.
pub fn resource_prefix(value: &str) -> Option<&str> {
    value
        .split_once(PREFIX_SEPARATOR)
        .map(|(prefix, _)| prefix)
}

/// The id part of a key value, if it has a prefix.
pub fn resource_id(value: &str) -> Option<&str> {
    value.split_once(PREFIX_SEPARATOR).map(|(_, id)| id)
}
