use crate::error::{Error, Result};

use aws_sdk_dynamodb::{primitives::Blob, types};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Number;
use std::collections;

/// A decoded item: attribute name to native value.
pub type Item = collections::HashMap<String, Attribute>;

/// Native representation of a typed store attribute.
///
/// The serde form is the store's typed JSON, each value wrapped in a single-key type tag:
///
/// ```rust
/// use dynamodb_table::common::attribute::Attribute;
///
/// let json = serde_json::to_string(&Attribute::from("PROJ#1")).unwrap();
/// assert_eq!(json, r#"{"S":"PROJ#1"}"#);
/// let json = serde_json::to_string(&Attribute::from(42)).unwrap();
/// assert_eq!(json, r#"{"N":"42"}"#);
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(into = "TypedJson", try_from = "TypedJson")]
pub enum Attribute {
    /// String.
    S(String),
    /// Number, kept at full precision.
    N(Number),
    /// Boolean.
    Bool(bool),
    /// Null.
    Null,
    /// Binary.
    B(Vec<u8>),
    /// Map of nested attributes.
    M(collections::HashMap<String, Attribute>),
    /// List of nested attributes.
    L(Vec<Attribute>),
    /// Set of strings.
    Ss(Vec<String>),
    /// Set of numbers.
    Ns(Vec<Number>),
    /// Set of binaries.
    Bs(Vec<Vec<u8>>),
}

impl Attribute {
    /// The string value, if this is a string attribute.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::S(value) => Some(value),
            _ => None,
        }
    }

    /// The number value, if this is a number attribute.
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Self::N(value) => Some(value),
            _ => None,
        }
    }

    /// The boolean value, if this is a boolean attribute.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

/// Encode a native attribute into its wire representation.
pub fn encode(attribute: Attribute) -> types::AttributeValue {
    match attribute {
        Attribute::S(value) => types::AttributeValue::S(value),
        Attribute::N(value) => types::AttributeValue::N(value.to_string()),
        Attribute::Bool(value) => types::AttributeValue::Bool(value),
        Attribute::Null => types::AttributeValue::Null(true),
        Attribute::B(value) => types::AttributeValue::B(Blob::new(value)),
        Attribute::M(map) => types::AttributeValue::M(encode_item(map)),
        Attribute::L(list) => types::AttributeValue::L(list.into_iter().map(encode).collect()),
        Attribute::Ss(values) => types::AttributeValue::Ss(values),
        Attribute::Ns(values) => {
            types::AttributeValue::Ns(values.iter().map(Number::to_string).collect())
        }
        Attribute::Bs(values) => {
            types::AttributeValue::Bs(values.into_iter().map(Blob::new).collect())
        }
    }
}

/// Decode a wire attribute into its native representation.
pub fn decode(value: types::AttributeValue) -> Result<Attribute> {
    let attribute = match value {
        types::AttributeValue::S(value) => Attribute::S(value),
        types::AttributeValue::N(value) => Attribute::N(parse_number(&value)?),
        types::AttributeValue::Bool(value) => Attribute::Bool(value),
        types::AttributeValue::Null(_) => Attribute::Null,
        types::AttributeValue::B(value) => Attribute::B(value.into_inner()),
        types::AttributeValue::M(map) => Attribute::M(decode_item(map)?),
        types::AttributeValue::L(list) => {
            Attribute::L(list.into_iter().map(decode).collect::<Result<_>>()?)
        }
        types::AttributeValue::Ss(values) => Attribute::Ss(values),
        types::AttributeValue::Ns(values) => Attribute::Ns(
            values
                .iter()
                .map(|value| parse_number(value))
                .collect::<Result<_>>()?,
        ),
        types::AttributeValue::Bs(values) => {
            Attribute::Bs(values.into_iter().map(Blob::into_inner).collect())
        }
        other => return Err(Error::Attribute(format!("unsupported type tag: {other:?}"))),
    };
    Ok(attribute)
}

/// Encode every attribute of an item.
pub fn encode_item(item: Item) -> collections::HashMap<String, types::AttributeValue> {
    item.into_iter()
        .map(|(name, attribute)| (name, encode(attribute)))
        .collect()
}

/// Decode every attribute of a wire item.
pub fn decode_item(item: collections::HashMap<String, types::AttributeValue>) -> Result<Item> {
    item.into_iter()
        .map(|(name, value)| Ok((name, decode(value)?)))
        .collect()
}

/// Convert a serializable value (typically a struct) into an item.
pub fn to_item<T: Serialize>(value: T) -> Result<Item> {
    let item: collections::HashMap<String, types::AttributeValue> =
        serde_dynamo::to_item(value)?;
    decode_item(item)
}

/// Convert an item into a deserializable value.
pub fn from_item<T: DeserializeOwned>(item: Item) -> Result<T> {
    let value = serde_dynamo::from_item(encode_item(item))?;
    Ok(value)
}

fn parse_number(value: &str) -> Result<Number> {
    value
        .parse()
        .map_err(|_| Error::Attribute(format!("not a number: {value}")))
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Self::S(value.to_string())
    }
}

impl From<String> for Attribute {
    fn from(value: String) -> Self {
        Self::S(value)
    }
}

impl From<&String> for Attribute {
    fn from(value: &String) -> Self {
        Self::S(value.clone())
    }
}

impl From<bool> for Attribute {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Number> for Attribute {
    fn from(value: Number) -> Self {
        Self::N(value)
    }
}

macro_rules! impl_from_integer {
    ($($integer:ty),*) => {
        $(
            impl From<$integer> for Attribute {
                fn from(value: $integer) -> Self {
                    Self::N(Number::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for Attribute {
    /// Non-finite floats have no number representation and become [`Attribute::Null`].
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Self::Null, Self::N)
    }
}

impl From<Vec<Attribute>> for Attribute {
    fn from(value: Vec<Attribute>) -> Self {
        Self::L(value)
    }
}

impl From<Item> for Attribute {
    fn from(value: Item) -> Self {
        Self::M(value)
    }
}

impl<T: Into<Attribute>> From<Option<T>> for Attribute {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Attribute {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(value) => Self::Bool(value),
            serde_json::Value::Number(value) => Self::N(value),
            serde_json::Value::String(value) => Self::S(value),
            serde_json::Value::Array(values) => {
                Self::L(values.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::M(
                map.into_iter()
                    .map(|(name, value)| (name, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<Attribute> for types::AttributeValue {
    fn from(attribute: Attribute) -> Self {
        encode(attribute)
    }
}

impl TryFrom<types::AttributeValue> for Attribute {
    type Error = Error;

    fn try_from(value: types::AttributeValue) -> Result<Self> {
        decode(value)
    }
}

/// Serde mirror of [`Attribute`] in the store's typed JSON shape.
#[derive(Deserialize, Serialize)]
enum TypedJson {
    S(String),
    N(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    B(String),
    M(collections::HashMap<String, TypedJson>),
    L(Vec<TypedJson>),
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    #[serde(rename = "BS")]
    Bs(Vec<String>),
}

impl From<Attribute> for TypedJson {
    fn from(attribute: Attribute) -> Self {
        match attribute {
            Attribute::S(value) => Self::S(value),
            Attribute::N(value) => Self::N(value.to_string()),
            Attribute::Bool(value) => Self::Bool(value),
            Attribute::Null => Self::Null(true),
            Attribute::B(value) => Self::B(BASE64.encode(value)),
            Attribute::M(map) => Self::M(
                map.into_iter()
                    .map(|(name, value)| (name, Self::from(value)))
                    .collect(),
            ),
            Attribute::L(list) => Self::L(list.into_iter().map(Self::from).collect()),
            Attribute::Ss(values) => Self::Ss(values),
            Attribute::Ns(values) => Self::Ns(values.iter().map(Number::to_string).collect()),
            Attribute::Bs(values) => {
                Self::Bs(values.iter().map(|value| BASE64.encode(value)).collect())
            }
        }
    }
}

impl TryFrom<TypedJson> for Attribute {
    type Error = Error;

    fn try_from(value: TypedJson) -> Result<Self> {
        let attribute = match value {
            TypedJson::S(value) => Self::S(value),
            TypedJson::N(value) => Self::N(parse_number(&value)?),
            TypedJson::Bool(value) => Self::Bool(value),
            TypedJson::Null(_) => Self::Null,
            TypedJson::B(value) => Self::B(parse_binary(&value)?),
            TypedJson::M(map) => Self::M(
                map.into_iter()
                    .map(|(name, value)| Ok((name, Self::try_from(value)?)))
                    .collect::<Result<_>>()?,
            ),
            TypedJson::L(list) => {
                Self::L(list.into_iter().map(Self::try_from).collect::<Result<_>>()?)
            }
            TypedJson::Ss(values) => Self::Ss(values),
            TypedJson::Ns(values) => Self::Ns(
                values
                    .iter()
                    .map(|value| parse_number(value))
                    .collect::<Result<_>>()?,
            ),
            TypedJson::Bs(values) => Self::Bs(
                values
                    .iter()
                    .map(|value| parse_binary(value))
                    .collect::<Result<_>>()?,
            ),
        };
        Ok(attribute)
    }
}

fn parse_binary(value: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(value)
        .map_err(|_| Error::Attribute(format!("not base64: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::string(Attribute::from("a"), types::AttributeValue::S("a".to_string()))]
    #[case::integer(Attribute::from(42), types::AttributeValue::N("42".to_string()))]
    #[case::float(Attribute::from(1.5), types::AttributeValue::N("1.5".to_string()))]
    #[case::boolean(Attribute::from(true), types::AttributeValue::Bool(true))]
    #[case::null(Attribute::Null, types::AttributeValue::Null(true))]
    #[case::binary(
        Attribute::B(vec![1, 2, 3]),
        types::AttributeValue::B(Blob::new(vec![1, 2, 3]))
    )]
    #[case::list(
        Attribute::L(vec![Attribute::from("a"), Attribute::from(1)]),
        types::AttributeValue::L(vec![
            types::AttributeValue::S("a".to_string()),
            types::AttributeValue::N("1".to_string()),
        ])
    )]
    #[case::map(
        Attribute::M(Item::from([("a".to_string(), Attribute::from("b"))])),
        types::AttributeValue::M(collections::HashMap::from([(
            "a".to_string(),
            types::AttributeValue::S("b".to_string()),
        )]))
    )]
    #[case::string_set(
        Attribute::Ss(vec!["a".to_string(), "b".to_string()]),
        types::AttributeValue::Ss(vec!["a".to_string(), "b".to_string()])
    )]
    #[case::number_set(
        Attribute::Ns(vec![Number::from(1), Number::from(2)]),
        types::AttributeValue::Ns(vec!["1".to_string(), "2".to_string()])
    )]
    fn test_encode_decode(#[case] attribute: Attribute, #[case] wire: types::AttributeValue) {
        assert_eq!(encode(attribute.clone()), wire);
        assert_eq!(decode(wire).unwrap(), attribute);
    }

    #[test]
    fn test_decode_keeps_number_precision() {
        let wire = types::AttributeValue::N("12345678901234567890123456789012345678".to_string());
        let attribute = decode(wire.clone()).unwrap();
        assert_eq!(encode(attribute), wire);
    }

    #[test]
    fn test_decode_rejects_non_numeric_number() {
        let error = decode(types::AttributeValue::N("abc".to_string())).unwrap_err();
        assert!(matches!(error, Error::Attribute(_)));
    }

    #[rstest]
    #[case::string(Attribute::from("x"), json!({"S": "x"}))]
    #[case::number(Attribute::from(7), json!({"N": "7"}))]
    #[case::boolean(Attribute::from(false), json!({"BOOL": false}))]
    #[case::null(Attribute::Null, json!({"NULL": true}))]
    #[case::binary(Attribute::B(b"hi".to_vec()), json!({"B": "aGk="}))]
    #[case::number_set(Attribute::Ns(vec![Number::from(3)]), json!({"NS": ["3"]}))]
    #[case::nested(
        Attribute::M(Item::from([(
            "tags".to_string(),
            Attribute::L(vec![Attribute::from("a")]),
        )])),
        json!({"M": {"tags": {"L": [{"S": "a"}]}}})
    )]
    fn test_typed_json(#[case] attribute: Attribute, #[case] expected: serde_json::Value) {
        assert_eq!(serde_json::to_value(&attribute).unwrap(), expected);
        let actual: Attribute = serde_json::from_value(expected).unwrap();
        assert_eq!(actual, attribute);
    }

    #[test]
    fn test_from_json_value() {
        let actual = Attribute::from(json!({"name": "A", "count": 2, "archived": null}));
        let expected = Attribute::M(Item::from([
            ("name".to_string(), Attribute::from("A")),
            ("count".to_string(), Attribute::from(2)),
            ("archived".to_string(), Attribute::Null),
        ]));
        assert_eq!(actual, expected);
    }

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct Project {
        pk: String,
        name: String,
        budget: u32,
    }

    #[test]
    fn test_struct_bridge() {
        let project = Project {
            pk: "PROJ#1".to_string(),
            name: "A".to_string(),
            budget: 10,
        };
        let item = to_item(&project).unwrap();
        assert_eq!(item.get("pk"), Some(&Attribute::from("PROJ#1")));
        assert_eq!(item.get("budget"), Some(&Attribute::from(10)));
        let actual: Project = from_item(item).unwrap();
        assert_eq!(actual, project);
    }
}
