//! Opaque pagination tokens.
//!
//! A token is the base64 encoding of the continuation key's typed JSON form, e.g.
//! `{"pk":{"S":"PROJ#1"},"sk":{"S":"PROJ#1"}}`. Callers must treat tokens as opaque and pass
//! them back unmodified; tokens coming from outside are untrusted and every decoding failure
//! is reported as [`Error::InvalidPaginationToken`].

use crate::{
    common::attribute::Item,
    error::{Error, Result},
};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

/// Encode a continuation key into a token; no key means there is no next page.
pub fn encode(key: Option<&Item>) -> Result<Option<String>> {
    let Some(key) = key.filter(|key| !key.is_empty()) else {
        return Ok(None);
    };
    let json = serde_json::to_vec(key)
        .map_err(|error| Error::Attribute(format!("continuation key is not encodable: {error}")))?;
    Ok(Some(BASE64.encode(json)))
}

/// Decode a token back into the continuation key it was made from.
pub fn decode(token: &str) -> Result<Item> {
    let json = BASE64.decode(token.trim()).map_err(invalid)?;
    let key: Item = serde_json::from_slice(&json).map_err(invalid)?;
    if key.is_empty() {
        return Err(Error::InvalidPaginationToken(
            "token holds an empty key".to_string(),
        ));
    }
    Ok(key)
}

/// Decode an optional token, as received from a list endpoint.
pub fn decode_optional(token: Option<&str>) -> Result<Option<Item>> {
    token
        .filter(|token| !token.is_empty())
        .map(decode)
        .transpose()
}

fn invalid(error: impl std::fmt::Display) -> Error {
    #[cfg(feature = "tracing")]
    tracing::debug!(%error, "rejecting pagination token");
    Error::InvalidPaginationToken(error.to_string())
}
