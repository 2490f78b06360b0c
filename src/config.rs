//! Table configuration.
//!
//! ```rust,no_run
//! use dynamodb_table::{Table, config::TableConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TableConfig::from_env()?;
//! let table = Table::from_config(&config).await;
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};

use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::Client;
use std::env;

/// Variable holding the table name.
pub const TABLE_NAME_VAR: &str = "TABLE_NAME";

/// Variable holding the region.
pub const REGION_VAR: &str = "AWS_REGION";

/// Variable holding an endpoint override, e.g. a local DynamoDB.
pub const ENDPOINT_URL_VAR: &str = "DYNAMODB_ENDPOINT_URL";

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Where the table lives.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableConfig {
    /// Name of the single table.
    pub table_name: String,
    /// AWS region of the table.
    pub region: String,
    /// Endpoint override; `None` uses the regional endpoint.
    pub endpoint_url: Option<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            table_name: String::new(),
            region: DEFAULT_REGION.to_string(),
            endpoint_url: None,
        }
    }
}

impl TableConfig {
    /// Configuration for `table_name` in the default region.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// `TABLE_NAME` is required; `AWS_REGION` falls back to `us-east-1`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let present = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let table_name = present(TABLE_NAME_VAR)
            .ok_or_else(|| Error::Configuration(format!("{TABLE_NAME_VAR} is not set")))?;
        Ok(Self {
            table_name,
            region: present(REGION_VAR).unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint_url: present(ENDPOINT_URL_VAR),
        })
    }

    /// Use `region` instead.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Send requests to `endpoint_url` instead of the regional endpoint.
    pub fn endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Build a client for the configured region and endpoint; credentials come from the
    /// default provider chain.
    pub async fn client(&self) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()));
        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        Client::new(&loader.load().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use std::collections;

    #[rstest]
    #[case::minimal(
        vec![(TABLE_NAME_VAR, "resources")],
        TableConfig::new("resources")
    )]
    #[case::full(
        vec![
            (TABLE_NAME_VAR, "resources"),
            (REGION_VAR, "eu-west-1"),
            (ENDPOINT_URL_VAR, "http://localhost:8000"),
        ],
        TableConfig::new("resources").region("eu-west-1").endpoint_url("http://localhost:8000")
    )]
    #[case::empty_region(
        vec![(TABLE_NAME_VAR, "resources"), (REGION_VAR, "")],
        TableConfig::new("resources")
    )]
    fn test_from_lookup(#[case] vars: Vec<(&str, &str)>, #[case] expected: TableConfig) {
        let vars: collections::HashMap<_, _> = vars.into_iter().collect();
        let actual =
            TableConfig::from_lookup(|name| vars.get(name).map(|value| value.to_string())).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_missing_table_name() {
        let error = TableConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(error, Error::Configuration(_)));
    }

    #[tokio::test]
    async fn test_client_uses_region() {
        let client = TableConfig::new("resources").region("eu-west-1").client().await;
        assert_eq!(
            client.config().region().map(|region| region.as_ref()),
            Some("eu-west-1")
        );
    }
}
