//! The seam between request builders and the store.
//!
//! Builders assemble SDK input values and hand them to a [`StoreClient`]. The production
//! implementation forwards to [`aws_sdk_dynamodb::Client`]; retries, timeouts and connection
//! handling are whatever that client is configured with.

use async_trait::async_trait;
use aws_sdk_dynamodb::{Client, Error, operation};

/// Sends finished requests to the store.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Send a GetItem request.
    async fn send_get_item(
        &self,
        input: operation::get_item::GetItemInput,
    ) -> Result<operation::get_item::GetItemOutput, Error>;

    /// Send a BatchGetItem request.
    async fn send_batch_get_item(
        &self,
        input: operation::batch_get_item::BatchGetItemInput,
    ) -> Result<operation::batch_get_item::BatchGetItemOutput, Error>;

    /// Send a Query request.
    async fn send_query(
        &self,
        input: operation::query::QueryInput,
    ) -> Result<operation::query::QueryOutput, Error>;

    /// Send a Scan request.
    async fn send_scan(
        &self,
        input: operation::scan::ScanInput,
    ) -> Result<operation::scan::ScanOutput, Error>;

    /// Send an UpdateItem request.
    async fn send_update_item(
        &self,
        input: operation::update_item::UpdateItemInput,
    ) -> Result<operation::update_item::UpdateItemOutput, Error>;

    /// Send a DeleteItem request.
    async fn send_delete_item(
        &self,
        input: operation::delete_item::DeleteItemInput,
    ) -> Result<operation::delete_item::DeleteItemOutput, Error>;

    /// Send a BatchWriteItem request.
    async fn send_batch_write_item(
        &self,
        input: operation::batch_write_item::BatchWriteItemInput,
    ) -> Result<operation::batch_write_item::BatchWriteItemOutput, Error>;

    /// Send a TransactWriteItems request.
    async fn send_transact_write_items(
        &self,
        input: operation::transact_write_items::TransactWriteItemsInput,
    ) -> Result<operation::transact_write_items::TransactWriteItemsOutput, Error>;
}

#[async_trait]
impl StoreClient for Client {
    async fn send_get_item(
        &self,
        input: operation::get_item::GetItemInput,
    ) -> Result<operation::get_item::GetItemOutput, Error> {
        let output = self
            .get_item()
            .set_table_name(input.table_name)
            .set_key(input.key)
            .set_consistent_read(input.consistent_read)
            .set_projection_expression(input.projection_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_return_consumed_capacity(input.return_consumed_capacity)
            .send()
            .await?;
        Ok(output)
    }

    async fn send_batch_get_item(
        &self,
        input: operation::batch_get_item::BatchGetItemInput,
    ) -> Result<operation::batch_get_item::BatchGetItemOutput, Error> {
        let output = self
            .batch_get_item()
            .set_request_items(input.request_items)
            .set_return_consumed_capacity(input.return_consumed_capacity)
            .send()
            .await?;
        Ok(output)
    }

    async fn send_query(
        &self,
        input: operation::query::QueryInput,
    ) -> Result<operation::query::QueryOutput, Error> {
        let output = self
            .query()
            .set_table_name(input.table_name)
            .set_index_name(input.index_name)
            .set_key_condition_expression(input.key_condition_expression)
            .set_filter_expression(input.filter_expression)
            .set_projection_expression(input.projection_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_exclusive_start_key(input.exclusive_start_key)
            .set_select(input.select)
            .set_limit(input.limit)
            .set_scan_index_forward(input.scan_index_forward)
            .set_consistent_read(input.consistent_read)
            .set_return_consumed_capacity(input.return_consumed_capacity)
            .send()
            .await?;
        Ok(output)
    }

    async fn send_scan(
        &self,
        input: operation::scan::ScanInput,
    ) -> Result<operation::scan::ScanOutput, Error> {
        let output = self
            .scan()
            .set_table_name(input.table_name)
            .set_index_name(input.index_name)
            .set_filter_expression(input.filter_expression)
            .set_projection_expression(input.projection_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_exclusive_start_key(input.exclusive_start_key)
            .set_select(input.select)
            .set_limit(input.limit)
            .set_segment(input.segment)
            .set_total_segments(input.total_segments)
            .set_consistent_read(input.consistent_read)
            .set_return_consumed_capacity(input.return_consumed_capacity)
            .send()
            .await?;
        Ok(output)
    }

    async fn send_update_item(
        &self,
        input: operation::update_item::UpdateItemInput,
    ) -> Result<operation::update_item::UpdateItemOutput, Error> {
        let output = self
            .update_item()
            .set_table_name(input.table_name)
            .set_key(input.key)
            .set_update_expression(input.update_expression)
            .set_condition_expression(input.condition_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_return_values(input.return_values)
            .set_return_consumed_capacity(input.return_consumed_capacity)
            .set_return_item_collection_metrics(input.return_item_collection_metrics)
            .set_return_values_on_condition_check_failure(
                input.return_values_on_condition_check_failure,
            )
            .send()
            .await?;
        Ok(output)
    }

    async fn send_delete_item(
        &self,
        input: operation::delete_item::DeleteItemInput,
    ) -> Result<operation::delete_item::DeleteItemOutput, Error> {
        let output = self
            .delete_item()
            .set_table_name(input.table_name)
            .set_key(input.key)
            .set_condition_expression(input.condition_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_return_values(input.return_values)
            .set_return_consumed_capacity(input.return_consumed_capacity)
            .set_return_item_collection_metrics(input.return_item_collection_metrics)
            .set_return_values_on_condition_check_failure(
                input.return_values_on_condition_check_failure,
            )
            .send()
            .await?;
        Ok(output)
    }

    async fn send_batch_write_item(
        &self,
        input: operation::batch_write_item::BatchWriteItemInput,
    ) -> Result<operation::batch_write_item::BatchWriteItemOutput, Error> {
        let output = self
            .batch_write_item()
            .set_request_items(input.request_items)
            .set_return_consumed_capacity(input.return_consumed_capacity)
            .set_return_item_collection_metrics(input.return_item_collection_metrics)
            .send()
            .await?;
        Ok(output)
    }

    async fn send_transact_write_items(
        &self,
        input: operation::transact_write_items::TransactWriteItemsInput,
    ) -> Result<operation::transact_write_items::TransactWriteItemsOutput, Error> {
        let output = self
            .transact_write_items()
            .set_transact_items(input.transact_items)
            .set_return_consumed_capacity(input.return_consumed_capacity)
            .set_return_item_collection_metrics(input.return_item_collection_metrics)
            .set_client_request_token(input.client_request_token)
            .send()
            .await?;
        Ok(output)
    }
}
