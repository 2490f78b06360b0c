use crate::{
    client::StoreClient,
    common::{
        self,
        attribute::{self, Item},
    },
    error::{Result, UsageError},
    write::common::WriteArgs,
};

use aws_sdk_dynamodb::{operation, types};

/// Delete item operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::{Client, types::ReturnValue};
/// use dynamodb_table::{common::key::Keys, write::delete::Delete};
///
/// # async fn example(client: Client) -> Result<(), Box<dyn std::error::Error>> {
/// let deleted = Delete::new(client, "resources", Keys::entity("PROJ#1"))
///     .condition("attribute_exists(pk)")?
///     .return_values(ReturnValue::AllOld)?
///     .execute()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Delete<C> {
    client: C,
    expressions: common::Accumulator,
    key: Item,
    write: WriteArgs,
}

impl<C> Delete<C> {
    /// Start a delete of the item identified by `key`.
    pub fn new(client: C, table_name: impl Into<String>, key: impl Into<Item>) -> Self {
        Self {
            client,
            expressions: common::Accumulator::default(),
            key: key.into(),
            write: WriteArgs::new(table_name),
        }
    }

    crate::expression_methods!(names, values);
    crate::write_methods!();

    /// Whether the deleted item is returned; only `None` and `AllOld` are accepted.
    pub fn return_values(mut self, return_values: types::ReturnValue) -> Result<Self> {
        match return_values {
            types::ReturnValue::None | types::ReturnValue::AllOld => {
                self.write.return_values = Some(return_values);
                Ok(self)
            }
            other => Err(UsageError::InvalidReturnValues {
                operation: "delete",
                return_values: other.as_str().to_string(),
            }
            .into()),
        }
    }

    pub(crate) fn build(self) -> Result<(C, operation::delete_item::DeleteItemInput)> {
        let write_operation = self.write.finish(self.expressions);
        let builder = operation::delete_item::DeleteItemInput::builder()
            .set_key(Some(attribute::encode_item(self.key)));
        let input = crate::apply_write_operation!(builder, write_operation).build()?;
        Ok((self.client, input))
    }
}

impl<C: StoreClient> Delete<C> {
    /// Execute the delete, returning the prior image when `AllOld` was requested.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_table.delete",
            skip_all,
            fields(table = %self.write.table_name),
            err
        )
    )]
    pub async fn execute(self) -> Result<Option<Item>> {
        let (client, input) = self.build()?;
        let output = client.send_delete_item(input).await?;
        output.attributes.map(attribute::decode_item).transpose()
    }
}
