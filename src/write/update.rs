use crate::{
    client::StoreClient,
    common::{
        self,
        attribute::{self, Item},
        condition::{Condition, KeyCondition},
    },
    error::Result,
    write::common::{CREATED_AT, Expression, UPDATED_AT, WriteArgs, timestamp},
};

use aws_sdk_dynamodb::{operation, types};

/// The four update clauses, each a comma-joined list of actions.
#[derive(Clone, Debug, Default, PartialEq)]
struct Clauses {
    set: Option<String>,
    add: Option<String>,
    remove: Option<String>,
    delete: Option<String>,
}

impl Clauses {
    /// Render as `SET … ADD … REMOVE … DELETE …`, leaving out empty clauses.
    fn render(self) -> Option<String> {
        let rendered: Vec<_> = [
            ("SET", self.set),
            ("ADD", self.add),
            ("REMOVE", self.remove),
            ("DELETE", self.delete),
        ]
        .into_iter()
        .filter_map(|(verb, actions)| actions.map(|actions| format!("{verb} {actions}")))
        .collect();
        (!rendered.is_empty()).then(|| rendered.join(" "))
    }
}

fn push(expressions: &mut common::Accumulator, clause: &mut Option<String>, action: Expression) {
    let action = action.absorb_into(expressions);
    common::join_expression(clause, ", ", action);
}

/// Update item operation.
///
/// Unless [`Update::disable_timestamps`] is called, `createdAt` is set on the first write and
/// `updatedAt` on every write, both generated when the update executes.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::{Client, types::ReturnValue};
/// use dynamodb_table::{common::{attribute::Item, key::Keys}, write::update::Update};
///
/// # async fn example(client: Client) -> Result<(), Box<dyn std::error::Error>> {
/// let attributes = Update::new(client, "resources", Keys::entity("PROJ#1"))
///     .item(Item::from([("name".to_string(), "renamed".into())]))
///     .add("#version :one")
///     .names([("#version", "version")])
///     .values([(":one", 1)])
///     .condition("attribute_exists(pk)")?
///     .return_values(ReturnValue::AllNew)
///     .execute()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Update<C> {
    client: C,
    clauses: Clauses,
    expressions: common::Accumulator,
    key: Item,
    timestamps: bool,
    write: WriteArgs,
}

impl<C> Update<C> {
    /// Start an update of the item identified by `key`.
    pub fn new(client: C, table_name: impl Into<String>, key: impl Into<Item>) -> Self {
        Self {
            client,
            clauses: Clauses::default(),
            expressions: common::Accumulator::default(),
            key: key.into(),
            timestamps: true,
            write: WriteArgs::new(table_name),
        }
    }

    crate::expression_methods!(names, values);
    crate::write_methods!();

    /// Append a `SET` action, e.g. `#name = :name`.
    pub fn set(mut self, action: impl Into<Expression>) -> Self {
        push(&mut self.expressions, &mut self.clauses.set, action.into());
        self
    }

    /// Append an `ADD` action, e.g. `#count :one`.
    pub fn add(mut self, action: impl Into<Expression>) -> Self {
        push(&mut self.expressions, &mut self.clauses.add, action.into());
        self
    }

    /// Append a `REMOVE` action, e.g. `#draft`.
    pub fn remove(mut self, action: impl Into<Expression>) -> Self {
        push(&mut self.expressions, &mut self.clauses.remove, action.into());
        self
    }

    /// Append a `DELETE` action removing elements from a set, e.g. `#tags :tags`.
    pub fn delete(mut self, action: impl Into<Expression>) -> Self {
        push(&mut self.expressions, &mut self.clauses.delete, action.into());
        self
    }

    /// Set every attribute of `item`, one `#name = :name` action per attribute.
    ///
    /// Key attributes are skipped since the store rejects updates to them. Placeholders are
    /// sanitized and suffixed as for [`crate::read::query::Query::key`].
    pub fn item(mut self, item: impl Into<Item>) -> Self {
        let mut attributes: Vec<_> = item
            .into()
            .into_iter()
            .filter(|(name, _)| !self.key.contains_key(name))
            .collect();
        attributes.sort_by(|(left, _), (right, _)| left.cmp(right));
        for (name, value) in attributes {
            let key_condition = KeyCondition::new(name, Condition::Equals(value));
            let action = key_condition.render_in(&mut self.expressions, "");
            common::join_expression(&mut self.clauses.set, ", ", action);
        }
        self
    }

    /// Do not stamp `createdAt` and `updatedAt`.
    pub fn disable_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    /// Which image of the item is returned.
    pub fn return_values(mut self, return_values: types::ReturnValue) -> Self {
        self.write.return_values = Some(return_values);
        self
    }

    pub(crate) fn build(self, now: &str) -> Result<(C, operation::update_item::UpdateItemInput)> {
        let mut expressions = self.expressions;
        let mut clauses = self.clauses;
        if self.timestamps {
            let referenced = |name: &str| expressions.names.values().any(|value| value == name);
            let (created_at, updated_at) = (referenced(CREATED_AT), referenced(UPDATED_AT));
            if !created_at {
                let body = expressions.placeholder_body(CREATED_AT, "");
                let action = Expression::new(format!("#{body} = if_not_exists(#{body}, :{body})"))
                    .values([(format!(":{body}"), now)]);
                push(&mut expressions, &mut clauses.set, action);
            }
            if !updated_at {
                let body = expressions.placeholder_body(UPDATED_AT, "");
                let action = Expression::new(format!("#{body} = :{body}"))
                    .values([(format!(":{body}"), now)]);
                push(&mut expressions, &mut clauses.set, action);
            }
        }
        let write_operation = self.write.finish(expressions);
        let builder = operation::update_item::UpdateItemInput::builder()
            .set_key(Some(attribute::encode_item(self.key)))
            .set_update_expression(clauses.render());
        let input = crate::apply_write_operation!(builder, write_operation).build()?;
        Ok((self.client, input))
    }
}

impl<C: StoreClient> Update<C> {
    /// Execute the update, returning the attributes selected by `return_values`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_table.update",
            skip_all,
            fields(table = %self.write.table_name),
            err
        )
    )]
    pub async fn execute(self) -> Result<Option<Item>> {
        let (client, input) = self.build(&timestamp())?;
        let output = client.send_update_item(input).await?;
        output.attributes.map(attribute::decode_item).transpose()
    }
}
