// Per-batch dispatch loop
use snafu::OptionExt;

use crate::error::{Error, NoCredentialsSnafu, Result};
use crate::node::Credentials;
use crate::node::classifier::{self, ErrorContext};
use crate::node::context::{ExecutionContext, OutputItem};
use crate::node::registry::OperationRegistry;
use crate::storage::StorageClient;

/// Parameter naming the operation to run for an item.
pub const OPERATION_PARAMETER: &str = "operation";
/// Operation used when an item does not name one.
pub const DEFAULT_OPERATION: &str = "checkExistence";

/// Runs one batch of items through the registry against a storage client.
///
/// Items are processed strictly in order, one storage call in flight at a time.
#[derive(Debug)]
pub struct Dispatcher<'a, C> {
    registry: &'a OperationRegistry,
    client: &'a C,
}

impl<'a, C: StorageClient> Dispatcher<'a, C> {
    pub fn new(registry: &'a OperationRegistry, client: &'a C) -> Self {
        Self { registry, client }
    }

    /// Execute every item of `ctx`, returning one output per input item.
    ///
    /// Without credentials the batch fails before any item runs. A failing item
    /// either becomes a continue-on-failure record in its slot, or aborts the
    /// batch with a classified error carrying its index.
    pub async fn run<X: ExecutionContext>(
        &self,
        ctx: &X,
        credentials: Option<&Credentials>,
    ) -> Result<Vec<OutputItem>> {
        let credentials = credentials.context(NoCredentialsSnafu)?;
        let total = ctx.item_count();
        let mut outputs = Vec::with_capacity(total);
        let mut failed = 0usize;

        for item_index in 0..total {
            let (operation, outcome) =
                match ctx.string_parameter(OPERATION_PARAMETER, item_index, DEFAULT_OPERATION) {
                    Ok(operation) => {
                        log::debug!("dispatch item={item_index} operation={operation}");
                        let outcome = self.execute(ctx, &operation, item_index, credentials).await;
                        (operation, outcome)
                    }
                    Err(e) => (String::new(), Err(e)),
                };

            match outcome {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    failed += 1;
                    outputs.push(self.fail(ctx, e, &operation, item_index, credentials)?);
                }
            }
        }

        log::info!(
            "batch finished: {} items, {} succeeded, {failed} recorded as failures",
            total,
            total - failed
        );
        Ok(outputs)
    }

    async fn execute<X: ExecutionContext>(
        &self,
        ctx: &X,
        operation: &str,
        item_index: usize,
        credentials: &Credentials,
    ) -> Result<OutputItem> {
        let handler = self.registry.lookup(operation)?;
        handler
            .execute(ctx, self.client, item_index, credentials)
            .await?
            .into_output(item_index)
    }

    /// Route a failed item: record it and carry on, or classify and abort.
    fn fail<X: ExecutionContext>(
        &self,
        ctx: &X,
        error: Error,
        operation: &str,
        item_index: usize,
        credentials: &Credentials,
    ) -> Result<OutputItem> {
        if ctx.continue_on_fail() {
            let record = classifier::continue_on_fail_record(&error, operation, item_index);
            log::warn!(
                "item {item_index} failed, continuing: operation={operation} error={}",
                record.error
            );
            return Ok(OutputItem::new(serde_json::to_value(record)?, item_index));
        }

        let context = ErrorContext::from_parameters(ctx, item_index);
        let classified = classifier::classify(&error, operation, &context, Some(credentials));
        log::debug!(
            "item {item_index} failed, aborting batch: category={:?}",
            classified.category
        );
        Err(classifier::escalate(error, Some(classified), item_index))
    }
}
