use serde::Serialize;

use crate::error::{Error, Result};
use crate::node::Credentials;
use crate::node::context::ExecutionContext;
use crate::node::operations::{Operation, OperationResult, require};
use crate::storage::StorageClient;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteBucket;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBucketResult {
    pub deleted: bool,
    pub bucket_name: String,
    pub region: String,
}

impl Operation for DeleteBucket {
    async fn execute<C, X>(
        &self,
        ctx: &X,
        client: &C,
        item_index: usize,
        credentials: &Credentials,
    ) -> Result<OperationResult>
    where
        C: StorageClient,
        X: ExecutionContext,
    {
        let bucket_name = ctx.string_parameter("bucketName", item_index, &credentials.bucket)?;
        let bucket_name = require(bucket_name, "bucketName")?;

        log::debug!("delete_bucket bucket={bucket_name}");
        client
            .delete_bucket(&bucket_name)
            .await
            .map_err(|e| match e.code() {
                Some("BucketNotEmpty") => Error::BucketNotEmpty {
                    bucket: bucket_name.clone(),
                    source: e,
                },
                _ => Error::Storage { source: e },
            })?;

        Ok(OperationResult::DeleteBucket(DeleteBucketResult {
            deleted: true,
            bucket_name,
            region: credentials.region.clone(),
        }))
    }
}
