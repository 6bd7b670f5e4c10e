use serde::Serialize;

use crate::error::Result;
use crate::node::Credentials;
use crate::node::context::ExecutionContext;
use crate::node::operations::{Operation, OperationResult, require};
use crate::storage::StorageClient;

/// Deletes a single object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteObject;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteObjectResult {
    pub deleted: bool,
    pub path: String,
    pub bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    /// The delete left a tombstone (versioned bucket) rather than removing data.
    pub delete_marker: bool,
}

impl Operation for DeleteObject {
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
        let file_path = require(ctx.string_parameter("filePath", item_index, "")?, "filePath")?;
        let bucket = require(credentials.bucket.clone(), "bucket")?;

        log::debug!("delete_object bucket={bucket} path={file_path}");
        let output = client.delete_object(&bucket, &file_path).await?;

        Ok(OperationResult::DeleteObject(DeleteObjectResult {
            deleted: true,
            path: file_path,
            bucket,
            version_id: output.version_id,
            delete_marker: output.delete_marker,
        }))
    }
}
