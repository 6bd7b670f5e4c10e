use serde::Serialize;

use crate::error::Result;
use crate::node::Credentials;
use crate::node::context::ExecutionContext;
use crate::node::operations::{MetadataSummary, Operation, OperationResult, access_url, require};
use crate::storage::StorageClient;

/// Checks whether an object exists and reports its metadata.
///
/// A missing object is a normal result (`exists: false`), not a failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadObject;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadObjectResult {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub path: String,
    pub bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Operation for HeadObject {
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

        log::debug!("head_object bucket={bucket} path={file_path}");
        let result = match client.head_object(&bucket, &file_path).await {
            Ok(meta) => HeadObjectResult {
                exists: true,
                url: Some(access_url(client, credentials, &bucket, &file_path).await),
                path: file_path,
                bucket,
                metadata: Some(meta.into()),
                error: None,
            },
            Err(e) if e.is_not_found() => {
                let error = if e.message.is_empty() {
                    "Object not found".to_string()
                } else {
                    e.message
                };
                HeadObjectResult {
                    exists: false,
                    url: None,
                    path: file_path,
                    bucket,
                    metadata: None,
                    error: Some(error),
                }
            }
            Err(e) => return Err(e.into()),
        };

        Ok(OperationResult::HeadObject(result))
    }
}
