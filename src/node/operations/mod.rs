// Node operations: one handler per storage action behind a shared contract
pub mod copy_object;
pub mod create_bucket;
pub mod delete_bucket;
pub mod delete_object;
pub mod get_object;
pub mod head_object;
pub mod list_buckets;
pub mod list_objects;
pub mod presign;
pub mod put_object;

pub use copy_object::{CopyObject, CopyObjectResult};
pub use create_bucket::{CreateBucket, CreateBucketResult};
pub use delete_bucket::{DeleteBucket, DeleteBucketResult};
pub use delete_object::{DeleteObject, DeleteObjectResult};
pub use get_object::{DownloadInfo, GetObject, GetObjectResult};
pub use head_object::{HeadObject, HeadObjectResult};
pub use list_buckets::{ListBuckets, ListBucketsResult};
pub use list_objects::{ListObjects, ListObjectsResult};
pub use presign::{PreSignUrl, PreSignUrlResult};
pub use put_object::{PutObject, PutObjectResult};

use serde::Serialize;
use snafu::ensure;

use crate::error::{MissingParameterSnafu, Result};
use crate::node::Credentials;
use crate::node::context::{ExecutionContext, OutputItem};
use crate::storage::constants::ACCESS_URL_EXPIRES;
use crate::storage::utils::url::object_url;
use crate::storage::{HttpMethod, ObjectMetadata, PresignRequest, StorageClient};

/// The contract every storage action implements.
pub trait Operation {
    /// Run the action for one item, reading its parameters from `ctx`.
    ///
    /// # Arguments
    /// * `ctx` - Host surface for parameters and binary payloads
    /// * `client` - Storage capability the action calls into
    /// * `item_index` - Index of the item being processed
    /// * `credentials` - Batch credentials, read-only
    ///
    /// # Returns
    /// * `Result<OperationResult>` - Normalized result or the failure to classify
    async fn execute<C, X>(
        &self,
        ctx: &X,
        client: &C,
        item_index: usize,
        credentials: &Credentials,
    ) -> Result<OperationResult>
    where
        C: StorageClient,
        X: ExecutionContext;
}

/// Closed set of handlers, one variant per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    HeadObject(HeadObject),
    PutObject(PutObject),
    GetObject(GetObject),
    DeleteObject(DeleteObject),
    ListObjects(ListObjects),
    CopyObject(CopyObject),
    CreateBucket(CreateBucket),
    DeleteBucket(DeleteBucket),
    ListBuckets(ListBuckets),
    PreSignUrl(PreSignUrl),
}

impl Handler {
    pub const ALL: [Handler; 10] = [
        Handler::HeadObject(HeadObject),
        Handler::PutObject(PutObject),
        Handler::GetObject(GetObject),
        Handler::DeleteObject(DeleteObject),
        Handler::ListObjects(ListObjects),
        Handler::CopyObject(CopyObject),
        Handler::CreateBucket(CreateBucket),
        Handler::DeleteBucket(DeleteBucket),
        Handler::ListBuckets(ListBuckets),
        Handler::PreSignUrl(PreSignUrl),
    ];

    /// Canonical operation code the host selects this handler with.
    pub fn code(&self) -> &'static str {
        match self {
            Handler::HeadObject(_) => "checkExistence",
            Handler::PutObject(_) => "uploadFile",
            Handler::GetObject(_) => "downloadFile",
            Handler::DeleteObject(_) => "deleteFile",
            Handler::ListObjects(_) => "listFiles",
            Handler::CopyObject(_) => "copyFile",
            Handler::CreateBucket(_) => "createBucket",
            Handler::DeleteBucket(_) => "deleteBucket",
            Handler::ListBuckets(_) => "listBuckets",
            Handler::PreSignUrl(_) => "getPreSignedUrl",
        }
    }

    pub async fn execute<C, X>(
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
        match self {
            Handler::HeadObject(op) => op.execute(ctx, client, item_index, credentials).await,
            Handler::PutObject(op) => op.execute(ctx, client, item_index, credentials).await,
            Handler::GetObject(op) => op.execute(ctx, client, item_index, credentials).await,
            Handler::DeleteObject(op) => op.execute(ctx, client, item_index, credentials).await,
            Handler::ListObjects(op) => op.execute(ctx, client, item_index, credentials).await,
            Handler::CopyObject(op) => op.execute(ctx, client, item_index, credentials).await,
            Handler::CreateBucket(op) => op.execute(ctx, client, item_index, credentials).await,
            Handler::DeleteBucket(op) => op.execute(ctx, client, item_index, credentials).await,
            Handler::ListBuckets(op) => op.execute(ctx, client, item_index, credentials).await,
            Handler::PreSignUrl(op) => op.execute(ctx, client, item_index, credentials).await,
        }
    }
}

/// Result of one operation; exactly one shape per operation kind.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    HeadObject(HeadObjectResult),
    PutObject(PutObjectResult),
    GetObject(GetObjectResult),
    DeleteObject(DeleteObjectResult),
    ListObjects(ListObjectsResult),
    CopyObject(CopyObjectResult),
    CreateBucket(CreateBucketResult),
    DeleteBucket(DeleteBucketResult),
    ListBuckets(ListBucketsResult),
    PreSignUrl(PreSignUrlResult),
}

impl OperationResult {
    /// Wrap the result as the host's output record for `item_index`.
    pub fn into_output(self, item_index: usize) -> Result<OutputItem> {
        let json = match self {
            OperationResult::GetObject(GetObjectResult::WithBinary {
                info,
                property,
                binary,
            }) => {
                return Ok(OutputItem::new(serde_json::to_value(info)?, item_index)
                    .with_binary(property, binary));
            }
            OperationResult::GetObject(GetObjectResult::Metadata(info)) => {
                serde_json::to_value(info)?
            }
            OperationResult::HeadObject(r) => serde_json::to_value(r)?,
            OperationResult::PutObject(r) => serde_json::to_value(r)?,
            OperationResult::DeleteObject(r) => serde_json::to_value(r)?,
            OperationResult::ListObjects(r) => serde_json::to_value(r)?,
            OperationResult::CopyObject(r) => serde_json::to_value(r)?,
            OperationResult::CreateBucket(r) => serde_json::to_value(r)?,
            OperationResult::DeleteBucket(r) => serde_json::to_value(r)?,
            OperationResult::ListBuckets(r) => serde_json::to_value(r)?,
            OperationResult::PreSignUrl(r) => serde_json::to_value(r)?,
        };
        Ok(OutputItem::new(json, item_index))
    }
}

/// Storage-side metadata passed through to results as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

impl From<ObjectMetadata> for MetadataSummary {
    fn from(meta: ObjectMetadata) -> Self {
        Self {
            content_length: meta.content_length,
            content_type: meta.content_type,
            etag: meta.etag,
            last_modified: meta.last_modified,
            storage_class: meta.storage_class,
            version_id: meta.version_id,
        }
    }
}

/// Fail with a missing-parameter error when `value` is empty.
pub(crate) fn require(value: String, name: &str) -> Result<String> {
    ensure!(!value.is_empty(), MissingParameterSnafu { name });
    Ok(value)
}

/// Empty strings mean "not set".
pub(crate) fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Access URL for an object: a time-limited pre-signed GET when the client can
/// sign, the deterministic template otherwise.
pub(crate) async fn access_url<C: StorageClient>(
    client: &C,
    credentials: &Credentials,
    bucket: &str,
    key: &str,
) -> String {
    let request = PresignRequest {
        bucket: bucket.to_string(),
        key: key.to_string(),
        method: HttpMethod::Get,
        expires: ACCESS_URL_EXPIRES,
        version_id: None,
        response_content_type: None,
        response_content_disposition: None,
    };
    match client.presign(request).await {
        Ok(url) => url,
        Err(e) => {
            log::debug!("presign unavailable bucket={bucket} key={key}: {e}; using template url");
            object_url(credentials, bucket, key)
        }
    }
}
