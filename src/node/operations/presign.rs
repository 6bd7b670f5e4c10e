use serde::Serialize;

use crate::error::{InvalidParameterSnafu, Result};
use crate::node::Credentials;
use crate::node::context::ExecutionContext;
use crate::node::operations::{Operation, OperationResult, non_empty, require};
use crate::storage::constants::{PRESIGN_DEFAULT_EXPIRES, PRESIGN_MAX_EXPIRES, PRESIGN_MIN_EXPIRES};
use crate::storage::{HttpMethod, PresignRequest, StorageClient};

/// Generates a pre-signed URL for reading or writing an object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreSignUrl;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreSignUrlResult {
    pub file_path: String,
    pub bucket: String,
    pub method: String,
    pub expires: u64,
    pub pre_signed_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_disposition: Option<String>,
}

impl Operation for PreSignUrl {
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
        let file_path = ctx.string_parameter("filePath", item_index, "")?;
        let bucket = ctx.string_parameter("bucket", item_index, "")?;
        let method = ctx.string_parameter("method", item_index, HttpMethod::Get.as_str())?;
        let expires = ctx.number_parameter("expires", item_index, PRESIGN_DEFAULT_EXPIRES as f64)?;
        let version_id = ctx.string_parameter("versionId", item_index, "")?;
        let content_type = ctx.string_parameter("contentType", item_index, "")?;
        let content_disposition = ctx.string_parameter("contentDisposition", item_index, "")?;

        let file_path = require(file_path, "filePath")?;
        if expires < PRESIGN_MIN_EXPIRES as f64 || expires > PRESIGN_MAX_EXPIRES as f64 {
            return InvalidParameterSnafu {
                name: "expires",
                reason: format!(
                    "must be between {PRESIGN_MIN_EXPIRES} and {PRESIGN_MAX_EXPIRES} seconds, got {expires}"
                ),
            }
            .fail();
        }
        let expires = expires as u64;
        let Ok(method) = method.parse::<HttpMethod>() else {
            return InvalidParameterSnafu {
                name: "method",
                reason: format!("expected GET or PUT, got '{method}'"),
            }
            .fail();
        };
        let bucket = match non_empty(bucket) {
            Some(bucket) => bucket,
            None => require(credentials.bucket.clone(), "bucket")?,
        };

        let version_id = non_empty(version_id);
        let content_type = non_empty(content_type);
        let content_disposition = non_empty(content_disposition);

        log::debug!(
            "presign bucket={bucket} path={file_path} method={} expires={expires}",
            method.as_str()
        );
        let pre_signed_url = client
            .presign(PresignRequest {
                bucket: bucket.clone(),
                key: file_path.clone(),
                method,
                expires,
                version_id: version_id.clone(),
                response_content_type: content_type.clone(),
                response_content_disposition: content_disposition.clone(),
            })
            .await?;

        Ok(OperationResult::PreSignUrl(PreSignUrlResult {
            file_path,
            bucket,
            method: method.as_str().to_string(),
            expires,
            pre_signed_url,
            version_id,
            content_type,
            content_disposition,
        }))
    }
}
