use serde::Serialize;
use snafu::{OptionExt, ResultExt};

use crate::error::{InvalidBinaryDataSnafu, MissingBinaryDataSnafu, Result};
use crate::node::Credentials;
use crate::node::context::ExecutionContext;
use crate::node::operations::{Operation, OperationResult, access_url, require};
use crate::storage::constants::DEFAULT_BINARY_PROPERTY;
use crate::storage::{Acl, PutObjectRequest, StorageClient};
use crate::wrap_err;

/// Uploads the item's binary payload, optionally making it public-read.
///
/// The body write and the ACL write are two independent calls: a failed ACL
/// write leaves the object in place and surfaces as `AclUpdateFailed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutObject;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PutObjectResult {
    pub uploaded: bool,
    pub url: String,
    pub path: String,
    pub bucket: String,
    pub size: usize,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    pub is_public: bool,
}

impl Operation for PutObject {
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
        let binary_property =
            ctx.string_parameter("binaryProperty", item_index, DEFAULT_BINARY_PROPERTY)?;
        let make_public = ctx.bool_parameter("makePublic", item_index, false)?;

        let file_path = require(file_path, "filePath")?;
        let bucket = require(credentials.bucket.clone(), "bucket")?;

        let binary = ctx
            .binary(item_index, &binary_property)
            .context(MissingBinaryDataSnafu {
                property: binary_property.as_str(),
            })?;
        let body = binary.decode().context(InvalidBinaryDataSnafu {
            property: binary_property.as_str(),
        })?;
        let size = body.len();
        let mime_type = binary.mime_type.clone();

        log::debug!(
            "put_object bucket={bucket} path={file_path} size={size} make_public={make_public}"
        );
        let output = client
            .put_object(PutObjectRequest {
                bucket: bucket.clone(),
                key: file_path.clone(),
                body,
                content_type: Some(mime_type.clone()),
            })
            .await?;

        if make_public {
            wrap_err!(
                client
                    .put_object_acl(&bucket, &file_path, Acl::PublicRead)
                    .await,
                AclUpdateFailed {
                    bucket: bucket.clone(),
                    path: file_path.clone()
                }
            )?;
        }

        let url = access_url(client, credentials, &bucket, &file_path).await;

        Ok(OperationResult::PutObject(PutObjectResult {
            uploaded: true,
            url,
            path: file_path,
            bucket,
            size,
            mime_type,
            etag: output.etag,
            version_id: output.version_id,
            is_public: make_public,
        }))
    }
}
