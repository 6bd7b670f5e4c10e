use serde::Serialize;

use crate::error::{InvalidParameterSnafu, Result};
use crate::node::Credentials;
use crate::node::context::ExecutionContext;
use crate::node::operations::{Operation, OperationResult, access_url, require};
use crate::storage::{CopyObjectRequest, MetadataDirective, StorageClient};

/// Copies an object, possibly across buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyObject;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyObjectResult {
    pub copied: bool,
    pub source: ObjectLocation,
    pub destination: ObjectLocation,
    pub metadata_directive: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

impl Operation for CopyObject {
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
        let source_bucket = ctx.string_parameter("sourceBucket", item_index, &credentials.bucket)?;
        let source_key = ctx.string_parameter("sourceKey", item_index, "")?;
        let destination_bucket =
            ctx.string_parameter("destinationBucket", item_index, &credentials.bucket)?;
        let destination_key = ctx.string_parameter("destinationKey", item_index, "")?;
        let directive = ctx.string_parameter("metadataDirective", item_index, "COPY")?;

        let source_key = require(source_key, "sourceKey")?;
        let destination_key = require(destination_key, "destinationKey")?;
        let source_bucket = require(source_bucket, "sourceBucket")?;
        let destination_bucket = require(destination_bucket, "destinationBucket")?;
        let Ok(metadata_directive) = directive.parse::<MetadataDirective>() else {
            return InvalidParameterSnafu {
                name: "metadataDirective",
                reason: format!("expected COPY or REPLACE, got '{directive}'"),
            }
            .fail();
        };

        log::debug!(
            "copy_object src={source_bucket}/{source_key} dest={destination_bucket}/{destination_key} directive={}",
            metadata_directive.as_str()
        );
        let output = client
            .copy_object(CopyObjectRequest {
                src_bucket: source_bucket.clone(),
                src_key: source_key.clone(),
                bucket: destination_bucket.clone(),
                key: destination_key.clone(),
                metadata_directive,
            })
            .await?;

        let destination_url =
            access_url(client, credentials, &destination_bucket, &destination_key).await;
        let source_url = access_url(client, credentials, &source_bucket, &source_key).await;

        Ok(OperationResult::CopyObject(CopyObjectResult {
            copied: true,
            source: ObjectLocation {
                bucket: source_bucket,
                key: source_key,
                url: source_url,
            },
            destination: ObjectLocation {
                bucket: destination_bucket,
                key: destination_key,
                url: destination_url,
            },
            metadata_directive: metadata_directive.as_str().to_string(),
            etag: output.etag,
            last_modified: output.last_modified,
            version_id: output.version_id,
        }))
    }
}
