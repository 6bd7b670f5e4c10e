use serde::Serialize;

use crate::error::{Error, Result};
use crate::node::Credentials;
use crate::node::context::{BinaryData, ExecutionContext};
use crate::node::operations::{MetadataSummary, Operation, OperationResult, access_url, require};
use crate::storage::constants::{DEFAULT_DOWNLOAD_NAME, DEFAULT_MIME_TYPE};
use crate::storage::utils::path::basename;
use crate::storage::{StorageClient, StorageError};

/// Downloads an object, either as metadata plus URL or with its content attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetObject;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadInfo {
    pub downloaded: bool,
    pub url: String,
    pub path: String,
    pub bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub metadata: MetadataSummary,
}

/// A download result. The binary form always carries both the metadata and
/// the named payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetObjectResult {
    Metadata(DownloadInfo),
    WithBinary {
        info: DownloadInfo,
        property: String,
        binary: BinaryData,
    },
}

fn download_failure(error: StorageError, bucket: &str, path: &str) -> Error {
    let bucket = bucket.to_string();
    let path = path.to_string();
    match error.code() {
        Some("NoSuchBucket") => Error::BucketNotFound {
            bucket,
            path,
            source: error,
        },
        Some("AccessDenied") => Error::ObjectAccessDenied {
            bucket,
            path,
            source: error,
        },
        _ if error.status == Some(403) => Error::ObjectAccessDenied {
            bucket,
            path,
            source: error,
        },
        _ if error.is_not_found() => Error::ObjectNotFound {
            bucket,
            path,
            source: error,
        },
        _ => Error::Storage { source: error },
    }
}

impl Operation for GetObject {
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
        let return_binary = ctx.bool_parameter("returnBinary", item_index, false)?;

        let file_path = require(file_path, "filePath")?;
        let bucket = require(credentials.bucket.clone(), "bucket")?;

        log::debug!("get_object bucket={bucket} path={file_path} return_binary={return_binary}");
        let object = client
            .get_object(&bucket, &file_path)
            .await
            .map_err(|e| download_failure(e, &bucket, &file_path))?;

        let url = access_url(client, credentials, &bucket, &file_path).await;
        let content_length = object.metadata.content_length;
        let mime_type = object
            .metadata
            .content_type
            .clone()
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
        let metadata = MetadataSummary::from(object.metadata);

        let result = if return_binary {
            let file_name = basename(&file_path)
                .unwrap_or(DEFAULT_DOWNLOAD_NAME)
                .to_string();
            let binary = BinaryData::from_bytes(&object.body, mime_type.clone(), Some(file_name.clone()));
            GetObjectResult::WithBinary {
                info: DownloadInfo {
                    downloaded: true,
                    url,
                    path: file_path,
                    bucket,
                    size: Some(object.body.len() as u64),
                    mime_type: Some(mime_type),
                    file_name: Some(file_name.clone()),
                    metadata,
                },
                property: file_name,
                binary,
            }
        } else {
            GetObjectResult::Metadata(DownloadInfo {
                downloaded: true,
                url,
                path: file_path,
                bucket,
                size: content_length,
                mime_type: None,
                file_name: None,
                metadata,
            })
        };

        Ok(OperationResult::GetObject(result))
    }
}
