use serde::Serialize;

use crate::error::{InvalidParameterSnafu, Result};
use crate::node::Credentials;
use crate::node::context::ExecutionContext;
use crate::node::operations::{Operation, OperationResult, non_empty, require};
use crate::storage::constants::{LIST_DEFAULT_MAX_KEYS, LIST_MAX_KEYS_LIMIT};
use crate::storage::utils::url::object_url;
use crate::storage::{ListObjectsRequest, ObjectSummary, StorageClient};

/// Lists objects under a prefix, one page at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListObjects;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub key: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListObjectsResult {
    pub files: Vec<FileEntry>,
    /// Common prefixes rolled up by the delimiter.
    pub folders: Vec<String>,
    pub bucket: String,
    pub prefix: String,
    pub marker: String,
    pub next_marker: String,
    pub max_keys: u64,
    pub is_truncated: bool,
    pub count: usize,
}

impl FileEntry {
    fn new(summary: ObjectSummary, url: String) -> Self {
        Self {
            key: summary.key,
            size: summary.size,
            last_modified: summary.last_modified,
            etag: summary.etag,
            storage_class: summary.storage_class,
            owner: summary.owner,
            url,
        }
    }
}

impl Operation for ListObjects {
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
        let prefix = ctx.string_parameter("prefix", item_index, "")?;
        let max_keys = ctx.number_parameter("maxKeys", item_index, LIST_DEFAULT_MAX_KEYS as f64)?;
        let delimiter = ctx.string_parameter("delimiter", item_index, "")?;
        let marker = ctx.string_parameter("marker", item_index, "")?;
        let bucket = require(credentials.bucket.clone(), "bucket")?;

        if max_keys < 1.0 || max_keys > LIST_MAX_KEYS_LIMIT as f64 {
            return InvalidParameterSnafu {
                name: "maxKeys",
                reason: format!("must be between 1 and {LIST_MAX_KEYS_LIMIT}"),
            }
            .fail();
        }
        let max_keys = max_keys as u64;

        log::debug!(
            "list_objects bucket={bucket} prefix={prefix} delimiter={delimiter} marker={marker} max_keys={max_keys}"
        );
        let output = client
            .list_objects(ListObjectsRequest {
                bucket: bucket.clone(),
                prefix: non_empty(prefix.clone()),
                delimiter: non_empty(delimiter),
                marker: non_empty(marker.clone()),
                max_keys: max_keys as usize,
            })
            .await?;

        let files: Vec<FileEntry> = output
            .objects
            .into_iter()
            .map(|summary| {
                let url = object_url(credentials, &bucket, &summary.key);
                FileEntry::new(summary, url)
            })
            .collect();
        let count = files.len();

        Ok(OperationResult::ListObjects(ListObjectsResult {
            files,
            folders: output.common_prefixes,
            bucket,
            prefix,
            marker: output.marker.unwrap_or(marker),
            next_marker: output.next_marker.unwrap_or_default(),
            max_keys,
            is_truncated: output.is_truncated,
            count,
        }))
    }
}
