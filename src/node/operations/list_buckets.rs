use serde::Serialize;

use crate::error::Result;
use crate::node::Credentials;
use crate::node::context::ExecutionContext;
use crate::node::operations::{Operation, OperationResult};
use crate::storage::StorageClient;
use crate::storage::utils::url::bucket_url;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListBuckets;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    pub region: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListBucketsResult {
    pub buckets: Vec<BucketEntry>,
    pub count: usize,
}

impl Operation for ListBuckets {
    async fn execute<C, X>(
        &self,
        _ctx: &X,
        client: &C,
        _item_index: usize,
        credentials: &Credentials,
    ) -> Result<OperationResult>
    where
        C: StorageClient,
        X: ExecutionContext,
    {
        log::debug!("list_buckets region={}", credentials.region);
        let buckets: Vec<BucketEntry> = client
            .list_buckets()
            .await?
            .into_iter()
            .map(|bucket| BucketEntry {
                url: bucket_url(credentials, &bucket.name),
                name: bucket.name,
                creation_date: bucket.creation_date,
                region: credentials.region.clone(),
            })
            .collect();

        Ok(OperationResult::ListBuckets(ListBucketsResult {
            count: buckets.len(),
            buckets,
        }))
    }
}
