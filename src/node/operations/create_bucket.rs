use serde::Serialize;

use crate::error::{InvalidParameterSnafu, Result};
use crate::node::Credentials;
use crate::node::context::ExecutionContext;
use crate::node::operations::{Operation, OperationResult, require};
use crate::storage::utils::url::bucket_url;
use crate::storage::{Acl, CreateBucketRequest, StorageClass, StorageClient};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateBucket;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBucketResult {
    pub created: bool,
    pub bucket_name: String,
    pub region: String,
    pub acl: String,
    pub storage_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub url: String,
}

impl Operation for CreateBucket {
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
        let bucket_name = ctx.string_parameter("bucketName", item_index, "")?;
        let acl = ctx.string_parameter("acl", item_index, Acl::Private.as_str())?;
        let storage_class =
            ctx.string_parameter("storageClass", item_index, StorageClass::Standard.as_str())?;

        let bucket_name = require(bucket_name, "bucketName")?;
        let Ok(parsed_acl) = acl.parse::<Acl>() else {
            return InvalidParameterSnafu {
                name: "acl",
                reason: format!("unknown ACL '{acl}'"),
            }
            .fail();
        };
        let Ok(parsed_class) = storage_class.parse::<StorageClass>() else {
            return InvalidParameterSnafu {
                name: "storageClass",
                reason: format!("unknown storage class '{storage_class}'"),
            }
            .fail();
        };

        log::debug!("create_bucket bucket={bucket_name} acl={acl} storage_class={storage_class}");
        let output = client
            .create_bucket(CreateBucketRequest {
                bucket: bucket_name.clone(),
                acl: (parsed_acl != Acl::default()).then_some(parsed_acl),
                storage_class: (parsed_class != StorageClass::default()).then_some(parsed_class),
            })
            .await?;

        Ok(OperationResult::CreateBucket(CreateBucketResult {
            created: true,
            url: bucket_url(credentials, &bucket_name),
            bucket_name,
            region: credentials.region.clone(),
            acl,
            storage_class,
            location: output.location,
        }))
    }
}
