use std::time::Duration;

use futures::stream::TryStreamExt;
use opendal::{EntryMode, ErrorKind, Metadata, Operator};

use crate::error::Result;
use crate::storage::utils::path::listing_root;
use crate::storage::{
    Acl, BucketSummary, CopyObjectOutput, CopyObjectRequest, CreateBucketOutput,
    CreateBucketRequest, DeleteObjectOutput, GetObjectOutput, HttpMethod, ListObjectsOutput,
    ListObjectsRequest, MetadataDirective, ObjectMetadata, ObjectSummary, PresignRequest, PutObjectOutput,
    PutObjectRequest, StorageClient, StorageConfig, StorageError, StorageProvider, StorageResult,
};

/// Storage client backed by an OpenDAL operator.
///
/// The operator is scoped to the configured bucket; object-store providers get
/// an operator for any other bucket on demand.
#[derive(Clone)]
pub struct OpenDalClient {
    operator: Operator,
    config: StorageConfig,
}

impl OpenDalClient {
    pub async fn new(config: StorageConfig) -> Result<Self> {
        let operator = Self::build_operator(&config)?;
        log::debug!(
            "opendal client ready provider={:?} bucket={} scheme={}",
            config.provider,
            config.bucket,
            operator.info().scheme()
        );
        Ok(Self { operator, config })
    }

    pub fn provider(&self) -> StorageProvider {
        self.config.provider
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    fn build_operator(config: &StorageConfig) -> Result<Operator> {
        match &config.provider {
            StorageProvider::Tos => {
                let region = config
                    .region
                    .as_deref()
                    .unwrap_or(super::constants::DEFAULT_REGION);
                let endpoint = config
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| format!("https://tos-s3-{region}.volces.com"));
                let mut builder = opendal::services::S3::default()
                    .bucket(&config.bucket)
                    .region(region)
                    .endpoint(&endpoint)
                    .enable_virtual_host_style();
                if let Some(access_key_id) = &config.access_key_id {
                    builder = builder.access_key_id(access_key_id);
                }
                if let Some(secret_access_key) = &config.access_key_secret {
                    builder = builder.secret_access_key(secret_access_key);
                }
                Ok(Operator::new(builder)?.finish())
            }
            StorageProvider::Oss => {
                let mut builder = opendal::services::Oss::default().bucket(&config.bucket);
                if let Some(access_key_id) = &config.access_key_id {
                    builder = builder.access_key_id(access_key_id);
                }
                if let Some(access_key_secret) = &config.access_key_secret {
                    builder = builder.access_key_secret(access_key_secret);
                }
                match (&config.endpoint, &config.region) {
                    (Some(endpoint), _) => builder = builder.endpoint(endpoint),
                    (None, Some(region)) => {
                        builder = builder.endpoint(&format!("https://oss-{region}.aliyuncs.com"))
                    }
                    (None, None) => {}
                }
                Ok(Operator::new(builder)?.finish())
            }
            StorageProvider::S3 => {
                let mut builder = opendal::services::S3::default().bucket(&config.bucket);
                if let Some(access_key_id) = &config.access_key_id {
                    builder = builder.access_key_id(access_key_id);
                }
                if let Some(secret_access_key) = &config.access_key_secret {
                    builder = builder.secret_access_key(secret_access_key);
                }
                if let Some(region) = &config.region {
                    builder = builder.region(region);
                }
                if let Some(endpoint) = &config.endpoint {
                    builder = builder.endpoint(endpoint);
                }
                Ok(Operator::new(builder)?.finish())
            }
            StorageProvider::Fs => {
                let root = config
                    .root_path
                    .as_deref()
                    .unwrap_or(super::constants::DEFAULT_FS_ROOT);
                let builder = opendal::services::Fs::default().root(root);
                Ok(Operator::new(builder)?.finish())
            }
            StorageProvider::Memory => {
                let builder = opendal::services::Memory::default();
                Ok(Operator::new(builder)?.finish())
            }
        }
    }

    /// Operator serving `bucket`. Local providers have a single namespace.
    fn operator_for(&self, bucket: &str) -> StorageResult<Operator> {
        if bucket == self.config.bucket
            || matches!(
                self.config.provider,
                StorageProvider::Fs | StorageProvider::Memory
            )
        {
            return Ok(self.operator.clone());
        }

        let config = StorageConfig {
            bucket: bucket.to_string(),
            ..self.config.clone()
        };
        Self::build_operator(&config).map_err(|e| {
            StorageError::new(Some("InvalidArgument"), Some(400), e.to_string())
        })
    }

    async fn read_all(operator: &Operator, key: &str) -> StorageResult<(Vec<u8>, Metadata)> {
        let meta = operator.stat(key).await.map_err(map_opendal_error)?;
        let body = operator.read(key).await.map_err(map_opendal_error)?;
        Ok((body.to_vec(), meta))
    }
}

/// Normalize an OpenDAL failure into a service-style code and status.
fn map_opendal_error(error: opendal::Error) -> StorageError {
    let message = error.to_string();
    let (code, status) = match error.kind() {
        ErrorKind::NotFound => ("NoSuchKey", 404),
        ErrorKind::PermissionDenied => ("AccessDenied", 403),
        ErrorKind::RateLimited => ("SlowDown", 503),
        ErrorKind::Unsupported => ("NotImplemented", 501),
        ErrorKind::ConfigInvalid => ("InvalidArgument", 400),
        ErrorKind::IsADirectory | ErrorKind::NotADirectory => ("InvalidObjectName", 400),
        ErrorKind::ConditionNotMatch => ("PreconditionFailed", 412),
        _ if message.contains("timed out") => ("RequestTimeout", 408),
        _ => return StorageError::new(None, None, message),
    };
    StorageError::new(Some(code), Some(status), message)
}

fn object_metadata(meta: &Metadata) -> ObjectMetadata {
    ObjectMetadata {
        content_length: Some(meta.content_length()),
        content_type: meta.content_type().map(str::to_string),
        etag: meta.etag().map(str::to_string),
        last_modified: meta.last_modified().map(|t| t.to_string()),
        storage_class: None,
        version_id: meta.version().map(str::to_string),
    }
}

impl StorageClient for OpenDalClient {
    async fn head_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectMetadata> {
        log::debug!("head_object bucket={bucket} key={key}");
        let operator = self.operator_for(bucket)?;
        let meta = operator.stat(key).await.map_err(map_opendal_error)?;
        Ok(object_metadata(&meta))
    }

    async fn put_object(&self, request: PutObjectRequest) -> StorageResult<PutObjectOutput> {
        log::debug!(
            "put_object bucket={} key={} size={}",
            request.bucket,
            request.key,
            request.body.len()
        );
        let operator = self.operator_for(&request.bucket)?;
        let supports_content_type = operator.info().full_capability().write_with_content_type;
        let meta = match request.content_type {
            Some(content_type) if supports_content_type => operator
                .write_with(&request.key, request.body)
                .content_type(&content_type)
                .await
                .map_err(map_opendal_error)?,
            _ => operator
                .write(&request.key, request.body)
                .await
                .map_err(map_opendal_error)?,
        };
        Ok(PutObjectOutput {
            etag: meta.etag().map(str::to_string),
            version_id: meta.version().map(str::to_string),
        })
    }

    async fn put_object_acl(&self, bucket: &str, key: &str, acl: Acl) -> StorageResult<()> {
        log::debug!("put_object_acl bucket={bucket} key={key} acl={acl}");
        Err(StorageError::not_implemented("putObjectAcl"))
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<GetObjectOutput> {
        log::debug!("get_object bucket={bucket} key={key}");
        let operator = self.operator_for(bucket)?;
        let (body, meta) = Self::read_all(&operator, key).await?;
        Ok(GetObjectOutput {
            body,
            metadata: object_metadata(&meta),
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<DeleteObjectOutput> {
        log::debug!("delete_object bucket={bucket} key={key}");
        let operator = self.operator_for(bucket)?;
        operator.delete(key).await.map_err(map_opendal_error)?;
        Ok(DeleteObjectOutput::default())
    }

    async fn list_objects(&self, request: ListObjectsRequest) -> StorageResult<ListObjectsOutput> {
        log::debug!(
            "list_objects bucket={} prefix={:?} delimiter={:?} marker={:?} max_keys={}",
            request.bucket,
            request.prefix,
            request.delimiter,
            request.marker,
            request.max_keys
        );
        let operator = self.operator_for(&request.bucket)?;
        let prefix = request.prefix.as_deref().unwrap_or_default();
        let root = match listing_root(prefix) {
            "" => "/",
            root => root,
        };
        // OpenDAL only rolls up on '/', so any delimiter lists one level.
        let recursive = request.delimiter.is_none();

        let mut lister = operator
            .lister_with(root)
            .recursive(recursive)
            .await
            .map_err(map_opendal_error)?;

        let mut objects = Vec::new();
        let mut common_prefixes = Vec::new();
        while let Some(entry) = lister.try_next().await.map_err(map_opendal_error)? {
            let path = entry.path();
            if path == root || !path.starts_with(prefix) {
                continue;
            }
            let meta = entry.metadata();
            if meta.mode() == EntryMode::DIR {
                if !recursive {
                    common_prefixes.push(path.to_string());
                }
                continue;
            }
            objects.push(ObjectSummary {
                key: path.to_string(),
                size: meta.content_length(),
                last_modified: meta.last_modified().map(|t| t.to_string()),
                etag: meta.etag().map(str::to_string),
                storage_class: None,
                owner: None,
            });
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        common_prefixes.sort();
        if let Some(marker) = request.marker.as_deref() {
            objects.retain(|o| o.key.as_str() > marker);
            common_prefixes.retain(|p| p.as_str() > marker);
        }

        let is_truncated = objects.len() > request.max_keys;
        objects.truncate(request.max_keys);
        let next_marker = if is_truncated {
            objects.last().map(|o| o.key.clone())
        } else {
            None
        };

        Ok(ListObjectsOutput {
            objects,
            common_prefixes,
            marker: request.marker,
            next_marker,
            is_truncated,
        })
    }

    async fn copy_object(&self, request: CopyObjectRequest) -> StorageResult<CopyObjectOutput> {
        log::debug!(
            "copy_object {}/{} -> {}/{} directive={}",
            request.src_bucket,
            request.src_key,
            request.bucket,
            request.key,
            request.metadata_directive.as_str()
        );
        let source = self.operator_for(&request.src_bucket)?;
        let target = self.operator_for(&request.bucket)?;

        let same_namespace = request.src_bucket == request.bucket
            || matches!(
                self.provider(),
                StorageProvider::Fs | StorageProvider::Memory
            );
        // Native copy keeps whatever metadata the backend carries over, so REPLACE
        // always goes through an explicit rewrite.
        let keep_metadata = request.metadata_directive == MetadataDirective::Copy;
        if keep_metadata && same_namespace && target.info().full_capability().copy {
            target
                .copy(&request.src_key, &request.key)
                .await
                .map_err(map_opendal_error)?;
        } else {
            let (body, meta) = Self::read_all(&source, &request.src_key).await?;
            let content_type = meta
                .content_type()
                .filter(|_| keep_metadata)
                .filter(|_| target.info().full_capability().write_with_content_type);
            match content_type {
                Some(content_type) => target
                    .write_with(&request.key, body)
                    .content_type(content_type)
                    .await
                    .map_err(map_opendal_error)?,
                None => target
                    .write(&request.key, body)
                    .await
                    .map_err(map_opendal_error)?,
            };
        }

        let meta = target.stat(&request.key).await.map_err(map_opendal_error)?;
        Ok(CopyObjectOutput {
            etag: meta.etag().map(str::to_string),
            last_modified: meta.last_modified().map(|t| t.to_string()),
            version_id: meta.version().map(str::to_string),
        })
    }

    async fn create_bucket(
        &self,
        request: CreateBucketRequest,
    ) -> StorageResult<CreateBucketOutput> {
        log::debug!("create_bucket bucket={}", request.bucket);
        Err(StorageError::not_implemented("createBucket"))
    }

    async fn delete_bucket(&self, bucket: &str) -> StorageResult<()> {
        log::debug!("delete_bucket bucket={bucket}");
        Err(StorageError::not_implemented("deleteBucket"))
    }

    async fn list_buckets(&self) -> StorageResult<Vec<BucketSummary>> {
        log::debug!("list_buckets provider={:?}", self.config.provider);
        Err(StorageError::not_implemented("listBuckets"))
    }

    async fn presign(&self, request: PresignRequest) -> StorageResult<String> {
        log::debug!(
            "presign bucket={} key={} method={} expires={}",
            request.bucket,
            request.key,
            request.method.as_str(),
            request.expires
        );
        let operator = self.operator_for(&request.bucket)?;
        let capability = operator.info().full_capability();
        let ttl = Duration::from_secs(request.expires);

        let presigned = match request.method {
            HttpMethod::Get if capability.presign_read => {
                let mut future = operator.presign_read_with(&request.key, ttl);
                if let Some(content_type) = &request.response_content_type {
                    future = future.override_content_type(content_type);
                }
                if let Some(disposition) = &request.response_content_disposition {
                    future = future.override_content_disposition(disposition);
                }
                future.await.map_err(map_opendal_error)?
            }
            HttpMethod::Put if capability.presign_write => operator
                .presign_write(&request.key, ttl)
                .await
                .map_err(map_opendal_error)?,
            method => {
                return Err(StorageError::not_implemented(&format!(
                    "presign {}",
                    method.as_str()
                )));
            }
        };
        Ok(presigned.uri().to_string())
    }
}
