use crate::error::{Error, Result};
use snafu::Snafu;
use std::fmt;
use std::str::FromStr;

pub mod constants;
mod opendal_client;
pub mod utils;

pub use self::opendal_client::OpenDalClient;

/// Storage provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageProvider {
    /// Volcengine TOS through its S3-compatible endpoint.
    Tos,
    Oss,
    S3,
    Fs,
    Memory,
}

impl FromStr for StorageProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tos" => Ok(Self::Tos),
            "oss" => Ok(Self::Oss),
            "s3" | "minio" => Ok(Self::S3),
            "fs" => Ok(Self::Fs),
            "memory" => Ok(Self::Memory),
            _ => Err(Error::UnsupportedProvider {
                provider: s.to_string(),
            }),
        }
    }
}

/// Unified storage configuration for different providers
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub provider: StorageProvider,
    pub bucket: String,
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub root_path: Option<String>,
}

impl StorageConfig {
    pub fn tos(
        bucket: String,
        access_key_id: String,
        access_key_secret: String,
        region: String,
    ) -> Self {
        Self {
            provider: StorageProvider::Tos,
            bucket,
            access_key_id: Some(access_key_id),
            access_key_secret: Some(access_key_secret),
            endpoint: None,
            region: Some(region),
            root_path: None,
        }
    }

    pub fn oss(
        bucket: String,
        access_key_id: String,
        access_key_secret: String,
        region: Option<String>,
    ) -> Self {
        Self {
            provider: StorageProvider::Oss,
            bucket,
            access_key_id: Some(access_key_id),
            access_key_secret: Some(access_key_secret),
            endpoint: None,
            region,
            root_path: None,
        }
    }

    pub fn s3(
        bucket: String,
        access_key_id: String,
        secret_access_key: String,
        region: Option<String>,
    ) -> Self {
        Self {
            provider: StorageProvider::S3,
            bucket,
            access_key_id: Some(access_key_id),
            access_key_secret: Some(secret_access_key),
            endpoint: None,
            region,
            root_path: None,
        }
    }

    pub fn fs(bucket: String, root_path: String) -> Self {
        Self {
            provider: StorageProvider::Fs,
            bucket,
            access_key_id: None,
            access_key_secret: None,
            endpoint: None,
            region: None,
            root_path: Some(root_path),
        }
    }

    pub fn memory(bucket: String) -> Self {
        Self {
            provider: StorageProvider::Memory,
            bucket,
            access_key_id: None,
            access_key_secret: None,
            endpoint: None,
            region: None,
            root_path: None,
        }
    }
}

/// Failure reported by a storage backend.
///
/// `code` and `status` mirror the service error code and HTTP status when the
/// backend provides them; `message` is the backend's own text.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(display("{message}"), visibility(pub))]
pub struct StorageError {
    pub code: Option<String>,
    pub status: Option<u16>,
    pub message: String,
}

impl StorageError {
    pub fn new(code: Option<&str>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            code: code.map(str::to_string),
            status,
            message: message.into(),
        }
    }

    pub fn no_such_key(key: &str) -> Self {
        Self::new(
            Some("NoSuchKey"),
            Some(404),
            format!("The specified key does not exist: {key}"),
        )
    }

    pub fn no_such_bucket(bucket: &str) -> Self {
        Self::new(
            Some("NoSuchBucket"),
            Some(404),
            format!("The specified bucket does not exist: {bucket}"),
        )
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(Some("AccessDenied"), Some(403), message)
    }

    pub fn bucket_not_empty(bucket: &str) -> Self {
        Self::new(
            Some("BucketNotEmpty"),
            Some(409),
            format!("The bucket you tried to delete is not empty: {bucket}"),
        )
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(Some("RequestTimeout"), Some(408), message)
    }

    pub fn not_implemented(operation: &str) -> Self {
        Self::new(
            Some("NotImplemented"),
            Some(501),
            format!("{operation} is not supported by this storage backend"),
        )
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404) || self.code() == Some("NoSuchKey")
    }

    pub fn is_timeout(&self) -> bool {
        self.code() == Some("RequestTimeout")
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Canned access control lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Acl {
    #[default]
    Private,
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
    BucketOwnerRead,
    BucketOwnerFullControl,
}

impl Acl {
    pub fn as_str(&self) -> &'static str {
        match self {
            Acl::Private => "private",
            Acl::PublicRead => "public-read",
            Acl::PublicReadWrite => "public-read-write",
            Acl::AuthenticatedRead => "authenticated-read",
            Acl::BucketOwnerRead => "bucket-owner-read",
            Acl::BucketOwnerFullControl => "bucket-owner-full-control",
        }
    }
}

impl FromStr for Acl {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "private" => Ok(Acl::Private),
            "public-read" => Ok(Acl::PublicRead),
            "public-read-write" => Ok(Acl::PublicReadWrite),
            "authenticated-read" => Ok(Acl::AuthenticatedRead),
            "bucket-owner-read" => Ok(Acl::BucketOwnerRead),
            "bucket-owner-full-control" => Ok(Acl::BucketOwnerFullControl),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageClass {
    #[default]
    Standard,
    InfrequentAccess,
    Archive,
    ColdArchive,
}

impl StorageClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageClass::Standard => "STANDARD",
            StorageClass::InfrequentAccess => "IA",
            StorageClass::Archive => "ARCHIVE_FR",
            StorageClass::ColdArchive => "COLD_ARCHIVE",
        }
    }
}

impl FromStr for StorageClass {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "STANDARD" => Ok(StorageClass::Standard),
            "IA" => Ok(StorageClass::InfrequentAccess),
            "ARCHIVE_FR" => Ok(StorageClass::Archive),
            "COLD_ARCHIVE" => Ok(StorageClass::ColdArchive),
            _ => Err(()),
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a copy carries the source metadata over or replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataDirective {
    #[default]
    Copy,
    Replace,
}

impl MetadataDirective {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataDirective::Copy => "COPY",
            MetadataDirective::Replace => "REPLACE",
        }
    }
}

impl FromStr for MetadataDirective {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "COPY" => Ok(MetadataDirective::Copy),
            "REPLACE" => Ok(MetadataDirective::Replace),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Put,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "PUT" => Ok(HttpMethod::Put),
            _ => Err(()),
        }
    }
}

/// Object metadata normalized from backend responses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub storage_class: Option<String>,
    pub version_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PutObjectOutput {
    pub etag: Option<String>,
    pub version_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GetObjectOutput {
    pub body: Vec<u8>,
    pub metadata: ObjectMetadata,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteObjectOutput {
    pub version_id: Option<String>,
    /// True when the delete created a tombstone instead of removing data.
    pub delete_marker: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ListObjectsRequest {
    pub bucket: String,
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub marker: Option<String>,
    pub max_keys: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<String>,
    pub etag: Option<String>,
    pub storage_class: Option<String>,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListObjectsOutput {
    pub objects: Vec<ObjectSummary>,
    pub common_prefixes: Vec<String>,
    pub marker: Option<String>,
    pub next_marker: Option<String>,
    pub is_truncated: bool,
}

#[derive(Debug, Clone)]
pub struct CopyObjectRequest {
    pub src_bucket: String,
    pub src_key: String,
    pub bucket: String,
    pub key: String,
    pub metadata_directive: MetadataDirective,
}

#[derive(Debug, Clone, Default)]
pub struct CopyObjectOutput {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub version_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateBucketRequest {
    pub bucket: String,
    /// Only set when different from the service default.
    pub acl: Option<Acl>,
    /// Only set when different from the service default.
    pub storage_class: Option<StorageClass>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateBucketOutput {
    pub location: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BucketSummary {
    pub name: String,
    pub creation_date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PresignRequest {
    pub bucket: String,
    pub key: String,
    pub method: HttpMethod,
    pub expires: u64,
    pub version_id: Option<String>,
    pub response_content_type: Option<String>,
    pub response_content_disposition: Option<String>,
}

/// The object storage capability consumed by node operations.
///
/// One logical request per call; transport, retries and signing are the
/// implementor's concern.
pub trait StorageClient {
    async fn head_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectMetadata>;

    async fn put_object(&self, request: PutObjectRequest) -> StorageResult<PutObjectOutput>;

    async fn put_object_acl(&self, bucket: &str, key: &str, acl: Acl) -> StorageResult<()>;

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<GetObjectOutput>;

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<DeleteObjectOutput>;

    async fn list_objects(&self, request: ListObjectsRequest) -> StorageResult<ListObjectsOutput>;

    async fn copy_object(&self, request: CopyObjectRequest) -> StorageResult<CopyObjectOutput>;

    async fn create_bucket(&self, request: CreateBucketRequest)
    -> StorageResult<CreateBucketOutput>;

    async fn delete_bucket(&self, bucket: &str) -> StorageResult<()>;

    async fn list_buckets(&self) -> StorageResult<Vec<BucketSummary>>;

    async fn presign(&self, request: PresignRequest) -> StorageResult<String>;
}
