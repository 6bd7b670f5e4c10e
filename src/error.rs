use snafu::Snafu;

use crate::node::classifier::ErrorCategory;
use crate::storage::StorageError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Environment variable '{key}' is required but not found"))]
    MissingEnvVar { key: String },

    #[snafu(display("Unsupported storage provider: {provider}"))]
    UnsupportedProvider { provider: String },

    #[snafu(display("No credentials provided: configure storage credentials before running the batch"))]
    NoCredentials,

    #[snafu(display("Unsupported operation: '{operation}'"))]
    UnsupportedOperation { operation: String },

    #[snafu(display("Missing required parameter: {name}"))]
    MissingParameter { name: String },

    #[snafu(display("Invalid parameter '{name}': {reason}"))]
    InvalidParameter { name: String, reason: String },

    #[snafu(display("No binary data found in the item for property '{property}'"))]
    MissingBinaryData { property: String },

    #[snafu(display("Binary property '{property}' is not valid base64: {source}"))]
    InvalidBinaryData {
        property: String,
        source: base64::DecodeError,
    },

    #[snafu(display("Object '{path}' not found in bucket '{bucket}': {source}"))]
    ObjectNotFound {
        bucket: String,
        path: String,
        source: StorageError,
    },

    #[snafu(display("Access denied to '{path}' in bucket '{bucket}': {source}"))]
    ObjectAccessDenied {
        bucket: String,
        path: String,
        source: StorageError,
    },

    #[snafu(display("Bucket '{bucket}' not found while accessing '{path}': {source}"))]
    BucketNotFound {
        bucket: String,
        path: String,
        source: StorageError,
    },

    #[snafu(display("Bucket '{bucket}' is not empty: {source}"))]
    BucketNotEmpty { bucket: String, source: StorageError },

    #[snafu(display(
        "Object '{path}' was written to bucket '{bucket}' but making it public failed: {source}"
    ))]
    AclUpdateFailed {
        bucket: String,
        path: String,
        source: Box<Error>,
    },

    #[snafu(display("Failed to read batch from '{path}': {source}"))]
    ReadBatchFailed { path: String, source: Box<Error> },

    /// A classified failure raised to the host, carrying the failing item.
    #[snafu(display("{message}"))]
    Node {
        message: String,
        category: ErrorCategory,
        item_index: Option<usize>,
    },

    #[snafu(display("Storage error: {source}"))]
    Storage { source: StorageError },

    #[snafu(display("OpenDAL error: {source}"))]
    OpenDal { source: opendal::Error },

    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },

    #[snafu(display("JSON error: {source}"))]
    Json { source: serde_json::Error },
}

impl Error {
    /// The backend failure underneath this error, if any.
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            Error::Storage { source }
            | Error::ObjectNotFound { source, .. }
            | Error::ObjectAccessDenied { source, .. }
            | Error::BucketNotFound { source, .. }
            | Error::BucketNotEmpty { source, .. } => Some(source),
            Error::AclUpdateFailed { source, .. } => source.storage_error(),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.storage_error().and_then(StorageError::code)
    }

    pub fn status_code(&self) -> Option<u16> {
        self.storage_error().and_then(|e| e.status)
    }

    /// Lowest-level message available: the backend's text for storage failures.
    pub fn original_message(&self) -> String {
        match self.storage_error() {
            Some(e) => e.message.clone(),
            None => self.to_string(),
        }
    }

    pub fn item_index(&self) -> Option<usize> {
        match self {
            Error::Node { item_index, .. } => *item_index,
            _ => None,
        }
    }
}

impl From<StorageError> for Error {
    fn from(error: StorageError) -> Self {
        Error::Storage { source: error }
    }
}

impl From<opendal::Error> for Error {
    fn from(error: opendal::Error) -> Self {
        Error::OpenDal { source: error }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io { source: error }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json { source: error }
    }
}
