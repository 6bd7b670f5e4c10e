//! Failure classification.
//!
//! [`classify`] runs an ordered rule list (first match wins) and renders a
//! friendly message from the failed item's own context. Continue-on-failure
//! records use a smaller rule set keyed on service codes and statuses.
//! [`escalate`] turns a failure into the single error that aborts a batch.

use serde::Serialize;
use snafu::ErrorCompat;

use crate::error::Error;
use crate::node::Credentials;
use crate::node::context::ExecutionContext;

const UNKNOWN_ERROR: &str = "unknown error";
const NOT_SPECIFIED: &str = "not specified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCategory {
    MissingParameter,
    InvalidParameter,
    MissingBinaryData,
    UnsupportedOperation,
    NoCredentials,
    NotFound,
    AccessDenied,
    InvalidCredential,
    SignatureMismatch,
    BucketNotEmpty,
    EntityTooLarge,
    InvalidObjectName,
    ArchivedObject,
    NetworkUnreachable,
    Timeout,
    RegionMisconfigured,
    Generic,
}

/// Where a failed call was pointed at, read from the failing item's parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub file_path: Option<String>,
    pub bucket: Option<String>,
}

impl ErrorContext {
    pub fn from_parameters<X: ExecutionContext>(ctx: &X, item_index: usize) -> Self {
        let read = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| ctx.string_parameter(name, item_index, "").ok())
                .find(|value| !value.is_empty())
        };
        Self {
            file_path: read(&["filePath", "sourceKey"]),
            bucket: read(&["bucket", "bucketName", "sourceBucket"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub friendly_message: String,
    pub details: String,
    pub original_message: String,
}

/// Compact failure record emitted in place of a result under continue-on-failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueOnFailRecord {
    pub error: String,
    pub operation: String,
    pub item_index: usize,
    pub original_error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

struct Scope<'a> {
    error: &'a Error,
    message: &'a str,
    context: &'a ErrorContext,
    credentials: Option<&'a Credentials>,
}

impl Scope<'_> {
    fn code_is(&self, code: &str) -> bool {
        self.error.code() == Some(code)
    }

    fn mentions(&self, needle: &str) -> bool {
        self.message.contains(needle)
    }

    fn bucket(&self) -> &str {
        self.context
            .bucket
            .as_deref()
            .or(self.credentials.map(|c| c.bucket.as_str()))
            .filter(|b| !b.is_empty())
            .unwrap_or(NOT_SPECIFIED)
    }

    fn path(&self) -> &str {
        self.context.file_path.as_deref().unwrap_or(NOT_SPECIFIED)
    }
}

struct Rule {
    category: ErrorCategory,
    matches: fn(&Scope) -> bool,
    render: fn(&Scope) -> String,
}

const RULES: &[Rule] = &[
    Rule {
        category: ErrorCategory::MissingBinaryData,
        matches: |s| {
            matches!(s.error, Error::MissingBinaryData { .. }) || s.mentions("No binary data found")
        },
        render: |_| {
            "No binary data found: make sure the previous node outputs file data and check the binary property name.".to_string()
        },
    },
    Rule {
        category: ErrorCategory::MissingParameter,
        matches: |s| matches!(s.error, Error::MissingParameter { .. }),
        render: |s| match s.error {
            Error::MissingParameter { name } => {
                format!("Missing required parameter: set '{name}' in the node settings.")
            }
            _ => "Missing required parameter.".to_string(),
        },
    },
    Rule {
        category: ErrorCategory::InvalidParameter,
        matches: |s| {
            matches!(
                s.error,
                Error::InvalidParameter { .. } | Error::InvalidBinaryData { .. }
            )
        },
        render: |s| match s.error {
            Error::InvalidParameter { name, reason } => {
                format!("Invalid parameter '{name}': {reason}. Check the node settings.")
            }
            other => format!("Invalid binary data: {other}."),
        },
    },
    Rule {
        category: ErrorCategory::UnsupportedOperation,
        matches: |s| matches!(s.error, Error::UnsupportedOperation { .. }),
        render: |s| match s.error {
            Error::UnsupportedOperation { operation } => format!(
                "Unsupported operation '{operation}': choose one of the operations this node offers."
            ),
            _ => "Unsupported operation.".to_string(),
        },
    },
    Rule {
        category: ErrorCategory::NoCredentials,
        matches: |s| matches!(s.error, Error::NoCredentials),
        render: |_| {
            "No credentials: attach storage credentials (access key, secret key, bucket, region) to the node.".to_string()
        },
    },
    Rule {
        category: ErrorCategory::BucketNotEmpty,
        matches: |s| s.code_is("BucketNotEmpty"),
        render: |s| {
            format!(
                "Bucket not empty: bucket \"{}\" still contains objects. Delete all objects in it first.",
                s.bucket()
            )
        },
    },
    Rule {
        category: ErrorCategory::NotFound,
        matches: |s| s.code_is("NoSuchBucket") || (s.mentions("bucket") && !s.code_is("NoSuchKey")),
        render: |s| {
            format!(
                "Bucket error: bucket \"{}\" does not exist or is not accessible. Check the bucket name and access permissions.",
                s.bucket()
            )
        },
    },
    Rule {
        category: ErrorCategory::InvalidCredential,
        matches: |s| s.code_is("InvalidAccessKeyId") || s.mentions("AccessKey"),
        render: |_| {
            "Access key error: the AccessKey is invalid or expired. Check the AccessKey in the credentials.".to_string()
        },
    },
    Rule {
        category: ErrorCategory::SignatureMismatch,
        matches: |s| s.code_is("SignatureDoesNotMatch") || s.mentions("SecretKey"),
        render: |_| {
            "Signature error: the SecretKey is incorrect. Check the SecretKey in the credentials.".to_string()
        },
    },
    Rule {
        category: ErrorCategory::NotFound,
        matches: |s| {
            s.code_is("NoSuchKey") || s.error.status_code() == Some(404) || s.mentions("key")
        },
        render: |s| {
            format!(
                "File not found: path \"{}\" does not exist in the bucket. Check the file path.",
                s.path()
            )
        },
    },
    Rule {
        category: ErrorCategory::AccessDenied,
        matches: |s| s.code_is("AccessDenied") || s.error.status_code() == Some(403),
        render: |_| {
            "Access denied: the current credentials may not perform this operation. Check the IAM permission configuration.".to_string()
        },
    },
    Rule {
        category: ErrorCategory::EntityTooLarge,
        matches: |s| s.code_is("EntityTooLarge"),
        render: |_| {
            "File too large: the upload exceeds the maximum allowed size. Use multipart upload or reduce the file size.".to_string()
        },
    },
    Rule {
        category: ErrorCategory::InvalidObjectName,
        matches: |s| s.code_is("InvalidObjectName"),
        render: |s| {
            format!(
                "Invalid object name: path \"{}\" contains invalid characters. Check the path format.",
                s.path()
            )
        },
    },
    Rule {
        category: ErrorCategory::ArchivedObject,
        matches: |s| s.code_is("ObjectNotInActiveTierError") || s.code_is("InvalidObjectState"),
        render: |_| {
            "Object not active: archived and cold-archive objects must be restored before they can be accessed.".to_string()
        },
    },
    Rule {
        category: ErrorCategory::NetworkUnreachable,
        matches: |s| {
            s.mentions("ENOTFOUND")
                || s.mentions("ECONNREFUSED")
                || s.mentions("Connection refused")
                || s.mentions("dns error")
        },
        render: |s| {
            format!(
                "Network error: cannot reach the storage service. Check the network connection and endpoint configuration. Current endpoint: {}",
                s.credentials
                    .and_then(Credentials::endpoint)
                    .unwrap_or("default")
            )
        },
    },
    Rule {
        category: ErrorCategory::Timeout,
        matches: |s| {
            s.error.storage_error().is_some_and(|e| e.is_timeout())
                || s.mentions("timeout")
                || s.mentions("timed out")
        },
        render: |_| {
            "Request timed out: the storage service did not respond in time. Retry later or check the network connection.".to_string()
        },
    },
    Rule {
        category: ErrorCategory::RegionMisconfigured,
        matches: |s| s.mentions("region"),
        render: |s| {
            format!(
                "Region configuration error: region \"{}\" may be incorrect. Check the region setting.",
                s.credentials.map(|c| c.region.as_str()).unwrap_or(NOT_SPECIFIED)
            )
        },
    },
];

/// Classify a failure of `operation` into a category with a friendly message.
pub fn classify(
    error: &Error,
    operation: &str,
    context: &ErrorContext,
    credentials: Option<&Credentials>,
) -> ClassifiedError {
    let original_message = error.original_message();
    let scope = Scope {
        error,
        message: &original_message,
        context,
        credentials,
    };

    let (category, friendly_message) = RULES
        .iter()
        .find(|rule| (rule.matches)(&scope))
        .map(|rule| (rule.category, (rule.render)(&scope)))
        .unwrap_or_else(|| {
            let text = if original_message.is_empty() {
                UNKNOWN_ERROR
            } else {
                &original_message
            };
            (
                ErrorCategory::Generic,
                format!(
                    "Storage operation failed: {text}. Check the configuration parameters and network connection."
                ),
            )
        });

    let friendly_message = match partial_write_notice(error) {
        Some(notice) => format!("{notice}. {friendly_message}"),
        None => friendly_message,
    };

    let details = format!(
        "operation: {operation}, file path: {}, bucket: {}",
        scope.path(),
        scope.bucket()
    );

    ClassifiedError {
        category,
        friendly_message,
        details,
        original_message,
    }
}

/// Failures that happened after the object body was already stored.
fn partial_write_notice(error: &Error) -> Option<String> {
    match error {
        Error::AclUpdateFailed { bucket, path, .. } => Some(format!(
            "Object \"{path}\" was written to bucket \"{bucket}\" but making it public failed"
        )),
        _ => None,
    }
}

/// Build the abbreviated record for an item that failed under continue-on-failure.
pub fn continue_on_fail_record(
    error: &Error,
    operation: &str,
    item_index: usize,
) -> ContinueOnFailRecord {
    let original_error = error.original_message();
    let message = match (error.code(), error.status_code()) {
        (Some("NoSuchBucket"), _) => "Bucket does not exist or is not accessible".to_string(),
        (Some("AccessDenied"), _) => "Access denied, check the permission configuration".to_string(),
        (Some("InvalidAccessKeyId"), _) => "AccessKey is invalid or expired".to_string(),
        (Some("SignatureDoesNotMatch"), _) => "SecretKey is incorrect".to_string(),
        (_, Some(404)) => "The specified file or bucket was not found".to_string(),
        _ if original_error.is_empty() => UNKNOWN_ERROR.to_string(),
        _ => original_error.clone(),
    };

    let message = match partial_write_notice(error) {
        Some(notice) => format!("{notice}: {message}"),
        None => message,
    };

    ContinueOnFailRecord {
        error: message,
        operation: operation.to_string(),
        item_index,
        original_error,
        error_code: error.code().map(str::to_string),
        status_code: error.status_code(),
    }
}

/// Produce the batch-aborting error for a failed item.
///
/// An error that is already a [`Error::Node`] keeps its message and only gains
/// the item index. Anything else becomes a new `Node` error whose message is
/// layered friendly message, details, then original error.
pub fn escalate(error: Error, classified: Option<ClassifiedError>, item_index: usize) -> Error {
    if let Error::Node {
        message, category, ..
    } = error
    {
        return Error::Node {
            message,
            category,
            item_index: Some(item_index),
        };
    }

    let raw = error.to_string();
    let chain = error
        .iter_chain()
        .skip(1)
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(": ");

    let category = classified
        .as_ref()
        .map_or(ErrorCategory::Generic, |c| c.category);
    let mut message = match &classified {
        Some(c) if !c.friendly_message.is_empty() => c.friendly_message.clone(),
        _ if !raw.is_empty() => raw,
        _ if !chain.is_empty() => chain.clone(),
        _ => UNKNOWN_ERROR.to_string(),
    };

    if let Some(c) = &classified {
        if !c.details.is_empty() {
            message.push_str(&format!("\n\nDetails: {}", c.details));
        }
    }
    match classified.as_ref().map(|c| c.original_message.as_str()) {
        Some(original) if !original.is_empty() => {
            message.push_str(&format!("\n\nOriginal error: {original}"));
        }
        _ if !chain.is_empty() => message.push_str(&format!("\n\nCaused by: {chain}")),
        _ => {}
    }

    Error::Node {
        message,
        category,
        item_index: Some(item_index),
    }
}
