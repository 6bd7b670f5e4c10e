//! The workflow node: operation handlers, their registry, the per-batch
//! dispatcher and the error classifier that turns failures into
//! user-facing messages.

use serde::Deserialize;
use std::fmt;

pub mod classifier;
pub mod context;
pub mod dispatcher;
pub mod operations;
pub mod registry;

pub use self::classifier::{ClassifiedError, ContinueOnFailRecord, ErrorCategory, ErrorContext};
pub use self::context::{BatchContext, BinaryData, ExecutionContext, InputItem, OutputItem};
pub use self::dispatcher::Dispatcher;
pub use self::operations::{Handler, Operation, OperationResult};
pub use self::registry::OperationRegistry;

/// Storage credentials for one batch. Shared read-only by every item.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Credentials {
    /// Custom endpoint, ignoring blank values.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
