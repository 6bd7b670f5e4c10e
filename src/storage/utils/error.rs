// Error conversion helpers and wrapping macro for Snafu-based errors
use crate::error::Error;
use crate::storage::StorageError;

/// Convert different error types into our unified Error type.
pub trait IntoStoreflowError {
    fn into_error(self) -> Error;
}

impl IntoStoreflowError for Error {
    fn into_error(self) -> Error {
        self
    }
}

impl IntoStoreflowError for StorageError {
    fn into_error(self) -> Error {
        self.into()
    }
}

impl IntoStoreflowError for std::io::Error {
    fn into_error(self) -> Error {
        self.into()
    }
}

impl IntoStoreflowError for serde_json::Error {
    fn into_error(self) -> Error {
        self.into()
    }
}

/// Macro to wrap a Result-producing expression into a Snafu variant with `source: Box<Error>`.
/// Example:
/// wrap_err!(client.put_object_acl(b, k, acl).await, AclUpdateFailed { bucket: b, path: k })?
#[macro_export]
macro_rules! wrap_err {
    ($expr:expr, $variant:ident { $($field:ident : $value:expr),* $(,)? }) => {{
        $expr.map_err(|e| {
            let src: $crate::error::Error = $crate::storage::utils::error::IntoStoreflowError::into_error(e);
            $crate::error::Error::$variant { $($field: $value),*, source: Box::new(src) }
        })
    }};
}
