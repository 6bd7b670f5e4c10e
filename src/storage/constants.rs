// Pre-signed URL limits (seconds)
pub const PRESIGN_MIN_EXPIRES: u64 = 1;
pub const PRESIGN_MAX_EXPIRES: u64 = 604_800;
pub const PRESIGN_DEFAULT_EXPIRES: u64 = 1800;

// Lifetime of the access URL attached to upload/download/copy results
pub const ACCESS_URL_EXPIRES: u64 = 3600;

// Listing bounds
pub const LIST_DEFAULT_MAX_KEYS: u64 = 1000;
pub const LIST_MAX_KEYS_LIMIT: u64 = 1000;

// Public host template suffix for virtual-hosted bucket URLs
pub const TOS_PUBLIC_DOMAIN: &str = "volces.com";

pub const DEFAULT_REGION: &str = "cn-beijing";
pub const DEFAULT_BINARY_PROPERTY: &str = "data";
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
pub const DEFAULT_DOWNLOAD_NAME: &str = "downloaded-file";

// Filesystem default
pub const DEFAULT_FS_ROOT: &str = "./storage";
