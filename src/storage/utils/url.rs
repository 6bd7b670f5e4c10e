// Deterministic access URL templates
use crate::node::Credentials;
use crate::storage::constants::TOS_PUBLIC_DOMAIN;

/// Base URL of a bucket: path-style under a custom endpoint, virtual-hosted otherwise.
pub fn bucket_url(credentials: &Credentials, bucket: &str) -> String {
    match credentials.endpoint() {
        Some(endpoint) => format!("{}/{bucket}", endpoint.trim_end_matches('/')),
        None => format!(
            "https://{bucket}.tos-{}.{TOS_PUBLIC_DOMAIN}",
            credentials.region
        ),
    }
}

/// URL of an object built from bucket, region and key.
pub fn object_url(credentials: &Credentials, bucket: &str, key: &str) -> String {
    format!(
        "{}/{}",
        bucket_url(credentials, bucket),
        key.trim_start_matches('/')
    )
}
