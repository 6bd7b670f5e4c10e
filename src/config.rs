use std::env;
use std::str::FromStr;

use snafu::OptionExt;

use crate::error::{MissingEnvVarSnafu, Result};
use crate::node::Credentials;
use crate::storage::constants::{DEFAULT_FS_ROOT, DEFAULT_REGION};
use crate::storage::{StorageConfig, StorageProvider};

const DEFAULT_LOCAL_BUCKET: &str = "local";

/// Environment lookup, swappable so configuration can be loaded from a map in tests.
trait Lookup {
    fn get(&self, key: &str) -> Option<String>;

    /// First non-empty value among `keys`.
    fn first(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .find(|value| !value.trim().is_empty())
    }

    fn require(&self, keys: &[&str]) -> Result<String> {
        self.first(keys).context(MissingEnvVarSnafu {
            key: keys.join(" or "),
        })
    }
}

impl<F: Fn(&str) -> Option<String>> Lookup for F {
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// Load storage configuration from environment variables
pub fn load_storage_config() -> Result<StorageConfig> {
    load_from(&|key: &str| env::var(key).ok())
}

/// Load storage configuration through a custom variable lookup.
pub fn load_storage_config_with<F>(lookup: F) -> Result<StorageConfig>
where
    F: Fn(&str) -> Option<String>,
{
    load_from(&lookup)
}

fn load_from(env: &impl Lookup) -> Result<StorageConfig> {
    let provider_str = env
        .first(&["STORAGE_PROVIDER"])
        .unwrap_or_else(|| "tos".to_string());
    let provider = StorageProvider::from_str(&provider_str)?;
    log::debug!("loading storage config provider={provider:?}");

    match provider {
        StorageProvider::Tos => load_tos_config(env),
        StorageProvider::Oss => load_oss_config(env),
        StorageProvider::S3 => load_s3_config(env, &provider_str),
        StorageProvider::Fs => load_fs_config(env),
        StorageProvider::Memory => Ok(StorageConfig::memory(
            env.first(&["STORAGE_BUCKET"])
                .unwrap_or_else(|| DEFAULT_LOCAL_BUCKET.to_string()),
        )),
    }
}

/// Load Volcengine TOS configuration
fn load_tos_config(env: &impl Lookup) -> Result<StorageConfig> {
    let bucket = env.require(&["STORAGE_BUCKET", "TOS_BUCKET"])?;
    let access_key_id = env.require(&["STORAGE_ACCESS_KEY_ID", "TOS_ACCESS_KEY"])?;
    let access_key_secret = env.require(&["STORAGE_ACCESS_KEY_SECRET", "TOS_SECRET_KEY"])?;
    let region = env
        .first(&["STORAGE_REGION", "TOS_REGION"])
        .unwrap_or_else(|| DEFAULT_REGION.to_string());

    let mut config = StorageConfig::tos(bucket, access_key_id, access_key_secret, region);
    config.endpoint = env.first(&["STORAGE_ENDPOINT", "TOS_ENDPOINT"]);
    Ok(config)
}

/// Load OSS (Alibaba Cloud) configuration
fn load_oss_config(env: &impl Lookup) -> Result<StorageConfig> {
    let bucket = env.require(&["STORAGE_BUCKET", "OSS_BUCKET"])?;
    let access_key_id = env.require(&["STORAGE_ACCESS_KEY_ID", "OSS_ACCESS_KEY_ID"])?;
    let access_key_secret =
        env.require(&["STORAGE_ACCESS_KEY_SECRET", "OSS_ACCESS_KEY_SECRET"])?;
    let region = env.first(&["STORAGE_REGION", "OSS_REGION"]);

    let mut config = StorageConfig::oss(bucket, access_key_id, access_key_secret, region);
    config.endpoint = env.first(&["STORAGE_ENDPOINT", "OSS_ENDPOINT"]);
    Ok(config)
}

/// Load S3 (AWS) or MinIO configuration
fn load_s3_config(env: &impl Lookup, provider_str: &str) -> Result<StorageConfig> {
    let is_minio = provider_str.eq_ignore_ascii_case("minio");
    let (bucket_key, access_key, secret_key) = if is_minio {
        ("MINIO_BUCKET", "MINIO_ACCESS_KEY", "MINIO_SECRET_KEY")
    } else {
        ("AWS_S3_BUCKET", "AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY")
    };

    let bucket = env.require(&["STORAGE_BUCKET", bucket_key])?;
    let access_key_id = env.require(&["STORAGE_ACCESS_KEY_ID", access_key])?;
    let secret_access_key = env.require(&["STORAGE_ACCESS_KEY_SECRET", secret_key])?;
    let region = env.first(&["STORAGE_REGION", "AWS_DEFAULT_REGION", "MINIO_DEFAULT_REGION"]);

    let mut config = StorageConfig::s3(bucket, access_key_id, secret_access_key, region);
    config.endpoint = if is_minio {
        Some(
            env.first(&["STORAGE_ENDPOINT", "MINIO_ENDPOINT"])
                .unwrap_or_else(|| "http://localhost:9000".to_string()),
        )
    } else {
        env.first(&["STORAGE_ENDPOINT"])
    };
    Ok(config)
}

/// Load filesystem configuration (for local runs)
fn load_fs_config(env: &impl Lookup) -> Result<StorageConfig> {
    let bucket = env
        .first(&["STORAGE_BUCKET"])
        .unwrap_or_else(|| DEFAULT_LOCAL_BUCKET.to_string());
    let root_path = env
        .first(&["STORAGE_ROOT_PATH"])
        .unwrap_or_else(|| DEFAULT_FS_ROOT.to_string());
    Ok(StorageConfig::fs(bucket, root_path))
}

/// Batch credentials derived from the loaded configuration.
pub fn credentials(config: &StorageConfig) -> Credentials {
    Credentials {
        access_key: config.access_key_id.clone().unwrap_or_default(),
        secret_key: config.access_key_secret.clone().unwrap_or_default(),
        bucket: config.bucket.clone(),
        region: config
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        endpoint: config.endpoint.clone(),
    }
}
