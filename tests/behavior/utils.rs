use libtest_mimic::{Failed, Trial};
use rand::Rng;
use rand::prelude::*;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};
use storeflow::error::Result;
use storeflow::node::{
    BatchContext, BinaryData, Credentials, Dispatcher, ExecutionContext, InputItem,
    OperationRegistry, OutputItem,
};
use storeflow::storage::{
    Acl, BucketSummary, CopyObjectOutput, CopyObjectRequest, CreateBucketOutput,
    CreateBucketRequest, DeleteObjectOutput, GetObjectOutput, ListObjectsOutput,
    ListObjectsRequest, ObjectMetadata, ObjectSummary, PresignRequest, PutObjectOutput,
    PutObjectRequest, StorageClient, StorageError, StorageResult,
};
use uuid::Uuid;

pub const TEST_BUCKET: &str = "test-bucket";
pub const TEST_REGION: &str = "cn-beijing";
const FIXED_TIMESTAMP: &str = "2024-05-01T08:00:00Z";

pub static TEST_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
});

pub fn credentials() -> Credentials {
    Credentials {
        access_key: "test-ak".to_string(),
        secret_key: "test-sk".to_string(),
        bucket: TEST_BUCKET.to_string(),
        region: TEST_REGION.to_string(),
        endpoint: None,
    }
}

/// An input item selecting `operation`.
pub fn item(operation: &str) -> InputItem {
    InputItem::default().with_parameter("operation", operation)
}

/// Run `batch` through the standard registry with the test credentials.
pub async fn run_batch<C: StorageClient>(
    client: &C,
    batch: &BatchContext,
) -> Result<Vec<OutputItem>> {
    let registry = OperationRegistry::standard();
    Dispatcher::new(&registry, client)
        .run(batch, Some(&credentials()))
        .await
}

/// Run a single item and return its output json.
pub async fn run_one<C: StorageClient>(client: &C, item: InputItem) -> Result<OutputItem> {
    let batch = BatchContext::new().with_item(item);
    let mut outputs = run_batch(client, &batch).await?;
    assert_eq!(outputs.len(), 1);
    Ok(outputs.remove(0))
}

pub fn binary(content: &[u8], mime_type: &str) -> BinaryData {
    BinaryData::from_bytes(content, mime_type, None)
}

pub struct Fixture {
    pub paths: Mutex<Vec<String>>,
}

impl Fixture {
    pub const fn new() -> Self {
        Self {
            paths: Mutex::new(vec![]),
        }
    }

    pub fn new_dir_path(&self) -> String {
        let path = format!("{}/", Uuid::new_v4());
        self.paths.lock().unwrap().push(path.clone());
        path
    }

    pub fn new_file_path(&self) -> String {
        let path = format!("{}.bin", Uuid::new_v4());
        self.paths.lock().unwrap().push(path.clone());
        path
    }

    /// A fresh path with random content of a size within `range`.
    pub fn new_file_with_range(&self, range: std::ops::Range<usize>) -> (String, Vec<u8>) {
        let path = self.new_file_path();
        let mut rng = rand::rng();
        let size = rng.random_range(range);
        let mut content = vec![0; size];
        rng.fill_bytes(&mut content);
        (path, content)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

pub static TEST_FIXTURE: Fixture = Fixture::new();

pub fn build_async_trial<C, F, Fut>(name: &str, client: &C, f: F) -> Trial
where
    C: Clone + Send + 'static,
    F: FnOnce(C) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<()>>,
{
    let handle = TEST_RUNTIME.handle().clone();
    let client = client.clone();

    Trial::test(format!("behavior::{name}"), move || {
        handle
            .block_on(f(client))
            .map_err(|err| Failed::from(err.to_string()))
    })
}

#[macro_export]
macro_rules! async_trials {
    ($client:ident, $($test:ident),*) => {
        vec![$(build_async_trial(stringify!($test), $client, $test),)*]
    };
}

/// Base storeflow command against the in-memory provider.
pub fn storeflow_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("storeflow").unwrap();
    cmd.env_clear()
        .env("RUST_LOG", "info")
        .env("STORAGE_PROVIDER", "memory")
        .env("STORAGE_BUCKET", TEST_BUCKET);
    cmd
}

/// Host context that records the order parameters are read in.
pub struct RecordingContext {
    inner: BatchContext,
    reads: RefCell<Vec<String>>,
}

impl RecordingContext {
    pub fn new(inner: BatchContext) -> Self {
        Self {
            inner,
            reads: RefCell::new(Vec::new()),
        }
    }

    pub fn reads(&self) -> Vec<String> {
        self.reads.borrow().clone()
    }
}

impl ExecutionContext for RecordingContext {
    fn parameter(&self, name: &str, item_index: usize) -> Option<&Value> {
        self.reads.borrow_mut().push(name.to_string());
        self.inner.parameter(name, item_index)
    }

    fn input_item(&self, item_index: usize) -> Option<&InputItem> {
        self.inner.input_item(item_index)
    }

    fn item_count(&self) -> usize {
        self.inner.item_count()
    }

    fn continue_on_fail(&self) -> bool {
        self.inner.continue_on_fail()
    }
}

#[derive(Debug, Clone)]
struct MockObject {
    body: Vec<u8>,
    content_type: Option<String>,
    etag: String,
    version_id: Option<String>,
    public: bool,
}

#[derive(Debug, Clone, Default)]
struct MockState {
    buckets: BTreeMap<String, BTreeMap<String, MockObject>>,
    calls: BTreeMap<&'static str, usize>,
    faults: BTreeMap<&'static str, StorageError>,
    presign: bool,
    versioning: bool,
    version_seq: u64,
}

/// In-memory storage double with call counting and fault injection.
///
/// Cloning snapshots the store: a clone starts from the same objects and
/// settings but does not share later changes.
#[derive(Debug)]
pub struct MockStorage {
    state: Arc<Mutex<MockState>>,
}

impl Clone for MockStorage {
    fn clone(&self) -> Self {
        Self {
            state: Arc::new(Mutex::new(self.lock().clone())),
        }
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStorage {
    /// A store holding the empty test bucket, with presigning enabled.
    pub fn new() -> Self {
        let mut state = MockState {
            presign: true,
            ..MockState::default()
        };
        state.buckets.insert(TEST_BUCKET.to_string(), BTreeMap::new());
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn set_presign(&self, enabled: bool) {
        self.lock().presign = enabled;
    }

    pub fn set_versioning(&self, enabled: bool) {
        self.lock().versioning = enabled;
    }

    /// Make every later call to `operation` fail with `error`.
    pub fn fail_on(&self, operation: &'static str, error: StorageError) {
        self.lock().faults.insert(operation, error);
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.lock().calls.get(operation).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    pub fn insert_object(&self, bucket: &str, key: &str, body: &[u8]) {
        let mut state = self.lock();
        let object = state.new_object(body.to_vec(), Some("text/plain".to_string()));
        state
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), object);
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|object| object.body.clone())
    }

    pub fn is_public(&self, bucket: &str, key: &str) -> bool {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .is_some_and(|object| object.public)
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.lock().buckets.contains_key(bucket)
    }

    /// Count the call, then fail if a fault is registered for it.
    fn enter(&self, operation: &'static str) -> StorageResult<MutexGuard<'_, MockState>> {
        let mut state = self.lock();
        *state.calls.entry(operation).or_insert(0) += 1;
        if let Some(error) = state.faults.get(operation).cloned() {
            return Err(error);
        }
        Ok(state)
    }
}

impl MockState {
    fn new_object(&mut self, body: Vec<u8>, content_type: Option<String>) -> MockObject {
        let version_id = self.next_version();
        MockObject {
            etag: etag_of(&body),
            body,
            content_type,
            version_id,
            public: false,
        }
    }

    fn next_version(&mut self) -> Option<String> {
        if !self.versioning {
            return None;
        }
        self.version_seq += 1;
        Some(format!("v{:04}", self.version_seq))
    }

    fn bucket(&self, bucket: &str) -> StorageResult<&BTreeMap<String, MockObject>> {
        self.buckets
            .get(bucket)
            .ok_or_else(|| StorageError::no_such_bucket(bucket))
    }

    fn bucket_mut(&mut self, bucket: &str) -> StorageResult<&mut BTreeMap<String, MockObject>> {
        self.buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::no_such_bucket(bucket))
    }

    fn object(&self, bucket: &str, key: &str) -> StorageResult<&MockObject> {
        self.bucket(bucket)?
            .get(key)
            .ok_or_else(|| StorageError::no_such_key(key))
    }
}

/// FNV-1a digest rendered the way services quote etags.
fn etag_of(body: &[u8]) -> String {
    let hash = body.iter().fold(0xcbf29ce484222325u64, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(0x100000001b3)
    });
    format!("\"{hash:016x}\"")
}

fn metadata_of(object: &MockObject) -> ObjectMetadata {
    ObjectMetadata {
        content_length: Some(object.body.len() as u64),
        content_type: object.content_type.clone(),
        etag: Some(object.etag.clone()),
        last_modified: Some(FIXED_TIMESTAMP.to_string()),
        storage_class: Some("STANDARD".to_string()),
        version_id: object.version_id.clone(),
    }
}

impl StorageClient for MockStorage {
    async fn head_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectMetadata> {
        let state = self.enter("head_object")?;
        state.object(bucket, key).map(metadata_of)
    }

    async fn put_object(&self, request: PutObjectRequest) -> StorageResult<PutObjectOutput> {
        let mut state = self.enter("put_object")?;
        state.bucket(&request.bucket)?;
        let object = state.new_object(request.body, request.content_type);
        let output = PutObjectOutput {
            etag: Some(object.etag.clone()),
            version_id: object.version_id.clone(),
        };
        state
            .bucket_mut(&request.bucket)?
            .insert(request.key, object);
        Ok(output)
    }

    async fn put_object_acl(&self, bucket: &str, key: &str, acl: Acl) -> StorageResult<()> {
        let mut state = self.enter("put_object_acl")?;
        let object = state
            .bucket_mut(bucket)?
            .get_mut(key)
            .ok_or_else(|| StorageError::no_such_key(key))?;
        object.public = matches!(acl, Acl::PublicRead | Acl::PublicReadWrite);
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<GetObjectOutput> {
        let state = self.enter("get_object")?;
        let object = state.object(bucket, key)?;
        Ok(GetObjectOutput {
            body: object.body.clone(),
            metadata: metadata_of(object),
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<DeleteObjectOutput> {
        let mut state = self.enter("delete_object")?;
        let version_id = state.next_version();
        let delete_marker = version_id.is_some();
        state.bucket_mut(bucket)?.remove(key);
        Ok(DeleteObjectOutput {
            version_id,
            delete_marker,
        })
    }

    async fn list_objects(&self, request: ListObjectsRequest) -> StorageResult<ListObjectsOutput> {
        let state = self.enter("list_objects")?;
        let prefix = request.prefix.as_deref().unwrap_or_default();
        let marker = request.marker.as_deref().unwrap_or_default();

        let mut objects = Vec::new();
        let mut common_prefixes: Vec<String> = Vec::new();
        for (key, object) in state.bucket(&request.bucket)? {
            if !key.starts_with(prefix) || key.as_str() <= marker {
                continue;
            }
            if let Some(delimiter) = request.delimiter.as_deref() {
                if let Some(pos) = key[prefix.len()..].find(delimiter) {
                    let folder = key[..prefix.len() + pos + delimiter.len()].to_string();
                    if !common_prefixes.contains(&folder) {
                        common_prefixes.push(folder);
                    }
                    continue;
                }
            }
            objects.push(ObjectSummary {
                key: key.clone(),
                size: object.body.len() as u64,
                last_modified: Some(FIXED_TIMESTAMP.to_string()),
                etag: Some(object.etag.clone()),
                storage_class: Some("STANDARD".to_string()),
                owner: Some("mock-owner".to_string()),
            });
        }

        let is_truncated = objects.len() > request.max_keys;
        objects.truncate(request.max_keys);
        let next_marker = is_truncated
            .then(|| objects.last().map(|o| o.key.clone()))
            .flatten();
        Ok(ListObjectsOutput {
            objects,
            common_prefixes,
            marker: request.marker,
            next_marker,
            is_truncated,
        })
    }

    async fn copy_object(&self, request: CopyObjectRequest) -> StorageResult<CopyObjectOutput> {
        let mut state = self.enter("copy_object")?;
        let source = state.object(&request.src_bucket, &request.src_key)?.clone();
        state.bucket(&request.bucket)?;
        let copy = state.new_object(source.body, source.content_type);
        let output = CopyObjectOutput {
            etag: Some(copy.etag.clone()),
            last_modified: Some(FIXED_TIMESTAMP.to_string()),
            version_id: copy.version_id.clone(),
        };
        state.bucket_mut(&request.bucket)?.insert(request.key, copy);
        Ok(output)
    }

    async fn create_bucket(
        &self,
        request: CreateBucketRequest,
    ) -> StorageResult<CreateBucketOutput> {
        let mut state = self.enter("create_bucket")?;
        if state.buckets.contains_key(&request.bucket) {
            return Err(StorageError::new(
                Some("BucketAlreadyExists"),
                Some(409),
                format!("The requested bucket name is not available: {}", request.bucket),
            ));
        }
        state.buckets.insert(request.bucket.clone(), BTreeMap::new());
        Ok(CreateBucketOutput {
            location: Some(format!("/{}", request.bucket)),
        })
    }

    async fn delete_bucket(&self, bucket: &str) -> StorageResult<()> {
        let mut state = self.enter("delete_bucket")?;
        if !state.bucket(bucket)?.is_empty() {
            return Err(StorageError::bucket_not_empty(bucket));
        }
        state.buckets.remove(bucket);
        Ok(())
    }

    async fn list_buckets(&self) -> StorageResult<Vec<BucketSummary>> {
        let state = self.enter("list_buckets")?;
        Ok(state
            .buckets
            .keys()
            .map(|name| BucketSummary {
                name: name.clone(),
                creation_date: Some(FIXED_TIMESTAMP.to_string()),
            })
            .collect())
    }

    async fn presign(&self, request: PresignRequest) -> StorageResult<String> {
        let state = self.enter("presign")?;
        if !state.presign {
            return Err(StorageError::not_implemented("presign"));
        }
        let mut url = format!(
            "https://{}.mock.local/{}?X-Method={}&X-Expires={}",
            request.bucket,
            request.key,
            request.method.as_str(),
            request.expires
        );
        if let Some(version_id) = &request.version_id {
            url.push_str(&format!("&versionId={version_id}"));
        }
        Ok(url)
    }
}
