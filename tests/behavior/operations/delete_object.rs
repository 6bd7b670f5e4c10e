use crate::*;
use serde_json::json;
use storeflow::error::{Error, Result};
use storeflow::node::ErrorCategory;
use storeflow::storage::StorageError;

pub fn tests(client: &MockStorage, tests: &mut Vec<Trial>) {
    tests.extend(async_trials!(
        client,
        test_delete_object_removes_object,
        test_delete_object_versioned_creates_marker,
        test_delete_object_access_denied_mentions_iam,
        test_delete_object_requires_file_path
    ));
}

pub async fn test_delete_object_removes_object(client: MockStorage) -> Result<()> {
    client.insert_object(TEST_BUCKET, "t/a.txt", b"hello");

    let output = run_one(&client, item("deleteFile").with_parameter("filePath", "t/a.txt")).await?;

    assert_eq!(
        output.json,
        json!({
            "deleted": true,
            "path": "t/a.txt",
            "bucket": TEST_BUCKET,
            "deleteMarker": false
        })
    );
    assert_eq!(client.object(TEST_BUCKET, "t/a.txt"), None);
    Ok(())
}

pub async fn test_delete_object_versioned_creates_marker(client: MockStorage) -> Result<()> {
    client.set_versioning(true);
    client.insert_object(TEST_BUCKET, "t/a.txt", b"hello");

    let output = run_one(&client, item("deleteFile").with_parameter("filePath", "t/a.txt")).await?;

    assert_eq!(output.json["deleteMarker"], json!(true));
    assert!(output.json["versionId"].is_string());
    Ok(())
}

pub async fn test_delete_object_access_denied_mentions_iam(client: MockStorage) -> Result<()> {
    client.fail_on("delete_object", StorageError::access_denied("Access Denied"));

    let err = run_one(&client, item("deleteFile").with_parameter("filePath", "t/a.txt"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("IAM"), "{err}");
    assert_eq!(err.item_index(), Some(0));
    match err {
        Error::Node { category, .. } => assert_eq!(category, ErrorCategory::AccessDenied),
        other => panic!("expected a node error, got {other:?}"),
    }
    Ok(())
}

pub async fn test_delete_object_requires_file_path(client: MockStorage) -> Result<()> {
    let err = run_one(&client, item("deleteFile").with_parameter("filePath", ""))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("filePath"));
    assert_eq!(client.total_calls(), 0);
    Ok(())
}
