use crate::*;
use serde_json::json;
use storeflow::error::{Error, Result};
use storeflow::node::ErrorCategory;

pub fn tests(client: &MockStorage, tests: &mut Vec<Trial>) {
    tests.extend(async_trials!(
        client,
        test_copy_object_within_bucket,
        test_copy_object_across_buckets,
        test_copy_object_requires_keys,
        test_copy_object_rejects_unknown_directive,
        test_copy_object_missing_source
    ));
}

pub async fn test_copy_object_within_bucket(client: MockStorage) -> Result<()> {
    client.insert_object(TEST_BUCKET, "src/a.txt", b"copy me");

    let output = run_one(
        &client,
        item("copyFile")
            .with_parameter("sourceKey", "src/a.txt")
            .with_parameter("destinationKey", "dst/a.txt"),
    )
    .await?;

    assert_eq!(output.json["copied"], json!(true));
    assert_eq!(output.json["metadataDirective"], json!("COPY"));
    assert_eq!(output.json["source"]["bucket"], json!(TEST_BUCKET));
    assert_eq!(output.json["source"]["key"], json!("src/a.txt"));
    assert_eq!(output.json["destination"]["key"], json!("dst/a.txt"));
    assert!(
        output.json["destination"]["url"]
            .as_str()
            .is_some_and(|url| url.contains("/dst/a.txt"))
    );
    assert!(output.json["etag"].is_string());
    assert_eq!(client.object(TEST_BUCKET, "dst/a.txt"), Some(b"copy me".to_vec()));
    Ok(())
}

pub async fn test_copy_object_across_buckets(client: MockStorage) -> Result<()> {
    client.insert_object("archive", "2023/report.pdf", b"%PDF");

    let output = run_one(
        &client,
        item("copyFile")
            .with_parameter("sourceBucket", "archive")
            .with_parameter("sourceKey", "2023/report.pdf")
            .with_parameter("destinationKey", "restored/report.pdf")
            .with_parameter("metadataDirective", "REPLACE"),
    )
    .await?;

    assert_eq!(output.json["source"]["bucket"], json!("archive"));
    assert_eq!(output.json["destination"]["bucket"], json!(TEST_BUCKET));
    assert_eq!(output.json["metadataDirective"], json!("REPLACE"));
    assert_eq!(
        client.object(TEST_BUCKET, "restored/report.pdf"),
        Some(b"%PDF".to_vec())
    );
    Ok(())
}

pub async fn test_copy_object_requires_keys(client: MockStorage) -> Result<()> {
    let err = run_one(
        &client,
        item("copyFile").with_parameter("destinationKey", "dst/a.txt"),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("sourceKey"), "{err}");

    let err = run_one(
        &client,
        item("copyFile").with_parameter("sourceKey", "src/a.txt"),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("destinationKey"), "{err}");

    assert_eq!(client.total_calls(), 0);
    Ok(())
}

pub async fn test_copy_object_rejects_unknown_directive(client: MockStorage) -> Result<()> {
    let err = run_one(
        &client,
        item("copyFile")
            .with_parameter("sourceKey", "src/a.txt")
            .with_parameter("destinationKey", "dst/a.txt")
            .with_parameter("metadataDirective", "MERGE"),
    )
    .await
    .unwrap_err();

    match err {
        Error::Node { category, .. } => assert_eq!(category, ErrorCategory::InvalidParameter),
        other => panic!("expected a node error, got {other:?}"),
    }
    assert_eq!(client.total_calls(), 0);
    Ok(())
}

pub async fn test_copy_object_missing_source(client: MockStorage) -> Result<()> {
    let err = run_one(
        &client,
        item("copyFile")
            .with_parameter("sourceKey", "ghost.txt")
            .with_parameter("destinationKey", "dst/ghost.txt"),
    )
    .await
    .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("File not found"), "{message}");
    assert!(message.contains("ghost.txt"), "{message}");
    Ok(())
}
