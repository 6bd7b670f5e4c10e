use crate::*;
use predicates::prelude::*;
use serde_json::{Value, json};
use storeflow::error::Result;

pub fn tests(client: &MockStorage, tests: &mut Vec<Trial>) {
    tests.extend(async_trials!(
        client,
        test_cli_lists_operations,
        test_cli_round_trip_in_one_batch,
        test_cli_aborts_on_unsupported_operation,
        test_cli_continue_on_fail_flag,
        test_cli_requires_tos_credentials,
        test_cli_rejects_malformed_batch
    ));
}

pub async fn test_cli_lists_operations(_client: MockStorage) -> Result<()> {
    storeflow_cmd()
        .arg("operations")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("checkExistence\n"))
        .stdout(predicate::str::contains("getPreSignedUrl"));
    Ok(())
}

pub async fn test_cli_round_trip_in_one_batch(_client: MockStorage) -> Result<()> {
    let batch = json!({
        "items": [
            {
                "parameters": {"operation": "uploadFile", "filePath": "t/a.txt"},
                "binary": {"data": {"data": "aGVsbG8=", "mimeType": "text/plain"}}
            },
            {"parameters": {"operation": "checkExistence", "filePath": "t/a.txt"}},
            {"parameters": {"operation": "downloadFile", "filePath": "t/a.txt", "returnBinary": true}}
        ]
    });

    let output = storeflow_cmd()
        .arg("run")
        .write_stdin(batch.to_string())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let items: Value = serde_json::from_slice(&output)?;
    assert_eq!(items[0]["json"]["uploaded"], json!(true));
    assert_eq!(items[0]["json"]["size"], json!(5));
    assert_eq!(items[1]["json"]["exists"], json!(true));
    assert_eq!(items[2]["binary"]["a.txt"]["data"], json!("aGVsbG8="));
    assert_eq!(items[2]["pairedItem"]["item"], json!(2));
    Ok(())
}

pub async fn test_cli_aborts_on_unsupported_operation(_client: MockStorage) -> Result<()> {
    let batch = json!({"items": [{"parameters": {"operation": "renameFile"}}]});

    storeflow_cmd()
        .arg("run")
        .write_stdin(batch.to_string())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error (item 0)"))
        .stderr(predicate::str::contains("renameFile"));
    Ok(())
}

pub async fn test_cli_continue_on_fail_flag(_client: MockStorage) -> Result<()> {
    let batch = json!({
        "parameters": {"operation": "downloadFile"},
        "items": [{"parameters": {"filePath": "missing.txt"}}, {}]
    });

    let output = storeflow_cmd()
        .arg("run")
        .arg("--continue-on-fail")
        .write_stdin(batch.to_string())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let items: Value = serde_json::from_slice(&output)?;
    assert_eq!(items.as_array().map(Vec::len), Some(2));
    assert_eq!(items[0]["json"]["errorCode"], json!("NoSuchKey"));
    assert_eq!(items[0]["json"]["statusCode"], json!(404));
    assert_eq!(items[1]["json"]["itemIndex"], json!(1));
    assert_eq!(
        items[1]["json"]["error"],
        json!("Missing required parameter: filePath")
    );
    Ok(())
}

pub async fn test_cli_requires_tos_credentials(_client: MockStorage) -> Result<()> {
    storeflow_cmd()
        .env("STORAGE_PROVIDER", "tos")
        .arg("run")
        .write_stdin("{}")
        .assert()
        .failure()
        .stderr(predicate::str::contains("STORAGE_ACCESS_KEY_ID or TOS_ACCESS_KEY"));
    Ok(())
}

pub async fn test_cli_rejects_malformed_batch(_client: MockStorage) -> Result<()> {
    storeflow_cmd()
        .arg("run")
        .write_stdin("[not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read batch from '<stdin>'"));
    Ok(())
}
