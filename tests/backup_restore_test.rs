//! Integration tests for the backup pipeline: object store client, snapshot
//! codec, and the restore tool, against a mocked S3 endpoint.
//!
//! Run with: cargo test --test backup_restore_test

use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use podpiska::core::error::BackupError;
use podpiska::storage::backup::{BackupSettings, BackupWorker, CycleOutcome};
use podpiska::storage::object_store::{ObjectStoreClient, StoreLocation};
use podpiska::storage::restore;

const BUCKET: &str = "test-bucket";

fn test_location(uri: &str) -> StoreLocation {
    StoreLocation {
        endpoint: uri.to_string(),
        region: "us-west-002".to_string(),
        access_key_id: "test-key".to_string(),
        secret_key: "test-secret".to_string(),
        bucket: BUCKET.to_string(),
    }
}

/// Minimal ListObjectsV2 response body
fn list_xml(entries: &[(&str, &str, u64)], next_token: Option<&str>) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <ListBucketResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\n\
         <Name>test-bucket</Name>\n<Prefix></Prefix>\n<MaxKeys>1000</MaxKeys>\n",
    );
    xml.push_str(&format!("<KeyCount>{}</KeyCount>\n", entries.len()));
    xml.push_str(&format!("<IsTruncated>{}</IsTruncated>\n", next_token.is_some()));
    if let Some(token) = next_token {
        xml.push_str(&format!("<NextContinuationToken>{}</NextContinuationToken>\n", token));
    }
    for (key, last_modified, size) in entries {
        xml.push_str(&format!(
            "<Contents>\n<Key>{}</Key>\n<LastModified>{}</LastModified>\n\
             <ETag>&quot;etag&quot;</ETag>\n<Size>{}</Size>\n\
             <StorageClass>STANDARD</StorageClass>\n</Contents>\n",
            key, last_modified, size
        ));
    }
    xml.push_str("</ListBucketResult>");
    xml
}

fn gzip_bytes(content: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content).unwrap();
    encoder.finish().unwrap()
}

fn worker_for(source: &Path, temp_dir: &Path, uri: &str) -> BackupWorker {
    let location = test_location(uri);
    BackupWorker::new(
        BackupSettings {
            source_path: source.to_path_buf(),
            temp_dir: temp_dir.to_path_buf(),
            interval: std::time::Duration::from_secs(3600),
            cooldown: std::time::Duration::from_secs(300),
        },
        Arc::new(move || Some(location.clone())),
        CancellationToken::new(),
    )
}

// ============================================================================
// Backup (capture + upload)
// ============================================================================

#[tokio::test]
async fn test_backup_once_uploads_gzipped_snapshot() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let temp_dir = tempfile::tempdir().unwrap();

    let source = dir.path().join("db.bin");
    let content: Vec<u8> = (0..10_240).map(|i| (i % 199) as u8).collect();
    fs::write(&source, &content).unwrap();

    Mock::given(method("PUT"))
        .and(path_regex(r"^/test-bucket/backup_\d{8}_\d{6}\.db\.gz$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let worker = worker_for(&source, temp_dir.path(), &mock_server.uri());
    let outcome = worker.backup_once().await.unwrap();

    let name = match outcome {
        CycleOutcome::Uploaded(name) => name,
        other => panic!("expected Uploaded, got {:?}", other),
    };
    assert!(name.starts_with("backup_"));
    assert!(name.ends_with(".db.gz"));

    // The uploaded body must decompress back to the source bytes
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let mut decoder = GzDecoder::new(&requests[0].body[..]);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed).unwrap();
    assert_eq!(decompressed, content);

    // Temporary blob is removed after the upload
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_backup_once_upload_failure_is_transport_error() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let temp_dir = tempfile::tempdir().unwrap();

    let source = dir.path().join("db.bin");
    fs::write(&source, b"payload").unwrap();

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let worker = worker_for(&source, temp_dir.path(), &mock_server.uri());
    let err = worker.backup_once().await.unwrap_err();
    assert!(matches!(err, BackupError::Transport(_)));

    // Temp blob is removed even on failure
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_backups_sorted_by_created_at_descending() {
    let mock_server = MockServer::start().await;

    // Deliberately out of order, and with a name that contradicts the
    // metadata ordering: created_at must win
    let body = list_xml(
        &[
            ("backup_20240102_000000.db.gz", "2024-01-02T00:00:00.000Z", 200),
            ("backup_20249999_999999.db.gz", "2024-01-01T00:00:00.000Z", 100),
            ("backup_20240103_000000.db.gz", "2024-01-03T00:00:00.000Z", 300),
        ],
        None,
    );

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let client = ObjectStoreClient::new(&test_location(&mock_server.uri())).unwrap();
    let backups = restore::list_backups(&client).await.unwrap();

    let names: Vec<&str> = backups.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "backup_20240103_000000.db.gz",
            "backup_20240102_000000.db.gz",
            "backup_20249999_999999.db.gz",
        ]
    );
    assert!(backups.windows(2).all(|w| w[0].created_at > w[1].created_at));
    assert_eq!(backups[0].size, 300);
}

#[tokio::test]
async fn test_list_follows_continuation_tokens() {
    let mock_server = MockServer::start().await;

    let page2 = list_xml(&[("backup_20240101_000000.db.gz", "2024-01-01T00:00:00.000Z", 10)], None);
    let page1 = list_xml(
        &[
            ("backup_20240103_000000.db.gz", "2024-01-03T00:00:00.000Z", 30),
            ("backup_20240102_000000.db.gz", "2024-01-02T00:00:00.000Z", 20),
        ],
        Some("page-2"),
    );

    // More specific mock first: wiremock picks the first match in mount order
    Mock::given(method("GET"))
        .and(query_param("continuation-token", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page2))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page1))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ObjectStoreClient::new(&test_location(&mock_server.uri())).unwrap();
    let backups = restore::list_backups(&client).await.unwrap();

    // All three snapshots visible; a truncated listing must not hide the older one
    assert_eq!(backups.len(), 3);
    assert_eq!(backups[2].name, "backup_20240101_000000.db.gz");
}

#[tokio::test]
async fn test_list_empty_bucket_is_not_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(list_xml(&[], None)))
        .mount(&mock_server)
        .await;

    let client = ObjectStoreClient::new(&test_location(&mock_server.uri())).unwrap();
    let backups = restore::list_backups(&client).await.unwrap();
    assert!(backups.is_empty());
}

// ============================================================================
// Restore
// ============================================================================

#[tokio::test]
async fn test_restore_reproduces_database_and_verifies_tables() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let temp_dir = tempfile::tempdir().unwrap();

    // Build a real SQLite file so verification has something to inspect
    let db_path = dir.path().join("source.db");
    {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        conn.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, username TEXT)", [])
            .unwrap();
        conn.execute("CREATE TABLE subscriptions (id INTEGER PRIMARY KEY)", [])
            .unwrap();
        conn.execute("INSERT INTO users (id, username) VALUES (1, 'alice')", [])
            .unwrap();
    }
    let db_bytes = fs::read(&db_path).unwrap();

    let key = "backup_20240101_120000.db.gz";
    Mock::given(method("GET"))
        .and(path(format!("/test-bucket/{}", key)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip_bytes(&db_bytes)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ObjectStoreClient::new(&test_location(&mock_server.uri())).unwrap();
    let output = dir.path().join("restored.db");
    let report = restore::restore(&client, key, &output, temp_dir.path()).await.unwrap();

    assert_eq!(fs::read(&output).unwrap(), db_bytes);
    assert_eq!(report.size_bytes, db_bytes.len() as u64);

    let tables = report.tables.expect("restored SQLite file should verify");
    assert!(tables.contains(&"users".to_string()));
    assert!(tables.contains(&"subscriptions".to_string()));

    // Download blob cleaned up
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_restore_verification_failure_keeps_file() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let temp_dir = tempfile::tempdir().unwrap();

    let content = b"not a sqlite database at all".to_vec();
    let key = "backup_20240101_120000.db.gz";
    Mock::given(method("GET"))
        .and(path(format!("/test-bucket/{}", key)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip_bytes(&content)))
        .mount(&mock_server)
        .await;

    let client = ObjectStoreClient::new(&test_location(&mock_server.uri())).unwrap();
    let output = dir.path().join("restored.db");
    let report = restore::restore(&client, key, &output, temp_dir.path()).await.unwrap();

    // Verification is advisory: no table info, but the file stays on disk
    assert!(report.tables.is_none());
    assert_eq!(fs::read(&output).unwrap(), content);
}

#[tokio::test]
async fn test_restore_missing_snapshot_leaves_output_untouched() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let temp_dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = ObjectStoreClient::new(&test_location(&mock_server.uri())).unwrap();
    let output = dir.path().join("restored.db");
    let err = restore::restore(&client, "backup_20990101_000000.db.gz", &output, temp_dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, BackupError::NotFound(_)));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_restore_latest_empty_bucket() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(list_xml(&[], None)))
        .mount(&mock_server)
        .await;

    let client = ObjectStoreClient::new(&test_location(&mock_server.uri())).unwrap();
    let err = restore::restore_latest(&client, &dir.path().join("out.db"), dir.path())
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::NoBackupsFound));
}

#[tokio::test]
async fn test_restore_latest_picks_newest_snapshot() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let temp_dir = tempfile::tempdir().unwrap();

    let content = b"latest snapshot contents".to_vec();
    let listing = list_xml(
        &[
            ("backup_20240101_000000.db.gz", "2024-01-01T00:00:00.000Z", 10),
            ("backup_20240102_000000.db.gz", "2024-01-02T00:00:00.000Z", 20),
        ],
        None,
    );

    // Only the newest key is mocked for download; fetching the older one
    // would fail the test with an unmatched request
    Mock::given(method("GET"))
        .and(path("/test-bucket/backup_20240102_000000.db.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip_bytes(&content)))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing))
        .mount(&mock_server)
        .await;

    let client = ObjectStoreClient::new(&test_location(&mock_server.uri())).unwrap();
    let output = dir.path().join("out.db");
    let report = restore::restore_latest(&client, &output, temp_dir.path()).await.unwrap();

    assert_eq!(report.snapshot, "backup_20240102_000000.db.gz");
    assert_eq!(fs::read(&output).unwrap(), content);
}
