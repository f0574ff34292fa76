use crate::db::*;
use tempfile::NamedTempFile;

/// Queries after the pool is closed return an error rather than hanging or panicking
#[tokio::test]
async fn test_query_after_pool_close_returns_error() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.pool().close().await;

    let result = db.query_history(None, 10, 0).await;
    assert!(
        result.is_err(),
        "query_history after pool close should return an error, got: {:?}",
        result
    );
    assert!(db.count_history(None).await.is_err());
}
