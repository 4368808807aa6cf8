//! Tests for partition module

use super::*;
use futures::TryStreamExt;
use serde_json::json;

async fn collect(router: &dyn PartitionRouter) -> Vec<StreamSlice> {
    router.slices().try_collect().await.unwrap()
}

// ============================================================================
// StreamSlice Tests
// ============================================================================

#[test]
fn test_stream_slice_whole() {
    let slice = StreamSlice::whole();
    assert!(slice.is_whole());
    assert!(slice.as_object().is_none());
    assert_eq!(slice.get("anything"), None);
    assert_eq!(slice, StreamSlice::default());
}

#[test]
fn test_stream_slice_with_values() {
    let slice = StreamSlice::whole()
        .with_value("page", 2)
        .with_string("region", "eu");

    assert!(!slice.is_whole());
    assert_eq!(slice.get("page"), Some(&json!(2)));
    assert_eq!(slice.get_str("region"), Some("eu"));
    assert_eq!(slice.get_str("page"), None);
}

#[test]
fn test_stream_slice_serializes_transparently() {
    assert_eq!(serde_json::to_value(StreamSlice::whole()).unwrap(), json!(null));
    assert_eq!(
        serde_json::to_value(StreamSlice::whole().with_value("page", 1)).unwrap(),
        json!({"page": 1})
    );

    let restored: StreamSlice = serde_json::from_value(json!({"offset": 10})).unwrap();
    assert_eq!(restored.get("offset"), Some(&json!(10)));
}

#[test]
fn test_stream_slice_from_object() {
    let object = json!({"file": "a.jsonl"}).as_object().cloned().unwrap();
    let slice = StreamSlice::from(object.clone());
    assert_eq!(slice.into_inner(), Some(object));
    assert!(StreamSlice::from(None).is_whole());
}

// ============================================================================
// ListRouter Tests
// ============================================================================

#[tokio::test]
async fn test_list_router_basic() {
    let router = ListRouter::new(
        vec!["us".to_string(), "eu".to_string(), "apac".to_string()],
        "region",
    );

    let slices = collect(&router).await;
    assert_eq!(slices.len(), 3);
    assert_eq!(slices[0].get_str("region"), Some("us"));
    assert_eq!(slices[1].get_str("region"), Some("eu"));
    assert_eq!(slices[2].get_str("region"), Some("apac"));
}

#[tokio::test]
async fn test_list_router_empty() {
    let router = ListRouter::new(vec![], "region");
    assert!(collect(&router).await.is_empty());
}

#[tokio::test]
async fn test_list_router_into_slices() {
    let router = ListRouter::new(vec!["a.jsonl".to_string(), "b.jsonl".to_string()], "file");
    let slices: Vec<StreamSlice> = router.into_slices().try_collect().await.unwrap();
    assert_eq!(slices.len(), 2);
    assert_eq!(slices[1].get_str("file"), Some("b.jsonl"));
}

#[test]
fn test_list_router_partition_field() {
    let router = ListRouter::new(vec!["a".to_string()], "account_id");
    assert_eq!(router.partition_field(), "account_id");
}

