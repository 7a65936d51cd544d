//! Tests for the subscription registry

use atrium_common::db::init_database;
use atrium_watch::{ObjectKind, SubscriptionRegistry};
use sqlx::SqlitePool;
use std::path::PathBuf;

fn test_db(name: &str) -> PathBuf {
    PathBuf::from(format!("/tmp/atrium-registry-{}-{}.db", name, std::process::id()))
}

async fn setup(name: &str) -> (SqlitePool, PathBuf) {
    let path = test_db(name);
    let _ = std::fs::remove_file(&path);
    let pool = init_database(&path).await.unwrap();
    (pool, path)
}

async fn seed_contrib(pool: &SqlitePool, id: i64, user_id: i64, name: &str, last_update: i64) {
    sqlx::query(
        "INSERT INTO contribs (contrib_id, contrib_user_id, contrib_name, contrib_last_update)
         VALUES (?, ?, ?, ?)",
    )
    .bind(id)
    .bind(user_id)
    .bind(name)
    .bind(last_update)
    .execute(pool)
    .await
    .unwrap();
}

async fn seed_topic(pool: &SqlitePool, id: i64, subject: &str, last_post_time: i64) {
    sqlx::query(
        "INSERT INTO topics (topic_id, topic_subject, topic_last_post_time) VALUES (?, ?, ?)",
    )
    .bind(id)
    .bind(subject)
    .bind(last_post_time)
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_subscribe_is_idempotent() {
    let (pool, path) = setup("idempotent").await;
    let registry = SubscriptionRegistry::new(pool.clone());

    registry.subscribe(1, ObjectKind::Contrib, 10, 100).await.unwrap();
    registry.subscribe(1, ObjectKind::Contrib, 10, 200).await.unwrap();

    assert_eq!(registry.count(1, &[ObjectKind::Contrib]).await.unwrap(), 1);

    // First mark time survives the duplicate subscribe
    let mark: i64 = sqlx::query_scalar(
        "SELECT watch_mark_time FROM watch WHERE watch_user_id = 1",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(mark, 100);

    drop(pool);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_unsubscribe_absent_is_noop() {
    let (pool, path) = setup("unsub-absent").await;
    let registry = SubscriptionRegistry::new(pool.clone());

    let result = registry.unsubscribe(1, ObjectKind::Topic, 99).await;
    assert!(result.is_ok());

    drop(pool);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_unsubscribe_removes_only_that_watch() {
    let (pool, path) = setup("unsub-one").await;
    let registry = SubscriptionRegistry::new(pool.clone());

    registry.subscribe(1, ObjectKind::Contrib, 10, 100).await.unwrap();
    registry.subscribe(1, ObjectKind::Topic, 10, 100).await.unwrap();

    registry.unsubscribe(1, ObjectKind::Contrib, 10).await.unwrap();

    assert!(!registry.is_subscribed(1, ObjectKind::Contrib, 10).await.unwrap());
    assert!(registry.is_subscribed(1, ObjectKind::Topic, 10).await.unwrap());

    drop(pool);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_unsubscribe_all_spans_users() {
    let (pool, path) = setup("unsub-all").await;
    let registry = SubscriptionRegistry::new(pool.clone());

    registry.subscribe(1, ObjectKind::Topic, 7, 100).await.unwrap();
    registry.subscribe(2, ObjectKind::Topic, 7, 100).await.unwrap();
    registry.subscribe(3, ObjectKind::Topic, 8, 100).await.unwrap();

    let removed = registry.unsubscribe_all(ObjectKind::Topic, 7).await.unwrap();
    assert_eq!(removed, 2);

    assert!(!registry.is_subscribed(1, ObjectKind::Topic, 7).await.unwrap());
    assert!(!registry.is_subscribed(2, ObjectKind::Topic, 7).await.unwrap());
    assert!(registry.is_subscribed(3, ObjectKind::Topic, 8).await.unwrap());

    drop(pool);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_count_matches_list_when_limit_exceeds_total() {
    let (pool, path) = setup("count-list").await;
    let registry = SubscriptionRegistry::new(pool.clone());

    for id in 1..=4 {
        registry.subscribe(1, ObjectKind::Contrib, id, 100 + id).await.unwrap();
    }
    // Another user's watches don't count
    registry.subscribe(2, ObjectKind::Contrib, 1, 100).await.unwrap();

    let kinds = [ObjectKind::Contrib, ObjectKind::Topic];
    let total = registry.count(1, &kinds).await.unwrap();
    let rows = registry.list(1, &kinds, 1000, 0).await.unwrap();
    assert_eq!(total, rows.len() as i64);
    assert_eq!(total, 4);

    drop(pool);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_list_orders_by_type_dependent_recency() {
    let (pool, path) = setup("recency").await;
    let registry = SubscriptionRegistry::new(pool.clone());

    seed_contrib(&pool, 10, 5, "Fresh extension", 300).await;
    seed_topic(&pool, 20, "Old topic", 200).await;
    seed_contrib(&pool, 11, 5, "Stale extension", 100).await;

    registry.subscribe(1, ObjectKind::Topic, 20, 50).await.unwrap();
    registry.subscribe(1, ObjectKind::Contrib, 10, 50).await.unwrap();
    registry.subscribe(1, ObjectKind::Contrib, 11, 50).await.unwrap();

    let rows = registry
        .list(1, &[ObjectKind::Contrib, ObjectKind::Topic], 100, 0)
        .await
        .unwrap();

    let order: Vec<(ObjectKind, i64, i64)> = rows
        .iter()
        .map(|r| (r.record.kind, r.record.object_id, r.recency))
        .collect();
    assert_eq!(
        order,
        vec![
            (ObjectKind::Contrib, 10, 300),
            (ObjectKind::Topic, 20, 200),
            (ObjectKind::Contrib, 11, 100),
        ]
    );

    drop(pool);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_list_section_watch_uses_own_mark_time() {
    let (pool, path) = setup("sections").await;
    let registry = SubscriptionRegistry::new(pool.clone());

    registry.subscribe(1, ObjectKind::Attention, 0, 400).await.unwrap();
    registry.subscribe(1, ObjectKind::Queue, 2, 500).await.unwrap();

    let rows = registry
        .list(
            1,
            &[ObjectKind::Support, ObjectKind::Queue, ObjectKind::Attention],
            100,
            0,
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].record.kind, ObjectKind::Queue);
    assert_eq!(rows[0].recency, 500);
    assert_eq!(rows[1].record.kind, ObjectKind::Attention);
    assert_eq!(rows[1].recency, 400);

    drop(pool);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_empty_kind_set() {
    let (pool, path) = setup("empty-kinds").await;
    let registry = SubscriptionRegistry::new(pool.clone());

    registry.subscribe(1, ObjectKind::Contrib, 10, 100).await.unwrap();

    assert_eq!(registry.count(1, &[]).await.unwrap(), 0);
    assert!(registry.list(1, &[], 100, 0).await.unwrap().is_empty());

    drop(pool);
    let _ = std::fs::remove_file(&path);
}
