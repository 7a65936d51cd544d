//! Tests for the queue catalog

use atrium_common::db::init_database;
use atrium_watch::queue::{AccessPolicy, QueueCatalog, QueueLanding};
use atrium_watch::{ContentType, ContentTypes};
use sqlx::SqlitePool;
use std::path::PathBuf;

fn test_db(name: &str) -> PathBuf {
    PathBuf::from(format!("/tmp/atrium-queue-{}-{}.db", name, std::process::id()))
}

async fn setup(name: &str) -> (SqlitePool, PathBuf) {
    let path = test_db(name);
    let _ = std::fs::remove_file(&path);
    let pool = init_database(&path).await.unwrap();
    (pool, path)
}

fn content_types() -> ContentTypes {
    ContentTypes::new(vec![
        ContentType { id: 1, name: "Extensions".into(), slug: "extensions".into(), team_only: false },
        ContentType { id: 2, name: "Styles".into(), slug: "styles".into(), team_only: false },
        ContentType { id: 3, name: "Converters".into(), slug: "converters".into(), team_only: false },
    ])
}

struct ViewSet(Vec<i64>);

impl AccessPolicy for ViewSet {
    fn may_view(&self, type_id: i64) -> bool {
        self.0.contains(&type_id)
    }
    fn may_moderate(&self, _type_id: i64) -> bool {
        true
    }
}

async fn seed_queue_item(pool: &SqlitePool, queue_type: i64, status: i64) {
    sqlx::query("INSERT INTO queue_items (queue_type, queue_status) VALUES (?, ?)")
        .bind(queue_type)
        .bind(status)
        .execute(pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_pending_counts_zero_fill() {
    let (pool, path) = setup("zero-fill").await;
    let catalog = QueueCatalog::new(pool.clone(), content_types());

    // Two pending items for type 1, one closed item that must not count
    seed_queue_item(&pool, 1, 1).await;
    seed_queue_item(&pool, 1, 2).await;
    seed_queue_item(&pool, 1, 0).await;
    // A pending item for a type we don't ask about
    seed_queue_item(&pool, 9, 1).await;

    let counts = catalog.pending_counts(&[1, 2, 3]).await.unwrap();

    assert_eq!(counts.len(), 3);
    assert_eq!(counts[&1], 2);
    assert_eq!(counts[&2], 0);
    assert_eq!(counts[&3], 0);
    assert!(!counts.contains_key(&9));

    drop(pool);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_pending_counts_empty_request() {
    let (pool, path) = setup("empty").await;
    let catalog = QueueCatalog::new(pool.clone(), content_types());

    seed_queue_item(&pool, 1, 1).await;

    let counts = catalog.pending_counts(&[]).await.unwrap();
    assert!(counts.is_empty());

    drop(pool);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_landing_distinguishes_zero_one_many() {
    let (pool, path) = setup("landing").await;
    let catalog = QueueCatalog::new(pool.clone(), content_types());

    assert_eq!(catalog.landing(&ViewSet(vec![])), QueueLanding::NoneAuthorized);

    match catalog.landing(&ViewSet(vec![3])) {
        QueueLanding::Single(t) => assert_eq!(t.slug, "converters"),
        other => panic!("expected Single, got {:?}", other),
    }

    match catalog.landing(&ViewSet(vec![1, 3])) {
        QueueLanding::Listing(list) => {
            assert_eq!(list.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3]);
        }
        other => panic!("expected Listing, got {:?}", other),
    }

    drop(pool);
    let _ = std::fs::remove_file(&path);
}
