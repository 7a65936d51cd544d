//! Subscription registry: CRUD over polymorphic watch records
//!
//! Watch records are keyed (user, object kind, object id) and the registry
//! treats every kind as an opaque pair; resolving what an id means is the
//! feed's job. Subscribe and unsubscribe are idempotent.

use atrium_common::Result;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::model::{WatchListRow, WatchRecord};
use crate::object::ObjectKind;

/// Registry over the `watch` table
#[derive(Clone)]
pub struct SubscriptionRegistry {
    pool: SqlitePool,
}

impl SubscriptionRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Subscribe a user to an object. Subscribing twice is a no-op.
    pub async fn subscribe(
        &self,
        user_id: i64,
        kind: ObjectKind,
        object_id: i64,
        now: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO watch (watch_user_id, watch_object_type, watch_object_id, watch_mark_time)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (watch_user_id, watch_object_type, watch_object_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(kind.tag())
        .bind(object_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove one user's watch. Removing an absent watch is a no-op.
    pub async fn unsubscribe(&self, user_id: i64, kind: ObjectKind, object_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM watch
            WHERE watch_user_id = ? AND watch_object_type = ? AND watch_object_id = ?
            "#,
        )
        .bind(user_id)
        .bind(kind.tag())
        .bind(object_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove every user's watch on an object (the object itself was
    /// deleted). Returns the number of watches removed.
    pub async fn unsubscribe_all(&self, kind: ObjectKind, object_id: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM watch
            WHERE watch_object_type = ? AND watch_object_id = ?
            "#,
        )
        .bind(kind.tag())
        .bind(object_id)
        .execute(&self.pool)
        .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            debug!(
                kind = kind.tag(),
                object_id, removed, "Removed watches for deleted object"
            );
        }

        Ok(removed)
    }

    /// Whether a watch exists
    pub async fn is_subscribed(
        &self,
        user_id: i64,
        kind: ObjectKind,
        object_id: i64,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM watch
            WHERE watch_user_id = ? AND watch_object_type = ? AND watch_object_id = ?
            "#,
        )
        .bind(user_id)
        .bind(kind.tag())
        .bind(object_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Number of watch records for a user across the given kinds
    pub async fn count(&self, user_id: i64, kinds: &[ObjectKind]) -> Result<i64> {
        if kinds.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "SELECT COUNT(*) FROM watch
             WHERE watch_user_id = ? AND watch_object_type IN ({})",
            kind_set(kinds)
        );

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Raw watch rows for a user in descending recency order.
    ///
    /// Recency is type-dependent: contribution and support watches take the
    /// contribution's last update, topic watches the topic's last post
    /// time, everything else the watch's own mark time. Liveness is not
    /// resolved here; a watch whose joined object is gone still comes back
    /// (with its mark time as recency) so the feed can self-heal it.
    pub async fn list(
        &self,
        user_id: i64,
        kinds: &[ObjectKind],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WatchListRow>> {
        if kinds.is_empty() {
            return Ok(Vec::new());
        }

        let contrib = ObjectKind::Contrib.tag();
        let support = ObjectKind::Support.tag();
        let topic = ObjectKind::Topic.tag();

        let sql = format!(
            r#"
            SELECT w.watch_user_id, w.watch_object_type, w.watch_object_id, w.watch_mark_time,
                COALESCE(
                    CASE w.watch_object_type
                        WHEN {contrib} THEN c.contrib_last_update
                        WHEN {support} THEN c.contrib_last_update
                        WHEN {topic} THEN t.topic_last_post_time
                        ELSE w.watch_mark_time
                    END,
                    w.watch_mark_time
                ) AS recency
            FROM watch w
            LEFT JOIN contribs c
                ON w.watch_object_type IN ({contrib}, {support})
                AND c.contrib_id = w.watch_object_id
            LEFT JOIN topics t
                ON w.watch_object_type = {topic}
                AND t.topic_id = w.watch_object_id
            WHERE w.watch_user_id = ?
                AND w.watch_object_type IN ({set})
            ORDER BY recency DESC
            LIMIT ? OFFSET ?
            "#,
            contrib = contrib,
            support = support,
            topic = topic,
            set = kind_set(kinds),
        );

        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let kind = ObjectKind::from_tag(row.get("watch_object_type"))?;
            out.push(WatchListRow {
                record: WatchRecord {
                    user_id: row.get("watch_user_id"),
                    kind,
                    object_id: row.get("watch_object_id"),
                    mark_time: row.get("watch_mark_time"),
                },
                recency: row.get("recency"),
            });
        }

        Ok(out)
    }
}

/// Comma-separated tag list for an `IN (...)` clause. Tags come from the
/// closed [`ObjectKind`] enum, never from user input.
fn kind_set(kinds: &[ObjectKind]) -> String {
    kinds
        .iter()
        .map(|k| k.tag().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
