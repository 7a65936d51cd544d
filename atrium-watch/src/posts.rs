//! Post lifecycle hooks for the cumulative topic post counter
//!
//! Called by the host when a post is created, changes visibility tier, or
//! is hard-deleted. The counter lives as a serialized string on the topic
//! row, so the update is a read-modify-write; concurrent requests against
//! the same topic are handled optimistically: the write only lands if the
//! counter still holds the value that was read, otherwise the change is
//! recomputed against the fresh value and retried.

use atrium_common::{db::retry_on_lock, Error, Result};
use sqlx::SqlitePool;
use tracing::debug;

use crate::access::{AccessTier, PostCounts};

/// Compare-and-swap attempts before giving up on a hot topic
const MAX_CAS_ATTEMPTS: u32 = 8;

/// Total time budget for lock retries per attempt
const LOCK_WAIT_MS: u64 = 5000;

/// Apply a post visibility change to a topic's cumulative counter.
///
/// `new_tier` is `None` for a hard delete, `old_tier` is `None` for a new
/// post; an unchanged tier returns without touching the store. Returns the
/// counter value after the change.
pub async fn apply_change(
    pool: &SqlitePool,
    topic_id: i64,
    new_tier: Option<AccessTier>,
    old_tier: Option<AccessTier>,
) -> Result<PostCounts> {
    if new_tier == old_tier {
        let raw = load_counter(pool, topic_id).await?;
        return PostCounts::parse(&raw);
    }

    for attempt in 1..=MAX_CAS_ATTEMPTS {
        let seen = load_counter(pool, topic_id).await?;

        let mut counts = PostCounts::parse(&seen)?;
        counts.apply_change(new_tier, old_tier);
        let updated = counts.serialize();

        let swapped = retry_on_lock("topic_postcount_update", LOCK_WAIT_MS, || async {
            let result = sqlx::query(
                r#"
                UPDATE topics SET topic_posts = ?
                WHERE topic_id = ? AND topic_posts = ?
                "#,
            )
            .bind(&updated)
            .bind(topic_id)
            .bind(&seen)
            .execute(pool)
            .await?;

            Ok(result.rows_affected() == 1)
        })
        .await?;

        if swapped {
            return Ok(counts);
        }

        // Someone else updated the counter between read and write
        debug!(topic_id, attempt, "Post counter changed concurrently, retrying");
    }

    Err(Error::Internal(format!(
        "Post counter update for topic {} did not settle after {} attempts",
        topic_id, MAX_CAS_ATTEMPTS
    )))
}

async fn load_counter(pool: &SqlitePool, topic_id: i64) -> Result<String> {
    let raw: Option<String> =
        sqlx::query_scalar("SELECT topic_posts FROM topics WHERE topic_id = ?")
            .bind(topic_id)
            .fetch_optional(pool)
            .await?;

    raw.ok_or_else(|| Error::NotFound(format!("Topic {}", topic_id)))
}
