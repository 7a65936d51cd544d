//! Read-mark tracking and unread reconciliation
//!
//! A read mark records when a user last viewed a tracked object. Several
//! independent marks can apply to one visible topic: its own mark, the
//! global support mark, the parent contribution's support mark, the queue
//! validation mark. The effective last-read time for a topic is the
//! maximum over its own mark and every *applicable* additional mark.

use atrium_common::Result;
use sqlx::SqlitePool;

use crate::model::TopicSnapshot;
use crate::object::ObjectKind;

/// When an additional read mark counts toward a topic's effective
/// last-read time. Evaluated against the topic's structural fields so new
/// indirect-read relationships stay data-driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    /// Always counts
    Always,
    /// Counts only when the tracked id equals the topic's parent id
    ParentMatches,
    /// Counts only for topics of the given type
    TopicKindMatches(ObjectKind),
}

/// One additional tracking key that may count as "read" for a topic
#[derive(Debug, Clone, Copy)]
pub struct AdditionalMark {
    pub kind: ObjectKind,
    pub object_id: i64,
    pub applies: Applicability,
}

impl AdditionalMark {
    /// Evaluate the applicability predicate against a topic
    pub fn applies_to(&self, topic: &TopicSnapshot) -> bool {
        match self.applies {
            Applicability::Always => true,
            Applicability::ParentMatches => topic.parent_id == self.object_id,
            Applicability::TopicKindMatches(kind) => topic.kind == Some(kind),
        }
    }
}

/// The additional tracking keys the subscription feed applies to topics:
/// the global support mark, the parent contribution's support mark, and
/// the queue-validation mark for validation discussions.
pub fn support_topic_marks(topic: &TopicSnapshot) -> Vec<AdditionalMark> {
    vec![
        AdditionalMark {
            kind: ObjectKind::Support,
            object_id: 0,
            applies: Applicability::Always,
        },
        AdditionalMark {
            kind: ObjectKind::Support,
            object_id: topic.parent_id,
            applies: Applicability::ParentMatches,
        },
        AdditionalMark {
            kind: ObjectKind::QueueDiscussion,
            object_id: 0,
            applies: Applicability::TopicKindMatches(ObjectKind::QueueDiscussion),
        },
    ]
}

/// Pure unread determination
pub fn is_unread(last_activity: i64, effective_last_read: i64) -> bool {
    last_activity > effective_last_read
}

/// Store for read marks, keyed (user, tracking kind, tracked id)
#[derive(Clone)]
pub struct ReadMarks {
    pool: SqlitePool,
}

impl ReadMarks {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record that the user viewed an object now. Marks only move forward;
    /// an older timestamp never overwrites a newer one.
    pub async fn mark_viewed(
        &self,
        user_id: i64,
        kind: ObjectKind,
        object_id: i64,
        now: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tracking (track_user_id, track_type, track_id, track_time)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (track_user_id, track_type, track_id)
                DO UPDATE SET track_time = MAX(track_time, excluded.track_time)
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

    /// Single mark lookup; 0 when the user never viewed the object
    pub async fn mark(&self, user_id: i64, kind: ObjectKind, object_id: i64) -> Result<i64> {
        let time: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT track_time FROM tracking
            WHERE track_user_id = ? AND track_type = ? AND track_id = ?
            "#,
        )
        .bind(user_id)
        .bind(kind.tag())
        .bind(object_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(time.unwrap_or(0))
    }

    /// Effective last-read time for a topic: the maximum over the topic's
    /// own mark and every additional mark whose predicate holds.
    pub async fn effective_last_read(
        &self,
        user_id: i64,
        topic: &TopicSnapshot,
        additional: &[AdditionalMark],
    ) -> Result<i64> {
        let mut last_read = self.mark(user_id, ObjectKind::Topic, topic.id).await?;

        for mark in additional {
            if !mark.applies_to(topic) {
                continue;
            }
            let time = self.mark(user_id, mark.kind, mark.object_id).await?;
            last_read = last_read.max(time);
        }

        Ok(last_read)
    }
}
