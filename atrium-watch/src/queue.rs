//! Queue catalog: authorized queue types and pending-item counts
//!
//! Authorization itself is the host forum's job; the catalog filters the
//! configured content types through a caller-supplied policy and reports
//! how many items sit in each queue. Whether a lone authorized queue
//! short-circuits the listing UI is surfaced as [`QueueLanding`], not
//! decided here.

use std::collections::BTreeMap;

use atrium_common::Result;
use sqlx::{Row, SqlitePool};

use crate::object::{ContentType, ContentTypes};

/// Caller-supplied authorization decisions, already evaluated by the host
pub trait AccessPolicy {
    /// May the caller view this content type's queue?
    fn may_view(&self, type_id: i64) -> bool;
    /// May the caller moderate this content type?
    fn may_moderate(&self, type_id: i64) -> bool;
}

/// What the presentation layer should do with the queue listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueLanding {
    /// Nothing viewable; the host shows its permission error
    NoneAuthorized,
    /// Exactly one queue; the host is expected to go straight to it
    Single(ContentType),
    /// Several queues; show the listing
    Listing(Vec<ContentType>),
}

/// Catalog over configured content types and their moderation queues
#[derive(Clone)]
pub struct QueueCatalog {
    pool: SqlitePool,
    types: ContentTypes,
}

impl QueueCatalog {
    pub fn new(pool: SqlitePool, types: ContentTypes) -> Self {
        Self { pool, types }
    }

    pub fn types(&self) -> &ContentTypes {
        &self.types
    }

    /// Configured types the caller may view, in configuration order.
    /// Team-only types additionally require moderate permission.
    pub fn authorized_types<'a>(&'a self, policy: &impl AccessPolicy) -> Vec<&'a ContentType> {
        self.types
            .iter()
            .filter(|t| policy.may_view(t.id))
            .filter(|t| !t.team_only || policy.may_moderate(t.id))
            .collect()
    }

    /// Landing decision for the queue overview page
    pub fn landing(&self, policy: &impl AccessPolicy) -> QueueLanding {
        let mut authed: Vec<ContentType> =
            self.authorized_types(policy).into_iter().cloned().collect();

        match authed.len() {
            0 => QueueLanding::NoneAuthorized,
            1 => QueueLanding::Single(authed.remove(0)),
            _ => QueueLanding::Listing(authed),
        }
    }

    /// Pending item count per requested type, in one grouped pass.
    /// Types with no pending items are present with 0, never absent.
    pub async fn pending_counts(&self, type_ids: &[i64]) -> Result<BTreeMap<i64, i64>> {
        let mut counts: BTreeMap<i64, i64> = type_ids.iter().map(|id| (*id, 0)).collect();

        if type_ids.is_empty() {
            return Ok(counts);
        }

        let set = type_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            r#"
            SELECT queue_type, COUNT(queue_id) AS cnt
            FROM queue_items
            WHERE queue_status > 0
                AND queue_type IN ({set})
            GROUP BY queue_type
            "#,
        );

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        for row in rows {
            let type_id: i64 = row.get("queue_type");
            counts.insert(type_id, row.get("cnt"));
        }

        Ok(counts)
    }
}
