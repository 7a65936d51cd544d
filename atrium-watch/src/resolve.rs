//! Object and identity resolution
//!
//! The feed resolves watch records against live object state through the
//! traits defined here. [`StoreObjects`] resolves contributions and topics
//! from the shared record store; identity resolution belongs to the host
//! forum's user system, with [`StaticIdentities`] as a map-backed
//! implementation for hosts (and tests) that preload identities.

use std::collections::HashMap;
use std::future::Future;

use atrium_common::Result;
use sqlx::{Row, SqlitePool};

use crate::access::AccessTier;
use crate::model::{ContribSnapshot, TopicSnapshot, UserIdentity};
use crate::object::ObjectKind;

/// Live-object lookup, dispatch target of the feed's kind table
pub trait ObjectResolver {
    /// Resolve a contribution; `None` when it no longer exists
    fn contribution(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<ContribSnapshot>>> + Send;

    /// Resolve a topic; `None` when it no longer exists
    fn topic(&self, id: i64) -> impl Future<Output = Result<Option<TopicSnapshot>>> + Send;
}

/// Batched user identity lookup. One call per feed page; absent users are
/// simply missing from the returned map.
pub trait IdentityResolver {
    fn resolve_users(
        &self,
        ids: &[i64],
    ) -> impl Future<Output = Result<HashMap<i64, UserIdentity>>> + Send;
}

/// Resolver over the shared record store's contribs/topics tables
#[derive(Clone)]
pub struct StoreObjects {
    pool: SqlitePool,
}

impl StoreObjects {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ObjectResolver for StoreObjects {
    async fn contribution(&self, id: i64) -> Result<Option<ContribSnapshot>> {
        let row = sqlx::query(
            r#"
            SELECT contrib_id, contrib_user_id, contrib_type, contrib_name,
                   contrib_last_update, contrib_downloads, contrib_views
            FROM contribs
            WHERE contrib_id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(row) => Some(ContribSnapshot {
                id: row.get("contrib_id"),
                user_id: row.get("contrib_user_id"),
                type_id: row.get("contrib_type"),
                name: row.get("contrib_name"),
                last_update: row.get("contrib_last_update"),
                downloads: row.get("contrib_downloads"),
                views: row.get("contrib_views"),
            }),
            None => None,
        })
    }

    async fn topic(&self, id: i64) -> Result<Option<TopicSnapshot>> {
        let row = sqlx::query(
            r#"
            SELECT topic_id, topic_type, parent_id, topic_access, topic_subject,
                   topic_time, topic_posts, topic_first_post_user_id,
                   topic_last_post_id, topic_last_post_user_id, topic_last_post_time
            FROM topics
            WHERE topic_id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        Ok(Some(TopicSnapshot {
            id: row.get("topic_id"),
            // Plain discussion topics carry no kind tag
            kind: ObjectKind::from_tag(row.get("topic_type")).ok(),
            parent_id: row.get("parent_id"),
            access: AccessTier::from_tag(row.get("topic_access"))?,
            subject: row.get("topic_subject"),
            time: row.get("topic_time"),
            posts: row.get("topic_posts"),
            first_post_user_id: row.get("topic_first_post_user_id"),
            last_post_id: row.get("topic_last_post_id"),
            last_post_user_id: row.get("topic_last_post_user_id"),
            last_post_time: row.get("topic_last_post_time"),
        }))
    }
}

/// Map-backed identity resolver
#[derive(Debug, Clone, Default)]
pub struct StaticIdentities {
    users: HashMap<i64, UserIdentity>,
}

impl StaticIdentities {
    pub fn new(users: impl IntoIterator<Item = UserIdentity>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
        }
    }
}

impl IdentityResolver for StaticIdentities {
    async fn resolve_users(&self, ids: &[i64]) -> Result<HashMap<i64, UserIdentity>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).cloned().map(|u| (*id, u)))
            .collect())
    }
}
