//! Subscription feed: watch records joined against live object state
//!
//! The feed pulls a page of a user's watch records from the registry,
//! resolves each against the live object it points at, silently drops and
//! removes watches whose object is gone (self-healing), reconciles read
//! state for topics, and emits display-ready rows in recency order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use atrium_common::{time::format_unix, Error, Result};
use sqlx::SqlitePool;
use tracing::warn;

use crate::model::{ContribSnapshot, TopicSnapshot, UserIdentity, WatchListRow, WatchRecord};
use crate::object::{ContentType, ContentTypes, ObjectKind};
use crate::pagination::calculate_pagination;
use crate::registry::SubscriptionRegistry;
use crate::resolve::{IdentityResolver, ObjectResolver};
use crate::tracking::{is_unread, support_topic_marks, ReadMarks};

/// Which slice of a user's subscriptions to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    /// Watched contributions and topics
    Items,
    /// Watched support areas, moderation queues and the attention list
    Sections,
}

impl FeedMode {
    /// Object kinds belonging to the mode
    pub fn kinds(self) -> &'static [ObjectKind] {
        match self {
            FeedMode::Items => &[ObjectKind::Contrib, ObjectKind::Topic],
            FeedMode::Sections => &[
                ObjectKind::Support,
                ObjectKind::Queue,
                ObjectKind::Attention,
            ],
        }
    }
}

/// Typed, opaque view target; URL construction is the host's job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    Contribution { contrib_id: i64 },
    ContributionSupport { contrib_id: i64 },
    Topic { topic_id: i64, last_post_id: i64 },
    QueueType { slug: String },
    Attention,
}

/// One display-ready subscription row
#[derive(Debug, Clone)]
pub struct FeedRow {
    pub kind: ObjectKind,
    pub object_id: i64,
    /// Target label ("Support topic", queue type name, ...)
    pub target: String,
    pub title: String,
    /// Formatted recency timestamp
    pub time: String,
    /// Formatted last-post timestamp (topics only)
    pub last_time: Option<String>,
    /// Raw recency, for callers that sort or group further
    pub recency: i64,
    pub author: Option<UserIdentity>,
    /// Last poster (topics only)
    pub last_author: Option<UserIdentity>,
    /// Unread flag (topics only)
    pub unread: Option<bool>,
    pub access_teams: bool,
    pub access_authors: bool,
    pub link: LinkTarget,
}

/// One page of subscription rows plus pagination metadata
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub rows: Vec<FeedRow>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

/// A selection-unsubscribe pair that could not be removed
#[derive(Debug)]
pub struct FailedUnsubscribe {
    pub kind: ObjectKind,
    pub object_id: i64,
    pub error: Error,
}

/// Outcome of a selection unsubscribe. Pairs are independent: a failure
/// aborts the remaining pairs but does not undo `removed`.
#[derive(Debug, Default)]
pub struct SelectionReport {
    pub removed: Vec<(ObjectKind, i64)>,
    pub failed: Option<FailedUnsubscribe>,
}

impl SelectionReport {
    pub fn all_removed(&self) -> bool {
        self.failed.is_none()
    }
}

/// Resolved live state per watch row, keyed by the watch's object kind
enum Resolved {
    Contrib(ContribSnapshot),
    Support(ContribSnapshot),
    Topic(TopicSnapshot),
    Queue(ContentType),
    Attention,
}

/// The subscription feed orchestrator
#[derive(Clone)]
pub struct SubscriptionFeed {
    registry: SubscriptionRegistry,
    tracking: ReadMarks,
    types: ContentTypes,
}

impl SubscriptionFeed {
    pub fn new(pool: SqlitePool, types: ContentTypes) -> Self {
        Self {
            registry: SubscriptionRegistry::new(pool.clone()),
            tracking: ReadMarks::new(pool),
            types,
        }
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn tracking(&self) -> &ReadMarks {
        &self.tracking
    }

    /// List one page of a user's subscriptions, most recent first.
    ///
    /// Watches whose backing object no longer exists are removed for this
    /// user and excluded from the output. Author identities for the whole
    /// page are resolved in a single batched call.
    pub async fn list_subscriptions(
        &self,
        user_id: i64,
        mode: FeedMode,
        page: i64,
        page_size: i64,
        objects: &impl ObjectResolver,
        identities: &impl IdentityResolver,
    ) -> Result<FeedPage> {
        if page_size <= 0 {
            return Err(Error::InvalidInput(format!(
                "Page size must be positive, got {}",
                page_size
            )));
        }

        let kinds = mode.kinds();
        let total = self.registry.count(user_id, kinds).await?;
        let pagination = calculate_pagination(total, page, page_size);

        let raw = self
            .registry
            .list(user_id, kinds, page_size, pagination.offset)
            .await?;

        // First pass: resolve live objects, drop stale watches, collect the
        // author ids the page needs
        let mut resolved: Vec<(WatchListRow, Resolved)> = Vec::with_capacity(raw.len());
        let mut author_ids: BTreeSet<i64> = BTreeSet::new();

        for row in raw {
            let object_id = row.record.object_id;
            let state = match row.record.kind {
                ObjectKind::Contrib => match objects.contribution(object_id).await? {
                    Some(contrib) => {
                        author_ids.insert(contrib.user_id);
                        Resolved::Contrib(contrib)
                    }
                    None => {
                        self.remove_stale(&row.record).await?;
                        continue;
                    }
                },
                ObjectKind::Support => match objects.contribution(object_id).await? {
                    Some(contrib) => {
                        author_ids.insert(contrib.user_id);
                        Resolved::Support(contrib)
                    }
                    None => {
                        self.remove_stale(&row.record).await?;
                        continue;
                    }
                },
                ObjectKind::Topic => match objects.topic(object_id).await? {
                    Some(topic) => {
                        author_ids.insert(topic.first_post_user_id);
                        author_ids.insert(topic.last_post_user_id);
                        Resolved::Topic(topic)
                    }
                    None => {
                        self.remove_stale(&row.record).await?;
                        continue;
                    }
                },
                ObjectKind::Queue => match self.types.get(object_id) {
                    Some(content_type) => Resolved::Queue(content_type.clone()),
                    None => {
                        self.remove_stale(&row.record).await?;
                        continue;
                    }
                },
                ObjectKind::Attention => Resolved::Attention,
                // Kinds no feed mode lists
                _ => continue,
            };
            resolved.push((row, state));
        }

        // One identity lookup for the whole page
        let ids: Vec<i64> = author_ids.into_iter().collect();
        let users = if ids.is_empty() {
            HashMap::new()
        } else {
            identities.resolve_users(&ids).await?
        };

        // Second pass: build display rows
        let mut rows = Vec::with_capacity(resolved.len());
        for (raw_row, state) in resolved {
            let row = match state {
                Resolved::Contrib(contrib) => contrib_row(&raw_row, contrib, &users),
                Resolved::Support(contrib) => support_row(&raw_row, contrib, &users),
                Resolved::Topic(topic) => self.topic_row(user_id, &raw_row, topic, &users).await?,
                Resolved::Queue(content_type) => queue_row(&raw_row, content_type),
                Resolved::Attention => attention_row(&raw_row),
            };
            rows.push(row);
        }

        Ok(FeedPage {
            rows,
            total,
            page: pagination.page,
            page_size,
            total_pages: pagination.total_pages,
        })
    }

    /// Unsubscribe a user from a selection of (kind, id) pairs.
    ///
    /// Pairs are processed independently; the first failure aborts the
    /// remaining pairs and is named in the report. Nothing is rolled back.
    pub async fn unsubscribe_selection(
        &self,
        user_id: i64,
        selection: &BTreeMap<ObjectKind, BTreeSet<i64>>,
    ) -> Result<SelectionReport> {
        let mut report = SelectionReport::default();

        for (&kind, ids) in selection {
            for &object_id in ids {
                match self.registry.unsubscribe(user_id, kind, object_id).await {
                    Ok(()) => report.removed.push((kind, object_id)),
                    Err(error) => {
                        warn!(
                            user_id,
                            kind = kind.tag(),
                            object_id,
                            %error,
                            "Selection unsubscribe aborted"
                        );
                        report.failed = Some(FailedUnsubscribe {
                            kind,
                            object_id,
                            error,
                        });
                        return Ok(report);
                    }
                }
            }
        }

        Ok(report)
    }

    /// Drop a watch whose object no longer exists. Only the current user's
    /// watch is known to be stale from this view, so only that one goes;
    /// other subscribers heal on their own page views.
    async fn remove_stale(&self, record: &WatchRecord) -> Result<()> {
        warn!(
            user_id = record.user_id,
            kind = record.kind.tag(),
            object_id = record.object_id,
            "Removing watch for deleted object"
        );
        self.registry
            .unsubscribe(record.user_id, record.kind, record.object_id)
            .await
    }

    async fn topic_row(
        &self,
        user_id: i64,
        raw: &WatchListRow,
        topic: TopicSnapshot,
        users: &HashMap<i64, UserIdentity>,
    ) -> Result<FeedRow> {
        let marks = support_topic_marks(&topic);
        let last_read = self
            .tracking
            .effective_last_read(user_id, &topic, &marks)
            .await?;
        let unread = is_unread(topic.last_post_time, last_read);

        let target = match topic.kind {
            Some(kind @ ObjectKind::Support)
            | Some(kind @ ObjectKind::Queue)
            | Some(kind @ ObjectKind::QueueDiscussion) => kind.label().to_string(),
            _ => String::new(),
        };

        Ok(FeedRow {
            kind: ObjectKind::Topic,
            object_id: topic.id,
            target,
            title: topic.subject.clone(),
            time: format_unix(topic.time),
            last_time: Some(format_unix(topic.last_post_time)),
            recency: raw.recency,
            author: users.get(&topic.first_post_user_id).cloned(),
            last_author: users.get(&topic.last_post_user_id).cloned(),
            unread: Some(unread),
            access_teams: topic.access == crate::access::AccessTier::Teams
                || topic.kind == Some(ObjectKind::Queue),
            access_authors: topic.access == crate::access::AccessTier::Authors,
            link: LinkTarget::Topic {
                topic_id: topic.id,
                last_post_id: topic.last_post_id,
            },
        })
    }
}

fn contrib_row(
    raw: &WatchListRow,
    contrib: ContribSnapshot,
    users: &HashMap<i64, UserIdentity>,
) -> FeedRow {
    FeedRow {
        kind: ObjectKind::Contrib,
        object_id: contrib.id,
        target: ObjectKind::Contrib.label().to_string(),
        title: contrib.name.clone(),
        time: format_unix(contrib.last_update),
        last_time: None,
        recency: raw.recency,
        author: users.get(&contrib.user_id).cloned(),
        last_author: None,
        unread: None,
        access_teams: false,
        access_authors: false,
        link: LinkTarget::Contribution {
            contrib_id: contrib.id,
        },
    }
}

fn support_row(
    raw: &WatchListRow,
    contrib: ContribSnapshot,
    users: &HashMap<i64, UserIdentity>,
) -> FeedRow {
    FeedRow {
        kind: ObjectKind::Support,
        object_id: raw.record.object_id,
        target: ObjectKind::Support.label().to_string(),
        title: contrib.name.clone(),
        time: format_unix(contrib.last_update),
        last_time: None,
        recency: raw.recency,
        author: users.get(&contrib.user_id).cloned(),
        last_author: None,
        unread: None,
        access_teams: false,
        access_authors: false,
        link: LinkTarget::ContributionSupport {
            contrib_id: contrib.id,
        },
    }
}

fn queue_row(raw: &WatchListRow, content_type: ContentType) -> FeedRow {
    FeedRow {
        kind: ObjectKind::Queue,
        object_id: content_type.id,
        target: content_type.name.clone(),
        title: ObjectKind::Queue.label().to_string(),
        time: format_unix(raw.record.mark_time),
        last_time: None,
        recency: raw.recency,
        author: None,
        last_author: None,
        unread: None,
        access_teams: true,
        access_authors: false,
        link: LinkTarget::QueueType {
            slug: content_type.slug,
        },
    }
}

fn attention_row(raw: &WatchListRow) -> FeedRow {
    FeedRow {
        kind: ObjectKind::Attention,
        object_id: raw.record.object_id,
        target: ObjectKind::Attention.label().to_string(),
        title: ObjectKind::Attention.label().to_string(),
        time: format_unix(raw.record.mark_time),
        last_time: None,
        recency: raw.recency,
        author: None,
        last_author: None,
        unread: None,
        access_teams: true,
        access_authors: false,
        link: LinkTarget::Attention,
    }
}
