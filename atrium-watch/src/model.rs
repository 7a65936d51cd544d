//! Shared data model types for the watch engine

use crate::access::AccessTier;
use crate::object::ObjectKind;
use serde::{Deserialize, Serialize};

/// One watch record: a user's registered interest in an object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchRecord {
    pub user_id: i64,
    pub kind: ObjectKind,
    pub object_id: i64,
    /// Time the watch was created (recency source for section watches)
    pub mark_time: i64,
}

/// Raw listing row from the registry: the watch plus its type-dependent
/// recency, before liveness resolution
#[derive(Debug, Clone)]
pub struct WatchListRow {
    pub record: WatchRecord,
    pub recency: i64,
}

/// Live contribution state, as supplied by the object resolver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContribSnapshot {
    pub id: i64,
    pub user_id: i64,
    pub type_id: i64,
    pub name: String,
    pub last_update: i64,
    pub downloads: i64,
    pub views: i64,
}

/// Live topic state, as supplied by the object resolver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSnapshot {
    pub id: i64,
    /// Topic type (support topic, queue, queue validation); `None` for a
    /// plain discussion topic
    pub kind: Option<ObjectKind>,
    /// Owning object id (contribution for support topics)
    pub parent_id: i64,
    pub access: AccessTier,
    pub subject: String,
    pub time: i64,
    /// Serialized cumulative post counter ("teams:authors:public")
    pub posts: String,
    pub first_post_user_id: i64,
    pub last_post_id: i64,
    pub last_post_user_id: i64,
    pub last_post_time: i64,
}

/// Display identity for a forum user, batch-resolved by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: i64,
    pub username: String,
    /// Display colour, empty when the host does not use one
    pub colour: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    // Hosts hand snapshots across process boundaries; the derives must
    // survive a round trip including the optional kind and the tier
    #[test]
    fn test_topic_snapshot_serde_round_trip() {
        let topic = TopicSnapshot {
            id: 20,
            kind: Some(ObjectKind::Support),
            parent_id: 10,
            access: AccessTier::Authors,
            subject: "Install problem".into(),
            time: 100,
            posts: "3:2:1".into(),
            first_post_user_id: 5,
            last_post_id: 2000,
            last_post_user_id: 6,
            last_post_time: 200,
        };

        let json = serde_json::to_string(&topic).unwrap();
        let back: TopicSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, topic.id);
        assert_eq!(back.kind, Some(ObjectKind::Support));
        assert_eq!(back.access, AccessTier::Authors);
        assert_eq!(back.posts, "3:2:1");
    }

    #[test]
    fn test_watch_record_serde_round_trip() {
        let record = WatchRecord {
            user_id: 1,
            kind: ObjectKind::Queue,
            object_id: 2,
            mark_time: 400,
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: WatchRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
