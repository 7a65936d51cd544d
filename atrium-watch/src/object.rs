//! Watchable object kinds and the configured content-type registry
//!
//! Watch records, read marks and topic types all share one closed tag
//! space. The registry treats kinds as opaque; the feed dispatches on them
//! to pick the live table to resolve against and the display row to build.

use atrium_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Kind of object a watch record or read mark points at.
///
/// The integer tags are persisted and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A contribution (item watch)
    Contrib,
    /// A discussion topic
    Topic,
    /// A contribution's support area
    Support,
    /// A moderation queue (object id is a content-type id)
    Queue,
    /// A moderation queue category tag
    QueueTag,
    /// The "needs attention" moderation list (no backing row)
    Attention,
    /// A queue validation discussion (tracking key / topic type)
    QueueDiscussion,
}

impl ObjectKind {
    /// Stable storage tag
    pub fn tag(self) -> i64 {
        match self {
            ObjectKind::Contrib => 1,
            ObjectKind::Topic => 2,
            ObjectKind::Support => 3,
            ObjectKind::Queue => 4,
            ObjectKind::QueueTag => 5,
            ObjectKind::Attention => 6,
            ObjectKind::QueueDiscussion => 7,
        }
    }

    /// Decode a stored tag
    pub fn from_tag(tag: i64) -> Result<Self> {
        match tag {
            1 => Ok(ObjectKind::Contrib),
            2 => Ok(ObjectKind::Topic),
            3 => Ok(ObjectKind::Support),
            4 => Ok(ObjectKind::Queue),
            5 => Ok(ObjectKind::QueueTag),
            6 => Ok(ObjectKind::Attention),
            7 => Ok(ObjectKind::QueueDiscussion),
            other => Err(Error::InvalidInput(format!("Unknown object kind: {}", other))),
        }
    }

    /// Display label for subscription listings
    pub fn label(self) -> &'static str {
        match self {
            ObjectKind::Contrib => "Contribution",
            ObjectKind::Topic => "Topic",
            ObjectKind::Support => "Support",
            ObjectKind::Queue => "Queue",
            ObjectKind::QueueTag => "Queue category",
            ObjectKind::Attention => "Attention",
            ObjectKind::QueueDiscussion => "Queue validation",
        }
    }
}

/// One configured contribution type (styles, extensions, translations, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    pub id: i64,
    pub name: String,
    /// URL slug, opaque to this crate
    pub slug: String,
    /// Restricted to moderators regardless of view permission
    pub team_only: bool,
}

/// Ordered registry of configured content types.
///
/// Order is the display order and is preserved from construction.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    types: Vec<ContentType>,
}

impl ContentTypes {
    pub fn new(types: Vec<ContentType>) -> Self {
        Self { types }
    }

    pub fn get(&self, id: i64) -> Option<&ContentType> {
        self.types.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
