//! # Atrium Watch Engine
//!
//! Subscription registry and access-tiered visibility core for the Atrium
//! forum extension:
//! - Access tiers and the cumulative per-tier post counter
//! - Polymorphic watch records over contributions, topics, support areas,
//!   moderation queues and attention flags
//! - Read-mark tracking and unread reconciliation
//! - Queue catalog (authorized types + pending counts)
//! - The subscription feed that ties the above together
//!
//! HTTP routing, templating, authentication and ACL evaluation live in the
//! host forum; this crate only consumes their decisions through the traits
//! in [`feed`] and [`queue`].

pub mod access;
pub mod feed;
pub mod model;
pub mod object;
pub mod pagination;
pub mod posts;
pub mod queue;
pub mod registry;
pub mod resolve;
pub mod tracking;

pub use access::{AccessTier, PostCounts};
pub use feed::{FeedMode, FeedPage, FeedRow, SubscriptionFeed};
pub use object::{ContentType, ContentTypes, ObjectKind};
pub use registry::SubscriptionRegistry;
pub use tracking::ReadMarks;
