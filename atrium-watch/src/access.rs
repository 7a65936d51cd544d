//! Access tiers and the cumulative per-tier post counter
//!
//! Every post in a discussion carries an access tier controlling who may
//! see it. Topics store a running counter with one bucket per tier so a
//! "how many posts can I see" lookup is O(1) at read time instead of an
//! aggregate query per page view. Each bucket counts the posts visible at
//! that tier or any more public tier, so a post contributes to its own
//! bucket and every more restrictive one.

use atrium_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Separator used in the serialized counter string ("teams:authors:public")
const COUNT_SEPARATOR: char = ':';

/// Post/object visibility tier, most restrictive first.
///
/// The integer tags are persisted in topic rows and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessTier {
    /// Visible to moderation teams only
    Teams,
    /// Visible to the contribution's authors and teams
    Authors,
    /// Visible to everyone
    Public,
}

impl AccessTier {
    /// All tiers, most restrictive first (bucket order)
    pub const ALL: [AccessTier; 3] = [AccessTier::Teams, AccessTier::Authors, AccessTier::Public];

    /// Stable storage tag
    pub fn tag(self) -> i64 {
        match self {
            AccessTier::Teams => 0,
            AccessTier::Authors => 1,
            AccessTier::Public => 2,
        }
    }

    /// Bucket index in the serialized triple
    pub fn index(self) -> usize {
        self.tag() as usize
    }

    /// Decode a stored tag
    pub fn from_tag(tag: i64) -> Result<Self> {
        match tag {
            0 => Ok(AccessTier::Teams),
            1 => Ok(AccessTier::Authors),
            2 => Ok(AccessTier::Public),
            other => Err(Error::InvalidInput(format!("Unknown access tier: {}", other))),
        }
    }
}

/// Cumulative three-tier post counter attached to a topic.
///
/// Buckets are ordered `[teams, authors, public]`. A valid sequence of
/// mutations maintains `teams >= authors >= public >= 0`: the teams bucket
/// equals the total post count (every post is visible to teams), and each
/// less restrictive bucket drops the posts hidden from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostCounts {
    buckets: [i64; 3],
}

impl PostCounts {
    /// Empty counter (new topic)
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the serialized counter string from a topic row.
    ///
    /// An empty string is a freshly created topic and parses to zeros;
    /// missing trailing components pad with zero. Non-numeric components
    /// are rejected rather than guessed at.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut buckets = [0i64; 3];

        if raw.is_empty() {
            return Ok(Self { buckets });
        }

        let parts: Vec<&str> = raw.split(COUNT_SEPARATOR).collect();
        if parts.len() > 3 {
            return Err(Error::InvalidInput(format!(
                "Malformed post counter: {:?}",
                raw
            )));
        }

        for (i, part) in parts.iter().enumerate() {
            buckets[i] = part.trim().parse::<i64>().map_err(|_| {
                Error::InvalidInput(format!("Malformed post counter: {:?}", raw))
            })?;
        }

        Ok(Self { buckets })
    }

    /// Serialize back to the storage format ("10:9:8")
    pub fn serialize(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.buckets[0],
            self.buckets[1],
            self.buckets[2],
            sep = COUNT_SEPARATOR
        )
    }

    /// Apply a post lifecycle change to the counter.
    ///
    /// `old_tier` is the tier the post previously had (`None` for a newly
    /// created post); `new_tier` is the tier it now has (`None` for a hard
    /// delete). An unchanged tier short-circuits before any mutation.
    ///
    /// A change at tier T touches every bucket at least as restrictive as
    /// T: a public post counts in all three buckets, an authors post in
    /// teams and authors, a teams post only in teams.
    pub fn apply_change(&mut self, new_tier: Option<AccessTier>, old_tier: Option<AccessTier>) {
        if new_tier == old_tier {
            return;
        }

        if let Some(old) = old_tier {
            for bucket in &mut self.buckets[..=old.index()] {
                *bucket -= 1;
            }
        }

        if let Some(new) = new_tier {
            for bucket in &mut self.buckets[..=new.index()] {
                *bucket += 1;
            }
        }
    }

    /// Visible post count at the given tier
    pub fn count_at(&self, tier: AccessTier) -> i64 {
        self.buckets[tier.index()]
    }

    /// Whether the cumulative invariant currently holds
    pub fn is_consistent(&self) -> bool {
        self.buckets[0] >= self.buckets[1] && self.buckets[1] >= self.buckets[2] && self.buckets[2] >= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_is_zero() {
        let counts = PostCounts::parse("").unwrap();
        assert_eq!(counts.count_at(AccessTier::Teams), 0);
        assert_eq!(counts.count_at(AccessTier::Authors), 0);
        assert_eq!(counts.count_at(AccessTier::Public), 0);
    }

    #[test]
    fn test_parse_full() {
        let counts = PostCounts::parse("10:9:8").unwrap();
        assert_eq!(counts.count_at(AccessTier::Teams), 10);
        assert_eq!(counts.count_at(AccessTier::Authors), 9);
        assert_eq!(counts.count_at(AccessTier::Public), 8);
    }

    #[test]
    fn test_parse_short_pads_with_zero() {
        let counts = PostCounts::parse("4").unwrap();
        assert_eq!(counts.count_at(AccessTier::Teams), 4);
        assert_eq!(counts.count_at(AccessTier::Authors), 0);
        assert_eq!(counts.count_at(AccessTier::Public), 0);
    }

    #[test]
    fn test_parse_rejects_junk() {
        assert!(PostCounts::parse("a:b:c").is_err());
        assert!(PostCounts::parse("1:2:3:4").is_err());
    }

    #[test]
    fn test_serialize_round_trip() {
        let counts = PostCounts::parse("3:2:1").unwrap();
        assert_eq!(counts.serialize(), "3:2:1");
    }

    #[test]
    fn test_new_post_cascade() {
        let mut counts = PostCounts::new();

        counts.apply_change(Some(AccessTier::Public), None);
        assert_eq!(counts.serialize(), "1:1:1");

        counts.apply_change(Some(AccessTier::Authors), None);
        assert_eq!(counts.serialize(), "2:2:1");

        // Hard delete of the first (public) post
        counts.apply_change(None, Some(AccessTier::Public));
        assert_eq!(counts.serialize(), "1:1:0");
    }

    #[test]
    fn test_teams_post_touches_only_teams() {
        let mut counts = PostCounts::new();
        counts.apply_change(Some(AccessTier::Teams), None);
        assert_eq!(counts.serialize(), "1:0:0");
    }

    #[test]
    fn test_equal_tiers_is_noop() {
        let mut counts = PostCounts::parse("5:4:3").unwrap();
        counts.apply_change(Some(AccessTier::Authors), Some(AccessTier::Authors));
        assert_eq!(counts.serialize(), "5:4:3");
    }

    #[test]
    fn test_visibility_change_moves_between_buckets() {
        let mut counts = PostCounts::parse("2:2:2").unwrap();

        // A public post restricted to teams leaves authors/public
        counts.apply_change(Some(AccessTier::Teams), Some(AccessTier::Public));
        assert_eq!(counts.serialize(), "2:1:1");
        assert!(counts.is_consistent());
    }

    #[test]
    fn test_invariant_holds_over_sequence() {
        let mut counts = PostCounts::new();
        let changes = [
            (Some(AccessTier::Public), None),
            (Some(AccessTier::Teams), None),
            (Some(AccessTier::Authors), None),
            (Some(AccessTier::Authors), Some(AccessTier::Teams)),
            (Some(AccessTier::Public), Some(AccessTier::Authors)),
            (None, Some(AccessTier::Public)),
        ];

        for (new, old) in changes {
            counts.apply_change(new, old);
            assert!(counts.is_consistent(), "broken after {:?}", (new, old));
        }
    }

    #[test]
    fn test_tier_tags_stable() {
        assert_eq!(AccessTier::Teams.tag(), 0);
        assert_eq!(AccessTier::Authors.tag(), 1);
        assert_eq!(AccessTier::Public.tag(), 2);
        assert!(AccessTier::from_tag(3).is_err());
    }
}
