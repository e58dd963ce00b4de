//! Engagement score of a piece of content.
//!
//! The score is never maintained incrementally. The service that owns the
//! counts recomputes it from scratch after every write that changes them, so
//! calling [`EngagementCounts::score`] twice on the same counts always gives
//! the same answer and a missed update cannot leave a stale score behind.

use serde::{Deserialize, Serialize};

/// Weight of a like.
pub const LIKE_WEIGHT: u64 = 2;
/// Weight of a comment.
pub const COMMENT_WEIGHT: u64 = 1;
/// Weight of a view.
pub const VIEW_WEIGHT: u64 = 1;
/// Weight of a share.
pub const SHARE_WEIGHT: u64 = 3;

/// Current interaction counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementCounts {
    /// Likes.
    pub likes: u32,
    /// Comments.
    pub comments: u32,
    /// Views.
    pub views: u32,
    /// Shares.
    pub shares: u32,
}

impl EngagementCounts {
    /// `2·likes + comments + views + 3·shares`.
    ///
    /// Computed in `u64`, which cannot overflow for `u32` inputs.
    #[must_use]
    pub fn score(&self) -> u64 {
        u64::from(self.likes) * LIKE_WEIGHT
            + u64::from(self.comments) * COMMENT_WEIGHT
            + u64::from(self.views) * VIEW_WEIGHT
            + u64::from(self.shares) * SHARE_WEIGHT
    }
}
