//! Strategy Sequencer
//!
//! Assigns each post in week order a narrative stage, moving from
//! awareness through authority, subtle mention and value to engagement.
//! The first post is always awareness and, with two or more posts, the
//! last is always engagement. In weeks of seven posts or fewer only one
//! post gets the subtle-mention stage; the rest of those positions become
//! value.

use crate::models::Strategy;

/// Weeks at or below this size get a single subtle mention
const SINGLE_MENTION_MAX_POSTS: usize = 7;

/// Stage for each of `count` posts in week order
pub fn sequence(count: usize) -> Vec<Strategy> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![Strategy::Awareness];
    }

    let last = (count - 1) as f64;
    let mut stages: Vec<Strategy> = (0..count)
        .map(|i| {
            let position = (4.0 * i as f64 / last).round() as usize;
            Strategy::SEQUENCE[position.min(4)]
        })
        .collect();

    if count <= SINGLE_MENTION_MAX_POSTS {
        let mut seen_mention = false;
        for stage in stages.iter_mut() {
            if *stage == Strategy::SubtleMention {
                if seen_mention {
                    *stage = Strategy::Value;
                }
                seen_mention = true;
            }
        }
    }

    stages
}

/// Stage of a day's first post, given per-day slot counts (Sunday first)
///
/// None for days without posts.
pub fn stage_for_day(slots: &[u32], day: usize) -> Option<Strategy> {
    if slots.get(day).copied().unwrap_or(0) == 0 {
        return None;
    }
    let total: u32 = slots.iter().sum();
    let before: u32 = slots[..day].iter().sum();
    sequence(total as usize).get(before as usize).copied()
}
