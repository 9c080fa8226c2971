//! Post placement phase
//!
//! Topics, day slots and stages are computed up front. Each slot then
//! picks a channel and an identity against the activity accumulated so
//! far in this run, drafts its content and is persisted before the next
//! slot is considered.

use super::{CalendarGenerator, CompanyContext};
use crate::db;
use crate::error::PlannerResult;
use crate::generator::fallback::fallback_post;
use crate::generator::{PersonaBrief, PostDraftRequest};
use crate::models::{Channel, Identity, PlannedPost, PostRecord, Strategy, TopicCandidate};
use crate::services::channel_selector::{ActivityTracker, ChannelSelector};
use crate::services::identity_assigner::IdentityAssigner;
use crate::services::slot_distributor::distribute;
use crate::services::strategy_sequencer::sequence;
use crate::services::topic_filter::TopicFilter;
use chrono::NaiveDate;
use ocp_common::time::{date_for_day, day_name, DAYS_PER_WEEK};
use rand::Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Posting hours by order within a day
const BASE_HOURS: [u8; 6] = [9, 13, 18, 20, 11, 15];
const EARLIEST_HOUR: i32 = 7;
const LATEST_HOUR: i32 = 22;

/// Suggested posting hour for the n-th post of a day
pub(crate) fn scheduled_hour(order_in_day: u32, rng: &mut impl Rng) -> u8 {
    let base = BASE_HOURS[order_in_day as usize % BASE_HOURS.len()] as i32;
    let jitter = rng.gen_range(-1..=1);
    (base + jitter).clamp(EARLIEST_HOUR, LATEST_HOUR) as u8
}

/// Slot-independent inputs shared by every placement
struct SlotInput<'a> {
    topic: &'a TopicCandidate,
    strategy: Strategy,
    day: u8,
    date: NaiveDate,
    order_in_day: u32,
}

impl CalendarGenerator {
    pub(super) async fn phase_posts(
        &self,
        ctx: &CompanyContext,
        calendar_id: Uuid,
        week_start: NaiveDate,
        post_count: u32,
        rng: &mut impl Rng,
    ) -> PlannerResult<Vec<PlannedPost>> {
        let company_id = ctx.company.id.as_str();

        let history = db::history::load_topic_history(&self.db, company_id).await?;
        let activity = db::channels::load_latest_activity(&self.db, company_id, week_start).await?;
        let mut records: Vec<PostRecord> =
            db::calendars::load_prior_posts(&self.db, company_id, week_start, self.config.channel_history_weeks)
                .await?;
        let mut tracker = ActivityTracker::new(activity);

        let topics = TopicFilter::new(&self.config)
            .select(self.generator.as_ref(), &ctx.company, &history, week_start, post_count as usize)
            .await;
        let slots = distribute(post_count);
        let stages = sequence(post_count as usize);

        debug!(?slots, "Slots distributed");

        let selector = ChannelSelector::new(self.rules.clone(), self.config.fallback_policy);
        let assigner = IdentityAssigner::new(self.config.fallback_policy);
        let mut posts = Vec::with_capacity(post_count as usize);
        let mut index = 0usize;

        for day in 0..DAYS_PER_WEEK as u8 {
            let date = date_for_day(week_start, day);

            for order_in_day in 0..slots[day as usize] {
                let slot = index;
                index += 1;

                let (Some(topic), Some(strategy)) = (topics.get(slot), stages.get(slot).copied()) else {
                    warn!(slot, "No topic for slot, skipping");
                    continue;
                };
                let input = SlotInput {
                    topic,
                    strategy,
                    day,
                    date,
                    order_in_day,
                };

                let Some(post) = self
                    .place_slot(ctx, &selector, &assigner, &tracker, &records, &input, rng)
                    .await
                else {
                    continue;
                };

                if let Err(e) = db::calendars::insert_post(&self.db, calendar_id, company_id, &post).await {
                    warn!(slot, day = day_name(day), error = %e, "Failed to persist post, skipping");
                    continue;
                }
                if let Err(e) =
                    db::channels::record_channel_post(&self.db, &post.channel_id, company_id, week_start, date).await
                {
                    warn!(channel = %post.channel_id, error = %e, "Failed to update channel activity");
                }
                if let Err(e) = db::history::record_topic_use(&self.db, company_id, &post.topic, date).await {
                    warn!(topic = %post.topic, error = %e, "Failed to update topic history");
                }

                tracker.record_post(&post.channel_id, company_id, date);
                records.push(post.record());
                posts.push(post);
            }
        }

        info!(
            planned = post_count,
            created = posts.len(),
            "Post placement complete"
        );
        Ok(posts)
    }

    #[allow(clippy::too_many_arguments)]
    async fn place_slot(
        &self,
        ctx: &CompanyContext,
        selector: &ChannelSelector,
        assigner: &IdentityAssigner,
        tracker: &ActivityTracker,
        records: &[PostRecord],
        input: &SlotInput<'_>,
        rng: &mut impl Rng,
    ) -> Option<PlannedPost> {
        let topic = input.topic;

        let Some(channel) = selector
            .rank(&ctx.channels, tracker, topic, input.date)
            .into_iter()
            .next()
            .and_then(|best| ctx.channels.iter().find(|c| c.id == best.channel_id))
        else {
            warn!(topic = %topic.text, day = day_name(input.day), "No channel available, skipping slot");
            return None;
        };

        let Some(identity) = assigner
            .assign(&ctx.identities, topic, &channel.id, input.date, records)
            .and_then(|best| ctx.identities.iter().find(|i| i.id == best.identity_id))
        else {
            warn!(topic = %topic.text, channel = %channel.name, "No identity available, skipping slot");
            return None;
        };

        let draft = self.draft_post(topic, input.strategy, channel, identity).await;
        let scheduled_hour = scheduled_hour(input.order_in_day, rng);

        debug!(
            day = day_name(input.day),
            hour = scheduled_hour,
            channel = %channel.name,
            identity = %identity.name,
            strategy = %input.strategy,
            topic = %topic.text,
            "Slot placed"
        );

        Some(PlannedPost {
            id: Uuid::new_v4(),
            day_of_week: input.day,
            scheduled_date: input.date,
            scheduled_hour,
            order_in_day: input.order_in_day,
            channel_id: channel.id.clone(),
            topic: topic.text.clone(),
            identity_id: identity.id.clone(),
            kind: topic.kind,
            strategy: input.strategy,
            title: Some(draft.title),
            body: Some(draft.body),
        })
    }

    async fn draft_post(
        &self,
        topic: &TopicCandidate,
        strategy: Strategy,
        channel: &Channel,
        identity: &Identity,
    ) -> crate::generator::PostDraft {
        let request = PostDraftRequest {
            topic: topic.text.clone(),
            kind: topic.kind,
            strategy,
            channel_name: channel.name.clone(),
            persona: PersonaBrief {
                name: identity.name.clone(),
                tone: identity.tone.clone(),
                expertise: identity.expertise.clone(),
            },
        };

        match self.generator.draft_post(&request).await {
            Ok(draft) if !draft.title.trim().is_empty() && !draft.body.trim().is_empty() => draft,
            Ok(_) => {
                warn!(generator = self.generator.name(), "Empty post draft, using template");
                fallback_post(&topic.text, topic.kind)
            }
            Err(e) => {
                debug!(generator = self.generator.name(), error = %e, "Post drafting failed, using template");
                fallback_post(&topic.text, topic.kind)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_scheduled_hour_stays_near_base() {
        let mut rng = StdRng::seed_from_u64(5);
        for order in 0..12u32 {
            let base = BASE_HOURS[order as usize % BASE_HOURS.len()] as i32;
            let hour = scheduled_hour(order, &mut rng) as i32;
            assert!((hour - base).abs() <= 1);
            assert!((7..=22).contains(&hour));
        }
    }
}
