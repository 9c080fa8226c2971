//! Planning stages
//!
//! Each stage is a pure function of its inputs plus the run state the
//! workflow hands it. Only the topic filter and the conversation planner
//! talk to the text generator.

pub mod channel_rules;
pub mod channel_selector;
pub mod conversation_planner;
pub mod identity_assigner;
pub mod slot_distributor;
pub mod strategy_sequencer;
pub mod topic_filter;

pub use channel_rules::{KeywordRules, RulePredicate};
pub use channel_selector::{ActivityTracker, ChannelScore, ChannelSelector};
pub use conversation_planner::{ConversationPlanner, ReplyPlan};
pub use identity_assigner::{IdentityAssigner, IdentityScore};
pub use slot_distributor::{distribute, WeekSlots};
pub use strategy_sequencer::{sequence, stage_for_day};
pub use topic_filter::TopicFilter;
