//! ocp-planner library
//!
//! Plans a company's week of forum posts and replies: topic selection,
//! day slots, narrative stages, channel and persona assignment, reply
//! planning, then a spam audit and a composite quality score.

pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod models;
pub mod services;
pub mod text;
pub mod validators;
pub mod workflow;

pub use error::{GeneratorError, PlannerError, PlannerResult};
pub use workflow::{CalendarGenerator, CalendarView, GenerationReport, GenerationRequest};
