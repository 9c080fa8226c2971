//! Configuration for ocp-planner
//!
//! Bootstrap settings come from a TOML file located by
//! [`ocp_common::config::resolve_config_path`]. Every key has a built-in
//! default so a missing file still yields a working planner (using
//! fallback content when no generator endpoint is configured).
//!
//! Environment overrides, applied after the file:
//! - `OCP_DATABASE_PATH` - SQLite file
//! - `OCP_GENERATOR_URL` - text generation base URL
//! - `OCP_SEED` - random seed for reproducible plans

use ocp_common::config::{default_database_path, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::generator::http_client::HttpGeneratorSettings;

/// What the selectors do when no candidate meets every constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Degrade to the best-scoring candidate (cooldown, weekly max and
    /// collisions are discouraged, never blocking)
    #[default]
    BestAvailable,
    /// Exclude channels in cooldown or at their weekly max and colliding
    /// identities; a slot with nothing left is skipped
    Strict,
}

/// Root of the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlannerToml {
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
}

/// `[generator]` section
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    /// Chat-completions base URL; unset means fallback content only
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            min_interval_ms: default_min_interval_ms(),
        }
    }
}

impl GeneratorConfig {
    /// HTTP client settings, or None when no endpoint is configured
    pub fn http_settings(&self) -> Option<HttpGeneratorSettings> {
        let base_url = self.base_url.as_ref().filter(|u| !u.trim().is_empty())?;
        Some(HttpGeneratorSettings {
            base_url: base_url.clone(),
            model: self.model.clone(),
            api_key: std::env::var(&self.api_key_env).ok().filter(|k| !k.trim().is_empty()),
            timeout: Duration::from_secs(self.timeout_secs),
            min_interval: Duration::from_millis(self.min_interval_ms),
        })
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OCP_GENERATOR_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_min_interval_ms() -> u64 {
    250
}

/// `[planner]` section: engine tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Fraction of posts that receive a reply
    pub reply_rate: f64,
    pub max_replies_per_identity: usize,
    /// Trailing window for topic-history suppression
    pub topic_history_days: i64,
    /// Candidates at or above this similarity to a recent topic are dropped
    pub topic_similarity_threshold: f64,
    /// Prior weeks of posts handed to the auditor
    pub channel_history_weeks: i64,
    /// Most recent historical posts checked for topic repetition
    pub historical_topic_window: usize,
    pub skeptical_override_chance: f64,
    pub fallback_policy: FallbackPolicy,
    /// Fixed seed for reproducible plans
    pub seed: Option<u64>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            reply_rate: 0.65,
            max_replies_per_identity: 3,
            topic_history_days: 28,
            topic_similarity_threshold: 0.7,
            channel_history_weeks: 4,
            historical_topic_window: 20,
            skeptical_override_chance: 0.15,
            fallback_policy: FallbackPolicy::BestAvailable,
            seed: None,
        }
    }
}

impl PlannerToml {
    /// Apply `OCP_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("OCP_DATABASE_PATH") {
            if !path.trim().is_empty() {
                self.database_path = Some(PathBuf::from(path));
            }
        }

        if let Ok(url) = std::env::var("OCP_GENERATOR_URL") {
            if !url.trim().is_empty() {
                self.generator.base_url = Some(url);
            }
        }

        if let Ok(seed) = std::env::var("OCP_SEED") {
            match seed.trim().parse::<u64>() {
                Ok(seed) => self.planner.seed = Some(seed),
                Err(_) => warn!("Ignoring OCP_SEED={:?}: not an unsigned integer", seed),
            }
        }
    }

    /// Database file, defaulting to the platform data folder
    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(default_database_path)
    }

    /// Clamp tunables to usable ranges, warning on each adjustment
    pub fn validated(mut self) -> Self {
        let p = &mut self.planner;
        if !(0.0..=1.0).contains(&p.reply_rate) {
            warn!("reply_rate {} out of range, clamping to [0, 1]", p.reply_rate);
            p.reply_rate = p.reply_rate.clamp(0.0, 1.0);
        }
        if !(0.0..=1.0).contains(&p.skeptical_override_chance) {
            warn!("skeptical_override_chance {} out of range, clamping", p.skeptical_override_chance);
            p.skeptical_override_chance = p.skeptical_override_chance.clamp(0.0, 1.0);
        }
        if !(0.0..=1.0).contains(&p.topic_similarity_threshold) {
            warn!("topic_similarity_threshold {} out of range, using 0.7", p.topic_similarity_threshold);
            p.topic_similarity_threshold = 0.7;
        }
        if p.max_replies_per_identity == 0 {
            warn!("max_replies_per_identity 0 would drop every reply, using 1");
            p.max_replies_per_identity = 1;
        }
        if p.topic_history_days < 0 {
            p.topic_history_days = 0;
        }
        if p.channel_history_weeks < 0 {
            p.channel_history_weeks = 0;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::default();
        assert_eq!(config.reply_rate, 0.65);
        assert_eq!(config.max_replies_per_identity, 3);
        assert_eq!(config.topic_history_days, 28);
        assert_eq!(config.fallback_policy, FallbackPolicy::BestAvailable);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
            database_path = "/tmp/plan.db"

            [generator]
            base_url = "http://localhost:8080/v1"

            [planner]
            reply_rate = 0.5
            fallback_policy = "strict"
            seed = 42
        "#;

        let config: PlannerToml = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/plan.db"));
        assert_eq!(config.generator.model, "gpt-4o-mini");
        assert_eq!(config.planner.reply_rate, 0.5);
        assert_eq!(config.planner.fallback_policy, FallbackPolicy::Strict);
        assert_eq!(config.planner.seed, Some(42));
        // Untouched keys keep defaults
        assert_eq!(config.planner.max_replies_per_identity, 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_http_settings_absent_without_url() {
        let config = GeneratorConfig::default();
        assert!(config.http_settings().is_none());

        let config = GeneratorConfig {
            base_url: Some("   ".to_string()),
            ..GeneratorConfig::default()
        };
        assert!(config.http_settings().is_none());
    }

    #[test]
    fn test_http_settings_with_url() {
        let config = GeneratorConfig {
            base_url: Some("http://localhost:8080/v1".to_string()),
            timeout_secs: 5,
            ..GeneratorConfig::default()
        };
        let settings = config.http_settings().unwrap();
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.model, "gpt-4o-mini");
    }

    #[test]
    fn test_validated_clamps_out_of_range_values() {
        let mut config = PlannerToml::default();
        config.planner.reply_rate = 1.7;
        config.planner.max_replies_per_identity = 0;
        config.planner.topic_similarity_threshold = -1.0;

        let config = config.validated();
        assert_eq!(config.planner.reply_rate, 1.0);
        assert_eq!(config.planner.max_replies_per_identity, 1);
        assert_eq!(config.planner.topic_similarity_threshold, 0.7);
    }
}
