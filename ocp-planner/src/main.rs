//! ocp-planner - weekly content calendar planner
//!
//! Commands:
//! - `init-db` creates the database schema
//! - `generate` plans one company's week and prints the report
//! - `rescore` re-runs the audit and quality score for a stored calendar
//! - `show` prints a stored calendar as JSON

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use ocp_common::config::{load_toml_or_default, resolve_config_path, CONFIG_ENV_VAR};
use ocp_planner::config::PlannerToml;
use ocp_planner::generator::{DisabledGenerator, HttpTextGenerator, TextGenerator};
use ocp_planner::{CalendarGenerator, GenerationRequest};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "ocp-planner")]
#[command(about = "Plans a week of forum posts and replies for a company")]
#[command(version)]
struct Args {
    /// Config file (falls back to OCP_CONFIG, then the user config folder)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file, overriding the config file
    #[arg(long, env = "OCP_DATABASE_PATH")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and its tables
    InitDb,

    /// Generate (or regenerate) a weekly calendar
    Generate {
        /// Company id
        #[arg(long)]
        company: String,

        /// Any date in the target week (YYYY-MM-DD); moved back to Sunday
        #[arg(long)]
        week_start: NaiveDate,

        /// Number of posts for the week
        #[arg(long)]
        posts: u32,

        /// Seed for a reproducible plan
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Re-run the spam audit and quality score for a calendar
    Rescore {
        #[arg(long)]
        calendar: Uuid,
    },

    /// Print a stored calendar as JSON
    Show {
        #[arg(long)]
        calendar: Uuid,
    },
}

fn crate_directives(level: &str) -> String {
    format!("ocp_planner={0},ocp_common={0}", level)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Must be installed before config loading. The configured level
    // replaces the startup filter unless RUST_LOG is set
    let startup_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(crate_directives("info")));
    let (filter, filter_handle) = reload::Layer::new(startup_filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = resolve_config_path(args.config.as_deref(), CONFIG_ENV_VAR);
    let mut config: PlannerToml = load_toml_or_default(config_path.as_deref());
    config.apply_env_overrides();
    if let Some(database) = args.database {
        config.database_path = Some(database);
    }
    let config = config.validated();

    if std::env::var_os("RUST_LOG").is_none() {
        if let Err(e) = filter_handle.reload(EnvFilter::new(crate_directives(&config.logging.level))) {
            warn!("Could not apply log level {:?}: {}", config.logging.level, e);
        }
    }

    let db_path = config.database_path();
    info!("Database: {}", db_path.display());
    let pool = ocp_common::db::init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let generator: Arc<dyn TextGenerator> = match config.generator.http_settings() {
        Some(settings) => {
            info!("Text generation endpoint: {}", settings.base_url);
            Arc::new(HttpTextGenerator::new(settings)?)
        }
        None => {
            info!("No text generation endpoint configured, using fallback content");
            Arc::new(DisabledGenerator)
        }
    };

    let planner = CalendarGenerator::new(pool, generator, config.planner.clone());

    match args.command {
        Command::InitDb => {
            println!("Database ready at {}", db_path.display());
        }
        Command::Generate {
            company,
            week_start,
            posts,
            seed,
        } => {
            let request = GenerationRequest {
                company_id: company,
                week_start,
                post_count: posts,
            };
            let report = planner.generate_seeded(&request, seed).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Rescore { calendar } => {
            let report = planner.rescore(calendar).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Show { calendar } => {
            let view = planner.load_view(calendar).await?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_config_warnings_reach_startup_subscriber() {
        let captured = Captured::default();
        let writer = captured.clone();
        let (filter, handle) = reload::Layer::new(EnvFilter::new(crate_directives("info")));
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(move || writer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let _: PlannerToml = load_toml_or_default(None);
            handle.reload(EnvFilter::new(crate_directives("error"))).unwrap();
            // Below the configured level now
            let _: PlannerToml = load_toml_or_default(None);
        });

        let output = captured.text();
        assert_eq!(output.matches("No config file found").count(), 1, "{}", output);
    }
}
