//! Tasklane - Task lifecycle and scheduling engine.
//!
//! Main entry point for the tasklane service.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tasklane_core::{TaskDraft, TaskPriority};
use tasklane_engine::{EngineConfig, TaskEngine};
use tasklane_notify::{LogDispatcher, NotificationDispatcher, WebhookDispatcher};
use tasklane_snapshot::{FileSnapshotStore, SnapshotConfig, SnapshotStore};

/// Tasklane CLI.
#[derive(Parser)]
#[command(name = "tasklane")]
#[command(about = "Task lifecycle and scheduling engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine in foreground (default)
    Run {
        /// Data directory for snapshots and logs
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Webhook endpoint for reminder/overdue notifications
        #[arg(long, env = "TASKLANE_WEBHOOK_URL")]
        webhook_url: Option<String>,

        /// Overdue grace offset in seconds
        #[arg(long, default_value_t = 300)]
        grace_secs: u64,

        /// Seed a demo data set on startup
        #[arg(long)]
        seed_demo: bool,
    },
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".tasklane"))
        .unwrap_or_else(|| PathBuf::from("/tmp/tasklane"))
}

/// Initialize the tracing subscriber with console and file output.
///
/// Log files are written to the data directory with daily rotation.
fn init_tracing(log_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("tasklane")
        .filename_suffix("log")
        .max_log_files(30)
        .build(log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the guard alive for the program duration.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Seed a small demo data set across two clients.
async fn seed_demo_tasks(engine: &Arc<TaskEngine>) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();
    let drafts = vec![
        TaskDraft::new("acme-corp", "Prepare project proposal draft")
            .with_description(
                "Create comprehensive proposal for Phase 1 implementation including \
                 timeline, budget, and deliverables",
            )
            .with_assignee("John Smith")
            .with_due_at(now + Duration::days(5))
            .with_priority(TaskPriority::High)
            .with_reminder(now + Duration::days(1))
            .with_tags(vec![
                "proposal".to_string(),
                "phase-1".to_string(),
                "high-priority".to_string(),
            ]),
        TaskDraft::new("acme-corp", "Review technical requirements document")
            .with_description(
                "Go through technical specifications and identify potential challenges \
                 and dependencies",
            )
            .with_assignee("Sarah Johnson")
            .with_due_at(now + Duration::days(3))
            .with_reminder(now + Duration::hours(12))
            .with_tags(vec!["technical".to_string(), "requirements".to_string()]),
        TaskDraft::new("acme-corp", "Schedule follow-up meeting with stakeholders")
            .with_description(
                "Arrange demo session with key stakeholders to present initial findings",
            )
            .with_assignee("Mike Chen")
            .with_due_at(now + Duration::days(7))
            .with_priority(TaskPriority::Low)
            .with_tags(vec![
                "meeting".to_string(),
                "stakeholders".to_string(),
                "demo".to_string(),
            ]),
        TaskDraft::new("global-tech", "Research cloud migration strategies")
            .with_description(
                "Investigate best practices for migrating from on-premise to cloud \
                 infrastructure",
            )
            .with_assignee("Emily Zhang")
            .with_due_at(now + Duration::days(10))
            .with_reminder(now + Duration::days(2))
            .with_tags(vec![
                "research".to_string(),
                "cloud".to_string(),
                "migration".to_string(),
            ]),
    ];

    for draft in drafts {
        engine.create(draft).await?;
    }

    info!("demo tasks seeded");
    Ok(())
}

async fn run(
    data_dir: PathBuf,
    webhook_url: Option<String>,
    grace_secs: u64,
    seed_demo: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot_config = SnapshotConfig {
        data_dir,
        ..SnapshotConfig::default()
    };
    let snapshots: Arc<dyn SnapshotStore> =
        Arc::new(FileSnapshotStore::new(snapshot_config).await?);

    let dispatcher: Arc<dyn NotificationDispatcher> = match webhook_url {
        Some(url) => {
            info!("dispatching notifications to {url}");
            Arc::new(WebhookDispatcher::new(url))
        }
        None => Arc::new(LogDispatcher),
    };

    let config = EngineConfig {
        overdue_grace_secs: grace_secs,
    };
    let engine = TaskEngine::new(config, snapshots, dispatcher);
    engine.start().await?;

    if seed_demo {
        seed_demo_tasks(&engine).await?;
    }

    info!(
        tasks = engine.task_count().await,
        pending_jobs = engine.pending_jobs(),
        "tasklane running, press ctrl-c to stop"
    );

    tokio::signal::ctrl_c().await?;
    engine.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Run {
        data_dir: None,
        webhook_url: None,
        grace_secs: 300,
        seed_demo: false,
    });

    match command {
        Commands::Run {
            data_dir,
            webhook_url,
            grace_secs,
            seed_demo,
        } => {
            let data_dir = data_dir.unwrap_or_else(default_data_dir);
            init_tracing(&data_dir.join("logs"))?;
            run(data_dir, webhook_url, grace_secs, seed_demo).await
        }
    }
}
