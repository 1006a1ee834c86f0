use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use selfplay_dqn::ai::MlpApproximator;
use selfplay_dqn::checkpoint::CheckpointManager;
use selfplay_dqn::config::AppConfig;
use selfplay_dqn::env::VolleyEnv;
use selfplay_dqn::training::metrics::mean;
use selfplay_dqn::training::trainer::{Trainer, PROGRESS_WINDOW};

/// Train DQN agents on the volleyball duel, optionally through self-play.
#[derive(Parser)]
#[command(name = "train", about = "Train DQN agents with an optional self-play curriculum")]
struct Cli {
    /// Train against the agent's own best snapshot
    #[arg(long)]
    selfplay: bool,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override number of independent runs
    #[arg(long)]
    runs: Option<usize>,

    /// Override the per-run step budget
    #[arg(long)]
    max_steps: Option<u64>,

    /// Override the snapshot directory
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    /// Override learning rate
    #[arg(long)]
    lr: Option<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if cli.selfplay {
        app_config.training.selfplay = true;
    }
    if let Some(runs) = cli.runs {
        app_config.training.runs = runs;
    }
    if let Some(max_steps) = cli.max_steps {
        app_config.training.max_steps = max_steps;
    }
    if let Some(dir) = cli.checkpoint_dir {
        app_config.checkpoint.checkpoint_dir = dir;
    }
    if let Some(lr) = cli.lr {
        app_config.network.learning_rate = lr;
    }
    app_config.validate().context("invalid configuration")?;

    let checkpoints = CheckpointManager::new(app_config.checkpoint.clone()).with_context(|| {
        format!(
            "creating snapshot directory {}",
            app_config.checkpoint.checkpoint_dir.display()
        )
    })?;
    let trainer = Trainer::new(app_config.training.clone(), app_config.dqn.clone(), checkpoints);
    let mut env = VolleyEnv::new(app_config.env.clone());
    let network = app_config.network.clone();

    let runs = trainer
        .train(&mut env, |state_dim, action_count| {
            MlpApproximator::new(network.clone(), state_dim, action_count)
        })
        .context("training failed")?;

    for run in &runs {
        let tail = &run.returns[run.returns.len().saturating_sub(PROGRESS_WINDOW)..];
        info!(
            agent = run.agent.name(),
            steps = run.agent.step(),
            episodes = run.returns.len(),
            promotions = run.promotions,
            avg_return = mean(tail),
            final_snapshot = %run.final_snapshot.display(),
            "run summary"
        );
    }
    Ok(())
}
