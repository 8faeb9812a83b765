//! park-rl command line.
//!
//! ## Usage
//!
//! ```bash
//! park-rl train --episodes 200 --output model.json
//! park-rl baseline --trials 100
//! park-rl evaluate --model model.json --temperature 35
//! park-rl simulate --agents 20 --seconds 60
//! ```

use clap::{Parser, Subcommand};
use park_rl::{
    AgentManager, CheckpointManager, Error, LoadOutcome, Park, ParkDesignTrainer, ParkMetrics,
    ParkSnapshot, Persist, Result, SimulationConfig,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

/// Park layout design with reinforcement learning
#[derive(Parser, Debug)]
#[command(name = "park-rl")]
#[command(version)]
#[command(about = "Learn and evaluate park amenity layouts", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a Q-learning agent
    Train {
        /// Number of episodes (defaults to the configured value)
        #[arg(short, long)]
        episodes: Option<usize>,

        /// Grid size override
        #[arg(short, long)]
        grid_size: Option<usize>,

        /// Continue from a saved model
        #[arg(long)]
        resume: Option<PathBuf>,

        /// Where to save the trained model
        #[arg(short, long, default_value = "model.json")]
        output: PathBuf,

        /// Directory for periodic checkpoints
        #[arg(long)]
        checkpoint_dir: Option<PathBuf>,

        /// Where to write the training report
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Score random layouts
    Baseline {
        /// Number of random layouts (defaults to the configured value)
        #[arg(short, long)]
        trials: Option<usize>,

        #[arg(short, long)]
        grid_size: Option<usize>,

        /// Ambient temperature in °C
        #[arg(long)]
        temperature: Option<f64>,
    },

    /// Lay out a park with a trained model and compare against random
    Evaluate {
        /// Saved model
        #[arg(short, long)]
        model: PathBuf,

        #[arg(short, long)]
        grid_size: Option<usize>,

        /// Ambient temperature in °C
        #[arg(long)]
        temperature: Option<f64>,

        /// Random layouts to compare against
        #[arg(short, long)]
        trials: Option<usize>,

        /// Save the resulting layout
        #[arg(long)]
        layout_output: Option<PathBuf>,
    },

    /// Run pedestrians on a layout
    Simulate {
        /// Saved layout; a random one is generated otherwise
        #[arg(short, long)]
        layout: Option<PathBuf>,

        /// Number of pedestrians
        #[arg(short, long, default_value_t = 20)]
        agents: usize,

        /// Simulated time in seconds
        #[arg(short, long, default_value_t = 60.0)]
        seconds: f64,

        /// Time step in seconds
        #[arg(long, default_value_t = 0.1)]
        dt: f64,

        /// Ambient temperature in °C
        #[arg(long)]
        temperature: Option<f64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    let config = match &cli.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };

    match cli.command {
        Command::Train {
            episodes,
            grid_size,
            resume,
            output,
            checkpoint_dir,
            report,
        } => {
            let config = with_grid_size(config, grid_size);
            let episodes = episodes.unwrap_or(config.trainer.episodes);
            train(
                config,
                cli.seed,
                episodes,
                resume.as_deref(),
                &output,
                checkpoint_dir.as_deref(),
                report.as_deref(),
            )
        }
        Command::Baseline {
            trials,
            grid_size,
            temperature,
        } => {
            let config = with_grid_size(config, grid_size);
            let trials = trials.unwrap_or(config.trainer.baseline_trials);
            let mut trainer = build_trainer(config, cli.seed)?;
            if let Some(t) = temperature {
                trainer.park_mut().set_temperature(t);
            }
            let stats = trainer.test_random_baseline(trials);
            println!(
                "Random baseline ({} trials at {:.1}°C): {:.2} ± {:.2}",
                stats.trials,
                trainer.park().temperature(),
                stats.mean,
                stats.std_dev
            );
            Ok(())
        }
        Command::Evaluate {
            model,
            grid_size,
            temperature,
            trials,
            layout_output,
        } => {
            let config = with_grid_size(config, grid_size);
            let trials = trials.unwrap_or(config.trainer.baseline_trials);
            evaluate(
                config,
                cli.seed,
                &model,
                temperature,
                trials,
                layout_output.as_deref(),
            )
        }
        Command::Simulate {
            layout,
            agents,
            seconds,
            dt,
            temperature,
        } => simulate(config, cli.seed, layout.as_deref(), agents, seconds, dt, temperature),
    }
}

fn with_grid_size(mut config: SimulationConfig, grid_size: Option<usize>) -> SimulationConfig {
    if let Some(n) = grid_size {
        config.park.grid_size = n;
    }
    config
}

fn build_trainer(config: SimulationConfig, seed: Option<u64>) -> Result<ParkDesignTrainer> {
    match seed {
        Some(seed) => ParkDesignTrainer::with_seed(config, seed),
        None => ParkDesignTrainer::new(config),
    }
}

fn train(
    config: SimulationConfig,
    seed: Option<u64>,
    episodes: usize,
    resume: Option<&Path>,
    output: &Path,
    checkpoint_dir: Option<&Path>,
    report: Option<&Path>,
) -> Result<()> {
    let checkpoints = checkpoint_dir.map(|dir| {
        CheckpointManager::new(dir, config.trainer.max_checkpoints)
            .with_interval(config.trainer.checkpoint_interval as u64)
    });
    let baseline_trials = config.trainer.baseline_trials;
    let mut trainer = build_trainer(config, seed)?;

    if let Some(path) = resume {
        if let LoadOutcome::Reset { expected, found } = trainer.agent_mut().load_model(path)? {
            println!(
                "Model in {} has {} actions but the grid needs {}; starting from scratch",
                path.display(),
                found,
                expected
            );
        }
    }

    println!(
        "Training on a {0}x{0} grid for {1} episodes",
        trainer.park().grid_size(),
        episodes
    );
    trainer.start();
    let rewards = trainer.train(episodes, checkpoints.as_ref())?;
    trainer.stop();

    let stats = trainer.agent().statistics();
    println!();
    println!("Training complete:");
    println!("  Episodes:      {}", stats.total_episodes);
    println!("  Updates:       {}", stats.training_steps);
    println!("  Q-table size:  {}", stats.q_table_size);
    println!("  Epsilon:       {:.4}", stats.epsilon);
    if let Some(best) = stats.best_reward {
        println!("  Best reward:   {:.2}", best);
    }
    println!("  Avg reward:    {:.2}", stats.average_reward);
    if let Some(last) = rewards.last() {
        println!("  Last reward:   {:.2}", last);
    }

    trainer.agent().save_model(output)?;
    println!("Model saved to {}", output.display());

    if let Some(path) = report {
        let baseline = trainer.test_random_baseline(baseline_trials);
        trainer.report(Some(baseline))?.save_to_file(path)?;
        println!("Report saved to {}", path.display());
    }
    Ok(())
}

fn evaluate(
    config: SimulationConfig,
    seed: Option<u64>,
    model: &Path,
    temperature: Option<f64>,
    trials: usize,
    layout_output: Option<&Path>,
) -> Result<()> {
    let mut trainer = build_trainer(config, seed)?;
    if let LoadOutcome::Reset { expected, found } = trainer.agent_mut().load_model(model)? {
        return Err(Error::IncompatibleModel { expected, found });
    }
    if let Some(t) = temperature {
        trainer.park_mut().set_temperature(t);
    }

    let baseline = trainer.test_random_baseline(trials);
    let evaluation = trainer.evaluate();

    println!("{}", trainer.park());
    for element in trainer.park().elements() {
        let (x, y) = trainer.park().world_to_grid(&element.position);
        println!("  {:<9} ({}, {})", element.element_type, x, y);
    }
    println!();
    print_metrics(&trainer.metrics());
    println!();
    println!("Learned layout:  {:.2}", evaluation.final_reward);
    println!(
        "Random layouts:  {:.2} ± {:.2} ({} trials)",
        baseline.mean, baseline.std_dev, baseline.trials
    );
    println!("Lift:            {:+.2}", evaluation.final_reward - baseline.mean);

    if let Some(path) = layout_output {
        trainer.park().to_snapshot().save_to_file(path)?;
        println!("Layout saved to {}", path.display());
    }
    Ok(())
}

fn simulate(
    config: SimulationConfig,
    seed: Option<u64>,
    layout: Option<&Path>,
    agents: usize,
    seconds: f64,
    dt: f64,
    temperature: Option<f64>,
) -> Result<()> {
    if dt.is_nan() || dt <= 0.0 {
        return Err(Error::Config("dt must be positive".into()));
    }

    let mut park = match layout {
        Some(path) => Park::from_snapshot(&ParkSnapshot::load_from_file(path)?, &config)?,
        None => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_rng(&mut rand::rng()),
            };
            let mut park = Park::from_config(&config)?;
            let count = park.capacity() / 2;
            park.randomize(count, &mut rng);
            park
        }
    };
    if let Some(t) = temperature {
        park.set_temperature(t);
    }

    let mut manager = match seed {
        Some(seed) => AgentManager::with_seed(config.pedestrian.clone(), seed),
        None => AgentManager::new(config.pedestrian.clone()),
    };
    manager.set_agent_count(&park, agents);

    println!("{}", park);
    let steps = (seconds / dt).ceil() as usize;
    let report_every = ((10.0 / dt).round() as usize).max(1);
    for step in 1..=steps {
        manager.update(&park, dt);
        if step % report_every == 0 || step == steps {
            let counts: Vec<String> = manager
                .state_counts()
                .into_iter()
                .filter(|(_, n)| *n > 0)
                .map(|(state, n)| format!("{}={}", state, n))
                .collect();
            println!("t={:>6.1}s  {}", step as f64 * dt, counts.join(" "));
        }
    }
    Ok(())
}

fn print_metrics(metrics: &ParkMetrics) {
    println!("Metrics:");
    for (name, value) in metrics.to_map() {
        println!("  {:<16} {:.3}", name, value);
    }
}
