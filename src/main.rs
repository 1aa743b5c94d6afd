//! Quiz Matchmaker simulator
//!
//! Builds an in-memory assessment, selects the configured rating system and
//! lets a simulated learner of known skill answer questions, printing how the
//! learner's rating converges.

use anyhow::Result;
use clap::Parser;
use quiz_matchmaker::assessment::{AssessmentEngine, AssessmentPorts};
use quiz_matchmaker::config::AppConfig;
use quiz_matchmaker::learner::InMemoryLearnerStore;
use quiz_matchmaker::metrics::MetricsCollector;
use quiz_matchmaker::question::{InMemoryQuestionBank, InMemoryQuestionPool};
use quiz_matchmaker::rating::{expected_score, InMemoryConfigurationStore, RatingSystemRegistry};
use quiz_matchmaker::types::{AttemptOutcome, QuestionId, QuestionList, QuestionRating};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

const ASSESSMENT_ID: u64 = 1;
const QUESTION_LIST_ID: u64 = 1;
const LEARNER_ID: u64 = 1;

/// Quiz Matchmaker - adaptive question selection simulator
#[derive(Parser)]
#[command(
    name = "quiz-matchmaker",
    version,
    about = "Simulate a learner taking an adaptive Elo-rated assessment",
    long_about = "Builds an in-memory question pool, lets a simulated learner of known skill \
                 answer questions picked by the configured matchmaking strategy and reports \
                 the learner's rating after every attempt."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// True skill of the simulated learner
    #[arg(long, default_value = "1500.0")]
    learner_skill: f64,

    /// Number of questions the learner answers
    #[arg(short, long, default_value = "30")]
    attempts: usize,

    /// Number of questions in the simulated pool
    #[arg(long, default_value = "200")]
    pool_size: usize,

    /// Seed for the question pool and the learner's answers
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Target win probability override
    #[arg(long, value_name = "P")]
    win_probability: Option<f64>,

    /// Print Prometheus metrics after the run
    #[arg(long)]
    print_metrics: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without simulating")]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if let Some(p) = args.win_probability {
        config.matchmaking.user_win_probability = p;
    }

    quiz_matchmaker::config::validate_config(&config)?;
    Ok(config)
}

fn display_banner(config: &AppConfig, args: &Args) {
    info!("Quiz Matchmaker {}", quiz_matchmaker::VERSION);
    info!("   Rating system: {}", config.rating.default_rating_system);
    info!(
        "   Strategy: {} (p = {}, n = {})",
        config.matchmaking.strategy,
        config.matchmaking.user_win_probability,
        config.matchmaking.number_of_questions_to_select
    );
    info!("   Level ratings: {:?}", config.levels.level_ratings);
    info!(
        "   Learner skill: {}, attempts: {}, pool size: {}",
        args.learner_skill, args.attempts, args.pool_size
    );
}

/// Spread question ratings over the range learners are expected to cover
fn build_pool(config: &AppConfig, size: usize, rng: &mut StdRng) -> Result<InMemoryQuestionPool> {
    let bank = Arc::new(InMemoryQuestionBank::new());
    let pool = InMemoryQuestionPool::new().with_bank(bank.clone());
    let center = config.rating.default_question_rating;

    for i in 0..size {
        let id = i as QuestionId + 1;
        let rating = center + rng.random_range(-800.0..800.0);
        bank.add(id, &format!("Question {}", id), "Simulated question");
        pool.add_question(QuestionRating::new(id, QUESTION_LIST_ID, id, rating))?;
    }

    Ok(pool)
}

fn run_simulation(config: &AppConfig, args: &Args) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(args.seed);
    let metrics = Arc::new(MetricsCollector::new()?);

    let pool = Arc::new(build_pool(config, args.pool_size, &mut rng)?);
    let ports = AssessmentPorts {
        rating_systems: Arc::new(RatingSystemRegistry::new()),
        configuration_store: Arc::new(InMemoryConfigurationStore::new()),
        question_pool: pool,
        learner_store: Arc::new(InMemoryLearnerStore::new()),
    };

    let engine = AssessmentEngine::from_config(
        config,
        ASSESSMENT_ID,
        QuestionList::new(QUESTION_LIST_ID, "Simulated list"),
        ports,
    )?
    .with_metrics(metrics.clone());

    engine.select_rating_system(&config.rating.default_rating_system, None)?;

    let mut answered: HashSet<QuestionId> = HashSet::new();
    println!(
        "{:>4}  {:>8}  {:>9}  {:>7}  {:>9}  {:>5}",
        "#", "question", "q.rating", "answer", "learner", "level"
    );

    for attempt in 1..=args.attempts {
        let question = match engine.next_question(LEARNER_ID, &answered)? {
            Some(question) => question,
            None => {
                info!("Every question has been answered, starting over");
                answered.clear();
                match engine.next_question(LEARNER_ID, &answered)? {
                    Some(question) => question,
                    None => {
                        info!("Question pool is empty, stopping");
                        break;
                    }
                }
            }
        };

        let p_correct = expected_score(args.learner_skill, question.rating);
        let correct = rng.random_bool(p_correct.clamp(0.0, 1.0));

        let result = engine.record_outcome(&AttemptOutcome::new(
            LEARNER_ID,
            question.question_id,
            correct,
        ))?;
        answered.insert(question.question_id);

        println!(
            "{:>4}  {:>8}  {:>9.1}  {:>7}  {:>9.1}  {:>5}",
            attempt,
            question.question_id,
            question.rating,
            if correct { "correct" } else { "wrong" },
            result.learner.rating,
            result.level
        );
    }

    let learner = engine.learner(LEARNER_ID)?;
    let stats = engine.stats();
    info!(
        "Final rating {:.1} (true skill {}), highest level {}, {} outcomes, {} level-ups",
        learner.rating,
        args.learner_skill,
        learner.highest_level_reached,
        stats.outcomes_recorded,
        stats.level_ups
    );

    if args.print_metrics {
        println!("{}", metrics.export_text()?);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_banner(&config, &args);

    if args.dry_run {
        info!("Configuration validation successful");
        return Ok(());
    }

    if let Err(e) = run_simulation(&config, &args) {
        error!("Simulation failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
