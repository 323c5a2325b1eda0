use anyhow::{Context, Result};
use catalog::{feedback_stats, load_catalog, load_feedback, load_interactions, Catalog, InteractionLog};
use clap::{Parser, Subcommand};
use embedding_engine::EmbeddingIndex;
use evaluation_harness::{generate_interactions, EvaluationHarness, RerankEvaluationOptions};
use llm_interface::{OllamaReranker, RerankPipeline};
use recommender::{Recommender, SimilarItems};
use serde::Serialize;
use shoprec_core::{AppConfig, ErrorReporter, LoggingConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shoprec")]
#[command(about = "Hybrid product recommendations and offline ranking evaluation")]
struct Cli {
    /// Configuration file (TOML). Falls back to $SHOPREC_CONFIG, then defaults.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Top-k products for a user, profiled from their positive interactions
    Recommend {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Products closest to a given product
    Similar {
        #[arg(short, long)]
        product: String,
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Precision/recall@k over held-out positives
    Evaluate {
        #[arg(short, long)]
        k: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Baseline candidates re-ranked and explained by the LLM
    Rerank {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Evaluation through the LLM re-ranker
    EvaluateReranked {
        #[arg(short, long)]
        k: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        max_users: Option<usize>,
    },
    /// Distinct catalog categories
    Categories,
    /// Synthetic interaction log for the configured user profiles
    Generate {
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Helpful-rate of explanation feedback per model
    FeedbackStats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let reporter = ErrorReporter::new();

    let config = AppConfig::resolve(cli.config.as_deref()).await;
    let filter = match &config {
        Ok(config) => config.logging.filter.clone(),
        Err(_) => LoggingConfig::default().filter,
    };
    init_tracing(&filter);

    let config = config
        .inspect_err(|e| reporter.report_error(e))
        .context("failed to load configuration")?;

    run(cli.command, &config, &reporter).await
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Command, config: &AppConfig, reporter: &ErrorReporter) -> Result<()> {
    let default_k = config.recommender.default_k;

    match command {
        Command::Recommend { user, k } => {
            let catalog = read_catalog(config, reporter).await?;
            let index = build_index(&catalog, reporter)?;
            let log = interactions(config, reporter).await?;
            let recommendations = Recommender::new(&catalog, &index).recommend_for_user(
                &user,
                &log,
                k.unwrap_or(default_k),
            );
            print_json(&recommendations)
        }
        Command::Similar { product, k } => {
            let catalog = read_catalog(config, reporter).await?;
            let index = build_index(&catalog, reporter)?;
            let similar = SimilarItems::new(&catalog, &index)
                .similar(&product, k.unwrap_or(default_k))
                .inspect_err(|e| reporter.report_error(e))
                .with_context(|| format!("no similar products for {product}"))?;
            print_json(&similar)
        }
        Command::Evaluate { k, seed } => {
            let catalog = read_catalog(config, reporter).await?;
            let index = build_index(&catalog, reporter)?;
            let log = interactions(config, reporter).await?;
            let mut rng = seeded_rng(seed.or(config.evaluation.seed));
            let outcome = EvaluationHarness::new(Recommender::new(&catalog, &index))
                .evaluate(&log, k.unwrap_or(config.evaluation.k), &mut rng)
                .inspect_err(|e| reporter.report_error(e))
                .context("evaluation failed")?;
            print_json(&outcome)
        }
        Command::Rerank { user, k } => {
            let catalog = read_catalog(config, reporter).await?;
            let index = build_index(&catalog, reporter)?;
            let log = interactions(config, reporter).await?;
            let pipeline = rerank_pipeline(Recommender::new(&catalog, &index), config, reporter)?;
            let liked = log.liked_products(&user, &catalog);
            let explained = pipeline
                .recommend_until(&user, &liked, k.unwrap_or(default_k), interrupted())
                .await
                .inspect_err(|e| reporter.report_error(e))
                .context("re-rank request failed")?;
            print_json(&explained)
        }
        Command::EvaluateReranked { k, seed, max_users } => {
            let catalog = read_catalog(config, reporter).await?;
            let index = build_index(&catalog, reporter)?;
            let log = interactions(config, reporter).await?;
            let recommender = Recommender::new(&catalog, &index);
            let pipeline = rerank_pipeline(recommender, config, reporter)?;
            let mut options = RerankEvaluationOptions::from(&config.reranker);
            if let Some(max_users) = max_users {
                options.max_users = max_users;
            }
            let mut rng = seeded_rng(seed.or(config.evaluation.seed));
            let outcome = EvaluationHarness::new(recommender)
                .evaluate_reranked(
                    &pipeline,
                    &log,
                    k.unwrap_or(config.evaluation.k),
                    options,
                    &mut rng,
                )
                .await
                .inspect_err(|e| reporter.report_error(e))
                .context("re-ranked evaluation failed")?;
            print_json(&outcome)
        }
        Command::Categories => print_json(&read_catalog(config, reporter).await?.categories()),
        Command::Generate { seed } => {
            let catalog = read_catalog(config, reporter).await?;
            let mut rng = seeded_rng(seed.or(config.evaluation.seed));
            print_json(&generate_interactions(&catalog, &config.generation.users, &mut rng))
        }
        Command::FeedbackStats => {
            let path = &config.data.feedback_path;
            let entries = load_feedback(path)
                .await
                .inspect_err(|e| reporter.report_error(e))
                .with_context(|| format!("failed to load feedback {}", path.display()))?;
            print_json(&feedback_stats(&entries))
        }
    }
}

async fn read_catalog(config: &AppConfig, reporter: &ErrorReporter) -> Result<Catalog> {
    let path = &config.data.catalog_path;
    load_catalog(path)
        .await
        .inspect_err(|e| reporter.report_error(e))
        .with_context(|| format!("failed to load catalog {}", path.display()))
}

fn build_index(catalog: &Catalog, reporter: &ErrorReporter) -> Result<EmbeddingIndex> {
    EmbeddingIndex::build(catalog.products())
        .inspect_err(|e| reporter.report_error(e))
        .context("failed to build embedding index")
}

async fn interactions(config: &AppConfig, reporter: &ErrorReporter) -> Result<InteractionLog> {
    let path = &config.data.interactions_path;
    load_interactions(path)
        .await
        .inspect_err(|e| reporter.report_error(e))
        .with_context(|| format!("failed to load interactions {}", path.display()))
}

fn rerank_pipeline<'a>(
    recommender: Recommender<'a>,
    config: &AppConfig,
    reporter: &ErrorReporter,
) -> Result<RerankPipeline<'a, OllamaReranker>> {
    let reranker = OllamaReranker::from_config(&config.reranker)
        .inspect_err(|e| reporter.report_error(e))
        .context("failed to set up the re-ranker")?;
    info!("Re-ranking through {} ({})", reranker.endpoint(), config.reranker.model);
    Ok(RerankPipeline::new(recommender, reranker)
        .with_candidate_pool(config.reranker.candidate_pool)
        .with_timeout(config.reranker.timeout()))
}

fn seeded_rng(seed: Option<u64>) -> fastrand::Rng {
    match seed {
        Some(seed) => {
            info!("Using evaluation seed {}", seed);
            fastrand::Rng::with_seed(seed)
        }
        None => fastrand::Rng::new(),
    }
}

/// Resolves on Ctrl-C. Never resolves if the signal handler cannot be set up.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    info!("Interrupted, cancelling re-rank request");
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}
