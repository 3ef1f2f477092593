use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use niche_core::domain::contract::{AnalyzeRequest, Preferences};
use niche_core::engine::{AnalysisOptions, NicheEngine};
use niche_core::random::RandomSource;
use niche_core::storage::{MemoryNicheStore, NicheStore, PgNicheStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod domains;

#[derive(Debug, Parser)]
#[command(name = "niche_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score and rank candidate niches for one or more seed keywords.
    Analyze(AnalyzeArgs),
    /// Generate and score domain names for a keyword.
    Domains(domains::DomainsArgs),
}

#[derive(Debug, ClapArgs)]
struct AnalyzeArgs {
    /// Seed keyword; repeat for several.
    #[arg(long = "keyword", short = 'k', required = true)]
    keywords: Vec<String>,

    /// Number of recommendations. Defaults to NICHE_DEFAULT_LIMIT or 5.
    #[arg(long)]
    limit: Option<usize>,

    /// Keep only niches mentioning this industry term.
    #[arg(long)]
    industry: Option<String>,

    /// Include the fetched keyword records in the output.
    #[arg(long)]
    include_keyword_data: bool,

    /// Save the recommendations.
    #[arg(long)]
    save: bool,

    /// Seed for mock data and jitter. Overrides NICHE_RANDOM_SEED.
    #[arg(long)]
    seed: Option<u64>,

    /// Save into an in-memory store instead of the database.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = niche_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = match args.command {
        Command::Analyze(analyze) => run_analyze(&settings, analyze).await,
        Command::Domains(domain_args) => domains::run(domain_args),
    };

    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %err, "worker run failed");
    }
    result
}

async fn run_analyze(
    settings: &niche_core::config::Settings,
    args: AnalyzeArgs,
) -> anyhow::Result<()> {
    let mut options = AnalysisOptions::from_env();
    if let Some(seed) = args.seed {
        options.random = RandomSource::Seeded(seed);
    }

    let mut engine = NicheEngine::from_settings(settings, options)?;

    // The pool lives for the whole run and is closed before returning.
    let mut pool: Option<sqlx::PgPool> = None;
    if args.save {
        let store: Arc<dyn NicheStore> = if args.dry_run {
            Arc::new(MemoryNicheStore::new())
        } else {
            let db_url = settings.require_database_url()?;
            let pg = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await
                .context("connect DATABASE_URL failed")?;
            niche_core::storage::migrate(&pg).await?;
            pool = Some(pg.clone());
            Arc::new(PgNicheStore::new(pg))
        };
        engine = engine.with_store(store);
    }

    let request = AnalyzeRequest {
        keywords: args.keywords,
        limit: args.limit,
        preferences: args.industry.map(|industry| Preferences {
            industry: Some(industry),
        }),
        include_keyword_data: args.include_keyword_data,
        save: args.save,
    };

    let response = engine.analyze(request).await;

    if let Some(pool) = pool {
        pool.close().await;
    }

    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.success {
        anyhow::bail!(
            "niche analysis failed: {}",
            response.error.as_deref().unwrap_or("unknown error")
        );
    }
    if let Some(err) = &response.persistence_error {
        tracing::warn!(error = %err, dry_run = args.dry_run, "recommendations were not saved");
    }

    Ok(())
}

fn init_sentry(settings: &niche_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
