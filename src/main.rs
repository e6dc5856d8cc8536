use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use govrag::audit::AuditService;
use govrag::cli::{Cli, Commands};
use govrag::config::{self, Config};
use govrag::middleware::policy::PolicyScreener;
use govrag::providers::{self, gemini::GeminiClient};
use govrag::rag::{ingest, RagService};
use govrag::store::postgres::PgStore;
use govrag::store::vector::PgVectorIndex;
use govrag::{api, telemetry, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load()?;
    telemetry::init("govrag", cfg.debug)?;
    let args = Cli::parse();

    let result = match args.command {
        Some(Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(Commands::Migrate) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            db.migrate().await?;
            println!("Migrations applied.");
            Ok(())
        }
        Some(Commands::Seed) => handle_seed(&cfg).await,
        Some(Commands::Ask {
            prompt,
            language,
            user_id,
        }) => {
            let state = build_state(cfg).await?;
            handle_ask(&state, &prompt, language.as_deref(), user_id).await
        }
        Some(Commands::Review { command }) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            let audit = AuditService::new(Arc::new(db), cfg.analytics_window);
            let (decision, id, reviewer) = command.into_parts();
            let id = uuid::Uuid::parse_str(&id).context("Invalid audit log ID")?;
            let record = audit.review(id, decision, &reviewer).await?;
            println!(
                "Audit log reviewed:\n  ID:       {}\n  Status:   {}\n  Reviewer: {}",
                record.id,
                record.status,
                reviewer
            );
            Ok(())
        }
        Some(Commands::Stats) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            let audit = AuditService::new(Arc::new(db), cfg.analytics_window);
            let stats = audit.analytics().await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

/// Connect every collaborator up front. Any failure aborts startup.
async fn build_state(cfg: Config) -> anyhow::Result<Arc<AppState>> {
    tracing::info!("Connecting to database...");
    let db = PgStore::connect(&cfg.database_url).await?;

    tracing::info!("Running migrations...");
    db.migrate().await?;

    let embedder = providers::create_embedder(&cfg)?;
    let generator = Arc::new(GeminiClient::from_config(&cfg).context("generator setup failed")?);
    let index = Arc::new(PgVectorIndex::new(db.pool().clone()));

    if cfg.seed_sample_documents {
        let seeded = ingest::seed_if_empty(&*embedder, &*index).await?;
        if seeded > 0 {
            tracing::info!(seeded, "seeded sample documents");
        }
    }

    let screener = PolicyScreener::from_config(&cfg)?;
    tracing::info!(rules = screener.rule_count(), "policy screener ready");

    let rag = RagService::new(
        embedder,
        generator,
        index,
        cfg.retrieval_top_k,
        cfg.default_language.clone(),
    );
    let audit = AuditService::new(Arc::new(db), cfg.analytics_window);

    Ok(Arc::new(AppState {
        config: cfg,
        rag,
        screener,
        audit,
    }))
}

async fn run_server(cfg: Config, port: u16) -> anyhow::Result<()> {
    let state = build_state(cfg).await?;
    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("govrag listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_seed(cfg: &Config) -> anyhow::Result<()> {
    let db = PgStore::connect(&cfg.database_url).await?;
    db.migrate().await?;
    let embedder = providers::create_embedder(cfg)?;
    let index = PgVectorIndex::new(db.pool().clone());

    let added = ingest::ingest(&*embedder, &index, &ingest::sample_documents()).await?;
    println!("Ingested {} documents.", added);
    Ok(())
}

async fn handle_ask(
    state: &AppState,
    prompt: &str,
    language: Option<&str>,
    user_id: Option<String>,
) -> anyhow::Result<()> {
    if prompt.trim().is_empty() {
        anyhow::bail!("prompt must not be empty");
    }

    let answer = state.rag.generate_response(prompt, language).await?;
    let verdict = state.screener.check_prompt_and_response(prompt, &answer.answer);
    let audit_id = state
        .audit
        .create(
            user_id,
            prompt,
            &answer.answer,
            answer.sources.clone(),
            answer.confidence_score,
            verdict.violation,
        )
        .await?;

    println!("{}\n", answer.answer);
    println!("Confidence: {:.4}", answer.confidence_score);
    for source in &answer.sources {
        let name = source
            .metadata
            .get("source")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        println!("  - {} ({:.4})", name, source.similarity_score);
    }
    if verdict.violation {
        println!("Policy flags: {}", verdict.violations.join(", "));
    }
    println!("Audit ID: {} (pending review)", audit_id);
    Ok(())
}
