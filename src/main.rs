//! Wiring & DI. Entry point: parse flags, bootstrap adapters, inject into
//! services, run the pipeline once. No business logic here.

use chrono::Local;
use dotenv::dotenv;
use slack_digest::adapters::integrations::NotionAdapter;
use slack_digest::adapters::model::AnthropicAdapter;
use slack_digest::adapters::render;
use slack_digest::adapters::slack::{MockSlackGateway, SlackApiGateway};
use slack_digest::ports::{ExportPort, ModelPort, SlackGateway};
use slack_digest::shared::RateLimiter;
use slack_digest::shared::config::AppConfig;
use slack_digest::usecases::{ClassifyService, IdentityCache, IngestService};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "\
slack-digest

Gebruik:
  slack-digest [opties]

Opties:
  --dry-run              Gebruik mock data (geen API calls)
  --hours <n>            Uren terug kijken (standaard: 24)
  --channels <a,b,c>     Alleen deze kanalen ophalen
  --notion               Push samenvatting naar Notion
  --help                 Toon dit bericht
";

#[derive(Debug, Default)]
struct CliArgs {
    dry_run: bool,
    hours: Option<i64>,
    channels: Option<Vec<String>>,
    notion: bool,
}

fn parse_args() -> anyhow::Result<CliArgs> {
    let mut args = CliArgs::default();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--dry-run" => args.dry_run = true,
            "--hours" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--hours requires a value"))?;
                args.hours = Some(value.parse()?);
            }
            "--channels" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--channels requires a value"))?;
                args.channels = Some(
                    value
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect(),
                );
            }
            "--notion" => args.notion = true,
            "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown flag {:?}\n\n{}", other, USAGE),
        }
    }

    Ok(args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args()?;
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load().unwrap_or_default();

    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
        cfg.rate_limit_ms_or_default(),
    )));

    // --- Slack gateway (real or mock, chosen before any remote call) ---
    let gateway: Arc<dyn SlackGateway> = if args.dry_run {
        info!("dry-run mode: mock Slack gateway, rule-based classification");
        Arc::new(MockSlackGateway::new())
    } else {
        let token = cfg.slack_bot_token().unwrap_or_default();
        if token.is_empty() {
            anyhow::bail!(
                "Set SLACK_BOT_TOKEN (env or .env). Create a bot token at https://api.slack.com/apps"
            );
        }
        Arc::new(SlackApiGateway::new(token, Arc::clone(&limiter)))
    };

    // --- Ingestion: channels -> history -> identities -> threads ---
    let identities = Arc::new(IdentityCache::new(Arc::clone(&gateway)));
    let ingest = IngestService::new(Arc::clone(&gateway), identities, Arc::clone(&limiter));

    let hours = args.hours.unwrap_or_else(|| cfg.hours_back_or_default());
    let filter = args.channels.or_else(|| cfg.channel_filter());
    info!(hours, "fetching recent Slack messages");

    let channel_messages = ingest
        .fetch_recent(hours, filter.as_deref())
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let total: usize = channel_messages.iter().map(|c| c.messages.len()).sum();
    info!(
        messages = total,
        channels = channel_messages.len(),
        "ingestion complete"
    );

    // --- Classification (model-backed when configured, rules otherwise) ---
    let model: Option<Arc<dyn ModelPort>> = if !args.dry_run && cfg.is_model_configured() {
        info!(model = %cfg.model_or_default(), "model-backed classification enabled");
        Some(Arc::new(AnthropicAdapter::new(
            cfg.anthropic_api_key().unwrap_or_default(),
            cfg.model_or_default(),
        )))
    } else {
        if !args.dry_run {
            warn!("ANTHROPIC_API_KEY not set, using rule-based classification");
        }
        None
    };

    let classifier = ClassifyService::new(model).with_chunk_size(cfg.chunk_size_or_default());
    let digest = classifier.classify(&channel_messages).await;

    // --- Render dashboard ---
    let now = Local::now();
    let html = render::render(&digest, now);
    let output_dir = PathBuf::from(cfg.output_dir_or_default());
    tokio::fs::create_dir_all(&output_dir)
        .await
        .map_err(|e| anyhow::anyhow!("create output dir: {}", e))?;
    let output_path = output_dir.join(format!("digest-{}.html", now.format("%Y-%m-%d")));
    tokio::fs::write(&output_path, html)
        .await
        .map_err(|e| anyhow::anyhow!("write digest: {}", e))?;
    info!(path = %output_path.display(), "digest written");

    // --- Optional Notion export; failure never invalidates the digest ---
    if args.notion {
        if cfg.is_notion_configured() {
            let notion: Arc<dyn ExportPort> = Arc::new(NotionAdapter::new(
                cfg.notion_api_key().unwrap_or_default(),
                cfg.notion_database_id().unwrap_or_default(),
            ));
            match notion.push_digest(&digest).await {
                Ok(url) => info!(url = %url, "digest exported to Notion"),
                Err(e) => warn!(error = %e, "Notion export failed, digest is still on disk"),
            }
        } else {
            warn!("--notion requested but NOTION_API_KEY or NOTION_DATABASE_ID missing, skipping");
        }
    }

    Ok(())
}
