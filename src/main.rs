use anyhow::{Context, Result};
use clap::Parser;
use feedgate::{Config, FeedPayload, HttpBus, Pipeline, PipelineOptions, SqliteStore};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "feedgate",
    about = "Poll a feed once and publish newly-seen entries to a message bus"
)]
struct Args {
    /// Invocation payload JSON file (reads stdin when omitted)
    #[arg(long, value_name = "FILE")]
    payload: Option<PathBuf>,

    /// Configuration file
    #[arg(long, value_name = "FILE", default_value = "feedgate.toml")]
    config: PathBuf,

    /// Evict expired cache records for the payload's namespace before polling
    #[arg(long)]
    evict_expired: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config).context("Failed to load configuration")?;

    let raw = match &args.payload {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("Failed to read payload file '{}'", path.display()))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read payload from stdin")?;
            buf
        }
    };
    let payload = FeedPayload::decode(&raw).context("Failed to decode invocation payload")?;

    // Long-lived clients, constructed once and handed into the pipeline
    let store = SqliteStore::open(&config.database_path)
        .await
        .with_context(|| format!("Failed to open dedup store at '{}'", config.database_path))?;

    if args.evict_expired {
        let evicted = store
            .evict_expired(&payload.cache_path)
            .await
            .context("Failed to evict expired cache records")?;
        tracing::info!(
            namespace = %payload.cache_path,
            evicted = evicted,
            "Evicted expired cache records"
        );
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;
    let bus = HttpBus::new(client.clone(), &config.bus_base_url).context("Invalid bus base URL")?;

    let opts = PipelineOptions {
        fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
        max_feed_bytes: config.max_feed_bytes,
        max_in_flight: config.max_in_flight,
        retention: Duration::from_secs(config.retention_days * 24 * 3600),
    };
    let pipeline = Pipeline::new(client, Arc::new(store), Arc::new(bus), opts);

    let deadline = (config.invocation_deadline_secs > 0)
        .then(|| Duration::from_secs(config.invocation_deadline_secs));

    let report = pipeline
        .run_with_deadline(&payload, deadline)
        .await
        .with_context(|| format!("Poll failed for '{}'", payload.cache_path))?;

    println!(
        "Published {} of {} fetched items for {}",
        report.published, report.fetched, payload.cache_path
    );
    Ok(())
}
