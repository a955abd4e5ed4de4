//! Marginalia CLI
//!
//! Loads the stored overlays of one item onto its document and prints the
//! result.
//!
//! Usage: `marginalia <item-id> <document.xhtml> [--json]`

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marginalia::config::Config;
use marginalia::db::{self, OverlayRepository};
use marginalia::html::{sanitize_html, strip_overlay_markup};
use marginalia::{parse_xhtml, AnnotationSession};

struct Args {
    item_id: i64,
    path: String,
    json: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut positional = Vec::new();
    let mut json = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            _ => positional.push(arg),
        }
    }

    let [item_id, path] = <[String; 2]>::try_from(positional)
        .map_err(|_| anyhow::anyhow!("usage: marginalia <item-id> <document.xhtml> [--json]"))?;
    let item_id = item_id
        .parse()
        .with_context(|| format!("invalid item id: {}", item_id))?;

    Ok(Args { item_id, path, json })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marginalia=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    let args = parse_args()?;

    let pool = db::create_pool(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database initialized at {}", config.database.url);

    let raw = tokio::fs::read_to_string(&args.path)
        .await
        .with_context(|| format!("Failed to read {}", args.path))?;
    let cleaned = strip_overlay_markup(&sanitize_html(&raw)?)?;
    let document = parse_xhtml(&cleaned).with_context(|| format!("Failed to parse {}", args.path))?;
    if document.document_element().is_none() {
        bail!("{} has no root element", args.path);
    }

    let mut session = AnnotationSession::new(args.item_id, document, config.overlay);
    let repo = OverlayRepository::new(&pool);
    let report = session.load(&repo).await?;
    tracing::info!(
        "Loaded {} highlights and {} notes for item {}",
        report.highlights_loaded,
        report.annotations_loaded,
        args.item_id
    );

    if args.json {
        let output = serde_json::json!({
            "report": report,
            "overlays": session.summary(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", session.document().to_xhtml()?);
    }

    Ok(())
}
