use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use girder::bluesky::{BskyClient, DestinationClient};
use girder::config::Config;
use girder::mastodon::{MastodonClient, SourceClient};
use girder::sync::{Bridge, BridgeSettings};

/// Girder: mirror a Mastodon account's public posts to Bluesky.
///
/// Polls the source account, normalizes and splits content to fit the
/// destination's length limit, preserves reply threads, and re-mirrors
/// posts whose content was edited.
#[derive(Parser)]
#[command(name = "girder", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Verify credentials against both platforms
    Check,

    /// Run the bridge loop
    Run {
        /// Do a single reconciliation pass instead of looping
        #[arg(long)]
        once: bool,
    },

    /// Show bridge status (cursor, mirrored posts, last edit check)
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("girder=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing girder database...");
            let config = Config::load()?;
            let db = girder::db::initialize_sqlite(&config.db_path)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nGirder is ready. Next step: set up your .env file");
            println!("  (see .env.example for required variables)");
            println!("\nThen run: girder check");
        }

        Commands::Check => {
            let config = Config::load()?;
            config.require_mastodon()?;
            config.require_bluesky()?;

            let masto = build_mastodon(&config)?;
            let bsky = build_bluesky(&config)?;

            println!("Checking Mastodon credentials...");
            let account = masto.verify_credentials().await?;
            println!(
                "  {} @{} ({})",
                "OK".green().bold(),
                account.acct,
                account.display_name
            );

            println!("Checking Bluesky credentials...");
            let session = bsky.ensure_session().await?;
            println!("  {} {}", "OK".green().bold(), session.did);

            println!("\n{}", "Both accounts verified. Run `girder run`.".bold());
        }

        Commands::Run { once } => {
            let config = Config::load()?;
            config.require_mastodon()?;
            config.require_bluesky()?;
            let db = girder::db::open_sqlite(&config.db_path)?;

            let masto = build_mastodon(&config)?;
            let bsky = build_bluesky(&config)?;

            // Verify both sides before entering the loop — a broken
            // credential should abort the process, not spin forever.
            let account = masto.verify_credentials().await?;
            info!(acct = %account.acct, "Mastodon account verified");
            let session = bsky.ensure_session().await?;
            info!(did = %session.did, "Bluesky session established");

            let settings = BridgeSettings {
                poll_interval: config.poll_interval(),
                edit_interval: config.edit_interval(),
                part_delay: config.part_delay(),
                filter_hashtags: config.filter_hashtags.clone(),
            };

            let source: Arc<dyn SourceClient> = masto;
            let dest: Arc<dyn DestinationClient> = bsky;
            let bridge = Bridge::new(source, dest, db, settings);

            if once {
                bridge.run_once().await?;
                println!("Single reconciliation pass complete.");
            } else {
                bridge.run().await?;
            }
        }

        Commands::Status => {
            let config = Config::load()?;
            let db = girder::db::open_sqlite(&config.db_path)?;
            girder::status::show(&db, &config.db_path).await?;
        }
    }

    Ok(())
}

fn build_mastodon(config: &Config) -> Result<Arc<MastodonClient>> {
    Ok(Arc::new(MastodonClient::new(
        &config.mastodon_server,
        &config.mastodon_access_token,
        config.filter_hashtags.clone(),
    )?))
}

fn build_bluesky(config: &Config) -> Result<Arc<BskyClient>> {
    Ok(Arc::new(BskyClient::new(
        &config.bluesky_pds_url,
        &config.bluesky_identifier,
        &config.bluesky_app_password,
    )?))
}
