#![deny(
    warnings,
    missing_debug_implementations,
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
//! `gachaview` - Searchable image gallery catalog with gacha rolls and a swipe viewer.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_cargo::style::CLAP_STYLING;
use gachaview::catalog::{AbortHandle, CatalogLoader};
use gachaview::config::Config;
use gachaview::error::{Error, Result};
use gachaview::indexer::{Indexer, Progress};
use gachaview::permalink::{roll_request, share_link};
use gachaview::rarity::{RarityInfo, calculate_rarity};
use gachaview::roll::{RollSession, resolve_shared};
use gachaview::search::QueryEngine;
use gachaview::types::Catalog;
use tracing_subscriber::EnvFilter;
use url::Url;

/// CLI arguments for `gachaview`
#[derive(Parser, Debug)]
#[command(author, version, about, styles = CLAP_STYLING)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, default_value = "gachaview.json")]
    config:      PathBuf,
    /// Override the listing endpoint
    #[arg(long, global = true)]
    listing_url: Option<String>,
    /// Override the raw-content prefix of asset URLs
    #[arg(long, global = true)]
    raw_prefix:  Option<String>,
    /// Override the share page URL
    #[arg(long, global = true)]
    share_url:   Option<String>,
    #[command(subcommand)]
    command:     Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Command {
    /// Search image paths, an empty query lists the catalog shuffled
    Search {
        /// Search query
        #[arg(default_value = "")]
        query: String,
        /// Maximum number of results to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Roll a random image and show its rarity
    Roll,
    /// Show the rarity of one image path
    Rarity {
        /// Repository-relative image path
        path: String,
    },
    /// Print the share link of an image path
    Share {
        /// Repository-relative image path
        path: String,
    },
    /// Resolve a share link
    Open {
        /// Share link to resolve
        link:    String,
        /// Do not fetch the catalog, rarity is left out
        #[arg(long)]
        offline: bool,
    },
}

/// Install the stderr log subscriber, `RUST_LOG` overrides the `warn` default
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Merge the config file with command-line overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(&cli.config)?;
    if let Some(url) = &cli.listing_url {
        config.listing_url.clone_from(url);
    }
    if let Some(prefix) = &cli.raw_prefix {
        config.raw_prefix.clone_from(prefix);
    }
    if let Some(url) = &cli.share_url {
        config.share_url.clone_from(url);
    }
    Ok(config)
}

/// Fetch the catalog snapshot
fn fetch_catalog(config: &Config) -> Result<Catalog> {
    let loader = CatalogLoader::new(config)?;
    let catalog = loader.fetch(&AbortHandle::new())?;
    println!("Loaded {} images", catalog.len());
    Ok(catalog)
}

fn print_rarity(rarity: &RarityInfo) {
    println!("Rank: {} ({})", rarity.rank, rarity.rank.color());
    println!("Appearance rate: {:.3}%", rarity.appearance_rate * 100.0);
}

/// Index the catalog batch by batch and run one query
fn search(config: &Config, query: &str, limit: usize) -> Result<()> {
    let catalog = fetch_catalog(config)?;

    let mut indexer = Indexer::new(config.batch_size);
    indexer.start(&catalog);
    let mut last = Progress { processed: 0, total: catalog.len(), ready: false };
    while indexer.process_next(|progress| last = progress).is_some() {
        eprint!("\rIndexing: {:>5.1}%", last.fraction() * 100.0);
    }
    eprintln!();

    let mut engine = QueryEngine::new();
    let results = engine.query(query, indexer.index());
    if results.is_empty() {
        println!("\nNo matches found for query: {query}");
        println!("Tips:");
        println!("  - Try fewer or shorter search terms");
        println!("  - Language names like C++ and C# are matched whole");
        return Ok(());
    }

    println!("\nFound {} matches:", results.len());
    for ordinal in results.into_iter().take(limit) {
        if let Some(entry) = catalog.get(ordinal) {
            println!("{:>6} | {} | {}", ordinal, entry.path, entry.url);
        }
    }
    Ok(())
}

fn roll(config: &Config) -> Result<()> {
    let catalog = fetch_catalog(config)?;
    let share_page = Url::parse(&config.share_url)?;
    let home = Url::parse(&config.home_url)?;

    let mut session = RollSession::new();
    let rolled = session.roll(&catalog)?;
    println!("\n{}", rolled.image.path);
    print_rarity(&rolled.rarity);
    println!("Image: {}", rolled.image.url);
    println!("Share: {}", rolled.share_link(&share_page));
    println!("Roll again: {}", roll_request(&home));
    Ok(())
}

fn rarity(config: &Config, path: &str) -> Result<()> {
    let catalog = fetch_catalog(config)?;
    if catalog.position(path).is_none() {
        println!("Note: {path} is not in the catalog");
    }
    print_rarity(&calculate_rarity(path, catalog.paths()));
    Ok(())
}

fn share(config: &Config, path: &str) -> Result<()> {
    let share_page = Url::parse(&config.share_url)?;
    println!("{}", share_link(&share_page, path));
    Ok(())
}

fn open(config: &Config, link: &str, offline: bool) -> Result<()> {
    let link = Url::parse(link)?;

    let catalog = if offline {
        None
    } else {
        match fetch_catalog(config) {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                tracing::warn!(error = %e, "catalog unavailable, showing roll without rarity");
                None
            },
        }
    };

    let shared = resolve_shared(&link, &config.raw_prefix, catalog.as_ref())?;
    println!("\n{}", shared.path);
    println!("Image: {}", shared.url);
    match &shared.rarity {
        Some(rarity) => {
            println!("Someone rolled a {}-Rank image!", rarity.rank);
            print_rarity(rarity);
        },
        None => println!("Rarity: unavailable until the catalog loads"),
    }
    Ok(())
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = load_config(&cli).and_then(|config| match &cli.command {
        Command::Search { query, limit } => search(&config, query, *limit),
        Command::Roll => roll(&config),
        Command::Rarity { path } => rarity(&config, path),
        Command::Share { path } => share(&config, path),
        Command::Open { link, offline } => open(&config, link, *offline),
    });

    if let Err(e) = result {
        eprintln!("{}", e.user_message());
        let code = if matches!(e, Error::ShareNotFound(_)) { 2 } else { 1 };
        std::process::exit(code);
    }
}
