// ABOUTME: venuemap command-line front end: scrape, geocode, address report and overview.
// ABOUTME: Wires venuemap-core's pipeline to the blocking fetcher and the Places geocoder.

mod config;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;
use serde_json::{json, Value};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use venuemap_core::{
    apply_addresses, build_overview, changed, collect_addresses, default_report_name,
    default_sources, enrich, extract, geocode_records, load_snapshot, missing_report_path,
    normalize_category, read_snapshot, save_snapshot, write_address_csv, write_missing_csv,
    AddressStatus, EnrichOptions, GeoTables, Record,
};
use venuemap_net::{Fetcher, PlacesGeocoder};

use crate::config::AppConfig;

/// Scrape ranked venue listings and turn them into map-ready data.
#[derive(Parser, Debug)]
#[command(name = "venuemap")]
#[command(about = "Scrape, geocode and summarise ranked venue lists", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch list pages, enrich from detail pages and update the snapshot when it changed.
    Scrape(ScrapeArgs),
    /// Fill in coordinates for every record in the snapshot.
    Geocode(GeocodeArgs),
    /// Pull contact-section addresses from detail pages into CSV reports.
    Addresses(AddressArgs),
    /// Print normalized rows and per-country aggregates as JSON.
    Overview(OverviewArgs),
}

#[derive(Args, Debug)]
struct DataFileArg {
    /// Snapshot file (defaults to VENUEMAP_DATA_FILE or data/current_list.json).
    #[arg(long)]
    data_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    #[command(flatten)]
    data: DataFileArg,

    /// Pause between detail pages, in seconds.
    #[arg(long)]
    sleep_seconds: Option<f64>,

    /// Extra attempts per detail page after a failure.
    #[arg(long, default_value_t = 2)]
    retries: u32,

    /// List source as "Category=URL"; repeatable. Defaults to the two built-in lists.
    #[arg(long = "source", value_parser = parse_source)]
    sources: Vec<(String, String)>,
}

#[derive(Args, Debug)]
struct GeocodeArgs {
    #[command(flatten)]
    data: DataFileArg,

    /// Places API key (defaults to GOOGLE_MAPS_API_KEY).
    #[arg(long)]
    api_key: Option<String>,
}

#[derive(Args, Debug)]
struct AddressArgs {
    #[command(flatten)]
    data: DataFileArg,

    /// Category to report on, or "all".
    #[arg(long, default_value = "all")]
    category: String,

    #[arg(long)]
    output_file: Option<PathBuf>,

    #[arg(long)]
    missing_output_file: Option<PathBuf>,

    /// Only visit the first N matching records.
    #[arg(long)]
    limit: Option<usize>,

    /// Write scraped addresses back into the snapshot's formatted_address.
    #[arg(long, default_value_t = false)]
    update_state: bool,
}

#[derive(Args, Debug)]
struct OverviewArgs {
    #[command(flatten)]
    data: DataFileArg,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = AppConfig::from_env();

    let (output, compact) = match cli.command {
        Command::Scrape(args) => (run_scrape(&config, args)?, false),
        Command::Geocode(args) => (run_geocode(&config, args)?, false),
        Command::Addresses(args) => (run_addresses(&config, args)?, false),
        Command::Overview(args) => {
            let compact = args.compact;
            (run_overview(&config, args)?, compact)
        }
    };

    if compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,venuemap=debug"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn parse_source(raw: &str) -> std::result::Result<(String, String), String> {
    let (category, url) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected Category=URL, got {raw:?}"))?;
    if url.trim().is_empty() {
        return Err(format!("missing URL in {raw:?}"));
    }
    Ok((normalize_category(Some(category)), url.trim().to_string()))
}

fn data_file(config: &AppConfig, arg: DataFileArg) -> PathBuf {
    arg.data_file.unwrap_or_else(|| config.data_file.clone())
}

fn build_fetcher(config: &AppConfig) -> Result<Fetcher> {
    let mut builder = Fetcher::builder().timeout(config.timeout);
    if let Some(agent) = &config.user_agent {
        builder = builder.user_agent(agent.clone());
    }
    Ok(builder.build()?)
}

fn run_scrape(config: &AppConfig, args: ScrapeArgs) -> Result<Value> {
    let path = data_file(config, args.data);
    let fetcher = build_fetcher(config)?;
    let sources = if args.sources.is_empty() {
        default_sources()
    } else {
        args.sources
    };

    let mut listed: Vec<Record> = Vec::new();
    let mut fetched_sources = 0;
    for (category, url) in &sources {
        match fetcher.fetch(url) {
            Ok(document) => {
                fetched_sources += 1;
                let records = extract(&document, category);
                info!(%category, url = %url, records = records.len(), "list page extracted");
                listed.extend(records);
            }
            Err(err) => warn!(%category, error = %err, "list page fetch failed"),
        }
    }
    if fetched_sources == 0 {
        bail!("none of the {} list pages could be fetched", sources.len());
    }

    let delay = match args.sleep_seconds {
        Some(secs) => Duration::try_from_secs_f64(secs)
            .map_err(|_| anyhow!("--sleep-seconds must be a non-negative number"))?,
        None => config.sleep,
    };
    let options = EnrichOptions {
        delay,
        retries: args.retries,
        ..EnrichOptions::default()
    };
    let (records, stats) = enrich(&listed, |url: &str| fetcher.fetch(url), options);

    let previous = load_snapshot(&path);
    let is_changed = changed(&previous, &records);
    // the fingerprint ignores addresses, so the snapshot is always replaced
    save_snapshot(&path, &records)?;
    info!(
        path = %path.display(),
        records = records.len(),
        changed = is_changed,
        "snapshot written"
    );

    Ok(json!({
        "data_file": path.display().to_string(),
        "sources": fetched_sources,
        "records": records.len(),
        "changed": is_changed,
        "enrichment": {
            "attempted": stats.attempted,
            "skipped": stats.skipped,
            "failed": stats.failed,
            "updated": stats.updated,
            "fetch_calls": stats.fetch_calls,
        },
    }))
}

fn run_geocode(config: &AppConfig, args: GeocodeArgs) -> Result<Value> {
    let path = data_file(config, args.data);
    let api_key = args
        .api_key
        .filter(|key| !key.trim().is_empty())
        .map(SecretString::from)
        .or_else(|| config.google_maps_api_key.clone())
        .context("a Places API key is required (--api-key or GOOGLE_MAPS_API_KEY)")?;

    let mut records = read_snapshot(&path)?;
    let geocoder = PlacesGeocoder::new(build_fetcher(config)?, api_key);
    let stats = geocode_records(&mut records, &geocoder);
    if stats.resolved > 0 {
        save_snapshot(&path, &records)?;
    }

    Ok(json!({
        "data_file": path.display().to_string(),
        "records": records.len(),
        "resolved": stats.resolved,
        "resolved_by_fallback": stats.resolved_by_fallback,
        "not_found": stats.not_found,
        "failed": stats.failed,
    }))
}

fn run_addresses(config: &AppConfig, args: AddressArgs) -> Result<Value> {
    let path = data_file(config, args.data);
    let mut records = read_snapshot(&path)?;
    let fetcher = build_fetcher(config)?;

    let results = collect_addresses(
        &records,
        &args.category,
        |url: &str| fetcher.fetch(url),
        args.limit,
    );

    let report = args
        .output_file
        .unwrap_or_else(|| config.output_dir.join(default_report_name(&args.category)));
    let missing = args
        .missing_output_file
        .unwrap_or_else(|| missing_report_path(&report));
    write_address_csv(&results, &report)
        .with_context(|| format!("writing {}", report.display()))?;
    write_missing_csv(&results, &missing)
        .with_context(|| format!("writing {}", missing.display()))?;

    let found = results
        .iter()
        .filter(|r| r.status == AddressStatus::Ok)
        .count();
    let mut updated = 0;
    if args.update_state {
        updated = apply_addresses(&mut records, &results);
        if updated > 0 {
            save_snapshot(&path, &records)?;
        }
    }

    Ok(json!({
        "report": report.display().to_string(),
        "missing_report": missing.display().to_string(),
        "rows": results.len(),
        "with_address": found,
        "missing": results.len() - found,
        "snapshot_updates": updated,
    }))
}

fn run_overview(config: &AppConfig, args: OverviewArgs) -> Result<Value> {
    let path = data_file(config, args.data);
    let records = read_snapshot(&path)?;
    let overview = build_overview(&records, GeoTables::builtin());
    Ok(serde_json::to_value(overview)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_flag_splits_on_the_first_equals() {
        assert_eq!(
            parse_source("south=https://example.com/list/?page=2").unwrap(),
            (
                "South America".to_string(),
                "https://example.com/list/?page=2".to_string()
            )
        );
        assert!(parse_source("https://example.com").is_err());
        assert!(parse_source("Top 100= ").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
