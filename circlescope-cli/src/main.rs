//! CircleScope CLI - Command-line interface
//!
//! This binary exercises the CircleScope library against the live
//! services: place search, road clipping, building queries and location
//! prompts, all from a center coordinate and radius.

mod error;

use clap::{Parser, Subcommand};
use tracing::info;

use circlescope::filter::BuildingFilter;
use circlescope::geometry::{circle_polygon, clip_ways, LonLat, DEFAULT_CIRCLE_STEPS};
use circlescope::logging;
use circlescope::manager::{highway_color, PlaceBucket};
use circlescope::provider::{
    apply_offset, FoursquarePlaces, LocationBackend, LocationResponse, MaksBuildings,
    OverpassRoads, Place, PlaceProvider, ReqwestClient, RoadProvider,
};
use circlescope::provider::BuildingProvider;

use error::CliError;

#[derive(Parser)]
#[command(name = "circlescope")]
#[command(version = circlescope::VERSION)]
#[command(about = "Query geo services around a radius circle", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search places by category bucket around a center
    Places {
        /// Latitude in decimal degrees
        #[arg(long)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long)]
        lon: f64,

        /// Search radius in meters
        #[arg(long, default_value = "500")]
        radius: f64,

        /// Comma-separated buckets: cafe,pharmacy,hospital,market,fuel,park
        #[arg(long, value_delimiter = ',')]
        categories: Vec<PlaceBucket>,

        /// Foursquare API key (falls back to FOURSQUARE_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Fetch highways around a center and clip them to the circle
    Roads {
        #[arg(long)]
        lat: f64,

        #[arg(long)]
        lon: f64,

        #[arg(long, default_value = "500")]
        radius: f64,

        /// Overpass interpreter URL
        #[arg(long)]
        overpass_url: Option<String>,
    },

    /// Fetch building footprints around a center
    Buildings {
        #[arg(long)]
        lat: f64,

        #[arg(long)]
        lon: f64,

        #[arg(long, default_value = "500")]
        radius: f64,

        /// Buildings API base URL
        #[arg(long, default_value = "http://localhost:8001")]
        maks_url: String,

        /// Keep only buildings with at least this many floors above ground
        #[arg(long)]
        min_floors: Option<i64>,

        /// Keep only buildings with this status code
        #[arg(long)]
        status: Option<String>,
    },

    /// Resolve a natural-language location prompt
    Locate {
        /// The prompt, e.g. "en yakın kafe"
        prompt: String,

        /// Location backend base URL
        #[arg(long, default_value = "http://localhost:8001")]
        backend_url: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _guard = match logging::init_logging(logging::default_log_dir(), logging::default_log_file())
    {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e.to_string()).exit(),
    };

    let result = match cli.command {
        Command::Places {
            lat,
            lon,
            radius,
            categories,
            api_key,
        } => run_places(LonLat::new(lon, lat), radius, categories, api_key).await,
        Command::Roads {
            lat,
            lon,
            radius,
            overpass_url,
        } => run_roads(LonLat::new(lon, lat), radius, overpass_url).await,
        Command::Buildings {
            lat,
            lon,
            radius,
            maks_url,
            min_floors,
            status,
        } => run_buildings(LonLat::new(lon, lat), radius, maks_url, min_floors, status).await,
        Command::Locate {
            prompt,
            backend_url,
        } => run_locate(&prompt, &backend_url).await,
    };

    if let Err(e) = result {
        e.exit();
    }
}

fn http_client() -> Result<ReqwestClient, CliError> {
    ReqwestClient::new().map_err(CliError::HttpClient)
}

async fn run_places(
    center: LonLat,
    radius: f64,
    categories: Vec<PlaceBucket>,
    api_key: Option<String>,
) -> Result<(), CliError> {
    let api_key = api_key
        .or_else(|| std::env::var("FOURSQUARE_API_KEY").ok())
        .ok_or_else(|| CliError::Config("no Foursquare API key".to_string()))?;
    let buckets = if categories.is_empty() {
        PlaceBucket::ALL.to_vec()
    } else {
        categories
    };

    let provider = FoursquarePlaces::new(http_client()?, api_key);
    let codes: Vec<u32> = buckets
        .iter()
        .flat_map(|b| b.codes().iter().copied())
        .collect();

    // Same chunking the manager uses: at most 30 codes per request.
    let mut places: Vec<Place> = Vec::new();
    for chunk in codes.chunks(30) {
        places.extend(provider.search(center, radius, chunk).await?);
    }
    places.sort_by(|a, b| a.id.cmp(&b.id));
    places.dedup_by(|a, b| a.id == b.id);
    info!(count = places.len(), "places fetched");

    println!("Places within {radius:.0} m of {center}:");
    for place in &places {
        let bucket = place
            .category_ids
            .iter()
            .find_map(|c| PlaceBucket::for_code(*c));
        let Some(bucket) = bucket else { continue };
        println!(
            "  [{:<8}] {} @ {}{}",
            bucket.as_str(),
            place.name,
            place.position,
            place
                .address
                .as_deref()
                .map(|a| format!(" ({a})"))
                .unwrap_or_default()
        );
    }
    Ok(())
}

async fn run_roads(
    center: LonLat,
    radius: f64,
    overpass_url: Option<String>,
) -> Result<(), CliError> {
    let mut provider = OverpassRoads::new(http_client()?);
    if let Some(url) = overpass_url {
        provider = provider.with_url(url);
    }

    let ways = provider.highways_around(center, radius).await?;
    let ring = circle_polygon(center, radius, DEFAULT_CIRCLE_STEPS)?;
    let clipped = clip_ways(&ways, &ring);

    println!(
        "{} ways fetched, {} segments after clipping to the circle",
        ways.len(),
        clipped.len()
    );

    let mut per_class: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
    for line in &clipped {
        *per_class.entry(line.highway.as_str()).or_insert(0) += 1;
    }
    for (class, count) in per_class {
        println!("  {:<14} {:>4}  {}", class, count, highway_color(class));
    }
    Ok(())
}

async fn run_buildings(
    center: LonLat,
    radius: f64,
    maks_url: String,
    min_floors: Option<i64>,
    status: Option<String>,
) -> Result<(), CliError> {
    let provider = MaksBuildings::new(http_client()?, maks_url);

    let raw = provider.buildings_around(center, radius).await?;
    let corrected = apply_offset(raw);
    println!("{} buildings fetched", corrected.features.len());

    let filter = BuildingFilter {
        zeminustu: min_floors,
        durum: status,
        ..Default::default()
    };
    let shown = if filter.is_show_all() {
        corrected
    } else {
        let filtered = filter.apply(&corrected);
        println!("{} buildings after filtering", filtered.features.len());
        filtered
    };

    let mut histogram: std::collections::BTreeMap<i64, usize> = std::collections::BTreeMap::new();
    for feature in &shown.features {
        let floors = feature
            .properties
            .as_ref()
            .and_then(|p| p.get("ZEMINUSTUKATSAYISI"))
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        *histogram.entry(floors).or_insert(0) += 1;
    }
    println!("Floors above ground:");
    for (floors, count) in histogram {
        println!("  {:>2} floors: {}", floors, count);
    }
    Ok(())
}

async fn run_locate(prompt: &str, backend_url: &str) -> Result<(), CliError> {
    let backend = LocationBackend::new(http_client()?, backend_url);

    match backend.locate(prompt).await? {
        LocationResponse::Error { error } => {
            println!("Backend could not resolve the prompt: {error}");
        }
        LocationResponse::Single(result) => print_location(&result),
        LocationResponse::Many { results } => {
            println!("{} candidates:", results.len());
            for result in &results {
                print_location(result);
            }
        }
    }
    Ok(())
}

fn print_location(result: &circlescope::provider::LocationResult) {
    println!(
        "  {} ({:.6}, {:.6}){}",
        result.place.as_deref().unwrap_or("(unnamed)"),
        result.longitude,
        result.latitude,
        result
            .address
            .as_deref()
            .map(|a| format!(" - {a}"))
            .unwrap_or_default()
    );
    if let Some(description) = &result.description {
        println!("    {description}");
    }
}
