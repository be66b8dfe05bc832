use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use probe_gallery::layout::{MasonryEngine, MasonryPlan};
use probe_gallery::probe::AnySource;
use probe_gallery::{CandidateAsset, GalleryConfig, GallerySession, GalleryView, LoadState, Manifest};

#[derive(Parser)]
#[command(name = "probe-gallery")]
#[command(about = "Discover which media files exist and lay them out as a gallery")]
struct Cli {
    /// Candidate URLs or paths, in display order
    urls: Vec<String>,

    /// Base URL or directory for numbered candidates ({base}/{i}.{ext})
    #[arg(long, requires = "count")]
    base: Option<String>,

    /// Number of numbered candidates to try
    #[arg(long)]
    count: Option<usize>,

    /// Extensions tried for each numbered candidate
    #[arg(long, value_delimiter = ',', default_value = "jpg")]
    ext: Vec<String>,

    /// Existence manifest (JSON file, URL, or directory); skips probing
    #[arg(long)]
    manifest: Option<String>,

    /// Viewport width used for the masonry arrangement
    #[arg(long, default_value_t = 1280.0)]
    width: f32,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    state: LoadState,
    gallery: &'a GalleryView,
    masonry: &'a MasonryPlan,
}

async fn load_manifest(location: &str, config: &GalleryConfig) -> Result<Manifest> {
    if location.starts_with("http://") || location.starts_with("https://") {
        let client = reqwest::Client::builder()
            .timeout(config.probe_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        return Manifest::fetch(&client, location).await;
    }
    let path = PathBuf::from(location);
    if path.is_dir() {
        Manifest::from_directory(&path)
    } else {
        Manifest::load(&path)
    }
}

fn candidates(cli: &Cli) -> Vec<CandidateAsset> {
    match (&cli.base, cli.count) {
        (Some(base), Some(count)) => {
            let exts: Vec<&str> = cli.ext.iter().map(String::as_str).collect();
            CandidateAsset::numbered(base, count, &exts)
        }
        _ => CandidateAsset::from_urls(&cli.urls),
    }
}

fn print_text(view: &GalleryView, state: LoadState, plan: &MasonryPlan) {
    if let Some(message) = state.message() {
        println!("{message}");
        return;
    }
    println!("Photos ({}):", view.photos.len());
    for photo in &view.photos {
        match photo.dimensions {
            Some((w, h)) => println!("  {:>4}  {}  {}x{}", photo.position_hint, photo.url, w, h),
            None => println!("  {:>4}  {}", photo.position_hint, photo.url),
        }
    }
    println!("Videos ({}):", view.videos.len());
    for video in &view.videos {
        println!("  {:>4}  {}", video.position_hint, video.url);
    }
    println!(
        "Masonry: {} columns, {:.0}px wide, {:.0}px tall",
        plan.column_count,
        plan.column_width,
        plan.total_height()
    );
    for column in 0..plan.column_count {
        let urls: Vec<&str> = plan
            .tiles
            .iter()
            .filter(|t| t.column == column)
            .map(|t| t.url.as_str())
            .collect();
        println!("  [{column}] {}", urls.join("  "));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("probe_gallery=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = GalleryConfig::from_env();
    let candidates = candidates(&cli);
    info!(candidates = candidates.len(), "resolving gallery");

    let source = Arc::new(AnySource::new(config.probe_timeout)?);
    let mut session = GallerySession::new(candidates, source, &config)?;
    if let Some(location) = &cli.manifest {
        session = session.with_manifest(load_manifest(location, &config).await?);
    }
    session.activate_all();
    session.settle().await;

    let mut engine = MasonryEngine::default();
    let plan = engine.arrange(&session.visible_photos(), cli.width);
    let state = session.load_state();

    if cli.json {
        let report = Report {
            state,
            gallery: session.view(),
            masonry: &plan,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(session.view(), state, &plan);
    }

    session.unmount();
    Ok(())
}
