//! scene-import - packs a 3D model into render-ready scene buffers
//!
//! Loads the input through the registered loaders, reports statistics and
//! generates the packed scene.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use scene_import::{Importer, stats};

#[derive(Parser)]
#[command(name = "scene-import")]
#[command(about = "Packs a 3D model into merged, render-ready scene buffers")]
#[command(version)]
struct Cli {
    /// Input model file (glTF/GLB)
    input: PathBuf,

    /// Worker threads for texture and tangent-space passes (default: one per core)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Log every geometry and mesh instance
    #[arg(short, long)]
    detailed: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    if !cli.input.is_file() {
        bail!("Input file not found: {:?}", cli.input);
    }

    let mut importer = Importer::default();
    let loaded = importer
        .load_file(&cli.input)
        .with_context(|| format!("Failed to load {:?}", cli.input))?;
    if !loaded {
        tracing::warn!("Continuing with an empty model");
    }

    tracing::info!("Imported: {}", importer.statistics());
    if cli.detailed {
        stats::log_detailed(importer.model());
    }

    let scene = importer
        .generate_scene()
        .context("Failed to generate scene")?;

    tracing::info!(
        "Scene: {} geometry ranges, {} textures, {} materials, {} meshes",
        scene.geometry_ranges()?.len(),
        scene.textures()?.len(),
        scene.materials()?.len(),
        scene.meshes()?.len()
    );
    tracing::info!("Done!");

    Ok(())
}
