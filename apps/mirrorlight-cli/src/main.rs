use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mirrorlight_render::{RecordingBackend, RenderTarget};
use mirrorlight_stage::{LightingScene, StageSettings, ViewportSize};
use mirrorlight_tools::{NodeInfo, SceneInspector, SceneSummary};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mirrorlight-cli", about = "Headless mirrorlight tools")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Stage settings file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and scene info
    Info,
    /// Run frames against the recording backend
    Simulate {
        /// Number of frames to advance
        #[arg(short, long, default_value = "60")]
        frames: u64,
        /// Output width in pixels (defaults to the settings viewport)
        #[arg(long)]
        width: Option<u32>,
        /// Output height in pixels (defaults to the settings viewport)
        #[arg(long)]
        height: Option<u32>,
    },
    /// Print the scene graph
    Inspect {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct InspectReport {
    summary: SceneSummary,
    nodes: Vec<NodeInfo>,
}

fn load_settings(path: Option<&PathBuf>) -> anyhow::Result<StageSettings> {
    match path {
        Some(path) => StageSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(StageSettings::default()),
    }
}

fn simulate(settings: &StageSettings, frames: u64, viewport: ViewportSize) -> anyhow::Result<()> {
    let mut scene = LightingScene::new(settings);
    let mut backend = RecordingBackend::new();
    scene.resize(&mut backend, viewport)?;
    scene.start();

    let mut mirror_passes = 0usize;
    let mut screen_passes = 0usize;
    for _ in 0..frames {
        scene.advance_frame(&mut backend)?;
        for pass in backend.take_passes() {
            tracing::debug!(frame = scene.frame(), "{pass}");
            match pass.target {
                RenderTarget::Screen => screen_passes += 1,
                RenderTarget::Offscreen(_) => mirror_passes += 1,
            }
        }
    }

    let p = scene.camera().position;
    println!(
        "Simulated {frames} frames at {}x{}",
        viewport.width, viewport.height
    );
    println!("Passes: mirror={mirror_passes} screen={screen_passes}");
    println!("Camera: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z);
    for id in scene.animator().nodes() {
        if let Some(node) = scene.graph().get(id) {
            let (name, r) = (&node.name, node.transform.rotation);
            println!("  {name:<6} rot=({:.2}, {:.2}, {:.2})", r.x, r.y, r.z);
        }
    }
    Ok(())
}

fn inspect(settings: &StageSettings, json: bool) -> anyhow::Result<()> {
    let scene = LightingScene::new(settings);
    let graph = scene.graph();
    let listed = SceneInspector::list_nodes(graph);

    if json {
        let report = InspectReport {
            summary: SceneInspector::summary(graph),
            nodes: listed
                .iter()
                .filter_map(|(_, id)| SceneInspector::inspect_node(graph, *id))
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", SceneInspector::summary(graph));
    for (depth, id) in listed {
        if let Some(info) = SceneInspector::inspect_node(graph, id) {
            println!("{:indent$}{info}", "", indent = depth * 2);
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let settings = load_settings(cli.config.as_ref())?;

    match cli.command {
        Commands::Info => {
            println!("mirrorlight-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "viewport: {}x{}  mirror: {}px  shadow map: {}px  text: {:?}",
                settings.viewport_width,
                settings.viewport_height,
                settings.mirror_size,
                settings.shadow_map_size,
                settings.text
            );
            let scene = LightingScene::new(&settings);
            println!("{}", SceneInspector::summary(scene.graph()));
        }
        Commands::Simulate {
            frames,
            width,
            height,
        } => {
            let viewport = ViewportSize::new(
                width.unwrap_or(settings.viewport_width),
                height.unwrap_or(settings.viewport_height),
            );
            simulate(&settings, frames, viewport)?;
        }
        Commands::Inspect { json } => inspect(&settings, json)?,
    }

    Ok(())
}
