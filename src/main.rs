use clap::Parser;
use log::{error, info, warn};
use pbr_scene::io::config::Config;
use pbr_scene::pipeline::headless::HeadlessContext;
use pbr_scene::scene::Scene;
use pbr_scene::scene::catalog::CATALOG;
use std::process::ExitCode;

/// Loads a scene and drives it through a headless frame loop.
#[derive(Parser, Debug)]
#[command(name = "pbr-scene")]
#[command(about = "Scene graph loader and frame driver")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Scene identifier, overrides the configuration
    #[arg(short, long)]
    scene: Option<String>,

    /// Number of frames to run, overrides the configuration
    #[arg(short, long)]
    frames: Option<u32>,

    /// List the available scenes and exit
    #[arg(long)]
    list: bool,
}

impl Cli {
    fn settings(&self) -> Result<Config, String> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading configuration: {}", path);
                Config::load(path)?
            }
            None => Config::default(),
        };
        if let Some(id) = &self.scene {
            config.scene.id = id.clone();
        }
        if let Some(frames) = self.frames {
            config.run.frames = frames;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if cli.list {
        for descriptor in CATALOG {
            println!("{:<22} {}", descriptor.id, descriptor.description);
        }
        return ExitCode::SUCCESS;
    }

    let config = match cli.settings() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut ctx = HeadlessContext::new(config.run.width, config.run.height)
        .with_multisampling(config.run.msaa_samples);
    let mut scene = Scene::new(config.scene.id.clone())
        .with_asset_root(config.scene.asset_root.clone())
        .with_limits(config.limits.to_scene_limits());

    let status = run(&mut scene, &mut ctx, &config);
    scene.destroy(&mut ctx);

    if ctx.live_resources() > 0 {
        warn!("{} device resources leaked:", ctx.live_resources());
        for record in ctx.live_records() {
            warn!("  {:?}", record);
        }
    }

    match status {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Scene '{}' failed: {}", config.scene.id, e);
            ExitCode::FAILURE
        }
    }
}

fn run(
    scene: &mut Scene,
    ctx: &mut HeadlessContext,
    config: &Config,
) -> pbr_scene::core::error::SceneResult<()> {
    scene.init(ctx)?;

    let mut draws = 0usize;
    for _ in 0..config.run.frames {
        ctx.begin_frame();
        scene.animate_frame(ctx)?;
        scene.render_frame(ctx)?;
        ctx.advance(config.run.frame_time);
        draws += ctx.draws.len();
    }

    let stats = scene.stats();
    println!(
        "{}: {} frames, {} draws, {} nodes, {} primitives, {} vertices, {} materials, {} direct / {} point lights",
        scene.id(),
        config.run.frames,
        draws,
        stats.nodes,
        stats.primitives,
        stats.vertices,
        stats.materials,
        stats.direct_lights,
        stats.point_lights
    );
    let ambient = scene.get_ambient_color();
    info!(
        "Ambient color: ({:.3}, {:.3}, {:.3}, {:.3})",
        ambient.x, ambient.y, ambient.z, ambient.w
    );
    Ok(())
}
