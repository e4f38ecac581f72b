#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser)]
#[command(name = "glb-viewer", about = "Shows a glTF/GLB model with orbit controls and HDRI lighting")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory the asset paths are relative to
    #[arg(long, default_value = "assets")]
    asset_root: String,

    /// Model to show, relative to the asset root
    #[arg(long)]
    model: Option<String>,

    /// Equirectangular HDR environment map, relative to the asset root
    #[arg(long)]
    environment: Option<String>,

    /// Use the mobile render profile
    #[arg(long, conflicts_with = "desktop")]
    mobile: bool,

    /// Use the desktop render profile
    #[arg(long)]
    desktop: bool,

    /// Tone-mapping exposure
    #[arg(long)]
    exposure: Option<f32>,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use glb_viewer::{config::ViewerConfig, platform::Platform, viewer};

    let cli = Cli::parse();
    viewer::init_logging(if cli.verbose { "debug" } else { "info" });

    let mut config = ViewerConfig {
        asset_root: cli.asset_root,
        ..Default::default()
    };
    if let Some(model) = cli.model {
        config.model_path = model;
    }
    if let Some(environment) = cli.environment {
        config.environment_path = environment;
    }
    if let Some(exposure) = cli.exposure {
        config.exposure = exposure;
    }
    if cli.mobile {
        config.platform = Some(Platform::Mobile);
    } else if cli.desktop {
        config.platform = Some(Platform::Desktop);
    }

    viewer::run(config)
}

// The web build starts through `viewer::run_web`.
#[cfg(target_arch = "wasm32")]
fn main() {}
