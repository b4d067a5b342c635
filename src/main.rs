use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use winit::event_loop::{ControlFlow, EventLoop};

use immersive_pages::telemetry::{init_logging, LogConfig};
use immersive_pages::{PageKind, PagesApp, PagesSettings};

/// Interactive 3D media pages
#[derive(Parser, Debug)]
#[command(name = "immersive-pages", version, about)]
struct Cli {
    /// Page to open instead of the configured start page
    #[arg(long, value_enum)]
    page: Option<PageKind>,

    /// Settings file (defaults to pages.xml in the config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory asset paths are resolved against
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// JSON log output
    #[arg(long)]
    json_logs: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig {
        file_path: cli.log_file.clone(),
        json_format: cli.json_logs,
        ..LogConfig::default()
    };
    // Keep the guard alive for the program duration
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    tracing::info!("Immersive Pages v{}", env!("CARGO_PKG_VERSION"));

    let mut settings = match PagesSettings::resolve(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Failed to load settings: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(assets) = &cli.assets {
        settings.asset_root = Some(assets.to_string_lossy().into_owned());
    }
    let start_page = cli.page.unwrap_or(settings.start_page);

    tracing::info!("Start page: {}", start_page.display_name());
    tracing::info!("Asset root: {}", settings.asset_root().display());
    if settings.vsync_enabled {
        tracing::info!("VSYNC enabled");
    } else {
        tracing::info!("Target FPS: {}", settings.target_fps);
    }

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            tracing::error!("Failed to create event loop: {}", e);
            return ExitCode::FAILURE;
        }
    };
    // Default to sleeping; redraws are scheduled in `about_to_wait`
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = PagesApp::new(settings, start_page);
    if let Err(e) = event_loop.run_app(&mut app) {
        tracing::error!("Event loop error: {}", e);
        return ExitCode::FAILURE;
    }

    if app.has_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
