mod app;
mod cli;
mod controls;

use clap::Parser;
use winit::dpi::LogicalSize;

use horizon_engine::device::GpuInit;
use horizon_engine::logging::{init_logging, LoggingConfig};
use horizon_engine::window::{Runtime, RuntimeConfig};

use crate::app::HorizonApp;
use crate::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..Default::default()
    });

    let config = cli.pipeline_config();
    log::info!(
        "starting with {} stars, grid {:.1}",
        config.star_count,
        config.parameters.grid_size
    );

    Runtime::run(
        RuntimeConfig {
            title: "horizon".to_string(),
            initial_size: LogicalSize::new(cli.width, cli.height),
        },
        GpuInit {
            prefer_srgb: false,
            ..Default::default()
        },
        HorizonApp::new(config, cli.shader_dir),
    )
}
