use std::path::PathBuf;

use clap::Parser;

use horizon_pipeline::PipelineConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "horizon")]
#[command(about = "Real-time black hole visualization", long_about = None)]
pub struct Cli {
    /// Load shaders from this directory instead of the embedded set
    #[arg(long = "shader-dir")]
    pub shader_dir: Option<PathBuf>,

    /// Initial window width in logical pixels
    #[arg(long, default_value_t = 1280.0)]
    pub width: f64,

    /// Initial window height in logical pixels
    #[arg(long, default_value_t = 720.0)]
    pub height: f64,

    /// Number of background stars
    #[arg(long)]
    pub stars: Option<usize>,

    /// Seed of the star field
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log filter, `env_logger` syntax (overrides RUST_LOG)
    #[arg(long = "log")]
    pub log: Option<String>,

    #[arg(long = "grid-size")]
    pub grid_size: Option<f32>,

    #[arg(long)]
    pub intensity: Option<f32>,

    #[arg(long)]
    pub contrast: Option<f32>,
}

impl Cli {
    /// Pipeline configuration with the command-line overrides applied.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        if let Some(n) = self.stars {
            config.star_count = n;
        }
        if let Some(seed) = self.seed {
            config.star_seed = seed;
        }
        let p = &mut config.parameters;
        if let Some(v) = self.grid_size {
            p.grid_size = v;
        }
        if let Some(v) = self.intensity {
            p.intensity = v;
        }
        if let Some(v) = self.contrast {
            p.contrast = v;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_reach_the_config() {
        let cli = Cli::parse_from(["horizon", "--stars", "12", "--grid-size", "4.5"]);
        let config = cli.pipeline_config();
        assert_eq!(config.star_count, 12);
        assert_eq!(config.parameters.grid_size, 4.5);
        assert_eq!(config.parameters.intensity, 0.7);
        assert!(cli.shader_dir.is_none());
    }

    #[test]
    fn defaults_match_the_pipeline() {
        let cli = Cli::parse_from(["horizon"]);
        assert_eq!(cli.width, 1280.0);
        assert_eq!(cli.pipeline_config().star_count, 10_000);
    }
}
