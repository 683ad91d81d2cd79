use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "horizon_pipeline=debug,wgpu_core=warn"). When absent, `RUST_LOG` is used,
/// then `default_level`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub default_level: log::LevelFilter,

    /// Keep wgpu/naga internals at `warn` unless the filter names them.
    pub quiet_gpu_internals: bool,

    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: log::LevelFilter::Info,
            quiet_gpu_internals: true,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

const GPU_INTERNALS: [&str; 4] = ["wgpu_core", "wgpu_hal", "naga", "wgpu"];

static INIT: Once = Once::new();

/// Initializes the global logger once. Subsequent calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(config.default_level);

        if config.quiet_gpu_internals {
            for module in GPU_INTERNALS {
                builder.filter_module(module, log::LevelFilter::Warn);
            }
        }

        // Explicit filters are parsed last so they override the defaults above.
        if let Some(filter) = config.env_filter.or_else(|| std::env::var("RUST_LOG").ok()) {
            builder.parse_filters(&filter);
        }

        builder.write_style(config.write_style);
        builder.format_timestamp_millis();

        if builder.try_init().is_err() {
            // Another logger (e.g. a test harness) is already installed.
            return;
        }
        log::debug!("logging initialized");
    });
}
