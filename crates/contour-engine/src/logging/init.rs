use std::sync::Once;

/// Logger setup for binaries and tests.
///
/// Filter precedence: `env_filter`, then `RUST_LOG`, then `default_level`.
/// Filters use the `env_logger` syntax, e.g. "contour_engine::texture=trace".
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub default_level: log::LevelFilter,
    /// Caps the wgpu internals at `warn` when `default_level` applies.
    pub quiet_gpu_backends: bool,
    pub write_style: env_logger::WriteStyle,
    /// Write through the test harness so output is captured per test.
    pub is_test: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: log::LevelFilter::Info,
            quiet_gpu_backends: true,
            write_style: env_logger::WriteStyle::Auto,
            is_test: false,
        }
    }
}

impl LoggingConfig {
    /// Debug level with test capture, for `#[test]` functions that want cache traffic.
    pub fn for_tests() -> Self {
        Self { default_level: log::LevelFilter::Debug, is_test: true, ..Self::default() }
    }
}

static INIT: Once = Once::new();

/// Installs the global logger once; later calls are ignored.
///
/// A logger installed by someone else wins silently.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match config.env_filter.or_else(|| std::env::var("RUST_LOG").ok()) {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(config.default_level);
                if config.quiet_gpu_backends {
                    for module in ["wgpu_core", "wgpu_hal", "naga"] {
                        builder.filter_module(module, log::LevelFilter::Warn);
                    }
                }
            }
        }

        builder.write_style(config.write_style).is_test(config.is_test);
        if builder.try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}
