//! Logging Config

use clap::{Args, ValueEnum};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable, with target, file and line
    Compact,

    /// One JSON object per event, with the current span and span list
    Json,
}

/// Log output settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Default filter directive, used when `RUST_LOG` holds no valid filter
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl LoggingConfig {
    /// The configured level, with transport and driver crates held at `warn`.
    #[must_use]
    pub fn filter_directives(&self) -> String {
        format!(
            "{},sqlx=warn,reqwest=warn,hyper=warn,hyper_util=warn,h2=warn,tonic=warn,opentelemetry=warn",
            self.log_level
        )
    }
}
