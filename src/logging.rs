use chrono::Local;
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,tower_http=info,axum=info";
const LOG_FILE_PREFIX: &str = "nse-dashboard.log";

/// Local wall-clock timestamps with millisecond precision
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Directory of the daily rolling log file
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    /// Read `LOG_TO_FILE` (`1` or `true`) and `LOG_DIR` (default `./logs`)
    fn from_vars(log_to_file: Option<&str>, log_dir: Option<&str>) -> Option<Self> {
        let enabled = matches!(log_to_file.map(str::trim), Some("1" | "true"));
        enabled.then(|| FileSink {
            dir: PathBuf::from(log_dir.unwrap_or("./logs")),
        })
    }

    fn from_env() -> Option<Self> {
        let log_to_file = std::env::var("LOG_TO_FILE").ok();
        let log_dir = std::env::var("LOG_DIR").ok();
        Self::from_vars(log_to_file.as_deref(), log_dir.as_deref())
    }
}

/// Install the global subscriber.
///
/// Console output goes to stderr so the offline commands can print JSON on
/// stdout.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = fmt::layer()
        .with_timer(LocalTime)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true);

    let file_layer = FileSink::from_env().map(|sink| {
        fmt::layer()
            .with_timer(LocalTime)
            .with_writer(RollingFileAppender::new(
                Rotation::DAILY,
                sink.dir,
                LOG_FILE_PREFIX,
            ))
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();
}
