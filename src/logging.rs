use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the stdout subscriber and, when `ENABLE_FILE_LOGS` is set,
/// a daily-rolling file layer. The returned guard must stay alive for
/// the process lifetime or buffered file logs are lost.
pub fn init_tracing(log_level: &str) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true);
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    match file_appender() {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

fn file_appender() -> Option<RollingFileAppender> {
    let enabled = std::env::var("ENABLE_FILE_LOGS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);
    if !enabled {
        return None;
    }

    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
    if let Err(err) = std::fs::create_dir_all(&log_dir) {
        eprintln!("failed to create log directory {log_dir}: {err}");
        return None;
    }

    Some(RollingFileAppender::new(Rotation::DAILY, log_dir, "recall.log"))
}
