//! 日志初始化
//!
//! stderr 默认 `freezeray=info`（可用 `RUST_LOG` 覆盖）；
//! 指定 `--debug-log` 时额外写入文件，包含每一帧的十六进制收发记录。

use anyhow::{Context, Result, bail};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const DEFAULT_FILTER: &str = "freezeray=info";
const DEBUG_LOG_FILTER: &str = "freezeray=trace";

pub fn init(debug_log: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let stderr_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter);

    let (file_layer, guard) = match debug_log {
        Some(path) => {
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid debug log path: {}", path.display()))?;
            let dir = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            if !dir.is_dir() {
                bail!("Debug log directory does not exist: {}", dir.display());
            }
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(DEBUG_LOG_FILTER));
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(guard)
}
