// 📜 Logging setup
//
// Filter comes from RUST_LOG when set. The interactive UI must not write to
// the terminal it draws on, so it logs to a file.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const STDERR_FILTER: &str = "student_roster=warn";
const FILE_FILTER: &str = "student_roster=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    fn default_filter(&self) -> &'static str {
        match self {
            LogTarget::Stderr => STDERR_FILTER,
            LogTarget::File(_) => FILE_FILTER,
        }
    }
}

fn env_filter(target: &LogTarget) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(target.default_filter()))
}

/// Split a log path into the directory and file name the appender wants
fn split_log_path(path: &Path) -> Result<(PathBuf, String)> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Invalid log file path: {}", path.display()))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, name.to_string()))
}

/// Install the global subscriber
///
/// Keep the returned guard alive until exit, otherwise buffered file logs
/// are lost.
pub fn init(target: &LogTarget) -> Result<Option<WorkerGuard>> {
    let filter = env_filter(target);

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer().compact().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to initialize logging")?;
            Ok(None)
        }
        LogTarget::File(path) => {
            let (dir, name) = split_log_path(path)?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(name)
                .build(&dir)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(layer().with_writer(writer).with_ansi(false))
                .try_init()
                .context("Failed to initialize logging")?;
            Ok(Some(guard))
        }
    }
}
