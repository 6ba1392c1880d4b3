//! Logging setup
//!
//! Console output (human in development, JSON in production) plus an
//! optional daily rotating file under `LOG_DIR/app`. Rotated files older
//! than 14 days are removed by [`cleanup_old_logs`].

use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

use crate::Config;

const LOG_PREFIX: &str = "printbay";
const RETENTION_DAYS: i64 = 14;

/// Delete `printbay.YYYY-MM-DD` files older than the retention window
pub fn cleanup_old_logs(log_dir: &Path) -> anyhow::Result<usize> {
    let cutoff = (chrono::Utc::now() - chrono::Duration::days(RETENTION_DAYS)).date_naive();
    let app_log_dir = log_dir.join("app");
    if !app_log_dir.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(&app_log_dir)? {
        let path = entry?.path();
        let expired = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(LOG_PREFIX)?.strip_prefix('.'))
            .and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .is_some_and(|date| date < cutoff);
        if expired {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }

    Ok(removed)
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn console_layer(json: bool) -> BoxedLayer {
    if json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer().with_target(false).compact().boxed()
    }
}

fn file_layer(log_dir: &Path) -> anyhow::Result<BoxedLayer> {
    let app_log_dir = log_dir.join("app");
    fs::create_dir_all(&app_log_dir)?;
    let appender = RollingFileAppender::new(Rotation::DAILY, app_log_dir, LOG_PREFIX);
    Ok(fmt::layer()
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(appender))
        .boxed())
}

/// Install the global subscriber from server config
///
/// `RUST_LOG` overrides the configured level. With a log directory set, a
/// daily task prunes expired files.
pub fn init(config: &Config) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let log_dir = config.log_dir.as_deref().map(PathBuf::from);

    let mut layers = vec![console_layer(config.is_production())];
    if let Some(dir) = &log_dir {
        layers.push(file_layer(dir)?);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;

    if let Some(dir) = log_dir {
        tokio::spawn(async move {
            let mut daily = tokio::time::interval(std::time::Duration::from_secs(24 * 3600));
            loop {
                daily.tick().await;
                match cleanup_old_logs(&dir) {
                    Ok(0) => {}
                    Ok(removed) => tracing::debug!(removed, "Pruned log files"),
                    Err(e) => tracing::warn!(error = %e, "Log cleanup failed"),
                }
            }
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_removes_only_expired_files() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        fs::create_dir_all(&app).unwrap();

        let old = (chrono::Utc::now() - chrono::Duration::days(30)).date_naive();
        let today = chrono::Utc::now().date_naive();
        fs::write(app.join(format!("printbay.{old}")), "old").unwrap();
        fs::write(app.join(format!("printbay.{today}")), "new").unwrap();
        fs::write(app.join("unrelated.txt"), "keep").unwrap();

        assert_eq!(cleanup_old_logs(dir.path()).unwrap(), 1);
        assert!(app.join(format!("printbay.{today}")).exists());
        assert!(app.join("unrelated.txt").exists());
    }

    #[test]
    fn test_cleanup_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(cleanup_old_logs(dir.path()).unwrap(), 0);
    }
}
