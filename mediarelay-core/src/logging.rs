use std::path::Path;

use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::LoggingConfig;

/// Install the global subscriber.
///
/// `RUST_LOG`, when set, replaces the configured level. With `file_path` the
/// output goes to a daily-rolled file (`relay.log` becomes
/// `relay.log.2024-01-31`) instead of stdout.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(normalize_level(&config.level)?)?,
    };

    let (writer, ansi) = match config.file_path.as_deref() {
        Some(path) => (BoxMakeWriter::new(rolling_appender(path)?), false),
        None => (BoxMakeWriter::new(std::io::stdout), true),
    };

    let base = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .with_line_number(true);
    let output = if config.format == "json" {
        base.json().with_current_span(true).with_file(true).boxed()
    } else {
        base.pretty().with_file(false).boxed()
    };

    tracing_subscriber::registry().with(filter).with(output).try_init()?;
    Ok(())
}

fn rolling_appender(file_path: &str) -> anyhow::Result<tracing_appender::rolling::RollingFileAppender> {
    let path = Path::new(file_path);
    let Some(file_name) = path.file_name() else {
        anyhow::bail!("Log file path has no file name: {file_path}");
    };
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(directory)?;
    Ok(tracing_appender::rolling::daily(directory, file_name))
}

/// Canonical filter directive for a configured level name
fn normalize_level(level: &str) -> anyhow::Result<&'static str> {
    Ok(match level.to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        "off" => "off",
        _ => anyhow::bail!("Invalid log level: {level}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level("INFO").unwrap(), "info");
        assert_eq!(normalize_level("warning").unwrap(), "warn");
        assert_eq!(normalize_level("off").unwrap(), "off");
        assert!(normalize_level("verbose").is_err());
    }

    #[test]
    fn test_rolling_appender_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("logs").join("relay.log");
        rolling_appender(file_path.to_str().unwrap()).unwrap();
        assert!(dir.path().join("logs").is_dir());
    }

    #[test]
    fn test_rolling_appender_rejects_directory_path() {
        assert!(rolling_appender("/").is_err());
    }
}
