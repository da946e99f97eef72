//! Logging initialisation via tracing-subscriber.
//!
//! The `[host] log_level` setting is the default directive; `RUST_LOG`, when
//! set, adds per-target directives on top (e.g. `hostkit::guard=trace` to
//! watch guarded calls enter and leave).

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;
use crate::settings::Settings;

/// Install the global subscriber, writing to stderr.
pub fn init(settings: &Settings) -> Result<(), AppError> {
    let level = parse_level(&settings.log_level)?;
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}

/// Parse a plain level name (`"off"`, `"error"` .. `"trace"`).
///
/// Settings loading calls this so a bad `log_level` is reported as a config
/// error at startup instead of surfacing later from [`init`].
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    match level.trim() {
        "" => Err(AppError::Logger("log level must not be empty".into())),
        name => name
            .parse::<LevelFilter>()
            .map_err(|_| AppError::Logger(format!("unrecognised log level: '{name}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_map_to_filters() {
        assert_eq!(parse_level("warn").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_level(" debug ").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::OFF);
    }

    #[test]
    fn directives_are_not_levels() {
        assert!(parse_level("hostkit=debug").is_err());
        assert!(parse_level("verbose").is_err());
        assert!(matches!(parse_level(""), Err(AppError::Logger(_))));
    }

    #[test]
    fn init_from_default_settings() {
        // Another test binary thread may have installed the subscriber first.
        match init(&Settings::default()) {
            Ok(()) => {}
            Err(AppError::Logger(msg)) if msg.contains("set subscriber") => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn init_rejects_bad_level() {
        let settings = Settings { log_level: "loud".into(), ..Settings::default() };
        assert!(matches!(init(&settings), Err(AppError::Logger(ref m)) if m.contains("loud")));
    }
}
