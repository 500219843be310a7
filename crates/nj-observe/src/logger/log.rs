use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::{Subscriber, level_filters::LevelFilter};
use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError};

pub struct Logger;

impl Logger {
    pub fn text(cfg: &LoggerConfig) -> Result<(), LoggerError> {
        let filter = mk_filter(cfg)?;
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(cfg.use_color)
            .with_target(cfg.with_targets)
            .with_timer(mk_timer());

        let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
        init_with(subscriber)
    }

    pub fn json(cfg: &LoggerConfig) -> Result<(), LoggerError> {
        let filter = mk_filter(cfg)?;
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_target(cfg.with_targets)
            .with_timer(mk_timer());

        let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
        init_with(subscriber)
    }

    pub fn journald(cfg: &LoggerConfig) -> Result<(), LoggerError> {
        let filter = mk_filter(cfg)?;
        mk_journald(filter)
    }
}

fn directives(cfg: &LoggerConfig) -> String {
    let level = cfg.level.trim();
    match (&cfg.scope, level.parse::<LevelFilter>()) {
        (Some(scope), Ok(_)) => format!("warn,{scope}={level}"),
        _ => level.to_string(),
    }
}

fn mk_filter(cfg: &LoggerConfig) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(directives(cfg))
        .map_err(|_| LoggerError::InvalidLogLevel(cfg.level.clone()))
}

fn mk_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn as_error(e: impl std::fmt::Display) -> LoggerError {
    let s = e.to_string();
    if s.contains("SetGlobalDefaultError") || s.contains("global default trace dispatcher") {
        LoggerError::AlreadyInitialized
    } else {
        LoggerError::InitializationFailed(s)
    }
}

fn init_with<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber.try_init().map_err(as_error)
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn mk_journald(filter: EnvFilter) -> Result<(), LoggerError> {
    let journald = tracing_journald::layer()
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))?;
    let subscriber = tracing_subscriber::registry().with(filter).with(journald);
    init_with(subscriber)
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn mk_journald(_filter: EnvFilter) -> Result<(), LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(level: &str) -> LoggerConfig {
        LoggerConfig::default().with_level(level)
    }

    #[test]
    fn bare_level_is_scoped_to_nj_targets() {
        assert_eq!(directives(&cfg("debug")), "warn,nj=debug");
        assert_eq!(directives(&cfg(" info ")), "warn,nj=info");
        assert_eq!(directives(&cfg("info").with_scope(None)), "info");
    }

    #[test]
    fn full_directives_pass_through() {
        assert_eq!(
            directives(&cfg("warn,nj.core.dispatch=debug")),
            "warn,nj.core.dispatch=debug"
        );
        assert!(mk_filter(&cfg("warn,nj.core.dispatch=debug")).is_ok());
        assert!(mk_filter(&cfg("trace")).is_ok());
    }

    #[test]
    fn filter_rejects_garbage() {
        assert_eq!(
            mk_filter(&cfg("info,nj=loudest")).unwrap_err(),
            LoggerError::InvalidLogLevel("info,nj=loudest".into())
        );
    }

    #[test]
    fn second_init_reports_already_initialized() {
        let cfg = LoggerConfig::default().with_level("error");
        // Another test binary thread may have won the race; either way the second call fails.
        let _ = Logger::text(&cfg);
        assert_eq!(Logger::text(&cfg).unwrap_err(), LoggerError::AlreadyInitialized);
    }
}
