//! Process-wide `tracing` setup for the `vecnav` binary.
//!
//! Diagnostics always go to stderr; stdout carries query results only.
//! [`LogSettings`] is resolved from `VECNAV_LOG_FORMAT` and `RUST_LOG`, then
//! [`init_logging`] installs a registry with an env filter and one fmt layer.
//! Records emitted through the `log` crate are forwarded as well.

use std::{env, str::FromStr, sync::OnceLock};

use thiserror::Error;
use tracing::{Subscriber, warn};
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, Layer, fmt::format::FmtSpan, layer::SubscriberExt, registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Variable selecting [`LogFormat`].
pub const LOG_FORMAT_VAR: &str = "VECNAV_LOG_FORMAT";

/// Variable holding `EnvFilter` directives.
pub const LOG_FILTER_VAR: &str = "RUST_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

static INSTALLED: OnceLock<()> = OnceLock::new();

/// How each record is rendered.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    /// Compact text for terminals.
    #[default]
    Human,
    /// Newline-delimited JSON carrying the span stack.
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim();
        if value.eq_ignore_ascii_case("human") {
            Ok(Self::Human)
        } else if value.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(LoggingError::UnsupportedFormat {
                provided: value.to_owned(),
            })
        }
    }
}

/// Failures while resolving or installing logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// A logging variable held bytes that are not UTF-8.
    #[error("`{name}` is not valid UTF-8")]
    InvalidUnicode {
        /// Variable that was read.
        name: &'static str,
        /// Error from the environment lookup.
        #[source]
        source: env::VarError,
    },
    /// `VECNAV_LOG_FORMAT` named neither `human` nor `json`.
    #[error("log format `{provided}` is not one of `human`, `json`")]
    UnsupportedFormat {
        /// Trimmed value that was rejected.
        provided: String,
    },
}

/// Logging configuration taken from the environment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogSettings {
    /// Record rendering.
    pub format: LogFormat,
    /// `EnvFilter` directives, `info` when unset or blank.
    pub directives: String,
}

impl LogSettings {
    /// Reads the settings from the process environment.
    ///
    /// # Errors
    /// See [`LogSettings::from_lookup`].
    pub fn from_env() -> Result<Self, LoggingError> {
        Self::from_lookup(|name| env::var(name))
    }

    /// Resolves settings through `lookup`, which behaves like [`env::var`].
    ///
    /// # Errors
    /// Returns [`LoggingError::InvalidUnicode`] when either variable is not
    /// UTF-8 and [`LoggingError::UnsupportedFormat`] for an unknown format.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LoggingError>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let read = |name: &'static str| match lookup(name) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(source) => Err(LoggingError::InvalidUnicode { name, source }),
        };

        let format = read(LOG_FORMAT_VAR)?
            .map(|raw| raw.parse::<LogFormat>())
            .transpose()?
            .unwrap_or_default();
        let directives = read(LOG_FILTER_VAR)?
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DIRECTIVES.to_owned());
        Ok(Self { format, directives })
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
    }
}

/// Installs the global subscriber once per process.
///
/// Repeated calls return `Ok(())` without touching the subscriber. When a
/// different subscriber already owns the process, it is left in place and
/// told about the conflict.
///
/// # Errors
/// Returns [`LoggingError`] when the settings cannot be resolved.
pub fn init_logging() -> Result<(), LoggingError> {
    if INSTALLED.get().is_some() {
        return Ok(());
    }
    let settings = LogSettings::from_env()?;

    // The `log` slot may already be taken; `tracing` output is unaffected.
    let _ = LogTracer::init();
    let installed = tracing_subscriber::registry()
        .with(settings.filter())
        .with(output_layer(settings.format))
        .try_init();
    if let Err(err) = installed {
        warn!(error = %err, "keeping the subscriber that was already installed");
    }
    let _ = INSTALLED.set(());
    Ok(())
}

fn output_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    match format {
        LogFormat::Human => layer.boxed(),
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::ffi::OsString;

    use rstest::rstest;

    fn vars(
        format: Option<&'static str>,
        filter: Option<&'static str>,
    ) -> impl Fn(&str) -> Result<String, env::VarError> {
        move |name| {
            let value = match name {
                LOG_FORMAT_VAR => format,
                LOG_FILTER_VAR => filter,
                _ => None,
            };
            value.map(str::to_owned).ok_or(env::VarError::NotPresent)
        }
    }

    #[rstest]
    #[case("human", LogFormat::Human)]
    #[case("Human", LogFormat::Human)]
    #[case("JSON", LogFormat::Json)]
    #[case(" json\n", LogFormat::Json)]
    fn formats_parse_ignoring_case_and_padding(#[case] raw: &str, #[case] expected: LogFormat) {
        assert_eq!(raw.parse::<LogFormat>().expect("known format"), expected);
    }

    #[rstest]
    fn unknown_format_is_reported_trimmed() {
        let err = " xml ".parse::<LogFormat>().expect_err("xml is unsupported");
        assert!(matches!(
            err,
            LoggingError::UnsupportedFormat { ref provided } if provided == "xml"
        ));
    }

    #[rstest]
    #[case(None, None, LogFormat::Human, "info")]
    #[case(Some("json"), None, LogFormat::Json, "info")]
    #[case(None, Some("  "), LogFormat::Human, "info")]
    #[case(Some("human"), Some("vecnav_core=trace"), LogFormat::Human, "vecnav_core=trace")]
    fn settings_resolve_from_variables(
        #[case] format_var: Option<&'static str>,
        #[case] filter_var: Option<&'static str>,
        #[case] format: LogFormat,
        #[case] directives: &str,
    ) {
        let settings =
            LogSettings::from_lookup(vars(format_var, filter_var)).expect("settings resolve");
        assert_eq!(settings.format, format);
        assert_eq!(settings.directives, directives);
    }

    #[rstest]
    fn non_unicode_variable_names_the_variable() {
        let err = LogSettings::from_lookup(|name| {
            if name == LOG_FILTER_VAR {
                Err(env::VarError::NotUnicode(OsString::from("bad")))
            } else {
                Err(env::VarError::NotPresent)
            }
        })
        .expect_err("non-UTF-8 filter must fail");
        assert!(matches!(
            err,
            LoggingError::InvalidUnicode { name: LOG_FILTER_VAR, .. }
        ));
    }

    #[rstest]
    fn invalid_format_variable_fails_resolution() {
        let err = LogSettings::from_lookup(vars(Some("yaml"), None)).expect_err("yaml rejected");
        assert!(matches!(err, LoggingError::UnsupportedFormat { .. }));
    }

    #[rstest]
    fn init_logging_is_idempotent() {
        init_logging().expect("logging must initialise");
        init_logging().expect("subsequent calls must be no-ops");
    }
}
