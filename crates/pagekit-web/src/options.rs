#![forbid(unsafe_code)]

//! Options accepted by `new PageKit(options)`.

use pagekit_core::{PageConfig, PageError};
use serde::Deserialize;
use tracing_subscriber::filter::LevelFilter;

/// [`PageConfig`] plus frontend-only settings.
///
/// The page configuration is flattened, so a JS caller writes
/// `{ timing: { copy_feedback_ms: 1500 }, log_level: "debug" }`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebOptions {
    #[serde(flatten)]
    pub page: PageConfig,
    /// Console verbosity: `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: Option<String>,
}

impl WebOptions {
    pub fn from_json_str(json: &str) -> Result<Self, PageError> {
        let options: Self =
            serde_json::from_str(json).map_err(|err| PageError::Config(err.to_string()))?;
        options.page.validate()?;
        options.log_level()?;
        Ok(options)
    }

    /// Parsed console level; `info` when unset.
    pub fn log_level(&self) -> Result<LevelFilter, PageError> {
        match self.log_level.as_deref() {
            None => Ok(LevelFilter::INFO),
            Some(level) => level
                .parse()
                .map_err(|_| PageError::Config(format!("unknown log_level {level:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_is_all_defaults() {
        let options = WebOptions::from_json_str("{}").unwrap();
        assert_eq!(options.page, PageConfig::default());
        assert_eq!(options.log_level().unwrap(), LevelFilter::INFO);
    }

    #[test]
    fn page_fields_are_flattened() {
        let options = WebOptions::from_json_str(
            r#"{"auth": {"login_url": "/signin"}, "log_level": "debug"}"#,
        )
        .unwrap();
        assert_eq!(options.page.auth.login_url, "/signin");
        assert_eq!(options.page.auth.token_key, "token");
        assert_eq!(options.log_level().unwrap(), LevelFilter::DEBUG);
    }

    #[test]
    fn bad_level_is_rejected() {
        let err = WebOptions::from_json_str(r#"{"log_level": "loud"}"#).unwrap_err();
        assert!(matches!(err, PageError::Config(msg) if msg.contains("loud")));
    }

    #[test]
    fn invalid_page_config_is_rejected() {
        let err = WebOptions::from_json_str(r#"{"auth": {"login_url": " "}}"#).unwrap_err();
        assert!(matches!(err, PageError::Config(_)));
    }
}
