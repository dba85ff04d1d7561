#![forbid(unsafe_code)]

//! Marker names, CSS classes, timings, and texts used by the behaviors.
//!
//! Every field has a default, so a host can pass a partial JSON object and
//! override only what its markup does differently:
//!
//! ```rust
//! use pagekit_core::config::PageConfig;
//!
//! let config = PageConfig::from_json_str(r#"{ "auth": { "login_url": "/signin" } }"#).unwrap();
//! assert_eq!(config.auth.login_url, "/signin");
//! assert_eq!(config.auth.token_key, "token");
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PageError;

/// Top-level configuration for [`PageBehaviors`](crate::PageBehaviors).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub markers: Markers,
    pub classes: Classes,
    pub timing: Timing,
    pub text: Texts,
    pub auth: AuthConfig,
}

/// Class names, ids, and attributes the behaviors search the document for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Markers {
    pub flash_class: String,
    pub dropdown_toggle_class: String,
    pub mobile_menu_button_id: String,
    pub mobile_menu_id: String,
    /// Attribute that opts a form into validation, and the value it must carry.
    pub validate_attr: String,
    pub validate_value: String,
    pub required_attr: String,
    pub autoresize_attr: String,
    pub copy_attr: String,
    pub protected_attr: String,
    pub protected_value: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            flash_class: "flash-message".into(),
            dropdown_toggle_class: "dropdown-toggle".into(),
            mobile_menu_button_id: "mobile-menu-button".into(),
            mobile_menu_id: "mobile-menu".into(),
            validate_attr: "data-validate".into(),
            validate_value: "true".into(),
            required_attr: "required".into(),
            autoresize_attr: "data-autoresize".into(),
            copy_attr: "data-copy".into(),
            protected_attr: "data-protected".into(),
            protected_value: "true".into(),
        }
    }
}

/// Visual classes the behaviors apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Classes {
    pub hidden: String,
    pub fading: String,
    pub invalid_field: String,
    /// Identifies an error-message node next to a field.
    pub error_marker: String,
    /// Extra presentational classes put on inserted error-message nodes.
    pub error_style: Vec<String>,
}

impl Default for Classes {
    fn default() -> Self {
        Self {
            hidden: "hidden".into(),
            fading: "opacity-0".into(),
            invalid_field: "border-red-500".into(),
            error_marker: "error-message".into(),
            error_style: vec!["text-red-500".into(), "text-xs".into(), "mt-1".into()],
        }
    }
}

impl Classes {
    /// Marker followed by style classes, in insertion order.
    #[must_use]
    pub fn error_classes(&self) -> Vec<&str> {
        std::iter::once(self.error_marker.as_str())
            .chain(self.error_style.iter().map(String::as_str))
            .collect()
    }
}

/// Timer lengths in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub flash_delay_ms: u64,
    pub flash_fade_ms: u64,
    pub copy_feedback_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            flash_delay_ms: 5_000,
            flash_fade_ms: 300,
            copy_feedback_ms: 2_000,
        }
    }
}

impl Timing {
    #[must_use]
    pub const fn flash_delay(&self) -> Duration {
        Duration::from_millis(self.flash_delay_ms)
    }

    #[must_use]
    pub const fn flash_fade(&self) -> Duration {
        Duration::from_millis(self.flash_fade_ms)
    }

    #[must_use]
    pub const fn copy_feedback(&self) -> Duration {
        Duration::from_millis(self.copy_feedback_ms)
    }
}

/// User-visible strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Texts {
    pub copied: String,
    pub required: String,
    /// Tag name of inserted error-message nodes.
    pub error_tag: String,
}

impl Default for Texts {
    fn default() -> Self {
        Self {
            copied: "Copied!".into(),
            required: "This field is required".into(),
            error_tag: "p".into(),
        }
    }
}

/// Token gate settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token_key: String,
    pub login_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_key: "token".into(),
            login_url: "/login".into(),
        }
    }
}

impl PageConfig {
    /// Parse a (possibly partial) JSON object and validate the result.
    pub fn from_json_str(json: &str) -> Result<Self, PageError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| PageError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make a behavior match nothing or everything.
    pub fn validate(&self) -> Result<(), PageError> {
        let required = [
            ("markers.flash_class", &self.markers.flash_class),
            ("markers.dropdown_toggle_class", &self.markers.dropdown_toggle_class),
            ("markers.mobile_menu_button_id", &self.markers.mobile_menu_button_id),
            ("markers.mobile_menu_id", &self.markers.mobile_menu_id),
            ("markers.validate_attr", &self.markers.validate_attr),
            ("markers.required_attr", &self.markers.required_attr),
            ("markers.autoresize_attr", &self.markers.autoresize_attr),
            ("markers.copy_attr", &self.markers.copy_attr),
            ("markers.protected_attr", &self.markers.protected_attr),
            ("classes.hidden", &self.classes.hidden),
            ("classes.fading", &self.classes.fading),
            ("classes.invalid_field", &self.classes.invalid_field),
            ("classes.error_marker", &self.classes.error_marker),
            ("text.error_tag", &self.text.error_tag),
            ("auth.token_key", &self.auth.token_key),
            ("auth.login_url", &self.auth.login_url),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(PageError::Config(format!("{name} must not be empty")));
            }
        }
        for class in self.classes.error_classes() {
            if class.chars().any(char::is_whitespace) {
                return Err(PageError::Config(format!(
                    "class {class:?} must be a single token"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_markup_contract() {
        let config = PageConfig::default();
        assert_eq!(config.markers.flash_class, "flash-message");
        assert_eq!(config.timing.flash_delay(), Duration::from_millis(5_000));
        assert_eq!(config.timing.flash_fade(), Duration::from_millis(300));
        assert_eq!(config.timing.copy_feedback(), Duration::from_millis(2_000));
        assert_eq!(config.text.copied, "Copied!");
        assert_eq!(config.auth.login_url, "/login");
        assert_eq!(
            config.classes.error_classes(),
            vec!["error-message", "text-red-500", "text-xs", "mt-1"]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config =
            PageConfig::from_json_str(r#"{"timing": {"copy_feedback_ms": 500}}"#).unwrap();
        assert_eq!(config.timing.copy_feedback_ms, 500);
        assert_eq!(config.timing.flash_delay_ms, 5_000);
        assert_eq!(config.markers, Markers::default());
    }

    #[test]
    fn empty_json_is_default() {
        assert_eq!(PageConfig::from_json_str("{}").unwrap(), PageConfig::default());
    }

    #[test]
    fn malformed_json_is_config_error() {
        let err = PageConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, PageError::Config(_)));
    }

    #[test]
    fn empty_marker_rejected() {
        let err = PageConfig::from_json_str(r#"{"markers": {"copy_attr": " "}}"#).unwrap_err();
        assert_eq!(
            err,
            PageError::Config("markers.copy_attr must not be empty".into())
        );
    }

    #[test]
    fn multi_token_class_rejected() {
        let err = PageConfig::from_json_str(r#"{"classes": {"error_style": ["a b"]}}"#)
            .unwrap_err();
        assert!(matches!(err, PageError::Config(msg) if msg.contains("single token")));
    }
}
