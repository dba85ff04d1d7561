#![forbid(unsafe_code)]

//! Client-side token gate for pages marked protected.
//!
//! Only the *presence* of a stored token is checked. This is a navigation
//! convenience for signed-out users; the protected markup has already been
//! delivered by the time it runs, so access control belongs on the server.

use crate::config::PageConfig;
use crate::error::PageError;
use crate::host::{PageHost, Selector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// No protected marker on the page.
    Unprotected,
    /// Protected page and a token is stored.
    Allowed,
    /// Protected page without a token; the host was sent to the login page.
    Redirected,
}

impl GateDecision {
    #[must_use]
    pub const fn redirected(self) -> bool {
        matches!(self, Self::Redirected)
    }
}

/// Run the gate. Unreadable storage counts as a missing token.
pub fn check<H: PageHost>(host: &mut H, config: &PageConfig) -> Result<GateDecision, PageError> {
    let protected = host.query_all(&Selector::Attr {
        tag: None,
        name: &config.markers.protected_attr,
        value: Some(&config.markers.protected_value),
    });
    if protected.is_empty() {
        return Ok(GateDecision::Unprotected);
    }

    let token = match host.storage_item(&config.auth.token_key) {
        Ok(token) => token,
        Err(err) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %err, "token storage unreadable; treating as signed out");
            #[cfg(not(feature = "tracing"))]
            let _ = err;
            None
        }
    };
    if token.is_some_and(|token| !token.is_empty()) {
        return Ok(GateDecision::Allowed);
    }

    #[cfg(feature = "tracing")]
    tracing::info!(url = %config.auth.login_url, "no stored token on protected page; redirecting");
    host.navigate(&config.auth.login_url)?;
    Ok(GateDecision::Redirected)
}
