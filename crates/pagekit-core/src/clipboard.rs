#![forbid(unsafe_code)]

//! Copy-to-clipboard buttons with temporary "Copied!" feedback.
//!
//! The write itself is asynchronous and belongs to the host: a click yields a
//! [`CopyRequest`], and the host later reports success or failure.
//!
//! # Label countdown
//!
//! On success the button shows the feedback text and a revert timer is
//! scheduled. The label shown before the *first* success of a countdown is
//! remembered; a success arriving mid-countdown bumps the button's generation
//! and schedules a fresh timer, and timers carrying an older generation are
//! ignored when they fire. The button therefore always reverts to its real
//! label, `copy_feedback` after the last success.
//!
//! Failures are logged only; the button is left unchanged.

use std::collections::HashMap;
use std::time::Duration;

use crate::behaviors::TimerAction;
use crate::config::PageConfig;
use crate::error::{ClipboardError, PageError};
use crate::host::{NodeId, PageHost, Selector};
use crate::timer::TimerQueue;

/// A clipboard write the host should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    pub button: NodeId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LabelOverride {
    original: String,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct CopyButtons {
    buttons: Vec<NodeId>,
    overrides: HashMap<NodeId, LabelOverride>,
    next_generation: u64,
}

impl CopyButtons {
    pub fn install<H: PageHost>(host: &mut H, config: &PageConfig) -> Self {
        let buttons = host.query_all(&Selector::Attr {
            tag: None,
            name: &config.markers.copy_attr,
            value: None,
        });
        Self {
            buttons,
            overrides: HashMap::new(),
            next_generation: 0,
        }
    }

    #[must_use]
    pub fn buttons(&self) -> &[NodeId] {
        &self.buttons
    }

    /// Whether `button` is currently showing copy feedback.
    #[must_use]
    pub fn is_showing_feedback(&self, button: NodeId) -> bool {
        self.overrides.contains_key(&button)
    }

    /// Build the write request for a click on `button`.
    ///
    /// The payload is read at click time, so markup updated after install is
    /// honoured.
    pub fn request<H: PageHost>(
        &self,
        host: &H,
        config: &PageConfig,
        button: NodeId,
    ) -> Option<CopyRequest> {
        if !self.buttons.contains(&button) {
            return None;
        }
        let text = host.attribute(button, &config.markers.copy_attr)?;
        Some(CopyRequest { button, text })
    }

    pub fn succeeded<H: PageHost>(
        &mut self,
        host: &mut H,
        config: &PageConfig,
        button: NodeId,
        now: Duration,
        timers: &mut TimerQueue<TimerAction>,
    ) -> Result<(), PageError> {
        if !self.buttons.contains(&button) {
            return Ok(());
        }
        self.next_generation += 1;
        let generation = self.next_generation;
        let original = match self.overrides.get(&button) {
            Some(label) => label.original.clone(),
            None => host.text(button),
        };
        host.set_text(button, &config.text.copied)?;
        self.overrides.insert(
            button,
            LabelOverride {
                original,
                generation,
            },
        );
        timers.schedule(
            now + config.timing.copy_feedback(),
            TimerAction::RevertCopyLabel { button, generation },
        );
        Ok(())
    }

    pub fn failed(&self, button: NodeId, error: &ClipboardError) {
        #[cfg(feature = "tracing")]
        tracing::error!(%button, %error, "failed to copy text");
        #[cfg(not(feature = "tracing"))]
        let _ = (button, error);
    }

    /// Restore the label if `generation` is still the button's latest.
    ///
    /// Returns `true` when the label was restored.
    pub fn revert<H: PageHost>(
        &mut self,
        host: &mut H,
        button: NodeId,
        generation: u64,
    ) -> Result<bool, PageError> {
        let current = self.overrides.get(&button).map(|label| label.generation);
        if current != Some(generation) {
            return Ok(false);
        }
        let Some(label) = self.overrides.remove(&button) else {
            return Ok(false);
        };
        host.set_text(button, &label.original)?;
        Ok(true)
    }

    /// Put every overridden label back immediately.
    pub fn restore_all<H: PageHost>(&mut self, host: &mut H) -> Result<(), PageError> {
        for (button, label) in self.overrides.drain() {
            if host.is_connected(button) {
                host.set_text(button, &label.original)?;
            }
        }
        Ok(())
    }
}
