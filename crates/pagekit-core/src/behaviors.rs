#![forbid(unsafe_code)]

//! The `PageBehaviors` component: install once, then feed it events.
//!
//! # Host contract
//!
//! - Call [`install`](PageBehaviors::install) once the document structure is
//!   ready.
//! - Forward events: clicks on toggles, the mobile-menu button, and copy
//!   buttons; submits of validated forms; `input` on textareas; document
//!   clicks for each active outside-click subscription. Headless hosts can
//!   use [`dispatch_click`](PageBehaviors::dispatch_click), which routes one
//!   click the way a browser would.
//! - Perform [`CopyRequest`]s asynchronously and report the outcome with
//!   [`copy_succeeded`](PageBehaviors::copy_succeeded) or
//!   [`copy_failed`](PageBehaviors::copy_failed).
//! - After every call, re-arm a timer for
//!   [`next_deadline`](PageBehaviors::next_deadline) and call
//!   [`advance_to`](PageBehaviors::advance_to) when it expires.
//!
//! Time is a monotonic offset from page load, supplied by the host.

use std::time::Duration;

use crate::autoresize::AutoResize;
use crate::clipboard::{CopyButtons, CopyRequest};
use crate::config::PageConfig;
use crate::dropdown::{DropdownState, Dropdowns};
use crate::error::{ClipboardError, PageError};
use crate::flash::FlashDismiss;
use crate::gate::{self, GateDecision};
use crate::host::{NodeId, PageHost, SubscriptionId};
use crate::mobile_menu::MobileMenu;
use crate::timer::TimerQueue;
use crate::validation::{FormValidator, SubmitOutcome};

/// Deferred work scheduled by the behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    FadeFlash,
    RemoveFlash,
    RevertCopyLabel { button: NodeId, generation: u64 },
}

/// What [`PageBehaviors::install`] found and enhanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallReport {
    pub gate: GateDecision,
    pub flash_messages: usize,
    pub dropdowns: usize,
    pub mobile_menu: bool,
    pub forms: usize,
    pub textareas: usize,
    pub copy_buttons: usize,
}

impl InstallReport {
    const fn redirected() -> Self {
        Self {
            gate: GateDecision::Redirected,
            flash_messages: 0,
            dropdowns: 0,
            mobile_menu: false,
            forms: 0,
            textareas: 0,
            copy_buttons: 0,
        }
    }
}

/// Result of routing one click through [`PageBehaviors::dispatch_click`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickOutcome {
    /// A dropdown toggle handled the click; cancel the default action.
    pub default_prevented: bool,
    /// Dropdowns closed by this click because it landed outside them.
    pub closed_dropdowns: Vec<NodeId>,
    /// Clipboard writes the host should start.
    pub copy_requests: Vec<CopyRequest>,
}

#[derive(Debug, Default)]
pub struct PageBehaviors {
    config: PageConfig,
    timers: TimerQueue<TimerAction>,
    report: Option<InstallReport>,
    flash: FlashDismiss,
    dropdowns: Dropdowns,
    mobile_menu: Option<MobileMenu>,
    forms: FormValidator,
    autoresize: AutoResize,
    copy: CopyButtons,
}

impl PageBehaviors {
    #[must_use]
    pub fn new(config: PageConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn config(&self) -> &PageConfig {
        &self.config
    }

    /// Report from the last install, if installed.
    #[must_use]
    pub const fn report(&self) -> Option<InstallReport> {
        self.report
    }

    #[must_use]
    pub const fn dropdowns(&self) -> &Dropdowns {
        &self.dropdowns
    }

    #[must_use]
    pub const fn flash(&self) -> &FlashDismiss {
        &self.flash
    }

    #[must_use]
    pub const fn mobile_menu(&self) -> Option<MobileMenu> {
        self.mobile_menu
    }

    #[must_use]
    pub const fn forms(&self) -> &FormValidator {
        &self.forms
    }

    #[must_use]
    pub const fn autoresize(&self) -> &AutoResize {
        &self.autoresize
    }

    #[must_use]
    pub const fn copy_buttons(&self) -> &CopyButtons {
        &self.copy
    }

    /// Scan the document and activate every behavior.
    ///
    /// The token gate runs first. When it redirects, nothing else is
    /// installed. Calling `install` again returns the existing report.
    pub fn install<H: PageHost>(
        &mut self,
        host: &mut H,
        now: Duration,
    ) -> Result<InstallReport, PageError> {
        if let Some(report) = self.report {
            return Ok(report);
        }

        let gate = gate::check(host, &self.config)?;
        if gate.redirected() {
            let report = InstallReport::redirected();
            self.report = Some(report);
            return Ok(report);
        }

        self.flash = FlashDismiss::install(host, &self.config, now, &mut self.timers);
        self.dropdowns = Dropdowns::install(host, &self.config);
        self.mobile_menu = MobileMenu::install(host, &self.config);
        self.forms = FormValidator::install(host, &self.config);
        self.autoresize = AutoResize::install(host, &self.config)?;
        self.copy = CopyButtons::install(host, &self.config);

        let report = InstallReport {
            gate,
            flash_messages: self.flash.messages().len(),
            dropdowns: self.dropdowns.len(),
            mobile_menu: self.mobile_menu.is_some(),
            forms: self.forms.forms().len(),
            textareas: self.autoresize.textareas().len(),
            copy_buttons: self.copy.buttons().len(),
        };
        #[cfg(feature = "tracing")]
        tracing::info!(
            flash = report.flash_messages,
            dropdowns = report.dropdowns,
            mobile_menu = report.mobile_menu,
            forms = report.forms,
            textareas = report.textareas,
            copy_buttons = report.copy_buttons,
            "page behaviors installed"
        );
        self.report = Some(report);
        Ok(report)
    }

    /// Release subscriptions, drop timers, and restore copy labels.
    pub fn teardown<H: PageHost>(&mut self, host: &mut H) -> Result<(), PageError> {
        self.dropdowns.release_all(host);
        self.copy.restore_all(host)?;
        self.timers.clear();
        let config = std::mem::take(&mut self.config);
        *self = Self::new(config);
        #[cfg(feature = "tracing")]
        tracing::debug!("page behaviors torn down");
        Ok(())
    }

    /// Click on a dropdown toggle.
    pub fn toggle_dropdown<H: PageHost>(
        &mut self,
        host: &mut H,
        toggle: NodeId,
    ) -> Result<Option<DropdownState>, PageError> {
        self.dropdowns.toggle(host, &self.config, toggle)
    }

    /// Document click delivered to an outside-click subscription.
    pub fn on_document_click<H: PageHost>(
        &mut self,
        host: &mut H,
        subscription: SubscriptionId,
        target: NodeId,
    ) -> Result<bool, PageError> {
        self.dropdowns.on_document_click(host, &self.config, subscription, target)
    }

    /// Click on the mobile-menu button. Returns the menu's visibility, or
    /// `None` if no mobile menu is installed.
    pub fn toggle_mobile_menu<H: PageHost>(
        &mut self,
        host: &mut H,
    ) -> Result<Option<bool>, PageError> {
        self.mobile_menu
            .map(|menu| menu.toggle(host, &self.config))
            .transpose()
    }

    /// Click on a copy button.
    pub fn copy_requested<H: PageHost>(&self, host: &H, button: NodeId) -> Option<CopyRequest> {
        self.copy.request(host, &self.config, button)
    }

    pub fn copy_succeeded<H: PageHost>(
        &mut self,
        host: &mut H,
        button: NodeId,
        now: Duration,
    ) -> Result<(), PageError> {
        self.copy.succeeded(host, &self.config, button, now, &mut self.timers)
    }

    pub fn copy_failed(&self, button: NodeId, error: &ClipboardError) {
        self.copy.failed(button, error);
    }

    pub fn on_submit<H: PageHost>(
        &mut self,
        host: &mut H,
        form: NodeId,
    ) -> Result<SubmitOutcome, PageError> {
        self.forms.on_submit(host, &self.config, form)
    }

    pub fn on_input<H: PageHost>(&mut self, host: &mut H, node: NodeId) -> Result<bool, PageError> {
        self.autoresize.on_input(host, node)
    }

    /// Route a click on `target` through every behavior.
    ///
    /// Outside-click subscriptions see the click first (they listen in the
    /// capture phase), then element handlers run for each enhanced element
    /// containing the target.
    pub fn dispatch_click<H: PageHost>(
        &mut self,
        host: &mut H,
        target: NodeId,
    ) -> Result<ClickOutcome, PageError> {
        let mut outcome = ClickOutcome::default();

        for subscription in self.dropdowns.active_subscriptions() {
            let toggle = self.dropdowns.holder(subscription);
            if self.on_document_click(host, subscription, target)? {
                outcome.closed_dropdowns.extend(toggle);
            }
        }

        let toggles: Vec<NodeId> = self.dropdowns.toggles().collect();
        for toggle in toggles {
            if host.contains(toggle, target) {
                self.toggle_dropdown(host, toggle)?;
                outcome.default_prevented = true;
            }
        }

        if let Some(menu) = self.mobile_menu {
            if host.contains(menu.button(), target) {
                self.toggle_mobile_menu(host)?;
            }
        }

        for &button in self.copy.buttons() {
            if host.contains(button, target) {
                outcome
                    .copy_requests
                    .extend(self.copy.request(host, &self.config, button));
            }
        }

        Ok(outcome)
    }

    /// Earliest pending timer deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Fire every timer due at `now`, including timers scheduled by the ones
    /// firing. Returns how many fired.
    pub fn advance_to<H: PageHost>(
        &mut self,
        host: &mut H,
        now: Duration,
    ) -> Result<usize, PageError> {
        let mut fired = 0;
        while let Some((at, action)) = self.timers.pop_due(now) {
            fired += 1;
            #[cfg(feature = "tracing")]
            tracing::trace!(?action, at_ms = at.as_millis() as u64, "timer fired");
            match action {
                TimerAction::FadeFlash => {
                    self.flash.fade(host, &self.config, at, &mut self.timers)?;
                }
                TimerAction::RemoveFlash => self.flash.remove(host)?,
                TimerAction::RevertCopyLabel { button, generation } => {
                    self.copy.revert(host, button, generation)?;
                }
            }
        }
        Ok(fired)
    }
}
