#![forbid(unsafe_code)]

//! Dropdown toggle/panel pairs.
//!
//! Each pair owns an explicit [`DropdownState`]. The panel's hidden class is
//! a projection of that state and is rewritten on every transition.
//!
//! While a pair is open it holds an [`OutsideClick`] subscription. The
//! subscription is released on every path out of `Open`: a click on the
//! toggle, a document click outside both toggle and panel, the panel being
//! detached, or teardown. Pairs are independent; opening one leaves the
//! others alone.

use crate::config::PageConfig;
use crate::error::PageError;
use crate::host::{NodeId, PageHost, Selector, SubscriptionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropdownState {
    Open,
    Closed,
}

impl DropdownState {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Open => Self::Closed,
            Self::Closed => Self::Open,
        }
    }
}

/// Disposal handle for a document-level click subscription.
///
/// Dropping the handle without calling [`dispose`](Self::dispose) leaves the
/// host listener attached.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an outside-click subscription must be disposed"]
pub struct OutsideClick {
    id: SubscriptionId,
}

impl OutsideClick {
    fn acquire<H: PageHost>(host: &mut H, id: SubscriptionId) -> Result<Self, PageError> {
        host.subscribe_document_clicks(id)?;
        Ok(Self { id })
    }

    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn dispose<H: PageHost>(self, host: &mut H) {
        host.unsubscribe_document_clicks(self.id);
    }
}

#[derive(Debug)]
struct DropdownPair {
    toggle: NodeId,
    panel: NodeId,
    state: DropdownState,
    outside: Option<OutsideClick>,
}

impl DropdownPair {
    fn transition<H: PageHost>(
        &mut self,
        host: &mut H,
        hidden: &str,
        next: DropdownState,
        subscription: impl FnOnce() -> SubscriptionId,
    ) -> Result<(), PageError> {
        match next {
            DropdownState::Open => {
                host.remove_class(self.panel, hidden)?;
                if self.outside.is_none() {
                    self.outside = Some(OutsideClick::acquire(host, subscription())?);
                }
            }
            DropdownState::Closed => {
                host.add_class(self.panel, hidden)?;
                if let Some(outside) = self.outside.take() {
                    outside.dispose(host);
                }
            }
        }
        self.state = next;
        Ok(())
    }
}

/// All toggle/panel pairs on the page.
#[derive(Debug, Default)]
pub struct Dropdowns {
    pairs: Vec<DropdownPair>,
    next_subscription: u64,
}

impl Dropdowns {
    /// Resolve every toggle's panel (its next element sibling) once.
    ///
    /// Toggles without a following sibling are skipped. The initial state is
    /// read from the panel's hidden class.
    pub fn install<H: PageHost>(host: &mut H, config: &PageConfig) -> Self {
        let toggles = host.query_all(&Selector::Class(&config.markers.dropdown_toggle_class));
        let mut pairs = Vec::with_capacity(toggles.len());
        for toggle in toggles {
            let Some(panel) = host.next_element_sibling(toggle) else {
                #[cfg(feature = "tracing")]
                tracing::warn!(%toggle, "dropdown toggle has no panel sibling; skipped");
                continue;
            };
            let state = if host.has_class(panel, &config.classes.hidden) {
                DropdownState::Closed
            } else {
                DropdownState::Open
            };
            pairs.push(DropdownPair {
                toggle,
                panel,
                state,
                outside: None,
            });
        }
        Self {
            pairs,
            next_subscription: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn toggles(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.pairs.iter().map(|pair| pair.toggle)
    }

    #[must_use]
    pub fn panel(&self, toggle: NodeId) -> Option<NodeId> {
        self.pair(toggle).map(|pair| pair.panel)
    }

    #[must_use]
    pub fn state(&self, toggle: NodeId) -> Option<DropdownState> {
        self.pair(toggle).map(|pair| pair.state)
    }

    /// Subscriptions currently held by open pairs.
    #[must_use]
    pub fn active_subscriptions(&self) -> Vec<SubscriptionId> {
        self.pairs
            .iter()
            .filter_map(|pair| pair.outside.as_ref().map(OutsideClick::id))
            .collect()
    }

    /// Toggle of the pair holding `subscription`.
    #[must_use]
    pub fn holder(&self, subscription: SubscriptionId) -> Option<NodeId> {
        self.pairs
            .iter()
            .find(|pair| pair.outside.as_ref().map(OutsideClick::id) == Some(subscription))
            .map(|pair| pair.toggle)
    }

    fn pair(&self, toggle: NodeId) -> Option<&DropdownPair> {
        self.pairs.iter().find(|pair| pair.toggle == toggle)
    }

    /// Flip the pair owned by `toggle`; returns the new state, or `None` if
    /// `toggle` is not a known toggle.
    pub fn toggle<H: PageHost>(
        &mut self,
        host: &mut H,
        config: &PageConfig,
        toggle: NodeId,
    ) -> Result<Option<DropdownState>, PageError> {
        let next_subscription = &mut self.next_subscription;
        let Some(pair) = self.pairs.iter_mut().find(|pair| pair.toggle == toggle) else {
            return Ok(None);
        };
        let next = pair.state.toggled();
        pair.transition(host, &config.classes.hidden, next, || {
            let id = SubscriptionId(*next_subscription);
            *next_subscription += 1;
            id
        })?;
        #[cfg(feature = "tracing")]
        tracing::trace!(%toggle, state = ?next, "dropdown toggled");
        Ok(Some(next))
    }

    /// Deliver a document click to the pair holding `subscription`.
    ///
    /// Returns `true` when the click closed the pair.
    pub fn on_document_click<H: PageHost>(
        &mut self,
        host: &mut H,
        config: &PageConfig,
        subscription: SubscriptionId,
        target: NodeId,
    ) -> Result<bool, PageError> {
        let Some(pair) = self
            .pairs
            .iter_mut()
            .find(|pair| pair.outside.as_ref().map(OutsideClick::id) == Some(subscription))
        else {
            return Ok(false);
        };
        if !host.is_connected(pair.panel) {
            if let Some(outside) = pair.outside.take() {
                outside.dispose(host);
            }
            pair.state = DropdownState::Closed;
            return Ok(false);
        }
        if host.contains(pair.toggle, target) || host.contains(pair.panel, target) {
            return Ok(false);
        }
        pair.transition(host, &config.classes.hidden, DropdownState::Closed, || {
            subscription
        })?;
        Ok(true)
    }

    /// Dispose every held subscription without touching panel visibility.
    pub fn release_all<H: PageHost>(&mut self, host: &mut H) {
        for pair in &mut self.pairs {
            if let Some(outside) = pair.outside.take() {
                outside.dispose(host);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ElementSpec, MemoryDocument};
    use pretty_assertions::assert_eq;

    struct Fixture {
        doc: MemoryDocument,
        toggle: NodeId,
        panel: NodeId,
        item: NodeId,
        outside: NodeId,
    }

    fn fixture() -> Fixture {
        let mut doc = MemoryDocument::new();
        let nav = doc.append(doc.root(), ElementSpec::new("div"));
        let toggle = doc.append(nav, ElementSpec::new("a").class("dropdown-toggle"));
        let panel = doc.append(nav, ElementSpec::new("ul").class("hidden"));
        let item = doc.append(panel, ElementSpec::new("li"));
        let outside = doc.append(doc.root(), ElementSpec::new("main"));
        Fixture {
            doc,
            toggle,
            panel,
            item,
            outside,
        }
    }

    #[test]
    fn toggled_is_involution() {
        assert_eq!(DropdownState::Open.toggled(), DropdownState::Closed);
        assert_eq!(DropdownState::Closed.toggled().toggled(), DropdownState::Closed);
    }

    #[test]
    fn install_pairs_toggle_with_sibling() {
        let mut f = fixture();
        let dropdowns = Dropdowns::install(&mut f.doc, &PageConfig::default());
        assert_eq!(dropdowns.len(), 1);
        assert_eq!(dropdowns.panel(f.toggle), Some(f.panel));
        assert_eq!(dropdowns.state(f.toggle), Some(DropdownState::Closed));
    }

    #[test]
    fn toggle_without_sibling_is_skipped() {
        let mut doc = MemoryDocument::new();
        let wrap = doc.append(doc.root(), ElementSpec::new("div"));
        doc.append(wrap, ElementSpec::new("a").class("dropdown-toggle"));
        let dropdowns = Dropdowns::install(&mut doc, &PageConfig::default());
        assert!(dropdowns.is_empty());
    }

    #[test]
    fn visible_panel_starts_open_without_subscription() {
        let mut f = fixture();
        f.doc.remove_class(f.panel, "hidden").unwrap();
        let dropdowns = Dropdowns::install(&mut f.doc, &PageConfig::default());
        assert_eq!(dropdowns.state(f.toggle), Some(DropdownState::Open));
        assert!(dropdowns.active_subscriptions().is_empty());
    }

    #[test]
    fn open_acquires_and_close_releases_subscription() {
        let config = PageConfig::default();
        let mut f = fixture();
        let mut dropdowns = Dropdowns::install(&mut f.doc, &config);

        let state = dropdowns.toggle(&mut f.doc, &config, f.toggle).unwrap();
        assert_eq!(state, Some(DropdownState::Open));
        assert!(!f.doc.has_class(f.panel, "hidden"));
        let subs = dropdowns.active_subscriptions();
        assert_eq!(subs.len(), 1);
        assert_eq!(f.doc.active_subscriptions(), subs);

        let state = dropdowns.toggle(&mut f.doc, &config, f.toggle).unwrap();
        assert_eq!(state, Some(DropdownState::Closed));
        assert!(f.doc.has_class(f.panel, "hidden"));
        assert!(dropdowns.active_subscriptions().is_empty());
        assert!(f.doc.active_subscriptions().is_empty());
    }

    #[test]
    fn outside_click_closes_inside_click_does_not() {
        let config = PageConfig::default();
        let mut f = fixture();
        let mut dropdowns = Dropdowns::install(&mut f.doc, &config);
        dropdowns.toggle(&mut f.doc, &config, f.toggle).unwrap();
        let sub = dropdowns.active_subscriptions()[0];

        for target in [f.item, f.panel, f.toggle] {
            let closed = dropdowns
                .on_document_click(&mut f.doc, &config, sub, target)
                .unwrap();
            assert!(!closed);
            assert_eq!(dropdowns.state(f.toggle), Some(DropdownState::Open));
        }

        let closed = dropdowns
            .on_document_click(&mut f.doc, &config, sub, f.outside)
            .unwrap();
        assert!(closed);
        assert!(f.doc.has_class(f.panel, "hidden"));
        assert!(f.doc.active_subscriptions().is_empty());

        // One-shot: the released subscription no longer reacts.
        let closed = dropdowns
            .on_document_click(&mut f.doc, &config, sub, f.outside)
            .unwrap();
        assert!(!closed);
    }

    #[test]
    fn each_open_gets_a_fresh_subscription() {
        let config = PageConfig::default();
        let mut f = fixture();
        let mut dropdowns = Dropdowns::install(&mut f.doc, &config);
        dropdowns.toggle(&mut f.doc, &config, f.toggle).unwrap();
        let first = dropdowns.active_subscriptions();
        dropdowns.toggle(&mut f.doc, &config, f.toggle).unwrap();
        dropdowns.toggle(&mut f.doc, &config, f.toggle).unwrap();
        let second = dropdowns.active_subscriptions();
        assert_eq!(second.len(), 1);
        assert_ne!(first, second);
    }

    #[test]
    fn detached_panel_releases_subscription() {
        let config = PageConfig::default();
        let mut f = fixture();
        let mut dropdowns = Dropdowns::install(&mut f.doc, &config);
        dropdowns.toggle(&mut f.doc, &config, f.toggle).unwrap();
        let sub = dropdowns.active_subscriptions()[0];
        f.doc.remove(f.panel).unwrap();
        dropdowns
            .on_document_click(&mut f.doc, &config, sub, f.outside)
            .unwrap();
        assert!(f.doc.active_subscriptions().is_empty());
        assert_eq!(dropdowns.state(f.toggle), Some(DropdownState::Closed));
    }

    #[test]
    fn release_all_clears_host_listeners() {
        let config = PageConfig::default();
        let mut f = fixture();
        let mut dropdowns = Dropdowns::install(&mut f.doc, &config);
        dropdowns.toggle(&mut f.doc, &config, f.toggle).unwrap();
        dropdowns.release_all(&mut f.doc);
        assert!(f.doc.active_subscriptions().is_empty());
        assert!(!f.doc.has_class(f.panel, "hidden"));
    }

    #[test]
    fn unknown_toggle_is_noop() {
        let config = PageConfig::default();
        let mut f = fixture();
        let mut dropdowns = Dropdowns::install(&mut f.doc, &config);
        assert_eq!(dropdowns.toggle(&mut f.doc, &config, f.outside), Ok(None));
    }
}
