#![forbid(unsafe_code)]

//! Flash banners: display, then fade, then removal.
//!
//! The set of banners is captured once at install. A single timer fades all
//! of them after `flash_delay`; a second timer removes them `flash_fade`
//! later. Deadlines chain from the scheduled time rather than the time the
//! host got around to firing, so removal lands at exactly
//! `install + flash_delay + flash_fade`.

use std::time::Duration;

use crate::behaviors::TimerAction;
use crate::config::PageConfig;
use crate::error::PageError;
use crate::host::{NodeId, PageHost, Selector};
use crate::timer::TimerQueue;

/// Lifecycle of the banner set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashPhase {
    /// No banners on the page; nothing scheduled.
    #[default]
    Idle,
    /// Banners visible, fade timer pending.
    Waiting,
    /// Fading class applied, removal timer pending.
    Fading,
    /// Banners removed from the document.
    Dismissed,
}

#[derive(Debug, Default)]
pub struct FlashDismiss {
    messages: Vec<NodeId>,
    phase: FlashPhase,
}

impl FlashDismiss {
    pub fn install<H: PageHost>(
        host: &mut H,
        config: &PageConfig,
        now: Duration,
        timers: &mut TimerQueue<TimerAction>,
    ) -> Self {
        let messages = host.query_all(&Selector::Class(&config.markers.flash_class));
        if messages.is_empty() {
            return Self::default();
        }
        timers.schedule(now + config.timing.flash_delay(), TimerAction::FadeFlash);
        Self {
            messages,
            phase: FlashPhase::Waiting,
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[NodeId] {
        &self.messages
    }

    #[must_use]
    pub const fn phase(&self) -> FlashPhase {
        self.phase
    }

    /// Apply the fading class and schedule removal.
    pub fn fade<H: PageHost>(
        &mut self,
        host: &mut H,
        config: &PageConfig,
        at: Duration,
        timers: &mut TimerQueue<TimerAction>,
    ) -> Result<(), PageError> {
        if self.phase != FlashPhase::Waiting {
            return Ok(());
        }
        for &message in &self.messages {
            // Someone else may have closed the banner already.
            if host.is_connected(message) {
                host.add_class(message, &config.classes.fading)?;
            }
        }
        timers.schedule(at + config.timing.flash_fade(), TimerAction::RemoveFlash);
        self.phase = FlashPhase::Fading;
        Ok(())
    }

    pub fn remove<H: PageHost>(&mut self, host: &mut H) -> Result<(), PageError> {
        if self.phase != FlashPhase::Fading {
            return Ok(());
        }
        for &message in &self.messages {
            host.remove(message)?;
        }
        self.phase = FlashPhase::Dismissed;
        #[cfg(feature = "tracing")]
        tracing::debug!(count = self.messages.len(), "flash messages dismissed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ElementSpec, MemoryDocument};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn page(count: usize) -> (MemoryDocument, Vec<NodeId>) {
        let mut doc = MemoryDocument::new();
        let ids = (0..count)
            .map(|i| {
                doc.append(
                    doc.root(),
                    ElementSpec::new("div")
                        .class("flash-message")
                        .text(format!("notice {i}")),
                )
            })
            .collect();
        (doc, ids)
    }

    #[test]
    fn no_messages_schedules_nothing() {
        let (mut doc, _) = page(0);
        let mut timers = TimerQueue::new();
        let flash = FlashDismiss::install(&mut doc, &PageConfig::default(), ms(0), &mut timers);
        assert_eq!(flash.phase(), FlashPhase::Idle);
        assert!(timers.is_empty());
    }

    #[test]
    fn single_timer_for_all_messages() {
        let (mut doc, ids) = page(3);
        let mut timers = TimerQueue::new();
        let flash = FlashDismiss::install(&mut doc, &PageConfig::default(), ms(10), &mut timers);
        assert_eq!(flash.messages(), ids.as_slice());
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_deadline(), Some(ms(5_010)));
    }

    #[test]
    fn fade_then_remove() {
        let config = PageConfig::default();
        let (mut doc, ids) = page(2);
        let mut timers = TimerQueue::new();
        let mut flash = FlashDismiss::install(&mut doc, &config, ms(0), &mut timers);

        let (at, action) = timers.pop_due(ms(5_000)).unwrap();
        assert_eq!(action, TimerAction::FadeFlash);
        flash.fade(&mut doc, &config, at, &mut timers).unwrap();
        assert_eq!(flash.phase(), FlashPhase::Fading);
        for id in &ids {
            assert!(doc.has_class(*id, "opacity-0"));
            assert!(doc.is_connected(*id));
        }
        assert_eq!(timers.next_deadline(), Some(ms(5_300)));

        flash.remove(&mut doc).unwrap();
        assert_eq!(flash.phase(), FlashPhase::Dismissed);
        assert!(ids.iter().all(|id| !doc.is_connected(*id)));
    }

    #[test]
    fn already_removed_banner_is_skipped() {
        let config = PageConfig::default();
        let (mut doc, ids) = page(2);
        let mut timers = TimerQueue::new();
        let mut flash = FlashDismiss::install(&mut doc, &config, ms(0), &mut timers);
        doc.remove(ids[0]).unwrap();
        flash.fade(&mut doc, &config, ms(5_000), &mut timers).unwrap();
        assert!(!doc.has_class(ids[0], "opacity-0"));
        assert!(doc.has_class(ids[1], "opacity-0"));
        flash.remove(&mut doc).unwrap();
        assert!(!doc.is_connected(ids[1]));
    }

    #[test]
    fn out_of_order_calls_are_ignored() {
        let config = PageConfig::default();
        let (mut doc, ids) = page(1);
        let mut timers = TimerQueue::new();
        let mut flash = FlashDismiss::install(&mut doc, &config, ms(0), &mut timers);
        flash.remove(&mut doc).unwrap();
        assert!(doc.is_connected(ids[0]));
        assert_eq!(flash.phase(), FlashPhase::Waiting);
    }
}
