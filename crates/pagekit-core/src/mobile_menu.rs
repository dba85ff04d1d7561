#![forbid(unsafe_code)]

//! Mobile navigation menu: one button flips one menu's hidden class.

use crate::config::PageConfig;
use crate::error::PageError;
use crate::host::{NodeId, PageHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MobileMenu {
    button: NodeId,
    menu: NodeId,
}

impl MobileMenu {
    /// Both elements must exist for the behavior to be installed.
    pub fn install<H: PageHost>(host: &mut H, config: &PageConfig) -> Option<Self> {
        let button = host.element_by_id(&config.markers.mobile_menu_button_id)?;
        let menu = host.element_by_id(&config.markers.mobile_menu_id)?;
        Some(Self { button, menu })
    }

    #[must_use]
    pub const fn button(&self) -> NodeId {
        self.button
    }

    #[must_use]
    pub const fn menu(&self) -> NodeId {
        self.menu
    }

    /// Returns `true` if the menu is visible afterwards.
    pub fn toggle<H: PageHost>(
        &self,
        host: &mut H,
        config: &PageConfig,
    ) -> Result<bool, PageError> {
        let hidden = host.toggle_class(self.menu, &config.classes.hidden)?;
        Ok(!hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ElementSpec, MemoryDocument};

    #[test]
    fn requires_both_elements() {
        let mut doc = MemoryDocument::new();
        doc.append(doc.root(), ElementSpec::new("button").id("mobile-menu-button"));
        assert!(MobileMenu::install(&mut doc, &PageConfig::default()).is_none());
        doc.append(doc.root(), ElementSpec::new("div").id("mobile-menu"));
        assert!(MobileMenu::install(&mut doc, &PageConfig::default()).is_some());
    }

    #[test]
    fn toggle_flips_hidden() {
        let config = PageConfig::default();
        let mut doc = MemoryDocument::new();
        doc.append(doc.root(), ElementSpec::new("button").id("mobile-menu-button"));
        let menu = doc.append(
            doc.root(),
            ElementSpec::new("div").id("mobile-menu").class("hidden"),
        );
        let mobile = MobileMenu::install(&mut doc, &config).unwrap();
        assert_eq!(mobile.menu(), menu);

        assert!(mobile.toggle(&mut doc, &config).unwrap());
        assert!(!doc.has_class(menu, "hidden"));
        assert!(!mobile.toggle(&mut doc, &config).unwrap());
        assert!(doc.has_class(menu, "hidden"));
    }
}
