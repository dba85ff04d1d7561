#![forbid(unsafe_code)]

//! Textareas that grow and shrink with their content.

use crate::config::PageConfig;
use crate::error::PageError;
use crate::host::{Height, NodeId, PageHost, Selector};

/// Reset to `auto` so the box can shrink, then pin it to the scroll height.
pub fn fit<H: PageHost>(host: &mut H, node: NodeId) -> Result<u32, PageError> {
    host.set_height(node, Height::Auto)?;
    let height = host.scroll_height(node);
    host.set_height(node, Height::Pixels(height))?;
    Ok(height)
}

#[derive(Debug, Default)]
pub struct AutoResize {
    textareas: Vec<NodeId>,
}

impl AutoResize {
    /// Find marked textareas and size each one for its initial content.
    pub fn install<H: PageHost>(host: &mut H, config: &PageConfig) -> Result<Self, PageError> {
        let textareas = host.query_all(&Selector::Attr {
            tag: Some("textarea"),
            name: &config.markers.autoresize_attr,
            value: None,
        });
        for &textarea in &textareas {
            fit(host, textarea)?;
        }
        Ok(Self { textareas })
    }

    #[must_use]
    pub fn textareas(&self) -> &[NodeId] {
        &self.textareas
    }

    /// Handle an `input` event. Returns `false` for unmanaged elements.
    pub fn on_input<H: PageHost>(&self, host: &mut H, node: NodeId) -> Result<bool, PageError> {
        if !self.textareas.contains(&node) {
            return Ok(false);
        }
        fit(host, node)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ElementSpec, MemoryDocument};

    #[test]
    fn install_sizes_prefilled_content() {
        let mut doc = MemoryDocument::new().with_line_height(18);
        let ta = doc.append(
            doc.root(),
            ElementSpec::new("textarea")
                .attr("data-autoresize", "")
                .value("one\ntwo\nthree"),
        );
        let plain = doc.append(doc.root(), ElementSpec::new("textarea").value("a\nb"));
        let resize = AutoResize::install(&mut doc, &PageConfig::default()).unwrap();
        assert_eq!(resize.textareas(), &[ta]);
        assert_eq!(doc.height(ta), Some(Height::Pixels(54)));
        assert_eq!(doc.height(plain), None);
    }

    #[test]
    fn input_grows_and_shrinks() {
        let mut doc = MemoryDocument::new();
        let ta = doc.append(
            doc.root(),
            ElementSpec::new("textarea").attr("data-autoresize", "true"),
        );
        let resize = AutoResize::install(&mut doc, &PageConfig::default()).unwrap();

        doc.set_value(ta, "1\n2\n3\n4").unwrap();
        assert!(resize.on_input(&mut doc, ta).unwrap());
        assert_eq!(doc.rendered_height(ta), 80);
        assert_eq!(doc.rendered_height(ta), doc.scroll_height(ta));

        doc.set_value(ta, "1").unwrap();
        resize.on_input(&mut doc, ta).unwrap();
        assert_eq!(doc.rendered_height(ta), 20);
    }

    #[test]
    fn input_on_other_element_is_ignored() {
        let mut doc = MemoryDocument::new();
        let other = doc.append(doc.root(), ElementSpec::new("input"));
        let resize = AutoResize::install(&mut doc, &PageConfig::default()).unwrap();
        assert!(!resize.on_input(&mut doc, other).unwrap());
        assert_eq!(doc.height(other), None);
    }
}
