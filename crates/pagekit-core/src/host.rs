#![forbid(unsafe_code)]

//! The seam between the behavior engine and a concrete document.
//!
//! The engine never touches a DOM directly. It asks a [`PageHost`] to query,
//! mutate, and navigate, and refers to elements through opaque [`NodeId`]
//! handles the host hands out. Two hosts exist:
//! - the browser host in `pagekit-web` (over `web-sys`), and
//! - [`MemoryDocument`](crate::memory::MemoryDocument), an in-memory tree for
//!   tests and headless tooling.

use std::fmt;

use crate::error::PageError;

/// Opaque element handle issued by a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle for one outside-click subscription held by an open dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

/// The small selector vocabulary the behaviors need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<'a> {
    /// `.class`
    Class(&'a str),
    /// `tag[name]` or `tag[name="value"]`; `tag` is optional.
    Attr {
        tag: Option<&'a str>,
        name: &'a str,
        value: Option<&'a str>,
    },
}

impl Selector<'_> {
    /// Render as a CSS selector for `querySelectorAll`.
    #[must_use]
    pub fn to_css(&self) -> String {
        match *self {
            Self::Class(class) => format!(".{}", css_escape_ident(class)),
            Self::Attr { tag, name, value } => {
                let tag = tag.map(css_escape_ident).unwrap_or_default();
                let name = css_escape_ident(name);
                match value {
                    Some(value) => format!("{tag}[{name}=\"{}\"]", css_escape_string(value)),
                    None => format!("{tag}[{name}]"),
                }
            }
        }
    }
}

/// Escape an identifier the way `CSS.escape` does, so configured names
/// such as `md:flash` stay a single class token.
fn css_escape_ident(ident: &str) -> String {
    use std::fmt::Write as _;

    if ident == "-" {
        return "\\-".to_owned();
    }
    let leading_dash = ident.starts_with('-');
    let mut out = String::with_capacity(ident.len());
    for (i, ch) in ident.chars().enumerate() {
        let digit_at_start = ch.is_ascii_digit() && (i == 0 || (i == 1 && leading_dash));
        match ch {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1F}' | '\u{7F}' => {
                let _ = write!(out, "\\{:x} ", u32::from(ch));
            }
            _ if digit_at_start => {
                let _ = write!(out, "\\{:x} ", u32::from(ch));
            }
            '-' | '_' => out.push(ch),
            _ if ch.is_ascii_alphanumeric() || !ch.is_ascii() => out.push(ch),
            _ => {
                out.push('\\');
                out.push(ch);
            }
        }
    }
    out
}

fn css_escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Inline height for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Height {
    /// `height: auto`, the box sizes to its content.
    Auto,
    /// `height: <n>px`
    Pixels(u32),
}

impl Height {
    /// CSS value for `style.height`.
    #[must_use]
    pub fn to_css(self) -> String {
        match self {
            Self::Auto => "auto".to_owned(),
            Self::Pixels(px) => format!("{px}px"),
        }
    }
}

/// Document operations the behaviors are built from.
///
/// Query methods return handles in document order. Handles stay valid after
/// the element is removed; [`is_connected`](Self::is_connected) reports
/// whether it is still attached.
pub trait PageHost {
    fn query_all(&mut self, selector: &Selector<'_>) -> Vec<NodeId>;

    /// Like [`query_all`](Self::query_all) but limited to descendants of `scope`.
    fn query_within(&mut self, scope: NodeId, selector: &Selector<'_>) -> Vec<NodeId>;

    fn element_by_id(&mut self, id: &str) -> Option<NodeId>;

    fn next_element_sibling(&mut self, node: NodeId) -> Option<NodeId>;

    /// Inclusive: a node contains itself.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    fn is_connected(&self, node: NodeId) -> bool;

    fn has_class(&self, node: NodeId, class: &str) -> bool;

    fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), PageError>;

    fn remove_class(&mut self, node: NodeId, class: &str) -> Result<(), PageError>;

    /// Flip `class` and report whether it is now present.
    fn toggle_class(&mut self, node: NodeId, class: &str) -> Result<bool, PageError> {
        if self.has_class(node, class) {
            self.remove_class(node, class)?;
            Ok(false)
        } else {
            self.add_class(node, class)?;
            Ok(true)
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Current value of a form control; `None` for elements that have none.
    fn value(&self, node: NodeId) -> Option<String>;

    fn text(&self, node: NodeId) -> String;

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), PageError>;

    fn set_height(&mut self, node: NodeId, height: Height) -> Result<(), PageError>;

    fn scroll_height(&self, node: NodeId) -> u32;

    /// Create `<tag class="...">text</tag>` as the next sibling of `anchor`.
    fn insert_after(
        &mut self,
        anchor: NodeId,
        tag: &str,
        classes: &[&str],
        text: &str,
    ) -> Result<NodeId, PageError>;

    /// Detach `node` from the document. Removing a detached node is a no-op.
    fn remove(&mut self, node: NodeId) -> Result<(), PageError>;

    fn storage_item(&self, key: &str) -> Result<Option<String>, PageError>;

    fn navigate(&mut self, url: &str) -> Result<(), PageError>;

    /// Start delivering document-level clicks for `subscription`.
    fn subscribe_document_clicks(&mut self, subscription: SubscriptionId)
    -> Result<(), PageError>;

    /// Stop delivering clicks for `subscription`. Unknown ids are ignored.
    fn unsubscribe_document_clicks(&mut self, subscription: SubscriptionId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_css() {
        assert_eq!(Selector::Class("flash-message").to_css(), ".flash-message");
        assert_eq!(
            Selector::Attr {
                tag: Some("form"),
                name: "data-validate",
                value: Some("true"),
            }
            .to_css(),
            "form[data-validate=\"true\"]"
        );
        assert_eq!(
            Selector::Attr {
                tag: None,
                name: "data-copy",
                value: None,
            }
            .to_css(),
            "[data-copy]"
        );
    }

    #[test]
    fn selector_value_is_escaped() {
        let css = Selector::Attr {
            tag: None,
            name: "data-x",
            value: Some(r#"a"b\c"#),
        }
        .to_css();
        assert_eq!(css, r#"[data-x="a\"b\\c"]"#);
    }

    #[test]
    fn identifiers_are_escaped() {
        assert_eq!(Selector::Class("md:flash").to_css(), r".md\:flash");
        assert_eq!(Selector::Class("w-1/2").to_css(), r".w-1\/2");
        assert_eq!(Selector::Class("2col").to_css(), r".\32 col");
        assert_eq!(Selector::Class("-9").to_css(), r".-\39 ");
        assert_eq!(Selector::Class("-").to_css(), r".\-");
        assert_eq!(Selector::Class("flash_msg-é").to_css(), ".flash_msg-é");
        assert_eq!(
            Selector::Attr {
                tag: Some("form"),
                name: "data:validate",
                value: None,
            }
            .to_css(),
            r"form[data\:validate]"
        );
    }

    #[test]
    fn height_css() {
        assert_eq!(Height::Auto.to_css(), "auto");
        assert_eq!(Height::Pixels(64).to_css(), "64px");
    }
}
