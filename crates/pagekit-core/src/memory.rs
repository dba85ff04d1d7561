#![forbid(unsafe_code)]

//! In-memory document implementing [`PageHost`].
//!
//! Every node is an element. Text lives directly on nodes, and form-control
//! values are tracked separately from text. Removed nodes stay in the arena
//! so their handles remain valid.
//!
//! Layout is modelled only as far as the behaviors need it: a textarea's
//! scroll height is its line count times [`MemoryDocument::line_height`].

use std::collections::{BTreeMap, BTreeSet};

use crate::error::PageError;
use crate::host::{Height, NodeId, PageHost, Selector, SubscriptionId};

const DEFAULT_LINE_HEIGHT: u32 = 20;

/// Builder for an element appended with [`MemoryDocument::append`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSpec {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    text: String,
    value: Option<String>,
}

impl ElementSpec {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Debug, Clone)]
struct MemNode {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    text: String,
    value: Option<String>,
    height: Option<Height>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl MemNode {
    fn from_spec(spec: ElementSpec, parent: Option<NodeId>) -> Self {
        Self {
            tag: spec.tag.to_ascii_lowercase(),
            id: spec.id,
            classes: spec.classes,
            attrs: spec.attrs,
            text: spec.text,
            value: spec.value,
            height: None,
            parent,
            children: Vec::new(),
        }
    }

    fn is_form_control(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "textarea" | "select")
    }

    fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "id" => self.id.clone(),
            "class" if !self.classes.is_empty() => Some(self.classes.join(" ")),
            "class" => None,
            _ => self
                .attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone()),
        }
    }

    fn matches(&self, selector: &Selector<'_>) -> bool {
        match *selector {
            Selector::Class(class) => self.classes.iter().any(|c| c == class),
            Selector::Attr { tag, name, value } => {
                if tag.is_some_and(|tag| !self.tag.eq_ignore_ascii_case(tag)) {
                    return false;
                }
                match (self.attribute(name), value) {
                    (Some(actual), Some(expected)) => actual == expected,
                    (Some(_), None) => true,
                    (None, _) => false,
                }
            }
        }
    }
}

/// Headless document with local storage, navigation log, and subscription
/// bookkeeping.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<MemNode>,
    storage: BTreeMap<String, String>,
    storage_failure: Option<String>,
    navigations: Vec<String>,
    subscriptions: BTreeSet<SubscriptionId>,
    line_height: u32,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Empty document whose root is a `<body>`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![MemNode::from_spec(ElementSpec::new("body"), None)],
            storage: BTreeMap::new(),
            storage_failure: None,
            navigations: Vec::new(),
            subscriptions: BTreeSet::new(),
            line_height: DEFAULT_LINE_HEIGHT,
        }
    }

    #[must_use]
    pub fn with_line_height(mut self, line_height: u32) -> Self {
        self.line_height = line_height;
        self
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[must_use]
    pub const fn line_height(&self) -> u32 {
        self.line_height
    }

    /// Append a new element as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` was not issued by this document.
    pub fn append(&mut self, parent: NodeId, spec: ElementSpec) -> NodeId {
        let id = self.push(MemNode::from_spec(spec, Some(parent)));
        self.nodes[parent.0 as usize].children.push(id);
        id
    }

    fn push(&mut self, node: MemNode) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(node);
        id
    }

    fn node(&self, id: NodeId) -> Option<&MemNode> {
        self.nodes.get(id.0 as usize)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemNode, PageError> {
        self.nodes
            .get_mut(id.0 as usize)
            .ok_or(PageError::UnknownNode(id))
    }

    /// Simulate the user typing: replace a control's value.
    pub fn set_value(&mut self, node: NodeId, value: impl Into<String>) -> Result<(), PageError> {
        self.node_mut(node)?.value = Some(value.into());
        Ok(())
    }

    pub fn set_storage_item(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.storage.insert(key.into(), value.into());
    }

    pub fn remove_storage_item(&mut self, key: &str) {
        self.storage.remove(key);
    }

    /// Make every subsequent storage read fail with `message`.
    pub fn fail_storage(&mut self, message: impl Into<String>) {
        self.storage_failure = Some(message.into());
    }

    /// URLs passed to [`PageHost::navigate`], oldest first.
    #[must_use]
    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    /// Subscriptions currently receiving document clicks.
    #[must_use]
    pub fn active_subscriptions(&self) -> Vec<SubscriptionId> {
        self.subscriptions.iter().copied().collect()
    }

    #[must_use]
    pub fn classes(&self, node: NodeId) -> &[String] {
        self.node(node).map_or(&[], |n| n.classes.as_slice())
    }

    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map_or(&[], |n| n.children.as_slice())
    }

    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(|n| n.tag.as_str())
    }

    /// Inline height last set through [`PageHost::set_height`].
    #[must_use]
    pub fn height(&self, node: NodeId) -> Option<Height> {
        self.node(node).and_then(|n| n.height)
    }

    /// Height the box renders at: explicit pixels, else its content height.
    #[must_use]
    pub fn rendered_height(&self, node: NodeId) -> u32 {
        match self.height(node) {
            Some(Height::Pixels(px)) => px,
            Some(Height::Auto) | None => self.content_height(node),
        }
    }

    fn content_height(&self, node: NodeId) -> u32 {
        let Some(n) = self.node(node) else {
            return 0;
        };
        let content = if n.is_form_control() {
            n.value.clone().unwrap_or_default()
        } else {
            self.text(node)
        };
        let lines = u32::try_from(content.split('\n').count()).unwrap_or(u32::MAX);
        lines.max(1).saturating_mul(self.line_height)
    }

    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self
            .children(scope)
            .iter()
            .rev()
            .copied()
            .collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    fn select(&self, scope: NodeId, selector: &Selector<'_>) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.node(*id).is_some_and(|n| n.matches(selector)))
            .collect()
    }
}

impl PageHost for MemoryDocument {
    fn query_all(&mut self, selector: &Selector<'_>) -> Vec<NodeId> {
        self.select(self.root(), selector)
    }

    fn query_within(&mut self, scope: NodeId, selector: &Selector<'_>) -> Vec<NodeId> {
        self.select(scope, selector)
    }

    fn element_by_id(&mut self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|node| self.node(*node).and_then(|n| n.id.as_deref()) == Some(id))
    }

    fn next_element_sibling(&mut self, node: NodeId) -> Option<NodeId> {
        let parent = self.node(node)?.parent?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|s| *s == node)?;
        siblings.get(index + 1).copied()
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.node(node).is_some() && self.contains(self.root(), node)
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.classes(node).iter().any(|c| c == class)
    }

    fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), PageError> {
        let n = self.node_mut(node)?;
        if !n.classes.iter().any(|c| c == class) {
            n.classes.push(class.to_owned());
        }
        Ok(())
    }

    fn remove_class(&mut self, node: NodeId, class: &str) -> Result<(), PageError> {
        self.node_mut(node)?.classes.retain(|c| c != class);
        Ok(())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.node(node)?.attribute(name)
    }

    fn value(&self, node: NodeId) -> Option<String> {
        let n = self.node(node)?;
        n.is_form_control()
            .then(|| n.value.clone().unwrap_or_default())
    }

    fn text(&self, node: NodeId) -> String {
        let Some(n) = self.node(node) else {
            return String::new();
        };
        let mut out = n.text.clone();
        for child in &n.children {
            out.push_str(&self.text(*child));
        }
        out
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), PageError> {
        let children = std::mem::take(&mut self.node_mut(node)?.children);
        for child in children {
            self.node_mut(child)?.parent = None;
        }
        self.node_mut(node)?.text = text.to_owned();
        Ok(())
    }

    fn set_height(&mut self, node: NodeId, height: Height) -> Result<(), PageError> {
        self.node_mut(node)?.height = Some(height);
        Ok(())
    }

    fn scroll_height(&self, node: NodeId) -> u32 {
        self.content_height(node)
    }

    fn insert_after(
        &mut self,
        anchor: NodeId,
        tag: &str,
        classes: &[&str],
        text: &str,
    ) -> Result<NodeId, PageError> {
        let parent = self
            .node(anchor)
            .ok_or(PageError::UnknownNode(anchor))?
            .parent
            .ok_or(PageError::Detached(anchor))?;
        let spec = classes
            .iter()
            .fold(ElementSpec::new(tag).text(text), |spec, class| {
                spec.class(*class)
            });
        let id = self.push(MemNode::from_spec(spec, Some(parent)));
        let siblings = &mut self.node_mut(parent)?.children;
        let index = siblings
            .iter()
            .position(|s| *s == anchor)
            .map_or(siblings.len(), |i| i + 1);
        siblings.insert(index, id);
        Ok(id)
    }

    fn remove(&mut self, node: NodeId) -> Result<(), PageError> {
        let Some(parent) = self.node_mut(node)?.parent.take() else {
            return Ok(());
        };
        self.node_mut(parent)?.children.retain(|c| *c != node);
        Ok(())
    }

    fn storage_item(&self, key: &str) -> Result<Option<String>, PageError> {
        if let Some(message) = &self.storage_failure {
            return Err(PageError::Storage(message.clone()));
        }
        Ok(self.storage.get(key).cloned())
    }

    fn navigate(&mut self, url: &str) -> Result<(), PageError> {
        self.navigations.push(url.to_owned());
        Ok(())
    }

    fn subscribe_document_clicks(
        &mut self,
        subscription: SubscriptionId,
    ) -> Result<(), PageError> {
        self.subscriptions.insert(subscription);
        Ok(())
    }

    fn unsubscribe_document_clicks(&mut self, subscription: SubscriptionId) {
        self.subscriptions.remove(&subscription);
    }
}
