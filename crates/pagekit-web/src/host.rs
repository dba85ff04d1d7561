#![forbid(unsafe_code)]

//! [`PageHost`] over the live DOM.
//!
//! Elements are interned on first sight through a [`NodeTable`] indexed by
//! a JS `Map`, so the same element always maps to the same id. Removed
//! elements and transient click targets are released from the table.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Weak;

use gloo::events::{EventListener, EventListenerOptions};
use js_sys::{Map, Promise, Reflect};
use pagekit_core::{
    ClipboardError, Height, NodeId, PageError, PageHost, Selector, SubscriptionId,
};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, Event, HtmlElement, HtmlInputElement, HtmlSelectElement,
    HtmlTextAreaElement, Node, NodeList, Window,
};

use crate::table::{ElementIndex, NodeTable};
use crate::wasm::Runtime;

/// Best-effort text for a thrown JS value.
pub(crate) fn describe(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    match value.dyn_ref::<js_sys::Error>() {
        Some(err) => String::from(err.message()),
        None => format!("{value:?}"),
    }
}

fn host_err(value: JsValue) -> PageError {
    PageError::Host(describe(&value))
}

impl ElementIndex<Element> for Map {
    fn lookup(&self, element: &Element) -> Option<NodeId> {
        let key: &JsValue = element;
        self.get(key).as_f64().map(|id| NodeId(id as u32))
    }

    fn record(&mut self, element: &Element, node: NodeId) {
        let key: &JsValue = element;
        self.set(key, &JsValue::from(node.0));
    }

    fn forget(&mut self, element: &Element) {
        let key: &JsValue = element;
        self.delete(key);
    }

    fn clear(&mut self) {
        Map::clear(self);
    }
}

pub(crate) struct WebHost {
    window: Window,
    document: Document,
    nodes: NodeTable<Element, Map>,
    outside: HashMap<SubscriptionId, EventListener>,
    /// Unsubscribed listeners, dropped later from a timer callback since a
    /// listener may be unsubscribed while its own callback is running.
    retired: Vec<EventListener>,
    runtime: Weak<RefCell<Runtime>>,
}

impl WebHost {
    pub(crate) fn new(
        window: Window,
        document: Document,
        runtime: Weak<RefCell<Runtime>>,
    ) -> Self {
        Self {
            window,
            document,
            nodes: NodeTable::new(Map::new()),
            outside: HashMap::new(),
            retired: Vec::new(),
            runtime,
        }
    }

    pub(crate) fn document(&self) -> &Document {
        &self.document
    }

    pub(crate) fn element(&self, node: NodeId) -> Result<&Element, PageError> {
        self.nodes.get(node).ok_or(PageError::UnknownNode(node))
    }

    fn get(&self, node: NodeId) -> Option<&Element> {
        self.nodes.get(node)
    }

    fn intern(&mut self, element: Element) -> NodeId {
        self.nodes.intern(element).0
    }

    /// Release a node interned only for the duration of one event.
    pub(crate) fn release_transient(&mut self, node: NodeId) {
        self.nodes.release(node);
    }

    /// Forget every interned element; used on teardown.
    pub(crate) fn clear_nodes(&mut self) {
        self.nodes.clear();
    }

    fn collect(&mut self, list: &NodeList) -> Vec<NodeId> {
        (0..list.length())
            .filter_map(|index| list.get(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|element| self.intern(element))
            .collect()
    }

    /// Element a click landed on, and whether it was interned just now.
    /// Text-node targets resolve to their parent; anything else to `<html>`,
    /// which lies outside every enhanced element.
    pub(crate) fn event_target(&mut self, event: &Event) -> Option<(NodeId, bool)> {
        let target = event.target()?;
        let element = match target.dyn_into::<Element>() {
            Ok(element) => element,
            Err(other) => match other.dyn_into::<Node>() {
                Ok(node) => node.parent_element()?,
                Err(_) => self.document.document_element()?,
            },
        };
        Some(self.nodes.intern(element))
    }

    /// Start `navigator.clipboard.writeText(text)`.
    pub(crate) fn write_clipboard(&self, text: &str) -> Result<Promise, ClipboardError> {
        let navigator = self.window.navigator();
        let present = Reflect::get(&navigator, &JsValue::from_str("clipboard"))
            .is_ok_and(|clipboard| !clipboard.is_undefined() && !clipboard.is_null());
        if !present {
            return Err(ClipboardError::NotAvailable);
        }
        Ok(navigator.clipboard().write_text(text))
    }

    pub(crate) fn take_retired(&mut self) -> Vec<EventListener> {
        std::mem::take(&mut self.retired)
    }

    fn style_target(&self, node: NodeId) -> Result<&HtmlElement, PageError> {
        self.element(node)?
            .dyn_ref::<HtmlElement>()
            .ok_or_else(|| PageError::Host(format!("{node} is not an HTML element")))
    }
}

impl PageHost for WebHost {
    fn query_all(&mut self, selector: &Selector<'_>) -> Vec<NodeId> {
        let css = selector.to_css();
        match self.document.query_selector_all(&css) {
            Ok(list) => self.collect(&list),
            Err(err) => {
                tracing::warn!(selector = %css, error = %describe(&err), "query failed");
                Vec::new()
            }
        }
    }

    fn query_within(&mut self, scope: NodeId, selector: &Selector<'_>) -> Vec<NodeId> {
        let css = selector.to_css();
        let Some(scope) = self.get(scope) else {
            return Vec::new();
        };
        match scope.query_selector_all(&css) {
            Ok(list) => self.collect(&list),
            Err(err) => {
                tracing::warn!(selector = %css, error = %describe(&err), "query failed");
                Vec::new()
            }
        }
    }

    fn element_by_id(&mut self, id: &str) -> Option<NodeId> {
        let element = self.document.get_element_by_id(id)?;
        Some(self.intern(element))
    }

    fn next_element_sibling(&mut self, node: NodeId) -> Option<NodeId> {
        let sibling = self.get(node)?.next_element_sibling()?;
        Some(self.intern(sibling))
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        match (self.get(ancestor), self.get(node)) {
            (Some(ancestor), Some(node)) => {
                let node: &Node = node;
                ancestor.contains(Some(node))
            }
            _ => false,
        }
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(|element| element.is_connected())
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.get(node)
            .is_some_and(|element| element.class_list().contains(class))
    }

    fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), PageError> {
        self.element(node)?.class_list().add_1(class).map_err(host_err)
    }

    fn remove_class(&mut self, node: NodeId, class: &str) -> Result<(), PageError> {
        self.element(node)?
            .class_list()
            .remove_1(class)
            .map_err(host_err)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.get(node)?.get_attribute(name)
    }

    fn value(&self, node: NodeId) -> Option<String> {
        let element = self.get(node)?;
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            Some(input.value())
        } else if let Some(textarea) = element.dyn_ref::<HtmlTextAreaElement>() {
            Some(textarea.value())
        } else {
            element
                .dyn_ref::<HtmlSelectElement>()
                .map(HtmlSelectElement::value)
        }
    }

    fn text(&self, node: NodeId) -> String {
        self.get(node)
            .and_then(|element| element.text_content())
            .unwrap_or_default()
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), PageError> {
        self.element(node)?.set_text_content(Some(text));
        Ok(())
    }

    fn set_height(&mut self, node: NodeId, height: Height) -> Result<(), PageError> {
        self.style_target(node)?
            .style()
            .set_property("height", &height.to_css())
            .map_err(host_err)
    }

    fn scroll_height(&self, node: NodeId) -> u32 {
        self.get(node)
            .map_or(0, |element| u32::try_from(element.scroll_height()).unwrap_or(0))
    }

    fn insert_after(
        &mut self,
        anchor: NodeId,
        tag: &str,
        classes: &[&str],
        text: &str,
    ) -> Result<NodeId, PageError> {
        let anchor_element = self.element(anchor)?;
        if anchor_element.parent_node().is_none() {
            return Err(PageError::Detached(anchor));
        }
        let created = self.document.create_element(tag).map_err(host_err)?;
        created.set_class_name(&classes.join(" "));
        created.set_text_content(Some(text));
        anchor_element.after_with_node_1(&created).map_err(host_err)?;
        Ok(self.intern(created))
    }

    fn remove(&mut self, node: NodeId) -> Result<(), PageError> {
        if let Some(element) = self.nodes.release(node) {
            element.remove();
        }
        Ok(())
    }

    fn storage_item(&self, key: &str) -> Result<Option<String>, PageError> {
        let storage = self
            .window
            .local_storage()
            .map_err(|err| PageError::Storage(describe(&err)))?
            .ok_or_else(|| PageError::Storage("localStorage is unavailable".into()))?;
        storage
            .get_item(key)
            .map_err(|err| PageError::Storage(describe(&err)))
    }

    fn navigate(&mut self, url: &str) -> Result<(), PageError> {
        self.window
            .location()
            .set_href(url)
            .map_err(|err| PageError::Navigation(describe(&err)))
    }

    fn subscribe_document_clicks(
        &mut self,
        subscription: SubscriptionId,
    ) -> Result<(), PageError> {
        let runtime = self.runtime.clone();
        let listener = EventListener::new_with_options(
            &self.document,
            "click",
            EventListenerOptions::run_in_capture_phase(),
            move |event| Runtime::document_click(&runtime, subscription, event),
        );
        self.outside.insert(subscription, listener);
        Ok(())
    }

    fn unsubscribe_document_clicks(&mut self, subscription: SubscriptionId) {
        if let Some(listener) = self.outside.remove(&subscription) {
            self.retired.push(listener);
            Runtime::schedule_sweep(self.runtime.clone());
        }
    }
}
