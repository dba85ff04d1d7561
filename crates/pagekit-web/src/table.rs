#![forbid(unsafe_code)]

//! Element ↔ [`NodeId`] table for the DOM host.
//!
//! Ids are never reused: a released id stays dead, so a stale id held by
//! the behaviors resolves to nothing instead of to an unrelated element.

use std::collections::HashMap;

use pagekit_core::NodeId;

/// Reverse lookup from an element to its id.
///
/// The browser host backs this with a JS `Map`, which keys objects by
/// identity in O(1).
pub(crate) trait ElementIndex<E> {
    fn lookup(&self, element: &E) -> Option<NodeId>;
    fn record(&mut self, element: &E, node: NodeId);
    fn forget(&mut self, element: &E);
    fn clear(&mut self);
}

pub(crate) struct NodeTable<E, I> {
    elements: HashMap<NodeId, E>,
    index: I,
    next: u32,
}

impl<E, I: ElementIndex<E>> NodeTable<E, I> {
    pub(crate) fn new(index: I) -> Self {
        Self {
            elements: HashMap::new(),
            index,
            next: 0,
        }
    }

    /// Id for `element`, and whether it was assigned by this call.
    pub(crate) fn intern(&mut self, element: E) -> (NodeId, bool) {
        if let Some(node) = self.index.lookup(&element) {
            return (node, false);
        }
        let node = NodeId(self.next);
        self.next = self.next.wrapping_add(1);
        self.index.record(&element, node);
        self.elements.insert(node, element);
        (node, true)
    }

    pub(crate) fn get(&self, node: NodeId) -> Option<&E> {
        self.elements.get(&node)
    }

    /// Drop the table's reference to `node`.
    pub(crate) fn release(&mut self, node: NodeId) -> Option<E> {
        let element = self.elements.remove(&node)?;
        self.index.forget(&element);
        Some(element)
    }

    /// Forget every element. Ids keep counting up.
    pub(crate) fn clear(&mut self) {
        self.elements.clear();
        self.index.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.elements.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct ByName(HashMap<String, NodeId>);

    impl ElementIndex<String> for ByName {
        fn lookup(&self, element: &String) -> Option<NodeId> {
            self.0.get(element).copied()
        }
        fn record(&mut self, element: &String, node: NodeId) {
            self.0.insert(element.clone(), node);
        }
        fn forget(&mut self, element: &String) {
            self.0.remove(element);
        }
        fn clear(&mut self) {
            self.0.clear();
        }
    }

    fn table() -> NodeTable<String, ByName> {
        NodeTable::new(ByName::default())
    }

    #[test]
    fn same_element_same_id() {
        let mut table = table();
        let (a, fresh_a) = table.intern("a".into());
        let (b, fresh_b) = table.intern("b".into());
        let (again, fresh_again) = table.intern("a".into());
        assert!(fresh_a && fresh_b && !fresh_again);
        assert_eq!(a, again);
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn released_element_is_dropped_and_id_not_reused() {
        let mut table = table();
        let (target, _) = table.intern("click-target".into());
        assert_eq!(table.release(target).as_deref(), Some("click-target"));
        assert_eq!(table.get(target), None);
        assert_eq!(table.len(), 0);

        let (next, fresh) = table.intern("click-target".into());
        assert!(fresh);
        assert_ne!(next, target);
        assert_eq!(table.release(target), None);
    }

    #[test]
    fn repeated_transient_targets_do_not_accumulate() {
        let mut table = table();
        let (panel, _) = table.intern("panel".into());
        for i in 0..100 {
            let (target, fresh) = table.intern(format!("target-{i}"));
            if fresh {
                table.release(target);
            }
        }
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(panel).map(String::as_str), Some("panel"));
    }

    #[test]
    fn clear_empties_table_and_index() {
        let mut table = table();
        let (old, _) = table.intern("a".into());
        table.clear();
        assert_eq!(table.len(), 0);
        assert_eq!(table.get(old), None);
        let (new, fresh) = table.intern("a".into());
        assert!(fresh);
        assert_ne!(new, old);
    }
}
