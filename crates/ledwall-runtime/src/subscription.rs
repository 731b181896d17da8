#![forbid(unsafe_code)]

//! Observer registry.
//!
//! Views (or tests) subscribe to the model and are called with a shared
//! reference after every dispatch. Observers cannot mutate the model; any
//! reaction has to go back through `Program::dispatch` as a message.

/// A unique identifier for a subscription.
pub type SubId = u64;

type Observer<M> = Box<dyn Fn(&M)>;

/// Ordered set of model observers.
pub struct ObserverRegistry<M> {
    next_id: SubId,
    observers: Vec<(SubId, Observer<M>)>,
}

impl<M> Default for ObserverRegistry<M> {
    fn default() -> Self {
        Self {
            next_id: 1,
            observers: Vec::new(),
        }
    }
}

impl<M> ObserverRegistry<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer; returns its id. Ids are never reused.
    pub fn subscribe(&mut self, observer: impl Fn(&M) + 'static) -> SubId {
        let id = self.next_id;
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns `false` for unknown ids.
    pub fn unsubscribe(&mut self, id: SubId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    /// Call every observer in subscription order.
    pub fn notify(&self, model: &M) {
        for (_, observer) in &self.observers {
            observer(model);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl<M> std::fmt::Debug for ObserverRegistry<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn notifies_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ObserverRegistry::<i32>::new();
        let a = Rc::clone(&log);
        registry.subscribe(move |v| a.borrow_mut().push(("a", *v)));
        let b = Rc::clone(&log);
        registry.subscribe(move |v| b.borrow_mut().push(("b", *v)));
        registry.notify(&7);
        assert_eq!(*log.borrow(), [("a", 7), ("b", 7)]);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut registry = ObserverRegistry::<()>::new();
        let first = registry.subscribe(|_| {});
        assert!(registry.unsubscribe(first));
        let second = registry.subscribe(|_| {});
        assert_ne!(first, second);
        assert_eq!(registry.len(), 1);
        assert!(!registry.unsubscribe(first));
    }
}
