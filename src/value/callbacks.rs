// Ordered callback lists with identity-based removal

use super::ids::CallbackId;

/// Subscribers for one event category, invoked in subscription order.
pub struct CallbackList<F: ?Sized> {
    entries: Vec<(CallbackId, Box<F>)>,
}

impl<F: ?Sized> Default for CallbackList<F> {
    fn default() -> Self {
        CallbackList {
            entries: Vec::new(),
        }
    }
}

impl<F: ?Sized> CallbackList<F> {
    /// Appends a subscriber under the given id
    pub fn push(&mut self, id: CallbackId, callback: Box<F>) {
        self.entries.push((id, callback));
    }

    /// Removes the subscriber with this id, returning whether it was present
    pub fn remove(&mut self, id: CallbackId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Subscribers in invocation order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<F>> {
        self.entries.iter_mut().map(|(_, callback)| callback)
    }
}

impl<F: ?Sized> std::fmt::Debug for CallbackList<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(id, _)| id))
            .finish()
    }
}

/// Issues callback ids that are unique for the lifetime of their owner
#[derive(Debug, Default)]
pub struct CallbackIds {
    last: u64,
}

impl CallbackIds {
    pub fn next(&mut self) -> CallbackId {
        self.last += 1;
        CallbackId(self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Hook = dyn FnMut(u32);

    #[test]
    fn test_invocation_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut ids = CallbackIds::default();
        let mut list: CallbackList<Hook> = CallbackList::default();

        for tag in ["a", "b", "c"] {
            let seen = Rc::clone(&seen);
            list.push(ids.next(), Box::new(move |n| seen.borrow_mut().push(format!("{tag}{n}"))));
        }
        for cb in list.iter_mut() {
            cb(1);
        }
        assert_eq!(*seen.borrow(), vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn test_remove_by_identity() {
        let hits = Rc::new(RefCell::new(0));
        let mut ids = CallbackIds::default();
        let mut list: CallbackList<Hook> = CallbackList::default();

        let first = ids.next();
        let h = Rc::clone(&hits);
        list.push(first, Box::new(move |_| *h.borrow_mut() += 1));
        let second = ids.next();
        let h = Rc::clone(&hits);
        list.push(second, Box::new(move |_| *h.borrow_mut() += 10));

        assert!(list.remove(first));
        assert!(!list.remove(first));
        for cb in list.iter_mut() {
            cb(0);
        }
        assert_eq!(*hits.borrow(), 10);
        assert!(!list.is_empty());
        assert!(list.remove(second));
        assert!(list.is_empty());
    }
}
