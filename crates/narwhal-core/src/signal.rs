/// Handle returned by [`Emitter::connect`], used to disconnect later.
pub type SubscriberId = usize;

/// Synchronous subscriber list. Subscribers run in connection order, inside the emitting call.
pub struct Emitter<E> {
    next_id: SubscriberId,
    subscribers: Vec<(SubscriberId, Box<dyn FnMut(&E)>)>,
}

impl<E> Default for Emitter<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }
}

impl<E> std::fmt::Debug for Emitter<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<E> Emitter<E> {
    pub fn connect(&mut self, subscriber: impl FnMut(&E) + 'static) -> SubscriberId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn disconnect(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn emit(&mut self, event: &E) {
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(event);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn subscribers_run_in_connection_order_until_disconnected() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut emitter: Emitter<u32> = Emitter::default();

        let a = {
            let log = log.clone();
            emitter.connect(move |v| log.borrow_mut().push(("a", *v)))
        };
        {
            let log = log.clone();
            emitter.connect(move |v| log.borrow_mut().push(("b", *v)));
        }

        emitter.emit(&1);
        assert!(emitter.disconnect(a));
        assert!(!emitter.disconnect(a));
        emitter.emit(&2);

        assert_eq!(*log.borrow(), vec![("a", 1), ("b", 1), ("b", 2)]);
        assert_eq!(emitter.len(), 1);
    }
}
