use tracing::trace;

use crate::domain::Order;

type Listener = Box<dyn FnMut(Option<&Order>)>;

/// Holds at most one selected order and tells subscribers whenever it is written.
#[derive(Default)]
pub struct SelectionStore {
    selected: Option<Order>,
    listeners: Vec<Listener>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<&Order> {
        self.selected.as_ref()
    }

    /// Overwrites the selection, also when the value did not change.
    pub fn set_selection(&mut self, order: Option<Order>) {
        trace!("Set selection: {:?}", order.as_ref().map(|o| o.id));
        self.selected = order;
        let current = self.selected.as_ref();
        for listener in self.listeners.iter_mut() {
            listener(current);
        }
    }

    /// Registers a listener called with the new value after every write.
    pub fn subscribe(&mut self, listener: impl FnMut(Option<&Order>) + 'static) {
        self.listeners.push(Box::new(listener));
    }
}
