// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-layer property change notifications.
//!
//! UI code that mirrors layer state (selection handles, inspector panels)
//! subscribes to a [`Property`] on a specific layer. The set of observable
//! properties is closed; callbacks run synchronously after the mutation has
//! been applied and receive only the layer handle and the property, so they
//! cannot re-enter the store.

use crate::layer::LayerId;

/// A layer property that can be observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    /// Position, size, or frame.
    Frame,
    /// The `hidden` flag. Only fires on an actual change.
    Hidden,
    /// The sublayer list (insertions, removals, z-order re-sorts).
    Sublayers,
    /// The layer's contents.
    Contents,
}

/// Identifies a subscription so it can be removed later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverToken(u64);

type Callback = Box<dyn FnMut(LayerId, Property)>;

struct Subscription {
    token: ObserverToken,
    layer: LayerId,
    property: Property,
    callback: Callback,
}

/// Registry of property observers, keyed by layer and [`Property`].
#[derive(Default)]
pub struct ObserverRegistry {
    subscriptions: Vec<Subscription>,
    next_token: u64,
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

impl ObserverRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for changes of `property` on `layer`.
    pub fn subscribe(
        &mut self,
        layer: LayerId,
        property: Property,
        callback: impl FnMut(LayerId, Property) + 'static,
    ) -> ObserverToken {
        let token = ObserverToken(self.next_token);
        self.next_token += 1;
        self.subscriptions.push(Subscription {
            token,
            layer,
            property,
            callback: Box::new(callback),
        });
        token
    }

    /// Removes a subscription. Returns `false` if the token was unknown.
    pub fn unsubscribe(&mut self, token: ObserverToken) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.token != token);
        self.subscriptions.len() != before
    }

    /// Drops every subscription attached to `layer`.
    pub fn remove_layer(&mut self, layer: LayerId) {
        self.subscriptions.retain(|s| s.layer != layer);
    }

    /// Invokes every callback registered for `property` on `layer`.
    pub fn notify(&mut self, layer: LayerId, property: Property) {
        for sub in &mut self.subscriptions {
            if sub.layer == layer && sub.property == property {
                (sub.callback)(layer, property);
            }
        }
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns `true` if there are no subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::layer::LayerStore;

    #[test]
    fn notifies_only_matching_layer_and_property() {
        let mut store = LayerStore::new();
        let a = store.create_layer();
        let b = store.create_layer();
        let mut registry = ObserverRegistry::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        registry.subscribe(a, Property::Frame, move |_, _| counter.set(counter.get() + 1));

        registry.notify(a, Property::Frame);
        registry.notify(a, Property::Hidden);
        registry.notify(b, Property::Frame);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut store = LayerStore::new();
        let a = store.create_layer();
        let mut registry = ObserverRegistry::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let token = registry.subscribe(a, Property::Contents, move |_, _| {
            counter.set(counter.get() + 1);
        });
        assert!(registry.unsubscribe(token));
        assert!(!registry.unsubscribe(token));
        registry.notify(a, Property::Contents);
        assert_eq!(hits.get(), 0);
        assert!(registry.is_empty());
    }
}
