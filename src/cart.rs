use std::{cell::Ref, rc::Rc};

use derive_ex::derive_ex;
use parse_display::Display;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    ActionContext, Context, ContextError, Signal, SignalContext, Store, Subscription,
};


/// A single product entry in the cart.
///
/// `id` identifies the product, not the entry: the same product may be added several times.
#[derive(Clone, Debug, PartialEq, Display, Serialize, Deserialize)]
#[display("{name} ({price})")]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub price: f64,
}
impl CartItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
        }
    }
}

/// Items in the order they were added.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CartState {
    #[serde(default)]
    pub items: Vec<CartItem>,
}
impl CartState {
    /// Sum of the prices of all items. An empty cart totals `0`.
    pub fn total(&self) -> f64 {
        // `Sum for f64` starts from `-0.0`, which would render as "-0".
        self.items.iter().fold(0.0, |total, item| total + item.price)
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Shopping cart shared by every part of a page.
#[derive_ex(Clone, Default)]
pub struct CartStore(Store<CartState>);

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn from_state(state: CartState) -> Self {
        Self(Store::new(state))
    }

    /// Looks up the cart provided by an enclosing scope.
    pub fn from_context(cx: &Context) -> Result<Rc<Self>, ContextError> {
        cx.get::<Self>()
    }

    /// Appends `item` to the end of the cart.
    pub fn add_item(&self, item: CartItem, ac: &mut ActionContext) {
        let mut state = self.0.borrow_mut(ac);
        debug!(id = %item.id, price = item.price, "add item");
        state.items.push(item);
        debug!(len = state.items.len(), "cart changed");
    }

    /// Removes every item whose id is `id`.
    ///
    /// If no item matches, the cart is left as is and no one is notified.
    pub fn remove_item(&self, id: &str, ac: &mut ActionContext) {
        let mut state = self.0.borrow_mut(ac);
        if !state.items.iter().any(|item| item.id == id) {
            debug!(id, "remove item: not in cart");
            return;
        }
        state.items.retain(|item| item.id != id);
        debug!(id, len = state.items.len(), "remove item");
    }

    /// Removes all items. Clearing an empty cart notifies no one.
    pub fn clear_cart(&self, ac: &mut ActionContext) {
        let mut state = self.0.borrow_mut(ac);
        if state.items.is_empty() {
            return;
        }
        state.items.clear();
        debug!("clear cart");
    }

    /// Sum of the prices of the current items, read without creating a dependency.
    pub fn get_total(&self, sc: &mut SignalContext) -> f64 {
        sc.untrack(|sc| self.total(sc))
    }

    /// Sum of the prices of the current items.
    pub fn total(&self, sc: &mut SignalContext) -> f64 {
        self.0.read(sc, |state| state.total())
    }
    pub fn count(&self, sc: &mut SignalContext) -> usize {
        self.0.read(sc, |state| state.len())
    }
    pub fn is_empty(&self, sc: &mut SignalContext) -> bool {
        self.0.read(sc, |state| state.is_empty())
    }
    pub fn items<'a>(&'a self, sc: &mut SignalContext) -> Ref<'a, [CartItem]> {
        Ref::map(self.0.borrow(sc), |state| state.items.as_slice())
    }

    /// Returns a copy of the cart contents without tracking.
    pub fn snapshot(&self, sc: &mut SignalContext) -> CartState {
        self.0.snapshot(sc)
    }

    pub fn select<U>(&self, selector: impl Fn(&CartState) -> U + 'static) -> Signal<U>
    where
        U: PartialEq + 'static,
    {
        self.0.select(selector)
    }
    pub fn subscribe<U>(
        &self,
        selector: impl Fn(&CartState) -> U + 'static,
        f: impl FnMut(&U) + 'static,
    ) -> Subscription
    where
        U: PartialEq + 'static,
    {
        self.0.subscribe(selector, f)
    }
    pub fn count_signal(&self) -> Signal<usize> {
        self.select(|state| state.len())
    }
    pub fn total_signal(&self) -> Signal<f64> {
        self.select(|state| state.total())
    }

    pub fn store(&self) -> &Store<CartState> {
        &self.0
    }
}

/// Products offered on the shop page.
pub fn catalogue() -> Vec<CartItem> {
    vec![
        CartItem::new("1", "Keyboard", 100.0),
        CartItem::new("2", "Mouse", 50.0),
        CartItem::new("3", "Monitor", 300.0),
    ]
}
