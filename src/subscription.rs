use std::{any::Any, rc::Rc};


/// Keeps a subscription alive. Dropping it unsubscribes.
///
/// A subscription holds any number of guards and releases them in the order they were added.
#[derive(Default)]
#[must_use]
pub struct Subscription(Vec<Box<dyn Any>>);

impl Subscription {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Calls `f` when the subscription is dropped.
    pub fn from_fn(f: impl FnOnce() + 'static) -> Self {
        Self(vec![Box::new(OnDrop(Some(f)))])
    }

    /// Keeps `rc` alive until the subscription is dropped.
    pub fn from_rc(rc: Rc<dyn Any>) -> Self {
        Self(vec![Box::new(rc)])
    }
}

/// Combines several subscriptions so that they are dropped together.
impl FromIterator<Subscription> for Subscription {
    fn from_iter<I: IntoIterator<Item = Subscription>>(iter: I) -> Self {
        Self(iter.into_iter().flat_map(|s| s.0).collect())
    }
}

struct OnDrop<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> Drop for OnDrop<F> {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}
