use std::{any::type_name, cell::Ref};

use derive_ex::derive_ex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{ActionContext, Signal, SignalContext, State, StateRefMut, Subscription, TaskKind};

#[cfg(test)]
mod tests;

/// A state container read through selectors.
///
/// Consumers subscribe to a slice of the state with [`select`](Self::select) or
/// [`subscribe`](Self::subscribe) and are notified only when the value their selector
/// returns changes, not on every mutation of the state.
#[derive_ex(Clone, bound())]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Store<S: 'static>(State<S>);

impl<S: 'static> Store<S> {
    pub fn new(state: S) -> Self {
        Self(State::new(state))
    }

    /// Borrows the whole state and makes the caller depend on all of it.
    pub fn borrow<'a>(&'a self, sc: &mut SignalContext) -> Ref<'a, S> {
        self.0.borrow(sc)
    }

    /// Applies `f` to the whole state and makes the caller depend on all of it.
    pub fn read<U>(&self, sc: &mut SignalContext, f: impl FnOnce(&S) -> U) -> U {
        f(&self.0.borrow(sc))
    }

    /// Returns a signal of the value picked by `selector`.
    ///
    /// The signal notifies its dependents only when the selected value changes.
    pub fn select<U>(&self, selector: impl Fn(&S) -> U + 'static) -> Signal<U>
    where
        U: PartialEq + 'static,
    {
        let state = self.0.clone();
        Signal::new_dedup(move |sc| selector(&state.borrow(sc)))
    }

    /// Calls `f` with the selected value now, and again each time it changes.
    pub fn subscribe<U>(
        &self,
        selector: impl Fn(&S) -> U + 'static,
        f: impl FnMut(&U) + 'static,
    ) -> Subscription
    where
        U: PartialEq + 'static,
    {
        self.subscribe_with(selector, f, TaskKind::default())
    }

    /// Like [`subscribe`](Self::subscribe), with `f` run as a task of `kind`.
    pub fn subscribe_with<U>(
        &self,
        selector: impl Fn(&S) -> U + 'static,
        mut f: impl FnMut(&U) + 'static,
        kind: TaskKind,
    ) -> Subscription
    where
        U: PartialEq + 'static,
    {
        self.select(selector).subscribe_with(
            move |value| {
                trace!(store = type_name::<S>(), %kind, "selected value changed");
                f(value)
            },
            kind,
        )
    }

    /// Mutably borrows the state.
    ///
    /// Subscribers are notified when the borrow ends, if the state was mutably dereferenced.
    pub fn borrow_mut<'a>(&'a self, ac: &'a mut ActionContext) -> StateRefMut<'a, S> {
        self.0.borrow_mut(ac)
    }

    /// Changes the state with `f` and notifies subscribers.
    pub fn update<U>(&self, ac: &mut ActionContext, f: impl FnOnce(&mut S) -> U) -> U {
        f(&mut self.0.borrow_mut(ac))
    }

    /// Changes the state with `f` and notifies subscribers only if the state differs afterwards.
    pub fn update_dedup<U>(&self, ac: &mut ActionContext, f: impl FnOnce(&mut S) -> U) -> U
    where
        S: PartialEq + Clone,
    {
        f(&mut self.0.borrow_mut_dedup(ac))
    }

    /// Replaces the whole state and notifies subscribers.
    pub fn replace(&self, state: S, ac: &mut ActionContext) {
        self.0.set(state, ac);
    }

    /// Returns a copy of the current state without tracking.
    pub fn snapshot(&self, sc: &mut SignalContext) -> S
    where
        S: Clone,
    {
        sc.untrack(|sc| self.0.get(sc))
    }

    pub fn to_signal(&self) -> Signal<S> {
        self.0.to_signal()
    }

    /// Number of selectors and readers currently depending on the state.
    pub fn dependent_count(&self) -> usize {
        self.0.dependent_count()
    }
}
impl<S: Default + 'static> Default for Store<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}
impl<S: std::fmt::Debug + 'static> std::fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.0, f)
    }
}
