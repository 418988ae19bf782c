use std::{
    cell::{Ref, RefCell},
    rc::{Rc, Weak},
};

use futures::Stream;

use crate::{
    core::{borrow_acyclic, Dependents, EdgeKey, Observable, Observer, Staleness, Tracker},
    effect_with, stream_from, SignalContext, Subscription, TaskKind,
};


/// A node that can be read through a [`Signal`].
pub(crate) trait Readable<T>: 'static {
    fn read<'a>(&'a self, sc: &mut SignalContext) -> Ref<'a, T>;
}

/// A value derived from states and other signals.
///
/// Reading a signal through a [`SignalContext`] makes the reader depend on it.
pub struct Signal<T: 'static>(Rc<dyn Readable<T>>);

impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: 'static> Signal<T> {
    /// Create a cached signal computed by `f`.
    ///
    /// Dependents are notified every time one of the sources of `f` changes.
    pub fn new(f: impl Fn(&mut SignalContext) -> T + 'static) -> Self {
        Self(Computed::new(f, None))
    }

    /// Create a cached signal computed by `f` that notifies dependents only when the result changes.
    pub fn new_dedup(f: impl Fn(&mut SignalContext) -> T + 'static) -> Self
    where
        T: PartialEq,
    {
        Self(Computed::new(f, Some(T::eq)))
    }

    pub(crate) fn from_readable(node: Rc<dyn Readable<T>>) -> Self {
        Self(node)
    }

    pub fn borrow<'a>(&'a self, sc: &mut SignalContext) -> Ref<'a, T> {
        self.0.read(sc)
    }
    pub fn get(&self, sc: &mut SignalContext) -> T
    where
        T: Clone,
    {
        T::clone(&self.borrow(sc))
    }

    /// Call `f` with the current value, and again every time it changes.
    pub fn subscribe(&self, f: impl FnMut(&T) + 'static) -> Subscription {
        self.subscribe_with(f, TaskKind::default())
    }
    pub fn subscribe_with(&self, mut f: impl FnMut(&T) + 'static, kind: TaskKind) -> Subscription {
        let this = self.clone();
        effect_with(move |sc| f(&this.borrow(sc)), kind)
    }

    pub fn to_stream(&self) -> impl Stream<Item = T> + Unpin + 'static
    where
        T: Clone,
    {
        let this = self.clone();
        stream_from(move |sc| this.get(sc))
    }
}

type EqFn<T> = fn(&T, &T) -> bool;

/// Cached computation. With `eq`, dependents see a change only if the new value differs.
struct Computed<F, T: 'static> {
    this: Weak<Self>,
    f: F,
    tracker: RefCell<Tracker>,
    value: RefCell<Option<T>>,
    dependents: RefCell<Dependents>,
    eq: Option<EqFn<T>>,
}
impl<F, T> Computed<F, T>
where
    F: Fn(&mut SignalContext) -> T + 'static,
    T: 'static,
{
    fn new(f: F, eq: Option<EqFn<T>>) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| Self {
            this: this.clone(),
            f,
            tracker: RefCell::new(Tracker::new(this.clone())),
            value: RefCell::new(None),
            dependents: RefCell::new(Dependents::new()),
            eq,
        })
    }

    fn update(&self) {
        let mut tracker = borrow_acyclic(&self.tracker);
        let mut changed = false;
        if tracker.needs_run() {
            let value = tracker.track(|sc| (self.f)(sc));
            let mut current = self.value.borrow_mut();
            changed = match (&*current, self.eq) {
                (Some(old), Some(eq)) => !eq(old, &value),
                _ => true,
            };
            if changed {
                *current = Some(value);
            }
        }
        drop(tracker);
        self.dependents.borrow_mut().settle(changed);
    }
}

impl<F, T> Readable<T> for Computed<F, T>
where
    F: Fn(&mut SignalContext) -> T + 'static,
    T: 'static,
{
    fn read<'a>(&'a self, sc: &mut SignalContext) -> Ref<'a, T> {
        self.update();
        if let Some(this) = self.this.upgrade() {
            self.dependents.borrow_mut().attach(this, sc);
        }
        Ref::map(self.value.borrow(), |value| value.as_ref().unwrap())
    }
}

impl<F, T> Observable for Computed<F, T>
where
    F: Fn(&mut SignalContext) -> T + 'static,
    T: 'static,
{
    fn refresh(&self, key: EdgeKey) -> bool {
        self.update();
        self.dependents.borrow().is_stale(key)
    }
    fn detach(&self, key: EdgeKey) {
        self.dependents.borrow_mut().detach(key);
    }
}

impl<F, T> Observer for Computed<F, T>
where
    F: Fn(&mut SignalContext) -> T + 'static,
    T: 'static,
{
    fn invalidate(self: Rc<Self>, staleness: Staleness) {
        if self.tracker.borrow_mut().mark(staleness) {
            // Whether the value changes is known only after it is recomputed.
            self.dependents.borrow_mut().invalidate(Staleness::MaybeStale);
        }
    }
}
