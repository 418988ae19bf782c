use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use crate::{
    core::{borrow_acyclic, schedule, Observer, Staleness, TaskKind, Tracker},
    SignalContext, Subscription,
};


/// Runs `f` on the next update, and again after anything it read has changed.
///
/// `f` runs as a task of the default [`TaskKind`]. Dropping the returned [`Subscription`]
/// stops it.
pub fn effect(f: impl FnMut(&mut SignalContext) + 'static) -> Subscription {
    effect_with(f, TaskKind::default())
}

/// Same as [`effect`], but `f` runs with the tasks of `kind`.
pub fn effect_with(f: impl FnMut(&mut SignalContext) + 'static, kind: TaskKind) -> Subscription {
    let node = EffectNode::new(f, kind);
    node.schedule();
    Subscription::from_rc(node)
}

struct EffectNode<F> {
    this: Weak<Self>,
    f: RefCell<F>,
    tracker: RefCell<Tracker>,
    kind: TaskKind,
}
impl<F> EffectNode<F>
where
    F: FnMut(&mut SignalContext) + 'static,
{
    fn new(f: F, kind: TaskKind) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| Self {
            this: this.clone(),
            f: RefCell::new(f),
            tracker: RefCell::new(Tracker::new(this.clone())),
            kind,
        })
    }

    fn schedule(&self) {
        let this = self.this.clone();
        schedule(self.kind, move || {
            if let Some(this) = this.upgrade() {
                this.run();
            }
        });
    }
    fn run(&self) {
        let mut tracker = borrow_acyclic(&self.tracker);
        if tracker.needs_run() {
            let f = &mut *self.f.borrow_mut();
            tracker.track(|sc| f(sc));
        }
    }
}

impl<F> Observer for EffectNode<F>
where
    F: FnMut(&mut SignalContext) + 'static,
{
    fn invalidate(self: Rc<Self>, staleness: Staleness) {
        if self.tracker.borrow_mut().mark(staleness) {
            self.schedule();
        }
    }
}
