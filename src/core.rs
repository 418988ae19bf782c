//! The runtime that the stores run on.
//!
//! A [`Runtime`] owns the pending work of its thread. Stores are changed through the
//! [`ActionContext`] it lends out, read through a [`SignalContext`], and subscribers that
//! were invalidated by a change run when [`Runtime::update`] is called.

use std::{
    cell::{RefCell, RefMut},
    collections::BTreeMap,
    marker::PhantomData,
    mem::{replace, take},
};

use derive_ex::{derive_ex, Ex};
use parse_display::Display;
use tracing::trace;

mod graph;

#[cfg(test)]
mod tests;

pub(crate) use graph::{
    Dependents, EdgeKey, Link, Observable, Observer, Recording, Staleness, Tracker,
};

thread_local! {
    static PENDING: RefCell<Pending> = RefCell::new(Pending::default());
}

type Action = Box<dyn FnOnce(&mut ActionContext)>;
type Job = Box<dyn FnOnce()>;

/// Work waiting for the runtime of the current thread.
#[derive(Default)]
struct Pending {
    has_runtime: bool,
    actions: Vec<Action>,
    jobs: BTreeMap<i8, Vec<Job>>,
    detached: Vec<Link>,
}
impl Pending {
    fn with<T>(f: impl FnOnce(&mut Self) -> T) -> T {
        PENDING.with(|p| f(&mut p.borrow_mut()))
    }
    fn take_jobs(&mut self, kind: Option<TaskKind>) -> Vec<Job> {
        match kind {
            Some(kind) => self.jobs.remove(&kind.id).unwrap_or_default(),
            None => take(&mut self.jobs).into_values().flatten().collect(),
        }
    }
}

/// Queues `job` to run on the next [`Runtime::run_tasks`] that covers `kind`.
pub(crate) fn schedule(kind: TaskKind, job: impl FnOnce() + 'static) {
    Pending::with(|p| p.jobs.entry(kind.id).or_default().push(Box::new(job)));
}

/// Hands dependencies of a dropped observer to the runtime, which releases them later.
pub(crate) fn defer_detach(links: Vec<Link>) {
    let _ = PENDING.try_with(|p| p.borrow_mut().detached.extend(links));
}

fn detach_deferred() {
    loop {
        let links = Pending::with(|p| take(&mut p.detached));
        if links.is_empty() {
            break;
        }
        for link in links {
            link.detach();
        }
    }
}

/// Mutably borrows a node that is being brought up to date.
///
/// Failing to borrow means the node depends on itself.
pub(crate) fn borrow_acyclic<T>(cell: &RefCell<T>) -> RefMut<'_, T> {
    match cell.try_borrow_mut() {
        Ok(b) => b,
        Err(_) => panic!("{}", CyclicError {}),
    }
}

/// Reactive runtime.
///
/// Only one `Runtime` can exist per thread at a time.
#[derive_ex(Default)]
#[default(Self::new())]
pub struct Runtime {
    ac: ActionContext,
}
impl Runtime {
    pub fn new() -> Self {
        if Pending::with(|p| replace(&mut p.has_runtime, true)) {
            panic!("Only one `Runtime` can exist in the same thread at the same time.");
        }
        Self {
            ac: ActionContext {
                _not_send: PhantomData,
            },
        }
    }

    pub fn ac(&mut self) -> &mut ActionContext {
        &mut self.ac
    }

    /// Returns a context for reading stores outside of any subscriber.
    pub fn sc(&mut self) -> SignalContext<'_> {
        detach_deferred();
        SignalContext::untracked()
    }

    /// Perform spawned actions, including the ones they spawn.
    ///
    /// Returns `true` if any action was performed.
    pub fn run_actions(&mut self) -> bool {
        let mut handled = false;
        loop {
            let actions = Pending::with(|p| take(&mut p.actions));
            if actions.is_empty() {
                return handled;
            }
            for action in actions {
                action(&mut self.ac);
            }
            handled = true;
        }
    }

    /// Perform scheduled tasks.
    ///
    /// If `kind` is `None`, tasks of all kinds run, smaller ids first.
    /// Tasks scheduled while this runs are left for the next call.
    ///
    /// Returns `true` if any task was performed.
    pub fn run_tasks(&mut self, kind: Option<TaskKind>) -> bool {
        detach_deferred();
        let jobs = Pending::with(|p| p.take_jobs(kind));
        if jobs.is_empty() {
            return false;
        }
        trace!(count = jobs.len(), "run tasks");
        for job in jobs {
            job();
        }
        true
    }

    /// Run actions and tasks until there is nothing left to do.
    pub fn update(&mut self) {
        while self.run_actions() || self.run_tasks(None) {}
    }
}
impl Drop for Runtime {
    fn drop(&mut self) {
        let leftovers = Pending::with(|p| {
            p.has_runtime = false;
            (take(&mut p.actions), take(&mut p.jobs), take(&mut p.detached))
        });
        drop(leftovers);
    }
}

/// Context for changing stores.
///
/// Only the [`Runtime`] hands it out, so changes cannot happen while subscribers compute.
pub struct ActionContext {
    _not_send: PhantomData<*mut ()>,
}
impl ActionContext {
    /// Tells everything that read a changed value that it is out of date.
    pub(crate) fn notify(&mut self, dependents: &RefCell<Dependents>) {
        dependents.borrow_mut().invalidate(Staleness::Stale);
    }
}

/// Context for reading stores and recording what was read.
pub struct SignalContext<'s> {
    recording: Option<&'s mut Recording>,
}
impl<'s> SignalContext<'s> {
    fn untracked() -> Self {
        Self { recording: None }
    }
    fn recording(recording: &'s mut Recording) -> Self {
        Self {
            recording: Some(recording),
        }
    }

    /// Call a function with a [`SignalContext`] that does not track dependencies.
    pub fn untrack<T>(&mut self, f: impl FnOnce(&mut SignalContext<'s>) -> T) -> T {
        let recording = self.recording.take();
        let value = f(self);
        self.recording = recording;
        value
    }
}

/// Spawns a change to run on the next [`Runtime::run_actions`] or [`Runtime::update`].
///
/// Subscribers use this to change stores, since they only get a [`SignalContext`].
pub fn spawn_action(f: impl FnOnce(&mut ActionContext) + 'static) {
    Pending::with(|p| {
        if !p.has_runtime {
            panic!("`Runtime` is not created.");
        }
        p.actions.push(Box::new(f));
    });
}

/// Kind of subscriber work, used to run subscribers in phases.
///
/// Kinds with a smaller `id` run first when all tasks are run at once.
#[derive(Clone, Copy, Display, Debug, Ex)]
#[derive_ex(PartialEq, Eq, Hash, Default)]
#[display("{id}: {name}")]
#[default(Self::new(0, "<default>"))]
pub struct TaskKind {
    id: i8,
    #[eq(ignore)]
    name: &'static str,
}
impl TaskKind {
    pub const fn new(id: i8, name: &'static str) -> Self {
        Self { id, name }
    }
}

#[non_exhaustive]
#[derive(Display, Debug)]
#[display("detect cyclic dependency")]
pub struct CyclicError {}

impl std::error::Error for CyclicError {}
