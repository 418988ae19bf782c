use std::{
    mem::take,
    rc::{Rc, Weak},
};

use slabmap::SlabMap;

use super::{defer_detach, SignalContext};

/// How far a change has reached an observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Staleness {
    Fresh,
    /// A source may have changed. Refreshing the sources tells whether it did.
    MaybeStale,
    Stale,
}
impl Staleness {
    fn raise(&mut self, other: Self) {
        *self = (*self).max(other);
    }
}

/// A value that observers can read and depend on.
pub(crate) trait Observable: 'static {
    /// Brings the value up to date and returns whether the observer behind `key` must re-run.
    fn refresh(&self, key: EdgeKey) -> bool;
    fn detach(&self, key: EdgeKey);
}

/// Something that re-evaluates after a value it read has changed.
pub(crate) trait Observer: 'static {
    fn invalidate(self: Rc<Self>, staleness: Staleness);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EdgeKey(usize);

struct Edge {
    observer: Weak<dyn Observer>,
    staleness: Staleness,
}

/// The observers of one value.
#[derive(Default)]
pub(crate) struct Dependents(SlabMap<Edge>);

impl Dependents {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Records that the observer being tracked by `sc` read `source`.
    pub fn attach(&mut self, source: Rc<dyn Observable>, sc: &mut SignalContext) {
        let Some(recording) = sc.recording.as_deref_mut() else {
            return;
        };
        if recording.has_read(&source) {
            return;
        }
        if let Some(key) = recording.reuse(&source) {
            if let Some(edge) = self.0.get_mut(key.0) {
                edge.staleness = Staleness::Fresh;
            }
            return;
        }
        let key = EdgeKey(self.0.insert(Edge {
            observer: recording.observer.clone(),
            staleness: Staleness::Fresh,
        }));
        recording.links.push(Link { source, key });
    }
    pub fn detach(&mut self, key: EdgeKey) {
        self.0.remove(key.0);
    }

    /// Raises every observer to at least `staleness`, waking the ones that were fresh.
    pub fn invalidate(&mut self, staleness: Staleness) {
        self.0.optimize();
        for edge in self.0.values_mut() {
            let was_fresh = edge.staleness == Staleness::Fresh;
            edge.staleness.raise(staleness);
            if was_fresh {
                if let Some(observer) = edge.observer.upgrade() {
                    observer.invalidate(staleness);
                }
            }
        }
    }

    /// Resolves `MaybeStale` observers once the value knows whether it changed.
    pub fn settle(&mut self, changed: bool) {
        for edge in self.0.values_mut() {
            if edge.staleness == Staleness::MaybeStale {
                edge.staleness = if changed {
                    Staleness::Stale
                } else {
                    Staleness::Fresh
                };
            }
        }
    }
    pub fn is_stale(&self, key: EdgeKey) -> bool {
        match self.0.get(key.0) {
            Some(edge) => {
                debug_assert_ne!(edge.staleness, Staleness::MaybeStale, "edge is not settled");
                edge.staleness == Staleness::Stale
            }
            None => false,
        }
    }
}

/// A dependency of an observer on a value.
pub(crate) struct Link {
    source: Rc<dyn Observable>,
    key: EdgeKey,
}
impl Link {
    fn refresh(&self) -> bool {
        self.source.refresh(self.key)
    }
    pub fn detach(self) {
        self.source.detach(self.key);
    }
}

/// The values read so far by an observer that is being evaluated.
pub(crate) struct Recording {
    observer: Weak<dyn Observer>,
    previous: Vec<Link>,
    links: Vec<Link>,
}
impl Recording {
    fn has_read(&self, source: &Rc<dyn Observable>) -> bool {
        self.links.iter().any(|l| Rc::ptr_eq(&l.source, source))
    }
    fn reuse(&mut self, source: &Rc<dyn Observable>) -> Option<EdgeKey> {
        let index = self
            .previous
            .iter()
            .position(|l| Rc::ptr_eq(&l.source, source))?;
        let link = self.previous.swap_remove(index);
        let key = link.key;
        self.links.push(link);
        Some(key)
    }
}

/// The dependencies of one observer and how stale they have made it.
pub(crate) struct Tracker {
    observer: Weak<dyn Observer>,
    links: Vec<Link>,
    staleness: Staleness,
}
impl Tracker {
    /// Creates a tracker for an observer that has never run.
    pub fn new(observer: Weak<dyn Observer>) -> Self {
        Self {
            observer,
            links: Vec::new(),
            staleness: Staleness::Stale,
        }
    }
    pub fn is_fresh(&self) -> bool {
        self.staleness == Staleness::Fresh
    }

    /// Records an incoming change. Returns `true` if the observer was fresh until now.
    pub fn mark(&mut self, staleness: Staleness) -> bool {
        let was_fresh = self.is_fresh();
        self.staleness.raise(staleness);
        was_fresh
    }

    /// Returns whether the observer must re-run, refreshing its sources if that is not yet known.
    pub fn needs_run(&mut self) -> bool {
        if self.staleness == Staleness::MaybeStale {
            self.staleness = if self.links.iter().any(|l| l.refresh()) {
                Staleness::Stale
            } else {
                Staleness::Fresh
            };
        }
        self.staleness == Staleness::Stale
    }

    /// Runs `f` and makes what it read the new dependencies of the observer.
    pub fn track<T>(&mut self, f: impl FnOnce(&mut SignalContext) -> T) -> T {
        self.staleness = Staleness::Fresh;
        let mut recording = Recording {
            observer: self.observer.clone(),
            previous: take(&mut self.links),
            links: Vec::new(),
        };
        let value = f(&mut SignalContext::recording(&mut recording));
        self.links = recording.links;
        for link in recording.previous {
            link.detach();
        }
        value
    }
}
impl Drop for Tracker {
    fn drop(&mut self) {
        if !self.links.is_empty() {
            defer_detach(take(&mut self.links));
        }
    }
}
