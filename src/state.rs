use std::{
    cell::{Ref, RefCell, RefMut},
    rc::{Rc, Weak},
};

use derive_ex::derive_ex;
use serde::{Deserialize, Serialize};

use crate::{
    core::{Dependents, EdgeKey, Observable},
    signal::Readable,
    ActionContext, Signal, SignalContext,
};


/// A mutable value whose readers are told when it changes.
#[derive_ex(Clone, bound())]
pub struct State<T: 'static>(Rc<StateNode<T>>);

struct StateNode<T: 'static> {
    this: Weak<Self>,
    value: RefCell<T>,
    dependents: RefCell<Dependents>,
}

impl<T: 'static> State<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new_cyclic(|this| StateNode {
            this: this.clone(),
            value: RefCell::new(value),
            dependents: RefCell::new(Dependents::new()),
        }))
    }

    /// Borrows the value and makes the reader behind `sc` depend on it.
    pub fn borrow<'a>(&'a self, sc: &mut SignalContext) -> Ref<'a, T> {
        self.0.read(sc)
    }
    pub fn get(&self, sc: &mut SignalContext) -> T
    where
        T: Clone,
    {
        T::clone(&self.borrow(sc))
    }

    /// Mutably borrows the value.
    ///
    /// Readers are told when the borrow ends, if it was used to write.
    pub fn borrow_mut<'a>(&'a self, ac: &'a mut ActionContext) -> StateRefMut<'a, T> {
        StateRefMut {
            value: self.0.value.borrow_mut(),
            written: false,
            before: None,
            node: &self.0,
            ac,
        }
    }

    /// Like [`borrow_mut`](Self::borrow_mut), but readers are told only if the value differs
    /// from the one at the start of the borrow.
    pub fn borrow_mut_dedup<'a>(&'a self, ac: &'a mut ActionContext) -> StateRefMut<'a, T>
    where
        T: PartialEq + Clone,
    {
        let value = self.0.value.borrow_mut();
        let before = Some(Unchanged {
            value: value.clone(),
            eq: T::eq,
        });
        StateRefMut {
            value,
            written: false,
            before,
            node: &self.0,
            ac,
        }
    }

    pub fn set(&self, value: T, ac: &mut ActionContext) {
        *self.borrow_mut(ac) = value;
    }

    /// Sets the value, telling readers only if it differs from the current one.
    pub fn set_dedup(&self, value: T, ac: &mut ActionContext)
    where
        T: PartialEq,
    {
        let mut current = self.0.value.borrow_mut();
        if *current != value {
            *current = value;
            drop(current);
            ac.notify(&self.0.dependents);
        }
    }

    pub fn to_signal(&self) -> Signal<T> {
        Signal::from_readable(self.0.clone())
    }

    /// Number of readers currently depending on the value.
    pub fn dependent_count(&self) -> usize {
        self.0.dependents.borrow().len()
    }
}
impl<T: Default + 'static> Default for State<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
impl<T: std::fmt::Debug + 'static> std::fmt::Debug for State<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.value.try_borrow() {
            Ok(value) => std::fmt::Debug::fmt(&*value, f),
            Err(_) => f.write_str("<borrowed>"),
        }
    }
}
impl<T: Serialize + 'static> Serialize for State<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self
            .0
            .value
            .try_borrow()
            .map_err(|_| serde::ser::Error::custom("state is mutably borrowed"))?;
        value.serialize(serializer)
    }
}
impl<'de, T: Deserialize<'de> + 'static> Deserialize<'de> for State<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(State::new)
    }
}

impl<T: 'static> Observable for StateNode<T> {
    fn refresh(&self, key: EdgeKey) -> bool {
        self.dependents.borrow().is_stale(key)
    }
    fn detach(&self, key: EdgeKey) {
        self.dependents.borrow_mut().detach(key);
    }
}
impl<T: 'static> Readable<T> for StateNode<T> {
    fn read<'a>(&'a self, sc: &mut SignalContext) -> Ref<'a, T> {
        if let Some(this) = self.this.upgrade() {
            self.dependents.borrow_mut().attach(this, sc);
        }
        self.value.borrow()
    }
}

struct Unchanged<T> {
    value: T,
    eq: fn(&T, &T) -> bool,
}

/// A mutable borrow of a [`State`].
pub struct StateRefMut<'a, T: 'static> {
    value: RefMut<'a, T>,
    written: bool,
    before: Option<Unchanged<T>>,
    node: &'a StateNode<T>,
    ac: &'a mut ActionContext,
}
impl<T: 'static> std::ops::Deref for StateRefMut<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.value
    }
}
impl<T: 'static> std::ops::DerefMut for StateRefMut<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.written = true;
        &mut self.value
    }
}
impl<T: 'static> Drop for StateRefMut<'_, T> {
    fn drop(&mut self) {
        let changed = match &self.before {
            Some(before) => self.written && !(before.eq)(&before.value, &self.value),
            None => self.written,
        };
        if changed {
            self.ac.notify(&self.node.dependents);
        }
    }
}
