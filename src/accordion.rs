use std::rc::Rc;

use derive_ex::derive_ex;
use tracing::debug;

use crate::{ActionContext, Context, ContextError, Signal, SignalContext, Store};


/// A set of collapsible items of which at most one is open.
#[derive_ex(Clone, Default)]
pub struct Accordion(Store<Option<String>>);

impl Accordion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the accordion provided by an enclosing scope.
    pub fn from_context(cx: &Context) -> Result<Rc<Self>, ContextError> {
        cx.get::<Self>()
    }

    /// The value of the open item, if any.
    pub fn open_value(&self, sc: &mut SignalContext) -> Option<String> {
        self.0.read(sc, |open| open.clone())
    }

    /// Opens the item `value`, or closes it if it is already open.
    pub fn toggle(&self, value: &str, ac: &mut ActionContext) {
        let mut open = self.0.borrow_mut(ac);
        if open.as_deref() == Some(value) {
            *open = None;
        } else {
            *open = Some(value.to_owned());
        }
        debug!(value, open = open.is_some(), "toggle accordion item");
    }

    pub fn is_open(&self, value: &str, sc: &mut SignalContext) -> bool {
        self.0.read(sc, |open| open.as_deref() == Some(value))
    }

    /// Returns a signal of whether `value` is open.
    ///
    /// Toggling one item does not notify the dependents of items whose state did not change.
    pub fn is_open_signal(&self, value: impl Into<String>) -> Signal<bool> {
        let value = value.into();
        self.0.select(move |open| open.as_ref() == Some(&value))
    }

    pub fn item(&self, value: impl Into<String>) -> AccordionItem {
        AccordionItem {
            accordion: self.clone(),
            value: value.into(),
        }
    }
}

/// One item of an [`Accordion`], identified by its value.
#[derive(Clone)]
pub struct AccordionItem {
    accordion: Accordion,
    value: String,
}

impl AccordionItem {
    /// Looks up the item provided by an enclosing scope.
    pub fn from_context(cx: &Context) -> Result<Rc<Self>, ContextError> {
        cx.get::<Self>()
    }

    pub fn value(&self) -> &str {
        &self.value
    }
    pub fn is_open(&self, sc: &mut SignalContext) -> bool {
        self.accordion.is_open(&self.value, sc)
    }
    pub fn toggle(&self, ac: &mut ActionContext) {
        self.accordion.toggle(&self.value, ac)
    }
    pub fn is_open_signal(&self) -> Signal<bool> {
        self.accordion.is_open_signal(self.value.clone())
    }
}
