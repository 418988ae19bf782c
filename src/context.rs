use std::{
    any::{type_name, Any, TypeId},
    rc::Rc,
};

use parse_display::Display;


/// Values shared with everything built inside a scope, without passing them one by one.
///
/// A `Context` is immutable. [`provide`](Self::provide) returns a child scope in which
/// the value is visible, and the parent scope is left unchanged.
/// A value provided in an inner scope hides a value of the same type provided in an outer one.
#[derive(Clone, Default)]
pub struct Context(Option<Rc<Scope>>);

struct Scope {
    parent: Context,
    type_id: TypeId,
    type_name: &'static str,
    value: Rc<dyn Any>,
}

impl Context {
    /// Returns a scope with nothing provided.
    pub fn root() -> Self {
        Self(None)
    }

    /// Returns a child scope that provides `value`.
    pub fn provide<T: 'static>(&self, value: T) -> Self {
        self.provide_rc(Rc::new(value))
    }

    /// Returns a child scope that provides a shared `value`.
    pub fn provide_rc<T: 'static>(&self, value: Rc<T>) -> Self {
        Self(Some(Rc::new(Scope {
            parent: self.clone(),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            value,
        })))
    }

    /// Returns the innermost value of type `T`, or an error if no enclosing scope provides one.
    pub fn get<T: 'static>(&self) -> Result<Rc<T>, ContextError> {
        self.try_get().ok_or(ContextError::NotProvided {
            type_name: type_name::<T>(),
        })
    }

    /// Returns the innermost value of type `T`, if any.
    pub fn try_get<T: 'static>(&self) -> Option<Rc<T>> {
        let type_id = TypeId::of::<T>();
        self.scopes()
            .find(|scope| scope.type_id == type_id)
            .and_then(|scope| scope.value.clone().downcast().ok())
    }

    pub fn contains<T: 'static>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.scopes().any(|scope| scope.type_id == type_id)
    }

    /// Names of the provided types, innermost first.
    pub fn provided_type_names(&self) -> Vec<&'static str> {
        self.scopes().map(|scope| scope.type_name).collect()
    }

    fn scopes(&self) -> impl Iterator<Item = &Scope> {
        let mut next = self.0.as_deref();
        std::iter::from_fn(move || {
            let scope = next?;
            next = scope.parent.0.as_deref();
            Some(scope)
        })
    }
}
impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.provided_type_names()).finish()
    }
}

/// Error returned when a value is requested from a scope that does not provide it.
#[derive(Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContextError {
    #[display("`{type_name}` must be used within a scope that provides it")]
    NotProvided { type_name: &'static str },
}

impl std::error::Error for ContextError {}
