use std::rc::Rc;

use derive_ex::derive_ex;
use parse_display::{Display, FromStr};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ActionContext, Context, ContextError, Signal, SignalContext, Store, Subscription};


#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, FromStr, Serialize, Deserialize,
)]
#[display(style = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}
impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// The theme shared by the components of a page.
#[derive_ex(Clone, Default)]
pub struct ThemeStore(Store<Theme>);

impl ThemeStore {
    pub fn new(theme: Theme) -> Self {
        Self(Store::new(theme))
    }

    /// Looks up the theme provided by an enclosing scope.
    pub fn from_context(cx: &Context) -> Result<Rc<Self>, ContextError> {
        cx.get::<Self>()
    }

    pub fn theme(&self, sc: &mut SignalContext) -> Theme {
        self.0.read(sc, |theme| *theme)
    }

    /// Switches between light and dark.
    pub fn toggle(&self, ac: &mut ActionContext) {
        let theme = self.0.update(ac, |theme| {
            *theme = theme.toggled();
            *theme
        });
        debug!(%theme, "toggle theme");
    }

    pub fn set(&self, theme: Theme, ac: &mut ActionContext) {
        self.0.update_dedup(ac, |current| *current = theme);
    }

    pub fn select<U>(&self, selector: impl Fn(&Theme) -> U + 'static) -> Signal<U>
    where
        U: PartialEq + 'static,
    {
        self.0.select(selector)
    }
    pub fn subscribe(&self, f: impl FnMut(&Theme) + 'static) -> Subscription {
        self.0.subscribe(|theme| *theme, f)
    }
}
