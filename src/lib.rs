//! A shopping cart store whose consumers subscribe through selectors,
//! built on a small single-threaded signal runtime.
//!
//! ```
//! use cartmut::{core::Runtime, CartItem, CartStore};
//!
//! let mut rt = Runtime::new();
//! let cart = CartStore::new();
//! let _s = cart.subscribe(|cart| cart.len(), |count| println!("{count} items"));
//! rt.update(); // "0 items"
//!
//! cart.add_item(CartItem::new("1", "Keyboard", 100.0), rt.ac());
//! rt.update(); // "1 items"
//!
//! assert_eq!(cart.get_total(&mut rt.sc()), 100.0);
//! ```

pub mod core;

mod accordion;
mod cart;
mod context;
mod effect;
mod signal;
mod state;
mod store;
mod stream;
mod subscription;
mod theme;

pub use accordion::*;
pub use cart::*;
pub use context::*;
pub use effect::*;
pub use signal::*;
pub use state::*;
pub use store::*;
pub use stream::*;
pub use subscription::*;
pub use theme::*;

pub use crate::core::{spawn_action, ActionContext, SignalContext, TaskKind};
