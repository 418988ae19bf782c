use std::env;

use cartmut::{catalogue, core::Runtime, CartState, CartStore, Context, Theme, ThemeStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Replays the shop page: a header showing count and total, a cart listing, and a theme switch.
///
/// Set `CART_SEED` to a JSON cart (`{"items":[{"id":"9","name":"Cable","price":5}]}`)
/// to start from a non-empty cart.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut rt = Runtime::new();

    let cart = match env::var("CART_SEED") {
        Ok(seed) => match serde_json::from_str::<CartState>(&seed) {
            Ok(state) => CartStore::from_state(state),
            Err(e) => {
                warn!("ignoring CART_SEED: {e}");
                CartStore::new()
            }
        },
        Err(_) => CartStore::new(),
    };
    let cx = Context::root()
        .provide(cart)
        .provide(ThemeStore::new(Theme::Light));

    let _page = render_page(&cx);
    rt.update();

    let Ok(cart) = CartStore::from_context(&cx) else {
        return;
    };
    for product in catalogue().into_iter().take(2) {
        info!(product = %product, "click: add to cart");
        cart.add_item(product, rt.ac());
        rt.update();
    }
    info!("click: remove Keyboard");
    cart.remove_item("1", rt.ac());
    rt.update();

    if let Ok(theme) = ThemeStore::from_context(&cx) {
        info!("click: toggle theme");
        theme.toggle(rt.ac());
        rt.update();
    }

    info!("click: clear cart");
    cart.clear_cart(rt.ac());
    rt.update();
    info!("click: clear cart again");
    cart.clear_cart(rt.ac());
    rt.update();
}

fn render_page(cx: &Context) -> Vec<cartmut::Subscription> {
    let mut subscriptions = Vec::new();
    match CartStore::from_context(cx) {
        Ok(cart) => {
            subscriptions.push(cart.subscribe(
                |cart| cart.len(),
                |count| info!("render header badge: {count} items"),
            ));
            subscriptions.push(cart.subscribe(
                |cart| cart.total(),
                |total| info!("render header total: ${total}"),
            ));
            subscriptions.push(cart.subscribe(
                |cart| cart.items.clone(),
                |items| {
                    if items.is_empty() {
                        info!("render cart: Cart is empty");
                    }
                    for item in items {
                        info!("render cart: {item}");
                    }
                },
            ));
        }
        Err(e) => warn!("{e}"),
    }
    match ThemeStore::from_context(cx) {
        Ok(theme) => subscriptions.push(theme.subscribe(|theme| info!("render theme: {theme}"))),
        Err(e) => warn!("{e}"),
    }
    subscriptions
}
