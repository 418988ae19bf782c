use std::{
    cell::RefCell,
    mem::{replace, take},
    pin::Pin,
    rc::Rc,
    task::{Context, Poll, Waker},
};

use futures::Stream;

use crate::{effect, SignalContext, Subscription};


/// Creates a stream of the values returned by `f`.
///
/// The first value is computed on the next [`Runtime::update`](crate::core::Runtime::update),
/// and a new one each time a dependency of `f` changes.
/// Values that are not consumed before the next one is computed are replaced.
pub fn stream_from<T: 'static>(
    mut f: impl FnMut(&mut SignalContext) -> T + 'static,
) -> impl Stream<Item = T> + Unpin + 'static {
    let slot = Rc::new(RefCell::new(Slot::Empty));
    let sender = slot.clone();
    let subscription = effect(move |sc| {
        let value = f(sc);
        let previous = replace(&mut *sender.borrow_mut(), Slot::Ready(value));
        if let Slot::Waiting(waker) = previous {
            waker.wake();
        }
    });
    SignalStream {
        slot,
        _subscription: subscription,
    }
}

#[derive(Default)]
enum Slot<T> {
    #[default]
    Empty,
    Waiting(Waker),
    Ready(T),
}

struct SignalStream<T> {
    slot: Rc<RefCell<Slot<T>>>,
    _subscription: Subscription,
}

impl<T> Stream for SignalStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut slot = self.slot.borrow_mut();
        match take(&mut *slot) {
            Slot::Empty | Slot::Waiting(_) => {
                *slot = Slot::Waiting(cx.waker().clone());
                Poll::Pending
            }
            Slot::Ready(value) => Poll::Ready(Some(value)),
        }
    }
}
