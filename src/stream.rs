use std::rc::Rc;

use futures::future::LocalBoxFuture;

mod of;
mod timer;
pub use of::of;
pub use timer::{interval, timeout};

/// Callback invoked once per delivered value.
pub type ValueFn<T> = Box<dyn FnMut(T)>;

/// Callback invoked for the one-shot terminal completion signal. `FnOnce`, so
/// "at most one completion per subscriber" is a fact of the type, not a
/// convention.
pub type CompleteFn = Box<dyn FnOnce()>;

/// Teardown action returned by a subscription. Invoking it stops further
/// value/completion callbacks attributable to that subscription and releases
/// whatever the setup acquired. `FnOnce`: double-unsubscribe does not compile.
pub type Unsubscribe = Box<dyn FnOnce()>;

/// The raw subscription function a [`Stream`] wraps.
pub type SubscribeFn<T> = dyn Fn(ValueFn<T>, CompleteFn) -> LocalBoxFuture<'static, Unsubscribe>;

/// A representation of any number of values over any amount of time — the
/// basic building block of this crate.
///
/// A `Stream` is exactly one field: a subscription function that, given a
/// value callback and a completion callback, performs (possibly asynchronous)
/// setup and resolves to an [`Unsubscribe`] action. Streams are cold: every
/// [`subscribe`](Stream::subscribe) call starts an independent delivery, and
/// cloning shares only the subscription function, never subscription state.
/// The one deliberate exception is [`Subject::stream`](crate::subject::Subject::stream),
/// whose subscriptions all feed from the same hub.
///
/// A stream may invoke the value callback zero or more times, and the
/// completion callback at most once; after completion it must not deliver
/// further values to that subscriber. There is no error channel.
pub struct Stream<T> {
  subscribe: Rc<SubscribeFn<T>>,
}

impl<T> Clone for Stream<T> {
  fn clone(&self) -> Self { Stream { subscribe: self.subscribe.clone() } }
}

impl<T: 'static> Stream<T> {
  /// Wraps a raw subscription function. The function is called once per
  /// subscription; anything a subscription needs to own must be created (or
  /// cloned) inside it.
  pub fn new<F>(subscribe: F) -> Self
  where
    F: Fn(ValueFn<T>, CompleteFn) -> LocalBoxFuture<'static, Unsubscribe> + 'static,
  {
    Stream { subscribe: Rc::new(subscribe) }
  }

  /// Starts the stream. Setup may itself suspend; the returned [`Unsubscribe`]
  /// only exists once setup has finished, so values dispatched during setup
  /// (e.g. by [`of`]) are already delivered by the time this resolves.
  pub async fn subscribe(
    &self,
    on_value: impl FnMut(T) + 'static,
    on_complete: impl FnOnce() + 'static,
  ) -> Unsubscribe {
    (self.subscribe.as_ref())(Box::new(on_value), Box::new(on_complete)).await
  }
}
