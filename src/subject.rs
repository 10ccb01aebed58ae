use std::{cell::RefCell, rc::Rc};

use futures::{future::LocalBoxFuture, FutureExt};
use log::warn;

use crate::stream::{Stream, Unsubscribe};

mod registry;
use registry::Registry;

/// Subject: a multicast hub that turns one logical event stream into a
/// broadcast channel with any number of independent subscribers.
///
/// The hub is split into two narrowed capabilities:
///
/// - **read**: [`stream()`](Subject::stream) returns an ordinary [`Stream`];
///   subscribing it registers with the hub. This is all a consumer (or a
///   [`feedback`](Stream::feedback) handler) ever sees.
/// - **write**: [`emit`](Subject::emit) and
///   [`signal_complete`](Subject::signal_complete) live on the `Subject`
///   itself. Code that only holds the stream half cannot drive the hub.
///
/// # Deferred fan-out
///
/// `emit`/`signal_complete` snapshot the current membership *at call time* and
/// return a future that yields one turn before invoking every snapshotted
/// callback in registration order. The deferral decouples the producer's call
/// stack from the subscribers' call stacks: emission often happens inside
/// combinator chains that synchronously register or remove subscriptions
/// (notably inside a feedback cycle), and a cycle that re-emits from within a
/// value callback relies on each iteration landing on its own turn instead of
/// the call stack.
///
/// Consequences of the snapshot point:
///
/// - a subscriber registered *after* the call does not see that value;
/// - a subscriber removed after the call but before the turn runs still sees
///   it — the snapshot keeps its slot alive for that one turn;
/// - awaiting the returned future is a flow-pacing point: it resolves only
///   after the whole fan-out ran, and sequential awaited emissions fan out in
///   call order.
///
/// # Example
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
///
/// use loopcast::prelude::*;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(
/// # tokio::task::LocalSet::new().run_until(async {
/// let subject = Subject::new();
/// let seen = Rc::new(RefCell::new(vec![]));
///
/// let c_seen = seen.clone();
/// subject
///   .stream()
///   .subscribe(move |v| c_seen.borrow_mut().push(v), || {})
///   .await;
///
/// subject.emit(1).await;
/// subject.emit(2).await;
/// assert_eq!(*seen.borrow(), vec![1, 2]);
/// # }));
/// ```
pub struct Subject<T> {
  registry: Rc<RefCell<Registry<T>>>,
}

impl<T> Clone for Subject<T> {
  fn clone(&self) -> Self { Subject { registry: self.registry.clone() } }
}

impl<T> Default for Subject<T> {
  fn default() -> Self { Subject { registry: Rc::new(RefCell::new(Registry::default())) } }
}

impl<T: 'static> Subject<T> {
  pub fn new() -> Self { Self::default() }

  /// The hub's read capability. Subscribing the returned stream registers the
  /// callbacks synchronously (within the first poll of the setup future); the
  /// unsubscribe removes exactly that registration.
  ///
  /// Unlike every other stream in this crate, all subscriptions obtained here
  /// share the hub: this is the one deliberately hot stream.
  pub fn stream(&self) -> Stream<T> {
    let registry = self.registry.clone();
    Stream::new(move |on_value, on_complete| {
      let registry = registry.clone();
      async move {
        let id = registry.borrow_mut().add(on_value, on_complete);
        Box::new(move || {
          registry.borrow_mut().remove(id);
        }) as Unsubscribe
      }
      .boxed_local()
    })
  }

  /// Broadcasts `value` to every subscriber registered at the moment of this
  /// call, one deferred turn later. See the type-level docs for the snapshot
  /// semantics. On a completed hub this is a no-op (logged at `warn`).
  pub fn emit(&self, value: T) -> LocalBoxFuture<'static, ()>
  where
    T: Clone,
  {
    let registry = self.registry.borrow();
    if registry.is_closed() {
      warn!("Subject::emit after completion; value dropped");
      return futures::future::ready(()).boxed_local();
    }
    let snapshot = registry.snapshot();
    drop(registry);
    async move {
      tokio::task::yield_now().await;
      let mut slots = snapshot.into_iter().peekable();
      while let Some(slot) = slots.next() {
        // The registry borrow is never held here, so a callback may
        // synchronously unsubscribe; only its own slot is borrowed during
        // the call. The last subscriber receives the moved value.
        if slots.peek().is_some() {
          (slot.borrow_mut().on_value)(value.clone());
        } else {
          (slot.borrow_mut().on_value)(value);
          break;
        }
      }
    }
    .boxed_local()
  }

  /// Broadcasts completion to every subscriber registered at the moment of
  /// this call, one deferred turn later, and marks the hub completed
  /// synchronously. Subscribers are not removed — each removes itself via its
  /// own unsubscribe — but their completion callbacks are consumed, so a
  /// subscriber completes at most once. Calling again is a no-op (logged at
  /// `warn`).
  pub fn signal_complete(&self) -> LocalBoxFuture<'static, ()> {
    let mut registry = self.registry.borrow_mut();
    if !registry.close() {
      warn!("Subject::signal_complete after completion; ignored");
      return futures::future::ready(()).boxed_local();
    }
    let snapshot = registry.snapshot();
    drop(registry);
    async move {
      tokio::task::yield_now().await;
      for slot in snapshot {
        let on_complete = slot.borrow_mut().on_complete.take();
        if let Some(on_complete) = on_complete {
          on_complete();
        }
      }
    }
    .boxed_local()
  }

  /// Number of currently registered subscribers.
  pub fn subscriber_count(&self) -> usize { self.registry.borrow().len() }

  /// Whether `signal_complete` has been called.
  pub fn is_closed(&self) -> bool { self.registry.borrow().is_closed() }
}
