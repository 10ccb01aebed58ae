use std::{cell::RefCell, rc::Rc};

use futures::FutureExt;
use log::trace;

use crate::{
  stream::{Stream, Unsubscribe},
  subject::Subject,
};

impl<T: Clone + 'static> Stream<T> {
  /// The cyclic-composition operator (the classic `loop`; renamed because
  /// `loop` is a keyword).
  ///
  /// Per subscription, a fresh [`Subject`] is created and handed to `handler`
  /// as a plain stream — the read half. The stream the handler returns (the
  /// "sink") is subscribed with its values routed back into the hub and its
  /// completion routed into the hub's completion, closing the cycle: whatever
  /// the sink produces becomes a new value on the hub, reaching both the
  /// external subscriber and every handler-side subscription against the
  /// source. The hub's deferred fan-out keeps each cycle iteration on its own
  /// turn, so an arbitrarily deep cycle never recurses on the call stack.
  ///
  /// The hub's write half is never exposed: to inject values into a cycle
  /// from outside, merge your own subject's stream into the sink and keep
  /// `emit` for yourself — this is exactly how a terminal feeds prompt
  /// replies back in (see `tests/feedback_cycle.rs`).
  ///
  /// Teardown is symmetric: when the hub completes, the sink subscription is
  /// detached; when the caller unsubscribes, its own registration is removed
  /// synchronously, then the hub is completed and the sink detached, in that
  /// order.
  ///
  /// # Example
  ///
  /// A bounded counter cycle: the seed `0` cycles through the handler, each
  /// round trip incrementing it until the filter stops the cascade.
  ///
  /// ```rust
  /// use std::{cell::RefCell, rc::Rc};
  ///
  /// use loopcast::prelude::*;
  ///
  /// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(
  /// # tokio::task::LocalSet::new().run_until(async {
  /// let counter = Stream::feedback(|source: Stream<i32>| {
  ///   Stream::merge([source.filter(|v| *v < 3).map(|v| v + 1), of([0])])
  /// });
  ///
  /// let seen = Rc::new(RefCell::new(vec![]));
  /// let c_seen = seen.clone();
  /// let _unsub = counter
  ///   .subscribe(move |v| c_seen.borrow_mut().push(v), || {})
  ///   .await;
  ///
  /// for _ in 0..32 {
  ///   tokio::task::yield_now().await;
  /// }
  /// assert_eq!(*seen.borrow(), vec![0, 1, 2, 3]);
  /// # }));
  /// ```
  pub fn feedback<F>(handler: F) -> Stream<T>
  where
    F: Fn(Stream<T>) -> Stream<T> + 'static,
  {
    let handler = Rc::new(handler);
    Stream::new(move |on_value, on_complete| {
      let handler = handler.clone();
      async move {
        let hub = Subject::new();

        // The external caller registers first: the hub is simultaneously the
        // cycle's input and the loop's external output, and the caller must
        // observe completion before internal teardown runs.
        let hub_unsub = hub.stream().subscribe(on_value, on_complete).await;

        // Hub completion must not leak the sink subscription.
        let sink_unsub: Rc<RefCell<Option<Unsubscribe>>> = Rc::new(RefCell::new(None));
        let watcher = sink_unsub.clone();
        let _watcher_unsub = hub
          .stream()
          .subscribe(
            |_| {},
            move || {
              if let Some(unsub) = watcher.borrow_mut().take() {
                trace!("feedback hub completed; detaching sink");
                unsub();
              }
            },
          )
          .await;

        // The handler only ever sees the hub's read half.
        let sink = (*handler)(hub.stream());

        // Close the cycle. The wiring callbacks are synchronous, so each
        // emission is scheduled as its own task; the hub still snapshots
        // membership at the emit call itself, which is what keeps a value
        // produced during sink setup from reaching handler-side
        // subscriptions that do not exist yet.
        let emit_hub = hub.clone();
        let complete_hub = hub.clone();
        let unsub = sink
          .subscribe(
            move |v| {
              tokio::task::spawn_local(emit_hub.emit(v));
            },
            move || {
              tokio::task::spawn_local(complete_hub.signal_complete());
            },
          )
          .await;
        *sink_unsub.borrow_mut() = Some(unsub);

        Box::new(move || {
          // The caller stops listening immediately; the hub then completes
          // and the sink detaches, in that order, so the sink cannot push
          // new values into a hub that is already finishing.
          hub_unsub();
          let sink_unsub = sink_unsub.clone();
          tokio::task::spawn_local(async move {
            if !hub.is_closed() {
              hub.signal_complete().await;
            }
            if let Some(unsub) = sink_unsub.borrow_mut().take() {
              unsub();
            }
          });
        }) as Unsubscribe
      }
      .boxed_local()
    })
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::{
    prelude::*,
    test_util::{run_local, settle},
  };

  #[test]
  fn counter_cascade_settles_to_full_sequence() {
    run_local(async {
      // The cycle branch subscribes before the seed so the seed's emission
      // snapshot includes it.
      let counter = Stream::feedback(|source: Stream<i32>| {
        Stream::merge([source.filter(|v| *v < 10).map(|v| v + 1), of([0])])
      });

      let seen = Rc::new(RefCell::new(vec![]));
      let c_seen = seen.clone();
      let _unsub = counter
        .subscribe(move |v| c_seen.borrow_mut().push(v), || {})
        .await;

      settle(100).await;
      assert_eq!(*seen.borrow(), (0..=10).collect::<Vec<_>>());
    });
  }

  #[test]
  fn injected_values_round_trip_exactly_once() {
    run_local(async {
      let input = Subject::new();
      let cycle = Stream::feedback({
        let input = input.clone();
        move |source: Stream<i32>| {
          Stream::merge([input.stream(), source.filter(|v| *v < 100).map(|v| v + 100)])
        }
      });

      let seen = Rc::new(RefCell::new(vec![]));
      let c_seen = seen.clone();
      let _unsub = cycle
        .subscribe(move |v| c_seen.borrow_mut().push(v), || {})
        .await;

      input.emit(1).await;
      input.emit(2).await;
      settle(50).await;

      // Each injection observed once, and re-emitted by the one-step handler
      // exactly once: no drops, no duplicates.
      assert_eq!(*seen.borrow(), vec![1, 2, 101, 102]);
    });
  }

  #[test]
  fn sink_completion_completes_the_external_subscriber() {
    run_local(async {
      let cycle = Stream::feedback(|_source: Stream<i32>| of([42]));

      let seen = Rc::new(RefCell::new(vec![]));
      let completed = Rc::new(RefCell::new(false));
      let c_seen = seen.clone();
      let c_completed = completed.clone();
      let _unsub = cycle
        .subscribe(
          move |v| c_seen.borrow_mut().push(v),
          move || *c_completed.borrow_mut() = true,
        )
        .await;

      settle(10).await;
      assert_eq!(*seen.borrow(), vec![42]);
      assert!(*completed.borrow());
    });
  }

  #[test]
  fn unsubscribe_stops_delivery_without_completing_the_caller() {
    run_local(async {
      let input = Subject::new();
      let cycle = Stream::feedback({
        let input = input.clone();
        move |source: Stream<i32>| {
          Stream::merge([input.stream(), source.filter(|_| false)])
        }
      });

      let seen = Rc::new(RefCell::new(vec![]));
      let completed = Rc::new(RefCell::new(false));
      let c_seen = seen.clone();
      let c_completed = completed.clone();
      let unsub = cycle
        .subscribe(
          move |v| c_seen.borrow_mut().push(v),
          move || *c_completed.borrow_mut() = true,
        )
        .await;

      input.emit(1).await;
      settle(10).await;
      assert_eq!(*seen.borrow(), vec![1]);

      unsub();
      settle(10).await;

      // The sink was detached during teardown, so the injection side lost
      // its only consumer.
      assert_eq!(input.subscriber_count(), 0);
      input.emit(9).await;
      settle(10).await;

      assert_eq!(*seen.borrow(), vec![1]);
      assert!(!*completed.borrow());
    });
  }

  #[test]
  fn each_subscription_gets_its_own_cycle() {
    run_local(async {
      let counter = Stream::feedback(|source: Stream<i32>| {
        Stream::merge([source.filter(|v| *v < 2).map(|v| v + 1), of([0])])
      });

      let first = Rc::new(RefCell::new(vec![]));
      let second = Rc::new(RefCell::new(vec![]));

      let c_first = first.clone();
      let _u1 = counter
        .subscribe(move |v| c_first.borrow_mut().push(v), || {})
        .await;
      let c_second = second.clone();
      let _u2 = counter
        .subscribe(move |v| c_second.borrow_mut().push(v), || {})
        .await;

      settle(50).await;
      assert_eq!(*first.borrow(), vec![0, 1, 2]);
      assert_eq!(*second.borrow(), vec![0, 1, 2]);
    });
  }
}
