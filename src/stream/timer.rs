use std::time::Duration;

use futures::FutureExt;

use crate::stream::{Stream, Unsubscribe};

/// Creates a stream which emits exactly one value after `delay`, then
/// completes. The timer runs as a task on the current `LocalSet`; the
/// unsubscribe aborts it.
pub fn timeout(delay: Duration) -> Stream<()> {
  Stream::new(move |mut on_value, on_complete| {
    async move {
      let handle = tokio::task::spawn_local(async move {
        tokio::time::sleep(delay).await;
        on_value(());
        on_complete();
      });
      Box::new(move || handle.abort()) as Unsubscribe
    }
    .boxed_local()
  })
}

/// Creates a stream which emits `0, 1, 2, …` every `period`, indefinitely.
///
/// The stream never completes on its own; stopping it is the subscriber's
/// job via the returned unsubscribe, which aborts the timer task without
/// delivering a completion (an unsubscribed consumer must not receive further
/// callbacks).
pub fn interval(period: Duration) -> Stream<u64> {
  Stream::new(move |mut on_value, _on_complete| {
    async move {
      let handle = tokio::task::spawn_local(async move {
        let mut tick: u64 = 0;
        loop {
          tokio::time::sleep(period).await;
          on_value(tick);
          tick += 1;
        }
      });
      Box::new(move || handle.abort()) as Unsubscribe
    }
    .boxed_local()
  })
}
