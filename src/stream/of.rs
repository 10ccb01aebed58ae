use futures::FutureExt;

use crate::stream::{Stream, Unsubscribe};

/// Creates a stream producing the given values.
///
/// Per subscription, dispatches every value in order inside the subscription's
/// own setup, then completes, then resolves to a no-op unsubscribe — so by the
/// time `subscribe(..).await` returns, delivery has already happened.
///
/// # Example
///
/// ```rust
/// use loopcast::prelude::*;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(
/// # tokio::task::LocalSet::new().run_until(async {
/// of(["a", "b"])
///   .subscribe(|v| println!("{v}"), || println!("done"))
///   .await;
/// # }));
/// ```
pub fn of<T, I>(values: I) -> Stream<T>
where
  T: Clone + 'static,
  I: IntoIterator<Item = T>,
{
  let values: Vec<T> = values.into_iter().collect();
  Stream::new(move |mut on_value, on_complete| {
    let values = values.clone();
    async move {
      for v in values {
        on_value(v);
      }
      on_complete();
      Box::new(|| {}) as Unsubscribe
    }
    .boxed_local()
  })
}
