use futures::FutureExt;

use crate::stream::Stream;

impl<T: 'static> Stream<T> {
  /// Creates a stream which calls a closure on each upstream value and
  /// forwards its return value. Completion is forwarded unchanged and the
  /// upstream unsubscribe is propagated verbatim.
  ///
  /// The closure is cloned per subscription, so two subscriptions never share
  /// its state.
  pub fn map<U, F>(&self, f: F) -> Stream<U>
  where
    U: 'static,
    F: FnMut(T) -> U + Clone + 'static,
  {
    let source = self.clone();
    Stream::new(move |mut on_value, on_complete| {
      let mut f = f.clone();
      let source = source.clone();
      async move {
        source
          .subscribe(move |v| on_value(f(v)), on_complete)
          .await
      }
      .boxed_local()
    })
  }
}
