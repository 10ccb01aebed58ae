use futures::FutureExt;

use crate::stream::Stream;

impl<T: 'static> Stream<T> {
  /// Emits only the upstream values that pass the predicate. Completion is
  /// forwarded unchanged no matter how many values were suppressed.
  pub fn filter<F>(&self, predicate: F) -> Stream<T>
  where
    F: FnMut(&T) -> bool + Clone + 'static,
  {
    let source = self.clone();
    Stream::new(move |mut on_value, on_complete| {
      let mut predicate = predicate.clone();
      let source = source.clone();
      async move {
        source
          .subscribe(
            move |v| {
              if predicate(&v) {
                on_value(v);
              }
            },
            on_complete,
          )
          .await
      }
      .boxed_local()
    })
  }
}
