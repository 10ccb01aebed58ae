use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use futures::FutureExt;
use smallvec::SmallVec;

use crate::stream::{CompleteFn, Stream, Unsubscribe};

impl<T: 'static> Stream<T> {
  /// Combines any number of streams into one by merging their emissions.
  ///
  /// Every value from every input is forwarded. Completion is counted: the
  /// merged stream completes exactly once, when the last input has completed,
  /// regardless of completion order — a latch guards against inputs completing
  /// in the same turn. The returned unsubscribe tears down every input.
  ///
  /// Merging zero streams completes immediately (the vacuous conjunction of
  /// completions).
  ///
  /// # Example
  ///
  /// ```rust
  /// use loopcast::prelude::*;
  ///
  /// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(
  /// # tokio::task::LocalSet::new().run_until(async {
  /// Stream::merge([of([1, 2]), of([3])])
  ///   .subscribe(|v| println!("{v}"), || println!("all done"))
  ///   .await;
  /// # }));
  /// ```
  pub fn merge<I>(streams: I) -> Stream<T>
  where
    I: IntoIterator<Item = Stream<T>>,
  {
    let streams: Vec<Stream<T>> = streams.into_iter().collect();
    Stream::new(move |on_value, on_complete| {
      let streams = streams.clone();
      async move {
        if streams.is_empty() {
          on_complete();
          return Box::new(|| {}) as Unsubscribe;
        }

        let on_value = Rc::new(RefCell::new(on_value));
        let latch: Rc<RefCell<Option<CompleteFn>>> = Rc::new(RefCell::new(Some(on_complete)));
        let remaining = Rc::new(Cell::new(streams.len()));

        let mut unsubs: SmallVec<[Unsubscribe; 2]> = SmallVec::new();
        for stream in streams {
          let on_value = on_value.clone();
          let latch = latch.clone();
          let remaining = remaining.clone();
          let unsub = stream
            .subscribe(
              move |v| {
                let mut on_value = on_value.borrow_mut();
                (*on_value)(v);
              },
              move || {
                let left = remaining.get().saturating_sub(1);
                remaining.set(left);
                if left == 0 {
                  if let Some(complete) = latch.borrow_mut().take() {
                    complete();
                  }
                }
              },
            )
            .await;
          unsubs.push(unsub);
        }

        Box::new(move || {
          for unsub in unsubs {
            unsub();
          }
        }) as Unsubscribe
      }
      .boxed_local()
    })
  }

  /// Binary convenience over [`Stream::merge`].
  pub fn merge_with(&self, other: &Stream<T>) -> Stream<T> {
    Stream::merge([self.clone(), other.clone()])
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc, time::Duration};

  use crate::{prelude::*, test_util::run_local};

  #[test]
  fn forwards_values_from_every_input() {
    run_local(async {
      let seen = Rc::new(RefCell::new(vec![]));
      let c_seen = seen.clone();

      Stream::merge([of([1, 2]), of([3, 4])])
        .subscribe(move |v| c_seen.borrow_mut().push(v), || {})
        .await;

      let mut sorted = seen.borrow().clone();
      sorted.sort_unstable();
      assert_eq!(sorted, vec![1, 2, 3, 4]);
    });
  }

  #[test]
  fn completes_exactly_once_after_all_inputs() {
    run_local(async {
      let left = Subject::new();
      let right = Subject::new();
      let completions = Rc::new(RefCell::new(0));

      let c_completions = completions.clone();
      left
        .stream()
        .merge_with(&right.stream())
        .subscribe(|_: i32| {}, move || *c_completions.borrow_mut() += 1)
        .await;

      left.signal_complete().await;
      assert_eq!(*completions.borrow(), 0);
      right.signal_complete().await;
      assert_eq!(*completions.borrow(), 1);
    });
  }

  #[test]
  fn completion_order_does_not_matter() {
    run_local(async {
      let left = Subject::new();
      let right = Subject::new();
      let completions = Rc::new(RefCell::new(0));

      let c_completions = completions.clone();
      right
        .stream()
        .merge_with(&left.stream())
        .subscribe(|_: i32| {}, move || *c_completions.borrow_mut() += 1)
        .await;

      right.signal_complete().await;
      left.signal_complete().await;
      assert_eq!(*completions.borrow(), 1);
    });
  }

  #[test]
  fn same_turn_completions_still_signal_once() {
    run_local(async {
      let left = Subject::new();
      let right = Subject::new();
      let completions = Rc::new(RefCell::new(0));

      let c_completions = completions.clone();
      left
        .stream()
        .merge_with(&right.stream())
        .subscribe(|_: i32| {}, move || *c_completions.borrow_mut() += 1)
        .await;

      // Schedule both completions before either fan-out runs.
      let first = left.signal_complete();
      let second = right.signal_complete();
      first.await;
      second.await;

      assert_eq!(*completions.borrow(), 1);
    });
  }

  #[test]
  fn zero_inputs_complete_immediately() {
    run_local(async {
      let completed = Rc::new(RefCell::new(false));
      let c_completed = completed.clone();

      Stream::merge(Vec::<Stream<i32>>::new())
        .subscribe(|_| {}, move || *c_completed.borrow_mut() = true)
        .await;

      assert!(*completed.borrow());
    });
  }

  #[test]
  fn unsubscribe_tears_down_every_input() {
    run_local(async {
      let seen = Rc::new(RefCell::new(vec![]));
      let c_seen = seen.clone();

      let unsub = Stream::merge([
        interval(Duration::from_millis(5)),
        interval(Duration::from_millis(7)),
      ])
      .subscribe(move |v| c_seen.borrow_mut().push(v), || {})
      .await;

      tokio::time::sleep(Duration::from_millis(30)).await;
      unsub();
      let count = seen.borrow().len();
      assert!(count >= 2);

      tokio::time::sleep(Duration::from_millis(30)).await;
      assert_eq!(seen.borrow().len(), count);
    });
  }
}
