//! # loopcast: push-based streams with a feedback operator
//!
//! A small reactive-stream engine built around one abstraction: a cold
//! [`Stream`] that, on subscription, pushes values and a single completion
//! signal to a pair of callbacks and hands back an [`Unsubscribe`] action.
//! On top of it sit a few combinators (`map`, `filter`, `merge`, `of`), a
//! multicast hub ([`Subject`]) and a cyclic-composition operator
//! ([`Stream::feedback`]) that wires a stream's own output back as its input.
//!
//! Everything is single-threaded and cooperative: the engine runs on a tokio
//! current-thread runtime inside a [`tokio::task::LocalSet`], and the hub's
//! fan-out is decoupled from the emitting call stack by one deferred turn
//! (`yield_now`), which is what makes feedback cycles safe to build without
//! unbounded synchronous recursion.
//!
//! ## Quick Start
//!
//! ```rust
//! use loopcast::prelude::*;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!   tokio::task::LocalSet::new()
//!     .run_until(async {
//!       let _unsub = of([1, 2, 3, 4])
//!         .map(|v| v * 2)
//!         .filter(|v| *v > 4)
//!         .subscribe(|v| println!("{v}"), || println!("done"))
//!         .await;
//!       // prints 6, 8, done
//!     })
//!     .await;
//! }
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Stream`] | Cold, push-based sequence; subscribing starts independent delivery |
//! | [`Subject`] | Multicast hub: externally-driven emissions fanned out to all subscribers |
//! | [`Unsubscribe`] | One-shot teardown action returned by every subscription |
//! | [`Stream::feedback`] | The loop operator: sink output becomes source input |
//!
//! There is no error channel: the only signals are values and completion.

pub mod ops;
pub mod prelude;
pub mod stream;
pub mod subject;
pub mod terminal;

pub use prelude::*;
