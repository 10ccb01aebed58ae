pub use crate::{
  stream::{interval, of, timeout, CompleteFn, Stream, SubscribeFn, Unsubscribe, ValueFn},
  subject::Subject,
  terminal::{console, drive, Message},
};
