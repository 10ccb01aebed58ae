//! Console request/response collaborator.
//!
//! The terminal is an ordinary consumer of the stream contract: it subscribes
//! to a stream of outbound [`Message`] requests and produces a stream of
//! inbound responses. `Log` requests are fire-and-forget side effects and
//! produce no response; `Prompt` requests are answered with another `Prompt`
//! carrying the same correlation id.
//!
//! [`drive`] is the generic driver over any I/O closure; [`console`] is
//! `drive` bound to the real terminal. Tests use `drive` with a synthetic
//! closure instead of faking stdin.

use std::io::BufRead;

use futures::FutureExt;

use crate::stream::Stream;

/// The one value type flowing through a console cycle.
///
/// A prompt *response* reuses the `Prompt` variant with the same `id` as the
/// request, so one filter on the id picks replies out of the cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
  Log { data: String },
  Prompt { id: String, data: String },
}

impl Message {
  pub fn log(data: impl Into<String>) -> Self {
    Message::Log { data: data.into() }
  }

  pub fn prompt(id: impl Into<String>, data: impl Into<String>) -> Self {
    Message::Prompt { id: id.into(), data: data.into() }
  }

  /// True for `Prompt` messages whose correlation id matches.
  pub fn is_prompt_with_id(&self, id: &str) -> bool {
    matches!(self, Message::Prompt { id: mid, .. } if mid == id)
  }

  /// The text payload, whichever variant carries it.
  pub fn data(&self) -> &str {
    match self {
      Message::Log { data } | Message::Prompt { data, .. } => data,
    }
  }
}

/// Drives a request stream through an I/O closure, yielding the responses.
///
/// Per subscription, `requests` is subscribed and each request is handed to
/// `io`; when `io` returns a message it is forwarded downstream as a
/// response. Completion of the request stream completes the response stream,
/// and the returned unsubscribe is the request subscription's own.
pub fn drive<F>(requests: Stream<Message>, io: F) -> Stream<Message>
where
  F: FnMut(&Message) -> Option<Message> + Clone + 'static,
{
  Stream::new(move |mut on_value, on_complete| {
    let mut io = io.clone();
    let requests = requests.clone();
    async move {
      requests
        .subscribe(
          move |req| {
            if let Some(response) = io(&req) {
              on_value(response);
            }
          },
          on_complete,
        )
        .await
    }
    .boxed_local()
  })
}

/// [`drive`] bound to the real terminal.
///
/// `Log` prints its payload. `Prompt` prints the prompt text, blocks the
/// current turn on one line of stdin, and answers with a `Prompt` carrying
/// the same id and the line read (trailing newline stripped). An stdin read
/// failure drops the response rather than faking one.
pub fn console(requests: Stream<Message>) -> Stream<Message> {
  drive(requests, |req| match req {
    Message::Log { data } => {
      println!("{data}");
      None
    }
    Message::Prompt { id, data } => {
      println!("{data}");
      let mut line = String::new();
      match std::io::stdin().lock().read_line(&mut line) {
        Ok(_) => Some(Message::prompt(id.clone(), line.trim_end().to_string())),
        Err(err) => {
          log::warn!("stdin read failed, dropping prompt response: {err}");
          None
        }
      }
    }
  })
}
