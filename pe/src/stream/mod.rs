//! Plan execution event stream
//!
//! The orchestrator answers a plan execution with a server-sent-event body.
//! [`SseFramer`] turns raw chunks into [`StreamEvent`]s and [`pump`] drives a
//! body stream into the caller's channel until it ends, fails or is cancelled.

use std::fmt::Display;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

mod event;
mod framer;

pub use event::{StreamEvent, Terminal};
pub use framer::{SseFramer, parse_frame};

/// Longest wait for room in the sink when sending the terminal event
pub const TERMINAL_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of delivering one event to the sink
enum Delivery {
    Sent,
    Cancelled,
    Closed,
}

async fn deliver(sink: &mpsc::Sender<StreamEvent>, cancel: &CancellationToken, event: StreamEvent) -> Delivery {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Delivery::Cancelled,
        sent = sink.send(event) => match sent {
            Ok(()) => Delivery::Sent,
            Err(_) => Delivery::Closed,
        },
    }
}

async fn read_until_end<S, B, E>(
    body: &mut S,
    sink: &mpsc::Sender<StreamEvent>,
    cancel: &CancellationToken,
) -> Terminal
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut framer = SseFramer::new();
    let mut chunk_count = 0usize;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(chunk_count, "pump: cancelled while reading");
                return Terminal::Cancelled;
            }
            next = body.next() => next,
        };

        let events = match next {
            Some(Ok(chunk)) => {
                chunk_count += 1;
                framer.push(chunk.as_ref())
            }
            Some(Err(e)) => {
                warn!(error = %e, chunk_count, "pump: transport error");
                return Terminal::Error(format!("Stream error: {}", e));
            }
            None => {
                debug!(chunk_count, pending = framer.pending(), "pump: stream ended");
                let tail = std::mem::take(&mut framer).finish();
                for event in tail {
                    match deliver(sink, cancel, event).await {
                        Delivery::Sent => {}
                        Delivery::Cancelled | Delivery::Closed => return Terminal::Cancelled,
                    }
                }
                return Terminal::Finished;
            }
        };

        for event in events {
            match deliver(sink, cancel, event).await {
                Delivery::Sent => {}
                Delivery::Cancelled => return Terminal::Cancelled,
                Delivery::Closed => {
                    debug!("pump: sink closed, stopping");
                    return Terminal::Cancelled;
                }
            }
        }
    }
}

/// Drive `body` into `sink` until it ends, fails or `cancel` fires
///
/// Events are delivered one at a time in wire order. The body is dropped
/// before the single terminal event is sent, on every exit path. A sink whose
/// receiver has gone away is treated as a cancellation.
pub async fn pump<S, B, E>(body: S, sink: &mpsc::Sender<StreamEvent>, cancel: &CancellationToken) -> Terminal
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut body = Box::pin(body);
    let terminal = read_until_end(&mut body, sink, cancel).await;
    drop(body);

    send_terminal(sink, &terminal).await;
    terminal
}

/// Send the terminal event, giving up after [`TERMINAL_SEND_TIMEOUT`]
///
/// A caller that stops draining a full sink loses the terminal event but
/// still sees the outcome through the execution's state.
pub(crate) async fn send_terminal(sink: &mpsc::Sender<StreamEvent>, terminal: &Terminal) {
    send_terminal_within(sink, terminal, TERMINAL_SEND_TIMEOUT).await;
}

async fn send_terminal_within(sink: &mpsc::Sender<StreamEvent>, terminal: &Terminal, bound: Duration) {
    debug!(?terminal, "send_terminal: called");
    match tokio::time::timeout(bound, sink.send(terminal.to_event())).await {
        Ok(Ok(())) => {}
        Ok(Err(_)) => debug!("send_terminal: sink closed"),
        Err(_) => warn!(?terminal, "send_terminal: sink full, terminal event dropped"),
    }
}
