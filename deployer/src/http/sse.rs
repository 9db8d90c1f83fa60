//! Server-sent events decoding for job log streams

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, trace};

use crate::deploy::backend::{EventStream, StreamEvent};
use crate::errors::DeployerError;

/// One dispatched SSE event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

impl SseEvent {
    /// Map onto the job stream vocabulary; unknown names are dropped
    pub fn into_stream_event(self) -> Option<StreamEvent> {
        match self.event.as_str() {
            "log" => Some(StreamEvent::Log(self.data)),
            "done" => Some(StreamEvent::Done(self.data)),
            "error" => Some(StreamEvent::Error(self.data)),
            other => {
                debug!("Ignoring '{}' event", other);
                None
            }
        }
    }
}

/// Incremental `text/event-stream` decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns every event completed by it
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Drop whatever is pending once the body has ended
    ///
    /// An event is only complete once its blank line arrives; a body cut off
    /// mid-event yields nothing. Returns whether anything was discarded.
    pub fn finish(&mut self) -> bool {
        let pending = !self.buffer.is_empty() || !self.data.is_empty() || self.event.is_some();
        self.buffer.clear();
        self.data.clear();
        self.event = None;
        pending
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => trace!("Ignoring SSE field '{}'", field),
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        let data = std::mem::take(&mut self.data).join("\n");
        if data.is_empty() {
            return None;
        }
        Some(SseEvent {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}

/// Turn a response body into job stream events
///
/// A body error yields one `Err` item; the stream ends after it.
pub fn event_stream<S>(body: S) -> EventStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    body.map(Some)
        .chain(stream::iter([None]))
        .scan((SseDecoder::new(), false), |(decoder, failed), item| {
            if *failed {
                return futures::future::ready(None);
            }
            let out: Vec<Result<StreamEvent, DeployerError>> = match item {
                Some(Ok(chunk)) => decoder
                    .feed(&chunk)
                    .into_iter()
                    .filter_map(SseEvent::into_stream_event)
                    .map(Ok)
                    .collect(),
                Some(Err(e)) => {
                    *failed = true;
                    vec![Err(DeployerError::StreamFailed(e.to_string()))]
                }
                None => {
                    if decoder.finish() {
                        debug!("Event stream ended mid-event; discarding partial event");
                    }
                    Vec::new()
                }
            };
            futures::future::ready(Some(out))
        })
        .flat_map(stream::iter)
        .boxed()
}
