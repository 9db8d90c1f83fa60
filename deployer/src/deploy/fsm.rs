//! Finite State Machine for a deployment log stream

use serde::{Deserialize, Serialize};

/// Log stream state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamState {
    /// Stream not opened yet
    Idle,

    /// Waiting for the connection to open
    Connecting,

    /// Receiving log events
    Streaming,

    /// Terminal success event received
    Completed,

    /// Terminal error, transport failure or connect failure
    Failed,

    /// Closed by the owner before a terminal event
    Abandoned,
}

impl StreamState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamState::Completed | StreamState::Failed | StreamState::Abandoned
        )
    }
}

/// Stream signal
#[derive(Debug, Clone)]
pub enum StreamSignal {
    /// Start opening the stream
    Open,

    /// Connection opened
    Connected,

    /// A log event arrived
    Log,

    /// The terminal `done` event arrived
    Done,

    /// The stream failed, before or after opening
    Fail(String),

    /// The owner discarded the stream
    Cancel,
}

/// Stream FSM
#[derive(Debug, Clone)]
pub struct StreamFsm {
    state: StreamState,
    error: Option<String>,
    closed: bool,
}

impl StreamFsm {
    /// Create a new FSM in idle state
    pub fn new() -> Self {
        Self {
            state: StreamState::Idle,
            error: None,
            closed: false,
        }
    }

    /// Get current state
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Process a signal and transition state
    pub fn process(&mut self, signal: StreamSignal) -> Result<(), String> {
        let new_state = match (&self.state, &signal) {
            (StreamState::Idle, StreamSignal::Open) => StreamState::Connecting,

            (StreamState::Connecting, StreamSignal::Connected) => StreamState::Streaming,
            (StreamState::Connecting, StreamSignal::Fail(err)) => {
                self.error = Some(err.clone());
                StreamState::Failed
            }

            (StreamState::Streaming, StreamSignal::Log) => StreamState::Streaming,
            (StreamState::Streaming, StreamSignal::Done) => StreamState::Completed,
            (StreamState::Streaming, StreamSignal::Fail(err)) => {
                self.error = Some(err.clone());
                StreamState::Failed
            }

            // Cancelling is allowed from any live state and is a no-op once terminal
            (state, StreamSignal::Cancel) if state.is_terminal() => return Ok(()),
            (_, StreamSignal::Cancel) => StreamState::Abandoned,

            (state, signal) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, signal));
            }
        };

        self.state = new_state;
        Ok(())
    }

    /// Mark the underlying connection closed; true only for the first call
    /// after reaching a terminal state
    pub fn close(&mut self) -> bool {
        if !self.state.is_terminal() || self.closed {
            return false;
        }
        self.closed = true;
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Default for StreamFsm {
    fn default() -> Self {
        Self::new()
    }
}
