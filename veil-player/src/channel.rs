//! Command Channel
//!
//! One-way, fire-and-forget path toward the embedded widget. `send` encodes
//! a [`Command`] and posts it through a [`MessageSink`]; it never blocks and
//! never reports success. The only evidence a command took effect is a later
//! inbound message.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, warn};
use veil_common::protocol::{Command, OutboundMessage};
use veil_common::{Error, Result};

/// Transport that posts messages across the boundary
///
/// Implemented by the host glue (a `postMessage` shim, a WebView bridge, a
/// test recorder). A returned error is logged and otherwise ignored.
pub trait MessageSink: Send {
    fn post(&mut self, message: &OutboundMessage) -> Result<()>;
}

/// Sink that forwards messages to an async consumer
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelSink {
    /// Create a sink and the receiver the host drains
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl MessageSink for ChannelSink {
    fn post(&mut self, message: &OutboundMessage) -> Result<()> {
        self.tx
            .send(message.clone())
            .map_err(|_| Error::SessionClosed)
    }
}

/// Sink that keeps every posted message in memory
///
/// Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingSink {
    log: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything posted so far, oldest first
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Function names of command messages, oldest first
    pub fn funcs(&self) -> Vec<String> {
        self.messages()
            .iter()
            .filter_map(|m| m.func().map(str::to_string))
            .collect()
    }

    pub fn clear(&self) {
        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl MessageSink for RecordingSink {
    fn post(&mut self, message: &OutboundMessage) -> Result<()> {
        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.clone());
        Ok(())
    }
}

/// Outbound command path for one player instance
pub struct CommandChannel {
    session_id: String,
    sink: Box<dyn MessageSink>,
    sent: u64,
    closed: bool,
}

impl CommandChannel {
    pub fn new(session_id: impl Into<String>, sink: Box<dyn MessageSink>) -> Self {
        Self {
            session_id: session_id.into(),
            sink,
            sent: 0,
            closed: false,
        }
    }

    /// Encode and post one command
    pub fn send(&mut self, command: Command) {
        if self.closed {
            debug!("Channel closed, dropping {}", command);
            return;
        }

        let message = command.to_message(&self.session_id);
        match self.sink.post(&message) {
            Ok(()) => {
                self.sent += 1;
                debug!("-> widget: {}", command);
            }
            Err(e) => warn!("Failed to post {}: {}", command, e),
        }
    }

    /// Stop posting; later sends are dropped
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of messages handed to the sink
    pub fn sent_count(&self) -> u64 {
        self.sent
    }
}
