//! Outbound side of the cross-document channel

use crate::error::ChannelError;
use liveedit_protocol::{Envelope, Outbound};

/// Delivers envelopes to the host.
pub trait Channel {
    fn post(&mut self, envelope: &Envelope) -> Result<(), ChannelError>;
}

/// Keeps every posted envelope. Used by headless hosts and tests.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    sent: Vec<Envelope>,
    fail: bool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel whose every post fails, as when there is no parent frame.
    pub fn failing() -> Self {
        Self {
            sent: Vec::new(),
            fail: true,
        }
    }

    pub fn sent(&self) -> &[Envelope] {
        &self.sent
    }

    pub fn kinds(&self) -> Vec<&str> {
        self.sent.iter().map(|envelope| envelope.kind.as_str()).collect()
    }

    pub fn last(&self) -> Option<&Envelope> {
        self.sent.last()
    }

    pub fn take(&mut self) -> Vec<Envelope> {
        std::mem::take(&mut self.sent)
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }
}

impl Channel for RecordingChannel {
    fn post(&mut self, envelope: &Envelope) -> Result<(), ChannelError> {
        if self.fail {
            return Err(ChannelError::NoParent);
        }
        self.sent.push(envelope.clone());
        Ok(())
    }
}

/// Wrap and post one event.
pub fn send<C: Channel>(channel: &mut C, message: &Outbound, source: &str) -> Result<(), ChannelError> {
    let envelope = Envelope::outbound(message, source)?;
    channel.post(&envelope)
}
