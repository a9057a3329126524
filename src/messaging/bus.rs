//! Fan-out bus carrying UI messages from the core to renderers.
//!
//! Every subscriber owns an unbounded queue, so a slow renderer never loses
//! a chat line or tool block. Backlogged live snapshots are collapsed on the
//! receiving side since each one carries the full buffer.

use super::Message;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

type Subscribers = Arc<Mutex<Vec<mpsc::UnboundedSender<Message>>>>;

/// Sender half of the message bus.
#[derive(Clone)]
pub struct MessageSender {
    subscribers: Subscribers,
}

impl MessageSender {
    /// Send a message to every live subscriber.
    ///
    /// Subscribers whose receiver was dropped are pruned.
    pub fn send(&self, message: Message) -> Result<(), BusError> {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(message.clone()).is_ok());
        if subscribers.is_empty() {
            return Err(BusError::Closed);
        }
        Ok(())
    }

    /// Send a warning message.
    pub fn warning(&self, text: impl Into<String>) {
        let _ = self.send(Message::warning(text));
    }
}

/// Receiver half of the message bus.
pub struct MessageReceiver {
    rx: mpsc::UnboundedReceiver<Message>,
    /// Message read ahead while collapsing live text.
    pending: Option<Message>,
}

impl MessageReceiver {
    /// Receive the next message.
    ///
    /// Consecutive queued live snapshots come back as the newest one only.
    pub async fn recv(&mut self) -> Result<Message, BusError> {
        let mut message = match self.pending.take() {
            Some(message) => message,
            None => self.rx.recv().await.ok_or(BusError::Closed)?,
        };

        while matches!(message, Message::LiveText(_)) {
            match self.rx.try_recv() {
                Ok(next @ Message::LiveText(_)) => message = next,
                Ok(next) => {
                    self.pending = Some(next);
                    break;
                }
                Err(_) => break,
            }
        }
        Ok(message)
    }
}

/// Message bus for core-to-UI communication.
pub struct MessageBus {
    subscribers: Subscribers,
}

impl MessageBus {
    /// Create a new message bus.
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get a sender.
    pub fn sender(&self) -> MessageSender {
        MessageSender {
            subscribers: Arc::clone(&self.subscribers),
        }
    }

    /// Subscribe to messages sent from now on.
    pub fn subscribe(&self) -> MessageReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        MessageReceiver { rx, pending: None }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Bus errors.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Channel closed")]
    Closed,
}
