use crate::{BusError, BusEvent, Envelope, FrameRole};
use log::{debug, trace};
use std::sync::Arc;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::{self, Receiver, Sender};
use uuid::Uuid;

/// Shared channel between the frames of one builder session.
#[derive(Clone, Debug)]
pub struct MessageBus {
    sender: Sender<Arc<str>>,
    session: Uuid,
}

impl MessageBus {
    pub const DEFAULT_CAPACITY: usize = 128;

    /// A new, independent bus buffering up to `capacity` messages per
    /// endpoint.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            session: Uuid::new_v4(),
        }
    }

    #[inline]
    pub const fn session(&self) -> Uuid {
        self.session
    }

    /// Attach a frame. The endpoint sees messages posted from now on.
    pub fn endpoint(&self, role: FrameRole) -> Endpoint {
        Endpoint {
            role,
            session: self.session,
            sender: self.sender.clone(),
            receiver: self.sender.subscribe(),
        }
    }

    /// Post arbitrary text, like any other script sharing the window may.
    /// Returns how many endpoints received it.
    pub fn post_raw(&self, message: &str) -> usize {
        self.sender.send(Arc::from(message)).unwrap_or_default()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// A decoded message and the frame that posted it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub source: FrameRole,
    pub event: BusEvent,
}

/// One frame's attachment to a [`MessageBus`].
#[derive(Debug)]
pub struct Endpoint {
    role: FrameRole,
    session: Uuid,
    sender: Sender<Arc<str>>,
    receiver: Receiver<Arc<str>>,
}

impl Endpoint {
    #[inline]
    pub const fn role(&self) -> FrameRole {
        self.role
    }

    /// Post `event` to every endpoint of the bus, this one included.
    ///
    /// # Errors
    /// [`BusError::Encode`] if the event cannot be serialised.
    pub fn publish(&self, event: BusEvent) -> Result<(), BusError> {
        let envelope = Envelope::new(self.session, self.role, event);
        let text = serde_json::to_string(&envelope)?;
        // This endpoint's own receiver keeps the channel open.
        if self.sender.send(Arc::from(text)).is_err() {
            debug!("bus message without receivers");
        }
        Ok(())
    }

    /// Wait for the next message of this bus. Foreign messages are skipped,
    /// and so are messages lost while this endpoint lagged behind.
    ///
    /// # Errors
    /// [`BusError::Closed`] when no sender is left.
    pub async fn recv(&mut self) -> Result<Delivery, BusError> {
        loop {
            match self.receiver.recv().await {
                Ok(text) => {
                    if let Some(delivery) = self.accept(&text) {
                        return Ok(delivery);
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    debug!("{:?} endpoint skipped {missed} bus messages", self.role);
                }
                Err(RecvError::Closed) => return Err(BusError::Closed),
            }
        }
    }

    /// Take every message already waiting, without blocking.
    ///
    /// # Errors
    /// [`BusError::Closed`] when no sender is left.
    pub fn drain(&mut self) -> Result<Vec<Delivery>, BusError> {
        let mut deliveries = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(text) => deliveries.extend(self.accept(&text)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Lagged(missed)) => {
                    debug!("{:?} endpoint skipped {missed} bus messages", self.role);
                }
                Err(TryRecvError::Closed) => return Err(BusError::Closed),
            }
        }
        Ok(deliveries)
    }

    fn accept(&self, text: &str) -> Option<Delivery> {
        let Some(envelope) = Envelope::decode(text, self.session) else {
            trace!("ignoring foreign message");
            return None;
        };
        Some(Delivery {
            source: envelope.source,
            event: envelope.event,
        })
    }
}
