//! Canvas readiness handshake.
//!
//! The canvas cannot know when the builder starts listening, so it keeps
//! announcing itself until the builder acknowledges.

use crate::{BusError, BusEvent, Endpoint, FrameRole};
use core::time::Duration;
use log::{debug, info};
use tokio::task::JoinHandle;
use tokio::time::timeout;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandshakeConfig {
    /// Pause between two `canvasReady` announcements.
    pub poll_interval: Duration,
    /// Give up after this long; `None` keeps trying.
    pub deadline: Option<Duration>,
}

impl HandshakeConfig {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            deadline: None,
        }
    }
}

/// Canvas side of the handshake.
#[derive(Clone, Copy, Debug, Default)]
pub struct CanvasHandshake {
    config: HandshakeConfig,
}

impl CanvasHandshake {
    pub const fn new(config: HandshakeConfig) -> Self {
        Self { config }
    }

    /// Announce readiness every poll interval until the builder answers.
    /// Returns the number of announcements sent. Other messages arriving
    /// meanwhile are dropped.
    ///
    /// # Errors
    /// [`BusError::HandshakeTimedOut`] once the deadline passes, or any
    /// error from the endpoint.
    pub async fn run(&self, endpoint: &mut Endpoint) -> Result<u32, BusError> {
        let mut attempts = 0;
        let outcome = match self.config.deadline {
            Some(deadline) => timeout(deadline, self.announce(endpoint, &mut attempts))
                .await
                .ok(),
            None => Some(self.announce(endpoint, &mut attempts).await),
        };
        match outcome {
            Some(Ok(())) => {
                info!("canvas acknowledged after {attempts} attempts");
                Ok(attempts)
            }
            Some(Err(error)) => Err(error),
            None => Err(BusError::HandshakeTimedOut { attempts }),
        }
    }

    async fn announce(&self, endpoint: &mut Endpoint, attempts: &mut u32) -> Result<(), BusError> {
        let poll = self.config.poll_interval.max(Duration::from_millis(1));
        loop {
            *attempts += 1;
            endpoint.publish(BusEvent::CanvasReady)?;
            if let Ok(acknowledged) = timeout(poll, wait_for_ack(endpoint)).await {
                return acknowledged;
            }
        }
    }
}

async fn wait_for_ack(endpoint: &mut Endpoint) -> Result<(), BusError> {
    loop {
        let delivery = endpoint.recv().await?;
        if delivery.source == FrameRole::Builder && delivery.event == BusEvent::CanvasReadyAck {
            return Ok(());
        }
    }
}

/// Builder side of the handshake: answer every `canvasReady` from the
/// canvas with `canvasReadyAck`. Runs until the returned task is aborted.
pub fn acknowledge_canvas_ready(endpoint: Endpoint) -> JoinHandle<Result<(), BusError>> {
    tokio::spawn(respond(endpoint))
}

async fn respond(mut endpoint: Endpoint) -> Result<(), BusError> {
    loop {
        let delivery = endpoint.recv().await?;
        if delivery.source == FrameRole::Canvas && delivery.event == BusEvent::CanvasReady {
            debug!("acknowledging canvas");
            endpoint.publish(BusEvent::CanvasReadyAck)?;
        }
    }
}
