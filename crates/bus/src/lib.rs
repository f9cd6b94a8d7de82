//! Message bus between the builder frame and the canvas frame.
//!
//! A [`MessageBus`] is created by whoever hosts both frames and handed to
//! each of them; there is no process wide instance. Messages travel as JSON
//! envelopes, the way `postMessage` carries them between windows, and every
//! published event reaches every endpoint of the bus, the publisher's own
//! included. Delivery is best effort: slow endpoints skip what they missed.

#![forbid(unsafe_code)]

mod bus;
mod event;
mod handshake;

pub use bus::{Delivery, Endpoint, MessageBus};
pub use event::{BUS_NAMESPACE, BusEvent, Envelope, FrameRole};
pub use handshake::{CanvasHandshake, HandshakeConfig, acknowledge_canvas_ready};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("could not encode bus message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("message bus closed")]
    Closed,
    #[error("canvas was not acknowledged after {attempts} attempts")]
    HandshakeTimedOut { attempts: u32 },
}
