//! Rosbridge: JSON-over-WebSocket access to ROS topics.
//!
//! The client sends subscribe/unsubscribe ops and yields publish frames in delivery order.
//! No reconnection: when the server goes away, `next_publish` ends.

mod client;
mod message;
mod protocol;

pub use client::{RosbridgeClient, RosbridgeError, SubscribeOptions};
pub use message::{CompressedImage, Header, Time};
pub use protocol::{Incoming, PublishFrame, SubscribeOp, UnsubscribeOp};
