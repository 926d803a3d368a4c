//! ROS message types as rosbridge serializes them to JSON.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// `builtin_interfaces/msg/Time`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Time {
    #[serde(default)]
    pub sec: i32,
    #[serde(default)]
    pub nanosec: u32,
}

/// `std_msgs/msg/Header`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub stamp: Time,
    #[serde(default)]
    pub frame_id: String,
}

/// `sensor_msgs/msg/CompressedImage`. rosbridge sends the `uint8[] data` field as base64 text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressedImage {
    #[serde(default)]
    pub header: Header,
    /// e.g. "jpeg" or "png".
    #[serde(default)]
    pub format: String,
    pub data: String,
}

impl CompressedImage {
    /// Decode `data` into the compressed image bytes.
    pub fn decode_data(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(self.data.as_bytes())
    }
}
