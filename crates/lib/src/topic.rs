//! Channel endpoint: the composed topic name and message type a subscription targets.

/// Topic suffix appended to the workspace prefix.
pub const DETECTIONS_IMAGE_SUFFIX: &str = "/pv_image_detections_2d/compressed";

/// Message type published on the detections image topic.
pub const COMPRESSED_IMAGE_TYPE: &str = "sensor_msgs/msg/CompressedImage";

/// A named, typed subscription point. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEndpoint {
    name: String,
    message_type: String,
}

impl ChannelEndpoint {
    pub fn new(name: impl Into<String>, message_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message_type: message_type.into(),
        }
    }

    /// The detections image endpoint for a workspace. The prefix is concatenated as-is.
    pub fn detections_image(workspace: &str) -> Self {
        Self::new(
            format!("{}{}", workspace, DETECTIONS_IMAGE_SUFFIX),
            COMPRESSED_IMAGE_TYPE,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message_type(&self) -> &str {
        &self.message_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detections_image_prefixes_workspace() {
        let ep = ChannelEndpoint::detections_image("/kitware");
        assert_eq!(ep.name(), "/kitware/pv_image_detections_2d/compressed");
        assert_eq!(ep.message_type(), "sensor_msgs/msg/CompressedImage");
    }

    #[test]
    fn empty_workspace_keeps_leading_slash() {
        let ep = ChannelEndpoint::detections_image("");
        assert_eq!(ep.name(), "/pv_image_detections_2d/compressed");
    }

    #[test]
    fn workspace_is_not_normalized() {
        let ep = ChannelEndpoint::detections_image("robot1");
        assert_eq!(ep.name(), "robot1/pv_image_detections_2d/compressed");
    }
}
