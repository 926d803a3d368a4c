//! Frame display bridge: renders every image published on the detections topic
//! into a display surface as a JPEG data URI. Last write wins.

use crate::display::DisplaySurface;
use crate::rosbridge::{
    CompressedImage, PublishFrame, RosbridgeClient, RosbridgeError, SubscribeOptions,
};
use crate::topic::ChannelEndpoint;
use std::sync::Arc;

pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// `data:image/jpeg;base64,<data>`. The payload is not validated.
pub fn jpeg_data_uri(data: &str) -> String {
    let mut uri = String::with_capacity(JPEG_DATA_URI_PREFIX.len() + data.len());
    uri.push_str(JPEG_DATA_URI_PREFIX);
    uri.push_str(data);
    uri
}

pub struct FrameDisplayBridge {
    endpoint: ChannelEndpoint,
    surface: Arc<dyn DisplaySurface>,
    subscription_id: Option<String>,
}

impl FrameDisplayBridge {
    /// Bridge for the workspace's detections image topic. Does not touch the surface.
    pub fn new(workspace: &str, surface: Arc<dyn DisplaySurface>) -> Self {
        Self::with_endpoint(ChannelEndpoint::detections_image(workspace), surface)
    }

    pub fn with_endpoint(endpoint: ChannelEndpoint, surface: Arc<dyn DisplaySurface>) -> Self {
        Self {
            endpoint,
            surface,
            subscription_id: None,
        }
    }

    /// Build the bridge and subscribe it on the client in one step.
    pub async fn attach(
        client: &mut RosbridgeClient,
        workspace: &str,
        surface: Arc<dyn DisplaySurface>,
        options: SubscribeOptions,
    ) -> Result<Self, RosbridgeError> {
        let mut bridge = Self::new(workspace, surface);
        bridge.subscribe(client, options).await?;
        Ok(bridge)
    }

    pub fn endpoint(&self) -> &ChannelEndpoint {
        &self.endpoint
    }

    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription_id.as_deref()
    }

    pub async fn subscribe(
        &mut self,
        client: &mut RosbridgeClient,
        options: SubscribeOptions,
    ) -> Result<(), RosbridgeError> {
        let id = client.subscribe(&self.endpoint, options).await?;
        self.subscription_id = Some(id);
        Ok(())
    }

    /// Send unsubscribe for the active subscription, if any.
    pub async fn detach(&mut self, client: &mut RosbridgeClient) -> Result<(), RosbridgeError> {
        if let Some(id) = self.subscription_id.take() {
            client.unsubscribe(&id, &self.endpoint).await?;
        }
        Ok(())
    }

    /// Write one image to the surface.
    pub fn render(&self, image: &CompressedImage) {
        self.surface.set_image_src(jpeg_data_uri(&image.data));
    }

    /// Render a publish frame if it belongs to this bridge's topic and carries an image.
    /// Returns whether the surface was written.
    pub fn handle_publish(&self, frame: PublishFrame) -> bool {
        if frame.topic != self.endpoint.name() {
            log::debug!("ignoring message on {}", frame.topic);
            return false;
        }
        match serde_json::from_value::<CompressedImage>(frame.msg) {
            Ok(image) => {
                log::trace!(
                    "frame {} ({} bytes base64, format {:?})",
                    image.header.frame_id,
                    image.data.len(),
                    image.format
                );
                self.render(&image);
                true
            }
            Err(e) => {
                log::warn!("skipping malformed {} message: {}", self.endpoint.message_type(), e);
                false
            }
        }
    }

    /// Render every published frame until the server closes the connection.
    /// Returns the number of frames rendered.
    pub async fn run(&self, client: &mut RosbridgeClient) -> Result<u64, RosbridgeError> {
        let mut rendered = 0u64;
        while let Some(frame) = client.next_publish().await {
            if self.handle_publish(frame?) {
                rendered += 1;
            }
        }
        log::info!(
            "rosbridge stream for {} ended after {} frames",
            self.endpoint.name(),
            rendered
        );
        Ok(rendered)
    }
}
