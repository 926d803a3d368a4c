//! Rosbridge v2 wire types (subscribe, unsubscribe, publish, status).

use serde::{Deserialize, Serialize};

/// Wire subscribe: `{ "op": "subscribe", "id", "type", "topic", "compression", "throttle_rate", "queue_length" }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeOp {
    pub op: String,
    pub id: String,
    #[serde(rename = "type")]
    pub typ: String,
    pub topic: String,
    pub compression: String,
    pub throttle_rate: u32,
    pub queue_length: u32,
}

/// Wire unsubscribe: `{ "op": "unsubscribe", "id", "topic" }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsubscribeOp {
    pub op: String,
    pub id: String,
    pub topic: String,
}

/// Frames the client acts on. Anything else the server sends lands in `Other`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Incoming {
    /// `{ "op": "publish", "topic", "msg" }`
    Publish {
        topic: String,
        #[serde(default)]
        msg: serde_json::Value,
    },
    /// `{ "op": "status", "level", "msg", "id"? }`
    Status {
        #[serde(default)]
        level: String,
        #[serde(default)]
        msg: String,
        #[serde(default)]
        id: Option<String>,
    },
    #[serde(other)]
    Other,
}

/// A message delivered on a topic, still in its JSON form.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishFrame {
    pub topic: String,
    pub msg: serde_json::Value,
}

impl SubscribeOp {
    pub fn new(
        id: impl Into<String>,
        topic: impl Into<String>,
        typ: impl Into<String>,
        throttle_rate: u32,
        queue_length: u32,
    ) -> Self {
        Self {
            op: "subscribe".to_string(),
            id: id.into(),
            typ: typ.into(),
            topic: topic.into(),
            compression: "none".to_string(),
            throttle_rate,
            queue_length,
        }
    }
}

impl UnsubscribeOp {
    pub fn new(id: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            op: "unsubscribe".to_string(),
            id: id.into(),
            topic: topic.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subscribe_serializes_rosbridge_field_names() {
        let op = SubscribeOp::new(
            "subscribe:/ws/pv_image_detections_2d/compressed:1",
            "/ws/pv_image_detections_2d/compressed",
            "sensor_msgs/msg/CompressedImage",
            0,
            0,
        );
        let v = serde_json::to_value(&op).expect("serialize");
        assert_eq!(
            v,
            json!({
                "op": "subscribe",
                "id": "subscribe:/ws/pv_image_detections_2d/compressed:1",
                "type": "sensor_msgs/msg/CompressedImage",
                "topic": "/ws/pv_image_detections_2d/compressed",
                "compression": "none",
                "throttle_rate": 0,
                "queue_length": 0
            })
        );
    }

    #[test]
    fn unsubscribe_serializes() {
        let v = serde_json::to_value(UnsubscribeOp::new("sub-1", "/t")).expect("serialize");
        assert_eq!(v, json!({ "op": "unsubscribe", "id": "sub-1", "topic": "/t" }));
    }

    #[test]
    fn parses_publish() {
        let text = r#"{"op":"publish","topic":"/t","msg":{"data":"AAA"}}"#;
        match serde_json::from_str::<Incoming>(text).expect("parse") {
            Incoming::Publish { topic, msg } => {
                assert_eq!(topic, "/t");
                assert_eq!(msg["data"], "AAA");
            }
            other => panic!("expected publish, got {:?}", other),
        }
    }

    #[test]
    fn parses_status_with_missing_fields() {
        let text = r#"{"op":"status","level":"error"}"#;
        match serde_json::from_str::<Incoming>(text).expect("parse") {
            Incoming::Status { level, msg, id } => {
                assert_eq!(level, "error");
                assert!(msg.is_empty());
                assert!(id.is_none());
            }
            other => panic!("expected status, got {:?}", other),
        }
    }

    #[test]
    fn unknown_op_is_other() {
        let text = r#"{"op":"service_response","service":"/x","values":{}}"#;
        assert!(matches!(
            serde_json::from_str::<Incoming>(text).expect("parse"),
            Incoming::Other
        ));
    }

    #[test]
    fn frame_without_op_is_an_error() {
        assert!(serde_json::from_str::<Incoming>(r#"{"topic":"/t"}"#).is_err());
    }
}
