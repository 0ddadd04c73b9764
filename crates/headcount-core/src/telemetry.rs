/// Message published once per polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryMessage {
    pub people_count: u32,
}

impl TelemetryMessage {
    pub fn new(people_count: u32) -> Self {
        Self { people_count }
    }

    /// Compact JSON body, e.g. `{"people_count":3}`.
    pub fn to_payload(&self) -> String {
        serde_json::json!({ "people_count": self.people_count }).to_string()
    }
}

impl From<crate::types::FaceCount> for TelemetryMessage {
    fn from(count: crate::types::FaceCount) -> Self {
        Self::new(count.face_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_literal() {
        assert_eq!(TelemetryMessage::new(3).to_payload(), r#"{"people_count":3}"#);
    }

    #[test]
    fn test_payload_large_count() {
        assert_eq!(
            TelemetryMessage::new(u32::MAX).to_payload(),
            r#"{"people_count":4294967295}"#
        );
    }

    #[test]
    fn test_payload_zero() {
        assert_eq!(TelemetryMessage::new(0).to_payload(), r#"{"people_count":0}"#);
    }

    #[test]
    fn test_from_face_count() {
        let msg = TelemetryMessage::from(crate::types::FaceCount::none());
        assert_eq!(msg.people_count, 0);
    }
}
