use serde::{Deserialize, Serialize};

/// Bounding box of a detected face, in pixels of the uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceLocation {
    pub height: u32,
    pub width: u32,
    pub left: u32,
    pub top: u32,
}

/// One face entry. The service also reports age and gender estimates;
/// only the location is kept.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectedFace {
    pub face_location: FaceLocation,
}

/// Per-image section of the detection result document.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageResult {
    pub faces: Vec<DetectedFace>,
}

/// Detection result document: `{"images": [{"faces": [...]}]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionDocument {
    pub images: Vec<ImageResult>,
}

/// Faces counted in one detection result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaceCount {
    pub face_number: u32,
    /// Box of the first detected face. `None` iff `face_number == 0`.
    #[serde(flatten)]
    pub location: Option<FaceLocation>,
}

impl FaceCount {
    pub fn none() -> Self {
        Self {
            face_number: 0,
            location: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.face_number == 0
    }
}
