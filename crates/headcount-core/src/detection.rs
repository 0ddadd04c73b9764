//! Parsing of the detection result document written by the recognition step.

use crate::types::{DetectionDocument, FaceCount};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("cannot read detection result {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed detection result: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("detection result contains no images")]
    NoImages,
}

/// Count the faces of the first image in a detection result document.
///
/// Faces beyond the first contribute to the count only; the returned box
/// is always the first face's.
pub fn parse_detection(json: &str) -> Result<FaceCount, DetectionError> {
    let doc: DetectionDocument = serde_json::from_str(json)?;
    let image = doc.images.first().ok_or(DetectionError::NoImages)?;

    let count = FaceCount {
        face_number: image.faces.len() as u32,
        location: image.faces.first().map(|f| f.face_location),
    };
    tracing::debug!(faces = count.face_number, "parsed detection result");
    Ok(count)
}

/// Read and parse a detection result file.
pub fn read_detection_file(path: impl AsRef<Path>) -> Result<FaceCount, DetectionError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| DetectionError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_detection(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FaceLocation;
    use std::io::Write;

    const TWO_FACES: &str = r#"{
        "images": [{
            "faces": [
                {"age": {"min": 20, "max": 30}, "face_location": {"height": 120, "width": 100, "left": 40, "top": 60}},
                {"face_location": {"height": 80, "width": 70, "left": 300, "top": 90}}
            ],
            "image": "image.jpg"
        }],
        "images_processed": 1
    }"#;

    #[test]
    fn test_zero_faces() {
        let count = parse_detection(r#"{"images": [{"faces": []}]}"#).unwrap();
        assert_eq!(count.face_number, 0);
        assert!(count.location.is_none());
    }

    #[test]
    fn test_first_face_box_only() {
        let count = parse_detection(TWO_FACES).unwrap();
        assert_eq!(count.face_number, 2);
        assert_eq!(
            count.location,
            Some(FaceLocation { height: 120, width: 100, left: 40, top: 60 })
        );
    }

    #[test]
    fn test_only_first_image_counted() {
        let json = r#"{"images": [
            {"faces": []},
            {"faces": [{"face_location": {"height": 1, "width": 1, "left": 0, "top": 0}}]}
        ]}"#;
        assert!(parse_detection(json).unwrap().is_empty());
    }

    #[test]
    fn test_no_images() {
        assert!(matches!(
            parse_detection(r#"{"images": []}"#),
            Err(DetectionError::NoImages)
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            parse_detection("{\"images\": [{"),
            Err(DetectionError::Malformed(_))
        ));
    }

    #[test]
    fn test_wrong_schema() {
        // Error body returned by the service on a bad credential
        let json = r#"{"code": 401, "error": "Unauthorized"}"#;
        assert!(matches!(parse_detection(json), Err(DetectionError::Malformed(_))));
    }

    #[test]
    fn test_empty_file_is_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.flush().unwrap();
        assert!(matches!(
            read_detection_file(file.path()),
            Err(DetectionError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_detection_file(dir.path().join("out_faces.json")).unwrap_err();
        assert!(matches!(err, DetectionError::Io { .. }));
    }

    #[test]
    fn test_read_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_FACES.as_bytes()).unwrap();
        let count = read_detection_file(file.path()).unwrap();
        assert_eq!(count.face_number, 2);
    }
}
