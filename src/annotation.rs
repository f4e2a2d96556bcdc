use serde::{Deserialize, Serialize};

/// Name the recognition service reports for a face with no known match.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Pixel rectangle in the source image's native resolution.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FaceBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// One detected face as returned by `/recognize`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    pub id: String,
    pub name: String,
    #[serde(rename = "box")]
    pub face_box: FaceBox,
}

impl RecognitionResult {
    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_NAME
    }

    /// Trailing `-`-separated segment of the id, e.g. `"3"` for `"face-3"`.
    pub fn id_fragment(&self) -> &str {
        self.id.rsplit('-').next().unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_server_annotation() {
        let json = r#"{"id":"face-2","name":"Ada Lovelace","box":{"left":10,"top":20,"width":30,"height":40}}"#;
        let result: RecognitionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.id, "face-2");
        assert_eq!(result.face_box.width, 30.0);
        assert!(!result.is_unknown());
    }

    #[test]
    fn id_fragment_takes_last_segment() {
        let result = RecognitionResult {
            id: "img-7-face-12".into(),
            name: UNKNOWN_NAME.into(),
            face_box: FaceBox { left: 0.0, top: 0.0, width: 1.0, height: 1.0 },
        };
        assert_eq!(result.id_fragment(), "12");

        let plain = RecognitionResult { id: "abc".into(), ..result };
        assert_eq!(plain.id_fragment(), "abc");
    }
}
