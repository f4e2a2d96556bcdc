use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_TOLERANCE: f64 = 0.55;
pub const DEFAULT_MIN_FACE_WIDTH_PERCENTAGE: f64 = 10.0;
pub const DEFAULT_MIN_FACE_HEIGHT_PERCENTAGE: f64 = 10.0;
/// `0` lets the server process every detected face.
pub const DEFAULT_MAX_FACES: u32 = 0;

/// Knobs sent alongside the image on every `/recognize` request.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionParams {
    /// Match threshold; lower is stricter.
    pub tolerance: f64,
    pub min_face_width_percentage: f64,
    pub min_face_height_percentage: f64,
    pub max_faces: u32,
}

impl Default for RecognitionParams {
    fn default() -> Self {
        RecognitionParams {
            tolerance: DEFAULT_TOLERANCE,
            min_face_width_percentage: DEFAULT_MIN_FACE_WIDTH_PERCENTAGE,
            min_face_height_percentage: DEFAULT_MIN_FACE_HEIGHT_PERCENTAGE,
            max_faces: DEFAULT_MAX_FACES,
        }
    }
}

impl RecognitionParams {
    /// Multipart text fields in the order the server reads them.
    pub fn form_fields(&self) -> [(&'static str, String); 4] {
        [
            ("tolerance", self.tolerance.to_string()),
            ("minFaceWidthPercentage", self.min_face_width_percentage.to_string()),
            ("minFaceHeightPercentage", self.min_face_height_percentage.to_string()),
            ("maxFaces", self.max_faces.to_string()),
        ]
    }

    /// Sets a parameter by its form field name (or snake_case alias).
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "tolerance" => self.tolerance = parse_value(key, value)?,
            "minFaceWidthPercentage" | "min_face_width_percentage" => {
                self.min_face_width_percentage = parse_value(key, value)?
            }
            "minFaceHeightPercentage" | "min_face_height_percentage" => {
                self.min_face_height_percentage = parse_value(key, value)?
            }
            "maxFaces" | "max_faces" => self.max_faces = parse_value(key, value)?,
            _ => return Err(format!("unknown parameter {key}")),
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, String> {
    value.parse().map_err(|_| format!("invalid value {value:?} for {key}"))
}
